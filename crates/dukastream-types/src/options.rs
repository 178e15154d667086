//! Stream configuration.
//!
//! [`StreamOptions`] is resolved once per stream from defaults, optional
//! file overrides and explicit settings, then shared read-only by every
//! stage of the pipeline.

use chrono::{DateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::{ConfigError, DateRange, PriceType, Timeframe};

/// Unit in which volumes are reported.
///
/// The archive stores volumes in millions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolumeUnit {
    /// Millions (as stored).
    #[default]
    Millions,
    /// Thousands.
    Thousands,
    /// Single units.
    Units,
}

impl VolumeUnit {
    /// Returns the factor applied to stored volumes.
    #[must_use]
    pub const fn multiplier(&self) -> f64 {
        match self {
            Self::Millions => 1.0,
            Self::Thousands => 1_000.0,
            Self::Units => 1_000_000.0,
        }
    }
}

impl FromStr for VolumeUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "millions" => Ok(Self::Millions),
            "thousands" => Ok(Self::Thousands),
            "units" => Ok(Self::Units),
            _ => Err(ConfigError::UnknownVolumeUnit(s.to_string())),
        }
    }
}

/// Delay schedule between retry attempts.
#[derive(Clone)]
pub enum RetryDelay {
    /// Same delay before every retry.
    Fixed(Duration),
    /// `base * 2^attempt`.
    Exponential {
        /// Delay before the first retry.
        base: Duration,
    },
    /// Caller-supplied function of the (0-indexed) attempt number.
    Custom(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl RetryDelay {
    /// Returns the delay to wait after failed attempt `attempt` (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Exponential { base } => base.saturating_mul(1u32 << attempt.min(16)),
            Self::Custom(f) => f(attempt),
        }
    }
}

impl Default for RetryDelay {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(200),
        }
    }
}

impl std::fmt::Debug for RetryDelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(delay) => f.debug_tuple("Fixed").field(delay).finish(),
            Self::Exponential { base } => {
                f.debug_struct("Exponential").field("base", base).finish()
            }
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Retry behaviour of a single fetch.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay schedule between attempts.
    pub delay: RetryDelay,
    /// Treat an empty 200 body as a failure worth retrying.
    pub retry_on_empty: bool,
    /// Return an error once retries are exhausted; otherwise yield no data.
    pub fail_after_retries: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: RetryDelay::default(),
            retry_on_empty: false,
            fail_after_retries: true,
        }
    }
}

/// On-disk cache of decompressed payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// Whether reads and writes go through the cache.
    pub enabled: bool,
    /// Root folder holding one flat file per remote path.
    pub folder: PathBuf,
}

impl CachePolicy {
    /// Returns the platform cache folder, falling back to a local
    /// `.dukastream-cache` directory.
    #[must_use]
    pub fn default_folder() -> PathBuf {
        ProjectDirs::from("", "", "dukastream").map_or_else(
            || PathBuf::from(".dukastream-cache"),
            |dirs| dirs.cache_dir().join("bi5"),
        )
    }

    /// Returns an enabled cache rooted at `folder`.
    #[must_use]
    pub fn enabled_at(folder: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            folder: folder.into(),
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            folder: Self::default_folder(),
        }
    }
}

/// Immutable per-stream configuration.
#[derive(Debug, Clone)]
pub struct StreamOptions {
    range: DateRange,
    timeframe: Timeframe,
    price_type: PriceType,
    volume_unit: VolumeUnit,
    utc_offset: TimeDelta,
    timezone: Option<Tz>,
    ignore_flats: bool,
    batch_size: usize,
    pause_between_batches: Duration,
    unit_timeout: Duration,
    halt_on_error: bool,
    retry: RetryPolicy,
    cache: CachePolicy,
    point_value: Option<u32>,
}

impl StreamOptions {
    /// Starts building options for `range` with every other field at its
    /// default.
    #[must_use]
    pub fn builder(range: DateRange) -> StreamOptionsBuilder {
        StreamOptionsBuilder::new(range)
    }

    /// Returns the normalized `[from, to)` UTC range.
    #[must_use]
    pub const fn range(&self) -> DateRange {
        self.range
    }

    /// Returns the requested output timeframe.
    #[must_use]
    pub const fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Returns the requested price type.
    #[must_use]
    pub const fn price_type(&self) -> PriceType {
        self.price_type
    }

    /// Returns the factor applied to every volume field.
    #[must_use]
    pub const fn volume_multiplier(&self) -> f64 {
        self.volume_unit.multiplier()
    }

    /// Returns true if zero-volume bars are dropped.
    #[must_use]
    pub const fn ignore_flats(&self) -> bool {
        self.ignore_flats
    }

    /// Returns the number of units fetched concurrently per batch.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the pause between consecutive batches.
    #[must_use]
    pub const fn pause_between_batches(&self) -> Duration {
        self.pause_between_batches
    }

    /// Returns the timeout applied to each unit's fetch and decode.
    #[must_use]
    pub const fn unit_timeout(&self) -> Duration {
        self.unit_timeout
    }

    /// Returns true if the first failed unit aborts the stream.
    #[must_use]
    pub const fn halt_on_error(&self) -> bool {
        self.halt_on_error
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Returns the cache policy.
    #[must_use]
    pub const fn cache(&self) -> &CachePolicy {
        &self.cache
    }

    /// Returns the point value override, if any.
    #[must_use]
    pub const fn point_value(&self) -> Option<u32> {
        self.point_value
    }

    /// Returns true if timestamps are shifted before being emitted.
    #[must_use]
    pub fn shifts_time(&self) -> bool {
        self.timezone.is_some() || self.utc_offset != TimeDelta::zero()
    }

    /// Returns the shift to apply to a record stamped `at`: the fixed UTC
    /// offset plus the timezone's offset in effect at that instant.
    #[must_use]
    pub fn time_shift(&self, at: DateTime<Utc>) -> TimeDelta {
        let zone = self.timezone.map_or_else(TimeDelta::zero, |tz| {
            let offset = tz.offset_from_utc_datetime(&at.naive_utc()).fix();
            TimeDelta::seconds(i64::from(offset.local_minus_utc()))
        });
        self.utc_offset + zone
    }
}

/// Builder merging explicit settings and overrides onto defaults.
#[derive(Debug, Clone)]
pub struct StreamOptionsBuilder {
    range: DateRange,
    timeframe: Timeframe,
    price_type: PriceType,
    volume_unit: VolumeUnit,
    utc_offset_minutes: i32,
    timezone: Option<String>,
    ignore_flats: bool,
    batch_size: usize,
    pause_between_batches: Duration,
    unit_timeout: Duration,
    halt_on_error: bool,
    retry: RetryPolicy,
    cache: CachePolicy,
    point_value: Option<u32>,
}

impl StreamOptionsBuilder {
    fn new(range: DateRange) -> Self {
        Self {
            range,
            timeframe: Timeframe::Tick,
            price_type: PriceType::Bid,
            volume_unit: VolumeUnit::Millions,
            utc_offset_minutes: 0,
            timezone: None,
            ignore_flats: true,
            batch_size: 10,
            pause_between_batches: Duration::from_millis(1000),
            unit_timeout: Duration::from_secs(60),
            halt_on_error: true,
            retry: RetryPolicy::default(),
            cache: CachePolicy::default(),
            point_value: None,
        }
    }

    /// Sets the output timeframe.
    #[must_use]
    pub const fn timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = timeframe;
        self
    }

    /// Sets the price type.
    #[must_use]
    pub const fn price_type(mut self, price_type: PriceType) -> Self {
        self.price_type = price_type;
        self
    }

    /// Sets the volume unit.
    #[must_use]
    pub const fn volume_unit(mut self, unit: VolumeUnit) -> Self {
        self.volume_unit = unit;
        self
    }

    /// Sets a fixed offset, in minutes, added to every timestamp.
    #[must_use]
    pub const fn utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Sets an IANA timezone whose offset is added to every timestamp.
    #[must_use]
    pub fn timezone(mut self, name: impl Into<String>) -> Self {
        self.timezone = Some(name.into());
        self
    }

    /// Sets whether zero-volume bars are dropped.
    #[must_use]
    pub const fn ignore_flats(mut self, ignore: bool) -> Self {
        self.ignore_flats = ignore;
        self
    }

    /// Sets the number of units fetched concurrently.
    #[must_use]
    pub const fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Sets the pause between batches.
    #[must_use]
    pub const fn pause_between_batches(mut self, pause: Duration) -> Self {
        self.pause_between_batches = pause;
        self
    }

    /// Sets the per-unit timeout.
    #[must_use]
    pub const fn unit_timeout(mut self, timeout: Duration) -> Self {
        self.unit_timeout = timeout;
        self
    }

    /// Sets whether the first failed unit aborts the stream.
    #[must_use]
    pub const fn halt_on_error(mut self, halt: bool) -> Self {
        self.halt_on_error = halt;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the cache policy.
    #[must_use]
    pub fn cache(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }

    /// Overrides the instrument's point value.
    #[must_use]
    pub const fn point_value(mut self, point_value: u32) -> Self {
        self.point_value = Some(point_value);
        self
    }

    /// Applies every field set in `overrides`.
    ///
    /// # Errors
    ///
    /// Returns an error if an override names an unknown timeframe, price
    /// type or volume unit.
    pub fn merge(mut self, overrides: &OptionOverrides) -> Result<Self, ConfigError> {
        if let Some(tf) = &overrides.timeframe {
            self.timeframe = tf
                .parse()
                .map_err(|_| ConfigError::UnknownTimeframe(tf.clone()))?;
        }
        if let Some(price) = &overrides.price_type {
            self.price_type = price.parse()?;
        }
        if let Some(unit) = &overrides.volume_unit {
            self.volume_unit = unit.parse()?;
        }
        if let Some(minutes) = overrides.utc_offset_minutes {
            self.utc_offset_minutes = minutes;
        }
        if let Some(tz) = &overrides.timezone {
            self.timezone = Some(tz.clone());
        }
        if let Some(ignore) = overrides.ignore_flats {
            self.ignore_flats = ignore;
        }
        if let Some(size) = overrides.batch_size {
            self.batch_size = size;
        }
        if let Some(ms) = overrides.pause_between_batches_ms {
            self.pause_between_batches = Duration::from_millis(ms);
        }
        if let Some(ms) = overrides.unit_timeout_ms {
            self.unit_timeout = Duration::from_millis(ms);
        }
        if let Some(halt) = overrides.halt_on_error {
            self.halt_on_error = halt;
        }
        if let Some(retries) = overrides.max_retries {
            self.retry.max_retries = retries;
        }
        if let Some(ms) = overrides.retry_delay_ms {
            self.retry.delay = RetryDelay::Fixed(Duration::from_millis(ms));
        }
        if let Some(retry_on_empty) = overrides.retry_on_empty {
            self.retry.retry_on_empty = retry_on_empty;
        }
        if let Some(fail) = overrides.fail_after_retries {
            self.retry.fail_after_retries = fail;
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = enabled;
        }
        if let Some(folder) = &overrides.cache_folder {
            self.cache.folder = folder.clone();
        }
        if let Some(point_value) = overrides.point_value {
            self.point_value = Some(point_value);
        }
        Ok(self)
    }

    /// Validates the settings and produces the immutable options.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero batch size, point value or unit timeout,
    /// or an unknown timezone.
    pub fn build(self) -> Result<StreamOptions, ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.point_value == Some(0) {
            return Err(ConfigError::ZeroPointValue);
        }
        if self.unit_timeout.is_zero() {
            return Err(ConfigError::ZeroUnitTimeout);
        }
        let timezone = self
            .timezone
            .map(|name| {
                name.parse::<Tz>()
                    .map_err(|_| ConfigError::UnknownTimezone(name))
            })
            .transpose()?;
        // Validated again in case the range was built by hand.
        let range = DateRange::new(self.range.from, self.range.to)?;

        Ok(StreamOptions {
            range,
            timeframe: self.timeframe,
            price_type: self.price_type,
            volume_unit: self.volume_unit,
            utc_offset: TimeDelta::minutes(i64::from(self.utc_offset_minutes)),
            timezone,
            ignore_flats: self.ignore_flats,
            batch_size: self.batch_size,
            pause_between_batches: self.pause_between_batches,
            unit_timeout: self.unit_timeout,
            halt_on_error: self.halt_on_error,
            retry: self.retry,
            cache: self.cache,
            point_value: self.point_value,
        })
    }
}

/// Optional settings loaded from a JSON configuration file.
///
/// Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionOverrides {
    /// Output timeframe identifier.
    pub timeframe: Option<String>,
    /// `bid`, `ask` or `mid`.
    pub price_type: Option<String>,
    /// `millions`, `thousands` or `units`.
    pub volume_unit: Option<String>,
    /// Fixed timestamp offset in minutes.
    pub utc_offset_minutes: Option<i32>,
    /// IANA timezone name.
    pub timezone: Option<String>,
    /// Drop zero-volume bars.
    pub ignore_flats: Option<bool>,
    /// Units fetched concurrently.
    pub batch_size: Option<usize>,
    /// Pause between batches in milliseconds.
    pub pause_between_batches_ms: Option<u64>,
    /// Per-unit timeout in milliseconds.
    pub unit_timeout_ms: Option<u64>,
    /// Abort on the first failed unit.
    pub halt_on_error: Option<bool>,
    /// Retries after the first attempt.
    pub max_retries: Option<u32>,
    /// Fixed delay between retries in milliseconds.
    pub retry_delay_ms: Option<u64>,
    /// Retry empty 200 responses.
    pub retry_on_empty: Option<bool>,
    /// Fail once retries are exhausted.
    pub fail_after_retries: Option<bool>,
    /// Enable the payload cache.
    pub cache_enabled: Option<bool>,
    /// Cache root folder.
    pub cache_folder: Option<PathBuf>,
    /// Point value override.
    pub point_value: Option<u32>,
}

impl OptionOverrides {
    /// Parses overrides from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON or unknown keys.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
