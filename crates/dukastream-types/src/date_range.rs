//! Half-open UTC time ranges.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::DateRangeError;

/// A half-open UTC interval `[from, to)` of requested data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Start instant (inclusive).
    pub from: DateTime<Utc>,
    /// End instant (exclusive).
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// Creates a new range, validating that `from <= to`.
    ///
    /// # Errors
    ///
    /// Returns an error if `from > to`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, DateRangeError> {
        if from > to {
            return Err(DateRangeError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// Creates a range from UTC midnight of `start` to UTC midnight of
    /// `end` (exclusive).
    ///
    /// # Errors
    ///
    /// Returns an error if `start > end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        Self::new(midnight(start), midnight(end))
    }

    /// Returns true if the range contains no instant.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }

    /// Returns true if `time` lies within `[from, to)`.
    #[must_use]
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        time >= self.from && time < self.to
    }

    /// Raises the start to `earliest` when it lies before it.
    ///
    /// The end is raised too if needed so the range never inverts.
    #[must_use]
    pub fn clamp_start(self, earliest: DateTime<Utc>) -> Self {
        let from = self.from.max(earliest);
        Self {
            from,
            to: self.to.max(from),
        }
    }

    /// Lowers the end to `latest` when it lies after it.
    #[must_use]
    pub fn clamp_end(self, latest: DateTime<Utc>) -> Self {
        let to = self.to.min(latest);
        Self {
            from: self.from.min(to),
            to,
        }
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.from.format("%Y-%m-%dT%H:%M:%SZ"),
            self.to.format("%Y-%m-%dT%H:%M:%SZ")
        )
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
