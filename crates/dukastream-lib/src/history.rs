//! One-call historical data streaming.

use chrono::{DateTime, Utc};
use dukastream_aggregate::resample;
use dukastream_fetch::{
    ArchiveSource, BatchOrchestrator, FetchClient, HttpConfig, PeriodPlanner, PlanIter, UnitBatch,
    flatten_records,
};
use dukastream_instruments::InstrumentRegistry;
use dukastream_types::{
    DateRange, Error, Instrument, PriceType, Record, Result, StreamOptions, Timeframe,
};
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use tracing::debug;

/// A planned historical data request, ready to stream.
///
/// Created by [`history`]; consumed by [`records`](Self::records) or
/// [`records_with_progress`](Self::records_with_progress).
pub struct History<S> {
    instrument: Instrument,
    range: DateRange,
    timeframe: Timeframe,
    price: PriceType,
    plan: PlanIter,
    requires_resampling: bool,
    orchestrator: BatchOrchestrator<S>,
}

impl<S> std::fmt::Debug for History<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("instrument", &self.instrument.id())
            .field("range", &self.range)
            .field("timeframe", &self.timeframe)
            .field("requires_resampling", &self.requires_resampling)
            .finish_non_exhaustive()
    }
}

impl<S: ArchiveSource + 'static> History<S> {
    /// Returns the resolved instrument.
    #[must_use]
    pub const fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Returns the planned range, after clamping to the instrument's first
    /// data and to the current time.
    #[must_use]
    pub const fn range(&self) -> DateRange {
        self.range
    }

    /// Returns true if fetched records are resampled to reach the
    /// requested timeframe.
    #[must_use]
    pub const fn requires_resampling(&self) -> bool {
        self.requires_resampling
    }

    /// Returns the number of fetch units in the plan.
    #[must_use]
    pub fn planned_units(&self) -> usize {
        self.plan.clone().count()
    }

    /// Streams the records in time order.
    #[must_use]
    pub fn records(self) -> BoxStream<'static, Result<Record>> {
        self.records_with_progress(|_| {})
    }

    /// Streams the records in time order, calling `on_unit` as each fetch
    /// unit completes (or is skipped).
    #[must_use]
    pub fn records_with_progress<F>(self, mut on_unit: F) -> BoxStream<'static, Result<Record>>
    where
        F: FnMut(&UnitBatch) + Send + 'static,
    {
        let batches = self.orchestrator.unit_stream(self.plan).inspect(move |batch| {
            if let Ok(batch) = batch {
                on_unit(batch);
            }
        });
        let records = flatten_records(batches).boxed();

        if self.requires_resampling {
            resample(records, self.timeframe, self.price).boxed()
        } else {
            records
        }
    }
}

/// Plans a historical data request against `source`.
///
/// Resolves `instrument_id` through the global registry before any I/O,
/// clamps the requested range to the instrument's first available data and
/// to now, and plans the fetch units.
///
/// # Errors
///
/// Returns [`Error::UnknownInstrument`] if the instrument is not registered.
pub fn history<S: ArchiveSource + 'static>(
    instrument_id: &str,
    options: StreamOptions,
    source: Arc<S>,
) -> Result<History<S>> {
    history_at(
        InstrumentRegistry::global(),
        instrument_id,
        options,
        source,
        Utc::now(),
    )
}

/// Plans a historical data request over HTTP.
///
/// # Errors
///
/// Returns an error if the instrument is unknown or the HTTP client cannot
/// be created.
pub fn history_http(
    instrument_id: &str,
    options: StreamOptions,
    http: HttpConfig,
) -> Result<History<FetchClient>> {
    let instrument = InstrumentRegistry::global().lookup(instrument_id)?;
    let client = FetchClient::http(http, &options).map_err(|e| Error::Transport(e.to_string()))?;
    history_for(instrument.clone(), options, Arc::new(client), Utc::now())
}

/// Plans a historical data request against an explicit registry and clock.
///
/// # Errors
///
/// Returns [`Error::UnknownInstrument`] if the instrument is not in
/// `registry`.
pub fn history_at<S: ArchiveSource + 'static>(
    registry: &InstrumentRegistry,
    instrument_id: &str,
    options: StreamOptions,
    source: Arc<S>,
    now: DateTime<Utc>,
) -> Result<History<S>> {
    let instrument = registry.lookup(instrument_id)?.clone();
    history_for(instrument, options, source, now)
}

fn history_for<S: ArchiveSource + 'static>(
    instrument: Instrument,
    options: StreamOptions,
    source: Arc<S>,
    now: DateTime<Utc>,
) -> Result<History<S>> {
    let range = instrument.clamp_range(options.range().clamp_end(now));

    let planner = PeriodPlanner::new(
        instrument.remote_key(),
        options.timeframe(),
        options.price_type(),
        range,
        now,
    );
    let requires_resampling = planner.requires_resampling();
    debug!(
        instrument = instrument.id(),
        %range,
        timeframe = %options.timeframe(),
        requires_resampling,
        "planned request"
    );

    Ok(History {
        range,
        timeframe: options.timeframe(),
        price: options.price_type(),
        plan: planner.units(),
        requires_resampling,
        orchestrator: BatchOrchestrator::new(source, options, instrument.point_value()),
        instrument,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use byteorder::{BigEndian, ByteOrder};
    use chrono::{TimeDelta, TimeZone, Timelike};
    use dukastream_fetch::FetchError;
    use dukastream_types::{Category, DataKind, FetchUnit, PriceSide};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves one tick per tick file and 24 hourly bars per candle file;
    /// counts requests.
    #[derive(Default)]
    struct Synthetic {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ArchiveSource for Synthetic {
        async fn fetch_unit(
            &self,
            unit: &FetchUnit,
            _: PriceSide,
        ) -> std::result::Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut out = Vec::new();
            match unit.kind() {
                DataKind::Tick => {
                    let mut rec = [0u8; 20];
                    BigEndian::write_u32(&mut rec[0..4], 1_000);
                    BigEndian::write_i32(&mut rec[4..8], 11_000);
                    BigEndian::write_i32(&mut rec[8..12], 10_000);
                    BigEndian::write_f32(&mut rec[12..16], 1.0);
                    BigEndian::write_f32(&mut rec[16..20], 1.0);
                    out.extend_from_slice(&rec);
                }
                _ => {
                    for hour in 0..24 {
                        let mut rec = [0u8; 24];
                        BigEndian::write_i32(&mut rec[0..4], hour * 3600);
                        for field in 1..5 {
                            BigEndian::write_i32(&mut rec[field * 4..field * 4 + 4], 10_000);
                        }
                        BigEndian::write_f32(&mut rec[20..24], 1.0);
                        out.extend_from_slice(&rec);
                    }
                }
            }
            Ok(out)
        }
    }

    fn registry() -> InstrumentRegistry {
        InstrumentRegistry::from_instruments([Instrument::new(
            "testusd",
            "TEST/USD",
            "Test instrument",
            Category::Forex,
            10_000,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
        )])
    }

    fn options(from: DateTime<Utc>, to: DateTime<Utc>, tf: Timeframe) -> StreamOptions {
        StreamOptions::builder(DateRange::new(from, to).unwrap())
            .timeframe(tf)
            .pause_between_batches(Duration::ZERO)
            .ignore_flats(false)
            .build()
            .unwrap()
    }

    #[test]
    fn test_unknown_instrument_fails_before_io() {
        let source = Arc::new(Synthetic::default());
        let now = Utc.with_ymd_and_hms(2024, 3, 3, 0, 0, 0).unwrap();
        let err = history_at(
            &registry(),
            "nope",
            options(now - TimeDelta::days(1), now, Timeframe::Tick),
            Arc::clone(&source),
            now,
        )
        .unwrap_err();

        assert!(matches!(err, Error::UnknownInstrument(id) if id == "nope"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_range_clamped_to_first_data_and_now() {
        let now = Utc.with_ymd_and_hms(2024, 3, 3, 12, 0, 0).unwrap();
        let plan = history_at(
            &registry(),
            "testusd",
            options(
                Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
                Timeframe::Tick,
            ),
            Arc::new(Synthetic::default()),
            now,
        )
        .unwrap();

        assert_eq!(
            plan.range().from,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(plan.range().to, now);
        assert_eq!(plan.planned_units(), 60);
        assert!(!plan.requires_resampling());
    }

    #[tokio::test]
    async fn test_current_year_days_are_resampled() {
        let now = Utc.with_ymd_and_hms(2024, 3, 3, 12, 0, 0).unwrap();
        let source = Arc::new(Synthetic::default());
        let plan = history_at(
            &registry(),
            "testusd",
            options(
                Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 3, 3, 0, 0, 0).unwrap(),
                Timeframe::Day1,
            ),
            Arc::clone(&source),
            now,
        )
        .unwrap();
        assert!(plan.requires_resampling());

        let progressed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&progressed);
        let days: Vec<Record> = plan
            .records_with_progress(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(days.len(), 2);
        for day in &days {
            let bar = day.as_bar().unwrap();
            assert_eq!(bar.timestamp.hour(), 0);
            assert_eq!(bar.volume, 24.0);
            assert_eq!(bar.open, 1.0);
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(progressed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_seconds_resampled_from_ticks() {
        let now = Utc.with_ymd_and_hms(2024, 3, 3, 12, 0, 0).unwrap();
        let from = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let plan = history_at(
            &registry(),
            "testusd",
            options(from, from + TimeDelta::hours(2), Timeframe::Second1),
            Arc::new(Synthetic::default()),
            now,
        )
        .unwrap();

        let bars: Vec<_> = plan.records().collect().await;
        assert_eq!(bars.len(), 2);
        let first = *bars[0].as_ref().unwrap().as_bar().unwrap();
        assert_eq!(first.timestamp, from + TimeDelta::seconds(1));
        assert_eq!(first.close, 1.0);
    }
}
