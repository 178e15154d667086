//! Batched, ordered streaming of planned fetch units.

use async_trait::async_trait;
use dukastream_types::{Error, FetchUnit, PriceSide, PriceType, Record, StreamOptions};
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::FetchError;
use crate::decode::{decode, decode_bars, merge_mid};
use crate::planner::is_tick_sourced;

/// A source of decompressed archive payloads.
///
/// Implemented by [`FetchClient`](crate::FetchClient); tests substitute
/// in-memory sources.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Fetches the decompressed payload of one side of `unit`. An empty
    /// payload means the period holds no data.
    async fn fetch_unit(&self, unit: &FetchUnit, side: PriceSide) -> Result<Vec<u8>, FetchError>;
}

/// The records of a single fetch unit.
#[derive(Debug, Clone)]
pub struct UnitBatch {
    /// The unit the records were decoded from.
    pub unit: FetchUnit,
    /// The records, after filtering, volume scaling and time shifting.
    pub records: Vec<Record>,
    /// Whether the unit failed and was skipped.
    pub skipped: bool,
}

impl UnitBatch {
    /// Creates a batch for a successfully processed unit.
    #[must_use]
    pub const fn new(unit: FetchUnit, records: Vec<Record>) -> Self {
        Self {
            unit,
            records,
            skipped: false,
        }
    }

    /// Creates an empty batch for a unit that failed and was skipped.
    #[must_use]
    pub const fn skipped(unit: FetchUnit) -> Self {
        Self {
            unit,
            records: Vec::new(),
            skipped: true,
        }
    }

    /// Returns true if the batch holds no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the number of records in the batch.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }
}

/// Drives planned units through an [`ArchiveSource`] in bounded batches.
///
/// Units of one batch are fetched concurrently, each under the per-unit
/// timeout; results are emitted in plan order regardless of completion
/// order. The next batch is launched only once the consumer has drained the
/// previous one and the inter-batch pause has elapsed.
pub struct BatchOrchestrator<S> {
    source: Arc<S>,
    options: Arc<StreamOptions>,
    point_value: f64,
}

impl<S> std::fmt::Debug for BatchOrchestrator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchOrchestrator")
            .field("options", &self.options)
            .field("point_value", &self.point_value)
            .finish_non_exhaustive()
    }
}

impl<S> Clone for BatchOrchestrator<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            options: Arc::clone(&self.options),
            point_value: self.point_value,
        }
    }
}

struct Cursor<I> {
    plan: I,
    batch: usize,
    halted: bool,
}

impl<S: ArchiveSource + 'static> BatchOrchestrator<S> {
    /// Creates an orchestrator. `point_value` is the instrument's default,
    /// used unless the options override it.
    #[must_use]
    pub fn new(source: Arc<S>, options: StreamOptions, point_value: u32) -> Self {
        let point_value = options.point_value().unwrap_or(point_value);
        Self {
            source,
            options: Arc::new(options),
            point_value: f64::from(point_value),
        }
    }

    /// Returns the number of units launched per batch.
    ///
    /// Mid-price bar units cost two requests each, so their batches are
    /// halved.
    #[must_use]
    pub fn effective_batch_size(&self) -> usize {
        let size = self.options.batch_size();
        if self.options.price_type() == PriceType::Mid
            && !is_tick_sourced(self.options.timeframe())
        {
            (size / 2).max(1)
        } else {
            size.max(1)
        }
    }

    /// Streams one [`UnitBatch`] per planned unit, in plan order.
    ///
    /// With `halt_on_error` the first failing unit ends the stream with its
    /// error (after the preceding units of its batch); otherwise failing
    /// units are logged and yielded as skipped.
    pub fn unit_stream<I>(self, plan: I) -> impl Stream<Item = Result<UnitBatch, Error>> + Send
    where
        I: Iterator<Item = FetchUnit> + Send + 'static,
    {
        let batch_size = self.effective_batch_size();
        let cursor = Cursor {
            plan,
            batch: 0,
            halted: false,
        };

        stream::unfold(cursor, move |mut cursor| {
            let this = self.clone();
            async move {
                if cursor.halted {
                    return None;
                }
                let units: Vec<FetchUnit> = cursor.plan.by_ref().take(batch_size).collect();
                if units.is_empty() {
                    return None;
                }

                if cursor.batch > 0 {
                    let pause = this.options.pause_between_batches();
                    if !pause.is_zero() {
                        debug!(pause_ms = pause.as_millis() as u64, "pausing between batches");
                        tokio::time::sleep(pause).await;
                    }
                }
                cursor.batch += 1;
                info!(batch = cursor.batch, units = units.len(), "fetching batch");

                let results = this.run_batch(&units).await;
                let mut out = Vec::with_capacity(units.len());
                for (unit, result) in units.into_iter().zip(results) {
                    match result {
                        Ok(records) => out.push(Ok(UnitBatch::new(unit, records))),
                        Err(e) if this.options.halt_on_error() => {
                            out.push(Err(e));
                            cursor.halted = true;
                            break;
                        }
                        Err(e) => {
                            warn!(%unit, error = %e, "skipping failed unit");
                            out.push(Ok(UnitBatch::skipped(unit)));
                        }
                    }
                }
                Some((stream::iter(out), cursor))
            }
        })
        .flatten()
    }

    /// Streams the records of all planned units, in plan order.
    pub fn record_stream<I>(self, plan: I) -> impl Stream<Item = Result<Record, Error>> + Send
    where
        I: Iterator<Item = FetchUnit> + Send + 'static,
    {
        flatten_records(self.unit_stream(plan))
    }

    /// Fetches the units of one batch concurrently. Results keep the order
    /// of `units`.
    async fn run_batch(&self, units: &[FetchUnit]) -> Vec<Result<Vec<Record>, Error>> {
        let timeout = self.options.unit_timeout();
        let handles: Vec<_> = units
            .iter()
            .map(|unit| {
                let this = self.clone();
                let unit = unit.clone();
                tokio::spawn(async move {
                    match tokio::time::timeout(timeout, this.process_unit(&unit)).await {
                        Ok(result) => result,
                        Err(_) => Err(Error::Timeout {
                            unit: unit.to_string(),
                            after: timeout,
                        }),
                    }
                })
            })
            .collect();

        futures::future::join_all(handles)
            .await
            .into_iter()
            .zip(units)
            .map(|(joined, unit)| match joined {
                Ok(result) => result,
                Err(e) => match e.try_into_panic() {
                    Ok(payload) => std::panic::resume_unwind(payload),
                    Err(_) => Err(Error::Cancelled {
                        unit: unit.to_string(),
                    }),
                },
            })
            .collect()
    }

    /// Fetches, decodes and post-processes one unit.
    async fn process_unit(&self, unit: &FetchUnit) -> Result<Vec<Record>, Error> {
        let records = match unit.sides() {
            [side] => {
                let payload = self.source.fetch_unit(unit, *side).await?;
                decode(&payload, unit.kind(), unit.anchor(), self.point_value)?
            }
            _ => {
                let (bid, ask) = futures::try_join!(
                    self.source.fetch_unit(unit, PriceSide::Bid),
                    self.source.fetch_unit(unit, PriceSide::Ask),
                )?;
                let bid = decode_bars(&bid, unit.kind(), unit.anchor(), self.point_value)?;
                let ask = decode_bars(&ask, unit.kind(), unit.anchor(), self.point_value)?;
                merge_mid(&bid, &ask)?
                    .into_iter()
                    .map(Record::Bar)
                    .collect()
            }
        };
        debug!(%unit, records = records.len(), "decoded unit");
        Ok(self.post_process(records))
    }

    /// Applies, in order: flat-bar filtering, volume scaling, trimming to
    /// the requested range (on the original UTC instant) and the time shift.
    fn post_process(&self, records: Vec<Record>) -> Vec<Record> {
        let options = &self.options;
        let range = options.range();
        let multiplier = options.volume_multiplier();
        let shifts = options.shifts_time();

        records
            .into_iter()
            .filter(|r| !(options.ignore_flats() && r.is_flat()))
            .map(|r| {
                if (multiplier - 1.0).abs() > f64::EPSILON {
                    r.scale_volume(multiplier)
                } else {
                    r
                }
            })
            .filter(|r| range.contains(r.timestamp()))
            .map(|r| {
                if shifts {
                    r.shift(options.time_shift(r.timestamp()))
                } else {
                    r
                }
            })
            .collect()
    }
}

/// Flattens a unit batch stream into individual records.
pub fn flatten_records(
    batches: impl Stream<Item = Result<UnitBatch, Error>>,
) -> impl Stream<Item = Result<Record, Error>> {
    batches.flat_map(|result| match result {
        Ok(batch) => stream::iter(batch.records.into_iter().map(Ok)).left_stream(),
        Err(e) => stream::once(async move { Err(e) }).right_stream(),
    })
}
