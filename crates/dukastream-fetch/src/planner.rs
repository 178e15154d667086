//! Fetch planning: which remote files cover a date range.
//!
//! Coarse candle files only exist once their period has fully elapsed. For
//! a period that still contains "now", the planner falls back to the next
//! finer file kind of the timeframe's fallback list, down to the finest,
//! which is used even for the current period.

use chrono::{DateTime, Utc};
use dukastream_types::{DataKind, DateRange, FetchUnit, PriceType, Timeframe};
use std::sync::Arc;

/// Returns the file kinds that can serve `timeframe`, coarsest first.
#[must_use]
pub const fn fallback_kinds(timeframe: Timeframe) -> &'static [DataKind] {
    match timeframe {
        Timeframe::Tick | Timeframe::Second1 => &[DataKind::Tick],
        Timeframe::Minute1 | Timeframe::Minute5 | Timeframe::Minute15 | Timeframe::Minute30 => {
            &[DataKind::MinuteBar]
        }
        Timeframe::Hour1 | Timeframe::Hour4 => &[DataKind::HourBar, DataKind::MinuteBar],
        Timeframe::Day1 | Timeframe::Month1 => {
            &[DataKind::DayBar, DataKind::HourBar, DataKind::MinuteBar]
        }
    }
}

/// Returns true if `timeframe` is served from tick files.
#[must_use]
pub const fn is_tick_sourced(timeframe: Timeframe) -> bool {
    matches!(fallback_kinds(timeframe), [DataKind::Tick])
}

/// Plans the ordered, gap-free sequence of fetch units covering a range.
#[derive(Debug, Clone)]
pub struct PeriodPlanner {
    instrument: Arc<str>,
    timeframe: Timeframe,
    price: PriceType,
    range: DateRange,
    now: DateTime<Utc>,
}

impl PeriodPlanner {
    /// Creates a planner for `instrument` (the remote key) as of `now`.
    #[must_use]
    pub fn new(
        instrument: impl Into<Arc<str>>,
        timeframe: Timeframe,
        price: PriceType,
        range: DateRange,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            timeframe,
            price,
            range,
            now,
        }
    }

    /// Returns a lazy iterator over the planned units.
    #[must_use]
    pub fn units(&self) -> PlanIter {
        PlanIter {
            instrument: Arc::clone(&self.instrument),
            kinds: fallback_kinds(self.timeframe),
            price: self.price,
            end: self.range.to,
            now: self.now,
            cursor: (!self.range.is_empty()).then_some(self.range.from),
        }
    }

    /// Returns true if any planned unit is coarser or finer than the
    /// requested timeframe, so the decoded records must be resampled.
    #[must_use]
    pub fn requires_resampling(&self) -> bool {
        self.units().any(|u| u.needs_resampling(self.timeframe))
    }
}

/// Lazy iterator over planned [`FetchUnit`]s, in chronological order.
#[derive(Debug, Clone)]
pub struct PlanIter {
    instrument: Arc<str>,
    kinds: &'static [DataKind],
    price: PriceType,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
    cursor: Option<DateTime<Utc>>,
}

impl PlanIter {
    /// Picks the coarsest kind whose period at `cursor` has elapsed.
    fn kind_at(&self, cursor: DateTime<Utc>) -> DataKind {
        let (finest, coarser) = self
            .kinds
            .split_last()
            .map_or((DataKind::Tick, &[][..]), |(last, rest)| (*last, rest));
        coarser
            .iter()
            .copied()
            .find(|kind| !kind.is_current(cursor, self.now))
            .unwrap_or(finest)
    }
}

impl Iterator for PlanIter {
    type Item = FetchUnit;

    fn next(&mut self) -> Option<FetchUnit> {
        let cursor = self.cursor?;
        let kind = self.kind_at(cursor);
        let start = kind.period_start(cursor);

        if start >= self.end || start > self.now {
            self.cursor = None;
            return None;
        }

        self.cursor = kind.next_period_start(start);
        Some(FetchUnit::new(
            kind,
            Arc::clone(&self.instrument),
            start,
            self.price,
        ))
    }
}
