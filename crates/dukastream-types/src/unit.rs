//! Descriptor of one remote archive file.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{DataKind, PriceSide, PriceType};

/// One remote resource to fetch: a file kind, an instrument, a period
/// anchor and the requested price type.
///
/// A mid-price unit stands for two physical files (bid and ask) that are
/// merged after decoding. Units are immutable once planned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchUnit {
    kind: DataKind,
    instrument: Arc<str>,
    anchor: DateTime<Utc>,
    price: PriceType,
}

impl FetchUnit {
    /// Creates a new unit. `anchor` is truncated to the start of the kind's
    /// period.
    #[must_use]
    pub fn new(
        kind: DataKind,
        instrument: Arc<str>,
        anchor: DateTime<Utc>,
        price: PriceType,
    ) -> Self {
        Self {
            kind,
            instrument,
            anchor: kind.period_start(anchor),
            price,
        }
    }

    /// Returns the file kind.
    #[must_use]
    pub const fn kind(&self) -> DataKind {
        self.kind
    }

    /// Returns the remote instrument key.
    #[must_use]
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Returns the start of the period covered by the file.
    #[must_use]
    pub const fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    /// Returns the requested price type.
    #[must_use]
    pub const fn price(&self) -> PriceType {
        self.price
    }

    /// Returns the physical file sides to fetch for this unit.
    ///
    /// Tick files hold both sides, so a single fetch suffices regardless of
    /// price type.
    #[must_use]
    pub fn sides(&self) -> &'static [PriceSide] {
        match (self.kind, self.price.side()) {
            (DataKind::Tick, _) | (_, Some(PriceSide::Bid)) => &[PriceSide::Bid],
            (_, Some(PriceSide::Ask)) => &[PriceSide::Ask],
            (_, None) => &[PriceSide::Bid, PriceSide::Ask],
        }
    }

    /// Returns true if the records of this unit need resampling to reach
    /// `timeframe`.
    #[must_use]
    pub fn needs_resampling(&self, timeframe: crate::Timeframe) -> bool {
        self.kind.native_timeframe() != timeframe
    }
}

impl std::fmt::Display for FetchUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} @ {}",
            self.instrument,
            self.kind,
            self.price,
            self.anchor.format("%Y-%m-%dT%H:%MZ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Timeframe;
    use chrono::TimeZone;

    #[test]
    fn test_anchor_is_truncated() {
        let t = Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap();
        let unit = FetchUnit::new(DataKind::HourBar, "EURUSD".into(), t, PriceType::Bid);
        assert_eq!(unit.anchor(), Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        assert_eq!(
            unit.kind().next_period_start(unit.anchor()),
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_sides() {
        let t = Utc.with_ymd_and_hms(2024, 5, 17, 9, 0, 0).unwrap();
        let mid_bars = FetchUnit::new(DataKind::MinuteBar, "EURUSD".into(), t, PriceType::Mid);
        assert_eq!(mid_bars.sides(), &[PriceSide::Bid, PriceSide::Ask]);

        let mid_ticks = FetchUnit::new(DataKind::Tick, "EURUSD".into(), t, PriceType::Mid);
        assert_eq!(mid_ticks.sides(), &[PriceSide::Bid]);

        let ask = FetchUnit::new(DataKind::DayBar, "EURUSD".into(), t, PriceType::Ask);
        assert_eq!(ask.sides(), &[PriceSide::Ask]);
    }

    #[test]
    fn test_needs_resampling() {
        let t = Utc.with_ymd_and_hms(2024, 5, 17, 9, 0, 0).unwrap();
        let unit = FetchUnit::new(DataKind::HourBar, "EURUSD".into(), t, PriceType::Bid);
        assert!(!unit.needs_resampling(Timeframe::Hour1));
        assert!(unit.needs_resampling(Timeframe::Day1));
    }
}
