//! OHLCV bar (candlestick) representation.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar (candlestick) data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time (start of the period).
    pub timestamp: DateTime<Utc>,
    /// Opening price.
    pub open: f64,
    /// Highest price during the period.
    pub high: f64,
    /// Lowest price during the period.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Traded volume.
    pub volume: f64,
}

impl Bar {
    /// Creates a new OHLCV bar.
    #[must_use]
    pub const fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if no volume traded during the bar.
    ///
    /// The archive fills closed-market periods with zero-volume bars
    /// that repeat the previous close.
    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.volume == 0.0
    }

    /// Combines a bid bar and an ask bar covering the same period into a
    /// mid-price bar.
    ///
    /// Prices are averaged, volumes are summed. The bid bar's timestamp is
    /// kept.
    #[must_use]
    pub fn mid_of(bid: &Self, ask: &Self) -> Self {
        Self {
            timestamp: bid.timestamp,
            open: (bid.open + ask.open) / 2.0,
            high: (bid.high + ask.high) / 2.0,
            low: (bid.low + ask.low) / 2.0,
            close: (bid.close + ask.close) / 2.0,
            volume: bid.volume + ask.volume,
        }
    }
}

/// Raw bar as read from a bi5 candle file (before price normalization).
///
/// Candle files store 24-byte big-endian records:
/// - `i32`: seconds offset from the period start
/// - `i32`: open, close, low, high prices (raw)
/// - `f32`: volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBar {
    /// Seconds offset from the period start.
    pub sec_offset: i32,
    /// Raw open price.
    pub open_raw: i32,
    /// Raw close price.
    pub close_raw: i32,
    /// Raw low price.
    pub low_raw: i32,
    /// Raw high price.
    pub high_raw: i32,
    /// Volume.
    pub volume: f32,
}

impl RawBar {
    /// Size in bytes of a raw bar record.
    pub const SIZE: usize = 24;

    /// Creates a new raw bar. Field order follows the on-disk layout.
    #[must_use]
    pub const fn new(
        sec_offset: i32,
        open_raw: i32,
        close_raw: i32,
        low_raw: i32,
        high_raw: i32,
        volume: f32,
    ) -> Self {
        Self {
            sec_offset,
            open_raw,
            close_raw,
            low_raw,
            high_raw,
            volume,
        }
    }

    /// Normalizes the raw bar against its file's period start.
    #[must_use]
    pub fn normalize(self, period_start: DateTime<Utc>, point_value: f64) -> Bar {
        Bar {
            timestamp: period_start + TimeDelta::seconds(i64::from(self.sec_offset)),
            open: f64::from(self.open_raw) / point_value,
            high: f64::from(self.high_raw) / point_value,
            low: f64::from(self.low_raw) / point_value,
            close: f64::from(self.close_raw) / point_value,
            volume: f64::from(self.volume),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_test_bar() -> Bar {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        Bar::new(timestamp, 1.1000, 1.1050, 1.0980, 1.1020, 1000.0)
    }

    #[test]
    fn test_flat() {
        let mut bar = create_test_bar();
        assert!(!bar.is_flat());
        bar.volume = 0.0;
        assert!(bar.is_flat());
    }

    #[test]
    fn test_mid_of() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let bid = Bar::new(ts, 1.0, 1.4, 0.9, 1.2, 10.0);
        let ask = Bar::new(ts, 1.2, 1.6, 1.1, 1.4, 5.0);
        let mid = Bar::mid_of(&bid, &ask);

        assert_eq!(mid.open, (1.0 + 1.2) / 2.0);
        assert_eq!(mid.high, (1.4 + 1.6) / 2.0);
        assert_eq!(mid.low, (0.9 + 1.1) / 2.0);
        assert_eq!(mid.close, (1.2 + 1.4) / 2.0);
        assert_eq!(mid.volume, 15.0);
    }

    #[test]
    fn test_raw_bar_normalize() {
        let day = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let raw = RawBar::new(120, 110_000, 110_020, 109_990, 110_050, 3.5);
        let bar = raw.normalize(day, 100_000.0);

        assert_eq!(bar.timestamp, day + TimeDelta::minutes(2));
        assert_eq!(bar.open, 110_000.0 / 100_000.0);
        assert_eq!(bar.close, 110_020.0 / 100_000.0);
        assert_eq!(bar.low, 109_990.0 / 100_000.0);
        assert_eq!(bar.high, 110_050.0 / 100_000.0);
        assert_eq!(bar.volume, 3.5);
    }
}
