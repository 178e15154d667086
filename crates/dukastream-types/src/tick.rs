//! Tick data representation.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A single tick representing a quote update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Timestamp of the tick (UTC, millisecond precision).
    pub timestamp: DateTime<Utc>,
    /// Ask (offer) price.
    pub ask: f64,
    /// Bid price.
    pub bid: f64,
    /// Volume available at the ask price.
    pub ask_volume: f64,
    /// Volume available at the bid price.
    pub bid_volume: f64,
}

impl Tick {
    /// Creates a new tick.
    #[must_use]
    pub const fn new(
        timestamp: DateTime<Utc>,
        ask: f64,
        bid: f64,
        ask_volume: f64,
        bid_volume: f64,
    ) -> Self {
        Self {
            timestamp,
            ask,
            bid,
            ask_volume,
            bid_volume,
        }
    }

    /// Returns the mid price (average of ask and bid).
    #[must_use]
    pub fn mid(&self) -> f64 {
        (self.ask + self.bid) / 2.0
    }

    /// Returns the total volume (ask + bid volume).
    #[must_use]
    pub fn total_volume(&self) -> f64 {
        self.ask_volume + self.bid_volume
    }
}

/// Raw tick as read from a bi5 tick file (before price normalization).
///
/// Tick files store 20-byte big-endian records:
/// - `u32`: milliseconds offset from the hour start
/// - `i32`: ask price (raw, divided by the point value)
/// - `i32`: bid price (raw, divided by the point value)
/// - `f32`: ask volume
/// - `f32`: bid volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawTick {
    /// Milliseconds offset from the hour start.
    pub ms_offset: u32,
    /// Raw ask price.
    pub ask_raw: i32,
    /// Raw bid price.
    pub bid_raw: i32,
    /// Ask volume.
    pub ask_volume: f32,
    /// Bid volume.
    pub bid_volume: f32,
}

impl RawTick {
    /// Size in bytes of a raw tick record.
    pub const SIZE: usize = 20;

    /// Creates a new raw tick.
    #[must_use]
    pub const fn new(
        ms_offset: u32,
        ask_raw: i32,
        bid_raw: i32,
        ask_volume: f32,
        bid_volume: f32,
    ) -> Self {
        Self {
            ms_offset,
            ask_raw,
            bid_raw,
            ask_volume,
            bid_volume,
        }
    }

    /// Normalizes the raw tick using the instrument's point value.
    ///
    /// EUR/USD has a point value of 100,000, so a raw price of 112345
    /// becomes 1.12345.
    #[must_use]
    pub fn normalize(self, hour_start: DateTime<Utc>, point_value: f64) -> Tick {
        let timestamp = hour_start + TimeDelta::milliseconds(i64::from(self.ms_offset));
        Tick {
            timestamp,
            ask: f64::from(self.ask_raw) / point_value,
            bid: f64::from(self.bid_raw) / point_value,
            ask_volume: f64::from(self.ask_volume),
            bid_volume: f64::from(self.bid_volume),
        }
    }
}
