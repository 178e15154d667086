//! A decoded archive record: either a tick or a bar.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{Bar, Tick};

/// A single decoded record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    /// A quote tick.
    Tick(Tick),
    /// An OHLCV bar.
    Bar(Bar),
}

impl Record {
    /// Returns the record's timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Tick(tick) => tick.timestamp,
            Self::Bar(bar) => bar.timestamp,
        }
    }

    /// Returns true for zero-volume bars. Ticks are never flat.
    #[must_use]
    pub fn is_flat(&self) -> bool {
        match self {
            Self::Tick(_) => false,
            Self::Bar(bar) => bar.is_flat(),
        }
    }

    /// Multiplies every volume field by `multiplier`.
    #[must_use]
    pub fn scale_volume(self, multiplier: f64) -> Self {
        match self {
            Self::Tick(mut tick) => {
                tick.ask_volume *= multiplier;
                tick.bid_volume *= multiplier;
                Self::Tick(tick)
            }
            Self::Bar(mut bar) => {
                bar.volume *= multiplier;
                Self::Bar(bar)
            }
        }
    }

    /// Moves the timestamp by `delta`.
    #[must_use]
    pub fn shift(self, delta: TimeDelta) -> Self {
        match self {
            Self::Tick(mut tick) => {
                tick.timestamp += delta;
                Self::Tick(tick)
            }
            Self::Bar(mut bar) => {
                bar.timestamp += delta;
                Self::Bar(bar)
            }
        }
    }

    /// Returns the tick, if this is one.
    #[must_use]
    pub const fn as_tick(&self) -> Option<&Tick> {
        match self {
            Self::Tick(tick) => Some(tick),
            Self::Bar(_) => None,
        }
    }

    /// Returns the bar, if this is one.
    #[must_use]
    pub const fn as_bar(&self) -> Option<&Bar> {
        match self {
            Self::Tick(_) => None,
            Self::Bar(bar) => Some(bar),
        }
    }
}

impl From<Tick> for Record {
    fn from(tick: Tick) -> Self {
        Self::Tick(tick)
    }
}

impl From<Bar> for Record {
    fn from(bar: Bar) -> Self {
        Self::Bar(bar)
    }
}
