//! Remote file kinds and their covering periods.
//!
//! Every file in the archive covers one calendar period: tick files one
//! hour, minute-candle files one day, hour-candle files one month and
//! day-candle files one year.

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeDelta, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::Timeframe;

/// The kind of data stored in one remote file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataKind {
    /// Hourly tick file.
    Tick,
    /// Daily file of 1-minute bars.
    MinuteBar,
    /// Monthly file of 1-hour bars.
    HourBar,
    /// Yearly file of 1-day bars.
    DayBar,
}

impl DataKind {
    /// Returns the timeframe of the records stored in this kind of file.
    #[must_use]
    pub const fn native_timeframe(&self) -> Timeframe {
        match self {
            Self::Tick => Timeframe::Tick,
            Self::MinuteBar => Timeframe::Minute1,
            Self::HourBar => Timeframe::Hour1,
            Self::DayBar => Timeframe::Day1,
        }
    }

    /// Returns the width in bytes of one decoded record.
    #[must_use]
    pub const fn record_size(&self) -> usize {
        match self {
            Self::Tick => crate::RawTick::SIZE,
            Self::MinuteBar | Self::HourBar | Self::DayBar => crate::RawBar::SIZE,
        }
    }

    /// Truncates `time` to the start of the file period containing it.
    #[must_use]
    pub fn period_start(&self, time: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Tick => {
                let date = time.date_naive();
                midnight(date) + TimeDelta::hours(i64::from(time.hour()))
            }
            Self::MinuteBar => midnight(time.date_naive()),
            Self::HourBar => midnight(time.date_naive().with_day(1).unwrap_or(time.date_naive())),
            Self::DayBar => midnight(
                NaiveDate::from_ymd_opt(time.year(), 1, 1).unwrap_or(time.date_naive()),
            ),
        }
    }

    /// Returns the start of the file period following the one starting at
    /// `start`.
    ///
    /// `None` only when the calendar overflows.
    #[must_use]
    pub fn next_period_start(&self, start: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Tick => start.checked_add_signed(TimeDelta::hours(1)),
            Self::MinuteBar => start.checked_add_signed(TimeDelta::days(1)),
            Self::HourBar => start.checked_add_months(Months::new(1)),
            Self::DayBar => start.checked_add_months(Months::new(12)),
        }
    }

    /// Returns true if the file period containing `time` also contains `now`,
    /// i.e. the period has not fully elapsed yet.
    #[must_use]
    pub fn is_current(&self, time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.period_start(time) == self.period_start(now)
    }

    /// Returns the kind's identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tick => "tick",
            Self::MinuteBar => "minute-bar",
            Self::HourBar => "hour-bar",
            Self::DayBar => "day-bar",
        }
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}
