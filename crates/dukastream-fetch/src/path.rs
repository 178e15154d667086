//! Remote archive path construction.
//!
//! The archive uses 0-indexed months in paths (January = `00`).

use chrono::{DateTime, Datelike, Timelike, Utc};
use dukastream_types::{DataKind, FetchUnit, PriceSide};

/// Base URL of the archive's data feed.
pub const BASE_URL: &str = "https://datafeed.dukascopy.com/datafeed";

/// Builds the archive path of one file, relative to [`BASE_URL`].
///
/// | kind         | path                                                   |
/// |--------------|--------------------------------------------------------|
/// | tick         | `{KEY}/{YEAR}/{MM}/{DD}/{HH}h_ticks.bi5`               |
/// | minute bars  | `{KEY}/{YEAR}/{MM}/{DD}/{SIDE}_candles_min_1.bi5`      |
/// | hour bars    | `{KEY}/{YEAR}/{MM}/{SIDE}_candles_hour_1.bi5`          |
/// | day bars     | `{KEY}/{YEAR}/{SIDE}_candles_day_1.bi5`                |
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use dukastream_fetch::path::resolve_path;
/// use dukastream_types::{DataKind, PriceSide};
///
/// let hour = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
/// let path = resolve_path("EURUSD", DataKind::Tick, hour, PriceSide::Bid);
/// assert_eq!(path, "EURUSD/2024/00/15/12h_ticks.bi5");
/// ```
#[must_use]
pub fn resolve_path(
    instrument: &str,
    kind: DataKind,
    anchor: DateTime<Utc>,
    side: PriceSide,
) -> String {
    let year = anchor.year();
    let month = anchor.month0();
    let day = anchor.day();
    let side = side.as_path_token();

    match kind {
        DataKind::Tick => format!(
            "{instrument}/{year}/{month:02}/{day:02}/{:02}h_ticks.bi5",
            anchor.hour()
        ),
        DataKind::MinuteBar => {
            format!("{instrument}/{year}/{month:02}/{day:02}/{side}_candles_min_1.bi5")
        }
        DataKind::HourBar => format!("{instrument}/{year}/{month:02}/{side}_candles_hour_1.bi5"),
        DataKind::DayBar => format!("{instrument}/{year}/{side}_candles_day_1.bi5"),
    }
}

/// Builds the archive path of one side of a fetch unit.
#[must_use]
pub fn unit_path(unit: &FetchUnit, side: PriceSide) -> String {
    resolve_path(unit.instrument(), unit.kind(), unit.anchor(), side)
}

/// Joins a base URL and an archive path.
#[must_use]
pub fn url_for(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}
