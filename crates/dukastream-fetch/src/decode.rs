//! Binary record decoding from decompressed bi5 payloads.

use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, Utc};
use dukastream_types::{Bar, DataKind, RawBar, RawTick, Record, Tick};
use thiserror::Error;

/// Errors that can occur while decoding a payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload length is not a whole number of records.
    #[error("Invalid data length: {len} bytes (expected multiple of {record_size})")]
    InvalidFormat {
        /// Payload length in bytes.
        len: usize,
        /// Record width in bytes.
        record_size: usize,
    },

    /// Bid and ask candles cannot be merged into mid-price bars.
    #[error("Mismatched bid/ask candles: {bid} bid vs {ask} ask")]
    MismatchedSides {
        /// Number of bid bars.
        bid: usize,
        /// Number of ask bars.
        ask: usize,
    },
}

impl From<DecodeError> for dukastream_types::Error {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::InvalidFormat { len, record_size } => {
                Self::InvalidFormat { len, record_size }
            }
            DecodeError::MismatchedSides { bid, ask } => Self::MismatchedSides { bid, ask },
        }
    }
}

fn check_len(data: &[u8], record_size: usize) -> Result<(), DecodeError> {
    if data.len().is_multiple_of(record_size) {
        Ok(())
    } else {
        Err(DecodeError::InvalidFormat {
            len: data.len(),
            record_size,
        })
    }
}

/// Parses raw ticks from a decompressed tick payload.
///
/// Tick records are 20 bytes, big-endian:
/// - `u32`: milliseconds offset from the hour start (bytes 0-3)
/// - `i32`: ask price raw (bytes 4-7)
/// - `i32`: bid price raw (bytes 8-11)
/// - `f32`: ask volume (bytes 12-15)
/// - `f32`: bid volume (bytes 16-19)
///
/// # Errors
///
/// Returns an error if the data length is not a multiple of 20.
pub fn parse_ticks(data: &[u8]) -> Result<impl Iterator<Item = RawTick> + '_, DecodeError> {
    check_len(data, RawTick::SIZE)?;
    Ok(data.chunks_exact(RawTick::SIZE).map(parse_single_tick))
}

#[inline]
fn parse_single_tick(data: &[u8]) -> RawTick {
    RawTick::new(
        BigEndian::read_u32(&data[0..4]),
        BigEndian::read_i32(&data[4..8]),
        BigEndian::read_i32(&data[8..12]),
        BigEndian::read_f32(&data[12..16]),
        BigEndian::read_f32(&data[16..20]),
    )
}

/// Parses raw bars from a decompressed candle payload.
///
/// Candle records are 24 bytes, big-endian: a seconds offset, then open,
/// close, low and high as `i32`, then an `f32` volume.
///
/// # Errors
///
/// Returns an error if the data length is not a multiple of 24.
pub fn parse_bars(data: &[u8]) -> Result<impl Iterator<Item = RawBar> + '_, DecodeError> {
    check_len(data, RawBar::SIZE)?;
    Ok(data.chunks_exact(RawBar::SIZE).map(parse_single_bar))
}

#[inline]
fn parse_single_bar(data: &[u8]) -> RawBar {
    RawBar::new(
        BigEndian::read_i32(&data[0..4]),
        BigEndian::read_i32(&data[4..8]),
        BigEndian::read_i32(&data[8..12]),
        BigEndian::read_i32(&data[12..16]),
        BigEndian::read_i32(&data[16..20]),
        BigEndian::read_f32(&data[20..24]),
    )
}

/// Decodes a tick payload anchored at `hour`.
///
/// # Errors
///
/// Returns an error if the payload length is invalid.
pub fn decode_ticks(
    data: &[u8],
    hour: DateTime<Utc>,
    point_value: f64,
) -> Result<Vec<Tick>, DecodeError> {
    Ok(parse_ticks(data)?
        .map(|raw| raw.normalize(hour, point_value))
        .collect())
}

/// Decodes a candle payload of `kind` whose period contains `anchor`.
///
/// # Errors
///
/// Returns an error if the payload length is invalid.
pub fn decode_bars(
    data: &[u8],
    kind: DataKind,
    anchor: DateTime<Utc>,
    point_value: f64,
) -> Result<Vec<Bar>, DecodeError> {
    let period_start = kind.period_start(anchor);
    Ok(parse_bars(data)?
        .map(|raw| raw.normalize(period_start, point_value))
        .collect())
}

/// Decodes a payload of any kind into records.
///
/// # Errors
///
/// Returns an error if the payload length is not a multiple of the kind's
/// record width.
pub fn decode(
    data: &[u8],
    kind: DataKind,
    anchor: DateTime<Utc>,
    point_value: f64,
) -> Result<Vec<Record>, DecodeError> {
    Ok(match kind {
        DataKind::Tick => decode_ticks(data, kind.period_start(anchor), point_value)?
            .into_iter()
            .map(Record::Tick)
            .collect(),
        _ => decode_bars(data, kind, anchor, point_value)?
            .into_iter()
            .map(Record::Bar)
            .collect(),
    })
}

/// Merges decoded bid and ask candles of the same file period into
/// mid-price bars.
///
/// Both sides must hold the same number of bars with pairwise equal
/// timestamps.
///
/// # Errors
///
/// Returns [`DecodeError::MismatchedSides`] if the two sides do not line up.
pub fn merge_mid(bid: &[Bar], ask: &[Bar]) -> Result<Vec<Bar>, DecodeError> {
    let mismatch = || DecodeError::MismatchedSides {
        bid: bid.len(),
        ask: ask.len(),
    };
    if bid.len() != ask.len() {
        return Err(mismatch());
    }
    bid.iter()
        .zip(ask)
        .map(|(b, a)| {
            if b.timestamp == a.timestamp {
                Ok(Bar::mid_of(b, a))
            } else {
                Err(mismatch())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeDelta, TimeZone};

    fn tick_bytes(ms: u32, ask: i32, bid: i32, ask_vol: f32, bid_vol: f32) -> Vec<u8> {
        let mut bytes = vec![0u8; 20];
        BigEndian::write_u32(&mut bytes[0..4], ms);
        BigEndian::write_i32(&mut bytes[4..8], ask);
        BigEndian::write_i32(&mut bytes[8..12], bid);
        BigEndian::write_f32(&mut bytes[12..16], ask_vol);
        BigEndian::write_f32(&mut bytes[16..20], bid_vol);
        bytes
    }

    fn bar_bytes(sec: i32, open: i32, close: i32, low: i32, high: i32, vol: f32) -> Vec<u8> {
        let mut bytes = vec![0u8; 24];
        BigEndian::write_i32(&mut bytes[0..4], sec);
        BigEndian::write_i32(&mut bytes[4..8], open);
        BigEndian::write_i32(&mut bytes[8..12], close);
        BigEndian::write_i32(&mut bytes[12..16], low);
        BigEndian::write_i32(&mut bytes[16..20], high);
        BigEndian::write_f32(&mut bytes[20..24], vol);
        bytes
    }

    #[test]
    fn test_decode_single_tick() {
        let hour = Utc.with_ymd_and_hms(2019, 2, 4, 0, 0, 0).unwrap();
        let data = tick_bytes(994, 114_545, 114_543, 1.0, 2.06);
        let ticks = decode_ticks(&data, hour, 100_000.0).unwrap();

        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].timestamp, hour + TimeDelta::milliseconds(994));
        assert_relative_eq!(ticks[0].ask, 1.14545, epsilon = 1e-10);
        assert_relative_eq!(ticks[0].bid, 1.14543, epsilon = 1e-10);
        assert_relative_eq!(ticks[0].ask_volume, 1.0, epsilon = 1e-6);
        assert_relative_eq!(ticks[0].bid_volume, 2.06, epsilon = 1e-6);
    }

    #[test]
    fn test_one_byte_short_is_invalid() {
        let data = tick_bytes(994, 114_545, 114_543, 1.0, 2.06);
        assert_eq!(
            parse_ticks(&data[..19]).err(),
            Some(DecodeError::InvalidFormat {
                len: 19,
                record_size: 20
            })
        );
    }

    #[test]
    fn test_empty_payload() {
        let anchor = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert!(decode(&[], DataKind::Tick, anchor, 1000.0).unwrap().is_empty());
        assert!(
            decode(&[], DataKind::DayBar, anchor, 1000.0)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_decode_minute_bars() {
        let day = Utc.with_ymd_and_hms(2019, 2, 4, 0, 0, 0).unwrap();
        let mut data = bar_bytes(0, 114_540, 114_550, 114_530, 114_560, 12.5);
        data.extend(bar_bytes(60, 114_550, 114_550, 114_550, 114_550, 0.0));

        let records = decode(&data, DataKind::MinuteBar, day, 100_000.0).unwrap();
        assert_eq!(records.len(), 2);

        let first = records[0].as_bar().unwrap();
        assert_eq!(first.timestamp, day);
        assert_relative_eq!(first.open, 1.1454, epsilon = 1e-10);
        assert_relative_eq!(first.close, 1.1455, epsilon = 1e-10);
        assert_relative_eq!(first.low, 1.1453, epsilon = 1e-10);
        assert_relative_eq!(first.high, 1.1456, epsilon = 1e-10);

        let second = records[1].as_bar().unwrap();
        assert_eq!(second.timestamp, day + TimeDelta::minutes(1));
        assert!(second.is_flat());
    }

    #[test]
    fn test_bar_payload_length_checked_against_bar_width() {
        let anchor = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        let data = vec![0u8; 40];
        assert_eq!(
            decode(&data, DataKind::HourBar, anchor, 100_000.0).err(),
            Some(DecodeError::InvalidFormat {
                len: 40,
                record_size: 24
            })
        );
    }

    #[test]
    fn test_day_bars_anchor_to_year_start() {
        let mid_year = Utc.with_ymd_and_hms(2018, 6, 15, 0, 0, 0).unwrap();
        let data = bar_bytes(86_400 * 2, 100, 100, 100, 100, 1.0);
        let bars = decode_bars(&data, DataKind::DayBar, mid_year, 100.0).unwrap();
        assert_eq!(
            bars[0].timestamp,
            Utc.with_ymd_and_hms(2018, 1, 3, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_merge_mid() {
        let t = Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap();
        let bid = vec![Bar::new(t, 1.0, 1.2, 0.9, 1.1, 10.0)];
        let ask = vec![Bar::new(t, 1.2, 1.4, 1.1, 1.3, 5.0)];
        let mid = merge_mid(&bid, &ask).unwrap();

        assert_eq!(mid.len(), 1);
        assert_relative_eq!(mid[0].open, 1.1, epsilon = 1e-10);
        assert_relative_eq!(mid[0].high, 1.3, epsilon = 1e-10);
        assert_relative_eq!(mid[0].low, 1.0, epsilon = 1e-10);
        assert_relative_eq!(mid[0].close, 1.2, epsilon = 1e-10);
        assert_relative_eq!(mid[0].volume, 15.0, epsilon = 1e-10);
    }

    #[test]
    fn test_merge_mid_length_mismatch() {
        let t = Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap();
        let bar = Bar::new(t, 1.0, 1.0, 1.0, 1.0, 1.0);
        assert_eq!(
            merge_mid(&[bar, bar], &[bar]),
            Err(DecodeError::MismatchedSides { bid: 2, ask: 1 })
        );
    }

    #[test]
    fn test_merge_mid_timestamp_mismatch() {
        let t = Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap();
        let bid = Bar::new(t, 1.0, 1.0, 1.0, 1.0, 1.0);
        let ask = Bar::new(t + TimeDelta::minutes(1), 1.0, 1.0, 1.0, 1.0, 1.0);
        assert!(merge_mid(&[bid], &[ask]).is_err());
    }
}
