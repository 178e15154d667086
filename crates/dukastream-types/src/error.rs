//! Error types for dukastream.

use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for dukastream operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while planning, fetching and decoding data.
#[derive(Error, Debug)]
pub enum Error {
    /// Instrument not known to the registry.
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    /// Timeframe identifier not recognised.
    #[error(
        "Invalid timeframe '{0}', expected one of: tick, s1, m1, m5, m15, m30, h1, h4, d1, mn1"
    )]
    InvalidTimeframe(String),

    /// Server kept answering with a non-success status.
    #[error("HTTP error: status {status}")]
    Http {
        /// Last HTTP status code received.
        status: u16,
    },

    /// Network-level failure (timeout, refused connection).
    #[error("Transport error: {0}")]
    Transport(String),

    /// LZMA decompression failed.
    #[error("Decompression error: {0}")]
    Decompress(String),

    /// Decoded payload is not a whole number of records.
    #[error("Invalid format: {len} bytes is not a multiple of {record_size}")]
    InvalidFormat {
        /// Payload length in bytes.
        len: usize,
        /// Expected record width in bytes.
        record_size: usize,
    },

    /// Bid and ask candle files do not line up for a mid-price merge.
    #[error("Mismatched bid/ask candles: {bid} bid vs {ask} ask")]
    MismatchedSides {
        /// Number of bid bars.
        bid: usize,
        /// Number of ask bars.
        ask: usize,
    },

    /// A fetch unit did not complete in time.
    #[error("Fetching {unit} timed out after {after:?}")]
    Timeout {
        /// The unit that timed out.
        unit: String,
        /// The timeout that elapsed.
        after: Duration,
    },

    /// A fetch task was cancelled before completing, e.g. on runtime
    /// shutdown.
    #[error("Fetching {unit} was cancelled")]
    Cancelled {
        /// The unit whose task was cancelled.
        unit: String,
    },

    /// Cache read or write failed.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Invalid date range.
    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output format error.
    #[error("Format error: {0}")]
    Format(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error for invalid date ranges.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    /// Start lies after end.
    #[error("Invalid date range: {from} > {to}")]
    InvalidRange {
        /// The start instant.
        from: DateTime<Utc>,
        /// The end instant.
        to: DateTime<Utc>,
    },
}

/// Error for rejected stream options.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Batch size must be at least one.
    #[error("Batch size must be at least 1")]
    ZeroBatchSize,

    /// Point value must be positive.
    #[error("Point value must be positive")]
    ZeroPointValue,

    /// Per-unit timeout must be non-zero.
    #[error("Unit timeout must be non-zero")]
    ZeroUnitTimeout,

    /// Timezone name not found in the tz database.
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    /// Volume unit not recognised.
    #[error("Unknown volume unit '{0}', expected one of: millions, thousands, units")]
    UnknownVolumeUnit(String),

    /// Price type not recognised.
    #[error("Unknown price type '{0}', expected one of: bid, ask, mid")]
    UnknownPriceType(String),

    /// Timeframe not recognised.
    #[error("Unknown timeframe: {0}")]
    UnknownTimeframe(String),

    /// Instrument category not recognised.
    #[error(
        "Unknown category '{0}', expected one of: forex, crypto, index, stock, commodity, etf, bond"
    )]
    UnknownCategory(String),

    /// Start lies after end.
    #[error(transparent)]
    Range(#[from] DateRangeError),
}
