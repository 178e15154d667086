//! Streaming Rust library for Dukascopy historical tick and bar data.
//!
//! This is a facade crate that re-exports functionality from the dukastream
//! workspace crates and adds [`history`], which runs the whole pipeline in
//! one call.
//!
//! # Quick Start
//!
//! ```no_run
//! use dukastream_lib::prelude::*;
//! use futures::StreamExt;
//!
//! # async fn run() -> Result<()> {
//! let range = DateRange::from_dates(
//!     chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
//! )?;
//! let options = StreamOptions::builder(range)
//!     .timeframe(Timeframe::Minute5)
//!     .build()?;
//!
//! let mut records = history_http("eurusd", options, HttpConfig::default())?.records();
//! while let Some(record) = records.next().await {
//!     println!("{:?}", record?);
//! }
//! # Ok(())
//! # }
//! ```

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dukastream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

#[cfg(all(feature = "fetch", feature = "aggregate"))]
mod history;

pub use dukastream_types::*;

pub use dukastream_instruments::InstrumentRegistry;

#[cfg(feature = "fetch")]
pub use dukastream_fetch::{
    ArchiveSource, BatchOrchestrator, DecodeError, DecompressError, DiskCache, FetchClient,
    FetchError, HttpConfig, HttpTransport, PeriodPlanner, RawResponse, Transport, TransportError,
    UnitBatch, flatten_records, path,
};

#[cfg(feature = "aggregate")]
pub use dukastream_aggregate::{Resampler, resample};

#[cfg(feature = "format")]
pub use dukastream_format::{
    CsvWriter, FormatError, JsonStyle, JsonWriter, OutputFormat, RecordSink, TimestampFormat,
};

#[cfg(all(feature = "fetch", feature = "aggregate"))]
pub use history::{History, history, history_at, history_http};

/// Prelude module for convenient imports.
///
/// ```
/// use dukastream_lib::prelude::*;
/// ```
pub mod prelude {
    pub use dukastream_types::{
        Bar, Category, DateRange, DateRangeError, Error, Instrument, PriceType, Record, Result,
        StreamOptions, Tick, Timeframe, VolumeUnit,
    };

    pub use dukastream_instruments::InstrumentRegistry;

    #[cfg(feature = "fetch")]
    pub use dukastream_fetch::{FetchClient, HttpConfig, UnitBatch};

    #[cfg(feature = "aggregate")]
    pub use dukastream_aggregate::resample;

    #[cfg(feature = "format")]
    pub use dukastream_format::{OutputFormat, RecordSink};

    #[cfg(all(feature = "fetch", feature = "aggregate"))]
    pub use crate::history::{History, history, history_http};
}
