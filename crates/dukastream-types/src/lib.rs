//! Core types for the dukastream historical data streamer.
//!
//! This crate provides the fundamental data structures used throughout
//! dukastream:
//!
//! - [`Tick`] / [`RawTick`] - Quote ticks and their on-disk form
//! - [`Bar`] / [`RawBar`] - OHLCV bars and their on-disk form
//! - [`Record`] - Either of the above, as produced by the stream
//! - [`DataKind`] - Remote file kinds and their covering periods
//! - [`FetchUnit`] - Descriptor of one remote file to fetch
//! - [`Timeframe`] - Output timeframe
//! - [`DateRange`] - Half-open UTC range of requested data
//! - [`Instrument`] - Financial instrument with metadata
//! - [`StreamOptions`] - Validated per-stream configuration

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dukastream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bar;
mod date_range;
mod error;
mod instrument;
mod kind;
mod options;
mod price;
mod record;
mod tick;
mod timeframe;
mod unit;

pub use bar::{Bar, RawBar};
pub use date_range::DateRange;
pub use error::{ConfigError, DateRangeError, Error, Result};
pub use instrument::{Category, Instrument};
pub use kind::DataKind;
pub use options::{
    CachePolicy, OptionOverrides, RetryDelay, RetryPolicy, StreamOptions, StreamOptionsBuilder,
    VolumeUnit,
};
pub use price::{PriceSide, PriceType};
pub use record::Record;
pub use tick::{RawTick, Tick};
pub use timeframe::Timeframe;
pub use unit::FetchUnit;
