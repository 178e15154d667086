//! Planning, fetching, decoding and streaming for the dukastream historical
//! data streamer.
//!
//! - [`path::resolve_path`] - Maps a file kind and period to its archive path
//! - [`Transport`] / [`HttpTransport`] - The network seam
//! - [`FetchClient`] - One file, with retries, decompression and caching
//! - [`decompress_bi5`] - LZMA decompression
//! - [`decode()`] / [`merge_mid`] - Binary record decoding
//! - [`PeriodPlanner`] - Which files cover a date range
//! - [`BatchOrchestrator`] - Bounded, ordered, lazy streaming

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dukastream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cache;
mod client;
mod decode;
mod decompress;
pub mod path;
mod planner;
mod stream;
mod transport;

pub use cache::{DiskCache, KEY_DELIMITER};
pub use client::{FetchClient, FetchError};
pub use decode::{
    DecodeError, decode, decode_bars, decode_ticks, merge_mid, parse_bars, parse_ticks,
};
pub use decompress::{DecompressError, decompress_bi5, decompress_bi5_blocking};
pub use planner::{PeriodPlanner, PlanIter, fallback_kinds, is_tick_sourced};
pub use stream::{ArchiveSource, BatchOrchestrator, UnitBatch, flatten_records};
pub use transport::{HttpConfig, HttpTransport, RawResponse, Transport, TransportError};
