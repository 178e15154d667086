//! Output writers for the dukastream historical data streamer.
//!
//! Writers implement [`RecordSink`] and consume the record stream one
//! record at a time:
//!
//! - [`CsvWriter`] - CSV or TSV
//! - [`JsonWriter`] - JSON array or NDJSON

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dukastream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod csv;
mod formatter;
mod json;

pub use crate::csv::{CsvWriter, TimestampFormat};
pub use formatter::{FormatError, OutputFormat, RecordSink};
pub use json::{JsonStyle, JsonWriter};
