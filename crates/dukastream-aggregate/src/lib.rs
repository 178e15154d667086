//! Resampling for the dukastream historical data streamer.
//!
//! - [`Resampler`] - Incremental tick/bar to bar aggregation
//! - [`resample`] - The same over a record stream

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/dukastream/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod aggregator;
mod stream;

pub use aggregator::{Resampler, bucket_start};
pub use stream::resample;
