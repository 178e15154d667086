//! Argument parsing helpers and output setup for the dukastream CLI.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use dukastream_lib::prelude::*;
use dukastream_lib::{CsvWriter, TimestampFormat};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Output format for downloaded data.
#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum Format {
    Csv,
    Tsv,
    Json,
    Ndjson,
}

impl Format {
    /// Returns the library output format.
    pub(crate) const fn output(self) -> OutputFormat {
        match self {
            Self::Csv => OutputFormat::Csv,
            Self::Tsv => OutputFormat::Tsv,
            Self::Json => OutputFormat::Json,
            Self::Ndjson => OutputFormat::Ndjson,
        }
    }
}

/// Opens `path` for writing and wraps it in a record sink of `format`.
///
/// `header` and `timestamps` only affect the delimited formats.
pub(crate) fn open_sink(
    path: &Path,
    format: Format,
    header: bool,
    timestamps: TimestampFormat,
) -> Result<Box<dyn RecordSink>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    Ok(sink_for(BufWriter::new(file), format, header, timestamps))
}

fn sink_for<'w, W: Write + Send + 'w>(
    writer: W,
    format: Format,
    header: bool,
    timestamps: TimestampFormat,
) -> Box<dyn RecordSink + 'w> {
    let csv = match format {
        Format::Csv => CsvWriter::new(writer),
        Format::Tsv => CsvWriter::tsv(writer),
        Format::Json | Format::Ndjson => return format.output().sink(writer),
    };
    Box::new(csv.with_header(header).with_timestamps(timestamps))
}

/// Parses a `YYYY-MM-DD` date.
pub(crate) fn parse_date(s: &str, what: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Invalid {what} date: {s}"))
}
