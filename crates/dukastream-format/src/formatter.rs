//! Output format abstraction.

use dukastream_types::Record;
use std::io::Write;
use thiserror::Error;

use crate::{CsvWriter, JsonWriter};

/// Output format identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    /// Comma-separated values.
    #[default]
    Csv,
    /// Tab-separated values.
    Tsv,
    /// JSON array.
    Json,
    /// Newline-delimited JSON.
    Ndjson,
}

impl OutputFormat {
    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Json => "json",
            Self::Ndjson => "ndjson",
        }
    }

    /// Returns all available formats.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Csv, Self::Tsv, Self::Json, Self::Ndjson]
    }

    /// Creates a sink writing this format to `writer`.
    pub fn sink<'w, W: Write + Send + 'w>(&self, writer: W) -> Box<dyn RecordSink + 'w> {
        match self {
            Self::Csv => Box::new(CsvWriter::new(writer)),
            Self::Tsv => Box::new(CsvWriter::tsv(writer)),
            Self::Json => Box::new(JsonWriter::array(writer)),
            Self::Ndjson => Box::new(JsonWriter::ndjson(writer)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            "ndjson" | "jsonl" => Ok(Self::Ndjson),
            _ => Err(FormatError::UnknownFormat(s.to_string())),
        }
    }
}

/// Errors that can occur during formatting.
#[derive(Error, Debug)]
pub enum FormatError {
    /// Unknown output format.
    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    /// A tick arrived in a bar stream, or the reverse.
    #[error("Cannot mix ticks and bars in one output")]
    MixedRecords,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<FormatError> for dukastream_types::Error {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::Io(e) => Self::Io(e),
            other => Self::Format(other.to_string()),
        }
    }
}

/// Incremental record writer.
///
/// Records are written one at a time in stream order; [`finish`] must be
/// called once after the last record to complete the document and flush.
///
/// [`finish`]: RecordSink::finish
pub trait RecordSink: Send {
    /// Writes one record.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or the record kind differs from
    /// the first record's.
    fn write_record(&mut self, record: &Record) -> Result<(), FormatError>;

    /// Completes the output and flushes the writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn finish(&mut self) -> Result<(), FormatError>;

    /// Returns the number of records written so far.
    fn written(&self) -> u64;
}

/// The shape of the first record written, fixed for the rest of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    Ticks,
    Bars,
}

impl Shape {
    pub(crate) const fn of(record: &Record) -> Self {
        match record {
            Record::Tick(_) => Self::Ticks,
            Record::Bar(_) => Self::Bars,
        }
    }

    /// Returns the shape to keep, or an error if `record` does not fit.
    pub(crate) fn check(current: Option<Self>, record: &Record) -> Result<Self, FormatError> {
        let shape = Self::of(record);
        match current {
            Some(existing) if existing != shape => Err(FormatError::MixedRecords),
            _ => Ok(shape),
        }
    }
}
