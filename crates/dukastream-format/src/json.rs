//! JSON output.

use dukastream_types::Record;
use std::io::Write;

use crate::formatter::Shape;
use crate::{FormatError, RecordSink};

/// JSON output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    /// A single JSON array.
    #[default]
    Array,
    /// One JSON object per line (NDJSON/JSONL).
    Ndjson,
}

/// JSON writer.
///
/// Array output is streamed element by element, so the document is only
/// valid once [`finish`](RecordSink::finish) has written the closing
/// bracket.
#[derive(Debug)]
pub struct JsonWriter<W> {
    writer: W,
    style: JsonStyle,
    shape: Option<Shape>,
    written: u64,
}

impl<W: Write + Send> JsonWriter<W> {
    /// Creates a writer with the given style.
    #[must_use]
    pub const fn new(writer: W, style: JsonStyle) -> Self {
        Self {
            writer,
            style,
            shape: None,
            written: 0,
        }
    }

    /// Creates a JSON array writer.
    #[must_use]
    pub const fn array(writer: W) -> Self {
        Self::new(writer, JsonStyle::Array)
    }

    /// Creates an NDJSON writer.
    #[must_use]
    pub const fn ndjson(writer: W) -> Self {
        Self::new(writer, JsonStyle::Ndjson)
    }
}

impl<W: Write + Send> RecordSink for JsonWriter<W> {
    fn write_record(&mut self, record: &Record) -> Result<(), FormatError> {
        self.shape = Some(Shape::check(self.shape, record)?);

        match self.style {
            JsonStyle::Array => {
                self.writer
                    .write_all(if self.written == 0 { b"[" } else { b"," })?;
                serde_json::to_writer(&mut self.writer, record)?;
            }
            JsonStyle::Ndjson => {
                serde_json::to_writer(&mut self.writer, record)?;
                writeln!(self.writer)?;
            }
        }
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), FormatError> {
        if self.style == JsonStyle::Array {
            if self.written == 0 {
                self.writer.write_all(b"[")?;
            }
            writeln!(self.writer, "]")?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn written(&self) -> u64 {
        self.written
    }
}
