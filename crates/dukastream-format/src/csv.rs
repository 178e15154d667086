//! CSV and TSV output.

use chrono::{DateTime, Utc};
use dukastream_types::Record;
use std::io::Write;

use crate::formatter::Shape;
use crate::{FormatError, RecordSink};

/// How timestamps are rendered in delimited output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    /// `2024-01-15T12:30:45.000`, wall-clock time in the output timezone.
    #[default]
    Iso,
    /// Milliseconds since the Unix epoch.
    EpochMillis,
}

impl TimestampFormat {
    fn render(self, t: DateTime<Utc>) -> String {
        match self {
            Self::Iso => t.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            Self::EpochMillis => t.timestamp_millis().to_string(),
        }
    }
}

/// Delimited-text writer. The header row matches the first record's kind.
#[derive(Debug)]
pub struct CsvWriter<W> {
    writer: W,
    delimiter: char,
    include_header: bool,
    timestamps: TimestampFormat,
    shape: Option<Shape>,
    written: u64,
}

impl<W: Write + Send> CsvWriter<W> {
    /// Creates a comma-separated writer with a header row.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            delimiter: ',',
            include_header: true,
            timestamps: TimestampFormat::Iso,
            shape: None,
            written: 0,
        }
    }

    /// Creates a tab-separated writer with a header row.
    #[must_use]
    pub const fn tsv(writer: W) -> Self {
        Self::new(writer).with_delimiter('\t')
    }

    /// Sets the field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether to include a header row.
    #[must_use]
    pub const fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Sets the timestamp rendering.
    #[must_use]
    pub const fn with_timestamps(mut self, timestamps: TimestampFormat) -> Self {
        self.timestamps = timestamps;
        self
    }

    fn write_header(&mut self, shape: Shape) -> Result<(), FormatError> {
        let d = self.delimiter;
        match shape {
            Shape::Ticks => {
                writeln!(self.writer, "timestamp{d}ask{d}bid{d}ask_volume{d}bid_volume")?;
            }
            Shape::Bars => {
                writeln!(self.writer, "timestamp{d}open{d}high{d}low{d}close{d}volume")?;
            }
        }
        Ok(())
    }
}

impl<W: Write + Send> RecordSink for CsvWriter<W> {
    fn write_record(&mut self, record: &Record) -> Result<(), FormatError> {
        let shape = Shape::check(self.shape, record)?;
        if self.shape.is_none() && self.include_header {
            self.write_header(shape)?;
        }
        self.shape = Some(shape);

        let d = self.delimiter;
        let ts = self.timestamps.render(record.timestamp());
        match record {
            Record::Tick(tick) => writeln!(
                self.writer,
                "{ts}{d}{}{d}{}{d}{}{d}{}",
                tick.ask, tick.bid, tick.ask_volume, tick.bid_volume
            )?,
            Record::Bar(bar) => writeln!(
                self.writer,
                "{ts}{d}{}{d}{}{d}{}{d}{}{d}{}",
                bar.open, bar.high, bar.low, bar.close, bar.volume
            )?,
        }
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), FormatError> {
        self.writer.flush()?;
        Ok(())
    }

    fn written(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dukastream_types::{Bar, Tick};

    fn tick() -> Record {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 45).unwrap();
        Record::Tick(Tick::new(timestamp, 1.1001, 1.1000, 100.0, 200.0))
    }

    fn render(mut writer: CsvWriter<&mut Vec<u8>>, records: &[Record]) {
        for r in records {
            writer.write_record(r).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_csv_ticks() {
        let mut out = Vec::new();
        render(CsvWriter::new(&mut out), &[tick()]);

        let result = String::from_utf8(out).unwrap();
        assert!(result.starts_with("timestamp,ask,bid,ask_volume,bid_volume\n"));
        assert!(result.contains("2024-01-15T12:30:45.000,1.1001,1.1,100,200"));
    }

    #[test]
    fn test_csv_bars() {
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let mut out = Vec::new();
        render(
            CsvWriter::new(&mut out),
            &[Record::Bar(Bar::new(t, 1.0, 1.5, 0.5, 1.25, 42.0))],
        );

        let result = String::from_utf8(out).unwrap();
        let lines: Vec<_> = result.lines().collect();
        assert_eq!(lines[0], "timestamp,open,high,low,close,volume");
        assert_eq!(lines[1], "2024-01-15T00:00:00.000,1,1.5,0.5,1.25,42");
    }

    #[test]
    fn test_csv_no_header() {
        let mut out = Vec::new();
        render(CsvWriter::new(&mut out).with_header(false), &[tick()]);
        assert!(!String::from_utf8(out).unwrap().contains("timestamp,ask"));
    }

    #[test]
    fn test_tsv_epoch_millis() {
        let mut out = Vec::new();
        render(
            CsvWriter::tsv(&mut out).with_timestamps(TimestampFormat::EpochMillis),
            &[tick()],
        );

        let result = String::from_utf8(out).unwrap();
        assert!(result.contains("timestamp\task\tbid"));
        assert!(result.contains("1705321845000\t1.1001"));
    }

    #[test]
    fn test_counts_records() {
        let mut out = Vec::new();
        let mut writer = CsvWriter::new(&mut out);
        writer.write_record(&tick()).unwrap();
        writer.write_record(&tick()).unwrap();
        assert_eq!(writer.written(), 2);
    }
}
