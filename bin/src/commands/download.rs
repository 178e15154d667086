//! Download command implementation.
//!
//! Translates the command line into one streaming request and writes the
//! records to a file as they arrive.

use crate::display::{Format, open_sink, parse_date};
use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeDelta, Utc};
use clap::Args;
use dukastream_lib::{OptionOverrides, TimestampFormat};
use dukastream_lib::prelude::*;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Earliest date served by the archive.
const ARCHIVE_START: (i32, u32, u32) = (2003, 5, 5);

/// Arguments of the `download` command.
#[derive(Args)]
pub(crate) struct DownloadArgs {
    /// Instrument identifier (e.g., eurusd, btcusd)
    instrument: String,

    /// Start date (YYYY-MM-DD, UTC). Defaults to the instrument's earliest data.
    #[arg(short, long)]
    from: Option<String>,

    /// End date (YYYY-MM-DD, UTC, exclusive). Defaults to tomorrow.
    #[arg(short, long)]
    to: Option<String>,

    /// Output timeframe (tick, s1, m1, m5, m15, m30, h1, h4, d1, mn1)
    #[arg(short = 'T', long)]
    timeframe: Option<String>,

    /// Price side (bid, ask, mid)
    #[arg(short, long)]
    price: Option<String>,

    /// Output format
    #[arg(short = 'F', long, value_enum, default_value = "csv")]
    format: Format,

    /// Omit the header row (csv, tsv)
    #[arg(long)]
    no_header: bool,

    /// Write timestamps as epoch milliseconds (csv, tsv)
    #[arg(long)]
    epoch_ms: bool,

    /// Output file path. Defaults to <instrument>-<timeframe>.<format>
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file with option overrides, applied before the flags below
    #[arg(long)]
    config: Option<PathBuf>,

    /// Units fetched concurrently
    #[arg(long)]
    batch_size: Option<usize>,

    /// Pause between batches in milliseconds
    #[arg(long)]
    pause_ms: Option<u64>,

    /// Per-unit timeout in milliseconds
    #[arg(long)]
    unit_timeout_ms: Option<u64>,

    /// Retries per request after the first attempt
    #[arg(long)]
    retries: Option<u32>,

    /// Fixed delay between retries in milliseconds
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Retry empty responses
    #[arg(long)]
    retry_on_empty: bool,

    /// Cache decompressed payloads on disk
    #[arg(long)]
    cache: bool,

    /// Cache folder (implies --cache)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Volume unit (millions, thousands, units)
    #[arg(long)]
    volume_unit: Option<String>,

    /// IANA timezone for output timestamps
    #[arg(long)]
    timezone: Option<String>,

    /// Fixed UTC offset for output timestamps, in minutes
    #[arg(long, allow_negative_numbers = true)]
    utc_offset: Option<i32>,

    /// Keep zero-volume bars
    #[arg(long)]
    keep_flats: bool,

    /// Skip failed units instead of aborting
    #[arg(long)]
    skip_errors: bool,
}

impl DownloadArgs {
    /// Collects the flags that were given into overrides.
    fn overrides(&self) -> OptionOverrides {
        OptionOverrides {
            timeframe: self.timeframe.clone(),
            price_type: self.price.clone(),
            volume_unit: self.volume_unit.clone(),
            utc_offset_minutes: self.utc_offset,
            timezone: self.timezone.clone(),
            ignore_flats: self.keep_flats.then_some(false),
            batch_size: self.batch_size,
            pause_between_batches_ms: self.pause_ms,
            unit_timeout_ms: self.unit_timeout_ms,
            halt_on_error: self.skip_errors.then_some(false),
            max_retries: self.retries,
            retry_delay_ms: self.retry_delay_ms,
            retry_on_empty: self.retry_on_empty.then_some(true),
            fail_after_retries: None,
            cache_enabled: (self.cache || self.cache_dir.is_some()).then_some(true),
            cache_folder: self.cache_dir.clone(),
            point_value: None,
        }
    }

    fn range(&self, instrument: &Instrument) -> Result<DateRange> {
        let start = match &self.from {
            Some(s) => parse_date(s, "start")?,
            None => instrument.first_data().map_or_else(
                || {
                    let (y, m, d) = ARCHIVE_START;
                    NaiveDate::from_ymd_opt(y, m, d).context("invalid archive start")
                },
                |dt| Ok(dt.date_naive()),
            )?,
        };
        let end = match &self.to {
            Some(s) => parse_date(s, "end")?,
            None => Utc::now().date_naive() + TimeDelta::days(1),
        };
        Ok(DateRange::from_dates(start, end)?)
    }

    fn options(&self, range: DateRange) -> Result<StreamOptions> {
        let mut builder = StreamOptions::builder(range);
        if let Some(path) = &self.config {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let file = OptionOverrides::from_json(&json)
                .with_context(|| format!("Invalid config file: {}", path.display()))?;
            builder = builder.merge(&file)?;
        }
        Ok(builder.merge(&self.overrides())?.build()?)
    }
}

/// Streams one instrument's history into a file.
pub(crate) async fn download(args: DownloadArgs, quiet: bool) -> Result<()> {
    let instrument = InstrumentRegistry::global()
        .get(&args.instrument)
        .with_context(|| format!("Unknown instrument: {}", args.instrument))?;

    let range = args.range(instrument)?;
    let options = args.options(range)?;
    let timeframe = options.timeframe();

    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}-{}.{}",
            instrument.id(),
            timeframe,
            args.format.output().extension()
        ))
    });

    let plan = history_http(instrument.id(), options, HttpConfig::default())?;
    info!(
        instrument = instrument.id(),
        range = %plan.range(),
        units = plan.planned_units(),
        resampled = plan.requires_resampling(),
        "starting download"
    );

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(plan.planned_units() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} units ({percent}%) {msg}")
                .context("Invalid progress template")?
                .progress_chars("=>-"),
        );
        pb.set_message(format!("{} {}", instrument.id(), plan.range()));
        pb
    };

    let skipped = Arc::new(AtomicU64::new(0));
    let mut records = {
        let progress = progress.clone();
        let skipped = Arc::clone(&skipped);
        plan.records_with_progress(move |batch| {
            if batch.skipped {
                skipped.fetch_add(1, Ordering::Relaxed);
            }
            progress.inc(1);
        })
    };

    let timestamps = if args.epoch_ms {
        TimestampFormat::EpochMillis
    } else {
        TimestampFormat::Iso
    };
    let mut sink = open_sink(&output, args.format, !args.no_header, timestamps)?;
    while let Some(record) = records.next().await {
        sink.write_record(&record?)?;
    }
    sink.finish()?;

    let kind = if timeframe.is_tick() { "ticks" } else { "bars" };
    let skipped = skipped.load(Ordering::Relaxed);
    let finish_msg = if skipped > 0 {
        format!(
            "Downloaded {} {kind} ({skipped} units skipped due to errors)",
            sink.written()
        )
    } else {
        format!("Downloaded {} {kind}", sink.written())
    };
    progress.finish_with_message(finish_msg);

    if !quiet {
        println!("Output written to: {}", output.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: DownloadArgs,
    }

    fn parse(argv: &[&str]) -> DownloadArgs {
        Wrapper::parse_from(std::iter::once("download").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_dates_are_utc_midnights_with_exclusive_end() {
        let args = parse(&["eurusd", "--from", "2024-01-01", "--to", "2024-01-03"]);
        let instrument = InstrumentRegistry::global().get("eurusd").unwrap();
        let range = args.range(instrument).unwrap();

        assert_eq!(range.from.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(range.to.to_rfc3339(), "2024-01-03T00:00:00+00:00");
    }

    #[test]
    fn test_flags_become_options() {
        let args = parse(&[
            "eurusd",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-02",
            "-T",
            "h1",
            "--price",
            "mid",
            "--batch-size",
            "4",
            "--skip-errors",
            "--keep-flats",
            "--utc-offset",
            "-120",
        ]);
        let instrument = InstrumentRegistry::global().get("eurusd").unwrap();
        let options = args.options(args.range(instrument).unwrap()).unwrap();

        assert_eq!(options.timeframe(), Timeframe::Hour1);
        assert_eq!(options.price_type(), PriceType::Mid);
        assert_eq!(options.batch_size(), 4);
        assert!(!options.halt_on_error());
        assert!(!options.ignore_flats());
        assert!(options.shifts_time());
        assert!(!options.cache().enabled);
    }

    #[test]
    fn test_unset_flags_leave_defaults() {
        let overrides = parse(&["eurusd"]).overrides();
        assert_eq!(overrides, OptionOverrides::default());
    }

    #[test]
    fn test_invalid_timeframe_rejected() {
        let args = parse(&["eurusd", "--from", "2024-01-01", "-T", "m7"]);
        let instrument = InstrumentRegistry::global().get("eurusd").unwrap();
        let range = args.range(instrument).unwrap();
        assert!(args.options(range).is_err());
    }
}
