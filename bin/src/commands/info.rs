//! Info command implementation.
//!
//! Shows an instrument's archive metadata and how many remote files a
//! download of recent history would request per timeframe.

use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use dukastream_lib::prelude::*;
use dukastream_lib::{PeriodPlanner, path};

/// Timeframes served natively by the archive.
const NATIVE: [Timeframe; 4] = [
    Timeframe::Tick,
    Timeframe::Minute1,
    Timeframe::Hour1,
    Timeframe::Day1,
];

/// Show detailed information about an instrument.
pub(crate) fn show_info(instrument_id: &str) -> Result<()> {
    let registry = InstrumentRegistry::global();
    let instrument = registry
        .get(instrument_id)
        .with_context(|| format!("Unknown instrument: {instrument_id}"))?;

    println!("Instrument:  {}", instrument.name());
    println!("ID:          {}", instrument.id());
    println!("Category:    {}", instrument.category());
    println!("Description: {}", instrument.description());
    println!("Remote Key:  {}", instrument.remote_key());
    println!("Point Value: {}", instrument.point_value());
    println!("Archive:     {}", path::BASE_URL);

    let Some(start) = instrument.first_data() else {
        return Ok(());
    };
    println!("Data Available From: {}", start.format("%Y-%m-%d"));

    let now = Utc::now();
    println!("\nRemote files per download:");
    print!("{:<14}", "PERIOD");
    for tf in NATIVE {
        print!(" {:>8}", tf.as_str());
    }
    println!();
    println!("{}", "-".repeat(14 + 9 * NATIVE.len()));

    let periods = [
        ("Last 1 day", TimeDelta::days(1)),
        ("Last 1 week", TimeDelta::weeks(1)),
        ("Last 1 month", TimeDelta::days(30)),
        ("Last 1 year", TimeDelta::days(365)),
    ];
    for (label, span) in periods {
        let range = DateRange::new((now - span).max(start), now)?;
        print!("{label:<14}");
        for tf in NATIVE {
            let units = PeriodPlanner::new(instrument.remote_key(), tf, PriceType::Bid, range, now)
                .units()
                .count();
            print!(" {units:>8}");
        }
        println!();
    }

    println!("\nMid-price bars fetch both sides, doubling the bar file requests.");
    Ok(())
}
