//! List command implementation.
//!
//! This module handles listing available instruments with optional filtering.

use anyhow::Result;
use dukastream_lib::prelude::*;

/// List available instruments with optional category filter or search pattern.
pub(crate) fn list_instruments(category: Option<&str>, search: Option<&str>) -> Result<()> {
    let registry = InstrumentRegistry::global();

    let mut instruments: Vec<_> = match (category, search) {
        (Some(cat), _) => {
            let category: Category = cat.parse()?;
            registry.by_category(category).collect()
        }
        (_, Some(pattern)) => registry.search(pattern),
        (None, None) => registry.all().collect(),
    };
    instruments.sort_by(|a, b| a.id().cmp(b.id()));

    if instruments.is_empty() {
        println!("No instruments found.");
        return Ok(());
    }

    println!(
        "{:<15} {:<20} {:<10} {:>12}",
        "ID", "NAME", "CATEGORY", "POINT VALUE"
    );
    println!("{}", "-".repeat(60));

    for instrument in &instruments {
        println!(
            "{:<15} {:<20} {:<10} {:>12}",
            instrument.id(),
            instrument.name(),
            instrument.category(),
            instrument.point_value()
        );
    }

    println!("\nTotal: {} instruments", instruments.len());
    Ok(())
}
