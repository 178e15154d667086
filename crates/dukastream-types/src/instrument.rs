//! Archive instrument metadata.
//!
//! An [`Instrument`] answers the three questions the fetch pipeline asks of
//! an identifier: which file-name key the archive stores it under, which
//! point value turns its fixed-point prices into decimals, and from when
//! the archive holds data for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{ConfigError, DateRange};

/// Instrument category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Currency pairs.
    Forex,
    /// Cryptocurrencies.
    Crypto,
    /// Stock indices.
    Index,
    /// Single stocks.
    Stock,
    /// Metals, energy and agriculture.
    Commodity,
    /// Exchange-traded funds.
    Etf,
    /// Government bonds.
    Bond,
}

impl Category {
    /// All categories, in listing order.
    pub const ALL: [Self; 7] = [
        Self::Forex,
        Self::Crypto,
        Self::Index,
        Self::Stock,
        Self::Commodity,
        Self::Etf,
        Self::Bond,
    ];

    /// Returns the lowercase name used in the registry data.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Forex => "forex",
            Self::Crypto => "crypto",
            Self::Index => "index",
            Self::Stock => "stock",
            Self::Commodity => "commodity",
            Self::Etf => "etf",
            Self::Bond => "bond",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| ConfigError::UnknownCategory(s.to_string()))
    }
}

/// An instrument served by the archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    id: String,
    name: String,
    description: String,
    category: Category,
    /// Archive key when it differs from the upper-cased id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remote_key: Option<String>,
    point_value: u32,
    #[serde(rename = "start_tick_date")]
    first_data: Option<DateTime<Utc>>,
}

impl Instrument {
    /// Creates an instrument keyed in the archive by its upper-cased id.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        category: Category,
        point_value: u32,
        first_data: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            category,
            remote_key: None,
            point_value,
            first_data,
        }
    }

    /// Registry identifier, e.g. `eurusd`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name, e.g. `EUR/USD`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Category used for listing.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Returns the file-name key the archive stores this instrument under.
    #[must_use]
    pub fn remote_key(&self) -> String {
        self.remote_key
            .clone()
            .unwrap_or_else(|| self.id.to_uppercase())
    }

    /// Returns the divisor applied to raw fixed-point prices.
    #[must_use]
    pub const fn point_value(&self) -> u32 {
        self.point_value
    }

    /// Returns the first instant the archive holds data for, if known.
    #[must_use]
    pub const fn first_data(&self) -> Option<DateTime<Utc>> {
        self.first_data
    }

    /// Raises the start of `range` to the first available data. Ranges
    /// ending before that instant come back empty.
    #[must_use]
    pub fn clamp_range(&self, range: DateRange) -> DateRange {
        match self.first_data {
            Some(first) => range.clamp_start(first),
            None => range,
        }
    }
}
