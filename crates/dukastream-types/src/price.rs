//! Price type selection.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ConfigError;

/// The quote side a remote candle file is stored for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSide {
    /// Bid quotes.
    Bid,
    /// Ask quotes.
    Ask,
}

impl PriceSide {
    /// Returns the upper-case token used in remote file names.
    #[must_use]
    pub const fn as_path_token(&self) -> &'static str {
        match self {
            Self::Bid => "BID",
            Self::Ask => "ASK",
        }
    }
}

/// The price series requested by the caller.
///
/// `Mid` has no file of its own; it is synthesized from bid and ask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    /// Bid prices.
    #[default]
    Bid,
    /// Ask prices.
    Ask,
    /// Average of bid and ask.
    Mid,
}

impl PriceType {
    /// Returns the single file side backing this price type, `None` for mid.
    #[must_use]
    pub const fn side(&self) -> Option<PriceSide> {
        match self {
            Self::Bid => Some(PriceSide::Bid),
            Self::Ask => Some(PriceSide::Ask),
            Self::Mid => None,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bid => "bid",
            Self::Ask => "ask",
            Self::Mid => "mid",
        }
    }
}

impl std::fmt::Display for PriceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PriceType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bid" => Ok(Self::Bid),
            "ask" => Ok(Self::Ask),
            "mid" => Ok(Self::Mid),
            _ => Err(ConfigError::UnknownPriceType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("BID".parse::<PriceType>().unwrap(), PriceType::Bid);
        assert_eq!("mid".parse::<PriceType>().unwrap(), PriceType::Mid);
        assert!(matches!(
            "last".parse::<PriceType>(),
            Err(ConfigError::UnknownPriceType(_))
        ));
    }

    #[test]
    fn test_side() {
        assert_eq!(PriceType::Ask.side(), Some(PriceSide::Ask));
        assert_eq!(PriceType::Mid.side(), None);
        assert_eq!(PriceSide::Bid.as_path_token(), "BID");
    }
}
