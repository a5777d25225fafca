//! Asset identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tradable instrument, identified by (symbol, venue).
///
/// Equality and hashing are by identifier only; two `Asset` values with
/// the same symbol and venue are the same asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub venue: String,
}

impl Asset {
    /// Asset with an empty venue, the common single-exchange case.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            venue: String::new(),
        }
    }

    pub fn with_venue(symbol: impl Into<String>, venue: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            venue: venue.into(),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.venue.is_empty() {
            f.write_str(&self.symbol)
        } else {
            write!(f, "{}@{}", self.symbol, self.venue)
        }
    }
}
