//! Equity series — per-bar account value.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordered map of bar start time to total account value (balance plus
/// mark-to-market of open positions). One sample per processed bar,
/// written exactly once after that bar's fills.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquitySeries(pub BTreeMap<DateTime<Utc>, Decimal>);

impl EquitySeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, at: DateTime<Utc>, amount: Decimal) {
        self.0.insert(at, amount);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<(&DateTime<Utc>, &Decimal)> {
        self.0.iter().next()
    }

    pub fn last(&self) -> Option<(&DateTime<Utc>, &Decimal)> {
        self.0.iter().next_back()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DateTime<Utc>, &Decimal)> {
        self.0.iter()
    }

    /// Amounts in time order, for statistics.
    pub fn amounts(&self) -> Vec<Decimal> {
        self.0.values().copied().collect()
    }
}
