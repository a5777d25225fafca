//! Kline — one OHLCV sample over a fixed interval.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// OHLCV candle. `start` is the opening timestamp of the interval.
///
/// Invariant: `low <= min(open, close) <= max(open, close) <= high`,
/// all non-negative. Readers are expected to deliver sane bars;
/// `is_sane` exists for fixtures and ingest checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kline {
    pub start: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Kline {
    pub fn is_sane(&self) -> bool {
        let body_lo = self.open.min(self.close);
        let body_hi = self.open.max(self.close);
        self.low >= Decimal::ZERO
            && self.low <= body_lo
            && body_hi <= self.high
            && self.volume >= Decimal::ZERO
    }
}

/// Contract for anything that consumes a stream of prices: the simulated
/// dealer, the bot, and its predicters. Bars arrive in ascending `start`
/// order, one call per bar.
pub trait Receiver {
    fn receive_price(&mut self, price: &Kline) -> Result<(), EngineError>;
}
