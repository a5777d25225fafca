//! Test support: synthetic kline series and a scripted predicter.
//!
//! Kept in the library (not behind `cfg(test)`) so downstream crates can
//! drive the engine in their own integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::domain::{Kline, Receiver};
use crate::error::EngineError;
use crate::trader::Predicter;

/// Base timestamp for synthetic series.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()
}

/// Hourly bars with O = H = L = C taken from `closes`.
pub fn klines_from_closes(closes: &[i64]) -> Vec<Kline> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let c = Decimal::from(c);
            Kline {
                start: t0() + Duration::hours(i as i64),
                open: c,
                high: c,
                low: c,
                close: c,
                volume: Decimal::ONE,
            }
        })
        .collect()
}

/// `n` identical flat bars at `price`.
pub fn flat_series(n: usize, price: i64) -> Vec<Kline> {
    klines_from_closes(&vec![price; n])
}

/// A drifting triangle wave: swings of `amplitude` every `half_period`
/// bars around a slowly rising base. Commits alternating pivots with
/// mostly higher highs and higher lows.
pub fn wave_series(n: usize, base: i64, amplitude: i64, half_period: usize) -> Vec<Kline> {
    let half = half_period.max(1);
    let closes: Vec<i64> = (0..n)
        .map(|i| {
            let cycle = i / half;
            let phase = (i % half) as i64;
            let leg = if cycle % 2 == 0 {
                phase * amplitude / half as i64
            } else {
                amplitude - phase * amplitude / half as i64
            };
            base + (i as i64) / 4 + leg
        })
        .collect();
    klines_from_closes(&closes)
}

/// Predicter replaying a fixed score sequence, one score per bar.
///
/// Becomes valid after `valid_after` bars; holds its last score once the
/// script runs out.
pub struct ScriptedPredicter {
    scores: Vec<f64>,
    bars_seen: usize,
    valid_after: usize,
}

impl ScriptedPredicter {
    pub fn new(scores: Vec<f64>) -> Self {
        Self {
            scores,
            bars_seen: 0,
            valid_after: 0,
        }
    }

    pub fn valid_after(mut self, bars: usize) -> Self {
        self.valid_after = bars;
        self
    }
}

impl Receiver for ScriptedPredicter {
    fn receive_price(&mut self, _price: &Kline) -> Result<(), EngineError> {
        self.bars_seen += 1;
        Ok(())
    }
}

impl Predicter for ScriptedPredicter {
    fn predict(&self) -> f64 {
        if self.bars_seen == 0 || self.scores.is_empty() {
            return 0.0;
        }
        let idx = (self.bars_seen - 1).min(self.scores.len() - 1);
        self.scores[idx]
    }

    fn valid(&self) -> bool {
        self.bars_seen > self.valid_after
    }
}
