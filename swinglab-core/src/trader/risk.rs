//! Riskers — stop distance per unit for position sizing.

use rust_decimal::Decimal;

use crate::domain::{Kline, Receiver};
use crate::error::EngineError;
use crate::indicators::{DoubleZigZag, Scale};

/// Produces the risk-per-unit (stop distance) the sizer divides capital
/// by, and the stop anchor the bot attaches to a new position.
pub trait Risker: Receiver + Send {
    fn risk(&self) -> Decimal;
}

/// The whole price is at risk: no stop anchoring, sizing degenerates to
/// capital / price.
#[derive(Debug, Default)]
pub struct FullRisker {
    last_close: Decimal,
}

impl FullRisker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Receiver for FullRisker {
    fn receive_price(&mut self, price: &Kline) -> Result<(), EngineError> {
        self.last_close = price.close;
        Ok(())
    }
}

impl Risker for FullRisker {
    fn risk(&self) -> Decimal {
        self.last_close
    }
}

/// Anchors risk at the last committed short-scale swing point: the stop
/// distance is the gap between the current close and that pivot.
///
/// Falls back to the full price while the indicator warms up or when the
/// pivot sits on the close itself.
pub struct SwingRisker {
    zigzag: DoubleZigZag,
    bar_index: usize,
    last_close: Decimal,
}

impl SwingRisker {
    pub fn new(short_period: usize, long_period: usize) -> Self {
        Self {
            zigzag: DoubleZigZag::new(short_period, long_period),
            bar_index: 0,
            last_close: Decimal::ZERO,
        }
    }
}

impl Receiver for SwingRisker {
    fn receive_price(&mut self, price: &Kline) -> Result<(), EngineError> {
        self.zigzag.update(self.bar_index, price);
        self.bar_index += 1;
        self.last_close = price.close;
        Ok(())
    }
}

impl Risker for SwingRisker {
    fn risk(&self) -> Decimal {
        match self.zigzag.last_committed(Scale::Short, 0) {
            Ok(pivot) => {
                let distance = (self.last_close - pivot.price).abs();
                if distance > Decimal::ZERO {
                    distance
                } else {
                    self.last_close
                }
            }
            Err(_) => self.last_close,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit;
    use rust_decimal_macros::dec;

    #[test]
    fn full_risker_returns_last_close() {
        let mut r = FullRisker::new();
        for bar in testkit::klines_from_closes(&[100, 105]) {
            r.receive_price(&bar).unwrap();
        }
        assert_eq!(r.risk(), dec!(105));
    }

    #[test]
    fn swing_risker_falls_back_before_warmup() {
        let mut r = SwingRisker::new(3, 5);
        for bar in testkit::klines_from_closes(&[100, 101]) {
            r.receive_price(&bar).unwrap();
        }
        assert_eq!(r.risk(), dec!(101));
    }

    #[test]
    fn swing_risker_measures_distance_to_pivot() {
        // Pivot high 15 commits once the low at 8 flips direction; the
        // last committed short pivot after the full series is 8.
        let mut r = SwingRisker::new(3, 20);
        for bar in testkit::klines_from_closes(&[10, 12, 15, 11, 8, 9, 14, 13]) {
            r.receive_price(&bar).unwrap();
        }
        assert_eq!(r.risk(), dec!(5)); // |13 - 8|
    }
}
