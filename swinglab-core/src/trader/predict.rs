//! Predicters — price direction scores in [-1, +1].

use crate::domain::{Kline, Receiver};
use crate::error::EngineError;
use crate::indicators::{DoubleZigZag, Scale, SwingLabel};

/// Streaming component producing a directional score. A bot buys as the
/// score crosses its upper entry threshold and sells as it crosses the
/// lower one.
pub trait Predicter: Receiver + Send {
    /// Score between -1 (short) and +1 (long).
    fn predict(&self) -> f64;

    /// Readiness: false while the underlying indicators warm up.
    fn valid(&self) -> bool;
}

/// Scores trend agreement of the committed Double ZigZag swings.
///
/// Each scale votes +1 when its latest committed pivot extends the trend
/// upward (higher high or higher low), -1 on a lower low or lower high,
/// and 0 while unlabeled. The score is the mean of the two votes, so
/// full agreement saturates at ±1.
pub struct SwingPredicter {
    zigzag: DoubleZigZag,
    bar_index: usize,
}

impl SwingPredicter {
    pub fn new(short_period: usize, long_period: usize) -> Self {
        Self {
            zigzag: DoubleZigZag::new(short_period, long_period),
            bar_index: 0,
        }
    }

    fn vote(&self, scale: Scale) -> f64 {
        match self.zigzag.last_committed(scale, 0) {
            Ok(pivot) => match pivot.label {
                Some(SwingLabel::HH) | Some(SwingLabel::HL) => 1.0,
                Some(SwingLabel::LL) | Some(SwingLabel::LH) => -1.0,
                None => 0.0,
            },
            Err(_) => 0.0,
        }
    }
}

impl Receiver for SwingPredicter {
    fn receive_price(&mut self, price: &Kline) -> Result<(), EngineError> {
        self.zigzag.update(self.bar_index, price);
        self.bar_index += 1;
        Ok(())
    }
}

impl Predicter for SwingPredicter {
    fn predict(&self) -> f64 {
        (self.vote(Scale::Short) + self.vote(Scale::Long)) / 2.0
    }

    fn valid(&self) -> bool {
        self.zigzag.last_committed(Scale::Short, 0).is_ok()
            && self.zigzag.last_committed(Scale::Long, 0).is_ok()
    }
}
