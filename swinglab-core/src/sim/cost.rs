//! Cost model — maps order notional to a fee/spread deduction.

use rust_decimal::Decimal;

use crate::domain::OrderSide;

/// Charge levied on each fill, deducted from realized profit on the
/// reducing side. No market impact is modeled.
pub trait Coster: Send {
    /// Absolute cost for a fill of the given notional value.
    fn charge(&self, notional: Decimal, size: Decimal, side: OrderSide) -> Decimal;
}

/// Zero-cost model, the default for invariant tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeCoster;

impl Coster for FreeCoster {
    fn charge(&self, _notional: Decimal, _size: Decimal, _side: OrderSide) -> Decimal {
        Decimal::ZERO
    }
}

/// Fee-rate plus fixed-spread model.
///
/// All simulator fills are aggressive, so the taker rate applies to the
/// notional; the maker rate is carried for completeness of the dealer
/// config. The spread is charged as half its tick value per unit on each
/// side of the round-turn.
#[derive(Debug, Clone, Copy)]
pub struct FeeCoster {
    pub maker_rate: Decimal,
    pub taker_rate: Decimal,
    /// Fixed spread in price ticks, applied symmetrically.
    pub spread_ticks: Decimal,
    pub tick_size: Decimal,
}

impl FeeCoster {
    pub fn new(maker_rate: Decimal, taker_rate: Decimal) -> Self {
        Self {
            maker_rate,
            taker_rate,
            spread_ticks: Decimal::ZERO,
            tick_size: Decimal::ZERO,
        }
    }

    pub fn with_spread(mut self, spread_ticks: Decimal, tick_size: Decimal) -> Self {
        self.spread_ticks = spread_ticks;
        self.tick_size = tick_size;
        self
    }
}

impl Coster for FeeCoster {
    fn charge(&self, notional: Decimal, size: Decimal, _side: OrderSide) -> Decimal {
        let fee = notional * self.taker_rate;
        let half_spread = self.spread_ticks * self.tick_size / Decimal::TWO;
        fee + half_spread * size
    }
}
