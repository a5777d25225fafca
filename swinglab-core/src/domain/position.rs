//! Position — one open holding per (asset, direction).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::asset::Asset;
use super::ids::DealId;
use super::order::OrderSide;

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> Decimal {
        match self {
            PositionSide::Long => Decimal::ONE,
            PositionSide::Short => -Decimal::ONE,
        }
    }

    /// The order side that opens (grows) a position of this direction.
    pub fn opening_order_side(self) -> OrderSide {
        match self {
            PositionSide::Long => OrderSide::Buy,
            PositionSide::Short => OrderSide::Sell,
        }
    }

    pub fn from_opening_order(side: OrderSide) -> Self {
        match side {
            OrderSide::Buy => PositionSide::Long,
            OrderSide::Sell => PositionSide::Short,
        }
    }
}

/// A position is open while `size > 0`. The simulator owns positions
/// wholly; callers see snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: DealId,
    pub asset: Asset,
    pub side: PositionSide,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Size-weighted average entry price across opening fills.
    pub entry_price: Decimal,
    pub size: Decimal,
    /// Net realized profit accumulated by reducing fills, after costs.
    pub realized_profit: Decimal,
    /// Stop level attached by a resting reduce-only order.
    pub liquidation_price: Option<Decimal>,
    /// Number of fills that have touched this position.
    pub trade_count: usize,
}

impl Position {
    pub fn open(
        id: DealId,
        asset: Asset,
        side: PositionSide,
        opened_at: DateTime<Utc>,
        entry_price: Decimal,
        size: Decimal,
    ) -> Self {
        Self {
            id,
            asset,
            side,
            opened_at,
            closed_at: None,
            entry_price,
            size,
            realized_profit: Decimal::ZERO,
            liquidation_price: None,
            trade_count: 1,
        }
    }

    pub fn is_open(&self) -> bool {
        self.size > Decimal::ZERO
    }

    /// Grow the position, re-averaging the entry price by size.
    pub fn add(&mut self, price: Decimal, size: Decimal) {
        let new_size = self.size + size;
        self.entry_price = (self.entry_price * self.size + price * size) / new_size;
        self.size = new_size;
        self.trade_count += 1;
    }

    /// Reduce the position by `size`, realizing profit per unit of
    /// `(exit - entry) * side_sign` minus `cost` on the reducing notional.
    /// Returns the net profit realized by this fill.
    pub fn reduce(&mut self, price: Decimal, size: Decimal, cost: Decimal) -> Decimal {
        let per_unit = (price - self.entry_price) * self.side.sign();
        let realized = per_unit * size - cost;
        self.realized_profit += realized;
        self.size -= size;
        self.trade_count += 1;
        realized
    }

    /// Unrealized mark against a reference price.
    pub fn unrealized(&self, mark: Decimal) -> Decimal {
        self.size * (mark - self.entry_price) * self.side.sign()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn open_long(price: Decimal, size: Decimal) -> Position {
        Position::open(
            DealId(0),
            Asset::new("BTCUSDT"),
            PositionSide::Long,
            Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
            price,
            size,
        )
    }

    #[test]
    fn add_reaverages_entry() {
        let mut p = open_long(dec!(100), dec!(1));
        p.add(dec!(110), dec!(1));
        assert_eq!(p.entry_price, dec!(105));
        assert_eq!(p.size, dec!(2));
        assert_eq!(p.trade_count, 2);
    }

    #[test]
    fn reduce_realizes_long_profit() {
        let mut p = open_long(dec!(100), dec!(2));
        p.reduce(dec!(110), dec!(1), Decimal::ZERO);
        assert_eq!(p.realized_profit, dec!(10));
        assert_eq!(p.size, dec!(1));
        assert!(p.is_open());
    }

    #[test]
    fn reduce_realizes_short_profit() {
        let mut p = open_long(dec!(100), dec!(1));
        p.side = PositionSide::Short;
        p.reduce(dec!(90), dec!(1), Decimal::ZERO);
        assert_eq!(p.realized_profit, dec!(10));
        assert!(!p.is_open());
    }

    #[test]
    fn reduce_deducts_cost() {
        let mut p = open_long(dec!(100), dec!(1));
        p.reduce(dec!(110), dec!(1), dec!(2));
        assert_eq!(p.realized_profit, dec!(8));
    }

    #[test]
    fn unrealized_mark() {
        let p = open_long(dec!(100), dec!(3));
        assert_eq!(p.unrealized(dec!(104)), dec!(12));
    }
}
