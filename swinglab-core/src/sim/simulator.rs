//! The matching simulator: order matching, positions, equity ledger.
//!
//! One instance per backtest trial, driven strictly single-threaded in
//! bar-timestamp order. Fills happen at the start of `next`, so an order
//! a bot places after seeing bar N first meets the matcher on bar N+1:
//! market orders fill at the next bar's open, never at a price the bot
//! has already seen.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{
    Asset, EquitySeries, IdGen, Kline, Order, OrderId, OrderSide, OrderState, OrderType,
    Position, PositionSide, RoundTurn,
};
use crate::error::EngineError;
use crate::sim::cost::{Coster, FreeCoster};

/// Deterministic bar-by-bar matching engine with a position-and-equity
/// ledger. Orders are owned by the simulator once accepted; positions are
/// wholly owned; round-turns are emitted as value objects on close.
pub struct Simulator {
    balance: Decimal,
    clock: Option<DateTime<Utc>>,
    /// Every order ever submitted, terminal ones retained for audit.
    orders: Vec<Order>,
    /// Open and closed positions, in open order.
    positions: Vec<Position>,
    round_turns: Vec<RoundTurn>,
    equity: EquitySeries,
    coster: Box<dyn Coster>,
    ids: IdGen,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    pub fn new() -> Self {
        Self::with_coster(Box::new(FreeCoster))
    }

    pub fn with_coster(coster: Box<dyn Coster>) -> Self {
        Self {
            balance: dec!(1000),
            clock: None,
            orders: Vec::new(),
            positions: Vec::new(),
            round_turns: Vec::new(),
            equity: EquitySeries::new(),
            coster,
            ids: IdGen::default(),
        }
    }

    /// Set initial equity. Legal only before the first bar is processed.
    pub fn set_account_balance(&mut self, amount: Decimal) -> Result<(), EngineError> {
        if self.clock.is_some() {
            return Err(EngineError::BalanceLocked);
        }
        self.balance = amount;
        Ok(())
    }

    /// Validate and accept an order into the open-order set.
    ///
    /// The returned order carries its assigned id and `Open` state.
    /// Rejected orders are retained with a reason code and reported as
    /// `InvalidOrder`.
    pub fn add_order(&mut self, mut order: Order) -> Result<Order, EngineError> {
        order.id = self.ids.next_order_id();

        if let Some(reason) = self.validate(&order) {
            order.state = OrderState::Rejected {
                reason: reason.clone(),
            };
            let id = order.id;
            self.orders.push(order);
            return Err(EngineError::InvalidOrder {
                order_id: id,
                reason,
            });
        }

        order.state = OrderState::Open;

        // A stop doubles as the position's liquidation price.
        if order.is_stop() {
            if let Some(pos) = self.open_position_mut(
                &order.asset,
                PositionSide::from_opening_order(order.side.opposite()),
            ) {
                pos.liquidation_price = order.limit_price;
            }
        }

        self.orders.push(order.clone());
        Ok(order)
    }

    fn validate(&self, order: &Order) -> Option<String> {
        if order.size <= Decimal::ZERO {
            return Some("size must be positive".into());
        }
        if order.order_type == OrderType::Limit && order.limit_price.is_none() {
            return Some("limit order lacks a price".into());
        }
        if order.reduce_only {
            let reduces = PositionSide::from_opening_order(order.side.opposite());
            if self.open_position(&order.asset, reduces).is_none() {
                return Some("reduce-only with no matching open position".into());
            }
        }
        None
    }

    /// Advance the clock to `kline.start`, fill matchable resting orders,
    /// and mark one equity sample at the bar close.
    pub fn next(&mut self, kline: &Kline) -> Result<(), EngineError> {
        if let Some(last) = self.clock {
            if kline.start <= last {
                return Err(EngineError::OutOfOrder {
                    bar_start: kline.start,
                    last_processed: last,
                });
            }
        }
        self.clock = Some(kline.start);

        self.process_fills(kline);
        self.mark_equity(kline);
        Ok(())
    }

    /// Stops are evaluated before entries; within a class, FIFO by order
    /// id (monotonic by submission).
    fn process_fills(&mut self, kline: &Kline) {
        let mut queue: Vec<usize> = (0..self.orders.len())
            .filter(|&i| self.orders[i].is_open())
            .collect();
        queue.sort_by_key(|&i| (!self.orders[i].is_stop(), self.orders[i].id));

        for i in queue {
            // A close triggered earlier in this bar may have cancelled
            // this order already.
            if !self.orders[i].is_open() {
                continue;
            }
            if let Some(price) = match_price(&self.orders[i], kline) {
                let order = &mut self.orders[i];
                order.state = OrderState::Filled;
                order.fill_price = Some(price);
                order.filled_at = Some(kline.start);
                let filled = order.clone();
                self.apply_fill(&filled, price, kline.start);
            }
        }
    }

    /// Route a fill into the ledger: reduce the opposing position first,
    /// then open or grow the same-side position with any remainder.
    /// Crossing through zero is never carried by a single position.
    fn apply_fill(&mut self, order: &Order, price: Decimal, at: DateTime<Utc>) {
        let opposing = PositionSide::from_opening_order(order.side.opposite());
        let mut remaining = order.size;

        if let Some(idx) = self.open_position_index(&order.asset, opposing) {
            let reduce_by = remaining.min(self.positions[idx].size);
            let cost = self
                .coster
                .charge(price * reduce_by, reduce_by, order.side);
            let pos = &mut self.positions[idx];
            // Net proceeds are credited per reducing fill, so equity sees
            // realized profit of partially closed positions immediately.
            self.balance += pos.reduce(price, reduce_by, cost);
            remaining -= reduce_by;

            if !pos.is_open() {
                pos.closed_at = Some(at);
                let rt = RoundTurn::from_position(self.ids.next_deal_id(), &self.positions[idx]);
                self.round_turns.push(rt);
                self.cancel_reduce_only(&order.asset, order.id);
            }
        }

        if remaining > Decimal::ZERO && !order.reduce_only {
            let side = PositionSide::from_opening_order(order.side);
            match self.open_position_index(&order.asset, side) {
                Some(idx) => self.positions[idx].add(price, remaining),
                None => {
                    let pos = Position::open(
                        self.ids.next_deal_id(),
                        order.asset.clone(),
                        side,
                        at,
                        price,
                        remaining,
                    );
                    self.positions.push(pos);
                }
            }
        }
    }

    /// Cancel resting reduce-only orders once their position is gone.
    fn cancel_reduce_only(&mut self, asset: &Asset, filled_id: OrderId) {
        for order in &mut self.orders {
            if order.is_open() && order.reduce_only && order.asset == *asset && order.id != filled_id
            {
                order.state = OrderState::Cancelled {
                    reason: "position closed".into(),
                };
            }
        }
    }

    /// equity = balance + sum of open-position marks at the bar close.
    /// Written exactly once per bar, after fills.
    fn mark_equity(&mut self, kline: &Kline) {
        let unrealized: Decimal = self
            .positions
            .iter()
            .filter(|p| p.is_open())
            .map(|p| p.unrealized(kline.close))
            .sum();
        self.equity.record(kline.start, self.balance + unrealized);
    }

    fn open_position(&self, asset: &Asset, side: PositionSide) -> Option<&Position> {
        self.positions
            .iter()
            .find(|p| p.is_open() && p.asset == *asset && p.side == side)
    }

    fn open_position_mut(&mut self, asset: &Asset, side: PositionSide) -> Option<&mut Position> {
        self.positions
            .iter_mut()
            .find(|p| p.is_open() && p.asset == *asset && p.side == side)
    }

    fn open_position_index(&self, asset: &Asset, side: PositionSide) -> Option<usize> {
        self.positions
            .iter()
            .position(|p| p.is_open() && p.asset == *asset && p.side == side)
    }

    // ── Read-only snapshots ──────────────────────────────────────────

    pub fn positions(&self) -> Vec<Position> {
        self.positions.clone()
    }

    pub fn open_positions(&self) -> Vec<Position> {
        self.positions
            .iter()
            .filter(|p| p.is_open())
            .cloned()
            .collect()
    }

    pub fn round_turns(&self) -> Vec<RoundTurn> {
        self.round_turns.clone()
    }

    pub fn equity(&self) -> EquitySeries {
        self.equity.clone()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders.clone()
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }
}

/// Conservative intrabar price policy. `None` means the order rests.
fn match_price(order: &Order, kline: &Kline) -> Option<Decimal> {
    match order.order_type {
        // Market orders fill at this bar's open.
        OrderType::Market => Some(kline.open),
        OrderType::Limit => {
            let limit = order.limit_price.expect("validated at submission");
            if order.is_stop() {
                // Stop fills at its price once the bar range touches it.
                if kline.low <= limit && limit <= kline.high {
                    Some(limit)
                } else {
                    None
                }
            } else {
                match order.side {
                    OrderSide::Buy if limit >= kline.low => Some(if kline.open <= limit {
                        kline.open
                    } else {
                        limit
                    }),
                    OrderSide::Sell if limit <= kline.high => Some(if kline.open >= limit {
                        kline.open
                    } else {
                        limit
                    }),
                    _ => None,
                }
            }
        }
    }
}
