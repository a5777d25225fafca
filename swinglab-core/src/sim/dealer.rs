//! Dealer facade — the broker contract a bot trades against.

use rust_decimal::Decimal;

use crate::domain::{EquitySeries, Kline, Order, Position, Receiver, RoundTurn};
use crate::error::EngineError;
use crate::sim::cost::Coster;
use crate::sim::simulator::Simulator;

/// Order execution and ledger queries. Bots depend on this contract
/// only, so a live implementation could stand in for the simulator.
pub trait Dealer: Send {
    fn place_order(&mut self, order: Order) -> Result<Order, EngineError>;
    fn positions(&self) -> Vec<Position>;
    fn round_turns(&self) -> Vec<RoundTurn>;
}

/// A dealer that also consumes the price stream and keeps an equity
/// ledger: the backtest contract.
pub trait SimulatedDealer: Dealer + Receiver {
    fn equity(&self) -> EquitySeries;
    fn set_account_balance(&mut self, amount: Decimal) -> Result<(), EngineError>;
}

/// Exposes [`Simulator`] through the dealer contract.
pub struct SimDealer {
    simulator: Simulator,
}

impl Default for SimDealer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDealer {
    pub fn new() -> Self {
        Self {
            simulator: Simulator::new(),
        }
    }

    pub fn with_coster(coster: Box<dyn Coster>) -> Self {
        Self {
            simulator: Simulator::with_coster(coster),
        }
    }

    /// Full order audit, including rejected and cancelled orders.
    pub fn orders(&self) -> Vec<Order> {
        self.simulator.orders()
    }
}

impl Dealer for SimDealer {
    fn place_order(&mut self, order: Order) -> Result<Order, EngineError> {
        self.simulator.add_order(order)
    }

    fn positions(&self) -> Vec<Position> {
        self.simulator.positions()
    }

    fn round_turns(&self) -> Vec<RoundTurn> {
        self.simulator.round_turns()
    }
}

impl Receiver for SimDealer {
    fn receive_price(&mut self, price: &Kline) -> Result<(), EngineError> {
        self.simulator.next(price)
    }
}

impl SimulatedDealer for SimDealer {
    fn equity(&self) -> EquitySeries {
        self.simulator.equity()
    }

    fn set_account_balance(&mut self, amount: Decimal) -> Result<(), EngineError> {
        self.simulator.set_account_balance(amount)
    }
}
