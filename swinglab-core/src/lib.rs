//! SwingLab Core — the backtesting engine.
//!
//! This crate contains the heart of the system:
//! - Market types (klines, assets, the price receiver contract)
//! - Exact decimal money arithmetic
//! - Double ZigZag swing-point indicator
//! - Bar-by-bar matching simulator with a position-and-equity ledger
//! - Dealer facade exposing the simulator through the broker contract
//! - Bot engine driving the predicter → risker → sizer → order pipeline

pub mod dec;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod sim;
pub mod testkit;
pub mod trader;

pub use error::EngineError;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: engine types can move across the optimizer's
    /// worker threads.
    #[allow(dead_code)]
    fn assert_send() {
        fn require_send<T: Send>() {}

        require_send::<domain::Kline>();
        require_send::<domain::Asset>();
        require_send::<domain::Order>();
        require_send::<domain::Position>();
        require_send::<domain::RoundTurn>();
        require_send::<domain::EquitySeries>();
        require_send::<indicators::DoubleZigZag>();
        require_send::<sim::Simulator>();
        require_send::<sim::SimDealer>();
        require_send::<trader::Bot>();
    }
}
