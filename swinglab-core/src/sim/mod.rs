//! Matching simulator, cost model, and the dealer facade.

mod cost;
mod dealer;
mod simulator;

pub use cost::{Coster, FeeCoster, FreeCoster};
pub use dealer::{Dealer, SimDealer, SimulatedDealer};
pub use simulator::Simulator;
