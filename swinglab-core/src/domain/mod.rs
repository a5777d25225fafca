//! Domain types shared across the engine.

mod asset;
mod equity;
mod ids;
mod kline;
mod order;
mod position;
mod roundturn;

pub use asset::Asset;
pub use equity::EquitySeries;
pub use ids::{DealId, IdGen, OrderId};
pub use kline::{Kline, Receiver};
pub use order::{Order, OrderSide, OrderState, OrderType};
pub use position::{Position, PositionSide};
pub use roundturn::RoundTurn;
