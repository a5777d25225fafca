//! Bot engine and the predicter → risker → sizer pipeline.

mod bot;
mod predict;
mod risk;
mod size;

pub use bot::{Bot, Thresholds};
pub use predict::{Predicter, SwingPredicter};
pub use risk::{FullRisker, Risker, SwingRisker};
pub use size::{FixedSizer, SafeFSizer, Sizer};
