//! Streaming indicators.

mod zigzag;

pub use zigzag::{DoubleZigZag, Scale, SwingLabel, SwingPoint};
