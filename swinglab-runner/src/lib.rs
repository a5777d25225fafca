//! SwingLab Runner — everything above a single backtest.
//!
//! - Performance analysis over round-turns and equity curves
//! - Parameter-space enumeration and walk-forward study driver
//! - Kline readers (CSV decoders, database reader contract)
//! - Study configuration and four-file CSV export
//! - Cooperative cancellation

pub mod bots;
pub mod cancel;
pub mod config;
pub mod error;
pub mod export;
pub mod optimize;
pub mod perf;
pub mod reader;

pub use cancel::CancelToken;
pub use error::StudyError;
