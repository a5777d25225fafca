//! Engine error taxonomy.
//!
//! Every variant carries the offending entity's identity so failure
//! messages can name the order, bar, or query that caused them.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::OrderId;

/// Failures raised by the simulator, indicators, and bot engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The order violates an invariant and was rejected on submission.
    /// Bots treat this as a warning and skip the signal.
    #[error("invalid order {order_id}: {reason}")]
    InvalidOrder { order_id: OrderId, reason: String },

    /// The simulator received a bar at or before its clock. Fatal to the
    /// trial: the ledger cannot be trusted after a time reversal.
    #[error("out-of-order bar {bar_start} (last processed {last_processed})")]
    OutOfOrder {
        bar_start: DateTime<Utc>,
        last_processed: DateTime<Utc>,
    },

    /// An indicator was queried before it had enough data. The bot stays
    /// in warmup.
    #[error("insufficient data: wanted {wanted} committed points, have {have}")]
    InsufficientData { wanted: usize, have: usize },

    /// `set_account_balance` called after the first bar was processed.
    #[error("account balance is locked once bars have been processed")]
    BalanceLocked,
}
