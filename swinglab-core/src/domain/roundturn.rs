//! RoundTurn — the result of opening and closing a position.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::asset::Asset;
use super::ids::DealId;
use super::position::{Position, PositionSide};

/// A matched open/close pair, the unit of realized P&L.
///
/// Emitted by the simulator the moment a position's size reaches zero;
/// a value object with no references back into the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundTurn {
    pub id: DealId,
    /// Close time of the position.
    pub created_at: DateTime<Utc>,
    pub asset: Asset,
    pub side: PositionSide,
    /// Realized profit after costs.
    pub profit: Decimal,
    /// Close time minus open time.
    #[serde(with = "duration_seconds")]
    pub hold_period: Duration,
    /// Number of fills participating in the position.
    pub trade_count: usize,
}

impl RoundTurn {
    /// Capture a closed position. Caller guarantees `size == 0` and
    /// `closed_at` set.
    pub fn from_position(id: DealId, position: &Position) -> Self {
        let closed_at = position.closed_at.unwrap_or(position.opened_at);
        Self {
            id,
            created_at: closed_at,
            asset: position.asset.clone(),
            side: position.side,
            profit: position.realized_profit,
            hold_period: closed_at - position.opened_at,
            trade_count: position.trade_count,
        }
    }
}

/// Serialize hold periods as whole seconds for CSV friendliness.
mod duration_seconds {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(d)?;
        Ok(Duration::seconds(secs))
    }
}
