//! Order record and lifecycle state machine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::asset::Asset;
use super::ids::OrderId;

/// Buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    /// +1 for buy, -1 for sell.
    pub fn sign(self) -> Decimal {
        match self {
            OrderSide::Buy => Decimal::ONE,
            OrderSide::Sell => -Decimal::ONE,
        }
    }
}

/// Market orders fill at the next processed bar's open. Limit orders rest
/// until the bar range reaches their price. A reduce-only limit order is a
/// stop attached to the open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

/// Order lifecycle.
///
/// ```text
/// pending → open → {filled | cancelled | rejected}
/// ```
///
/// Terminal states have no outbound transitions; fill fields freeze when
/// the order fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderState {
    /// Created by the bot, not yet accepted by the dealer.
    Pending,
    /// Accepted, resting in the open-order set.
    Open,
    /// Completely filled.
    Filled,
    /// Cancelled with a reason (position closed, user cancel).
    Cancelled { reason: String },
    /// Rejected on submission with a reason code; retained for audit.
    Rejected { reason: String },
}

/// An order created by a bot and owned by the simulator once accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    pub asset: Asset,
    pub side: OrderSide,
    pub order_type: OrderType,
    /// Always positive; direction lives in `side`.
    pub size: Decimal,
    pub limit_price: Option<Decimal>,
    /// Reduce-only orders may only shrink an existing position.
    pub reduce_only: bool,
    pub state: OrderState,
    pub fill_price: Option<Decimal>,
    pub filled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// A market order as a bot creates it: no id yet, pending.
    pub fn market(created_at: DateTime<Utc>, asset: Asset, side: OrderSide, size: Decimal) -> Self {
        Self {
            id: OrderId(0),
            created_at,
            asset,
            side,
            order_type: OrderType::Market,
            size,
            limit_price: None,
            reduce_only: false,
            state: OrderState::Pending,
            fill_price: None,
            filled_at: None,
        }
    }

    pub fn limit(
        created_at: DateTime<Utc>,
        asset: Asset,
        side: OrderSide,
        size: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self {
            order_type: OrderType::Limit,
            limit_price: Some(limit_price),
            ..Self::market(created_at, asset, side, size)
        }
    }

    pub fn reduce_only(mut self) -> Self {
        self.reduce_only = true;
        self
    }

    pub fn is_open(&self) -> bool {
        self.state == OrderState::Open
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            OrderState::Filled | OrderState::Cancelled { .. } | OrderState::Rejected { .. }
        )
    }

    /// A resting reduce-only order with a price acts as a stop on the
    /// position and is matched before entries.
    pub fn is_stop(&self) -> bool {
        self.reduce_only && self.order_type == OrderType::Limit
    }
}
