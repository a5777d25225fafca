//! The bot engine: turns a streaming score into orders.
//!
//! Per-bar pipeline: update indicators, check readiness, read the score,
//! and act on threshold crossings. Orders placed here are seen by the
//! simulator on the next bar, so entries fill at the next bar's open.

use std::fmt;

use rust_decimal::Decimal;
use tracing::warn;

use crate::domain::{Asset, Kline, Order, OrderSide, PositionSide, Receiver};
use crate::error::EngineError;
use crate::sim::SimulatedDealer;
use crate::trader::{Predicter, Risker, Sizer};

/// Entry and exit score thresholds.
///
/// A long entry fires when the score crosses `enter_long` upward and a
/// long exit when it crosses `exit_long` downward; shorts are symmetric.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub enter_long: f64,
    pub exit_long: f64,
    pub enter_short: f64,
    pub exit_short: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            enter_long: 1.0,
            exit_long: -0.9,
            enter_short: -1.0,
            exit_short: 0.9,
        }
    }
}

/// A stop to attach once the entry it belongs to has filled.
struct PendingStop {
    position_side: PositionSide,
    risk: Decimal,
}

/// Trading algo driving one asset against one dealer.
///
/// At most one position per direction is held at a time; an opposing
/// entry closes the open position first (two orders, close first).
pub struct Bot {
    asset: Asset,
    thresholds: Thresholds,
    predicter: Box<dyn Predicter>,
    risker: Box<dyn Risker>,
    sizer: Box<dyn Sizer>,
    dealer: Box<dyn SimulatedDealer>,
    prev_score: Option<f64>,
    pending_stop: Option<PendingStop>,
}

impl fmt::Debug for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bot")
            .field("asset", &self.asset)
            .field("thresholds", &self.thresholds)
            .field("prev_score", &self.prev_score)
            .finish_non_exhaustive()
    }
}

impl Bot {
    pub fn new(
        asset: Asset,
        predicter: Box<dyn Predicter>,
        risker: Box<dyn Risker>,
        sizer: Box<dyn Sizer>,
        dealer: Box<dyn SimulatedDealer>,
    ) -> Self {
        Self {
            asset,
            thresholds: Thresholds::default(),
            predicter,
            risker,
            sizer,
            dealer,
            prev_score: None,
            pending_stop: None,
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn dealer(&self) -> &dyn SimulatedDealer {
        self.dealer.as_ref()
    }

    pub fn dealer_mut(&mut self) -> &mut dyn SimulatedDealer {
        self.dealer.as_mut()
    }

    /// Feed historical bars through the predicter only; no orders.
    pub fn warmup(&mut self, bars: &[Kline]) -> Result<(), EngineError> {
        for bar in bars {
            self.predicter.receive_price(bar)?;
        }
        Ok(())
    }

    /// Flatten any open positions with market-close orders.
    pub fn close(&mut self) -> Result<(), EngineError> {
        self.pending_stop = None;
        for side in [PositionSide::Long, PositionSide::Short] {
            self.submit_close(side, None)?;
        }
        Ok(())
    }

    fn open_position_size(&self, side: PositionSide) -> Option<Decimal> {
        self.dealer
            .positions()
            .into_iter()
            .find(|p| p.is_open() && p.asset == self.asset && p.side == side)
            .map(|p| p.size)
    }

    /// Place the reduce-only stop once its position exists on the ledger.
    fn place_pending_stop(&mut self, bar: &Kline) {
        let Some(pending) = self.pending_stop.take() else {
            return;
        };
        let position = self
            .dealer
            .positions()
            .into_iter()
            .find(|p| p.is_open() && p.asset == self.asset && p.side == pending.position_side);
        let Some(position) = position else {
            // Entry not filled yet; try again on the next bar.
            self.pending_stop = Some(pending);
            return;
        };

        let stop_price = match pending.position_side {
            PositionSide::Long => position.entry_price - pending.risk,
            PositionSide::Short => position.entry_price + pending.risk,
        };
        if stop_price <= Decimal::ZERO {
            // Full-price risk means no meaningful stop level.
            return;
        }

        let order = Order::limit(
            bar.start,
            self.asset.clone(),
            pending.position_side.opening_order_side().opposite(),
            position.size,
            stop_price,
        )
        .reduce_only();
        self.submit(order);
    }

    fn submit_close(
        &mut self,
        side: PositionSide,
        at: Option<&Kline>,
    ) -> Result<bool, EngineError> {
        let Some(size) = self.open_position_size(side) else {
            return Ok(false);
        };
        let created_at = at
            .map(|b| b.start)
            .or_else(|| self.dealer.equity().last().map(|(t, _)| *t))
            .unwrap_or(chrono::DateTime::<chrono::Utc>::UNIX_EPOCH);
        let order = Order::market(
            created_at,
            self.asset.clone(),
            side.opening_order_side().opposite(),
            size,
        )
        .reduce_only();
        Ok(self.submit(order))
    }

    fn submit_entry(&mut self, side: OrderSide, bar: &Kline) {
        let risk = self.risker.risk();
        if risk <= Decimal::ZERO {
            warn!(asset = %self.asset, "skipping entry: non-positive risk");
            return;
        }
        let Some(capital) = self.dealer.equity().last().map(|(_, eq)| *eq) else {
            return;
        };
        let size = self.sizer.size(bar.close, capital, risk);
        if size <= Decimal::ZERO {
            warn!(asset = %self.asset, "skipping entry: sizer returned no size");
            return;
        }

        let order = Order::market(bar.start, self.asset.clone(), side, size);
        if self.submit(order) {
            self.pending_stop = Some(PendingStop {
                position_side: PositionSide::from_opening_order(side),
                risk,
            });
        }
    }

    /// Place an order, downgrading rejections to a skipped signal.
    fn submit(&mut self, order: Order) -> bool {
        match self.dealer.place_order(order) {
            Ok(_) => true,
            Err(err) => {
                warn!(asset = %self.asset, %err, "order rejected, signal skipped");
                false
            }
        }
    }
}

impl Receiver for Bot {
    fn receive_price(&mut self, bar: &Kline) -> Result<(), EngineError> {
        self.predicter.receive_price(bar)?;
        self.risker.receive_price(bar)?;
        self.place_pending_stop(bar);

        if !self.predicter.valid() {
            return Ok(());
        }
        let score = self.predicter.predict();
        let Some(prev) = self.prev_score.replace(score) else {
            return Ok(());
        };

        let t = self.thresholds;
        let enter_long = prev < t.enter_long && score >= t.enter_long;
        let exit_long = prev > t.exit_long && score <= t.exit_long;
        let enter_short = prev > t.enter_short && score <= t.enter_short;
        let exit_short = prev < t.exit_short && score >= t.exit_short;

        // Exits before entries, closes before opposing opens.
        let mut long_closed = false;
        let mut short_closed = false;
        if exit_long {
            long_closed = self.submit_close(PositionSide::Long, Some(bar))?;
            if long_closed {
                self.pending_stop = None;
            }
        }
        if exit_short {
            short_closed = self.submit_close(PositionSide::Short, Some(bar))?;
            if short_closed {
                self.pending_stop = None;
            }
        }

        if enter_long && self.open_position_size(PositionSide::Long).is_none() {
            if !short_closed {
                self.submit_close(PositionSide::Short, Some(bar))?;
            }
            self.submit_entry(OrderSide::Buy, bar);
        }
        if enter_short && self.open_position_size(PositionSide::Short).is_none() {
            if !long_closed {
                self.submit_close(PositionSide::Long, Some(bar))?;
            }
            self.submit_entry(OrderSide::Sell, bar);
        }

        Ok(())
    }
}
