//! Performance analysis — pure functions from round-turns and an equity
//! series to aggregate statistics.
//!
//! Every metric is a pure function of its inputs and is defined for
//! empty input (documented zeros). Profits stay decimal; ratios and
//! annualized statistics are floats.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use swinglab_core::dec;
use swinglab_core::domain::{EquitySeries, RoundTurn};

const SECONDS_PER_YEAR: f64 = 31_536_000.0;

/// Aggregate statistics for one backtest trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Sum of round-turn profits, after costs.
    pub total_profit: Decimal,
    pub trade_count: usize,
    /// Fraction of round-turns with positive profit. 0 when empty.
    pub win_rate: f64,
    /// Gross profit over gross loss, capped at 100. 0 when empty.
    pub profit_factor: f64,
    /// Mean net profit per round-turn. 0 when empty.
    pub expectancy: f64,
    /// Mean hold period in seconds. 0 when empty.
    pub avg_hold_period_secs: f64,
    /// Peak-to-trough drawdown of the equity curve as a negative
    /// fraction. 0 for flat or rising curves.
    pub max_drawdown: f64,
    /// Compound annual growth rate of the equity curve. 0 when the span
    /// or endpoints make it undefined.
    pub cagr: f64,
    /// Bar-to-bar Sharpe ratio annualized by the series' periodicity.
    /// 0 with fewer than three samples or zero variance.
    pub sharpe: f64,
}

impl PerformanceReport {
    pub fn compute(round_turns: &[RoundTurn], equity: &EquitySeries) -> Self {
        Self {
            total_profit: round_turns.iter().map(|rt| rt.profit).sum(),
            trade_count: round_turns.len(),
            win_rate: win_rate(round_turns),
            profit_factor: profit_factor(round_turns),
            expectancy: expectancy(round_turns),
            avg_hold_period_secs: avg_hold_period_secs(round_turns),
            max_drawdown: max_drawdown(equity),
            cagr: cagr(equity),
            sharpe: sharpe(equity),
        }
    }
}

pub fn win_rate(round_turns: &[RoundTurn]) -> f64 {
    if round_turns.is_empty() {
        return 0.0;
    }
    let winners = round_turns
        .iter()
        .filter(|rt| rt.profit > Decimal::ZERO)
        .count();
    winners as f64 / round_turns.len() as f64
}

/// Gross profits over gross losses, capped at 100 when losses vanish.
pub fn profit_factor(round_turns: &[RoundTurn]) -> f64 {
    if round_turns.is_empty() {
        return 0.0;
    }
    let gross_profit: Decimal = round_turns
        .iter()
        .filter(|rt| rt.profit > Decimal::ZERO)
        .map(|rt| rt.profit)
        .sum();
    let gross_loss: Decimal = round_turns
        .iter()
        .filter(|rt| rt.profit < Decimal::ZERO)
        .map(|rt| -rt.profit)
        .sum();

    if gross_loss == Decimal::ZERO {
        return if gross_profit > Decimal::ZERO { 100.0 } else { 0.0 };
    }
    (dec::to_f64(gross_profit) / dec::to_f64(gross_loss)).min(100.0)
}

/// Mean net profit per round-turn.
pub fn expectancy(round_turns: &[RoundTurn]) -> f64 {
    if round_turns.is_empty() {
        return 0.0;
    }
    let total: Decimal = round_turns.iter().map(|rt| rt.profit).sum();
    dec::to_f64(total) / round_turns.len() as f64
}

pub fn avg_hold_period_secs(round_turns: &[RoundTurn]) -> f64 {
    if round_turns.is_empty() {
        return 0.0;
    }
    let total: i64 = round_turns
        .iter()
        .map(|rt| rt.hold_period.num_seconds())
        .sum();
    total as f64 / round_turns.len() as f64
}

/// Maximum drawdown as a negative fraction, e.g. -0.15 for a 15% dip.
pub fn max_drawdown(equity: &EquitySeries) -> f64 {
    let amounts = equity.amounts();
    if amounts.len() < 2 {
        return 0.0;
    }
    let mut peak = dec::to_f64(amounts[0]);
    let mut max_dd = 0.0_f64;
    for amount in amounts.iter().map(|&a| dec::to_f64(a)) {
        if amount > peak {
            peak = amount;
        }
        if peak > 0.0 {
            let dd = (amount - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Compound annual growth over the sampled span.
pub fn cagr(equity: &EquitySeries) -> f64 {
    let (Some((first_t, first)), Some((last_t, last))) = (equity.first(), equity.last()) else {
        return 0.0;
    };
    let initial = dec::to_f64(*first);
    let final_eq = dec::to_f64(*last);
    let years = (*last_t - *first_t).num_seconds() as f64 / SECONDS_PER_YEAR;
    if initial <= 0.0 || final_eq <= 0.0 || years <= 0.0 {
        return 0.0;
    }
    (final_eq / initial).powf(1.0 / years) - 1.0
}

/// Sharpe over bar-to-bar equity returns, annualized by the bar
/// periodicity inferred from the first sample gap.
pub fn sharpe(equity: &EquitySeries) -> f64 {
    let amounts: Vec<f64> = equity.amounts().iter().map(|&a| dec::to_f64(a)).collect();
    if amounts.len() < 3 {
        return 0.0;
    }

    let returns: Vec<f64> = amounts
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    let std = var.sqrt();
    if std < 1e-15 {
        return 0.0;
    }

    let times: Vec<_> = equity.iter().map(|(t, _)| *t).collect();
    let bar_secs = (times[1] - times[0]).num_seconds() as f64;
    if bar_secs <= 0.0 {
        return 0.0;
    }
    let periods_per_year = SECONDS_PER_YEAR / bar_secs;
    (mean / std) * periods_per_year.sqrt()
}
