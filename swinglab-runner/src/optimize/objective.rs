//! Objective functions ranking phase reports.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StudyError;
use crate::perf::PerformanceReport;

/// Scalar score over a trial's performance report. Higher is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// CAGR over absolute max drawdown; plain CAGR when flat.
    CagrMdd,
    Sharpe,
    Expectancy,
}

impl Objective {
    pub fn score(&self, report: &PerformanceReport) -> f64 {
        match self {
            Objective::CagrMdd => {
                let mdd = report.max_drawdown.abs();
                if mdd < 1e-12 {
                    report.cagr
                } else {
                    report.cagr / mdd
                }
            }
            Objective::Sharpe => report.sharpe,
            Objective::Expectancy => report.expectancy,
        }
    }
}

impl FromStr for Objective {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cagr_mdd" => Ok(Objective::CagrMdd),
            "sharpe" => Ok(Objective::Sharpe),
            "expectancy" => Ok(Objective::Expectancy),
            other => Err(StudyError::invalid_config(
                "optimizer.objective",
                format!("unrecognized objective '{other}'"),
            )),
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Objective::CagrMdd => "cagr_mdd",
            Objective::Sharpe => "sharpe",
            Objective::Expectancy => "expectancy",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn report(cagr: f64, mdd: f64, sharpe: f64, expectancy: f64) -> PerformanceReport {
        PerformanceReport {
            total_profit: Decimal::ZERO,
            trade_count: 0,
            win_rate: 0.0,
            profit_factor: 0.0,
            expectancy,
            avg_hold_period_secs: 0.0,
            max_drawdown: mdd,
            cagr,
            sharpe,
        }
    }

    #[test]
    fn cagr_mdd_divides_by_drawdown() {
        let r = report(0.3, -0.1, 0.0, 0.0);
        assert!((Objective::CagrMdd.score(&r) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn cagr_mdd_flat_curve_degenerates_to_cagr() {
        let r = report(0.3, 0.0, 0.0, 0.0);
        assert!((Objective::CagrMdd.score(&r) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn parses_recognized_names() {
        assert_eq!("cagr_mdd".parse::<Objective>().unwrap(), Objective::CagrMdd);
        assert_eq!("sharpe".parse::<Objective>().unwrap(), Objective::Sharpe);
        assert_eq!(
            "expectancy".parse::<Objective>().unwrap(),
            Objective::Expectancy
        );
        assert!("calmar".parse::<Objective>().is_err());
    }
}
