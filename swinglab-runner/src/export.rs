//! Study CSV export — four flat files linked by foreign keys.
//!
//! All files are prefixed by the study id:
//! - `{id}-phasereports.csv` — one row per (phase, parameter set)
//! - `{id}-trialreports.csv` — one row per backtest trial
//! - `{id}-roundturns.csv`   — every completed round-turn
//! - `{id}-curves.csv`       — every equity sample
//!
//! Child rows carry `study_id`, `phasereport_id`, and `trial_id` so the
//! tree reassembles relationally.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::StudyError;
use crate::optimize::{PhaseReport, Study, TrialReport};

/// Write all four study files into `dir`. Returns the paths written.
pub fn write_study_to_csv(study: &Study, dir: &Path) -> Result<Vec<PathBuf>, StudyError> {
    std::fs::create_dir_all(dir)?;
    let prefix = study.id.short();

    let phase_path = dir.join(format!("{prefix}-phasereports.csv"));
    write_phase_reports(study, &phase_path)?;

    let trial_path = dir.join(format!("{prefix}-trialreports.csv"));
    write_trial_reports(study, &trial_path)?;

    let turns_path = dir.join(format!("{prefix}-roundturns.csv"));
    write_round_turns(study, &turns_path)?;

    let curves_path = dir.join(format!("{prefix}-curves.csv"));
    write_curves(study, &curves_path)?;

    Ok(vec![phase_path, trial_path, turns_path, curves_path])
}

fn write_phase_reports(study: &Study, path: &Path) -> Result<(), StudyError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "study_id",
        "phase",
        "phasereport_id",
        "paramset_id",
        "params",
        "score",
        "trial_count",
        "cancelled",
    ])?;

    for report in study.all_phase_reports() {
        wtr.write_record([
            study.id.to_string(),
            report.phase.as_str().to_string(),
            report.id.to_string(),
            report.param_set.id.to_string(),
            report.param_set.render(),
            format_score(report.score),
            report.trials.len().to_string(),
            report.cancelled.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_trial_reports(study: &Study, path: &Path) -> Result<(), StudyError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "study_id",
        "phasereport_id",
        "trial_id",
        "asset",
        "total_profit",
        "trade_count",
        "win_rate",
        "profit_factor",
        "expectancy",
        "avg_hold_period_secs",
        "max_drawdown",
        "cagr",
        "sharpe",
        "cancelled",
        "failed",
    ])?;

    let mut write_trial = |report: &PhaseReport, trial: &TrialReport| -> Result<(), StudyError> {
        wtr.write_record([
            study.id.to_string(),
            report.id.to_string(),
            trial.id.to_string(),
            trial.asset.to_string(),
            trial.perf.total_profit.to_string(),
            trial.perf.trade_count.to_string(),
            format_score(trial.perf.win_rate),
            format_score(trial.perf.profit_factor),
            format_score(trial.perf.expectancy),
            format_score(trial.perf.avg_hold_period_secs),
            format_score(trial.perf.max_drawdown),
            format_score(trial.perf.cagr),
            format_score(trial.perf.sharpe),
            trial.cancelled.to_string(),
            trial.failed.clone().unwrap_or_default(),
        ])?;
        Ok(())
    };

    for report in study.all_phase_reports() {
        for trial in &report.trials {
            write_trial(report, trial)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

fn write_round_turns(study: &Study, path: &Path) -> Result<(), StudyError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "study_id",
        "phasereport_id",
        "trial_id",
        "roundturn_id",
        "created_at",
        "asset",
        "side",
        "profit",
        "hold_period_secs",
        "trade_count",
    ])?;

    for report in study.all_phase_reports() {
        for trial in &report.trials {
            for turn in &trial.round_turns {
                wtr.write_record([
                    &study.id.to_string(),
                    &report.id.to_string(),
                    &trial.id.to_string(),
                    &turn.id.to_string(),
                    &turn.created_at.to_rfc3339(),
                    &turn.asset.to_string(),
                    &format!("{:?}", turn.side),
                    &turn.profit.to_string(),
                    &turn.hold_period.num_seconds().to_string(),
                    &turn.trade_count.to_string(),
                ])?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

fn write_curves(study: &Study, path: &Path) -> Result<(), StudyError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record([
        "study_id",
        "phasereport_id",
        "trial_id",
        "time",
        "amount",
    ])?;

    for report in study.all_phase_reports() {
        for trial in &report.trials {
            for (time, amount) in trial.equity.iter() {
                wtr.write_record([
                    &study.id.to_string(),
                    &report.id.to_string(),
                    &trial.id.to_string(),
                    &time.to_rfc3339(),
                    &amount.to_string(),
                ])?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

/// Floats print with nine fractional digits so re-parsed rows agree to
/// 1e-9. Non-finite scores pass through as `inf`/`-inf`/`NaN`.
fn format_score(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.9}")
    } else {
        value.to_string()
    }
}

/// A re-parsed phase report row, for verification and downstream tools.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhaseReportRow {
    pub study_id: String,
    pub phase: String,
    pub phasereport_id: String,
    pub paramset_id: String,
    pub params: String,
    pub score: f64,
    pub trial_count: usize,
    pub cancelled: bool,
}

/// Read back a `-phasereports.csv` file.
pub fn read_phase_reports(path: &Path) -> Result<Vec<PhaseReportRow>, StudyError> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}
