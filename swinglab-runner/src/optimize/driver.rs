//! Walk-forward study driver.
//!
//! Splits each price sample into a training window and a disjoint,
//! later validation window. The training phase backtests every
//! parameter set in the grid; the top-K sets by objective score are
//! re-run on the validation window and accepted only when their
//! validation score clears the floor with the same sign as training.
//!
//! Trials are pure functions of (parameter set, prices): each gets a
//! fresh dealer and bot, so parallelism needs no locks below the result
//! aggregator.

use std::collections::BTreeMap;
use std::sync::Mutex;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use swinglab_core::domain::{Asset, Kline, Receiver};
use swinglab_core::trader::Bot;

use super::grid::{enumerate_space, ParamSet, ParamSpace};
use super::ids::{ParamSetId, PhaseId, StudyId, TrialId};
use super::objective::Objective;
use super::study::{Phase, PhaseReport, Study, TrialReport};
use crate::cancel::CancelToken;
use crate::error::StudyError;
use crate::perf::PerformanceReport;

/// Optimizer knobs, typically read from the `optimizer` config subtree.
#[derive(Debug, Clone)]
pub struct OptimizerSettings {
    pub objective: Objective,
    /// Top-K training sets that advance to validation.
    pub selection: usize,
    /// Training fraction of each sample, in (0, 1).
    pub split: f64,
    /// Minimum validation score for acceptance.
    pub validation_floor: f64,
    /// Worker threads for the trial fan-out; 1 runs sequentially.
    pub workers: usize,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            objective: Objective::CagrMdd,
            selection: 1,
            split: 0.7,
            validation_floor: 0.0,
            workers: 1,
        }
    }
}

/// Factory minting a fresh bot (owning a fresh dealer) for one trial.
pub type BotFactory<'a> = &'a (dyn Fn(&ParamSet, &Asset) -> Result<Bot, StudyError> + Sync);

/// Run a complete walk-forward study over the given price samples.
///
/// Returns a partial study flagged `cancelled` when the token fires;
/// only `InvalidConfig` aborts with an error.
pub fn run_study(
    samples: &BTreeMap<Asset, Vec<Kline>>,
    space: &ParamSpace,
    settings: &OptimizerSettings,
    make_bot: BotFactory,
    cancel: &CancelToken,
) -> Result<Study, StudyError> {
    if !(settings.split > 0.0 && settings.split < 1.0) {
        return Err(StudyError::invalid_config(
            "optimizer.split",
            format!("split {} not in (0, 1)", settings.split),
        ));
    }
    if settings.selection == 0 {
        return Err(StudyError::invalid_config(
            "optimizer.selection",
            "selection must be at least 1",
        ));
    }
    if samples.is_empty() {
        return Err(StudyError::invalid_config("samples", "no price samples"));
    }

    let mut training_samples = BTreeMap::new();
    let mut validation_samples = BTreeMap::new();
    for (asset, bars) in samples {
        let cut = (bars.len() as f64 * settings.split).floor() as usize;
        if cut == 0 || cut == bars.len() {
            return Err(StudyError::invalid_config(
                "samples",
                format!("sample {asset} too short to split at {}", settings.split),
            ));
        }
        training_samples.insert(asset.clone(), bars[..cut].to_vec());
        validation_samples.insert(asset.clone(), bars[cut..].to_vec());
    }

    let param_sets = enumerate_space(space);
    let study_id = study_id(samples, space, settings);
    info!(study = %study_id.short(), param_sets = param_sets.len(), "study started");

    let training = run_phase(
        Phase::Training,
        &study_id,
        &param_sets,
        &training_samples,
        settings,
        make_bot,
        cancel,
    )?;

    // Rank by training score, ties broken by param-set id for
    // reproducibility; top-K advance.
    let mut ranked: Vec<&PhaseReport> = training.values().collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.param_set.id.cmp(&b.param_set.id))
    });
    let selected: Vec<ParamSet> = ranked
        .iter()
        .take(settings.selection)
        .map(|r| r.param_set.clone())
        .collect();

    let validation = if cancel.is_cancelled() {
        warn!(study = %study_id.short(), "cancelled before validation phase");
        BTreeMap::new()
    } else {
        run_phase(
            Phase::Validation,
            &study_id,
            &selected,
            &validation_samples,
            settings,
            make_bot,
            cancel,
        )?
    };

    // Accept a validated set iff its score clears the floor and agrees
    // in sign with its training score; best validation score wins.
    let mut accepted: Vec<&PhaseReport> = validation
        .values()
        .filter(|v| !v.cancelled && v.score >= settings.validation_floor)
        .filter(|v| {
            training
                .get(&v.param_set.id)
                .is_some_and(|t| t.score.signum() == v.score.signum())
        })
        .collect();
    accepted.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.param_set.id.cmp(&b.param_set.id))
    });
    let optimal = accepted.first().map(|r| r.param_set.id);

    let cancelled = cancel.is_cancelled()
        || training.values().any(|r| r.cancelled)
        || validation.values().any(|r| r.cancelled);

    info!(
        study = %study_id.short(),
        optimal = %optimal.map(|id| id.short()).unwrap_or_default(),
        cancelled,
        "study finished"
    );

    Ok(Study {
        id: study_id,
        training,
        validation,
        optimal,
        cancelled,
    })
}

/// Content-addressed study identity: same samples, space, and settings
/// always name the same study.
fn study_id(
    samples: &BTreeMap<Asset, Vec<Kline>>,
    space: &ParamSpace,
    settings: &OptimizerSettings,
) -> StudyId {
    let mut canonical = String::new();
    for (asset, bars) in samples {
        let first = bars.first().map(|b| b.start.to_rfc3339()).unwrap_or_default();
        let last = bars.last().map(|b| b.start.to_rfc3339()).unwrap_or_default();
        canonical.push_str(&format!("{asset}:{}:{first}:{last};", bars.len()));
    }
    for (key, values) in space {
        canonical.push_str(key);
        canonical.push('=');
        for value in values {
            canonical.push_str(&format!("{value},"));
        }
        canonical.push(';');
    }
    canonical.push_str(&format!(
        "objective={};selection={};split={};floor={}",
        settings.objective, settings.selection, settings.split, settings.validation_floor
    ));
    StudyId::from_bytes(canonical.as_bytes())
}

/// Fan one phase's parameter sets out over the worker pool. Results
/// are appended under a mutex and re-sorted by param-set id so worker
/// scheduling never changes the study.
fn run_phase(
    phase: Phase,
    study_id: &StudyId,
    param_sets: &[ParamSet],
    samples: &BTreeMap<Asset, Vec<Kline>>,
    settings: &OptimizerSettings,
    make_bot: BotFactory,
    cancel: &CancelToken,
) -> Result<BTreeMap<ParamSetId, PhaseReport>, StudyError> {
    info!(phase = phase.as_str(), param_sets = param_sets.len(), "phase started");

    let run_one = |ps: &ParamSet| -> Option<PhaseReport> {
        // Once cancelled, no further trials start.
        if cancel.is_cancelled() {
            return None;
        }
        Some(run_param_set(
            phase, study_id, ps, samples, settings, make_bot, cancel,
        ))
    };

    let mut reports: Vec<PhaseReport> = if settings.workers > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.workers)
            .build()
            .map_err(|e| StudyError::invalid_config("optimizer.workers", e.to_string()))?;
        let collected = Mutex::new(Vec::with_capacity(param_sets.len()));
        pool.install(|| {
            param_sets.par_iter().for_each(|ps| {
                if let Some(report) = run_one(ps) {
                    collected
                        .lock()
                        .expect("aggregator mutex poisoned")
                        .push(report);
                }
            });
        });
        collected.into_inner().expect("aggregator mutex poisoned")
    } else {
        param_sets.iter().filter_map(run_one).collect()
    };

    reports.sort_by(|a, b| a.param_set.id.cmp(&b.param_set.id));
    Ok(reports.into_iter().map(|r| (r.param_set.id, r)).collect())
}

fn run_param_set(
    phase: Phase,
    study_id: &StudyId,
    param_set: &ParamSet,
    samples: &BTreeMap<Asset, Vec<Kline>>,
    settings: &OptimizerSettings,
    make_bot: BotFactory,
    cancel: &CancelToken,
) -> PhaseReport {
    let phase_id = PhaseId::from_bytes(
        format!("{study_id}/{}/{}", phase.as_str(), param_set.id).as_bytes(),
    );

    let mut trials = Vec::with_capacity(samples.len());
    let mut cut_short = false;
    for (asset, bars) in samples {
        if cancel.is_cancelled() {
            cut_short = true;
            break;
        }
        trials.push(run_trial(&phase_id, param_set, asset, bars, make_bot, cancel));
    }

    let scores: Vec<f64> = trials
        .iter()
        .filter(|t| t.failed.is_none())
        .map(|t| settings.objective.score(&t.perf))
        .collect();
    let score = if scores.is_empty() {
        f64::NEG_INFINITY
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };
    let cancelled = cut_short || trials.iter().any(|t| t.cancelled);

    debug!(
        phase = phase.as_str(),
        param_set = %param_set.id.short(),
        score,
        cancelled,
        "param set evaluated"
    );

    PhaseReport {
        id: phase_id,
        phase,
        param_set: param_set.clone(),
        trials,
        score,
        cancelled,
    }
}

/// One backtest: fresh bot, bar loop, close, report. Engine errors mark
/// the trial failed; the study continues. Cancellation lets the current
/// bar finish so the ledger stays consistent.
fn run_trial(
    phase_id: &PhaseId,
    param_set: &ParamSet,
    asset: &Asset,
    bars: &[Kline],
    make_bot: BotFactory,
    cancel: &CancelToken,
) -> TrialReport {
    let trial_id = TrialId::from_bytes(format!("{phase_id}/{asset}").as_bytes());

    let mut bot = match make_bot(param_set, asset) {
        Ok(bot) => bot,
        Err(err) => {
            warn!(trial = %trial_id.short(), %err, "bot construction failed");
            return TrialReport {
                id: trial_id,
                asset: asset.clone(),
                perf: PerformanceReport::compute(&[], &Default::default()),
                round_turns: Vec::new(),
                equity: Default::default(),
                cancelled: false,
                failed: Some(err.to_string()),
            };
        }
    };

    let mut cancelled = false;
    let mut failed = None;
    for bar in bars {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        let mut step = bot.dealer_mut().receive_price(bar);
        if step.is_ok() {
            step = bot.receive_price(bar);
        }
        if let Err(err) = step {
            warn!(trial = %trial_id.short(), %err, "trial failed");
            failed = Some(err.to_string());
            break;
        }
    }

    if failed.is_none() && !cancelled {
        if let Err(err) = bot.close() {
            failed = Some(err.to_string());
        }
    }

    let round_turns = bot.dealer().round_turns();
    let equity = bot.dealer().equity();
    let perf = PerformanceReport::compute(&round_turns, &equity);

    TrialReport {
        id: trial_id,
        asset: asset.clone(),
        perf,
        round_turns,
        equity,
        cancelled,
        failed,
    }
}
