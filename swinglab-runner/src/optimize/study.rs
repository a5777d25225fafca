//! Study result tree: trial → phase report → study.
//!
//! Value types only, no references back into the engine. Each node
//! carries the identifiers needed to reassemble the tree from flat CSV.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use swinglab_core::domain::{Asset, EquitySeries, RoundTurn};

use super::grid::ParamSet;
use super::ids::{ParamSetId, PhaseId, StudyId, TrialId};
use crate::perf::PerformanceReport;

/// Which optimization phase produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Training,
    Validation,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Training => "training",
            Phase::Validation => "validation",
        }
    }
}

/// One backtest over one price sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialReport {
    pub id: TrialId,
    pub asset: Asset,
    pub perf: PerformanceReport,
    pub round_turns: Vec<RoundTurn>,
    pub equity: EquitySeries,
    /// The trial was stopped cooperatively; metrics cover the bars
    /// processed before the stop.
    pub cancelled: bool,
    /// Fatal engine error that ended this trial, if any.
    pub failed: Option<String>,
}

/// Per-parameter-set aggregate across the trials of one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub id: PhaseId,
    pub phase: Phase,
    pub param_set: ParamSet,
    pub trials: Vec<TrialReport>,
    /// Objective score: mean over non-failed trials.
    pub score: f64,
    pub cancelled: bool,
}

/// The complete optimization artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub id: StudyId,
    pub training: BTreeMap<ParamSetId, PhaseReport>,
    pub validation: BTreeMap<ParamSetId, PhaseReport>,
    /// The accepted parameter set, when one cleared validation.
    pub optimal: Option<ParamSetId>,
    /// True when cancellation stopped the study before completion.
    pub cancelled: bool,
}

impl Study {
    /// Phase reports of both phases in deterministic order:
    /// training first, then validation, each sorted by param-set id.
    pub fn all_phase_reports(&self) -> impl Iterator<Item = &PhaseReport> {
        self.training.values().chain(self.validation.values())
    }
}
