//! Optimizer — parameter grids, walk-forward phases, studies.

mod driver;
mod grid;
mod ids;
mod objective;
mod study;

pub use driver::{run_study, BotFactory, OptimizerSettings};
pub use grid::{enumerate_space, ParamSet, ParamSpace, ParamValue};
pub use ids::{ParamSetId, PhaseId, StudyId, TrialId};
pub use objective::Objective;
pub use study::{Phase, PhaseReport, Study, TrialReport};
