//! Study-level error taxonomy.

use thiserror::Error;

use swinglab_core::EngineError;

/// Failures above the engine: configuration, I/O, cancellation.
///
/// Trial-local engine errors never abort a study; they mark the trial
/// failed in its phase report. `InvalidConfig` and export I/O failures
/// abort everything.
#[derive(Debug, Error)]
pub enum StudyError {
    /// Missing or unparseable configuration. Fatal at startup.
    #[error("invalid config '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },

    /// Cooperative stop. Terminal for the current scope, non-fatal
    /// upward: partial results are still reported.
    #[error("cancelled")]
    Cancelled,

    /// A study completed but no parameter set cleared validation.
    /// Raised after the result files are written.
    #[error("no parameter set passed validation")]
    NoValidated,

    /// Reader or writer failure. Fatal to the enclosing study.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV input or a failed CSV write.
    #[error("csv failure: {0}")]
    Csv(#[from] csv::Error),

    /// Engine failure surfaced outside a trial.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl StudyError {
    pub fn invalid_config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
