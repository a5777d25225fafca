//! `swinglab` — run walk-forward backtest studies.
//!
//! Exit codes: 0 success, 1 configuration error, 2 I/O error,
//! 3 cancelled, 4 no parameter set passed validation.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use swinglab_runner::config::StudyConfig;
use swinglab_runner::export::write_study_to_csv;
use swinglab_runner::optimize::run_study;
use swinglab_runner::{CancelToken, StudyError};

#[derive(Parser)]
#[command(name = "swinglab", version, about = "Walk-forward backtest studies")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a study described by a TOML config file.
    Run {
        /// Path to the study configuration.
        config: PathBuf,

        /// Directory the study CSV files are written to.
        #[arg(short, long, default_value = "studies")]
        output: PathBuf,

        /// Cancel the study after this many seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Command::Run {
            config,
            output,
            timeout_secs,
        } => run(&config, &output, timeout_secs),
    };
    std::process::exit(code);
}

fn run(config_path: &PathBuf, output: &PathBuf, timeout_secs: Option<u64>) -> i32 {
    match execute(config_path, output, timeout_secs) {
        Ok(code) => code,
        Err(err) => {
            if matches!(err, StudyError::Cancelled | StudyError::NoValidated) {
                warn!(%err, "study ended without an accepted result");
            } else {
                error!(%err, "study failed");
            }
            exit_code_for(&err)
        }
    }
}

fn execute(
    config_path: &PathBuf,
    output: &PathBuf,
    timeout_secs: Option<u64>,
) -> Result<i32, StudyError> {
    let config = StudyConfig::from_path(config_path)?;
    let samples = config.load_samples()?;
    let settings = config.settings();
    let factory = config.bot_factory();

    let cancel = match timeout_secs {
        Some(secs) => CancelToken::with_deadline(Duration::from_secs(secs)),
        None => CancelToken::new(),
    };
    let handler_token = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || handler_token.cancel()) {
        error!(%err, "could not install interrupt handler");
    }

    let study = run_study(&samples, &config.bot.space, &settings, &factory, &cancel)?;
    let files = write_study_to_csv(&study, output)?;
    for file in &files {
        info!(file = %file.display(), "written");
    }

    if study.cancelled {
        info!("study cancelled; partial results written");
        return Err(StudyError::Cancelled);
    }
    let Some(optimal) = study.optimal else {
        return Err(StudyError::NoValidated);
    };
    info!(optimal = %optimal.short(), "study complete");
    Ok(0)
}

fn exit_code_for(err: &StudyError) -> i32 {
    match err {
        StudyError::InvalidConfig { .. } | StudyError::Engine(_) => 1,
        StudyError::Io(_) | StudyError::Csv(_) => 2,
        StudyError::Cancelled => 3,
        StudyError::NoValidated => 4,
    }
}
