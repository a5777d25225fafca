//! Walk-forward study scenarios: acceptance, cancellation, determinism,
//! parallel invariance.

use std::collections::BTreeMap;

use rust_decimal_macros::dec;

use swinglab_core::domain::{Asset, Kline, Receiver};
use swinglab_core::error::EngineError;
use swinglab_core::sim::{SimDealer, SimulatedDealer};
use swinglab_core::testkit::{self, ScriptedPredicter};
use swinglab_core::trader::{Bot, FixedSizer, FullRisker, Predicter};
use swinglab_runner::optimize::{
    run_study, Objective, OptimizerSettings, ParamSet, ParamSpace, ParamValue,
};
use swinglab_runner::{CancelToken, StudyError};

/// Steadily rising closes so any long entry is profitable in both the
/// training and validation windows.
fn rising_bars(n: usize) -> Vec<Kline> {
    let closes: Vec<i64> = (0..n).map(|i| 100 + i as i64).collect();
    testkit::klines_from_closes(&closes)
}

fn samples_of(bars: Vec<Kline>) -> BTreeMap<Asset, Vec<Kline>> {
    let mut samples = BTreeMap::new();
    samples.insert(Asset::new("BTCUSDT"), bars);
    samples
}

/// 3x3 space; `entrybar` shifts the scripted entry, `noise` is inert.
fn space_3x3() -> ParamSpace {
    let mut space = ParamSpace::new();
    space.insert(
        "entrybar".to_string(),
        vec![ParamValue::Int(2), ParamValue::Int(4), ParamValue::Int(6)],
    );
    space.insert(
        "noise".to_string(),
        vec![ParamValue::Int(1), ParamValue::Int(2), ParamValue::Int(3)],
    );
    space
}

/// Factory: a bot that goes long after `entrybar` bars and holds.
fn scripted_factory(params: &ParamSet, asset: &Asset) -> Result<Bot, StudyError> {
    let entrybar = params.usize_or("entrybar", 2);
    let mut scores = vec![0.0; entrybar];
    scores.push(1.0);

    let mut dealer = SimDealer::new();
    dealer.set_account_balance(dec!(1000))?;
    Ok(Bot::new(
        asset.clone(),
        Box::new(ScriptedPredicter::new(scores)),
        Box::new(FullRisker::new()),
        Box::new(FixedSizer::new(dec!(1000))),
        Box::new(dealer),
    ))
}

fn settings(workers: usize) -> OptimizerSettings {
    OptimizerSettings {
        objective: Objective::CagrMdd,
        selection: 1,
        split: 5.0 / 7.0,
        validation_floor: 0.0,
        workers,
    }
}

#[test]
fn walk_forward_accepts_top_training_set() {
    // 9 parameter sets over a 500-bar training window and 200-bar
    // validation window; rising prices make every set profitable, so
    // the top training set also clears the validation floor.
    let samples = samples_of(rising_bars(700));
    let study = run_study(
        &samples,
        &space_3x3(),
        &settings(1),
        &scripted_factory,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(study.training.len(), 9);
    assert_eq!(study.validation.len(), 1);
    assert!(!study.cancelled);

    let optimal = study.optimal.expect("top set validates");
    assert!(study.validation.contains_key(&optimal));

    // The earliest entry captures the most of the rising window.
    let best = &study.training[&optimal];
    assert_eq!(best.param_set.usize_or("entrybar", 0), 2);
    assert!(best.score > 0.0);

    // Training and validation windows are disjoint: the validation
    // equity curve starts after the training curve ends.
    let train_last = *best.trials[0].equity.last().unwrap().0;
    let val_first = *study.validation[&optimal].trials[0].equity.first().unwrap().0;
    assert!(val_first > train_last);
}

#[test]
fn study_is_deterministic() {
    let samples = samples_of(rising_bars(700));
    let a = run_study(
        &samples,
        &space_3x3(),
        &settings(1),
        &scripted_factory,
        &CancelToken::new(),
    )
    .unwrap();
    let b = run_study(
        &samples,
        &space_3x3(),
        &settings(1),
        &scripted_factory,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(a.id, b.id);
    assert_eq!(a, b);
}

#[test]
fn parallel_and_sequential_studies_agree() {
    let samples = samples_of(rising_bars(700));
    let sequential = run_study(
        &samples,
        &space_3x3(),
        &settings(1),
        &scripted_factory,
        &CancelToken::new(),
    )
    .unwrap();
    let parallel = run_study(
        &samples,
        &space_3x3(),
        &settings(4),
        &scripted_factory,
        &CancelToken::new(),
    )
    .unwrap();

    // Worker count is not part of the study identity or its results.
    assert_eq!(sequential, parallel);
}

/// Predicter that fires the shared cancel token after a fixed number of
/// bars, simulating an external stop mid-trial.
struct CancellingPredicter {
    inner: ScriptedPredicter,
    token: CancelToken,
    cancel_at: usize,
    bars_seen: usize,
}

impl Receiver for CancellingPredicter {
    fn receive_price(&mut self, price: &Kline) -> Result<(), EngineError> {
        self.bars_seen += 1;
        if self.bars_seen == self.cancel_at {
            self.token.cancel();
        }
        self.inner.receive_price(price)
    }
}

impl Predicter for CancellingPredicter {
    fn predict(&self) -> f64 {
        self.inner.predict()
    }

    fn valid(&self) -> bool {
        self.inner.valid()
    }
}

#[test]
fn cancellation_stops_after_current_bar() {
    let samples = samples_of(rising_bars(1000));
    let token = CancelToken::new();

    let factory_token = token.clone();
    let factory = move |_params: &ParamSet, asset: &Asset| -> Result<Bot, StudyError> {
        let mut dealer = SimDealer::new();
        dealer.set_account_balance(dec!(1000))?;
        Ok(Bot::new(
            asset.clone(),
            Box::new(CancellingPredicter {
                inner: ScriptedPredicter::new(vec![0.0]),
                token: factory_token.clone(),
                cancel_at: 50,
                bars_seen: 0,
            }),
            Box::new(FullRisker::new()),
            Box::new(FixedSizer::new(dec!(1000))),
            Box::new(dealer),
        ))
    };

    let study = run_study(
        &samples,
        &space_3x3(),
        &settings(1),
        &factory,
        &token,
    )
    .unwrap();

    // The running trial finished its 50th bar, then stopped; no further
    // trials were dispatched.
    assert!(study.cancelled);
    assert_eq!(study.training.len(), 1);
    assert!(study.validation.is_empty());
    assert!(study.optimal.is_none());

    let report = study.training.values().next().unwrap();
    assert!(report.cancelled);
    assert_eq!(report.trials.len(), 1);
    let trial = &report.trials[0];
    assert!(trial.cancelled);
    assert_eq!(trial.equity.len(), 50);
}

#[test]
fn invalid_split_is_a_config_error() {
    let samples = samples_of(rising_bars(100));
    let mut bad = settings(1);
    bad.split = 1.0;
    let err = run_study(
        &samples,
        &space_3x3(),
        &bad,
        &scripted_factory,
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, StudyError::InvalidConfig { .. }));
}

#[test]
fn failed_trials_do_not_abort_the_study() {
    // A factory that cannot build bots for one parameter value still
    // yields a study; the failed sets rank last.
    let samples = samples_of(rising_bars(700));
    let factory = |params: &ParamSet, asset: &Asset| -> Result<Bot, StudyError> {
        if params.usize_or("entrybar", 0) == 4 {
            return Err(StudyError::invalid_config("entrybar", "unbuildable"));
        }
        scripted_factory(params, asset)
    };

    let study = run_study(
        &samples,
        &space_3x3(),
        &settings(1),
        &factory,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(study.training.len(), 9);
    let failed: Vec<_> = study
        .training
        .values()
        .filter(|r| r.trials.iter().any(|t| t.failed.is_some()))
        .collect();
    assert_eq!(failed.len(), 3);
    for report in failed {
        assert_eq!(report.score, f64::NEG_INFINITY);
    }
    assert!(study.optimal.is_some());
}
