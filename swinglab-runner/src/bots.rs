//! Bot factories — mint a tailored bot from a parameter set.
//!
//! Recognized swing-bot parameter keys (all optional, defaults in
//! parentheses): `shortperiod` (8), `longperiod` (34), `enterlong`
//! (1.0), `exitlong` (-0.9), `entershort` (-1.0), `exitshort` (0.9),
//! `swingrisker` (false), `sizerf` (0, disables the fixed-fraction
//! sizer), `sizerscalef` (1.0).

use rust_decimal::Decimal;

use swinglab_core::domain::Asset;
use swinglab_core::sim::SimulatedDealer;
use swinglab_core::trader::{
    Bot, FixedSizer, FullRisker, Predicter, Risker, SafeFSizer, Sizer, SwingPredicter,
    SwingRisker, Thresholds,
};

use crate::error::StudyError;
use crate::optimize::ParamSet;

/// Build a swing bot around the Double ZigZag predicter. The dealer is
/// created by the caller so each trial owns a fresh ledger.
pub fn make_swing_bot(
    params: &ParamSet,
    asset: &Asset,
    initial_capital: Decimal,
    dealer: Box<dyn SimulatedDealer>,
) -> Result<Bot, StudyError> {
    let short_period = params.usize_or("shortperiod", 8);
    let long_period = params.usize_or("longperiod", 34);
    if short_period < 2 {
        return Err(StudyError::invalid_config(
            "bot.space.shortperiod",
            format!("period {short_period} must be at least 2"),
        ));
    }
    if long_period < short_period {
        return Err(StudyError::invalid_config(
            "bot.space.longperiod",
            format!("long period {long_period} shorter than short period {short_period}"),
        ));
    }

    let thresholds = Thresholds {
        enter_long: params.f64_or("enterlong", 1.0),
        exit_long: params.f64_or("exitlong", -0.9),
        enter_short: params.f64_or("entershort", -1.0),
        exit_short: params.f64_or("exitshort", 0.9),
    };

    let predicter: Box<dyn Predicter> = Box::new(SwingPredicter::new(short_period, long_period));

    let risker: Box<dyn Risker> = if params.bool_or("swingrisker", false) {
        Box::new(SwingRisker::new(short_period, long_period))
    } else {
        Box::new(FullRisker::new())
    };

    let sizer_f = params.f64_or("sizerf", 0.0);
    let sizer: Box<dyn Sizer> = if sizer_f > 0.0 {
        Box::new(SafeFSizer::new(
            initial_capital,
            sizer_f,
            params.f64_or("sizerscalef", 1.0),
        ))
    } else {
        Box::new(FixedSizer::new(initial_capital))
    };

    Ok(Bot::new(asset.clone(), predicter, risker, sizer, dealer).with_thresholds(thresholds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::ParamValue;
    use rust_decimal_macros::dec;
    use swinglab_core::sim::SimDealer;

    fn params(pairs: &[(&str, ParamValue)]) -> ParamSet {
        ParamSet::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn builds_with_defaults() {
        let ps = params(&[]);
        let bot = make_swing_bot(
            &ps,
            &Asset::new("BTCUSDT"),
            dec!(1000),
            Box::new(SimDealer::new()),
        );
        assert!(bot.is_ok());
    }

    #[test]
    fn rejects_degenerate_periods() {
        let ps = params(&[("shortperiod", ParamValue::Int(1))]);
        let err = make_swing_bot(
            &ps,
            &Asset::new("BTCUSDT"),
            dec!(1000),
            Box::new(SimDealer::new()),
        )
        .unwrap_err();
        assert!(matches!(err, StudyError::InvalidConfig { .. }));

        let ps = params(&[
            ("shortperiod", ParamValue::Int(20)),
            ("longperiod", ParamValue::Int(5)),
        ]);
        assert!(make_swing_bot(
            &ps,
            &Asset::new("BTCUSDT"),
            dec!(1000),
            Box::new(SimDealer::new()),
        )
        .is_err());
    }
}
