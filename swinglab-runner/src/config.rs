//! Study configuration (TOML) and the factories built from it.
//!
//! ```toml
//! [dealer]
//! initial_capital = 1000.0
//!
//! [dealer.cost]
//! maker = 0.0002
//! taker = 0.0007
//! spread_ticks = 0
//! tick_size = 0
//!
//! [[samples]]
//! decoder = "binance"
//! path = "prices/BTCUSDT-1h.csv"
//! asset = "BTCUSDT"
//!
//! [bot]
//! type = "swing"
//!
//! [bot.space]
//! shortperiod = [8, 13]
//! longperiod = [34]
//! enterlong = [0.5, 1.0]
//!
//! [optimizer]
//! objective = "cagr_mdd"
//! selection = 1
//! split = 0.7
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;

use swinglab_core::domain::{Asset, Kline};
use swinglab_core::sim::{FeeCoster, FreeCoster, SimDealer, SimulatedDealer};
use swinglab_core::trader::Bot;

use crate::bots::make_swing_bot;
use crate::error::StudyError;
use crate::optimize::{Objective, OptimizerSettings, ParamSet, ParamSpace};
use crate::reader::{decoder_by_name, read_klines_from_path};

#[derive(Debug, Clone, Deserialize)]
pub struct StudyConfig {
    pub dealer: DealerConfig,
    pub samples: Vec<SampleConfig>,
    pub bot: BotConfig,
    pub optimizer: OptimizerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DealerConfig {
    pub initial_capital: Decimal,
    #[serde(default)]
    pub cost: Option<CostConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CostConfig {
    #[serde(default)]
    pub maker: Decimal,
    #[serde(default)]
    pub taker: Decimal,
    #[serde(default)]
    pub spread_ticks: Decimal,
    #[serde(default)]
    pub tick_size: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SampleConfig {
    pub decoder: String,
    pub path: PathBuf,
    pub asset: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub space: ParamSpace,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    pub objective: String,
    #[serde(default = "default_selection")]
    pub selection: usize,
    pub split: f64,
    #[serde(default)]
    pub validation_floor: f64,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_selection() -> usize {
    1
}

fn default_workers() -> usize {
    1
}

impl StudyConfig {
    pub fn from_path(path: &Path) -> Result<Self, StudyError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, StudyError> {
        let config: Self = toml::from_str(text)
            .map_err(|e| StudyError::invalid_config("<study config>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), StudyError> {
        if self.dealer.initial_capital <= Decimal::ZERO {
            return Err(StudyError::invalid_config(
                "dealer.initial_capital",
                "must be positive",
            ));
        }
        if self.samples.is_empty() {
            return Err(StudyError::invalid_config("samples", "no samples listed"));
        }
        for sample in &self.samples {
            if decoder_by_name(&sample.decoder).is_none() {
                return Err(StudyError::invalid_config(
                    "samples.decoder",
                    format!("unrecognized decoder '{}'", sample.decoder),
                ));
            }
        }
        if self.bot.kind != "swing" {
            return Err(StudyError::invalid_config(
                "bot.type",
                format!("unrecognized bot type '{}'", self.bot.kind),
            ));
        }
        self.optimizer.objective.parse::<Objective>()?;
        if !(self.optimizer.split > 0.0 && self.optimizer.split < 1.0) {
            return Err(StudyError::invalid_config(
                "optimizer.split",
                "must lie in (0, 1)",
            ));
        }
        if self.optimizer.workers == 0 {
            return Err(StudyError::invalid_config(
                "optimizer.workers",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn settings(&self) -> OptimizerSettings {
        OptimizerSettings {
            objective: self
                .optimizer
                .objective
                .parse()
                .expect("objective validated at load"),
            selection: self.optimizer.selection,
            split: self.optimizer.split,
            validation_floor: self.optimizer.validation_floor,
            workers: self.optimizer.workers,
        }
    }

    /// Read every configured price sample from disk.
    pub fn load_samples(&self) -> Result<BTreeMap<Asset, Vec<Kline>>, StudyError> {
        let mut samples = BTreeMap::new();
        for sample in &self.samples {
            let decoder = decoder_by_name(&sample.decoder).expect("decoder validated at load");
            let klines = read_klines_from_path(&sample.path, decoder)?;
            samples.insert(Asset::new(sample.asset.clone()), klines);
        }
        Ok(samples)
    }

    fn make_dealer(&self) -> Result<Box<dyn SimulatedDealer>, StudyError> {
        let mut dealer = match &self.dealer.cost {
            Some(cost) => {
                let coster = FeeCoster::new(cost.maker, cost.taker)
                    .with_spread(cost.spread_ticks, cost.tick_size);
                SimDealer::with_coster(Box::new(coster))
            }
            None => SimDealer::with_coster(Box::new(FreeCoster)),
        };
        dealer.set_account_balance(self.dealer.initial_capital)?;
        Ok(Box::new(dealer))
    }

    /// Per-trial bot factory for the study driver. Every call builds a
    /// fresh dealer and bot; nothing is shared between trials.
    pub fn bot_factory(
        &self,
    ) -> impl Fn(&ParamSet, &Asset) -> Result<Bot, StudyError> + Sync + '_ {
        move |params, asset| {
            let dealer = self.make_dealer()?;
            make_swing_bot(params, asset, self.dealer.initial_capital, dealer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"
        [dealer]
        initial_capital = 1000.0

        [dealer.cost]
        taker = 0.0007

        [[samples]]
        decoder = "binance"
        path = "prices.csv"
        asset = "BTCUSDT"

        [bot]
        type = "swing"

        [bot.space]
        shortperiod = [8, 13]
        enterlong = [1.0]

        [optimizer]
        objective = "cagr_mdd"
        split = 0.7
    "#;

    #[test]
    fn parses_a_complete_config() {
        let config = StudyConfig::from_toml(GOOD).unwrap();
        assert_eq!(config.samples.len(), 1);
        assert_eq!(config.bot.space["shortperiod"].len(), 2);
        let settings = config.settings();
        assert_eq!(settings.selection, 1);
        assert_eq!(settings.workers, 1);
    }

    #[test]
    fn rejects_unknown_objective() {
        let bad = GOOD.replace("cagr_mdd", "calmar");
        assert!(matches!(
            StudyConfig::from_toml(&bad),
            Err(StudyError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_unknown_decoder() {
        let bad = GOOD.replace("binance", "kraken");
        assert!(StudyConfig::from_toml(&bad).is_err());
    }

    #[test]
    fn rejects_out_of_range_split() {
        let bad = GOOD.replace("split = 0.7", "split = 1.5");
        assert!(StudyConfig::from_toml(&bad).is_err());
    }

    #[test]
    fn rejects_unknown_bot_type() {
        let bad = GOOD.replace("type = \"swing\"", "type = \"hodl\"");
        assert!(StudyConfig::from_toml(&bad).is_err());
    }

    #[test]
    fn factory_builds_bots() {
        let config = StudyConfig::from_toml(GOOD).unwrap();
        let factory = config.bot_factory();
        let params = ParamSet::new(BTreeMap::new());
        assert!(factory(&params, &Asset::new("BTCUSDT")).is_ok());
    }
}
