//! Run configuration.
//!
//! Every tunable of a backtest lives in one immutable `BacktestConfig`, split
//! into strategy, broker and engine sections. All fields have defaults, so a
//! TOML file only needs to name what it changes:
//!
//! ```toml
//! fill_timing = "next_bar_open"
//! verbose = true
//!
//! [strategy]
//! short_period = 5
//!
//! [broker]
//! starting_cash = 50000.0
//! ```
//!
//! `validate()` is called by every constructor that consumes a config, so an
//! invalid parameter is reported before the first bar is processed.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// What the strategy does when its computed buy size rounds down to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroSizePolicy {
    /// Treat a zero size as no signal; nothing is submitted.
    #[default]
    Skip,
    /// Submit the zero-size order anyway. It occupies the pending slot until
    /// the broker rejects it.
    Submit,
}

/// When a submitted order is executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillTiming {
    /// Fill at the close of the bar that produced the order.
    #[default]
    SameBarClose,
    /// Fill at the open of the following bar.
    NextBarOpen,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyParams {
    pub short_period: usize,
    pub medium_period: usize,
    pub long_period: usize,
    /// Fraction of available cash committed to each entry.
    pub invest_fraction: f64,
    pub zero_size: ZeroSizePolicy,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            short_period: 7,
            medium_period: 22,
            long_period: 41,
            invest_fraction: 0.95,
            zero_size: ZeroSizePolicy::Skip,
        }
    }
}

impl StrategyParams {
    pub fn new(short_period: usize, medium_period: usize, long_period: usize) -> Self {
        Self {
            short_period,
            medium_period,
            long_period,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, period) in [
            ("short_period", self.short_period),
            ("medium_period", self.medium_period),
            ("long_period", self.long_period),
        ] {
            if period == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be >= 1")));
            }
        }
        if !(self.invest_fraction > 0.0 && self.invest_fraction <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "invest_fraction must be in (0, 1], got {}",
                self.invest_fraction
            )));
        }
        Ok(())
    }

    /// Bars needed before all three averages are available.
    pub fn warmup_bars(&self) -> usize {
        self.short_period
            .max(self.medium_period)
            .max(self.long_period)
            .saturating_sub(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    pub starting_cash: f64,
    /// Commission as a fraction of notional value (0.0003 = 3 bps).
    pub commission_rate: f64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            starting_cash: 100_000.0,
            commission_rate: 0.0003,
        }
    }
}

impl BrokerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.starting_cash.is_finite() || self.starting_cash < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "starting_cash must be finite and >= 0, got {}",
                self.starting_cash
            )));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(ConfigError::Invalid(format!(
                "commission_rate must be in [0, 1), got {}",
                self.commission_rate
            )));
        }
        Ok(())
    }
}

/// Complete configuration of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BacktestConfig {
    pub fill_timing: FillTiming,
    /// Emit per-trade log lines.
    pub verbose: bool,
    /// chrono format string for the CSV date column.
    pub date_format: String,
    pub strategy: StrategyParams,
    pub broker: BrokerConfig,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            fill_timing: FillTiming::SameBarClose,
            verbose: false,
            date_format: "%Y-%m-%d".into(),
            strategy: StrategyParams::default(),
            broker: BrokerConfig::default(),
        }
    }
}

impl BacktestConfig {
    /// Load a config from a TOML file and validate it.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.validate()?;
        self.broker.validate()?;
        if self.date_format.is_empty() {
            return Err(ConfigError::Invalid("date_format must not be empty".into()));
        }
        Ok(())
    }

    /// Deterministic content hash of this configuration.
    ///
    /// Two runs with identical configs share the same hash, so results can be
    /// matched to the parameters that produced them.
    pub fn config_hash(&self) -> String {
        // Serializing plain structs of numbers, strings and enums cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_script() {
        let config = BacktestConfig::default();
        assert_eq!(config.strategy.short_period, 7);
        assert_eq!(config.strategy.medium_period, 22);
        assert_eq!(config.strategy.long_period, 41);
        assert_eq!(config.strategy.invest_fraction, 0.95);
        assert_eq!(config.broker.starting_cash, 100_000.0);
        assert_eq!(config.broker.commission_rate, 0.0003);
        assert_eq!(config.fill_timing, FillTiming::SameBarClose);
        assert_eq!(config.strategy.zero_size, ZeroSizePolicy::Skip);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn warmup_uses_longest_period() {
        assert_eq!(StrategyParams::default().warmup_bars(), 40);
        // Periods need not be ordered.
        assert_eq!(StrategyParams::new(30, 5, 10).warmup_bars(), 29);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = BacktestConfig::from_toml(
            r#"
fill_timing = "next_bar_open"
verbose = true

[strategy]
short_period = 5
zero_size = "submit"

[broker]
starting_cash = 50000.0
"#,
        )
        .unwrap();
        assert_eq!(config.fill_timing, FillTiming::NextBarOpen);
        assert!(config.verbose);
        assert_eq!(config.strategy.short_period, 5);
        assert_eq!(config.strategy.medium_period, 22);
        assert_eq!(config.strategy.zero_size, ZeroSizePolicy::Submit);
        assert_eq!(config.broker.starting_cash, 50_000.0);
        assert_eq!(config.broker.commission_rate, 0.0003);
    }

    #[test]
    fn unknown_key_rejected() {
        let err = BacktestConfig::from_toml("[strategy]\nfast_period = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn zero_period_rejected() {
        let err = BacktestConfig::from_toml("[strategy]\nlong_period = 0\n").unwrap_err();
        assert!(err.to_string().contains("long_period"));
    }

    #[test]
    fn bad_broker_values_rejected() {
        let mut broker = BrokerConfig::default();
        broker.starting_cash = -1.0;
        assert!(broker.validate().is_err());

        let mut broker = BrokerConfig::default();
        broker.commission_rate = 1.5;
        assert!(broker.validate().is_err());

        let mut broker = BrokerConfig::default();
        broker.starting_cash = 0.0;
        assert!(broker.validate().is_ok());
    }

    #[test]
    fn invest_fraction_bounds() {
        let mut params = StrategyParams::default();
        params.invest_fraction = 0.0;
        assert!(params.validate().is_err());
        params.invest_fraction = 1.0;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn config_hash_is_deterministic() {
        let a = BacktestConfig::default();
        let b = BacktestConfig::default();
        assert_eq!(a.config_hash(), b.config_hash());

        let mut c = BacktestConfig::default();
        c.strategy.short_period = 8;
        assert_ne!(a.config_hash(), c.config_hash());
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = BacktestConfig::default();
        config.fill_timing = FillTiming::NextBarOpen;
        let text = toml::to_string(&config).unwrap();
        let parsed = BacktestConfig::from_toml(&text).unwrap();
        assert_eq!(config, parsed);
    }
}
