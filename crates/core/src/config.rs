//! Backtest parameters and the figment-based loader.

use std::path::Path;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What the engine does after a scheduled open attempt fails because no
/// eligible contract exists or capital is insufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Retry every following trading day until an open succeeds.
    #[default]
    Daily,
    /// Give up until the first trading day of the next month.
    NextMonth,
}

/// Strategy and accounting knobs for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Starting cash.
    pub initial_capital: Decimal,
    /// Margin posted as a fraction of short-leg notional, in (0, 1].
    pub margin_rate: Decimal,
    /// Roll when this many calendar days or fewer remain to expiry.
    pub days_before_expiry: i64,
    /// Units of underlying per contract.
    pub contract_multiplier: u32,
    /// Commission charged per leg as a fraction of leg notional.
    pub commission_rate: Decimal,
    /// Behavior when the scheduled open cannot fill.
    pub retry_policy: RetryPolicy,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: Decimal::from(1_000_000),
            margin_rate: Decimal::new(15, 2),
            days_before_expiry: 7,
            contract_multiplier: 10_000,
            commission_rate: Decimal::new(3, 4),
            retry_policy: RetryPolicy::Daily,
        }
    }
}

impl BacktestConfig {
    /// Checks every parameter against its documented bounds.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range parameter found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveCapital(self.initial_capital));
        }
        if self.margin_rate <= Decimal::ZERO || self.margin_rate > Decimal::ONE {
            return Err(ConfigError::MarginRateOutOfRange(self.margin_rate));
        }
        if self.days_before_expiry < 0 {
            return Err(ConfigError::NegativeDaysBeforeExpiry(
                self.days_before_expiry,
            ));
        }
        if self.contract_multiplier == 0 {
            return Err(ConfigError::ZeroMultiplier);
        }
        if self.commission_rate < Decimal::ZERO {
            return Err(ConfigError::NegativeCommission(self.commission_rate));
        }
        Ok(())
    }

    /// Contract multiplier as a `Decimal` for price arithmetic.
    #[must_use]
    pub fn multiplier(&self) -> Decimal {
        Decimal::from(self.contract_multiplier)
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads a config by merging an optional TOML file and `OPTROLL_`
    /// environment variables over the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// merged values fail bounds validation.
    pub fn load(path: Option<&Path>) -> Result<BacktestConfig> {
        let mut figment = Figment::from(Serialized::defaults(BacktestConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let config: BacktestConfig = figment.merge(Env::prefixed("OPTROLL_")).extract()?;
        config.validate()?;
        Ok(config)
    }
}
