//! Configuration module.
//!
//! The engine takes one immutable `EngineConfig`, loaded from environment
//! variables and organized by concern: Alignment and Correlation.

mod alignment_config;
mod correlation_config;

pub use alignment_config::AlignmentEnvConfig;
pub use correlation_config::{CorrelationEnvConfig, MIN_SAMPLES_FLOOR};

use crate::domain::errors::ConfigError;
use anyhow::{Context, Result};
use chrono::FixedOffset;
use std::collections::BTreeSet;
use std::env;
use std::str::FromStr;

/// Source of configuration values, keyed by variable name.
pub type EnvLookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

pub(crate) fn parse_var<T>(lookup: &EnvLookup<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Failed to parse {}", key)),
        None => Ok(default),
    }
}

/// Engine configuration, fixed for the duration of a run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineConfig {
    pub alignment: AlignmentEnvConfig,
    pub correlation: CorrelationEnvConfig,
    /// When set, records for any other ticker are dropped and counted
    pub tickers: Option<BTreeSet<String>>,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: &EnvLookup<'_>) -> Result<Self> {
        let alignment =
            AlignmentEnvConfig::from_lookup(lookup).context("Failed to load alignment config")?;
        let correlation = CorrelationEnvConfig::from_lookup(lookup)
            .context("Failed to load correlation config")?;

        let tickers = lookup("TICKERS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<BTreeSet<String>>()
            })
            .filter(|set| !set.is_empty());

        let config = Self {
            alignment,
            correlation,
            tickers,
        };
        config.validate().context("Invalid engine config")?;
        Ok(config)
    }

    pub fn with_tickers<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tickers = Some(tickers.into_iter().map(Into::into).collect());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.correlation.min_samples < MIN_SAMPLES_FLOOR {
            return Err(ConfigError::MinSamplesTooSmall {
                value: self.correlation.min_samples,
                minimum: MIN_SAMPLES_FLOOR,
            });
        }

        let alpha = self.correlation.significance_level;
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(ConfigError::SignificanceLevel { value: alpha });
        }

        self.alignment.reference_offset()?;
        Ok(())
    }

    pub fn reference_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.alignment.reference_offset()
    }

    /// Whether records for `ticker` take part in this run.
    pub fn includes_ticker(&self, ticker: &str) -> bool {
        self.tickers
            .as_ref()
            .is_none_or(|allowed| allowed.contains(ticker))
    }
}
