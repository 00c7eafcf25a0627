//! Correlation configuration parsing from environment variables.

use super::{EnvLookup, parse_var};
use anyhow::Result;

/// Smallest sample for which a t-based p-value exists (n - 2 >= 1).
pub const MIN_SAMPLES_FLOOR: usize = 3;

/// Correlation environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationEnvConfig {
    pub min_samples: usize,
    pub significance_level: f64,
}

impl Default for CorrelationEnvConfig {
    fn default() -> Self {
        Self {
            min_samples: 5,
            significance_level: 0.05,
        }
    }
}

impl CorrelationEnvConfig {
    pub fn from_lookup(lookup: &EnvLookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            min_samples: parse_var(lookup, "CORRELATION_MIN_SAMPLES", defaults.min_samples)?,
            significance_level: parse_var(
                lookup,
                "CORRELATION_SIGNIFICANCE_LEVEL",
                defaults.significance_level,
            )?,
        })
    }
}
