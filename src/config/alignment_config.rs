//! Alignment configuration parsing from environment variables.
//!
//! This module handles the trading-day search window and the reference
//! timezone used when truncating timestamps to calendar dates.

use super::{EnvLookup, parse_var};
use crate::domain::errors::ConfigError;
use anyhow::Result;
use chrono::FixedOffset;

/// Alignment environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentEnvConfig {
    /// Calendar days searched forward for the next session
    pub max_lookahead_days: u32,
    /// Calendar days searched backward when nothing is found ahead
    pub max_lookback_days: u32,
    /// Offset of the reference timezone, in minutes east of UTC
    pub reference_utc_offset_minutes: i32,
}

impl Default for AlignmentEnvConfig {
    fn default() -> Self {
        Self {
            max_lookahead_days: 7,
            max_lookback_days: 7,
            reference_utc_offset_minutes: 0,
        }
    }
}

impl AlignmentEnvConfig {
    pub fn from_lookup(lookup: &EnvLookup<'_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            max_lookahead_days: parse_var(
                lookup,
                "ALIGN_MAX_LOOKAHEAD_DAYS",
                defaults.max_lookahead_days,
            )?,
            max_lookback_days: parse_var(
                lookup,
                "ALIGN_MAX_LOOKBACK_DAYS",
                defaults.max_lookback_days,
            )?,
            reference_utc_offset_minutes: parse_var(
                lookup,
                "REFERENCE_UTC_OFFSET_MINUTES",
                defaults.reference_utc_offset_minutes,
            )?,
        })
    }

    pub fn reference_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.reference_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::UtcOffset {
                minutes: self.reference_utc_offset_minutes,
            })
    }
}
