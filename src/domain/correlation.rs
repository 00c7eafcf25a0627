use crate::domain::errors::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;

const VERY_STRONG: f64 = 0.7;
const STRONG: f64 = 0.5;
const MODERATE: f64 = 0.3;
const WEAK: f64 = 0.1;

/// Report vocabulary for the magnitude of a correlation.
///
/// The buckets are fixed so that labels mean the same thing for every ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationStrength {
    #[serde(rename = "Very Strong")]
    VeryStrong,
    Strong,
    Moderate,
    Weak,
    #[serde(rename = "Very Weak")]
    VeryWeak,
}

impl CorrelationStrength {
    pub fn from_coefficient(r: f64) -> Self {
        let magnitude = r.abs();
        if magnitude >= VERY_STRONG {
            Self::VeryStrong
        } else if magnitude >= STRONG {
            Self::Strong
        } else if magnitude >= MODERATE {
            Self::Moderate
        } else if magnitude >= WEAK {
            Self::Weak
        } else {
            Self::VeryWeak
        }
    }
}

impl fmt::Display for CorrelationStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VeryStrong => write!(f, "Very Strong"),
            Self::Strong => write!(f, "Strong"),
            Self::Moderate => write!(f, "Moderate"),
            Self::Weak => write!(f, "Weak"),
            Self::VeryWeak => write!(f, "Very Weak"),
        }
    }
}

/// Sentiment/return statistics for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub ticker: String,
    pub pearson_r: f64,
    pub pearson_p: f64,
    pub spearman_r: f64,
    pub spearman_p: f64,
    /// Sentiment on record t against the return on record t+1. `None` when
    /// there are too few lagged pairs or either lagged series is constant.
    pub lagged_r: Option<f64>,
    pub lagged_p: Option<f64>,
    pub lagged_observations: usize,
    pub r_squared: f64,
    pub n_observations: usize,
    pub strength_label: CorrelationStrength,
    pub significant: bool,
}

/// Outcome of analyzing a single ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerOutcome {
    pub ticker: String,
    pub result: Result<CorrelationResult, AnalysisError>,
}

impl TickerOutcome {
    pub fn correlation(&self) -> Option<&CorrelationResult> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        self.result.as_ref().err()
    }
}

/// Cross-ticker summary of a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CorrelationSummary {
    pub tickers_total: usize,
    pub tickers_analyzed: usize,
    pub tickers_failed: usize,
    pub insufficient_data: usize,
    pub degenerate: usize,
    pub rejected_series: usize,
    /// Mean Pearson r over analyzed tickers
    pub mean_correlation: Option<f64>,
    pub significant_tickers: usize,
    pub significance_level: f64,
    pub strongest_ticker: Option<String>,
    pub strongest_correlation: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_buckets() {
        assert_eq!(CorrelationStrength::from_coefficient(0.7), CorrelationStrength::VeryStrong);
        assert_eq!(CorrelationStrength::from_coefficient(-0.69), CorrelationStrength::Strong);
        assert_eq!(CorrelationStrength::from_coefficient(0.3), CorrelationStrength::Moderate);
        assert_eq!(CorrelationStrength::from_coefficient(-0.1), CorrelationStrength::Weak);
        assert_eq!(CorrelationStrength::from_coefficient(0.05), CorrelationStrength::VeryWeak);
    }

    #[test]
    fn test_strength_labels() {
        assert_eq!(CorrelationStrength::VeryStrong.to_string(), "Very Strong");
        assert_eq!(CorrelationStrength::VeryWeak.to_string(), "Very Weak");
    }

    #[test]
    fn test_serialized_labels_match_display() {
        for strength in [
            CorrelationStrength::VeryStrong,
            CorrelationStrength::Strong,
            CorrelationStrength::Moderate,
            CorrelationStrength::Weak,
            CorrelationStrength::VeryWeak,
        ] {
            let json = serde_json::to_string(&strength).unwrap();
            assert_eq!(json, format!("\"{}\"", strength));
            let back: CorrelationStrength = serde_json::from_str(&json).unwrap();
            assert_eq!(back, strength);
        }
    }
}
