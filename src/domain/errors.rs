use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Per-record parse failures. The record is dropped and counted, never imputed.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum ParseError {
    #[error("Unparseable timestamp: '{input}'")]
    Timestamp { input: String },

    #[error("Invalid sentiment score for {ticker}: {value} (expected a finite value in [-1, 1])")]
    SentimentScore { ticker: String, value: f64 },

    #[error("Invalid {field} value '{input}'")]
    Number { field: String, input: String },
}

/// A news item whose date has no trading day within the configured search window.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum AlignmentError {
    #[error(
        "No trading day for {ticker} near {date} (lookahead {max_lookahead_days}d, lookback {max_lookback_days}d)"
    )]
    NoTradingDayMatch {
        ticker: String,
        date: NaiveDate,
        max_lookahead_days: u32,
        max_lookback_days: u32,
    },
}

/// Structural problems with a per-ticker series. Fatal for that ticker only.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum SeriesError {
    #[error("Unordered input for {ticker}: {current} does not follow {previous}")]
    UnorderedInput {
        ticker: String,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("Series for {expected} contains a record for {found}")]
    MixedTickers { expected: String, found: String },
}

/// Which side of the sentiment/return pair was constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeriesKind {
    Sentiment,
    Return,
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesKind::Sentiment => write!(f, "sentiment"),
            SeriesKind::Return => write!(f, "return"),
        }
    }
}

/// Reasons a ticker's correlation could not be reported as a number.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum AnalysisError {
    #[error("Insufficient data for {ticker}: {actual} merged records < {required} required")]
    InsufficientData {
        ticker: String,
        required: usize,
        actual: usize,
    },

    #[error("Correlation undefined for {ticker}: {series} series has zero variance")]
    DegenerateSeries { ticker: String, series: SeriesKind },

    #[error(transparent)]
    Series(#[from] SeriesError),
}

impl AnalysisError {
    /// Short machine-readable tag used in tabular reports.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::InsufficientData { .. } => "insufficient_data",
            AnalysisError::DegenerateSeries { .. } => "degenerate_series",
            AnalysisError::Series(SeriesError::UnorderedInput { .. }) => "unordered_input",
            AnalysisError::Series(SeriesError::MixedTickers { .. }) => "mixed_tickers",
        }
    }
}

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("min_samples must be at least {minimum}, got {value}")]
    MinSamplesTooSmall { value: usize, minimum: usize },

    #[error("significance_level must be in (0, 1), got {value}")]
    SignificanceLevel { value: f64 },

    #[error("Reference UTC offset out of range: {minutes} minutes")]
    UtcOffset { minutes: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_formatting() {
        let error = AnalysisError::InsufficientData {
            ticker: "AAPL".to_string(),
            required: 5,
            actual: 3,
        };

        let msg = error.to_string();
        assert!(msg.contains("AAPL"));
        assert!(msg.contains("3 merged records"));
        assert!(msg.contains("5 required"));
        assert_eq!(error.kind(), "insufficient_data");
    }

    #[test]
    fn test_series_error_is_transparent() {
        let error: AnalysisError = SeriesError::UnorderedInput {
            ticker: "MSFT".to_string(),
            previous: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
            current: NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
        }
        .into();

        let msg = error.to_string();
        assert!(msg.starts_with("Unordered input for MSFT"));
        assert!(msg.contains("2024-01-08 does not follow 2024-01-09"));
        assert_eq!(error.kind(), "unordered_input");
    }

    #[test]
    fn test_degenerate_series_names_the_series() {
        let error = AnalysisError::DegenerateSeries {
            ticker: "NVDA".to_string(),
            series: SeriesKind::Return,
        };
        assert!(error.to_string().contains("return series has zero variance"));
    }
}
