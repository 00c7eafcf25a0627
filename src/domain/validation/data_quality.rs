use crate::domain::market::types::PriceBar;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

/// Non-fatal data problems surfaced alongside the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DataQualityWarning {
    /// Return left undefined because the previous close was zero
    ZeroPreviousClose { ticker: String, date: NaiveDate },
    /// Bar dropped before the trading-day index was built
    InvalidPriceBar {
        ticker: String,
        date: NaiveDate,
        reason: String,
    },
    /// Return left undefined because its close-to-close span covers a dropped bar
    SpansDroppedBar {
        ticker: String,
        date: NaiveDate,
        dropped: NaiveDate,
    },
    /// Return left undefined because the division overflowed `Decimal`
    ReturnOverflow { ticker: String, date: NaiveDate },
}

impl DataQualityWarning {
    /// (ticker, date) of a bar the validator removed.
    pub fn dropped_bar(&self) -> Option<(&str, NaiveDate)> {
        match self {
            Self::InvalidPriceBar { ticker, date, .. } => Some((ticker.as_str(), *date)),
            _ => None,
        }
    }
}

/// Drop counts and warnings for one run. Nothing is imputed; everything
/// excluded from the statistics is accounted for here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DataQualityReport {
    /// Source rows that could not be read into a news item or price bar
    pub news_unreadable: usize,
    pub bars_unreadable: usize,
    pub news_received: usize,
    pub bars_received: usize,
    /// Records for tickers outside the configured ticker list
    pub news_filtered: usize,
    pub bars_filtered: usize,
    pub invalid_bars: usize,
    pub unparseable_timestamps: usize,
    pub invalid_scores: usize,
    pub no_trading_day_match: usize,
    /// News moved off its calendar date onto another session
    pub shifted_to_other_day: usize,
    pub sentiment_only: usize,
    pub return_only: usize,
    pub undefined_return: usize,
    pub rejected_series: usize,
    pub warnings: Vec<DataQualityWarning>,
}

impl DataQualityReport {
    /// News rows that never reached the aggregator, unreadable source rows included.
    pub fn news_dropped(&self) -> usize {
        self.news_unreadable
            + self.news_filtered
            + self.unparseable_timestamps
            + self.invalid_scores
            + self.no_trading_day_match
    }
}

/// Rejects price bars that are physically impossible.
///
/// A zero close is deliberately let through: the return calculator turns it
/// into an undefined return with its own warning.
pub struct PriceBarValidator;

impl PriceBarValidator {
    pub fn validate(bar: &PriceBar) -> Result<(), String> {
        let prices = [bar.open, bar.high, bar.low, bar.close];
        if prices.iter().any(|p| *p < Decimal::ZERO) {
            return Err("negative price component".to_string());
        }

        if bar.low > bar.high {
            return Err(format!("low {} > high {}", bar.low, bar.high));
        }

        Ok(())
    }

    /// Splits `bars` into valid bars and warnings for the rejected ones.
    pub fn filter(bars: &[PriceBar]) -> (Vec<PriceBar>, Vec<DataQualityWarning>) {
        let mut valid = Vec::with_capacity(bars.len());
        let mut warnings = Vec::new();

        for bar in bars {
            match Self::validate(bar) {
                Ok(()) => valid.push(bar.clone()),
                Err(reason) => {
                    warn!(
                        "Validation FAILED: bar for {} on {} rejected: {}",
                        bar.ticker, bar.date, reason
                    );
                    warnings.push(DataQualityWarning::InvalidPriceBar {
                        ticker: bar.ticker.clone(),
                        date: bar.date,
                        reason,
                    });
                }
            }
        }

        (valid, warnings)
    }
}
