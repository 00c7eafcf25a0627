use crate::config::CorrelationEnvConfig;
use crate::domain::correlation::{
    CorrelationResult, CorrelationStrength, CorrelationSummary, TickerOutcome,
};
use crate::domain::errors::{AnalysisError, SeriesError, SeriesKind};
use crate::domain::market::types::MergedRecord;
use crate::domain::statistics::Stats;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Fewest lagged pairs for which a lagged p-value is defined.
const MIN_LAGGED_PAIRS: usize = 3;

/// Sentiment/return correlation statistics per ticker.
#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    min_samples: usize,
    significance_level: f64,
}

impl CorrelationEngine {
    pub fn new(config: &CorrelationEnvConfig) -> Self {
        Self {
            min_samples: config.min_samples,
            significance_level: config.significance_level,
        }
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    pub fn significance_level(&self) -> f64 {
        self.significance_level
    }

    /// Analyzes the merged records of a single ticker.
    ///
    /// Fails instead of returning a coefficient when the sample is too small,
    /// either series is constant, or the records do not form one ordered
    /// sequence of distinct trading days for `ticker`.
    pub fn analyze(
        &self,
        ticker: &str,
        records: &[MergedRecord],
    ) -> Result<CorrelationResult, AnalysisError> {
        if let Some(other) = records.iter().find(|r| r.ticker != ticker) {
            return Err(SeriesError::MixedTickers {
                expected: ticker.to_string(),
                found: other.ticker.clone(),
            }
            .into());
        }

        let n = records.len();
        if n < self.min_samples {
            return Err(AnalysisError::InsufficientData {
                ticker: ticker.to_string(),
                required: self.min_samples,
                actual: n,
            });
        }

        let mut ordered: Vec<&MergedRecord> = records.iter().collect();
        ordered.sort_by_key(|r| r.trading_day);
        Self::ensure_distinct_days(ticker, &ordered)?;

        let sentiment: Vec<f64> = ordered.iter().map(|r| r.sentiment).collect();
        let returns: Vec<f64> = ordered.iter().map(|r| r.daily_return).collect();

        if Stats::is_constant(&sentiment) {
            return Err(AnalysisError::DegenerateSeries {
                ticker: ticker.to_string(),
                series: SeriesKind::Sentiment,
            });
        }
        if Stats::is_constant(&returns) {
            return Err(AnalysisError::DegenerateSeries {
                ticker: ticker.to_string(),
                series: SeriesKind::Return,
            });
        }

        let degenerate = || AnalysisError::DegenerateSeries {
            ticker: ticker.to_string(),
            series: SeriesKind::Sentiment,
        };

        let pearson_r = Stats::pearson(&sentiment, &returns).ok_or_else(degenerate)?;
        let pearson_p = Stats::correlation_p_value(pearson_r, n).ok_or_else(degenerate)?;
        let spearman_r = Stats::spearman(&sentiment, &returns).ok_or_else(degenerate)?;
        let spearman_p = Stats::correlation_p_value(spearman_r, n).ok_or_else(degenerate)?;

        let (lagged_r, lagged_p, lagged_observations) = Self::lagged(&sentiment, &returns);

        debug!(
            "{}: n={} pearson={:.4} (p={:.4}) spearman={:.4} lagged={:?}",
            ticker, n, pearson_r, pearson_p, spearman_r, lagged_r
        );

        Ok(CorrelationResult {
            ticker: ticker.to_string(),
            pearson_r,
            pearson_p,
            spearman_r,
            spearman_p,
            lagged_r,
            lagged_p,
            lagged_observations,
            r_squared: pearson_r * pearson_r,
            n_observations: n,
            strength_label: CorrelationStrength::from_coefficient(pearson_r),
            significant: pearson_p < self.significance_level,
        })
    }

    /// Analyzes every ticker in `tickers`, each against its own slice of `records`.
    ///
    /// Tickers are independent, so they are processed in parallel over
    /// read-only partitions. Output is ordered by ticker.
    pub fn analyze_all(
        &self,
        records: &[MergedRecord],
        tickers: &BTreeSet<String>,
    ) -> Vec<TickerOutcome> {
        let mut partitions: BTreeMap<&str, Vec<MergedRecord>> =
            tickers.iter().map(|t| (t.as_str(), Vec::new())).collect();
        for record in records {
            partitions
                .entry(record.ticker.as_str())
                .or_default()
                .push(record.clone());
        }

        let partitions: Vec<(&str, Vec<MergedRecord>)> = partitions.into_iter().collect();
        partitions
            .par_iter()
            .map(|(ticker, slice)| TickerOutcome {
                ticker: ticker.to_string(),
                result: self.analyze(ticker, slice),
            })
            .collect()
    }

    /// Cross-ticker summary over a set of outcomes.
    pub fn summarize(&self, outcomes: &[TickerOutcome]) -> CorrelationSummary {
        let analyzed: Vec<&CorrelationResult> =
            outcomes.iter().filter_map(TickerOutcome::correlation).collect();
        let coefficients: Vec<f64> = analyzed.iter().map(|r| r.pearson_r).collect();

        let strongest = analyzed
            .iter()
            .max_by(|a, b| a.pearson_r.abs().total_cmp(&b.pearson_r.abs()));

        let mut summary = CorrelationSummary {
            tickers_total: outcomes.len(),
            tickers_analyzed: analyzed.len(),
            tickers_failed: outcomes.len() - analyzed.len(),
            mean_correlation: Stats::mean(&coefficients),
            significant_tickers: analyzed.iter().filter(|r| r.significant).count(),
            significance_level: self.significance_level,
            strongest_ticker: strongest.map(|r| r.ticker.clone()),
            strongest_correlation: strongest.map(|r| r.pearson_r),
            ..Default::default()
        };

        for error in outcomes.iter().filter_map(TickerOutcome::error) {
            match error {
                AnalysisError::InsufficientData { .. } => summary.insufficient_data += 1,
                AnalysisError::DegenerateSeries { .. } => summary.degenerate += 1,
                AnalysisError::Series(_) => summary.rejected_series += 1,
            }
        }

        summary
    }

    fn ensure_distinct_days(ticker: &str, ordered: &[&MergedRecord]) -> Result<(), SeriesError> {
        for pair in ordered.windows(2) {
            if pair[1].trading_day <= pair[0].trading_day {
                return Err(SeriesError::UnorderedInput {
                    ticker: ticker.to_string(),
                    previous: pair[0].trading_day,
                    current: pair[1].trading_day,
                });
            }
        }
        Ok(())
    }

    /// Pearson between sentiment[t] and return[t+1] over the ordered sequence.
    fn lagged(sentiment: &[f64], returns: &[f64]) -> (Option<f64>, Option<f64>, usize) {
        if sentiment.len() < 2 {
            return (None, None, 0);
        }

        let leading = &sentiment[..sentiment.len() - 1];
        let following = &returns[1..];
        let pairs = leading.len();

        if pairs < MIN_LAGGED_PAIRS {
            return (None, None, pairs);
        }

        match Stats::pearson(leading, following) {
            Some(r) => (Some(r), Stats::correlation_p_value(r, pairs), pairs),
            None => (None, None, pairs),
        }
    }
}
