use crate::application::aligner::Aligner;
use crate::application::correlation_engine::CorrelationEngine;
use crate::application::return_calculator::ReturnCalculator;
use crate::application::sentiment_aggregator::SentimentAggregator;
use crate::application::time_normalizer::TimeNormalizer;
use crate::config::EngineConfig;
use crate::domain::correlation::{CorrelationSummary, TickerOutcome};
use crate::domain::errors::{AnalysisError, ConfigError};
use crate::domain::market::trading_calendar::TradingDayIndex;
use crate::domain::market::types::{DailyReturn, MergedRecord, NewsItem, PriceBar};
use crate::domain::sentiment::DailySentiment;
use crate::domain::validation::data_quality::{DataQualityReport, PriceBarValidator};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub merged_records: Vec<MergedRecord>,
    pub daily_sentiment: Vec<DailySentiment>,
    /// One entry per ticker seen in the (filtered) input, ordered by ticker
    pub outcomes: Vec<TickerOutcome>,
    pub summary: CorrelationSummary,
    pub quality: DataQualityReport,
}

impl PipelineReport {
    /// Records source rows the input adapter could not read, so that every
    /// dropped row shows up in the quality report.
    pub fn record_unreadable_rows(&mut self, news: usize, bars: usize) {
        self.quality.news_unreadable += news;
        self.quality.bars_unreadable += bars;
    }
}

/// Batch run: calendar, returns, alignment, aggregation, merge, correlation.
pub struct SentimentReturnPipeline {
    config: EngineConfig,
    normalizer: TimeNormalizer,
    engine: CorrelationEngine,
}

impl SentimentReturnPipeline {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let normalizer = TimeNormalizer::new(config.reference_offset()?);
        let engine = CorrelationEngine::new(&config.correlation);
        Ok(Self {
            config,
            normalizer,
            engine,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn normalizer(&self) -> TimeNormalizer {
        self.normalizer
    }

    /// Runs the engine over one batch. Inputs are never mutated and the
    /// same inputs always yield the same report.
    pub fn run(&self, news: &[NewsItem], bars: &[PriceBar]) -> PipelineReport {
        let mut quality = DataQualityReport {
            news_received: news.len(),
            bars_received: bars.len(),
            ..Default::default()
        };

        let news: Vec<NewsItem> = news
            .iter()
            .filter(|n| self.config.includes_ticker(&n.ticker))
            .cloned()
            .collect();
        let bars: Vec<PriceBar> = bars
            .iter()
            .filter(|b| self.config.includes_ticker(&b.ticker))
            .cloned()
            .collect();
        quality.news_filtered = quality.news_received - news.len();
        quality.bars_filtered = quality.bars_received - bars.len();

        let (bars, bar_warnings) = PriceBarValidator::filter(&bars);
        quality.invalid_bars = bar_warnings.len();
        let mut dropped_bars: BTreeMap<String, Vec<NaiveDate>> = BTreeMap::new();
        for (ticker, date) in bar_warnings.iter().filter_map(|w| w.dropped_bar()) {
            dropped_bars.entry(ticker.to_string()).or_default().push(date);
        }
        quality.warnings.extend(bar_warnings);

        let mut bars_by_ticker: BTreeMap<&str, Vec<PriceBar>> = BTreeMap::new();
        for bar in &bars {
            bars_by_ticker
                .entry(bar.ticker.as_str())
                .or_default()
                .push(bar.clone());
        }

        let index = TradingDayIndex::from_bars(&bars);

        let mut daily_returns: Vec<DailyReturn> = Vec::new();
        let mut rejected: BTreeMap<String, AnalysisError> = BTreeMap::new();
        for (ticker, series) in &bars_by_ticker {
            match ReturnCalculator::compute_returns(series) {
                Ok(mut returns) => {
                    if let Some(dropped) = dropped_bars.get(*ticker) {
                        returns.void_spans_over(dropped);
                    }
                    daily_returns.extend(returns.returns);
                    quality.warnings.extend(returns.warnings);
                }
                Err(e) => {
                    warn!("Rejecting price series for {}: {}", ticker, e);
                    rejected.insert(ticker.to_string(), e.into());
                }
            }
        }
        quality.rejected_series = rejected.len();

        let aligner = Aligner::new(&index, self.normalizer, &self.config.alignment);
        let alignment = aligner.align(&news);
        quality.unparseable_timestamps = alignment.unparseable_timestamps;
        quality.invalid_scores = alignment.invalid_scores;
        quality.no_trading_day_match = alignment.no_trading_day_match;
        quality.shifted_to_other_day = alignment.shifted;

        let daily_sentiment = SentimentAggregator::aggregate(&alignment.aligned);

        let merge = Aligner::merge(&daily_sentiment, &daily_returns);
        quality.sentiment_only = merge.sentiment_only;
        quality.return_only = merge.return_only;
        quality.undefined_return = merge.undefined_return;
        if merge.has_pathological_overlap(daily_sentiment.len(), daily_returns.len()) {
            warn!(
                "No (ticker, day) overlap between {} sentiment rows and {} return rows; check that news and prices cover the same period",
                daily_sentiment.len(),
                daily_returns.len()
            );
            for ticker in index.tickers() {
                if let Some((first, last)) = index.date_range(ticker) {
                    warn!("{}: prices cover {} to {}", ticker, first, last);
                }
            }
        }

        let tickers: BTreeSet<String> = news
            .iter()
            .map(|n| n.ticker.clone())
            .chain(bars.iter().map(|b| b.ticker.clone()))
            .filter(|t| !rejected.contains_key(t))
            .collect();

        let mut outcomes = self.engine.analyze_all(&merge.records, &tickers);
        outcomes.extend(
            rejected
                .into_iter()
                .map(|(ticker, error)| TickerOutcome {
                    ticker,
                    result: Err(error),
                }),
        );
        outcomes.sort_by(|a, b| a.ticker.cmp(&b.ticker));

        let summary = self.engine.summarize(&outcomes);

        info!(
            "Run complete: {} merged records, {}/{} tickers analyzed, {} news dropped, {} sentiment-only, {} return-only",
            merge.records.len(),
            summary.tickers_analyzed,
            summary.tickers_total,
            quality.news_dropped(),
            quality.sentiment_only,
            quality.return_only
        );

        PipelineReport {
            merged_records: merge.records,
            daily_sentiment,
            outcomes,
            summary,
            quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validation::data_quality::DataQualityWarning;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn bar(ticker: &str, date: NaiveDate, close: Decimal) -> PriceBar {
        PriceBar::from_close(ticker, date, close)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.correlation.min_samples = 1;
        assert!(SentimentReturnPipeline::new(config).is_err());
    }

    #[test]
    fn test_ticker_filter_counts_dropped_records() {
        let pipeline =
            SentimentReturnPipeline::new(EngineConfig::default().with_tickers(["X"])).unwrap();
        let report = pipeline.run(
            &[NewsItem::new("X", "2024-01-08", 0.2), NewsItem::new("Y", "2024-01-08", 0.2)],
            &[bar("X", day(1, 8), dec!(10)), bar("Y", day(1, 8), dec!(10))],
        );

        assert_eq!(report.quality.news_filtered, 1);
        assert_eq!(report.quality.bars_filtered, 1);
        let tickers: Vec<&str> = report.outcomes.iter().map(|o| o.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["X"]);
    }

    #[test]
    fn test_unordered_price_series_becomes_failure_outcome() {
        let pipeline = SentimentReturnPipeline::new(EngineConfig::default()).unwrap();
        let report = pipeline.run(
            &[NewsItem::new("X", "2024-01-08", 0.2)],
            &[
                bar("X", day(1, 9), dec!(10)),
                bar("X", day(1, 8), dec!(11)),
                bar("Y", day(1, 8), dec!(20)),
            ],
        );

        assert_eq!(report.quality.rejected_series, 1);
        assert_eq!(report.summary.rejected_series, 1);
        let x = report.outcomes.iter().find(|o| o.ticker == "X").unwrap();
        assert_eq!(x.error().map(|e| e.kind()), Some("unordered_input"));
        // the rejected ticker's news still maps onto its calendar
        assert_eq!(report.daily_sentiment.len(), 1);
        assert_eq!(report.quality.sentiment_only, 1);
    }

    #[test]
    fn test_invalid_bars_are_dropped_before_indexing() {
        let pipeline = SentimentReturnPipeline::new(EngineConfig::default()).unwrap();
        let mut broken = bar("X", day(1, 9), dec!(10));
        broken.low = dec!(12);
        broken.high = dec!(11);

        let report = pipeline.run(
            &[NewsItem::new("X", "2024-01-09", 0.5)],
            &[bar("X", day(1, 8), dec!(10)), broken],
        );

        assert_eq!(report.quality.invalid_bars, 1);
        assert_eq!(report.quality.shifted_to_other_day, 1);
        assert_eq!(report.daily_sentiment[0].trading_day, day(1, 8));
    }

    #[test]
    fn test_return_after_invalid_bar_is_not_stitched_across_sessions() {
        let pipeline = SentimentReturnPipeline::new(EngineConfig::default()).unwrap();
        let mut broken = bar("X", day(1, 9), dec!(105));
        broken.low = dec!(106);
        broken.high = dec!(104);

        let report = pipeline.run(
            &[NewsItem::new("X", "2024-01-10", 0.5)],
            &[bar("X", day(1, 8), dec!(100)), broken, bar("X", day(1, 10), dec!(110))],
        );

        assert!(report.merged_records.is_empty());
        assert_eq!(report.quality.undefined_return, 1);
        assert!(report.quality.warnings.contains(&DataQualityWarning::SpansDroppedBar {
            ticker: "X".to_string(),
            date: day(1, 10),
            dropped: day(1, 9),
        }));
    }

    #[test]
    fn test_unreadable_rows_reach_quality_report() {
        let pipeline = SentimentReturnPipeline::new(EngineConfig::default()).unwrap();
        let mut report = pipeline.run(&[NewsItem::new("X", "2024-01-08", 0.2)], &[]);
        report.record_unreadable_rows(1, 2);

        assert_eq!(report.quality.news_received, 1);
        assert_eq!(report.quality.news_unreadable, 1);
        assert_eq!(report.quality.bars_unreadable, 2);
        assert_eq!(report.quality.news_dropped(), 2);
    }
}
