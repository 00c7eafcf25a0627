use crate::application::time_normalizer::TimeNormalizer;
use crate::config::AlignmentEnvConfig;
use crate::domain::errors::{AlignmentError, ParseError};
use crate::domain::market::trading_calendar::TradingDayIndex;
use crate::domain::market::types::{DailyReturn, MergedRecord, NewsItem};
use crate::domain::sentiment::{AlignedNewsItem, DailySentiment};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// News items mapped onto trading days, with a count per drop reason.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewsAlignment {
    pub aligned: Vec<AlignedNewsItem>,
    pub unparseable_timestamps: usize,
    pub invalid_scores: usize,
    pub no_trading_day_match: usize,
    /// Aligned items whose trading day differs from their publication date
    pub shifted: usize,
}

impl NewsAlignment {
    pub fn dropped(&self) -> usize {
        self.unparseable_timestamps + self.invalid_scores + self.no_trading_day_match
    }
}

/// Result of the inner join between daily sentiment and daily returns.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MergeOutcome {
    pub records: Vec<MergedRecord>,
    /// Sentiment rows with no return row for the same (ticker, day)
    pub sentiment_only: usize,
    /// Return rows with no sentiment row for the same (ticker, day)
    pub return_only: usize,
    /// Matched rows whose return is undefined (first bar, zero prior close)
    pub undefined_return: usize,
}

impl MergeOutcome {
    /// Both sides had data but not a single (ticker, day) matched,
    /// e.g. news and prices covering disjoint date ranges.
    pub fn has_pathological_overlap(&self, sentiment_rows: usize, return_rows: usize) -> bool {
        self.records.is_empty() && sentiment_rows > 0 && return_rows > 0
    }
}

/// Maps news onto the trading calendar and joins sentiment with returns.
pub struct Aligner<'a> {
    index: &'a TradingDayIndex,
    normalizer: TimeNormalizer,
    max_lookahead_days: u32,
    max_lookback_days: u32,
}

impl<'a> Aligner<'a> {
    pub fn new(
        index: &'a TradingDayIndex,
        normalizer: TimeNormalizer,
        config: &AlignmentEnvConfig,
    ) -> Self {
        Self {
            index,
            normalizer,
            max_lookahead_days: config.max_lookahead_days,
            max_lookback_days: config.max_lookback_days,
        }
    }

    /// Normalizes and maps one news item. Errors mean the item is dropped.
    pub fn align_item(&self, item: &NewsItem) -> Result<AlignedNewsItem, AlignItemError> {
        if !item.sentiment_score.is_finite() || !(-1.0..=1.0).contains(&item.sentiment_score) {
            return Err(AlignItemError::Parse(ParseError::SentimentScore {
                ticker: item.ticker.clone(),
                value: item.sentiment_score,
            }));
        }

        let published_on = self
            .normalizer
            .normalize(&item.timestamp)
            .map_err(AlignItemError::Parse)?;

        let trading_day = self
            .index
            .nearest_trading_day(
                &item.ticker,
                published_on,
                self.max_lookahead_days,
                self.max_lookback_days,
            )
            .ok_or_else(|| {
                AlignItemError::Alignment(AlignmentError::NoTradingDayMatch {
                    ticker: item.ticker.clone(),
                    date: published_on,
                    max_lookahead_days: self.max_lookahead_days,
                    max_lookback_days: self.max_lookback_days,
                })
            })?;

        Ok(AlignedNewsItem {
            ticker: item.ticker.clone(),
            published_on,
            trading_day,
            sentiment_score: item.sentiment_score,
        })
    }

    /// Aligns every item, counting rather than imputing the ones that fail.
    pub fn align(&self, items: &[NewsItem]) -> NewsAlignment {
        let mut alignment = NewsAlignment {
            aligned: Vec::with_capacity(items.len()),
            ..Default::default()
        };

        for item in items {
            match self.align_item(item) {
                Ok(aligned) => {
                    if aligned.trading_day != aligned.published_on {
                        alignment.shifted += 1;
                    }
                    alignment.aligned.push(aligned);
                }
                Err(e) => {
                    debug!("Dropping news item: {}", e);
                    match e {
                        AlignItemError::Parse(ParseError::SentimentScore { .. }) => {
                            alignment.invalid_scores += 1
                        }
                        AlignItemError::Parse(_) => alignment.unparseable_timestamps += 1,
                        AlignItemError::Alignment(_) => alignment.no_trading_day_match += 1,
                    }
                }
            }
        }

        alignment
    }

    /// Inner join on (ticker, trading day).
    ///
    /// Unmatched rows on either side are counted, never zero-filled: an
    /// imputed zero would pull the correlation towards zero.
    pub fn merge(
        daily_sentiment: &[DailySentiment],
        daily_returns: &[DailyReturn],
    ) -> MergeOutcome {
        let returns: BTreeMap<(&str, NaiveDate), &DailyReturn> = daily_returns
            .iter()
            .map(|r| ((r.ticker.as_str(), r.date), r))
            .collect();
        let sentiment_keys: BTreeSet<(&str, NaiveDate)> = daily_sentiment
            .iter()
            .map(|s| (s.ticker.as_str(), s.trading_day))
            .collect();

        let mut outcome = MergeOutcome::default();

        for sentiment in daily_sentiment {
            match returns.get(&(sentiment.ticker.as_str(), sentiment.trading_day)) {
                None => outcome.sentiment_only += 1,
                Some(ret) => match ret.daily_return {
                    None => outcome.undefined_return += 1,
                    Some(daily_return) => outcome.records.push(MergedRecord {
                        ticker: sentiment.ticker.clone(),
                        trading_day: sentiment.trading_day,
                        sentiment: sentiment.mean_sentiment,
                        daily_return,
                        item_count: sentiment.item_count,
                    }),
                },
            }
        }

        outcome.return_only = daily_returns
            .iter()
            .filter(|r| !sentiment_keys.contains(&(r.ticker.as_str(), r.date)))
            .count();

        outcome
            .records
            .sort_by(|a, b| (&a.ticker, a.trading_day).cmp(&(&b.ticker, b.trading_day)));
        outcome
    }
}

/// Why a single news item could not be aligned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlignItemError {
    #[error(transparent)]
    Parse(ParseError),
    #[error(transparent)]
    Alignment(AlignmentError),
}
