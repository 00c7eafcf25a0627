use crate::domain::sentiment::{AlignedNewsItem, DailySentiment, SentimentCategory};
use crate::domain::statistics::Stats;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Collapses aligned news items into one sentiment signal per (ticker, trading day).
pub struct SentimentAggregator;

impl SentimentAggregator {
    /// Groups by (ticker, trading day) and takes the plain arithmetic mean:
    /// items published on the same day are equally informative.
    ///
    /// Output is ordered by ticker, then trading day.
    pub fn aggregate(items: &[AlignedNewsItem]) -> Vec<DailySentiment> {
        let mut groups: BTreeMap<(&str, NaiveDate), Vec<f64>> = BTreeMap::new();
        for item in items {
            groups
                .entry((item.ticker.as_str(), item.trading_day))
                .or_default()
                .push(item.sentiment_score);
        }

        groups
            .into_iter()
            .filter_map(|((ticker, trading_day), scores)| {
                let mean_sentiment = Stats::mean(&scores)?;
                Some(DailySentiment {
                    ticker: ticker.to_string(),
                    trading_day,
                    mean_sentiment,
                    sentiment_std: Stats::sample_std_dev(&scores),
                    item_count: scores.len(),
                    dominant_category: Self::dominant_category(&scores),
                })
            })
            .collect()
    }

    /// Modal category of the scores. Ties go to positive, then negative, then neutral.
    pub fn dominant_category(scores: &[f64]) -> SentimentCategory {
        let count = |category: SentimentCategory| {
            scores
                .iter()
                .filter(|s| SentimentCategory::from_score(**s) == category)
                .count()
        };

        let mut dominant = SentimentCategory::PRIORITY[0];
        let mut best = count(dominant);
        for category in &SentimentCategory::PRIORITY[1..] {
            let n = count(*category);
            if n > best {
                dominant = *category;
                best = n;
            }
        }
        dominant
    }
}
