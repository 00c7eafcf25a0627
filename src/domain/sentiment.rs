use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scores at or above this are positive.
pub const POSITIVE_THRESHOLD: f64 = 0.1;
/// Scores at or below this are negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentCategory {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for SentimentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

impl SentimentCategory {
    /// Tie-break order when several buckets share the modal count.
    pub const PRIORITY: [SentimentCategory; 3] = [Self::Positive, Self::Negative, Self::Neutral];

    pub fn from_score(score: f64) -> Self {
        if score >= POSITIVE_THRESHOLD {
            Self::Positive
        } else if score <= NEGATIVE_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

/// A news item after its timestamp has been mapped onto a trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedNewsItem {
    pub ticker: String,
    /// Calendar date of publication in the reference timezone
    pub published_on: NaiveDate,
    pub trading_day: NaiveDate,
    pub sentiment_score: f64,
}

/// Aggregated sentiment for one (ticker, trading day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySentiment {
    pub ticker: String,
    pub trading_day: NaiveDate,
    pub mean_sentiment: f64,
    /// Sample standard deviation of the day's scores; `None` for a single item
    pub sentiment_std: Option<f64>,
    pub item_count: usize,
    pub dominant_category: SentimentCategory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_thresholds_are_inclusive() {
        assert_eq!(SentimentCategory::from_score(0.1), SentimentCategory::Positive);
        assert_eq!(SentimentCategory::from_score(-0.1), SentimentCategory::Negative);
        assert_eq!(SentimentCategory::from_score(0.09), SentimentCategory::Neutral);
        assert_eq!(SentimentCategory::from_score(-0.09), SentimentCategory::Neutral);
        assert_eq!(SentimentCategory::from_score(1.0), SentimentCategory::Positive);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(SentimentCategory::Negative.to_string(), "negative");
    }
}
