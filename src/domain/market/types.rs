use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A scored news item as delivered by the upstream sentiment model.
///
/// `timestamp` is kept in its raw form; it is normalized to a calendar date
/// during alignment so that parse failures can be counted there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub ticker: String,
    pub timestamp: String,
    #[serde(default)]
    pub text: String,
    pub sentiment_score: f64,
}

impl NewsItem {
    pub fn new(ticker: &str, timestamp: &str, sentiment_score: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            timestamp: timestamp.to_string(),
            text: String::new(),
            sentiment_score,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }
}

/// Daily OHLCV bar. One per (ticker, trading day).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl PriceBar {
    /// Bar where open/high/low all equal the close. Handy for fixtures that only care about closes.
    pub fn from_close(ticker: &str, date: NaiveDate, close: Decimal) -> Self {
        Self {
            ticker: ticker.to_string(),
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }
}

/// Close-to-close return. `daily_return` is `None` for the first bar of a
/// series and whenever the previous close was zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReturn {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: Decimal,
    pub daily_return: Option<f64>,
}

/// One joined observation: a day that has both aggregated sentiment and a defined return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub ticker: String,
    pub trading_day: NaiveDate,
    pub sentiment: f64,
    pub daily_return: f64,
    pub item_count: usize,
}
