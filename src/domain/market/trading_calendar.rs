use crate::domain::market::types::PriceBar;
use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Per-ticker set of trading days, derived purely from price bar presence.
///
/// A date is a trading day for a ticker iff at least one bar exists for that
/// (ticker, date) pair in the supplied data. The index is built once per run
/// and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradingDayIndex {
    days: BTreeMap<String, BTreeSet<NaiveDate>>,
}

impl TradingDayIndex {
    pub fn from_bars<'a, I>(bars: I) -> Self
    where
        I: IntoIterator<Item = &'a PriceBar>,
    {
        let mut days: BTreeMap<String, BTreeSet<NaiveDate>> = BTreeMap::new();
        for bar in bars {
            days.entry(bar.ticker.clone()).or_default().insert(bar.date);
        }
        Self { days }
    }

    pub fn is_trading_day(&self, ticker: &str, date: NaiveDate) -> bool {
        self.days
            .get(ticker)
            .is_some_and(|days| days.contains(&date))
    }

    /// Maps `date` onto a trading day for `ticker`.
    ///
    /// Returns `date` itself when it is a trading day. Otherwise the next
    /// session within `max_lookahead_days` wins (news on a closed day is priced
    /// in at the next open). Only when no later session exists does the search
    /// fall back to the closest earlier session within `max_lookback_days`.
    /// `None` means the caller must drop the item.
    pub fn nearest_trading_day(
        &self,
        ticker: &str,
        date: NaiveDate,
        max_lookahead_days: u32,
        max_lookback_days: u32,
    ) -> Option<NaiveDate> {
        let days = self.days.get(ticker)?;

        if days.contains(&date) {
            return Some(date);
        }

        if let Some(first) = date.checked_add_days(Days::new(1))
            && max_lookahead_days > 0
        {
            let last = date
                .checked_add_days(Days::new(u64::from(max_lookahead_days)))
                .unwrap_or(NaiveDate::MAX);
            if let Some(next) = days.range(first..=last).next() {
                return Some(*next);
            }
        }

        if max_lookback_days > 0 {
            let earliest = date
                .checked_sub_days(Days::new(u64::from(max_lookback_days)))
                .unwrap_or(NaiveDate::MIN);
            if let Some(previous) = days.range(earliest..date).next_back() {
                return Some(*previous);
            }
        }

        None
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.days.keys().map(String::as_str)
    }

    pub fn trading_days(&self, ticker: &str) -> Option<&BTreeSet<NaiveDate>> {
        self.days.get(ticker)
    }

    /// First and last trading day known for `ticker`.
    pub fn date_range(&self, ticker: &str) -> Option<(NaiveDate, NaiveDate)> {
        let days = self.days.get(ticker)?;
        Some((*days.first()?, *days.last()?))
    }

    pub fn ticker_count(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
