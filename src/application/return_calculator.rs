use crate::domain::errors::SeriesError;
use crate::domain::market::types::{DailyReturn, PriceBar};
use crate::domain::validation::data_quality::DataQualityWarning;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::warn;

/// Daily returns for one ticker plus any data-quality warnings raised while computing them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReturnSeries {
    pub returns: Vec<DailyReturn>,
    pub warnings: Vec<DataQualityWarning>,
}

impl ReturnSeries {
    /// Number of days with a defined return.
    pub fn defined_count(&self) -> usize {
        self.returns
            .iter()
            .filter(|r| r.daily_return.is_some())
            .count()
    }

    /// Voids every return whose close-to-close span covers one of `dropped`.
    ///
    /// A bar removed before the series was built would otherwise turn the
    /// next return into a multi-session move reported as one day.
    pub fn void_spans_over(&mut self, dropped: &[NaiveDate]) {
        for i in 1..self.returns.len() {
            let previous = self.returns[i - 1].date;
            let current = &mut self.returns[i];
            let Some(gap) = dropped
                .iter()
                .find(|d| **d > previous && **d < current.date)
            else {
                continue;
            };

            if current.daily_return.take().is_some() {
                warn!(
                    "Return for {} on {} spans dropped bar {}: left undefined",
                    current.ticker, current.date, gap
                );
                self.warnings.push(DataQualityWarning::SpansDroppedBar {
                    ticker: current.ticker.clone(),
                    date: current.date,
                    dropped: *gap,
                });
            }
        }
    }
}

/// Close-to-close returns from an already ordered bar series.
pub struct ReturnCalculator;

impl ReturnCalculator {
    /// Computes `(close[i] - close[i-1]) / close[i-1]` for each bar.
    ///
    /// The first bar has no return. A zero previous close yields `None` and a
    /// warning. Bars must belong to one ticker and be strictly ascending by
    /// date; the series is rejected otherwise, never reordered.
    pub fn compute_returns(bars: &[PriceBar]) -> Result<ReturnSeries, SeriesError> {
        let Some(first) = bars.first() else {
            return Ok(ReturnSeries::default());
        };

        for pair in bars.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            if curr.ticker != first.ticker {
                return Err(SeriesError::MixedTickers {
                    expected: first.ticker.clone(),
                    found: curr.ticker.clone(),
                });
            }
            if curr.date <= prev.date {
                return Err(SeriesError::UnorderedInput {
                    ticker: first.ticker.clone(),
                    previous: prev.date,
                    current: curr.date,
                });
            }
        }

        let mut series = ReturnSeries {
            returns: Vec::with_capacity(bars.len()),
            warnings: Vec::new(),
        };

        series.returns.push(DailyReturn {
            ticker: first.ticker.clone(),
            date: first.date,
            close: first.close,
            daily_return: None,
        });

        for pair in bars.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);

            let daily_return = if prev.close == Decimal::ZERO {
                warn!(
                    "Zero close for {} before {}: return left undefined",
                    curr.ticker, curr.date
                );
                series.warnings.push(DataQualityWarning::ZeroPreviousClose {
                    ticker: curr.ticker.clone(),
                    date: curr.date,
                });
                None
            } else {
                let ratio = curr
                    .close
                    .checked_sub(prev.close)
                    .and_then(|diff| diff.checked_div(prev.close))
                    .and_then(|r| r.to_f64());
                if ratio.is_none() {
                    warn!(
                        "Return for {} on {} overflows: left undefined",
                        curr.ticker, curr.date
                    );
                    series.warnings.push(DataQualityWarning::ReturnOverflow {
                        ticker: curr.ticker.clone(),
                        date: curr.date,
                    });
                }
                ratio
            };

            series.returns.push(DailyReturn {
                ticker: curr.ticker.clone(),
                date: curr.date,
                close: curr.close,
                daily_return,
            });
        }

        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn bars(ticker: &str, closes: &[(u32, Decimal)]) -> Vec<PriceBar> {
        closes
            .iter()
            .map(|(d, c)| {
                PriceBar::from_close(ticker, NaiveDate::from_ymd_opt(2024, 1, *d).unwrap(), *c)
            })
            .collect()
    }

    #[test]
    fn test_returns_for_simple_series() {
        let series = ReturnCalculator::compute_returns(&bars(
            "X",
            &[(2, dec!(100)), (3, dec!(110)), (4, dec!(99))],
        ))
        .unwrap();

        let returns: Vec<Option<f64>> = series.returns.iter().map(|r| r.daily_return).collect();
        assert_eq!(returns[0], None);
        assert!((returns[1].unwrap() - 0.10).abs() < 1e-12);
        assert!((returns[2].unwrap() + 0.10).abs() < 1e-12);
        assert!(series.warnings.is_empty());
        assert_eq!(series.defined_count(), 2);
    }

    #[test]
    fn test_zero_previous_close_is_undefined_not_infinite() {
        let series = ReturnCalculator::compute_returns(&bars(
            "X",
            &[(2, dec!(0)), (3, dec!(10)), (4, dec!(11))],
        ))
        .unwrap();

        assert_eq!(series.returns[1].daily_return, None);
        assert!((series.returns[2].daily_return.unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(
            series.warnings,
            vec![DataQualityWarning::ZeroPreviousClose {
                ticker: "X".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            }]
        );
    }

    #[test]
    fn test_overflowing_return_is_undefined_with_warning() {
        let series = ReturnCalculator::compute_returns(&bars(
            "X",
            &[(2, dec!(0.0000000000000000000000000001)), (3, dec!(1000))],
        ))
        .unwrap();

        assert_eq!(series.returns[1].daily_return, None);
        assert_eq!(
            series.warnings,
            vec![DataQualityWarning::ReturnOverflow {
                ticker: "X".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            }]
        );
    }

    #[test]
    fn test_return_across_dropped_bar_is_voided() {
        // the bar for the 9th was rejected upstream
        let mut series = ReturnCalculator::compute_returns(&bars(
            "X",
            &[(8, dec!(100)), (10, dec!(110)), (11, dec!(121))],
        ))
        .unwrap();
        series.void_spans_over(&[NaiveDate::from_ymd_opt(2024, 1, 9).unwrap()]);

        let returns: Vec<Option<f64>> = series.returns.iter().map(|r| r.daily_return).collect();
        assert_eq!(returns[0], None);
        assert_eq!(returns[1], None);
        assert!((returns[2].unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(
            series.warnings,
            vec![DataQualityWarning::SpansDroppedBar {
                ticker: "X".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                dropped: NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
            }]
        );
    }

    #[test]
    fn test_dropped_bar_outside_series_changes_nothing() {
        let mut series =
            ReturnCalculator::compute_returns(&bars("X", &[(8, dec!(100)), (9, dec!(110))]))
                .unwrap();
        let before = series.clone();
        series.void_spans_over(&[
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
        ]);
        assert_eq!(series, before);
    }

    #[test]
    fn test_inversion_is_rejected() {
        let err = ReturnCalculator::compute_returns(&bars(
            "X",
            &[(2, dec!(100)), (4, dec!(110)), (3, dec!(99))],
        ))
        .unwrap_err();
        assert!(matches!(err, SeriesError::UnorderedInput { .. }));
    }

    #[test]
    fn test_duplicate_date_is_rejected() {
        let err = ReturnCalculator::compute_returns(&bars("X", &[(2, dec!(100)), (2, dec!(101))]))
            .unwrap_err();
        assert!(matches!(err, SeriesError::UnorderedInput { .. }));
    }

    #[test]
    fn test_mixed_tickers_rejected() {
        let mut input = bars("X", &[(2, dec!(100))]);
        input.extend(bars("Y", &[(3, dec!(100))]));
        let err = ReturnCalculator::compute_returns(&input).unwrap_err();
        assert_eq!(
            err,
            SeriesError::MixedTickers {
                expected: "X".to_string(),
                found: "Y".to_string()
            }
        );
    }

    #[test]
    fn test_empty_series() {
        let series = ReturnCalculator::compute_returns(&[]).unwrap();
        assert!(series.returns.is_empty());
    }
}
