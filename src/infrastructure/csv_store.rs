//! CSV source and sink for the sentiment/return engine.
//!
//! Reads news and price exports into canonical `NewsItem` / `PriceBar` rows
//! and writes the merged table, per-ticker correlations and the full JSON
//! report into an output directory. Rows that cannot be conformed are
//! counted and skipped, never patched.

use crate::application::pipeline::PipelineReport;
use crate::application::time_normalizer::TimeNormalizer;
use crate::domain::correlation::TickerOutcome;
use crate::domain::errors::ParseError;
use crate::domain::market::types::{NewsItem, PriceBar};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

pub const MERGED_FILE: &str = "merged.csv";
pub const CORRELATIONS_FILE: &str = "correlations.csv";
pub const REPORT_FILE: &str = "report.json";

const NOT_AVAILABLE: &str = "N/A";

/// Rows read from a source file plus the number that could not be conformed.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRows<T> {
    pub rows: Vec<T>,
    pub rejected: usize,
}

#[derive(Debug, Deserialize)]
struct NewsRow {
    ticker: String,
    timestamp: String,
    #[serde(default)]
    text: String,
    sentiment_score: String,
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    ticker: String,
    date: String,
    open: String,
    high: String,
    low: String,
    close: String,
    #[serde(default)]
    volume: String,
}

/// One line of `correlations.csv`. Failed tickers carry `N/A` statistics.
#[derive(Debug, Serialize)]
struct CorrelationRow {
    ticker: String,
    pearson_r: String,
    pearson_p: String,
    spearman_r: String,
    spearman_p: String,
    lagged_r: String,
    lagged_p: String,
    r_squared: String,
    n_observations: String,
    strength: String,
    significant: String,
    failure: String,
}

impl From<&TickerOutcome> for CorrelationRow {
    fn from(outcome: &TickerOutcome) -> Self {
        let na = || NOT_AVAILABLE.to_string();
        let opt = |v: Option<f64>| v.map(|x| format!("{:.6}", x)).unwrap_or_else(na);

        match &outcome.result {
            Ok(r) => Self {
                ticker: r.ticker.clone(),
                pearson_r: format!("{:.6}", r.pearson_r),
                pearson_p: format!("{:.6}", r.pearson_p),
                spearman_r: format!("{:.6}", r.spearman_r),
                spearman_p: format!("{:.6}", r.spearman_p),
                lagged_r: opt(r.lagged_r),
                lagged_p: opt(r.lagged_p),
                r_squared: format!("{:.6}", r.r_squared),
                n_observations: r.n_observations.to_string(),
                strength: r.strength_label.to_string(),
                significant: r.significant.to_string(),
                failure: String::new(),
            },
            Err(e) => Self {
                ticker: outcome.ticker.clone(),
                pearson_r: na(),
                pearson_p: na(),
                spearman_r: na(),
                spearman_p: na(),
                lagged_r: na(),
                lagged_p: na(),
                r_squared: na(),
                n_observations: na(),
                strength: na(),
                significant: na(),
                failure: format!("{}: {}", e.kind(), e),
            },
        }
    }
}

/// Writes report artifacts into one output directory.
pub struct CsvStore {
    output_dir: PathBuf,
}

impl CsvStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        if !output_dir.exists() {
            fs::create_dir_all(&output_dir).with_context(|| {
                format!("Failed to create output directory {:?}", output_dir)
            })?;
        }
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn read_news(path: &Path) -> Result<LoadedRows<NewsItem>> {
        let file =
            File::open(path).with_context(|| format!("Failed to open news file {:?}", path))?;
        let loaded = Self::read_news_from(BufReader::new(file))?;
        info!(
            "Loaded {} news items from {:?} ({} rejected)",
            loaded.rows.len(),
            path,
            loaded.rejected
        );
        Ok(loaded)
    }

    /// Reads `ticker,timestamp,text,sentiment_score` rows. Timestamps are kept
    /// raw; normalizing them is the engine's job.
    pub fn read_news_from<R: Read>(reader: R) -> Result<LoadedRows<NewsItem>> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut loaded = LoadedRows {
            rows: Vec::new(),
            rejected: 0,
        };

        for (line, result) in rdr.deserialize::<NewsRow>().enumerate() {
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    warn!("Skipping news row {}: {}", line + 1, e);
                    loaded.rejected += 1;
                    continue;
                }
            };

            match parse_number::<f64>("sentiment_score", &row.sentiment_score) {
                Ok(score) => loaded.rows.push(
                    NewsItem::new(row.ticker.trim(), &row.timestamp, score).with_text(&row.text),
                ),
                Err(e) => {
                    warn!("Skipping news row {}: {}", line + 1, e);
                    loaded.rejected += 1;
                }
            }
        }

        Ok(loaded)
    }

    pub fn read_prices(path: &Path, normalizer: &TimeNormalizer) -> Result<LoadedRows<PriceBar>> {
        let file =
            File::open(path).with_context(|| format!("Failed to open price file {:?}", path))?;
        let loaded = Self::read_prices_from(BufReader::new(file), normalizer)?;
        info!(
            "Loaded {} price bars from {:?} ({} rejected)",
            loaded.rows.len(),
            path,
            loaded.rejected
        );
        Ok(loaded)
    }

    /// Reads `ticker,date,open,high,low,close,volume` rows, in file order.
    pub fn read_prices_from<R: Read>(
        reader: R,
        normalizer: &TimeNormalizer,
    ) -> Result<LoadedRows<PriceBar>> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut loaded = LoadedRows {
            rows: Vec::new(),
            rejected: 0,
        };

        for (line, result) in rdr.deserialize::<PriceRow>().enumerate() {
            let bar = result
                .map_err(anyhow::Error::from)
                .and_then(|row| Self::conform_price_row(row, normalizer).map_err(Into::into));
            match bar {
                Ok(bar) => loaded.rows.push(bar),
                Err(e) => {
                    warn!("Skipping price row {}: {}", line + 1, e);
                    loaded.rejected += 1;
                }
            }
        }

        Ok(loaded)
    }

    fn conform_price_row(
        row: PriceRow,
        normalizer: &TimeNormalizer,
    ) -> Result<PriceBar, ParseError> {
        let volume = if row.volume.trim().is_empty() {
            0
        } else {
            parse_number::<u64>("volume", &row.volume)?
        };

        Ok(PriceBar {
            ticker: row.ticker.trim().to_string(),
            date: normalizer.normalize(&row.date)?,
            open: parse_number::<Decimal>("open", &row.open)?,
            high: parse_number::<Decimal>("high", &row.high)?,
            low: parse_number::<Decimal>("low", &row.low)?,
            close: parse_number::<Decimal>("close", &row.close)?,
            volume,
        })
    }

    /// Writes `merged.csv`, `correlations.csv` and `report.json`.
    pub fn save_report(&self, report: &PipelineReport) -> Result<()> {
        let merged_path = self.output_dir.join(MERGED_FILE);
        let mut wtr = csv::Writer::from_path(&merged_path)
            .with_context(|| format!("Failed to create {:?}", merged_path))?;
        for record in &report.merged_records {
            wtr.serialize(record)
                .context("Failed to serialize merged record")?;
        }
        wtr.flush().context("Failed to flush merged records")?;

        let correlations_path = self.output_dir.join(CORRELATIONS_FILE);
        let mut wtr = csv::Writer::from_path(&correlations_path)
            .with_context(|| format!("Failed to create {:?}", correlations_path))?;
        for outcome in &report.outcomes {
            wtr.serialize(CorrelationRow::from(outcome))
                .context("Failed to serialize correlation row")?;
        }
        wtr.flush().context("Failed to flush correlation rows")?;

        let content =
            serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        let report_path = self.output_dir.join(REPORT_FILE);
        let temp_path = report_path.with_extension("tmp");
        fs::write(&temp_path, content).context("Failed to write temp report file")?;
        fs::rename(&temp_path, &report_path).context("Failed to rename temp report file")?;

        info!(
            "Saved {} merged records and {} ticker results to {:?}",
            report.merged_records.len(),
            report.outcomes.len(),
            self.output_dir
        );
        Ok(())
    }
}

fn parse_number<T: FromStr>(field: &'static str, raw: &str) -> Result<T, ParseError> {
    raw.trim().parse::<T>().map_err(|_| ParseError::Number {
        field: field.to_string(),
        input: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_read_news_counts_bad_scores() {
        let data = "\
ticker,timestamp,text,sentiment_score
AAPL,2024-01-06T10:00:00Z,Upgrade,0.4
AAPL,2024-01-08,\"Guidance, cut\",-0.2
AAPL,2024-01-08,No score,
MSFT,2024-01-08,Bad score,strong
";
        let loaded = CsvStore::read_news_from(data.as_bytes()).unwrap();
        assert_eq!(loaded.rows.len(), 2);
        assert_eq!(loaded.rejected, 2);
        assert_eq!(loaded.rows[1].text, "Guidance, cut");
        assert_eq!(loaded.rows[0].timestamp, "2024-01-06T10:00:00Z");
    }

    #[test]
    fn test_read_prices_normalizes_dates() {
        let data = "\
ticker,date,open,high,low,close,volume
AAPL,2024-01-05,184.35,186.40,183.92,185.85,1000
AAPL,2024-01-08 00:00:00,182.09,185.60,181.50,185.56,
AAPL,not-a-date,1,1,1,1,1
AAPL,2024-01-09,abc,1,1,1,1
";
        let loaded = CsvStore::read_prices_from(data.as_bytes(), &TimeNormalizer::utc()).unwrap();
        assert_eq!(loaded.rows.len(), 2);
        assert_eq!(loaded.rejected, 2);
        assert_eq!(loaded.rows[0].close, dec!(185.85));
        assert_eq!(loaded.rows[1].date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert_eq!(loaded.rows[1].volume, 0);
    }

    #[test]
    fn test_parse_number_error_names_field() {
        let err = parse_number::<Decimal>("close", "n/a").unwrap_err();
        assert_eq!(
            err,
            ParseError::Number {
                field: "close".to_string(),
                input: "n/a".to_string()
            }
        );
    }
}
