//! Sentiment/Return Report - batch correlation of news sentiment with daily returns
//!
//! Reads a scored news export and a daily price export, aligns the news to
//! each ticker's trading days and writes per-ticker correlation statistics.
//!
//! # Usage
//! ```sh
//! cargo run --bin sentiment_report -- --news news.csv --prices prices.csv
//! ```
//!
//! # Environment Variables
//! - `ALIGN_MAX_LOOKAHEAD_DAYS` - Days searched forward for the next session (default: 7)
//! - `ALIGN_MAX_LOOKBACK_DAYS` - Days searched backward when no later session exists (default: 7)
//! - `REFERENCE_UTC_OFFSET_MINUTES` - Reference timezone as a UTC offset (default: 0)
//! - `CORRELATION_MIN_SAMPLES` - Merged records required per ticker (default: 5)
//! - `CORRELATION_SIGNIFICANCE_LEVEL` - Alpha for the significance flag (default: 0.05)
//! - `TICKERS` - Optional comma-separated ticker allow-list

use anyhow::{Context, Result};
use clap::Parser;
use sentiment_returns::application::pipeline::SentimentReturnPipeline;
use sentiment_returns::config::EngineConfig;
use sentiment_returns::infrastructure::CsvStore;
use std::path::PathBuf;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Sentiment vs. return correlation report", long_about = None)]
struct Cli {
    /// News CSV (ticker,timestamp,text,sentiment_score)
    #[arg(short, long)]
    news: PathBuf,

    /// Price CSV (ticker,date,open,high,low,close,volume)
    #[arg(short, long)]
    prices: PathBuf,

    /// Directory for merged.csv, correlations.csv and report.json
    #[arg(short, long, default_value = "reports")]
    output_dir: PathBuf,

    /// Comma-separated tickers; overrides TICKERS
    #[arg(short, long)]
    tickers: Option<String>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::from_env()?;
    if let Some(list) = cli.tickers.as_deref() {
        config = config.with_tickers(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty()),
        );
    }
    info!(
        "Configuration loaded: lookahead={}d, lookback={}d, min_samples={}, alpha={}, tickers={:?}",
        config.alignment.max_lookahead_days,
        config.alignment.max_lookback_days,
        config.correlation.min_samples,
        config.correlation.significance_level,
        config.tickers
    );

    let pipeline = SentimentReturnPipeline::new(config).context("Invalid engine configuration")?;

    let news = CsvStore::read_news(&cli.news)?;
    let prices = CsvStore::read_prices(&cli.prices, &pipeline.normalizer())?;
    if news.rejected + prices.rejected > 0 {
        warn!(
            "Skipped {} news rows and {} price rows that could not be read",
            news.rejected, prices.rejected
        );
    }

    let mut report = pipeline.run(&news.rows, &prices.rows);
    report.record_unreadable_rows(news.rejected, prices.rejected);

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(r) => info!(
                "{:<8} r={:+.4} p={:.4} rho={:+.4} n={} [{}]{}",
                r.ticker,
                r.pearson_r,
                r.pearson_p,
                r.spearman_r,
                r.n_observations,
                r.strength_label,
                if r.significant { " *" } else { "" }
            ),
            Err(e) => info!("{:<8} N/A ({})", outcome.ticker, e),
        }
    }

    let store = CsvStore::new(&cli.output_dir)?;
    store.save_report(&report)?;

    Ok(())
}
