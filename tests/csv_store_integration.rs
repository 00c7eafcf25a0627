use sentiment_returns::application::pipeline::SentimentReturnPipeline;
use sentiment_returns::config::EngineConfig;
use sentiment_returns::infrastructure::csv_store::{
    CORRELATIONS_FILE, MERGED_FILE, REPORT_FILE,
};
use sentiment_returns::infrastructure::CsvStore;
use std::fs;
use tempfile::TempDir;

const NEWS: &str = "\
ticker,timestamp,text,sentiment_score
AAPL,2024-01-03 14:00:00,Beat on services,0.5
AAPL,2024-01-04 14:00:00,Supplier warning,-0.3
AAPL,2024-01-05 14:00:00,Record launch,0.6
AAPL,2024-01-06 10:00:00,Weekend rumor,-0.5
AAPL,2024-01-09 14:00:00,Upgrade,0.8
AAPL,2024-01-10 14:00:00,Steady demand,0.4
AAPL,2024-01-11 14:00:00,Minor recall,-0.2
MSFT,2024-01-08 14:00:00,Partnership,0.3
MSFT,someday,Broken timestamp,0.1
MSFT,2024-01-09 14:00:00,Vague outlook,strong
";

const PRICES: &str = "\
ticker,date,open,high,low,close,volume
AAPL,2024-01-02,100,100,100,100.0,1000
AAPL,2024-01-03,100,101,100,101.0,1000
AAPL,2024-01-04,101,101,100,100.5,1000
AAPL,2024-01-05,100,102,100,102.0,1000
AAPL,2024-01-08,102,102,101,101.0,1000
AAPL,2024-01-09,101,103,101,103.0,1000
AAPL,2024-01-10,103,104,103,104.0,1000
AAPL,2024-01-11,104,104,103,103.5,1000
MSFT,2024-01-05,370,371,369,370.0,500
MSFT,2024-01-08,370,376,369,375.0,500
MSFT,2024-01-09,x,376,369,375.0,500
";

#[test]
fn test_csv_files_round_trip_through_pipeline() {
    let dir = TempDir::new().unwrap();
    let news_path = dir.path().join("news.csv");
    let prices_path = dir.path().join("prices.csv");
    fs::write(&news_path, NEWS).unwrap();
    fs::write(&prices_path, PRICES).unwrap();

    let pipeline = SentimentReturnPipeline::new(EngineConfig::default()).unwrap();
    let news = CsvStore::read_news(&news_path).unwrap();
    let prices = CsvStore::read_prices(&prices_path, &pipeline.normalizer()).unwrap();
    assert_eq!(news.rows.len(), 9);
    assert_eq!(news.rejected, 1);
    assert_eq!(prices.rows.len(), 10);
    assert_eq!(prices.rejected, 1);

    let mut report = pipeline.run(&news.rows, &prices.rows);
    report.record_unreadable_rows(news.rejected, prices.rejected);
    assert_eq!(report.quality.news_unreadable, 1);
    assert_eq!(report.quality.bars_unreadable, 1);
    assert_eq!(report.quality.unparseable_timestamps, 1);
    assert_eq!(report.quality.shifted_to_other_day, 1);

    let out_dir = dir.path().join("out");
    let store = CsvStore::new(&out_dir).unwrap();
    store.save_report(&report).unwrap();

    let merged = fs::read_to_string(out_dir.join(MERGED_FILE)).unwrap();
    let mut lines = merged.lines();
    assert_eq!(
        lines.next(),
        Some("ticker,trading_day,sentiment,daily_return,item_count")
    );
    assert_eq!(lines.count(), report.merged_records.len());

    let mut rdr = csv::Reader::from_path(out_dir.join(CORRELATIONS_FILE)).unwrap();
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "AAPL");
    assert_ne!(&rows[0][1], "N/A");
    assert_eq!(&rows[1][0], "MSFT");
    assert_eq!(&rows[1][1], "N/A");
    assert!(rows[1][11].starts_with("insufficient_data"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join(REPORT_FILE)).unwrap()).unwrap();
    assert_eq!(json["summary"]["tickers_total"], 2);
    assert_eq!(json["summary"]["tickers_analyzed"], 1);
    assert_eq!(json["quality"]["unparseable_timestamps"], 1);
    assert_eq!(json["quality"]["news_unreadable"], 1);
    assert_eq!(json["quality"]["bars_unreadable"], 1);
    assert!(json["outcomes"][1]["result"]["Err"].is_object());
}

#[test]
fn test_missing_input_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = CsvStore::read_news(&dir.path().join("absent.csv")).unwrap_err();
    assert!(err.to_string().contains("Failed to open news file"));
}
