use chrono::NaiveDate;
use monthly_forecast::data::DailyBar;
use monthly_forecast::fetch::{parse_chart_response, CsvPriceSource, PriceSource};
use monthly_forecast::persist::{CsvStore, ForecastStore};
use monthly_forecast::ForecastError;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn bar(day: NaiveDate, close: f64) -> DailyBar {
    DailyBar {
        date: day,
        open: close - 1.0,
        high: close + 2.0,
        low: close - 2.5,
        close,
        adj_close: close * 0.97,
        volume: 1_250_000,
    }
}

// Three sessions; the middle one has a null close
const CHART_JSON: &str = r#"{
  "chart": {
    "result": [{
      "meta": {"symbol": "MSFT", "gmtoffset": -18000},
      "timestamp": [1704205800, 1704292200, 1704378600],
      "indicators": {
        "quote": [{
          "open":   [373.86, 371.01, 370.67],
          "high":   [375.90, 373.26, 373.10],
          "low":    [366.77, 368.51, 367.15],
          "close":  [370.87, null,   367.94],
          "volume": [25258600, 23083500, 20901500]
        }],
        "adjclose": [{"adjclose": [366.48, null, 363.59]}]
      }
    }],
    "error": null
  }
}"#;

#[test]
fn test_chart_response_skips_incomplete_days() {
    let bars = parse_chart_response("MSFT", CHART_JSON).unwrap();

    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].date, date(2024, 1, 2));
    assert_eq!(bars[0].close, 370.87);
    assert_eq!(bars[0].adj_close, 366.48);
    assert_eq!(bars[0].volume, 25_258_600);
    assert_eq!(bars[1].date, date(2024, 1, 4));
    assert_eq!(bars[1].open, 370.67);
}

#[test]
fn test_missing_adjusted_close_falls_back_to_close() {
    let json = r#"{"chart":{"result":[{"meta":{"gmtoffset":0},"timestamp":[1704153600],
        "indicators":{"quote":[{"open":[10.0],"high":[11.0],"low":[9.5],"close":[10.5],"volume":[100]}]}}],
        "error":null}"#;
    let bars = parse_chart_response("ABC", json).unwrap();

    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0].date, date(2024, 1, 2));
    assert_eq!(bars[0].adj_close, 10.5);
}

#[test]
fn test_empty_chart_is_data_unavailable() {
    let json = r#"{"chart":{"result":[{"meta":{"gmtoffset":0},"timestamp":[],
        "indicators":{"quote":[{}],"adjclose":[{}]}}],"error":null}"#;
    let err = parse_chart_response("ZZZZ", json).unwrap_err();
    assert!(matches!(err, ForecastError::DataUnavailable(_)));
}

#[test]
fn test_other_api_errors_are_fetch_failures() {
    let json = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
    let err = parse_chart_response("MSFT", json).unwrap_err();
    match err {
        ForecastError::Fetch(msg) => assert!(msg.contains("Bad Request")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_raw_csv_round_trip() {
    let dir = tempdir().unwrap();
    let store = CsvStore::new(dir.path().join("data"), dir.path().join("outputs"));
    let bars = vec![
        bar(date(2023, 12, 28), 375.28),
        bar(date(2023, 12, 29), 376.04),
        bar(date(2024, 1, 2), 370.87),
    ];

    let path = store.store_raw("MSFT", &bars).unwrap();
    assert_eq!(path, dir.path().join("data/raw/MSFT_raw.csv"));

    let header = fs::read_to_string(&path).unwrap();
    assert!(header.starts_with("Date,Open,High,Low,Close,Adj Close,Volume\n"));

    let loaded = CsvPriceSource::new(&path).read_all().unwrap();
    assert_eq!(loaded, bars);
}

#[test]
fn test_csv_source_filters_range() {
    let dir = tempdir().unwrap();
    let store = CsvStore::new(dir.path(), dir.path());
    let bars: Vec<DailyBar> = (1..=20).map(|d| bar(date(2024, 3, d), 100.0 + d as f64)).collect();
    let path = store.store_raw("ABC", &bars).unwrap();
    let source = CsvPriceSource::new(path);

    let window = source
        .fetch("ABC", date(2024, 3, 5), Some(date(2024, 3, 9)))
        .unwrap();
    assert_eq!(window.len(), 5);
    assert_eq!(window[0].date, date(2024, 3, 5));
    assert_eq!(window[4].date, date(2024, 3, 9));

    let open_ended = source.fetch("ABC", date(2024, 3, 15), None).unwrap();
    assert_eq!(open_ended.len(), 6);

    let err = source.fetch("ABC", date(2025, 1, 1), None).unwrap_err();
    assert!(matches!(err, ForecastError::DataUnavailable(_)));
}

#[test]
fn test_csv_source_accepts_timestamped_dates() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("export.csv");
    fs::write(
        &path,
        "Date,Open,High,Low,Close,Adj Close,Volume\n\
         2024-01-02 00:00:00-05:00,373.86,375.90,366.77,370.87,366.48,25258600\n\
         2024-01-03 00:00:00-05:00,369.01,373.26,368.51,370.60,366.21,23083500\n",
    )
    .unwrap();

    let bars = CsvPriceSource::new(&path).read_all().unwrap();
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].date, date(2024, 1, 2));
    assert_eq!(bars[1].adj_close, 366.21);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = CsvPriceSource::new(dir.path().join("absent.csv"))
        .read_all()
        .unwrap_err();
    assert!(matches!(err, ForecastError::Io(_)));
}
