//! Daily price sources
//!
//! [`YahooFinance`] downloads bars from the public chart endpoint;
//! [`CsvPriceSource`] replays a raw CSV written by a previous run.

use crate::data::DailyBar;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Supplies daily bars for a ticker over `[start, end]`
///
/// Implementations must fail with `DataUnavailable` instead of returning an
/// empty vector.
pub trait PriceSource: Send + Sync {
    fn fetch(&self, ticker: &str, start: NaiveDate, end: Option<NaiveDate>)
        -> Result<Vec<DailyBar>>;
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteColumns>,
    adjclose: Option<Vec<AdjCloseColumn>>,
}

#[derive(Debug, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseColumn {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Decode a chart endpoint response into daily bars.
///
/// Days with any missing OHLC or volume field are skipped. A missing adjusted
/// close falls back to the close.
pub fn parse_chart_response(ticker: &str, json: &str) -> Result<Vec<DailyBar>> {
    let response: ChartResponse = serde_json::from_str(json)
        .map_err(|e| ForecastError::Fetch(format!("Malformed response for {}: {}", ticker, e)))?;

    if let Some(error) = response.chart.error {
        if error.code.eq_ignore_ascii_case("Not Found") {
            return Err(ForecastError::DataUnavailable(format!(
                "No data returned for ticker {}: {}",
                ticker, error.description
            )));
        }
        return Err(ForecastError::Fetch(format!(
            "API error [{}]: {}",
            error.code, error.description
        )));
    }

    let no_data = || ForecastError::DataUnavailable(format!("No data returned for ticker {}", ticker));
    let results = response.chart.result.ok_or_else(no_data)?;
    let data = results.first().ok_or_else(no_data)?;
    let quote = data.indicators.quote.first().ok_or_else(no_data)?;
    let adj_close = data.indicators.adjclose.as_ref().and_then(|a| a.first());
    let offset = data.meta.as_ref().map_or(0, |m| m.gmtoffset);

    let mut bars = Vec::with_capacity(data.timestamp.len());
    let mut skipped = 0usize;
    for (i, &timestamp) in data.timestamp.iter().enumerate() {
        let field = |column: &Vec<Option<f64>>| column.get(i).copied().flatten();
        let fields = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
            quote.volume.get(i).copied().flatten(),
            DateTime::<Utc>::from_timestamp(timestamp + offset, 0),
        );
        match fields {
            (Some(open), Some(high), Some(low), Some(close), Some(volume), Some(moment)) => {
                bars.push(DailyBar {
                    date: moment.date_naive(),
                    open,
                    high,
                    low,
                    close,
                    adj_close: adj_close
                        .and_then(|a| a.adjclose.get(i).copied().flatten())
                        .unwrap_or(close),
                    volume,
                });
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(ticker, skipped, "Skipped incomplete daily bars");
    }
    if bars.is_empty() {
        return Err(no_data());
    }
    Ok(bars)
}

/// Yahoo Finance chart endpoint client
#[derive(Debug, Clone)]
pub struct YahooFinance {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl YahooFinance {
    pub fn new() -> Result<Self> {
        Self::with_base_url("https://query1.finance.yahoo.com/v8/finance/chart")
    }

    /// Point the client at another host serving the same endpoint layout.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| ForecastError::Fetch(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn build_url(&self, ticker: &str, start: NaiveDate, end: Option<NaiveDate>) -> String {
        let period1 = unix_midnight(start);
        let period2 = end
            .and_then(|e| e.succ_opt())
            .map(unix_midnight)
            .unwrap_or_else(|| Utc::now().timestamp());
        format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url, ticker, period1, period2
        )
    }
}

fn unix_midnight(date: NaiveDate) -> i64 {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)).timestamp()
}

impl PriceSource for YahooFinance {
    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<Vec<DailyBar>> {
        let url = self.build_url(ticker, start, end);
        debug!(%url, "Requesting daily bars");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ForecastError::Fetch(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ForecastError::Fetch(e.to_string()))?;

        // Error statuses still carry a chart body describing the failure.
        let bars = parse_chart_response(ticker, &body).map_err(|err| match err {
            ForecastError::Fetch(msg) if !status.is_success() => {
                ForecastError::Fetch(format!("HTTP {}: {}", status, msg))
            }
            other => other,
        })?;

        info!(ticker, bars = bars.len(), "Downloaded daily bars");
        Ok(bars)
    }
}

/// Reads bars from a CSV in the `Date,Open,High,Low,Close,Adj Close,Volume` layout
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load every bar in the file
    pub fn read_all(&self) -> Result<Vec<DailyBar>> {
        let file = File::open(&self.path)?;
        let mut reader = csv::Reader::from_reader(file);
        let mut bars = Vec::new();
        for record in reader.deserialize() {
            bars.push(record?);
        }
        Ok(bars)
    }
}

impl PriceSource for CsvPriceSource {
    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<Vec<DailyBar>> {
        let bars: Vec<DailyBar> = self
            .read_all()?
            .into_iter()
            .filter(|bar| bar.date >= start && end.map_or(true, |e| bar.date <= e))
            .collect();

        if bars.is_empty() {
            return Err(ForecastError::DataUnavailable(format!(
                "{} has no bars for {} from {}",
                self.path.display(),
                ticker,
                start
            )));
        }

        info!(ticker, bars = bars.len(), path = %self.path.display(), "Loaded daily bars");
        Ok(bars)
    }
}
