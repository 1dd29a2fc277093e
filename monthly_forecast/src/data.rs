//! Price data types
//!
//! Daily bars come in from a [`PriceSource`](crate::fetch::PriceSource), a
//! [`PriceField`] turns them into a validated [`PriceSeries`], and the
//! normalizer turns that into a gap-free [`RegularSeries`] of months.

use crate::error::{ForecastError, Result};
use crate::period::MonthPeriod;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// One trading day of OHLCV data, in the raw CSV layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    #[serde(rename = "Date", deserialize_with = "deserialize_trading_date")]
    pub date: NaiveDate,
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Adj Close")]
    pub adj_close: f64,
    #[serde(rename = "Volume")]
    pub volume: u64,
}

impl DailyBar {
    /// Value of the requested price column
    pub fn price(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::AdjClose => self.adj_close,
        }
    }
}

/// Accepts `2024-01-02` as well as timestamped exports like `2024-01-02 00:00:00-05:00`.
fn deserialize_trading_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let day = raw.trim().get(..10).unwrap_or(raw.trim());
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(serde::de::Error::custom)
}

/// Which column of a daily bar becomes the observed price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
    AdjClose,
}

impl PriceField {
    /// Column header as written in the raw CSV
    pub fn column_name(&self) -> &'static str {
        match self {
            PriceField::Open => "Open",
            PriceField::High => "High",
            PriceField::Low => "Low",
            PriceField::Close => "Close",
            PriceField::AdjClose => "Adj Close",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for PriceField {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            "close" => Ok(PriceField::Close),
            "adjclose" => Ok(PriceField::AdjClose),
            _ => Err(ForecastError::Configuration(format!(
                "Unknown price column '{}', expected one of Open, High, Low, Close, Adj Close",
                s
            ))),
        }
    }
}

impl TryFrom<String> for PriceField {
    type Error = ForecastError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PriceField> for String {
    fn from(field: PriceField) -> Self {
        field.column_name().to_string()
    }
}

/// A single dated price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceObservation {
    pub timestamp: NaiveDate,
    pub price: f64,
}

impl PriceObservation {
    pub fn new(timestamp: NaiveDate, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Observations sorted by timestamp, unique per day, finite and non-negative
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    observations: Vec<PriceObservation>,
}

impl PriceSeries {
    /// Validate and sort observations.
    pub fn new(mut observations: Vec<PriceObservation>) -> Result<Self> {
        if let Some(bad) = observations
            .iter()
            .find(|o| !o.price.is_finite() || o.price < 0.0)
        {
            return Err(ForecastError::InvalidObservations(format!(
                "Price {} on {} is not a finite non-negative number",
                bad.price, bad.timestamp
            )));
        }

        observations.sort_by_key(|o| o.timestamp);

        if let Some(pair) = observations
            .windows(2)
            .find(|pair| pair[0].timestamp == pair[1].timestamp)
        {
            return Err(ForecastError::InvalidObservations(format!(
                "Duplicate observation for {}",
                pair[0].timestamp
            )));
        }

        Ok(Self { observations })
    }

    /// Extract one price column from daily bars.
    pub fn from_bars(bars: &[DailyBar], field: PriceField) -> Result<Self> {
        Self::new(
            bars.iter()
                .map(|bar| PriceObservation::new(bar.date, bar.price(field)))
                .collect(),
        )
    }

    pub fn observations(&self) -> &[PriceObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// One month of a regular series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyPoint {
    pub period: MonthPeriod,
    pub value: f64,
}

/// Gap-free monthly series in chronological order
#[derive(Debug, Clone, PartialEq)]
pub struct RegularSeries {
    points: Vec<MonthlyPoint>,
}

impl RegularSeries {
    /// Build from points that already cover consecutive months.
    pub fn from_points(points: Vec<MonthlyPoint>) -> Result<Self> {
        if let Some(pair) = points
            .windows(2)
            .find(|pair| pair[0].period.succ() != pair[1].period)
        {
            return Err(ForecastError::InvalidObservations(format!(
                "Monthly series jumps from {} to {}",
                pair[0].period, pair[1].period
            )));
        }
        Ok(Self { points })
    }

    /// Consecutive months starting at `first`.
    pub fn from_values(first: MonthPeriod, values: &[f64]) -> Self {
        let mut period = first;
        let points = values
            .iter()
            .map(|&value| {
                let point = MonthlyPoint { period, value };
                period = period.succ();
                point
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[MonthlyPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn first(&self) -> Option<&MonthlyPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&MonthlyPoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[rstest]
    #[case("Close", PriceField::Close)]
    #[case("close", PriceField::Close)]
    #[case("Adj Close", PriceField::AdjClose)]
    #[case("adj_close", PriceField::AdjClose)]
    #[case("OPEN", PriceField::Open)]
    fn parses_price_fields(#[case] raw: &str, #[case] expected: PriceField) {
        assert_eq!(raw.parse::<PriceField>().unwrap(), expected);
    }

    #[test]
    fn unknown_price_field_is_configuration_error() {
        let err = "Median".parse::<PriceField>().unwrap_err();
        assert!(matches!(err, ForecastError::Configuration(_)));
    }

    #[test]
    fn price_series_sorts_observations() {
        let series = PriceSeries::new(vec![
            PriceObservation::new(day(3), 3.0),
            PriceObservation::new(day(1), 1.0),
            PriceObservation::new(day(2), 2.0),
        ])
        .unwrap();
        let prices: Vec<f64> = series.observations().iter().map(|o| o.price).collect();
        assert_eq!(prices, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn price_series_rejects_duplicates() {
        let err = PriceSeries::new(vec![
            PriceObservation::new(day(2), 1.0),
            PriceObservation::new(day(2), 1.5),
        ])
        .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidObservations(_)));
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(-1.0)]
    fn price_series_rejects_bad_prices(#[case] price: f64) {
        let err = PriceSeries::new(vec![PriceObservation::new(day(1), price)]).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidObservations(_)));
    }

    #[test]
    fn regular_series_rejects_gaps() {
        let jan = MonthPeriod::new(2024, 1).unwrap();
        let mar = MonthPeriod::new(2024, 3).unwrap();
        let err = RegularSeries::from_points(vec![
            MonthlyPoint { period: jan, value: 1.0 },
            MonthlyPoint { period: mar, value: 2.0 },
        ])
        .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidObservations(_)));
    }

    #[test]
    fn regular_series_from_values_is_consecutive() {
        let series = RegularSeries::from_values(MonthPeriod::new(2023, 11).unwrap(), &[1.0, 2.0, 3.0]);
        let labels: Vec<String> = series.points().iter().map(|p| p.period.to_string()).collect();
        assert_eq!(labels, vec!["2023-11", "2023-12", "2024-01"]);
    }
}
