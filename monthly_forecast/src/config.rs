//! Run configuration

use crate::data::PriceField;
use crate::error::{ForecastError, Result};
use crate::models::auto::SearchConfig;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2008, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn default_periods() -> usize {
    12
}

fn default_confidence() -> f64 {
    0.95
}

fn default_true() -> bool {
    true
}

fn default_season_length() -> usize {
    12
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

/// Settings for one forecasting run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_start")]
    pub start: NaiveDate,
    /// Last day to fetch; `None` means today
    #[serde(default)]
    pub end: Option<NaiveDate>,
    /// Months to forecast
    #[serde(default = "default_periods")]
    pub periods: usize,
    #[serde(default)]
    pub price_field: PriceField,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default = "default_true")]
    pub seasonal: bool,
    #[serde(default = "default_season_length")]
    pub season_length: usize,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Render the SVG chart
    #[serde(default = "default_true")]
    pub plot: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: None,
            periods: default_periods(),
            price_field: PriceField::default(),
            confidence: default_confidence(),
            seasonal: true,
            season_length: default_season_length(),
            search: SearchConfig::default(),
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            plot: true,
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| ForecastError::Configuration(e.to_string()))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|e| {
            ForecastError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Reject settings that would only fail later, after I/O has happened.
    pub fn validate(&self) -> Result<()> {
        if self.periods == 0 {
            return Err(ForecastError::Configuration(
                "Number of forecast periods must be at least 1".to_string(),
            ));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(ForecastError::Configuration(format!(
                "Confidence must lie strictly between 0 and 1, got {}",
                self.confidence
            )));
        }
        if self.seasonal && self.season_length < 2 {
            return Err(ForecastError::Configuration(format!(
                "Season length must be at least 2, got {}",
                self.season_length
            )));
        }
        if let Some(end) = self.end {
            if end < self.start {
                return Err(ForecastError::Configuration(format!(
                    "End date {} is before start date {}",
                    end, self.start
                )));
            }
        }
        if self.search.max_models == 0 {
            return Err(ForecastError::Configuration(
                "Search must be allowed to fit at least one model".to_string(),
            ));
        }
        Ok(())
    }
}
