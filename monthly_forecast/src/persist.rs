//! CSV persistence of raw bars, monthly series and forecasts

use crate::data::{DailyBar, RegularSeries};
use crate::error::Result;
use crate::forecast::ForecastTable;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Destination for the artefacts of a run
pub trait ForecastStore: Send + Sync {
    fn store_raw(&self, ticker: &str, bars: &[DailyBar]) -> Result<PathBuf>;

    /// Two columns: `period,value`
    fn store_series(&self, ticker: &str, series: &RegularSeries) -> Result<PathBuf>;

    /// Four columns: `period,point_estimate,lower_bound,upper_bound`
    fn store_forecast(&self, ticker: &str, table: &ForecastTable) -> Result<PathBuf>;
}

#[derive(Debug, Serialize)]
struct MonthlyRecord {
    period: String,
    value: f64,
}

/// Writes `<data_dir>/raw`, `<data_dir>/processed` and `<output_dir>` CSV files
#[derive(Debug, Clone)]
pub struct CsvStore {
    data_dir: PathBuf,
    output_dir: PathBuf,
}

impl CsvStore {
    pub fn new(data_dir: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn raw_path(&self, ticker: &str) -> PathBuf {
        self.data_dir.join("raw").join(format!("{}_raw.csv", ticker))
    }

    pub fn series_path(&self, ticker: &str) -> PathBuf {
        self.data_dir
            .join("processed")
            .join(format!("{}_monthly.csv", ticker))
    }

    pub fn forecast_path(&self, ticker: &str) -> PathBuf {
        self.output_dir.join(format!("{}_forecast.csv", ticker))
    }
}

fn write_records<T, I>(path: PathBuf, records: I) -> Result<PathBuf>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(&path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(path)
}

impl ForecastStore for CsvStore {
    fn store_raw(&self, ticker: &str, bars: &[DailyBar]) -> Result<PathBuf> {
        let path = write_records(self.raw_path(ticker), bars)?;
        info!(path = %path.display(), rows = bars.len(), "Saved raw data");
        Ok(path)
    }

    fn store_series(&self, ticker: &str, series: &RegularSeries) -> Result<PathBuf> {
        let records = series.points().iter().map(|p| MonthlyRecord {
            period: p.period.to_string(),
            value: p.value,
        });
        let path = write_records(self.series_path(ticker), records)?;
        info!(path = %path.display(), rows = series.len(), "Saved processed monthly series");
        Ok(path)
    }

    fn store_forecast(&self, ticker: &str, table: &ForecastTable) -> Result<PathBuf> {
        let path = write_records(self.forecast_path(ticker), table.rows())?;
        info!(path = %path.display(), rows = table.len(), "Saved forecast table");
        Ok(path)
    }
}
