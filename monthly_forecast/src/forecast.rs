//! Forecast tables joined onto the observed history

use crate::data::RegularSeries;
use crate::error::{ForecastError, Result};
use crate::models::TrainedForecastModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// One month of the forecast table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    /// Month label, `YYYY-MM`
    pub period: String,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Forecast rows led by the last observed month
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastTable {
    rows: Vec<ForecastRow>,
}

impl ForecastTable {
    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    /// The last historical observation, with collapsed bounds
    pub fn join_row(&self) -> Option<&ForecastRow> {
        self.rows.first()
    }

    /// Rows for future months only
    pub fn future_rows(&self) -> &[ForecastRow] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for ForecastTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<8} {:>14} {:>14} {:>14}",
            "period", "forecast", "lower", "upper"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<8} {:>14.4} {:>14.4} {:>14.4}",
                row.period, row.point_estimate, row.lower_bound, row.upper_bound
            )?;
        }
        Ok(())
    }
}

/// Forecast `periods` months past the end of `series`.
///
/// The first row repeats the last observation with `lower == point == upper`
/// so a chart can draw the forecast line continuing from the history.
///
/// `series` must be the series the model was trained on: the join row and
/// labels come from it, the point forecasts from the model. A model that
/// reports its training values is checked against `series`, and a mismatch
/// fails with `Configuration`.
pub fn forecast<M: TrainedForecastModel>(
    model: &M,
    series: &RegularSeries,
    periods: usize,
    confidence: f64,
) -> Result<ForecastTable> {
    if periods == 0 {
        return Err(ForecastError::Configuration(
            "Number of forecast periods must be at least 1".to_string(),
        ));
    }
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(ForecastError::Configuration(format!(
            "Confidence must lie strictly between 0 and 1, got {}",
            confidence
        )));
    }
    let last = series
        .last()
        .ok_or(ForecastError::InsufficientData { needed: 1, got: 0 })?;

    if let Some(trained_on) = model.training_values() {
        let matches = trained_on.len() == series.len()
            && series
                .points()
                .iter()
                .zip(trained_on)
                .all(|(point, value)| point.value == *value);
        if !matches {
            return Err(ForecastError::Configuration(format!(
                "{} was trained on {} values, not on the {}-month series ending {}",
                model.name(),
                trained_on.len(),
                series.len(),
                last.period
            )));
        }
    }

    let result = model.forecast(periods, confidence)?;

    let mut rows = Vec::with_capacity(periods + 1);
    rows.push(ForecastRow {
        period: last.period.to_string(),
        point_estimate: last.value,
        lower_bound: last.value,
        upper_bound: last.value,
    });
    for (step, (value, (lower, upper))) in result
        .values()
        .iter()
        .zip(result.intervals().iter())
        .enumerate()
    {
        rows.push(ForecastRow {
            period: last.period.plus_months(step as u32 + 1).to_string(),
            point_estimate: *value,
            lower_bound: *lower,
            upper_bound: *upper,
        });
    }

    info!(
        model = model.name(),
        periods,
        confidence,
        first = rows.get(1).map(|r| r.period.as_str()).unwrap_or(""),
        "Forecast complete"
    );

    Ok(ForecastTable { rows })
}
