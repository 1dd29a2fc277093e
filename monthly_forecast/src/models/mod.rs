//! Forecasting models for monthly series

use crate::data::RegularSeries;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

pub mod auto;
pub mod sarima;

/// Seasonal ARIMA order `(p,d,q)(P,D,Q)[m]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SarimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_d: usize,
    pub seasonal_q: usize,
    /// Season length; 0 or 1 means no seasonal component
    pub period: usize,
}

impl SarimaOrder {
    /// Non-seasonal `(p,d,q)`
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            seasonal_p: 0,
            seasonal_d: 0,
            seasonal_q: 0,
            period: 0,
        }
    }

    pub fn seasonal(
        p: usize,
        d: usize,
        q: usize,
        seasonal_p: usize,
        seasonal_d: usize,
        seasonal_q: usize,
        period: usize,
    ) -> Self {
        Self {
            p,
            d,
            q,
            seasonal_p,
            seasonal_d,
            seasonal_q,
            period,
        }
    }

    pub fn has_seasonal_terms(&self) -> bool {
        self.period > 1 && (self.seasonal_p + self.seasonal_d + self.seasonal_q) > 0
    }

    /// Number of AR and MA coefficients, seasonal ones included
    pub fn arma_terms(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    /// Effective season length used by the lag operators
    pub(crate) fn lag_period(&self) -> usize {
        if self.period > 1 {
            self.period
        } else {
            0
        }
    }
}

impl fmt::Display for SarimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.period > 1 {
            write!(
                f,
                "SARIMA({},{},{})({},{},{})[{}]",
                self.p,
                self.d,
                self.q,
                self.seasonal_p,
                self.seasonal_d,
                self.seasonal_q,
                self.period
            )
        } else {
            write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
        }
    }
}

/// Score of one candidate evaluated during order selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    pub order: SarimaOrder,
    /// `None` when the candidate failed to fit or was ineligible
    pub aicc: Option<f64>,
}

/// Forecast result containing predicted values and intervals
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    values: Vec<f64>,
    intervals: Vec<(f64, f64)>,
}

impl ForecastResult {
    /// Create a new forecast result with confidence intervals
    pub fn new_with_intervals(values: Vec<f64>, intervals: Vec<(f64, f64)>) -> Result<Self> {
        if values.len() != intervals.len() {
            return Err(ForecastError::ModelFit(format!(
                "Values length ({}) doesn't match intervals length ({})",
                values.len(),
                intervals.len()
            )));
        }
        Ok(Self { values, intervals })
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Lower and upper bound for each forecasted value
    pub fn intervals(&self) -> &[(f64, f64)] {
        &self.intervals
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.values.len()
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Forecast `horizons` future periods with two-sided `confidence` intervals
    fn forecast(&self, horizons: usize, confidence: f64) -> Result<ForecastResult>;

    /// Name of the model
    fn name(&self) -> &str;

    /// Levels the model was trained on, when it keeps them
    fn training_values(&self) -> Option<&[f64]> {
        None
    }
}

/// Forecast model that can be trained on a monthly series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on a monthly series
    fn train(&self, data: &RegularSeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}
