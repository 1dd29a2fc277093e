//! # Forecast Math
//!
//! Numeric kernels behind seasonal ARIMA estimation and forecasting.
//! Nothing in this crate knows about dates, files or prices; every function
//! works on plain `f64` slices so it can be tested in isolation.
//!
//! - [`differencing`]: ordinary and seasonal differencing, lag-polynomial
//!   filtering and integration back to levels
//! - [`polynomial`]: lag-polynomial products, stationarity/invertibility
//!   checks and MA(∞) psi weights
//! - [`stationarity`]: KPSS level test and seasonal strength, used to pick
//!   differencing orders
//! - [`optimization`]: Nelder-Mead simplex minimiser
//! - [`stats`]: descriptive statistics and normal quantiles

use thiserror::Error;

pub mod differencing;
pub mod optimization;
pub mod polynomial;
pub mod stationarity;
pub mod stats;

/// Errors that can occur in forecasting math
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;
