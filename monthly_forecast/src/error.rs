//! Error types for the monthly_forecast crate

use forecast_math::MathError;
use thiserror::Error;

/// Custom error types for the monthly_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The price source returned no observations
    #[error("No data available: {0}")]
    DataUnavailable(String),

    /// The series is too short for the requested model
    #[error("Insufficient data: needed at least {needed} periods, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// No candidate model could be fitted
    #[error("Model fitting failed: {0}")]
    ModelFit(String),

    /// Invalid parameter, detected before any I/O
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Duplicate timestamps or unusable prices at the input boundary
    #[error("Invalid observations: {0}")]
    InvalidObservations(String),

    /// Transport or decoding failure while fetching prices
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Csv(err.to_string())
    }
}
