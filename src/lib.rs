//! # Monthly Forecast Workspace
//!
//! Re-exports the workspace crates under one roof:
//!
//! - [`forecast_math`]: differencing, lag polynomials, stationarity tests and
//!   the Nelder-Mead optimiser
//! - [`monthly_forecast`]: price retrieval, monthly normalization, seasonal
//!   ARIMA selection, forecasting and the end-to-end pipeline
//!
//! ## Example
//!
//! ```
//! use monthly_forecast_workspace::monthly_forecast::{forecast, select_model, MonthPeriod, RegularSeries};
//!
//! let start = MonthPeriod::new(2022, 1).unwrap();
//! let series = RegularSeries::from_values(start, &[100.0; 24]);
//! let model = select_model(&series, true, 12).unwrap();
//! let table = forecast(&model, &series, 3, 0.95).unwrap();
//!
//! assert_eq!(table.len(), 4);
//! assert_eq!(table.join_row().unwrap().period, "2023-12");
//! ```

pub use forecast_math;
pub use monthly_forecast;
