//! # Monthly Forecast
//!
//! Monthly seasonal ARIMA forecasts of a single instrument's price.
//!
//! ## Flow
//!
//! - [`fetch`]: daily bars from Yahoo Finance or a raw CSV
//! - [`normalize`]: last trading day of each month, gaps forward-filled
//! - [`models::auto`]: differencing tests plus a stepwise AICc search over
//!   `(p,d,q)(P,D,Q)[m]`
//! - [`forecast`]: point forecasts with normal intervals, joined onto the
//!   last observation
//! - [`persist`] and [`plot`]: CSV files and an SVG chart
//!
//! [`pipeline::Pipeline`] runs all of it for one ticker.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use monthly_forecast::config::PipelineConfig;
//! use monthly_forecast::fetch::YahooFinance;
//! use monthly_forecast::persist::CsvStore;
//! use monthly_forecast::pipeline::Pipeline;
//!
//! let config = PipelineConfig::default();
//! let store = CsvStore::new(&config.data_dir, &config.output_dir);
//! let pipeline = Pipeline::new(config, Box::new(YahooFinance::new()?))
//!     .with_store(Box::new(store));
//!
//! let output = pipeline.run("msft")?;
//! println!("{}", output.table);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod fetch;
pub mod forecast;
pub mod models;
pub mod normalize;
pub mod period;
pub mod persist;
pub mod pipeline;
pub mod plot;

// Re-export commonly used types
pub use crate::config::PipelineConfig;
pub use crate::data::{DailyBar, PriceField, PriceObservation, PriceSeries, RegularSeries};
pub use crate::error::{ForecastError, Result};
pub use crate::forecast::{forecast, ForecastRow, ForecastTable};
pub use crate::models::auto::{select_model, AutoSarima, SearchConfig};
pub use crate::models::sarima::{FittedSarima, Sarima};
pub use crate::models::{ForecastModel, SarimaOrder, TrainedForecastModel};
pub use crate::normalize::normalize;
pub use crate::period::MonthPeriod;
pub use crate::pipeline::{Pipeline, PipelineError, PipelineOutput, Stage};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
