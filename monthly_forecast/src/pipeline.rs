//! End-to-end run: fetch, normalize, select, forecast, persist, render

use crate::config::PipelineConfig;
use crate::data::{PriceField, PriceSeries, RegularSeries};
use crate::error::ForecastError;
use crate::fetch::PriceSource;
use crate::forecast::{forecast, ForecastTable};
use crate::models::auto::AutoSarima;
use crate::models::SarimaOrder;
use crate::normalize::normalize;
use crate::persist::ForecastStore;
use crate::plot::ChartRenderer;
use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

/// Step of the run that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configure,
    Fetch,
    Normalize,
    Select,
    Forecast,
    Persist,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configure => "configure",
            Stage::Fetch => "fetch",
            Stage::Normalize => "normalize",
            Stage::Select => "select",
            Stage::Forecast => "forecast",
            Stage::Persist => "persist",
            Stage::Render => "render",
        };
        f.write_str(name)
    }
}

/// First failure of a run, tagged with its stage
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: ForecastError,
}

impl PipelineError {
    fn at(stage: Stage) -> impl FnOnce(ForecastError) -> PipelineError {
        move |source| PipelineError { stage, source }
    }
}

/// What the selector settled on
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub order: SarimaOrder,
    pub aicc: f64,
    pub sigma2: f64,
    pub candidates: usize,
}

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub ticker: String,
    pub raw_bars: usize,
    pub series: RegularSeries,
    pub model: ModelSummary,
    pub table: ForecastTable,
    /// Files written by the store and chart renderer, in order
    pub written: Vec<PathBuf>,
}

/// Sequences the collaborators around the forecasting core
pub struct Pipeline {
    config: PipelineConfig,
    source: Box<dyn PriceSource>,
    store: Option<Box<dyn ForecastStore>>,
    chart: Option<Box<dyn ChartRenderer>>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, source: Box<dyn PriceSource>) -> Self {
        Self {
            config,
            source,
            store: None,
            chart: None,
        }
    }

    pub fn with_store(mut self, store: Box<dyn ForecastStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_chart(mut self, chart: Box<dyn ChartRenderer>) -> Self {
        self.chart = Some(chart);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage for one ticker, stopping at the first failure.
    pub fn run(&self, ticker: &str) -> Result<PipelineOutput, PipelineError> {
        let result = self.run_stages(ticker);
        if let Err(err) = &result {
            error!(stage = %err.stage, error = %err.source, "Forecast run failed");
        }
        result
    }

    fn run_stages(&self, ticker: &str) -> Result<PipelineOutput, PipelineError> {
        let config = &self.config;
        config.validate().map_err(PipelineError::at(Stage::Configure))?;

        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(PipelineError::at(Stage::Configure)(
                ForecastError::Configuration("Ticker must not be empty".to_string()),
            ));
        }
        info!(%ticker, start = %config.start, periods = config.periods, "Running monthly forecast");

        let bars = self
            .source
            .fetch(&ticker, config.start, config.end)
            .map_err(PipelineError::at(Stage::Fetch))?;
        if bars.is_empty() {
            return Err(PipelineError::at(Stage::Fetch)(
                ForecastError::DataUnavailable(format!("No data returned for ticker {}", ticker)),
            ));
        }

        let mut written = Vec::new();
        if let Some(store) = &self.store {
            written.push(
                store
                    .store_raw(&ticker, &bars)
                    .map_err(PipelineError::at(Stage::Persist))?,
            );
        }

        let series = PriceSeries::from_bars(&bars, config.price_field)
            .and_then(|prices| normalize(&prices))
            .map_err(PipelineError::at(Stage::Normalize))?;
        if let Some(store) = &self.store {
            written.push(
                store
                    .store_series(&ticker, &series)
                    .map_err(PipelineError::at(Stage::Persist))?,
            );
        }

        let model = AutoSarima::new(config.seasonal, config.season_length)
            .with_search(config.search.clone())
            .select(&series)
            .map_err(PipelineError::at(Stage::Select))?;

        let table = forecast(&model, &series, config.periods, config.confidence)
            .map_err(PipelineError::at(Stage::Forecast))?;

        if let Some(store) = &self.store {
            written.push(
                store
                    .store_forecast(&ticker, &table)
                    .map_err(PipelineError::at(Stage::Persist))?,
            );
        }
        if config.plot {
            if let Some(chart) = &self.chart {
                written.push(
                    chart
                        .render(&ticker, &series, &table)
                        .map_err(PipelineError::at(Stage::Render))?,
                );
            }
        }

        info!(%ticker, model = %model.order(), files = written.len(), "Forecast run complete");

        Ok(PipelineOutput {
            ticker,
            raw_bars: bars.len(),
            series,
            model: ModelSummary {
                order: model.order(),
                aicc: model.aicc(),
                sigma2: model.sigma2(),
                candidates: model.candidates().len(),
            },
            table,
            written,
        })
    }
}

/// Fetch, normalize, select and forecast with default settings, without persisting anything.
pub fn run(
    source: Box<dyn PriceSource>,
    ticker: &str,
    start: NaiveDate,
    periods: usize,
    price_field: PriceField,
) -> Result<ForecastTable, PipelineError> {
    let config = PipelineConfig {
        start,
        periods,
        price_field,
        plot: false,
        ..PipelineConfig::default()
    };
    Pipeline::new(config, source).run(ticker).map(|output| output.table)
}
