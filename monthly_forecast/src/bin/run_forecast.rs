//! Command-line entry point: `run_forecast MSFT --start 2010-01-01 --periods 24`

use chrono::NaiveDate;
use clap::Parser;
use monthly_forecast::config::PipelineConfig;
use monthly_forecast::data::PriceField;
use monthly_forecast::fetch::{CsvPriceSource, PriceSource, YahooFinance};
use monthly_forecast::persist::CsvStore;
use monthly_forecast::pipeline::{Pipeline, PipelineError, Stage};
use monthly_forecast::plot::SvgChart;
use monthly_forecast::ForecastError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "run_forecast")]
#[command(about = "Monthly seasonal ARIMA price forecast", long_about = None)]
struct Cli {
    /// Stock ticker symbol (e.g. AAPL, MSFT)
    ticker: String,

    /// First day of history, YYYY-MM-DD
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day of history, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Months to forecast
    #[arg(long)]
    periods: Option<usize>,

    /// Price column to use (Close or Adj Close)
    #[arg(long = "price-col", alias = "price_col")]
    price_col: Option<String>,

    /// Two-sided interval coverage, strictly between 0 and 1
    #[arg(long)]
    confidence: Option<f64>,

    /// Read daily bars from this raw CSV instead of downloading
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory for raw and processed data
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory for the forecast table and chart
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// YAML file with run settings; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the chart
    #[arg(long)]
    no_plot: bool,

    /// Fit without a seasonal component
    #[arg(long)]
    non_seasonal: bool,

    /// Season length in months
    #[arg(long)]
    season_length: Option<usize>,
}

impl Cli {
    fn into_config(self) -> Result<(String, Option<PathBuf>, PipelineConfig), ForecastError> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_yaml_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(start) = self.start {
            config.start = start;
        }
        if self.end.is_some() {
            config.end = self.end;
        }
        if let Some(periods) = self.periods {
            config.periods = periods;
        }
        if let Some(column) = &self.price_col {
            config.price_field = column.parse::<PriceField>()?;
        }
        if let Some(confidence) = self.confidence {
            config.confidence = confidence;
        }
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if self.no_plot {
            config.plot = false;
        }
        if self.non_seasonal {
            config.seasonal = false;
        }
        if let Some(season_length) = self.season_length {
            config.season_length = season_length;
        }

        Ok((self.ticker, self.input, config))
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let (ticker, input, config) = match cli.into_config() {
        Ok(parts) => parts,
        Err(source) => {
            report(&PipelineError {
                stage: Stage::Configure,
                source,
            });
            return ExitCode::FAILURE;
        }
    };

    let source: Box<dyn PriceSource> = match input {
        Some(path) => Box::new(CsvPriceSource::new(path)),
        None => match YahooFinance::new() {
            Ok(client) => Box::new(client),
            Err(source) => {
                report(&PipelineError {
                    stage: Stage::Fetch,
                    source,
                });
                return ExitCode::FAILURE;
            }
        },
    };

    let store = CsvStore::new(&config.data_dir, &config.output_dir);
    let chart = SvgChart::new(&config.output_dir);
    let output_dir = config.output_dir.clone();
    let pipeline = Pipeline::new(config, source)
        .with_store(Box::new(store))
        .with_chart(Box::new(chart));

    match pipeline.run(&ticker) {
        Ok(output) => {
            println!(
                "{} monthly forecast using {} (AICc {:.2})",
                output.ticker, output.model.order, output.model.aicc
            );
            print!("{}", output.table);
            println!("Done. Check results in: {}", output_dir.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn report(err: &PipelineError) {
    eprintln!("Error during {} stage: {}", err.stage, err.source);
}
