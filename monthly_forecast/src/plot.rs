//! Forecast chart rendering

use crate::data::RegularSeries;
use crate::error::{ForecastError, Result};
use crate::forecast::ForecastTable;
use crate::period::MonthPeriod;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Draws history, forecast and confidence band
pub trait ChartRenderer: Send + Sync {
    fn render(&self, ticker: &str, history: &RegularSeries, table: &ForecastTable)
        -> Result<PathBuf>;
}

/// SVG chart written to `<output_dir>/<TICKER>_forecast.svg`
#[derive(Debug, Clone)]
pub struct SvgChart {
    output_dir: PathBuf,
    size: (u32, u32),
}

impl SvgChart {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            size: (1200, 600),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn chart_path(&self, ticker: &str) -> PathBuf {
        self.output_dir.join(format!("{}_forecast.svg", ticker))
    }
}

fn render_error<E: std::fmt::Display>(err: E) -> ForecastError {
    ForecastError::Render(err.to_string())
}

impl ChartRenderer for SvgChart {
    fn render(
        &self,
        ticker: &str,
        history: &RegularSeries,
        table: &ForecastTable,
    ) -> Result<PathBuf> {
        let origin = history
            .first()
            .map(|p| p.period)
            .ok_or_else(|| ForecastError::Render("Cannot chart an empty series".to_string()))?;

        // Months since the first observation on the x axis.
        let history_points: Vec<(f64, f64)> = history
            .points()
            .iter()
            .map(|p| (origin.months_until(&p.period) as f64, p.value))
            .collect();
        let mut forecast_points = Vec::with_capacity(table.len());
        let mut band = Vec::with_capacity(2 * table.len());
        for row in table.rows() {
            let period: MonthPeriod = row.period.parse()?;
            let x = origin.months_until(&period) as f64;
            forecast_points.push((x, row.point_estimate));
            band.push((x, row.upper_bound));
        }
        for (row, &(x, _)) in table.rows().iter().zip(forecast_points.iter()).rev() {
            band.push((x, row.lower_bound));
        }

        let x_max = forecast_points
            .last()
            .or(history_points.last())
            .map_or(1.0, |&(x, _)| x.max(1.0));
        let (y_low, y_high) = history_points
            .iter()
            .map(|&(_, y)| y)
            .chain(band.iter().map(|&(_, y)| y))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
                (lo.min(y), hi.max(y))
            });
        let pad = ((y_high - y_low) * 0.05).max(1e-6);

        fs::create_dir_all(&self.output_dir)?;
        let path = self.chart_path(ticker);
        {
            let root = SVGBackend::new(&path, self.size).into_drawing_area();
            root.fill(&WHITE).map_err(render_error)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(
                    format!("{} Stock Price Forecast (ARIMA)", ticker),
                    ("sans-serif", 24),
                )
                .margin(20)
                .x_label_area_size(40)
                .y_label_area_size(70)
                .build_cartesian_2d(0.0..x_max, (y_low - pad)..(y_high + pad))
                .map_err(render_error)?;

            let month_label = |x: &f64| origin.plus_months(x.round().max(0.0) as u32).to_string();
            chart
                .configure_mesh()
                .x_desc("Date")
                .y_desc("Price")
                .x_label_formatter(&month_label)
                .draw()
                .map_err(render_error)?;

            let pink = RGBColor(255, 182, 193);
            chart
                .draw_series(std::iter::once(Polygon::new(band, pink.mix(0.3))))
                .map_err(render_error)?
                .label("Confidence Interval")
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], pink.filled()));

            chart
                .draw_series(LineSeries::new(history_points, &BLUE))
                .map_err(render_error)?
                .label("History")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

            chart
                .draw_series(LineSeries::new(forecast_points, &RED))
                .map_err(render_error)?
                .label("Forecast")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()
                .map_err(render_error)?;

            root.present().map_err(render_error)?;
        }

        info!(path = %path.display(), "Saved forecast chart");
        Ok(path)
    }
}
