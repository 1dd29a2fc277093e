//! Seasonal ARIMA estimation by conditional sum of squares

use crate::data::RegularSeries;
use crate::error::{ForecastError, Result};
use crate::models::{
    CandidateScore, ForecastModel, ForecastResult, SarimaOrder, TrainedForecastModel,
};
use forecast_math::differencing::{apply_lag_polynomial, differencing_polynomial, integrate};
use forecast_math::optimization::{nelder_mead, NelderMeadConfig};
use forecast_math::polynomial::{
    ar_lag_polynomial, is_invertible, is_stationary, ma_lag_polynomial, multiply, psi_weights,
};
use forecast_math::stats::{mean, two_sided_z};
use std::f64::consts::PI;

/// Innovation variance floor used when scoring, so flat series still rank.
const SIGMA2_FLOOR: f64 = 1e-12;

/// Seasonal ARIMA model with a fixed order
#[derive(Debug, Clone)]
pub struct Sarima {
    name: String,
    order: SarimaOrder,
    /// Mean (d + D = 0) or drift (d + D = 1) term on the differenced scale
    include_mean: bool,
    optimizer: NelderMeadConfig,
}

/// Information criteria of a fitted model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InformationCriteria {
    pub log_likelihood: f64,
    pub aic: f64,
    pub aicc: f64,
    pub bic: f64,
}

/// Trained seasonal ARIMA model
#[derive(Debug, Clone)]
pub struct FittedSarima {
    name: String,
    order: SarimaOrder,
    include_mean: bool,
    ar: Vec<f64>,
    seasonal_ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ma: Vec<f64>,
    intercept: f64,
    sigma2: f64,
    criteria: InformationCriteria,
    /// Conditional residuals on the differenced scale (zero where conditioned away)
    residuals: Vec<f64>,
    /// Levels the model was fitted on
    history: Vec<f64>,
    /// History after applying the differencing polynomial
    differenced: Vec<f64>,
    differencing: Vec<f64>,
    iterations: usize,
    candidates: Vec<CandidateScore>,
}

/// Position of each coefficient group inside the optimiser's parameter vector
#[derive(Debug, Clone, Copy)]
struct Layout {
    mean: bool,
    p: usize,
    seasonal_p: usize,
    q: usize,
    seasonal_q: usize,
}

struct Coefficients<'a> {
    mean: f64,
    ar: &'a [f64],
    seasonal_ar: &'a [f64],
    ma: &'a [f64],
    seasonal_ma: &'a [f64],
}

impl Layout {
    fn new(order: &SarimaOrder, mean: bool) -> Self {
        let seasonal = order.lag_period() > 0;
        Self {
            mean,
            p: order.p,
            seasonal_p: if seasonal { order.seasonal_p } else { 0 },
            q: order.q,
            seasonal_q: if seasonal { order.seasonal_q } else { 0 },
        }
    }

    fn len(&self) -> usize {
        usize::from(self.mean) + self.p + self.seasonal_p + self.q + self.seasonal_q
    }

    fn split<'a>(&self, params: &'a [f64]) -> Coefficients<'a> {
        let (mean, rest) = if self.mean {
            (params[0], &params[1..])
        } else {
            (0.0, params)
        };
        let (ar, rest) = rest.split_at(self.p);
        let (seasonal_ar, rest) = rest.split_at(self.seasonal_p);
        let (ma, seasonal_ma) = rest.split_at(self.q);
        Coefficients {
            mean,
            ar,
            seasonal_ar,
            ma,
            seasonal_ma: &seasonal_ma[..self.seasonal_q],
        }
    }
}

impl Coefficients<'_> {
    fn admissible(&self) -> bool {
        is_stationary(self.ar)
            && is_stationary(self.seasonal_ar)
            && is_invertible(self.ma)
            && is_invertible(self.seasonal_ma)
    }

    fn operators(&self, period: usize) -> (Vec<f64>, Vec<f64>) {
        lag_operators(self.ar, self.seasonal_ar, self.ma, self.seasonal_ma, period)
    }
}

/// Full AR and MA lag operators, seasonal factors multiplied in.
fn lag_operators(
    ar: &[f64],
    seasonal_ar: &[f64],
    ma: &[f64],
    seasonal_ma: &[f64],
    period: usize,
) -> (Vec<f64>, Vec<f64>) {
    let ar_op = multiply(&ar_lag_polynomial(ar, 1), &ar_lag_polynomial(seasonal_ar, period));
    let ma_op = multiply(&ma_lag_polynomial(ma, 1), &ma_lag_polynomial(seasonal_ma, period));
    (ar_op, ma_op)
}

/// Conditional residuals of a mean-adjusted series.
///
/// The first `deg(ar_op)` residuals are conditioned to zero.
fn css_residuals(x: &[f64], ar_op: &[f64], ma_op: &[f64]) -> Vec<f64> {
    let ar_degree = ar_op.len().saturating_sub(1);
    let ma_degree = ma_op.len().saturating_sub(1);
    let mut residuals = vec![0.0; x.len()];
    for t in ar_degree..x.len() {
        let mut value: f64 = ar_op.iter().enumerate().map(|(i, a)| a * x[t - i]).sum();
        for j in 1..=ma_degree.min(t) {
            value -= ma_op[j] * residuals[t - j];
        }
        residuals[t] = value;
    }
    residuals
}

impl Sarima {
    /// Create a new model of the given order
    pub fn new(order: SarimaOrder, include_mean: bool) -> Self {
        Self {
            name: order.to_string(),
            order,
            include_mean,
            optimizer: NelderMeadConfig::default(),
        }
    }

    pub fn with_optimizer(mut self, optimizer: NelderMeadConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn order(&self) -> SarimaOrder {
        self.order
    }

    /// Estimate coefficients on a series of levels.
    pub fn fit(&self, values: &[f64]) -> Result<FittedSarima> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidObservations(
                "Series contains non-finite values".to_string(),
            ));
        }

        let period = self.order.lag_period();
        let differencing = differencing_polynomial(
            self.order.d,
            if period > 0 { self.order.seasonal_d } else { 0 },
            period,
        );
        let differenced = apply_lag_polynomial(&differencing, values);
        if differenced.is_empty() {
            return Err(ForecastError::InsufficientData {
                needed: differencing.len(),
                got: values.len(),
            });
        }

        let layout = Layout::new(&self.order, self.include_mean);
        let n_used = differenced.len();
        let ar_degree = self.order.p + layout.seasonal_p * period;
        let n_resid = n_used.saturating_sub(ar_degree);
        if n_resid <= layout.len() {
            return Err(ForecastError::ModelFit(format!(
                "{} has {} conditioned residuals for {} coefficients",
                self.order,
                n_resid,
                layout.len()
            )));
        }

        let centre = if self.include_mean { mean(&differenced) } else { 0.0 };
        let (params, iterations) = if self.order.arma_terms() == 0 {
            // Mean-only: the sample mean minimises the sum of squares.
            (if self.include_mean { vec![centre] } else { Vec::new() }, 0)
        } else {
            self.optimise(&layout, &differenced, centre, n_resid, period)?
        };

        let coefficients = layout.split(&params);
        let (ar_op, ma_op) = coefficients.operators(period);
        let x: Vec<f64> = differenced.iter().map(|w| w - coefficients.mean).collect();
        let residuals = css_residuals(&x, &ar_op, &ma_op);
        let css: f64 = residuals[ar_degree..].iter().map(|e| e * e).sum();
        let sigma2 = css / n_resid as f64;

        let criteria = information_criteria(sigma2, n_used, layout.len()).ok_or_else(|| {
            ForecastError::ModelFit(format!(
                "{} is not identifiable from {} differenced observations",
                self.order, n_used
            ))
        })?;

        Ok(FittedSarima {
            name: self.name.clone(),
            order: self.order,
            include_mean: self.include_mean,
            ar: coefficients.ar.to_vec(),
            seasonal_ar: coefficients.seasonal_ar.to_vec(),
            ma: coefficients.ma.to_vec(),
            seasonal_ma: coefficients.seasonal_ma.to_vec(),
            intercept: coefficients.mean,
            sigma2,
            criteria,
            residuals,
            history: values.to_vec(),
            differenced,
            differencing,
            iterations,
            candidates: Vec::new(),
        })
    }

    fn optimise(
        &self,
        layout: &Layout,
        differenced: &[f64],
        centre: f64,
        n_resid: usize,
        period: usize,
    ) -> Result<(Vec<f64>, usize)> {
        let mut initial = Vec::with_capacity(layout.len());
        if layout.mean {
            initial.push(centre);
        }
        for group in [layout.p, layout.seasonal_p, layout.q, layout.seasonal_q] {
            initial.extend((0..group).map(|i| 0.1 / (i + 1) as f64));
        }

        let ar_degree = layout.p + layout.seasonal_p * period;
        let objective = |params: &[f64]| -> f64 {
            let coefficients = layout.split(params);
            if !coefficients.admissible() {
                return f64::INFINITY;
            }
            let (ar_op, ma_op) = coefficients.operators(period);
            let x: Vec<f64> = differenced.iter().map(|w| w - coefficients.mean).collect();
            let residuals = css_residuals(&x, &ar_op, &ma_op);
            let css: f64 = residuals[ar_degree..].iter().map(|e| e * e).sum();
            if !css.is_finite() {
                return f64::INFINITY;
            }
            0.5 * (css / n_resid as f64).max(SIGMA2_FLOOR).ln()
        };

        let result = nelder_mead(objective, &initial, &self.optimizer);
        if !result.converged || !result.optimal_value.is_finite() {
            return Err(ForecastError::ModelFit(format!(
                "{} did not converge after {} iterations",
                self.order, result.iterations
            )));
        }
        Ok((result.optimal_point, result.iterations))
    }
}

/// Gaussian log-likelihood over the full differenced length and the criteria
/// derived from it. `None` when the small-sample correction is undefined.
fn information_criteria(
    sigma2: f64,
    n_used: usize,
    n_coefficients: usize,
) -> Option<InformationCriteria> {
    let k = (n_coefficients + 1) as f64;
    let n = n_used as f64;
    let denominator = n - k - 1.0;
    if denominator <= 0.0 || !sigma2.is_finite() {
        return None;
    }

    let log_likelihood = -0.5 * n * ((2.0 * PI * sigma2.max(SIGMA2_FLOOR)).ln() + 1.0);
    let aic = -2.0 * log_likelihood + 2.0 * k;
    let aicc = aic + 2.0 * k * (k + 1.0) / denominator;
    let bic = -2.0 * log_likelihood + k * n.ln();
    aicc.is_finite().then_some(InformationCriteria {
        log_likelihood,
        aic,
        aicc,
        bic,
    })
}

impl ForecastModel for Sarima {
    type Trained = FittedSarima;

    fn train(&self, data: &RegularSeries) -> Result<Self::Trained> {
        self.fit(&data.values())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl FittedSarima {
    pub fn order(&self) -> SarimaOrder {
        self.order
    }

    pub fn include_mean(&self) -> bool {
        self.include_mean
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.seasonal_ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.seasonal_ma
    }

    /// Mean (or drift) of the differenced series; zero when not estimated
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Innovation variance
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn criteria(&self) -> &InformationCriteria {
        &self.criteria
    }

    pub fn aicc(&self) -> f64 {
        self.criteria.aicc
    }

    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// Optimiser iterations spent on this fit
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Candidates tried by the selector, best first
    pub fn candidates(&self) -> &[CandidateScore] {
        &self.candidates
    }

    pub(crate) fn with_candidates(mut self, candidates: Vec<CandidateScore>) -> Self {
        self.candidates = candidates;
        self
    }

    fn operators(&self) -> (Vec<f64>, Vec<f64>) {
        lag_operators(
            &self.ar,
            &self.seasonal_ar,
            &self.ma,
            &self.seasonal_ma,
            self.order.lag_period(),
        )
    }
}

impl TrainedForecastModel for FittedSarima {
    fn forecast(&self, horizons: usize, confidence: f64) -> Result<ForecastResult> {
        if horizons == 0 {
            return Err(ForecastError::Configuration(
                "Forecast horizon must be at least 1".to_string(),
            ));
        }
        let z = two_sided_z(confidence).map_err(|e| ForecastError::Configuration(e.to_string()))?;

        let (ar_op, ma_op) = self.operators();
        let n = self.differenced.len();
        let mut x: Vec<f64> = self.differenced.iter().map(|w| w - self.intercept).collect();
        let mut shocks = self.residuals.clone();

        for _ in 0..horizons {
            let t = x.len();
            let ar_part: f64 = (1..ar_op.len().min(t + 1)).map(|i| ar_op[i] * x[t - i]).sum();
            let ma_part: f64 = (1..ma_op.len().min(t + 1))
                .map(|j| ma_op[j] * shocks[t - j])
                .sum();
            x.push(ma_part - ar_part);
            shocks.push(0.0);
        }

        let filtered: Vec<f64> = x[n..].iter().map(|v| v + self.intercept).collect();
        let values = integrate(&filtered, &self.history, &self.differencing)?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFit(format!(
                "{} produced a non-finite forecast",
                self.order
            )));
        }

        let psi = psi_weights(&multiply(&ar_op, &self.differencing), &ma_op, horizons);
        let mut cumulative = 0.0;
        let intervals = psi
            .iter()
            .zip(values.iter())
            .map(|(weight, point)| {
                cumulative += weight * weight;
                let half_width = z * (self.sigma2 * cumulative).sqrt();
                (point - half_width, point + half_width)
            })
            .collect();

        ForecastResult::new_with_intervals(values, intervals)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn training_values(&self) -> Option<&[f64]> {
        Some(&self.history)
    }
}
