//! Automatic seasonal ARIMA order selection
//!
//! Differencing orders come from unit-root style tests (seasonal strength for
//! `D`, repeated KPSS for `d`). The ARMA orders are then searched, stepwise
//! by default, keeping the candidate with the lowest AICc.

use crate::data::RegularSeries;
use crate::error::{ForecastError, Result};
use crate::models::sarima::{FittedSarima, Sarima};
use crate::models::{CandidateScore, ForecastModel, SarimaOrder};
use forecast_math::differencing::seasonal_difference;
use forecast_math::optimization::NelderMeadConfig;
use forecast_math::stationarity::{
    ndiffs, nsdiffs, KPSS_CRITICAL_5PCT, SEASONAL_STRENGTH_THRESHOLD,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Differenced observations a mean-only model needs to be scored.
const MIN_FIT_POINTS: usize = 4;

/// Bounds and strategy of the order search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Stepwise neighbourhood search; `false` tries every order within `max_order`
    pub stepwise: bool,
    pub max_p: usize,
    pub max_q: usize,
    pub max_seasonal_p: usize,
    pub max_seasonal_q: usize,
    pub max_d: usize,
    pub max_seasonal_d: usize,
    /// Cap on `p + q + P + Q` in exhaustive mode
    pub max_order: usize,
    /// Cap on candidates fitted in stepwise mode
    pub max_models: usize,
    pub optimizer: NelderMeadConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            stepwise: true,
            max_p: 5,
            max_q: 5,
            max_seasonal_p: 2,
            max_seasonal_q: 2,
            max_d: 2,
            max_seasonal_d: 1,
            max_order: 5,
            max_models: 94,
            optimizer: NelderMeadConfig::default(),
        }
    }
}

/// Seasonal ARIMA with automatic order selection
#[derive(Debug, Clone)]
pub struct AutoSarima {
    seasonal: bool,
    season_length: usize,
    search: SearchConfig,
}

impl AutoSarima {
    pub fn new(seasonal: bool, season_length: usize) -> Self {
        Self {
            seasonal,
            season_length,
            search: SearchConfig::default(),
        }
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Pick differencing orders, search ARMA orders and return the best fit.
    pub fn select(&self, series: &RegularSeries) -> Result<FittedSarima> {
        let values = series.values();
        let n = values.len();

        let period = if self.seasonal {
            if self.season_length < 2 {
                return Err(ForecastError::Configuration(format!(
                    "Season length must be at least 2, got {}",
                    self.season_length
                )));
            }
            self.season_length
        } else {
            0
        };

        let mut needed = self.search.max_d + MIN_FIT_POINTS;
        if period > 0 {
            needed = needed.max(2 * period);
        }
        if n < needed {
            return Err(ForecastError::InsufficientData { needed, got: n });
        }

        let mut seasonal_d = if period > 0 {
            nsdiffs(
                &values,
                period,
                self.search.max_seasonal_d,
                SEASONAL_STRENGTH_THRESHOLD,
            )
        } else {
            0
        };
        // Short seasons can leave too few points once seasonally differenced.
        while seasonal_d > 0 && n < self.search.max_d + seasonal_d * period + MIN_FIT_POINTS {
            warn!(
                observations = n,
                period,
                seasonal_d,
                "Series too short for seasonal differencing, reducing D"
            );
            seasonal_d -= 1;
        }

        let seasonally_differenced = seasonal_difference(&values, seasonal_d, period);
        let d = ndiffs(&seasonally_differenced, self.search.max_d, KPSS_CRITICAL_5PCT);
        let include_mean = d + seasonal_d < 2;

        info!(
            observations = n,
            d,
            seasonal_d,
            period,
            include_mean,
            stepwise = self.search.stepwise,
            "Searching seasonal ARIMA orders"
        );

        let template = SarimaOrder::seasonal(0, d, 0, 0, seasonal_d, 0, period);
        let mut search = Search {
            values: &values,
            template,
            include_mean,
            config: &self.search,
            scores: HashMap::new(),
            evaluated: Vec::new(),
            best: None,
        };

        if self.search.stepwise {
            search.stepwise();
        } else {
            search.exhaustive();
        }

        let Search {
            evaluated, best, ..
        } = search;

        let best = best.ok_or_else(|| {
            ForecastError::ModelFit(format!(
                "None of the {} candidate models could be fitted",
                evaluated.len()
            ))
        })?;

        let mut ranked = evaluated;
        ranked.sort_by(|a, b| match (a.aicc, b.aicc) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        info!(
            model = %best.order(),
            aicc = best.aicc(),
            sigma2 = best.sigma2(),
            candidates = ranked.len(),
            "Selected model"
        );

        Ok(best.with_candidates(ranked))
    }
}

impl ForecastModel for AutoSarima {
    type Trained = FittedSarima;

    fn train(&self, data: &RegularSeries) -> Result<Self::Trained> {
        self.select(data)
    }

    fn name(&self) -> &str {
        "AutoSARIMA"
    }
}

/// Select the seasonal ARIMA model with the lowest AICc using default search bounds.
pub fn select_model(
    series: &RegularSeries,
    seasonal: bool,
    season_length: usize,
) -> Result<FittedSarima> {
    AutoSarima::new(seasonal, season_length).select(series)
}

struct Search<'a> {
    values: &'a [f64],
    template: SarimaOrder,
    include_mean: bool,
    config: &'a SearchConfig,
    scores: HashMap<SarimaOrder, Option<f64>>,
    evaluated: Vec<CandidateScore>,
    best: Option<FittedSarima>,
}

impl Search<'_> {
    fn order(&self, p: usize, q: usize, seasonal_p: usize, seasonal_q: usize) -> SarimaOrder {
        SarimaOrder {
            p,
            q,
            seasonal_p,
            seasonal_q,
            ..self.template
        }
    }

    fn is_seasonal(&self) -> bool {
        self.template.period > 1
    }

    fn within_bounds(&self, order: &SarimaOrder) -> bool {
        order.p <= self.config.max_p
            && order.q <= self.config.max_q
            && order.seasonal_p <= self.config.max_seasonal_p
            && order.seasonal_q <= self.config.max_seasonal_q
            && (self.is_seasonal() || order.seasonal_p + order.seasonal_q == 0)
    }

    /// Fit `order` once and return its AICc; failures are absorbed as `None`.
    fn evaluate(&mut self, order: SarimaOrder) -> Option<f64> {
        if let Some(score) = self.scores.get(&order) {
            return *score;
        }

        let fitted = Sarima::new(order, self.include_mean)
            .with_optimizer(self.config.optimizer)
            .fit(self.values);

        let score = match fitted {
            Ok(model) => {
                let aicc = model.aicc();
                debug!(order = %order, aicc, iterations = model.iterations(), "Fitted candidate");
                let improves = self.best.as_ref().map_or(true, |best| aicc < best.aicc());
                if improves {
                    self.best = Some(model);
                }
                Some(aicc)
            }
            Err(err) => {
                debug!(order = %order, error = %err, "Skipping candidate");
                None
            }
        };

        self.scores.insert(order, score);
        self.evaluated.push(CandidateScore { order, aicc: score });
        score
    }

    fn budget_left(&self) -> bool {
        self.evaluated.len() < self.config.max_models
    }

    fn stepwise(&mut self) {
        let starts = if self.is_seasonal() {
            [(2, 2, 1, 1), (0, 0, 0, 0), (1, 0, 1, 0), (0, 1, 0, 1)]
        } else {
            [(2, 2, 0, 0), (0, 0, 0, 0), (1, 0, 0, 0), (0, 1, 0, 0)]
        };
        for (p, q, seasonal_p, seasonal_q) in starts {
            let order = self.order(p, q, seasonal_p, seasonal_q);
            if self.within_bounds(&order) && self.budget_left() {
                self.evaluate(order);
            }
        }

        loop {
            let (current, current_aicc) = match self.best.as_ref() {
                Some(best) => (best.order(), best.aicc()),
                None => return,
            };

            let mut improved = false;
            for neighbour in self.neighbours(&current) {
                if !self.within_bounds(&neighbour) || self.scores.contains_key(&neighbour) {
                    continue;
                }
                if !self.budget_left() {
                    debug!(max_models = self.config.max_models, "Candidate budget exhausted");
                    return;
                }
                if matches!(self.evaluate(neighbour), Some(aicc) if aicc < current_aicc) {
                    improved = true;
                    break;
                }
            }

            if !improved {
                return;
            }
        }
    }

    fn neighbours(&self, current: &SarimaOrder) -> Vec<SarimaOrder> {
        let (p, q) = (current.p as isize, current.q as isize);
        let (sp, sq) = (current.seasonal_p as isize, current.seasonal_q as isize);

        let mut moves = vec![
            (p - 1, q, sp, sq),
            (p + 1, q, sp, sq),
            (p, q - 1, sp, sq),
            (p, q + 1, sp, sq),
            (p - 1, q - 1, sp, sq),
            (p + 1, q + 1, sp, sq),
        ];
        if self.is_seasonal() {
            moves.extend([
                (p, q, sp - 1, sq),
                (p, q, sp + 1, sq),
                (p, q, sp, sq - 1),
                (p, q, sp, sq + 1),
                (p, q, sp - 1, sq - 1),
                (p, q, sp + 1, sq + 1),
            ]);
        }

        moves
            .into_iter()
            .filter(|&(a, b, c, d)| a >= 0 && b >= 0 && c >= 0 && d >= 0)
            .map(|(a, b, c, d)| self.order(a as usize, b as usize, c as usize, d as usize))
            .collect()
    }

    fn exhaustive(&mut self) {
        let (max_sp, max_sq) = if self.is_seasonal() {
            (self.config.max_seasonal_p, self.config.max_seasonal_q)
        } else {
            (0, 0)
        };
        for p in 0..=self.config.max_p {
            for q in 0..=self.config.max_q {
                for seasonal_p in 0..=max_sp {
                    for seasonal_q in 0..=max_sq {
                        if p + q + seasonal_p + seasonal_q <= self.config.max_order {
                            self.evaluate(self.order(p, q, seasonal_p, seasonal_q));
                        }
                    }
                }
            }
        }
    }
}
