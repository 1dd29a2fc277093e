//! Tests used to choose differencing orders
//!
//! - KPSS level-stationarity test for the ordinary differencing order `d`
//! - Seasonal strength for the seasonal differencing order `D`

use crate::differencing::{difference, seasonal_difference};
use crate::stats::{mean, variance};

/// 5% critical value of the KPSS level-stationarity statistic.
pub const KPSS_CRITICAL_5PCT: f64 = 0.463;

/// Seasonal strength above which a seasonal difference is taken.
pub const SEASONAL_STRENGTH_THRESHOLD: f64 = 0.64;

/// Outcome of a KPSS level-stationarity test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpssTest {
    /// Test statistic (`NaN` when the series has no variance)
    pub statistic: f64,
    /// Bartlett-window lags used for the long-run variance
    pub lags: usize,
    /// Whether the null of level stationarity is kept
    pub is_stationary: bool,
}

/// KPSS test for level stationarity.
///
/// Uses the short Bartlett window, `trunc(3 * sqrt(n) / 13)` lags. A series with no variance is
/// reported stationary: there is nothing left to difference away.
pub fn kpss_level(series: &[f64], critical_value: f64) -> KpssTest {
    let n = series.len();
    if n < 4 {
        return KpssTest {
            statistic: f64::NAN,
            lags: 0,
            is_stationary: true,
        };
    }

    let lags = ((3.0 * (n as f64).sqrt() / 13.0).trunc() as usize).min(n / 2);

    let mu = mean(series);
    let residuals: Vec<f64> = series.iter().map(|x| x - mu).collect();

    let mut partial = 0.0;
    let numerator: f64 = residuals
        .iter()
        .map(|r| {
            partial += r;
            partial * partial
        })
        .sum::<f64>()
        / (n * n) as f64;

    let mut long_run = residuals.iter().map(|r| r * r).sum::<f64>() / n as f64;
    for j in 1..=lags {
        let weight = 1.0 - j as f64 / (lags + 1) as f64;
        let autocovariance = residuals
            .iter()
            .skip(j)
            .zip(residuals.iter())
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / n as f64;
        long_run += 2.0 * weight * autocovariance;
    }

    if long_run <= 1e-12 {
        return KpssTest {
            statistic: f64::NAN,
            lags,
            is_stationary: true,
        };
    }

    let statistic = numerator / long_run;
    KpssTest {
        statistic,
        lags,
        is_stationary: statistic < critical_value,
    }
}

/// Number of first differences needed before KPSS stops rejecting, capped at `max_d`.
pub fn ndiffs(series: &[f64], max_d: usize, critical_value: f64) -> usize {
    let mut current = series.to_vec();
    let mut d = 0;
    while d < max_d && current.len() >= 4 && !kpss_level(&current, critical_value).is_stationary {
        current = difference(&current, 1);
        d += 1;
    }
    d
}

/// Strength of seasonality at `period`, in `[0, 1]`.
///
/// The series is detrended with a centred moving average (2×m when the
/// period is even), seasonal indices are the per-position means of the
/// detrended values, and the strength is `1 - Var(remainder) / Var(detrended)`.
/// Returns `None` when there are fewer than two full seasons.
pub fn seasonal_strength(series: &[f64], period: usize) -> Option<f64> {
    let n = series.len();
    if period < 2 || n < 2 * period {
        return None;
    }

    let half = period / 2;
    let detrended: Vec<(usize, f64)> = (half..n - half)
        .map(|t| {
            let trend = if period % 2 == 0 {
                let inner: f64 = series[t + 1 - half..t + half].iter().sum();
                (0.5 * series[t - half] + inner + 0.5 * series[t + half]) / period as f64
            } else {
                series[t - half..=t + half].iter().sum::<f64>() / period as f64
            };
            (t, series[t] - trend)
        })
        .collect();

    let mut sums = vec![0.0; period];
    let mut counts = vec![0usize; period];
    for &(t, value) in &detrended {
        sums[t % period] += value;
        counts[t % period] += 1;
    }
    let mut indices: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();
    let centre = mean(&indices);
    for index in &mut indices {
        *index -= centre;
    }

    let values: Vec<f64> = detrended.iter().map(|&(_, v)| v).collect();
    let remainder: Vec<f64> = detrended
        .iter()
        .map(|&(t, v)| v - indices[t % period])
        .collect();

    let total = variance(&values);
    if total < 1e-10 {
        return Some(0.0);
    }

    Some((1.0 - variance(&remainder) / total).clamp(0.0, 1.0))
}

/// Number of seasonal differences needed, capped at `max_seasonal_d`.
pub fn nsdiffs(series: &[f64], period: usize, max_seasonal_d: usize, threshold: f64) -> usize {
    let mut current = series.to_vec();
    let mut seasonal_d = 0;
    while seasonal_d < max_seasonal_d {
        match seasonal_strength(&current, period) {
            Some(strength) if strength >= threshold => {
                current = seasonal_difference(&current, 1, period);
                seasonal_d += 1;
            }
            _ => break,
        }
    }
    seasonal_d
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn pseudo_noise(i: usize) -> f64 {
        // Deterministic, roughly zero-mean wiggle.
        ((i as f64 * 12.9898).sin() * 43758.5453).fract() - 0.5
    }

    fn mean_reverting(i: usize) -> f64 {
        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
        sign + 0.3 * pseudo_noise(i)
    }

    #[test]
    fn kpss_keeps_mean_reverting_series_stationary() {
        let series: Vec<f64> = (0..120).map(mean_reverting).collect();
        let test = kpss_level(&series, KPSS_CRITICAL_5PCT);
        assert!(test.is_stationary, "statistic was {}", test.statistic);
    }

    #[test]
    fn kpss_rejects_trend() {
        let series: Vec<f64> = (0..120).map(|i| i as f64 + pseudo_noise(i)).collect();
        assert!(!kpss_level(&series, KPSS_CRITICAL_5PCT).is_stationary);
    }

    #[test]
    fn kpss_uses_short_bartlett_window() {
        let lags_for = |n: usize| {
            let series: Vec<f64> = (0..n).map(mean_reverting).collect();
            kpss_level(&series, KPSS_CRITICAL_5PCT).lags
        };
        assert_eq!(lags_for(10), 0);
        assert_eq!(lags_for(24), 1);
        assert_eq!(lags_for(120), 2);
        assert_eq!(lags_for(300), 3);
    }

    #[test]
    fn kpss_constant_series_is_stationary() {
        let test = kpss_level(&[100.0; 24], KPSS_CRITICAL_5PCT);
        assert!(test.is_stationary);
        assert!(test.statistic.is_nan());
    }

    #[test]
    fn ndiffs_for_trend_and_noise() {
        let noise: Vec<f64> = (0..120).map(mean_reverting).collect();
        assert_eq!(ndiffs(&noise, 2, KPSS_CRITICAL_5PCT), 0);

        let trend: Vec<f64> = (0..120).map(|i| 2.0 * i as f64 + pseudo_noise(i)).collect();
        assert!(ndiffs(&trend, 2, KPSS_CRITICAL_5PCT) >= 1);

        assert_eq!(ndiffs(&[100.0; 24], 2, KPSS_CRITICAL_5PCT), 0);
    }

    #[test]
    fn seasonal_strength_of_pure_cycle_is_high() {
        let series: Vec<f64> = (0..60)
            .map(|i| 10.0 * (2.0 * PI * i as f64 / 12.0).sin())
            .collect();
        let strength = seasonal_strength(&series, 12).unwrap();
        assert!(strength > 0.9, "strength was {}", strength);
        assert_eq!(nsdiffs(&series, 12, 1, SEASONAL_STRENGTH_THRESHOLD), 1);
    }

    #[test]
    fn seasonal_strength_of_noise_is_low() {
        let series: Vec<f64> = (0..60).map(pseudo_noise).collect();
        let strength = seasonal_strength(&series, 12).unwrap();
        assert!(strength < SEASONAL_STRENGTH_THRESHOLD, "strength was {}", strength);
    }

    #[test]
    fn seasonal_strength_needs_two_seasons() {
        assert!(seasonal_strength(&[1.0; 20], 12).is_none());
        assert_eq!(nsdiffs(&[1.0; 20], 12, 1, SEASONAL_STRENGTH_THRESHOLD), 0);
    }

    #[test]
    fn flat_series_has_no_seasonality() {
        assert_eq!(seasonal_strength(&[100.0; 24], 12), Some(0.0));
    }
}
