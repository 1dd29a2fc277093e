//! Differencing utilities
//!
//! A differencing scheme `(1 - B)^d (1 - B^s)^D` is represented as a lag
//! polynomial `[1, c1, c2, ...]` where `c_i` multiplies `B^i`. Applying the
//! polynomial turns levels into a stationary series; integrating reverses it
//! given enough trailing history.

use crate::polynomial::multiply;
use crate::{MathError, Result};

/// Apply first differencing `d` times.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing at lag `period`, `d` times.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Lag polynomial of `(1 - B)^d (1 - B^period)^seasonal_d`.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = multiply(&poly, &seasonal);
        }
    }
    poly
}

/// Filter `series` through a lag polynomial.
///
/// Output element `k` corresponds to input index `k + degree`, so the result
/// is `degree` elements shorter than the input (empty if the input is too
/// short).
pub fn apply_lag_polynomial(poly: &[f64], series: &[f64]) -> Vec<f64> {
    let degree = poly.len().saturating_sub(1);
    if series.len() <= degree {
        return Vec::new();
    }

    (degree..series.len())
        .map(|t| {
            poly.iter()
                .enumerate()
                .map(|(i, c)| c * series[t - i])
                .sum::<f64>()
        })
        .collect()
}

/// Undo a lag-polynomial filter for values beyond the end of `history`.
///
/// `filtered` holds future values on the filtered scale; each one is turned
/// into a level using the trailing levels (history first, then the levels
/// already reconstructed).
pub fn integrate(filtered: &[f64], history: &[f64], poly: &[f64]) -> Result<Vec<f64>> {
    let degree = poly.len().saturating_sub(1);
    if poly.first().map_or(true, |lead| (*lead - 1.0).abs() > 1e-12) {
        return Err(MathError::InvalidInput(
            "Differencing polynomial must be monic".to_string(),
        ));
    }
    if history.len() < degree {
        return Err(MathError::InsufficientData(format!(
            "Integration needs {} trailing levels, got {}",
            degree,
            history.len()
        )));
    }

    let mut levels: Vec<f64> = history[history.len() - degree..].to_vec();
    let mut result = Vec::with_capacity(filtered.len());

    for &w in filtered {
        let t = levels.len();
        let carried: f64 = (1..=degree).map(|i| poly[i] * levels[t - i]).sum();
        let level = w - carried;
        levels.push(level);
        result.push(level);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn difference_order_1() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 1), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn difference_order_2() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 2), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn difference_order_0_is_identity() {
        let series = vec![1.0, 2.0, 4.0];
        assert_eq!(difference(&series, 0), series);
    }

    #[test]
    fn seasonal_difference_removes_repeating_pattern() {
        let series = vec![100.0, 120.0, 80.0, 90.0, 110.0, 130.0, 90.0, 100.0];
        assert_eq!(
            seasonal_difference(&series, 1, 4),
            vec![10.0, 10.0, 10.0, 10.0]
        );
    }

    #[test]
    fn seasonal_difference_too_short() {
        assert!(seasonal_difference(&[1.0, 2.0], 1, 4).is_empty());
    }

    #[test]
    fn polynomial_matches_direct_differencing() {
        let series: Vec<f64> = (0..30)
            .map(|i| (i as f64).powi(2) + 5.0 * ((i % 4) as f64))
            .collect();
        let poly = differencing_polynomial(1, 1, 4);
        let via_poly = apply_lag_polynomial(&poly, &series);
        let direct = seasonal_difference(&difference(&series, 1), 1, 4);

        assert_eq!(via_poly.len(), direct.len());
        for (a, b) in via_poly.iter().zip(direct.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn differencing_polynomial_shape() {
        assert_eq!(differencing_polynomial(0, 0, 12), vec![1.0]);
        assert_eq!(differencing_polynomial(1, 0, 12), vec![1.0, -1.0]);
        assert_eq!(differencing_polynomial(2, 0, 0), vec![1.0, -2.0, 1.0]);
        let seasonal = differencing_polynomial(0, 1, 3);
        assert_eq!(seasonal, vec![1.0, 0.0, 0.0, -1.0]);
    }

    #[test]
    fn integrate_continues_from_last_level() {
        let history = vec![10.0, 12.0, 15.0, 19.0, 24.0];
        let poly = differencing_polynomial(1, 0, 0);
        let levels = integrate(&[6.0, 7.0], &history, &poly).unwrap();
        assert_relative_eq!(levels[0], 30.0, epsilon = 1e-12);
        assert_relative_eq!(levels[1], 37.0, epsilon = 1e-12);
    }

    #[test]
    fn integrate_inverts_seasonal_scheme() {
        let series: Vec<f64> = (0..24)
            .map(|i| 50.0 + i as f64 + 3.0 * ((i % 6) as f64))
            .collect();
        let poly = differencing_polynomial(1, 1, 6);
        let filtered = apply_lag_polynomial(&poly, &series);

        // Re-create the last 5 levels from the filtered tail and the history before them.
        let split = series.len() - 5;
        let tail = &filtered[filtered.len() - 5..];
        let rebuilt = integrate(tail, &series[..split], &poly).unwrap();
        for (a, b) in rebuilt.iter().zip(series[split..].iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn integrate_requires_history() {
        let poly = differencing_polynomial(0, 1, 12);
        let err = integrate(&[1.0], &[1.0, 2.0], &poly).unwrap_err();
        assert!(matches!(err, MathError::InsufficientData(_)));
    }
}
