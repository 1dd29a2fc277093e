//! Descriptive statistics and normal quantiles

use crate::{MathError, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// Arithmetic mean; `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by `n`); `0.0` for fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mu = mean(values);
    values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / values.len() as f64
}

/// Quantile of the standard normal distribution.
pub fn normal_quantile(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Probability must lie strictly between 0 and 1, got {}",
            p
        )));
    }
    let normal =
        Normal::new(0.0, 1.0).map_err(|e| MathError::CalculationError(e.to_string()))?;
    Ok(normal.inverse_cdf(p))
}

/// Critical value `z` so that `±z` covers `confidence` of a standard normal.
pub fn two_sided_z(confidence: f64) -> Result<f64> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(MathError::InvalidInput(format!(
            "Confidence level must lie strictly between 0 and 1, got {}",
            confidence
        )));
    }
    normal_quantile((1.0 + confidence) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values), 5.0);
        assert_relative_eq!(variance(&values), 4.0);
        assert!(mean(&[]).is_nan());
        assert_eq!(variance(&[3.0]), 0.0);
    }

    #[rstest]
    #[case(0.80, 1.2816)]
    #[case(0.90, 1.6449)]
    #[case(0.95, 1.9600)]
    #[case(0.99, 2.5758)]
    fn two_sided_critical_values(#[case] confidence: f64, #[case] expected: f64) {
        assert_relative_eq!(two_sided_z(confidence).unwrap(), expected, epsilon = 1e-3);
    }

    #[rstest]
    #[case(0.0)]
    #[case(1.0)]
    #[case(-0.5)]
    #[case(f64::NAN)]
    fn rejects_out_of_range_confidence(#[case] confidence: f64) {
        assert!(matches!(
            two_sided_z(confidence),
            Err(MathError::InvalidInput(_))
        ));
    }

    #[test]
    fn median_quantile_is_zero() {
        assert_relative_eq!(normal_quantile(0.5).unwrap(), 0.0, epsilon = 1e-9);
    }
}
