//! Lag-polynomial algebra
//!
//! Polynomials are stored lowest power first, so `[1.0, -0.5]` is `1 - 0.5B`.

/// Multiply two lag polynomials.
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut product = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            product[i + j] += x * y;
        }
    }
    product
}

/// Autoregressive operator `1 - c1 B^step - c2 B^(2 step) - ...`.
pub fn ar_lag_polynomial(coefficients: &[f64], step: usize) -> Vec<f64> {
    lag_polynomial(coefficients, step, -1.0)
}

/// Moving-average operator `1 + c1 B^step + c2 B^(2 step) + ...`.
pub fn ma_lag_polynomial(coefficients: &[f64], step: usize) -> Vec<f64> {
    lag_polynomial(coefficients, step, 1.0)
}

fn lag_polynomial(coefficients: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let step = step.max(1);
    let mut poly = vec![0.0; coefficients.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coefficients.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

/// Whether `1 - φ1 z - ... - φp z^p` has all roots outside the unit circle.
///
/// Uses the step-down (reverse Levinson-Durbin) recursion: the operator is
/// stationary iff every partial autocorrelation it implies is inside (-1, 1).
pub fn is_stationary(ar_coefficients: &[f64]) -> bool {
    if ar_coefficients.iter().any(|c| !c.is_finite()) {
        return false;
    }

    let mut phi = ar_coefficients.to_vec();
    while let Some(&reflection) = phi.last() {
        if reflection.abs() >= 1.0 {
            return false;
        }
        let k = phi.len();
        let denom = 1.0 - reflection * reflection;
        let reduced: Vec<f64> = (0..k - 1)
            .map(|j| (phi[j] + reflection * phi[k - 2 - j]) / denom)
            .collect();
        phi = reduced;
    }
    true
}

/// Whether `1 + θ1 z + ... + θq z^q` has all roots outside the unit circle.
pub fn is_invertible(ma_coefficients: &[f64]) -> bool {
    let negated: Vec<f64> = ma_coefficients.iter().map(|c| -c).collect();
    is_stationary(&negated)
}

/// First `n` MA(∞) weights of `ma_poly(B) / ar_poly(B)`.
///
/// Both polynomials must be monic lag polynomials. `ar_poly` can include
/// differencing factors, in which case the weights describe the integrated
/// process and grow accordingly.
pub fn psi_weights(ar_poly: &[f64], ma_poly: &[f64], n: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(n);
    for j in 0..n {
        let mut value = if j == 0 {
            1.0
        } else {
            ma_poly.get(j).copied().unwrap_or(0.0)
        };
        for i in 1..=j.min(ar_poly.len().saturating_sub(1)) {
            value -= ar_poly[i] * psi[j - i];
        }
        psi.push(value);
    }
    psi
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn multiply_expands_product() {
        // (1 - 0.5B)(1 - B^2) = 1 - 0.5B - B^2 + 0.5B^3
        let product = multiply(&[1.0, -0.5], &[1.0, 0.0, -1.0]);
        assert_eq!(product, vec![1.0, -0.5, -1.0, 0.5]);
    }

    #[test]
    fn seasonal_operators_are_spread_by_step() {
        assert_eq!(ar_lag_polynomial(&[0.4], 4), vec![1.0, 0.0, 0.0, 0.0, -0.4]);
        assert_eq!(ma_lag_polynomial(&[0.3, 0.2], 1), vec![1.0, 0.3, 0.2]);
        assert_eq!(ar_lag_polynomial(&[], 12), vec![1.0]);
    }

    #[test]
    fn stationarity_of_ar1() {
        assert!(is_stationary(&[0.5]));
        assert!(is_stationary(&[-0.95]));
        assert!(!is_stationary(&[1.0]));
        assert!(!is_stationary(&[1.2]));
    }

    #[test]
    fn stationarity_of_ar2() {
        // Complex roots with modulus sqrt(1/0.6) > 1.
        assert!(is_stationary(&[1.5, -0.6]));
        // One real root at ~0.94, inside the unit circle.
        assert!(!is_stationary(&[0.5, 0.6]));
    }

    #[test]
    fn empty_operator_is_stationary() {
        assert!(is_stationary(&[]));
        assert!(is_invertible(&[]));
    }

    #[test]
    fn invertibility_mirrors_stationarity() {
        assert!(is_invertible(&[0.8]));
        assert!(!is_invertible(&[-1.1]));
        assert!(!is_stationary(&[f64::NAN]));
    }

    #[test]
    fn psi_weights_of_ar1_decay_geometrically() {
        let psi = psi_weights(&ar_lag_polynomial(&[0.5], 1), &[1.0], 5);
        for (j, weight) in psi.iter().enumerate() {
            assert_relative_eq!(*weight, 0.5_f64.powi(j as i32), epsilon = 1e-12);
        }
    }

    #[test]
    fn psi_weights_of_random_walk_are_ones() {
        let psi = psi_weights(&[1.0, -1.0], &[1.0], 6);
        assert!(psi.iter().all(|w| (*w - 1.0).abs() < 1e-12));
    }

    #[test]
    fn psi_weights_of_ma1_truncate() {
        let psi = psi_weights(&[1.0], &ma_lag_polynomial(&[0.4], 1), 4);
        assert_eq!(psi, vec![1.0, 0.4, 0.0, 0.0]);
    }
}
