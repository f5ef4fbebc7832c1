//! Pearson correlation and ordinary least squares for two numeric columns.

use tracing::debug;

use crate::error::{Result, StatsError};
use crate::types::RegressionResult;
use crate::utils::{mean, two_sided_t_p_value};

/// |r| this close to 1 is treated as a perfect fit.
const PERFECT_FIT_TOLERANCE: f64 = 1e-12;

impl RegressionResult {
    /// Exact result of regressing a column on itself.
    pub fn identity(n: usize) -> Self {
        Self {
            slope: 1.0,
            intercept: 0.0,
            correlation_r: 1.0,
            r_squared: 1.0,
            p_value: 0.0,
            n,
        }
    }
}

/// Regress `y` on `x` over complete pairs.
///
/// # Errors
///
/// - [`StatsError::InsufficientData`] with fewer than 2 pairs
/// - [`StatsError::DegenerateVariance`] when either variable is constant
pub fn linear_regression(x: &[f64], y: &[f64]) -> Result<RegressionResult> {
    let n = x.len().min(y.len());
    if n < 2 {
        return Err(StatsError::insufficient("regression", 2, n));
    }
    let (x, y) = (&x[..n], &y[..n]);

    let mean_x = mean(x).unwrap_or_default();
    let mean_y = mean(y).unwrap_or_default();
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 {
        return Err(StatsError::DegenerateVariance(
            "x variable is constant".to_string(),
        ));
    }
    if syy == 0.0 {
        return Err(StatsError::DegenerateVariance(
            "y variable is constant".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r = (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0);
    let r_squared = r * r;

    let p_value = if n == 2 || 1.0 - r.abs() < PERFECT_FIT_TOLERANCE {
        debug!("Perfect fit (n = {}, r = {}), p-value set to 0", n, r);
        0.0
    } else {
        let df = (n - 2) as f64;
        let t = r * (df / (1.0 - r_squared)).sqrt();
        two_sided_t_p_value(t, df)?
    };

    Ok(RegressionResult {
        slope,
        intercept,
        correlation_r: r,
        r_squared,
        p_value,
        n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_linear_regression_reference() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 5.0, 4.0, 5.0];
        let result = linear_regression(&x, &y).unwrap();

        assert!(approx(result.slope, 0.6, 1e-12));
        assert!(approx(result.intercept, 2.2, 1e-12));
        assert!(approx(result.correlation_r, 0.7745966692414834, 1e-12));
        assert!(approx(result.r_squared, 0.6, 1e-12));
        assert!(approx(result.p_value, 0.124027, 1e-5));
        assert_eq!(result.n, 5);
    }

    #[test]
    fn test_perfect_fit_p_value_zero() {
        let result = linear_regression(&[1.0, 2.0, 3.0], &[3.0, 5.0, 7.0]).unwrap();
        assert!(approx(result.correlation_r, 1.0, 1e-12));
        assert_eq!(result.p_value, 0.0);

        let two = linear_regression(&[1.0, 2.0], &[5.0, 1.0]).unwrap();
        assert_eq!(two.p_value, 0.0);
        assert!(approx(two.correlation_r, -1.0, 1e-12));
    }

    #[test]
    fn test_degenerate_variance() {
        let err = linear_regression(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, StatsError::DegenerateVariance(_)));

        let err = linear_regression(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]).unwrap_err();
        assert!(matches!(err, StatsError::DegenerateVariance(_)));
    }

    #[test]
    fn test_insufficient_pairs() {
        let err = linear_regression(&[1.0], &[2.0]).unwrap_err();
        assert!(matches!(
            err,
            StatsError::InsufficientData {
                required: 2,
                found: 1,
                ..
            }
        ));
    }
}
