//! Descriptive indices of a numeric sample.

use crate::types::{ChebyshevInterval, DescriptiveIndices};
use crate::utils::{mean, quantile_sorted, sample_variance, sorted};

/// Compute all descriptive indices; `None` for an empty sample.
///
/// Skewness is the adjusted Fisher-Pearson coefficient (G1, n >= 3) and
/// kurtosis the bias-corrected excess kurtosis (G2, n >= 4); both are 0 for
/// a constant sample.
pub fn compute_indices(values: &[f64], chebyshev_k: f64) -> Option<DescriptiveIndices> {
    let sorted = sorted(values);
    let count = sorted.len();
    let mean = mean(&sorted)?;
    let (min, max) = (*sorted.first()?, *sorted.last()?);

    let variance = sample_variance(&sorted);
    let std_dev = variance.map(f64::sqrt);
    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);

    let coefficient_of_variation =
        std_dev.map(|std| if mean == 0.0 { 0.0 } else { std / mean });

    let chebyshev = std_dev
        .filter(|std| *std > 0.0)
        .map(|std| ChebyshevInterval {
            k: chebyshev_k,
            lower: mean - chebyshev_k * std,
            upper: mean + chebyshev_k * std,
            min_coverage: 1.0 - 1.0 / (chebyshev_k * chebyshev_k),
        });

    let mean_absolute_deviation =
        sorted.iter().map(|v| (v - mean).abs()).sum::<f64>() / count as f64;

    Some(DescriptiveIndices {
        count,
        mean,
        median: quantile_sorted(&sorted, 0.5),
        mode: mode_sorted(&sorted),
        min,
        max,
        range: max - min,
        variance,
        std_dev,
        mean_absolute_deviation,
        coefficient_of_variation,
        skewness: skewness(&sorted, mean),
        kurtosis: excess_kurtosis(&sorted, mean),
        q1,
        q3,
        iqr: q3 - q1,
        chebyshev,
    })
}

/// Most frequent value of a sorted, non-empty slice; the smallest on ties.
fn mode_sorted(sorted: &[f64]) -> f64 {
    let mut best = (sorted[0], 0usize);
    let mut start = 0;
    while start < sorted.len() {
        let value = sorted[start];
        let run = sorted[start..].iter().take_while(|v| **v == value).count();
        if run > best.1 {
            best = (value, run);
        }
        start += run;
    }
    best.0
}

/// Central moments m2, m3, m4 (population form).
fn central_moments(values: &[f64], mean: f64) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for v in values {
        let d = v - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (m2 / n, m3 / n, m4 / n)
}

/// Spread small enough to be rounding noise around the mean.
fn is_negligible(m2: f64, mean: f64) -> bool {
    m2 <= 1e-14 * mean.abs().max(1.0).powi(2)
}

fn skewness(values: &[f64], mean: f64) -> Option<f64> {
    let n = values.len() as f64;
    if values.len() < 3 {
        return None;
    }
    let (m2, m3, _) = central_moments(values, mean);
    if is_negligible(m2, mean) {
        return Some(0.0);
    }
    let g1 = m3 / m2.powf(1.5);
    Some(g1 * (n * (n - 1.0)).sqrt() / (n - 2.0))
}

fn excess_kurtosis(values: &[f64], mean: f64) -> Option<f64> {
    let n = values.len() as f64;
    if values.len() < 4 {
        return None;
    }
    let (m2, _, m4) = central_moments(values, mean);
    if is_negligible(m2, mean) {
        return Some(0.0);
    }
    let g2 = m4 / (m2 * m2) - 3.0;
    Some(((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0)))
}
