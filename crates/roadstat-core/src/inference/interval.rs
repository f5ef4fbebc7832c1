//! Confidence interval for the mean daily incident count of a province.

use std::collections::BTreeMap;

use statrs::distribution::ContinuousCDF;
use tracing::{debug, info};

use crate::error::{Result, StatsError};
use crate::frame::DatasetFrame;
use crate::types::ConfidenceInterval;
use crate::utils::{mean, sample_variance, students_t};

/// t-distribution interval for the mean of `counts` at `level` percent.
///
/// # Errors
///
/// - [`StatsError::InvalidParameter`] when `level` is outside 1-99
/// - [`StatsError::InsufficientData`] with fewer than 2 counts
/// - [`StatsError::DegenerateVariance`] when every count is equal
pub fn interval_from_counts(
    province: &str,
    counts: &[f64],
    level: u8,
) -> Result<ConfidenceInterval> {
    if !(1..=99).contains(&level) {
        return Err(StatsError::InvalidParameter(format!(
            "confidence level must be between 1 and 99 percent (got {})",
            level
        )));
    }

    let n = counts.len();
    let variance = sample_variance(counts)
        .ok_or_else(|| StatsError::insufficient("confidence interval", 2, n))?;
    if variance <= 0.0 {
        return Err(StatsError::DegenerateVariance(format!(
            "every day in '{}' has the same incident count",
            province
        )));
    }

    let mean = mean(counts).unwrap_or_default();
    let std_dev = variance.sqrt();
    let standard_error = std_dev / (n as f64).sqrt();

    let alpha = 1.0 - f64::from(level) / 100.0;
    let critical = students_t((n - 1) as f64)?.inverse_cdf(1.0 - alpha / 2.0);
    let margin_of_error = critical * standard_error;
    debug!(
        "n = {}, t critical = {:.4}, margin = {:.4}",
        n, critical, margin_of_error
    );

    Ok(ConfidenceInterval {
        province: province.to_string(),
        mean,
        std_dev,
        n,
        standard_error,
        margin_of_error,
        lower_bound: mean - margin_of_error,
        upper_bound: mean + margin_of_error,
        confidence_level: level,
    })
}

/// Interval for the mean number of incidents per calendar day in `province`.
///
/// Only days with at least one record for the province are counted.
pub fn confidence_interval(
    frame: &DatasetFrame,
    province: &str,
    level: u8,
) -> Result<ConfidenceInterval> {
    info!(
        "{}% confidence interval of daily incidents in '{}'",
        level, province
    );

    let mut per_day: BTreeMap<_, usize> = BTreeMap::new();
    for (p, day) in frame.province_values().iter().zip(frame.calendar_days()) {
        if p == province {
            *per_day.entry(*day).or_default() += 1;
        }
    }
    let counts: Vec<f64> = per_day.values().map(|c| *c as f64).collect();

    interval_from_counts(province, &counts, level)
}
