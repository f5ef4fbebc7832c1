//! Welch's two-sample t-test, daytime against nighttime.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::{Result, StatsError};
use crate::frame::DatasetFrame;
use crate::types::TTestResult;
use crate::utils::{mean, sample_variance, two_sided_t_p_value};

/// Core statistics of a Welch test on two samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelchStatistics {
    pub mean_a: f64,
    pub n_a: usize,
    pub mean_b: f64,
    pub n_b: usize,
    pub t_statistic: f64,
    /// Welch-Satterthwaite degrees of freedom.
    pub degrees_of_freedom: f64,
    pub p_value: f64,
}

/// Welch's t-test (unequal variances) of `a` against `b`.
///
/// Swapping the samples negates `t` and leaves `p` unchanged.
///
/// # Errors
///
/// - [`StatsError::InsufficientData`] when a sample has fewer than 2 values
/// - [`StatsError::DegenerateVariance`] when both samples are constant
pub fn welch_from_samples(a: &[f64], b: &[f64]) -> Result<WelchStatistics> {
    welch_statistics(a, b, "Welch t-test group")
}

/// Welch statistics; `context` names the groups in an insufficient-data error.
fn welch_statistics(a: &[f64], b: &[f64], context: &str) -> Result<WelchStatistics> {
    let (Some(var_a), Some(var_b)) = (sample_variance(a), sample_variance(b)) else {
        let found = a.len().min(b.len());
        return Err(StatsError::insufficient(context, 2, found));
    };
    if var_a == 0.0 && var_b == 0.0 {
        return Err(StatsError::DegenerateVariance(
            "both groups are constant".to_string(),
        ));
    }

    let (n_a, n_b) = (a.len(), b.len());
    let mean_a = mean(a).unwrap_or_default();
    let mean_b = mean(b).unwrap_or_default();
    let se_a = var_a / n_a as f64;
    let se_b = var_b / n_b as f64;
    let t_statistic = (mean_a - mean_b) / (se_a + se_b).sqrt();
    let degrees_of_freedom = (se_a + se_b).powi(2)
        / (se_a.powi(2) / (n_a - 1) as f64 + se_b.powi(2) / (n_b - 1) as f64);

    Ok(WelchStatistics {
        mean_a,
        n_a,
        mean_b,
        n_b,
        t_statistic,
        degrees_of_freedom,
        p_value: two_sided_t_p_value(t_statistic, degrees_of_freedom)?,
    })
}

/// Compare a numeric column between daytime and nighttime records.
///
/// Daytime is `daytime_start_hour <= hour <= daytime_end_hour`; every other
/// hour is nighttime. Missing values are excluded.
pub fn welch_t_test(
    frame: &DatasetFrame,
    column: &str,
    config: &AnalysisConfig,
) -> Result<TTestResult> {
    info!("Welch t-test on '{}', daytime vs nighttime", column);

    let values = frame.numeric(column)?;
    let mut daytime = Vec::new();
    let mut nighttime = Vec::new();
    for (value, hour) in values.iter().zip(frame.hours()) {
        let Some(value) = value else { continue };
        if config.is_daytime(*hour) {
            daytime.push(*value);
        } else {
            nighttime.push(*value);
        }
    }
    debug!(
        "Daytime n = {}, nighttime n = {}",
        daytime.len(),
        nighttime.len()
    );

    let context = format!("daytime vs nighttime '{}' t-test", column);
    let stats = welch_statistics(&daytime, &nighttime, &context)?;

    Ok(TTestResult {
        column: column.to_string(),
        group_a_label: format!(
            "daytime ({:02}:00-{:02}:59)",
            config.daytime_start_hour, config.daytime_end_hour
        ),
        group_a_mean: stats.mean_a,
        group_a_n: stats.n_a,
        group_b_label: "nighttime".to_string(),
        group_b_mean: stats.mean_b,
        group_b_n: stats.n_b,
        t_statistic: stats.t_statistic,
        degrees_of_freedom: stats.degrees_of_freedom,
        p_value: stats.p_value,
    })
}
