//! Random samples of a numeric column.
//!
//! A sample is drawn without replacement from the non-missing values of a
//! column. Passing a seed makes the draw reproducible.

use rand::prelude::*;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::error::{Result, StatsError};
use crate::frame::DatasetFrame;
use crate::types::UnivariateResult;
use crate::univariate::UnivariateAnalyzer;

/// Draw `n` non-missing values of the numeric column `column`.
///
/// # Errors
///
/// - [`StatsError::ColumnNotFound`] for an unknown column
/// - [`StatsError::InvalidParameter`] when the column is not numeric, or
///   when `n` is 0 or exceeds the number of non-missing values
pub fn sample_values(
    frame: &DatasetFrame,
    column: &str,
    n: usize,
    seed: Option<u64>,
) -> Result<Vec<f64>> {
    let present: Vec<f64> = frame.numeric(column)?.iter().flatten().copied().collect();

    if n == 0 || n > present.len() {
        return Err(StatsError::InvalidParameter(format!(
            "sample size must be between 1 and {} for '{}' (got {})",
            present.len(),
            column,
            n
        )));
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Ok(present.choose_multiple(&mut rng, n).copied().collect())
}

/// Univariate description of a random sample of `column`.
pub fn describe_sample(
    frame: &DatasetFrame,
    column: &str,
    n: usize,
    seed: Option<u64>,
    config: &AnalysisConfig,
) -> Result<UnivariateResult> {
    info!("Describing a sample of {} values from '{}'", n, column);

    let sample = sample_values(frame, column, n, seed)?;
    UnivariateAnalyzer::new(config).describe_numeric(column, &sample, frame.binning(column))
}
