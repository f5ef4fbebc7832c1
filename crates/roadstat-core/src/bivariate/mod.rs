//! Bivariate analysis of two columns.
//!
//! The pairing is chosen from the declared kinds of the two columns:
//!
//! | x \ y       | Numeric              | Categorical          |
//! |-------------|----------------------|----------------------|
//! | Numeric     | regression           | group means + ANOVA  |
//! | Categorical | group means + ANOVA  | contingency + chi²   |
//!
//! Temporal columns cannot be paired. Only rows where both values are
//! present take part (pairwise complete cases).

pub mod contingency;
pub mod groups;
pub mod regression;

use tracing::{debug, info};

pub use contingency::{chi_square_test, contingency_table, cross_tabulate};
pub use groups::{compare_groups, one_way_anova};
pub use regression::linear_regression;

use crate::config::AnalysisConfig;
use crate::error::{Result, ResultExt, StatsError};
use crate::frame::{ColumnData, DatasetFrame};
use crate::types::{BivariateResult, RegressionResult};

/// Analyzes pairs of columns of a [`DatasetFrame`].
#[derive(Debug, Clone)]
pub struct BivariateAnalyzer {
    config: AnalysisConfig,
}

impl Default for BivariateAnalyzer {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl BivariateAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze columns `x` and `y`.
    ///
    /// # Errors
    ///
    /// - [`StatsError::ColumnNotFound`] for an unknown column
    /// - [`StatsError::InvalidParameter`] when either column is temporal
    /// - [`StatsError::InsufficientData`] with fewer than 2 complete pairs
    /// - [`StatsError::DegenerateVariance`] for a constant numeric column in
    ///   a regression
    pub fn analyze(&self, frame: &DatasetFrame, x: &str, y: &str) -> Result<BivariateResult> {
        info!("Analyzing '{}' against '{}'", x, y);

        let x_data = frame.column(x)?;
        let y_data = frame.column(y)?;

        let result = match (&x_data, &y_data) {
            (ColumnData::Temporal(_), _) | (_, ColumnData::Temporal(_)) => {
                return Err(StatsError::InvalidParameter(format!(
                    "temporal columns cannot be paired ('{}' x '{}')",
                    x, y
                )));
            }
            (ColumnData::Numeric(xs), ColumnData::Numeric(ys)) => {
                let (xs, ys): (Vec<f64>, Vec<f64>) = xs
                    .iter()
                    .zip(ys.iter())
                    .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
                    .unzip();

                let regression = if x == y {
                    if xs.len() < 2 {
                        return Err(StatsError::insufficient("regression", 2, xs.len()));
                    }
                    debug!("Regression of '{}' on itself, returning identity", x);
                    RegressionResult::identity(xs.len())
                } else {
                    linear_regression(&xs, &ys)
                        .context(format!("Regressing '{}' on '{}'", y, x))?
                };

                BivariateResult::NumericNumeric {
                    x: x.to_string(),
                    y: y.to_string(),
                    regression,
                }
            }
            (ColumnData::Numeric(values), ColumnData::Categorical(labels)) => {
                BivariateResult::NumericCategorical(compare_groups(
                    x,
                    y,
                    &numeric_label_pairs(values, labels),
                )?)
            }
            (ColumnData::Categorical(labels), ColumnData::Numeric(values)) => {
                BivariateResult::NumericCategorical(compare_groups(
                    y,
                    x,
                    &numeric_label_pairs(values, labels),
                )?)
            }
            (ColumnData::Categorical(rows), ColumnData::Categorical(columns)) => {
                let pairs: Vec<(&str, &str)> = rows
                    .iter()
                    .zip(columns.iter())
                    .filter_map(|(r, c)| Some((r.as_deref()?, c.as_deref()?)))
                    .collect();
                BivariateResult::CategoricalCategorical(cross_tabulate(x, y, &pairs)?)
            }
        };

        Ok(result)
    }
}

fn numeric_label_pairs<'a>(
    values: &[Option<f64>],
    labels: &'a [Option<String>],
) -> Vec<(f64, &'a str)> {
    values
        .iter()
        .zip(labels)
        .filter_map(|(v, l)| Some(((*v)?, l.as_deref()?)))
        .collect()
}
