//! Structured, serializable results handed to a presentation layer.

use serde::{Deserialize, Serialize};

use crate::frame::ColumnKind;

// ============================================================================
// Univariate Types
// ============================================================================

/// One bucket of a frequency table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRow {
    pub label: String,
    pub absolute: usize,
    pub relative: f64,
    pub cumulative_absolute: usize,
    pub cumulative_relative: f64,
}

/// Ordered frequency table.
///
/// Invariant: the absolute frequencies sum to `total` and the last
/// cumulative relative frequency is 1 (for a non-empty table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyTable {
    pub rows: Vec<FrequencyRow>,
    pub total: usize,
    /// Whether buckets are value classes rather than distinct values.
    pub binned: bool,
}

impl FrequencyTable {
    /// Build a table from ordered `(label, count)` pairs.
    pub fn from_counts(counts: Vec<(String, usize)>, binned: bool) -> Self {
        let total: usize = counts.iter().map(|(_, count)| count).sum();
        let mut cumulative = 0usize;
        let rows = counts
            .into_iter()
            .map(|(label, absolute)| {
                cumulative += absolute;
                FrequencyRow {
                    label,
                    absolute,
                    relative: ratio(absolute, total),
                    cumulative_absolute: cumulative,
                    cumulative_relative: ratio(cumulative, total),
                }
            })
            .collect();

        Self {
            rows,
            total,
            binned,
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.label.as_str()).collect()
    }

    /// Absolute frequency of a bucket, if present.
    pub fn count_of(&self, label: &str) -> Option<usize> {
        self.rows
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.absolute)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Interval `[mean - k*std, mean + k*std]` holding at least `1 - 1/k^2` of
/// any distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChebyshevInterval {
    pub k: f64,
    pub lower: f64,
    pub upper: f64,
    pub min_coverage: f64,
}

/// Descriptive indices of a numeric column.
///
/// Indices whose preconditions fail are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveIndices {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Most frequent value; the smallest one when several tie.
    pub mode: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub variance: Option<f64>,
    pub std_dev: Option<f64>,
    pub mean_absolute_deviation: f64,
    pub coefficient_of_variation: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub chebyshev: Option<ChebyshevInterval>,
}

/// Bucket size for temporal frequency tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalGranularity {
    Year,
    Month,
    #[default]
    Day,
    Hour,
    Weekday,
}

/// Result of describing one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnivariateResult {
    pub column: String,
    pub kind: ColumnKind,
    pub non_missing: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granularity: Option<TemporalGranularity>,
    pub frequency_table: FrequencyTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indices: Option<DescriptiveIndices>,
}

// ============================================================================
// Bivariate Types
// ============================================================================

/// A test that either ran or whose preconditions did not hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestOutcome<T> {
    Computed(T),
    NotComputable { reason: String },
}

impl<T> TestOutcome<T> {
    pub fn not_computable(reason: impl Into<String>) -> Self {
        Self::NotComputable {
            reason: reason.into(),
        }
    }

    pub fn computed(&self) -> Option<&T> {
        match self {
            Self::Computed(value) => Some(value),
            Self::NotComputable { .. } => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }
}

/// Simple linear regression of y on x with Pearson correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    pub correlation_r: f64,
    pub r_squared: f64,
    /// Two-sided p-value for the null hypothesis of zero correlation.
    pub p_value: f64,
    pub n: usize,
}

/// Summary of a numeric column within one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub category: String,
    pub n: usize,
    pub mean: f64,
    pub std_dev: Option<f64>,
    pub median: f64,
}

/// One-way ANOVA across category groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaResult {
    pub f_statistic: f64,
    pub p_value: f64,
    pub df_between: usize,
    pub df_within: usize,
}

/// Numeric column compared across the categories of another column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupComparison {
    pub numeric_column: String,
    pub categorical_column: String,
    pub groups: Vec<GroupSummary>,
    pub anova: TestOutcome<AnovaResult>,
}

/// Cross-tabulated counts with sorted row and column labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyTable {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    /// `counts[row][column]`.
    pub counts: Vec<Vec<usize>>,
    pub total: usize,
}

/// Chi-square test of independence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: usize,
    pub yates_correction: bool,
}

/// Two categorical columns cross-tabulated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossTabulation {
    pub row_column: String,
    pub column_column: String,
    pub table: ContingencyTable,
    pub chi_square: TestOutcome<ChiSquareResult>,
}

/// Result of pairing two columns, shaped by their kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pairing", rename_all = "snake_case")]
pub enum BivariateResult {
    NumericNumeric {
        x: String,
        y: String,
        regression: RegressionResult,
    },
    NumericCategorical(GroupComparison),
    CategoricalCategorical(CrossTabulation),
}

// ============================================================================
// Inference Types
// ============================================================================

/// Probability of exactly `k` incidents in an hour window of one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoissonEstimate {
    pub province: String,
    pub hour_start: u32,
    pub hour_end: u32,
    pub window_hours: u32,
    pub k: u64,
    /// Mean incidents in the window per observed day.
    pub lambda: f64,
    pub probability: f64,
    /// P(X <= k).
    pub cumulative_probability: f64,
    pub observation_days: usize,
    pub events_in_window: usize,
}

/// Welch's two-sample t-test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    pub column: String,
    pub group_a_label: String,
    pub group_a_mean: f64,
    pub group_a_n: usize,
    pub group_b_label: String,
    pub group_b_mean: f64,
    pub group_b_n: usize,
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
}

/// t-distribution confidence interval for the mean daily incident count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub province: String,
    pub mean: f64,
    pub std_dev: f64,
    pub n: usize,
    pub standard_error: f64,
    pub margin_of_error: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Integer percent, 1-99.
    pub confidence_level: u8,
}

/// Any of the inferential procedures' results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "procedure", rename_all = "snake_case")]
pub enum InferenceResult {
    Poisson(PoissonEstimate),
    TTest(TTestResult),
    ConfidenceInterval(ConfidenceInterval),
}

impl From<PoissonEstimate> for InferenceResult {
    fn from(value: PoissonEstimate) -> Self {
        Self::Poisson(value)
    }
}

impl From<TTestResult> for InferenceResult {
    fn from(value: TTestResult) -> Self {
        Self::TTest(value)
    }
}

impl From<ConfidenceInterval> for InferenceResult {
    fn from(value: ConfidenceInterval) -> Self {
        Self::ConfidenceInterval(value)
    }
}

static_assertions::assert_impl_all!(UnivariateResult: Send, Sync);
static_assertions::assert_impl_all!(BivariateResult: Send, Sync);
static_assertions::assert_impl_all!(InferenceResult: Send, Sync);
