//! Road Accident Statistics Library
//!
//! Descriptive, bivariate and inferential statistics over road-accident
//! records, built with Rust, Polars and statrs.
//!
//! # Overview
//!
//! This library turns raw accident records into statistical results:
//!
//! - **Ingestion**: Header canonicalization, parse-or-null coercion, derived
//!   weekday/hour/day columns, invalid rows dropped and counted
//! - **Univariate**: Frequency tables (distinct values, Sturges classes or
//!   fixed-width bands) and descriptive indices with a Chebyshev interval
//! - **Bivariate**: Regression for two numeric columns, group means with
//!   ANOVA for numeric against categorical, contingency tables with
//!   chi-square for two categorical columns
//! - **Inference**: Poisson probability of incidents in an hour window,
//!   Welch's t-test daytime vs nighttime, confidence interval for the mean
//!   daily incident count
//! - **Sampling and synthetic data**: Seeded random samples and a record
//!   generator for demos
//!
//! Every analyzer is a pure function of an immutable [`DatasetFrame`]; a
//! result is either fully computed or a typed [`StatsError`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use roadstat_core::{read_csv, DatasetFrame, ColumnSchema};
//!
//! let df = read_csv("incidenti.csv")?;
//! let frame = DatasetFrame::from_dataframe(&df, &ColumnSchema::accidents())?;
//! println!("{} records, {} dropped", frame.len(), frame.dropped_rows());
//!
//! // Frequency table and indices of one column
//! let speed = roadstat_core::describe_column(&frame, "estimated_speed", None)?;
//! for row in &speed.frequency_table.rows {
//!     println!("{:>12} {:>5} {:.3}", row.label, row.absolute, row.relative);
//! }
//!
//! // Pairing chosen from the column kinds
//! let result = roadstat_core::analyze_pair(&frame, "estimated_speed", "injured_count")?;
//!
//! // Canned inferential procedures
//! let poisson = roadstat_core::poisson_probability(&frame, "Roma", 8, 9, 1)?;
//! let welch = roadstat_core::welch_t_test(&frame, "injured_count")?;
//! let ci = roadstat_core::confidence_interval(&frame, "Milano", 95)?;
//! ```
//!
//! # Configuration
//!
//! The free functions use [`AnalysisConfig::default()`]. Use the analyzers
//! directly to change thresholds:
//!
//! ```rust,ignore
//! use roadstat_core::{AnalysisConfig, InferenceEngine, UnivariateAnalyzer};
//!
//! let config = AnalysisConfig::builder()
//!     .max_bins(10)                 // At most 10 equal-width classes
//!     .category_limit(8)            // Collapse long tails into "Other"
//!     .daytime_hours(6, 20)         // Daytime for the t-test
//!     .build()?;
//!
//! let univariate = UnivariateAnalyzer::new(&config);
//! let engine = InferenceEngine::new(&config);
//! ```
//!
//! # Errors
//!
//! Every fallible operation returns [`Result`]. Data-quality conditions
//! (empty columns, too few observations, constant data) are recoverable
//! and carry a stable code from [`StatsError::error_code`].

pub mod bivariate;
pub mod config;
pub mod error;
pub mod frame;
pub mod inference;
pub mod sampling;
pub mod synthetic;
pub mod types;
pub mod univariate;
pub mod utils;

// Re-exports for convenient access
pub use bivariate::BivariateAnalyzer;
pub use config::{AnalysisConfig, AnalysisConfigBuilder, ConfigValidationError};
pub use error::{Result, ResultExt, StatsError};
pub use frame::{
    Binning, ColumnData, ColumnKind, ColumnSchema, ColumnSpec, DatasetFrame, RawRow, parse_csv,
    read_csv, rows_from_dataframe,
};
pub use inference::{HourWindow, InferenceEngine};
pub use sampling::{describe_sample, sample_values};
pub use synthetic::{SyntheticConfig, generate_frame, generate_rows};
pub use types::{
    AnovaResult, BivariateResult, ChebyshevInterval, ChiSquareResult, ConfidenceInterval,
    ContingencyTable, CrossTabulation, DescriptiveIndices, FrequencyRow, FrequencyTable,
    GroupComparison, GroupSummary, InferenceResult, PoissonEstimate, RegressionResult,
    TTestResult, TemporalGranularity, TestOutcome, UnivariateResult,
};
pub use univariate::UnivariateAnalyzer;

/// Build a [`DatasetFrame`] from raw rows.
///
/// Rows without a parseable timestamp or a province are dropped; when none
/// survive the result is [`StatsError::EmptyDataset`].
pub fn ingest(rows: &[RawRow], schema: &ColumnSchema) -> Result<DatasetFrame> {
    frame::ingest(rows, schema)
}

/// Frequency table and, for numeric columns, descriptive indices.
pub fn describe_column(
    frame: &DatasetFrame,
    column: &str,
    granularity: Option<TemporalGranularity>,
) -> Result<UnivariateResult> {
    UnivariateAnalyzer::default().describe(frame, column, granularity)
}

/// Relationship between two columns, chosen from their kinds.
pub fn analyze_pair(frame: &DatasetFrame, x: &str, y: &str) -> Result<BivariateResult> {
    BivariateAnalyzer::default().analyze(frame, x, y)
}

/// Probability of exactly `k` incidents between `hour_start` and `hour_end`
/// (inclusive) on a day in `province`.
pub fn poisson_probability(
    frame: &DatasetFrame,
    province: &str,
    hour_start: u32,
    hour_end: u32,
    k: u64,
) -> Result<PoissonEstimate> {
    InferenceEngine::default().poisson_probability(frame, province, hour_start, hour_end, k)
}

/// Welch's t-test of `column`, daytime (07:00-19:59) against nighttime.
pub fn welch_t_test(frame: &DatasetFrame, column: &str) -> Result<TTestResult> {
    InferenceEngine::default().welch_t_test(frame, column)
}

/// Confidence interval for the mean daily incident count of `province`.
pub fn confidence_interval(
    frame: &DatasetFrame,
    province: &str,
    level: u8,
) -> Result<ConfidenceInterval> {
    InferenceEngine::default().confidence_interval(frame, province, level)
}
