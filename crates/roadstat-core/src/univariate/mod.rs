//! Univariate analysis: frequency tables and descriptive indices.
//!
//! The column's declared kind drives the result:
//!
//! - **Numeric**: frequency table (distinct values, equal-width classes or
//!   fixed-width bands) plus [`DescriptiveIndices`](crate::types::DescriptiveIndices)
//! - **Categorical**: frequency table only
//! - **Temporal**: counts per [`TemporalGranularity`] bucket

pub mod frequency;
pub mod indices;

use tracing::{debug, info};

pub use frequency::{OTHER_LABEL, categorical_table, numeric_table, sturges_bins, temporal_table};
pub use indices::compute_indices;

use crate::config::AnalysisConfig;
use crate::error::{Result, StatsError};
use crate::frame::{Binning, ColumnData, ColumnKind, DatasetFrame, TemporalValues};
use crate::types::{FrequencyTable, TemporalGranularity, UnivariateResult};
use frequency::temporal_datetimes;

/// Describes single columns of a [`DatasetFrame`].
#[derive(Debug, Clone)]
pub struct UnivariateAnalyzer {
    config: AnalysisConfig,
}

impl Default for UnivariateAnalyzer {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl UnivariateAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Describe one column.
    ///
    /// `granularity` applies to temporal columns only; `None` means
    /// [`TemporalGranularity::Day`].
    ///
    /// # Errors
    ///
    /// - [`StatsError::ColumnNotFound`] for an unknown column
    /// - [`StatsError::EmptyColumn`] when every value is missing
    /// - [`StatsError::InvalidParameter`] for hour granularity on a
    ///   date-only column
    pub fn describe(
        &self,
        frame: &DatasetFrame,
        column: &str,
        granularity: Option<TemporalGranularity>,
    ) -> Result<UnivariateResult> {
        info!("Describing column '{}'", column);

        match frame.column(column)? {
            ColumnData::Numeric(values) => {
                let present: Vec<f64> = values.iter().flatten().copied().collect();
                self.describe_numeric(column, &present, frame.binning(column))
            }
            ColumnData::Categorical(values) => {
                let present: Vec<&str> = values.iter().flatten().map(String::as_str).collect();
                if present.is_empty() {
                    return Err(StatsError::EmptyColumn(column.to_string()));
                }
                Ok(UnivariateResult {
                    column: column.to_string(),
                    kind: ColumnKind::Categorical,
                    non_missing: present.len(),
                    granularity: None,
                    frequency_table: categorical_table(&present),
                    indices: None,
                })
            }
            ColumnData::Temporal(values) => {
                let granularity = granularity.unwrap_or_default();
                if matches!(values, TemporalValues::Date(_))
                    && granularity == TemporalGranularity::Hour
                {
                    return Err(StatsError::InvalidParameter(format!(
                        "column '{}' holds dates only and cannot be grouped by hour",
                        column
                    )));
                }

                let datetimes = temporal_datetimes(values);
                if datetimes.is_empty() {
                    return Err(StatsError::EmptyColumn(column.to_string()));
                }
                debug!(
                    "Grouping {} values of '{}' by {:?}",
                    datetimes.len(),
                    column,
                    granularity
                );
                Ok(UnivariateResult {
                    column: column.to_string(),
                    kind: ColumnKind::Temporal,
                    non_missing: datetimes.len(),
                    granularity: Some(granularity),
                    frequency_table: temporal_table(&datetimes, granularity),
                    indices: None,
                })
            }
        }
    }

    /// Describe already-extracted numeric values under a column name.
    pub fn describe_numeric(
        &self,
        column: &str,
        values: &[f64],
        binning: Binning,
    ) -> Result<UnivariateResult> {
        let indices = compute_indices(values, self.config.chebyshev_k)
            .ok_or_else(|| StatsError::EmptyColumn(column.to_string()))?;

        if indices.std_dev.is_none() {
            debug!(
                "Column '{}' has a single value, spread indices not computable",
                column
            );
        }

        Ok(UnivariateResult {
            column: column.to_string(),
            kind: ColumnKind::Numeric,
            non_missing: values.len(),
            granularity: None,
            frequency_table: numeric_table(
                values,
                binning,
                self.config.distinct_value_threshold,
                self.config.max_bins,
            ),
            indices: Some(indices),
        })
    }

    /// Collapse a table to the configured number of buckets.
    pub fn top_categories(&self, table: &FrequencyTable) -> FrequencyTable {
        table.collapse(self.config.category_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::schema::{CALENDAR_DAY, ESTIMATED_SPEED, TIMESTAMP, WEEKDAY_NAME};
    use crate::frame::test_support::{accident, row};
    use crate::frame::{ColumnSchema, ingest};
    use pretty_assertions::assert_eq;

    fn frame() -> DatasetFrame {
        let rows = vec![
            accident("2024-03-11 08:00:00", "Roma", "1", "0"),
            accident("2024-03-11 09:30:00", "Roma", "3", "0"),
            accident("2024-03-12 22:00:00", "Milano", "2", "1"),
            accident("2024-03-17 14:00:00", "Napoli", "", "0"),
        ];
        ingest(&rows, &ColumnSchema::accidents()).unwrap()
    }

    // ==================== numeric ====================

    #[test]
    fn test_describe_numeric_column() {
        let result = UnivariateAnalyzer::default()
            .describe(&frame(), "injured_count", None)
            .unwrap();
        assert_eq!(result.kind, ColumnKind::Numeric);
        assert_eq!(result.non_missing, 3);
        assert_eq!(result.frequency_table.total, 3);
        assert_eq!(result.frequency_table.labels(), vec!["1", "2", "3"]);
        let indices = result.indices.unwrap();
        assert_eq!(indices.mean, 2.0);
        assert_eq!(indices.variance, Some(1.0));
    }

    #[test]
    fn test_describe_empty_numeric_column() {
        let rows = vec![accident("2024-03-11 08:00:00", "Roma", "x", "")];
        let frame = ingest(&rows, &ColumnSchema::accidents()).unwrap();
        let err = UnivariateAnalyzer::default()
            .describe(&frame, "injured_count", None)
            .unwrap_err();
        assert!(matches!(err, StatsError::EmptyColumn(_)));
    }

    #[test]
    fn test_describe_speed_bands() {
        let rows: Vec<_> = ["34", "47", "52", "58", "131"]
            .iter()
            .map(|speed| {
                row(&[
                    (TIMESTAMP, "2024-01-01 10:00:00"),
                    ("province", "Roma"),
                    (ESTIMATED_SPEED, speed),
                ])
            })
            .collect();
        let frame = ingest(&rows, &ColumnSchema::accidents()).unwrap();
        let result = UnivariateAnalyzer::default()
            .describe(&frame, ESTIMATED_SPEED, None)
            .unwrap();
        assert!(result.frequency_table.binned);
        assert_eq!(result.frequency_table.rows[0].label, "[30, 40)");
        assert_eq!(result.frequency_table.count_of("[50, 60)"), Some(2));
        assert_eq!(result.frequency_table.len(), 11);
    }

    // ==================== categorical ====================

    #[test]
    fn test_describe_weekday_name() {
        let result = UnivariateAnalyzer::default()
            .describe(&frame(), WEEKDAY_NAME, None)
            .unwrap();
        assert_eq!(result.kind, ColumnKind::Categorical);
        assert_eq!(
            result.frequency_table.labels(),
            vec!["Monday", "Tuesday", "Sunday"]
        );
        assert!(result.indices.is_none());
    }

    #[test]
    fn test_top_categories() {
        let analyzer = UnivariateAnalyzer::new(
            &AnalysisConfig::builder().category_limit(2).build().unwrap(),
        );
        let result = analyzer.describe(&frame(), "province", None).unwrap();
        let collapsed = analyzer.top_categories(&result.frequency_table);
        assert_eq!(collapsed.labels(), vec!["Roma", OTHER_LABEL]);
        assert_eq!(collapsed.count_of(OTHER_LABEL), Some(2));
    }

    // ==================== temporal ====================

    #[test]
    fn test_describe_temporal_defaults_to_day() {
        let result = UnivariateAnalyzer::default()
            .describe(&frame(), TIMESTAMP, None)
            .unwrap();
        assert_eq!(result.granularity, Some(TemporalGranularity::Day));
        assert_eq!(result.frequency_table.count_of("2024-03-11"), Some(2));
        assert_eq!(result.frequency_table.len(), 3);
    }

    #[test]
    fn test_describe_temporal_by_weekday() {
        let result = UnivariateAnalyzer::default()
            .describe(&frame(), TIMESTAMP, Some(TemporalGranularity::Weekday))
            .unwrap();
        assert_eq!(result.frequency_table.len(), 7);
        assert_eq!(result.frequency_table.count_of("Thursday"), Some(0));
        assert_eq!(result.frequency_table.total, 4);
    }

    #[test]
    fn test_calendar_day_rejects_hour() {
        let err = UnivariateAnalyzer::default()
            .describe(&frame(), CALENDAR_DAY, Some(TemporalGranularity::Hour))
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");

        let ok = UnivariateAnalyzer::default()
            .describe(&frame(), CALENDAR_DAY, Some(TemporalGranularity::Month))
            .unwrap();
        assert_eq!(ok.frequency_table.labels(), vec!["2024-03"]);
    }

    #[test]
    fn test_unknown_column() {
        let err = UnivariateAnalyzer::default()
            .describe(&frame(), "weather", None)
            .unwrap_err();
        assert!(matches!(err, StatsError::ColumnNotFound(_)));
    }
}
