//! Inferential procedures over a [`DatasetFrame`].
//!
//! Three fixed procedures are offered, each scoped to a subgroup:
//!
//! - **Poisson**: probability of `k` incidents in an hour window on a day in
//!   a province
//! - **Welch's t-test**: a numeric column, daytime against nighttime
//! - **Confidence interval**: mean daily incident count of a province
//!
//! # Example
//!
//! ```rust,ignore
//! use roadstat_core::{AnalysisConfig, InferenceEngine};
//!
//! let engine = InferenceEngine::new(&AnalysisConfig::default());
//! let estimate = engine.poisson_probability(&frame, "Roma", 8, 9, 1)?;
//! println!("P(X = 1) = {:.4}", estimate.probability);
//! ```

pub mod interval;
pub mod poisson;
pub mod ttest;

pub use interval::interval_from_counts;
pub use poisson::{HourWindow, poisson_estimate};
pub use ttest::{WelchStatistics, welch_from_samples};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::frame::DatasetFrame;
use crate::frame::schema::INJURED_COUNT;
use crate::types::{ConfidenceInterval, PoissonEstimate, TTestResult};

/// Runs the inferential procedures with a given configuration.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    config: AnalysisConfig,
}

impl Default for InferenceEngine {
    fn default() -> Self {
        Self::new(&AnalysisConfig::default())
    }
}

impl InferenceEngine {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Probability of exactly `k` incidents between `hour_start` and
    /// `hour_end` (inclusive) on a day in `province`.
    pub fn poisson_probability(
        &self,
        frame: &DatasetFrame,
        province: &str,
        hour_start: u32,
        hour_end: u32,
        k: u64,
    ) -> Result<PoissonEstimate> {
        let window = HourWindow::new(hour_start, hour_end)?;
        poisson_estimate(frame, province, window, k)
    }

    /// Welch's t-test of `column` between daytime and nighttime records.
    pub fn welch_t_test(&self, frame: &DatasetFrame, column: &str) -> Result<TTestResult> {
        ttest::welch_t_test(frame, column, &self.config)
    }

    /// Welch's t-test on `injured_count`.
    pub fn injured_t_test(&self, frame: &DatasetFrame) -> Result<TTestResult> {
        self.welch_t_test(frame, INJURED_COUNT)
    }

    /// Confidence interval for the mean daily incident count in `province`.
    pub fn confidence_interval(
        &self,
        frame: &DatasetFrame,
        province: &str,
        level: u8,
    ) -> Result<ConfidenceInterval> {
        interval::confidence_interval(frame, province, level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::test_support::accident;
    use crate::frame::{ColumnSchema, ingest};

    fn frame() -> DatasetFrame {
        let rows = vec![
            accident("2024-01-01 08:00:00", "Roma", "1", "0"),
            accident("2024-01-01 09:00:00", "Roma", "2", "0"),
            accident("2024-01-01 10:00:00", "Roma", "1", "0"),
            accident("2024-01-02 12:00:00", "Roma", "3", "0"),
            accident("2024-01-02 21:00:00", "Roma", "5", "0"),
            accident("2024-01-03 22:00:00", "Roma", "4", "0"),
            accident("2024-01-03 02:00:00", "Roma", "6", "1"),
        ];
        ingest(&rows, &ColumnSchema::accidents()).unwrap()
    }

    #[test]
    fn test_engine_t_test_scenario() {
        let result = InferenceEngine::default().injured_t_test(&frame()).unwrap();
        assert_eq!(result.group_a_n, 4);
        assert_eq!(result.group_b_n, 3);
        assert!(result.t_statistic < 0.0);
        assert!(result.p_value < 0.05);
        assert_eq!(result.group_b_label, "nighttime");
    }

    #[test]
    fn test_engine_configured_daytime() {
        let config = AnalysisConfig::builder()
            .daytime_hours(9, 12)
            .build()
            .unwrap();
        let result = InferenceEngine::new(&config)
            .welch_t_test(&frame(), INJURED_COUNT)
            .unwrap();
        // 09, 10 and 12 are daytime
        assert_eq!(result.group_a_n, 3);
        assert_eq!(result.group_a_label, "daytime (09:00-12:59)");
    }

    #[test]
    fn test_engine_poisson_validates_window() {
        let engine = InferenceEngine::default();
        assert!(engine.poisson_probability(&frame(), "Roma", 10, 8, 0).is_err());
        assert!(engine.poisson_probability(&frame(), "Roma", 0, 24, 0).is_err());

        let estimate = engine.poisson_probability(&frame(), "Roma", 8, 10, 3).unwrap();
        assert_eq!(estimate.observation_days, 3);
        assert_eq!(estimate.events_in_window, 3);
        assert_eq!(estimate.lambda, 1.0);
    }

    #[test]
    fn test_engine_confidence_interval() {
        // Daily counts 3, 2, 2
        let ci = InferenceEngine::default()
            .confidence_interval(&frame(), "Roma", 90)
            .unwrap();
        assert_eq!(ci.n, 3);
        assert!(ci.lower_bound < ci.mean && ci.mean < ci.upper_bound);
    }
}
