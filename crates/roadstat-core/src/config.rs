//! Configuration types for the analyzers.
//!
//! This module provides the tunable constants of the statistical procedures
//! using the builder pattern for flexible and ergonomic setup.

use serde::{Deserialize, Serialize};

/// Configuration shared by the univariate, bivariate and inference analyzers.
///
/// Use [`AnalysisConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust
/// use roadstat_core::config::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .max_bins(10)
///     .daytime_hours(6, 20)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_bins, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Numeric columns with more distinct values than this are binned into
    /// equal-width classes instead of listed value by value.
    /// Default: 25
    pub distinct_value_threshold: usize,

    /// Upper bound on the number of equal-width classes.
    /// Default: 15
    pub max_bins: usize,

    /// Maximum number of buckets kept when collapsing a frequency table into
    /// top categories plus "Other".
    /// Default: 20
    pub category_limit: usize,

    /// Number of standard deviations for the Chebyshev interval.
    /// Default: 2.0
    pub chebyshev_k: f64,

    /// First hour (inclusive) counted as daytime for the t-test.
    /// Default: 7
    pub daytime_start_hour: u32,

    /// Last hour (inclusive) counted as daytime for the t-test.
    /// Default: 19
    pub daytime_end_hour: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            distinct_value_threshold: 25,
            max_bins: 15,
            category_limit: 20,
            chebyshev_k: 2.0,
            daytime_start_hour: 7,
            daytime_end_hour: 19,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_bins == 0 {
            return Err(ConfigValidationError::InvalidBinCount(self.max_bins));
        }

        if self.category_limit < 2 {
            return Err(ConfigValidationError::InvalidCategoryLimit(
                self.category_limit,
            ));
        }

        if !(self.chebyshev_k.is_finite() && self.chebyshev_k > 1.0) {
            return Err(ConfigValidationError::InvalidChebyshevK(self.chebyshev_k));
        }

        if self.daytime_start_hour > 23
            || self.daytime_end_hour > 23
            || self.daytime_start_hour > self.daytime_end_hour
        {
            return Err(ConfigValidationError::InvalidDaytimeWindow {
                start: self.daytime_start_hour,
                end: self.daytime_end_hour,
            });
        }

        Ok(())
    }

    /// Whether an hour of day falls in the configured daytime band.
    pub fn is_daytime(&self, hour: u32) -> bool {
        (self.daytime_start_hour..=self.daytime_end_hour).contains(&hour)
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid max_bins: {0} (must be at least 1)")]
    InvalidBinCount(usize),

    #[error("Invalid category_limit: {0} (must be at least 2)")]
    InvalidCategoryLimit(usize),

    #[error("Invalid chebyshev_k: {0} (must be a finite value greater than 1)")]
    InvalidChebyshevK(f64),

    #[error("Invalid daytime window {start}-{end} (hours must be 0-23 and start <= end)")]
    InvalidDaytimeWindow { start: u32, end: u32 },
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    distinct_value_threshold: Option<usize>,
    max_bins: Option<usize>,
    category_limit: Option<usize>,
    chebyshev_k: Option<f64>,
    daytime_start_hour: Option<u32>,
    daytime_end_hour: Option<u32>,
}

impl AnalysisConfigBuilder {
    /// Set the distinct-value count above which numeric columns are binned.
    pub fn distinct_value_threshold(mut self, threshold: usize) -> Self {
        self.distinct_value_threshold = Some(threshold);
        self
    }

    /// Set the maximum number of equal-width classes.
    pub fn max_bins(mut self, bins: usize) -> Self {
        self.max_bins = Some(bins);
        self
    }

    /// Set the bucket limit used when collapsing frequency tables.
    pub fn category_limit(mut self, limit: usize) -> Self {
        self.category_limit = Some(limit);
        self
    }

    /// Set the Chebyshev multiplier `k`.
    pub fn chebyshev_k(mut self, k: f64) -> Self {
        self.chebyshev_k = Some(k);
        self
    }

    /// Set the inclusive daytime hour band used by the t-test.
    ///
    /// # Arguments
    /// * `start` - First daytime hour (0-23)
    /// * `end` - Last daytime hour (0-23, not before `start`)
    pub fn daytime_hours(mut self, start: u32, end: u32) -> Self {
        self.daytime_start_hour = Some(start);
        self.daytime_end_hour = Some(end);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let defaults = AnalysisConfig::default();
        let config = AnalysisConfig {
            distinct_value_threshold: self
                .distinct_value_threshold
                .unwrap_or(defaults.distinct_value_threshold),
            max_bins: self.max_bins.unwrap_or(defaults.max_bins),
            category_limit: self.category_limit.unwrap_or(defaults.category_limit),
            chebyshev_k: self.chebyshev_k.unwrap_or(defaults.chebyshev_k),
            daytime_start_hour: self
                .daytime_start_hour
                .unwrap_or(defaults.daytime_start_hour),
            daytime_end_hour: self.daytime_end_hour.unwrap_or(defaults.daytime_end_hour),
        };

        config.validate()?;
        Ok(config)
    }
}
