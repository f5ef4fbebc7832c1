//! Shared utilities for ingestion and the analyzers.
//!
//! This module contains the "parse or null" helpers used at ingestion and the
//! small numeric building blocks (mean, variance, quantiles) every analyzer
//! needs, so that precondition handling stays consistent across modules.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::{Result, StatsError};

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 5] = ['$', '%', '€', '£', ' '];

// Comma used only as a thousands separator: "1,200" or "12,345,678.5"
static THOUSANDS_GROUPING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("Invalid regex: thousands grouping")
});

/// Unit suffixes that may trail a numeric cell.
pub const UNIT_SUFFIXES: [&str; 3] = ["km/h", "kmh", "kph"];

/// Common missing value markers in data.
pub const MISSING_MARKERS: [&str; 11] = [
    "", "na", "n/a", "nan", "nat", "null", "none", "missing", "unknown", "-", "#n/a",
];

/// Timestamp layouts accepted at ingestion, tried in order.
const DATETIME_FORMATS: [&str; 7] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Check if a string is a missing-value marker.
///
/// # Example
///
/// ```rust
/// use roadstat_core::utils::is_missing_marker;
///
/// assert!(is_missing_marker("N/A"));
/// assert!(is_missing_marker("  "));
/// assert!(!is_missing_marker("42"));
/// ```
pub fn is_missing_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    MISSING_MARKERS.iter().any(|&marker| lower == marker)
}

/// Clean a string for numeric parsing by removing formatting characters
/// and unit suffixes.
///
/// Commas are removed only when they group thousands. Any other comma,
/// such as the decimal comma in `"72,5"`, is kept so the cell fails to
/// parse and becomes missing.
///
/// # Example
///
/// ```rust
/// use roadstat_core::utils::clean_numeric_string;
///
/// assert_eq!(clean_numeric_string("1,234"), "1234");
/// assert_eq!(clean_numeric_string(" 90 km/h "), "90");
/// assert_eq!(clean_numeric_string("72,5"), "72,5");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_ascii_lowercase();
    for suffix in UNIT_SUFFIXES {
        if let Some(stripped) = result.strip_suffix(suffix) {
            result = stripped.to_string();
        }
    }
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    if THOUSANDS_GROUPING.is_match(&result) {
        result = result.replace(',', "");
    }
    result
}

/// Parse a cell as a finite number, or `None` ("parse or null").
pub fn parse_numeric(s: &str) -> Option<f64> {
    if is_missing_marker(s) {
        return None;
    }
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a cell as a date-time, or `None` ("parse or null").
///
/// Date-only values are read as midnight of that day.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if is_missing_marker(trimmed) {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_local());
    }

    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Trim a categorical cell, mapping missing markers to `None`.
pub fn parse_category(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if is_missing_marker(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Format a numeric value as a bucket label: integers without decimals.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

// =============================================================================
// Numeric Utilities
// =============================================================================

/// Sort floats ascending using a total order.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance with Bessel's correction (ddof = 1), `None` below 2 values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
    Some(sum_sq / (values.len() as f64 - 1.0))
}

/// Quantile of sorted values using linear interpolation between order
/// statistics.
pub fn quantile_sorted(values: &[f64], quantile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let pos = quantile.clamp(0.0, 1.0) * (values.len() as f64 - 1.0);
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return values[lower];
    }
    let weight = pos - lower as f64;
    values[lower] + (values[upper] - values[lower]) * weight
}

/// Median of unsorted values, `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(quantile_sorted(&sorted(values), 0.5))
}

// =============================================================================
// Distribution Utilities
// =============================================================================

/// Standard Student's t distribution with `df` degrees of freedom.
pub fn students_t(df: f64) -> Result<StudentsT> {
    StudentsT::new(0.0, 1.0, df)
        .map_err(|e| StatsError::Distribution(format!("Student's t with {df} df: {e}")))
}

/// Two-sided p-value of a t statistic.
pub fn two_sided_t_p_value(t: f64, df: f64) -> Result<f64> {
    let dist = students_t(df)?;
    Ok((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}
