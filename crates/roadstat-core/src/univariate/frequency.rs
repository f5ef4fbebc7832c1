//! Frequency table construction.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike};
use tracing::debug;

use crate::frame::schema::{WEEKDAY_NAMES, weekday_name, weekday_position};
use crate::frame::{Binning, TemporalValues};
use crate::types::{FrequencyTable, TemporalGranularity};
use crate::utils::{format_value, sorted};

/// Label of the bucket that absorbs the categories dropped by
/// [`FrequencyTable::collapse`].
pub const OTHER_LABEL: &str = "Other";

/// Upper bound on fixed-width bands before falling back to equal-width
/// classes.
const MAX_FIXED_BANDS: usize = 1000;

/// Sturges' rule: `ceil(log2 n) + 1` classes.
pub fn sturges_bins(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    (n as f64).log2().ceil() as usize + 1
}

/// Frequency table of numeric values.
///
/// `values` must be non-missing. Columns with a fixed-width rule are banded;
/// otherwise columns with more than `distinct_threshold` distinct values are
/// split into `min(sturges, max_bins)` equal-width classes, and the rest are
/// listed value by value in numeric order.
pub fn numeric_table(
    values: &[f64],
    binning: Binning,
    distinct_threshold: usize,
    max_bins: usize,
) -> FrequencyTable {
    let sorted = sorted(values);

    if let Binning::FixedWidth(width) = binning {
        if let Some(table) = fixed_width_table(&sorted, width) {
            return table;
        }
        debug!(
            "Fixed-width binning (width {}) not applicable, using equal-width classes",
            width
        );
        return equal_width_table(&sorted, sturges_bins(sorted.len()).min(max_bins));
    }

    let distinct = count_distinct(&sorted);
    if distinct > distinct_threshold {
        let bins = sturges_bins(sorted.len()).min(max_bins);
        debug!(
            "{} distinct values exceed threshold {}, binning into {} classes",
            distinct, distinct_threshold, bins
        );
        return equal_width_table(&sorted, bins);
    }

    let mut counts: Vec<(String, usize)> = Vec::with_capacity(distinct);
    let mut previous: Option<f64> = None;
    for value in &sorted {
        if previous == Some(*value) {
            if let Some((_, count)) = counts.last_mut() {
                *count += 1;
            }
        } else {
            counts.push((format_value(*value), 1));
        }
        previous = Some(*value);
    }
    FrequencyTable::from_counts(counts, false)
}

fn count_distinct(sorted: &[f64]) -> usize {
    if sorted.is_empty() {
        return 0;
    }
    1 + sorted.windows(2).filter(|w| w[0] != w[1]).count()
}

fn fixed_width_table(sorted: &[f64], width: f64) -> Option<FrequencyTable> {
    if !(width.is_finite() && width > 0.0) {
        return None;
    }
    let (first, last) = (*sorted.first()?, *sorted.last()?);
    let first_band = (first / width).floor();
    let last_band = (last / width).floor();
    // Checked as f64 so extreme spans never reach the integer cast
    let span = last_band - first_band;
    if !span.is_finite() || span >= MAX_FIXED_BANDS as f64 {
        return None;
    }
    let band_count = span as usize + 1;

    let mut counts = vec![0usize; band_count];
    for value in sorted {
        let band = ((value / width).floor() - first_band) as usize;
        counts[band.min(band_count - 1)] += 1;
    }

    let rows = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lower = (first_band + i as f64) * width;
            (band_label(lower, lower + width, false), count)
        })
        .collect();
    Some(FrequencyTable::from_counts(rows, true))
}

fn equal_width_table(sorted: &[f64], bins: usize) -> FrequencyTable {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return FrequencyTable::from_counts(Vec::new(), true);
    };
    if max == min || bins <= 1 {
        return FrequencyTable::from_counts(
            vec![(band_label(min, max, true), sorted.len())],
            true,
        );
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in sorted {
        let index = ((value - min) / width).floor() as usize;
        counts[index.min(bins - 1)] += 1;
    }

    let rows = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let lower = min + width * i as f64;
            let upper = if i + 1 == bins { max } else { lower + width };
            (band_label(lower, upper, i + 1 == bins), count)
        })
        .collect();
    FrequencyTable::from_counts(rows, true)
}

fn band_label(lower: f64, upper: f64, closed: bool) -> String {
    let close = if closed { ']' } else { ')' };
    format!("[{}, {}{}", format_edge(lower), format_edge(upper), close)
}

fn format_edge(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format_value(rounded)
}

/// Frequency table of category labels.
///
/// Labels are ordered lexicographically, except that a set of labels made
/// only of weekday names follows Monday to Sunday order.
pub fn categorical_table(values: &[&str]) -> FrequencyTable {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(*value).or_insert(0) += 1;
    }

    let mut ordered: Vec<(&str, usize)> = counts.into_iter().collect();
    if ordered.iter().all(|(label, _)| weekday_position(label).is_some()) {
        ordered.sort_by_key(|(label, _)| weekday_position(label));
    } else {
        ordered.sort_by(|a, b| a.0.cmp(b.0));
    }

    FrequencyTable::from_counts(
        ordered
            .into_iter()
            .map(|(label, count)| (label.to_string(), count))
            .collect(),
        false,
    )
}

/// Counts of date-times per temporal bucket, in chronological order.
///
/// Weekday tables always list all seven days.
pub fn temporal_table(
    values: &[NaiveDateTime],
    granularity: TemporalGranularity,
) -> FrequencyTable {
    if granularity == TemporalGranularity::Weekday {
        let mut counts = [0usize; 7];
        for value in values {
            counts[value.weekday().num_days_from_monday() as usize] += 1;
        }
        return FrequencyTable::from_counts(
            WEEKDAY_NAMES
                .iter()
                .zip(counts)
                .map(|(name, count)| (name.to_string(), count))
                .collect(),
            false,
        );
    }

    // Zero-padded keys sort chronologically as strings.
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for value in values {
        let key = match granularity {
            TemporalGranularity::Year => format!("{:04}", value.year()),
            TemporalGranularity::Month => format!("{:04}-{:02}", value.year(), value.month()),
            TemporalGranularity::Day => value.format("%Y-%m-%d").to_string(),
            TemporalGranularity::Hour => format!("{:02}", value.hour()),
            TemporalGranularity::Weekday => weekday_name(value.weekday()).to_string(),
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    FrequencyTable::from_counts(counts.into_iter().collect(), false)
}

/// Date-times of a temporal column (dates at midnight).
pub(crate) fn temporal_datetimes(values: TemporalValues<'_>) -> Vec<NaiveDateTime> {
    match values {
        TemporalValues::DateTime(values) => values.to_vec(),
        TemporalValues::Date(values) => values
            .iter()
            .map(|d| d.and_time(NaiveTime::MIN))
            .collect(),
    }
}

impl FrequencyTable {
    /// Keep the `limit - 1` most frequent buckets and merge the rest into
    /// an "Other" bucket.
    ///
    /// Kept buckets are ordered by decreasing frequency (ties keep their
    /// original order). Tables with at most `limit` buckets are returned
    /// unchanged.
    pub fn collapse(&self, limit: usize) -> FrequencyTable {
        let limit = limit.max(2);
        if self.rows.len() <= limit {
            return self.clone();
        }

        let mut ranked: Vec<(String, usize)> = self
            .rows
            .iter()
            .map(|r| (r.label.clone(), r.absolute))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        let other: usize = ranked[limit - 1..].iter().map(|(_, count)| count).sum();
        ranked.truncate(limit - 1);
        ranked.push((OTHER_LABEL.to_string(), other));
        FrequencyTable::from_counts(ranked, self.binned)
    }
}
