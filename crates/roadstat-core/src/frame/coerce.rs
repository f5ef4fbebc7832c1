//! Cell coercion for ingestion.
//!
//! Each declared kind has a "parse or null" converter: entries that cannot be
//! read as the declared kind become missing and are counted, never rejected.

use chrono::NaiveDateTime;

use super::schema::ColumnKind;
use crate::utils::{is_missing_marker, parse_category, parse_numeric, parse_timestamp};

/// Values of a non-temporal column, one entry per retained record.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl ColumnValues {
    /// Empty storage for a declared kind.
    ///
    /// Temporal is only meaningful for `timestamp`; any other column declared
    /// temporal is stored as categorical text.
    pub(crate) fn for_kind(kind: ColumnKind, capacity: usize) -> Self {
        match kind {
            ColumnKind::Numeric => Self::Numeric(Vec::with_capacity(capacity)),
            ColumnKind::Categorical | ColumnKind::Temporal => {
                Self::Categorical(Vec::with_capacity(capacity))
            }
        }
    }

    /// Kind actually stored.
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Numeric(_) => ColumnKind::Numeric,
            Self::Categorical(_) => ColumnKind::Categorical,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of missing entries.
    pub fn null_count(&self) -> usize {
        match self {
            Self::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            Self::Categorical(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Coerce one raw cell and append it. Returns `true` when a present,
    /// non-marker cell had to be coerced to missing.
    pub(crate) fn push_raw(&mut self, raw: Option<&str>) -> bool {
        match self {
            Self::Numeric(values) => {
                let parsed = raw.and_then(parse_numeric);
                values.push(parsed);
                parsed.is_none() && raw.is_some_and(|r| !is_missing_marker(r))
            }
            Self::Categorical(values) => {
                values.push(raw.and_then(parse_category));
                false
            }
        }
    }
}

/// Counters collected while coercing a batch of rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CoercionStats {
    pub missing_timestamp: usize,
    pub unparseable_timestamp: usize,
    pub missing_province: usize,
    pub coerced_to_null: usize,
}

impl CoercionStats {
    pub fn dropped(&self) -> usize {
        self.missing_timestamp + self.unparseable_timestamp + self.missing_province
    }

    /// Human-readable breakdown of why rows were dropped.
    pub fn drop_reason(&self) -> String {
        let mut parts = Vec::new();
        if self.missing_timestamp > 0 {
            parts.push(format!("{} without timestamp", self.missing_timestamp));
        }
        if self.unparseable_timestamp > 0 {
            parts.push(format!(
                "{} with unparseable timestamp",
                self.unparseable_timestamp
            ));
        }
        if self.missing_province > 0 {
            parts.push(format!("{} without province", self.missing_province));
        }
        if parts.is_empty() {
            "no input rows".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Required fields of one row, or the reason it is dropped.
pub(crate) fn required_fields(
    timestamp: Option<&str>,
    province: Option<&str>,
    stats: &mut CoercionStats,
) -> Option<(NaiveDateTime, String)> {
    let timestamp = match timestamp {
        None => {
            stats.missing_timestamp += 1;
            return None;
        }
        Some(raw) if is_missing_marker(raw) => {
            stats.missing_timestamp += 1;
            return None;
        }
        Some(raw) => match parse_timestamp(raw) {
            Some(ts) => ts,
            None => {
                stats.unparseable_timestamp += 1;
                return None;
            }
        },
    };

    match province.and_then(parse_category) {
        Some(province) => Some((timestamp, province)),
        None => {
            stats.missing_province += 1;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_push_counts_coercions() {
        let mut values = ColumnValues::for_kind(ColumnKind::Numeric, 4);
        assert!(!values.push_raw(Some("3")));
        assert!(values.push_raw(Some("abc")));
        assert!(!values.push_raw(Some("N/A")));
        assert!(!values.push_raw(None));

        assert_eq!(
            values,
            ColumnValues::Numeric(vec![Some(3.0), None, None, None])
        );
        assert_eq!(values.null_count(), 3);
    }

    #[test]
    fn test_categorical_push_trims() {
        let mut values = ColumnValues::for_kind(ColumnKind::Categorical, 2);
        values.push_raw(Some(" Urban "));
        values.push_raw(Some(""));
        assert_eq!(
            values,
            ColumnValues::Categorical(vec![Some("Urban".to_string()), None])
        );
    }

    #[test]
    fn test_required_fields_drop_reasons() {
        let mut stats = CoercionStats::default();
        assert!(required_fields(None, Some("Roma"), &mut stats).is_none());
        assert!(required_fields(Some("soon"), Some("Roma"), &mut stats).is_none());
        assert!(required_fields(Some("2024-01-01 10:00:00"), Some(" "), &mut stats).is_none());
        let kept = required_fields(Some("2024-01-01 10:00:00"), Some("Roma"), &mut stats);
        assert!(kept.is_some());

        assert_eq!(stats.dropped(), 3);
        assert_eq!(
            stats.drop_reason(),
            "1 without timestamp, 1 with unparseable timestamp, 1 without province"
        );
    }
}
