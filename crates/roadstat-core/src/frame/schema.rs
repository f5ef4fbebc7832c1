//! Declared column schema.
//!
//! Column kinds are fixed once at ingestion from an explicit schema and never
//! re-inferred from the data or from column names by the analyzers.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Canonical name of the occurrence date-time column.
pub const TIMESTAMP: &str = "timestamp";
/// Canonical name of the province column.
pub const PROVINCE: &str = "province";
/// Canonical name of the weekday column (derived from the timestamp).
pub const WEEKDAY_NAME: &str = "weekday_name";
/// Canonical name of the road type column.
pub const ROAD_TYPE: &str = "road_type";
/// Canonical name of the injured count column.
pub const INJURED_COUNT: &str = "injured_count";
/// Canonical name of the death count column.
pub const DEATH_COUNT: &str = "death_count";
/// Canonical name of the estimated speed column.
pub const ESTIMATED_SPEED: &str = "estimated_speed";
/// Derived hour of day (0-23).
pub const HOUR_OF_DAY: &str = "hour_of_day";
/// Derived calendar day (date without time).
pub const CALENDAR_DAY: &str = "calendar_day";
/// Derived fatality flag (1 when `death_count > 0`).
pub const IS_FATAL: &str = "is_fatal";

/// Columns computed at ingestion; input values under these names are ignored.
pub const DERIVED_COLUMNS: [&str; 4] = [WEEKDAY_NAME, HOUR_OF_DAY, CALENDAR_DAY, IS_FATAL];

/// Weekday names in canonical (Monday-first) order.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Header aliases accepted at ingestion, matched after lowercasing and
/// folding accented vowels.
const HEADER_ALIASES: [(&str, &[&str]); 7] = [
    (TIMESTAMP, &["data_ora_incidente", "data_ora", "datetime", "date_time"]),
    (PROVINCE, &["provincia"]),
    (WEEKDAY_NAME, &["giorno_settimana", "weekday"]),
    (ROAD_TYPE, &["tipo_strada"]),
    (INJURED_COUNT, &["numero_feriti", "feriti", "injured"]),
    (DEATH_COUNT, &["numero_morti", "morti", "deaths"]),
    (ESTIMATED_SPEED, &["velocita_media_stimata", "speed"]),
];

/// Kind of a column, which drives every analyzer's dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point values.
    Numeric,
    /// Labels compared by equality.
    Categorical,
    /// Date-time or date values.
    Temporal,
}

impl ColumnKind {
    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Temporal => "temporal",
        }
    }
}

/// How a numeric column is bucketed in frequency tables.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "rule", content = "width")]
pub enum Binning {
    /// Distinct values, or equal-width classes past the distinct-value threshold.
    #[default]
    Auto,
    /// Bands aligned to multiples of the width (e.g. 10 km/h speed bands).
    FixedWidth(f64),
}

/// Declaration of a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
    #[serde(default)]
    pub binning: Binning,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
            binning: Binning::Auto,
        }
    }

    pub fn with_binning(mut self, binning: Binning) -> Self {
        self.binning = binning;
        self
    }
}

/// Ordered set of column declarations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnSchema {
    columns: Vec<ColumnSpec>,
}

impl ColumnSchema {
    /// Empty schema; `timestamp` and `province` are always added at ingestion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema of the accident record.
    pub fn accidents() -> Self {
        Self::new()
            .with_column(TIMESTAMP, ColumnKind::Temporal)
            .with_column(PROVINCE, ColumnKind::Categorical)
            .with_column(ROAD_TYPE, ColumnKind::Categorical)
            .with_column(INJURED_COUNT, ColumnKind::Numeric)
            .with_column(DEATH_COUNT, ColumnKind::Numeric)
            .with_spec(
                ColumnSpec::new(ESTIMATED_SPEED, ColumnKind::Numeric)
                    .with_binning(Binning::FixedWidth(10.0)),
            )
    }

    /// Schema declaring the given columns numeric and everything else
    /// categorical.
    pub fn from_numeric_columns<I, S>(numeric: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        numeric
            .into_iter()
            .fold(Self::new(), |schema, name| {
                schema.with_column(canonical_column_name(name.as_ref()), ColumnKind::Numeric)
            })
    }

    /// Declare (or redeclare) a column.
    pub fn with_column(self, name: impl Into<String>, kind: ColumnKind) -> Self {
        self.with_spec(ColumnSpec::new(name, kind))
    }

    /// Declare (or redeclare) a column from a full spec.
    pub fn with_spec(mut self, spec: ColumnSpec) -> Self {
        match self.columns.iter_mut().find(|c| c.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.columns.push(spec),
        }
        self
    }

    /// Look up a column declaration.
    pub fn get(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Declared kind of a column, if declared.
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.get(name).map(|c| c.kind)
    }

    /// Binning rule of a column (Auto when undeclared).
    pub fn binning_of(&self, name: &str) -> Binning {
        self.get(name).map(|c| c.binning).unwrap_or_default()
    }

    /// Names of the numeric columns, in declaration order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// All declarations in order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }
}

/// Map an input header to its canonical column name.
///
/// Unknown headers are returned trimmed and otherwise unchanged.
///
/// # Example
///
/// ```rust
/// use roadstat_core::frame::schema::canonical_column_name;
///
/// assert_eq!(canonical_column_name("Provincia"), "province");
/// assert_eq!(canonical_column_name("Velocità_Media_Stimata"), "estimated_speed");
/// assert_eq!(canonical_column_name("weather"), "weather");
/// ```
pub fn canonical_column_name(header: &str) -> String {
    let folded = fold_header(header);
    HEADER_ALIASES
        .iter()
        .find(|(canonical, aliases)| *canonical == folded || aliases.contains(&folded.as_str()))
        .map(|(canonical, _)| canonical.to_string())
        .unwrap_or_else(|| header.trim().to_string())
}

fn fold_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'à' | 'á' => 'a',
            'è' | 'é' => 'e',
            'ì' | 'í' => 'i',
            'ò' | 'ó' => 'o',
            'ù' | 'ú' => 'u',
            ' ' | '-' => '_',
            other => other,
        })
        .collect()
}

/// Canonical name of a weekday.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAY_NAMES[weekday.num_days_from_monday() as usize]
}

/// Position of a weekday name in canonical order, if it is one.
pub fn weekday_position(name: &str) -> Option<usize> {
    WEEKDAY_NAMES.iter().position(|w| w.eq_ignore_ascii_case(name))
}
