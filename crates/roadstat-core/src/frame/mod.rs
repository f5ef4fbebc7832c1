//! The cleaned, immutable dataset every analyzer reads.
//!
//! A [`DatasetFrame`] is built once by [`ingest`] from raw string rows:
//! headers are canonicalized, declared numeric columns are coerced
//! "parse or null", rows without a valid timestamp or province are dropped,
//! and the derived columns (`weekday_name`, `hour_of_day`, `calendar_day`,
//! `is_fatal`) are computed exactly once.

pub mod coerce;
pub mod loader;
pub mod schema;

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use polars::prelude::*;
use tracing::{debug, info, warn};

pub use coerce::ColumnValues;
use coerce::{CoercionStats, required_fields};
pub use loader::{parse_csv, read_csv, rows_from_dataframe};
use schema::{
    CALENDAR_DAY, DEATH_COUNT, DERIVED_COLUMNS, HOUR_OF_DAY, IS_FATAL, PROVINCE, TIMESTAMP,
    WEEKDAY_NAME, canonical_column_name, weekday_name,
};
pub use schema::{Binning, ColumnKind, ColumnSchema, ColumnSpec};

use crate::error::{Result, ResultExt, StatsError};
use crate::utils::format_value;

/// One input record: header to raw cell text. Absent keys are missing cells.
pub type RawRow = HashMap<String, String>;

/// Layout used when projecting timestamps back to text.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A stored non-temporal column.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameColumn {
    pub name: String,
    pub values: ColumnValues,
}

/// Borrowed view of a temporal column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemporalValues<'a> {
    DateTime(&'a [NaiveDateTime]),
    Date(&'a [NaiveDate]),
}

/// Values of any column, typed by its declared kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData<'a> {
    Numeric(Cow<'a, [Option<f64>]>),
    Categorical(Cow<'a, [Option<String>]>),
    Temporal(TemporalValues<'a>),
}

impl ColumnData<'_> {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Numeric(_) => ColumnKind::Numeric,
            Self::Categorical(_) => ColumnKind::Categorical,
            Self::Temporal(_) => ColumnKind::Temporal,
        }
    }
}

/// Cleaned accident dataset with derived columns.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetFrame {
    schema: ColumnSchema,
    timestamps: Vec<NaiveDateTime>,
    provinces: Vec<String>,
    weekdays: Vec<&'static str>,
    hours: Vec<u32>,
    days: Vec<NaiveDate>,
    columns: Vec<FrameColumn>,
    is_fatal: Option<Vec<Option<f64>>>,
    dropped_rows: usize,
}

static_assertions::assert_impl_all!(DatasetFrame: Send, Sync);

/// Build a [`DatasetFrame`] from raw rows under a declared schema.
///
/// # Errors
///
/// Returns [`StatsError::EmptyDataset`] when no row has both a parseable
/// timestamp and a non-empty province.
///
/// # Example
///
/// ```rust
/// use roadstat_core::frame::{ColumnSchema, RawRow, ingest};
///
/// let row: RawRow = [
///     ("Data_Ora_Incidente", "2024-03-15 08:30:00"),
///     ("Provincia", "Roma"),
///     ("Numero_Feriti", "2"),
/// ]
/// .into_iter()
/// .map(|(k, v)| (k.to_string(), v.to_string()))
/// .collect();
///
/// let frame = ingest(&[row], &ColumnSchema::accidents()).unwrap();
/// assert_eq!(frame.len(), 1);
/// assert_eq!(frame.hours(), &[8]);
/// ```
pub fn ingest(rows: &[RawRow], schema: &ColumnSchema) -> Result<DatasetFrame> {
    debug!("Ingesting {} raw rows", rows.len());

    let canonical_rows: Vec<HashMap<String, &str>> = rows.iter().map(canonicalize_row).collect();
    let extra_specs = extra_column_specs(&canonical_rows, schema);

    let mut stats = CoercionStats::default();
    let mut timestamps = Vec::with_capacity(rows.len());
    let mut provinces = Vec::with_capacity(rows.len());
    let mut columns: Vec<FrameColumn> = extra_specs
        .iter()
        .map(|spec| FrameColumn {
            name: spec.name.clone(),
            values: ColumnValues::for_kind(spec.kind, rows.len()),
        })
        .collect();
    let mut coerced_per_column = vec![0usize; columns.len()];

    for row in &canonical_rows {
        let Some((timestamp, province)) = required_fields(
            row.get(TIMESTAMP).copied(),
            row.get(PROVINCE).copied(),
            &mut stats,
        ) else {
            continue;
        };

        timestamps.push(timestamp);
        provinces.push(province);
        for (column, coerced) in columns.iter_mut().zip(coerced_per_column.iter_mut()) {
            if column.values.push_raw(row.get(&column.name).copied()) {
                *coerced += 1;
            }
        }
    }

    let dropped_rows = stats.dropped();
    if timestamps.is_empty() {
        warn!(
            "Ingestion left no valid records ({} rows dropped)",
            dropped_rows
        );
        return Err(StatsError::EmptyDataset {
            dropped_count: dropped_rows,
            reason: stats.drop_reason(),
        });
    }

    if dropped_rows > 0 {
        warn!(
            "Dropped {} of {} rows: {}",
            dropped_rows,
            rows.len(),
            stats.drop_reason()
        );
    }
    for (column, coerced) in columns.iter().zip(&coerced_per_column) {
        if *coerced > 0 {
            debug!(
                "Column '{}': {} non-numeric entries coerced to missing",
                column.name, coerced
            );
        }
    }
    stats.coerced_to_null = coerced_per_column.iter().sum();

    let weekdays = timestamps.iter().map(|ts| weekday_name(ts.weekday())).collect();
    let hours = timestamps.iter().map(|ts| ts.hour()).collect();
    let days = timestamps.iter().map(|ts| ts.date()).collect();
    let is_fatal = columns
        .iter()
        .find(|c| c.name == DEATH_COUNT)
        .and_then(|c| match &c.values {
            ColumnValues::Numeric(deaths) => Some(
                deaths
                    .iter()
                    .map(|d| d.map(|v| if v > 0.0 { 1.0 } else { 0.0 }))
                    .collect(),
            ),
            ColumnValues::Categorical(_) => None,
        });

    let frame = DatasetFrame {
        schema: effective_schema(&extra_specs, is_fatal.is_some()),
        timestamps,
        provinces,
        weekdays,
        hours,
        days,
        columns,
        is_fatal,
        dropped_rows,
    };

    info!(
        "Ingested {} records ({} dropped, {} cells coerced to missing)",
        frame.len(),
        dropped_rows,
        stats.coerced_to_null
    );

    Ok(frame)
}

fn canonicalize_row(row: &RawRow) -> HashMap<String, &str> {
    let mut canonical = HashMap::with_capacity(row.len());
    for (header, value) in row {
        let name = canonical_column_name(header);
        // An exact canonical header wins over an alias of the same column.
        if header.trim() == name {
            canonical.insert(name, value.as_str());
        } else {
            canonical.entry(name).or_insert(value.as_str());
        }
    }
    canonical
}

/// Specs of the stored extra columns: declared ones first (in declaration
/// order), then undeclared ones as categorical, sorted by name.
fn extra_column_specs(rows: &[HashMap<String, &str>], schema: &ColumnSchema) -> Vec<ColumnSpec> {
    let present: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .filter(|name| is_stored_extra(name))
        .collect();

    let mut specs: Vec<ColumnSpec> = schema
        .columns()
        .iter()
        .filter(|spec| present.contains(spec.name.as_str()))
        .map(|spec| {
            let mut spec = spec.clone();
            if spec.kind == ColumnKind::Temporal {
                spec.kind = ColumnKind::Categorical;
            }
            spec
        })
        .collect();

    for name in present {
        if schema.get(name).is_none() {
            specs.push(ColumnSpec::new(name, ColumnKind::Categorical));
        }
    }
    specs
}

fn is_stored_extra(name: &str) -> bool {
    name != TIMESTAMP && name != PROVINCE && !DERIVED_COLUMNS.contains(&name)
}

fn effective_schema(extra: &[ColumnSpec], has_fatal_flag: bool) -> ColumnSchema {
    let mut schema = ColumnSchema::new()
        .with_column(TIMESTAMP, ColumnKind::Temporal)
        .with_column(PROVINCE, ColumnKind::Categorical)
        .with_column(WEEKDAY_NAME, ColumnKind::Categorical);
    for spec in extra {
        schema = schema.with_spec(spec.clone());
    }
    schema = schema
        .with_column(HOUR_OF_DAY, ColumnKind::Numeric)
        .with_column(CALENDAR_DAY, ColumnKind::Temporal);
    if has_fatal_flag {
        schema = schema.with_column(IS_FATAL, ColumnKind::Numeric);
    }
    schema
}

impl DatasetFrame {
    /// Build a frame from any polars DataFrame (cells are read as text).
    pub fn from_dataframe(df: &DataFrame, schema: &ColumnSchema) -> Result<Self> {
        let rows = rows_from_dataframe(df)?;
        ingest(&rows, schema)
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Rows dropped during cleaning.
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Effective schema, derived columns included.
    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// All column names in schema order.
    pub fn column_names(&self) -> Vec<&str> {
        self.schema.columns().iter().map(|c| c.name.as_str()).collect()
    }

    /// Declared kind of a column.
    pub fn column_kind(&self, name: &str) -> Result<ColumnKind> {
        self.schema
            .kind_of(name)
            .ok_or_else(|| StatsError::ColumnNotFound(name.to_string()))
    }

    /// Binning rule of a column.
    pub fn binning(&self, name: &str) -> Binning {
        self.schema.binning_of(name)
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Province of each record.
    pub fn province_values(&self) -> &[String] {
        &self.provinces
    }

    pub fn hours(&self) -> &[u32] {
        &self.hours
    }

    pub fn calendar_days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn weekdays(&self) -> &[&'static str] {
        &self.weekdays
    }

    /// Sorted distinct provinces.
    pub fn provinces(&self) -> Vec<&str> {
        self.provinces
            .iter()
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Values of a column, typed by its kind.
    pub fn column(&self, name: &str) -> Result<ColumnData<'_>> {
        let data = match name {
            TIMESTAMP => ColumnData::Temporal(TemporalValues::DateTime(&self.timestamps)),
            CALENDAR_DAY => ColumnData::Temporal(TemporalValues::Date(&self.days)),
            PROVINCE => ColumnData::Categorical(Cow::Owned(
                self.provinces.iter().cloned().map(Some).collect(),
            )),
            WEEKDAY_NAME => ColumnData::Categorical(Cow::Owned(
                self.weekdays.iter().map(|w| Some(w.to_string())).collect(),
            )),
            HOUR_OF_DAY => ColumnData::Numeric(Cow::Owned(
                self.hours.iter().map(|h| Some(f64::from(*h))).collect(),
            )),
            IS_FATAL => match &self.is_fatal {
                Some(flags) => ColumnData::Numeric(Cow::Borrowed(flags)),
                None => return Err(StatsError::ColumnNotFound(name.to_string())),
            },
            _ => match self.columns.iter().find(|c| c.name == name) {
                Some(column) => match &column.values {
                    ColumnValues::Numeric(v) => ColumnData::Numeric(Cow::Borrowed(v)),
                    ColumnValues::Categorical(v) => ColumnData::Categorical(Cow::Borrowed(v)),
                },
                None => return Err(StatsError::ColumnNotFound(name.to_string())),
            },
        };
        Ok(data)
    }

    /// Values of a numeric column.
    pub fn numeric(&self, name: &str) -> Result<Cow<'_, [Option<f64>]>> {
        match self.column(name)? {
            ColumnData::Numeric(values) => Ok(values),
            other => Err(StatsError::InvalidParameter(format!(
                "column '{}' is {}, not numeric",
                name,
                other.kind().display_name()
            ))),
        }
    }

    /// Project the frame back to raw rows with canonical headers.
    ///
    /// Missing cells are omitted; derived columns other than `weekday_name`
    /// are not emitted since ingestion recomputes them.
    pub fn to_raw_rows(&self) -> Vec<RawRow> {
        (0..self.len())
            .map(|i| {
                let mut row = RawRow::new();
                row.insert(
                    TIMESTAMP.to_string(),
                    self.timestamps[i].format(TIMESTAMP_FORMAT).to_string(),
                );
                row.insert(PROVINCE.to_string(), self.provinces[i].clone());
                row.insert(WEEKDAY_NAME.to_string(), self.weekdays[i].to_string());
                for column in &self.columns {
                    let cell = match &column.values {
                        ColumnValues::Numeric(v) => v[i].map(format_value),
                        ColumnValues::Categorical(v) => v[i].clone(),
                    };
                    if let Some(cell) = cell {
                        row.insert(column.name.clone(), cell);
                    }
                }
                row
            })
            .collect()
    }

    /// Export the frame, derived columns included, as a polars DataFrame.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![
            Column::new(
                TIMESTAMP.into(),
                self.timestamps
                    .iter()
                    .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
                    .collect::<Vec<_>>(),
            ),
            Column::new(PROVINCE.into(), self.provinces.clone()),
            Column::new(
                WEEKDAY_NAME.into(),
                self.weekdays.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
            ),
        ];
        for column in &self.columns {
            let name: PlSmallStr = column.name.as_str().into();
            columns.push(match &column.values {
                ColumnValues::Numeric(v) => Column::new(name, v.clone()),
                ColumnValues::Categorical(v) => Column::new(name, v.clone()),
            });
        }
        columns.push(Column::new(HOUR_OF_DAY.into(), self.hours.clone()));
        columns.push(Column::new(
            CALENDAR_DAY.into(),
            self.days
                .iter()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .collect::<Vec<_>>(),
        ));
        if let Some(flags) = &self.is_fatal {
            columns.push(Column::new(IS_FATAL.into(), flags.clone()));
        }

        DataFrame::new(columns).context("Failed to build DataFrame from dataset")
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{accident, row};
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_rows() -> Vec<RawRow> {
        vec![
            row(&[
                ("Data_Ora_Incidente", "2024-03-11 08:30:00"),
                ("Provincia", "Roma"),
                ("Giorno_Settimana", "Friday"),
                ("Tipo_Strada", "Urban"),
                ("Numero_Feriti", "2"),
                ("Numero_Morti", "0"),
                ("Velocita_Media_Stimata", "45.5"),
            ]),
            row(&[
                ("Data_Ora_Incidente", "2024-03-12 21:10:00"),
                ("Provincia", "Milano"),
                ("Tipo_Strada", ""),
                ("Numero_Feriti", "abc"),
                ("Numero_Morti", "1"),
                ("Velocita_Media_Stimata", "N/A"),
            ]),
            row(&[
                ("Data_Ora_Incidente", "not a date"),
                ("Provincia", "Roma"),
            ]),
            row(&[("Data_Ora_Incidente", "2024-03-12 10:00:00"), ("Provincia", "")]),
        ]
    }

    // ==================== ingest tests ====================

    #[test]
    fn test_ingest_drops_invalid_rows() {
        let frame = ingest(&sample_rows(), &ColumnSchema::accidents()).unwrap();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.dropped_rows(), 2);
        assert_eq!(frame.provinces(), vec!["Milano", "Roma"]);
    }

    #[test]
    fn test_ingest_derives_columns() {
        let frame = ingest(&sample_rows(), &ColumnSchema::accidents()).unwrap();
        assert_eq!(frame.hours(), &[8, 21]);
        // Provided weekday is superseded by the derived one
        assert_eq!(frame.weekdays(), &["Monday", "Tuesday"]);
        assert_eq!(
            frame.calendar_days(),
            &[
                NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 12).unwrap()
            ]
        );
        assert_eq!(
            frame.numeric(IS_FATAL).unwrap().as_ref(),
            &[Some(0.0), Some(1.0)]
        );
    }

    #[test]
    fn test_ingest_parse_or_null() {
        let frame = ingest(&sample_rows(), &ColumnSchema::accidents()).unwrap();
        assert_eq!(
            frame.numeric("injured_count").unwrap().as_ref(),
            &[Some(2.0), None]
        );
        assert_eq!(
            frame.numeric("estimated_speed").unwrap().as_ref(),
            &[Some(45.5), None]
        );
        match frame.column("road_type").unwrap() {
            ColumnData::Categorical(values) => {
                assert_eq!(values.as_ref(), &[Some("Urban".to_string()), None])
            }
            other => panic!("unexpected column data {other:?}"),
        }
    }

    #[test]
    fn test_ingest_empty_dataset() {
        let rows = vec![row(&[("Provincia", "Roma")]), row(&[("timestamp", "bad")])];
        let err = ingest(&rows, &ColumnSchema::accidents()).unwrap_err();
        match err {
            StatsError::EmptyDataset {
                dropped_count,
                reason,
            } => {
                assert_eq!(dropped_count, 2);
                assert!(reason.contains("without timestamp"));
            }
            other => panic!("expected EmptyDataset, got {other:?}"),
        }

        let err = ingest(&[], &ColumnSchema::accidents()).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_DATASET");
    }

    #[test]
    fn test_is_fatal_missing_when_deaths_missing() {
        let rows = vec![
            accident("2024-01-01 10:00:00", "Roma", "1", "2"),
            accident("2024-01-01 11:00:00", "Roma", "1", ""),
        ];
        let frame = ingest(&rows, &ColumnSchema::accidents()).unwrap();
        assert_eq!(
            frame.numeric(IS_FATAL).unwrap().as_ref(),
            &[Some(1.0), None]
        );
    }

    #[test]
    fn test_is_fatal_absent_without_death_column() {
        let rows = vec![row(&[
            (TIMESTAMP, "2024-01-01 10:00:00"),
            (PROVINCE, "Roma"),
        ])];
        let frame = ingest(&rows, &ColumnSchema::accidents()).unwrap();
        assert!(matches!(
            frame.column(IS_FATAL),
            Err(StatsError::ColumnNotFound(_))
        ));
        assert!(!frame.column_names().contains(&IS_FATAL));
    }

    #[test]
    fn test_undeclared_columns_are_categorical() {
        let rows = vec![row(&[
            (TIMESTAMP, "2024-01-01 10:00:00"),
            (PROVINCE, "Roma"),
            ("weather", "rain"),
            ("visibility_m", "120"),
        ])];
        let frame = ingest(&rows, &ColumnSchema::accidents()).unwrap();
        assert_eq!(
            frame.column_kind("weather").unwrap(),
            ColumnKind::Categorical
        );
        assert_eq!(
            frame.column_kind("visibility_m").unwrap(),
            ColumnKind::Categorical
        );

        let schema = ColumnSchema::accidents().with_column("visibility_m", ColumnKind::Numeric);
        let frame = ingest(&rows, &schema).unwrap();
        assert_eq!(
            frame.numeric("visibility_m").unwrap().as_ref(),
            &[Some(120.0)]
        );
    }

    #[test]
    fn test_column_names_order() {
        let frame = ingest(&sample_rows(), &ColumnSchema::accidents()).unwrap();
        assert_eq!(
            frame.column_names(),
            vec![
                TIMESTAMP,
                PROVINCE,
                WEEKDAY_NAME,
                "road_type",
                "injured_count",
                DEATH_COUNT,
                "estimated_speed",
                HOUR_OF_DAY,
                CALENDAR_DAY,
                IS_FATAL,
            ]
        );
    }

    #[test]
    fn test_numeric_rejects_categorical() {
        let frame = ingest(&sample_rows(), &ColumnSchema::accidents()).unwrap();
        let err = frame.numeric(PROVINCE).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
        assert_eq!(
            frame.column_kind("missing").unwrap_err().error_code(),
            "COLUMN_NOT_FOUND"
        );
    }

    // ==================== projection tests ====================

    #[test]
    fn test_reingest_is_idempotent() {
        let frame = ingest(&sample_rows(), &ColumnSchema::accidents()).unwrap();
        let again = ingest(&frame.to_raw_rows(), &ColumnSchema::accidents()).unwrap();

        assert_eq!(again.timestamps(), frame.timestamps());
        assert_eq!(again.province_values(), frame.province_values());
        assert_eq!(again.hours(), frame.hours());
        assert_eq!(again.calendar_days(), frame.calendar_days());
        assert_eq!(again.weekdays(), frame.weekdays());
        assert_eq!(
            again.numeric("injured_count").unwrap(),
            frame.numeric("injured_count").unwrap()
        );
        assert_eq!(
            again.numeric(IS_FATAL).unwrap(),
            frame.numeric(IS_FATAL).unwrap()
        );
    }

    #[test]
    fn test_dataframe_round_trip() {
        let frame = ingest(&sample_rows(), &ColumnSchema::accidents()).unwrap();
        let df = frame.to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert!(df.column(HOUR_OF_DAY).is_ok());

        let back = DatasetFrame::from_dataframe(&df, &ColumnSchema::accidents()).unwrap();
        assert_eq!(back.timestamps(), frame.timestamps());
        assert_eq!(
            back.numeric("estimated_speed").unwrap(),
            frame.numeric("estimated_speed").unwrap()
        );
    }
}
