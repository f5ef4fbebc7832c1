//! Delimited-file loading through polars.
//!
//! Every cell is read as text (`infer_schema_length = 0`) so that coercion
//! stays in [`super::ingest`] and behaves the same for files and generated rows.

use std::io::Cursor;
use std::path::Path;

use polars::io::csv::read::{CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use tracing::debug;

use super::RawRow;
use crate::error::{Result, ResultExt, StatsError};

/// Separators tried in order; the first one yielding more than one column wins.
const SEPARATORS: [u8; 2] = [b';', b','];

/// Read a delimited file into a DataFrame of string columns.
///
/// Tries `;` first (the export format of the accident files) and falls back
/// to `,` when only a single column results.
pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(StatsError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }

    load_with_fallbacks(|separator| {
        string_reader_options(separator)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
    })
    .context(format!("Failed to read {}", path.display()))
}

/// Parse in-memory delimited text with the same separator fallback as
/// [`read_csv`].
pub fn parse_csv(content: &str) -> Result<DataFrame> {
    load_with_fallbacks(|separator| {
        string_reader_options(separator)
            .into_reader_with_file_handle(Cursor::new(content.as_bytes().to_vec()))
            .finish()
    })
}

fn string_reader_options(separator: u8) -> CsvReadOptions {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(separator)
                .with_quote_char(Some(b'"')),
        )
}

fn load_with_fallbacks<F>(load: F) -> Result<DataFrame>
where
    F: Fn(u8) -> PolarsResult<DataFrame>,
{
    let mut last = None;
    for separator in SEPARATORS {
        match load(separator) {
            Ok(df) if df.width() > 1 => return Ok(df),
            Ok(df) => {
                debug!(
                    "Separator '{}' produced a single column, trying next",
                    separator as char
                );
                last = Some(Ok(df));
            }
            Err(e) => {
                debug!("Loading with separator '{}' failed: {}", separator as char, e);
                last = Some(Err(e));
            }
        }
    }

    match last {
        Some(result) => Ok(result?),
        None => Err(StatsError::InvalidParameter(
            "no CSV separator configured".to_string(),
        )),
    }
}

/// Convert any polars DataFrame into raw rows.
///
/// Cells are cast to text; nulls become empty strings so that every row
/// carries every header.
pub fn rows_from_dataframe(df: &DataFrame) -> Result<Vec<RawRow>> {
    let mut rows = vec![RawRow::new(); df.height()];

    for column in df.get_columns() {
        let name = column.name().to_string();
        let text = column
            .as_materialized_series()
            .cast(&DataType::String)
            .context(format!("Failed to read column '{}' as text", name))?;

        for (row, cell) in rows.iter_mut().zip(text.str()?.into_iter()) {
            row.insert(name.clone(), cell.unwrap_or_default().to_string());
        }
    }

    debug!(
        "Converted DataFrame with {} rows and {} columns to raw rows",
        df.height(),
        df.width()
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_semicolon_csv() {
        let content = "Provincia;Numero_Feriti\nRoma;2\nMilano;\n";
        let df = parse_csv(content).unwrap();
        assert_eq!(df.width(), 2);
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("Numero_Feriti").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_parse_falls_back_to_comma() {
        let content = "province,injured_count\nRoma,2\n";
        let df = parse_csv(content).unwrap();
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_rows_from_dataframe_fills_nulls() {
        let df = df! {
            "province" => ["Roma", "Milano"],
            "injured_count" => [Some(1i64), None],
        }
        .unwrap();

        let rows = rows_from_dataframe(&df).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["injured_count"], "1");
        assert_eq!(rows[1]["injured_count"], "");
        assert_eq!(rows[1]["province"], "Milano");
    }

    #[test]
    fn test_read_csv_missing_file() {
        let err = read_csv("does/not/exist.csv").unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(!err.is_recoverable());
    }
}
