//! Contingency tables and the chi-square test of independence.

use std::collections::BTreeMap;

use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::debug;

use crate::error::{Result, StatsError};
use crate::types::{ChiSquareResult, ContingencyTable, CrossTabulation, TestOutcome};

/// Cross-tabulate `(row, column)` label pairs and test independence.
pub fn cross_tabulate(
    row_column: &str,
    column_column: &str,
    pairs: &[(&str, &str)],
) -> Result<CrossTabulation> {
    if pairs.len() < 2 {
        return Err(StatsError::insufficient("cross-tabulation", 2, pairs.len()));
    }

    let table = contingency_table(pairs);
    let chi_square = chi_square_test(&table)?;
    if let TestOutcome::NotComputable { reason } = &chi_square {
        debug!("Chi-square not computable: {}", reason);
    }

    Ok(CrossTabulation {
        row_column: row_column.to_string(),
        column_column: column_column.to_string(),
        table,
        chi_square,
    })
}

/// Count label pairs into a table with sorted row and column labels.
pub fn contingency_table(pairs: &[(&str, &str)]) -> ContingencyTable {
    let mut row_index: BTreeMap<&str, usize> = BTreeMap::new();
    let mut column_index: BTreeMap<&str, usize> = BTreeMap::new();
    for (row, column) in pairs {
        row_index.insert(*row, 0);
        column_index.insert(*column, 0);
    }
    for (i, slot) in row_index.values_mut().enumerate() {
        *slot = i;
    }
    for (j, slot) in column_index.values_mut().enumerate() {
        *slot = j;
    }

    let mut counts = vec![vec![0usize; column_index.len()]; row_index.len()];
    for (row, column) in pairs {
        counts[row_index[row]][column_index[column]] += 1;
    }

    ContingencyTable {
        row_labels: row_index.keys().map(|k| k.to_string()).collect(),
        column_labels: column_index.keys().map(|k| k.to_string()).collect(),
        counts,
        total: pairs.len(),
    }
}

/// Pearson's chi-square test of independence; Yates' continuity correction
/// is applied when the table has one degree of freedom.
pub fn chi_square_test(table: &ContingencyTable) -> Result<TestOutcome<ChiSquareResult>> {
    let rows = table.row_labels.len();
    let columns = table.column_labels.len();
    let degrees_of_freedom = rows.saturating_sub(1) * columns.saturating_sub(1);
    if degrees_of_freedom == 0 {
        return Ok(TestOutcome::not_computable(
            "a single row or column category (zero degrees of freedom)",
        ));
    }

    let row_totals: Vec<usize> = table.counts.iter().map(|r| r.iter().sum()).collect();
    let column_totals: Vec<usize> = (0..columns)
        .map(|j| table.counts.iter().map(|r| r[j]).sum())
        .collect();
    let total = table.total as f64;

    let yates_correction = degrees_of_freedom == 1;
    let mut statistic = 0.0;
    for (i, row) in table.counts.iter().enumerate() {
        for (j, observed) in row.iter().enumerate() {
            let expected = row_totals[i] as f64 * column_totals[j] as f64 / total;
            if expected <= 0.0 {
                return Ok(TestOutcome::not_computable("an expected frequency is zero"));
            }
            let mut deviation = (*observed as f64 - expected).abs();
            if yates_correction {
                deviation = (deviation - 0.5).max(0.0);
            }
            statistic += deviation * deviation / expected;
        }
    }

    let dist = ChiSquared::new(degrees_of_freedom as f64)
        .map_err(|e| StatsError::Distribution(format!("chi-square: {e}")))?;

    Ok(TestOutcome::Computed(ChiSquareResult {
        statistic,
        p_value: dist.sf(statistic).clamp(0.0, 1.0),
        degrees_of_freedom,
        yates_correction,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repeat(
        pairs: &[((&'static str, &'static str), usize)],
    ) -> Vec<(&'static str, &'static str)> {
        pairs
            .iter()
            .flat_map(|(pair, n)| std::iter::repeat_n(*pair, *n))
            .collect()
    }

    #[test]
    fn test_contingency_table_sorted_labels() {
        let pairs = [("Roma", "Urban"), ("Milano", "Highway"), ("Roma", "Highway")];
        let table = contingency_table(&pairs);
        assert_eq!(table.row_labels, vec!["Milano", "Roma"]);
        assert_eq!(table.column_labels, vec!["Highway", "Urban"]);
        assert_eq!(table.counts, vec![vec![1, 0], vec![1, 1]]);
        assert_eq!(table.total, 3);
    }

    #[test]
    fn test_chi_square_with_yates() {
        let pairs = repeat(&[
            (("a", "x"), 10),
            (("a", "y"), 20),
            (("b", "x"), 20),
            (("b", "y"), 10),
        ]);
        let result = cross_tabulate("r", "c", &pairs).unwrap();
        let test = result.chi_square.computed().unwrap();
        assert!(test.yates_correction);
        assert_eq!(test.degrees_of_freedom, 1);
        assert!((test.statistic - 5.4).abs() < 1e-9);
        assert!((test.p_value - 0.020136751).abs() < 1e-6);
    }

    #[test]
    fn test_chi_square_without_yates() {
        let pairs = repeat(&[
            (("a", "x"), 10),
            (("a", "y"), 5),
            (("a", "z"), 5),
            (("b", "x"), 5),
            (("b", "y"), 10),
            (("b", "z"), 5),
        ]);
        let result = cross_tabulate("r", "c", &pairs).unwrap();
        let test = result.chi_square.computed().unwrap();
        assert!(!test.yates_correction);
        assert_eq!(test.degrees_of_freedom, 2);
        assert!((test.statistic - 10.0 / 3.0).abs() < 1e-9);
        assert!((test.p_value - 0.188875603).abs() < 1e-6);
    }

    #[test]
    fn test_single_category_not_computable() {
        let pairs = [("Roma", "Urban"), ("Roma", "Highway")];
        let result = cross_tabulate("province", "road_type", &pairs).unwrap();
        assert!(!result.chi_square.is_computed());
    }

    #[test]
    fn test_too_few_pairs() {
        let err = cross_tabulate("a", "b", &[("x", "y")]).unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_DATA");
    }
}
