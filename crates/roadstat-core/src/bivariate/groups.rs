//! Numeric column summarized per category, with one-way ANOVA.

use std::collections::BTreeMap;

use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use tracing::debug;

use crate::error::{Result, StatsError};
use crate::types::{AnovaResult, GroupComparison, GroupSummary, TestOutcome};
use crate::utils::{mean, median, sample_variance};

/// Summarize `(value, category)` pairs per category and run a one-way ANOVA.
///
/// Groups are sorted by category label.
pub fn compare_groups(
    numeric_column: &str,
    categorical_column: &str,
    pairs: &[(f64, &str)],
) -> Result<GroupComparison> {
    if pairs.len() < 2 {
        return Err(StatsError::insufficient("group comparison", 2, pairs.len()));
    }

    let mut grouped: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (value, category) in pairs {
        grouped.entry(*category).or_default().push(*value);
    }

    let groups: Vec<GroupSummary> = grouped
        .iter()
        .map(|(category, values)| GroupSummary {
            category: category.to_string(),
            n: values.len(),
            mean: mean(values).unwrap_or_default(),
            std_dev: sample_variance(values).map(f64::sqrt),
            median: median(values).unwrap_or_default(),
        })
        .collect();

    let samples: Vec<&[f64]> = grouped.values().map(Vec::as_slice).collect();
    let anova = one_way_anova(&samples)?;
    if let TestOutcome::NotComputable { reason } = &anova {
        debug!("ANOVA not computable: {}", reason);
    }

    Ok(GroupComparison {
        numeric_column: numeric_column.to_string(),
        categorical_column: categorical_column.to_string(),
        groups,
        anova,
    })
}

/// One-way ANOVA over non-empty groups.
pub fn one_way_anova(groups: &[&[f64]]) -> Result<TestOutcome<AnovaResult>> {
    let groups: Vec<&[f64]> = groups.iter().copied().filter(|g| !g.is_empty()).collect();
    if groups.len() < 2 {
        return Ok(TestOutcome::not_computable(
            "fewer than two non-empty groups",
        ));
    }

    let n_total: usize = groups.iter().map(|g| g.len()).sum();
    let df_between = groups.len() - 1;
    let df_within = n_total - groups.len();
    if df_within == 0 {
        return Ok(TestOutcome::not_computable(
            "every group has a single observation (no within-group degrees of freedom)",
        ));
    }

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / n_total as f64;
    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in &groups {
        let group_mean = group.iter().sum::<f64>() / group.len() as f64;
        ss_between += group.len() as f64 * (group_mean - grand_mean).powi(2);
        ss_within += group.iter().map(|v| (v - group_mean).powi(2)).sum::<f64>();
    }

    let ms_within = ss_within / df_within as f64;
    if ms_within <= 0.0 {
        return Ok(TestOutcome::not_computable(
            "zero variance within every group",
        ));
    }
    let ms_between = ss_between / df_between as f64;
    let f_statistic = ms_between / ms_within;

    let dist = FisherSnedecor::new(df_between as f64, df_within as f64).map_err(|e| {
        StatsError::Distribution(format!("F({}, {}): {}", df_between, df_within, e))
    })?;
    let p_value = dist.sf(f_statistic).clamp(0.0, 1.0);

    Ok(TestOutcome::Computed(AnovaResult {
        f_statistic,
        p_value,
        df_between,
        df_within,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_group_summaries_sorted() {
        let pairs = [
            (50.0, "Urban"),
            (120.0, "Highway"),
            (40.0, "Urban"),
            (110.0, "Highway"),
            (80.0, "State"),
            (70.0, "State"),
        ];
        let result = compare_groups("estimated_speed", "road_type", &pairs).unwrap();
        let categories: Vec<&str> = result.groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(categories, vec!["Highway", "State", "Urban"]);
        assert_eq!(result.groups[0].mean, 115.0);
        assert_eq!(result.groups[2].median, 45.0);

        let anova = result.anova.computed().unwrap();
        assert_eq!(anova.df_between, 2);
        assert_eq!(anova.df_within, 3);
        // SSB = 14800 / 3 over 2 df, SSW = 150 over 3 df
        assert!((anova.f_statistic - 148.0 / 3.0).abs() < 1e-9);
        assert!(anova.p_value < 0.01);
    }

    #[test]
    fn test_single_group_not_computable() {
        let pairs = [(1.0, "Roma"), (2.0, "Roma"), (3.0, "Roma")];
        let result = compare_groups("injured_count", "province", &pairs).unwrap();
        assert!(!result.anova.is_computed());
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].std_dev, Some(1.0));
    }

    #[test]
    fn test_singleton_groups_not_computable() {
        let pairs = [(1.0, "a"), (2.0, "b"), (3.0, "c")];
        let result = compare_groups("x", "g", &pairs).unwrap();
        assert!(matches!(result.anova, TestOutcome::NotComputable { .. }));
        assert_eq!(result.groups[0].std_dev, None);
    }

    #[test]
    fn test_zero_within_variance_not_computable() {
        let pairs = [(1.0, "a"), (1.0, "a"), (5.0, "b"), (5.0, "b")];
        let result = compare_groups("x", "g", &pairs).unwrap();
        assert!(!result.anova.is_computed());
    }

    #[test]
    fn test_equal_means_high_p_value() {
        let pairs = [(1.0, "a"), (3.0, "a"), (1.0, "b"), (3.0, "b")];
        let result = compare_groups("x", "g", &pairs).unwrap();
        let anova = result.anova.computed().unwrap();
        assert_eq!(anova.f_statistic, 0.0);
        assert!((anova.p_value - 1.0).abs() < 1e-12);
    }
}
