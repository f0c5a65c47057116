use std::collections::HashMap;

use crate::config::ComparatorConfig;
use crate::dataset::Dataset;
use crate::dates::{DateCell, classify_date};
use crate::error::Result;
use crate::types::{
    ColumnProfile, DataQualityIssue, FlaggedRow, InferredType, IssueKind, Severity,
};
use crate::utils::{series_to_numbers, series_to_strings};

/// Maximum number of offending values quoted in an issue.
const MAX_EXAMPLES: usize = 5;

pub struct DataQualityAnalyzer;

impl DataQualityAnalyzer {
    /// Flag malformed dates and negative values, date column first.
    ///
    /// Each check yields rows in ascending index order.
    pub fn flag_rows(
        dataset: &Dataset,
        profiles: &[ColumnProfile],
        config: &ComparatorConfig,
    ) -> Result<Vec<FlaggedRow>> {
        let mut flagged = Vec::new();

        if let Some(date_column) = config.date_column.as_deref() {
            if dataset.has_column(date_column) {
                flagged.extend(Self::flag_malformed_dates(dataset, date_column, config)?);
            }
        }

        for column in Self::non_negative_columns(profiles, config) {
            if dataset.has_column(column) {
                flagged.extend(Self::flag_negative_values(dataset, column)?);
            }
        }

        Ok(flagged)
    }

    /// Summarize flagged rows into one issue per (kind, column), in the
    /// order the pairs were first flagged.
    pub fn identify_issues(flagged: &[FlaggedRow], total_rows: usize) -> Vec<DataQualityIssue> {
        let mut order: Vec<(IssueKind, &str)> = Vec::new();
        let mut grouped: HashMap<(IssueKind, &str), Vec<&FlaggedRow>> = HashMap::new();

        for row in flagged {
            let key = (row.kind, row.column.as_str());
            grouped
                .entry(key)
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push(row);
        }

        order
            .into_iter()
            .filter_map(|key| grouped.remove(&key).map(|rows| (key, rows)))
            .map(|((kind, column), rows)| {
                let count = rows.len();
                let percentage = if total_rows > 0 {
                    (count as f64 / total_rows as f64) * 100.0
                } else {
                    0.0
                };
                let examples = rows
                    .iter()
                    .take(MAX_EXAMPLES)
                    .map(|r| r.value.clone())
                    .collect();

                DataQualityIssue {
                    kind,
                    column: column.to_string(),
                    count,
                    percentage,
                    severity: Severity::from_percentage(percentage),
                    description: describe(kind, column, count, percentage),
                    examples,
                }
            })
            .collect()
    }

    fn flag_malformed_dates(
        dataset: &Dataset,
        column: &str,
        config: &ComparatorConfig,
    ) -> Result<Vec<FlaggedRow>> {
        let values = dataset.string_values(column)?;

        Ok(values
            .iter()
            .enumerate()
            .filter_map(|(row_index, value)| {
                match classify_date(value.as_deref(), &config.date_formats) {
                    DateCell::Malformed => Some(FlaggedRow {
                        row_index,
                        column: column.to_string(),
                        value: value.clone().unwrap_or_default(),
                        kind: IssueKind::MalformedDate,
                    }),
                    DateCell::Missing | DateCell::Valid(_) => None,
                }
            })
            .collect())
    }

    fn flag_negative_values(dataset: &Dataset, column: &str) -> Result<Vec<FlaggedRow>> {
        let series = dataset.require_column(column)?;
        let numbers = series_to_numbers(series)?;
        let raw = series_to_strings(series)?;

        Ok(numbers
            .iter()
            .zip(raw)
            .enumerate()
            .filter_map(|(row_index, (number, raw))| match number {
                Some(n) if *n < 0.0 => Some(FlaggedRow {
                    row_index,
                    column: column.to_string(),
                    value: raw.unwrap_or_else(|| n.to_string()),
                    kind: IssueKind::NegativeValue,
                }),
                _ => None,
            })
            .collect())
    }

    /// Columns that must not hold negative values.
    ///
    /// An explicit list wins. Otherwise every present column inferred as
    /// numeric is checked, except the structural ones (keys, date, month).
    fn non_negative_columns<'a>(
        profiles: &'a [ColumnProfile],
        config: &'a ComparatorConfig,
    ) -> Vec<&'a str> {
        if !config.non_negative_columns.is_empty() {
            return config
                .non_negative_columns
                .iter()
                .map(String::as_str)
                .collect();
        }

        let structural = [
            Some(config.request_column.as_str()),
            config.task_column.as_deref(),
            config.date_column.as_deref(),
            config.month_column.as_deref(),
        ];

        profiles
            .iter()
            .filter(|p| p.present && p.inferred_type == InferredType::Numeric)
            .map(|p| p.name.as_str())
            .filter(|name| !structural.contains(&Some(*name)))
            .collect()
    }
}

fn describe(kind: IssueKind, column: &str, count: usize, percentage: f64) -> String {
    let what = match kind {
        IssueKind::MalformedDate => "unparseable dates",
        IssueKind::NegativeValue => "negative values",
    };
    format!(
        "Column '{}' has {} {} ({:.1}% of rows)",
        column, count, what, percentage
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiler::DataProfiler;
    use crate::types::DatasetRole;
    use polars::prelude::*;

    fn dataset(df: DataFrame) -> Dataset {
        Dataset::new("base.csv", DatasetRole::Current, df).unwrap()
    }

    fn flag(df: DataFrame, config: &ComparatorConfig) -> Vec<FlaggedRow> {
        let dataset = dataset(df);
        let profiles = DataProfiler::profile_columns(&dataset, config).unwrap();
        DataQualityAnalyzer::flag_rows(&dataset, &profiles, config).unwrap()
    }

    #[test]
    fn test_negative_values_in_inferred_numeric_columns() {
        let df = df![
            "numero_da_solicitacao" => ["-1", "2", "3"],
            "data" => ["2024-03-01", "2024-03-02", "2024-03-03"],
            "valor" => ["10", "-5", "7,5"],
        ]
        .unwrap();

        let flagged = flag(df, &ComparatorConfig::default());

        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].row_index, 1);
        assert_eq!(flagged[0].column, "valor");
        assert_eq!(flagged[0].value, "-5");
        assert_eq!(flagged[0].kind, IssueKind::NegativeValue);
    }

    #[test]
    fn test_explicit_non_negative_columns() {
        let df = df![
            "numero_da_solicitacao" => ["1", "2"],
            "data" => ["2024-03-01", "2024-03-02"],
            "valor" => ["-1", "-2"],
            "saldo" => ["-3", "4"],
        ]
        .unwrap();

        let config = ComparatorConfig::builder()
            .non_negative_column("saldo")
            .build()
            .unwrap();
        let flagged = flag(df, &config);

        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].column, "saldo");
    }

    #[test]
    fn test_missing_dates_are_not_malformed() {
        let df = df![
            "numero_da_solicitacao" => ["1", "2", "3", "4"],
            "data" => [Some("2024-03-01"), None, Some("N/A"), Some("2024-13-40")],
        ]
        .unwrap();

        let flagged = flag(df, &ComparatorConfig::default());

        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].row_index, 3);
        assert_eq!(flagged[0].value, "2024-13-40");
    }

    #[test]
    fn test_identify_issues_groups_by_column() {
        let flagged = vec![
            FlaggedRow {
                row_index: 0,
                column: "data".to_string(),
                value: "x".to_string(),
                kind: IssueKind::MalformedDate,
            },
            FlaggedRow {
                row_index: 4,
                column: "valor".to_string(),
                value: "-1".to_string(),
                kind: IssueKind::NegativeValue,
            },
            FlaggedRow {
                row_index: 7,
                column: "data".to_string(),
                value: "y".to_string(),
                kind: IssueKind::MalformedDate,
            },
        ];

        let issues = DataQualityAnalyzer::identify_issues(&flagged, 10);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].column, "data");
        assert_eq!(issues[0].count, 2);
        assert_eq!(issues[0].examples, vec!["x", "y"]);
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[1].kind, IssueKind::NegativeValue);
        assert_eq!(issues[1].percentage, 10.0);
        assert_eq!(issues[1].severity, Severity::Medium);
    }
}
