//! Data profiling module for dataset analysis.
//!
//! This module provides per-column profiling of one dataset:
//! - Null counts and percentages
//! - Type inference (date, numeric, text)
//! - Unique counts and sample values
//!
//! Row-level flags are delegated to [`DataQualityAnalyzer`].

mod type_inference;

use polars::prelude::*;
use rand::prelude::*;
use std::collections::HashSet;
use tracing::debug;

use crate::config::ComparatorConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::quality::DataQualityAnalyzer;
use crate::types::{ColumnProfile, InferredType, QualityReport};
use crate::utils::{is_blank, series_to_strings};

pub(crate) use type_inference::infer_column_type;

/// Number of sample values kept per column.
const SAMPLE_SIZE: usize = 5;

/// Data profiler for analyzing dataset structure and quality.
pub struct DataProfiler;

impl DataProfiler {
    /// Profile an entire dataset.
    ///
    /// Fails with `MissingRequiredColumn` when the request column is absent;
    /// malformed values never fail, they are flagged in the report.
    pub fn profile_dataset(dataset: &Dataset, config: &ComparatorConfig) -> Result<QualityReport> {
        dataset.require_column(&config.request_column)?;

        let columns = Self::profile_columns(dataset, config)?;
        let flagged_rows = DataQualityAnalyzer::flag_rows(dataset, &columns, config)?;
        let issues = DataQualityAnalyzer::identify_issues(&flagged_rows, dataset.height());

        debug!(
            "Profiled '{}': {} columns, {} flagged rows",
            dataset.name(),
            columns.len(),
            flagged_rows.len()
        );

        Ok(QualityReport {
            dataset: dataset.name().to_string(),
            role: dataset.role(),
            row_count: dataset.height(),
            column_count: dataset.width(),
            columns,
            flagged_rows,
            issues,
        })
    }

    /// Profile every column of the frame, followed by any designated column
    /// the frame does not carry.
    pub fn profile_columns(
        dataset: &Dataset,
        config: &ComparatorConfig,
    ) -> Result<Vec<ColumnProfile>> {
        let mut profiles = Vec::with_capacity(dataset.width());

        for name in dataset.column_names() {
            let series = dataset.require_column(&name)?;
            profiles.push(Self::profile_column(series, dataset.height(), config)?);
        }

        for name in designated_columns(config) {
            if !dataset.has_column(name) && !profiles.iter().any(|p| p.name == name) {
                debug!("Designated column '{}' absent from '{}'", name, dataset.name());
                profiles.push(absent_profile(name));
            }
        }

        Ok(profiles)
    }

    fn profile_column(
        series: &Series,
        total_rows: usize,
        config: &ComparatorConfig,
    ) -> Result<ColumnProfile> {
        let dtype = format!("{:?}", series.dtype());
        let (null_count, unique_count) = missing_and_unique(series)?;
        let null_percentage = null_percentage(null_count, total_rows);
        let inferred_type = infer_column_type(series, &config.date_formats)?;
        let sample_values = sample_values(series)?;

        Ok(ColumnProfile {
            name: series.name().to_string(),
            dtype,
            present: true,
            null_count,
            null_percentage,
            unique_count,
            inferred_type,
            sample_values,
        })
    }
}

/// Missing cell count and distinct value count of a column.
///
/// Text cells that are empty or whitespace only count as missing, the same
/// as nulls, and do not add to the distinct values.
fn missing_and_unique(series: &Series) -> Result<(usize, usize)> {
    if series.dtype() != &DataType::String {
        return Ok((series.null_count(), series.drop_nulls().n_unique()?));
    }

    let mut missing = 0;
    let mut distinct = HashSet::new();
    for value in series.str()?.into_iter() {
        if is_blank(value) {
            missing += 1;
        } else if let Some(value) = value {
            distinct.insert(value);
        }
    }
    Ok((missing, distinct.len()))
}

/// Null share in percent. An empty dataset counts as entirely null.
fn null_percentage(null_count: usize, total_rows: usize) -> f64 {
    if total_rows == 0 {
        100.0
    } else {
        (null_count as f64 / total_rows as f64) * 100.0
    }
}

/// Seeded sample of non-null values, so repeated runs agree.
fn sample_values(series: &Series) -> Result<Vec<String>> {
    let values: Vec<String> = series_to_strings(series)?
        .into_iter()
        .flatten()
        .filter(|v| !v.trim().is_empty())
        .collect();
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let mut rng = StdRng::seed_from_u64(42);
    let mut indices: Vec<usize> = (0..values.len())
        .collect::<Vec<_>>()
        .choose_multiple(&mut rng, SAMPLE_SIZE.min(values.len()))
        .copied()
        .collect();
    indices.sort_unstable();

    Ok(indices.into_iter().map(|i| values[i].clone()).collect())
}

/// Columns the configuration names, apart from the request column.
fn designated_columns(config: &ComparatorConfig) -> Vec<&str> {
    let mut columns: Vec<&str> = [
        config.task_column.as_deref(),
        config.date_column.as_deref(),
        config.month_column.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    columns.extend(config.non_negative_columns.iter().map(String::as_str));
    columns
}

fn absent_profile(name: &str) -> ColumnProfile {
    ColumnProfile {
        name: name.to_string(),
        dtype: "absent".to_string(),
        present: false,
        null_count: 0,
        null_percentage: 100.0,
        unique_count: 0,
        inferred_type: InferredType::Empty,
        sample_values: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DatasetRole, IssueKind};

    fn dataset(df: DataFrame) -> Dataset {
        Dataset::new("base.csv", DatasetRole::Historical, df).unwrap()
    }

    #[test]
    fn test_profile_null_percentages() {
        let df = df![
            "numero_da_solicitacao" => [Some("1"), Some("2"), Some("3"), Some("4")],
            "tarefa_da_solicitacao" => [Some("t1"), None, None, Some("t4")],
            "data" => [Some("2024-03-01"), Some("2024-03-02"), Some("2024-03-03"), None],
        ]
        .unwrap();

        let report = DataProfiler::profile_dataset(&dataset(df), &ComparatorConfig::default())
            .unwrap();

        assert_eq!(report.row_count, 4);
        assert_eq!(report.null_percentage("numero_da_solicitacao"), Some(0.0));
        assert_eq!(report.null_percentage("tarefa_da_solicitacao"), Some(50.0));
        assert_eq!(report.null_percentage("data"), Some(25.0));
        assert_eq!(
            report.column("data").map(|c| c.inferred_type),
            Some(InferredType::Date)
        );
        assert!(report.flagged_rows.is_empty());
    }

    #[test]
    fn test_profile_flags_malformed_date() {
        let df = df![
            "numero_da_solicitacao" => ["1", "2"],
            "data" => ["2024-03-01", "2024-13-40"],
        ]
        .unwrap();

        let report = DataProfiler::profile_dataset(&dataset(df), &ComparatorConfig::default())
            .unwrap();

        assert_eq!(report.flagged_indices(IssueKind::MalformedDate), vec![1]);
    }

    #[test]
    fn test_empty_dataset_is_all_null() {
        let df = DataFrame::new(vec![
            Column::new("numero_da_solicitacao".into(), Vec::<String>::new()),
            Column::new("data".into(), Vec::<String>::new()),
        ])
        .unwrap();

        let report = DataProfiler::profile_dataset(&dataset(df), &ComparatorConfig::default())
            .unwrap();

        assert_eq!(report.row_count, 0);
        assert!(report.flagged_rows.is_empty());
        assert!(report.columns.iter().all(|c| c.null_percentage == 100.0));
    }

    #[test]
    fn test_absent_designated_columns_are_reported() {
        let df = df!["numero_da_solicitacao" => ["1"], "data" => ["2024-03-01"]].unwrap();

        let report = DataProfiler::profile_dataset(&dataset(df), &ComparatorConfig::default())
            .unwrap();

        let task = report.column("tarefa_da_solicitacao").unwrap();
        assert!(!task.present);
        assert_eq!(task.null_percentage, 100.0);
        assert_eq!(report.column_count, 2);
    }

    #[test]
    fn test_missing_request_column_fails() {
        let df = df!["data" => ["2024-03-01"]].unwrap();
        let err = DataProfiler::profile_dataset(&dataset(df), &ComparatorConfig::default())
            .unwrap_err();
        assert!(err.is_missing_column());
    }

    #[test]
    fn test_null_percentage_bounds() {
        let df = df![
            "numero_da_solicitacao" => [Some("1"), None, Some("3")],
            "valor" => [None::<&str>, None, None],
        ]
        .unwrap();

        let report = DataProfiler::profile_dataset(&dataset(df), &ComparatorConfig::default())
            .unwrap();

        for column in &report.columns {
            assert!((0.0..=100.0).contains(&column.null_percentage));
        }
        assert_eq!(report.null_percentage("valor"), Some(100.0));
        assert_eq!(
            report.column("valor").map(|c| c.inferred_type),
            Some(InferredType::Empty)
        );
    }

    #[test]
    fn test_blank_text_cells_count_as_missing() {
        let df = df![
            "numero_da_solicitacao" => ["1", "2", "3"],
            "obs" => ["", "  ", "\t"],
            "setor" => [Some("a"), Some(" "), None],
        ]
        .unwrap();

        let report = DataProfiler::profile_dataset(&dataset(df), &ComparatorConfig::default())
            .unwrap();

        let obs = report.column("obs").unwrap();
        assert_eq!(obs.null_count, 3);
        assert_eq!(obs.null_percentage, 100.0);
        assert_eq!(obs.unique_count, 0);
        assert_eq!(obs.inferred_type, InferredType::Empty);
        assert!(obs.sample_values.is_empty());

        let setor = report.column("setor").unwrap();
        assert_eq!(setor.null_count, 2);
        assert_eq!(setor.unique_count, 1);
        assert_eq!(setor.sample_values, vec!["a".to_string()]);
    }

    #[test]
    fn test_sample_values_are_stable() {
        let series = Series::new("x".into(), &["a", "b", "c", "d", "e", "f", "g"]);
        let first = sample_values(&series).unwrap();
        let second = sample_values(&series).unwrap();
        assert_eq!(first.len(), SAMPLE_SIZE);
        assert_eq!(first, second);
    }
}
