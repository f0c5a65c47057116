//! Flat tables for export.
//!
//! Every result type is rendered as a plain DataFrame so it can be written
//! to CSV (or any other tabular sink) without further computation.

use polars::prelude::*;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::types::{ComparisonResult, DuplicateGroup, QualityReport};

/// One row per profiled column.
pub fn profile_table(report: &QualityReport) -> Result<DataFrame> {
    let columns = &report.columns;

    let df = DataFrame::new(vec![
        Column::new(
            "column".into(),
            columns.iter().map(|c| c.name.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "dtype".into(),
            columns.iter().map(|c| c.dtype.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "present".into(),
            columns.iter().map(|c| c.present).collect::<Vec<_>>(),
        ),
        Column::new(
            "null_count".into(),
            columns.iter().map(|c| c.null_count as u64).collect::<Vec<_>>(),
        ),
        Column::new(
            "null_percentage".into(),
            columns.iter().map(|c| c.null_percentage).collect::<Vec<_>>(),
        ),
        Column::new(
            "unique_count".into(),
            columns.iter().map(|c| c.unique_count as u64).collect::<Vec<_>>(),
        ),
        Column::new(
            "inferred_type".into(),
            columns
                .iter()
                .map(|c| c.inferred_type.as_str())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "sample_values".into(),
            columns
                .iter()
                .map(|c| c.sample_values.join(", "))
                .collect::<Vec<_>>(),
        ),
    ])?;

    Ok(df)
}

/// One row per flagged value.
pub fn flagged_rows_table(report: &QualityReport) -> Result<DataFrame> {
    let rows = &report.flagged_rows;

    let df = DataFrame::new(vec![
        Column::new(
            "row_index".into(),
            rows.iter().map(|r| r.row_index as u64).collect::<Vec<_>>(),
        ),
        Column::new(
            "column".into(),
            rows.iter().map(|r| r.column.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "value".into(),
            rows.iter().map(|r| r.value.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "issue".into(),
            rows.iter()
                .map(|r| r.kind.display_name())
                .collect::<Vec<_>>(),
        ),
    ])?;

    Ok(df)
}

/// Leading columns of the duplicate rows table.
const DUPLICATE_COLUMNS: [&str; 3] = ["group_id", "duplicate_key", "row_index"];

/// The full original rows of every duplicate group, prefixed with the group
/// number, the key and the row index.
///
/// An original column that shares a name with one of the leading columns is
/// renamed with an `original_` prefix.
pub fn duplicate_rows_table(dataset: &Dataset, groups: &[DuplicateGroup]) -> Result<DataFrame> {
    let mut group_ids = Vec::new();
    let mut keys = Vec::new();
    let mut row_indices = Vec::new();

    for (group_id, group) in groups.iter().enumerate() {
        for &row in &group.row_indices {
            group_ids.push(group_id as u64 + 1);
            keys.push(group.display_key());
            row_indices.push(row as IdxSize);
        }
    }

    let mut original = dataset
        .frame()
        .take(&IdxCa::from_vec("row_index".into(), row_indices.clone()))?;
    for name in DUPLICATE_COLUMNS {
        if original.column(name).is_err() {
            continue;
        }
        let mut renamed = format!("original_{}", name);
        while original.column(&renamed).is_ok() {
            renamed = format!("original_{}", renamed);
        }
        original.rename(name, renamed.into())?;
    }

    let [group_col, key_col, row_col] = DUPLICATE_COLUMNS;
    let mut df = DataFrame::new(vec![
        Column::new(group_col.into(), group_ids),
        Column::new(key_col.into(), keys),
        Column::new(
            row_col.into(),
            row_indices.iter().map(|&i| i as u64).collect::<Vec<_>>(),
        ),
    ])?;
    df.hstack_mut(original.get_columns())?;

    Ok(df)
}

/// One row per request that differs between the bases, sorted by month then
/// request identifier.
pub fn comparison_table(result: &ComparisonResult) -> Result<DataFrame> {
    let rows = result.to_rows();

    let df = DataFrame::new(vec![
        Column::new(
            "month".into(),
            rows.iter().map(|r| r.month.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "request".into(),
            rows.iter().map(|r| r.request.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "status".into(),
            rows.iter().map(|r| r.status.as_str()).collect::<Vec<_>>(),
        ),
    ])?;

    Ok(df)
}

/// One row per month seen in either base.
pub fn month_summary_table(result: &ComparisonResult) -> Result<DataFrame> {
    let mut months: Vec<(String, &str, u64, u64, u64, u64)> = Vec::new();

    for m in &result.months {
        months.push((
            m.month.clone(),
            "common",
            m.historical_rows as u64,
            m.current_rows as u64,
            m.missing_in_current.len() as u64,
            m.new_in_current.len() as u64,
        ));
    }
    for m in &result.new_months {
        let count = m.requests.len() as u64;
        months.push((m.month.clone(), "new", 0, m.row_count as u64, 0, count));
    }
    for m in &result.dropped_months {
        let count = m.requests.len() as u64;
        months.push((m.month.clone(), "dropped", m.row_count as u64, 0, count, 0));
    }
    months.sort_by(|a, b| a.0.cmp(&b.0));

    let df = DataFrame::new(vec![
        Column::new(
            "month".into(),
            months.iter().map(|m| m.0.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "status".into(),
            months.iter().map(|m| m.1).collect::<Vec<_>>(),
        ),
        Column::new(
            "historical_rows".into(),
            months.iter().map(|m| m.2).collect::<Vec<_>>(),
        ),
        Column::new(
            "current_rows".into(),
            months.iter().map(|m| m.3).collect::<Vec<_>>(),
        ),
        Column::new(
            "missing_in_current".into(),
            months.iter().map(|m| m.4).collect::<Vec<_>>(),
        ),
        Column::new(
            "new_in_current".into(),
            months.iter().map(|m| m.5).collect::<Vec<_>>(),
        ),
    ])?;

    Ok(df)
}

/// Rows left out of the monthly comparison, with the reason.
pub fn unbucketed_table(result: &ComparisonResult) -> Result<DataFrame> {
    let rows = &result.unbucketed;

    let df = DataFrame::new(vec![
        Column::new(
            "dataset".into(),
            rows.iter().map(|r| r.role.label()).collect::<Vec<_>>(),
        ),
        Column::new(
            "row_index".into(),
            rows.iter().map(|r| r.row_index as u64).collect::<Vec<_>>(),
        ),
        Column::new(
            "value".into(),
            rows.iter().map(|r| r.value.clone()).collect::<Vec<_>>(),
        ),
        Column::new(
            "reason".into(),
            rows.iter().map(|r| r.reason.as_str()).collect::<Vec<_>>(),
        ),
    ])?;

    Ok(df)
}
