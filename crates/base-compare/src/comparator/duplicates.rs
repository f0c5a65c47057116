//! Duplicate detection within one dataset.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::keys::extract_keys;
use crate::config::ComparatorConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::types::{DuplicateAnalysis, DuplicateGroup, KeyMode};

/// Find groups of two or more rows sharing the same normalized key.
///
/// Groups are ordered by the first occurrence of their key and rows keep
/// dataset order. Rows with a missing key part never form a group.
pub fn find_duplicates(
    dataset: &Dataset,
    mode: KeyMode,
    config: &ComparatorConfig,
) -> Result<Vec<DuplicateGroup>> {
    let keys = extract_keys(dataset, mode, config)?;

    let mut first_seen: Vec<Vec<String>> = Vec::new();
    let mut rows_by_key: HashMap<Vec<String>, Vec<usize>> = HashMap::new();

    for (row_index, key) in keys.into_iter().enumerate() {
        let Some(key) = key else { continue };
        rows_by_key
            .entry(key)
            .or_insert_with_key(|k| {
                first_seen.push(k.clone());
                Vec::new()
            })
            .push(row_index);
    }

    let groups: Vec<DuplicateGroup> = first_seen
        .into_iter()
        .filter_map(|key| {
            let row_indices = rows_by_key.remove(&key)?;
            (row_indices.len() >= 2).then_some(DuplicateGroup { key, row_indices })
        })
        .collect();

    debug!(
        "'{}' {}: {} duplicate groups",
        dataset.name(),
        mode.as_str(),
        groups.len()
    );
    Ok(groups)
}

/// Run duplicate detection under every key mode.
///
/// A dataset without a task column still gets its request-number groups;
/// the task-based modes are skipped and left as `None`.
pub fn analyze_duplicates(dataset: &Dataset, config: &ComparatorConfig) -> Result<DuplicateAnalysis> {
    let by_request_number = find_duplicates(dataset, KeyMode::RequestNumber, config)?;

    let has_task = config
        .task_column
        .as_deref()
        .is_some_and(|column| dataset.has_column(column));

    let (by_task, by_both) = if has_task {
        (
            Some(find_duplicates(dataset, KeyMode::Task, config)?),
            Some(find_duplicates(dataset, KeyMode::Both, config)?),
        )
    } else {
        warn!(
            "'{}' has no task column, skipping task-based duplicate detection",
            dataset.name()
        );
        (None, None)
    };

    let analysis = DuplicateAnalysis {
        dataset: dataset.name().to_string(),
        by_request_number,
        by_task,
        by_both,
    };

    info!(
        "Duplicates in '{}': {} rows by request number",
        dataset.name(),
        analysis.duplicated_row_count(KeyMode::RequestNumber)
    );
    Ok(analysis)
}
