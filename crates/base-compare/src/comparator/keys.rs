//! Key extraction for duplicate detection.

use crate::config::ComparatorConfig;
use crate::dataset::Dataset;
use crate::error::{CompareError, Result};
use crate::normalize::normalize_identifier;
use crate::types::KeyMode;

/// Names of the columns a key mode reads, in key order.
pub(crate) fn key_columns<'a>(
    dataset: &Dataset,
    mode: KeyMode,
    config: &'a ComparatorConfig,
) -> Result<Vec<&'a str>> {
    let request = config.request_column.as_str();
    if !mode.uses_task() {
        return Ok(vec![request]);
    }

    let task = config
        .task_column
        .as_deref()
        .ok_or_else(|| CompareError::missing_column(dataset.name(), "task"))?;

    Ok(match mode {
        KeyMode::Task => vec![task],
        _ => vec![request, task],
    })
}

/// Normalized key of every row, `None` where any key part is missing.
pub(crate) fn extract_keys(
    dataset: &Dataset,
    mode: KeyMode,
    config: &ComparatorConfig,
) -> Result<Vec<Option<Vec<String>>>> {
    let columns = key_columns(dataset, mode, config)?;
    let parts = columns
        .iter()
        .map(|column| dataset.string_values(column))
        .collect::<Result<Vec<_>>>()?;

    let keys = (0..dataset.height())
        .map(|row| {
            parts
                .iter()
                .map(|values| {
                    values[row]
                        .as_deref()
                        .and_then(|v| normalize_identifier(v, config.case_insensitive_keys))
                })
                .collect::<Option<Vec<String>>>()
        })
        .collect();

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DatasetRole;
    use polars::prelude::*;

    fn dataset() -> Dataset {
        let df = df![
            "numero_da_solicitacao" => [Some(" 100 "), Some("ABC"), None],
            "tarefa_da_solicitacao" => [Some("T1"), None, Some("t3")],
        ]
        .unwrap();
        Dataset::new("base.csv", DatasetRole::Historical, df).unwrap()
    }

    #[test]
    fn test_extract_request_keys_normalized() {
        let keys = extract_keys(&dataset(), KeyMode::RequestNumber, &ComparatorConfig::default())
            .unwrap();
        assert_eq!(
            keys,
            vec![
                Some(vec!["100".to_string()]),
                Some(vec!["abc".to_string()]),
                None
            ]
        );
    }

    #[test]
    fn test_both_requires_every_part() {
        let keys = extract_keys(&dataset(), KeyMode::Both, &ComparatorConfig::default()).unwrap();
        assert_eq!(
            keys,
            vec![Some(vec!["100".to_string(), "t1".to_string()]), None, None]
        );
    }

    #[test]
    fn test_task_mode_without_task_column_configured() {
        let config = ComparatorConfig::builder()
            .without_task_column()
            .build()
            .unwrap();
        let err = extract_keys(&dataset(), KeyMode::Task, &config).unwrap_err();
        assert!(err.is_missing_column());
    }

    #[test]
    fn test_case_sensitive_keys() {
        let config = ComparatorConfig::builder()
            .case_insensitive_keys(false)
            .build()
            .unwrap();
        let keys = extract_keys(&dataset(), KeyMode::RequestNumber, &config).unwrap();
        assert_eq!(keys[1], Some(vec!["ABC".to_string()]));
    }
}
