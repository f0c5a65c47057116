//! Configuration types for profiling and comparison.
//!
//! This module provides the column contract and parsing options using the
//! builder pattern. Column names are normalized with the same rules as the
//! dataset headers, so `"Número da Solicitação"` and
//! `"numero_da_solicitacao"` address the same column.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::dates::default_date_formats;
use crate::error::{CompareError, Result};
use crate::normalize::normalize_column_name;

/// Default name of the request number column.
pub const DEFAULT_REQUEST_COLUMN: &str = "numero_da_solicitacao";
/// Default name of the task column.
pub const DEFAULT_TASK_COLUMN: &str = "tarefa_da_solicitacao";
/// Default name of the date column.
pub const DEFAULT_DATE_COLUMN: &str = "data";

/// Configuration shared by the profiler and the comparator.
///
/// Use [`ComparatorConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use base_compare::config::ComparatorConfig;
///
/// let config = ComparatorConfig::builder()
///     .month_column("mes")
///     .non_negative_column("valor")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparatorConfig {
    /// Column holding the request number. Required in every dataset.
    /// Default: "numero_da_solicitacao"
    pub request_column: String,

    /// Column holding the task identifier, if the bases carry one.
    /// Default: Some("tarefa_da_solicitacao")
    pub task_column: Option<String>,

    /// Column holding the record date.
    /// Default: Some("data")
    pub date_column: Option<String>,

    /// Column holding a precomputed month label (e.g. "mes").
    /// When set, monthly buckets use this label instead of the date column.
    /// Default: None
    pub month_column: Option<String>,

    /// Numeric columns whose values must not be negative.
    /// When empty, every column inferred as numeric (except the key columns) is checked.
    /// Default: empty
    pub non_negative_columns: Vec<String>,

    /// `chrono` formats tried, in order, when parsing dates.
    /// Default: ISO, dd/mm/yyyy, yyyy/mm/dd, dd-mm-yyyy
    pub date_formats: Vec<String>,

    /// CSV field delimiter.
    /// Default: b';'
    pub delimiter: u8,

    /// Whether identifier comparison ignores case.
    /// Default: true
    pub case_insensitive_keys: bool,

    /// Output directory for exported tables and reports.
    /// Default: "output"
    pub output_dir: PathBuf,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            request_column: DEFAULT_REQUEST_COLUMN.to_string(),
            task_column: Some(DEFAULT_TASK_COLUMN.to_string()),
            date_column: Some(DEFAULT_DATE_COLUMN.to_string()),
            month_column: None,
            non_negative_columns: Vec::new(),
            date_formats: default_date_formats(),
            delimiter: b';',
            case_insensitive_keys: true,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl ComparatorConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ComparatorConfigBuilder {
        ComparatorConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ComparatorConfig = serde_json::from_str(&content)?;
        let config = config.normalized();
        config
            .validate()
            .map_err(|e| CompareError::InvalidConfig(e.to_string()))?;
        Ok(config)
    }

    /// Return a copy with every column name normalized.
    pub fn normalized(mut self) -> Self {
        self.request_column = normalize_column_name(&self.request_column);
        self.task_column = self.task_column.as_deref().map(normalize_column_name);
        self.date_column = self.date_column.as_deref().map(normalize_column_name);
        self.month_column = self.month_column.as_deref().map(normalize_column_name);
        self.non_negative_columns = self
            .non_negative_columns
            .iter()
            .map(|c| normalize_column_name(c))
            .collect();
        self
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.request_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyColumnName(
                "request_column".to_string(),
            ));
        }

        for (field, value) in [
            ("task_column", &self.task_column),
            ("date_column", &self.date_column),
            ("month_column", &self.month_column),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ConfigValidationError::EmptyColumnName(field.to_string()));
            }
        }

        if self.task_column.as_deref() == Some(self.request_column.as_str()) {
            return Err(ConfigValidationError::KeyColumnsOverlap(
                self.request_column.clone(),
            ));
        }

        if self.date_column.is_none() && self.month_column.is_none() {
            return Err(ConfigValidationError::NoMonthSource);
        }

        if self.date_formats.is_empty() {
            return Err(ConfigValidationError::NoDateFormats);
        }

        if !self.delimiter.is_ascii() || self.delimiter == b'"' || self.delimiter == b'\n' {
            return Err(ConfigValidationError::InvalidDelimiter(self.delimiter as char));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Column name for '{0}' must not be empty")]
    EmptyColumnName(String),

    #[error("Request and task key columns must differ (both are '{0}')")]
    KeyColumnsOverlap(String),

    #[error("Either a date column or a month column is required for monthly comparison")]
    NoMonthSource,

    #[error("At least one date format is required")]
    NoDateFormats,

    #[error("Invalid CSV delimiter: {0:?}")]
    InvalidDelimiter(char),
}

/// Builder for [`ComparatorConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ComparatorConfigBuilder {
    request_column: Option<String>,
    task_column: Option<Option<String>>,
    date_column: Option<Option<String>>,
    month_column: Option<String>,
    non_negative_columns: Vec<String>,
    date_formats: Option<Vec<String>>,
    delimiter: Option<u8>,
    case_insensitive_keys: Option<bool>,
    output_dir: Option<PathBuf>,
}

impl ComparatorConfigBuilder {
    /// Set the request number column.
    pub fn request_column(mut self, column: impl Into<String>) -> Self {
        self.request_column = Some(column.into());
        self
    }

    /// Set the task column.
    pub fn task_column(mut self, column: impl Into<String>) -> Self {
        self.task_column = Some(Some(column.into()));
        self
    }

    /// Declare that the bases carry no task column.
    pub fn without_task_column(mut self) -> Self {
        self.task_column = Some(None);
        self
    }

    /// Set the date column.
    pub fn date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = Some(Some(column.into()));
        self
    }

    /// Declare that the bases carry no date column.
    ///
    /// A month column is then required.
    pub fn without_date_column(mut self) -> Self {
        self.date_column = Some(None);
        self
    }

    /// Bucket months by a precomputed label column instead of the date.
    pub fn month_column(mut self, column: impl Into<String>) -> Self {
        self.month_column = Some(column.into());
        self
    }

    /// Add a numeric column that must not hold negative values.
    pub fn non_negative_column(mut self, column: impl Into<String>) -> Self {
        self.non_negative_columns.push(column.into());
        self
    }

    /// Replace the list of accepted date formats.
    pub fn date_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_formats = Some(formats.into_iter().map(Into::into).collect());
        self
    }

    /// Set the CSV delimiter.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Enable or disable case-insensitive identifier matching.
    pub fn case_insensitive_keys(mut self, enable: bool) -> Self {
        self.case_insensitive_keys = Some(enable);
        self
    }

    /// Set the output directory for exports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated, normalized `ComparatorConfig`.
    pub fn build(self) -> std::result::Result<ComparatorConfig, ConfigValidationError> {
        let defaults = ComparatorConfig::default();
        let config = ComparatorConfig {
            request_column: self.request_column.unwrap_or(defaults.request_column),
            task_column: self.task_column.unwrap_or(defaults.task_column),
            date_column: self.date_column.unwrap_or(defaults.date_column),
            month_column: self.month_column,
            non_negative_columns: self.non_negative_columns,
            date_formats: self.date_formats.unwrap_or(defaults.date_formats),
            delimiter: self.delimiter.unwrap_or(defaults.delimiter),
            case_insensitive_keys: self
                .case_insensitive_keys
                .unwrap_or(defaults.case_insensitive_keys),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
        }
        .normalized();

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ComparatorConfig::default();
        assert_eq!(config.request_column, "numero_da_solicitacao");
        assert_eq!(config.task_column.as_deref(), Some("tarefa_da_solicitacao"));
        assert_eq!(config.date_column.as_deref(), Some("data"));
        assert_eq!(config.delimiter, b';');
        assert!(config.case_insensitive_keys);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_normalizes_column_names() {
        let config = ComparatorConfig::builder()
            .request_column("Número da Solicitação")
            .month_column("Mês")
            .non_negative_column("Valor Pago")
            .build()
            .unwrap();

        assert_eq!(config.request_column, "numero_da_solicitacao");
        assert_eq!(config.month_column.as_deref(), Some("mes"));
        assert_eq!(config.non_negative_columns, vec!["valor_pago".to_string()]);
    }

    #[test]
    fn test_validation_requires_month_source() {
        let result = ComparatorConfig::builder().without_date_column().build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::NoMonthSource
        ));

        let result = ComparatorConfig::builder()
            .without_date_column()
            .month_column("mes")
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_validation_rejects_overlapping_keys() {
        let result = ComparatorConfig::builder()
            .request_column("id")
            .task_column("ID")
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::KeyColumnsOverlap(_)
        ));
    }

    #[test]
    fn test_validation_rejects_empty_formats_and_bad_delimiter() {
        let result = ComparatorConfig::builder()
            .date_formats(Vec::<String>::new())
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::NoDateFormats
        ));

        let result = ComparatorConfig::builder().delimiter(b'"').build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidDelimiter('"')
        ));
    }

    #[test]
    fn test_config_from_partial_json() {
        let json = r#"{
            "request_column": "Número da Solicitação",
            "month_column": "mes",
            "delimiter": 44
        }"#;

        let config: ComparatorConfig = serde_json::from_str(json).unwrap();
        let config = config.normalized();

        assert_eq!(config.request_column, "numero_da_solicitacao");
        assert_eq!(config.month_column.as_deref(), Some("mes"));
        assert_eq!(config.delimiter, b',');
        assert_eq!(config.date_column.as_deref(), Some("data"));
    }
}
