//! Custom error types for the base comparison library.
//!
//! Row-level data problems (malformed dates, negative magnitudes) are never
//! errors: they are reported as flagged rows. The variants here cover
//! structural failures that abort the processing of a dataset.
//!
//! Errors are serializable so a front-end or the `--json` CLI output can
//! show them as `{code, message}` pairs.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for profiling and comparison.
#[derive(Error, Debug)]
pub enum CompareError {
    /// A dataset lacks a column that the requested operation cannot work without.
    #[error("Dataset '{dataset}' is missing required column '{column}'")]
    MissingRequiredColumn { dataset: String, column: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading an input file failed.
    #[error("Failed to load '{path}': {reason}")]
    LoadFailed { path: String, reason: String },

    /// Writing a report or table failed.
    #[error("Failed to export report: {0}")]
    ExportFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CompareError>,
    },
}

impl CompareError {
    /// Shorthand for [`CompareError::MissingRequiredColumn`].
    pub fn missing_column(dataset: impl Into<String>, column: impl Into<String>) -> Self {
        CompareError::MissingRequiredColumn {
            dataset: dataset.into(),
            column: column.into(),
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CompareError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for front-end handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingRequiredColumn { .. } => "MISSING_REQUIRED_COLUMN",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::LoadFailed { .. } => "LOAD_FAILED",
            Self::ExportFailed(_) => "EXPORT_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is a missing required column, looking through context.
    pub fn is_missing_column(&self) -> bool {
        match self {
            Self::MissingRequiredColumn { .. } => true,
            Self::WithContext { source, .. } => source.is_missing_column(),
            _ => false,
        }
    }

    /// Check if this error is caused by the input data rather than the environment.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::MissingRequiredColumn { .. }
            | Self::InvalidConfig(_)
            | Self::LoadFailed { .. } => true,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for CompareError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CompareError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for comparison operations.
pub type Result<T> = std::result::Result<T, CompareError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CompareError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            CompareError::missing_column("historical", "numero_da_solicitacao").error_code(),
            "MISSING_REQUIRED_COLUMN"
        );
        assert_eq!(
            CompareError::ExportFailed("disk full".to_string()).error_code(),
            "EXPORT_FAILED"
        );
    }

    #[test]
    fn test_missing_column_message_names_dataset_and_column() {
        let error = CompareError::missing_column("current", "numero_da_solicitacao");
        let message = error.to_string();
        assert!(message.contains("current"));
        assert!(message.contains("numero_da_solicitacao"));
    }

    #[test]
    fn test_is_missing_column_through_context() {
        let error = CompareError::missing_column("current", "tarefa").with_context("During profiling");
        assert!(error.is_missing_column());
        assert!(error.is_input_error());
        assert!(!CompareError::ExportFailed("disk full".to_string()).is_input_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = CompareError::missing_column("base_nova.csv", "mes");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("MISSING_REQUIRED_COLUMN"));
        assert!(json.contains("mes"));
    }

    #[test]
    fn test_with_context() {
        let error = CompareError::missing_column("base.csv", "data").with_context("During comparison");
        assert!(error.to_string().contains("During comparison"));
        assert_eq!(error.error_code(), "MISSING_REQUIRED_COLUMN");
        assert!(error.is_missing_column());
    }
}
