//! Loaded, normalized datasets.
//!
//! A [`Dataset`] owns an immutable polars frame whose headers have already
//! been normalized. Profiling and comparison only ever borrow it.

use polars::io::csv::read::{CsvEncoding, CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::ComparatorConfig;
use crate::error::{CompareError, Result};
use crate::normalize::{normalize_headers, sanitize_frame};
use crate::types::DatasetRole;
use crate::utils::series_to_strings;

#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    role: DatasetRole,
    frame: DataFrame,
}

impl Dataset {
    /// Wrap an already materialized frame, normalizing its headers.
    ///
    /// Cell values are kept as they are; use [`Dataset::from_csv_path`] to
    /// get the full load-time sanitization.
    pub fn new(name: impl Into<String>, role: DatasetRole, frame: DataFrame) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            role,
            frame: normalize_headers(frame)?,
        })
    }

    /// Load a dataset from a delimited text file.
    ///
    /// Every column is read as text; type inference is left to the profiler.
    pub fn from_csv_path(
        role: DatasetRole,
        path: impl AsRef<Path>,
        config: &ComparatorConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CompareError::LoadFailed {
                path: path.display().to_string(),
                reason: "file not found".to_string(),
            });
        }

        info!("Loading {} dataset from: {}", role.label(), path.display());
        let frame = load_csv_with_fallbacks(path, config.delimiter)?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(role.label())
            .to_string();

        Self::from_raw_frame(name, role, frame)
    }

    /// Load a dataset from in-memory CSV bytes (e.g. an uploaded file).
    pub fn from_csv_bytes(
        name: impl Into<String>,
        role: DatasetRole,
        bytes: Vec<u8>,
        config: &ComparatorConfig,
    ) -> Result<Self> {
        let name = name.into();
        let frame = read_csv(bytes, config.delimiter, Some(b'"'))
            .map_err(|e| CompareError::LoadFailed {
                path: name.clone(),
                reason: e.to_string(),
            })?;
        Self::from_raw_frame(name, role, frame)
    }

    fn from_raw_frame(name: String, role: DatasetRole, frame: DataFrame) -> Result<Self> {
        let frame = sanitize_frame(normalize_headers(frame)?)?;
        info!(
            "{} dataset '{}' loaded: {} rows x {} columns",
            role.display_name(),
            name,
            frame.height(),
            frame.width()
        );
        Ok(Self { name, role, frame })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> DatasetRole {
        self.role
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Normalized column names in frame order.
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// Borrow a column as a Series, if present.
    pub fn series(&self, name: &str) -> Option<&Series> {
        self.frame
            .column(name)
            .ok()
            .map(|col| col.as_materialized_series())
    }

    /// Borrow a column the caller cannot proceed without.
    pub fn require_column(&self, name: &str) -> Result<&Series> {
        self.series(name)
            .ok_or_else(|| CompareError::missing_column(&self.name, name))
    }

    /// Read a required column as optional strings.
    pub fn string_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        series_to_strings(self.require_column(name)?)
    }
}

/// Read a CSV source with every column as text.
fn read_csv(bytes: Vec<u8>, delimiter: u8, quote_char: Option<u8>) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(delimiter)
                .with_quote_char(quote_char)
                .with_encoding(CsvEncoding::LossyUtf8),
        )
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
}

/// Load CSV with multiple fallback strategies.
fn load_csv_with_fallbacks(path: &Path, delimiter: u8) -> Result<DataFrame> {
    let bytes = std::fs::read(path)?;

    // Strategy 1: Standard loading with quote handling
    match read_csv(bytes.clone(), delimiter, Some(b'"')) {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard loading failed: {}", e),
    }

    // Strategy 2: Without quote handling
    match read_csv(bytes.clone(), delimiter, None) {
        Ok(df) => {
            warn!("{} loaded without quote handling", path.display());
            return Ok(df);
        }
        Err(e) => debug!("Loading without quotes failed: {}", e),
    }

    // Strategy 3: Pre-clean content
    let content = String::from_utf8_lossy(&bytes);
    let cleaned = clean_csv_content(&content);
    read_csv(cleaned.into_bytes(), delimiter, Some(b'"')).map_err(|e| {
        CompareError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    })
}

/// Collapse doubled quotes and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
