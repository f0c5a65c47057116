use polars::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::tables;
use crate::dataset::Dataset;
use crate::error::{CompareError, Result};
use crate::normalize::sanitize_file_name;
use crate::types::{AnalysisReport, DatasetRole, KeyMode};

/// Writes reports and flat tables under one output directory.
pub struct ReportGenerator {
    output_dir: PathBuf,
    separator: u8,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            separator: b',',
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Use a different field separator for exported tables.
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the full report as pretty JSON to `<stem>_report.json`.
    pub fn write_report_json(&self, report: &AnalysisReport, stem: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}_report.json", sanitize_file_name(stem)));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }

    /// Export every non-empty result table as CSV.
    ///
    /// The datasets are needed to attach the full original rows to the
    /// duplicate tables. Returns the written paths in export order.
    pub fn export_tables(
        &self,
        report: &AnalysisReport,
        historical: &Dataset,
        current: &Dataset,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir)?;
        let mut written = Vec::new();

        for (role, dataset) in [
            (DatasetRole::Historical, historical),
            (DatasetRole::Current, current),
        ] {
            let quality = report.quality(role);
            let label = role.label();

            self.export(
                &mut written,
                &format!("{}_profile", label),
                tables::profile_table(quality)?,
            )?;
            self.export(
                &mut written,
                &format!("{}_flagged_rows", label),
                tables::flagged_rows_table(quality)?,
            )?;

            let duplicates = report.duplicates(role);
            for mode in KeyMode::ALL {
                if let Some(groups) = duplicates.groups(mode) {
                    self.export(
                        &mut written,
                        &format!("{}_duplicates_{}", label, mode.as_str()),
                        tables::duplicate_rows_table(dataset, groups)?,
                    )?;
                }
            }
        }

        let comparison = &report.comparison;
        self.export(
            &mut written,
            "monthly_comparison",
            tables::comparison_table(comparison)?,
        )?;
        self.export(
            &mut written,
            "month_summary",
            tables::month_summary_table(comparison)?,
        )?;
        self.export(
            &mut written,
            "unbucketed_rows",
            tables::unbucketed_table(comparison)?,
        )?;

        info!(
            "Exported {} tables to {}",
            written.len(),
            self.output_dir.display()
        );
        Ok(written)
    }

    fn export(&self, written: &mut Vec<PathBuf>, name: &str, mut df: DataFrame) -> Result<()> {
        if df.height() == 0 {
            debug!("Skipping empty table '{}'", name);
            return Ok(());
        }
        written.push(self.write_csv(name, &mut df)?);
        Ok(())
    }

    /// Write one table to `<name>.csv`.
    pub fn write_csv(&self, name: &str, df: &mut DataFrame) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let output_path = self
            .output_dir
            .join(format!("{}.csv", sanitize_file_name(name)));
        let mut file = File::create(&output_path)?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(self.separator)
            .with_quote_char(b'"')
            .finish(df)
            .map_err(|e| {
                CompareError::ExportFailed(format!("{}: {}", output_path.display(), e))
            })?;

        debug!("Table saved: {}", output_path.display());
        Ok(output_path)
    }
}
