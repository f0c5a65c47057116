//! Analysis pipeline.
//!
//! Runs the profiler on each base, then duplicate detection and the monthly
//! comparison, and gathers everything into one [`AnalysisReport`].

use chrono::Local;
use std::time::Instant;
use tracing::{error, info};

use crate::comparator::{analyze_duplicates, compare_months};
use crate::config::ComparatorConfig;
use crate::dataset::Dataset;
use crate::error::{CompareError, Result, ResultExt};
use crate::profiler::DataProfiler;
use crate::types::{AnalysisReport, IssueKind};

/// Profiles and compares a historical and a current base.
///
/// # Example
///
/// ```rust,ignore
/// use base_compare::{AnalysisPipeline, ComparatorConfig, Dataset, DatasetRole};
///
/// let config = ComparatorConfig::builder().month_column("mes").build()?;
/// let historical = Dataset::from_csv_path(DatasetRole::Historical, "base_antiga.csv", &config)?;
/// let current = Dataset::from_csv_path(DatasetRole::Current, "base_nova.csv", &config)?;
///
/// let report = AnalysisPipeline::new(config)?.run(&historical, &current)?;
/// println!("{} months compared", report.comparison.months.len());
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    config: ComparatorConfig,
}

static_assertions::assert_impl_all!(AnalysisPipeline: Send, Sync);
static_assertions::assert_impl_all!(AnalysisReport: Send, Sync);

impl AnalysisPipeline {
    /// Create a pipeline, rejecting an invalid configuration.
    pub fn new(config: ComparatorConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| CompareError::InvalidConfig(e.to_string()))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ComparatorConfig {
        &self.config
    }

    /// Run the whole analysis.
    ///
    /// A structural problem in either base (such as a missing request
    /// column) aborts the run; no partial report is returned.
    pub fn run(&self, historical: &Dataset, current: &Dataset) -> Result<AnalysisReport> {
        self.run_internal(historical, current).inspect_err(|e| {
            error!("Analysis failed: {}", e);
        })
    }

    fn run_internal(&self, historical: &Dataset, current: &Dataset) -> Result<AnalysisReport> {
        let start_time = Instant::now();
        let config = &self.config;

        info!(
            "Starting analysis: '{}' ({} rows) vs '{}' ({} rows)",
            historical.name(),
            historical.height(),
            current.name(),
            current.height()
        );

        info!("Step 1: Profiling datasets...");
        let historical_quality = DataProfiler::profile_dataset(historical, config)
            .context(format!("Profiling '{}'", historical.name()))?;
        let current_quality = DataProfiler::profile_dataset(current, config)
            .context(format!("Profiling '{}'", current.name()))?;

        for quality in [&historical_quality, &current_quality] {
            info!(
                "  {}: {} malformed dates, {} negative values",
                quality.dataset,
                quality.flagged_count(IssueKind::MalformedDate),
                quality.flagged_count(IssueKind::NegativeValue)
            );
        }

        info!("Step 2: Detecting duplicates...");
        let historical_duplicates = analyze_duplicates(historical, config)
            .context(format!("Duplicate detection on '{}'", historical.name()))?;
        let current_duplicates = analyze_duplicates(current, config)
            .context(format!("Duplicate detection on '{}'", current.name()))?;

        info!("Step 3: Comparing months...");
        let comparison =
            compare_months(historical, current, config).context("Monthly comparison")?;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!("Analysis completed in {}ms", duration_ms);

        Ok(AnalysisReport {
            generated_at: Local::now().to_rfc3339(),
            duration_ms,
            config: config.clone(),
            historical: historical_quality,
            current: current_quality,
            historical_duplicates,
            current_duplicates,
            comparison,
        })
    }
}
