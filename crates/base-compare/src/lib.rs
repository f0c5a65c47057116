//! Historical vs. Current Base Comparison Library
//!
//! Profiles two snapshots of a request register and compares them, built
//! with Rust and Polars.
//!
//! # Overview
//!
//! - **Data Profiling**: null percentages, type inference and sample values per column
//! - **Quality Flags**: unparseable dates and negative values in magnitude-only columns
//! - **Duplicate Detection**: by request number, task, or both
//! - **Monthly Comparison**: requests missing from or added to each month, new and dropped months
//! - **Export**: every result as a flat table (CSV) or one JSON report
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use base_compare::{AnalysisPipeline, ComparatorConfig, Dataset, DatasetRole};
//!
//! let config = ComparatorConfig::default();
//! let historical = Dataset::from_csv_path(DatasetRole::Historical, "base_antiga.csv", &config)?;
//! let current = Dataset::from_csv_path(DatasetRole::Current, "base_nova.csv", &config)?;
//!
//! let report = AnalysisPipeline::new(config)?.run(&historical, &current)?;
//!
//! for month in &report.comparison.months {
//!     println!("{}: {} missing", month.month, month.missing_in_current.len());
//! }
//! ```
//!
//! # Configuration
//!
//! Use [`ComparatorConfig`] to describe the column contract:
//!
//! ```rust,ignore
//! use base_compare::ComparatorConfig;
//!
//! let config = ComparatorConfig::builder()
//!     .request_column("Número da Solicitação")   // normalized to numero_da_solicitacao
//!     .month_column("mes")                      // bucket by label instead of date
//!     .non_negative_column("valor")
//!     .delimiter(b';')
//!     .build()?;
//! ```
//!
//! # Error Handling
//!
//! Structural problems, such as a base without the request column, are
//! returned as [`CompareError`]. Row-level problems never fail a run: they
//! appear as flagged rows in the [`QualityReport`] and as unbucketed rows in
//! the [`ComparisonResult`].

pub mod comparator;
pub mod config;
pub mod dataset;
pub mod dates;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod profiler;
pub mod quality;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use comparator::{analyze_duplicates, compare_months, find_duplicates};
pub use config::{ComparatorConfig, ComparatorConfigBuilder, ConfigValidationError};
pub use dataset::Dataset;
pub use error::{CompareError, Result, ResultExt};
pub use pipeline::AnalysisPipeline;
pub use profiler::DataProfiler;
pub use quality::DataQualityAnalyzer;
pub use reporting::ReportGenerator;
pub use types::{
    AnalysisReport, ColumnProfile, ComparisonResult, ComparisonRow, DataQualityIssue,
    DatasetRole, DuplicateAnalysis, DuplicateGroup, FlaggedRow, InferredType, IssueKind,
    KeyMode, MonthComparison, MonthOnly, QualityReport, RequestStatus, Severity,
    UnbucketedReason, UnbucketedRow,
};
