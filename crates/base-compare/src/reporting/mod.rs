//! Report generation module.
//!
//! This module renders analysis results as flat tables and writes them out:
//! - JSON report file (`--emit-report` CLI flag)
//! - One CSV per non-empty table (`--export` CLI flag)
//!
//! # Example
//!
//! ```rust,ignore
//! use base_compare::reporting::ReportGenerator;
//!
//! let generator = ReportGenerator::new("output");
//! generator.write_report_json(&report, "base_nova")?;
//! let files = generator.export_tables(&report, &historical, &current)?;
//! ```

mod generator;
pub mod tables;

pub use generator::ReportGenerator;
