//! Data quality analysis module.
//!
//! This module flags row-level problems that the comparison must work
//! around: malformed dates and negative values in magnitude-only columns.

mod analyzer;

pub use analyzer::DataQualityAnalyzer;
