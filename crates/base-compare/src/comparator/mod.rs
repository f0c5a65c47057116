//! Comparison of the historical and current bases.
//!
//! - [`find_duplicates`] / [`analyze_duplicates`]: records sharing a key
//!   within one dataset
//! - [`compare_months`]: month-keyed set differences between the two datasets
//!
//! Everything here is a pure function of its inputs. Results only depend on
//! the multiset of rows, never on their order, except for the row indices
//! they report.

mod duplicates;
mod keys;
mod monthly;

pub use duplicates::{analyze_duplicates, find_duplicates};
pub use monthly::compare_months;
