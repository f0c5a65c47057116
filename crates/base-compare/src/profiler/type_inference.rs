//! Type inference logic for column analysis.

use polars::prelude::*;

use crate::dates::{looks_like_date, parse_date};
use crate::error::Result;
use crate::types::InferredType;
use crate::utils::{
    count_matching, is_blank, is_datetime_dtype, is_numeric_dtype, is_numeric_string,
    series_to_strings,
};

/// Share of non-empty values that must agree before a text column is
/// promoted to date or numeric.
pub(crate) const INFERENCE_THRESHOLD: f64 = 0.7;

/// Infer the primitive type of a column.
///
/// Native dtypes are trusted. Text columns are inspected value by value:
/// blank cells and error markers do not vote. A date-shaped value votes for
/// `Date` even when the calendar rejects it, so a date column with a few
/// malformed entries is still recognized as one.
pub(crate) fn infer_column_type(series: &Series, formats: &[String]) -> Result<InferredType> {
    if series.null_count() == series.len() {
        return Ok(InferredType::Empty);
    }

    if is_numeric_dtype(series.dtype()) {
        return Ok(InferredType::Numeric);
    }
    if is_datetime_dtype(series.dtype()) {
        return Ok(InferredType::Date);
    }

    let values = series_to_strings(series)?;
    Ok(infer_from_values(&values, formats))
}

/// Infer a type from already extracted string values.
fn infer_from_values(values: &[Option<String>], formats: &[String]) -> InferredType {
    if values.iter().all(|v| is_blank(v.as_deref())) {
        return InferredType::Empty;
    }

    let (dates, checked) =
        count_matching(values, |v| looks_like_date(v) || parse_date(v, formats).is_some());
    if checked == 0 {
        // Only blanks and markers like "N/A"
        return InferredType::Text;
    }
    if ratio(dates, checked) >= INFERENCE_THRESHOLD {
        return InferredType::Date;
    }

    let (numbers, _) = count_matching(values, is_numeric_string);
    if ratio(numbers, checked) >= INFERENCE_THRESHOLD {
        return InferredType::Numeric;
    }

    InferredType::Text
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
