//! Shared utilities for profiling and comparison.
//!
//! This module contains helpers used across multiple modules to read polars
//! columns as plain Rust values.

use polars::prelude::*;

use crate::error::Result;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a datetime type.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 4] = ['$', '%', '€', ' '];

/// Common error/missing value markers in data.
pub const ERROR_MARKERS: [&str; 9] = [
    "error", "unknown", "n/a", "na", "nan", "null", "missing", "none", "#n/a",
];

/// Clean a string for numeric parsing: currency and percent signs removed,
/// grouping separators dropped and the decimal separator turned into `.`.
///
/// When both `.` and `,` appear, the last one is the decimal separator. A
/// lone separator that occurs more than once groups thousands. A single `,`
/// is a decimal comma; a single `.` is a decimal point.
///
/// ```rust,ignore
/// assert_eq!(clean_numeric_string("R$ 1.234,56"), "1234.56");
/// assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().replace("R$", "");
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }

    let commas = result.matches(',').count();
    let dots = result.matches('.').count();
    match (commas, dots) {
        (0, 0) => result,
        (_, 0) if commas > 1 => result.replace(',', ""),
        (_, 0) => result.replace(',', "."),
        (0, _) if dots > 1 => result.replace('.', ""),
        (0, _) => result,
        _ => {
            let last_comma = result.rfind(',').unwrap_or(0);
            let last_dot = result.rfind('.').unwrap_or(0);
            if last_comma > last_dot {
                result.replace('.', "").replace(',', ".")
            } else {
                result.replace(',', "")
            }
        }
    }
}

/// A cell with no usable content: null, empty or whitespace only.
#[inline]
pub fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|s| s.trim().is_empty())
}

/// Check if a string is an error/missing value marker.
pub fn is_error_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    ERROR_MARKERS.iter().any(|&marker| lower == marker)
}

/// Try to parse a string as a numeric value (f64).
///
/// Handles common formatting like currency symbols, percentages, and thousands separators.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Check if a string can be parsed as a numeric value.
pub fn is_numeric_string(s: &str) -> bool {
    parse_numeric_string(s).is_some()
}

// =============================================================================
// Series Extraction Utilities
// =============================================================================

/// Read a Series as optional strings, whatever its physical type.
pub fn series_to_strings(series: &Series) -> Result<Vec<Option<String>>> {
    let as_str = series.cast(&DataType::String)?;
    Ok(as_str
        .str()?
        .into_iter()
        .map(|opt| opt.map(|s| s.to_string()))
        .collect())
}

/// Read a Series as optional numbers.
///
/// Native numeric columns are cast; string columns are parsed cell by cell,
/// with unparseable cells and error markers becoming `None`.
pub fn series_to_numbers(series: &Series) -> Result<Vec<Option<f64>>> {
    if is_numeric_dtype(series.dtype()) {
        let floats = series.cast(&DataType::Float64)?;
        return Ok(floats.f64()?.into_iter().collect());
    }

    Ok(series_to_strings(series)?
        .into_iter()
        .map(|opt| {
            opt.filter(|s| !is_error_marker(s))
                .and_then(|s| parse_numeric_string(&s))
        })
        .collect())
}

/// Count the values of a string Series that satisfy `predicate`.
///
/// Blank cells and error markers are not counted in either total.
/// Returns `(matching, checked)`.
pub fn count_matching<F>(values: &[Option<String>], predicate: F) -> (usize, usize)
where
    F: Fn(&str) -> bool,
{
    let mut matching = 0;
    let mut checked = 0;

    for val in values.iter().flatten() {
        let trimmed = val.trim();
        if trimmed.is_empty() || is_error_marker(trimmed) {
            continue;
        }
        checked += 1;
        if predicate(trimmed) {
            matching += 1;
        }
    }

    (matching, checked)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string("R$ 1,234.56"), Some(1234.56));
        assert_eq!(parse_numeric_string("-100"), Some(-100.0));
        assert_eq!(parse_numeric_string("50%"), Some(50.0));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("hello"), None);
        assert_eq!(parse_numeric_string("inf"), None);
    }

    #[test]
    fn test_parse_numeric_string_decimal_comma() {
        assert_eq!(parse_numeric_string("150,00"), Some(150.0));
        assert_eq!(parse_numeric_string("-2,5"), Some(-2.5));
        assert_eq!(parse_numeric_string("R$ 1.234,56"), Some(1234.56));
        assert_eq!(parse_numeric_string("1.234.567"), Some(1234567.0));
        assert_eq!(parse_numeric_string("1,234,567"), Some(1234567.0));
        assert_eq!(parse_numeric_string("0.75"), Some(0.75));
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(None));
        assert!(is_blank(Some("")));
        assert!(is_blank(Some(" \t ")));
        assert!(!is_blank(Some(" 0 ")));
    }

    #[test]
    fn test_is_error_marker() {
        assert!(is_error_marker("N/A"));
        assert!(is_error_marker("  nan "));
        assert!(!is_error_marker("0"));
    }

    #[test]
    fn test_series_to_numbers_from_strings() {
        let series = Series::new("valor".into(), &[Some("10"), Some("-2.5"), Some("n/a"), None]);
        let values = series_to_numbers(&series).unwrap();
        assert_eq!(values, vec![Some(10.0), Some(-2.5), None, None]);
    }

    #[test]
    fn test_series_to_numbers_native() {
        let series = Series::new("valor".into(), &[Some(1i64), None, Some(-3)]);
        let values = series_to_numbers(&series).unwrap();
        assert_eq!(values, vec![Some(1.0), None, Some(-3.0)]);
    }

    #[test]
    fn test_series_to_strings_casts_numbers() {
        let series = Series::new("id".into(), &[100i64, 200]);
        let values = series_to_strings(&series).unwrap();
        assert_eq!(values, vec![Some("100".to_string()), Some("200".to_string())]);
    }

    #[test]
    fn test_count_matching_skips_blank_and_markers() {
        let values = vec![
            Some("1".to_string()),
            Some("x".to_string()),
            Some("  ".to_string()),
            Some("NULL".to_string()),
            None,
        ];
        assert_eq!(count_matching(&values, is_numeric_string), (1, 2));
    }
}
