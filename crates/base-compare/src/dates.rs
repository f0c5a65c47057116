//! Date parsing and month extraction.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::is_error_marker;

/// Date formats tried when the configuration does not override them.
pub const DEFAULT_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

/// Date-time formats tried after the plain date formats.
const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

// Shape-only patterns: a value matching one of these *looks* like a date even
// if the calendar rejects it (2024-13-40).
static DATE_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}").expect("Invalid regex: YYYY-MM-DD"),
        Regex::new(r"^\d{1,2}[-/]\d{1,2}[-/]\d{4}").expect("Invalid regex: DD-MM-YYYY"),
    ]
});

/// Parse a date value using `formats`, then the built-in date-time formats.
pub fn parse_date(value: &str, formats: &[String]) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in formats {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|dt| dt.date())
}

/// Whether a value has the shape of a date, regardless of validity.
pub fn looks_like_date(value: &str) -> bool {
    let trimmed = value.trim();
    DATE_SHAPES.iter().any(|re| re.is_match(trimmed))
}

/// Classification of a single date cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCell {
    /// Null, blank or an error marker such as "N/A".
    Missing,
    /// Present but not a calendar date.
    Malformed,
    Valid(NaiveDate),
}

/// Classify a raw date cell.
pub fn classify_date(value: Option<&str>, formats: &[String]) -> DateCell {
    let Some(value) = value.map(str::trim) else {
        return DateCell::Missing;
    };
    if value.is_empty() || is_error_marker(value) {
        return DateCell::Missing;
    }
    match parse_date(value, formats) {
        Some(date) => DateCell::Valid(date),
        None => DateCell::Malformed,
    }
}

/// Month bucket label of a date, formatted `YYYY-MM`.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// The default format list as owned strings, for configuration defaults.
pub fn default_date_formats() -> Vec<String> {
    DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formats() -> Vec<String> {
        default_date_formats()
    }

    #[test]
    fn test_parse_iso_date() {
        let date = parse_date("2024-03-15", &formats()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn test_parse_brazilian_date() {
        let date = parse_date("15/03/2024", &formats()).unwrap();
        assert_eq!(month_key(date), "2024-03");
    }

    #[test]
    fn test_parse_datetime_keeps_date() {
        let date = parse_date("2024-04-01 10:30:00", &formats()).unwrap();
        assert_eq!(month_key(date), "2024-04");
    }

    #[test]
    fn test_invalid_calendar_date_is_rejected() {
        assert!(parse_date("2024-13-40", &formats()).is_none());
        assert!(parse_date("2023-02-29", &formats()).is_none());
        assert!(looks_like_date("2024-13-40"));
    }

    #[test]
    fn test_non_dates() {
        assert!(parse_date("", &formats()).is_none());
        assert!(parse_date("amanha", &formats()).is_none());
        assert!(!looks_like_date("12345"));
    }

    #[test]
    fn test_classify_date() {
        let formats = formats();
        assert_eq!(classify_date(None, &formats), DateCell::Missing);
        assert_eq!(classify_date(Some("  "), &formats), DateCell::Missing);
        assert_eq!(classify_date(Some("N/A"), &formats), DateCell::Missing);
        assert_eq!(classify_date(Some("2024-13-40"), &formats), DateCell::Malformed);
        assert_eq!(
            classify_date(Some("01/04/2024"), &formats),
            DateCell::Valid(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap())
        );
    }

    #[test]
    fn test_month_key_pads() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(month_key(date), "2024-01");
    }
}
