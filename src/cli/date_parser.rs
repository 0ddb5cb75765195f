//! Date parsing module for CLI arguments
//!
//! Supports both absolute and relative date formats:
//! - Absolute: ISO 8601 formats like "2024-01-01", "2024-01-01T10:30:00Z"
//! - Relative: Human-readable formats like "2 weeks ago", "yesterday", "last month"
//!
//! Dates resolve to a calendar day, matching the day granularity of the
//! authored-date window.

use chrono::{DateTime, Days, Local, Months, NaiveDate, NaiveDateTime};

/// Error types for date parsing
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DateParseError {
    #[error("Invalid date format: {input}. Expected ISO 8601 (YYYY-MM-DD) or relative format (e.g., '1 week ago')")]
    InvalidFormat { input: String },

    #[error("Invalid relative date: {input}. Expected format like '1 week ago', 'yesterday', 'last month'")]
    InvalidRelativeFormat { input: String },

    #[error("Unsupported time unit: {unit}. Supported units: days, weeks, months, years")]
    UnsupportedUnit { unit: String },

    #[error("Invalid number in relative date: {input}")]
    InvalidNumber { input: String },

    #[error("Date range validation failed: start date {start} is after end date {end}")]
    InvalidRange { start: String, end: String },
}

/// Parse a date string into a calendar day, relative to the local today
///
/// # Examples
///
/// ```
/// use devscore::cli::date_parser::parse_date;
///
/// let start = parse_date("2024-01-01").unwrap();
/// assert_eq!(start.to_string(), "2024-01-01");
/// assert!(parse_date("3 weeks ago").is_ok());
/// ```
pub fn parse_date(input: &str) -> Result<NaiveDate, DateParseError> {
    parse_date_from(input, Local::now().date_naive())
}

/// Parse a date string with an explicit "today"
pub fn parse_date_from(input: &str, today: NaiveDate) -> Result<NaiveDate, DateParseError> {
    let trimmed = input.trim();

    if let Some(date) = parse_absolute_date(trimmed) {
        return Ok(date);
    }

    parse_relative_date(trimmed, today)
}

/// ISO 8601 date or datetime; datetimes keep their own calendar day
fn parse_absolute_date(input: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }

    for layout in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(input, layout) {
            return Some(naive_dt.date());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

fn parse_relative_date(input: &str, today: NaiveDate) -> Result<NaiveDate, DateParseError> {
    let input_lower = input.to_lowercase();
    let invalid = || DateParseError::InvalidRelativeFormat { input: input.to_string() };

    match input_lower.as_str() {
        "today" | "now" => return Ok(today),
        "yesterday" => return today.checked_sub_days(Days::new(1)).ok_or_else(invalid),
        "last week" => return today.checked_sub_days(Days::new(7)).ok_or_else(invalid),
        "last month" => return today.checked_sub_months(Months::new(1)).ok_or_else(invalid),
        "last year" => return today.checked_sub_months(Months::new(12)).ok_or_else(invalid),
        _ => {}
    }

    // "N unit ago"
    let parts: Vec<&str> = input_lower.split_whitespace().collect();
    if parts.len() != 3 || parts[2] != "ago" {
        return Err(if parts.len() == 1 {
            DateParseError::InvalidFormat { input: input.to_string() }
        } else {
            invalid()
        });
    }

    let number = parts[0]
        .parse::<u32>()
        .map_err(|_| DateParseError::InvalidNumber { input: input.to_string() })?;

    let result = match parts[1] {
        "day" | "days" => today.checked_sub_days(Days::new(number.into())),
        "week" | "weeks" => today.checked_sub_days(Days::new(u64::from(number) * 7)),
        "month" | "months" => today.checked_sub_months(Months::new(number)),
        "year" | "years" => number
            .checked_mul(12)
            .and_then(|months| today.checked_sub_months(Months::new(months))),
        unit => return Err(DateParseError::UnsupportedUnit { unit: unit.to_string() }),
    };
    result.ok_or_else(invalid)
}

/// Validate that a date range is logical (start <= end)
pub fn validate_date_range(start: Option<&str>, end: Option<&str>) -> Result<(), DateParseError> {
    if let (Some(start_str), Some(end_str)) = (start, end) {
        let start_date = parse_date(start_str)?;
        let end_date = parse_date(end_str)?;

        if start_date > end_date {
            return Err(DateParseError::InvalidRange {
                start: start_str.to_string(),
                end: end_str.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_absolute_date_iso_8601() {
        assert_eq!(parse_date_from("2023-01-01", today()).unwrap(), date("2023-01-01"));
        assert_eq!(parse_date_from("2023-01-01T10:30:00", today()).unwrap(), date("2023-01-01"));
        assert_eq!(parse_date_from("2023-01-01T23:30:00-05:00", today()).unwrap(), date("2023-01-01"));
    }

    #[test]
    fn test_parse_relative_date_named() {
        assert_eq!(parse_date_from("today", today()).unwrap(), today());
        assert_eq!(parse_date_from("yesterday", today()).unwrap(), date("2024-03-30"));
        assert_eq!(parse_date_from("last week", today()).unwrap(), date("2024-03-24"));
        // Month arithmetic clamps to the end of the month
        assert_eq!(parse_date_from("last month", today()).unwrap(), date("2024-02-29"));
    }

    #[test]
    fn test_parse_relative_date_ago_format() {
        assert_eq!(parse_date_from("1 day ago", today()).unwrap(), date("2024-03-30"));
        assert_eq!(parse_date_from("2 weeks ago", today()).unwrap(), date("2024-03-17"));
        assert_eq!(parse_date_from("3 months ago", today()).unwrap(), date("2023-12-31"));
        assert_eq!(parse_date_from("1 year ago", today()).unwrap(), date("2023-03-31"));
    }

    #[test]
    fn test_parse_date_error_cases() {
        assert!(matches!(parse_date_from("not-a-date", today()), Err(DateParseError::InvalidFormat { .. })));
        assert!(parse_date_from("2023-13-01", today()).is_err());
        assert!(matches!(parse_date_from("abc days ago", today()), Err(DateParseError::InvalidNumber { .. })));
        assert!(matches!(parse_date_from("1 fortnight ago", today()), Err(DateParseError::UnsupportedUnit { .. })));
        assert!(matches!(parse_date_from("1 day", today()), Err(DateParseError::InvalidRelativeFormat { .. })));
    }

    #[test]
    fn test_validate_date_range() {
        assert!(validate_date_range(Some("2023-01-01"), Some("2023-12-31")).is_ok());
        assert!(validate_date_range(Some("2023-12-31"), Some("2023-01-01")).is_err());
        assert!(validate_date_range(Some("2023-01-01"), None).is_ok());
        assert!(validate_date_range(None, None).is_ok());
    }

    #[test]
    fn test_whitespace_and_case() {
        assert!(parse_date_from("  2023-01-01  ", today()).is_ok());
        assert!(parse_date_from("YESTERDAY", today()).is_ok());
        assert!(parse_date_from("1 DAY AGO", today()).is_ok());
    }
}
