//! Calendar-day and time-of-day string handling.
//!
//! The whole system stores calendar days as zero-padded `YYYY-MM-DD` strings
//! and times of day as `HH:mm` strings. Lexical order on day strings equals
//! chronological order only while the format stays zero-padded, so every
//! inbound value is parsed and re-formatted here instead of being trusted.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

use crate::error::ApiError;

/// Format string for calendar-day values.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Format string for time-of-day values.
pub const CLOCK_FORMAT: &str = "%H:%M";

/// Parse and normalize a `YYYY-MM-DD` day string.
pub fn parse_day(value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, DAY_FORMAT)
        .map_err(|_| ApiError::Validation(format!("invalid date: {value} (expected YYYY-MM-DD)")))
}

/// Validate a day string and return its normalized form.
pub fn normalize_day(value: &str) -> Result<String, ApiError> {
    Ok(day_string(parse_day(value)?))
}

/// Format a date as a day string.
pub fn day_string(date: NaiveDate) -> String {
    date.format(DAY_FORMAT).to_string()
}

/// Parse and normalize an `HH:mm` time-of-day string.
pub fn parse_clock(value: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(value, CLOCK_FORMAT)
        .map_err(|_| ApiError::Validation(format!("invalid time: {value} (expected HH:mm)")))
}

/// Validate a time-of-day string and return its normalized form.
pub fn normalize_clock(value: &str) -> Result<String, ApiError> {
    Ok(parse_clock(value)?.format(CLOCK_FORMAT).to_string())
}

/// Most recent Sunday on or before the given date.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// First day of the calendar month containing the given date.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day_roundtrip() {
        let date = parse_day("2024-01-05").unwrap();
        assert_eq!(day_string(date), "2024-01-05");
    }

    #[test]
    fn test_parse_day_rejects_garbage() {
        assert!(parse_day("01/05/2024").is_err());
        assert!(parse_day("2024-13-01").is_err());
        assert!(parse_day("").is_err());
    }

    #[test]
    fn test_normalize_clock() {
        assert_eq!(normalize_clock("08:00").unwrap(), "08:00");
        assert_eq!(normalize_clock("23:59").unwrap(), "23:59");
        assert!(normalize_clock("24:00").is_err());
        assert!(normalize_clock("8am").is_err());
    }

    #[test]
    fn test_week_start_is_sunday() {
        // 2024-01-10 is a Wednesday; the preceding Sunday is 2024-01-07.
        let wednesday = parse_day("2024-01-10").unwrap();
        assert_eq!(day_string(week_start(wednesday)), "2024-01-07");

        // A Sunday is its own week start.
        let sunday = parse_day("2024-01-07").unwrap();
        assert_eq!(week_start(sunday), sunday);
    }

    #[test]
    fn test_month_start() {
        let date = parse_day("2024-02-29").unwrap();
        assert_eq!(day_string(month_start(date)), "2024-02-01");
    }

    #[test]
    fn test_lexical_order_matches_chronological() {
        let earlier = day_string(parse_day("2024-09-30").unwrap());
        let later = day_string(parse_day("2024-10-01").unwrap());
        assert!(earlier < later);
    }
}
