//! Time parsing helpers
//!
//! Date string to timestamp conversion happens at the API handler layer;
//! the storage layer only sees `i64` Unix millis.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::{AppError, AppResult};

/// Parse a backdate string in any of the accepted formats
///
/// Accepted, in order of preference:
/// - RFC 3339 (`2023-01-15T10:30:00Z`, with offset)
/// - `YYYY-MM-DD HH:MM:SS` (interpreted as UTC)
/// - `YYYY-MM-DD` (midnight UTC)
pub fn parse_backdate(date: &str) -> AppResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    if let Ok(d) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        // and_hms_opt(0,0,0) is always valid for midnight
        let naive = d.and_hms_opt(0, 0, 0).unwrap();
        return Ok(naive.and_utc());
    }

    Err(AppError::validation(format!("Invalid date format: {}", date)))
}

/// Render a stored Unix-millis timestamp back as RFC 3339 for API responses
pub fn millis_to_rfc3339(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339() {
        let dt = parse_backdate("2023-01-15T10:30:00Z").unwrap();
        assert_eq!(dt.timestamp(), 1673778600);
    }

    #[test]
    fn parses_space_separated() {
        let dt = parse_backdate("2023-01-15 10:30:00").unwrap();
        assert_eq!(dt.timestamp(), 1673778600);
    }

    #[test]
    fn parses_bare_date_as_midnight() {
        let dt = parse_backdate("2023-01-15").unwrap();
        assert_eq!(dt.timestamp(), 1673740800);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_backdate("not-a-date").is_err());
        assert!(parse_backdate("").is_err());
    }
}
