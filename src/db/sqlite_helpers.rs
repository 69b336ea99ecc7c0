//! SQLite helper utilities for type conversion
//!
//! SQLite has no native timestamp or boolean types. Timestamps are stored as
//! RFC 3339 UTC text (lexicographically ordered) and booleans as 0/1 integers.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};

// ============================================================================
// Timestamp Helpers (stored as ISO8601 TEXT in SQLite)
// ============================================================================

/// Get current UTC timestamp as ISO8601 string for SQLite
#[inline]
pub fn now_iso8601() -> String {
    datetime_to_str(Utc::now())
}

/// Convert a chrono DateTime to ISO8601 string
#[inline]
pub fn datetime_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Convert an optional DateTime to an optional ISO8601 string
#[inline]
pub fn datetime_opt_to_str(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(datetime_to_str)
}

/// Parse an ISO8601 string to DateTime
#[inline]
pub fn str_to_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Try parsing SQLite's datetime() format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
                .map_err(|e| anyhow!("Invalid datetime '{}': {}", s, e))
        })
}

/// Parse an optional datetime string
#[inline]
pub fn str_to_datetime_opt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(str_to_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Decode a timestamp column, mapping parse failures onto sqlx decode errors
pub fn decode_datetime(s: &str) -> sqlx::Result<DateTime<Utc>> {
    str_to_datetime(s).map_err(|e| sqlx::Error::Decode(e.into()))
}

/// Decode an optional timestamp column
pub fn decode_datetime_opt(s: Option<&str>) -> sqlx::Result<Option<DateTime<Utc>>> {
    str_to_datetime_opt(s).map_err(|e| sqlx::Error::Decode(e.into()))
}

// ============================================================================
// Boolean Helpers (SQLite uses 0/1 integers)
// ============================================================================

/// Convert bool to SQLite integer (0 or 1)
#[inline]
pub fn bool_to_int(b: bool) -> i32 {
    if b { 1 } else { 0 }
}

/// Convert SQLite integer to bool
#[inline]
pub fn int_to_bool(i: i32) -> bool {
    i != 0
}

// ============================================================================
// Query Building Helpers
// ============================================================================

/// Build a `?, ?, ?` placeholder list for an IN clause
pub fn in_placeholders(count: usize) -> String {
    if count == 0 {
        return "NULL".to_string(); // `x IN (NULL)` never matches
    }

    vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn test_datetime_roundtrip() {
        let dt = Utc::now();
        let s = datetime_to_str(dt);
        let parsed = str_to_datetime(&s).unwrap();
        // Compare to second precision (rfc3339 might have slight differences)
        assert_eq!(dt.timestamp(), parsed.timestamp());
    }

    #[test]
    fn test_sqlite_datetime_format() {
        let s = "2024-01-15 10:30:45";
        let parsed = str_to_datetime(s).unwrap();
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.month(), 1);
        assert_eq!(parsed.day(), 15);
    }

    #[test]
    fn test_stored_timestamps_sort_chronologically() {
        let earlier = datetime_to_str(Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap());
        let later = datetime_to_str(Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap());
        assert!(earlier < later);
    }

    #[test]
    fn test_empty_datetime_is_none() {
        assert!(str_to_datetime_opt(Some("")).unwrap().is_none());
        assert!(str_to_datetime_opt(None).unwrap().is_none());
    }

    #[test]
    fn test_bool_conversion() {
        assert_eq!(bool_to_int(true), 1);
        assert_eq!(bool_to_int(false), 0);
        assert!(int_to_bool(1));
        assert!(int_to_bool(42)); // Any non-zero is true
        assert!(!int_to_bool(0));
    }

    #[test]
    fn test_in_placeholders() {
        assert_eq!(in_placeholders(3), "?, ?, ?");
        assert_eq!(in_placeholders(0), "NULL");
    }
}
