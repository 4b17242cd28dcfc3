//! Timestamp canonicalization.
//!
//! Providers disagree on timestamp text. Every record is keyed by
//! `YYYY-MM-DD HH:MM:SS` before it enters a [`SourceMap`](crate::record::SourceMap).

use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::ForecastError;

/// Canonical output format.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted input formats, tried in order.
///
/// A trailing `Z` is accepted and dropped: adapters emit local time, so a
/// `Z` here only appears in legacy artifacts.
static FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses `raw` with the first matching format.
///
/// # Errors
///
/// Returns [`ForecastError::TimestampFormatUnrecognized`] carrying the raw
/// string when no format matches.
pub fn try_normalize_time(raw: &str) -> Result<String, ForecastError> {
    let raw = raw.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.format(CANONICAL_FORMAT).to_string())
        .ok_or_else(|| ForecastError::TimestampFormatUnrecognized(raw.to_string()))
}

/// Canonicalizes `raw`, or returns it unchanged with a warning.
///
/// An unrecognized timestamp simply fails to correlate with other providers.
pub fn normalize_time(raw: &str) -> String {
    match try_normalize_time(raw) {
        Ok(canonical) => canonical,
        Err(e) => {
            warn!(raw, error = %e, "Timestamp left as-is");
            raw.to_string()
        }
    }
}

/// Joins a date key and an hour-of-day (`"2025-08-07"`, `"15:00"`) and
/// canonicalizes the result.
pub fn normalize_date_hour(date: &str, hour: &str) -> String {
    normalize_time(&format!("{} {}", date.trim(), hour.trim()))
}

/// Formats an instant as canonical wall-clock time in `tz`.
pub fn to_local_canonical<Z: TimeZone>(instant: &DateTime<Z>, tz: Tz) -> String {
    instant
        .with_timezone(&tz)
        .format(CANONICAL_FORMAT)
        .to_string()
}

/// Converts a unix timestamp (seconds) to canonical wall-clock time in `tz`.
pub fn unix_to_local_canonical(secs: i64, tz: Tz) -> Option<String> {
    DateTime::from_timestamp(secs, 0).map(|dt| to_local_canonical(&dt, tz))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_formats() {
        let cases = [
            ("2025-08-07T15:00:00", "2025-08-07 15:00:00"),
            ("2025-08-07 15:00:00", "2025-08-07 15:00:00"),
            ("2025-08-07T15:00:00Z", "2025-08-07 15:00:00"),
            ("2025-08-07 15:00", "2025-08-07 15:00:00"),
            ("2025-08-07T15:00", "2025-08-07 15:00:00"),
        ];
        for (raw, expected) in cases {
            assert_eq!(normalize_time(raw), expected, "input {raw}");
        }
    }

    #[test]
    fn test_unrecognized_is_passed_through() {
        assert_eq!(normalize_time("tomorrow 3pm"), "tomorrow 3pm");
        assert_eq!(
            try_normalize_time("07/08/2025 15:00"),
            Err(ForecastError::TimestampFormatUnrecognized(
                "07/08/2025 15:00".into()
            ))
        );
    }

    #[test]
    fn test_normalize_is_stable() {
        let once = normalize_time("2025-08-07T09:30");
        assert_eq!(normalize_time(&once), once);
    }

    #[test]
    fn test_date_hour_pair() {
        assert_eq!(
            normalize_date_hour("2025-08-07", "15:00"),
            "2025-08-07 15:00:00"
        );
    }

    #[test]
    fn test_utc_converted_to_stockholm() {
        // CEST is UTC+2 in August, CET is UTC+1 in January.
        let summer = unix_to_local_canonical(1_754_575_200, chrono_tz::Europe::Stockholm);
        assert_eq!(summer.as_deref(), Some("2025-08-07 16:00:00"));

        let winter = DateTime::parse_from_rfc3339("2025-01-15T12:00:00Z").unwrap();
        assert_eq!(
            to_local_canonical(&winter, chrono_tz::Europe::Stockholm),
            "2025-01-15 13:00:00"
        );
    }
}
