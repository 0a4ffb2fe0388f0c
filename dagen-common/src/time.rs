//! Advice timestamp parsing
//!
//! Advice feeds deliver timestamps in several shapes depending on the
//! provider. Formats are tried in a fixed preference order; a string that
//! matches none of them fails the whole file load, because a batch with
//! partially parsed records must never reach version comparison.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{Error, Result};

/// Current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse an advice timestamp, trying the accepted formats in preference
/// order: millisecond-precision with offset, long fraction with offset,
/// long fraction bare, offset only, bare, "Z"-suffixed UTC.
///
/// Bare timestamps are taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.3f%:z") {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%:z") {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(t.and_utc());
    }
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%:z") {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(t.and_utc());
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ") {
        return Ok(t.and_utc());
    }
    Err(Error::Parse(format!("unrecognized timestamp: {s}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_millisecond_offset() {
        let t = parse_timestamp("2026-03-01T10:30:00.250-07:00").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2026, 3, 1, 17, 30, 0).unwrap() + chrono::Duration::milliseconds(250));
    }

    #[test]
    fn parses_long_fraction_with_offset() {
        let t = parse_timestamp("2026-03-01T10:30:00.1234567+02:00").unwrap();
        assert_eq!(t.timestamp(), Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap().timestamp());
    }

    #[test]
    fn parses_long_fraction_bare_as_utc() {
        let t = parse_timestamp("2026-03-01T10:30:00.1234567").unwrap();
        assert_eq!(t.timestamp(), Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap().timestamp());
    }

    #[test]
    fn parses_offset_only() {
        let t = parse_timestamp("2026-03-01T10:30:00+05:30").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2026, 3, 1, 5, 0, 0).unwrap());
    }

    #[test]
    fn parses_bare_as_utc() {
        let t = parse_timestamp("2026-03-01T10:30:00").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn parses_zulu_suffix() {
        let t = parse_timestamp("2026-03-01T10:30:00Z").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("03/01/2026 10:30").is_err());
        assert!(parse_timestamp("").is_err());
    }
}
