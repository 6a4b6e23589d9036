//! Parsing of the heterogeneous timestamp strings found in entry logs.
//!
//! Strings carrying an explicit offset are honoured; everything else is read
//! as UTC. Parsing never fails loudly: callers get `None` and pick their own
//! fallback.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Offset pattern RFC 3339 rejects (no colon in the offset); `%.f` also
/// matches a missing fraction.
const OFFSET_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Naive patterns, assumed to be UTC, in priority order.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_ONLY_FORMAT: &str = "%Y-%m-%d";

/// Digit counts accepted as epoch seconds and epoch milliseconds.
const EPOCH_SECONDS_DIGITS: usize = 10;
const EPOCH_MILLIS_DIGITS: usize = 13;

/// Earliest instant an epoch value may denote (2000-01-01T00:00:00Z).
const EPOCH_FLOOR_SECONDS: i64 = 946_684_800;

/// Parse a timestamp string into a UTC instant.
///
/// Tries RFC 3339 (with and without fractional seconds), then ISO 8601
/// with a colon-less offset, then a list of naive date-time patterns
/// assumed to be UTC, then a bare date (midnight UTC), then epoch seconds
/// (10 digits) or milliseconds (13 digits) from 2000 onwards.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    // Covers both the fractional and the whole-second RFC 3339 forms.
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_str(text, OFFSET_DATETIME_FORMAT) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, DATE_ONLY_FORMAT) {
        return date.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
    }

    parse_epoch(text)
}

/// Bare digit strings only; shorter numbers such as `20240115` are not
/// read as 1970-era instants.
fn parse_epoch(text: &str) -> Option<DateTime<Utc>> {
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: i64 = text.parse().ok()?;
    let parsed = match text.len() {
        EPOCH_SECONDS_DIGITS => DateTime::from_timestamp(value, 0),
        EPOCH_MILLIS_DIGITS => DateTime::from_timestamp_millis(value),
        _ => None,
    }?;
    (parsed.timestamp() >= EPOCH_FLOOR_SECONDS).then_some(parsed)
}
