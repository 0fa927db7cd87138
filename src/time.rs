//! UTC calendar helpers on millisecond timestamps.

use crate::Timestamp;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Milliseconds in one UTC day.
pub const DAY_MS: Timestamp = 86_400_000;

/// Milliseconds in one hour.
pub const HOUR_MS: Timestamp = 3_600_000;

/// Returns the current timestamp in milliseconds since the Unix epoch.
#[must_use]
pub fn timestamp() -> Timestamp {
    Utc::now().timestamp_millis()
}

/// Offset from the preceding UTC midnight, in `[0, DAY_MS)`.
pub(crate) fn time_of_day(ts: Timestamp) -> Timestamp {
    ts.rem_euclid(DAY_MS)
}

/// Number of whole UTC days since the epoch (negative before 1970).
pub(crate) fn day_number(ts: Timestamp) -> i64 {
    ts.div_euclid(DAY_MS)
}

/// First millisecond of the UTC day containing `ts`.
#[must_use]
pub fn start_of_day(ts: Timestamp) -> Timestamp {
    ts.saturating_sub(time_of_day(ts))
}

/// Last millisecond of the UTC day containing `ts`.
#[must_use]
pub fn end_of_day(ts: Timestamp) -> Timestamp {
    start_of_day(ts).saturating_add(DAY_MS - 1)
}

/// Builds a UTC timestamp from calendar fields.
///
/// Returns `None` for fields that do not name a real instant (month 13, Feb 30, hour 24, ...).
#[must_use]
pub fn from_utc(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<Timestamp> {
    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(hour, minute, second)
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Formats a timestamp as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
#[must_use]
pub fn format_iso(ts: Timestamp) -> Option<String> {
    DateTime::from_timestamp_millis(ts).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 style label into a timestamp.
///
/// Labels without an offset are read as UTC; a bare date is midnight UTC.
#[must_use]
pub fn parse_iso(text: &str) -> Option<Timestamp> {
    let text = text.trim();

    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}
