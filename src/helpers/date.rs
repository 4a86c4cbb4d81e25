//! Date helper functions
//!
//! Post dates arrive as plain strings from the content store, so everything
//! here is string-in: parsing is locale independent and naive values are
//! read as UTC, which keeps sort order identical on every host.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::fmt::Write;

/// Date-time layouts carrying an explicit offset
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S %z",
];

/// Date-time layouts without an offset (interpreted as UTC)
const NAIVE_DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y.%m.%d %H:%M",
];

/// Date-only layouts
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Parse a date-only string such as `2024-01-15` or `2024/1/5`
pub fn parse_naive_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse a post date string into a UTC instant
///
/// # Examples
/// ```ignore
/// parse_date("2024-01-15")            // midnight UTC
/// parse_date("2024-01-15T10:30:00+09:00")
/// ```
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    parse_offset_datetime(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| parse_naive_datetime(s).map(|dt| dt.and_utc()))
}

/// Parse a date-time that carries an explicit offset
fn parse_offset_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc3339(s).ok().or_else(|| {
        OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
    })
}

/// Parse a date or date-time without an offset; date-only values are midnight
fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| parse_naive_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// Resolve a raw post date in the site timezone
///
/// Values with an offset are converted into `tz`; values without one are
/// wall-clock time in `tz`, as the author wrote them.
pub fn local_datetime<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    match parse_offset_datetime(raw) {
        Some(dt) => Some(dt.with_timezone(tz)),
        None => parse_naive_datetime(raw).and_then(|dt| tz.from_local_datetime(&dt).earliest()),
    }
}

/// Milliseconds since the epoch, used as the sort key for posts
pub fn timestamp_millis(s: &str) -> Option<i64> {
    parse_date(s).map(|dt| dt.timestamp_millis())
}

/// Format a date using Moment.js-compatible format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "YYYY/MM/DD") // -> "2024/01/15"
/// ```
pub fn format_date<Tz: TimeZone>(date: &DateTime<Tz>, format: &str) -> Option<String>
where
    Tz::Offset: std::fmt::Display,
{
    let chrono_format = moment_to_chrono_format(format);
    let mut out = String::new();
    // chrono reports unsupported specifiers through fmt::Error
    write!(out, "{}", date.format(&chrono_format)).ok()?;
    Some(out)
}

/// Format a raw post date for display in the site timezone
///
/// Strings that do not parse are returned unchanged.
pub fn display_date<Tz: TimeZone>(raw: &str, format: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    local_datetime(raw, tz)
        .and_then(|dt| format_date(&dt, format))
        .unwrap_or_else(|| raw.to_string())
}

/// Format a date in W3C / ISO 8601 form, as used by sitemaps
pub fn date_xml<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DDDD", "%j"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("ZZ", "%z"),
        ("SSS", "%3f"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}
