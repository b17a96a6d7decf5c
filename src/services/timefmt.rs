//! Date/time text handling shared by the pages.
//!
//! Two textual shapes exist: the input widgets use `YYYY-MM-DDTHH:MM`, the
//! booking API expects `YYYY-MM-DD HH:MM`. Both are parsed into
//! `NaiveDateTime` and written back in either shape without losing precision
//! (seconds are only emitted when non-zero).

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Timelike};

/// Separator between the date and time parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    /// `T`, as used by `datetime-local` inputs and URL parameters.
    Input,
    /// A single space, as used on the wire.
    Wire,
}

impl Separator {
    fn as_char(self) -> char {
        match self {
            Separator::Input => 'T',
            Separator::Wire => ' ',
        }
    }
}

const ACCEPTED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse a timestamp in either shape. A bare date is read as midnight.
/// RFC 3339 values with an offset keep their wall-clock time.
pub fn parse(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    ACCEPTED_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|d| d.naive_local())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Format a timestamp with the given separator.
pub fn format(dt: &NaiveDateTime, sep: Separator) -> String {
    let date = dt.format("%Y-%m-%d");
    if dt.nanosecond() != 0 {
        format!("{}{}{}", date, sep.as_char(), dt.format("%H:%M:%S%.f"))
    } else if dt.second() != 0 {
        format!("{}{}{}", date, sep.as_char(), dt.format("%H:%M:%S"))
    } else {
        format!("{}{}{}", date, sep.as_char(), dt.format("%H:%M"))
    }
}

/// Rewrite a timestamp string into the requested shape.
pub fn normalize(value: &str, sep: Separator) -> Option<String> {
    parse(value).map(|dt| format(&dt, sep))
}

/// Long display form used in booking tables, e.g. `Jan 1, 2024, 10:00 AM`.
pub fn display(dt: &NaiveDateTime) -> String {
    dt.format("%b %-d, %Y, %I:%M %p").to_string()
}

/// Short display form used in availability messages, e.g. `Mon, Jan 1, 10:00 AM`.
pub fn display_short(dt: &NaiveDateTime) -> String {
    dt.format("%a, %b %-d, %I:%M %p").to_string()
}

/// Default form window: starts `lead_minutes` from `now` and lasts `span_minutes`.
/// Seconds are dropped so the values fit a minute-precision input.
pub fn default_window(
    now: NaiveDateTime,
    lead_minutes: i64,
    span_minutes: i64,
) -> (NaiveDateTime, NaiveDateTime) {
    let now = now
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);
    let start = now + Duration::minutes(lead_minutes);
    let end = start + Duration::minutes(span_minutes);
    (start, end)
}

/// Serde adapter writing wire format and reading either shape.
pub mod wire {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{format, parse, Separator};

    pub fn serialize<S>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(dt, Separator::Wire))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }
}
