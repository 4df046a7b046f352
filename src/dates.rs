//! Best-effort calendar date normalization.
//!
//! Ambiguous numeric forms are read month first (`03/04/2024` is March 4th).
//! Spreadsheet serial numbers are not decoded; a plain number is only tried
//! as text, which fails for serials like `45292`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::data::Value;

// Two-digit-year and month-first forms come first: chrono's %Y accepts
// short years, so `03/04/05` must not reach `%Y/%m/%d`.
const DATE_FORMATS: &[&str] = &[
    "%m/%d/%y",
    "%m-%d-%y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m.%d.%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d-%b-%Y",
    "%d-%b-%y",
    "%Y%m%d",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// `YYYY-MM-DD` for anything that reads as a calendar date, otherwise `None`.
pub fn parse_date(value: &Value) -> Option<String> {
    let date = match value {
        Value::Null => None,
        Value::Date(d) => Some(*d),
        Value::Number(_) => value.as_display().and_then(|s| parse_date_text(&s)),
        Value::Text(s) => parse_date_text(s),
    }?;
    Some(date.format("%Y-%m-%d").to_string())
}

pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(parsed.date());
        }
    }
    // %Y%m%d also accepts short digit runs; only allow it on eight digits.
    let compact = text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit());
    DATE_FORMATS
        .iter()
        .filter(|fmt| **fmt != "%Y%m%d" || compact)
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}
