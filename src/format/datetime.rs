//! Date/time parsing and moment-style (`DD/MM/YYYY HH:mm`) formatting on top of chrono.

use super::{ValueFormatter, display_value};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

// Longest alternatives first: the regex engine is leftmost-first.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]*\]|YYYY|YY|MMMM|MMM|MM|M|DD|D|dddd|ddd|HH|H|hh|h|mm|m|ss|s|SSS|A|a")
        .expect("valid moment token regex")
});

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parse a scalar as a UTC date/time. Numbers are epoch milliseconds.
pub fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.naive_utc());
            }
            for fmt in NAIVE_FORMATS {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(dt);
                }
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.is_finite())
            .and_then(|ms| DateTime::from_timestamp_millis(ms as i64))
            .map(|dt| dt.naive_utc()),
        _ => None,
    }
}

/// Translate a moment.js format string to a chrono strftime string.
fn moment_to_strftime(format: &str) -> String {
    fn literal(out: &mut String, text: &str) {
        out.push_str(&text.replace('%', "%%"));
    }

    let mut out = String::with_capacity(format.len() * 2);
    let mut last = 0;
    for m in TOKEN_RE.find_iter(format) {
        literal(&mut out, &format[last..m.start()]);
        let token = m.as_str();
        let piece = match token {
            "YYYY" => "%Y",
            "YY" => "%y",
            "MMMM" => "%B",
            "MMM" => "%b",
            "MM" => "%m",
            "M" => "%-m",
            "DD" => "%d",
            "D" => "%-d",
            "dddd" => "%A",
            "ddd" => "%a",
            "HH" => "%H",
            "H" => "%-H",
            "hh" => "%I",
            "h" => "%-I",
            "mm" => "%M",
            "m" => "%-M",
            "ss" => "%S",
            "s" => "%-S",
            "SSS" => "%3f",
            "A" => "%p",
            "a" => "%P",
            bracketed => {
                literal(&mut out, &bracketed[1..bracketed.len() - 1]);
                ""
            }
        };
        out.push_str(piece);
        last = m.end();
    }
    literal(&mut out, &format[last..]);
    out
}

/// Date/time formatter for one moment-style format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeFormatter {
    strftime: String,
}

pub fn create_datetime_formatter(format: &str) -> DateTimeFormatter {
    DateTimeFormatter::new(format)
}

impl DateTimeFormatter {
    pub fn new(format: &str) -> Self {
        Self {
            strftime: moment_to_strftime(format),
        }
    }

    pub fn format_datetime(&self, dt: &NaiveDateTime) -> String {
        dt.format(&self.strftime).to_string()
    }
}

impl ValueFormatter for DateTimeFormatter {
    /// Parsable values are formatted; anything else keeps its string form.
    fn format(&self, value: &Value) -> String {
        match parse_datetime(value) {
            Some(dt) if value.is_string() => self.format_datetime(&dt),
            _ => display_value(value),
        }
    }
}
