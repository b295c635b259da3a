//! Value and template formatting.
//!
//! Every formatter is infallible: any input, including `null`, produces a best-effort
//! string. Formatters are built once from a format string and then applied per value.

pub mod datetime;
pub mod number;
pub mod template;

pub use datetime::{DateTimeFormatter, create_datetime_formatter, parse_datetime};
pub use number::{NumberFormatter, create_number_formatter};
pub use template::{format_simple_template, template_uses};

use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// moment-style format used to normalize values on datetime axes.
pub const AXIS_DATETIME_FORMAT: &str = "YYYY-MM-DD HH:mm:ss";

/// Anything that renders a JSON scalar as display text.
pub trait ValueFormatter {
    fn format(&self, value: &Value) -> String;
}

/// JavaScript-like string conversion: `null` -> `""`, integral floats without `.0`.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
                    Some(f) => f.to_string(),
                    None => n.to_string(),
                }
            }
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce to a finite number. Numeric strings parse, booleans map to 1/0, the rest is `None`.
pub fn clean_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() { None } else { t.parse::<f64>().ok() }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

/// `Value` for a finite number, `null` otherwise.
pub fn number_value(n: Option<f64>) -> Value {
    n.and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Identity key for a scalar; `1` and `"1"` stay distinct.
pub fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => format!("s:{s}"),
        other => format!("v:{other}"),
    }
}

/// Total order used for x sorting: null < bool < number < string < everything else.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)).then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

/// Values on datetime axes are reformatted with `format`; everything else passes through.
pub fn normalize_value(value: &Value, datetime_axis: bool, format: &str) -> Value {
    if datetime_axis
        && let Some(dt) = parse_datetime(value)
    {
        return Value::String(DateTimeFormatter::new(format).format_datetime(&dt));
    }
    value.clone()
}

/// Booleans rendered with user labels: `[false, true]`, or just `[false]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanFormatter {
    labels: Vec<String>,
}

pub fn create_boolean_formatter(labels: &[String]) -> BooleanFormatter {
    BooleanFormatter {
        labels: labels.to_vec(),
    }
}

impl ValueFormatter for BooleanFormatter {
    fn format(&self, value: &Value) -> String {
        let truthy = match value {
            Value::Null => {
                // a lone "false" label still renders null as that label
                return if self.labels.len() == 1 {
                    self.labels[0].clone()
                } else {
                    String::new()
                };
            }
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            _ => true,
        };
        match self.labels.len() {
            0 => truthy.to_string(),
            1 => {
                if truthy {
                    "true".to_string()
                } else {
                    self.labels[0].clone()
                }
            }
            _ => self.labels[usize::from(truthy)].clone(),
        }
    }
}

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("valid url regex"));

/// Plain text, optionally HTML-escaped with URLs turned into links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextFormatter {
    highlight_links: bool,
}

pub fn create_text_formatter(highlight_links: bool) -> TextFormatter {
    TextFormatter { highlight_links }
}

impl ValueFormatter for TextFormatter {
    fn format(&self, value: &Value) -> String {
        let text = display_value(value);
        if !self.highlight_links || !value.is_string() {
            return text;
        }
        let escaped = escape_html(&text);
        URL_RE
            .replace_all(&escaped, |caps: &regex::Captures| {
                let url = &caps[0];
                format!(r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{url}</a>"#)
            })
            .into_owned()
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
