//! Counter visualization: one headline value, an optional target and the trend between them.

use crate::format::{NumberFormatter, ValueFormatter, clean_number, display_value};
use crate::models::{Row, de_i64_from_string_or_number};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Saved counter options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CounterOptions {
    pub counter_label: String,
    pub counter_col_name: String,
    #[serde(deserialize_with = "de_i64_from_string_or_number")]
    pub row_number: i64,
    pub target_col_name: Option<String>,
    #[serde(deserialize_with = "de_i64_from_string_or_number")]
    pub target_row_number: i64,
    #[serde(deserialize_with = "de_i64_from_string_or_number")]
    pub string_decimal: i64,
    pub string_dec_char: String,
    pub string_thou_sep: String,
    pub string_prefix: Option<String>,
    pub string_suffix: Option<String>,
    pub tooltip_format: String,
    pub format_target_value: bool,
    pub count_row: bool,
}

impl Default for CounterOptions {
    fn default() -> Self {
        Self {
            counter_label: String::new(),
            counter_col_name: "counter".to_string(),
            row_number: 1,
            target_col_name: None,
            target_row_number: 1,
            string_decimal: 0,
            string_dec_char: ".".to_string(),
            string_thou_sep: ",".to_string(),
            string_prefix: None,
            string_suffix: None,
            tooltip_format: "0,0.000".to_string(),
            format_target_value: false,
            count_row: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterData {
    pub counter_label: String,
    pub counter_value: String,
    pub counter_value_tooltip: String,
    /// `None` when no target column is configured.
    pub target_value: Option<String>,
    pub target_value_tooltip: String,
    pub show_trend: bool,
    pub trend_positive: bool,
}

/// Row index for a 1-based, wrapping row number. `0` is the first row and negative
/// numbers count from the end.
pub fn get_row_number(index: i64, rows_count: usize) -> usize {
    if index == 0 || rows_count == 0 {
        return 0;
    }
    let wrapped = ((index.unsigned_abs() - 1) % rows_count as u64) as usize;
    if index > 0 {
        wrapped
    } else {
        rows_count - wrapped - 1
    }
}

fn cell(rows: &[Row], index: i64, column: &str) -> Value {
    rows.get(get_row_number(index, rows.len()))
        .and_then(|row| row.get(column))
        .cloned()
        .unwrap_or(Value::Null)
}

fn value_formatter(options: &CounterOptions) -> NumberFormatter {
    let decimals = options.string_decimal.clamp(0, 20) as usize;
    let mut format = if options.string_thou_sep.is_empty() {
        String::from("0")
    } else {
        String::from("0,0")
    };
    if decimals > 0 {
        format.push('.');
        format.push_str(&"0".repeat(decimals));
    }
    NumberFormatter::with_separators(&format, &options.string_thou_sep, &options.string_dec_char)
}

/// Numbers get the counter's separators and affixes; anything else is shown as is.
fn format_value(value: &Value, options: &CounterOptions) -> String {
    match value {
        Value::Number(_) => format!(
            "{}{}{}",
            options.string_prefix.as_deref().unwrap_or(""),
            value_formatter(options).format(value),
            options.string_suffix.as_deref().unwrap_or(""),
        ),
        other => display_value(other),
    }
}

fn format_tooltip(value: &Value, format: &str) -> String {
    match value {
        Value::Number(_) => NumberFormatter::new(format).format(value),
        other => display_value(other),
    }
}

/// Counter values for `rows`. `None` when there is nothing to show.
pub fn get_counter_data(
    rows: &[Row],
    options: &CounterOptions,
    visualization_name: &str,
) -> Option<CounterData> {
    if rows.is_empty() && !options.count_row {
        return None;
    }
    let counter = if options.count_row {
        Value::from(rows.len())
    } else if options.counter_col_name.is_empty() {
        Value::Null
    } else {
        cell(rows, options.row_number, &options.counter_col_name)
    };
    let target = options
        .target_col_name
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(|column| cell(rows, options.target_row_number, column));

    let (show_trend, trend_positive) = match (&counter, target.as_ref().and_then(clean_number)) {
        (Value::Number(n), Some(t)) => match n.as_f64() {
            Some(c) if c.is_finite() => (true, c - t >= 0.0),
            _ => (false, false),
        },
        _ => (false, false),
    };

    let target_value = target.as_ref().map(|t| {
        if options.format_target_value {
            format_value(t, options)
        } else {
            match clean_number(t) {
                Some(_) => NumberFormatter::new("0[.]00[0]").format(t),
                None => display_value(t),
            }
        }
    });

    let label = if options.counter_label.is_empty() {
        visualization_name.to_string()
    } else {
        options.counter_label.clone()
    };
    Some(CounterData {
        counter_label: label,
        counter_value: format_value(&counter, options),
        counter_value_tooltip: format_tooltip(&counter, &options.tooltip_format),
        target_value,
        target_value_tooltip: format_tooltip(target.as_ref().unwrap_or(&Value::Null), &options.tooltip_format),
        show_trend,
        trend_positive,
    })
}
