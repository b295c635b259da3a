//! Funnel visualization: ordered steps with percent-of-max and percent-of-previous.

use crate::format::{NumberFormatter, ValueFormatter, clean_number, compare_values, display_value};
use crate::models::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunnelColumn {
    pub col_name: String,
    pub display_as: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortKeyColumn {
    pub col_name: String,
    pub reverse: bool,
}

/// Percent values outside this range are shown as `<min` / `>max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PercentRange {
    pub min: f64,
    pub max: f64,
}

impl Default for PercentRange {
    fn default() -> Self {
        Self {
            min: 0.01,
            max: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunnelOptions {
    pub step_col: FunnelColumn,
    pub value_col: FunnelColumn,
    pub auto_sort: bool,
    pub sort_key_col: SortKeyColumn,
    pub items_limit: usize,
    pub percent_values_range: PercentRange,
    pub number_format: String,
    pub percent_format: String,
}

impl Default for FunnelOptions {
    fn default() -> Self {
        Self {
            step_col: FunnelColumn {
                col_name: String::new(),
                display_as: "Steps".to_string(),
            },
            value_col: FunnelColumn {
                col_name: String::new(),
                display_as: "Value".to_string(),
            },
            auto_sort: true,
            sort_key_col: SortKeyColumn::default(),
            items_limit: 100,
            percent_values_range: PercentRange::default(),
            number_format: "0,0[.]00".to_string(),
            percent_format: "0[.]00%".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelStep {
    pub step: String,
    pub value: f64,
    /// `None` when the largest value is zero.
    pub pct_max: Option<f64>,
    /// `None` when the previous value is zero.
    pub pct_previous: Option<f64>,
    pub value_text: String,
    pub pct_max_text: String,
    pub pct_previous_text: String,
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Percent (0..100 scale) for display, clamped to the configured range.
pub fn format_percent_value(value: Option<f64>, options: &FunnelOptions) -> String {
    let Some(value) = value else {
        return String::new();
    };
    let formatter = NumberFormatter::new(&options.percent_format);
    let range = options.percent_values_range;
    if value < range.min {
        format!("<{}", formatter.format_number(range.min / 100.0))
    } else if value > range.max {
        format!(">{}", formatter.format_number(range.max / 100.0))
    } else {
        formatter.format_number(value / 100.0)
    }
}

/// Funnel steps for `rows`. Empty unless both the step and the value column are set.
pub fn prepare_funnel_data(rows: &[Row], options: &FunnelOptions) -> Vec<FunnelStep> {
    let step_col = options.step_col.col_name.as_str();
    let value_col = options.value_col.col_name.as_str();
    if rows.is_empty() || step_col.is_empty() || value_col.is_empty() {
        return Vec::new();
    }
    fn field(row: &Row, col: &str) -> Value {
        row.get(col).cloned().unwrap_or(Value::Null)
    }

    let mut rows: Vec<&Row> = rows.iter().collect();
    let sort_col = options.sort_key_col.col_name.as_str();
    if options.auto_sort {
        rows.sort_by(|a, b| {
            let (a, b) = (parse_value(&field(a, value_col)), parse_value(&field(b, value_col)));
            b.total_cmp(&a)
        });
    } else if !sort_col.is_empty() {
        rows.sort_by(|a, b| compare_values(&field(a, sort_col), &field(b, sort_col)));
    }
    if !options.auto_sort && options.sort_key_col.reverse {
        rows.reverse();
    }

    let values: Vec<(String, f64)> = rows
        .iter()
        .map(|row| {
            (
                display_value(&field(row, step_col)),
                parse_value(&field(row, value_col)),
            )
        })
        .collect();
    let max = values.iter().map(|(_, v)| *v).fold(f64::MIN, f64::max);
    let number = NumberFormatter::new(&options.number_format);

    values
        .iter()
        .enumerate()
        .take(options.items_limit)
        .map(|(i, (step, value))| {
            let pct_max = finite(value / max * 100.0);
            let pct_previous = if i == 0 || *value == values[i - 1].1 {
                Some(100.0)
            } else {
                finite(value / values[i - 1].1 * 100.0)
            };
            FunnelStep {
                step: step.clone(),
                value: *value,
                pct_max,
                pct_previous,
                value_text: number.format_number(*value),
                pct_max_text: format_percent_value(pct_max, options),
                pct_previous_text: format_percent_value(pct_previous, options),
            }
        })
        .collect()
}

/// Non-numeric values count as zero.
fn parse_value(value: &Value) -> f64 {
    match clean_number(value) {
        Some(v) => v,
        None => {
            log::debug!("funnel value {value} is not numeric, using 0");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(steps: &[(&str, Value)]) -> Vec<Row> {
        steps
            .iter()
            .map(|(s, v)| json!({"step": s, "users": v}).as_object().cloned().unwrap())
            .collect()
    }

    fn options(extra: Value) -> FunnelOptions {
        let mut base = json!({"stepCol": {"colName": "step"}, "valueCol": {"colName": "users"}});
        crate::viz::updater::merge_patch(&mut base, &extra);
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn first_and_repeated_values_are_full_previous() {
        let data = prepare_funnel_data(
            &rows(&[("visit", json!(200)), ("signup", json!(200)), ("pay", json!(50))]),
            &options(json!({"autoSort": false})),
        );
        let prev: Vec<_> = data.iter().map(|d| d.pct_previous).collect();
        assert_eq!(prev, [Some(100.0), Some(100.0), Some(25.0)]);
        assert_eq!(data[2].pct_max, Some(25.0));
        assert_eq!(data[2].pct_max_text, "25%");
    }

    #[test]
    fn auto_sort_orders_by_value_descending() {
        let data = prepare_funnel_data(
            &rows(&[("pay", json!(5)), ("visit", json!("100")), ("junk", json!("n/a"))]),
            &options(json!({})),
        );
        let steps: Vec<_> = data.iter().map(|d| d.step.as_str()).collect();
        assert_eq!(steps, ["visit", "pay", "junk"]);
        assert_eq!(data[2].value, 0.0);
    }

    #[test]
    fn sort_key_reverse_and_limit() {
        let mut input = rows(&[("b", json!(1)), ("a", json!(2)), ("c", json!(3))]);
        for (row, key) in input.iter_mut().zip([2, 1, 3]) {
            row.insert("k".into(), json!(key));
        }
        let data = prepare_funnel_data(
            &input,
            &options(json!({"autoSort": false, "sortKeyCol": {"colName": "k", "reverse": true}, "itemsLimit": 2})),
        );
        let steps: Vec<_> = data.iter().map(|d| d.step.as_str()).collect();
        assert_eq!(steps, ["c", "b"]);
    }

    #[test]
    fn percent_display_is_clamped() {
        let opts = options(json!({}));
        assert_eq!(format_percent_value(Some(0.001), &opts), "<0.01%");
        assert_eq!(format_percent_value(Some(5000.0), &opts), ">1000%");
        assert_eq!(format_percent_value(Some(12.5), &opts), "12.50%");
        assert_eq!(format_percent_value(None, &opts), "");
    }

    #[test]
    fn missing_columns_give_no_steps() {
        assert!(prepare_funnel_data(&rows(&[("a", json!(1))]), &FunnelOptions::default()).is_empty());
    }
}
