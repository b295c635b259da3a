//! Column-role resolution: fold query rows into named series of points.
//!
//! Roles come from the explicit `columnMapping` when it is non-empty. Otherwise they
//! are parsed from column-name suffixes (`amount::y`, then `amount__y`); a column with
//! no suffix uses its whole name as the role, so a column called `x` is the x column.

use super::options::ChartOptions;
use crate::models::{Point, Role, Row, Series};
use ahash::AHashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Role and display name of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRole {
    pub name: String,
    pub role: Option<Role>,
}

/// Resolve a column's role. An explicit mapping wins; suffix parsing is the fallback.
pub fn resolve_column(column: &str, explicit: Option<&BTreeMap<String, Role>>) -> ColumnRole {
    let parts: Vec<&str> = if column.contains("::") {
        column.split("::").collect()
    } else {
        column.split("__").collect()
    };
    let name = parts.first().copied().unwrap_or(column).to_string();
    let role = match explicit {
        Some(roles) => roles.get(column).copied(),
        None => parts.last().and_then(|suffix| Role::parse(suffix)),
    };
    ColumnRole { name, role }
}

/// Build series from rows (getChartData).
///
/// Without a series column, each row fans out into one point per `y` column, and the
/// series is named after that column. With a series column, each row yields a single
/// point whose `y` is the last `y` column seen. Series are sorted by `zIndex` (stable).
pub fn get_chart_data(rows: &[Row], options: &ChartOptions) -> Vec<Series> {
    let explicit = options.explicit_roles();
    let mut roles: AHashMap<String, ColumnRole> = AHashMap::new();
    let mut series: Vec<Series> = Vec::new();
    let mut index: AHashMap<String, usize> = AHashMap::new();

    let mut push = |name: String, point: Point| {
        let idx = *index.entry(name.clone()).or_insert_with(|| {
            series.push(Series::new(name, options.global_series_type));
            series.len() - 1
        });
        series[idx].data.push(point);
    };

    for row in rows {
        let raw = Arc::new(row.clone());
        let mut series_name: Option<String> = None;
        let mut x: Option<Value> = None;
        let mut y_values: Vec<(String, Value)> = Vec::new();
        let mut y_error = None;
        let mut size = None;
        let mut z_val = None;

        for (column, value) in row {
            let resolved = roles
                .entry(column.clone())
                .or_insert_with(|| resolve_column(column, explicit.as_ref()));
            match resolved.role {
                Some(Role::X) => x = Some(value.clone()),
                Some(Role::Y) => {
                    match y_values.iter_mut().find(|(n, _)| *n == resolved.name) {
                        Some(slot) => slot.1 = value.clone(),
                        None => y_values.push((resolved.name.clone(), value.clone())),
                    }
                }
                Some(Role::YError) => y_error = Some(value.clone()),
                Some(Role::Size) => size = Some(value.clone()),
                Some(Role::ZVal) => z_val = Some(value.clone()),
                Some(Role::Series) | Some(Role::MultiFilter) => {
                    series_name = Some(crate::format::display_value(value));
                }
                Some(Role::Unused) | None => {}
            }
        }

        match series_name {
            None => {
                for (y_name, y) in y_values {
                    push(
                        y_name,
                        Point {
                            x: x.clone(),
                            y,
                            y_error: y_error.clone(),
                            size: size.clone(),
                            z_val: z_val.clone(),
                            raw: Arc::clone(&raw),
                        },
                    );
                }
            }
            Some(name) => {
                let y = y_values.pop().map(|(_, v)| v).unwrap_or(Value::Null);
                push(
                    name,
                    Point {
                        x,
                        y,
                        y_error,
                        size,
                        z_val,
                        raw,
                    },
                );
            }
        }
    }

    series.sort_by_key(|s| options.z_index(&s.name));
    log::debug!("resolved {} rows into {} series", rows.len(), series.len());
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viz::options::get_options;
    use serde_json::json;

    fn rows(v: Value) -> Vec<Row> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn suffixes_resolve_roles() {
        assert_eq!(resolve_column("amount::y", None).role, Some(Role::Y));
        assert_eq!(resolve_column("amount::y", None).name, "amount");
        assert_eq!(resolve_column("day__x", None).role, Some(Role::X));
        assert_eq!(resolve_column("x", None).role, Some(Role::X));
        assert_eq!(resolve_column("total", None).role, None);
    }

    #[test]
    fn explicit_mapping_disables_suffixes() {
        let explicit = BTreeMap::from([("d".to_string(), Role::X)]);
        assert_eq!(resolve_column("d", Some(&explicit)).role, Some(Role::X));
        assert_eq!(resolve_column("v::y", Some(&explicit)).role, None);
    }

    #[test]
    fn unknown_roles_still_count_as_an_explicit_mapping() {
        let opts = get_options(&json!({"columnMapping": {"v::y": "bogus"}})).unwrap();
        assert_eq!(opts.explicit_roles(), Some(BTreeMap::new()));
        let series = get_chart_data(&rows(json!([{"day::x": 1, "v::y": 5}])), &opts);
        assert!(series.is_empty());

        let none = get_options(&json!({})).unwrap();
        assert_eq!(none.explicit_roles(), None);
    }

    #[test]
    fn wide_rows_fan_out_per_y_column() {
        let opts = get_options(&json!({
            "columnMapping": {"day": "x", "a": "y", "b": "y", "note": "unused"}
        }))
        .unwrap();
        let data = rows(json!([
            {"day": "mon", "a": 1, "b": 2, "note": "n"},
            {"day": "tue", "a": 3, "b": 4, "note": "n"}
        ]));
        let series = get_chart_data(&data, &opts);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "a");
        assert_eq!(series[1].data[1].y, json!(4));
        assert_eq!(series[1].data[1].x, Some(json!("tue")));
        assert_eq!(series[0].data[0].raw.get("note"), Some(&json!("n")));
    }

    #[test]
    fn series_column_groups_rows() {
        let opts = get_options(&json!({
            "columnMapping": {"day": "x", "v": "y", "region": "series"},
            "seriesOptions": {"EU": {"zIndex": 1}}
        }))
        .unwrap();
        let data = rows(json!([
            {"day": 1, "v": 10, "region": "EU"},
            {"day": 1, "v": 20, "region": "US"},
            {"day": 2, "v": 30, "region": "EU"}
        ]));
        let series = get_chart_data(&data, &opts);
        let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["US", "EU"]);
        assert_eq!(series[1].data.len(), 2);
    }

    #[test]
    fn missing_x_defaults_to_zero() {
        let opts = get_options(&json!({})).unwrap();
        let series = get_chart_data(&rows(json!([{"count::y": 5}])), &opts);
        assert_eq!(series[0].name, "count");
        assert_eq!(series[0].data[0].x, None);
        assert_eq!(series[0].data[0].x_or_default(), json!(0));
    }
}
