//! Chart options: defaults, deep merge with saved options and legacy migration.
//!
//! [`get_options`] is the only way a [`ChartOptions`] is produced from persisted JSON,
//! so every later stage can rely on all keys being present.

use super::types::{AxisType, ChartType, Direction, LegendPlacement, SizeMode, Stacking};
use crate::error::Result;
use crate::models::Role;
use crate::stats::Aggregation;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegendOptions {
    pub enabled: bool,
    pub placement: LegendPlacement,
    pub traceorder: String,
}

impl Default for LegendOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            placement: LegendPlacement::Auto,
            traceorder: "normal".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisTitle {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisLabels {
    pub enabled: bool,
}

impl Default for AxisLabels {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AxisOptions {
    #[serde(rename = "type")]
    pub kind: AxisType,
    pub title: Option<AxisTitle>,
    pub labels: AxisLabels,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub range_min: Option<f64>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub range_max: Option<f64>,
    pub reversed: bool,
    pub tick_format: Option<String>,
    pub opposite: bool,
}

impl AxisOptions {
    fn with_kind(kind: AxisType) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Title text; blank titles count as none.
    pub fn title_text(&self) -> Option<&str> {
        self.title
            .as_ref()
            .map(|t| t.text.as_str())
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorBarOptions {
    #[serde(rename = "type")]
    pub kind: String,
    pub visible: bool,
}

impl Default for ErrorBarOptions {
    fn default() -> Self {
        Self {
            kind: "data".to_string(),
            visible: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeriesDefaults {
    #[serde(deserialize_with = "de_stacking")]
    pub stacking: Option<Stacking>,
    pub percent_values: bool,
    #[serde(rename = "error_y")]
    pub error_y: ErrorBarOptions,
}

/// Per-series overrides, keyed by series name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeriesOptions {
    #[serde(rename = "type")]
    pub kind: Option<ChartType>,
    pub color: Option<String>,
    pub y_axis: u8,
    pub z_index: i64,
    pub name: Option<String>,
}

/// Per-slice overrides for pie charts, keyed by slice label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueOptions {
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionOptions {
    #[serde(rename = "type")]
    pub kind: Direction,
}

/// The full chart configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartOptions {
    pub global_series_type: ChartType,
    #[serde(rename = "sortX")]
    pub sort_x: bool,
    pub legend: LegendOptions,
    pub x_axis: AxisOptions,
    pub y_axis: Vec<AxisOptions>,
    pub align_y_axes_at_zero: bool,
    #[serde(rename = "error_y")]
    pub error_y: ErrorBarOptions,
    pub series: SeriesDefaults,
    pub series_options: BTreeMap<String, SeriesOptions>,
    pub values_options: BTreeMap<String, ValueOptions>,
    pub column_mapping: BTreeMap<String, String>,
    pub direction: DirectionOptions,
    pub sizemode: SizeMode,
    pub coefficient: f64,
    pub number_format: String,
    pub percent_format: String,
    pub text_format: String,
    pub missing_values_as_zero: bool,
    pub show_data_labels: bool,
    pub date_time_format: String,
    pub swapped_axes: bool,
    pub aggregation: Aggregation,
    pub color_scheme: Option<String>,
    pub heat_min_color: String,
    pub heat_max_color: String,
    #[serde(rename = "sortY")]
    pub sort_y: bool,
    #[serde(rename = "reverseX")]
    pub reverse_x: bool,
    #[serde(rename = "reverseY")]
    pub reverse_y: bool,
    pub showpoints: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            global_series_type: ChartType::Column,
            sort_x: true,
            legend: LegendOptions::default(),
            x_axis: AxisOptions::with_kind(AxisType::Auto),
            y_axis: vec![
                AxisOptions::with_kind(AxisType::Linear),
                AxisOptions {
                    opposite: true,
                    ..AxisOptions::with_kind(AxisType::Linear)
                },
            ],
            align_y_axes_at_zero: false,
            error_y: ErrorBarOptions::default(),
            series: SeriesDefaults::default(),
            series_options: BTreeMap::new(),
            values_options: BTreeMap::new(),
            column_mapping: BTreeMap::new(),
            direction: DirectionOptions::default(),
            sizemode: SizeMode::Diameter,
            coefficient: 1.0,
            number_format: "0,0[.]00000".to_string(),
            percent_format: "0[.]00%".to_string(),
            text_format: String::new(),
            missing_values_as_zero: true,
            show_data_labels: false,
            date_time_format: "DD/MM/YYYY HH:mm".to_string(),
            swapped_axes: false,
            aggregation: Aggregation::Sum,
            color_scheme: None,
            heat_min_color: "#356aff".to_string(),
            heat_max_color: "#e92827".to_string(),
            sort_y: true,
            reverse_x: false,
            reverse_y: false,
            showpoints: false,
        }
    }
}

/// Effective per-series settings: global type and primary axis overlaid by overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveSeriesOptions {
    pub kind: ChartType,
    pub color: Option<String>,
    pub y_axis: u8,
    pub name: Option<String>,
}

impl ChartOptions {
    pub fn series_options_for(&self, series_name: &str) -> EffectiveSeriesOptions {
        let saved = self.series_options.get(series_name);
        EffectiveSeriesOptions {
            kind: saved
                .and_then(|s| s.kind)
                .unwrap_or(self.global_series_type),
            color: saved
                .and_then(|s| s.color.clone())
                .filter(|c| !c.is_empty()),
            y_axis: saved.map(|s| s.y_axis).unwrap_or(0),
            name: saved.and_then(|s| s.name.clone()).filter(|n| !n.is_empty()),
        }
    }

    pub fn z_index(&self, series_name: &str) -> i64 {
        self.series_options
            .get(series_name)
            .map(|s| s.z_index)
            .unwrap_or(0)
    }

    /// Axis options for `yaxis` (index 0) or `yaxis2` (index 1).
    pub fn y_axis_options(&self, index: usize) -> AxisOptions {
        self.y_axis.get(index).cloned().unwrap_or_else(|| {
            AxisOptions {
                opposite: index == 1,
                ..AxisOptions::with_kind(AxisType::Linear)
            }
        })
    }

    /// Explicit column roles, or `None` when no mapping was saved. Unknown role names
    /// are dropped, but a saved mapping stays explicit even if none of it parses.
    pub fn explicit_roles(&self) -> Option<BTreeMap<String, Role>> {
        if self.column_mapping.is_empty() {
            return None;
        }
        Some(
            self.column_mapping
                .iter()
                .filter_map(|(col, role)| match Role::parse(role) {
                    Some(r) => Some((col.clone(), r)),
                    None => {
                        log::debug!("column {col:?}: unknown role {role:?} ignored");
                        None
                    }
                })
                .collect(),
        )
    }

    pub fn uses_stacking(&self) -> bool {
        self.series.stacking.is_some()
    }
}

/// Merge saved options over the defaults and migrate legacy fields.
///
/// Idempotent: feeding the serialized result back in yields the same options.
pub fn get_options(saved: &Value) -> Result<ChartOptions> {
    let mut merged = serde_json::to_value(ChartOptions::default())?;
    let is_pie = saved.get("globalSeriesType").and_then(Value::as_str) == Some("pie");
    if let Value::Object(map) = &mut merged {
        map.insert("showDataLabels".into(), Value::Bool(is_pie));
    }
    merge_options(&mut merged, saved);
    migrate_legacy(&mut merged);
    Ok(serde_json::from_value(merged)?)
}

/// Recursive merge: objects merge key by key, arrays merge index by index,
/// anything else in `saved` replaces the target. `null` in `saved` keeps defaults
/// only for object-valued targets.
pub fn merge_options(target: &mut Value, saved: &Value) {
    match (target, saved) {
        (Value::Object(t), Value::Object(s)) => {
            for (key, value) in s {
                match t.get_mut(key) {
                    Some(existing) => merge_options(existing, value),
                    None => {
                        t.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(t), Value::Array(s)) => {
            for (i, value) in s.iter().enumerate() {
                match t.get_mut(i) {
                    Some(existing) => merge_options(existing, value),
                    None => t.push(value.clone()),
                }
            }
        }
        (Value::Object(_), Value::Null) => {}
        (t, s) => *t = s.clone(),
    }
}

fn migrate_legacy(merged: &mut Value) {
    let Value::Object(root) = merged else {
        return;
    };

    if let Some(Value::Object(series)) = root.get_mut("series") {
        let legacy = series
            .get("stacking")
            .and_then(Value::as_str)
            .filter(|s| matches!(*s, "normal" | "percent"))
            .map(str::to_string);
        if let Some(old) = legacy {
            log::debug!("migrating legacy stacking {old:?}");
            series.insert("percentValues".into(), Value::Bool(old == "percent"));
            series.insert("stacking".into(), Value::from("stack"));
        }
    }

    if let Some(show) = root.remove("showLegend") {
        let enabled = is_truthy(&show);
        let legend = root
            .entry("legend")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(legend) = legend {
            legend.insert("enabled".into(), Value::Bool(enabled));
        }
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Range bounds are saved as numbers, numeric strings, `""` or `null`.
fn de_lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(crate::format::clean_number(&raw).filter(|_| !raw.is_boolean()))
}

/// `"stack"` enables stacking; `null`, `""` and unknown values disable it.
fn de_stacking<'de, D>(deserializer: D) -> std::result::Result<Option<Stacking>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw.as_str() {
        Some("stack") => Some(Stacking::Stack),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_fill_missing_keys() {
        let o = get_options(&json!({})).unwrap();
        assert_eq!(o, ChartOptions::default());
        assert_eq!(o.y_axis.len(), 2);
        assert!(o.y_axis[1].opposite);
        assert_eq!(o.number_format, "0,0[.]00000");
    }

    #[test]
    fn round_trip_is_stable() {
        let saved = json!({
            "globalSeriesType": "line",
            "yAxis": [{"type": "logarithmic", "rangeMin": "1"}],
            "seriesOptions": {"a": {"zIndex": 2, "color": "#ff0000"}},
            "series": {"stacking": "percent"},
            "showLegend": false
        });
        let once = get_options(&saved).unwrap();
        let twice = get_options(&serde_json::to_value(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn saved_y_axis_is_padded_from_defaults() {
        let o = get_options(&json!({"yAxis": [{"type": "logarithmic"}]})).unwrap();
        assert_eq!(o.y_axis[0].kind, AxisType::Logarithmic);
        assert_eq!(o.y_axis[1].kind, AxisType::Linear);
        assert!(o.y_axis[1].opposite);
    }

    #[test]
    fn legacy_stacking_and_legend_migrate() {
        let o = get_options(&json!({
            "series": {"stacking": "percent"},
            "showLegend": false
        }))
        .unwrap();
        assert_eq!(o.series.stacking, Some(Stacking::Stack));
        assert!(o.series.percent_values);
        assert!(!o.legend.enabled);

        let normal = get_options(&json!({"series": {"stacking": "normal"}})).unwrap();
        assert_eq!(normal.series.stacking, Some(Stacking::Stack));
        assert!(!normal.series.percent_values);
    }

    #[test]
    fn data_labels_default_depends_on_chart_type() {
        assert!(get_options(&json!({"globalSeriesType": "pie"})).unwrap().show_data_labels);
        assert!(!get_options(&json!({"globalSeriesType": "line"})).unwrap().show_data_labels);
        let explicit = json!({"globalSeriesType": "pie", "showDataLabels": false});
        assert!(!get_options(&explicit).unwrap().show_data_labels);
    }

    #[test]
    fn blank_range_bounds_are_none() {
        let o = get_options(&json!({"yAxis": [{"rangeMin": "", "rangeMax": 10}]})).unwrap();
        assert_eq!(o.y_axis[0].range_min, None);
        assert_eq!(o.y_axis[0].range_max, Some(10.0));
    }

    #[test]
    fn invalid_shapes_are_errors() {
        let err = get_options(&json!({"sortX": "yes please"})).unwrap_err();
        assert!(err.to_string().starts_with("invalid visualization options"));
    }

    #[test]
    fn series_overrides_resolve() {
        let o = get_options(&json!({
            "globalSeriesType": "column",
            "seriesOptions": {"b": {"type": "line", "yAxis": 1, "color": ""}}
        }))
        .unwrap();
        let b = o.series_options_for("b");
        assert_eq!(b.kind, ChartType::Line);
        assert_eq!(b.y_axis, 1);
        assert_eq!(b.color, None);
        assert_eq!(o.series_options_for("zzz").kind, ChartType::Column);
    }
}
