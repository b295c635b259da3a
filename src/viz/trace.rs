//! Renderer trace shapes, serialized field-for-field to the Plotly schema.
//!
//! Each trace also carries a non-serialized `source_data` side channel mapping an
//! x value back to the prepared point, used for hover text and the update pass.

use super::types::ChartType;
use crate::color::ScaleStops;
use crate::format::value_key;
use crate::models::Row;
use ahash::AHashMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;

/// One prepared point, as referenced from `source_data`.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcePoint {
    /// Normalized x (datetime axes reformatted).
    pub x: Value,
    /// Cleaned y (number or null), or the raw value for bubble/scatter.
    pub y: Value,
    pub y_error: Option<Value>,
    pub size: Option<Value>,
    pub y_percent: Option<f64>,
    /// Original x and y before normalization.
    pub orig_x: Value,
    pub orig_y: Value,
    pub raw: Arc<Row>,
}

/// x value -> prepared points. Duplicates are kept; lookups return the last one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceData {
    points: Vec<SourcePoint>,
    index: AHashMap<String, usize>,
}

impl SourceData {
    pub fn push(&mut self, point: SourcePoint) {
        self.index.insert(value_key(&point.x), self.points.len());
        self.points.push(point);
    }

    pub fn get(&self, x: &Value) -> Option<&SourcePoint> {
        self.index.get(&value_key(x)).map(|&i| &self.points[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourcePoint> {
        self.points.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SourcePoint> {
        self.points.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn ser_visible<S: Serializer>(visible: &bool, s: S) -> Result<S::Ok, S::Error> {
    if *visible {
        s.serialize_bool(true)
    } else {
        s.serialize_str("legendonly")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizemode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font<C> {
    pub color: C,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBars {
    #[serde(rename = "type")]
    pub kind: String,
    pub visible: bool,
    pub array: Vec<Value>,
    pub color: String,
}

/// Bar, scatter-family and box traces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XyTrace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    #[serde(serialize_with = "ser_visible")]
    pub visible: bool,
    pub x: Vec<Value>,
    pub y: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offsetgroup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<&'static str>,
    pub marker: Marker,
    pub insidetextfont: Font<&'static str>,
    #[serde(rename = "error_y")]
    pub error_y: ErrorBars,
    pub text: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub textposition: Option<&'static str>,
    /// `"text+x+name"`-style flags, or `false` for boxes.
    pub hoverinfo: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boxpoints: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jitter: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointpos: Option<f64>,
    /// Series name before display-name overrides.
    #[serde(skip)]
    pub series_name: String,
    /// Effective per-series chart type.
    #[serde(skip)]
    pub series_kind: ChartType,
    #[serde(skip)]
    pub source_data: SourceData,
}

impl XyTrace {
    /// True when this trace is drawn against the secondary value axis.
    pub fn on_secondary_axis(&self) -> bool {
        self.yaxis == Some("y2") || self.xaxis == Some("x2")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieMarker {
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Domain {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieTrace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    #[serde(serialize_with = "ser_visible")]
    pub visible: bool,
    pub values: Vec<Value>,
    pub labels: Vec<Value>,
    pub hole: f64,
    pub marker: PieMarker,
    pub hoverinfo: Value,
    pub text: Vec<String>,
    pub textinfo: &'static str,
    pub textposition: &'static str,
    pub textfont: Font<Vec<&'static str>>,
    pub direction: super::types::Direction,
    pub domain: Domain,
    pub sort: bool,
    #[serde(skip)]
    pub source_data: SourceData,
}

/// Heatmap color scale: a renderer preset name or explicit stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColorScale {
    Named(String),
    Stops(ScaleStops),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapTrace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub x: Vec<Value>,
    pub y: Vec<Value>,
    pub z: Vec<Vec<Value>>,
    pub colorscale: ColorScale,
}

/// Text-only overlay (heatmap cell labels).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextTrace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub mode: &'static str,
    pub x: Vec<Value>,
    pub y: Vec<Value>,
    pub text: Vec<String>,
    pub textfont: Font<Vec<&'static str>>,
    pub hoverinfo: &'static str,
    pub showlegend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Trace {
    Xy(XyTrace),
    Pie(PieTrace),
    Heatmap(HeatmapTrace),
    Text(TextTrace),
}

impl Trace {
    pub fn is_visible(&self) -> bool {
        match self {
            Trace::Xy(t) => t.visible,
            Trace::Pie(t) => t.visible,
            Trace::Heatmap(_) | Trace::Text(_) => true,
        }
    }

    /// Heatmaps and label overlays have no visibility toggle.
    pub fn set_visible(&mut self, visible: bool) {
        match self {
            Trace::Xy(t) => t.visible = visible,
            Trace::Pie(t) => t.visible = visible,
            Trace::Heatmap(_) | Trace::Text(_) => {}
        }
    }

    /// Name used to toggle visibility (the series name, not the display name).
    pub fn series_name(&self) -> Option<&str> {
        match self {
            Trace::Xy(t) => Some(&t.series_name),
            Trace::Pie(t) => Some(&t.name),
            Trace::Heatmap(_) | Trace::Text(_) => None,
        }
    }

    /// Entries this trace contributes to the legend.
    pub fn legend_labels(&self) -> Vec<String> {
        match self {
            Trace::Xy(t) => vec![t.name.clone()],
            Trace::Pie(t) => t.labels.iter().map(crate::format::display_value).collect(),
            Trace::Heatmap(_) | Trace::Text(_) => Vec::new(),
        }
    }
}

/// Prepared chart: traces plus layout, ready for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Value,
    /// Data handed to user-defined custom charts; they are never evaluated here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<super::prepare::CustomChartData>,
}
