//! Per-chart-type series formatting (prepareData).
//!
//! The global chart type selects one handler; [`xy`] further dispatches on each
//! series' effective type.

pub mod custom;
pub mod heatmap;
pub mod pie;
pub mod xy;

pub use custom::{CustomChartData, prepare_custom_data};
pub use pie::{PieGrid, pie_grid};

use super::options::ChartOptions;
use super::trace::Trace;
use super::types::{AxisType, ChartType};
use crate::format::{AXIS_DATETIME_FORMAT, normalize_value, template_uses};
use crate::models::Series;
use serde_json::Value;

/// Build renderer traces for `series`. Custom charts produce no traces.
pub fn prepare_data(series: &[Series], options: &ChartOptions) -> Vec<Trace> {
    match options.global_series_type {
        ChartType::Pie => pie::prepare_pie_data(series, options),
        ChartType::Heatmap => heatmap::prepare_heatmap_data(series, options),
        ChartType::Custom => Vec::new(),
        ChartType::Column
        | ChartType::Line
        | ChartType::Area
        | ChartType::Scatter
        | ChartType::Bubble
        | ChartType::Box => xy::prepare_xy_data(series, options),
    }
}

/// Hover flags: the formatted text, plus x and name unless the template shows them.
pub fn hover_info_pattern(text_format: &str) -> String {
    let mut result = String::from("text");
    if !template_uses(text_format, "@@x") {
        result.push_str("+x");
    }
    if !template_uses(text_format, "@@name") {
        result.push_str("+name");
    }
    result
}

/// x value as plotted: datetime axes are reformatted, everything else passes through.
pub(crate) fn normalize_for_axis(value: &Value, axis: AxisType) -> Value {
    normalize_value(value, axis == AxisType::Datetime, AXIS_DATETIME_FORMAT)
}
