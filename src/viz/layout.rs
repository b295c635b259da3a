//! Initial layout (prepareLayout).

use super::options::{AxisOptions, ChartOptions};
use super::prepare::pie_grid;
use super::trace::Trace;
use super::types::{AxisType, ChartType, Size};
use crate::format::template_uses;
use serde_json::{Map, Value, json};

/// Margins every layout starts from; legend placement grows the bottom one.
pub const BASE_MARGIN: [(&str, f64); 5] =
    [("l", 10.0), ("r", 10.0), ("b", 5.0), ("t", 20.0), ("pad", 4.0)];

pub fn base_margin() -> Value {
    Value::Object(
        BASE_MARGIN
            .iter()
            .map(|(k, v)| ((*k).to_string(), json!(v)))
            .collect::<Map<String, Value>>(),
    )
}

pub fn prepare_layout(size: Size, options: &ChartOptions, traces: &[Trace]) -> Value {
    let (width, height) = size.plot_size();
    let mut layout = json!({
        "margin": base_margin(),
        "width": width,
        "height": height,
        "autosize": false,
        "showlegend": options.legend.enabled,
        "legend": {"traceorder": options.legend.traceorder},
        "hoverlabel": {"namelength": -1},
    });
    let extra = match options.global_series_type {
        ChartType::Pie => pie_layout(options, traces),
        ChartType::Box => {
            let mut l = default_layout(options, traces);
            l.insert("boxmode".into(), json!("group"));
            l.insert("boxgroupgap".into(), json!(0.5));
            l
        }
        ChartType::Column
        | ChartType::Line
        | ChartType::Area
        | ChartType::Scatter
        | ChartType::Bubble
        | ChartType::Heatmap
        | ChartType::Custom => default_layout(options, traces),
    };
    if let Value::Object(map) = &mut layout {
        map.extend(extra);
    }
    layout
}

fn pie_layout(options: &ChartOptions, traces: &[Trace]) -> Map<String, Value> {
    let mut out = Map::new();
    if template_uses(&options.text_format, "@@name") {
        out.insert("annotations".into(), json!([]));
        return out;
    }
    let grid = pie_grid(traces.len());
    let annotations: Vec<Value> = traces
        .iter()
        .enumerate()
        .filter_map(|(index, trace)| match trace {
            Trace::Pie(pie) => {
                let (x0, y0) = grid.cell_origin(index);
                Some(json!({
                    "x": x0 + (grid.cell_width - grid.x_padding) / 2.0,
                    "y": y0 + grid.cell_height - 0.015,
                    "xanchor": "center",
                    "yanchor": "top",
                    "text": pie.name,
                    "showarrow": false,
                }))
            }
            _ => None,
        })
        .collect();
    out.insert("annotations".into(), Value::Array(annotations));
    out
}

fn axis_layout(axis: &AxisOptions) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("title".into(), json!(axis.title_text()));
    out.insert("type".into(), json!(axis.kind.plotly_name()));
    out.insert("automargin".into(), json!(true));
    if let Some(fmt) = axis.tick_format.as_deref().filter(|f| !f.is_empty()) {
        out.insert("tickformat".into(), json!(fmt));
    }
    out
}

fn default_layout(options: &ChartOptions, traces: &[Trace]) -> Map<String, Value> {
    let mut x_axis = axis_layout(&options.x_axis);
    if options.sort_x && options.x_axis.kind == AxisType::Category {
        let order = if options.reverse_x {
            "category descending"
        } else {
            "category ascending"
        };
        x_axis.insert("categoryorder".into(), json!(order));
    }
    x_axis.insert("showticklabels".into(), json!(options.x_axis.labels.enabled));

    let mut out = Map::new();
    out.insert("xaxis".into(), Value::Object(x_axis));
    out.insert("yaxis".into(), Value::Object(axis_layout(&options.y_axis_options(0))));

    let has_y2 = traces
        .iter()
        .any(|t| matches!(t, Trace::Xy(xy) if xy.on_secondary_axis()));
    if has_y2 {
        let mut y2 = axis_layout(&options.y_axis_options(1));
        y2.insert("overlaying".into(), json!("y"));
        y2.insert("side".into(), json!("right"));
        out.insert("yaxis2".into(), Value::Object(y2));
    }
    if options.uses_stacking() {
        out.insert("barmode".into(), json!("relative"));
    }
    if options.swapped_axes {
        out = swap_axis_keys(out);
    }
    out
}

/// Horizontal orientation: `xaxis`/`yaxis` trade places, `yaxis2` becomes a top `xaxis2`.
pub fn swap_axis_keys(patch: Map<String, Value>) -> Map<String, Value> {
    patch
        .into_iter()
        .map(|(key, value)| match key.as_str() {
            "xaxis" => ("yaxis".to_string(), value),
            "yaxis" => ("xaxis".to_string(), value),
            "yaxis2" => {
                let mut axis = value;
                if let Value::Object(a) = &mut axis {
                    if a.contains_key("overlaying") {
                        a.insert("overlaying".into(), json!("x"));
                    }
                    if a.contains_key("side") {
                        a.insert("side".into(), json!("top"));
                    }
                }
                ("xaxis2".to_string(), axis)
            }
            _ => (key, value),
        })
        .collect()
}
