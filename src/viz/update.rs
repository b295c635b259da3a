//! Data update pass (updateData): percent values, unified x axis, text, stacking.
//!
//! Runs on prepared traces after every data change and every visibility toggle.
//! Only visible traces take part. Each step rebuilds `x`/`y` from `source_data`,
//! so running the pass twice gives the same result.

use super::options::ChartOptions;
use super::trace::{PieTrace, SourcePoint, Trace, XyTrace};
use super::types::{AxisType, ChartType};
use crate::format::{
    ValueFormatter, clean_number, compare_values, create_number_formatter,
    display_value, format_simple_template, normalize_value, number_value, value_key,
};
use ahash::AHashMap;
use serde_json::{Map, Value};

pub fn update_data(traces: Vec<Trace>, options: &ChartOptions) -> Vec<Trace> {
    // a re-run starts from the vertical form
    let mut traces: Vec<Trace> = traces.into_iter().map(orient_vertical).collect();
    match options.global_series_type {
        ChartType::Pie => {
            for trace in traces.iter_mut() {
                if let Trace::Pie(pie) = trace
                    && pie.visible
                {
                    update_pie_text(pie, options);
                }
            }
        }
        ChartType::Heatmap | ChartType::Custom => {}
        ChartType::Column
        | ChartType::Line
        | ChartType::Area
        | ChartType::Scatter
        | ChartType::Bubble
        | ChartType::Box => {
            let mut visible: Vec<&mut XyTrace> = traces
                .iter_mut()
                .filter_map(|t| match t {
                    Trace::Xy(xy) if xy.visible => Some(xy),
                    _ => None,
                })
                .collect();
            update_percent_values(&mut visible, options);
            update_unified_x(&mut visible, options);
            for trace in visible.iter_mut() {
                update_series_text(trace, options);
            }
            update_stacking(&mut visible, options);
        }
    }
    if options.swapped_axes {
        traces = traces.into_iter().map(orient_horizontal).collect();
    }
    traces
}

fn update_percent_values(traces: &mut [&mut XyTrace], options: &ChartOptions) {
    if !options.series.percent_values {
        return;
    }
    let mut sums: AHashMap<String, f64> = AHashMap::new();
    for trace in traces.iter() {
        for item in trace.source_data.iter() {
            *sums.entry(value_key(&item.x)).or_default() += clean_number(&item.y).unwrap_or(0.0).abs();
        }
    }
    for trace in traces.iter_mut() {
        let mut ys = Vec::with_capacity(trace.source_data.len());
        for item in trace.source_data.iter_mut() {
            item.y_percent = match clean_number(&item.y) {
                None if !options.missing_values_as_zero => None,
                y => {
                    let sum = sums.get(&value_key(&item.x)).copied().unwrap_or(0.0);
                    (sum != 0.0).then(|| y.unwrap_or(0.0) / sum * 100.0)
                }
            };
            ys.push(number_value(item.y_percent));
        }
        trace.y = ys;
    }
}

/// One shared x axis across aggregating series; gaps become 0 or null.
fn update_unified_x(traces: &mut [&mut XyTrace], options: &ChartOptions) {
    let mut seen = ahash::AHashSet::new();
    let mut unified: Vec<Value> = Vec::new();
    for trace in traces.iter().filter(|t| t.series_kind.unifies_x()) {
        for item in trace.source_data.iter() {
            if seen.insert(value_key(&item.x)) {
                unified.push(item.x.clone());
            }
        }
    }
    if options.sort_x {
        unified.sort_by(compare_values);
    }
    let default_y = if options.missing_values_as_zero {
        number_value(Some(0.0))
    } else {
        Value::Null
    };

    for trace in traces.iter_mut().filter(|t| t.series_kind.unifies_x()) {
        let (mut ys, mut errors) = (Vec::with_capacity(unified.len()), Vec::with_capacity(unified.len()));
        for x in &unified {
            match trace.source_data.get(x) {
                Some(item) => {
                    ys.push(if options.series.percent_values {
                        number_value(item.y_percent)
                    } else {
                        item.y.clone()
                    });
                    errors.push(item.y_error.clone().unwrap_or(Value::Null));
                }
                None => {
                    ys.push(default_y.clone());
                    errors.push(Value::Null);
                }
            }
        }
        trace.x = unified.clone();
        trace.y = ys;
        trace.error_y.array = errors;
    }
}

/// Formatted value of an axis's original datum for `@@x`/`@@y`.
fn format_axis_value(value: &Value, axis: AxisType, options: &ChartOptions) -> Value {
    Value::String(display_value(&normalize_value(
        value,
        axis == AxisType::Datetime,
        &options.date_time_format,
    )))
}

struct TextFormatters {
    number: crate::format::NumberFormatter,
    percent: crate::format::NumberFormatter,
}

impl TextFormatters {
    fn new(options: &ChartOptions) -> Self {
        Self {
            number: create_number_formatter(&options.number_format),
            percent: create_number_formatter(&options.percent_format),
        }
    }
}

fn text_context(
    series_name: &str,
    item: &SourcePoint,
    y_is_any: bool,
    y_axis: AxisType,
    with_percent: bool,
    fmt: &TextFormatters,
    options: &ChartOptions,
) -> Map<String, Value> {
    let mut ctx = Map::new();
    ctx.insert("@@name".into(), Value::from(series_name));
    ctx.insert("@@x".into(), format_axis_value(&item.orig_x, options.x_axis.kind, options));
    let y = if y_is_any {
        format_axis_value(&item.orig_y, y_axis, options)
    } else {
        Value::String(fmt.number.format(&item.y))
    };
    ctx.insert("@@y".into(), y);
    if let Some(e) = &item.y_error {
        ctx.insert("@@yError".into(), Value::String(fmt.number.format(e)));
    }
    if let Some(s) = &item.size {
        ctx.insert("@@size".into(), Value::String(fmt.number.format(s)));
    }
    if with_percent {
        // percent formats scale by 100 themselves
        let pct = item.y_percent.map(|p| p.abs() / 100.0);
        ctx.insert("@@yPercent".into(), Value::String(fmt.percent.format(&number_value(pct))));
    }
    for (k, v) in item.raw.iter() {
        ctx.insert(k.clone(), v.clone());
    }
    ctx
}

fn ctx_str<'a>(ctx: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    ctx.get(key).and_then(Value::as_str)
}

fn default_series_text(ctx: &Map<String, Value>) -> String {
    let mut result = ctx_str(ctx, "@@y").unwrap_or_default().to_string();
    if let Some(e) = ctx_str(ctx, "@@yError") {
        result = format!("{result} \u{00b1} {e}");
    }
    if let Some(p) = ctx_str(ctx, "@@yPercent") {
        result = format!("{p} ({result})");
    }
    if let Some(s) = ctx_str(ctx, "@@size") {
        result = format!("{result} [{s}]");
    }
    result
}

fn update_series_text(trace: &mut XyTrace, options: &ChartOptions) {
    let fmt = TextFormatters::new(options);
    let y_axis = options
        .y_axis_options(usize::from(trace.on_secondary_axis()))
        .kind;
    let default_y = if options.missing_values_as_zero {
        number_value(Some(0.0))
    } else {
        Value::Null
    };

    let text = trace
        .x
        .iter()
        .map(|x| {
            let fallback;
            let item = match trace.source_data.get(x) {
                Some(item) => item,
                None => {
                    fallback = SourcePoint {
                        x: x.clone(),
                        y: default_y.clone(),
                        y_error: None,
                        size: None,
                        y_percent: None,
                        orig_x: x.clone(),
                        orig_y: default_y.clone(),
                        raw: Default::default(),
                    };
                    &fallback
                }
            };
            let ctx = text_context(
                &trace.series_name,
                item,
                trace.series_kind.y_is_any(),
                y_axis,
                options.series.percent_values,
                &fmt,
                options,
            );
            if options.text_format.is_empty() {
                default_series_text(&ctx)
            } else {
                format_simple_template(&options.text_format, &ctx)
            }
        })
        .collect();
    trace.text = text;
}

fn update_pie_text(trace: &mut PieTrace, options: &ChartOptions) {
    let fmt = TextFormatters::new(options);
    let text = trace
        .source_data
        .iter()
        .map(|item| {
            let ctx = text_context(&trace.name, item, false, AxisType::Linear, true, &fmt, options);
            if options.text_format.is_empty() {
                format!(
                    "{} ({})",
                    ctx_str(&ctx, "@@yPercent").unwrap_or_default(),
                    ctx_str(&ctx, "@@y").unwrap_or_default()
                )
            } else {
                format_simple_template(&options.text_format, &ctx)
            }
        })
        .collect();
    trace.text = text;
}

/// Cumulative y per value axis for stacked line and area series. Nulls stay gaps.
fn update_stacking(traces: &mut [&mut XyTrace], options: &ChartOptions) {
    if !options.uses_stacking() {
        return;
    }
    let mut totals: AHashMap<(bool, String), f64> = AHashMap::new();
    for trace in traces.iter_mut() {
        if !matches!(trace.series_kind, ChartType::Line | ChartType::Area) {
            continue;
        }
        let axis = trace.on_secondary_axis();
        let stacked = trace
            .x
            .iter()
            .zip(trace.y.iter())
            .map(|(x, y)| match clean_number(y) {
                Some(v) => {
                    let total = totals.entry((axis, value_key(x))).or_default();
                    *total += v;
                    number_value(Some(*total))
                }
                None => Value::Null,
            })
            .collect();
        trace.y = stacked;
    }
}

fn orient_vertical(trace: Trace) -> Trace {
    match trace {
        Trace::Xy(mut t) if t.orientation.is_some() => {
            t.orientation = None;
            std::mem::swap(&mut t.x, &mut t.y);
            t.yaxis = Some(if t.xaxis == Some("x2") { "y2" } else { "y" });
            t.xaxis = None;
            Trace::Xy(t)
        }
        other => other,
    }
}

/// Horizontal charts: swap x and y and move the secondary axis to `x2`.
fn orient_horizontal(trace: Trace) -> Trace {
    match trace {
        Trace::Xy(mut t) => {
            t.orientation = Some("h");
            std::mem::swap(&mut t.x, &mut t.y);
            if t.yaxis == Some("y2") {
                t.xaxis = Some("x2");
            }
            t.yaxis = None;
            Trace::Xy(t)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Point, Series};
    use crate::viz::options::get_options;
    use crate::viz::prepare::prepare_data;
    use serde_json::json;
    use std::sync::Arc;

    fn series(name: &str, pts: &[(i64, Value)]) -> Series {
        let mut s = Series::new(name, ChartType::Column);
        for (x, y) in pts {
            s.data.push(Point {
                x: Some(json!(x)),
                y: y.clone(),
                y_error: None,
                size: None,
                z_val: None,
                raw: Arc::new(Default::default()),
            });
        }
        s
    }

    fn run(options: Value, series: &[Series]) -> Vec<XyTrace> {
        let opts = get_options(&options).unwrap();
        update_data(prepare_data(series, &opts), &opts)
            .into_iter()
            .filter_map(|t| match t {
                Trace::Xy(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn unified_axis_fills_gaps() {
        let a = series("a", &[(1, json!(1)), (3, json!(3))]);
        let b = series("b", &[(2, json!(2))]);
        let t = run(json!({}), &[a.clone(), b.clone()]);
        assert_eq!(t[1].x, [json!(1), json!(2), json!(3)]);
        assert_eq!(t[1].y, [json!(0.0), json!(2.0), json!(0.0)]);

        let t = run(json!({"missingValuesAsZero": false}), &[a, b]);
        assert_eq!(t[0].y, [json!(1.0), Value::Null, json!(3.0)]);
    }

    #[test]
    fn percent_values_share_each_x() {
        let a = series("a", &[(1, json!(1)), (2, json!(3))]);
        let b = series("b", &[(1, json!(3)), (2, json!(1))]);
        let t = run(json!({"series": {"percentValues": true}}), &[a, b]);
        assert_eq!(t[0].y, [json!(25.0), json!(75.0)]);
        assert_eq!(t[0].text[0], "25% (1)");
    }

    #[test]
    fn default_text_and_templates() {
        let a = series("a", &[(1, json!(1234.5))]);
        let t = run(json!({}), &[a.clone()]);
        assert_eq!(t[0].text, ["1,234.50000"]);
        let t = run(json!({"textFormat": "{{ @@name }}@{{ @@x }}={{@@y}} {{ nope }}"}), &[a]);
        assert_eq!(t[0].text, ["a@1=1,234.50000 "]);
    }

    #[test]
    fn error_bars_and_sizes_follow_the_unified_axis() {
        let mut a = series("a", &[(1, json!(5)), (3, json!(7))]);
        a.data[0].y_error = Some(json!(0.5));
        a.data[0].size = Some(json!(2));
        a.data[1].y_error = Some(Value::Null);
        a.data[1].size = Some(Value::Null);
        let b = series("b", &[(2, json!(1))]);

        let t = run(json!({}), &[a.clone(), b.clone()]);
        assert_eq!(t[0].x, [json!(1), json!(2), json!(3)]);
        assert_eq!(t[0].error_y.array, [json!(0.5), Value::Null, Value::Null]);
        assert_eq!(t[0].text, ["5 \u{00b1} 0.50000 [2]", "0", "7"]);

        let t = run(json!({"textFormat": "{{@@y}}|{{@@yError}}|{{@@size}}"}), &[a, b]);
        assert_eq!(t[0].text, ["5|0.50000|2", "0||", "7||"]);
    }

    #[test]
    fn stacking_accumulates_and_keeps_gaps() {
        let a = series("a", &[(1, json!(1)), (2, json!(2))]);
        let b = series("b", &[(1, json!(10)), (2, json!(null))]);
        let t = run(
            json!({
                "globalSeriesType": "area",
                "series": {"stacking": "stack"},
                "missingValuesAsZero": false
            }),
            &[a, b],
        );
        assert_eq!(t[1].y, [json!(11.0), Value::Null]);
        assert_eq!(t[1].text[0], "10");
    }

    #[test]
    fn hidden_series_are_left_alone() {
        let a = series("a", &[(1, json!(1))]);
        let b = series("b", &[(2, json!(2))]);
        let opts = get_options(&json!({})).unwrap();
        let mut traces = prepare_data(&[a, b], &opts);
        if let Trace::Xy(t) = &mut traces[1] {
            t.visible = false;
        }
        let t = update_data(traces, &opts);
        let Trace::Xy(a) = &t[0] else { panic!() };
        assert_eq!(a.x, [json!(1)]);
    }

    #[test]
    fn swapped_axes_orient_traces() {
        let a = series("a", &[(1, json!(5))]);
        let t = run(json!({"swappedAxes": true}), &[a]);
        assert_eq!(t[0].orientation, Some("h"));
        assert_eq!(t[0].x, [json!(5.0)]);
        assert_eq!(t[0].y, [json!(1)]);

        let opts = get_options(&json!({"swappedAxes": true})).unwrap();
        let again = update_data(t.into_iter().map(Trace::Xy).collect(), &opts);
        let Trace::Xy(again) = &again[0] else { panic!() };
        assert_eq!(again.x, [json!(5.0)]);
    }

    #[test]
    fn pie_text_shows_percent_and_value() {
        let mut s = series("p", &[(1, json!(1)), (2, json!(3))]);
        s.kind = ChartType::Pie;
        let opts = get_options(&json!({"globalSeriesType": "pie"})).unwrap();
        let t = update_data(prepare_data(&[s], &opts), &opts);
        let Trace::Pie(p) = &t[0] else { panic!() };
        assert_eq!(p.text, ["25% (1)", "75% (3)"]);
    }
}
