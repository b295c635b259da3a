use super::{hover_info_pattern, normalize_for_axis};
use crate::color::{choose_text_color, palette_color};
use crate::format::{clean_number, compare_values, number_value};
use crate::models::{Point, Series};
use crate::viz::options::ChartOptions;
use crate::viz::trace::{ErrorBars, Font, Marker, SourceData, SourcePoint, Trace, XyTrace};
use crate::viz::types::ChartType;
use serde_json::Value;
use std::sync::Arc;

/// Column, line, area, scatter, bubble and box series.
pub fn prepare_xy_data(series: &[Series], options: &ChartOptions) -> Vec<Trace> {
    let hoverinfo = hover_info_pattern(&options.text_format);
    series
        .iter()
        .enumerate()
        .map(|(index, s)| Trace::Xy(prepare_series(s, options, index, &hoverinfo)))
        .collect()
}

fn prepare_series(series: &Series, options: &ChartOptions, index: usize, hoverinfo: &str) -> XyTrace {
    let effective = options.series_options_for(&series.name);
    let color = effective
        .color
        .clone()
        .unwrap_or_else(|| palette_color(index).to_string());
    let secondary = effective.y_axis == 1
        && (!options.uses_stacking() || effective.kind == ChartType::Line);
    let y_axis_kind = options.y_axis_options(usize::from(secondary)).kind;
    let y_is_any = effective.kind.y_is_any();

    let mut data: Vec<(Value, &Point)> = series
        .data
        .iter()
        .map(|p| (normalize_for_axis(&p.x_or_default(), options.x_axis.kind), p))
        .collect();
    if options.sort_x {
        data.sort_by(|a, b| compare_values(&a.0, &b.0));
    }

    let mut source_data = SourceData::default();
    let (mut xs, mut ys, mut errors, mut sizes) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
    for (x, point) in data {
        let y = if y_is_any {
            normalize_for_axis(&point.y, y_axis_kind)
        } else {
            match clean_number(&point.y) {
                Some(v) => number_value(Some(v)),
                None if options.missing_values_as_zero => number_value(Some(0.0)),
                None => {
                    log::debug!("series {:?}: non-numeric y {} kept as gap", series.name, point.y);
                    Value::Null
                }
            }
        };
        // empty or non-numeric cells count as no error / no size
        let y_error = point
            .y_error
            .as_ref()
            .and_then(clean_number)
            .map(|e| number_value(Some(e)));
        let size = point
            .size
            .as_ref()
            .and_then(clean_number)
            .map(|s| number_value(Some(s)));

        xs.push(x.clone());
        ys.push(y.clone());
        errors.push(y_error.clone().unwrap_or(Value::Null));
        sizes.push(
            size.as_ref()
                .and_then(clean_number)
                .map(|s| number_value(Some(s * options.coefficient)))
                .unwrap_or(Value::Null),
        );
        source_data.push(SourcePoint {
            x,
            y,
            y_error,
            size,
            y_percent: None,
            orig_x: point.x_or_default(),
            orig_y: point.y.clone(),
            raw: Arc::clone(&point.raw),
        });
    }

    let mut trace = XyTrace {
        kind: "scatter",
        name: effective.name.clone().unwrap_or_else(|| series.name.clone()),
        visible: true,
        x: xs,
        y: ys,
        mode: None,
        fill: None,
        offsetgroup: None,
        orientation: None,
        xaxis: None,
        yaxis: Some(if secondary { "y2" } else { "y" }),
        marker: Marker {
            color: Some(color.clone()),
            ..Marker::default()
        },
        insidetextfont: Font {
            color: choose_text_color(&color),
        },
        error_y: ErrorBars {
            kind: options.error_y.kind.clone(),
            visible: options.error_y.visible,
            array: errors,
            color: color.clone(),
        },
        text: Vec::new(),
        textposition: None,
        hoverinfo: Value::from(hoverinfo),
        boxpoints: None,
        jitter: None,
        pointpos: None,
        series_name: series.name.clone(),
        series_kind: effective.kind,
        source_data,
    };

    let with_labels = |mode: &str| {
        if options.show_data_labels {
            format!("{mode}+text")
        } else {
            mode.to_string()
        }
    };

    match effective.kind {
        ChartType::Column => {
            trace.kind = "bar";
            trace.offsetgroup = Some(index.to_string());
            trace.textposition = Some(if options.show_data_labels { "inside" } else { "none" });
        }
        ChartType::Line => {
            trace.mode = Some(with_labels("lines"));
        }
        ChartType::Area => {
            trace.mode = Some(with_labels("lines"));
            trace.fill = Some(if options.uses_stacking() { "tonexty" } else { "tozeroy" });
        }
        ChartType::Scatter => {
            trace.mode = Some(with_labels("markers"));
        }
        ChartType::Bubble => {
            trace.mode = Some("markers".to_string());
            trace.marker = Marker {
                color: Some(color),
                size: Some(Value::Array(sizes)),
                sizemode: Some(options.sizemode.as_str().to_string()),
            };
        }
        ChartType::Box => {
            trace.kind = "box";
            trace.mode = Some("markers".to_string());
            trace.hoverinfo = Value::Bool(false);
            trace.marker = Marker {
                color: Some(color),
                size: Some(Value::from(3)),
                sizemode: None,
            };
            if options.showpoints {
                trace.boxpoints = Some("all");
                trace.jitter = Some(0.3);
                trace.pointpos = Some(-1.8);
            } else {
                trace.boxpoints = Some("outliers");
            }
        }
        // a per-series override to a non-xy kind keeps the plain trace
        ChartType::Pie | ChartType::Heatmap | ChartType::Custom => {}
    }
    trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viz::options::get_options;
    use serde_json::json;

    fn series(name: &str, pts: &[(Value, Value)]) -> Series {
        let mut s = Series::new(name, ChartType::Column);
        for (x, y) in pts {
            s.data.push(Point {
                x: Some(x.clone()),
                y: y.clone(),
                y_error: None,
                size: Some(json!(2)),
                z_val: None,
                raw: Arc::new(Default::default()),
            });
        }
        s
    }

    fn xy(trace: &Trace) -> &XyTrace {
        match trace {
            Trace::Xy(t) => t,
            other => panic!("expected xy trace, got {other:?}"),
        }
    }

    #[test]
    fn missing_values_follow_policy() {
        let s = series("s", &[(json!(1), json!(5)), (json!(2), json!(null))]);
        let zero = get_options(&json!({})).unwrap();
        assert_eq!(xy(&prepare_xy_data(&[s.clone()], &zero)[0]).y, [json!(5.0), json!(0.0)]);
        let gap = get_options(&json!({"missingValuesAsZero": false})).unwrap();
        assert_eq!(xy(&prepare_xy_data(&[s], &gap)[0]).y, [json!(5.0), Value::Null]);
    }

    #[test]
    fn columns_get_offset_groups_and_palette_colors() {
        let opts = get_options(&json!({})).unwrap();
        let a = series("a", &[(json!(1), json!(1))]);
        let b = series("b", &[(json!(1), json!(2))]);
        let traces = prepare_xy_data(&[a, b], &opts);
        let b = xy(&traces[1]);
        assert_eq!(b.kind, "bar");
        assert_eq!(b.offsetgroup.as_deref(), Some("1"));
        assert_eq!(b.marker.color.as_deref(), Some("#E92828"));
        assert_eq!(b.textposition, Some("none"));
    }

    #[test]
    fn secondary_axis_needs_no_stacking_or_line() {
        let opts = get_options(&json!({
            "seriesOptions": {"a": {"yAxis": 1}, "b": {"yAxis": 1, "type": "line"}},
            "series": {"stacking": "stack"}
        }))
        .unwrap();
        let traces = prepare_xy_data(
            &[series("a", &[(json!(1), json!(1))]), series("b", &[(json!(1), json!(1))])],
            &opts,
        );
        assert_eq!(xy(&traces[0]).yaxis, Some("y"));
        assert_eq!(xy(&traces[1]).yaxis, Some("y2"));
    }

    #[test]
    fn sort_x_orders_points() {
        let opts = get_options(&json!({"globalSeriesType": "line"})).unwrap();
        let s = series("s", &[(json!(3), json!(1)), (json!(1), json!(2))]);
        let t = prepare_xy_data(&[s], &opts);
        assert_eq!(xy(&t[0]).x, [json!(1), json!(3)]);
        assert_eq!(xy(&t[0]).mode.as_deref(), Some("lines"));
    }

    #[test]
    fn bubble_sizes_scale_by_coefficient() {
        let opts = get_options(&json!({"globalSeriesType": "bubble", "coefficient": 3})).unwrap();
        let s = series("s", &[(json!(1), json!("high"))]);
        let t = prepare_xy_data(&[s], &opts);
        let t = xy(&t[0]);
        assert_eq!(t.y, [json!("high")]);
        assert_eq!(t.marker.size, Some(json!([6.0])));
        assert_eq!(t.marker.sizemode.as_deref(), Some("diameter"));
    }

    #[test]
    fn area_fill_depends_on_stacking() {
        let s = series("s", &[(json!(1), json!(1))]);
        let plain = get_options(&json!({"globalSeriesType": "area"})).unwrap();
        assert_eq!(xy(&prepare_xy_data(&[s.clone()], &plain)[0]).fill, Some("tozeroy"));
        let stacked = get_options(&json!({
            "globalSeriesType": "area",
            "series": {"stacking": "stack"}
        }))
        .unwrap();
        assert_eq!(xy(&prepare_xy_data(&[s], &stacked)[0]).fill, Some("tonexty"));
    }

    #[test]
    fn blank_errors_and_sizes_are_absent() {
        let mut s = series("s", &[(json!(1), json!(5)), (json!(2), json!(6))]);
        s.data[0].y_error = Some(json!(0.5));
        s.data[1].y_error = Some(Value::Null);
        s.data[1].size = Some(json!("n/a"));
        let opts = get_options(&json!({})).unwrap();
        let t = prepare_xy_data(&[s], &opts);
        let t = xy(&t[0]);
        assert_eq!(t.error_y.array, [json!(0.5), Value::Null]);
        let points: Vec<_> = t.source_data.iter().collect();
        assert_eq!(points[0].y_error, Some(json!(0.5)));
        assert_eq!(points[1].y_error, None);
        assert_eq!(points[1].size, None);
    }

    #[test]
    fn box_points_toggle() {
        let opts = get_options(&json!({"globalSeriesType": "box", "showpoints": true})).unwrap();
        let t = prepare_xy_data(&[series("s", &[(json!(1), json!(1))])], &opts);
        let t = xy(&t[0]);
        assert_eq!(t.boxpoints, Some("all"));
        assert_eq!(t.pointpos, Some(-1.8));
        assert_eq!(t.hoverinfo, Value::Bool(false));
    }
}
