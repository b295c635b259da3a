use super::normalize_for_axis;
use crate::color::{
    CUSTOM_SCHEME, LIGHT_TEXT, ScaleStops, choose_text_color, custom_heatmap_scale,
    default_heatmap_scale, interpolate_scale, preset_scale,
};
use crate::format::{ValueFormatter, clean_number, compare_values, create_number_formatter, number_value, value_key};
use crate::models::Series;
use crate::viz::options::ChartOptions;
use crate::viz::trace::{ColorScale, Font, HeatmapTrace, TextTrace, Trace};
use ahash::AHashMap;
use serde_json::Value;

/// Scale handed to the renderer: default stops, the two custom stops, or a preset name.
pub fn heatmap_color_scale(options: &ChartOptions) -> ColorScale {
    match options.color_scheme.as_deref() {
        None | Some("") => ColorScale::Stops(default_heatmap_scale()),
        Some(CUSTOM_SCHEME) => ColorScale::Stops(custom_heatmap_scale(
            &options.heat_min_color,
            &options.heat_max_color,
        )),
        Some(name) => ColorScale::Named(name.to_string()),
    }
}

fn scale_stops(scale: &ColorScale) -> ScaleStops {
    match scale {
        ColorScale::Stops(stops) => stops.clone(),
        ColorScale::Named(name) => preset_scale(name).unwrap_or_else(default_heatmap_scale),
    }
}

fn unique(values: impl Iterator<Item = Value>) -> Vec<Value> {
    let mut seen = ahash::AHashSet::new();
    values.filter(|v| seen.insert(value_key(v))).collect()
}

/// One dense z grid per series, plus an optional text overlay with per-cell labels.
pub fn prepare_heatmap_data(series: &[Series], options: &ChartOptions) -> Vec<Trace> {
    let colorscale = heatmap_color_scale(options);
    let stops = scale_stops(&colorscale);
    let format_number = create_number_formatter(&options.number_format);
    let mut traces = Vec::new();

    for s in series {
        let points: Vec<(Value, Value, Option<f64>)> = s
            .data
            .iter()
            .map(|p| {
                (
                    normalize_for_axis(&p.x_or_default(), options.x_axis.kind),
                    p.y.clone(),
                    p.z_val.as_ref().and_then(clean_number),
                )
            })
            .collect();

        let mut xs = unique(points.iter().map(|p| p.0.clone()));
        let mut ys = unique(points.iter().map(|p| p.1.clone()));
        if options.sort_x {
            xs.sort_by(compare_values);
        }
        if options.sort_y {
            ys.sort_by(compare_values);
        }
        if options.reverse_x {
            xs.reverse();
        }
        if options.reverse_y {
            ys.reverse();
        }

        let mut cells: AHashMap<(String, String), f64> = AHashMap::new();
        for (x, y, z) in &points {
            cells
                .entry((value_key(x), value_key(y)))
                .or_insert(z.unwrap_or(0.0));
        }
        let z_values = || points.iter().filter_map(|p| p.2);
        let z_min = z_values().reduce(f64::min);
        let z_max = z_values().reduce(f64::max);
        let labelled = options.show_data_labels && z_max.is_some();

        let mut labels = TextTrace {
            kind: "scatter",
            mode: "text",
            x: Vec::new(),
            y: Vec::new(),
            text: Vec::new(),
            textfont: Font { color: Vec::new() },
            hoverinfo: "skip",
            showlegend: false,
        };
        let mut z = Vec::with_capacity(ys.len());
        for y in &ys {
            let mut row = Vec::with_capacity(xs.len());
            for x in &xs {
                let value = cells
                    .get(&(value_key(x), value_key(y)))
                    .copied()
                    .unwrap_or(0.0);
                row.push(number_value(Some(value)));
                if labelled {
                    labels.x.push(x.clone());
                    labels.y.push(y.clone());
                    labels.text.push(format_number.format(&number_value(Some(value))));
                    labels
                        .textfont
                        .color
                        .push(label_color(&stops, value, z_min, z_max));
                }
            }
            z.push(row);
        }

        traces.push(Trace::Heatmap(HeatmapTrace {
            kind: "heatmap",
            name: s.name.clone(),
            x: xs,
            y: ys,
            z,
            colorscale: colorscale.clone(),
        }));
        if labelled {
            traces.push(Trace::Text(labels));
        }
    }
    traces
}

/// Contrast color for a cell, from the scale color at the cell's normalized value.
fn label_color(stops: &[(f64, String)], value: f64, min: Option<f64>, max: Option<f64>) -> &'static str {
    let (min, max) = (min.unwrap_or(0.0), max.unwrap_or(0.0));
    let t = if max > min { (value - min) / (max - min) } else { 0.0 };
    interpolate_scale(stops, t)
        .map(|bg| choose_text_color(&bg.to_hex()))
        .unwrap_or(LIGHT_TEXT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;
    use crate::viz::ChartType;
    use crate::viz::options::get_options;
    use serde_json::json;
    use std::sync::Arc;

    fn cells(pts: &[(&str, &str, f64)]) -> Series {
        let mut s = Series::new("h", ChartType::Heatmap);
        for (x, y, z) in pts {
            s.data.push(Point {
                x: Some(json!(x)),
                y: json!(y),
                y_error: None,
                size: None,
                z_val: Some(json!(z)),
                raw: Arc::new(Default::default()),
            });
        }
        s
    }

    #[test]
    fn custom_scheme_has_exactly_two_stops() {
        let opts = get_options(&json!({
            "globalSeriesType": "heatmap",
            "colorScheme": "Custom...",
            "heatMinColor": "#000000",
            "heatMaxColor": "#ff0000"
        }))
        .unwrap();
        match heatmap_color_scale(&opts) {
            ColorScale::Stops(stops) => assert_eq!(
                stops,
                vec![(0.0, "#000000".to_string()), (1.0, "#ff0000".to_string())]
            ),
            other => panic!("unexpected scale {other:?}"),
        }
    }

    #[test]
    fn named_and_default_scales() {
        let named = get_options(&json!({"colorScheme": "YlGnBu"})).unwrap();
        assert_eq!(heatmap_color_scale(&named), ColorScale::Named("YlGnBu".into()));
        let default = get_options(&json!({})).unwrap();
        match heatmap_color_scale(&default) {
            ColorScale::Stops(stops) => assert_eq!(stops.len(), 9),
            other => panic!("unexpected scale {other:?}"),
        }
    }

    #[test]
    fn dense_grid_fills_missing_cells_with_zero() {
        let opts = get_options(&json!({"globalSeriesType": "heatmap"})).unwrap();
        let s = cells(&[("b", "r1", 2.0), ("a", "r2", 5.0)]);
        let traces = prepare_heatmap_data(&[s], &opts);
        assert_eq!(traces.len(), 1);
        let Trace::Heatmap(h) = &traces[0] else {
            panic!("expected heatmap");
        };
        assert_eq!(h.x, [json!("a"), json!("b")]);
        assert_eq!(h.z, vec![vec![json!(0.0), json!(2.0)], vec![json!(5.0), json!(0.0)]]);
    }

    #[test]
    fn labels_use_contrast_colors() {
        let opts = get_options(&json!({
            "globalSeriesType": "heatmap",
            "showDataLabels": true,
            "colorScheme": "Greys"
        }))
        .unwrap();
        let s = cells(&[("a", "r", 0.0), ("b", "r", 10.0)]);
        let traces = prepare_heatmap_data(&[s], &opts);
        let Trace::Text(t) = &traces[1] else {
            panic!("expected label overlay");
        };
        assert_eq!(t.text, ["0", "10"]);
        // Greys runs from black to white
        assert_eq!(t.textfont.color, [LIGHT_TEXT, crate::color::DARK_TEXT]);
    }

    #[test]
    fn light_custom_scale_gets_dark_labels() {
        let opts = get_options(&json!({
            "globalSeriesType": "heatmap",
            "showDataLabels": true,
            "colorScheme": "Custom...",
            "heatMinColor": "#ffffff",
            "heatMaxColor": "#f0f0f0"
        }))
        .unwrap();
        let s = cells(&[("a", "r", 1.0), ("b", "r", 2.0)]);
        let traces = prepare_heatmap_data(&[s], &opts);
        let Trace::Text(t) = &traces[1] else {
            panic!("expected label overlay");
        };
        assert_eq!(t.textfont.color, [crate::color::DARK_TEXT; 2]);
    }
}
