use super::normalize_for_axis;
use crate::color::{OrdinalPalette, choose_text_color};
use crate::format::{clean_number, display_value, number_value, template_uses};
use crate::models::Series;
use crate::viz::options::ChartOptions;
use crate::viz::trace::{Domain, Font, PieMarker, PieTrace, SourceData, SourcePoint, Trace};
use serde_json::Value;
use std::sync::Arc;

/// Small-multiples grid for several pies in one chart, in paper coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieGrid {
    pub rows: usize,
    pub cells_in_row: usize,
    pub cell_width: f64,
    pub cell_height: f64,
    pub x_padding: f64,
    pub y_padding: f64,
}

impl PieGrid {
    /// Top-left corner of cell `index`.
    pub fn cell_origin(&self, index: usize) -> (f64, f64) {
        let x = (index % self.cells_in_row) as f64 * self.cell_width;
        let y = (index / self.cells_in_row) as f64 * self.cell_height;
        (x, y)
    }
}

pub fn pie_grid(series_count: usize) -> PieGrid {
    let rows = if series_count > 2 { 2 } else { 1 };
    let cells_in_row = series_count.div_ceil(rows).max(1);
    PieGrid {
        rows,
        cells_in_row,
        cell_width: 1.0 / cells_in_row as f64,
        cell_height: 1.0 / rows as f64,
        x_padding: 0.02,
        y_padding: 0.1,
    }
}

/// One pie per series. Slice colors are shared across pies: an explicit
/// `valuesOptions` color, else the palette in first-seen label order.
pub fn prepare_pie_data(series: &[Series], options: &ChartOptions) -> Vec<Trace> {
    let grid = pie_grid(series.len());
    let has_x = series.iter().any(|s| s.data.iter().any(|p| p.x.is_some()));
    let mut palette = OrdinalPalette::new();
    let mut hoverinfo = String::from("text+label");
    if !template_uses(&options.text_format, "@@name") {
        hoverinfo.push_str("+name");
    }

    series
        .iter()
        .enumerate()
        .map(|(index, s)| {
            let total: f64 = s.data.iter().filter_map(|p| clean_number(&p.y)).map(f64::abs).sum();
            let mut source_data = SourceData::default();
            let mut labels = Vec::with_capacity(s.data.len());
            let mut values = Vec::with_capacity(s.data.len());

            for point in &s.data {
                let label = if has_x {
                    normalize_for_axis(&point.x_or_default(), options.x_axis.kind)
                } else {
                    Value::String(format!("Slice {index}"))
                };
                let y = clean_number(&point.y);
                let y_percent = y.filter(|_| total > 0.0).map(|v| v.abs() / total * 100.0);
                labels.push(label.clone());
                values.push(number_value(y));
                source_data.push(SourcePoint {
                    x: label,
                    y: number_value(y),
                    y_error: None,
                    size: None,
                    y_percent,
                    orig_x: point.x_or_default(),
                    orig_y: point.y.clone(),
                    raw: Arc::clone(&point.raw),
                });
            }

            let colors: Vec<String> = labels
                .iter()
                .map(|label| {
                    let key = display_value(label);
                    options
                        .values_options
                        .get(&key)
                        .and_then(|v| v.color.clone())
                        .filter(|c| !c.is_empty())
                        .unwrap_or_else(|| palette.color_for(&key).to_string())
                })
                .collect();
            let text_colors = colors.iter().map(|c| choose_text_color(c)).collect();

            let (x0, y0) = grid.cell_origin(index);
            Trace::Pie(PieTrace {
                kind: "pie",
                name: s.name.clone(),
                visible: true,
                values,
                labels,
                hole: 0.4,
                marker: PieMarker { colors },
                hoverinfo: Value::String(hoverinfo.clone()),
                text: Vec::new(),
                textinfo: if options.show_data_labels { "percent" } else { "none" },
                textposition: "inside",
                textfont: Font { color: text_colors },
                direction: options.direction.kind,
                domain: Domain {
                    x: [x0, x0 + grid.cell_width - grid.x_padding],
                    y: [y0, y0 + grid.cell_height - grid.y_padding],
                },
                sort: options.sort_x,
                source_data,
            })
        })
        .collect()
}
