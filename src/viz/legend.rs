//! Legend placement (updateChartSize) and a legend size estimator for surfaces
//! without a layout engine.

use super::layout::BASE_MARGIN;
use super::options::ChartOptions;
use super::surface::ChartSurface;
use super::types::{LEGEND_SIDE_MIN_WIDTH, LegendPlacement, Size};
use super::updater::LayoutUpdate;
use serde_json::{Value, json};

pub const LEGEND_FONT_PX: u32 = 12;

// Legend item geometry in px, shared by both estimators.
const LINE_GAP: f64 = 2.0;
const ROW_GAP: f64 = 4.0;
const PAD_SMALL: f64 = 6.0;
const PAD_BAND: f64 = 8.0;
const SWATCH_W: f64 = 40.0;
const TRAILING_GAP: f64 = 12.0;
const MIN_LABEL_W: f64 = 40.0;
/// Widest share of a row one label may take before it wraps.
const ITEM_SHARE: f64 = 0.35;
/// Average glyph width as a fraction of the font size.
const GLYPH_RATIO: f64 = 0.6;

fn base_bottom_margin() -> f64 {
    BASE_MARGIN
        .iter()
        .find(|(k, _)| *k == "b")
        .map_or(0.0, |(_, v)| *v)
}

/// Resolve `auto` against the container width.
pub fn resolve_placement(placement: LegendPlacement, container: Size) -> LegendPlacement {
    match placement {
        LegendPlacement::Auto if container.width > LEGEND_SIDE_MIN_WIDTH => LegendPlacement::Right,
        LegendPlacement::Auto => LegendPlacement::Below,
        other => other,
    }
}

/// Legend placement updates. `below` needs a measured legend, so it arrives in two
/// steps: a provisional horizontal legend, then margin and anchor once measured.
pub fn update_chart_size(options: &ChartOptions, container: Size) -> Vec<LayoutUpdate> {
    if !options.legend.enabled {
        return Vec::new();
    }
    match resolve_placement(options.legend.placement, container) {
        LegendPlacement::Below => {
            let provisional = json!({
                "legend": {"orientation": "h", "x": 0, "xanchor": "left", "y": -0.1, "yanchor": "top"},
                "margin": {"b": base_bottom_margin()},
            });
            vec![LayoutUpdate::with_continuation(
                provisional,
                Box::new(place_legend_below),
            )]
        }
        LegendPlacement::Right | LegendPlacement::Auto => vec![LayoutUpdate::patch(json!({
            "legend": {"orientation": "v", "x": 1.02, "xanchor": "left", "y": 1, "yanchor": "top"},
            "margin": {"b": base_bottom_margin()},
        }))],
    }
}

/// Grow the bottom margin by the measured legend height and anchor the legend in it.
fn place_legend_below(surface: &dyn ChartSurface) -> Vec<LayoutUpdate> {
    let Some(bounds) = surface.legend_bounds() else {
        return Vec::new();
    };
    let layout = surface.layout();
    let margin_top = layout["margin"]["t"].as_f64().unwrap_or(0.0);
    let height = layout["height"]
        .as_f64()
        .unwrap_or_else(|| surface.container_size().plot_size().1);
    let bottom = base_bottom_margin() + bounds.height;
    let plot_height = (height - margin_top - bottom).max(1.0);
    log::debug!("legend below: {}px, bottom margin {bottom}", bounds.height);
    vec![LayoutUpdate::patch(json!({
        "margin": {"b": bottom},
        "legend": {"y": -bottom / plot_height, "yanchor": "bottom"},
    }))]
}

/// Width-only text metrics for one legend font: every glyph counts as the same
/// fraction of the font size.
#[derive(Debug, Clone, Copy)]
struct LabelMetrics {
    glyph_w: f64,
    line_h: f64,
}

impl LabelMetrics {
    fn new(font_px: u32) -> Self {
        let font = f64::from(font_px);
        Self {
            glyph_w: font * GLYPH_RATIO,
            line_h: font + LINE_GAP,
        }
    }

    fn width(&self, label: &str) -> f64 {
        label.chars().count() as f64 * self.glyph_w
    }

    /// Lines `label` takes when wrapped at `max_w`. Words pack greedily; a word longer
    /// than a line is split across as many lines as it needs.
    fn wrapped_lines(&self, label: &str, max_w: f64) -> usize {
        let per_line = ((max_w / self.glyph_w).floor() as usize).max(1);
        let mut lines = 0;
        let mut used = 0;
        for word in label.split_whitespace() {
            let n = word.chars().count();
            if used > 0 && used + 1 + n <= per_line {
                used += 1 + n;
                continue;
            }
            if used > 0 {
                lines += 1;
            }
            lines += (n - 1) / per_line;
            used = n - (n - 1) / per_line * per_line;
        }
        if used > 0 {
            lines += 1;
        }
        lines.max(1)
    }
}

/// Size of a horizontal legend band `total_w` wide. Items flow left to right into
/// rows; a label wider than its share of the row wraps and makes its row taller.
pub fn estimate_horizontal_legend_px(labels: &[String], total_w: f64, font_px: u32) -> Size {
    if labels.is_empty() {
        return Size::new(0.0, 0.0);
    }
    let metrics = LabelMetrics::new(font_px);
    let row_w = (total_w - PAD_SMALL).max(SWATCH_W + TRAILING_GAP + MIN_LABEL_W);
    let label_cap = (row_w * ITEM_SHARE).max(MIN_LABEL_W);

    let mut height = 2.0 * PAD_BAND;
    let mut widest = 0.0_f64;
    let mut x = 0.0;
    let mut row_lines = 0;
    for label in labels {
        let item_w = SWATCH_W + metrics.width(label).min(label_cap) + TRAILING_GAP;
        if x > 0.0 && x + item_w > row_w {
            height += row_lines as f64 * metrics.line_h + ROW_GAP;
            widest = widest.max(x);
            x = 0.0;
            row_lines = 0;
        }
        x += item_w;
        row_lines = row_lines.max(metrics.wrapped_lines(label, label_cap));
    }
    height += row_lines as f64 * metrics.line_h;
    widest = widest.max(x);
    Size::new(widest.min(row_w), height)
}

/// Size of a vertical legend: one label per line.
pub fn estimate_vertical_legend_px(labels: &[String], font_px: u32) -> Size {
    if labels.is_empty() {
        return Size::new(0.0, 0.0);
    }
    let metrics = LabelMetrics::new(font_px);
    let widest = labels
        .iter()
        .map(|l| metrics.width(l))
        .fold(0.0, f64::max);
    let n = labels.len() as f64;
    Size::new(
        SWATCH_W + widest + TRAILING_GAP,
        2.0 * PAD_BAND + n * metrics.line_h + (n - 1.0) * ROW_GAP,
    )
}

/// Legend size for a layout: orientation decides which estimator applies.
pub fn estimate_legend_size(layout: &Value, labels: &[String]) -> Option<Size> {
    if layout["showlegend"] == Value::Bool(false) || labels.is_empty() {
        return None;
    }
    if layout["legend"]["orientation"] == "h" {
        let width = layout["width"].as_f64().unwrap_or(0.0);
        Some(estimate_horizontal_legend_px(labels, width, LEGEND_FONT_PX))
    } else {
        Some(estimate_vertical_legend_px(labels, LEGEND_FONT_PX))
    }
}
