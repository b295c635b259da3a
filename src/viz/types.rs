//! Public enums and small value types shared by the chart pipeline.

use serde::{Deserialize, Serialize};

/// Chart kinds. One handler per variant in `prepare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Column,
    Line,
    Area,
    Scatter,
    Bubble,
    Box,
    Pie,
    Heatmap,
    Custom,
}

impl ChartType {
    /// Kinds whose points are grouped per x and reduced with the selected aggregation.
    pub fn aggregates(self) -> bool {
        matches!(
            self,
            ChartType::Column | ChartType::Line | ChartType::Area | ChartType::Pie
        )
    }

    /// Kinds that share one x axis across series (gaps filled per missing-value policy).
    pub fn unifies_x(self) -> bool {
        matches!(self, ChartType::Column | ChartType::Line | ChartType::Area)
    }

    /// For bubble and scatter, y may be categorical or a date and is not coerced.
    pub fn y_is_any(self) -> bool {
        matches!(self, ChartType::Bubble | ChartType::Scatter)
    }
}

/// Axis scale as stored in options. `Auto` is the renderer's `"-"` (guess).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisType {
    #[default]
    #[serde(rename = "-")]
    Auto,
    Linear,
    Logarithmic,
    Datetime,
    Category,
}

impl AxisType {
    /// Scale name in the renderer's layout schema.
    pub fn plotly_name(self) -> &'static str {
        match self {
            AxisType::Auto => "-",
            AxisType::Linear => "linear",
            AxisType::Logarithmic => "log",
            AxisType::Datetime => "date",
            AxisType::Category => "category",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPlacement {
    /// Beside the plot on wide containers, below it otherwise.
    #[default]
    Auto,
    Right,
    #[serde(alias = "bottom")]
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stacking {
    Stack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Clockwise,
    #[default]
    Counterclockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    Area,
    #[default]
    Diameter,
}

impl SizeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SizeMode::Area => "area",
            SizeMode::Diameter => "diameter",
        }
    }
}

/// Container size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Plot size used in layouts: floored, at least 5x5.
    pub fn plot_size(self) -> (f64, f64) {
        let clamp = |v: f64| if v.is_finite() { v.floor().max(5.0) } else { 5.0 };
        (clamp(self.width), clamp(self.height))
    }
}

/// Width above which an `auto` legend goes beside the plot.
pub const LEGEND_SIDE_MIN_WIDTH: f64 = 600.0;
