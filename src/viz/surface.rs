//! The renderer seam. A [`ChartSurface`] owns the drawn figure; the library only
//! hands it figures, layout patches and restyled traces.

use super::legend::estimate_legend_size;
use super::trace::{Figure, Trace};
use super::types::Size;
use super::updater::merge_patch;
use crate::error::RenderError;
use serde_json::Value;

pub trait ChartSurface {
    /// Draw a fresh figure, replacing anything drawn before.
    fn new_plot(&mut self, figure: &Figure) -> Result<(), RenderError>;

    /// Merge a layout patch into the drawn figure.
    fn relayout(&mut self, patch: &Value) -> Result<(), RenderError>;

    /// Replace the drawn traces, keeping the layout.
    fn restyle(&mut self, traces: &[Trace]) -> Result<(), RenderError>;

    fn container_size(&self) -> Size;

    /// Measured legend box, if a legend is drawn.
    fn legend_bounds(&self) -> Option<Size>;

    /// The layout as currently drawn.
    fn layout(&self) -> &Value;

    /// Release everything drawn.
    fn purge(&mut self);
}

/// Surface that keeps the figure in memory and estimates legend size from text.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    size: Size,
    figure: Option<Figure>,
    empty_layout: Value,
    relayouts: usize,
}

impl HeadlessSurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            figure: None,
            empty_layout: Value::Object(Default::default()),
            relayouts: 0,
        }
    }

    pub fn set_container_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn figure(&self) -> Option<&Figure> {
        self.figure.as_ref()
    }

    pub fn relayout_count(&self) -> usize {
        self.relayouts
    }

    /// The renderer rejects layouts whose plot area has no width left.
    fn check_plot_width(layout: &Value) -> Result<(), RenderError> {
        let Some(width) = layout["width"].as_f64() else {
            return Ok(());
        };
        let margin = |k: &str| layout["margin"][k].as_f64().unwrap_or(0.0);
        if width - margin("l") - margin("r") < 1.0 {
            return Err(RenderError::plot(format!(
                "ax.dtick error: plot area is {width}px wide"
            )));
        }
        Ok(())
    }
}

impl ChartSurface for HeadlessSurface {
    fn new_plot(&mut self, figure: &Figure) -> Result<(), RenderError> {
        self.figure = Some(figure.clone());
        Self::check_plot_width(&figure.layout)
    }

    fn relayout(&mut self, patch: &Value) -> Result<(), RenderError> {
        self.relayouts += 1;
        match &mut self.figure {
            Some(figure) => {
                merge_patch(&mut figure.layout, patch);
                Self::check_plot_width(&figure.layout)
            }
            None => {
                merge_patch(&mut self.empty_layout, patch);
                Ok(())
            }
        }
    }

    fn restyle(&mut self, traces: &[Trace]) -> Result<(), RenderError> {
        match &mut self.figure {
            Some(figure) => {
                figure.data = traces.to_vec();
                Ok(())
            }
            None => Err(RenderError::plot("restyle before the first plot")),
        }
    }

    fn container_size(&self) -> Size {
        self.size
    }

    fn legend_bounds(&self) -> Option<Size> {
        let figure = self.figure.as_ref()?;
        let labels: Vec<String> = figure
            .data
            .iter()
            .flat_map(Trace::legend_labels)
            .collect();
        estimate_legend_size(&figure.layout, &labels)
    }

    fn layout(&self) -> &Value {
        self.figure
            .as_ref()
            .map_or(&self.empty_layout, |f| &f.layout)
    }

    fn purge(&mut self) {
        self.figure = None;
        self.empty_layout = Value::Object(Default::default());
    }
}
