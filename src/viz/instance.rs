//! Chart lifecycle (initChart): plot, negotiate layout, react to resize and legend
//! toggles, tear down.

use super::axes::update_axes;
use super::layout::prepare_layout;
use super::legend::update_chart_size;
use super::options::ChartOptions;
use super::prepare::{prepare_custom_data, prepare_data};
use super::surface::ChartSurface;
use super::trace::{Figure, Trace};
use super::types::ChartType;
use super::update::update_data;
use super::updater::{LayoutUpdater, RenderState};
use crate::error::RenderError;
use crate::models::Series;
use ahash::AHashSet;
use serde_json::json;

/// Receives every render error except the benign `ax.dtick` one.
pub type ErrorHook = Box<dyn FnMut(&RenderError)>;

#[derive(Default)]
pub struct ChartHooks {
    pub on_error: Option<ErrorHook>,
}

impl ChartHooks {
    pub fn on_error(hook: impl FnMut(&RenderError) + 'static) -> Self {
        Self {
            on_error: Some(Box::new(hook)),
        }
    }
}

pub struct ChartInstance<S: ChartSurface> {
    surface: S,
    options: ChartOptions,
    series: Vec<Series>,
    hidden: AHashSet<String>,
    traces: Vec<Trace>,
    state: RenderState,
    hooks: ChartHooks,
}

impl<S: ChartSurface> ChartInstance<S> {
    /// Prepare traces and layout, draw them, then settle axes and legend.
    pub fn init(surface: S, options: ChartOptions, series: Vec<Series>, hooks: ChartHooks) -> Self {
        let mut chart = Self {
            surface,
            options,
            series,
            hidden: AHashSet::new(),
            traces: Vec::new(),
            state: RenderState::default(),
            hooks,
        };
        chart.traces = chart.build_traces();
        let layout = prepare_layout(chart.surface.container_size(), &chart.options, &chart.traces);
        let custom = (chart.options.global_series_type == ChartType::Custom)
            .then(|| prepare_custom_data(&chart.series));
        let figure = Figure {
            data: chart.traces.clone(),
            layout,
            custom,
        };
        log::debug!(
            "plotting {} traces for {} series",
            figure.data.len(),
            chart.series.len()
        );
        match chart.surface.new_plot(&figure) {
            Ok(()) => chart.negotiate_layout(),
            Err(e) => chart.report(e),
        }
        chart
    }

    fn build_traces(&self) -> Vec<Trace> {
        let mut traces = prepare_data(&self.series, &self.options);
        for trace in &mut traces {
            if let Some(name) = trace.series_name()
                && self.hidden.contains(name)
            {
                trace.set_visible(false);
            }
        }
        update_data(traces, &self.options)
    }

    /// One negotiation pass: axes first, then legend placement.
    fn negotiate_layout(&mut self) {
        let guard = self.state.begin();
        let mut updater = LayoutUpdater::new();
        updater
            .append(update_axes(&self.traces, &self.options))
            .append(update_chart_size(&self.options, self.surface.container_size()));
        if let Err(e) = updater.process(&mut self.surface, &guard) {
            self.report(e);
        }
    }

    fn report(&mut self, error: RenderError) {
        if error.is_benign() {
            log::debug!("ignoring renderer quirk: {error}");
            return;
        }
        match self.hooks.on_error.as_mut() {
            Some(hook) => hook(&error),
            None => log::error!("chart render failed: {error}"),
        }
    }

    /// Follow the container's current size.
    pub fn resize(&mut self) {
        if self.is_destroyed() {
            return;
        }
        let (width, height) = self.surface.container_size().plot_size();
        match self
            .surface
            .relayout(&json!({"width": width, "height": height}))
        {
            Ok(()) => self.negotiate_layout(),
            Err(e) => self.report(e),
        }
    }

    pub fn set_zoom_enabled(&mut self, enabled: bool) {
        if self.is_destroyed() {
            return;
        }
        let dragmode = if enabled { json!("zoom") } else { json!(false) };
        if let Err(e) = self.surface.relayout(&json!({ "dragmode": dragmode })) {
            self.report(e);
        }
    }

    /// Show or hide a series; totals, stacks and axis ranges follow.
    pub fn set_series_visibility(&mut self, name: &str, visible: bool) {
        if self.is_destroyed() {
            return;
        }
        let changed = if visible {
            self.hidden.remove(name)
        } else {
            self.hidden.insert(name.to_string())
        };
        if !changed {
            return;
        }
        self.traces = self.build_traces();
        match self.surface.restyle(&self.traces) {
            Ok(()) => self.negotiate_layout(),
            Err(e) => self.report(e),
        }
    }

    /// Purge the surface and drop the hooks. Later calls do nothing.
    pub fn destroy(&mut self) {
        if self.is_destroyed() {
            return;
        }
        self.state.destroy();
        self.surface.purge();
        self.hooks = ChartHooks::default();
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.is_destroyed()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;
    use crate::viz::options::get_options;
    use crate::viz::surface::HeadlessSurface;
    use crate::viz::types::Size;
    use serde_json::Value;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;

    fn series(name: &str, ys: &[f64]) -> Series {
        let mut s = Series::new(name, ChartType::Column);
        for (i, y) in ys.iter().enumerate() {
            s.data.push(Point {
                x: Some(json!(format!("x{i}"))),
                y: json!(y),
                y_error: None,
                size: None,
                z_val: None,
                raw: Arc::new(Default::default()),
            });
        }
        s
    }

    fn chart(options: Value, size: Size) -> ChartInstance<HeadlessSurface> {
        let opts = get_options(&options).unwrap();
        ChartInstance::init(
            HeadlessSurface::new(size),
            opts,
            vec![series("a", &[1.0, 2.0]), series("b", &[3.0, 4.0])],
            ChartHooks::default(),
        )
    }

    #[test]
    fn narrow_charts_put_the_legend_below() {
        let c = chart(json!({}), Size::new(400.0, 300.0));
        let layout = c.surface().layout();
        assert_eq!(layout["legend"]["orientation"], json!("h"));
        assert_eq!(layout["legend"]["yanchor"], json!("bottom"));
        assert!(layout["margin"]["b"].as_f64().unwrap() > 5.0);
        assert_eq!(layout["yaxis"]["autorange"], json!(true));
    }

    #[test]
    fn wide_charts_put_the_legend_right() {
        let c = chart(json!({}), Size::new(800.0, 300.0));
        let layout = c.surface().layout();
        assert_eq!(layout["legend"]["orientation"], json!("v"));
        assert_eq!(layout["margin"]["b"], json!(5.0));
    }

    #[test]
    fn zoom_and_resize_patch_the_layout() {
        let mut c = chart(json!({}), Size::new(800.0, 300.0));
        c.set_zoom_enabled(false);
        assert_eq!(c.surface().layout()["dragmode"], json!(false));
        c.surface_mut().set_container_size(Size::new(300.5, 200.0));
        c.resize();
        let layout = c.surface().layout();
        assert_eq!(layout["width"], json!(300.0));
        assert_eq!(layout["legend"]["orientation"], json!("h"));
    }

    #[test]
    fn hiding_a_series_restyles() {
        let mut c = chart(
            json!({"globalSeriesType": "column", "series": {"percentValues": true}}),
            Size::new(800.0, 300.0),
        );
        c.set_series_visibility("b", false);
        let figure = c.surface().figure().unwrap();
        let Trace::Xy(b) = &figure.data[1] else {
            panic!("expected xy trace");
        };
        assert!(!b.visible);
        let Trace::Xy(a) = &figure.data[0] else {
            panic!("expected xy trace");
        };
        assert_eq!(a.source_data.iter().next().unwrap().y_percent, Some(100.0));
    }

    #[test]
    fn destroy_makes_later_calls_noops() {
        let mut c = chart(json!({}), Size::new(800.0, 300.0));
        c.destroy();
        assert!(c.is_destroyed());
        assert!(c.surface().figure().is_none());
        c.set_zoom_enabled(true);
        c.resize();
        assert!(c.surface().layout().get("dragmode").is_none());
    }

    #[test]
    fn errors_reach_the_hook_except_dtick() {
        let seen: Rc<RefCell<Vec<RenderError>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let opts = get_options(&json!({})).unwrap();
        let mut c = ChartInstance::init(
            HeadlessSurface::new(Size::new(5.0, 5.0)),
            opts,
            vec![series("a", &[1.0])],
            ChartHooks::on_error(move |e| sink.borrow_mut().push(e.clone())),
        );
        assert!(seen.borrow().is_empty());
        c.report(RenderError::plot("boom"));
        assert_eq!(*seen.borrow(), vec![RenderError::plot("boom")]);
    }
}
