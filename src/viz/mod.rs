//! Chart pipeline: query rows and saved options in, Plotly-ready figure out.
//!
//! - Column roles and series building (`mapping`), per-x aggregation (`aggregate`)
//! - Per-chart-type traces (`prepare`) and the data update pass (`update`)
//! - Initial layout (`layout`), value-axis ranges (`axes`), legend placement (`legend`)
//! - Layout negotiation against a [`ChartSurface`] (`updater`, `instance`)

pub mod aggregate;
pub mod axes;
pub mod instance;
pub mod layout;
pub mod legend;
pub mod mapping;
pub mod options;
pub mod prepare;
pub mod surface;
pub mod trace;
pub mod types;
pub mod update;
pub mod updater;

pub use instance::{ChartHooks, ChartInstance, ErrorHook};
pub use options::{ChartOptions, get_options};
pub use surface::{ChartSurface, HeadlessSurface};
pub use trace::{Figure, Trace};
pub use types::{AxisType, ChartType, LegendPlacement, Size};

use crate::error::{ChartError, RenderError};
use crate::models::{QueryResult, Row, Series};
use std::cell::RefCell;
use std::rc::Rc;

/// Series for `rows`: role mapping, then aggregation for the chart types that need it.
pub fn build_series(rows: &[Row], options: &ChartOptions) -> Vec<Series> {
    let series = mapping::get_chart_data(rows, options);
    aggregate::aggregate_series(series, options)
}

/// Render `result` on a headless surface of `size` and return the settled figure.
///
/// The first render error that is not benign is returned.
pub fn render_figure(
    result: &QueryResult,
    options: &ChartOptions,
    size: Size,
) -> crate::Result<Figure> {
    let series = build_series(&result.rows, options);
    let failure: Rc<RefCell<Option<RenderError>>> = Rc::default();
    let sink = Rc::clone(&failure);
    let chart = ChartInstance::init(
        HeadlessSurface::new(size),
        options.clone(),
        series,
        ChartHooks::on_error(move |e| {
            sink.borrow_mut().get_or_insert_with(|| e.clone());
        }),
    );
    if let Some(e) = failure.borrow_mut().take() {
        return Err(ChartError::Render(e));
    }
    chart
        .surface()
        .figure()
        .cloned()
        .ok_or_else(|| ChartError::Render(RenderError::plot("nothing was plotted")))
}
