//! dashchart
//!
//! Turns tabular query results and saved visualization options into Plotly-ready
//! chart figures, plus the data shaping behind counter, funnel and table views.
//! Pairs with the `dashchart` CLI.
//!
//! ### Features
//! - Column-role mapping and per-x aggregation (sum, mean, median, percentiles, counts)
//! - Column, line, area, scatter, bubble, box, pie and heatmap traces, custom chart data
//! - Percent values, stacking, unified x axes and templated labels
//! - Layout negotiation for axis ranges, zero alignment and legend placement
//! - numeral/moment-style value formatting
//!
//! ### Example
//! ```no_run
//! use dashchart::{Size, get_options, render_figure, storage};
//!
//! let result = storage::load_query_result("sales.csv")?;
//! let options = get_options(&serde_json::json!({
//!     "globalSeriesType": "column",
//!     "columnMapping": {"month": "x", "units": "y"}
//! }))?;
//! let figure = render_figure(&result, &options, Size::new(800.0, 400.0))?;
//! storage::save_json(&figure, "figure.json")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod color;
pub mod counter;
pub mod error;
pub mod format;
pub mod funnel;
pub mod models;
pub mod stats;
pub mod storage;
pub mod table;
pub mod viz;

pub use error::{ChartError, RenderError, Result};
pub use models::{Column, ColumnType, QueryResult, Row};
pub use viz::{ChartOptions, ChartType, Figure, Size, build_series, get_options, render_figure};
