//! Value-axis ranges (updateAxes): manual bounds, reversal, orientation swap and
//! zero alignment of the two value axes.

use super::layout::swap_axis_keys;
use super::options::{AxisOptions, ChartOptions};
use super::trace::{Trace, XyTrace};
use super::types::AxisType;
use super::updater::LayoutUpdate;
use crate::format::clean_number;
use serde_json::{Map, Value, json};

/// Imbalance below which the two axes already count as aligned.
const ALIGN_TOLERANCE: f64 = 0.01;

fn value_data(trace: &XyTrace) -> &[Value] {
    if trace.orientation == Some("h") {
        &trace.x
    } else {
        &trace.y
    }
}

/// Numeric extent of the visible traces on one value axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Extent {
    lo: f64,
    hi: f64,
    /// Smallest strictly positive value, the only usable floor on a log axis.
    lo_positive: Option<f64>,
}

fn data_extent<'a>(traces: impl Iterator<Item = &'a XyTrace>) -> Option<Extent> {
    traces
        .filter(|t| t.visible)
        .flat_map(|t| value_data(t).iter().filter_map(clean_number))
        .fold(None, |acc, v| {
            let positive = (v > 0.0).then_some(v);
            Some(match acc {
                None => Extent {
                    lo: v,
                    hi: v,
                    lo_positive: positive,
                },
                Some(e) => Extent {
                    lo: e.lo.min(v),
                    hi: e.hi.max(v),
                    lo_positive: match (e.lo_positive, positive) {
                        (Some(a), Some(b)) => Some(a.min(b)),
                        (a, b) => a.or(b),
                    },
                },
            })
        })
}

fn axis_traces(traces: &[Trace], secondary: bool) -> impl Iterator<Item = &XyTrace> {
    traces.iter().filter_map(move |t| match t {
        Trace::Xy(xy) if xy.on_secondary_axis() == secondary => Some(xy),
        _ => None,
    })
}

/// Bounds for an axis: manual ones win, the missing side comes from the data and a
/// computed minimum never sits above zero. Log axes take the smallest positive value
/// instead, and have no bounds unless both sides are positive.
fn axis_bounds(axis: &AxisOptions, extent: Option<Extent>) -> Option<(f64, f64)> {
    let logarithmic = axis.kind == AxisType::Logarithmic;
    let min = axis.range_min.or_else(|| {
        extent.and_then(|e| {
            if logarithmic {
                e.lo_positive
            } else {
                Some(e.lo.min(0.0))
            }
        })
    })?;
    let max = axis.range_max.or_else(|| extent.map(|e| e.hi))?;
    if logarithmic && (min <= 0.0 || max <= 0.0) {
        log::debug!("log axis bounds {min}..{max} are not positive, using autorange");
        return None;
    }
    Some((min, max))
}

fn to_axis_units(kind: AxisType, v: f64) -> f64 {
    if kind == AxisType::Logarithmic {
        v.log10()
    } else {
        v
    }
}

fn range_patch(axis: &AxisOptions, extent: Option<Extent>) -> Map<String, Value> {
    let mut out = Map::new();
    let manual = axis.range_min.is_some() || axis.range_max.is_some();
    match axis_bounds(axis, extent) {
        Some((min, max)) if manual => {
            let (lo, hi) = (to_axis_units(axis.kind, min), to_axis_units(axis.kind, max));
            let range = if axis.reversed { [hi, lo] } else { [lo, hi] };
            out.insert("range".into(), json!(range));
            out.insert("autorange".into(), json!(false));
        }
        _ if axis.reversed => {
            out.insert("autorange".into(), json!("reversed"));
        }
        _ => {
            out.insert("autorange".into(), json!(true));
        }
    }
    out
}

/// Layout updates for the value axes, ready for the updater.
pub fn update_axes(traces: &[Trace], options: &ChartOptions) -> Vec<LayoutUpdate> {
    if !traces.iter().any(|t| matches!(t, Trace::Xy(_))) {
        return Vec::new();
    }
    let primary = options.y_axis_options(0);
    let secondary = options.y_axis_options(1);
    let primary_extent = data_extent(axis_traces(traces, false));
    let secondary_extent = data_extent(axis_traces(traces, true));
    let has_secondary = axis_traces(traces, true).next().is_some();

    let mut ranges = Map::new();
    ranges.insert(
        "yaxis".into(),
        Value::Object(range_patch(&primary, primary_extent)),
    );
    if has_secondary {
        ranges.insert(
            "yaxis2".into(),
            Value::Object(range_patch(&secondary, secondary_extent)),
        );
    }

    let mut updates = vec![ranges];
    if options.align_y_axes_at_zero && has_secondary {
        let a = axis_bounds(&primary, primary_extent);
        let b = axis_bounds(&secondary, secondary_extent);
        let logarithmic =
            primary.kind == AxisType::Logarithmic || secondary.kind == AxisType::Logarithmic;
        if let (Some(a), Some(b), false) = (a, b, logarithmic)
            && let Some((a, b)) = align_at_zero(a, b)
        {
            let mut aligned = Map::new();
            for (key, axis, (lo, hi)) in [("yaxis", &primary, a), ("yaxis2", &secondary, b)] {
                let range = if axis.reversed { [hi, lo] } else { [lo, hi] };
                aligned.insert(key.into(), json!({"range": range, "autorange": false}));
            }
            updates.push(aligned);
        }
    }

    updates
        .into_iter()
        .map(|patch| {
            let patch = if options.swapped_axes {
                swap_axis_keys(patch)
            } else {
                patch
            };
            LayoutUpdate::patch(Value::Object(patch))
        })
        .collect()
}

/// Position of zero inside `[min, max]`, as a fraction from the bottom.
fn zero_fraction((min, max): (f64, f64)) -> Option<f64> {
    let span = max - min;
    (span > 0.0).then(|| -min / span)
}

/// Grow both ranges so that zero sits at the same height on each. Returns `None` when
/// the axes are already aligned or one of them has no extent.
pub fn align_at_zero(a: (f64, f64), b: (f64, f64)) -> Option<((f64, f64), (f64, f64))> {
    let a = (a.0.min(0.0), a.1.max(0.0));
    let b = (b.0.min(0.0), b.1.max(0.0));
    let (fa, fb) = (zero_fraction(a)?, zero_fraction(b)?);
    if (fa - fb).abs() < ALIGN_TOLERANCE {
        return None;
    }
    let high = fa.max(fb);
    let low = fa.min(fb);
    let target = if high < 1.0 {
        high
    } else if low > 0.0 {
        low
    } else {
        0.5
    };
    let fit = |(min, max): (f64, f64)| -> (f64, f64) {
        let f = -min / (max - min);
        if f < target {
            (-target * max / (1.0 - target), max)
        } else if f > target {
            (min, -min * (1.0 - target) / target)
        } else {
            (min, max)
        }
    };
    Some((fit(a), fit(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Point, Series};
    use crate::viz::options::get_options;
    use crate::viz::prepare::prepare_data;
    use crate::viz::types::ChartType;
    use crate::viz::update::update_data;
    use std::sync::Arc;

    fn series(name: &str, ys: &[f64]) -> Series {
        let mut s = Series::new(name, ChartType::Line);
        for (i, y) in ys.iter().enumerate() {
            s.data.push(Point {
                x: Some(json!(i)),
                y: json!(y),
                y_error: None,
                size: None,
                z_val: None,
                raw: Arc::new(Default::default()),
            });
        }
        s
    }

    fn patches(options: &Value, data: &[Series]) -> Vec<Value> {
        let opts = get_options(options).unwrap();
        let traces = update_data(prepare_data(data, &opts), &opts);
        update_axes(&traces, &opts).into_iter().map(|u| u.patch).collect()
    }

    #[test]
    fn autorange_unless_bounds_are_set() {
        let p = patches(&json!({"globalSeriesType": "line"}), &[series("a", &[1.0, 4.0])]);
        assert_eq!(p, vec![json!({"yaxis": {"autorange": true}})]);

        let p = patches(
            &json!({"globalSeriesType": "line", "yAxis": [{"reversed": true}]}),
            &[series("a", &[1.0])],
        );
        assert_eq!(p[0]["yaxis"]["autorange"], json!("reversed"));
    }

    #[test]
    fn manual_max_takes_computed_min_including_zero() {
        let p = patches(
            &json!({"globalSeriesType": "line", "yAxis": [{"rangeMax": 10}]}),
            &[series("a", &[2.0, 4.0])],
        );
        assert_eq!(p[0]["yaxis"], json!({"range": [0.0, 10.0], "autorange": false}));

        let p = patches(
            &json!({"globalSeriesType": "line", "yAxis": [{"rangeMin": 1, "reversed": true, "type": "logarithmic"}]}),
            &[series("a", &[10.0, 100.0])],
        );
        assert_eq!(p[0]["yaxis"]["range"], json!([2.0, 0.0]));
    }

    #[test]
    fn log_axis_floor_is_the_smallest_positive_value() {
        let p = patches(
            &json!({"globalSeriesType": "line", "yAxis": [{"type": "logarithmic", "rangeMax": 1000}]}),
            &[series("a", &[10.0, 100.0])],
        );
        assert_eq!(p[0]["yaxis"], json!({"range": [1.0, 3.0], "autorange": false}));

        let p = patches(
            &json!({"globalSeriesType": "line", "yAxis": [{"type": "logarithmic", "rangeMax": 1000}]}),
            &[series("a", &[-4.0, 0.0])],
        );
        assert_eq!(p[0]["yaxis"], json!({"autorange": true}));
    }

    #[test]
    fn swapped_axes_patch_the_x_axis() {
        let p = patches(
            &json!({"globalSeriesType": "line", "swappedAxes": true}),
            &[series("a", &[1.0])],
        );
        assert_eq!(p[0], json!({"xaxis": {"autorange": true}}));
    }

    #[test]
    fn zero_alignment_grows_the_lagging_axis() {
        let ((a_lo, a_hi), (b_lo, b_hi)) = align_at_zero((-10.0, 10.0), (0.0, 100.0)).unwrap();
        assert_eq!((a_lo, a_hi), (-10.0, 10.0));
        assert_eq!(b_hi, 100.0);
        assert!((b_lo + 100.0).abs() < 1e-9);
        assert!(align_at_zero((-1.0, 1.0), (-5.0, 5.0)).is_none());
        assert!(align_at_zero((0.0, 0.0), (-5.0, 5.0)).is_none());
    }

    #[test]
    fn zero_alignment_tolerates_a_small_imbalance() {
        // zero at 0.5 vs 0.495: under one percent apart
        assert!(align_at_zero((-10.0, 10.0), (-9.9, 10.1)).is_none());
        // 0.5 vs 0.485: far enough to realign
        assert!(align_at_zero((-10.0, 10.0), (-9.7, 10.3)).is_some());
    }

    #[test]
    fn zero_alignment_is_emitted_for_two_axes() {
        let p = patches(
            &json!({
                "globalSeriesType": "line",
                "alignYAxesAtZero": true,
                "seriesOptions": {"b": {"yAxis": 1}}
            }),
            &[series("a", &[-5.0, 5.0]), series("b", &[10.0, 20.0])],
        );
        assert_eq!(p.len(), 2);
        assert_eq!(p[1]["yaxis"]["range"], json!([-5.0, 5.0]));
        assert_eq!(p[1]["yaxis2"]["range"], json!([-20.0, 20.0]));
    }
}
