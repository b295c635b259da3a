//! Per-x reduction of series points.

use super::options::ChartOptions;
use crate::format::value_key;
use crate::models::{Point, Series};
use crate::stats::Aggregation;
use ahash::AHashMap;
use serde_json::Value;

/// Group each aggregating series by x (first-seen order) and reduce y values.
///
/// Series whose effective type does not aggregate (scatter, bubble, box, heatmap,
/// custom) pass through untouched.
pub fn aggregate_series(series: Vec<Series>, options: &ChartOptions) -> Vec<Series> {
    series
        .into_iter()
        .map(|s| {
            if options.series_options_for(&s.name).kind.aggregates() {
                aggregate_one(s, options.aggregation)
            } else {
                s
            }
        })
        .collect()
}

fn aggregate_one(series: Series, aggregation: Aggregation) -> Series {
    let Series { name, kind, data } = series;
    let mut buckets: Vec<(Point, Vec<Value>)> = Vec::new();
    let mut by_x: AHashMap<String, usize> = AHashMap::new();

    for point in data {
        let key = value_key(&point.x_or_default());
        match by_x.get(&key) {
            Some(&i) => buckets[i].1.push(point.y.clone()),
            None => {
                by_x.insert(key, buckets.len());
                let y = point.y.clone();
                buckets.push((point, vec![y]));
            }
        }
    }

    let data = buckets
        .into_iter()
        .map(|(first, ys)| Point {
            y: aggregation.apply(&ys),
            ..first
        })
        .collect();
    Series { name, kind, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viz::ChartType;
    use crate::viz::options::get_options;
    use serde_json::json;
    use std::sync::Arc;

    fn series(kind: ChartType, pts: &[(i64, Value)]) -> Series {
        let mut s = Series::new("s", kind);
        for (x, y) in pts {
            s.data.push(Point {
                x: Some(json!(x)),
                y: y.clone(),
                y_error: None,
                size: None,
                z_val: None,
                raw: Arc::new(Default::default()),
            });
        }
        s
    }

    #[test]
    fn buckets_keep_first_seen_order() {
        let opts = get_options(&json!({"aggregation": "max"})).unwrap();
        let s = series(
            ChartType::Column,
            &[(2, json!(1)), (1, json!(5)), (2, json!(7))],
        );
        let out = aggregate_series(vec![s], &opts);
        let xs: Vec<_> = out[0].data.iter().map(|p| p.x.clone().unwrap()).collect();
        assert_eq!(xs, [json!(2), json!(1)]);
        assert_eq!(out[0].data[0].y, json!(7.0));
    }

    #[test]
    fn scatter_points_are_not_collapsed() {
        let opts = get_options(&json!({"globalSeriesType": "scatter"})).unwrap();
        let s = series(ChartType::Scatter, &[(1, json!(1)), (1, json!(2))]);
        let out = aggregate_series(vec![s], &opts);
        assert_eq!(out[0].data.len(), 2);
    }
}
