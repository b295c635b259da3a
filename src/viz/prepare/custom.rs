use crate::models::Series;
use serde::Serialize;
use serde_json::{Map, Value};

/// Data passed to a user-defined chart: every x in series order and the y values
/// per series name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomChartData {
    pub x: Vec<Value>,
    pub ys: Map<String, Value>,
}

/// Points are passed through unaggregated.
pub fn prepare_custom_data(series: &[Series]) -> CustomChartData {
    let mut out = CustomChartData::default();
    for s in series {
        let mut ys = Vec::with_capacity(s.data.len());
        for point in &s.data {
            out.x.push(point.x_or_default());
            ys.push(point.y.clone());
        }
        out.ys.insert(s.name.clone(), Value::Array(ys));
    }
    out
}
