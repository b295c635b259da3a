use crate::format::{clean_number, number_value, value_key};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reduction applied to the y values sharing one x within a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    First,
    #[default]
    Sum,
    Mean,
    Median,
    P25,
    P75,
    P05,
    P95,
    Count,
    #[serde(rename = "countdistinct")]
    CountDistinct,
    Min,
    Max,
}

impl Aggregation {
    /// Reduce `values`. Numeric reductions skip non-numeric entries and yield `null`
    /// when nothing numeric is left.
    pub fn apply(self, values: &[Value]) -> Value {
        match self {
            Aggregation::First => values.first().cloned().unwrap_or(Value::Null),
            Aggregation::Count => Value::from(values.len()),
            Aggregation::CountDistinct => {
                let distinct: AHashSet<String> = values.iter().map(value_key).collect();
                Value::from(distinct.len())
            }
            Aggregation::Sum => number_value(numbers(values).reduce(|acc, v| acc + v)),
            Aggregation::Mean => {
                let nums: Vec<f64> = numbers(values).collect();
                if nums.is_empty() {
                    Value::Null
                } else {
                    number_value(Some(nums.iter().sum::<f64>() / nums.len() as f64))
                }
            }
            Aggregation::Min => number_value(numbers(values).reduce(f64::min)),
            Aggregation::Max => number_value(numbers(values).reduce(f64::max)),
            Aggregation::Median => percentile(values, 0.5),
            Aggregation::P25 => percentile(values, 0.25),
            Aggregation::P75 => percentile(values, 0.75),
            Aggregation::P05 => percentile(values, 0.05),
            Aggregation::P95 => percentile(values, 0.95),
        }
    }
}

fn numbers(values: &[Value]) -> impl Iterator<Item = f64> + '_ {
    values.iter().filter_map(clean_number)
}

/// Nearest-rank lookup at `floor((n - 1) * p)` of the sorted numeric values.
fn percentile(values: &[Value], p: f64) -> Value {
    let mut nums: Vec<f64> = numbers(values).collect();
    if nums.is_empty() {
        return Value::Null;
    }
    nums.sort_by(f64::total_cmp);
    let idx = ((nums.len() - 1) as f64 * p).floor() as usize;
    number_value(nums.get(idx).copied())
}

/// Summary statistics for one series (or one column) of values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub name: String,
    pub count: usize,
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Summarize numeric values; anything non-numeric counts as missing.
pub fn summarize(name: &str, values: &[Value]) -> Summary {
    let mut vals: Vec<f64> = numbers(values).collect();
    vals.sort_by(f64::total_cmp);
    let count = vals.len();
    let min = vals.first().copied();
    let max = vals.last().copied();
    let mean = if count > 0 {
        Some(vals.iter().sum::<f64>() / count as f64)
    } else {
        None
    };
    let median = if count == 0 {
        None
    } else if count % 2 == 1 {
        Some(vals[count / 2])
    } else {
        Some((vals[count / 2 - 1] + vals[count / 2]) / 2.0)
    };
    Summary {
        name: name.to_string(),
        count,
        missing: values.len() - count,
        min,
        max,
        mean,
        median,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALL: [Aggregation; 12] = [
        Aggregation::First,
        Aggregation::Sum,
        Aggregation::Mean,
        Aggregation::Median,
        Aggregation::P25,
        Aggregation::P75,
        Aggregation::P05,
        Aggregation::P95,
        Aggregation::Count,
        Aggregation::CountDistinct,
        Aggregation::Min,
        Aggregation::Max,
    ];

    #[test]
    fn single_value_is_returned_unchanged() {
        for agg in ALL {
            if matches!(agg, Aggregation::Count | Aggregation::CountDistinct) {
                continue;
            }
            assert_eq!(agg.apply(&[json!(7.5)]), json!(7.5), "{agg:?}");
        }
    }

    #[test]
    fn percentiles_do_not_interpolate() {
        let v: Vec<Value> = [4, 1, 3, 2].iter().map(|n| json!(*n)).collect();
        // sorted [1,2,3,4]; floor(3 * 0.5) = 1
        assert_eq!(Aggregation::Median.apply(&v), json!(2.0));
        assert_eq!(Aggregation::P75.apply(&v), json!(3.0));
        assert_eq!(Aggregation::P95.apply(&v), json!(3.0));
        assert_eq!(Aggregation::P05.apply(&v), json!(1.0));
    }

    #[test]
    fn sum_and_mean_skip_non_numeric() {
        let v = vec![json!("x"), json!(2), json!(null), json!(4)];
        assert_eq!(Aggregation::Sum.apply(&v), json!(6.0));
        assert_eq!(Aggregation::Mean.apply(&v), json!(3.0));
        assert_eq!(Aggregation::Count.apply(&v), json!(4));
        assert_eq!(Aggregation::Sum.apply(&[json!("x")]), Value::Null);
    }

    #[test]
    fn count_distinct_keeps_types_apart() {
        let v = vec![json!(1), json!("1"), json!(1), json!(null)];
        assert_eq!(Aggregation::CountDistinct.apply(&v), json!(3));
    }

    #[test]
    fn serde_names() {
        let a: Aggregation = serde_json::from_value(json!("countdistinct")).unwrap();
        assert_eq!(a, Aggregation::CountDistinct);
        assert_eq!(serde_json::to_value(Aggregation::P05).unwrap(), json!("p05"));
    }

    #[test]
    fn summary_counts_missing() {
        let s = summarize("y", &[json!(1), json!(null), json!(3), json!("n/a")]);
        assert_eq!(s.count, 2);
        assert_eq!(s.missing, 2);
        assert_eq!(s.median, Some(2.0));
        assert_eq!(s.min, Some(1.0));
    }
}
