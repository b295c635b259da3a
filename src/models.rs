use crate::viz::ChartType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// One query-result row: column name -> scalar, in the query's column order.
pub type Row = Map<String, Value>;

/// Column data types reported by the query runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    String,
    Boolean,
    Date,
    Datetime,
}

impl ColumnType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Some(ColumnType::Integer),
            "float" | "number" | "double" => Some(ColumnType::Float),
            "string" | "text" => Some(ColumnType::String),
            "boolean" | "bool" => Some(ColumnType::Boolean),
            "date" => Some(ColumnType::Date),
            "datetime" | "timestamp" => Some(ColumnType::Datetime),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

/// Column schema entry of a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Unknown or missing type names are kept as `None` and treated like strings.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "de_column_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<ColumnType>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: Option<ColumnType>) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

fn de_column_type<'de, D>(deserializer: D) -> Result<Option<ColumnType>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(ColumnType::parse))
}

/// Serde helper: parse `i64` from a JSON number, a numeric string, or null (-> 0).
///
/// Saved visualization options written by older editors store row indexes as strings.
pub(crate) fn de_i64_from_string_or_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct I64Visitor;

    impl<'de> Visitor<'de> for I64Visitor {
        type Value = i64;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a string or number representing an integer")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            i64::try_from(v).map_err(E::custom)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v)
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v.trunc() as i64)
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            // parseInt semantics: garbage means "first record"
            Ok(s.trim().parse::<i64>().unwrap_or(0))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(0)
        }
    }

    deserializer.deserialize_any(I64Visitor)
}

/// Tabular query result as delivered by the query-execution layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Semantic role a column plays in a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    X,
    Y,
    Series,
    YError,
    Size,
    ZVal,
    Unused,
    MultiFilter,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "x" => Some(Role::X),
            "y" => Some(Role::Y),
            "series" => Some(Role::Series),
            "yError" => Some(Role::YError),
            "size" => Some(Role::Size),
            "zVal" => Some(Role::ZVal),
            "unused" => Some(Role::Unused),
            "multiFilter" | "multi-filter" => Some(Role::MultiFilter),
            _ => None,
        }
    }
}

/// Per-row record after role resolution. `raw` keeps the whole source row for templates.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// `None` when no column has the `x` role.
    pub x: Option<Value>,
    pub y: Value,
    pub y_error: Option<Value>,
    pub size: Option<Value>,
    pub z_val: Option<Value>,
    pub raw: Arc<Row>,
}

impl Point {
    /// The x value with the "no x column" default of `0`.
    pub fn x_or_default(&self) -> Value {
        self.x.clone().unwrap_or_else(|| Value::from(0))
    }
}

/// Named, ordered collection of points. Rebuilt for every render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    /// Chart type the series was built for; per-series overrides apply later.
    pub kind: ChartType,
    pub data: Vec<Point>,
}

impl Series {
    pub fn new(name: impl Into<String>, kind: ChartType) -> Self {
        Self {
            name: name.into(),
            kind,
            data: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_type_tolerates_unknown_names() {
        let cols: Vec<Column> = serde_json::from_value(json!([
            {"name": "a", "type": "integer"},
            {"name": "b", "type": "geometry"},
            {"name": "c"}
        ]))
        .unwrap();
        assert_eq!(cols[0].kind, Some(ColumnType::Integer));
        assert_eq!(cols[1].kind, None);
        assert_eq!(cols[2].kind, None);
    }

    #[test]
    fn role_accepts_dashed_multi_filter() {
        assert_eq!(Role::parse("multi-filter"), Some(Role::MultiFilter));
        assert_eq!(Role::parse("zVal"), Some(Role::ZVal));
        assert_eq!(Role::parse("nope"), None);
    }
}
