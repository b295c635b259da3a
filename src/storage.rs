//! Reading query results from disk and writing prepared output.

use crate::format::parse_datetime;
use crate::models::{Column, ColumnType, QueryResult, Row};
use crate::table::{Cell, TableData};
use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Load a query result, picking the parser from the file extension (`.csv`, else JSON).
pub fn load_query_result<P: AsRef<Path>>(path: P) -> Result<QueryResult> {
    let path = path.as_ref();
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        load_csv(path)
    } else {
        load_json(path)
    }
}

/// JSON in either the bare `{columns, rows}` shape or wrapped in `query_result.data`.
pub fn load_json<P: AsRef<Path>>(path: P) -> Result<QueryResult> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_query_result(&text).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_query_result(text: &str) -> Result<QueryResult> {
    let mut value: Value = serde_json::from_str(text)?;
    if let Some(data) = value.pointer_mut("/query_result/data") {
        value = data.take();
    }
    if !value.is_object() {
        bail!("expected an object with columns and rows");
    }
    let mut result: QueryResult = serde_json::from_value(value)?;
    if result.columns.is_empty()
        && let Some(first) = result.rows.first()
    {
        result.columns = first.keys().map(|k| Column::new(k.clone(), None)).collect();
    }
    Ok(result)
}

/// CSV with a header row. Column types are inferred from the non-empty cells.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<QueryResult> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut cells: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("reading {}", path.display()))?;
        cells.push(record.iter().map(str::to_string).collect());
    }

    let kinds: Vec<ColumnType> = (0..headers.len())
        .map(|i| infer_column_type(cells.iter().filter_map(|r| r.get(i)).map(String::as_str)))
        .collect();
    let rows: Vec<Row> = cells
        .iter()
        .map(|record| {
            headers
                .iter()
                .zip(&kinds)
                .enumerate()
                .map(|(i, (name, kind))| {
                    let raw = record.get(i).map(String::as_str).unwrap_or("");
                    (name.clone(), typed_cell(raw, *kind))
                })
                .collect()
        })
        .collect();
    let columns = headers
        .into_iter()
        .zip(kinds)
        .map(|(name, kind)| Column::new(name, Some(kind)))
        .collect();
    log::debug!("loaded {} csv rows from {}", rows.len(), path.display());
    Ok(QueryResult::new(columns, rows))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn is_datetime(s: &str) -> bool {
    parse_datetime(&Value::String(s.to_string())).is_some()
}

/// Narrowest type every non-empty cell fits; all-empty columns are strings.
pub fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let values: Vec<&str> = cells.map(str::trim).filter(|s| !s.is_empty()).collect();
    if values.is_empty() {
        return ColumnType::String;
    }
    if values.iter().all(|s| s.parse::<i64>().is_ok()) {
        ColumnType::Integer
    } else if values.iter().all(|s| s.parse::<f64>().is_ok_and(f64::is_finite)) {
        ColumnType::Float
    } else if values.iter().all(|s| parse_bool(s).is_some()) {
        ColumnType::Boolean
    } else if values.iter().all(|s| is_datetime(s)) {
        ColumnType::Datetime
    } else {
        ColumnType::String
    }
}

fn typed_cell(raw: &str, kind: ColumnType) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match kind {
        ColumnType::Integer => trimmed.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
        ColumnType::Float => trimmed
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ColumnType::Boolean => parse_bool(trimmed).map(Value::Bool).unwrap_or(Value::Null),
        ColumnType::String | ColumnType::Date | ColumnType::Datetime => {
            Value::String(raw.to_string())
        }
    }
}

/// Write any serializable output (figures, counter and funnel data) as pretty JSON.
pub fn save_json<T: Serialize + ?Sized, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let s = serde_json::to_string_pretty(value)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Leading characters spreadsheet programs treat as a formula.
fn sanitize_csv_cell(text: &str) -> String {
    match text.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{text}"),
        _ => text.to_string(),
    }
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Text { text, .. } | Cell::Json { text } => text.clone(),
        Cell::Link { href, .. } => href.clone(),
        Cell::Image { src, .. } => src.clone(),
    }
}

/// Save a formatted table as CSV with the column titles as header.
pub fn save_table_csv<P: AsRef<Path>>(table: &TableData, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    wtr.write_record(table.columns.iter().map(|c| sanitize_csv_cell(&c.title)))?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|c| sanitize_csv_cell(&cell_text(c))))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Raw values of one column, for summaries.
pub fn column_values(result: &QueryResult, column: &str) -> Vec<Value> {
    result
        .rows
        .iter()
        .map(|r| r.get(column).cloned().unwrap_or(Value::Null))
        .collect()
}
