//! Table and details views: per-column display options and cell formatting.

use crate::format::{
    DateTimeFormatter, NumberFormatter, ValueFormatter, create_boolean_formatter,
    create_text_formatter, display_value, format_simple_template,
};
use crate::models::{Column, ColumnType, QueryResult, Row};
use crate::viz::updater::merge_patch;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Order given to columns the saved options do not mention, so they sort last.
const NATURAL_ORDER_BASE: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayAs {
    #[default]
    String,
    Number,
    Datetime,
    Boolean,
    Json,
    Image,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnOptions {
    pub name: String,
    #[serde(rename = "type", skip_deserializing)]
    pub kind: Option<ColumnType>,
    pub display_as: DisplayAs,
    pub visible: bool,
    pub order: usize,
    pub title: String,
    pub allow_search: bool,
    pub align_content: Alignment,
    pub description: String,
    #[serde(rename = "allowHTML")]
    pub allow_html: bool,
    pub highlight_links: bool,
    pub date_time_format: Option<String>,
    pub number_format: Option<String>,
    pub boolean_values: Vec<String>,
    pub image_url_template: String,
    pub image_title_template: String,
    pub image_width: String,
    pub image_height: String,
    pub link_url_template: String,
    pub link_text_template: String,
    pub link_title_template: String,
    pub link_open_in_new_tab: bool,
}

impl Default for ColumnOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: None,
            display_as: DisplayAs::String,
            visible: true,
            order: NATURAL_ORDER_BASE,
            title: String::new(),
            allow_search: false,
            align_content: Alignment::Left,
            description: String::new(),
            allow_html: false,
            highlight_links: false,
            date_time_format: None,
            number_format: None,
            boolean_values: vec!["false".to_string(), "true".to_string()],
            image_url_template: "{{ @ }}".to_string(),
            image_title_template: "{{ @ }}".to_string(),
            image_width: String::new(),
            image_height: String::new(),
            link_url_template: "{{ @ }}".to_string(),
            link_text_template: "{{ @ }}".to_string(),
            link_title_template: "{{ @ }}".to_string(),
            link_open_in_new_tab: true,
        }
    }
}

/// Defaults derived from the column type alone.
pub fn default_column_options(column: &Column, index: usize) -> ColumnOptions {
    let kind = column.kind;
    let (display_as, align_content) = match kind {
        Some(ColumnType::Integer | ColumnType::Float) => (DisplayAs::Number, Alignment::Right),
        Some(ColumnType::Boolean) => (DisplayAs::Boolean, Alignment::Right),
        Some(ColumnType::Date | ColumnType::Datetime) => (DisplayAs::Datetime, Alignment::Right),
        Some(ColumnType::String) | None => (DisplayAs::String, Alignment::Left),
    };
    ColumnOptions {
        name: column.name.clone(),
        kind,
        display_as,
        order: NATURAL_ORDER_BASE + index,
        title: column.name.clone(),
        align_content,
        date_time_format: match kind {
            Some(ColumnType::Date) => Some("DD/MM/YYYY".to_string()),
            Some(ColumnType::Datetime) => Some("DD/MM/YYYY HH:mm".to_string()),
            _ => None,
        },
        number_format: match kind {
            Some(ColumnType::Integer) => Some("0,0".to_string()),
            Some(ColumnType::Float) => Some("0,0.00".to_string()),
            _ => None,
        },
        ..ColumnOptions::default()
    }
}

fn saved_name(saved: &Value) -> Option<&str> {
    saved.get("name").and_then(Value::as_str)
}

/// True when the columns both lists share appear in a different relative order.
pub fn were_columns_reordered(query: &[Column], saved: &[Value]) -> bool {
    let saved_names: Vec<&str> = saved.iter().filter_map(saved_name).collect();
    let query_common = query
        .iter()
        .map(|c| c.name.as_str())
        .filter(|name| saved_names.contains(name));
    let saved_common = saved_names
        .iter()
        .copied()
        .filter(|name| query.iter().any(|c| c.name == *name));
    !query_common.eq(saved_common)
}

/// Column options for a query result, with saved options laid over the defaults.
///
/// A user-chosen order is kept, with new columns after it; otherwise columns follow
/// the query.
pub fn get_columns_options(columns: &[Column], saved: &[Value]) -> Vec<ColumnOptions> {
    let reordered = were_columns_reordered(columns, saved);
    let mut options: Vec<ColumnOptions> = columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let defaults = default_column_options(column, index);
            let Some((position, overlay)) = saved
                .iter()
                .enumerate()
                .find(|(_, s)| saved_name(s) == Some(column.name.as_str()))
            else {
                return defaults;
            };
            let mut merged = match serde_json::to_value(&defaults) {
                Ok(v) => v,
                Err(_) => return defaults,
            };
            let mut overlay = overlay.clone();
            if let Value::Object(o) = &mut overlay {
                o.remove("name");
                o.remove("type");
                o.remove("order");
            }
            merge_patch(&mut merged, &overlay);
            match serde_json::from_value::<ColumnOptions>(merged) {
                Ok(mut opts) => {
                    opts.kind = column.kind;
                    opts.order = if reordered { position } else { defaults.order };
                    opts
                }
                Err(e) => {
                    log::warn!("ignoring saved options for column {}: {e}", column.name);
                    defaults
                }
            }
        })
        .collect();
    options.sort_by_key(|o| o.order);
    options
}

/// A formatted cell, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Cell {
    Text { text: String, html: bool },
    Json { text: String },
    Link {
        href: String,
        text: String,
        title: String,
        new_tab: bool,
    },
    Image {
        src: String,
        title: String,
        width: String,
        height: String,
    },
}

impl Cell {
    fn text(text: String) -> Self {
        Cell::Text { text, html: false }
    }
}

fn pretty_json(value: &Value) -> String {
    let parsed = match value {
        Value::String(s) => serde_json::from_str::<Value>(s).ok(),
        other => Some(other.clone()),
    };
    match parsed.and_then(|v| serde_json::to_string_pretty(&v).ok()) {
        Some(text) => text,
        None => display_value(value),
    }
}

/// Format one cell of `row` for `column`.
pub fn format_cell(column: &ColumnOptions, row: &Row) -> Cell {
    let value = row.get(&column.name).cloned().unwrap_or(Value::Null);
    match column.display_as {
        DisplayAs::String => {
            if column.highlight_links {
                Cell::Text {
                    text: create_text_formatter(true).format(&value),
                    html: true,
                }
            } else {
                Cell::Text {
                    text: display_value(&value),
                    html: column.allow_html,
                }
            }
        }
        DisplayAs::Number => {
            let format = column.number_format.as_deref().unwrap_or("0,0[.]00");
            Cell::text(NumberFormatter::new(format).format(&value))
        }
        DisplayAs::Datetime => {
            let format = column
                .date_time_format
                .as_deref()
                .unwrap_or("DD/MM/YYYY HH:mm");
            Cell::text(DateTimeFormatter::new(format).format(&value))
        }
        DisplayAs::Boolean => Cell::text(create_boolean_formatter(&column.boolean_values).format(&value)),
        DisplayAs::Json => Cell::Json {
            text: pretty_json(&value),
        },
        DisplayAs::Link | DisplayAs::Image => {
            let mut context = row.clone();
            context.insert("@".into(), value);
            let render = |template: &str| format_simple_template(template, &context);
            if column.display_as == DisplayAs::Link {
                Cell::Link {
                    href: render(&column.link_url_template),
                    text: render(&column.link_text_template),
                    title: render(&column.link_title_template),
                    new_tab: column.link_open_in_new_tab,
                }
            } else {
                Cell::Image {
                    src: render(&column.image_url_template),
                    title: render(&column.image_title_template),
                    width: column.image_width.clone(),
                    height: column.image_height.clone(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableData {
    pub columns: Vec<ColumnOptions>,
    pub rows: Vec<Vec<Cell>>,
}

/// Visible columns in display order, with every row formatted.
pub fn prepare_table(result: &QueryResult, saved: &[Value]) -> TableData {
    let columns: Vec<ColumnOptions> = get_columns_options(&result.columns, saved)
        .into_iter()
        .filter(|c| c.visible)
        .collect();
    let rows = result
        .rows
        .iter()
        .map(|row| columns.iter().map(|c| format_cell(c, row)).collect())
        .collect();
    TableData { columns, rows }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailField {
    pub title: String,
    pub description: String,
    pub cell: Cell,
}

/// Details view: the first row as a title/value list. `None` for an empty result.
pub fn prepare_details(result: &QueryResult, saved: &[Value]) -> Option<Vec<DetailField>> {
    let row = result.rows.first()?;
    Some(
        get_columns_options(&result.columns, saved)
            .into_iter()
            .filter(|c| c.visible)
            .map(|c| DetailField {
                cell: format_cell(&c, row),
                title: c.title,
                description: c.description,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", Some(ColumnType::Integer)),
            Column::new("name", Some(ColumnType::String)),
            Column::new("created", Some(ColumnType::Datetime)),
        ]
    }

    fn names(options: &[ColumnOptions]) -> Vec<&str> {
        options.iter().map(|o| o.name.as_str()).collect()
    }

    #[test]
    fn defaults_follow_column_types() {
        let opts = get_columns_options(&columns(), &[]);
        assert_eq!(names(&opts), ["id", "name", "created"]);
        assert_eq!(opts[0].display_as, DisplayAs::Number);
        assert_eq!(opts[0].align_content, Alignment::Right);
        assert_eq!(opts[1].align_content, Alignment::Left);
        assert_eq!(opts[2].date_time_format.as_deref(), Some("DD/MM/YYYY HH:mm"));
    }

    #[test]
    fn saved_order_is_kept_only_when_reordered() {
        let reordered = [json!({"name": "created"}), json!({"name": "id", "title": "ID"})];
        let opts = get_columns_options(&columns(), &reordered);
        assert_eq!(names(&opts), ["created", "id", "name"]);
        assert_eq!(opts[1].title, "ID");

        let natural = [json!({"name": "id"}), json!({"name": "gone"}), json!({"name": "created", "visible": false})];
        assert!(!were_columns_reordered(&columns(), &natural));
        let opts = get_columns_options(&columns(), &natural);
        assert_eq!(names(&opts), ["id", "name", "created"]);
        assert!(!opts[2].visible);
    }

    #[test]
    fn broken_saved_options_fall_back_to_defaults() {
        let saved = [json!({"name": "id", "displayAs": "hologram"})];
        let opts = get_columns_options(&columns(), &saved);
        assert_eq!(opts[0].display_as, DisplayAs::Number);
    }

    #[test]
    fn cells_follow_display_as() {
        let row = json!({"id": 1234, "name": "see https://x.io", "created": "2024-03-05T14:07:00Z", "doc": "{\"a\":1}"})
            .as_object()
            .cloned()
            .unwrap();
        let opts = get_columns_options(&columns(), &[]);
        assert_eq!(format_cell(&opts[0], &row), Cell::text("1,234".into()));
        assert_eq!(format_cell(&opts[2], &row), Cell::text("05/03/2024 14:07".into()));

        let linked = ColumnOptions {
            highlight_links: true,
            ..opts[1].clone()
        };
        let Cell::Text { text, html } = format_cell(&linked, &row) else {
            panic!("expected text");
        };
        assert!(html);
        assert!(text.contains(r#"<a href="https://x.io""#));

        let json_col = ColumnOptions {
            name: "doc".into(),
            display_as: DisplayAs::Json,
            ..ColumnOptions::default()
        };
        assert_eq!(format_cell(&json_col, &row), Cell::Json { text: "{\n  \"a\": 1\n}".into() });
    }

    #[test]
    fn link_templates_see_the_row() {
        let row = json!({"id": 7, "name": "seven"}).as_object().cloned().unwrap();
        let link = ColumnOptions {
            name: "id".into(),
            display_as: DisplayAs::Link,
            link_url_template: "/items/{{ @ }}".into(),
            link_text_template: "{{ name }}".into(),
            ..ColumnOptions::default()
        };
        assert_eq!(
            format_cell(&link, &row),
            Cell::Link {
                href: "/items/7".into(),
                text: "seven".into(),
                title: "7".into(),
                new_tab: true,
            }
        );
    }

    #[test]
    fn details_show_the_first_row() {
        let result: QueryResult = serde_json::from_value(json!({
            "columns": [{"name": "id", "type": "integer"}],
            "rows": [{"id": 1}, {"id": 2}]
        }))
        .unwrap();
        let fields = prepare_details(&result, &[]).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].cell, Cell::text("1".into()));
        assert!(prepare_details(&QueryResult::default(), &[]).is_none());
    }
}
