use super::rules::is_iso_date_shape;
use super::Record;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Number of records shown in an upload preview.
pub const PREVIEW_ROWS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Empty,
    Number,
    Date,
    Text,
}

/// First rows of a decoded upload with a best-guess type per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
    pub types: BTreeMap<String, ColumnType>,
}

pub fn preview(records: &[Record]) -> TablePreview {
    let rows: Vec<Record> = records.iter().take(PREVIEW_ROWS).cloned().collect();

    let mut columns: Vec<String> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let types = columns
        .iter()
        .map(|column| {
            let kind = rows
                .iter()
                .filter_map(|row| row.get(column))
                .find(|value| !is_empty_text(value))
                .map(infer_type)
                .unwrap_or(ColumnType::Empty);
            (column.clone(), kind)
        })
        .collect();

    TablePreview {
        columns,
        rows,
        types,
    }
}

pub fn infer_type(value: &Value) -> ColumnType {
    match value {
        Value::Null => ColumnType::Empty,
        Value::Number(_) | Value::Bool(_) => ColumnType::Number,
        Value::String(text) if text.is_empty() => ColumnType::Empty,
        Value::String(text) if text.trim().parse::<f64>().is_ok() => ColumnType::Number,
        Value::String(text) if is_iso_date_shape(text) => ColumnType::Date,
        _ => ColumnType::Text,
    }
}

/// Only empty strings are passed over; a leading `null` decides the column.
fn is_empty_text(value: &Value) -> bool {
    matches!(value, Value::String(text) if text.is_empty())
}
