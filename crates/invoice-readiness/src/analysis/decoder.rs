use super::Record;
use serde_json::Value;

/// Upper bound on the number of records produced from a single document.
pub const MAX_RECORDS: usize = 200;

/// Decode raw upload text into generic records.
///
/// Input that looks like JSON (`{` or `[` after trimming) is parsed as JSON
/// first; anything else, or JSON that fails to parse, is read as delimited text
/// with a header row. Decoding never fails: unusable input yields no records.
pub fn decode(text: &str) -> Vec<Record> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if trimmed.starts_with(['{', '[']) {
        if let Some(records) = decode_json(trimmed) {
            return records;
        }
    }

    decode_delimited(trimmed)
}

fn decode_json(text: &str) -> Option<Vec<Record>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .take(MAX_RECORDS)
                .map(|item| match item {
                    Value::Object(record) => record,
                    _ => Record::new(),
                })
                .collect(),
        ),
        Value::Object(record) => Some(vec![record]),
        _ => None,
    }
}

fn decode_delimited(text: &str) -> Vec<Record> {
    let mut lines = text.split(['\r', '\n']).filter(|line| !line.is_empty());
    let headers = match lines.next() {
        Some(line) => split_row(line),
        None => return Vec::new(),
    };

    lines
        .take(MAX_RECORDS)
        .map(|line| {
            let values = split_row(line);
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| {
                    let value = values
                        .get(idx)
                        .map(|value| Value::String(value.clone()))
                        .unwrap_or(Value::Null);
                    (header.clone(), value)
                })
                .collect()
        })
        .collect()
}

/// Split one line on commas outside `"` quotes, then trim each field.
///
/// A quote toggles quoting wherever it appears, not only at the start of a
/// field, and `""` inside a quoted run is a literal quote.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if quoted && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);

    fields
        .into_iter()
        .map(|field| field.trim().to_string())
        .collect()
}
