use super::flatten::join_path;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Target schema shipped with the crate, used when no override is configured.
pub const BUNDLED_SCHEMA: &str = include_str!("../../data/gets_v0_1_schema.json");

const HEADER_PREFIXES: [&str; 3] = ["invoice.", "seller.", "buyer."];

/// Ordered leaf paths of the canonical target schema.
///
/// Arrays of objects expand to `field[].sub` using the keys of the first
/// element; scalar or empty arrays expand to `field[]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TargetKeys(Vec<String>);

impl TargetKeys {
    pub fn new(keys: Vec<String>) -> Self {
        Self(keys)
    }

    pub fn from_schema(schema: &Value) -> Result<Self, SchemaError> {
        let object = schema.as_object().ok_or(SchemaError::NotAnObject)?;
        let mut keys = Vec::new();
        collect_keys(object, None, &mut keys);
        Ok(Self(keys))
    }

    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        let schema: Value = serde_json::from_str(raw)?;
        Self::from_schema(&schema)
    }

    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn bundled() -> Result<Self, SchemaError> {
        Self::from_json(BUNDLED_SCHEMA)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn header_count(&self) -> usize {
        self.iter().filter(|key| is_header_key(key)).count()
    }
}

/// Header keys describe the invoice and its parties; everything else is a
/// line-level key.
pub fn is_header_key(key: &str) -> bool {
    HEADER_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

fn collect_keys(object: &Map<String, Value>, prefix: Option<&str>, keys: &mut Vec<String>) {
    for (field, value) in object {
        let path = join_path(prefix, field);
        match value {
            Value::Array(items) => match items.first() {
                Some(Value::Object(template)) => {
                    keys.extend(template.keys().map(|sub| format!("{path}[].{sub}")));
                }
                _ => keys.push(format!("{path}[]")),
            },
            Value::Object(nested) => collect_keys(nested, Some(&path), keys),
            _ => keys.push(path),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to read target schema {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("target schema is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("target schema must be a JSON object")]
    NotAnObject,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn derives_leaf_paths_in_schema_order() {
        let keys = TargetKeys::from_schema(&json!({
            "invoice": { "number": "", "totals": { "net": 0 } },
            "tags": ["a"],
            "attachments": [],
            "lines": [{ "qty": 0, "unit_price": 0 }],
            "note": null
        }))
        .expect("schema is an object");

        assert_eq!(
            keys.as_slice(),
            [
                "invoice.number",
                "invoice.totals.net",
                "tags[]",
                "attachments[]",
                "lines[].qty",
                "lines[].unit_price",
                "note",
            ]
        );
    }

    #[test]
    fn bundled_schema_splits_header_and_line_keys() {
        let keys = TargetKeys::bundled().expect("bundled schema parses");
        assert_eq!(keys.len(), 19);
        assert_eq!(keys.header_count(), 14);
        assert!(keys.iter().any(|key| key == "lines[].line_total"));
        assert!(keys.iter().any(|key| key == "invoice.issue_date"));
    }

    #[test]
    fn rejects_non_object_schema() {
        assert!(matches!(
            TargetKeys::from_schema(&json!(["invoice"])),
            Err(SchemaError::NotAnObject)
        ));
        assert!(matches!(
            TargetKeys::from_json("{"),
            Err(SchemaError::Json(_))
        ));
    }

    #[test]
    fn missing_schema_file_reports_path() {
        let error = TargetKeys::from_path(Path::new("./does-not-exist.json"))
            .expect_err("expected io error");
        match error {
            SchemaError::Io { path, .. } => assert!(path.ends_with("does-not-exist.json")),
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
