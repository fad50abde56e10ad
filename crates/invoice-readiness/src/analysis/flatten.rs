use super::{FlatRecord, Record};
use serde_json::{Map, Value};

/// Collapse nested objects into dot-joined keys.
///
/// Arrays are kept whole under their key so `lines` stays usable as a list of
/// line items once flattened.
pub fn flatten(record: &Record) -> FlatRecord {
    let mut flat = FlatRecord::new();
    walk(record, None, &mut flat);
    flat
}

fn walk(object: &Map<String, Value>, prefix: Option<&str>, out: &mut FlatRecord) {
    for (field, value) in object {
        let path = join_path(prefix, field);
        match value {
            Value::Object(nested) => walk(nested, Some(&path), out),
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}

pub(crate) fn join_path(prefix: Option<&str>, field: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}.{field}"),
        None => field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn nested_objects_become_dotted_keys() {
        let flat = flatten(&record(json!({
            "invoice": { "totals": { "net": 10 }, "currency": "AED" },
            "seller": { "trn": null },
            "memo": "x"
        })));

        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["invoice.totals.net", "invoice.currency", "seller.trn", "memo"]
        );
        assert_eq!(flat["invoice.totals.net"], json!(10));
        assert_eq!(flat["seller.trn"], Value::Null);
    }

    #[test]
    fn arrays_are_kept_atomic() {
        let flat = flatten(&record(json!({
            "lines": [{ "qty": 1 }, { "qty": 2 }],
            "invoice": { "tags": ["a", "b"] }
        })));

        assert_eq!(flat.len(), 2);
        assert_eq!(flat["lines"], json!([{ "qty": 1 }, { "qty": 2 }]));
        assert_eq!(flat["invoice.tags"], json!(["a", "b"]));
        assert!(flat.values().all(|value| !value.is_object()));
    }

    #[test]
    fn empty_nested_object_contributes_no_keys() {
        let flat = flatten(&record(json!({ "buyer": {}, "id": 1 })));
        assert_eq!(flat.len(), 1);
        assert!(flat.contains_key("id"));
    }
}
