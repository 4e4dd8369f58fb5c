use crate::record::{FieldValue, Record};

/// Column names for a batch, taken from its first record.
///
/// Scalars contribute their (prefixed) name, nested objects contribute their
/// own fields under `name + delimiter`, and array fields contribute nothing.
/// Returns `None` for an empty batch.
pub fn resolve_headers(records: &[Record], delimiter: &str) -> Option<Vec<String>> {
    let first = records.first()?;
    let mut headers = Vec::new();
    collect_headers(first, "", delimiter, &mut headers);
    Some(headers)
}

fn collect_headers(record: &Record, prefix: &str, delimiter: &str, headers: &mut Vec<String>) {
    for (name, value) in record.fields() {
        match value {
            FieldValue::Object(inner) => {
                let nested = format!("{}{}{}", prefix, name, delimiter);
                collect_headers(inner, &nested, delimiter, headers);
            }
            FieldValue::Array(_) => {}
            _ => headers.push(format!("{}{}", prefix, name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        Record::try_from(value).unwrap()
    }

    #[test]
    fn test_nested_object_headers() {
        let batch = vec![record(json!({"a": 1, "b": {"c": 2, "d": 3}}))];
        assert_eq!(resolve_headers(&batch, "_").unwrap(), vec!["a", "b_c", "b_d"]);
    }

    #[test]
    fn test_arrays_skipped() {
        let batch = vec![record(json!({
            "id": 1,
            "lines": [{"sku": "x"}],
            "address": {"street": "Main", "geo": {"lat": 1.0}},
            "total": 9
        }))];

        assert_eq!(
            resolve_headers(&batch, ".").unwrap(),
            vec!["id", "address.street", "address.geo.lat", "total"]
        );
    }

    #[test]
    fn test_only_first_record_counts() {
        let batch = vec![record(json!({"a": 1})), record(json!({"a": 1, "z": 2}))];
        assert_eq!(resolve_headers(&batch, "_").unwrap(), vec!["a"]);
    }

    #[test]
    fn test_empty_batch() {
        assert!(resolve_headers(&[], "_").is_none());
    }
}
