use serde_json::{Map, Value};

const SEPARATOR: &str = "__";

// Collapses nested objects into a single level, joining key paths with `__`.
// Arrays are carried as their JSON text; scalars pass through unchanged.
pub fn flatten(record: &Map<String, Value>) -> Map<String, Value> {
    let mut flat = Map::new();
    flatten_into(&mut flat, record, "");
    flat
}

fn flatten_into(flat: &mut Map<String, Value>, record: &Map<String, Value>, parent_key: &str) {
    for (key, value) in record {
        let flat_key = if parent_key.is_empty() {
            key.clone()
        } else {
            format!("{parent_key}{SEPARATOR}{key}")
        };

        match value {
            Value::Object(nested) => flatten_into(flat, nested, &flat_key),
            Value::Array(_) => {
                flat.insert(flat_key, Value::String(value.to_string()));
            }
            other => {
                flat.insert(flat_key, other.clone());
            }
        }
    }
}
