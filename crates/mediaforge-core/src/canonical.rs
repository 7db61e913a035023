//! Canonical JSON encoding.
//!
//! Used both as the hash input for cache keys derived from complex values
//! and as the signing input for webhook payloads: object keys are sorted
//! lexicographically and the result carries no extraneous whitespace, so
//! `canonical(canonical(x)) == canonical(x)` and independent recomputation
//! of a signature always matches.

use serde_json::{Map, Value};

/// Renders `value` as canonical JSON: object keys sorted, no whitespace.
pub fn canonical_json(value: &Value) -> String {
    let sorted = sort_value(value);
    serde_json::to_string(&sorted).expect("canonical value always serializes")
}

fn sort_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted = Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                sorted.insert(key.clone(), sort_value(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_value).collect()),
        other => other.clone(),
    }
}
