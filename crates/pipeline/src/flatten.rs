//! Recursive flattening of nested mappings into single-level key paths.
//!
//! Nested mappings are collapsed by joining key paths with a separator.
//! Lists become a single `", "`-joined string of their string elements,
//! except for entity-list fields, which are passed through untouched so the
//! normalizer or the chunk builder can treat their elements as records.

use crate::schema::SchemaDescriptor;
use serde_json::{Map, Value};

/// Flattener configured with a separator and an entity-list exclusion set.
#[derive(Debug, Clone, Copy)]
pub struct Flattener<'a> {
    separator: &'a str,
    entity_list_fields: &'a [String],
}

impl<'a> Flattener<'a> {
    pub fn new(separator: &'a str, entity_list_fields: &'a [String]) -> Self {
        Self {
            separator,
            entity_list_fields,
        }
    }

    pub fn for_schema(schema: &'a SchemaDescriptor) -> Self {
        Self::new(&schema.separator, &schema.entity_list_fields)
    }

    /// Flatten `mapping`, prefixing every produced key with `prefix`.
    ///
    /// Key order follows the input. When two paths collide the later value
    /// wins and keeps the position of the first.
    pub fn flatten(&self, mapping: &Map<String, Value>, prefix: &str) -> Map<String, Value> {
        let mut out = Map::new();
        self.flatten_into(mapping, prefix, &mut out);
        out
    }

    fn flatten_into(&self, mapping: &Map<String, Value>, prefix: &str, out: &mut Map<String, Value>) {
        for (key, value) in mapping {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, self.separator, key)
            };

            match value {
                Value::Object(nested) => self.flatten_into(nested, &path, out),
                Value::Array(items) if !self.is_entity_list(key) => {
                    out.insert(path, Value::String(join_strings(items)));
                }
                _ => {
                    out.insert(path, value.clone());
                }
            }
        }
    }

    fn is_entity_list(&self, key: &str) -> bool {
        self.entity_list_fields.iter().any(|field| field == key)
    }
}

/// Flatten with no entity-list exclusions.
pub fn flatten(mapping: &Map<String, Value>, prefix: &str, separator: &str) -> Map<String, Value> {
    Flattener::new(separator, &[]).flatten(mapping, prefix)
}

/// Join the string elements of a list; other elements are dropped.
fn join_strings(items: &[Value]) -> String {
    items
        .iter()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_flatten_nested_mapping() {
        let flat = flatten(&as_map(json!({"a": {"b": 1, "c": 2}})), "", "_");
        assert_eq!(Value::Object(flat), json!({"a_b": 1, "a_c": 2}));
    }

    #[test]
    fn test_flatten_with_prefix_and_depth() {
        let flat = flatten(
            &as_map(json!({"currency": "KES", "limits": {"min": {"amount": 5}}})),
            "premium",
            "_",
        );
        assert_eq!(
            Value::Object(flat),
            json!({"premium_currency": "KES", "premium_limits_min_amount": 5})
        );
    }

    #[test]
    fn test_lists_join_strings_and_drop_others() {
        let flat = flatten(
            &as_map(json!({"channels": ["agent", 3, "online", {"x": 1}, null]})),
            "",
            "_",
        );
        assert_eq!(flat["channels"], json!("agent, online"));
    }

    #[test]
    fn test_entity_list_fields_pass_through() {
        let fields = vec!["rate_table".to_string(), "branches".to_string()];
        let flattener = Flattener::new("_", &fields);
        let input = as_map(json!({
            "premium": {"rate_table": [{"age": 30, "rate": 100}], "notes": ["a", "b"]},
            "branches": [{"branch_name": "Nairobi"}]
        }));

        let flat = flattener.flatten(&input, "");
        assert_eq!(flat["premium_rate_table"], json!([{"age": 30, "rate": 100}]));
        assert_eq!(flat["premium_notes"], json!("a, b"));
        assert_eq!(flat["branches"], json!([{"branch_name": "Nairobi"}]));
    }

    #[test]
    fn test_preserves_key_order() {
        let flat = flatten(
            &as_map(json!({"z": 1, "m": {"b": 2, "a": 3}, "a": 4})),
            "",
            "_",
        );
        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "m_b", "m_a", "a"]);
    }

    #[test]
    fn test_empty_nested_mapping_vanishes() {
        let flat = flatten(&as_map(json!({"a": {}, "b": null, "c": ""})), "", "_");
        assert_eq!(Value::Object(flat), json!({"b": null, "c": ""}));
    }

    #[test]
    fn test_custom_separator() {
        let flat = flatten(&as_map(json!({"a": {"b": true}})), "", ".");
        assert_eq!(flat["a.b"], json!(true));
    }
}
