//! Helpers for reading loosely-shaped upstream JSON.

use serde_json::Value;

/// Result items from a response that is either a bare array or an object
/// holding the array under one of `keys`.
pub fn items<'a>(value: &'a Value, keys: &[&str]) -> Vec<&'a Value> {
    if let Some(array) = value.as_array() {
        return array.iter().collect();
    }

    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_array))
        .find(|array| !array.is_empty())
        .map(|array| array.iter().collect())
        .unwrap_or_default()
}

/// First non-blank string field among `keys`.
pub fn str_field(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// First numeric field among `keys`; numeric strings are accepted.
pub fn score_field(item: &Value, keys: &[&str]) -> Option<f32> {
    keys.iter().find_map(|key| match item.get(*key)? {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    })
}

/// Strings from a field that is either a list of strings, a list of
/// `{ "name": .. }` objects, or a single comma-separated string.
pub fn string_list(item: &Value, key: &str) -> Vec<String> {
    match item.get(key) {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(_) => v
                    .get("name")
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_items_from_array_or_keyed_object() {
        let bare = json!([{ "a": 1 }, { "a": 2 }]);
        assert_eq!(items(&bare, &["results"]).len(), 2);

        let keyed = json!({ "facts": [], "nodes": [{ "a": 1 }] });
        assert_eq!(items(&keyed, &["facts", "nodes"]).len(), 1);

        let neither = json!({ "message": "nothing" });
        assert!(items(&neither, &["facts"]).is_empty());
    }

    #[test]
    fn test_str_field_skips_blank_values() {
        let item = json!({ "name": "  ", "fact": "Alice works at Acme" });
        assert_eq!(
            str_field(&item, &["name", "fact"]).as_deref(),
            Some("Alice works at Acme")
        );
        assert!(str_field(&item, &["missing"]).is_none());
    }

    #[test]
    fn test_score_field_accepts_numbers_and_strings() {
        assert_eq!(score_field(&json!({ "score": 0.5 }), &["score"]), Some(0.5));
        assert_eq!(score_field(&json!({ "relevance": "0.25" }), &["score", "relevance"]), Some(0.25));
        assert_eq!(score_field(&json!({ "score": "high" }), &["score"]), None);
    }

    #[test]
    fn test_string_list_shapes() {
        assert_eq!(
            string_list(&json!({ "authors": ["A. Turing", "C. Shannon"] }), "authors"),
            vec!["A. Turing", "C. Shannon"]
        );
        assert_eq!(
            string_list(&json!({ "authors": [{ "name": "G. Hopper" }] }), "authors"),
            vec!["G. Hopper"]
        );
        assert_eq!(
            string_list(&json!({ "authors": "X, Y ,Z" }), "authors"),
            vec!["X", "Y", "Z"]
        );
        assert!(string_list(&json!({}), "authors").is_empty());
    }
}
