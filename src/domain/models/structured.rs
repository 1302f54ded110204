//! Tagged representation of untrusted generated structures.
//!
//! Generation backends are asked for a JSON mapping but routinely return a
//! sequence wrapping one, a bare sequence of strings, or nothing at all.
//! Instead of inspecting `serde_json::Value` shapes ad hoc at every call
//! site, callers classify the raw value once and normalize it through
//! [`StructuredValue::into_mapping`].

use serde_json::{Map, Value};

/// Classification of a raw generation result.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredValue {
    /// The expected shape: a JSON object.
    Mapping(Map<String, Value>),
    /// A sequence, possibly wrapping the expected object.
    Sequence(Vec<Value>),
    /// Missing, null, or a scalar that carries no structure.
    Absent,
}

impl StructuredValue {
    /// Classify an optional raw value. Scalars and null are treated as
    /// absent; the normalization contract maps them to an empty mapping.
    pub fn classify(raw: Option<Value>) -> Self {
        match raw {
            Some(Value::Object(map)) => Self::Mapping(map),
            Some(Value::Array(seq)) => Self::Sequence(seq),
            _ => Self::Absent,
        }
    }

    /// Normalize into a mapping.
    ///
    /// Sequences yield their first element when it is itself a mapping; a
    /// non-empty sequence whose first element is not a mapping is wrapped
    /// under `wrap_key`. Everything else degrades to an empty mapping, which
    /// the caller then fills with field-level defaults.
    pub fn into_mapping(self, wrap_key: &str) -> Map<String, Value> {
        match self {
            Self::Mapping(map) => map,
            Self::Sequence(seq) => match seq.into_iter().next() {
                None => Map::new(),
                Some(Value::Object(map)) => map,
                Some(Value::Array(items)) => {
                    let mut map = Map::new();
                    map.insert(wrap_key.to_string(), Value::Array(items));
                    map
                }
                Some(other) => {
                    let mut map = Map::new();
                    map.insert(wrap_key.to_string(), Value::Array(vec![other]));
                    map
                }
            },
            Self::Absent => Map::new(),
        }
    }
}

/// Read a string field, falling back to `default` when missing or non-string.
pub fn string_field(map: &Map<String, Value>, key: &str, default: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => default.to_string(),
    }
}

/// Read a list-of-strings field, falling back to `defaults` when missing or
/// empty. Non-string elements are stringified rather than dropped.
pub fn string_list_field(map: &Map<String, Value>, key: &str, defaults: &[&str]) -> Vec<String> {
    let items: Vec<String> = match map.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    };

    if items.is_empty() {
        defaults.iter().map(|s| (*s).to_string()).collect()
    } else {
        items
    }
}

/// Coerce a field to `f64`, clamped to `[lo, hi]`. Numeric strings are
/// accepted; anything else yields `default`.
pub fn clamped_score_field(
    map: &Map<String, Value>,
    key: &str,
    default: f64,
    lo: f64,
    hi: f64,
) -> f64 {
    let coerced = match map.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match coerced {
        Some(v) if v.is_finite() => v.clamp(lo, hi),
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_mapping() {
        let value = StructuredValue::classify(Some(json!({"a": 1})));
        assert!(matches!(value, StructuredValue::Mapping(_)));
    }

    #[test]
    fn test_classify_scalar_is_absent() {
        assert_eq!(StructuredValue::classify(Some(json!(42))), StructuredValue::Absent);
        assert_eq!(StructuredValue::classify(Some(Value::Null)), StructuredValue::Absent);
        assert_eq!(StructuredValue::classify(None), StructuredValue::Absent);
    }

    #[test]
    fn test_sequence_unwraps_first_mapping() {
        let value = StructuredValue::classify(Some(json!([{"score": 5}, {"score": 9}])));
        let map = value.into_mapping("items");
        assert_eq!(map.get("score"), Some(&json!(5)));
    }

    #[test]
    fn test_sequence_of_strings_wraps_under_key() {
        let value = StructuredValue::classify(Some(json!(["clear design", "good controls"])));
        let map = value.into_mapping("strengths");
        assert_eq!(map.get("strengths"), Some(&json!(["clear design"])));
    }

    #[test]
    fn test_empty_sequence_is_empty_mapping() {
        let value = StructuredValue::classify(Some(json!([])));
        assert!(value.into_mapping("x").is_empty());
    }

    #[test]
    fn test_clamped_score_field() {
        let map = json!({"score": 12.0, "bad": "abc", "text": "7.5"});
        let Value::Object(map) = map else { unreachable!() };

        assert_eq!(clamped_score_field(&map, "score", 6.5, 0.0, 10.0), 10.0);
        assert_eq!(clamped_score_field(&map, "bad", 6.5, 0.0, 10.0), 6.5);
        assert_eq!(clamped_score_field(&map, "text", 6.5, 0.0, 10.0), 7.5);
        assert_eq!(clamped_score_field(&map, "missing", 6.5, 0.0, 10.0), 6.5);
    }

    #[test]
    fn test_string_list_field_stringifies_mixed_elements() {
        let map = json!({"issues": ["low power", 3]});
        let Value::Object(map) = map else { unreachable!() };

        let items = string_list_field(&map, "issues", &["fallback"]);
        assert_eq!(items, vec!["low power".to_string(), "3".to_string()]);
    }
}
