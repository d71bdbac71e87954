//! Tolerant field access over extracted payloads.
//!
//! Models rarely agree on shapes: a list may come back as a comma separated
//! string, a count as `"5"`. These getters accept the common variants and
//! treat empty values as missing.

use projcraft_runtime::Structured;
use serde_json::Value;

/// First non-empty string under any of `keys`
pub(crate) fn string(map: &Structured, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First non-empty list of strings under any of `keys`
pub(crate) fn string_list(map: &Structured, keys: &[&str]) -> Option<Vec<String>> {
    keys.iter().find_map(|key| map.get(*key).and_then(as_string_list))
}

pub(crate) fn as_string_list(value: &Value) -> Option<Vec<String>> {
    let items: Vec<String> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                // {"name": "..."} shaped entries
                Value::Object(obj) => obj
                    .get("name")
                    .or_else(|| obj.get("feature"))
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => return None,
    };
    (!items.is_empty()).then_some(items)
}

/// Non-negative integer, from a number or a numeric string
pub(crate) fn count(map: &Structured, keys: &[&str]) -> Option<u32> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Whether any of `keys` is present at all
pub(crate) fn has_any(map: &Structured, keys: &[&str]) -> bool {
    keys.iter().any(|key| map.contains_key(*key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Structured {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_string_skips_blank() {
        let m = map(json!({"a": "  ", "b": "name", "n": 3}));
        assert_eq!(string(&m, &["a", "b"]).as_deref(), Some("name"));
        assert_eq!(string(&m, &["n"]).as_deref(), Some("3"));
        assert_eq!(string(&m, &["missing"]), None);
    }

    #[test]
    fn test_string_list_shapes() {
        let m = map(json!({
            "arr": ["x", "", "y"],
            "csv": "flask, sqlite ,",
            "objs": [{"name": "Login"}, {"other": 1}],
            "empty": [],
        }));
        assert_eq!(string_list(&m, &["arr"]).unwrap(), vec!["x", "y"]);
        assert_eq!(string_list(&m, &["csv"]).unwrap(), vec!["flask", "sqlite"]);
        assert_eq!(string_list(&m, &["objs"]).unwrap(), vec!["Login"]);
        assert_eq!(string_list(&m, &["empty"]), None);
        assert_eq!(string_list(&m, &["empty", "arr"]).unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn test_count() {
        let m = map(json!({"a": 4, "b": " 7 ", "c": -1, "d": "many"}));
        assert_eq!(count(&m, &["a"]), Some(4));
        assert_eq!(count(&m, &["b"]), Some(7));
        assert_eq!(count(&m, &["c"]), None);
        assert_eq!(count(&m, &["d"]), None);
    }
}
