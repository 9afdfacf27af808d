//! JSON value helpers shared by the resolver, the store and the script engine.
//!
//! All application data crossing the core is plain `serde_json::Value`. Paths
//! use dot notation with optional bracket indices (`content.items[0].label`);
//! a purely numeric segment also indexes into arrays (`items.0.label`).

use serde_json::{Map, Value};

/// Largest number of padding slots a single indexed write may append.
pub const MAX_INDEX_GROWTH: usize = 10_000;

/// One step of a property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key.
    Key(String),
    /// Array index.
    Index(usize),
}

/// Split a dotted path into segments. Empty segments are dropped.
pub fn parse_path(path: &str) -> Vec<PathSegment> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    let mut segments = Vec::new();

    for part in path.split('.') {
        let mut rest = part;
        // Leading key before any bracket
        let key_end = rest.find('[').unwrap_or(rest.len());
        let key = &rest[..key_end];
        if !key.is_empty() {
            segments.push(PathSegment::Key(key.to_string()));
        }
        rest = &rest[key_end..];

        while let Some(inner) = rest.strip_prefix('[') {
            let Some(close) = inner.find(']') else {
                break;
            };
            let token = inner[..close].trim_matches(|c| c == '"' || c == '\'');
            match token.parse::<usize>() {
                Ok(idx) => segments.push(PathSegment::Index(idx)),
                Err(_) if !token.is_empty() => segments.push(PathSegment::Key(token.to_string())),
                Err(_) => {}
            }
            rest = &inner[close + 1..];
        }
    }

    segments
}

fn step<'a>(current: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (current, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get(key),
        (Value::Object(map), PathSegment::Index(idx)) => map.get(&idx.to_string()),
        (Value::Array(items), PathSegment::Index(idx)) => items.get(*idx),
        (Value::Array(items), PathSegment::Key(key)) => {
            key.parse::<usize>().ok().and_then(|idx| items.get(idx))
        }
        _ => None,
    }
}

/// Null-safe nested read. A missing step yields `None`, never a fault.
pub fn get_nested_value<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    get_by_segments(root, &parse_path(path))
}

/// Nested read over pre-split segments.
pub fn get_by_segments<'a>(root: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        current = step(current, segment)?;
    }
    Some(current)
}

/// Copy-on-write nested write: returns a new value with `path` set.
///
/// Missing intermediate containers are created; the input is left untouched.
pub fn set_nested_value(root: &Value, path: &str, value: Value) -> Value {
    let mut copy = root.clone();
    set_in_place(&mut copy, &parse_path(path), value);
    copy
}

/// In-place nested write over pre-split segments.
pub fn set_in_place(root: &mut Value, segments: &[PathSegment], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *root = value;
        return;
    };

    match first {
        PathSegment::Index(idx) => {
            if !root.is_array() {
                *root = Value::Array(Vec::new());
            }
            if let Value::Array(items) = root {
                if *idx > items.len() + MAX_INDEX_GROWTH {
                    return;
                }
                if items.len() <= *idx {
                    items.resize(*idx + 1, Value::Null);
                }
                set_in_place(&mut items[*idx], rest, value);
            }
        }
        PathSegment::Key(key) => {
            if let Value::Array(items) = root {
                if let Ok(idx) = key.parse::<usize>() {
                    if idx < items.len() {
                        set_in_place(&mut items[idx], rest, value);
                        return;
                    }
                }
            }
            if !root.is_object() {
                *root = Value::Object(Map::new());
            }
            if let Value::Object(map) = root {
                let slot = map.entry(key.clone()).or_insert(Value::Null);
                set_in_place(slot, rest, value);
            }
        }
    }
}

/// Build a sparse patch object `{a: {b: value}}` for path `a.b`.
pub fn build_patch(path: &str, value: Value) -> Value {
    let mut patch = Value::Object(Map::new());
    set_in_place(&mut patch, &parse_path(path), value);
    patch
}

/// Recursively merge `patch` into `target`. Objects merge key-wise,
/// everything else is replaced.
pub fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(dest), Value::Object(src)) => {
            for (key, value) in src {
                match dest.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value);
                    }
                    _ => {
                        dest.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// Convert to f64 if the value is a number or a numeric string.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Build a JSON number, preferring an integer representation when exact.
pub fn number(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Truthiness in the scripting sense.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Emptiness: null, empty string (after trim), empty array or object.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

/// Render a value for display or string concatenation.
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e16 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(to_display_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Numeric-aware equality: numbers compare by value regardless of
/// integer/float representation.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_path_handles_brackets() {
        assert_eq!(
            parse_path("items[2].label"),
            vec![
                PathSegment::Key("items".into()),
                PathSegment::Index(2),
                PathSegment::Key("label".into()),
            ]
        );
        assert_eq!(parse_path(""), Vec::<PathSegment>::new());
    }

    #[test]
    fn get_nested_value_reads_paths() {
        let v = json!({"content": {"items": [{"label": "a"}, {"label": "b"}]}});
        assert_eq!(
            get_nested_value(&v, "content.items[1].label"),
            Some(&json!("b"))
        );
        assert_eq!(
            get_nested_value(&v, "content.items.0.label"),
            Some(&json!("a"))
        );
        assert_eq!(get_nested_value(&v, "content.missing.deep"), None);
        assert_eq!(get_nested_value(&json!(null), "a"), None);
    }

    #[test]
    fn set_nested_value_is_copy_on_write() {
        let original = json!({"a": {"b": 1, "c": 2}});
        let updated = set_nested_value(&original, "a.b", json!(5));

        assert_eq!(original, json!({"a": {"b": 1, "c": 2}}));
        assert_eq!(updated, json!({"a": {"b": 5, "c": 2}}));
    }

    #[test]
    fn set_nested_value_creates_containers() {
        let updated = set_nested_value(&json!({}), "a.list[1]", json!("x"));
        assert_eq!(updated, json!({"a": {"list": [null, "x"]}}));
    }

    #[test]
    fn deep_merge_only_touches_patched_keys() {
        let mut element = json!({"content": {"text": "old", "color": "red"}, "visible": true});
        deep_merge(&mut element, &build_patch("content.text", json!("Hi")));
        assert_eq!(
            element,
            json!({"content": {"text": "Hi", "color": "red"}, "visible": true})
        );
    }

    #[test]
    fn coercions() {
        assert_eq!(as_f64(&json!("15")), Some(15.0));
        assert_eq!(as_f64(&json!("abc")), None);
        assert_eq!(number(3.0), json!(3));
        assert_eq!(number(2.5), json!(2.5));
        assert!(is_truthy(&json!("x")));
        assert!(!is_truthy(&json!(0)));
        assert!(is_empty_value(Some(&json!("  "))));
        assert_eq!(to_display_string(&json!(4.0)), "4");
        assert!(values_equal(&json!(1), &json!(1.0)));
    }
}
