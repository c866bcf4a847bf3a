//! JSON helpers shared by type options and record details
//!
//! `deep_merge` folds one value onto another: objects merge key by key,
//! arrays merge index by index, anything else is replaced by the source.
//! Paths are dot-separated (`address.city`).

use serde_json::{Map, Value};

/// Merge `source` onto `target`, recursively
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => merge_maps(target, source),
        (Value::Array(target), Value::Array(source)) => {
            for (i, item) in source.iter().enumerate() {
                match target.get_mut(i) {
                    Some(slot) => deep_merge(slot, item),
                    None => target.push(item.clone()),
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// Merge every key of `source` onto `target`, recursively
pub fn merge_maps(target: &mut Map<String, Value>, source: &Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(key) {
            Some(slot) => deep_merge(slot, value),
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Read a dot-separated path
///
/// Array segments are addressed by index (`items.0.name`).
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Read a dot-separated path starting from a map
pub fn get_map_path<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    match path.split_once('.') {
        Some((head, rest)) => map.get(head).and_then(|v| get_path(v, rest)),
        None => map.get(path),
    }
}

/// Write a dot-separated path, creating intermediate objects
///
/// Non-object intermediates are replaced by objects.
pub fn set_path(map: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = map;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(next) => next,
            _ => return,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_merge_nested_objects() {
        let mut target = json!({"a": {"x": 1, "y": 2}, "b": "keep"});
        deep_merge(&mut target, &json!({"a": {"y": 3, "z": 4}}));
        assert_eq!(target, json!({"a": {"x": 1, "y": 3, "z": 4}, "b": "keep"}));
    }

    #[test]
    fn test_deep_merge_scalar_replaces() {
        let mut target = json!({"a": {"x": 1}});
        deep_merge(&mut target, &json!({"a": 5}));
        assert_eq!(target, json!({"a": 5}));
    }

    #[test]
    fn test_deep_merge_arrays_by_index() {
        let mut target = json!([1, {"a": 1}]);
        deep_merge(&mut target, &json!([9, {"b": 2}, 3]));
        assert_eq!(target, json!([9, {"a": 1, "b": 2}, 3]));
    }

    #[test]
    fn test_get_path() {
        let value = json!({"address": {"city": "London"}, "tags": ["a", "b"]});
        assert_eq!(get_path(&value, "address.city"), Some(&json!("London")));
        assert_eq!(get_path(&value, "tags.1"), Some(&json!("b")));
        assert!(get_path(&value, "address.zip").is_none());
        assert!(get_path(&value, "address.city.name").is_none());
    }

    #[test]
    fn test_get_map_path() {
        let value = json!({"address": {"city": "London"}, "minutes": 15});
        let map = value.as_object().unwrap();
        assert_eq!(get_map_path(map, "address.city"), Some(&json!("London")));
        assert_eq!(get_map_path(map, "minutes"), Some(&json!(15)));
        assert!(get_map_path(map, "address.zip").is_none());
    }

    #[test]
    fn test_set_path_creates_intermediates() {
        let mut map = Map::new();
        set_path(&mut map, "geo.population", json!(2873000));
        set_path(&mut map, "name", json!("Barcelona"));
        assert_eq!(
            Value::Object(map),
            json!({"geo": {"population": 2873000}, "name": "Barcelona"})
        );
    }
}
