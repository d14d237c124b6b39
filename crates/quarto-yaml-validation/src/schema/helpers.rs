//! Helper functions for reading fields out of JSON schema objects
//!
//! All getters return `Ok(None)` when the field is absent and an
//! `InvalidStructure` error when it is present with the wrong shape.

use crate::error::{SchemaError, SchemaResult};
use serde_json::{Map, Value};
use std::collections::HashMap;

pub(super) type JsonObject = Map<String, Value>;

fn wrong_shape(key: &str, expected: &str) -> SchemaError {
    SchemaError::InvalidStructure(format!("Field '{}' must be {}", key, expected))
}

/// Get a string value from an object by key
pub(super) fn get_string(obj: &JsonObject, key: &str) -> SchemaResult<Option<String>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(wrong_shape(key, "a string")),
    }
}

/// Get documentation-like text: either a string or `{short, long}`.
///
/// The short form wins when both are present.
pub(super) fn get_doc_string(obj: &JsonObject, key: &str) -> SchemaResult<Option<String>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Object(doc)) => {
            let short = get_string(doc, "short")?;
            match short {
                Some(s) => Ok(Some(s)),
                None => get_string(doc, "long"),
            }
        }
        Some(_) => Err(wrong_shape(key, "a string or {short, long}")),
    }
}

/// Get a number value from an object by key
pub(super) fn get_number(obj: &JsonObject, key: &str) -> SchemaResult<Option<f64>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| wrong_shape(key, "a finite number")),
        Some(_) => Err(wrong_shape(key, "a number")),
    }
}

/// Get a usize value from an object by key
pub(super) fn get_usize(obj: &JsonObject, key: &str) -> SchemaResult<Option<usize>> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| wrong_shape(key, "a non-negative integer")),
    }
}

/// Get a boolean value from an object by key
pub(super) fn get_bool(obj: &JsonObject, key: &str) -> SchemaResult<Option<bool>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(wrong_shape(key, "a boolean")),
    }
}

/// Get a list of completion-style strings.
///
/// Scalars other than strings are rendered as their JSON text, so
/// `[true, false]` reads as `["true", "false"]`.
pub(super) fn get_string_array(obj: &JsonObject, key: &str) -> SchemaResult<Option<Vec<String>>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| scalar_text(item).ok_or_else(|| wrong_shape(key, "a list of scalars")))
            .collect::<SchemaResult<Vec<_>>>()
            .map(Some),
        Some(_) => Err(wrong_shape(key, "an array")),
    }
}

/// Get the `tags` object as a map
pub(super) fn get_tags(obj: &JsonObject) -> SchemaResult<Option<HashMap<String, Value>>> {
    match obj.get("tags") {
        None => Ok(None),
        Some(Value::Object(tags)) => Ok(Some(
            tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        )),
        Some(_) => Err(wrong_shape("tags", "an object")),
    }
}

/// Get an array field
pub(super) fn get_array<'a>(obj: &'a JsonObject, key: &str) -> SchemaResult<Option<&'a Vec<Value>>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(wrong_shape(key, "an array")),
    }
}

/// Get an object field
pub(super) fn get_object<'a>(obj: &'a JsonObject, key: &str) -> SchemaResult<Option<&'a JsonObject>> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(wrong_shape(key, "an object")),
    }
}

/// Text of a scalar JSON value, as offered in completions
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Null => Some(value.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
