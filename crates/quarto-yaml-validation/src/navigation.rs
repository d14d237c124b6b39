//! Schema navigation along an instance path
//!
//! Given a path such as `["format", "html"]`, find every subschema that
//! could describe the value at that path.

use regex::Regex;

use crate::error::{PathSegment, SchemaError, SchemaResult};
use crate::schema::{Schema, SchemaRegistry};

/// Collect the schemas reachable from `schema` along `path`.
///
/// `$id`s are registered as they are passed so that references within the
/// same document resolve. When the last segment names no property, it is
/// treated as a prefix being typed, and the enclosing object is returned
/// if any property starts with it. Objects are entered only by key and
/// arrays only by index.
///
/// `anyOf` branches are all followed and their results flattened. A
/// `oneOf` contributes only when exactly one branch matches. Navigating
/// through `allOf` is an error.
pub fn navigate_schema<'a>(
    schema: &'a Schema,
    path: &[PathSegment],
    registry: &mut SchemaRegistry<'a>,
) -> SchemaResult<Vec<&'a Schema>> {
    navigate_from(schema, path, 0, registry)
}

fn navigate_from<'a>(
    schema: &'a Schema,
    path: &[PathSegment],
    index: usize,
    registry: &mut SchemaRegistry<'a>,
) -> SchemaResult<Vec<&'a Schema>> {
    registry.register(schema);
    let schema = registry.resolve(schema)?;
    registry.register(schema);

    if index == path.len() {
        return Ok(vec![schema]);
    }

    match schema {
        Schema::Object(o) => {
            let key = match &path[index] {
                PathSegment::Key(key) => key,
                PathSegment::Index(_) => return Ok(Vec::new()),
            };
            if let Some(property) = o.properties.get(key) {
                return navigate_from(property, path, index + 1, registry);
            }
            let mut patterns: Vec<(&String, &Schema)> = o.pattern_properties.iter().collect();
            patterns.sort_by(|a, b| a.0.cmp(b.0));
            for (pattern, property) in patterns {
                let re = Regex::new(pattern).map_err(|e| SchemaError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
                if re.is_match(key) {
                    return navigate_from(property, path, index + 1, registry);
                }
            }
            if index == path.len() - 1 && o.properties.keys().any(|k| k.starts_with(key.as_str())) {
                return Ok(vec![schema]);
            }
            Ok(Vec::new())
        }
        Schema::Array(a) => match (&a.items, &path[index]) {
            (Some(items), PathSegment::Index(_)) => {
                navigate_from(items, path, index + 1, registry)
            }
            _ => Ok(Vec::new()),
        },
        Schema::AnyOf(s) => {
            let mut result = Vec::new();
            for branch in &s.schemas {
                result.extend(navigate_from(branch, path, index, registry)?);
            }
            Ok(result)
        }
        Schema::OneOf(s) => {
            let mut matches = Vec::new();
            for branch in &s.schemas {
                let found = navigate_from(branch, path, index, registry)?;
                if !found.is_empty() {
                    matches.push(found);
                }
            }
            if matches.len() == 1 {
                Ok(matches.swap_remove(0))
            } else {
                tracing::debug!(
                    matching = matches.len(),
                    "oneOf navigation is not exclusive, no schema selected"
                );
                Ok(Vec::new())
            }
        }
        Schema::AllOf(_) => Err(SchemaError::AllOfUnsupported),
        Schema::False
        | Schema::True
        | Schema::Boolean(_)
        | Schema::Number(_)
        | Schema::String(_)
        | Schema::Null(_)
        | Schema::Enum(_)
        | Schema::Any(_)
        | Schema::Ref(_) => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> Vec<PathSegment> {
        segments.iter().map(|s| PathSegment::from(*s)).collect()
    }

    #[test]
    fn test_empty_path_returns_root() {
        let schema = Schema::from_json(&json!({"type": "string"})).unwrap();
        let mut registry = SchemaRegistry::new();
        let found = navigate_schema(&schema, &[], &mut registry).unwrap();
        assert_eq!(found, vec![&schema]);
    }

    #[test]
    fn test_pattern_properties_after_properties() {
        let schema = Schema::from_json(&json!({
            "type": "object",
            "properties": {"x-fixed": "boolean"},
            "patternProperties": {"^x-": "string"},
        }))
        .unwrap();
        let mut registry = SchemaRegistry::new();
        let found = navigate_schema(&schema, &path(&["x-fixed"]), &mut registry).unwrap();
        assert_eq!(found[0].type_name(), "boolean");
        let found = navigate_schema(&schema, &path(&["x-other"]), &mut registry).unwrap();
        assert_eq!(found[0].type_name(), "string");
    }

    #[test]
    fn test_array_index_descends_into_items() {
        let schema = Schema::from_json(&json!({
            "type": "array",
            "items": {"type": "object", "properties": {"name": "string"}},
        }))
        .unwrap();
        let mut registry = SchemaRegistry::new();
        let segments = vec![PathSegment::Index(3), PathSegment::from("name")];
        let found = navigate_schema(&schema, &segments, &mut registry).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].type_name(), "string");
    }

    #[test]
    fn test_segment_kind_must_match_container() {
        let schema = Schema::from_json(&json!({
            "type": "object",
            "properties": {
                "0": "string",
                "tags": {"type": "array", "items": "string"},
            },
        }))
        .unwrap();
        let mut registry = SchemaRegistry::new();

        // an index never names an object property, even a numeric one
        let segments = vec![PathSegment::Index(0)];
        let found = navigate_schema(&schema, &segments, &mut registry).unwrap();
        assert!(found.is_empty());
        let found = navigate_schema(&schema, &path(&["0"]), &mut registry).unwrap();
        assert_eq!(found[0].type_name(), "string");

        let found = navigate_schema(&schema, &path(&["tags", "first"]), &mut registry).unwrap();
        assert!(found.is_empty());
        let segments = vec![PathSegment::from("tags"), PathSegment::Index(0)];
        let found = navigate_schema(&schema, &segments, &mut registry).unwrap();
        assert_eq!(found[0].type_name(), "string");
    }

    #[test]
    fn test_scalar_schema_cannot_be_entered() {
        let schema = Schema::from_json(&json!({"type": "string"})).unwrap();
        let mut registry = SchemaRegistry::new();
        let found = navigate_schema(&schema, &path(&["a"]), &mut registry).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let schema = Schema::from_json(&json!({
            "type": "object",
            "patternProperties": {"(": "string"},
        }))
        .unwrap();
        let mut registry = SchemaRegistry::new();
        assert!(matches!(
            navigate_schema(&schema, &path(&["a"]), &mut registry),
            Err(SchemaError::InvalidPattern { .. })
        ));
    }
}
