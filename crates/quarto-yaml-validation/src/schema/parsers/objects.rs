//! Object schema parser
//!
//! Objects can have:
//! - properties / patternProperties: Schemas for named or matching keys
//! - additionalProperties: Schema (or `false`) for all other keys
//! - required, minProperties, maxProperties
//! - propertyNames: Schema every key must satisfy
//! - closed: Quarto's spelling of `additionalProperties: false`

use crate::error::{SchemaError, SchemaResult};
use serde_json::Value;
use std::collections::HashMap;

use crate::schema::Schema;
use crate::schema::annotations::parse_annotations;
use crate::schema::helpers::{JsonObject, get_array, get_bool, get_object, get_usize};
use crate::schema::parser::from_json;
use crate::schema::types::ObjectSchema;

fn parse_schema_map(obj: &JsonObject, key: &str) -> SchemaResult<HashMap<String, Schema>> {
    let Some(map) = get_object(obj, key)? else {
        return Ok(HashMap::new());
    };
    map.iter()
        .map(|(name, schema)| Ok((name.clone(), from_json(schema)?)))
        .collect()
}

fn parse_optional_schema(obj: &JsonObject, key: &str) -> SchemaResult<Option<Box<Schema>>> {
    obj.get(key)
        .map(|value| from_json(value).map(Box::new))
        .transpose()
}

pub(in crate::schema) fn parse_object_schema(obj: &JsonObject) -> SchemaResult<Schema> {
    let required = match get_array(obj, "required")? {
        Some(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(SchemaError::InvalidStructure(format!(
                    "required entries must be strings, got {}",
                    other
                ))),
            })
            .collect::<SchemaResult<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(Schema::Object(ObjectSchema {
        annotations: parse_annotations(obj)?,
        properties: parse_schema_map(obj, "properties")?,
        pattern_properties: parse_schema_map(obj, "patternProperties")?,
        additional_properties: parse_optional_schema(obj, "additionalProperties")?,
        required,
        min_properties: get_usize(obj, "minProperties")?,
        max_properties: get_usize(obj, "maxProperties")?,
        closed: get_bool(obj, "closed")?.unwrap_or(false),
        property_names: parse_optional_schema(obj, "propertyNames")?,
    }))
}

#[cfg(test)]
mod tests {
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_object_fields() {
        let schema = Schema::from_json(&json!({
            "type": "object",
            "properties": {"title": "string", "toc": {"type": "boolean"}},
            "patternProperties": {"^x-": "any"},
            "required": ["title"],
            "closed": true,
        }))
        .unwrap();
        match schema {
            Schema::Object(o) => {
                assert_eq!(o.properties.len(), 2);
                assert!(matches!(o.properties.get("toc"), Some(Schema::Boolean(_))));
                assert!(o.pattern_properties.contains_key("^x-"));
                assert_eq!(o.required, vec!["title".to_string()]);
                assert!(o.closed);
                assert!(o.rejects_additional());
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_additional_properties_false_rejects() {
        let schema = Schema::from_json(&json!({
            "type": "object",
            "additionalProperties": false,
        }))
        .unwrap();
        match schema {
            Schema::Object(o) => {
                assert!(!o.closed);
                assert!(o.rejects_additional());
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_required_must_be_strings() {
        assert!(Schema::from_json(&json!({"type": "object", "required": [1]})).is_err());
    }
}
