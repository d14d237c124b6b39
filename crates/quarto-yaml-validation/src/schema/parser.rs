//! Schema loading from JSON
//!
//! Two input shapes are accepted and may be mixed freely:
//!
//! - plain JSON Schema (`{"type": "object", "properties": ...}`,
//!   `{"anyOf": [...]}`, `{"$ref": "..."}`)
//! - Quarto's compiled editor schemas, which spell combinators as types
//!   (`{"type": "anyOf", "anyOf": [...]}`, `{"type": "ref", "$ref": ...}`,
//!   `{"type": "enum", "enum": [...]}`) and use `closed` objects

use crate::error::{SchemaError, SchemaResult};
use serde_json::Value;

use super::Schema;
use super::annotations::{ANNOTATION_KEYS, parse_annotations};
use super::helpers::JsonObject;
use super::parsers::{
    parse_allof_schema, parse_any_schema, parse_anyof_schema, parse_array_schema,
    parse_boolean_schema, parse_enum_schema, parse_null_schema, parse_number_schema,
    parse_object_schema, parse_oneof_schema, parse_ref_schema, parse_string_schema,
};
use super::types::ChoiceSchema;

/// Load a schema from its JSON form
pub fn from_json(value: &Value) -> SchemaResult<Schema> {
    match value {
        Value::Bool(true) => Ok(Schema::True),
        Value::Bool(false) => Ok(Schema::False),
        Value::String(name) => from_type_name(name, &JsonObject::new()),
        Value::Object(obj) => from_object(obj),
        other => Err(SchemaError::InvalidStructure(format!(
            "Expected a schema object, boolean or type name, got {}",
            other
        ))),
    }
}

fn from_object(obj: &JsonObject) -> SchemaResult<Schema> {
    match obj.get("type") {
        Some(Value::String(name)) => from_type_name(name, obj),
        Some(Value::Array(names)) => from_type_list(names, obj),
        Some(other) => Err(SchemaError::InvalidStructure(format!(
            "Field 'type' must be a string or a list of strings, got {}",
            other
        ))),
        None => infer_type(obj),
    }
}

/// Dispatch on an explicit type name
fn from_type_name(name: &str, obj: &JsonObject) -> SchemaResult<Schema> {
    match name {
        "boolean" => parse_boolean_schema(obj),
        "number" => parse_number_schema(obj, false),
        "integer" => parse_number_schema(obj, true),
        "string" => parse_string_schema(obj),
        "null" => parse_null_schema(obj),
        "any" => parse_any_schema(obj),
        "object" => parse_object_schema(obj),
        "array" => parse_array_schema(obj),
        "enum" => parse_enum_schema(obj),
        "anyOf" => parse_anyof_schema(obj),
        "oneOf" => parse_oneof_schema(obj),
        "allOf" => parse_allof_schema(obj),
        "ref" => parse_ref_schema(obj),
        "true" => Ok(Schema::True),
        "false" => Ok(Schema::False),
        other => Err(SchemaError::InvalidType(other.to_string())),
    }
}

/// `"type": ["string", "null"]` becomes an anyOf over each named type.
///
/// Annotations stay on the anyOf; the constraints are copied to each branch.
fn from_type_list(names: &[Value], obj: &JsonObject) -> SchemaResult<Schema> {
    let annotations = parse_annotations(obj)?;
    let mut constraints = obj.clone();
    for key in ANNOTATION_KEYS {
        constraints.remove(*key);
    }

    let schemas = names
        .iter()
        .map(|name| match name {
            Value::String(name) => from_type_name(name, &constraints),
            other => Err(SchemaError::InvalidStructure(format!(
                "Type list entries must be strings, got {}",
                other
            ))),
        })
        .collect::<SchemaResult<Vec<_>>>()?;

    Ok(Schema::AnyOf(ChoiceSchema {
        annotations,
        schemas,
    }))
}

/// Plain JSON Schema often omits `type`; guess it from the keywords present
fn infer_type(obj: &JsonObject) -> SchemaResult<Schema> {
    const OBJECT_KEYWORDS: &[&str] = &[
        "properties",
        "patternProperties",
        "additionalProperties",
        "required",
        "propertyNames",
        "closed",
    ];

    if obj.contains_key("$ref") {
        parse_ref_schema(obj)
    } else if obj.contains_key("anyOf") {
        parse_anyof_schema(obj)
    } else if obj.contains_key("oneOf") {
        parse_oneof_schema(obj)
    } else if obj.contains_key("allOf") {
        parse_allof_schema(obj)
    } else if obj.contains_key("enum") {
        parse_enum_schema(obj)
    } else if OBJECT_KEYWORDS.iter().any(|k| obj.contains_key(*k)) {
        parse_object_schema(obj)
    } else if obj.contains_key("items") {
        parse_array_schema(obj)
    } else {
        parse_any_schema(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_name_shorthand() {
        assert!(matches!(from_json(&json!("string")), Ok(Schema::String(_))));
        assert!(matches!(from_json(&json!(true)), Ok(Schema::True)));
        assert_eq!(
            from_json(&json!("strin")),
            Err(SchemaError::InvalidType("strin".into()))
        );
    }

    #[test]
    fn test_type_list_becomes_anyof() {
        let schema = from_json(&json!({
            "type": ["string", "null"],
            "description": "A title",
        }))
        .unwrap();
        match schema {
            Schema::AnyOf(s) => {
                assert_eq!(s.schemas.len(), 2);
                assert_eq!(s.annotations.description.as_deref(), Some("A title"));
                assert!(s.schemas[0].annotations().description.is_none());
            }
            other => panic!("expected anyOf, got {:?}", other),
        }
    }

    #[test]
    fn test_inferred_types() {
        assert!(matches!(
            from_json(&json!({"properties": {}})),
            Ok(Schema::Object(_))
        ));
        assert!(matches!(
            from_json(&json!({"items": "string"})),
            Ok(Schema::Array(_))
        ));
        assert!(matches!(from_json(&json!({"$ref": "x"})), Ok(Schema::Ref(_))));
        assert!(matches!(from_json(&json!({})), Ok(Schema::Any(_))));
    }

    #[test]
    fn test_rejects_numbers() {
        assert!(from_json(&json!(3)).is_err());
    }
}
