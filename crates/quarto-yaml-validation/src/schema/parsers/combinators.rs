//! Combinator schema parsers: anyOf, oneOf and allOf
//!
//! The branches live under the key named after the combinator, in both the
//! plain (`{"anyOf": [...]}`) and compiled (`{"type": "anyOf", "anyOf": [...]}`)
//! forms.

use crate::error::{SchemaError, SchemaResult};

use crate::schema::Schema;
use crate::schema::annotations::parse_annotations;
use crate::schema::helpers::{JsonObject, get_array};
use crate::schema::parser::from_json;
use crate::schema::types::ChoiceSchema;

fn parse_branches(obj: &JsonObject, key: &str) -> SchemaResult<Vec<Schema>> {
    let items = get_array(obj, key)?
        .ok_or_else(|| SchemaError::InvalidStructure(format!("{} requires a list of schemas", key)))?;
    items.iter().map(from_json).collect()
}

pub(in crate::schema) fn parse_anyof_schema(obj: &JsonObject) -> SchemaResult<Schema> {
    Ok(Schema::AnyOf(ChoiceSchema {
        annotations: parse_annotations(obj)?,
        schemas: parse_branches(obj, "anyOf")?,
    }))
}

pub(in crate::schema) fn parse_oneof_schema(obj: &JsonObject) -> SchemaResult<Schema> {
    Ok(Schema::OneOf(ChoiceSchema {
        annotations: parse_annotations(obj)?,
        schemas: parse_branches(obj, "oneOf")?,
    }))
}

pub(in crate::schema) fn parse_allof_schema(obj: &JsonObject) -> SchemaResult<Schema> {
    Ok(Schema::AllOf(ChoiceSchema {
        annotations: parse_annotations(obj)?,
        schemas: parse_branches(obj, "allOf")?,
    }))
}

#[cfg(test)]
mod tests {
    use crate::error::SchemaError;
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_compiled_anyof() {
        let schema = Schema::from_json(&json!({
            "type": "anyOf",
            "anyOf": ["string", {"type": "boolean"}],
            "description": "Either string or boolean",
        }))
        .unwrap();
        match schema {
            Schema::AnyOf(s) => {
                assert_eq!(s.schemas.len(), 2);
                assert_eq!(
                    s.annotations.description.as_deref(),
                    Some("Either string or boolean")
                );
            }
            other => panic!("expected anyOf, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_oneof() {
        let schema = Schema::from_json(&json!({"oneOf": [{"type": "number"}, true]})).unwrap();
        match schema {
            Schema::OneOf(s) => assert_eq!(s.schemas, vec![s.schemas[0].clone(), Schema::True]),
            other => panic!("expected oneOf, got {:?}", other),
        }
    }

    #[test]
    fn test_allof_requires_list() {
        assert!(matches!(
            Schema::from_json(&json!({"type": "allOf", "allOf": "string"})),
            Err(SchemaError::InvalidStructure(_))
        ));
    }
}
