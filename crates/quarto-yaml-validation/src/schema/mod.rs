//! Quarto's schema dialect
//!
//! JSON Schema plus a handful of editor extensions (`closed` objects,
//! `completions`, `hidden`, `tags`), held as one closed enum that
//! navigation, completions and validation all match over.

mod annotations;
mod helpers;
mod parser;
mod parsers;
mod registry;
mod types;
mod walk;

pub(crate) use helpers::scalar_text;
pub use registry::SchemaRegistry;
pub use types::{
    ArraySchema, ChoiceSchema, EnumSchema, NumberSchema, ObjectSchema, PlainSchema, RefSchema,
    SchemaAnnotations, StringSchema,
};
pub use walk::{schema_accepts, walk_schema};

use crate::error::SchemaResult;
use annotations::EMPTY_ANNOTATIONS;

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// Rejects every value
    False,
    /// Accepts every value
    True,
    Boolean(PlainSchema),
    Number(NumberSchema),
    String(StringSchema),
    Null(PlainSchema),
    Enum(EnumSchema),
    Any(PlainSchema),
    AnyOf(ChoiceSchema),
    OneOf(ChoiceSchema),
    AllOf(ChoiceSchema),
    Array(ArraySchema),
    Object(ObjectSchema),
    Ref(RefSchema),
}

impl Schema {
    /// Read a schema in either plain JSON Schema or Quarto's compiled form
    pub fn from_json(value: &serde_json::Value) -> SchemaResult<Schema> {
        parser::from_json(value)
    }

    pub fn annotations(&self) -> &SchemaAnnotations {
        match self {
            Schema::False | Schema::True => &EMPTY_ANNOTATIONS,
            Schema::Boolean(s) | Schema::Null(s) | Schema::Any(s) => &s.annotations,
            Schema::AnyOf(s) | Schema::OneOf(s) | Schema::AllOf(s) => &s.annotations,
            Schema::Number(s) => &s.annotations,
            Schema::String(s) => &s.annotations,
            Schema::Enum(s) => &s.annotations,
            Schema::Array(s) => &s.annotations,
            Schema::Object(s) => &s.annotations,
            Schema::Ref(s) => &s.annotations,
        }
    }

    /// `None` for the boolean schemas, which have nowhere to keep annotations
    pub fn annotations_mut(&mut self) -> Option<&mut SchemaAnnotations> {
        let annotations = match self {
            Schema::False | Schema::True => return None,
            Schema::Boolean(s) | Schema::Null(s) | Schema::Any(s) => &mut s.annotations,
            Schema::AnyOf(s) | Schema::OneOf(s) | Schema::AllOf(s) => &mut s.annotations,
            Schema::Number(s) => &mut s.annotations,
            Schema::String(s) => &mut s.annotations,
            Schema::Enum(s) => &mut s.annotations,
            Schema::Array(s) => &mut s.annotations,
            Schema::Object(s) => &mut s.annotations,
            Schema::Ref(s) => &mut s.annotations,
        };
        Some(annotations)
    }

    /// The name used for this kind in compiled schemas
    pub fn type_name(&self) -> &'static str {
        match self {
            Schema::False => "false",
            Schema::True => "true",
            Schema::Boolean(_) => "boolean",
            Schema::Number(s) if s.integer => "integer",
            Schema::Number(_) => "number",
            Schema::String(_) => "string",
            Schema::Null(_) => "null",
            Schema::Enum(_) => "enum",
            Schema::Any(_) => "any",
            Schema::AnyOf(_) => "anyOf",
            Schema::OneOf(_) => "oneOf",
            Schema::AllOf(_) => "allOf",
            Schema::Array(_) => "array",
            Schema::Object(_) => "object",
            Schema::Ref(_) => "ref",
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.annotations().id.as_deref()
    }

    pub fn is_hidden(&self) -> bool {
        self.annotations().is_hidden()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_annotations_parsed_on_every_kind() {
        let schema = Schema::from_json(&json!({
            "type": "boolean",
            "$id": "toc",
            "hidden": true,
            "documentation": {"short": "Include a table of contents"},
            "tags": {"execute-only": true},
        }))
        .unwrap();
        assert_eq!(schema.type_name(), "boolean");
        assert_eq!(schema.id(), Some("toc"));
        assert!(schema.is_hidden());
        assert_eq!(
            schema.annotations().documentation.as_deref(),
            Some("Include a table of contents")
        );
        assert_eq!(
            schema.annotations().tag("execute-only"),
            Some(&json!(true))
        );
    }

    #[test]
    fn test_true_false_have_no_annotations() {
        let mut schema = Schema::True;
        assert!(schema.annotations().description.is_none());
        assert!(schema.annotations_mut().is_none());
    }
}
