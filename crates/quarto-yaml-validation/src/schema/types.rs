//! The payloads carried by each [`Schema`] variant

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Schema;

/// Editor-facing metadata shared by every schema kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaAnnotations {
    /// Name under which other schemas `$ref` this one
    #[serde(rename = "$id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// One-line summary; also replaces the "expected" part of validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,

    #[serde(rename = "errorMessage", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Hidden keys still validate but never appear in completion lists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,

    /// Replaces the values completions would otherwise derive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completions: Option<Vec<String>>,

    #[serde(
        rename = "additionalCompletions",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_completions: Option<Vec<String>>,

    /// `execute-only`, `engine`, `formats`, `description` and friends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, serde_json::Value>>,
}

impl SchemaAnnotations {
    pub fn is_hidden(&self) -> bool {
        matches!(self.hidden, Some(true))
    }

    pub fn tag(&self, name: &str) -> Option<&serde_json::Value> {
        self.tags.as_ref()?.get(name)
    }
}

/// A kind with no constraints of its own: `boolean`, `null` or `any`
#[derive(Debug, Clone, PartialEq)]
pub struct PlainSchema {
    pub annotations: SchemaAnnotations,
}

/// `number`, or `integer` when `integer` is set
#[derive(Debug, Clone, PartialEq)]
pub struct NumberSchema {
    pub annotations: SchemaAnnotations,
    pub integer: bool,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringSchema {
    pub annotations: SchemaAnnotations,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Regex searched for anywhere in the value
    pub pattern: Option<String>,
}

/// A fixed list of accepted scalars
#[derive(Debug, Clone, PartialEq)]
pub struct EnumSchema {
    pub annotations: SchemaAnnotations,
    pub values: Vec<serde_json::Value>,
}

/// The branches of an `anyOf`, `oneOf` or `allOf`; the enclosing
/// [`Schema`] variant says how they combine
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceSchema {
    pub annotations: SchemaAnnotations,
    pub schemas: Vec<Schema>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub annotations: SchemaAnnotations,
    /// Applies to every element; `None` accepts anything
    pub items: Option<Box<Schema>>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSchema {
    pub annotations: SchemaAnnotations,
    pub properties: HashMap<String, Schema>,
    /// Regex keys, tried against names not found in `properties`
    pub pattern_properties: HashMap<String, Schema>,
    pub additional_properties: Option<Box<Schema>>,
    pub required: Vec<String>,
    pub min_properties: Option<usize>,
    pub max_properties: Option<usize>,
    /// Unknown keys are errors
    pub closed: bool,
    pub property_names: Option<Box<Schema>>,
}

impl ObjectSchema {
    /// Whether keys outside `properties` and `patternProperties` are rejected
    pub fn rejects_additional(&self) -> bool {
        self.closed || matches!(self.additional_properties.as_deref(), Some(Schema::False))
    }
}

/// A pointer to the schema registered under `reference`
#[derive(Debug, Clone, PartialEq)]
pub struct RefSchema {
    pub annotations: SchemaAnnotations,
    pub reference: String,
}
