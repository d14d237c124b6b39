//! Completion candidates generated from a schema
//!
//! Objects offer their property names as keys; enums, booleans and
//! explicit `completions` annotations offer values.

use serde::Serialize;
use serde_json::Value;

use crate::error::SchemaResult;
use crate::schema::{Schema, SchemaRegistry, scalar_text, walk_schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    Key,
    Value,
}

/// A completion candidate.
///
/// For keys, `schema` is the object that owns the property; for values
/// it is the schema that produced the value.
#[derive(Debug, Clone, Serialize)]
pub struct Completion<'a> {
    #[serde(rename = "type")]
    pub kind: CompletionKind,
    pub display: String,
    pub value: String,
    pub description: String,
    pub suggest_on_accept: bool,
    #[serde(skip)]
    pub schema: &'a Schema,
}

impl<'a> Completion<'a> {
    fn value(text: String, schema: &'a Schema) -> Self {
        Completion {
            kind: CompletionKind::Value,
            display: text.clone(),
            value: text,
            description: String::new(),
            suggest_on_accept: false,
            schema,
        }
    }

    /// Schema of the property a key completion names
    pub fn property_schema(&self) -> Option<&'a Schema> {
        match (self.kind, self.schema) {
            (CompletionKind::Key, Schema::Object(o)) => o.properties.get(&self.display),
            _ => None,
        }
    }
}

/// Generate completion candidates for `schema`
pub fn schema_completions<'a>(
    schema: &'a Schema,
    registry: &SchemaRegistry<'a>,
) -> SchemaResult<Vec<Completion<'a>>> {
    let schema = registry.resolve(schema)?;
    let annotations = schema.annotations();

    let mut explicit: Vec<String> = annotations.completions.clone().unwrap_or_default();
    if let Some(tagged) = annotations.tag("completions") {
        match tagged {
            Value::Array(items) => explicit.extend(items.iter().filter_map(scalar_text)),
            Value::Object(map) => explicit.extend(map.keys().cloned()),
            _ => {}
        }
    }
    if !explicit.is_empty() {
        explicit.extend(annotations.additional_completions.iter().flatten().cloned());
        return Ok(explicit
            .into_iter()
            .map(|c| Completion::value(c, schema))
            .collect());
    }

    let mut result = match schema {
        Schema::Boolean(_) => vec![
            Completion::value("true".into(), schema),
            Completion::value("false".into(), schema),
        ],
        Schema::Enum(e) => e
            .values
            .iter()
            .filter_map(scalar_text)
            .map(|c| Completion::value(c, schema))
            .collect(),
        Schema::Array(a) => match &a.items {
            Some(items) => schema_completions(items, registry)?,
            None => Vec::new(),
        },
        Schema::AnyOf(s) => branch_completions(&s.schemas, registry)?,
        Schema::OneOf(s) => branch_completions(&s.schemas, registry)?,
        Schema::AllOf(s) => branch_completions(&s.schemas, registry)?,
        Schema::Object(o) => {
            let mut keys: Vec<&String> = o.properties.keys().collect();
            keys.sort();
            keys.into_iter()
                .filter(|key| !o.properties[*key].is_hidden())
                .map(|key| Completion {
                    kind: CompletionKind::Key,
                    display: key.clone(),
                    value: format!("{}: ", key),
                    description: property_description(&o.properties[key], registry),
                    suggest_on_accept: true,
                    schema,
                })
                .collect()
        }
        Schema::False
        | Schema::True
        | Schema::Number(_)
        | Schema::String(_)
        | Schema::Null(_)
        | Schema::Any(_)
        | Schema::Ref(_) => Vec::new(),
    };

    if let Some(extra) = &annotations.additional_completions {
        result.extend(extra.iter().map(|c| Completion::value(c.clone(), schema)));
    }
    Ok(result)
}

fn branch_completions<'a>(
    branches: &'a [Schema],
    registry: &SchemaRegistry<'a>,
) -> SchemaResult<Vec<Completion<'a>>> {
    let mut result = Vec::new();
    for branch in branches {
        result.extend(schema_completions(branch, registry)?);
    }
    Ok(result)
}

/// The property's own documentation, else the first documentation found
/// below it (through references)
fn property_description<'a>(schema: &'a Schema, registry: &SchemaRegistry<'a>) -> String {
    if let Some(doc) = &schema.annotations().documentation {
        return doc.clone();
    }
    let mut found = None;
    walk_schema(schema, Some(registry), &mut |s| {
        if found.is_some() {
            return true;
        }
        if let Some(doc) = &s.annotations().documentation {
            found = Some(doc.clone());
            return true;
        }
        false
    });
    found.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(completions: &[Completion<'_>]) -> Vec<String> {
        completions.iter().map(|c| c.value.clone()).collect()
    }

    #[test]
    fn test_object_keys() {
        let schema = Schema::from_json(&json!({
            "type": "object",
            "properties": {
                "toc": {"type": "boolean", "documentation": "Table of contents"},
                "secret": {"type": "string", "hidden": true},
                "author": {"$ref": "author"},
            },
        }))
        .unwrap();
        let def = Schema::from_json(&json!({
            "$id": "author",
            "type": "string",
            "documentation": {"short": "Document author"},
        }))
        .unwrap();
        let mut registry = SchemaRegistry::new();
        registry.register(&def);

        let completions = schema_completions(&schema, &registry).unwrap();
        assert_eq!(values(&completions), vec!["author: ", "toc: "]);
        assert_eq!(completions[0].description, "Document author");
        assert_eq!(completions[1].description, "Table of contents");
        assert!(completions.iter().all(|c| c.kind == CompletionKind::Key));
        assert!(completions.iter().all(|c| c.suggest_on_accept));
        assert_eq!(
            completions[1].property_schema().map(Schema::type_name),
            Some("boolean")
        );
    }

    #[test]
    fn test_explicit_completions_win() {
        let schema = Schema::from_json(&json!({
            "type": "string",
            "completions": ["html", "pdf"],
            "additionalCompletions": ["docx"],
        }))
        .unwrap();
        let registry = SchemaRegistry::new();
        let completions = schema_completions(&schema, &registry).unwrap();
        assert_eq!(values(&completions), vec!["html", "pdf", "docx"]);
        assert!(completions.iter().all(|c| c.kind == CompletionKind::Value));
        assert!(completions.iter().all(|c| !c.suggest_on_accept));
    }

    #[test]
    fn test_enum_and_boolean_values() {
        let schema = Schema::from_json(&json!({
            "anyOf": [{"enum": ["auto", 3]}, "boolean"]
        }))
        .unwrap();
        let registry = SchemaRegistry::new();
        let completions = schema_completions(&schema, &registry).unwrap();
        assert_eq!(values(&completions), vec!["auto", "3", "true", "false"]);
    }

    #[test]
    fn test_serializes_without_schema() {
        let schema = Schema::from_json(&json!({"enum": ["a"]})).unwrap();
        let registry = SchemaRegistry::new();
        let completions = schema_completions(&schema, &registry).unwrap();
        assert_eq!(
            serde_json::to_value(&completions[0]).unwrap(),
            json!({
                "type": "value",
                "display": "a",
                "value": "a",
                "description": "",
                "suggest_on_accept": false,
            })
        );
    }
}
