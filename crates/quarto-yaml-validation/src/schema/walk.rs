//! Schema traversal

use std::collections::HashSet;

use super::{Schema, SchemaRegistry};

/// Visit `schema` and its subschemas in pre-order.
///
/// The callback returns `true` to stop descending below the schema it was
/// given. References are followed only when a registry is supplied, and
/// each `$id` is entered at most once.
pub fn walk_schema<'a, F>(schema: &'a Schema, registry: Option<&SchemaRegistry<'a>>, f: &mut F)
where
    F: FnMut(&'a Schema) -> bool,
{
    let mut visited = HashSet::new();
    walk_inner(schema, registry, f, &mut visited);
}

fn walk_inner<'a, F>(
    schema: &'a Schema,
    registry: Option<&SchemaRegistry<'a>>,
    f: &mut F,
    visited: &mut HashSet<&'a str>,
) where
    F: FnMut(&'a Schema) -> bool,
{
    if f(schema) {
        return;
    }
    match schema {
        Schema::AnyOf(s) => {
            for branch in &s.schemas {
                walk_inner(branch, registry, f, visited);
            }
        }
        Schema::OneOf(s) => {
            for branch in &s.schemas {
                walk_inner(branch, registry, f, visited);
            }
        }
        Schema::AllOf(s) => {
            for branch in &s.schemas {
                walk_inner(branch, registry, f, visited);
            }
        }
        Schema::Array(a) => {
            if let Some(items) = &a.items {
                walk_inner(items, registry, f, visited);
            }
        }
        Schema::Object(o) => {
            let mut keys: Vec<&String> = o.properties.keys().collect();
            keys.sort();
            for key in keys {
                walk_inner(&o.properties[key], registry, f, visited);
            }
            let mut patterns: Vec<&String> = o.pattern_properties.keys().collect();
            patterns.sort();
            for pattern in patterns {
                walk_inner(&o.pattern_properties[pattern], registry, f, visited);
            }
            if let Some(names) = &o.property_names {
                walk_inner(names, registry, f, visited);
            }
            if let Some(additional) = &o.additional_properties {
                walk_inner(additional, registry, f, visited);
            }
        }
        Schema::Ref(r) => {
            if let Some(registry) = registry
                && visited.insert(r.reference.as_str())
                && let Some(target) = registry.get(&r.reference)
            {
                walk_inner(target, Some(registry), f, visited);
            }
        }
        Schema::False
        | Schema::True
        | Schema::Boolean(_)
        | Schema::Number(_)
        | Schema::String(_)
        | Schema::Null(_)
        | Schema::Enum(_)
        | Schema::Any(_) => {}
    }
}

/// Whether `schema` admits values of JSON type `json_type`
/// (`"null"`, `"boolean"`, `"number"`, `"string"`, `"array"` or `"object"`).
///
/// Unresolvable references admit nothing.
pub fn schema_accepts(schema: &Schema, registry: &SchemaRegistry<'_>, json_type: &str) -> bool {
    let mut seen = HashSet::new();
    accepts_inner(schema, registry, json_type, &mut seen)
}

fn accepts_inner(
    schema: &Schema,
    registry: &SchemaRegistry<'_>,
    json_type: &str,
    seen: &mut HashSet<String>,
) -> bool {
    match schema {
        Schema::False => false,
        Schema::True | Schema::Any(_) => true,
        Schema::Boolean(_) => json_type == "boolean",
        Schema::Number(_) => json_type == "number",
        Schema::String(_) => json_type == "string",
        Schema::Null(_) => json_type == "null",
        Schema::Enum(e) => e.values.iter().any(|v| json_type_of(v) == json_type),
        Schema::Array(_) => json_type == "array",
        Schema::Object(_) => json_type == "object",
        Schema::AnyOf(s) => s
            .schemas
            .iter()
            .any(|b| accepts_inner(b, registry, json_type, seen)),
        Schema::OneOf(s) => s
            .schemas
            .iter()
            .any(|b| accepts_inner(b, registry, json_type, seen)),
        Schema::AllOf(s) => s
            .schemas
            .iter()
            .all(|b| accepts_inner(b, registry, json_type, seen)),
        Schema::Ref(r) => {
            if !seen.insert(r.reference.clone()) {
                return false;
            }
            let accepted = registry
                .get(&r.reference)
                .is_some_and(|target| accepts_inner(target, registry, json_type, seen));
            seen.remove(&r.reference);
            accepted
        }
    }
}

/// JSON type name of a value
pub(crate) fn json_type_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
