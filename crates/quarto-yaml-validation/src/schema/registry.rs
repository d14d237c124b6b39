//! `$id` registry for resolving references

use std::collections::{HashMap, HashSet};

use super::Schema;
use super::walk::walk_schema;
use crate::error::{SchemaError, SchemaResult};

/// Borrowed index from `$id` to schema.
///
/// Later registrations of the same id replace earlier ones.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry<'a> {
    schemas: HashMap<&'a str, &'a Schema>,
}

impl<'a> SchemaRegistry<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `schema` under its own `$id`, if it has one
    pub fn register(&mut self, schema: &'a Schema) {
        if let Some(id) = schema.id() {
            self.schemas.insert(id, schema);
        }
    }

    /// Register every schema carrying an `$id` inside `schema`
    pub fn register_tree(&mut self, schema: &'a Schema) {
        walk_schema(schema, None, &mut |s| {
            self.register(s);
            false
        });
    }

    pub fn get(&self, id: &str) -> Option<&'a Schema> {
        self.schemas.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.schemas.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Follow `$ref`s until a non-reference schema is reached
    pub fn resolve(&self, schema: &'a Schema) -> SchemaResult<&'a Schema> {
        let mut current = schema;
        let mut seen = HashSet::new();
        while let Schema::Ref(r) = current {
            if !seen.insert(r.reference.as_str()) {
                return Err(SchemaError::InvalidStructure(format!(
                    "Reference cycle through '{}'",
                    r.reference
                )));
            }
            current = self
                .get(&r.reference)
                .ok_or_else(|| SchemaError::UnresolvedRef(r.reference.clone()))?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_tree_finds_nested_ids() {
        let schema = Schema::from_json(&json!({
            "type": "object",
            "$id": "root",
            "properties": {
                "author": {"type": "string", "$id": "author-name"},
                "tags": {"type": "array", "items": {"type": "string", "$id": "tag"}},
            },
        }))
        .unwrap();
        let mut registry = SchemaRegistry::new();
        registry.register_tree(&schema);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("tag"));
    }

    #[test]
    fn test_resolve_follows_chains() {
        let target = Schema::from_json(&json!({"type": "string", "$id": "b"})).unwrap();
        let middle = Schema::from_json(&json!({"$ref": "b", "$id": "a"})).unwrap();
        let start = Schema::from_json(&json!({"$ref": "a"})).unwrap();
        let mut registry = SchemaRegistry::new();
        registry.register(&target);
        registry.register(&middle);
        assert_eq!(registry.resolve(&start), Ok(&target));
    }

    #[test]
    fn test_resolve_missing_id() {
        let start = Schema::from_json(&json!({"$ref": "nowhere"})).unwrap();
        let registry = SchemaRegistry::new();
        assert_eq!(
            registry.resolve(&start),
            Err(SchemaError::UnresolvedRef("nowhere".into()))
        );
    }

    #[test]
    fn test_resolve_detects_cycles() {
        let a = Schema::from_json(&json!({"$ref": "b", "$id": "a"})).unwrap();
        let b = Schema::from_json(&json!({"$ref": "a", "$id": "b"})).unwrap();
        let mut registry = SchemaRegistry::new();
        registry.register(&a);
        registry.register(&b);
        assert!(matches!(
            registry.resolve(&a),
            Err(SchemaError::InvalidStructure(_))
        ));
    }
}
