use quarto_yaml_validation::{Schema, SchemaError, SchemaRegistry, schema_accepts};
use serde_json::json;

/// The shape Quarto ships in its compiled editor resources
#[test]
fn test_load_compiled_front_matter_fragment() {
    let schema = Schema::from_json(&json!({
        "type": "object",
        "$id": "front-matter",
        "closed": true,
        "properties": {
            "title": {
                "type": "string",
                "description": "be a string",
                "documentation": {"short": "Document title", "long": "The title of the document"},
            },
            "date": {"type": "ref", "$ref": "date", "description": "be a date"},
            "format": {
                "type": "anyOf",
                "anyOf": [
                    {"type": "enum", "enum": ["html", "pdf"]},
                    {"type": "object", "properties": {"html": {"type": "ref", "$ref": "html-options"}}},
                ],
            },
        },
    }))
    .unwrap();

    let Schema::Object(object) = &schema else {
        panic!("expected object, got {:?}", schema);
    };
    assert!(object.closed);
    assert_eq!(
        object.properties["title"].annotations().documentation.as_deref(),
        Some("Document title")
    );
    assert!(matches!(object.properties["date"], Schema::Ref(_)));
    assert!(matches!(object.properties["format"], Schema::AnyOf(_)));
}

#[test]
fn test_registry_over_definitions() {
    let definitions = [
        Schema::from_json(&json!({"$id": "date", "type": "string"})).unwrap(),
        Schema::from_json(&json!({"$id": "html-options", "type": "object", "properties": {"toc": "boolean"}}))
            .unwrap(),
    ];
    let mut registry = SchemaRegistry::new();
    for def in &definitions {
        registry.register_tree(def);
    }

    let reference = Schema::from_json(&json!({"$ref": "html-options"})).unwrap();
    let resolved = registry.resolve(&reference).unwrap();
    assert_eq!(resolved.type_name(), "object");
    assert!(schema_accepts(&reference, &registry, "object"));
    assert!(!schema_accepts(&reference, &registry, "string"));
}

#[test]
fn test_malformed_schemas_are_errors() {
    assert_eq!(
        Schema::from_json(&json!({"type": "widget"})),
        Err(SchemaError::InvalidType("widget".into()))
    );
    assert!(matches!(
        Schema::from_json(&json!({"type": "object", "properties": []})),
        Err(SchemaError::InvalidStructure(_))
    ));
    assert!(matches!(
        Schema::from_json(&json!({"type": "ref"})),
        Err(SchemaError::InvalidStructure(_))
    ));
}
