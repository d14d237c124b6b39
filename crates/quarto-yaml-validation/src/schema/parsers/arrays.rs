//! `array` schemas: an optional `items` schema plus length and uniqueness bounds

use crate::error::SchemaResult;

use crate::schema::Schema;
use crate::schema::annotations::parse_annotations;
use crate::schema::helpers::{JsonObject, get_bool, get_usize};
use crate::schema::parser::from_json;
use crate::schema::types::ArraySchema;

pub(in crate::schema) fn parse_array_schema(obj: &JsonObject) -> SchemaResult<Schema> {
    Ok(Schema::Array(ArraySchema {
        annotations: parse_annotations(obj)?,
        items: obj.get("items").map(from_json).transpose()?.map(Box::new),
        min_items: get_usize(obj, "minItems")?,
        max_items: get_usize(obj, "maxItems")?,
        unique_items: get_bool(obj, "uniqueItems")?,
    }))
}

#[cfg(test)]
mod tests {
    use crate::schema::Schema;
    use serde_json::json;

    #[test]
    fn test_array_with_items() {
        let schema = Schema::from_json(&json!({
            "type": "array",
            "items": {"type": "string"},
            "minItems": 1,
        }))
        .unwrap();
        match schema {
            Schema::Array(a) => {
                assert!(matches!(a.items.as_deref(), Some(Schema::String(_))));
                assert_eq!(a.min_items, Some(1));
                assert_eq!(a.unique_items, None);
            }
            other => panic!("expected array, got {:?}", other),
        }
    }
}
