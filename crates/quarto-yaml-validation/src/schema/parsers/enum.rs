//! `enum` schemas: the accepted values, as JSON

use crate::error::{SchemaError, SchemaResult};

use crate::schema::Schema;
use crate::schema::annotations::parse_annotations;
use crate::schema::helpers::{JsonObject, get_array};
use crate::schema::types::EnumSchema;

/// Parse an enum schema from its `enum` list of allowed values
pub(in crate::schema) fn parse_enum_schema(obj: &JsonObject) -> SchemaResult<Schema> {
    let values = get_array(obj, "enum")?
        .ok_or_else(|| SchemaError::InvalidStructure("enum requires a list of values".into()))?;

    Ok(Schema::Enum(EnumSchema {
        annotations: parse_annotations(obj)?,
        values: values.clone(),
    }))
}
