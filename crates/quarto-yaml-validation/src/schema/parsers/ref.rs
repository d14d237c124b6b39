//! `$ref` schemas
//!
//! A reference is a string naming another schema's `$id`. Both `$ref` and
//! the compiled `{"type": "ref", "$ref": ...}` form land here.

use crate::error::{SchemaError, SchemaResult};

use crate::schema::Schema;
use crate::schema::annotations::parse_annotations;
use crate::schema::helpers::{JsonObject, get_string};
use crate::schema::types::RefSchema;

pub(in crate::schema) fn parse_ref_schema(obj: &JsonObject) -> SchemaResult<Schema> {
    let reference = get_string(obj, "$ref")?
        .ok_or_else(|| SchemaError::InvalidStructure("ref requires a '$ref' string".into()))?;

    Ok(Schema::Ref(RefSchema {
        annotations: parse_annotations(obj)?,
        reference,
    }))
}
