//! Primitive schema parsers: boolean, number, string, null and any

use crate::error::SchemaResult;

use crate::schema::Schema;
use crate::schema::annotations::parse_annotations;
use crate::schema::helpers::{JsonObject, get_number, get_string, get_usize};
use crate::schema::types::{NumberSchema, PlainSchema, StringSchema};

pub(in crate::schema) fn parse_boolean_schema(obj: &JsonObject) -> SchemaResult<Schema> {
    Ok(Schema::Boolean(PlainSchema {
        annotations: parse_annotations(obj)?,
    }))
}

/// Parse a number schema; `integer` restricts it to whole numbers
pub(in crate::schema) fn parse_number_schema(
    obj: &JsonObject,
    integer: bool,
) -> SchemaResult<Schema> {
    Ok(Schema::Number(NumberSchema {
        annotations: parse_annotations(obj)?,
        integer,
        minimum: get_number(obj, "minimum")?,
        maximum: get_number(obj, "maximum")?,
        exclusive_minimum: get_number(obj, "exclusiveMinimum")?,
        exclusive_maximum: get_number(obj, "exclusiveMaximum")?,
        multiple_of: get_number(obj, "multipleOf")?,
    }))
}

pub(in crate::schema) fn parse_string_schema(obj: &JsonObject) -> SchemaResult<Schema> {
    Ok(Schema::String(StringSchema {
        annotations: parse_annotations(obj)?,
        min_length: get_usize(obj, "minLength")?,
        max_length: get_usize(obj, "maxLength")?,
        pattern: get_string(obj, "pattern")?,
    }))
}

pub(in crate::schema) fn parse_null_schema(obj: &JsonObject) -> SchemaResult<Schema> {
    Ok(Schema::Null(PlainSchema {
        annotations: parse_annotations(obj)?,
    }))
}

pub(in crate::schema) fn parse_any_schema(obj: &JsonObject) -> SchemaResult<Schema> {
    Ok(Schema::Any(PlainSchema {
        annotations: parse_annotations(obj)?,
    }))
}
