//! One parser per schema kind, dispatched on from `parser.rs`

pub(super) mod arrays;
pub(super) mod combinators;
pub(super) mod r#enum;
pub(super) mod objects;
pub(super) mod primitive;
pub(super) mod r#ref;

pub(super) use arrays::parse_array_schema;
pub(super) use combinators::{parse_allof_schema, parse_anyof_schema, parse_oneof_schema};
pub(super) use r#enum::parse_enum_schema;
pub(super) use objects::parse_object_schema;
pub(super) use primitive::{
    parse_any_schema, parse_boolean_schema, parse_null_schema, parse_number_schema,
    parse_string_schema,
};
pub(super) use r#ref::parse_ref_schema;
