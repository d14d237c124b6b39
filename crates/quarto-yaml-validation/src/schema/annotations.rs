//! The editor-facing keys every schema kind may carry

use crate::error::SchemaResult;

use super::helpers::{
    JsonObject, get_bool, get_doc_string, get_string, get_string_array, get_tags,
};
use super::types::SchemaAnnotations;

/// Borrowed by `Schema::True` and `Schema::False`
pub(super) static EMPTY_ANNOTATIONS: SchemaAnnotations = SchemaAnnotations {
    id: None,
    description: None,
    documentation: None,
    error_message: None,
    hidden: None,
    completions: None,
    additional_completions: None,
    tags: None,
};

/// Keys consumed by [`parse_annotations`]
pub(super) const ANNOTATION_KEYS: &[&str] = &[
    "$id",
    "description",
    "documentation",
    "errorMessage",
    "hidden",
    "completions",
    "additionalCompletions",
    "tags",
];

/// Read the annotation keys of `obj`; missing keys stay `None`
pub(super) fn parse_annotations(obj: &JsonObject) -> SchemaResult<SchemaAnnotations> {
    Ok(SchemaAnnotations {
        id: get_string(obj, "$id")?,
        description: get_doc_string(obj, "description")?,
        documentation: get_doc_string(obj, "documentation")?,
        error_message: get_string(obj, "errorMessage")?,
        hidden: get_bool(obj, "hidden")?,
        completions: get_string_array(obj, "completions")?,
        additional_completions: get_string_array(obj, "additionalCompletions")?,
        tags: get_tags(obj)?,
    })
}
