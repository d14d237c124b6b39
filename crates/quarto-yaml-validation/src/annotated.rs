//! Position-annotated YAML values
//!
//! An [`AnnotatedParse`] is the semantic value of a YAML node (as JSON)
//! together with its span in the original document and the annotated
//! nodes it was built from.

use serde::Serialize;
use serde_json::Value;

/// The grammar construct an annotated node came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotatedKind {
    BlockMapping,
    FlowMapping,
    BlockSequence,
    FlowSequence,
    PlainScalar,
    SingleQuoteScalar,
    DoubleQuoteScalar,
    BlockScalar,
    /// Raw text recovered from a grammar error node inside a mapping
    Error,
    /// A synthesized slot with no source text, such as a missing value
    #[serde(rename = "<<EMPTY>>")]
    Empty,
}

impl AnnotatedKind {
    pub fn is_mapping(self) -> bool {
        matches!(self, AnnotatedKind::BlockMapping | AnnotatedKind::FlowMapping)
    }

    pub fn is_sequence(self) -> bool {
        matches!(
            self,
            AnnotatedKind::BlockSequence | AnnotatedKind::FlowSequence
        )
    }
}

/// A YAML node with its decoded value and original-document span.
///
/// For mappings, `components` alternates key and value nodes. For
/// sequences, `components[i]` is the i-th item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedParse {
    pub start: usize,
    pub end: usize,
    pub kind: AnnotatedKind,
    pub result: Value,
    pub components: Vec<AnnotatedParse>,
}

impl AnnotatedParse {
    /// An empty slot at `position`
    pub fn empty(position: usize) -> Self {
        AnnotatedParse {
            start: position,
            end: position,
            kind: AnnotatedKind::Empty,
            result: Value::Null,
            components: Vec::new(),
        }
    }

    /// Key/value component pairs of a mapping node
    pub fn entries(&self) -> impl Iterator<Item = (&AnnotatedParse, &AnnotatedParse)> {
        self.components
            .chunks_exact(2)
            .filter(|_| self.kind.is_mapping())
            .map(|pair| (&pair[0], &pair[1]))
    }

    /// Text of a key node, as used for object lookups
    pub fn key_text(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
