//! Turn concrete syntax trees into position-annotated values
//!
//! The tree was parsed from a [`MappedString`], possibly one with
//! characters cut out of it, so every span is pushed back through the
//! mapping. Annotated offsets always refer to the outermost document.

use quarto_mapped_text::MappedString;
use quarto_yaml_validation::{AnnotatedKind, AnnotatedParse};
use serde_json::{Map, Value};

use crate::error::{IntelligenceError, IntelligenceResult};
use crate::grammar::{ConcreteNode, NodeKind};

/// Minimum share of the (trimmed) source the tree must span
const MIN_COVERAGE: f64 = 0.95;

/// Annotate `tree`, which was parsed from `code`.
///
/// Returns `Ok(None)` when the tree is unusable: its root is an error,
/// the stream holds no document, or the tree covers less than 95% of the
/// source. Constructs the annotator cannot decode are errors.
pub fn annotate(tree: &ConcreteNode, code: &MappedString) -> IntelligenceResult<Option<AnnotatedParse>> {
    if tree.is_error() {
        return Ok(None);
    }

    let total = code.value().trim().len();
    if total > 0 {
        let covered = tree.text(code.value()).trim().len();
        if (covered as f64) / (total as f64) < MIN_COVERAGE {
            tracing::debug!(covered, total, "parse covers too little of the source");
            return Ok(None);
        }
    }

    let mut node = tree;
    while matches!(
        node.kind,
        NodeKind::Stream | NodeKind::Document | NodeKind::BlockNode | NodeKind::FlowNode
    ) {
        match node.children.first() {
            Some(child) => node = child,
            None if node.kind == NodeKind::Stream => return Ok(None),
            None => return Ok(Some(Annotator { code }.empty(node.end))),
        }
    }
    Annotator { code }.build(node).map(Some)
}

/// Original offset of a position in `code`.
///
/// Characters that came from the original map exactly; anything else
/// (the end of the text, a junction left by deleted characters) maps just
/// past the closest preceding original character.
pub fn original_offset(code: &MappedString, offset: usize) -> usize {
    if let Some(original) = code.map(offset) {
        return original;
    }
    let value = code.value();
    let Some((prev, c)) = value.get(..offset.min(value.len())).and_then(|s| s.char_indices().next_back()) else {
        return code.map_closest(offset).unwrap_or(offset);
    };
    code.map_closest(prev)
        .map_or(offset, |original| original + c.len_utf8())
}

struct Annotator<'a> {
    code: &'a MappedString,
}

impl Annotator<'_> {
    fn build(&self, node: &ConcreteNode) -> IntelligenceResult<AnnotatedParse> {
        match node.kind {
            NodeKind::Stream | NodeKind::Document | NodeKind::BlockNode | NodeKind::FlowNode => {
                match node.children.first() {
                    Some(child) => self.build(child),
                    None => Ok(self.empty(node.end)),
                }
            }
            NodeKind::BlockMapping => self.mapping(node, AnnotatedKind::BlockMapping),
            NodeKind::FlowMapping => self.mapping(node, AnnotatedKind::FlowMapping),
            NodeKind::BlockSequence => self.sequence(node, AnnotatedKind::BlockSequence),
            NodeKind::FlowSequence => self.sequence(node, AnnotatedKind::FlowSequence),
            NodeKind::PlainScalar => {
                let text = node.value.as_deref().unwrap_or_default();
                Ok(self.leaf(node, AnnotatedKind::PlainScalar, decode_plain(text)))
            }
            NodeKind::SingleQuoteScalar => Ok(self.leaf(node, AnnotatedKind::SingleQuoteScalar, string_value(node))),
            NodeKind::DoubleQuoteScalar => Ok(self.leaf(node, AnnotatedKind::DoubleQuoteScalar, string_value(node))),
            NodeKind::BlockScalar => Ok(self.leaf(node, AnnotatedKind::BlockScalar, string_value(node))),
            NodeKind::BlockMappingPair
            | NodeKind::FlowPair
            | NodeKind::BlockSequenceItem
            | NodeKind::Alias
            | NodeKind::Error => Err(IntelligenceError::UnsupportedNode(node.kind.name())),
        }
    }

    fn mapping(&self, node: &ConcreteNode, kind: AnnotatedKind) -> IntelligenceResult<AnnotatedParse> {
        let mut object = Map::new();
        let mut components = Vec::with_capacity(node.children.len() * 2);
        for child in &node.children {
            let (key, value) = match child.kind {
                NodeKind::BlockMappingPair | NodeKind::FlowPair => {
                    let key = match child.children.first() {
                        Some(k) => self.build(k)?,
                        None => self.empty(child.start),
                    };
                    let value = match child.children.get(1) {
                        Some(v) => self.build(v)?,
                        None => self.empty(child.end),
                    };
                    (key, value)
                }
                NodeKind::Error => {
                    let text = child.text(self.code.value()).to_string();
                    let key = self.leaf(child, AnnotatedKind::Error, Value::String(text));
                    (key, self.empty(child.end))
                }
                other => return Err(IntelligenceError::UnsupportedNode(other.name())),
            };
            object.insert(key.key_text(), value.result.clone());
            components.push(key);
            components.push(value);
        }
        Ok(self.node(node, kind, Value::Object(object), components))
    }

    fn sequence(&self, node: &ConcreteNode, kind: AnnotatedKind) -> IntelligenceResult<AnnotatedParse> {
        let mut components = Vec::with_capacity(node.children.len());
        for child in &node.children {
            let item = match child.kind {
                NodeKind::BlockSequenceItem => match child.children.first() {
                    Some(value) => self.build(value)?,
                    None => self.empty(child.end),
                },
                _ => self.build(child)?,
            };
            components.push(item);
        }
        let result = Value::Array(components.iter().map(|c| c.result.clone()).collect());
        Ok(self.node(node, kind, result, components))
    }

    fn leaf(&self, node: &ConcreteNode, kind: AnnotatedKind, result: Value) -> AnnotatedParse {
        self.node(node, kind, result, Vec::new())
    }

    fn node(
        &self,
        node: &ConcreteNode,
        kind: AnnotatedKind,
        result: Value,
        components: Vec<AnnotatedParse>,
    ) -> AnnotatedParse {
        let start = self.code.map_closest(node.start).unwrap_or(node.start);
        let end = if node.end > node.start {
            original_offset(self.code, node.end)
        } else {
            start
        };
        AnnotatedParse {
            start,
            end,
            kind,
            result,
            components,
        }
    }

    fn empty(&self, position: usize) -> AnnotatedParse {
        AnnotatedParse::empty(original_offset(self.code, position))
    }
}

fn string_value(node: &ConcreteNode) -> Value {
    Value::String(node.value.clone().unwrap_or_default())
}

/// Plain scalars are read as JSON literals when they are one, else as text
fn decode_plain(text: &str) -> Value {
    if text.is_empty() || text == "~" {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
