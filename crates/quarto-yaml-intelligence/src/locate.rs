//! Find the instance path under the cursor in an annotated parse

use quarto_yaml_validation::{AnnotatedParse, PathSegment};
use serde_json::Value;

/// Outcome of locating a cursor.
///
/// `with_error` is set when the cursor falls in a gap between mapping
/// entries (on a `:`, in trailing whitespace); `path` then holds the part
/// that could be resolved. A cursor past the end of a sequence has no
/// path at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorLocation {
    pub with_error: bool,
    pub path: Option<Vec<PathSegment>>,
}

/// Locate `position`, an offset in original-document coordinates.
///
/// Node ranges are inclusive at both ends, so a cursor just after a key
/// still counts as on the key.
pub fn locate_cursor(annotation: &AnnotatedParse, position: usize) -> CursorLocation {
    let mut path = Vec::new();
    match descend(annotation, position, &mut path) {
        Ok(with_error) => CursorLocation {
            with_error,
            path: Some(path),
        },
        Err(PastEnd) => {
            tracing::debug!(position, "cursor lies past the end of a sequence");
            CursorLocation {
                with_error: true,
                path: None,
            }
        }
    }
}

struct PastEnd;

fn contains(node: &AnnotatedParse, position: usize) -> bool {
    node.start <= position && position <= node.end
}

/// Returns whether the cursor landed in a mapping gap
fn descend(node: &AnnotatedParse, position: usize, path: &mut Vec<PathSegment>) -> Result<bool, PastEnd> {
    if node.kind.is_mapping() {
        for (key, value) in node.entries() {
            if contains(key, position) {
                path.push(segment(&key.result));
                return Ok(false);
            }
            if contains(value, position) {
                path.push(segment(&key.result));
                return descend(value, position, path);
            }
        }
        return Ok(true);
    }

    if node.kind.is_sequence() {
        for (index, item) in node.components.iter().enumerate() {
            if contains(item, position) {
                path.push(PathSegment::Index(index));
                return descend(item, position, path);
            }
            if item.start > position {
                if index > 0 {
                    path.push(PathSegment::Index(index - 1));
                }
                return Ok(false);
            }
        }
        return Err(PastEnd);
    }

    // a scalar or empty slot ends the path at the key or index that
    // holds it
    Ok(false)
}

/// Path segment named by a decoded YAML value
pub(crate) fn segment(value: &Value) -> PathSegment {
    match value {
        Value::String(s) => PathSegment::Key(s.clone()),
        Value::Number(n) => match n.as_u64().and_then(|u| usize::try_from(u).ok()) {
            Some(index) => PathSegment::Index(index),
            None => PathSegment::Key(n.to_string()),
        },
        other => PathSegment::Key(other.to_string()),
    }
}
