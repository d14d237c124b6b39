//! Errors for schema loading and document validation

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A defect in a schema. The user's YAML is never the cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Invalid schema type: {0}")]
    InvalidType(String),

    #[error("Invalid schema structure: {0}")]
    InvalidStructure(String),

    /// A `$ref` naming an `$id` the registry does not hold
    #[error("Unresolved schema reference: {0}")]
    UnresolvedRef(String),

    #[error("Navigation through allOf schemas is not implemented")]
    AllOfUnsupported,

    #[error("Invalid regex pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

pub type SchemaResult<T> = Result<T, SchemaError>;

/// One step into a document: a mapping key or a sequence index.
/// Serializes as the bare string or number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    pub fn as_key(&self) -> Option<&str> {
        if let PathSegment::Key(key) = self {
            Some(key)
        } else {
            None
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Where in the document the validator currently is, shown dotted
/// (`format.html.toc`) or as `(root)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstancePath(Vec<PathSegment>);

impl InstancePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((first, rest)) = self.0.split_first() else {
            return f.write_str("(root)");
        };
        write!(f, "{first}")?;
        rest.iter().try_for_each(|segment| write!(f, ".{segment}"))
    }
}

/// A place where a document breaks its schema. `start..end` is the
/// failing node's span in the original buffer.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Validation error at {instance_path}: {message}")]
pub struct ValidationError {
    pub message: String,
    pub instance_path: InstancePath,
    /// Schema keywords walked to reach the failure, e.g. `["properties", "toc"]`
    pub schema_path: Vec<String>,
    pub start: usize,
    pub end: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_path_display() {
        let mut path = InstancePath::new();
        assert_eq!(path.to_string(), "(root)");
        path.push("format".into());
        path.push(PathSegment::Index(2));
        assert_eq!(path.to_string(), "format.2");
    }

    #[test]
    fn test_path_segment_serializes_untagged() {
        let path = vec![PathSegment::from("author"), PathSegment::Index(0)];
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"["author",0]"#);
    }
}
