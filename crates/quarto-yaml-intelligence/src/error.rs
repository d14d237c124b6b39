//! Error types for YAML intelligence

use quarto_yaml_validation::SchemaError;
use thiserror::Error;

/// Failures that indicate a defect in a schema or in the grammar, as
/// opposed to an unfinished document.
#[derive(Debug, Error)]
pub enum IntelligenceError {
    /// The concrete tree contains a construct the annotator cannot decode
    #[error("Unsupported YAML construct: {0}")]
    UnsupportedNode(&'static str),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A resource bundle entry that is not what its key promises
    #[error("Invalid resource '{key}': {message}")]
    InvalidResource { key: String, message: String },
}

pub type IntelligenceResult<T> = Result<T, IntelligenceError>;
