// Schema model, navigation, completions and validation for Quarto YAML
//
// Schemas arrive as JSON (either plain JSON Schema or the compiled form
// Quarto ships in its editor resources). Documents arrive as
// `AnnotatedParse` trees whose nodes carry offsets into the original
// buffer, so every error we report can be placed back in the editor.

pub mod annotated;
pub mod completions;
pub mod error;
pub mod navigation;
pub mod schema;
pub mod validator;

pub use annotated::{AnnotatedKind, AnnotatedParse};
pub use completions::{Completion, CompletionKind, schema_completions};
pub use error::{InstancePath, PathSegment, SchemaError, SchemaResult, ValidationError};
pub use navigation::navigate_schema;
pub use schema::{Schema, SchemaAnnotations, SchemaRegistry, schema_accepts, walk_schema};
pub use validator::Validator;
