//! Named schemas that the dispatcher picks from
//!
//! A catalog is built in code, or loaded from a resource bundle shaped
//! like the JSON that Quarto ships to editors: one object whose keys are
//! resource file names (`schema/front-matter.yml`, ...) and whose values
//! are the already-parsed contents.

use std::collections::HashMap;
use std::sync::Arc;

use quarto_yaml_validation::Schema;
use serde_json::Value;

use crate::cell_options::LanguageCommentChars;
use crate::error::{IntelligenceError, IntelligenceResult};

pub const FRONT_MATTER: &str = "front-matter";
pub const PROJECT_CONFIG: &str = "project-config";
pub const EXTENSION_CONFIG: &str = "extension-config";

const DEFAULT_ENGINE: &str = "markdown";

/// Schema catalog plus the language tables that go with it
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: HashMap<String, Arc<Schema>>,
    definitions: Arc<Vec<Schema>>,
    comment_chars: LanguageCommentChars,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.schemas.insert(name.into(), Arc::new(schema));
        self
    }

    /// Register the cell option schema of an execution engine
    pub fn with_engine(self, engine: &str, schema: Schema) -> Self {
        self.with_schema(Self::engine_name(Some(engine)), schema)
    }

    /// Shared schemas that others reach through `$ref`
    pub fn with_definitions(mut self, definitions: Vec<Schema>) -> Self {
        self.definitions = Arc::new(definitions);
        self
    }

    pub fn with_comment_chars(mut self, comment_chars: LanguageCommentChars) -> Self {
        self.comment_chars = comment_chars;
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(name)
    }

    /// Catalog name of an engine's cell option schema; markdown when no
    /// engine is known
    pub fn engine_name(engine: Option<&str>) -> String {
        format!("engine:{}", engine.unwrap_or(DEFAULT_ENGINE))
    }

    pub fn definitions(&self) -> &Arc<Vec<Schema>> {
        &self.definitions
    }

    pub fn comment_chars(&self) -> &LanguageCommentChars {
        &self.comment_chars
    }

    /// Load a catalog from a resource bundle.
    ///
    /// Every entry is optional. Definitions without an `$id` take the key
    /// they are filed under.
    pub fn from_resources(resources: &Value) -> IntelligenceResult<Self> {
        let Some(resources) = resources.as_object() else {
            return Err(invalid("<root>", "expected an object of resources"));
        };
        let mut catalog = SchemaCatalog::new();

        for (key, name) in [
            ("schema/front-matter.yml", FRONT_MATTER),
            ("schema/project-config.yml", PROJECT_CONFIG),
            ("schema/extension-config.yml", EXTENSION_CONFIG),
        ] {
            if let Some(value) = resources.get(key) {
                catalog = catalog.with_schema(name, load(key, value)?);
            }
        }

        if let Some(engines) = resources.get("schema/engines.yml") {
            let key = "schema/engines.yml";
            let engines = engines
                .as_object()
                .ok_or_else(|| invalid(key, "expected an object of engine schemas"))?;
            for (engine, value) in engines {
                catalog = catalog.with_engine(engine, load(key, value)?);
            }
        }

        let mut definitions = Vec::new();
        if let Some(value) = resources.get("schema/definitions.yml") {
            let key = "schema/definitions.yml";
            let entries = value
                .as_object()
                .ok_or_else(|| invalid(key, "expected an object of definitions"))?;
            for (id, value) in entries {
                let mut schema = load(key, value)?;
                if schema.id().is_none()
                    && let Some(annotations) = schema.annotations_mut()
                {
                    annotations.id = Some(id.clone());
                }
                definitions.push(schema);
            }
        }
        if let Some(value) = resources.get("schema/external-schemas.yml") {
            let key = "schema/external-schemas.yml";
            let entries = value
                .as_array()
                .ok_or_else(|| invalid(key, "expected an array of schemas"))?;
            for value in entries {
                definitions.push(load(key, value)?);
            }
        }
        catalog = catalog.with_definitions(definitions);

        if let Some(value) = resources.get("handlers/lang-comment-chars.yml") {
            let comment_chars = serde_json::from_value(value.clone())
                .map_err(|e| invalid("handlers/lang-comment-chars.yml", e))?;
            catalog = catalog.with_comment_chars(comment_chars);
        }

        tracing::debug!(
            schemas = catalog.schemas.len(),
            definitions = catalog.definitions.len(),
            "loaded schema catalog"
        );
        Ok(catalog)
    }
}

fn invalid(key: &str, message: impl ToString) -> IntelligenceError {
    IntelligenceError::InvalidResource {
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn load(key: &str, value: &Value) -> IntelligenceResult<Schema> {
    Schema::from_json(value).map_err(|e| invalid(key, e))
}
