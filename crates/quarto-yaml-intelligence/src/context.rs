//! Request context and result types shared with editors
//!
//! Everything here crosses the boundary to the editor as JSON, so field
//! names follow the editor's camelCase conventions.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// A cursor position. Rows and columns are zero-based; columns count
/// characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Position { row, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Yaml,
    Script,
    Markdown,
    #[serde(other)]
    Other,
}

/// What the editor knows about the buffer and the cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YamlIntelligenceContext {
    pub filetype: FileType,
    /// Only its extension matters
    #[serde(default)]
    pub path: Option<String>,
    pub code: String,
    /// The cursor line, up to the cursor
    #[serde(default)]
    pub line: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub engine: Option<String>,
    /// `Some(false)` for lints triggered while typing
    #[serde(default)]
    pub explicit: Option<bool>,
}

impl YamlIntelligenceContext {
    /// A context for `code` with the cursor at `position`; `line` is
    /// derived from the buffer.
    pub fn new(filetype: FileType, code: impl Into<String>, position: Position) -> Self {
        let code = code.into();
        let line = quarto_mapped_text::lines(&code)
            .get(position.row)
            .map(|l| l.chars().take(position.column).collect())
            .unwrap_or_default();
        YamlIntelligenceContext {
            filetype,
            path: None,
            code,
            line,
            position,
            language: None,
            engine: None,
            explicit: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_explicit(mut self, explicit: bool) -> Self {
        self.explicit = Some(explicit);
        self
    }
}

/// Where in an embedding document the YAML sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionKind {
    /// Front matter or a standalone YAML file
    Metadata,
    /// `#|` options of a code cell
    CodeCell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub display: String,
    pub value: String,
    pub description: String,
    pub suggest_on_accept: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub token: String,
    pub completions: Vec<CompletionItem>,
    pub cacheable: bool,
}

impl CompletionResult {
    /// A cacheable result with no candidates
    pub fn empty(token: impl Into<String>) -> Self {
        CompletionResult {
            token: token.into(),
            completions: Vec::new(),
            cacheable: true,
        }
    }

    pub fn values(&self) -> Vec<&str> {
        self.completions.iter().map(|c| c.value.as_str()).collect()
    }
}

/// Answer to a completion request. `NoCompletions` is sent to editors as
/// `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completions(CompletionResult),
    NoCompletions,
}

impl CompletionOutcome {
    pub fn completions(&self) -> Option<&CompletionResult> {
        match self {
            CompletionOutcome::Completions(result) => Some(result),
            CompletionOutcome::NoCompletions => None,
        }
    }
}

impl Serialize for CompletionOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CompletionOutcome::Completions(result) => result.serialize(serializer),
            CompletionOutcome::NoCompletions => serializer.serialize_bool(false),
        }
    }
}

/// A diagnostic in outer-buffer coordinates
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LintDiagnostic {
    #[serde(rename = "start.row")]
    pub start_row: usize,
    #[serde(rename = "start.column")]
    pub start_column: usize,
    #[serde(rename = "end.row")]
    pub end_row: usize,
    #[serde(rename = "end.column")]
    pub end_column: usize,
    pub text: String,
}

impl Serialize for LintDiagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(6))?;
        map.serialize_entry("start.row", &self.start_row)?;
        map.serialize_entry("start.column", &self.start_column)?;
        map.serialize_entry("end.row", &self.end_row)?;
        map.serialize_entry("end.column", &self.end_column)?;
        map.serialize_entry("text", &self.text)?;
        map.serialize_entry("type", "error")?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoverRange {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hover {
    /// Markdown
    pub content: String,
    pub range: HoverRange,
}
