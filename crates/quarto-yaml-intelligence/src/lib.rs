//! YAML intelligence for Quarto documents
//!
//! Completions, lint and hover for YAML wherever Quarto puts it: project
//! and extension config files, document front matter, and the `#|`
//! option comments at the top of code cells. Documents are usually
//! half-typed, so completion works from the best parse that can be
//! recovered around the cursor, and falls back to indentation when there
//! is none.
//!
//! ```rust,no_run
//! use quarto_yaml_intelligence::{
//!     FileType, Position, SchemaCatalog, YamlIntelligence, YamlIntelligenceContext,
//! };
//!
//! # async fn run(resources: serde_json::Value) -> anyhow::Result<()> {
//! let engine = YamlIntelligence::new(SchemaCatalog::from_resources(&resources)?);
//! let context = YamlIntelligenceContext::new(FileType::Markdown, "---\nti\n---\n", Position::new(1, 2));
//! let completions = engine.get_completions(&context).await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub mod annotate;
pub mod catalog;
pub mod cell_options;
pub mod completions;
pub mod context;
mod dispatch;
pub mod error;
pub mod grammar;
mod hover;
pub mod indentation;
pub mod locate;
pub mod markdown;
pub mod reparse;
pub mod validator_queue;

pub use catalog::SchemaCatalog;
pub use context::{
    CompletionItem, CompletionOutcome, CompletionResult, FileType, Hover, HoverRange, LintDiagnostic,
    Position, PositionKind, YamlIntelligenceContext,
};
pub use dispatch::{determine_schema, position_in_ticks, trim_ticks};
pub use error::{IntelligenceError, IntelligenceResult};
pub use grammar::{GrammarParser, YamlGrammar};

use dispatch::Dispatcher;
use validator_queue::ValidatorQueue;

/// The engine: a schema catalog, a grammar parser and the validators
/// compiled so far. Cheap to share behind an `Arc`.
pub struct YamlIntelligence {
    catalog: SchemaCatalog,
    parser: Arc<dyn GrammarParser>,
    queue: ValidatorQueue,
}

impl YamlIntelligence {
    pub fn new(catalog: SchemaCatalog) -> Self {
        YamlIntelligence {
            catalog,
            parser: Arc::new(YamlGrammar),
            queue: ValidatorQueue::new(),
        }
    }

    /// Replace the YAML grammar
    pub fn with_parser(mut self, parser: Arc<dyn GrammarParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher {
            catalog: &self.catalog,
            parser: self.parser.as_ref(),
            queue: &self.queue,
        }
    }

    /// Completions at the cursor.
    ///
    /// `Some(NoCompletions)` when the cursor is somewhere completions make
    /// no sense (a fence, prose). `None` for an unknown file type or an
    /// internal failure, which is logged.
    pub async fn get_completions(&self, context: &YamlIntelligenceContext) -> Option<CompletionOutcome> {
        match self.dispatcher().completions(context) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, filetype = ?context.filetype, "completion failed");
                None
            }
        }
    }

    /// Validation diagnostics for every YAML region of the buffer
    pub async fn get_lint(&self, context: &YamlIntelligenceContext) -> Option<Vec<LintDiagnostic>> {
        self.dispatcher().lint(context).await
    }

    /// Documentation for the key on the cursor row
    pub async fn get_hover(&self, context: &YamlIntelligenceContext) -> Option<Hover> {
        match hover::hover(&self.dispatcher(), context) {
            Ok(hover) => hover,
            Err(e) => {
                tracing::error!(error = %e, filetype = ?context.filetype, "hover failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for YamlIntelligence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YamlIntelligence")
            .field("catalog", &self.catalog)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}
