//! Route a request to the YAML region it concerns
//!
//! Standalone YAML files, code cell buffers and whole Quarto documents
//! all reduce to a [`Region`]: some YAML mapped into the editor buffer,
//! the schema it is checked against, and the cursor in the region's own
//! coordinates when the cursor is inside it.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use quarto_mapped_text::{MappedString, line_offsets, lines, ranged_lines};
use quarto_yaml_validation::ValidationError;
use regex::Regex;

use crate::annotate::annotate;
use crate::catalog::{EXTENSION_CONFIG, FRONT_MATTER, PROJECT_CONFIG, SchemaCatalog};
use crate::cell_options::{ChunkOptionsFormat, guess_chunk_options_format, partition_cell_options};
use crate::completions::{YamlCompletionQuery, complete_yaml};
use crate::context::{
    CompletionOutcome, FileType, LintDiagnostic, Position, PositionKind, YamlIntelligenceContext,
};
use crate::error::IntelligenceResult;
use crate::grammar::GrammarParser;
use crate::indentation::IndentTree;
use crate::markdown::{Cell, CellKind, break_quarto_md};
use crate::reparse::ParseAttempts;
use crate::validator_queue::ValidatorQueue;

/// First line of a code cell buffer that carries its fence, `{python}`
static LANGUAGE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r".*\{([a-z]+)\s*.*\}").unwrap());

/// Cursor inside a region: the line up to the cursor (comment prefix
/// removed) and the position relative to the region's code
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RegionCursor {
    pub line: String,
    pub position: Position,
}

impl RegionCursor {
    fn new(line: &str, position: Position) -> Self {
        RegionCursor {
            line: line.to_string(),
            position,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Region {
    pub code: MappedString,
    pub schema_name: String,
    pub comment_prefix: String,
    pub position_kind: PositionKind,
    pub cursor: Option<RegionCursor>,
}

/// Whether `row` is the opening or closing `---` of front matter
pub fn position_in_ticks(code: &str, row: usize) -> bool {
    let trimmed = code.trim_end();
    (code.starts_with("---") && row == 0)
        || (trimmed.ends_with("---") && row + 1 == lines(trimmed).len())
}

/// Cut the `---` delimiters off front matter. Newlines stay, so rows
/// are unchanged.
pub fn trim_ticks(code: &MappedString) -> MappedString {
    let mut code = code.clone();
    if code.value().starts_with("---") {
        code = code.substring(3, code.len());
    }
    if code.value().trim_end().ends_with("---")
        && let Some(end) = code.value().rfind("---")
    {
        code = code.substring(0, end);
    }
    code
}

/// Catalog schema for a standalone YAML file
pub fn determine_schema(path: Option<&str>) -> &'static str {
    let Some(path) = path else {
        return PROJECT_CONFIG;
    };
    if Path::new(path).extension().is_some_and(|ext| ext == "qmd") {
        FRONT_MATTER
    } else if path.ends_with("_extension.yml") || path.ends_with("_extension.yaml") {
        EXTENSION_CONFIG
    } else {
        PROJECT_CONFIG
    }
}

fn front_matter_region(code: &MappedString, schema_name: &str, cursor: Option<RegionCursor>) -> Region {
    Region {
        code: trim_ticks(code),
        schema_name: schema_name.to_string(),
        comment_prefix: String::new(),
        position_kind: PositionKind::Metadata,
        cursor,
    }
}

/// The cursor relative to a cell's YAML-bearing text, if it is in the cell
fn cell_cursor(cell: &Cell, context: &YamlIntelligenceContext) -> Option<RegionCursor> {
    if !cell.contains_row(context.position.row) {
        return None;
    }
    let first_row = match cell.kind {
        CellKind::Code { .. } => cell.start_line + 1,
        _ => cell.start_line,
    };
    let row = context.position.row.checked_sub(first_row)?;
    Some(RegionCursor::new(
        &context.line,
        Position::new(row, context.position.column),
    ))
}

/// Diagnostics in outer-buffer coordinates, one per span
fn diagnostics(code: &MappedString, errors: Vec<ValidationError>) -> Vec<LintDiagnostic> {
    let file = code.file_information();
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for error in errors {
        let (Some(start), Some(end)) = (
            file.offset_to_location(error.start),
            file.offset_to_location(error.end),
        ) else {
            tracing::debug!(start = error.start, end = error.end, "diagnostic outside the buffer");
            continue;
        };
        if !seen.insert((start.row, start.column, end.row, end.column)) {
            continue;
        }
        result.push(LintDiagnostic {
            start_row: start.row,
            start_column: start.column,
            end_row: end.row,
            end_column: end.column,
            text: error.message,
        });
    }
    result
}

/// Outer rows of the lines the cursor line hangs off
fn predecessor_rows(region: &Region, row: usize) -> HashSet<usize> {
    let Some(previous) = row.checked_sub(1) else {
        return HashSet::new();
    };
    let code = region.code.value();
    let offsets = line_offsets(code);
    IndentTree::new(code)
        .ancestors(previous)
        .into_iter()
        .filter_map(|r| offsets.get(r).and_then(|&o| region.code.location(o)))
        .map(|location| location.row)
        .collect()
}

/// Borrowed view of the engine state a request needs
pub(crate) struct Dispatcher<'a> {
    pub catalog: &'a SchemaCatalog,
    pub parser: &'a dyn GrammarParser,
    pub queue: &'a ValidatorQueue,
}

impl Dispatcher<'_> {
    /// The option lines of a code cell as a region.
    ///
    /// Without a `language`, the first line of `code` must be the cell's
    /// opening fence. `None` when there are no option lines. The cursor
    /// survives only when it sits on an option line.
    pub(crate) fn script_region(
        &self,
        code: &MappedString,
        language: Option<&str>,
        engine: Option<&str>,
        cursor: Option<RegionCursor>,
    ) -> Option<Region> {
        if language == Some("_directive") {
            return None;
        }
        let code_lines = ranged_lines(code.value(), true);
        let (language, start_line) = match language {
            Some(language) => (language.to_string(), 0),
            None => {
                if code_lines.len() < 2 {
                    return None;
                }
                let caps = LANGUAGE_FENCE.captures(code_lines[0].substring)?;
                (caps[1].to_string(), 1)
            }
        };

        let body_start = code_lines.get(start_line).map_or(code.len(), |l| l.range.start);
        let body = code.substring(body_start, code.len());
        let comment = self.catalog.comment_chars().get(&language);
        let yaml = partition_cell_options(&body, &comment)?;

        let prefix = comment.option_prefix();
        let option_rows = lines(yaml.value().strip_suffix('\n').unwrap_or(yaml.value())).len();
        let cursor = cursor.and_then(|cursor| {
            let row = cursor
                .position
                .row
                .checked_sub(start_line)
                .filter(|&row| row < option_rows)?;
            let line = cursor.line.strip_prefix(prefix.as_str())?;
            let column = cursor.position.column.checked_sub(prefix.chars().count())?;
            Some(RegionCursor::new(line, Position::new(row, column)))
        });

        Some(Region {
            code: yaml,
            schema_name: SchemaCatalog::engine_name(engine),
            comment_prefix: prefix,
            position_kind: PositionKind::CodeCell,
            cursor,
        })
    }

    /// The YAML region of a document cell, if it has one
    fn cell_region(&self, cell: &Cell, engine: Option<&str>, cursor: Option<RegionCursor>) -> Option<Region> {
        match &cell.kind {
            CellKind::Raw => Some(front_matter_region(&cell.source, FRONT_MATTER, cursor)),
            CellKind::Code { language } => self.script_region(&cell.source, Some(language), engine, cursor),
            CellKind::Markdown | CellKind::Directive { .. } => None,
        }
    }

    /// The region under the cursor, for hover
    pub(crate) fn region_at_cursor(&self, context: &YamlIntelligenceContext) -> Option<Region> {
        let code = MappedString::new(context.code.as_str());
        match context.filetype {
            FileType::Yaml => Some(front_matter_region(
                &code,
                determine_schema(context.path.as_deref()),
                None,
            )),
            FileType::Script => self.script_region(&code, context.language.as_deref(), context.engine.as_deref(), None),
            FileType::Markdown => {
                let cells = break_quarto_md(&code);
                let cell = cells.iter().find(|c| c.contains_row(context.position.row))?;
                self.cell_region(cell, context.engine.as_deref(), None)
            }
            FileType::Other => None,
        }
    }

    /// Completions for a request; `None` for an unknown file type
    pub(crate) fn completions(&self, context: &YamlIntelligenceContext) -> IntelligenceResult<Option<CompletionOutcome>> {
        let code = MappedString::new(context.code.as_str());
        let cursor = RegionCursor::new(&context.line, context.position);
        let outcome = match context.filetype {
            FileType::Yaml => {
                if position_in_ticks(code.value(), context.position.row) {
                    return Ok(Some(CompletionOutcome::NoCompletions));
                }
                let schema_name = determine_schema(context.path.as_deref());
                self.complete_region(&front_matter_region(&code, schema_name, Some(cursor)))?
            }
            FileType::Script => {
                match self.script_region(&code, context.language.as_deref(), context.engine.as_deref(), Some(cursor)) {
                    Some(region) => self.complete_region(&region)?,
                    None => CompletionOutcome::NoCompletions,
                }
            }
            FileType::Markdown => self.markdown_completions(&code, context)?,
            FileType::Other => return Ok(None),
        };
        Ok(Some(outcome))
    }

    fn markdown_completions(
        &self,
        code: &MappedString,
        context: &YamlIntelligenceContext,
    ) -> IntelligenceResult<CompletionOutcome> {
        let row = context.position.row;
        let cells = break_quarto_md(code);
        let Some(cell) = cells.iter().find(|c| c.contains_row(row)) else {
            return Ok(CompletionOutcome::NoCompletions);
        };
        match &cell.kind {
            CellKind::Raw => {
                if position_in_ticks(cell.source.value(), row - cell.start_line) {
                    return Ok(CompletionOutcome::NoCompletions);
                }
            }
            CellKind::Code { .. } => {
                if row == cell.start_line || row + 1 == cell.start_line + cell.line_count {
                    return Ok(CompletionOutcome::NoCompletions);
                }
            }
            CellKind::Markdown | CellKind::Directive { .. } => return Ok(CompletionOutcome::NoCompletions),
        }
        match self.cell_region(cell, context.engine.as_deref(), cell_cursor(cell, context)) {
            Some(region) => self.complete_region(&region),
            None => Ok(CompletionOutcome::NoCompletions),
        }
    }

    fn complete_region(&self, region: &Region) -> IntelligenceResult<CompletionOutcome> {
        let Some(cursor) = &region.cursor else {
            return Ok(CompletionOutcome::NoCompletions);
        };
        if guess_chunk_options_format(region.code.value()) == ChunkOptionsFormat::Knitr {
            return Ok(CompletionOutcome::NoCompletions);
        }
        let Some(schema) = self.catalog.get(&region.schema_name) else {
            tracing::debug!(schema = %region.schema_name, "no schema in the catalog");
            return Ok(CompletionOutcome::NoCompletions);
        };
        let query = YamlCompletionQuery {
            code: &region.code,
            line: &cursor.line,
            position: cursor.position,
            schema,
            definitions: self.catalog.definitions(),
            comment_prefix: &region.comment_prefix,
            position_kind: region.position_kind,
        };
        complete_yaml(self.parser, &query)
    }

    /// Lint for a request; `None` for an unknown file type or when the
    /// validator could not run
    pub(crate) async fn lint(&self, context: &YamlIntelligenceContext) -> Option<Vec<LintDiagnostic>> {
        let code = MappedString::new(context.code.as_str());
        let cursor = RegionCursor::new(&context.line, context.position);
        match context.filetype {
            FileType::Yaml => {
                let schema_name = determine_schema(context.path.as_deref());
                let region = front_matter_region(&code, schema_name, Some(cursor));
                self.lint_region(&region, context.explicit).await
            }
            FileType::Script => {
                match self.script_region(&code, context.language.as_deref(), context.engine.as_deref(), Some(cursor)) {
                    Some(region) => self.lint_region(&region, context.explicit).await,
                    None => Some(Vec::new()),
                }
            }
            FileType::Markdown => {
                let mut result = Vec::new();
                for cell in break_quarto_md(&code) {
                    let Some(region) = self.cell_region(&cell, context.engine.as_deref(), cell_cursor(&cell, context))
                    else {
                        continue;
                    };
                    match self.lint_region(&region, context.explicit).await {
                        Some(diagnostics) => result.extend(diagnostics),
                        None => tracing::warn!(row = cell.start_line, "skipping cell that could not be linted"),
                    }
                }
                Some(result)
            }
            FileType::Other => None,
        }
    }

    async fn lint_region(&self, region: &Region, explicit: Option<bool>) -> Option<Vec<LintDiagnostic>> {
        if region.code.value().trim().is_empty()
            || guess_chunk_options_format(region.code.value()) == ChunkOptionsFormat::Knitr
        {
            return Some(Vec::new());
        }
        let Some(schema) = self.catalog.get(&region.schema_name) else {
            tracing::debug!(schema = %region.schema_name, "no schema in the catalog");
            return Some(Vec::new());
        };

        let parser = self.parser;
        let code = &region.code;
        let position = region.cursor.as_ref().map(|c| c.position);
        let mut result = self
            .queue
            .with_validator(
                &region.schema_name,
                schema,
                self.catalog.definitions(),
                |validator| async move {
                    for attempt in ParseAttempts::new(parser, code, position) {
                        let Some(document) = annotate(&attempt.tree, &attempt.code)? else {
                            continue;
                        };
                        return Ok(diagnostics(&attempt.code, validator.validate(&document)));
                    }
                    tracing::debug!(schema = %region.schema_name, "no usable parse to lint");
                    Ok::<_, anyhow::Error>(Vec::new())
                },
            )
            .await?;

        if explicit == Some(false)
            && let Some(cursor) = &region.cursor
        {
            let skipped = predecessor_rows(region, cursor.position.row);
            result.retain(|d| !skipped.contains(&d.start_row));
        }
        Some(result)
    }
}
