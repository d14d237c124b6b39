//! Completion synthesis
//!
//! [`complete_yaml`] works out where the cursor is in a YAML region (via
//! the reparser, the annotator and the two locators), then [`complete`]
//! turns that path into the candidates the editor shows.

use std::collections::{BTreeSet, HashSet};

use quarto_mapped_text::{MappedString, position_to_offset};
use quarto_yaml_validation::{
    Completion, CompletionKind, PathSegment, Schema, SchemaRegistry, navigate_schema,
    schema_accepts, schema_completions, walk_schema,
};
use serde_json::Value;

use crate::annotate::{annotate, original_offset};
use crate::context::{CompletionItem, CompletionOutcome, CompletionResult, Position, PositionKind};
use crate::error::IntelligenceResult;
use crate::grammar::GrammarParser;
use crate::indentation::locate_from_indentation;
use crate::locate::locate_cursor;
use crate::reparse::ParseAttempts;

/// Nesting of array schemas followed when deciding whether a key can
/// pre-position the cursor for its value
const MAX_ARRAY_DEPTH: usize = 16;

/// A completion query against one schema at a located path
#[derive(Debug, Clone)]
pub struct CompletionRequest<'a> {
    pub schema: &'a Schema,
    /// Shared `$id` definitions the schema may reference
    pub definitions: &'a [Schema],
    pub path: Vec<PathSegment>,
    /// The partial word in front of the cursor
    pub word: String,
    /// Indentation of the cursor line
    pub indent: usize,
    /// Prefix that starts every YAML line, e.g. `#| ` in code cells
    pub comment_prefix: &'a str,
    pub position_kind: PositionKind,
    /// Keep only keys or only values
    pub completion_position: Option<CompletionKind>,
    /// The cursor line up to the cursor
    pub line: &'a str,
    pub column: usize,
}

pub(crate) fn schema_registry<'a>(schema: &'a Schema, definitions: &'a [Schema]) -> SchemaRegistry<'a> {
    let mut registry = SchemaRegistry::new();
    for definition in definitions {
        registry.register_tree(definition);
    }
    registry.register_tree(schema);
    registry
}

/// Schemas with the same `$id` are the same schema
fn unique_by_id(schemas: Vec<&Schema>) -> Vec<&Schema> {
    let mut seen = HashSet::new();
    schemas
        .into_iter()
        .filter(|s| s.id().is_none_or(|id| seen.insert(id.to_string())))
        .collect()
}

pub(crate) fn tag_is_set(schema: &Schema, name: &str) -> bool {
    schema
        .annotations()
        .tag(name)
        .is_some_and(|v| !matches!(v, Value::Null | Value::Bool(false)))
}

fn is_hidden(schema: &Schema) -> bool {
    schema.is_hidden() || tag_is_set(schema, "hidden")
}

/// Whether accepting a key may move the cursor into its value: the value
/// schema must admit only one of scalar, object or array, and so must
/// the items of any array it admits.
fn can_suggest_on_accept<'a>(schema: &'a Schema, registry: &SchemaRegistry<'a>, depth: usize) -> bool {
    if depth > MAX_ARRAY_DEPTH {
        return false;
    }
    let mut kinds = BTreeSet::new();
    let mut arrays: Vec<&'a Schema> = Vec::new();
    walk_schema(schema, Some(registry), &mut |s| match s {
        Schema::Object(_) => {
            kinds.insert("object");
            true
        }
        Schema::Array(_) => {
            kinds.insert("array");
            arrays.push(s);
            true
        }
        Schema::AnyOf(_) | Schema::OneOf(_) | Schema::AllOf(_) | Schema::Ref(_) => false,
        _ => {
            kinds.insert("scalar");
            true
        }
    });
    if kinds.len() > 1 {
        return false;
    }
    arrays.into_iter().all(|array| match array {
        Schema::Array(a) => a
            .items
            .as_deref()
            .is_none_or(|items| can_suggest_on_accept(items, registry, depth + 1)),
        _ => true,
    })
}

/// Generate the completions for `request`
pub fn complete(request: &CompletionRequest<'_>) -> IntelligenceResult<CompletionResult> {
    let mut registry = schema_registry(request.schema, request.definitions);
    let mut path = request.path.clone();
    let mut word = request.word.clone();

    let mut matching = unique_by_id(navigate_schema(request.schema, &path, &mut registry)?);
    if matching.is_empty() {
        // the last segment may be the word being typed
        let Some(last) = path.pop() else {
            return Ok(CompletionResult::empty(word));
        };
        matching = unique_by_id(navigate_schema(request.schema, &path, &mut registry)?);
        if matching.is_empty() {
            return Ok(CompletionResult::empty(word));
        }
        word = last.to_string();
    }

    let mut candidates: Vec<Completion<'_>> = Vec::new();
    for schema in matching {
        for mut completion in schema_completions(schema, &registry)? {
            let sub = match completion.kind {
                CompletionKind::Key => navigate_schema(
                    completion.schema,
                    &[PathSegment::Key(completion.display.clone())],
                    &mut registry,
                )?,
                CompletionKind::Value => Vec::new(),
            };

            if request.position_kind == PositionKind::Metadata
                && completion.kind == CompletionKind::Key
                && !sub.is_empty()
            {
                let execute_only = sub.iter().all(|s| tag_is_set(s, "execute-only"));
                let under_execute = path.first().and_then(PathSegment::as_key) == Some("execute");
                if execute_only != under_execute {
                    continue;
                }
            }

            match completion.kind {
                CompletionKind::Value => {
                    if is_hidden(completion.schema) {
                        continue;
                    }
                }
                CompletionKind::Key => {
                    if !sub.is_empty() && sub.iter().all(|s| is_hidden(s)) {
                        continue;
                    }
                }
            }

            if completion.kind == CompletionKind::Key && completion.suggest_on_accept {
                let nesting = format!("\n{}{}", request.comment_prefix, " ".repeat(request.indent + 2));
                if !sub.iter().all(|s| can_suggest_on_accept(s, &registry, 0)) {
                    completion.suggest_on_accept = false;
                } else if sub.iter().any(|s| schema_accepts(s, &registry, "object")) {
                    completion.value.push_str(&nesting);
                } else if sub.iter().any(|s| schema_accepts(s, &registry, "array")) {
                    completion.value.push_str(&nesting);
                    completion.value.push_str("- ");
                }
            }
            candidates.push(completion);
        }
    }

    candidates.retain(|c| c.value.starts_with(&word));
    if let Some(kind) = request.completion_position {
        candidates.retain(|c| c.kind == kind);
    }
    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert(c.value.clone()));
    candidates.sort_by(|a, b| a.value.cmp(&b.value));

    let after_colon = request
        .column
        .checked_sub(1)
        .and_then(|i| request.line.chars().nth(i))
        == Some(':');

    let completions = candidates
        .into_iter()
        .map(|c| CompletionItem {
            kind: match c.kind {
                CompletionKind::Key => "key".to_string(),
                CompletionKind::Value => "value".to_string(),
            },
            display: c.display,
            value: if after_colon { format!(" {}", c.value) } else { c.value },
            description: c.description,
            suggest_on_accept: c.suggest_on_accept,
        })
        .collect();

    Ok(CompletionResult {
        token: word,
        completions,
        cacheable: true,
    })
}

/// A completion query over one YAML region
#[derive(Debug, Clone)]
pub struct YamlCompletionQuery<'a> {
    /// The YAML text, mapped into the editor buffer
    pub code: &'a MappedString,
    /// The cursor line up to the cursor, comment prefix removed
    pub line: &'a str,
    /// The cursor, relative to `code`
    pub position: Position,
    pub schema: &'a Schema,
    pub definitions: &'a [Schema],
    pub comment_prefix: &'a str,
    pub position_kind: PositionKind,
}

impl YamlCompletionQuery<'_> {
    fn request(
        &self,
        path: Vec<PathSegment>,
        word: &str,
        indent: usize,
        completion_position: Option<CompletionKind>,
    ) -> CompletionRequest<'_> {
        CompletionRequest {
            schema: self.schema,
            definitions: self.definitions,
            path,
            word: word.to_string(),
            indent,
            comment_prefix: self.comment_prefix,
            position_kind: self.position_kind,
            completion_position,
            line: self.line,
            column: self.position.column,
        }
    }

    /// Complete keys at a path found from indentation alone
    fn complete_on_indentation(
        &self,
        line: &str,
        code: &str,
        word: &str,
        indent: usize,
    ) -> IntelligenceResult<CompletionOutcome> {
        let result = match locate_from_indentation(line, code, self.position.row) {
            Some(path) => complete(&self.request(path, word, indent, Some(CompletionKind::Key)))?,
            None => CompletionResult::empty(word),
        };
        Ok(CompletionOutcome::Completions(result))
    }
}

/// Complete at the cursor of a YAML region.
///
/// Returns `NoCompletions` when the line has content but no usable parse
/// of the region can be found.
pub fn complete_yaml(parser: &dyn GrammarParser, query: &YamlCompletionQuery<'_>) -> IntelligenceResult<CompletionOutcome> {
    let line = query.line;
    let word = if line.ends_with(':') {
        ""
    } else {
        line.rsplit(' ').next().unwrap_or_default()
    };

    if line.trim().is_empty() {
        return query.complete_on_indentation(line, query.code.value(), word, line.chars().count());
    }

    let line_len = line.chars().count();
    let trimmed_end = line.trim_end().chars().count();
    let indent = trimmed_end - line.trim().chars().count();
    // a cursor in trailing whitespace locates at the end of the text
    let trailing = if query.position.column > trimmed_end {
        line_len - trimmed_end
    } else {
        0
    };

    for attempt in ParseAttempts::new(parser, query.code, Some(query.position)) {
        let remaining: String = line.chars().take(line_len.saturating_sub(attempt.deletions)).collect();
        if remaining.trim().is_empty() {
            return query.complete_on_indentation(&remaining, attempt.code.value(), word, indent);
        }

        let Some(document) = annotate(&attempt.tree, &attempt.code)? else {
            continue;
        };
        let column = query.position.column.saturating_sub(attempt.deletions + trailing);
        let local = position_to_offset(attempt.code.value(), query.position.row, column);
        let location = locate_cursor(&document, original_offset(&attempt.code, local));

        let path = if location.with_error {
            locate_from_indentation(&remaining, attempt.code.value(), query.position.row)
        } else {
            location.path
        };
        let Some(mut path) = path else {
            return Ok(CompletionOutcome::Completions(CompletionResult::empty(word)));
        };
        if matches!(path.last(), Some(PathSegment::Key(k)) if k == word) {
            path.pop();
        }

        let on_value = line.contains(':');
        let completion_position = if on_value {
            Some(CompletionKind::Value)
        } else if !line.contains('-') {
            Some(CompletionKind::Key)
        } else {
            None
        };
        let mut result = complete(&query.request(path, word, indent, completion_position))?;
        if on_value {
            for item in &mut result.completions {
                item.suggest_on_accept = false;
            }
        }
        return Ok(CompletionOutcome::Completions(result));
    }

    tracing::debug!(row = query.position.row, "no usable parse at the cursor");
    Ok(CompletionOutcome::NoCompletions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::YamlGrammar;
    use serde_json::json;

    fn schema(value: serde_json::Value) -> Schema {
        Schema::from_json(&value).unwrap()
    }

    fn request<'a>(schema: &'a Schema, path: &[&str], word: &str) -> CompletionRequest<'a> {
        CompletionRequest {
            schema,
            definitions: &[],
            path: path.iter().map(|s| PathSegment::from(*s)).collect(),
            word: word.to_string(),
            indent: 0,
            comment_prefix: "",
            position_kind: PositionKind::Metadata,
            completion_position: None,
            line: "",
            column: 0,
        }
    }

    fn values(result: &CompletionResult) -> Vec<&str> {
        result.values()
    }

    #[test]
    fn test_prefix_completion_is_sorted() {
        let schema = schema(json!({
            "type": "object",
            "properties": {"foobar": {"type": "string"}, "foo": {"type": "string"}, "bar": {"type": "string"}}
        }));
        let result = complete(&request(&schema, &[], "foo")).unwrap();
        assert_eq!(values(&result), vec!["foo: ", "foobar: "]);
        assert!(result.cacheable);

        let result = complete(&request(&schema, &[], "qux")).unwrap();
        assert!(result.completions.is_empty());
        assert_eq!(result.token, "qux");
    }

    #[test]
    fn test_nested_keys_pre_position_the_cursor() {
        let schema = schema(json!({
            "type": "object",
            "properties": {
                "author": {"type": "object", "properties": {"name": {"type": "string"}}},
                "keywords": {"type": "array", "items": {"type": "string"}},
                "either": {"anyOf": [{"type": "string"}, {"type": "object"}]}
            }
        }));
        let mut req = request(&schema, &[], "");
        req.comment_prefix = "#| ";
        req.indent = 2;
        let result = complete(&req).unwrap();
        let by_display = |d: &str| result.completions.iter().find(|c| c.display == d).unwrap().clone();
        assert_eq!(by_display("author").value, "author: \n#|     ");
        assert_eq!(by_display("keywords").value, "keywords: \n#|     - ");
        let either = by_display("either");
        assert_eq!(either.value, "either: ");
        assert!(!either.suggest_on_accept);
    }

    #[test]
    fn test_execute_only_keys() {
        let schema = schema(json!({
            "type": "object",
            "properties": {
                "echo": {"type": "boolean", "tags": {"execute-only": true}},
                "title": {"type": "string"},
                "execute": {"type": "object", "properties": {
                    "echo": {"type": "boolean", "tags": {"execute-only": true}},
                    "daemon": {"type": "boolean"}
                }}
            }
        }));
        let result = complete(&request(&schema, &[], "")).unwrap();
        assert_eq!(values(&result), vec!["execute: \n  ", "title: "]);

        let result = complete(&request(&schema, &["execute"], "")).unwrap();
        assert_eq!(values(&result), vec!["echo: "]);

        let mut in_cell = request(&schema, &[], "");
        in_cell.position_kind = PositionKind::CodeCell;
        assert_eq!(complete(&in_cell).unwrap().completions.len(), 3);
    }

    #[test]
    fn test_hidden_values_and_keys_are_dropped() {
        let schema = schema(json!({
            "type": "object",
            "properties": {
                "shown": {"type": "string"},
                "secret": {"type": "string", "tags": {"hidden": true}},
                "mode": {"anyOf": [
                    {"enum": ["fast"]},
                    {"enum": ["slow"], "tags": {"hidden": true}}
                ]}
            }
        }));
        let result = complete(&request(&schema, &[], "")).unwrap();
        assert_eq!(values(&result), vec!["mode: ", "shown: "]);

        let result = complete(&request(&schema, &["mode"], "")).unwrap();
        assert_eq!(values(&result), vec!["fast"]);
    }

    #[test]
    fn test_partial_word_falls_back_to_parent() {
        let schema = schema(json!({
            "type": "object",
            "properties": {"echo": {"type": "boolean"}}
        }));
        let result = complete(&request(&schema, &["echo", "tr"], "")).unwrap();
        assert_eq!(result.token, "tr");
        assert_eq!(values(&result), vec!["true"]);

        let result = complete(&request(&schema, &["nothing", "here"], "x")).unwrap();
        assert_eq!(result.token, "x");
        assert!(result.completions.is_empty());
    }

    #[test]
    fn test_value_after_colon_gets_a_space() {
        let schema = schema(json!({
            "type": "object",
            "properties": {"echo": {"type": "boolean"}}
        }));
        let mut req = request(&schema, &["echo"], "");
        req.line = "echo:";
        req.column = 5;
        req.completion_position = Some(CompletionKind::Value);
        let result = complete(&req).unwrap();
        assert_eq!(values(&result), vec![" false", " true"]);
    }

    fn query<'a>(code: &'a MappedString, line: &'a str, position: Position, schema: &'a Schema) -> YamlCompletionQuery<'a> {
        YamlCompletionQuery {
            code,
            line,
            position,
            schema,
            definitions: &[],
            comment_prefix: "",
            position_kind: PositionKind::Metadata,
        }
    }

    fn cell_schema() -> Schema {
        schema(json!({
            "type": "object",
            "properties": {
                "echo": {"type": "boolean"},
                "fig-width": {"type": "number"},
                "fig-height": {"type": "number"}
            }
        }))
    }

    #[test]
    fn test_complete_partial_value() {
        let schema = cell_schema();
        let code = MappedString::new("echo: fal");
        let outcome = complete_yaml(&YamlGrammar, &query(&code, "echo: fal", Position::new(0, 9), &schema)).unwrap();
        let result = outcome.completions().unwrap();
        assert_eq!(result.token, "fal");
        assert_eq!(values(result), vec!["false"]);
        assert!(!result.completions[0].suggest_on_accept);
    }

    #[test]
    fn test_complete_partial_key_after_reparse() {
        let schema = cell_schema();
        let code = MappedString::new("echo: true\nfig-");
        let outcome = complete_yaml(&YamlGrammar, &query(&code, "fig-", Position::new(1, 4), &schema)).unwrap();
        let result = outcome.completions().unwrap();
        assert_eq!(result.token, "fig-");
        assert_eq!(values(result), vec!["fig-height: ", "fig-width: "]);
    }

    #[test]
    fn test_complete_on_blank_line() {
        let schema = cell_schema();
        let code = MappedString::new("echo: true\n");
        let outcome = complete_yaml(&YamlGrammar, &query(&code, "", Position::new(1, 0), &schema)).unwrap();
        assert_eq!(
            values(outcome.completions().unwrap()),
            vec!["echo: ", "fig-height: ", "fig-width: "]
        );
    }

    #[test]
    fn test_no_usable_parse() {
        let schema = cell_schema();
        let code = MappedString::new("[[[");
        let outcome = complete_yaml(&YamlGrammar, &query(&code, "[", Position::new(0, 1), &schema)).unwrap();
        assert_eq!(outcome, CompletionOutcome::NoCompletions);
    }
}
