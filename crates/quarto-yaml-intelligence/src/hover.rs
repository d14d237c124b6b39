//! Documentation for the key under the cursor

use std::collections::HashMap;

use quarto_mapped_text::{MappedString, lines};
use quarto_yaml_validation::{AnnotatedParse, PathSegment, Schema, navigate_schema};
use serde_json::Value;

use crate::annotate::annotate;
use crate::completions::schema_registry;
use crate::context::{Hover, HoverRange, Position, YamlIntelligenceContext};
use crate::dispatch::Dispatcher;
use crate::error::IntelligenceResult;

/// Map each outer row that starts a mapping key to the path of that key.
/// When one row holds several keys the last one wins.
fn key_rows(document: &AnnotatedParse, code: &MappedString) -> HashMap<usize, Vec<PathSegment>> {
    fn walk(
        node: &AnnotatedParse,
        code: &MappedString,
        path: &mut Vec<PathSegment>,
        rows: &mut HashMap<usize, Vec<PathSegment>>,
    ) {
        if node.kind.is_mapping() {
            for (key, value) in node.entries() {
                path.push(PathSegment::Key(key.key_text()));
                if let Some(location) = code.file_information().offset_to_location(key.start) {
                    rows.insert(location.row, path.clone());
                }
                walk(value, code, path, rows);
                path.pop();
            }
        } else if node.kind.is_sequence() {
            for (index, item) in node.components.iter().enumerate() {
                path.push(PathSegment::Index(index));
                walk(item, code, path, rows);
                path.pop();
            }
        }
    }

    let mut rows = HashMap::new();
    walk(document, code, &mut Vec::new(), &mut rows);
    rows
}

/// The long description of a schema: a `description` tag (plain, or the
/// `long` form of a short/long pair), else its own description
fn describe(schema: &Schema) -> Option<String> {
    let annotations = schema.annotations();
    match annotations.tag("description") {
        Some(Value::String(text)) => return Some(text.clone()),
        Some(Value::Object(forms)) => {
            if let Some(Value::String(text)) = forms.get("long") {
                return Some(text.clone());
            }
        }
        _ => {}
    }
    annotations
        .description
        .clone()
        .or_else(|| annotations.documentation.clone())
}

pub(crate) fn hover(dispatcher: &Dispatcher<'_>, context: &YamlIntelligenceContext) -> IntelligenceResult<Option<Hover>> {
    let Some(region) = dispatcher.region_at_cursor(context) else {
        return Ok(None);
    };
    let Some(schema) = dispatcher.catalog.get(&region.schema_name) else {
        return Ok(None);
    };

    let tree = dispatcher.parser.parse(region.code.value());
    let Some(document) = annotate(&tree, &region.code)? else {
        tracing::debug!("no parse to hover over");
        return Ok(None);
    };
    let rows = key_rows(&document, &region.code);
    let Some(path) = rows.get(&context.position.row) else {
        return Ok(None);
    };
    let Some(key) = path.last() else {
        return Ok(None);
    };

    let definitions = dispatcher.catalog.definitions();
    let mut registry = schema_registry(schema, definitions);
    let mut sections = Vec::new();
    for matching in navigate_schema(schema, path, &mut registry)? {
        if let Some(text) = describe(registry.resolve(matching)?) {
            sections.push(text);
        }
    }

    let width = lines(&context.code)
        .get(context.position.row)
        .map_or(0, |line| line.chars().count());
    Ok(Some(Hover {
        content: format!("**{key}**\n\n{}", sections.join("\n\n")),
        range: HoverRange {
            start: Position::new(context.position.row, 0),
            end: Position::new(context.position.row, width),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FRONT_MATTER, SchemaCatalog};
    use crate::context::FileType;
    use crate::grammar::YamlGrammar;
    use crate::validator_queue::ValidatorQueue;
    use serde_json::json;

    fn hover_at(code: &str, filetype: FileType, row: usize) -> Option<Hover> {
        let front_matter = Schema::from_json(&json!({
            "type": "object",
            "properties": {
                "title": {"type": "string", "description": "Document title"},
                "format": {
                    "type": "object",
                    "tags": {"description": {"short": "Output", "long": "Output formats to render"}},
                    "properties": {"html": {"$ref": "html-options"}}
                }
            }
        }))
        .unwrap();
        let html = Schema::from_json(&json!({
            "$id": "html-options",
            "type": "object",
            "tags": {"description": "HTML output"}
        }))
        .unwrap();
        let catalog = SchemaCatalog::new()
            .with_schema(FRONT_MATTER, front_matter)
            .with_definitions(vec![html]);
        let queue = ValidatorQueue::new();
        let dispatcher = Dispatcher {
            catalog: &catalog,
            parser: &YamlGrammar,
            queue: &queue,
        };
        let context = YamlIntelligenceContext::new(filetype, code, Position::new(row, 0)).with_path("doc.qmd");
        hover(&dispatcher, &context).unwrap()
    }

    #[test]
    fn test_hover_on_front_matter_keys() {
        let doc = "---\ntitle: Hi\nformat:\n  html: default\n---\n\nText\n";

        let title = hover_at(doc, FileType::Markdown, 1).unwrap();
        assert_eq!(title.content, "**title**\n\nDocument title");
        assert_eq!(title.range.end, Position::new(1, 9));

        let format = hover_at(doc, FileType::Markdown, 2).unwrap();
        assert_eq!(format.content, "**format**\n\nOutput formats to render");

        let html = hover_at(doc, FileType::Markdown, 3).unwrap();
        assert_eq!(html.content, "**html**\n\nHTML output");
    }

    #[test]
    fn test_no_hover_off_keys() {
        let doc = "---\ntitle: Hi\n---\n\nText\n";
        assert!(hover_at(doc, FileType::Markdown, 0).is_none());
        assert!(hover_at(doc, FileType::Markdown, 4).is_none());
    }

    #[test]
    fn test_hover_in_yaml_file() {
        let hover = hover_at("title: Hi\n", FileType::Yaml, 0).unwrap();
        assert_eq!(hover.content, "**title**\n\nDocument title");
    }
}
