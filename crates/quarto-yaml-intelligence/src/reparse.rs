//! Recover usable parses from a document that is being typed
//!
//! While the user types, the line under the cursor is usually invalid
//! (`fig-`, `echo: fal`). [`ParseAttempts`] first tries the text as-is,
//! then cuts away one more character before the cursor per step and
//! tries again, yielding every attempt whose root is not an error.

use quarto_mapped_text::{MappedString, ranged_lines};

use crate::context::Position;
use crate::grammar::{ConcreteNode, GrammarParser};

/// A parse of `code`, which is the input with `deletions` characters
/// removed in front of the cursor.
#[derive(Debug, Clone)]
pub struct ParseAttempt {
    pub tree: ConcreteNode,
    pub code: MappedString,
    pub deletions: usize,
}

/// Lazy sequence of successful parses, least edited first.
///
/// At most `column + 1` parses are attempted.
pub struct ParseAttempts<'a> {
    parser: &'a dyn GrammarParser,
    code: &'a MappedString,
    stage: Stage,
    /// Byte offset of each character boundary on the cursor line, up to
    /// the cursor
    boundaries: Vec<usize>,
    deletions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    AsIs,
    Deleting,
}

impl<'a> ParseAttempts<'a> {
    /// Attempts for a cursor at `cursor`; without a cursor only the
    /// unmodified text is tried.
    pub fn new(parser: &'a dyn GrammarParser, code: &'a MappedString, cursor: Option<Position>) -> Self {
        let boundaries = cursor
            .and_then(|position| cursor_line_boundaries(code.value(), position))
            .unwrap_or_default();
        ParseAttempts {
            parser,
            code,
            stage: Stage::AsIs,
            boundaries,
            deletions: 0,
        }
    }

    fn column(&self) -> usize {
        self.boundaries.len().saturating_sub(1)
    }
}

/// Character boundaries of the cursor's line, from the line start to the
/// cursor column (clamped to the line)
fn cursor_line_boundaries(text: &str, position: Position) -> Option<Vec<usize>> {
    let line = ranged_lines(text, false).into_iter().nth(position.row)?;
    let boundaries = line
        .substring
        .char_indices()
        .map(|(idx, _)| line.range.start + idx)
        .chain(std::iter::once(line.range.end))
        .take(position.column + 1)
        .collect();
    Some(boundaries)
}

impl Iterator for ParseAttempts<'_> {
    type Item = ParseAttempt;

    fn next(&mut self) -> Option<ParseAttempt> {
        if self.stage == Stage::AsIs {
            self.stage = Stage::Deleting;
            let tree = self.parser.parse(self.code.value());
            if !tree.is_error() {
                return Some(ParseAttempt {
                    tree,
                    code: self.code.clone(),
                    deletions: 0,
                });
            }
        }

        let column = self.column();
        while self.deletions < column {
            self.deletions += 1;
            let cut_start = self.boundaries[column - self.deletions];
            let cut_end = self.boundaries[column];
            let code = MappedString::mapped(self.code, [0..cut_start, cut_end..self.code.len()]);
            let tree = self.parser.parse(code.value());
            if !tree.is_error() {
                tracing::trace!(deletions = self.deletions, "recovered parse");
                return Some(ParseAttempt {
                    tree,
                    code,
                    deletions: self.deletions,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{NodeKind, YamlGrammar};
    use std::sync::Mutex;

    /// Grammar that rejects everything and records what it was asked
    #[derive(Default)]
    struct Rejecting {
        seen: Mutex<Vec<String>>,
    }

    impl GrammarParser for Rejecting {
        fn parse(&self, source: &str) -> ConcreteNode {
            self.seen.lock().unwrap().push(source.to_string());
            ConcreteNode::new(NodeKind::Error, 0, source.len())
        }
    }

    #[test]
    fn test_valid_text_is_yielded_first() {
        let code = MappedString::new("echo: true\n");
        let first = ParseAttempts::new(&YamlGrammar, &code, Some(Position { row: 0, column: 10 }))
            .next()
            .unwrap();
        assert_eq!(first.deletions, 0);
        assert_eq!(first.code.value(), "echo: true\n");
    }

    #[test]
    fn test_deletes_back_to_a_valid_document() {
        let code = MappedString::new("echo: true\nfig-");
        let attempt = ParseAttempts::new(&YamlGrammar, &code, Some(Position { row: 1, column: 4 }))
            .next()
            .unwrap();
        assert_eq!(attempt.deletions, 4);
        assert_eq!(attempt.code.value(), "echo: true\n");
    }

    #[test]
    fn test_deletion_keeps_text_after_cursor() {
        let parser = Rejecting::default();
        let code = MappedString::new("a: 1\nbc: xy\nd: 2");
        let attempts: Vec<_> = ParseAttempts::new(&parser, &code, Some(Position { row: 1, column: 5 })).collect();
        assert!(attempts.is_empty());
        let seen = parser.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                "a: 1\nbc: xy\nd: 2",
                "a: 1\nbc: y\nd: 2",
                "a: 1\nbc:y\nd: 2",
                "a: 1\nbcy\nd: 2",
                "a: 1\nby\nd: 2",
                "a: 1\ny\nd: 2",
            ]
        );
    }

    #[test]
    fn test_attempts_are_bounded_by_column() {
        let parser = Rejecting::default();
        let code = MappedString::new("x: [\n");
        let count = ParseAttempts::new(&parser, &code, Some(Position { row: 0, column: 40 })).count();
        assert_eq!(count, 0);
        // the column is clamped to the line, so 1 + 4 parses
        assert_eq!(parser.seen.lock().unwrap().len(), 5);
    }

    #[test]
    fn test_row_out_of_range_only_tries_as_is() {
        let parser = Rejecting::default();
        let code = MappedString::new("a: [");
        let count = ParseAttempts::new(&parser, &code, Some(Position { row: 3, column: 2 })).count();
        assert_eq!(count, 0);
        assert_eq!(parser.seen.lock().unwrap().len(), 1);
    }
}
