//! Locate the cursor from indentation alone
//!
//! When no parse survives, or the cursor sits on a blank line, the path
//! is guessed from the shape of the text: each line hangs off the closest
//! earlier line that is indented less. Sequence entries always report
//! index `0`, since only the schema path matters for completions.

use quarto_mapped_text::lines;
use quarto_yaml_validation::PathSegment;

/// For every line, its structural parent (the nearest earlier line
/// indented less), plus each line's indentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentTree {
    pub predecessor: Vec<Option<usize>>,
    pub indentation: Vec<usize>,
}

fn indent_of(line: &str) -> usize {
    line.chars().count() - line.trim_start().chars().count()
}

impl IndentTree {
    pub fn new(code: &str) -> Self {
        let mut predecessor: Vec<Option<usize>> = Vec::new();
        let mut indentation = Vec::new();
        let mut current: Option<usize> = None;
        let mut previous: Option<usize> = None;

        for (idx, line) in lines(code).into_iter().enumerate() {
            let indent = indent_of(line);
            indentation.push(indent);

            let parent = if current.is_none_or(|c| indent > c) {
                let parent = previous;
                previous = Some(idx);
                current = Some(indent);
                parent
            } else if line.trim().is_empty() {
                previous.and_then(|p| predecessor[p])
            } else if current == Some(indent) {
                let parent = previous.and_then(|p| predecessor[p]);
                previous = Some(idx);
                parent
            } else {
                let mut walk = previous;
                while let Some(p) = walk
                    && indentation[p] >= indent
                {
                    walk = predecessor[p];
                }
                previous = Some(idx);
                current = Some(indent);
                walk
            };
            predecessor.push(parent);
        }

        IndentTree {
            predecessor,
            indentation,
        }
    }

    /// `row` followed by its chain of structural parents
    pub fn ancestors(&self, row: usize) -> Vec<usize> {
        let mut result = Vec::new();
        let mut current = (row < self.predecessor.len()).then_some(row);
        while let Some(r) = current {
            result.push(r);
            current = self.predecessor[r];
        }
        result
    }
}

/// Guess the path at `row` of `code`, where `line` is the cursor line up
/// to the cursor.
///
/// Returns `None` when a line on the way up is neither a `key:` line nor
/// a sequence entry, i.e. the cursor sits under a scalar.
pub fn locate_from_indentation(line: &str, code: &str, row: usize) -> Option<Vec<PathSegment>> {
    let tree = IndentTree::new(code);
    let ls = lines(code);
    if row >= ls.len() {
        return None;
    }

    let line_indent = indent_of(line);
    let mut path = Vec::new();
    let mut current = Some(row);
    while let Some(line_no) = current {
        let trimmed = ls[line_no].trim();

        if trimmed.is_empty() {
            // locate through the nearest non-blank line above
            let Some(prev) = (0..line_no).rev().find(|&p| !ls[p].trim().is_empty()) else {
                break;
            };
            let prev_indent = tree.indentation[prev];
            if prev_indent < line_indent {
                current = Some(prev);
                continue;
            }
            if prev_indent > line_indent {
                current = (0..prev)
                    .rev()
                    .find(|&p| !ls[p].trim().is_empty() && tree.indentation[p] < line_indent);
                continue;
            }
        }

        if line_indent >= tree.indentation[line_no] && !trimmed.is_empty() {
            if trimmed.starts_with('-') {
                path.push(PathSegment::Index(0));
            } else if let Some(key) = trimmed.strip_suffix(':') {
                path.push(PathSegment::Key(key.to_string()));
            } else if line_no != row {
                tracing::debug!(line = line_no, "indentation walk hit a scalar line");
                return None;
            }
        }
        current = tree.predecessor[line_no];
    }

    path.reverse();
    Some(path)
}
