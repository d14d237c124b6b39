//! Split Quarto markdown into cells
//!
//! A document is a run of cells: front matter (`---` fenced YAML), prose,
//! executable code cells (```` ```{python} ````) and block shortcode
//! directives. Each cell keeps the rows it spans so a cursor can be
//! attributed to it.

use std::ops::Range;

use once_cell::sync::Lazy;
use quarto_mapped_text::{MappedString, RangedLine, ranged_lines};
use regex::Regex;

static YAML_DELIMITER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^---\s*$").unwrap());
static CODE_CELL_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(```+)\s*\{([=A-Za-z]+)( *[ ,].*)?\}\s*$").unwrap());
static CODE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^```").unwrap());
static CODE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*```+\s*$").unwrap());
static BLOCK_SHORTCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\{\{<\s*([A-Za-z0-9_-]+)[^>]*>\}\}\s*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellKind {
    /// Front matter, delimiters included
    Raw,
    Markdown,
    Code { language: String },
    /// A block shortcode such as `{{< include _a.qmd >}}`
    Directive { name: String },
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub kind: CellKind,
    /// Cell text. For code cells this excludes the fences.
    pub source: MappedString,
    /// First row of the cell (the opening fence for code cells)
    pub start_line: usize,
    /// Rows spanned, fences included
    pub line_count: usize,
}

impl Cell {
    pub fn contains_row(&self, row: usize) -> bool {
        self.start_line <= row && row < self.start_line + self.line_count
    }
}

/// Backticks in the first word of a fence line
fn tick_count(line: &str) -> usize {
    line.trim_start()
        .split(' ')
        .next()
        .map_or(0, |word| word.chars().filter(|&c| c == '`').count())
}

struct Splitter<'a> {
    src: &'a MappedString,
    cells: Vec<Cell>,
    buffer: Vec<Range<usize>>,
    buffer_start: usize,
}

impl Splitter<'_> {
    fn push(&mut self, row: usize, line: &RangedLine<'_>) {
        if self.buffer.is_empty() {
            self.buffer_start = row;
        }
        self.buffer.push(line.range.clone());
    }

    fn flush(&mut self, kind: CellKind) {
        if self.buffer.is_empty() {
            return;
        }
        // only the empty last line of a document has an empty range
        let line_count = self.buffer.iter().filter(|r| !r.is_empty()).count();
        let source = MappedString::mapped(self.src, self.buffer.drain(..));
        if source.value().trim().is_empty() {
            return;
        }
        self.cells.push(Cell {
            kind,
            source,
            start_line: self.buffer_start,
            line_count,
        });
    }

    fn flush_code(&mut self, language: &str, fence_row: usize, end_row: usize) {
        let source = MappedString::mapped(self.src, self.buffer.drain(..));
        self.cells.push(Cell {
            kind: CellKind::Code {
                language: language.to_string(),
            },
            source,
            start_line: fence_row,
            line_count: end_row - fence_row + 1,
        });
    }
}

fn is_yaml_delimiter(lines: &[RangedLine<'_>], index: usize, skip_rules: bool) -> bool {
    if !YAML_DELIMITER.is_match(lines[index].substring) {
        return false;
    }
    // a `---` between blank lines is a horizontal rule
    let blank = |i: usize| lines.get(i).is_some_and(|l| l.substring.trim().is_empty());
    !(skip_rules && index > 0 && blank(index - 1) && blank(index + 1))
}

/// Break a document into cells.
///
/// Unterminated front matter or code cells at the end of the document
/// fall back to markdown. Cells that hold only whitespace are dropped,
/// except code cells.
pub fn break_quarto_md(src: &MappedString) -> Vec<Cell> {
    let lines = ranged_lines(src.value(), true);
    let mut splitter = Splitter {
        src,
        cells: Vec::new(),
        buffer: Vec::new(),
        buffer_start: 0,
    };

    let mut in_yaml = false;
    let mut in_code_cell = false;
    let mut in_code = 0usize;
    let mut language = String::new();
    let mut fence_row = 0;

    for (row, line) in lines.iter().enumerate() {
        let text = line.substring;
        let plain = !in_code_cell && in_code == 0 && !in_yaml;

        if !in_code_cell && in_code == 0 && is_yaml_delimiter(&lines, row, !in_yaml) {
            if in_yaml {
                splitter.push(row, line);
                splitter.flush(CellKind::Raw);
                in_yaml = false;
            } else {
                splitter.flush(CellKind::Markdown);
                splitter.push(row, line);
                in_yaml = true;
            }
        } else if plain && let Some(caps) = BLOCK_SHORTCODE.captures(text) {
            splitter.flush(CellKind::Markdown);
            splitter.push(row, line);
            splitter.flush(CellKind::Directive {
                name: caps[1].to_string(),
            });
        } else if plain && let Some(caps) = CODE_CELL_START.captures(text) {
            splitter.flush(CellKind::Markdown);
            language = caps[2].to_string();
            in_code_cell = true;
            in_code = tick_count(text);
            fence_row = row;
        } else if in_code > 0 && CODE_END.is_match(text) && tick_count(text) == in_code {
            in_code = 0;
            if in_code_cell {
                in_code_cell = false;
                splitter.flush_code(&language, fence_row, row);
            } else {
                splitter.push(row, line);
            }
        } else if in_code == 0 && CODE_START.is_match(text) {
            in_code = tick_count(text);
            splitter.push(row, line);
        } else {
            splitter.push(row, line);
        }
    }

    if in_code_cell {
        // the opening fence was never buffered; an unterminated cell is prose
        let fence = lines[fence_row].range.clone();
        splitter.buffer.insert(0, fence);
        splitter.buffer_start = fence_row;
    }
    splitter.flush(CellKind::Markdown);
    splitter.cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(cells: &[Cell]) -> Vec<(CellKind, usize, usize)> {
        cells
            .iter()
            .map(|c| (c.kind.clone(), c.start_line, c.line_count))
            .collect()
    }

    fn code(language: &str) -> CellKind {
        CellKind::Code {
            language: language.into(),
        }
    }

    #[test]
    fn test_front_matter_prose_and_code() {
        let doc = MappedString::new(
            "---\ntitle: x\n---\n\nSome prose.\n\n```{python}\n#| echo: false\nprint(1)\n```\n",
        );
        let cells = break_quarto_md(&doc);
        assert_eq!(
            kinds(&cells),
            vec![
                (CellKind::Raw, 0, 3),
                (CellKind::Markdown, 3, 3),
                (code("python"), 6, 4),
            ]
        );
        assert_eq!(cells[0].source.value(), "---\ntitle: x\n---\n");
        assert_eq!(cells[2].source.value(), "#| echo: false\nprint(1)\n");
        assert_eq!(cells[2].source.map(0), Some(doc.value().find("#|").unwrap()));
    }

    #[test]
    fn test_horizontal_rule_is_not_front_matter() {
        let doc = MappedString::new("Intro\n\n---\n\nMore\n");
        let cells = break_quarto_md(&doc);
        assert_eq!(kinds(&cells), vec![(CellKind::Markdown, 0, 5)]);
    }

    #[test]
    fn test_plain_fences_stay_in_markdown() {
        let doc = MappedString::new("````\n```{r}\nx\n```\n````\n```{r}\ny\n```\n");
        let cells = break_quarto_md(&doc);
        assert_eq!(
            kinds(&cells),
            vec![(CellKind::Markdown, 0, 5), (code("r"), 5, 3)]
        );
    }

    #[test]
    fn test_block_shortcode_is_a_directive() {
        let doc = MappedString::new("Text\n{{< include _part.qmd >}}\nMore\n");
        let cells = break_quarto_md(&doc);
        assert_eq!(
            kinds(&cells),
            vec![
                (CellKind::Markdown, 0, 1),
                (
                    CellKind::Directive {
                        name: "include".into()
                    },
                    1,
                    1
                ),
                (CellKind::Markdown, 2, 1),
            ]
        );
    }

    #[test]
    fn test_empty_code_cell_is_kept() {
        let doc = MappedString::new("```{r}\n```\n");
        let cells = break_quarto_md(&doc);
        assert_eq!(kinds(&cells), vec![(code("r"), 0, 2)]);
        assert!(cells[0].source.is_empty());
    }

    #[test]
    fn test_unterminated_cells_fall_back_to_markdown() {
        let doc = MappedString::new("---\ntitle: x\n");
        assert_eq!(kinds(&break_quarto_md(&doc)), vec![(CellKind::Markdown, 0, 2)]);

        let doc = MappedString::new("```{r}\nx <- 1\n");
        let cells = break_quarto_md(&doc);
        assert_eq!(kinds(&cells), vec![(CellKind::Markdown, 0, 2)]);
        assert_eq!(cells[0].source.value(), "```{r}\nx <- 1\n");
    }

    #[test]
    fn test_contains_row() {
        let doc = MappedString::new("---\na: 1\n---\n```{r}\n1\n```\n");
        let cells = break_quarto_md(&doc);
        assert!(cells[0].contains_row(2));
        assert!(!cells[0].contains_row(3));
        assert!(cells[1].contains_row(3) && cells[1].contains_row(5));
    }
}
