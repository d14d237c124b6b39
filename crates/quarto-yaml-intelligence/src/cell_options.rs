//! `#|` option comments at the top of code cells

use std::collections::HashMap;

use once_cell::sync::Lazy;
use quarto_mapped_text::{Chunk, MappedString, lines, ranged_lines};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Comment syntax of a language: a line comment, or an open/close pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommentChars {
    Line(String),
    Block(String, String),
}

impl CommentChars {
    fn line(open: &str) -> Self {
        CommentChars::Line(open.to_string())
    }

    pub fn open(&self) -> &str {
        match self {
            CommentChars::Line(open) | CommentChars::Block(open, _) => open,
        }
    }

    pub fn close(&self) -> Option<&str> {
        match self {
            CommentChars::Line(_) => None,
            CommentChars::Block(_, close) => Some(close),
        }
    }

    /// The prefix that marks an option line, e.g. `#| `
    pub fn option_prefix(&self) -> String {
        format!("{}| ", self.open())
    }
}

fn builtin_comment_chars(language: &str) -> CommentChars {
    match language {
        "r" | "python" | "julia" | "powershell" | "bash" | "stan" | "octave" | "awk" | "gawk" | "sed"
        | "perl" | "ruby" | "coffee" => CommentChars::line("#"),
        "scala" | "csharp" | "fsharp" | "cpp" | "cc" | "java" | "groovy" | "js" | "d3" | "node"
        | "sass" | "go" | "asy" | "dot" | "ojs" => CommentChars::line("//"),
        "matlab" | "tikz" => CommentChars::line("%"),
        "c" | "css" => CommentChars::Block("/*".into(), "*/".into()),
        "sas" => CommentChars::Block("*".into(), ";".into()),
        "sql" | "mysql" | "psql" | "lua" | "haskell" => CommentChars::line("--"),
        "fortran" | "fortran95" => CommentChars::line("!"),
        "stata" => CommentChars::line("*"),
        _ => CommentChars::line("#"),
    }
}

/// Comment characters per language: the built-in table plus overrides.
///
/// Unknown languages use `#`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCommentChars {
    overrides: HashMap<String, CommentChars>,
}

impl LanguageCommentChars {
    pub fn new(overrides: HashMap<String, CommentChars>) -> Self {
        LanguageCommentChars { overrides }
    }

    pub fn get(&self, language: &str) -> CommentChars {
        self.overrides
            .get(language)
            .cloned()
            .unwrap_or_else(|| builtin_comment_chars(language))
    }
}

/// Extract the YAML carried by the option lines at the top of `code`.
///
/// Option lines start with the option prefix and, for block comments,
/// end with the closing characters. The first other line ends the
/// options. Returns `None` when there are no option lines.
pub fn partition_cell_options(code: &MappedString, comment: &CommentChars) -> Option<MappedString> {
    let prefix = comment.option_prefix();
    let mut chunks: Vec<Chunk> = Vec::new();

    for line in ranged_lines(code.value(), true) {
        let Some(rest) = line.substring.strip_prefix(prefix.as_str()) else {
            break;
        };
        let start = line.range.start + prefix.len();
        match comment.close() {
            None => chunks.push(Chunk::Source(start..start + rest.len())),
            Some(close) => {
                let Some(option) = rest.trim_end().strip_suffix(close) else {
                    break;
                };
                chunks.push(Chunk::Source(start..start + option.len()));
                chunks.push(Chunk::Text("\n".into()));
            }
        }
    }

    if chunks.is_empty() {
        None
    } else {
        Some(MappedString::mapped(code, chunks))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOptionsFormat {
    Yaml,
    /// knitr's `key=value,` style
    Knitr,
}

static NO_INDENT_OR_COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^:\s]+[^:]+$").unwrap());

/// Guess whether cell options are YAML or knitr-style `key=value` pairs
pub fn guess_chunk_options_format(options: &str) -> ChunkOptionsFormat {
    let option_lines = lines(options);
    if !option_lines.iter().any(|l| NO_INDENT_OR_COLON.is_match(l)) {
        return ChunkOptionsFormat::Yaml;
    }
    if option_lines
        .iter()
        .any(|l| !l.trim().is_empty() && !l.trim_end().ends_with(',') && !l.contains('='))
    {
        return ChunkOptionsFormat::Yaml;
    }
    ChunkOptionsFormat::Knitr
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_comment_chars_table() {
        let table = LanguageCommentChars::default();
        assert_eq!(table.get("python").option_prefix(), "#| ");
        assert_eq!(table.get("ojs").option_prefix(), "//| ");
        assert_eq!(table.get("sql").open(), "--");
        assert_eq!(table.get("c").close(), Some("*/"));
        assert_eq!(table.get("no-such-language").open(), "#");
    }

    #[test]
    fn test_overrides_load_from_json() {
        let table: LanguageCommentChars = serde_json::from_value(json!({
            "mermaid": "%%",
            "sas": ["/*", "*/"]
        }))
        .unwrap();
        assert_eq!(table.get("mermaid"), CommentChars::Line("%%".into()));
        assert_eq!(table.get("sas").close(), Some("*/"));
        assert_eq!(table.get("r").open(), "#");
    }

    #[test]
    fn test_partition_line_comments() {
        let code = MappedString::new("#| echo: false\n#| label: fig-x\nplot(1)\n#| not: options\n");
        let yaml = partition_cell_options(&code, &CommentChars::line("#")).unwrap();
        assert_eq!(yaml.value(), "echo: false\nlabel: fig-x\n");
        assert_eq!(yaml.map(0), Some(3));
        assert_eq!(yaml.map(12), Some(18));
    }

    #[test]
    fn test_partition_block_comments() {
        let code = MappedString::new("/*| echo: false */\n/*| eval: true */\nint x;\n");
        let comment = CommentChars::Block("/*".into(), "*/".into());
        let yaml = partition_cell_options(&code, &comment).unwrap();
        assert_eq!(yaml.value(), "echo: false \neval: true \n");
        assert_eq!(yaml.map(0), Some(4));
    }

    #[test]
    fn test_partition_without_options() {
        let code = MappedString::new("print(1)\n#| echo: false\n");
        assert!(partition_cell_options(&code, &CommentChars::line("#")).is_none());
    }

    #[test]
    fn test_guess_chunk_options_format() {
        assert_eq!(guess_chunk_options_format("echo: true\nfig-width: 4\n"), ChunkOptionsFormat::Yaml);
        assert_eq!(guess_chunk_options_format("echo=FALSE,\nfig.width=4\n"), ChunkOptionsFormat::Knitr);
        assert_eq!(guess_chunk_options_format("echo=FALSE\nplain text here\n"), ChunkOptionsFormat::Yaml);
    }
}
