//! Utility functions for working with lines and positions

use crate::file_info::Location;
use std::ops::Range;

/// A line of text together with its byte range in the enclosing string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangedLine<'a> {
    pub substring: &'a str,
    pub range: Range<usize>,
}

/// Split text into lines on `\n`, dropping a trailing `\r` from each line.
///
/// A trailing newline produces a final empty line, so `"a\n"` has two lines.
pub fn lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect()
}

/// Split text into lines, keeping the byte range of each line.
///
/// With `include_newline`, each range (and substring) extends over the line
/// terminator, so concatenating the ranges reproduces `text` exactly.
pub fn ranged_lines(text: &str, include_newline: bool) -> Vec<RangedLine<'_>> {
    let mut result = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices('\n') {
        let end = if include_newline {
            idx + 1
        } else if idx > start && text.as_bytes()[idx - 1] == b'\r' {
            idx - 1
        } else {
            idx
        };
        result.push(RangedLine {
            substring: &text[start..end],
            range: start..end,
        });
        start = idx + 1;
    }
    result.push(RangedLine {
        substring: &text[start..],
        range: start..text.len(),
    });
    result
}

/// Byte offsets at which each line starts
pub fn line_offsets(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
        .collect()
}

/// Convert a byte offset to a Location with line and column info
///
/// Returns None if the offset is out of bounds.
pub fn offset_to_location(source: &str, offset: usize) -> Option<Location> {
    if offset > source.len() {
        return None;
    }

    let mut row = 0;
    let mut column = 0;

    for (idx, ch) in source.char_indices() {
        if idx >= offset {
            break;
        }
        if ch == '\n' {
            row += 1;
            column = 0;
        } else {
            column += 1;
        }
    }

    Some(Location {
        offset,
        row,
        column,
    })
}

/// Convert line and column numbers to a byte offset
///
/// Line and column are 0-indexed. Returns None if out of bounds.
pub fn line_col_to_offset(source: &str, line: usize, col: usize) -> Option<usize> {
    let mut current_line = 0;
    let mut current_col = 0;

    for (offset, ch) in source.char_indices() {
        if current_line == line && current_col == col {
            return Some(offset);
        }

        if ch == '\n' {
            current_line += 1;
            current_col = 0;
        } else {
            current_col += 1;
        }
    }

    if current_line == line && current_col == col {
        return Some(source.len());
    }

    None
}

/// Convert an editor position to a byte offset, clamping instead of failing.
///
/// Columns past the end of the line land on the line terminator; rows past
/// the end of the text land at the end of the text.
pub fn position_to_offset(source: &str, row: usize, column: usize) -> usize {
    let Some(line) = ranged_lines(source, false).into_iter().nth(row) else {
        return source.len();
    };
    line.substring
        .char_indices()
        .nth(column)
        .map_or(line.range.end, |(idx, _)| line.range.start + idx)
}
