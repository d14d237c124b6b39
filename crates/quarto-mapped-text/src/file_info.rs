//! Indexed original text for fast location lookups

use serde::{Deserialize, Serialize};

/// A point in the original text. `row` and `column` count from zero;
/// `column` counts characters, `offset` counts bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub offset: usize,
    pub row: usize,
    pub column: usize,
}

/// The original text of a document together with a line-break index
///
/// Every [`crate::MappedString`] derived from the same document shares one
/// of these, so translating offsets back to rows and columns stays cheap no
/// matter how many times the text was sliced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInformation {
    text: String,
    file_name: Option<String>,
    /// Byte offsets of each newline character in the text
    line_breaks: Vec<usize>,
}

impl FileInformation {
    /// Create file information by analyzing content
    ///
    /// ```
    /// use quarto_mapped_text::FileInformation;
    ///
    /// let info = FileInformation::new("hello\nworld", None);
    /// let loc = info.offset_to_location(6).unwrap();
    /// assert_eq!((loc.row, loc.column), (1, 0));
    /// ```
    pub fn new(text: impl Into<String>, file_name: Option<String>) -> Self {
        let text = text.into();
        let line_breaks = text.match_indices('\n').map(|(idx, _)| idx).collect();
        FileInformation {
            text,
            file_name,
            line_breaks,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Convert a byte offset to a Location with row and column
    ///
    /// Returns None if the offset is out of bounds.
    pub fn offset_to_location(&self, offset: usize) -> Option<Location> {
        if offset > self.text.len() {
            return None;
        }

        // A newline belongs to the line it terminates.
        let row = match self.line_breaks.binary_search(&offset) {
            Ok(idx) | Err(idx) => idx,
        };
        let line_start = if row == 0 {
            0
        } else {
            self.line_breaks[row - 1] + 1
        };
        let column = self
            .text
            .get(line_start..offset)
            .map_or(offset - line_start, |s| s.chars().count());

        Some(Location {
            offset,
            row,
            column,
        })
    }

    /// Byte offset at which `row` starts, if the row exists
    pub fn row_start(&self, row: usize) -> Option<usize> {
        match row {
            0 => Some(0),
            _ => self.line_breaks.get(row - 1).map(|b| b + 1),
        }
    }

    /// Get the number of lines in the text
    pub fn line_count(&self) -> usize {
        self.line_breaks.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_orders_by_offset_first() {
        let early = Location { offset: 3, row: 0, column: 3 };
        let late = Location { offset: 12, row: 1, column: 0 };
        assert!(early < late);
        assert_eq!(
            serde_json::to_value(late).unwrap(),
            serde_json::json!({"offset": 12, "row": 1, "column": 0})
        );
    }

    #[test]
    fn test_offset_to_location_at_newline() {
        let info = FileInformation::new("ab\ncd", None);
        let loc = info.offset_to_location(2).unwrap();
        assert_eq!((loc.row, loc.column), (0, 2));
        let loc = info.offset_to_location(3).unwrap();
        assert_eq!((loc.row, loc.column), (1, 0));
        assert!(info.offset_to_location(6).is_none());
    }

    #[test]
    fn test_row_start() {
        let info = FileInformation::new("ab\ncd\n", None);
        assert_eq!(info.row_start(0), Some(0));
        assert_eq!(info.row_start(1), Some(3));
        assert_eq!(info.row_start(2), Some(6));
        assert_eq!(info.row_start(3), None);
        assert_eq!(info.line_count(), 3);
    }
}
