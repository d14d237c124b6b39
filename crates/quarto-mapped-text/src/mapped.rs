//! Strings that remember where their characters came from

use crate::file_info::FileInformation;
use crate::file_info::Location;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

/// One piece of a string being assembled by [`MappedString::mapped`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// A byte range of the source mapped string
    Source(Range<usize>),
    /// Literal text with no counterpart in the original
    Text(String),
}

impl From<Range<usize>> for Chunk {
    fn from(range: Range<usize>) -> Self {
        Chunk::Source(range)
    }
}

impl From<&str> for Chunk {
    fn from(text: &str) -> Self {
        Chunk::Text(text.to_string())
    }
}

impl From<String> for Chunk {
    fn from(text: String) -> Self {
        Chunk::Text(text)
    }
}

/// A contiguous run of `value` and where it starts in the original text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Piece {
    offset: usize,
    len: usize,
    original: Option<usize>,
}

impl Piece {
    fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// An immutable string with a byte-offset map back to an original document
///
/// Pieces always point into the outermost original, so mapping through any
/// number of nested slices is a single binary search.
#[derive(Debug, Clone)]
pub struct MappedString {
    value: String,
    pieces: Vec<Piece>,
    source: Arc<FileInformation>,
}

impl MappedString {
    /// The identity mapping over `text`
    pub fn new(text: impl Into<String>) -> Self {
        Self::from_info(FileInformation::new(text, None))
    }

    /// The identity mapping over the contents of a named file
    pub fn with_file(text: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self::from_info(FileInformation::new(text, Some(file_name.into())))
    }

    fn from_info(info: FileInformation) -> Self {
        let value = info.text().to_string();
        let pieces = if value.is_empty() {
            Vec::new()
        } else {
            vec![Piece {
                offset: 0,
                len: value.len(),
                original: Some(0),
            }]
        };
        MappedString {
            value,
            pieces,
            source: Arc::new(info),
        }
    }

    /// Assemble a new mapped string out of ranges of `source` and literal text.
    ///
    /// Ranges are clamped to `source`; a range that does not fall on
    /// character boundaries contributes nothing.
    pub fn mapped<I, C>(source: &MappedString, chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Chunk>,
    {
        let mut value = String::new();
        let mut pieces = Vec::new();

        for chunk in chunks {
            match chunk.into() {
                Chunk::Source(range) => {
                    let end = range.end.min(source.value.len());
                    let start = range.start.min(end);
                    let Some(text) = source.value.get(start..end) else {
                        continue;
                    };
                    for piece in source.overlapping(start, end) {
                        let lo = start.max(piece.offset);
                        let hi = end.min(piece.end());
                        push_piece(
                            &mut pieces,
                            Piece {
                                offset: value.len() + (lo - start),
                                len: hi - lo,
                                original: piece.original.map(|o| o + (lo - piece.offset)),
                            },
                        );
                    }
                    value.push_str(text);
                }
                Chunk::Text(text) => {
                    push_piece(
                        &mut pieces,
                        Piece {
                            offset: value.len(),
                            len: text.len(),
                            original: None,
                        },
                    );
                    value.push_str(&text);
                }
            }
        }

        MappedString {
            value,
            pieces,
            source: Arc::clone(&source.source),
        }
    }

    /// Shorthand for a single-range [`MappedString::mapped`]
    pub fn substring(&self, start: usize, end: usize) -> Self {
        Self::mapped(self, [start..end])
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// The full text of the original document
    pub fn original(&self) -> &str {
        self.source.text()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.source.file_name()
    }

    pub fn file_information(&self) -> &FileInformation {
        &self.source
    }

    /// Exact original offset of the character at `offset`.
    ///
    /// Inserted text and out-of-range offsets have no image.
    pub fn map(&self, offset: usize) -> Option<usize> {
        let idx = self
            .pieces
            .partition_point(|p| p.offset <= offset)
            .checked_sub(1)?;
        let piece = self.pieces[idx];
        if offset < piece.end() {
            piece.original.map(|o| o + (offset - piece.offset))
        } else {
            None
        }
    }

    /// Original offset of the character at `offset`, or of the closest
    /// original character before it.
    ///
    /// Offsets inside text that came from the original map exactly. Offsets
    /// that fall in inserted text or past the end map to the last original
    /// character preceding them.
    pub fn map_closest(&self, offset: usize) -> Option<usize> {
        if self.pieces.is_empty() {
            return None;
        }
        let idx = self
            .pieces
            .partition_point(|p| p.offset <= offset)
            .saturating_sub(1);
        let piece = self.pieces[idx];
        if let Some(o) = piece.original
            && offset >= piece.offset
            && offset < piece.end()
        {
            return Some(o + (offset - piece.offset));
        }

        let preceding = self.pieces[..=idx]
            .iter()
            .rev()
            .find_map(|p| p.original.map(|o| o + p.len));
        match preceding {
            Some(end) => Some(self.last_char_before(end)),
            None => self.pieces.iter().find_map(|p| p.original),
        }
    }

    /// Original row and column of the character at `offset`
    pub fn location(&self, offset: usize) -> Option<Location> {
        self.map_closest(offset)
            .and_then(|o| self.source.offset_to_location(o))
    }

    fn overlapping(&self, start: usize, end: usize) -> impl Iterator<Item = &Piece> {
        let first = self.pieces.partition_point(|p| p.end() <= start);
        self.pieces[first..]
            .iter()
            .take_while(move |p| p.offset < end)
    }

    fn last_char_before(&self, end: usize) -> usize {
        self.source
            .text()
            .get(..end)
            .and_then(|s| s.char_indices().next_back())
            .map_or(end.saturating_sub(1), |(idx, _)| idx)
    }
}

fn push_piece(pieces: &mut Vec<Piece>, piece: Piece) {
    if piece.len == 0 {
        return;
    }
    if let Some(last) = pieces.last_mut()
        && last.end() == piece.offset
    {
        let contiguous = match (last.original, piece.original) {
            (Some(a), Some(b)) => a + last.len == b,
            (None, None) => true,
            _ => false,
        };
        if contiguous {
            last.len += piece.len;
            return;
        }
    }
    pieces.push(piece);
}

impl fmt::Display for MappedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl From<&str> for MappedString {
    fn from(text: &str) -> Self {
        MappedString::new(text)
    }
}

impl From<String> for MappedString {
    fn from(text: String) -> Self {
        MappedString::new(text)
    }
}
