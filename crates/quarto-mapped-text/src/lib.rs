//! Mapped text for Quarto
//!
//! A [`MappedString`] is a string built by slicing and splicing other
//! strings, where every character remembers its byte offset in the
//! original document. Editors send us whole buffers, but YAML lives in
//! front matter, in `#|` comment blocks inside code chunks, and so on;
//! the inner regions are carved out as mapped strings so diagnostics and
//! cursor positions can be translated back to the buffer the user sees.
//!
//! # Example
//!
//! ```rust
//! use quarto_mapped_text::MappedString;
//!
//! let doc = MappedString::new("#| echo: true\n#| fig-width: 4\n");
//! let yaml = MappedString::mapped(&doc, [3..14, 17..30]);
//! assert_eq!(yaml.value(), "echo: true\nfig-width: 4\n");
//! assert_eq!(yaml.map(0), Some(3));
//! assert_eq!(yaml.map(11), Some(17));
//! ```

pub mod file_info;
pub mod mapped;
pub mod utils;

pub use file_info::{FileInformation, Location};
pub use mapped::{Chunk, MappedString};
pub use utils::{
    RangedLine, line_col_to_offset, line_offsets, lines, offset_to_location, position_to_offset,
    ranged_lines,
};
