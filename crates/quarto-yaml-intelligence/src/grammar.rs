//! Concrete YAML syntax trees
//!
//! Everything downstream works on [`ConcreteNode`] trees: grammar node
//! kinds with byte spans into the text that was parsed. [`YamlGrammar`]
//! builds them from the marked event stream of `yaml-rust2`. Text the
//! scanner rejects becomes a single [`NodeKind::Error`] node spanning the
//! whole input, which is what the reparser looks for before it starts
//! deleting characters.

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Node kinds of the YAML grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Stream,
    Document,
    BlockNode,
    FlowNode,
    BlockMapping,
    BlockMappingPair,
    FlowMapping,
    FlowPair,
    BlockSequence,
    BlockSequenceItem,
    FlowSequence,
    PlainScalar,
    SingleQuoteScalar,
    DoubleQuoteScalar,
    BlockScalar,
    Alias,
    Error,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Stream => "stream",
            NodeKind::Document => "document",
            NodeKind::BlockNode => "block_node",
            NodeKind::FlowNode => "flow_node",
            NodeKind::BlockMapping => "block_mapping",
            NodeKind::BlockMappingPair => "block_mapping_pair",
            NodeKind::FlowMapping => "flow_mapping",
            NodeKind::FlowPair => "flow_pair",
            NodeKind::BlockSequence => "block_sequence",
            NodeKind::BlockSequenceItem => "block_sequence_item",
            NodeKind::FlowSequence => "flow_sequence",
            NodeKind::PlainScalar => "plain_scalar",
            NodeKind::SingleQuoteScalar => "single_quote_scalar",
            NodeKind::DoubleQuoteScalar => "double_quote_scalar",
            NodeKind::BlockScalar => "block_scalar",
            NodeKind::Alias => "alias",
            NodeKind::Error => "ERROR",
        }
    }

    fn is_block(self) -> bool {
        matches!(
            self,
            NodeKind::BlockMapping | NodeKind::BlockSequence | NodeKind::BlockScalar
        )
    }
}

/// A node of a concrete syntax tree.
///
/// `start` and `end` are byte offsets into the parsed text. Scalars carry
/// their decoded text in `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcreteNode {
    pub kind: NodeKind,
    pub start: usize,
    pub end: usize,
    pub value: Option<String>,
    pub children: Vec<ConcreteNode>,
}

impl ConcreteNode {
    pub fn new(kind: NodeKind, start: usize, end: usize) -> Self {
        ConcreteNode {
            kind,
            start,
            end,
            value: None,
            children: Vec::new(),
        }
    }

    pub fn scalar(kind: NodeKind, start: usize, end: usize, value: impl Into<String>) -> Self {
        ConcreteNode {
            value: Some(value.into()),
            ..ConcreteNode::new(kind, start, end)
        }
    }

    pub fn with_children(mut self, children: Vec<ConcreteNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == NodeKind::Error
    }

    /// The source text this node spans
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.start..self.end).unwrap_or("")
    }

    fn wrap(self) -> ConcreteNode {
        let kind = if self.kind.is_block() {
            NodeKind::BlockNode
        } else {
            NodeKind::FlowNode
        };
        ConcreteNode::new(kind, self.start, self.end).with_children(vec![self])
    }
}

/// A YAML grammar.
///
/// Parsing never fails outright: input the grammar rejects produces a
/// tree whose root is an error node.
pub trait GrammarParser: Send + Sync {
    fn parse(&self, source: &str) -> ConcreteNode;
}

/// The `yaml-rust2` backed grammar
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlGrammar;

impl GrammarParser for YamlGrammar {
    fn parse(&self, source: &str) -> ConcreteNode {
        let mut builder = TreeBuilder::new(source);
        let mut parser = Parser::new_from_str(source);
        match parser.load(&mut builder, false) {
            Ok(()) => builder.finish(),
            Err(err) => {
                tracing::trace!(error = %err, "YAML rejected by scanner");
                ConcreteNode::new(NodeKind::Error, 0, source.len())
            }
        }
    }
}

/// A completed child of a collection under construction
enum Slot {
    Node(ConcreteNode),
    /// An implicit null, such as the missing value of `key:`
    Null(usize),
}

/// A collection under construction
struct Frame {
    kind: NodeKind,
    start: usize,
    slots: Vec<Slot>,
}

/// Event receiver that assembles a [`ConcreteNode`] tree.
///
/// Only the first document of a stream is kept.
struct TreeBuilder<'s> {
    source: &'s str,
    /// Byte offset of every character, followed by the text length
    char_offsets: Vec<usize>,
    stack: Vec<Frame>,
    root: Option<Slot>,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str) -> Self {
        let char_offsets = source
            .char_indices()
            .map(|(idx, _)| idx)
            .chain(std::iter::once(source.len()))
            .collect();
        TreeBuilder {
            source,
            char_offsets,
            stack: Vec::new(),
            root: None,
        }
    }

    fn finish(self) -> ConcreteNode {
        let mut stream = ConcreteNode::new(NodeKind::Stream, 0, self.source.len());
        match self.root {
            Some(Slot::Node(node)) => {
                let document =
                    ConcreteNode::new(NodeKind::Document, node.start, node.end).with_children(vec![node]);
                stream.children.push(document);
            }
            Some(Slot::Null(offset)) => {
                stream
                    .children
                    .push(ConcreteNode::new(NodeKind::Document, offset, offset));
            }
            None => {}
        }
        stream
    }

    /// Markers count characters; the tree uses byte offsets
    fn offset(&self, marker: &Marker) -> usize {
        self.char_offsets
            .get(marker.index())
            .copied()
            .unwrap_or(self.source.len())
    }

    fn byte_at(&self, offset: usize) -> Option<u8> {
        self.source.as_bytes().get(offset).copied()
    }

    fn push(&mut self, slot: Slot) {
        match self.stack.last_mut() {
            Some(frame) => frame.slots.push(slot),
            None => {
                if self.root.is_none() {
                    self.root = Some(slot);
                }
            }
        }
    }

    fn open(&mut self, offset: usize, flow_open: u8, flow: NodeKind, block: NodeKind) {
        let kind = if self.byte_at(self.skip_properties(offset)) == Some(flow_open) {
            flow
        } else {
            block
        };
        self.stack.push(Frame {
            kind,
            start: offset,
            slots: Vec::new(),
        });
    }

    fn close(&mut self, marker_offset: usize) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let node = match frame.kind {
            NodeKind::BlockMapping | NodeKind::FlowMapping => self.mapping(frame, marker_offset),
            _ => self.sequence(frame, marker_offset),
        };
        self.push(Slot::Node(node.wrap()));
    }

    fn mapping(&self, frame: Frame, end_marker: usize) -> ConcreteNode {
        let flow = frame.kind == NodeKind::FlowMapping;
        let pair_kind = if flow {
            NodeKind::FlowPair
        } else {
            NodeKind::BlockMappingPair
        };

        let mut pairs = Vec::new();
        let mut slots = frame.slots.into_iter();
        while let Some(key) = slots.next() {
            let key = match key {
                Slot::Node(node) => node,
                Slot::Null(offset) => {
                    ConcreteNode::scalar(NodeKind::PlainScalar, offset, offset, "").wrap()
                }
            };
            let (start, key_end) = (key.start, key.end);
            let mut children = vec![key];
            let end = match slots.next() {
                Some(Slot::Node(value)) => {
                    let end = value.end;
                    children.push(value);
                    end
                }
                _ => self.colon_end(key_end),
            };
            pairs.push(ConcreteNode::new(pair_kind, start, end).with_children(children));
        }

        let start = pairs.first().map_or(frame.start, |p| p.start.min(frame.start));
        let end = if flow {
            self.flow_end(end_marker, b'}', &pairs)
        } else {
            pairs.last().map_or(start, |p| p.end)
        };
        ConcreteNode::new(frame.kind, start, end).with_children(pairs)
    }

    fn sequence(&self, frame: Frame, end_marker: usize) -> ConcreteNode {
        if frame.kind == NodeKind::FlowSequence {
            let items: Vec<ConcreteNode> = frame
                .slots
                .into_iter()
                .filter_map(|slot| match slot {
                    Slot::Node(node) => Some(node),
                    Slot::Null(_) => None,
                })
                .collect();
            let end = self.flow_end(end_marker, b']', &items);
            return ConcreteNode::new(NodeKind::FlowSequence, frame.start, end).with_children(items);
        }

        let mut items = Vec::new();
        let mut search_from = frame.start;
        for slot in frame.slots {
            let dash = self.find_dash(search_from);
            let item = match slot {
                Slot::Node(value) => {
                    ConcreteNode::new(NodeKind::BlockSequenceItem, dash.min(value.start), value.end)
                        .with_children(vec![value])
                }
                Slot::Null(_) => ConcreteNode::new(NodeKind::BlockSequenceItem, dash, dash + 1),
            };
            search_from = item.end;
            items.push(item);
        }
        let start = items.first().map_or(frame.start, |i| i.start.min(frame.start));
        let end = items.last().map_or(start, |i| i.end);
        ConcreteNode::new(NodeKind::BlockSequence, start, end).with_children(items)
    }

    fn scalar(&self, value: String, style: TScalarStyle, start: usize) -> ConcreteNode {
        let content = self.skip_properties(start);
        let (kind, start, end) = match style {
            TScalarStyle::Plain => (NodeKind::PlainScalar, start, self.plain_end(content, &value)),
            TScalarStyle::SingleQuoted => (NodeKind::SingleQuoteScalar, start, self.quoted_end(content, b'\'')),
            TScalarStyle::DoubleQuoted => (NodeKind::DoubleQuoteScalar, start, self.quoted_end(content, b'"')),
            TScalarStyle::Literal => self.block_scalar(start, b'|'),
            _ => self.block_scalar(start, b'>'),
        };
        ConcreteNode::scalar(kind, start, end, value)
    }

    fn block_scalar(&self, marker: usize, indicator: u8) -> (NodeKind, usize, usize) {
        let header = self.block_indicator(marker, indicator);
        (NodeKind::BlockScalar, header, self.block_scalar_end(header))
    }

    /// Offset of the `|` or `>` header of a block scalar. The event marker
    /// may sit on the header or on the first content line.
    fn block_indicator(&self, marker: usize, indicator: u8) -> usize {
        let content = self.skip_properties(marker);
        if self.byte_at(content) == Some(indicator) {
            return content;
        }
        let source = self.source;
        let mut line_end = source[..marker.min(source.len())].rfind('\n');
        while let Some(end) = line_end {
            let line_start = source[..end].rfind('\n').map_or(0, |idx| idx + 1);
            let line = &source[line_start..end];
            let code = line.find(" #").map_or(line, |idx| &line[..idx]);
            if !code.trim().is_empty() {
                return code
                    .bytes()
                    .rposition(|b| b == indicator)
                    .map_or(marker, |idx| line_start + idx);
            }
            line_end = line_start.checked_sub(1);
        }
        marker
    }

    /// Skip anchors and tags written in front of a node
    fn skip_properties(&self, mut offset: usize) -> usize {
        let bytes = self.source.as_bytes();
        while matches!(bytes.get(offset), Some(b'&' | b'!')) {
            while bytes.get(offset).is_some_and(|b| !b.is_ascii_whitespace()) {
                offset += 1;
            }
            while matches!(bytes.get(offset), Some(b' ' | b'\t')) {
                offset += 1;
            }
        }
        offset
    }

    fn plain_end(&self, start: usize, value: &str) -> usize {
        let rest = self.source.get(start..).unwrap_or("");
        if rest.starts_with(value) {
            return start + value.len();
        }

        // A folded multi-line scalar: each whitespace run in the value
        // stands for a whitespace run (line breaks included) in the source.
        let mut source_chars = rest.char_indices().peekable();
        let mut value_chars = value.chars().peekable();
        let mut end = 0;
        while let Some(c) = value_chars.next() {
            if c.is_whitespace() {
                while value_chars.next_if(|c| c.is_whitespace()).is_some() {}
                while source_chars.next_if(|(_, s)| s.is_whitespace()).is_some() {}
                continue;
            }
            match source_chars.next() {
                Some((idx, s)) if s == c => end = idx + s.len_utf8(),
                _ => break,
            }
        }
        start + end
    }

    fn quoted_end(&self, start: usize, quote: u8) -> usize {
        let bytes = self.source.as_bytes();
        let mut idx = start + 1;
        while let Some(&b) = bytes.get(idx) {
            if b == b'\\' && quote == b'"' {
                idx += 2;
            } else if b == quote {
                if quote == b'\'' && bytes.get(idx + 1) == Some(&b'\'') {
                    idx += 2;
                    continue;
                }
                return idx + 1;
            } else {
                idx += 1;
            }
        }
        bytes.len()
    }

    /// A block scalar runs over the following lines that are blank or
    /// indented deeper than the node that owns it.
    fn block_scalar_end(&self, start: usize) -> usize {
        let source = self.source;
        let content = start;
        let line_start = source[..start].rfind('\n').map_or(0, |idx| idx + 1);
        let header_end = source[content..]
            .find('\n')
            .map_or(source.len(), |idx| content + idx);

        let prefix = &source[line_start..start];
        let parent_indent = if prefix.trim_end().ends_with(':') || prefix.contains(": ") {
            structural_indent(prefix)
        } else {
            prefix.rfind('-').unwrap_or(0)
        };
        let min_indent = parent_indent + 1;

        let mut end = content + source[content..header_end].trim_end().len();
        let mut content_indent = None;
        let mut cursor = header_end;
        while cursor < source.len() {
            let next = cursor + 1;
            let line_end = source[next..]
                .find('\n')
                .map_or(source.len(), |idx| next + idx);
            let line = &source[next..line_end];
            cursor = line_end;
            if line.trim().is_empty() {
                continue;
            }
            let indent = line.len() - line.trim_start_matches(' ').len();
            let required = *content_indent.get_or_insert(indent.max(min_indent));
            if indent < required {
                break;
            }
            end = next + line.trim_end().len();
        }
        end
    }

    /// End of the `:` that follows a key with no value
    fn colon_end(&self, key_end: usize) -> usize {
        let bytes = self.source.as_bytes();
        let mut idx = key_end;
        while matches!(bytes.get(idx), Some(b' ' | b'\t')) {
            idx += 1;
        }
        if bytes.get(idx) == Some(&b':') {
            idx + 1
        } else {
            key_end
        }
    }

    fn flow_end(&self, marker: usize, close: u8, children: &[ConcreteNode]) -> usize {
        if self.byte_at(marker) == Some(close) {
            return marker + 1;
        }
        let from = children.last().map_or(marker, |c| c.end).min(self.source.len());
        self.source.as_bytes()[from..]
            .iter()
            .position(|&b| b == close)
            .map_or(from, |idx| from + idx + 1)
    }

    /// Offset of the `-` that opens the next block sequence item
    fn find_dash(&self, from: usize) -> usize {
        let bytes = self.source.as_bytes();
        let mut idx = from;
        while let Some(&b) = bytes.get(idx) {
            match b {
                b'-' => return idx,
                b' ' | b'\t' | b'\r' | b'\n' => idx += 1,
                b'#' => {
                    while bytes.get(idx).is_some_and(|&b| b != b'\n') {
                        idx += 1;
                    }
                }
                _ => break,
            }
        }
        from
    }

    fn alias_end(&self, start: usize) -> usize {
        let bytes = self.source.as_bytes();
        let mut idx = start + 1;
        while bytes
            .get(idx)
            .is_some_and(|b| !b.is_ascii_whitespace() && !b",[]{}".contains(b))
        {
            idx += 1;
        }
        idx.min(bytes.len())
    }
}

/// Indentation of a line, counting sequence dashes as indentation
fn structural_indent(line: &str) -> usize {
    let bytes = line.as_bytes();
    let mut indent = 0;
    while let Some(&b) = bytes.get(indent) {
        match b {
            b' ' => indent += 1,
            b'-' if bytes.get(indent + 1) == Some(&b' ') => indent += 1,
            _ => break,
        }
    }
    indent
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        let offset = self.offset(&marker);
        match ev {
            Event::Scalar(value, style, ..) => {
                // Implicit nulls arrive as an empty plain scalar (older
                // releases used `~`) marked at the next token
                let implicit_null = matches!(style, TScalarStyle::Plain)
                    && (value.is_empty() || (value == "~" && self.byte_at(offset) != Some(b'~')));
                if implicit_null {
                    self.push(Slot::Null(offset));
                } else {
                    let node = self.scalar(value, style, offset).wrap();
                    self.push(Slot::Node(node));
                }
            }
            Event::SequenceStart(..) => {
                self.open(offset, b'[', NodeKind::FlowSequence, NodeKind::BlockSequence);
            }
            Event::MappingStart(..) => {
                self.open(offset, b'{', NodeKind::FlowMapping, NodeKind::BlockMapping);
            }
            Event::SequenceEnd | Event::MappingEnd => self.close(offset),
            Event::Alias(..) => {
                let end = self.alias_end(offset);
                self.push(Slot::Node(ConcreteNode::new(NodeKind::Alias, offset, end).wrap()));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ConcreteNode {
        YamlGrammar.parse(source)
    }

    /// The collection or scalar inside stream > document > wrapper
    fn top(tree: &ConcreteNode) -> &ConcreteNode {
        &tree.children[0].children[0].children[0]
    }

    /// The unwrapped value node of a pair
    fn pair_value(pair: &ConcreteNode) -> &ConcreteNode {
        &pair.children[1].children[0]
    }

    #[test]
    fn test_mapping_with_flow_sequence() {
        let source = "a: 1\nb: [x, y]\n";
        let tree = parse(source);
        assert_eq!(tree.kind, NodeKind::Stream);
        assert_eq!((tree.start, tree.end), (0, source.len()));

        let mapping = top(&tree);
        assert_eq!(mapping.kind, NodeKind::BlockMapping);
        assert_eq!(mapping.children.len(), 2);
        assert_eq!(mapping.children[1].kind, NodeKind::BlockMappingPair);

        let seq = pair_value(&mapping.children[1]);
        assert_eq!(seq.kind, NodeKind::FlowSequence);
        assert_eq!(seq.text(source), "[x, y]");
        let items: Vec<&str> = seq.children.iter().map(|c| c.text(source)).collect();
        assert_eq!(items, vec!["x", "y"]);
    }

    #[test]
    fn test_missing_value_ends_after_colon() {
        let source = "key:\n";
        let tree = parse(source);
        let pair = &top(&tree).children[0];
        assert_eq!(pair.children.len(), 1);
        assert_eq!(pair.text(source), "key:");
    }

    #[test]
    fn test_missing_value_keeps_its_own_line() {
        let source = "author:\ntitle: x\n";
        let tree = parse(source);
        let pairs = &top(&tree).children;
        assert_eq!(pairs[0].children.len(), 1);
        assert_eq!(pairs[0].text(source), "author:");
        assert_eq!(pairs[1].text(source), "title: x");
    }

    #[test]
    fn test_invalid_yaml_is_error_root() {
        let tree = parse("a: b: c");
        assert!(tree.is_error());
        assert_eq!((tree.start, tree.end), (0, 7));

        let tree = parse("echo: true\nfig-");
        assert!(tree.is_error());
    }

    #[test]
    fn test_block_sequence_items_start_at_dash() {
        let source = "- x\n-\n- 'y'\n";
        let tree = parse(source);
        let seq = top(&tree);
        assert_eq!(seq.kind, NodeKind::BlockSequence);
        let items: Vec<(&str, usize)> = seq
            .children
            .iter()
            .map(|c| (c.text(source), c.children.len()))
            .collect();
        assert_eq!(items, vec![("- x", 1), ("-", 0), ("- 'y'", 1)]);
        assert_eq!(
            seq.children[2].children[0].children[0].kind,
            NodeKind::SingleQuoteScalar
        );
    }

    #[test]
    fn test_block_scalar_span() {
        let source = "text: |\n  one\n  two\nnext: 1";
        let tree = parse(source);
        let scalar = pair_value(&top(&tree).children[0]);
        assert_eq!(scalar.kind, NodeKind::BlockScalar);
        assert_eq!(scalar.text(source), "|\n  one\n  two");
        assert_eq!(scalar.value.as_deref(), Some("one\ntwo\n"));
    }

    #[test]
    fn test_block_scalar_headers() {
        let source = "a: >-\n  folded\n  text\nb: |2\n   kept\nc: 1\n";
        let tree = parse(source);
        let pairs = &top(&tree).children;
        assert_eq!(pair_value(&pairs[0]).text(source), ">-\n  folded\n  text");
        assert_eq!(pair_value(&pairs[1]).text(source), "|2\n   kept");
        assert_eq!(pair_value(&pairs[2]).text(source), "1");
    }

    #[test]
    fn test_folded_plain_scalar_span() {
        let source = "a: one\n  two\nb: 1";
        let tree = parse(source);
        let scalar = pair_value(&top(&tree).children[0]);
        assert_eq!(scalar.value.as_deref(), Some("one two"));
        assert_eq!(scalar.text(source), "one\n  two");
    }

    #[test]
    fn test_offsets_are_bytes() {
        let source = "títle: é\n";
        let tree = parse(source);
        let pair = &top(&tree).children[0];
        assert_eq!(pair.children[0].text(source), "títle");
        assert_eq!(pair_value(pair).text(source), "é");
    }

    #[test]
    fn test_empty_input_has_no_document() {
        let tree = parse("");
        assert!(!tree.is_error());
        assert!(tree.children.is_empty());

        let tree = parse("# only a comment\n");
        assert!(tree.children.is_empty());
    }
}
