//! Node kinds and their attributes.

use std::fmt;

/// Column alignment for table cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// No alignment specified.
    #[default]
    None,
    /// Left-aligned (`:---`).
    Left,
    /// Center-aligned (`:---:`).
    Center,
    /// Right-aligned (`---:`).
    Right,
}

impl Alignment {
    /// Value of the HTML `align` attribute, if any.
    pub fn as_attr(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Left => Some("left"),
            Self::Center => Some("center"),
            Self::Right => Some("right"),
        }
    }
}

/// List type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// Bullet list (`-`, `*`, `+`).
    Unordered { marker: u8 },
    /// Ordered list (`1.`, `1)`).
    Ordered { start: u32, delimiter: u8 },
}

/// Attributes shared by List and Item nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListData {
    pub kind: ListKind,
    /// Whether no blank line separates any items or their children.
    /// Only meaningful once parsing has finished.
    pub tight: bool,
    /// Columns of indentation before the marker.
    pub marker_offset: usize,
    /// Columns from the marker start to the item content.
    pub padding: usize,
}

impl ListData {
    /// Whether another item with these attributes belongs to the same list.
    pub(crate) fn same_list(&self, other: &ListData) -> bool {
        match (self.kind, other.kind) {
            (ListKind::Unordered { marker: a }, ListKind::Unordered { marker: b }) => a == b,
            (ListKind::Ordered { delimiter: a, .. }, ListKind::Ordered { delimiter: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// A fenced or indented code block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeBlock {
    pub fenced: bool,
    pub fence_char: u8,
    pub fence_len: usize,
    pub fence_offset: usize,
    /// Info string with escapes and entities resolved.
    pub info: String,
    pub literal: String,
}

/// Link or image target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Link {
    pub url: String,
    pub title: String,
}

/// A footnote definition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FootnoteDefinition {
    pub label: String,
    /// Order of first reference, assigned after parsing.
    pub number: u32,
    /// How many references point at this definition.
    pub ref_count: u32,
}

/// A footnote reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FootnoteReference {
    pub label: String,
    pub number: u32,
    /// 1-based occurrence of this label among all references.
    pub ix: u32,
}

/// Every kind of node the tree can hold.
///
/// Kinds after `RawHtml` are contributed by syntax extensions and are
/// rendered by the extension that owns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValue {
    Document,
    BlockQuote,
    List(ListData),
    Item(ListData),
    CodeBlock(CodeBlock),
    HtmlBlock { block_type: u8, literal: String },
    Paragraph,
    Heading { level: u8, setext: bool },
    ThematicBreak,
    Text(String),
    SoftBreak,
    LineBreak,
    Code(String),
    Emphasis,
    Strong,
    Link(Link),
    Image(Link),
    RawHtml(String),

    Table(Vec<Alignment>),
    TableRow { header: bool },
    TableCell,
    Strikethrough,
    TaskItem { checked: bool },
    FootnoteDefinition(FootnoteDefinition),
    FootnoteReference(FootnoteReference),
    /// Opaque node from a third-party extension.
    Custom { kind: &'static str, literal: String },
}

/// Kind names of the core (non-extension) node kinds.
pub const CORE_KINDS: &[&str] = &[
    "document",
    "block_quote",
    "list",
    "item",
    "code_block",
    "html_block",
    "paragraph",
    "heading",
    "thematic_break",
    "text",
    "softbreak",
    "linebreak",
    "code",
    "emph",
    "strong",
    "link",
    "image",
    "html_inline",
];

impl NodeValue {
    /// Stable name of this node's kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::BlockQuote => "block_quote",
            Self::List(_) => "list",
            Self::Item(_) => "item",
            Self::CodeBlock(_) => "code_block",
            Self::HtmlBlock { .. } => "html_block",
            Self::Paragraph => "paragraph",
            Self::Heading { .. } => "heading",
            Self::ThematicBreak => "thematic_break",
            Self::Text(_) => "text",
            Self::SoftBreak => "softbreak",
            Self::LineBreak => "linebreak",
            Self::Code(_) => "code",
            Self::Emphasis => "emph",
            Self::Strong => "strong",
            Self::Link(_) => "link",
            Self::Image(_) => "image",
            Self::RawHtml(_) => "html_inline",
            Self::Table(_) => "table",
            Self::TableRow { .. } => "table_row",
            Self::TableCell => "table_cell",
            Self::Strikethrough => "strikethrough",
            Self::TaskItem { .. } => "tasklist_item",
            Self::FootnoteDefinition(_) => "footnote_definition",
            Self::FootnoteReference(_) => "footnote_reference",
            Self::Custom { kind, .. } => kind,
        }
    }

    /// Whether an extension renders this node.
    pub fn is_extension_kind(&self) -> bool {
        !CORE_KINDS.contains(&self.kind_name())
    }

    /// Block-level kinds.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Self::Document
                | Self::BlockQuote
                | Self::List(_)
                | Self::Item(_)
                | Self::CodeBlock(_)
                | Self::HtmlBlock { .. }
                | Self::Paragraph
                | Self::Heading { .. }
                | Self::ThematicBreak
                | Self::Table(_)
                | Self::TableRow { .. }
                | Self::TableCell
                | Self::TaskItem { .. }
                | Self::FootnoteDefinition(_)
        )
    }

    /// Blocks that may hold other blocks.
    pub(crate) fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Document
                | Self::BlockQuote
                | Self::List(_)
                | Self::Item(_)
                | Self::TaskItem { .. }
                | Self::FootnoteDefinition(_)
        )
    }

    /// Blocks whose raw text goes through the inline resolver.
    pub(crate) fn has_inline_content(&self) -> bool {
        matches!(self, Self::Paragraph | Self::Heading { .. } | Self::TableCell)
    }

    /// Whether `child` may be appended to a block of this kind.
    pub(crate) fn can_contain(&self, child: &NodeValue) -> bool {
        match self {
            Self::Document | Self::BlockQuote | Self::Item(_) | Self::TaskItem { .. } => {
                child.is_block() && !matches!(child, Self::Item(_) | Self::TaskItem { .. })
            }
            Self::FootnoteDefinition(_) => {
                child.is_block() && !matches!(child, Self::Item(_) | Self::FootnoteDefinition(_))
            }
            Self::List(_) => matches!(child, Self::Item(_)),
            _ => false,
        }
    }

    /// Text carried by leaf inline kinds.
    pub fn literal(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Code(s) | Self::RawHtml(s) => Some(s),
            Self::CodeBlock(cb) => Some(&cb.literal),
            Self::HtmlBlock { literal, .. } | Self::Custom { literal, .. } => Some(literal),
            _ => None,
        }
    }
}

/// A line/column pair, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct LineColumn {
    pub line: usize,
    pub column: usize,
}

/// Source span of a block, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sourcepos {
    pub start: LineColumn,
    pub end: LineColumn,
}

impl Sourcepos {
    pub fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start: LineColumn { line: start_line, column: start_column },
            end: LineColumn { line: end_line, column: end_column },
        }
    }
}

impl fmt::Display for Sourcepos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_split_core_and_extension() {
        assert!(!NodeValue::Paragraph.is_extension_kind());
        assert!(!NodeValue::RawHtml(String::new()).is_extension_kind());
        assert!(NodeValue::Strikethrough.is_extension_kind());
        assert!(NodeValue::TableCell.is_extension_kind());
        let custom = NodeValue::Custom { kind: "mark", literal: String::new() };
        assert_eq!(custom.kind_name(), "mark");
        assert!(custom.is_extension_kind());
    }

    #[test]
    fn list_items_only_in_lists() {
        let item = NodeValue::Item(ListData {
            kind: ListKind::Unordered { marker: b'-' },
            tight: true,
            marker_offset: 0,
            padding: 2,
        });
        assert!(!NodeValue::Document.can_contain(&item));
        assert!(NodeValue::List(match item {
            NodeValue::Item(d) => d,
            _ => unreachable!(),
        })
        .can_contain(&item));
        assert!(NodeValue::BlockQuote.can_contain(&NodeValue::Paragraph));
        assert!(!NodeValue::Paragraph.can_contain(&NodeValue::Paragraph));
    }

    #[test]
    fn same_list_requires_matching_marker() {
        let dash = ListData {
            kind: ListKind::Unordered { marker: b'-' },
            tight: true,
            marker_offset: 0,
            padding: 2,
        };
        let star = ListData { kind: ListKind::Unordered { marker: b'*' }, ..dash };
        let ordered = ListData { kind: ListKind::Ordered { start: 3, delimiter: b'.' }, ..dash };
        let ordered_paren = ListData { kind: ListKind::Ordered { start: 1, delimiter: b')' }, ..dash };
        assert!(dash.same_list(&dash));
        assert!(!dash.same_list(&star));
        assert!(!ordered.same_list(&ordered_paren));
        assert!(ordered.same_list(&ListData { kind: ListKind::Ordered { start: 9, delimiter: b'.' }, ..dash }));
    }

    #[test]
    fn sourcepos_display() {
        assert_eq!(Sourcepos::new(1, 1, 2, 5).to_string(), "1:1-2:5");
    }
}
