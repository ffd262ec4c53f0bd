//! Block-level parser for Markdown.
//!
//! The block parser is line-oriented and builds the block structure of the
//! document tree:
//! - Block quotes, lists and list items (containers)
//! - Thematic breaks and ATX/setext headings
//! - Fenced and indented code blocks
//! - HTML blocks (all seven start conditions)
//! - Paragraphs and link reference definitions
//! - Extension blocks (tables, footnote definitions)
//!
//! Inline content is left as raw text on leaf blocks and resolved once the
//! whole document has been consumed.

mod parser;
pub(crate) mod scan;

pub use parser::{BlockContext, ParserState};

use crate::node::NodeValue;
use crate::tree::{Document, NodeId};

/// Decide tight/loose for every list in the document.
///
/// A list is loose if any item other than the last ends with a blank line,
/// or if any direct child of an item is followed by a blank line before its
/// next sibling. This runs after all blocks are closed, so it sees the final
/// `last_line_blank` flags.
pub(crate) fn reconcile_list_tightness(doc: &mut Document) {
    let lists: Vec<NodeId> = doc
        .descendants(doc.root())
        .filter(|&id| matches!(doc.value(id), NodeValue::List(_)))
        .collect();

    for list in lists {
        let tight = list_is_tight(doc, list);
        if let NodeValue::List(data) = doc.value_mut(list) {
            data.tight = tight;
        }
        let items: Vec<NodeId> = doc.children(list).collect();
        for item in items {
            if let NodeValue::Item(data) = doc.value_mut(item) {
                data.tight = tight;
            }
        }
    }
}

fn list_is_tight(doc: &Document, list: NodeId) -> bool {
    let mut item = doc.first_child(list);
    while let Some(it) = item {
        let next_item = doc.next_sibling(it);
        if doc.node(it).last_line_blank && next_item.is_some() {
            return false;
        }

        let mut sub = doc.first_child(it);
        while let Some(s) = sub {
            let next_sub = doc.next_sibling(s);
            if (next_item.is_some() || next_sub.is_some()) && ends_with_blank_line(doc, s) {
                return false;
            }
            sub = next_sub;
        }
        item = next_item;
    }
    true
}

/// Whether a block, or its last descendant list/item, ended on a blank line.
pub(crate) fn ends_with_blank_line(doc: &Document, node: NodeId) -> bool {
    let mut cur = node;
    loop {
        if doc.node(cur).last_line_blank {
            return true;
        }
        match doc.value(cur) {
            NodeValue::List(_) | NodeValue::Item(_) => match doc.last_child(cur) {
                Some(last) => cur = last,
                None => return false,
            },
            _ => return false,
        }
    }
}
