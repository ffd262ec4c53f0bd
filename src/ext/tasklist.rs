//! Task list items (`- [ ] todo`, `- [x] done`).
//!
//! Runs after inline resolution: a list item whose first paragraph starts
//! with `[ ]`, `[x]` or `[X]` followed by a space or tab becomes a
//! [`NodeValue::TaskItem`] and loses the marker text.

use super::SyntaxExtension;
use crate::Options;
use crate::node::NodeValue;
use crate::render::RenderContext;
use crate::tree::{Document, NodeId};

/// The `tasklist` extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskList;

impl SyntaxExtension for TaskList {
    fn name(&self) -> &'static str {
        "tasklist"
    }

    fn node_kinds(&self) -> &'static [&'static str] {
        &["tasklist_item"]
    }

    fn postprocess(&self, doc: &mut Document, _options: &Options) {
        let items: Vec<NodeId> = doc
            .descendants(doc.root())
            .filter(|&id| matches!(doc.value(id), NodeValue::Item(_)))
            .collect();

        for item in items {
            let Some(paragraph) = doc.first_child(item) else {
                continue;
            };
            if !matches!(doc.value(paragraph), NodeValue::Paragraph) {
                continue;
            }
            let Some(text) = doc.first_child(paragraph) else {
                continue;
            };
            let NodeValue::Text(literal) = doc.value_mut(text) else {
                continue;
            };
            let Some(checked) = task_marker(literal.as_bytes()) else {
                continue;
            };

            literal.drain(..4);
            if literal.is_empty() {
                doc.detach(text);
            }
            *doc.value_mut(item) = NodeValue::TaskItem { checked };
        }
    }

    fn render(&self, ctx: &mut RenderContext<'_>, node: NodeId, entering: bool) {
        if !entering {
            ctx.out().write_str("</li>\n");
            return;
        }
        let checked = matches!(ctx.document().value(node), NodeValue::TaskItem { checked: true });
        ctx.cr();
        ctx.out().write_str("<li");
        ctx.sourcepos(node);
        ctx.out().write_str(if checked {
            "><input type=\"checkbox\" checked=\"\" disabled=\"\" /> "
        } else {
            "><input type=\"checkbox\" disabled=\"\" /> "
        });
    }
}

/// `Some(checked)` when `text` opens with a task marker.
fn task_marker(text: &[u8]) -> Option<bool> {
    match text {
        [b'[', mark, b']', b' ' | b'\t', ..] => match mark {
            b' ' => Some(false),
            b'x' | b'X' => Some(true),
            _ => None,
        },
        _ => None,
    }
}
