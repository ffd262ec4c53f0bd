//! Footnotes (`[^label]` references, `[^label]: text` definitions).
//!
//! Definitions are container blocks continued by lines indented four
//! columns. References resolve only against labels that have a definition;
//! anything else stays literal text. After inline resolution, definitions
//! are numbered by first reference, moved to the end of the document in
//! that order, and unreferenced or duplicate definitions are dropped.

use rustc_hash::FxHashMap;

use super::{BlockPrecedence, SyntaxExtension};
use crate::Options;
use crate::block::BlockContext;
use crate::error::Result;
use crate::inline::InlineContext;
use crate::link_ref::normalize_label;
use crate::node::{FootnoteDefinition, FootnoteReference, NodeValue};
use crate::render::RenderContext;
use crate::tree::{Document, NodeId};

/// The `footnotes` extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct Footnotes;

impl SyntaxExtension for Footnotes {
    fn name(&self) -> &'static str {
        "footnotes"
    }

    fn node_kinds(&self) -> &'static [&'static str] {
        &["footnote_definition", "footnote_reference"]
    }

    fn block_precedence(&self) -> BlockPrecedence {
        BlockPrecedence::BeforeListItem
    }

    fn open_block(&self, ctx: &mut BlockContext<'_>) -> Result<Option<NodeId>> {
        if ctx.is_indented() {
            return Ok(None);
        }
        let start = ctx.first_nonspace();
        let Some((label, len)) = scan_definition_start(&ctx.line()[start..]) else {
            return Ok(None);
        };
        let label = label.to_string();
        let column = start + 1;
        ctx.advance_offset(start + len - ctx.offset(), false);
        let def = FootnoteDefinition { label, ..FootnoteDefinition::default() };
        ctx.add_child(NodeValue::FootnoteDefinition(def), column).map(Some)
    }

    fn continue_block(&self, ctx: &mut BlockContext<'_>, _node: NodeId) -> bool {
        if ctx.indent() >= 4 {
            ctx.advance_offset(4, true);
            true
        } else {
            ctx.is_blank()
        }
    }

    fn resolve_bracket(&self, ctx: &InlineContext<'_>, label: &[u8]) -> Option<NodeValue> {
        let name = label.strip_prefix(b"^")?;
        if name.is_empty() || !ctx.has_footnote(name) {
            return None;
        }
        Some(NodeValue::FootnoteReference(FootnoteReference {
            label: String::from_utf8_lossy(name).into_owned(),
            ..FootnoteReference::default()
        }))
    }

    fn postprocess(&self, doc: &mut Document, _options: &Options) {
        number_footnotes(doc);
    }

    fn render(&self, ctx: &mut RenderContext<'_>, node: NodeId, entering: bool) {
        let doc = ctx.document();
        match doc.value(node) {
            NodeValue::FootnoteReference(r) if entering => {
                let out = ctx.out();
                out.write_str("<sup class=\"footnote-ref\"><a href=\"#fn-");
                out.write_escaped_href(r.label.as_bytes());
                out.write_str("\" id=\"fnref-");
                out.write_escaped_href(r.label.as_bytes());
                if r.ix > 1 {
                    out.write_str("-");
                    out.write_u32(r.ix);
                }
                out.write_str("\" data-footnote-ref>");
                out.write_u32(r.number);
                out.write_str("</a></sup>");
            }
            NodeValue::FootnoteDefinition(def) if entering => {
                if !doc.prev_sibling(node).is_some_and(|p| is_definition(doc, p)) {
                    ctx.cr();
                    ctx.out().write_str("<section class=\"footnotes\" data-footnotes>\n<ol>\n");
                }
                ctx.cr();
                let out = ctx.out();
                out.write_str("<li id=\"fn-");
                out.write_escaped_href(def.label.as_bytes());
                out.write_str("\">\n");
            }
            NodeValue::FootnoteDefinition(def) => {
                let ends_in_paragraph = doc
                    .last_child(node)
                    .is_some_and(|last| matches!(doc.value(last), NodeValue::Paragraph));
                if !ends_in_paragraph {
                    write_backrefs(ctx, def);
                    ctx.out().newline();
                }
                ctx.out().write_str("</li>\n");
                if !doc.next_sibling(node).is_some_and(|n| is_definition(doc, n)) {
                    ctx.out().write_str("</ol>\n</section>\n");
                }
            }
            _ => {}
        }
    }

    fn render_paragraph_tail(&self, ctx: &mut RenderContext<'_>, container: NodeId) {
        if let NodeValue::FootnoteDefinition(def) = ctx.document().value(container) {
            ctx.out().write_byte(b' ');
            write_backrefs(ctx, def);
        }
    }
}

fn is_definition(doc: &Document, node: NodeId) -> bool {
    matches!(doc.value(node), NodeValue::FootnoteDefinition(_))
}

/// `[^label]:` followed by optional spaces. Returns the label and the
/// length of the whole marker.
fn scan_definition_start(line: &[u8]) -> Option<(&str, usize)> {
    let rest = line.strip_prefix(b"[^")?;
    let label_len = rest
        .iter()
        .position(|&b| matches!(b, b']' | b' ' | b'\t' | b'\r' | b'\n' | 0))?;
    if label_len == 0 || !rest[label_len..].starts_with(b"]:") {
        return None;
    }
    let label = std::str::from_utf8(&rest[..label_len]).ok()?;
    let mut len = 2 + label_len + 2;
    while matches!(line.get(len), Some(b' ' | b'\t')) {
        len += 1;
    }
    Some((label, len))
}

/// Number definitions by first reference and move them to the end of the
/// document in that order.
fn number_footnotes(doc: &mut Document) {
    let mut by_label: FxHashMap<String, NodeId> = FxHashMap::default();
    let mut duplicates = Vec::new();
    let mut references = Vec::new();
    for id in doc.descendants(doc.root()) {
        match doc.value(id) {
            NodeValue::FootnoteDefinition(def) => {
                let key = normalize_label(def.label.as_bytes());
                if by_label.contains_key(&key) {
                    duplicates.push(id);
                } else {
                    by_label.insert(key, id);
                }
            }
            NodeValue::FootnoteReference(_) => references.push(id),
            _ => {}
        }
    }

    let mut ordered = Vec::new();
    for reference in references {
        let NodeValue::FootnoteReference(r) = doc.value(reference) else {
            continue;
        };
        let Some(&def_id) = by_label.get(&normalize_label(r.label.as_bytes())) else {
            continue;
        };
        let NodeValue::FootnoteDefinition(def) = doc.value_mut(def_id) else {
            continue;
        };
        if def.number == 0 {
            ordered.push(def_id);
            def.number = u32::try_from(ordered.len()).unwrap_or(u32::MAX);
        }
        def.ref_count += 1;
        let (number, ix, label) = (def.number, def.ref_count, def.label.clone());
        if let NodeValue::FootnoteReference(r) = doc.value_mut(reference) {
            r.number = number;
            r.ix = ix;
            r.label = label;
        }
    }

    for id in duplicates {
        doc.detach(id);
    }
    for (_, id) in by_label {
        doc.detach(id);
    }
    let root = doc.root();
    for id in ordered {
        doc.append(root, id);
    }
}

fn write_backrefs(ctx: &mut RenderContext<'_>, def: &FootnoteDefinition) {
    let out = ctx.out();
    let label = def.label.as_bytes();
    out.write_str("<a href=\"#fnref-");
    out.write_escaped_href(label);
    out.write_str("\" class=\"footnote-backref\" data-footnote-backref data-footnote-backref-idx=\"");
    out.write_u32(def.number);
    out.write_str("\" aria-label=\"Back to reference ");
    out.write_u32(def.number);
    out.write_str("\">\u{21A9}</a>");

    for n in 2..=def.ref_count {
        out.write_str(" <a href=\"#fnref-");
        out.write_escaped_href(label);
        out.write_str("-");
        out.write_u32(n);
        out.write_str("\" class=\"footnote-backref\" data-footnote-backref data-footnote-backref-idx=\"");
        out.write_u32(def.number);
        out.write_str("-");
        out.write_u32(n);
        out.write_str("\" aria-label=\"Back to reference ");
        out.write_u32(def.number);
        out.write_str("-");
        out.write_u32(n);
        out.write_str("\">\u{21A9}<sup class=\"footnote-ref\">");
        out.write_u32(n);
        out.write_str("</sup></a>");
    }
}
