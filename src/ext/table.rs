//! GFM pipe tables.
//!
//! A table starts when the last line of an open paragraph is a header row
//! and the current line is a delimiter row with the same number of cells.
//! Earlier paragraph lines stay a paragraph. Every following non-blank line
//! is a body row until a blank line or another block start ends the table.
//!
//! Rows are collected as raw lines and split into cells when the table
//! closes. Cell text then goes through inline resolution like a paragraph.

use smallvec::SmallVec;

use super::{BlockPrecedence, SyntaxExtension};
use crate::block::BlockContext;
use crate::error::Result;
use crate::limits::MAX_TABLE_COLUMNS;
use crate::node::{Alignment, NodeValue, Sourcepos};
use crate::render::RenderContext;
use crate::tree::{Document, NodeId};

type Cells<'a> = SmallVec<[&'a [u8]; 8]>;

/// The `table` extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct Table;

impl SyntaxExtension for Table {
    fn name(&self) -> &'static str {
        "table"
    }

    fn node_kinds(&self) -> &'static [&'static str] {
        &["table", "table_row", "table_cell"]
    }

    fn block_precedence(&self) -> BlockPrecedence {
        BlockPrecedence::Last
    }

    fn open_block(&self, ctx: &mut BlockContext<'_>) -> Result<Option<NodeId>> {
        let paragraph = ctx.container();
        if !matches!(ctx.document().value(paragraph), NodeValue::Paragraph) || ctx.is_indented() {
            return Ok(None);
        }
        let delimiter_row = &ctx.line()[ctx.first_nonspace()..];
        let Some(alignments) = parse_delimiter_row(delimiter_row) else {
            return Ok(None);
        };
        let delimiter_has_pipe = delimiter_row.contains(&b'|');

        // only the paragraph's last line can become the header row
        let body = ctx.content(paragraph).trim_end_matches('\n').to_string();
        let (keep, header) = match body.rfind('\n') {
            Some(nl) => (nl + 1, body[nl + 1..].to_string()),
            None => (0, body),
        };
        let header_cells = split_row(header.as_bytes()).len();
        if !(delimiter_has_pipe || header.contains('|')) || header_cells != alignments.len() {
            return Ok(None);
        }

        tracing::trace!(columns = alignments.len(), line = ctx.line_number(), "table opened");
        ctx.content_mut(paragraph).truncate(keep);
        let start_line = ctx.line_number().saturating_sub(1);
        let table = ctx.add_child(NodeValue::Table(alignments), 1)?;
        let doc = ctx.document_mut();
        doc.node_mut(table).sourcepos.start.line = start_line;
        doc.node_mut(table).content = header + "\n";
        Ok(Some(table))
    }

    fn continue_block(&self, ctx: &mut BlockContext<'_>, _node: NodeId) -> bool {
        !ctx.is_blank()
    }

    fn accepts_lines(&self, value: &NodeValue) -> bool {
        matches!(value, NodeValue::Table(_))
    }

    fn close_block(&self, doc: &mut Document, node: NodeId) {
        let NodeValue::Table(alignments) = doc.value(node) else {
            return;
        };
        let columns = alignments.len();
        let content = std::mem::take(&mut doc.node_mut(node).content);
        let start_line = doc.node(node).sourcepos.start.line;

        for (i, line) in content.lines().enumerate() {
            // the delimiter row is already captured in the alignments
            if i == 1 {
                continue;
            }
            let pos = Sourcepos::new(start_line + i, 1, start_line + i, line.len());
            let row = doc.append_value(node, NodeValue::TableRow { header: i == 0 }, pos);
            let cells = split_row(line.as_bytes());
            for col in 0..columns {
                let cell = doc.append_value(row, NodeValue::TableCell, pos);
                if let Some(raw) = cells.get(col) {
                    doc.node_mut(cell).content = unescape_pipes(raw);
                }
            }
        }
    }

    fn render(&self, ctx: &mut RenderContext<'_>, node: NodeId, entering: bool) {
        let doc = ctx.document();
        match doc.value(node) {
            NodeValue::Table(_) => {
                if entering {
                    ctx.cr();
                    ctx.out().write_str("<table");
                    ctx.sourcepos(node);
                    ctx.out().write_str(">\n");
                } else {
                    let has_body = doc.first_child(node).and_then(|h| doc.next_sibling(h)).is_some();
                    if has_body {
                        ctx.cr();
                        ctx.out().write_str("</tbody>\n");
                    }
                    ctx.cr();
                    ctx.out().write_str("</table>\n");
                }
            }
            NodeValue::TableRow { header } => {
                let header = *header;
                if entering {
                    ctx.cr();
                    if header {
                        ctx.out().write_str("<thead>\n");
                    } else if doc.prev_sibling(node).is_some_and(|p| is_header_row(doc, p)) {
                        ctx.out().write_str("<tbody>\n");
                    }
                    ctx.out().write_str("<tr");
                    ctx.sourcepos(node);
                    ctx.out().write_str(">");
                } else {
                    ctx.cr();
                    ctx.out().write_str("</tr>");
                    if header {
                        ctx.cr();
                        ctx.out().write_str("</thead>");
                    }
                }
            }
            NodeValue::TableCell => {
                let row = doc.parent(node);
                let header = row.is_some_and(|r| is_header_row(doc, r));
                if entering {
                    let col = cell_index(doc, node);
                    let align = row
                        .and_then(|r| doc.parent(r))
                        .and_then(|t| match doc.value(t) {
                            NodeValue::Table(aligns) => aligns.get(col).copied(),
                            _ => None,
                        })
                        .and_then(Alignment::as_attr);
                    ctx.cr();
                    ctx.out().write_str(if header { "<th" } else { "<td" });
                    if let Some(align) = align {
                        ctx.out().write_str(" align=\"");
                        ctx.out().write_str(align);
                        ctx.out().write_str("\"");
                    }
                    ctx.sourcepos(node);
                    ctx.out().write_str(">");
                } else {
                    ctx.out().write_str(if header { "</th>" } else { "</td>" });
                }
            }
            _ => {}
        }
    }
}

fn is_header_row(doc: &Document, row: NodeId) -> bool {
    matches!(doc.value(row), NodeValue::TableRow { header: true })
}

fn cell_index(doc: &Document, cell: NodeId) -> usize {
    let mut index = 0;
    let mut cur = doc.prev_sibling(cell);
    while let Some(prev) = cur {
        index += 1;
        cur = doc.prev_sibling(prev);
    }
    index
}

/// Parse a delimiter row such as `| :--- | ---: |`.
fn parse_delimiter_row(line: &[u8]) -> Option<Vec<Alignment>> {
    let cells = split_row(line);
    if cells.is_empty() || cells.len() > MAX_TABLE_COLUMNS {
        return None;
    }
    cells.iter().map(|cell| parse_alignment(cell)).collect()
}

fn parse_alignment(cell: &[u8]) -> Option<Alignment> {
    let left = cell.first() == Some(&b':');
    let right = cell.len() > 1 && cell.last() == Some(&b':');
    let dashes = &cell[usize::from(left)..cell.len() - usize::from(right)];
    if dashes.is_empty() || !dashes.iter().all(|&b| b == b'-') {
        return None;
    }
    Some(match (left, right) {
        (true, true) => Alignment::Center,
        (true, false) => Alignment::Left,
        (false, true) => Alignment::Right,
        (false, false) => Alignment::None,
    })
}

/// Split a row on unescaped pipes. An optional leading and trailing pipe is
/// dropped and each cell is trimmed.
fn split_row(line: &[u8]) -> Cells<'_> {
    let mut line = line.trim_ascii();
    if let Some(rest) = line.strip_prefix(b"|") {
        line = rest;
    }
    if line.ends_with(b"|") && !line.ends_with(b"\\|") {
        line = &line[..line.len() - 1];
    }

    let mut cells = Cells::new();
    if line.trim_ascii().is_empty() {
        return cells;
    }
    let mut start = 0;
    let mut pos = 0;
    while pos < line.len() {
        match line[pos] {
            b'\\' => pos += 2,
            b'|' => {
                cells.push(line[start..pos].trim_ascii());
                pos += 1;
                start = pos;
            }
            _ => pos += 1,
        }
    }
    cells.push(line[start.min(line.len())..].trim_ascii());
    cells
}

/// `\|` inside a cell is a literal pipe, even inside code spans.
fn unescape_pipes(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    if text.contains("\\|") {
        text.replace("\\|", "|")
    } else {
        text.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Options, markdown_to_html_with_extensions};

    fn render(input: &str) -> String {
        markdown_to_html_with_extensions(input, &Options::default(), &["table"]).unwrap()
    }

    #[test]
    fn split_row_handles_outer_pipes_and_escapes() {
        let cells = split_row(b"| a | b \\| c |");
        assert_eq!(cells.as_slice(), [&b"a"[..], &b"b \\| c"[..]]);
        assert_eq!(split_row(b"a|b").len(), 2);
        assert!(split_row(b"|").is_empty());
    }

    #[test]
    fn alignments() {
        assert_eq!(
            parse_delimiter_row(b"| :-- | --: | :-: | --- |"),
            Some(vec![Alignment::Left, Alignment::Right, Alignment::Center, Alignment::None])
        );
        assert_eq!(parse_delimiter_row(b"| :: |"), None);
        assert_eq!(parse_delimiter_row(b"| a |"), None);
    }

    #[test]
    fn basic_table() {
        assert_eq!(
            render("| foo | bar |\n| --- | --- |\n| baz | bim |\n"),
            "<table>\n<thead>\n<tr>\n<th>foo</th>\n<th>bar</th>\n</tr>\n</thead>\n\
             <tbody>\n<tr>\n<td>baz</td>\n<td>bim</td>\n</tr>\n</tbody>\n</table>\n"
        );
    }

    #[test]
    fn header_only_has_no_tbody() {
        assert_eq!(
            render("| abc | def |\n| --- | --- |\n"),
            "<table>\n<thead>\n<tr>\n<th>abc</th>\n<th>def</th>\n</tr>\n</thead>\n</table>\n"
        );
    }

    #[test]
    fn mismatched_delimiter_row_is_paragraph() {
        assert_eq!(
            render("| abc | def |\n| --- |\n| bar |\n"),
            "<p>| abc | def |\n| --- |\n| bar |</p>\n"
        );
    }

    #[test]
    fn rows_padded_and_truncated() {
        let html = render("| a | b |\n| - | :-: |\n| 1 |\n| 1 | 2 | 3 |\n");
        assert!(html.contains("<tr>\n<td>1</td>\n<td align=\"center\"></td>\n</tr>"));
        assert!(html.contains("<tr>\n<td>1</td>\n<td align=\"center\">2</td>\n</tr>"));
        assert!(!html.contains('3'));
    }

    #[test]
    fn interrupts_paragraph_and_ends_at_block_start() {
        assert_eq!(
            render("intro\na | b\n--|--\nc | d\n> quote\n"),
            "<p>intro</p>\n<table>\n<thead>\n<tr>\n<th>a</th>\n<th>b</th>\n</tr>\n</thead>\n\
             <tbody>\n<tr>\n<td>c</td>\n<td>d</td>\n</tr>\n</tbody>\n</table>\n\
             <blockquote>\n<p>quote</p>\n</blockquote>\n"
        );
    }

    #[test]
    fn escaped_pipe_in_code() {
        let html = render("| f |\n| - |\n| `a\\|b` |\n");
        assert!(html.contains("<td><code>a|b</code></td>"));
    }
}
