//! Line-start recognisers for block syntax.
//!
//! Each function looks at a line (without its line ending) from a given
//! offset, normally the first non-space byte, and reports what it found
//! without mutating any state.

use crate::cursor::Cursor;
use crate::inline::html::scan_tag;
use crate::limits::MAX_LIST_MARKER_DIGITS;
use crate::node::{ListData, ListKind};

/// Whether the rest of the line is only spaces and tabs.
#[inline]
pub(crate) fn is_blank(rest: &[u8]) -> bool {
    rest.iter().all(|&b| b == b' ' || b == b'\t')
}

/// `***`, `---` or `___`, optionally spaced.
pub(crate) fn thematic_break(line: &[u8], pos: usize) -> bool {
    let marker = match line.get(pos) {
        Some(&b @ (b'-' | b'*' | b'_')) => b,
        _ => return false,
    };
    let mut count = 0;
    for &b in &line[pos..] {
        if b == marker {
            count += 1;
        } else if b != b' ' && b != b'\t' {
            return false;
        }
    }
    count >= 3
}

/// ATX heading opener: returns the level and the offset of the content.
pub(crate) fn atx_heading(line: &[u8], pos: usize) -> Option<(u8, usize)> {
    let mut c = Cursor::new_at(line, pos);
    let level = c.skip_while(|b| b == b'#');
    if !(1..=6).contains(&level) {
        return None;
    }
    if !c.is_eof() && !c.at_any(b" \t") {
        return None;
    }
    c.skip_spaces();
    Some((level as u8, c.offset()))
}

/// Strip the optional closing `#` sequence and surrounding spaces.
pub(crate) fn atx_heading_content(line: &[u8], start: usize) -> &[u8] {
    let mut end = line.len();
    while end > start && matches!(line[end - 1], b' ' | b'\t') {
        end -= 1;
    }
    let mut hashes = end;
    while hashes > start && line[hashes - 1] == b'#' {
        hashes -= 1;
    }
    if hashes < end && (hashes == start || matches!(line[hashes - 1], b' ' | b'\t')) {
        end = hashes;
        while end > start && matches!(line[end - 1], b' ' | b'\t') {
            end -= 1;
        }
    }
    &line[start..end]
}

/// Opening code fence: returns fence char and length.
pub(crate) fn open_code_fence(line: &[u8], pos: usize) -> Option<(u8, usize)> {
    let ch = match line.get(pos) {
        Some(&b @ (b'`' | b'~')) => b,
        _ => return None,
    };
    let mut c = Cursor::new_at(line, pos);
    let len = c.skip_while(|b| b == ch);
    if len < 3 {
        return None;
    }
    if ch == b'`' && c.find(b'`').is_some() {
        return None;
    }
    Some((ch, len))
}

/// Closing code fence of at least `min_len` `ch` characters.
pub(crate) fn close_code_fence(line: &[u8], pos: usize, ch: u8, min_len: usize) -> bool {
    let mut c = Cursor::new_at(line, pos);
    let len = c.skip_while(|b| b == ch);
    len >= min_len && is_blank(c.remaining_slice())
}

/// Setext underline: `=` gives level 1, `-` level 2.
pub(crate) fn setext_underline(line: &[u8], pos: usize) -> Option<u8> {
    let ch = *line.get(pos)?;
    let level = match ch {
        b'=' => 1,
        b'-' => 2,
        _ => return None,
    };
    let mut c = Cursor::new_at(line, pos);
    c.skip_while(|b| b == ch);
    is_blank(c.remaining_slice()).then_some(level)
}

const TYPE_1_TAGS: &[&[u8]] = &[b"pre", b"script", b"style", b"textarea"];

const TYPE_6_TAGS: &[&[u8]] = &[
    b"address", b"article", b"aside", b"base", b"basefont", b"blockquote", b"body", b"caption",
    b"center", b"col", b"colgroup", b"dd", b"details", b"dialog", b"dir", b"div", b"dl", b"dt",
    b"fieldset", b"figcaption", b"figure", b"footer", b"form", b"frame", b"frameset", b"h1", b"h2",
    b"h3", b"h4", b"h5", b"h6", b"head", b"header", b"hr", b"html", b"iframe", b"legend", b"li",
    b"link", b"main", b"menu", b"menuitem", b"nav", b"noframes", b"ol", b"optgroup", b"option",
    b"p", b"param", b"search", b"section", b"summary", b"table", b"tbody", b"td", b"tfoot", b"th",
    b"thead", b"title", b"tr", b"track", b"ul",
];

fn starts_with_ignore_case(hay: &[u8], needle: &[u8]) -> bool {
    hay.len() >= needle.len() && hay[..needle.len()].eq_ignore_ascii_case(needle)
}

/// HTML block start condition (1 to 7), if the line opens one.
/// Condition 7 cannot interrupt a paragraph.
pub(crate) fn html_block_start(line: &[u8], pos: usize, in_paragraph: bool) -> Option<u8> {
    let rest = &line[pos..];
    if rest.first() != Some(&b'<') {
        return None;
    }
    let after = &rest[1..];

    for tag in TYPE_1_TAGS {
        if starts_with_ignore_case(after, tag) {
            match after.get(tag.len()) {
                None | Some(b' ' | b'\t' | b'>') => return Some(1),
                _ => {}
            }
        }
    }
    if after.starts_with(b"!--") {
        return Some(2);
    }
    if after.starts_with(b"?") {
        return Some(3);
    }
    if after.first() == Some(&b'!') && after.get(1).is_some_and(|b| b.is_ascii_alphabetic()) {
        return Some(4);
    }
    if after.starts_with(b"![CDATA[") {
        return Some(5);
    }

    let name_start = usize::from(after.first() == Some(&b'/'));
    let name_len = after[name_start..]
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    let name = &after[name_start..name_start + name_len];
    if name_len > 0 && TYPE_6_TAGS.iter().any(|t| t.eq_ignore_ascii_case(name)) {
        let tail = &after[name_start + name_len..];
        match tail {
            [] | [b' ' | b'\t' | b'>', ..] | [b'/', b'>', ..] => return Some(6),
            _ => {}
        }
    }

    if !in_paragraph {
        let closing = name_start == 1;
        let is_type_1 = TYPE_1_TAGS.iter().any(|t| t.eq_ignore_ascii_case(name));
        if !(is_type_1 && !closing) {
            if let Some(end) = scan_tag(rest, 0) {
                if is_blank(&rest[end..]) {
                    return Some(7);
                }
            }
        }
    }
    None
}

/// Whether `line` ends an HTML block of the given type. Types 6 and 7
/// end at a blank line, which the caller handles.
pub(crate) fn html_block_end(line: &[u8], block_type: u8) -> bool {
    let contains_ci = |needle: &[u8]| {
        line.windows(needle.len()).any(|w| w.eq_ignore_ascii_case(needle))
    };
    match block_type {
        1 => {
            contains_ci(b"</script>")
                || contains_ci(b"</pre>")
                || contains_ci(b"</style>")
                || contains_ci(b"</textarea>")
        }
        2 => memchr::memmem::find(line, b"-->").is_some(),
        3 => memchr::memmem::find(line, b"?>").is_some(),
        4 => line.contains(&b'>'),
        5 => memchr::memmem::find(line, b"]]>").is_some(),
        _ => false,
    }
}

/// A recognised list marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ListMarker {
    pub data: ListData,
    /// Bytes of the marker itself (`-`, `10.`).
    pub marker_len: usize,
}

/// List item marker at `pos`. `interrupts_paragraph` applies the stricter
/// rules for starting a list inside running paragraph text.
pub(crate) fn list_marker(line: &[u8], pos: usize, interrupts_paragraph: bool) -> Option<ListMarker> {
    let mut c = Cursor::new_at(line, pos);
    let kind = match c.peek()? {
        b @ (b'-' | b'+' | b'*') => {
            c.bump();
            ListKind::Unordered { marker: b }
        }
        b'0'..=b'9' => {
            let digits = c.skip_while(|b| b.is_ascii_digit());
            if digits > MAX_LIST_MARKER_DIGITS {
                return None;
            }
            let delimiter = c.peek()?;
            if delimiter != b'.' && delimiter != b')' {
                return None;
            }
            let start = std::str::from_utf8(&line[pos..pos + digits])
                .ok()?
                .parse::<u32>()
                .ok()?;
            c.bump();
            ListKind::Ordered { start, delimiter }
        }
        _ => return None,
    };

    // marker must be followed by whitespace or end of line
    if !c.is_eof() && !c.at_any(b" \t") {
        return None;
    }
    if interrupts_paragraph {
        if is_blank(c.remaining_slice()) {
            return None;
        }
        if let ListKind::Ordered { start, .. } = kind {
            if start != 1 {
                return None;
            }
        }
    }

    Some(ListMarker {
        data: ListData {
            kind,
            tight: true,
            marker_offset: 0,
            padding: 0,
        },
        marker_len: c.offset() - pos,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thematic_break() {
        assert!(thematic_break(b"***", 0));
        assert!(thematic_break(b"- - -", 0));
        assert!(thematic_break(b"   ___  ", 3));
        assert!(!thematic_break(b"--", 0));
        assert!(!thematic_break(b"-*-", 0));
        assert!(!thematic_break(b"---a", 0));
    }

    #[test]
    fn test_atx_heading() {
        assert_eq!(atx_heading(b"# foo", 0), Some((1, 2)));
        assert_eq!(atx_heading(b"###### foo", 0), Some((6, 7)));
        assert_eq!(atx_heading(b"#", 0), Some((1, 1)));
        assert_eq!(atx_heading(b"####### foo", 0), None);
        assert_eq!(atx_heading(b"#5 bolt", 0), None);
    }

    #[test]
    fn test_atx_heading_content() {
        assert_eq!(atx_heading_content(b"# foo ##", 2), b"foo");
        assert_eq!(atx_heading_content(b"# foo#", 2), b"foo#");
        assert_eq!(atx_heading_content(b"### ###", 4), b"");
        assert_eq!(atx_heading_content(b"# foo \\#", 2), b"foo \\#");
    }

    #[test]
    fn test_code_fences() {
        assert_eq!(open_code_fence(b"```rust", 0), Some((b'`', 3)));
        assert_eq!(open_code_fence(b"~~~~ a`b", 0), Some((b'~', 4)));
        assert_eq!(open_code_fence(b"``` a`b", 0), None);
        assert_eq!(open_code_fence(b"``", 0), None);
        assert!(close_code_fence(b"````  ", 0, b'`', 3));
        assert!(!close_code_fence(b"``", 0, b'`', 3));
        assert!(!close_code_fence(b"``` x", 0, b'`', 3));
    }

    #[test]
    fn test_setext_underline() {
        assert_eq!(setext_underline(b"===", 0), Some(1));
        assert_eq!(setext_underline(b"-  ", 0), Some(2));
        assert_eq!(setext_underline(b"= =", 0), None);
    }

    #[test]
    fn test_html_block_start() {
        assert_eq!(html_block_start(b"<script>", 0, false), Some(1));
        assert_eq!(html_block_start(b"<PRE class=\"x\">", 0, true), Some(1));
        assert_eq!(html_block_start(b"<!-- c", 0, false), Some(2));
        assert_eq!(html_block_start(b"<?php", 0, false), Some(3));
        assert_eq!(html_block_start(b"<!DOCTYPE html>", 0, false), Some(4));
        assert_eq!(html_block_start(b"<![CDATA[", 0, false), Some(5));
        assert_eq!(html_block_start(b"<div>", 0, true), Some(6));
        assert_eq!(html_block_start(b"</table>", 0, false), Some(6));
        assert_eq!(html_block_start(b"<a href=\"x\">", 0, false), Some(7));
        assert_eq!(html_block_start(b"<a href=\"x\">", 0, true), None);
        assert_eq!(html_block_start(b"<a> text", 0, false), None);
        assert_eq!(html_block_start(b"<divx>", 0, true), None);
    }

    #[test]
    fn test_html_block_end() {
        assert!(html_block_end(b"x </SCRIPT> y", 1));
        assert!(html_block_end(b"-->", 2));
        assert!(!html_block_end(b"->", 2));
        assert!(!html_block_end(b"anything", 6));
    }

    #[test]
    fn test_list_markers() {
        let m = list_marker(b"- foo", 0, false).unwrap();
        assert_eq!(m.data.kind, ListKind::Unordered { marker: b'-' });
        assert_eq!(m.marker_len, 1);

        let m = list_marker(b"10) foo", 0, false).unwrap();
        assert_eq!(m.data.kind, ListKind::Ordered { start: 10, delimiter: b')' });
        assert_eq!(m.marker_len, 3);

        assert!(list_marker(b"-foo", 0, false).is_none());
        assert!(list_marker(b"1234567890. x", 0, false).is_none());
        assert!(list_marker(b"-", 0, false).is_some());
    }

    #[test]
    fn test_list_marker_interrupting_paragraph() {
        assert!(list_marker(b"-", 0, true).is_none());
        assert!(list_marker(b"2. x", 0, true).is_none());
        assert!(list_marker(b"1. x", 0, true).is_some());
    }
}
