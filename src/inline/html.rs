//! Raw HTML recognisers shared by inline parsing and HTML block detection.
//!
//! Every function takes the text and the offset of a `<` and returns the
//! offset just past the construct, or `None` if it is not well formed.

use memchr::{memchr, memmem};

/// Any inline HTML construct: tag, comment, processing instruction,
/// declaration or CDATA section.
pub(crate) fn scan_inline_html(text: &[u8], start: usize) -> Option<usize> {
    if text.get(start) != Some(&b'<') {
        return None;
    }
    match text.get(start + 1)? {
        b'!' => {
            let rest = &text[start..];
            if rest.starts_with(b"<!--") {
                scan_comment(text, start)
            } else if rest.starts_with(b"<![CDATA[") {
                find(text, start + 9, b"]]>").map(|end| end + 3)
            } else {
                scan_declaration(text, start)
            }
        }
        b'?' => find(text, start + 2, b"?>").map(|end| end + 2),
        _ => scan_tag(text, start),
    }
}

/// An open or closing tag.
pub(crate) fn scan_tag(text: &[u8], start: usize) -> Option<usize> {
    let len = text.len();
    let mut i = start + 1;
    let closing = text.get(i) == Some(&b'/');
    if closing {
        i += 1;
    }
    if !text.get(i)?.is_ascii_alphabetic() {
        return None;
    }
    i += 1;
    while i < len && (text[i].is_ascii_alphanumeric() || text[i] == b'-') {
        i += 1;
    }

    if closing {
        i = skip_ws(text, i);
        return (text.get(i) == Some(&b'>')).then_some(i + 1);
    }

    loop {
        let ws_start = i;
        i = skip_ws(text, i);
        match *text.get(i)? {
            b'>' => return Some(i + 1),
            b'/' => return (text.get(i + 1) == Some(&b'>')).then_some(i + 2),
            _ => {}
        }
        // attributes must be separated from what precedes them
        if i == ws_start || !is_attr_name_start(text[i]) {
            return None;
        }
        i += 1;
        while i < len && is_attr_name_char(text[i]) {
            i += 1;
        }

        let after_name = i;
        i = skip_ws(text, i);
        if text.get(i) != Some(&b'=') {
            i = after_name;
            continue;
        }
        i = skip_ws(text, i + 1);
        match *text.get(i)? {
            q @ (b'"' | b'\'') => {
                let close = memchr(q, &text[i + 1..])?;
                i += close + 2;
            }
            _ => {
                let value_start = i;
                while i < len
                    && !is_html_whitespace(text[i])
                    && !matches!(text[i], b'"' | b'\'' | b'=' | b'<' | b'>' | b'`')
                {
                    i += 1;
                }
                if i == value_start {
                    return None;
                }
            }
        }
    }
}

fn scan_comment(text: &[u8], start: usize) -> Option<usize> {
    let i = start + 4;
    match text.get(i..) {
        Some([b'>', ..]) => Some(i + 1),
        Some([b'-', b'>', ..]) => Some(i + 2),
        Some(_) => find(text, i, b"-->").map(|end| end + 3),
        None => None,
    }
}

fn scan_declaration(text: &[u8], start: usize) -> Option<usize> {
    if !text.get(start + 2)?.is_ascii_alphabetic() {
        return None;
    }
    memchr(b'>', &text[start + 2..]).map(|off| start + 2 + off + 1)
}

fn find(text: &[u8], start: usize, needle: &[u8]) -> Option<usize> {
    let hay = text.get(start..)?;
    memmem::find(hay, needle).map(|idx| start + idx)
}

fn skip_ws(text: &[u8], mut i: usize) -> usize {
    while i < text.len() && is_html_whitespace(text[i]) {
        i += 1;
    }
    i
}

#[inline]
fn is_html_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

#[inline]
fn is_attr_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b':'
}

#[inline]
fn is_attr_name_char(b: u8) -> bool {
    is_attr_name_start(b) || b.is_ascii_digit() || b == b'.' || b == b'-'
}
