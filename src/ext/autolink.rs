//! Extended autolinks: `www.` links, `http://` / `https://` URLs and bare
//! email addresses found in plain text.
//!
//! `www.` and scheme links are matched on the raw leaf text while inlines
//! are resolved, so the character before a link is the one in the source
//! and entity references after it are still undecoded. Emails are found by
//! a post-processing pass over text nodes outside links and images.

use super::{InlineMatch, SyntaxExtension};
use crate::Options;
use crate::inline::{InlineContext, char_at, char_before, is_punctuation};
use crate::node::{Link, NodeValue, Sourcepos};
use crate::tree::{Document, NodeId};

/// The `autolink` extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct Autolink;

impl SyntaxExtension for Autolink {
    fn name(&self) -> &'static str {
        "autolink"
    }

    fn inline_triggers(&self) -> &'static [u8] {
        b"wWhH"
    }

    fn match_inline(&self, ctx: &InlineContext<'_>, trigger: u8) -> Option<InlineMatch> {
        // link text never contains another link
        if ctx.in_brackets() {
            return None;
        }
        let found = match trigger {
            b'w' | b'W' => www_match(ctx.text(), ctx.pos()),
            _ => url_match(ctx.text(), ctx.pos()),
        }?;
        Some(InlineMatch::Link { url: found.url, len: found.end - found.start })
    }

    fn postprocess(&self, doc: &mut Document, _options: &Options) {
        let texts: Vec<NodeId> = doc
            .descendants(doc.root())
            .filter(|&id| matches!(doc.value(id), NodeValue::Text(_)) && !inside_link(doc, id))
            .collect();
        for id in texts {
            link_emails(doc, id);
        }
    }
}

/// One recognised link inside a text.
#[derive(Debug, PartialEq, Eq)]
struct Found {
    start: usize,
    end: usize,
    url: String,
}

fn inside_link(doc: &Document, id: NodeId) -> bool {
    let mut cur = doc.parent(id);
    while let Some(p) = cur {
        if matches!(doc.value(p), NodeValue::Link(_) | NodeValue::Image(_)) {
            return true;
        }
        cur = doc.parent(p);
    }
    false
}

fn link_emails(doc: &mut Document, id: NodeId) {
    let NodeValue::Text(text) = doc.value(id) else {
        return;
    };
    let found = scan_emails(text.as_bytes());
    if found.is_empty() {
        return;
    }
    let text = text.clone();

    let mut last = 0;
    for link in found {
        if link.start > last {
            let before = doc.create(NodeValue::Text(text[last..link.start].to_string()), Sourcepos::default());
            doc.insert_before(id, before);
        }
        let node = doc.create(NodeValue::Link(Link { url: link.url, title: String::new() }), Sourcepos::default());
        doc.append_value(node, NodeValue::Text(text[link.start..link.end].to_string()), Sourcepos::default());
        doc.insert_before(id, node);
        last = link.end;
    }
    if last < text.len() {
        if let NodeValue::Text(rest) = doc.value_mut(id) {
            *rest = text[last..].to_string();
        }
    } else {
        doc.detach(id);
    }
}

/// All email addresses in `text`, left to right, non-overlapping.
fn scan_emails(text: &[u8]) -> Vec<Found> {
    let mut found: Vec<Found> = Vec::new();
    for at in memchr::memchr_iter(b'@', text) {
        let floor = found.last().map_or(0, |f| f.end);
        if at < floor {
            continue;
        }
        if let Some(link) = email_match(text, at, floor) {
            found.push(link);
        }
    }
    found
}

/// Characters after which an extended autolink may start.
fn at_boundary(text: &[u8], pos: usize) -> bool {
    match char_before(text, pos) {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, '*' | '_' | '~' | '('),
    }
}

fn www_match(text: &[u8], pos: usize) -> Option<Found> {
    if !text[pos..].starts_with(b"www.") || !at_boundary(text, pos) {
        return None;
    }
    let domain = check_domain(&text[pos..], false)?;
    let end = link_end(text, pos, pos + domain);
    let url = format!("http://{}", String::from_utf8_lossy(&text[pos..end]));
    Some(Found { start: pos, end, url })
}

fn url_match(text: &[u8], pos: usize) -> Option<Found> {
    let scheme_len = if starts_with_ignore_case(&text[pos..], b"https://") {
        8
    } else if starts_with_ignore_case(&text[pos..], b"http://") {
        7
    } else {
        return None;
    };
    if char_before(text, pos).is_some_and(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let domain = check_domain(&text[pos + scheme_len..], true)?;
    let end = link_end(text, pos, pos + scheme_len + domain);
    let url = String::from_utf8_lossy(&text[pos..end]).into_owned();
    Some(Found { start: pos, end, url })
}

/// Email address around the `@` at `at`. The local part may not reach back
/// past `floor`, the end of the previous link.
fn email_match(text: &[u8], at: usize, floor: usize) -> Option<Found> {
    let mut start = at;
    while start > floor && is_email_local(text[start - 1]) {
        start -= 1;
    }
    if start == at || (start > 0 && text[start - 1] == b'/') {
        return None;
    }

    let mut end = at + 1;
    let mut dots = 0;
    while end < text.len() {
        let b = text[end];
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            end += 1;
        } else if b == b'.' && text.get(end + 1).is_some_and(u8::is_ascii_alphanumeric) {
            dots += 1;
            end += 1;
        } else {
            break;
        }
    }
    if dots == 0 || end - at < 2 {
        return None;
    }
    let last = text[end - 1];
    if !last.is_ascii_alphabetic() && last != b'.' {
        return None;
    }
    let end = trim_delimiters(text, start, end);
    if end <= at + 1 {
        return None;
    }
    let address = String::from_utf8_lossy(&text[start..end]);
    Some(Found { start, end, url: format!("mailto:{address}") })
}

fn is_email_local(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'+' | b'-' | b'_')
}

fn starts_with_ignore_case(text: &[u8], prefix: &[u8]) -> bool {
    text.len() >= prefix.len() && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Length of a plausible domain at the start of `text`, or `None`. Short
/// (dotless) domains are allowed only for scheme URLs. Underscores are not
/// allowed in the last two labels.
fn check_domain(text: &[u8], allow_short: bool) -> Option<usize> {
    let mut dots = 0;
    let mut underscores_last = 0;
    let mut underscores_prev = 0;
    let mut pos = 0;
    while pos < text.len() {
        let Some(c) = char_at(text, pos) else {
            break;
        };
        match c {
            '\\' if pos + 2 < text.len() => {
                pos += 2;
                continue;
            }
            '_' => underscores_last += 1,
            '.' => {
                underscores_prev = underscores_last;
                underscores_last = 0;
                dots += 1;
            }
            '-' => {}
            c if c.is_whitespace() || is_punctuation(c) => break,
            _ => {}
        }
        pos += c.len_utf8();
    }
    if pos == 0 || underscores_prev > 0 || underscores_last > 0 {
        return None;
    }
    (allow_short || dots > 0).then_some(pos)
}

/// Extend a link from its domain to the next whitespace, then trim
/// trailing punctuation.
fn link_end(text: &[u8], start: usize, domain_end: usize) -> usize {
    let mut end = domain_end;
    while end < text.len() && !text[end].is_ascii_whitespace() {
        end += 1;
    }
    trim_delimiters(text, start, end)
}

/// Drop what follows a `<`, trailing punctuation, an entity-like `&name;`
/// suffix and closing parentheses that have no opening partner.
fn trim_delimiters(text: &[u8], start: usize, mut end: usize) -> usize {
    if let Some(lt) = memchr::memchr(b'<', &text[start..end]) {
        end = start + lt;
    }
    while end > start {
        match text[end - 1] {
            b'?' | b'!' | b'.' | b',' | b':' | b'*' | b'_' | b'~' | b'\'' | b'"' => end -= 1,
            b';' => {
                let mut amp = end - 1;
                while amp > start && text[amp - 1].is_ascii_alphanumeric() {
                    amp -= 1;
                }
                if amp > start && amp < end - 1 && text[amp - 1] == b'&' {
                    end = amp - 1;
                } else {
                    end -= 1;
                }
            }
            b')' => {
                let link = &text[start..end];
                let opening = link.iter().filter(|&&b| b == b'(').count();
                let closing = link.iter().filter(|&&b| b == b')').count();
                if closing <= opening {
                    break;
                }
                end -= 1;
            }
            _ => break,
        }
    }
    end
}
