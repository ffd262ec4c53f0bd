//! Link reference definitions (CommonMark).

use std::collections::HashMap;

use rustc_hash::FxBuildHasher;

use crate::cursor::Cursor;
use crate::escape::unescape;
use crate::inline::links::{scan_link_destination, scan_link_label, scan_link_title};

/// A link reference definition (URL + title), already unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRefDef {
    pub url: String,
    pub title: String,
}

/// Store of link reference definitions, keyed by normalized label.
#[derive(Debug, Default, Clone)]
pub struct LinkRefStore {
    by_label: HashMap<String, LinkRefDef, FxBuildHasher>,
}

impl LinkRefStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition if the label is new. First definition wins.
    pub fn insert(&mut self, label: String, def: LinkRefDef) {
        self.by_label.entry(label).or_insert(def);
    }

    /// Look up a raw (not yet normalized) label.
    pub fn lookup(&self, raw_label: &[u8]) -> Option<&LinkRefDef> {
        self.by_label.get(&normalize_label(raw_label))
    }

    pub fn len(&self) -> usize {
        self.by_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_label.is_empty()
    }
}

/// Normalize a link label per CommonMark: collapse internal whitespace to
/// single spaces, trim, and case-fold.
pub fn normalize_label(bytes: &[u8]) -> String {
    let label = String::from_utf8_lossy(bytes);
    let mut out = String::with_capacity(label.len());
    let mut last_was_space = true;

    for ch in label.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
            continue;
        }

        last_was_space = false;
        if ch == 'ß' || ch == 'ẞ' {
            out.push_str("ss");
        } else {
            out.extend(ch.to_lowercase());
        }
    }

    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Parse one link reference definition at the start of `text`.
///
/// Returns the normalized label, the definition and the number of bytes
/// consumed including the trailing line ending.
pub fn parse_definition(text: &[u8]) -> Option<(String, LinkRefDef, usize)> {
    let (after_label, raw_label) = scan_link_label(text, 0)?;
    let mut c = Cursor::new_at(text, after_label);
    if !c.eat(b':') {
        return None;
    }
    c.skip_spaces_and_newline();

    let dest_start = c.offset();
    let (after_dest, raw_dest) = scan_link_destination(text, dest_start)?;
    c.set_offset(after_dest);

    let before_title = c.offset();
    c.skip_spaces_and_newline();
    let mut title = None;
    if c.offset() != before_title {
        if let Some((after_title, raw_title)) = scan_link_title(text, c.offset()) {
            let mut probe = Cursor::new_at(text, after_title);
            probe.skip_spaces();
            if at_line_end(&probe) {
                title = Some(raw_title);
                c = probe;
            }
        }
    }
    if title.is_none() {
        c.set_offset(before_title);
        c.skip_spaces();
        if !at_line_end(&c) {
            return None;
        }
    }
    c.eat(b'\n');

    let label = normalize_label(raw_label);
    if label.is_empty() {
        return None;
    }
    let def = LinkRefDef {
        url: unescape(raw_dest),
        title: title.map(unescape).unwrap_or_default(),
    };
    Some((label, def, c.offset()))
}

fn at_line_end(c: &Cursor<'_>) -> bool {
    c.is_eof() || c.at(b'\n')
}

/// Peel definitions off the front of a paragraph's raw text.
/// Returns how many bytes were consumed.
pub(crate) fn extract_definitions(content: &str, store: &mut LinkRefStore) -> usize {
    let bytes = content.as_bytes();
    let mut consumed = 0;
    while bytes.get(consumed) == Some(&b'[') {
        match parse_definition(&bytes[consumed..]) {
            Some((label, def, len)) => {
                tracing::trace!(label = %label, "link reference definition");
                store.insert(label, def);
                consumed += len;
            }
            None => break,
        }
    }
    consumed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label(b"  Foo   BAR\n baz "), "foo bar baz");
        assert_eq!(normalize_label("Straße".as_bytes()), normalize_label("STRASSE".as_bytes()));
        assert_eq!(normalize_label("ΑΓΩ".as_bytes()), "αγω");
    }

    #[test]
    fn test_first_definition_wins() {
        let mut store = LinkRefStore::new();
        let def = |u: &str| LinkRefDef { url: u.to_string(), title: String::new() };
        store.insert("foo".into(), def("/first"));
        store.insert("foo".into(), def("/second"));
        assert_eq!(store.lookup(b"FOO").map(|d| d.url.as_str()), Some("/first"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_parse_simple_definition() {
        let (label, def, len) = parse_definition(b"[foo]: /url \"title\"\nrest").unwrap();
        assert_eq!(label, "foo");
        assert_eq!(def.url, "/url");
        assert_eq!(def.title, "title");
        assert_eq!(len, 20);
    }

    #[test]
    fn test_parse_multiline_definition() {
        let (_, def, _) = parse_definition(b"[Foo bar]:\n<my url>\n'title'\n").unwrap();
        assert_eq!(def.url, "my url");
        assert_eq!(def.title, "title");
    }

    #[test]
    fn test_title_on_next_line_is_optional() {
        let text = b"[foo]: /url\n\"title\" ok\n";
        let (_, def, len) = parse_definition(text).unwrap();
        assert_eq!(def.title, "");
        assert_eq!(&text[len..], b"\"title\" ok\n");
    }

    #[test]
    fn test_rejects_non_definitions() {
        assert!(parse_definition(b"[foo]: /url \"title\" ok").is_none());
        assert!(parse_definition(b"[foo]:").is_none());
        assert!(parse_definition(b"[foo] /url").is_none());
        assert!(parse_definition(b"[]: /url").is_none());
    }

    #[test]
    fn test_extract_definitions_stops_at_text() {
        let mut store = LinkRefStore::new();
        let content = "[a]: /a\n[b]: /b\nhello\n";
        let used = extract_definitions(content, &mut store);
        assert_eq!(&content[used..], "hello\n");
        assert_eq!(store.len(), 2);
    }
}
