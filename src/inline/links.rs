//! Link syntax scanners: labels, destinations, titles and `<...>` autolinks.
//!
//! Shared by the inline resolver and link reference definition parsing.

use crate::limits::{MAX_LINK_LABEL_LEN, MAX_LINK_PAREN_DEPTH};

/// Scan a link label starting at `[`. Returns the offset after `]` and the
/// raw label text between the brackets.
pub(crate) fn scan_link_label(text: &[u8], start: usize) -> Option<(usize, &[u8])> {
    if text.get(start) != Some(&b'[') {
        return None;
    }
    let mut pos = start + 1;
    let mut has_content = false;
    while pos < text.len() {
        match text[pos] {
            b'[' => return None,
            b']' => {
                let label = &text[start + 1..pos];
                if !has_content || label.len() > MAX_LINK_LABEL_LEN {
                    return None;
                }
                return Some((pos + 1, label));
            }
            b'\\' if text.get(pos + 1).is_some_and(|b| b.is_ascii_punctuation()) => {
                has_content = true;
                pos += 2;
            }
            b => {
                if !b.is_ascii_whitespace() {
                    has_content = true;
                }
                pos += 1;
            }
        }
    }
    None
}

/// Scan a link destination. Returns the offset after it and the raw
/// destination (angle brackets removed, escapes still in place).
pub(crate) fn scan_link_destination(text: &[u8], start: usize) -> Option<(usize, &[u8])> {
    if text.get(start) == Some(&b'<') {
        let mut pos = start + 1;
        while pos < text.len() {
            match text[pos] {
                b'>' => return Some((pos + 1, &text[start + 1..pos])),
                b'<' | b'\n' | b'\r' => return None,
                b'\\' if pos + 1 < text.len() => pos += 2,
                _ => pos += 1,
            }
        }
        return None;
    }

    let mut pos = start;
    let mut depth = 0usize;
    while pos < text.len() {
        match text[pos] {
            b'\\' if text.get(pos + 1).is_some_and(|b| b.is_ascii_punctuation()) => pos += 2,
            b'(' => {
                depth += 1;
                if depth > MAX_LINK_PAREN_DEPTH {
                    return None;
                }
                pos += 1;
            }
            b')' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                pos += 1;
            }
            b if b <= b' ' || b == 0x7f => break,
            _ => pos += 1,
        }
    }
    if pos == start || depth != 0 {
        return None;
    }
    Some((pos, &text[start..pos]))
}

/// Scan a link title in `"..."`, `'...'` or `(...)`. Returns the offset
/// after the closing delimiter and the raw title text.
pub(crate) fn scan_link_title(text: &[u8], start: usize) -> Option<(usize, &[u8])> {
    let close = match *text.get(start)? {
        b'"' => b'"',
        b'\'' => b'\'',
        b'(' => b')',
        _ => return None,
    };
    let mut pos = start + 1;
    while pos < text.len() {
        let b = text[pos];
        if b == b'\\' && pos + 1 < text.len() {
            pos += 2;
        } else if b == close {
            return Some((pos + 1, &text[start + 1..pos]));
        } else if close == b')' && b == b'(' {
            return None;
        } else {
            pos += 1;
        }
    }
    None
}

/// `<scheme:...>` or `<email>` autolink starting at `<`. Returns the offset
/// after `>`, the link content and whether it is an email address.
pub(crate) fn scan_autolink(text: &[u8], start: usize) -> Option<(usize, &[u8], bool)> {
    if text.get(start) != Some(&b'<') {
        return None;
    }
    let content_start = start + 1;
    let mut pos = content_start;
    while pos < text.len() && text[pos] != b'>' {
        let b = text[pos];
        if b <= b' ' || b == b'<' || b == 0x7f {
            return None;
        }
        pos += 1;
    }
    if pos >= text.len() {
        return None;
    }
    let content = &text[content_start..pos];
    if is_uri_autolink(content) {
        Some((pos + 1, content, false))
    } else if is_email_autolink(content) {
        Some((pos + 1, content, true))
    } else {
        None
    }
}

/// Scheme of 2 to 32 characters, then `:`.
fn is_uri_autolink(content: &[u8]) -> bool {
    let Some(colon) = content.iter().position(|&b| b == b':') else {
        return false;
    };
    let scheme = &content[..colon];
    (2..=32).contains(&scheme.len())
        && scheme[0].is_ascii_alphabetic()
        && scheme
            .iter()
            .all(|&b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'.' | b'-'))
}

pub(crate) fn is_email_autolink(content: &[u8]) -> bool {
    let Some(at) = content.iter().position(|&b| b == b'@') else {
        return false;
    };
    let (local, domain) = (&content[..at], &content[at + 1..]);
    if local.is_empty() || !local.iter().all(|&b| is_email_local_char(b)) {
        return false;
    }
    !domain.is_empty()
        && domain.split(|&b| b == b'.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && label[0].is_ascii_alphanumeric()
                && label[label.len() - 1].is_ascii_alphanumeric()
                && label.iter().all(|&b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

#[inline]
pub(crate) fn is_email_local_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+/=?^_`{|}~.-".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_labels() {
        assert_eq!(scan_link_label(b"[foo] x", 0), Some((5, &b"foo"[..])));
        assert_eq!(scan_link_label(b"[a\\]b]", 0), Some((6, &b"a\\]b"[..])));
        assert_eq!(scan_link_label(b"[ ]", 0), None);
        assert_eq!(scan_link_label(b"[a[b]", 0), None);
        assert_eq!(scan_link_label(b"[open", 0), None);
    }

    #[test]
    fn test_destinations() {
        assert_eq!(scan_link_destination(b"/url)", 0), Some((4, &b"/url"[..])));
        assert_eq!(scan_link_destination(b"<my url>", 0), Some((8, &b"my url"[..])));
        assert_eq!(scan_link_destination(b"a(b(c))d ", 0), Some((8, &b"a(b(c))d"[..])));
        assert_eq!(scan_link_destination(b"a(b ", 0), None);
        assert_eq!(scan_link_destination(b"<a\nb>", 0), None);
        assert_eq!(scan_link_destination(b"\\(x", 0), Some((3, &b"\\(x"[..])));
        assert_eq!(scan_link_destination(b" x", 0), None);
    }

    #[test]
    fn test_titles() {
        assert_eq!(scan_link_title(b"\"t\" ", 0), Some((3, &b"t"[..])));
        assert_eq!(scan_link_title(b"'a\\'b'", 0), Some((6, &b"a\\'b"[..])));
        assert_eq!(scan_link_title(b"(x)", 0), Some((3, &b"x"[..])));
        assert_eq!(scan_link_title(b"(x(y)", 0), None);
        assert_eq!(scan_link_title(b"\"open", 0), None);
    }

    #[test]
    fn test_uri_autolinks() {
        assert_eq!(
            scan_autolink(b"<http://foo.bar.baz>", 0),
            Some((20, &b"http://foo.bar.baz"[..], false))
        );
        assert!(scan_autolink(b"<a+b+c:d>", 0).is_some());
        assert!(scan_autolink(b"<localhost:5001/foo>", 0).is_some());
        assert!(scan_autolink(b"<m:abc>", 0).is_none());
        assert!(scan_autolink(b"<http://foo.bar/baz bim>", 0).is_none());
    }

    #[test]
    fn test_email_autolinks() {
        assert_eq!(
            scan_autolink(b"<foo@bar.example.com>", 0),
            Some((21, &b"foo@bar.example.com"[..], true))
        );
        assert!(scan_autolink(b"<foo+special@Bar.baz-bar0.com>", 0).is_some());
        assert!(scan_autolink(b"<foo\\+@bar.example.com>", 0).is_none());
        assert!(scan_autolink(b"<foo@-bar.com>", 0).is_none());
    }
}
