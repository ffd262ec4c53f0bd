//! Disallowed raw HTML (`tagfilter`).
//!
//! When raw HTML is written through, opening and closing tags of a fixed
//! set of elements get their `<` replaced by `&lt;` so the browser shows
//! them as text.

use std::borrow::Cow;

use super::SyntaxExtension;

const BLACKLIST: [&str; 9] = [
    "title",
    "textarea",
    "style",
    "xmp",
    "iframe",
    "noembed",
    "noframes",
    "script",
    "plaintext",
];

/// The `tagfilter` extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagFilter;

impl SyntaxExtension for TagFilter {
    fn name(&self) -> &'static str {
        "tagfilter"
    }

    fn filter_html<'h>(&self, html: &'h str) -> Cow<'h, str> {
        let bytes = html.as_bytes();
        let mut out: Option<String> = None;
        let mut copied = 0;
        for (i, _) in html.match_indices('<') {
            if is_filtered_tag(&bytes[i..]) {
                let buf = out.get_or_insert_with(|| String::with_capacity(html.len() + 8));
                buf.push_str(&html[copied..i]);
                buf.push_str("&lt;");
                copied = i + 1;
            }
        }
        match out {
            Some(mut buf) => {
                buf.push_str(&html[copied..]);
                Cow::Owned(buf)
            }
            None => Cow::Borrowed(html),
        }
    }
}

/// `tag` starts with `<` or `</`, a blacklisted name in any case, then
/// whitespace, `>` or `/>`.
fn is_filtered_tag(tag: &[u8]) -> bool {
    let mut pos = 1;
    if tag.get(pos) == Some(&b'/') {
        pos += 1;
    }
    BLACKLIST.iter().any(|name| {
        let end = pos + name.len();
        let Some(candidate) = tag.get(pos..end) else {
            return false;
        };
        if !candidate.eq_ignore_ascii_case(name.as_bytes()) {
            return false;
        }
        match tag.get(end) {
            None => false,
            Some(b) if b.is_ascii_whitespace() || *b == b'>' => true,
            Some(b'/') => tag.get(end + 1) == Some(&b'>'),
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_blacklisted_tags() {
        let filtered = TagFilter.filter_html("<strong> <title> <style> <em>");
        assert_eq!(filtered, "<strong> &lt;title> &lt;style> <em>");
    }

    #[test]
    fn filters_closing_tags_and_any_case() {
        assert_eq!(TagFilter.filter_html("</SCRIPT>"), "&lt;/SCRIPT>");
        assert_eq!(TagFilter.filter_html("<xmp/>"), "&lt;xmp/>");
        assert_eq!(TagFilter.filter_html("<iframe\nsrc=x>"), "&lt;iframe\nsrc=x>");
    }

    #[test]
    fn leaves_lookalikes_alone() {
        let html = "<titles> <scripted> <textareax>";
        assert!(matches!(TagFilter.filter_html(html), Cow::Borrowed(_)));
    }
}
