//! HTML rendering.
//!
//! [`HtmlWriter`] is an append-only UTF-8 buffer with escaping helpers.
//! [`render_html`] walks the tree with enter/exit events and writes
//! CommonMark-compatible HTML. Extension node kinds are handed to the
//! attached extension that owns them through a [`RenderContext`].

use std::borrow::Cow;
use std::sync::Arc;

use crate::escape;
use crate::ext::{self, SyntaxExtension};
use crate::node::{ListKind, NodeValue};
use crate::options::Options;
use crate::tree::{Document, Event, NodeId};

/// HTML output buffer.
///
/// # Example
/// ```
/// use gfmark::render::HtmlWriter;
///
/// let mut writer = HtmlWriter::with_capacity_for(1000);
/// writer.write_str("<p>");
/// writer.write_escaped_text(b"Hello <World>");
/// writer.write_str("</p>");
///
/// let html = writer.into_string();
/// assert_eq!(html, "<p>Hello &lt;World&gt;</p>");
/// ```
#[derive(Debug, Clone)]
pub struct HtmlWriter {
    out: Vec<u8>,
}

impl HtmlWriter {
    #[inline]
    pub fn new() -> Self {
        Self {
            out: Vec::with_capacity(1024),
        }
    }

    /// Create with pre-allocated capacity based on expected input size.
    ///
    /// Typical HTML is ~1.25x input size.
    #[inline]
    pub fn with_capacity_for(input_len: usize) -> Self {
        let capacity = input_len + input_len / 4;
        Self {
            out: Vec::with_capacity(capacity),
        }
    }

    /// Write a static string (compile-time known).
    #[inline]
    pub fn write_str(&mut self, s: &'static str) {
        self.out.extend_from_slice(s.as_bytes());
    }

    /// Write a dynamic string without escaping.
    #[inline]
    pub fn write_string(&mut self, s: &str) {
        self.out.extend_from_slice(s.as_bytes());
    }

    /// Write a single ASCII byte.
    #[inline]
    pub fn write_byte(&mut self, b: u8) {
        debug_assert!(b.is_ascii());
        self.out.push(b);
    }

    /// Write text with HTML escaping (for text content and attributes).
    #[inline]
    pub fn write_escaped_text(&mut self, text: &[u8]) {
        escape::escape_html_into(&mut self.out, text);
    }

    /// Write a URL for an `href`/`src` attribute.
    #[inline]
    pub fn write_escaped_href(&mut self, url: &[u8]) {
        escape::escape_href_into(&mut self.out, url);
    }

    /// Write a u32 as decimal.
    pub fn write_u32(&mut self, mut n: u32) {
        if n == 0 {
            self.out.push(b'0');
            return;
        }

        let mut buf = [0u8; 10];
        let mut i = buf.len();

        while n > 0 {
            i -= 1;
            buf[i] = b'0' + (n % 10) as u8;
            n /= 10;
        }

        self.out.extend_from_slice(&buf[i..]);
    }

    #[inline]
    pub fn newline(&mut self) {
        self.out.push(b'\n');
    }

    /// Start a new line unless the output is empty or already at one.
    #[inline]
    pub fn cr(&mut self) {
        if self.out.last().is_some_and(|&b| b != b'\n') {
            self.out.push(b'\n');
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.out.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Clear output for reuse (keeps capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.out.clear();
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        // SAFETY: only `str` data and ASCII escapes are ever written
        unsafe { std::str::from_utf8_unchecked(&self.out) }
    }

    #[inline]
    pub fn into_string(self) -> String {
        // SAFETY: only `str` data and ASCII escapes are ever written
        unsafe { String::from_utf8_unchecked(self.out) }
    }
}

impl Default for HtmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Write for HtmlWriter {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.out.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

/// What an extension renderer gets to work with.
pub struct RenderContext<'r> {
    doc: &'r Document,
    out: &'r mut HtmlWriter,
    options: &'r Options,
}

impl<'r> RenderContext<'r> {
    pub fn document(&self) -> &'r Document {
        self.doc
    }

    pub fn options(&self) -> &'r Options {
        self.options
    }

    pub fn out(&mut self) -> &mut HtmlWriter {
        self.out
    }

    /// Start a new line unless already at one.
    pub fn cr(&mut self) {
        self.out.cr();
    }

    /// Write ` data-sourcepos="..."` for `node` when enabled.
    pub fn sourcepos(&mut self, node: NodeId) {
        if self.options.sourcepos {
            use std::fmt::Write;
            let pos = self.doc.node(node).sourcepos;
            let _ = write!(self.out, " data-sourcepos=\"{pos}\"");
        }
    }
}

/// Render `doc` to HTML. `extensions` render the node kinds they own and
/// filter raw HTML; pass the set the document was parsed with.
pub fn render_html(doc: &Document, options: &Options, extensions: &[Arc<dyn SyntaxExtension>]) -> String {
    let mut out = HtmlWriter::with_capacity_for(doc.len() * 16);
    let mut renderer = HtmlRenderer {
        ctx: RenderContext { doc, out: &mut out, options },
        extensions,
    };

    // Set while inside an image, whose children only feed the alt text.
    let mut skip: Option<NodeId> = None;
    for event in doc.traverse() {
        match event {
            Event::Enter(id) => {
                if skip.is_none() && !renderer.enter(id) {
                    skip = Some(id);
                }
            }
            Event::Exit(id) => match skip {
                Some(s) if s != id => {}
                _ => {
                    skip = None;
                    renderer.exit(id);
                }
            },
        }
    }

    tracing::trace!(bytes = out.len(), "rendered html");
    out.into_string()
}

struct HtmlRenderer<'r> {
    ctx: RenderContext<'r>,
    extensions: &'r [Arc<dyn SyntaxExtension>],
}

impl HtmlRenderer<'_> {
    /// Returns `false` when the children must not be rendered.
    fn enter(&mut self, id: NodeId) -> bool {
        let doc = self.ctx.doc;
        let value = doc.value(id);
        if value.is_extension_kind() {
            match ext::owner(self.extensions, value) {
                Some(owner) => owner.render(&mut self.ctx, id, true),
                None => {
                    if let NodeValue::Custom { literal, .. } = value {
                        self.ctx.out.write_escaped_text(literal.as_bytes());
                    }
                }
            }
            return true;
        }

        let out = &mut *self.ctx.out;
        match value {
            NodeValue::Document => {}
            NodeValue::BlockQuote => {
                out.cr();
                out.write_str("<blockquote");
                self.ctx.sourcepos(id);
                self.ctx.out.write_str(">\n");
            }
            NodeValue::List(data) => {
                out.cr();
                match data.kind {
                    ListKind::Unordered { .. } => {
                        out.write_str("<ul");
                    }
                    ListKind::Ordered { start: 1, .. } => {
                        out.write_str("<ol");
                    }
                    ListKind::Ordered { start, .. } => {
                        out.write_str("<ol start=\"");
                        out.write_u32(start);
                        out.write_str("\"");
                    }
                }
                self.ctx.sourcepos(id);
                self.ctx.out.write_str(">\n");
            }
            NodeValue::Item(_) => {
                out.cr();
                out.write_str("<li");
                self.ctx.sourcepos(id);
                self.ctx.out.write_str(">");
            }
            NodeValue::Heading { level, .. } => {
                out.cr();
                out.write_str(heading_open(*level));
                self.ctx.sourcepos(id);
                self.ctx.out.write_str(">");
            }
            NodeValue::CodeBlock(cb) => {
                out.cr();
                out.write_str("<pre");
                self.ctx.sourcepos(id);
                let out = &mut *self.ctx.out;
                let lang = cb.info.split([' ', '\t', '\n']).next().unwrap_or("");
                if lang.is_empty() {
                    out.write_str("><code>");
                } else {
                    out.write_str("><code class=\"language-");
                    out.write_escaped_text(lang.as_bytes());
                    out.write_str("\">");
                }
                out.write_escaped_text(cb.literal.as_bytes());
                out.write_str("</code></pre>\n");
            }
            NodeValue::HtmlBlock { literal, .. } => {
                out.cr();
                self.raw_html(literal);
                self.ctx.out.cr();
            }
            NodeValue::ThematicBreak => {
                out.cr();
                out.write_str("<hr");
                self.ctx.sourcepos(id);
                self.ctx.out.write_str(" />\n");
            }
            NodeValue::Paragraph => {
                if !in_tight_list(doc, id) {
                    out.cr();
                    out.write_str("<p");
                    self.ctx.sourcepos(id);
                    self.ctx.out.write_str(">");
                }
            }
            NodeValue::Text(text) => out.write_escaped_text(text.as_bytes()),
            NodeValue::LineBreak => out.write_str("<br />\n"),
            NodeValue::SoftBreak => {
                if self.ctx.options.hardbreaks {
                    out.write_str("<br />\n");
                } else if self.ctx.options.nobreaks {
                    out.write_byte(b' ');
                } else {
                    out.newline();
                }
            }
            NodeValue::Code(code) => {
                out.write_str("<code>");
                out.write_escaped_text(code.as_bytes());
                out.write_str("</code>");
            }
            NodeValue::RawHtml(html) => self.raw_html(html),
            NodeValue::Emphasis => out.write_str("<em>"),
            NodeValue::Strong => out.write_str("<strong>"),
            NodeValue::Link(link) => {
                out.write_str("<a href=\"");
                if self.ctx.options.unsafe_ || !is_dangerous_url(&link.url) {
                    out.write_escaped_href(link.url.as_bytes());
                }
                if !link.title.is_empty() {
                    out.write_str("\" title=\"");
                    out.write_escaped_text(link.title.as_bytes());
                }
                out.write_str("\">");
            }
            NodeValue::Image(link) => {
                out.write_str("<img src=\"");
                if self.ctx.options.unsafe_ || !is_dangerous_url(&link.url) {
                    out.write_escaped_href(link.url.as_bytes());
                }
                out.write_str("\" alt=\"");
                out.write_escaped_text(doc.text_content(id).as_bytes());
                return false;
            }
            _ => {}
        }
        true
    }

    fn exit(&mut self, id: NodeId) {
        let doc = self.ctx.doc;
        let value = doc.value(id);
        if value.is_extension_kind() {
            if let Some(owner) = ext::owner(self.extensions, value) {
                owner.render(&mut self.ctx, id, false);
            }
            return;
        }

        let out = &mut *self.ctx.out;
        match value {
            NodeValue::BlockQuote => {
                out.cr();
                out.write_str("</blockquote>\n");
            }
            NodeValue::List(data) => {
                out.cr();
                out.write_str(match data.kind {
                    ListKind::Unordered { .. } => "</ul>\n",
                    ListKind::Ordered { .. } => "</ol>\n",
                });
            }
            NodeValue::Item(_) => out.write_str("</li>\n"),
            NodeValue::Heading { level, .. } => {
                out.write_str(heading_close(*level));
                out.newline();
            }
            NodeValue::Paragraph => {
                if in_tight_list(doc, id) {
                    return;
                }
                if doc.next_sibling(id).is_none() {
                    let owner = doc
                        .parent(id)
                        .and_then(|parent| ext::owner(self.extensions, doc.value(parent)).map(|o| (parent, o)));
                    if let Some((parent, owner)) = owner {
                        owner.render_paragraph_tail(&mut self.ctx, parent);
                    }
                }
                self.ctx.out.write_str("</p>\n");
            }
            NodeValue::Emphasis => out.write_str("</em>"),
            NodeValue::Strong => out.write_str("</strong>"),
            NodeValue::Link(_) => out.write_str("</a>"),
            NodeValue::Image(link) => {
                if !link.title.is_empty() {
                    out.write_str("\" title=\"");
                    out.write_escaped_text(link.title.as_bytes());
                }
                out.write_str("\" />");
            }
            _ => {}
        }
    }

    /// Raw HTML passes through the attached filters when unsafe output is
    /// allowed and is replaced by a placeholder otherwise.
    fn raw_html(&mut self, html: &str) {
        if !self.ctx.options.unsafe_ {
            self.ctx.out.write_str("<!-- raw HTML omitted -->");
            return;
        }
        let mut filtered: Option<String> = None;
        for ext in self.extensions {
            let current = filtered.as_deref().unwrap_or(html);
            let changed = match ext.filter_html(current) {
                Cow::Borrowed(_) => None,
                Cow::Owned(changed) => Some(changed),
            };
            if changed.is_some() {
                filtered = changed;
            }
        }
        self.ctx.out.write_string(filtered.as_deref().unwrap_or(html));
    }
}

fn in_tight_list(doc: &Document, paragraph: NodeId) -> bool {
    doc.parent(paragraph)
        .and_then(|item| doc.parent(item))
        .is_some_and(|list| matches!(doc.value(list), NodeValue::List(data) if data.tight))
}

fn heading_open(level: u8) -> &'static str {
    match level {
        1 => "<h1",
        2 => "<h2",
        3 => "<h3",
        4 => "<h4",
        5 => "<h5",
        _ => "<h6",
    }
}

fn heading_close(level: u8) -> &'static str {
    match level {
        1 => "</h1>",
        2 => "</h2>",
        3 => "</h3>",
        4 => "</h4>",
        5 => "</h5>",
        _ => "</h6>",
    }
}

/// `javascript:`, `vbscript:`, `file:` and `data:` URLs other than a few
/// image types.
pub fn is_dangerous_url(url: &str) -> bool {
    const SAFE_DATA: [&str; 4] = ["image/png", "image/gif", "image/jpeg", "image/webp"];
    let bytes = url.as_bytes();
    let has_scheme = |scheme: &str| bytes.len() >= scheme.len() && bytes[..scheme.len()].eq_ignore_ascii_case(scheme.as_bytes());

    if has_scheme("javascript:") || has_scheme("vbscript:") || has_scheme("file:") {
        return true;
    }
    if has_scheme("data:") {
        let rest = &bytes[5..];
        return !SAFE_DATA
            .iter()
            .any(|t| rest.len() >= t.len() && rest[..t.len()].eq_ignore_ascii_case(t.as_bytes()));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_document;

    fn html(input: &str) -> String {
        let options = Options::default();
        let doc = parse_document(input, &options).unwrap();
        render_html(&doc, &options, &[])
    }

    #[test]
    fn test_writer_cr() {
        let mut writer = HtmlWriter::new();
        writer.cr();
        assert!(writer.is_empty());
        writer.write_str("<p>");
        writer.cr();
        writer.cr();
        assert_eq!(writer.as_str(), "<p>\n");
    }

    #[test]
    fn test_writer_u32() {
        let mut writer = HtmlWriter::default();
        writer.write_u32(0);
        writer.write_byte(b' ');
        writer.write_u32(4_294_967_295);
        assert_eq!(writer.into_string(), "0 4294967295");
    }

    #[test]
    fn test_blocks() {
        assert_eq!(
            html("# Title\n\n> quote\n\n---\n\n```rust\nfn main() {}\n```\n"),
            "<h1>Title</h1>\n<blockquote>\n<p>quote</p>\n</blockquote>\n<hr />\n\
             <pre><code class=\"language-rust\">fn main() {}\n</code></pre>\n"
        );
    }

    #[test]
    fn test_tight_and_loose_lists() {
        assert_eq!(html("- a\n- b\n"), "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n");
        assert_eq!(html("3. a\n\n4. b\n"), "<ol start=\"3\">\n<li>\n<p>a</p>\n</li>\n<li>\n<p>b</p>\n</li>\n</ol>\n");
    }

    #[test]
    fn test_raw_html_omitted_by_default() {
        assert_eq!(html("<div>\nhi\n</div>\n"), "<!-- raw HTML omitted -->\n");
        assert_eq!(html("a <b>c</b>\n"), "<p>a <!-- raw HTML omitted -->c<!-- raw HTML omitted --></p>\n");

        let options = Options { unsafe_: true, ..Options::default() };
        let doc = parse_document("<div>\nhi\n</div>\n", &options).unwrap();
        assert_eq!(render_html(&doc, &options, &[]), "<div>\nhi\n</div>\n");
    }

    #[test]
    fn test_dangerous_urls() {
        assert!(is_dangerous_url("javascript:alert(1)"));
        assert!(is_dangerous_url("JAVASCRIPT:alert(1)"));
        assert!(is_dangerous_url("data:text/html,x"));
        assert!(!is_dangerous_url("data:image/png;base64,AAA"));
        assert!(!is_dangerous_url("https://example.com"));
        assert_eq!(html("[x](javascript:alert(1))\n"), "<p><a href=\"\">x</a></p>\n");
    }

    #[test]
    fn test_image_alt_is_plain_text() {
        assert_eq!(
            html("![foo *bar*](/url \"title\")\n"),
            "<p><img src=\"/url\" alt=\"foo bar\" title=\"title\" /></p>\n"
        );
    }

    #[test]
    fn test_breaks_options() {
        let doc = parse_document("a\nb\n", &Options::default()).unwrap();
        let hard = Options { hardbreaks: true, ..Options::default() };
        let none = Options { nobreaks: true, ..Options::default() };
        assert_eq!(render_html(&doc, &hard, &[]), "<p>a<br />\nb</p>\n");
        assert_eq!(render_html(&doc, &none, &[]), "<p>a b</p>\n");
    }

    #[test]
    fn test_sourcepos() {
        let options = Options { sourcepos: true, ..Options::default() };
        let doc = parse_document("# Hi\n\npara\n", &options).unwrap();
        assert_eq!(
            render_html(&doc, &options, &[]),
            "<h1 data-sourcepos=\"1:1-1:4\">Hi</h1>\n<p data-sourcepos=\"3:1-3:4\">para</p>\n"
        );
    }

    #[test]
    fn test_link_title_and_href_escaping() {
        assert_eq!(
            html("[a](/f\u{e4}\u{f6} \"t&\\\"\")\n"),
            "<p><a href=\"/f%C3%A4%C3%B6\" title=\"t&amp;&quot;\">a</a></p>\n"
        );
    }
}
