//! gfmark: CommonMark and GitHub Flavored Markdown to HTML.
//!
//! Parsing builds a [`Document`] tree in two phases: a line-oriented block
//! parser opens and closes container and leaf blocks, then inline content of
//! every leaf is resolved once the block structure is final. The tree can be
//! inspected, rewritten and rendered to HTML.
//!
//! GFM features (tables, strikethrough, extended autolinks, the tag filter,
//! task lists and footnotes) are [syntax extensions](ext) attached to a
//! parse by name.
//!
//! # Design Principles
//! - No regex: pure byte-level scanning
//! - Bounded work on pathological input (see [`limits`])
//! - One arena per document, nodes addressed by [`NodeId`]
//!
//! # Example
//! ```
//! use gfmark::Options;
//!
//! let html = gfmark::markdown_to_html("# Hello\n\n*World*", &Options::default()).unwrap();
//! assert_eq!(html, "<h1>Hello</h1>\n<p><em>World</em></p>\n");
//!
//! let html = gfmark::markdown_to_html_with_extensions(
//!     "~~gone~~ www.example.com",
//!     &Options::default(),
//!     &["strikethrough", "autolink"],
//! )
//! .unwrap();
//! assert_eq!(
//!     html,
//!     "<p><del>gone</del> <a href=\"http://www.example.com\">www.example.com</a></p>\n"
//! );
//! ```

mod block;
mod cursor;
pub mod error;
pub mod escape;
pub mod ext;
mod inline;
pub mod limits;
pub mod link_ref;
pub mod node;
mod options;
pub mod render;
pub mod tree;

use std::path::Path;
use std::sync::Arc;

pub use block::{BlockContext, ParserState};
pub use error::{Error, RegistryError, ResourceLimitError, Result};
pub use ext::{ExtensionRegistry, SyntaxExtension, core_registry};
pub use inline::InlineContext;
pub use limits::ResourceLimits;
pub use node::{NodeValue, Sourcepos};
pub use options::Options;
pub use render::{HtmlWriter, RenderContext};
pub use tree::{Document, NodeId};

/// The crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The crate version, e.g. `"0.1.0"`.
pub fn version() -> &'static str {
    VERSION
}

/// Parse a whole document with the core registry. Only `footnotes` is
/// attached, and only when [`Options::footnotes`] is set.
pub fn parse_document(text: &str, options: &Options) -> Result<Document> {
    let mut parser = ParserState::new(*options);
    parser.feed(text)?;
    parser.finish()
}

/// Parse raw bytes. Invalid UTF-8 is an error unless
/// [`Options::validate_utf8`] is set, in which case it is replaced with
/// U+FFFD.
pub fn parse_bytes(bytes: &[u8], options: &Options) -> Result<Document> {
    let text = if options.validate_utf8 {
        String::from_utf8_lossy(bytes)
    } else {
        let text = std::str::from_utf8(bytes).map_err(|e| Error::InvalidUtf8 { offset: e.valid_up_to() })?;
        text.into()
    };
    parse_document(&text, options)
}

/// Read and parse a file.
pub fn parse_file(path: impl AsRef<Path>, options: &Options) -> Result<Document> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| Error::Input {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "read input file");
    parse_bytes(&bytes, options)
}

/// Render a parsed document. Pass the extensions the document was parsed
/// with so their node kinds render; see [`ParserState::extensions`].
pub fn render_html(doc: &Document, options: &Options, extensions: &[Arc<dyn SyntaxExtension>]) -> String {
    render::render_html(doc, options, extensions)
}

/// Convert Markdown to HTML.
///
/// This is the primary API for simple use cases.
///
/// # Example
/// ```
/// let html = gfmark::markdown_to_html("# Hello\n\nWorld", &gfmark::Options::default()).unwrap();
/// assert!(html.contains("<h1>Hello</h1>"));
/// assert!(html.contains("<p>World</p>"));
/// ```
pub fn markdown_to_html(text: &str, options: &Options) -> Result<String> {
    ParserState::new(*options).markdown_to_html(text)
}

/// Convert Markdown to HTML with the named core extensions attached for
/// both parsing and rendering.
pub fn markdown_to_html_with_extensions(text: &str, options: &Options, extensions: &[&str]) -> Result<String> {
    ParserState::with_extensions(*options, extensions)?.markdown_to_html(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(input: &str) -> String {
        markdown_to_html(input, &Options::default()).unwrap()
    }

    #[test]
    fn test_basic_paragraph() {
        assert_eq!(html("Hello, world!"), "<p>Hello, world!</p>\n");
    }

    #[test]
    fn test_paragraph_escaping() {
        assert_eq!(html("a < b & c > d"), "<p>a &lt; b &amp; c &gt; d</p>\n");
    }

    #[test]
    fn test_heading_all_levels() {
        for level in 1..=6 {
            let input = format!("{} Heading", "#".repeat(level));
            assert_eq!(html(&input), format!("<h{level}>Heading</h{level}>\n"));
        }
        assert_eq!(html("####### not"), "<p>####### not</p>\n");
    }

    #[test]
    fn test_heading_with_closing_hashes() {
        assert_eq!(html("## Title ##"), "<h2>Title</h2>\n");
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert_eq!(html(""), "");
        assert_eq!(html("   \n\n  "), "");
    }

    #[test]
    fn test_missing_trailing_newline_and_crlf() {
        assert_eq!(html("a\r\nb\rc"), "<p>a\nb\nc</p>\n");
    }

    #[test]
    fn test_complex_document() {
        let input = "# Title\n\nSome *emphasis* and `code`.\n\n1. one\n2. two\n\n> [link](/x)\n";
        assert_eq!(
            html(input),
            "<h1>Title</h1>\n<p>Some <em>emphasis</em> and <code>code</code>.</p>\n\
             <ol>\n<li>one</li>\n<li>two</li>\n</ol>\n<blockquote>\n<p><a href=\"/x\">link</a></p>\n</blockquote>\n"
        );
    }

    #[test]
    fn test_extensions_off_by_default() {
        assert_eq!(html("~~x~~ www.a.com"), "<p>~~x~~ www.a.com</p>\n");
        assert_eq!(html("| a |\n| - |\n"), "<p>| a |\n| - |</p>\n");
    }

    #[test]
    fn test_unknown_extension_name() {
        let err = markdown_to_html_with_extensions("x", &Options::default(), &["table", "nope"]).unwrap_err();
        assert!(matches!(err, Error::UnknownExtension(name) if name == "nope"));
    }

    #[test]
    fn test_parse_bytes_utf8_handling() {
        let bytes = b"caf\xe9\n";
        let err = parse_bytes(bytes, &Options::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidUtf8 { offset: 3 }));

        let options = Options { validate_utf8: true, ..Options::default() };
        let doc = parse_bytes(bytes, &options).unwrap();
        assert_eq!(render_html(&doc, &options, &[]), "<p>caf\u{FFFD}</p>\n");
    }

    #[test]
    fn test_parse_file_missing() {
        let err = parse_file("/definitely/not/here.md", &Options::default()).unwrap_err();
        assert!(err.to_string().starts_with("Unable to open file with name: /definitely/not/here.md"));
    }

    #[test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_parser_state_markdown_to_html() {
        let mut parser = ParserState::new(Options::default());
        parser.attach_extensions(&["strikethrough"]).unwrap();
        assert_eq!(parser.markdown_to_html("~a~").unwrap(), "<p><del>a</del></p>\n");
    }
}
