//! Strikethrough (`~text~`, `~~text~~`).
//!
//! Tilde runs of length 1 or 2 are delimiters with the same flanking rules
//! as `*`. An opener only pairs with a closer of equal length; longer runs
//! stay literal.

use super::{InlineMatch, SyntaxExtension};
use crate::inline::InlineContext;
use crate::node::NodeValue;
use crate::render::RenderContext;
use crate::tree::NodeId;

/// The `strikethrough` extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct Strikethrough;

impl SyntaxExtension for Strikethrough {
    fn name(&self) -> &'static str {
        "strikethrough"
    }

    fn node_kinds(&self) -> &'static [&'static str] {
        &["strikethrough"]
    }

    fn inline_triggers(&self) -> &'static [u8] {
        b"~"
    }

    fn match_inline(&self, ctx: &InlineContext<'_>, trigger: u8) -> Option<InlineMatch> {
        let (len, left_flanking, right_flanking) = ctx.delimiter_run(trigger);
        if len > 2 {
            return Some(InlineMatch::Delimiter { len, can_open: false, can_close: false });
        }
        Some(InlineMatch::Delimiter {
            len,
            can_open: left_flanking,
            can_close: right_flanking,
        })
    }

    fn is_emphasis_like(&self) -> bool {
        true
    }

    fn delimiter_node(&self, opener_len: usize, closer_len: usize) -> Option<(usize, NodeValue)> {
        (opener_len == closer_len).then_some((opener_len, NodeValue::Strikethrough))
    }

    fn render(&self, ctx: &mut RenderContext<'_>, _node: NodeId, entering: bool) {
        ctx.out().write_str(if entering { "<del>" } else { "</del>" });
    }
}

#[cfg(test)]
mod tests {
    use crate::{Options, markdown_to_html_with_extensions};

    fn render(input: &str) -> String {
        markdown_to_html_with_extensions(input, &Options::default(), &["strikethrough"]).unwrap()
    }

    #[test]
    fn single_and_double_tilde() {
        assert_eq!(render("~~Hi~~ Hello, ~there~ world!\n"), "<p><del>Hi</del> Hello, <del>there</del> world!</p>\n");
    }

    #[test]
    fn lengths_must_match() {
        assert_eq!(render("~~foo~ bar\n"), "<p>~~foo~ bar</p>\n");
    }

    #[test]
    fn long_runs_stay_literal() {
        assert_eq!(render("a ~~~foo~~~ b\n"), "<p>a ~~~foo~~~ b</p>\n");
    }

    #[test]
    fn does_not_span_paragraphs() {
        assert_eq!(
            render("This ~~has a\n\nnew paragraph~~.\n"),
            "<p>This ~~has a</p>\n<p>new paragraph~~.</p>\n"
        );
    }

    #[test]
    fn nests_with_emphasis() {
        assert_eq!(render("~~*a*~~\n"), "<p><del><em>a</em></del></p>\n");
    }
}
