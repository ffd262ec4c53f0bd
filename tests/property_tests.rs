//! Property tests over arbitrary input.

use gfmark::{Options, ParserState, markdown_to_html, markdown_to_html_with_extensions, render_html};
use proptest::prelude::*;

const ALL_EXTENSIONS: &[&str] = &["table", "strikethrough", "autolink", "tagfilter", "tasklist"];

/// Markdown-heavy text: mostly punctuation that opens or closes syntax.
fn markdownish() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[-*_~`#>|:\\[\\]()!<>&\\\\ \t\na-z0-9.@/^=+\"']{0,200}").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn any_input_renders(input in any::<String>()) {
        let options = Options { footnotes: true, smart: true, ..Options::default() };
        prop_assert!(markdown_to_html_with_extensions(&input, &options, ALL_EXTENSIONS).is_ok());
    }

    #[test]
    fn markdownish_input_renders(input in markdownish()) {
        let options = Options { footnotes: true, ..Options::default() };
        prop_assert!(markdown_to_html_with_extensions(&input, &options, ALL_EXTENSIONS).is_ok());
    }

    #[test]
    fn rendering_is_deterministic(input in markdownish()) {
        let first = markdown_to_html_with_extensions(&input, &Options::default(), ALL_EXTENSIONS).unwrap();
        let second = markdown_to_html_with_extensions(&input, &Options::default(), ALL_EXTENSIONS).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn chunked_feed_matches_whole(input in markdownish(), split in 1usize..40) {
        let options = Options::default();
        let whole = markdown_to_html(&input, &options).unwrap();

        let mut parser = ParserState::new(options);
        for piece in input.as_bytes().chunks(split) {
            // the strategy only produces ASCII
            parser.feed(std::str::from_utf8(piece).unwrap()).unwrap();
        }
        let doc = parser.finish().unwrap();
        prop_assert_eq!(render_html(&doc, &options, &[]), whole);
    }

    #[test]
    fn plain_words_become_one_paragraph(words in proptest::collection::vec("[a-z]{1,8}", 1..20)) {
        let input = words.join(" ");
        let html = markdown_to_html(&input, &Options::default()).unwrap();
        prop_assert_eq!(html, format!("<p>{input}</p>\n"));
    }

    #[test]
    fn safe_output_has_no_script_tags(input in markdownish(), tag in "<(script|SCRIPT|iframe)>") {
        let text = format!("{input}{tag}{input}");
        let html = markdown_to_html_with_extensions(&text, &Options::default(), ALL_EXTENSIONS).unwrap();
        let lower = html.to_ascii_lowercase();
        prop_assert!(!lower.contains("<script"), "{}", html);
        prop_assert!(!lower.contains("<iframe"), "{}", html);
    }
}
