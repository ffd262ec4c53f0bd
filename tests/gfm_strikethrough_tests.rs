//! GFM strikethrough extension tests.

use gfmark::{Options, markdown_to_html, markdown_to_html_with_extensions};
use pretty_assertions::assert_eq;

fn to_html(input: &str) -> String {
    markdown_to_html_with_extensions(input, &Options::default(), &["strikethrough"]).unwrap()
}

// cmark-gfm strikethrough cases

#[test]
fn single_tilde_strikethrough() {
    assert_eq!(to_html("A proper ~strikethrough~."), "<p>A proper <del>strikethrough</del>.</p>\n");
}

#[test]
fn unmatched_tildes_stay_literal() {
    assert_eq!(to_html("These are ~not strikethroughs."), "<p>These are ~not strikethroughs.</p>\n");
    assert_eq!(to_html("No, they are not~"), "<p>No, they are not~</p>\n");
}

#[test]
fn space_surrounded_tilde_is_not_a_delimiter() {
    assert_eq!(
        to_html("This ~is ~ legit~ isn't ~ legit."),
        "<p>This <del>is ~ legit</del> isn't ~ legit.</p>\n"
    );
}

#[test]
fn runs_longer_than_two_stay_literal() {
    assert_eq!(
        to_html("This is not ~~~~~one~~~~~ huge strikethrough."),
        "<p>This is not ~~~~~one~~~~~ huge strikethrough.</p>\n"
    );
    assert_eq!(to_html("~one~ ~~two~~ ~~~three~~~"), "<p><del>one</del> <del>two</del> ~~~three~~~</p>\n");
    assert!(to_html("a~~~~b").contains("a~~~~b"));
}

#[test]
fn mismatched_run_lengths() {
    assert_eq!(to_html("No ~mismatch~~"), "<p>No ~mismatch~~</p>\n");
    assert_eq!(to_html("~~foo~ bar"), "<p>~~foo~ bar</p>\n");
}

// Interaction with other inlines

#[test]
fn strikethrough_with_emphasis() {
    assert_eq!(to_html("~~**bold**~~"), "<p><del><strong>bold</strong></del></p>\n");
    assert_eq!(to_html("*~~a~~*"), "<p><em><del>a</del></em></p>\n");
}

#[test]
fn strikethrough_inside_link_text() {
    assert_eq!(to_html("[~~old~~](/x)"), "<p><a href=\"/x\"><del>old</del></a></p>\n");
}

#[test]
fn code_span_hides_tildes() {
    assert_eq!(to_html("`~~not~~`"), "<p><code>~~not~~</code></p>\n");
}

#[test]
fn escaped_tilde_shortens_the_run() {
    assert_eq!(to_html("\\~~a~~"), "<p>~~a~~</p>\n");
    assert_eq!(to_html("\\~~a~"), "<p>~<del>a</del></p>\n");
}

#[test]
fn strikethrough_across_words_and_lines() {
    assert_eq!(to_html("~~foo bar~~"), "<p><del>foo bar</del></p>\n");
    assert_eq!(to_html("~~foo\nbar~~"), "<p><del>foo\nbar</del></p>\n");
}

#[test]
fn does_not_span_blocks() {
    assert_eq!(
        to_html("This ~~has a\n\nnew paragraph~~."),
        "<p>This ~~has a</p>\n<p>new paragraph~~.</p>\n"
    );
}

#[test]
fn strikethrough_requires_extension() {
    assert_eq!(markdown_to_html("~~test~~", &Options::default()).unwrap(), "<p>~~test~~</p>\n");
}

#[test]
fn tilde_fence_is_still_a_code_block() {
    assert_eq!(to_html("~~~\n~~a~~\n~~~\n"), "<pre><code>~~a~~\n</code></pre>\n");
}

#[test]
fn tildes_are_skipped_when_checking_emphasis_flanking() {
    assert_eq!(to_html("**~\n' !**|"), "<p>**~\n' !**|</p>\n");
    assert_eq!(
        markdown_to_html("**~\n' !**|", &Options::default()).unwrap(),
        "<p><strong>~\n' !</strong>|</p>\n"
    );
    assert_eq!(to_html("a*~~b~~*c"), "<p>a<em><del>b</del></em>c</p>\n");
}
