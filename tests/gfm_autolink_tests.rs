//! GFM extended autolink tests (`www.`, `http(s)://` and bare emails).

use gfmark::{Options, markdown_to_html, markdown_to_html_with_extensions};
use pretty_assertions::assert_eq;

fn autolink_html(input: &str) -> String {
    markdown_to_html_with_extensions(input, &Options::default(), &["autolink"]).unwrap()
}

#[test]
fn url_autolinks() {
    let input = ": http://google.com https://google.com";
    let expected = "<p>: <a href=\"http://google.com\">http://google.com</a> <a href=\"https://google.com\">https://google.com</a></p>\n";
    assert_eq!(autolink_html(input), expected);
}

#[test]
fn www_autolink_gets_http_scheme() {
    assert_eq!(
        autolink_html("www.github.com"),
        "<p><a href=\"http://www.github.com\">www.github.com</a></p>\n"
    );
}

#[test]
fn email_autolinks() {
    assert_eq!(
        autolink_html("scyther@pokemon.com"),
        "<p><a href=\"mailto:scyther@pokemon.com\">scyther@pokemon.com</a></p>\n"
    );
    assert_eq!(
        autolink_html("scy.the_rbe-edr+ill@pokemon.com"),
        "<p><a href=\"mailto:scy.the_rbe-edr+ill@pokemon.com\">scy.the_rbe-edr+ill@pokemon.com</a></p>\n"
    );
    assert_eq!(autolink_html("a.w@b.c"), "<p><a href=\"mailto:a.w@b.c\">a.w@b.c</a></p>\n");
}

#[test]
fn email_trailing_punctuation() {
    assert_eq!(
        autolink_html("scyther@pokemon.com."),
        "<p><a href=\"mailto:scyther@pokemon.com\">scyther@pokemon.com</a>.</p>\n"
    );
    assert_eq!(
        autolink_html("scyther@pokemon.com/"),
        "<p><a href=\"mailto:scyther@pokemon.com\">scyther@pokemon.com</a>/</p>\n"
    );
}

#[test]
fn email_after_slash_is_not_linked() {
    assert_eq!(
        autolink_html("scyther@pokemon.com/beedrill@pokemon.com"),
        "<p><a href=\"mailto:scyther@pokemon.com\">scyther@pokemon.com</a>/beedrill@pokemon.com</p>\n"
    );
}

#[test]
fn underscores_in_last_domain_labels() {
    assert_eq!(
        autolink_html("Underscores not allowed in host name www.xxx.yyy._zzz"),
        "<p>Underscores not allowed in host name www.xxx.yyy._zzz</p>\n"
    );
    assert_eq!(
        autolink_html("Underscores not allowed in host name www.xxx._yyy.zzz"),
        "<p>Underscores not allowed in host name www.xxx._yyy.zzz</p>\n"
    );
}

#[test]
fn autolink_inside_emphasis() {
    assert_eq!(
        autolink_html("**Autolink and http://inlines**"),
        "<p><strong>Autolink and <a href=\"http://inlines\">http://inlines</a></strong></p>\n"
    );
}

#[test]
fn trailing_punctuation_and_parentheses() {
    assert_eq!(
        autolink_html("Full stop outside parens shouldn't be included http://google.com/ok."),
        "<p>Full stop outside parens shouldn't be included <a href=\"http://google.com/ok\">http://google.com/ok</a>.</p>\n"
    );
    assert_eq!(
        autolink_html("(Visit https://encrypted.google.com/search?q=Markup+(business))"),
        "<p>(Visit <a href=\"https://encrypted.google.com/search?q=Markup+(business)\">https://encrypted.google.com/search?q=Markup+(business)</a>)</p>\n"
    );
}

#[test]
fn entity_like_suffix_is_excluded() {
    assert_eq!(
        autolink_html("www.google.com/search?q=commonmark&hl;"),
        "<p><a href=\"http://www.google.com/search?q=commonmark\">www.google.com/search?q=commonmark</a>&amp;hl;</p>\n"
    );
}

#[test]
fn less_than_ends_link() {
    assert_eq!(
        autolink_html("www.commonmark.org/he<lp"),
        "<p><a href=\"http://www.commonmark.org/he\">www.commonmark.org/he</a>&lt;lp</p>\n"
    );
}

#[test]
fn at_signs_without_address_do_not_link() {
    let result = autolink_html("These should not link:\n\n* @a.b.c@. x\n* n@.  b");
    assert!(!result.contains("<a"), "Expected no autolinks in output, got: {result}");
}

#[test]
fn existing_links_and_code_untouched() {
    assert_eq!(
        autolink_html("[www.example.com](/x) `www.example.com` <http://a.b>"),
        "<p><a href=\"/x\">www.example.com</a> <code>www.example.com</code> <a href=\"http://a.b\">http://a.b</a></p>\n"
    );
}

#[test]
fn autolink_requires_extension() {
    let result = markdown_to_html("http://google.com www.google.com", &Options::default()).unwrap();
    assert!(!result.contains("<a"), "Expected no autolink without the extension, got: {result}");
}

#[test]
fn entity_after_link_is_decoded_outside_it() {
    assert_eq!(
        autolink_html("http://x.com&amp;"),
        "<p><a href=\"http://x.com\">http://x.com</a>&amp;</p>\n"
    );
    assert_eq!(autolink_html("www.a.com&copy;"), "<p><a href=\"http://www.a.com\">www.a.com</a>©</p>\n");
}

#[test]
fn link_must_follow_whitespace_or_delimiter_in_source() {
    let options = Options { unsafe_: true, ..Options::default() };
    assert_eq!(
        markdown_to_html_with_extensions("<b>www.a.com</b>", &options, &["autolink"]).unwrap(),
        "<p><b>www.a.com</b></p>\n"
    );
    assert_eq!(autolink_html("`x`www.a.com"), "<p><code>x</code>www.a.com</p>\n");
    assert_eq!(
        autolink_html("*www.a.com*"),
        "<p><em><a href=\"http://www.a.com\">www.a.com</a></em></p>\n"
    );
}

#[test]
fn unclosed_bracket_suppresses_links() {
    assert_eq!(autolink_html("[see www.a.com"), "<p>[see www.a.com</p>\n");
}
