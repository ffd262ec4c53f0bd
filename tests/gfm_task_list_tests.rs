use gfmark::node::NodeValue;
use gfmark::{Options, ParserState, markdown_to_html, markdown_to_html_with_extensions};
use pretty_assertions::assert_eq;

fn to_html(input: &str) -> String {
    markdown_to_html_with_extensions(input, &Options::default(), &["tasklist"]).unwrap()
}

#[test]
fn basic_task_list() {
    let input = "- [ ] foo\n- [x] bar";
    let expected = "<ul>\n<li><input type=\"checkbox\" disabled=\"\" /> foo</li>\n<li><input type=\"checkbox\" checked=\"\" disabled=\"\" /> bar</li>\n</ul>\n";
    assert_eq!(to_html(input), expected);
}

#[test]
fn nested_task_list() {
    let input = "- [x] foo\n  - [ ] bar\n  - [x] baz\n- [ ] bim";
    let expected = "<ul>\n<li><input type=\"checkbox\" checked=\"\" disabled=\"\" /> foo\n<ul>\n<li><input type=\"checkbox\" disabled=\"\" /> bar</li>\n<li><input type=\"checkbox\" checked=\"\" disabled=\"\" /> baz</li>\n</ul>\n</li>\n<li><input type=\"checkbox\" disabled=\"\" /> bim</li>\n</ul>\n";
    assert_eq!(to_html(input), expected);
}

#[test]
fn task_list_uppercase_x() {
    let input = "- [X] done\n- [ ] todo";
    let expected = "<ul>\n<li><input type=\"checkbox\" checked=\"\" disabled=\"\" /> done</li>\n<li><input type=\"checkbox\" disabled=\"\" /> todo</li>\n</ul>\n";
    assert_eq!(to_html(input), expected);
}

#[test]
fn non_task_list_items() {
    let input = "- [a] not task\n- [ ]no space";
    let expected = "<ul>\n<li>[a] not task</li>\n<li>[ ]no space</li>\n</ul>\n";
    assert_eq!(to_html(input), expected);
}

#[test]
fn mixed_task_and_regular() {
    let input = "- [ ] task\n- regular";
    let expected = "<ul>\n<li><input type=\"checkbox\" disabled=\"\" /> task</li>\n<li>regular</li>\n</ul>\n";
    assert_eq!(to_html(input), expected);
}

#[test]
fn task_list_ordered() {
    let input = "1. [ ] first\n2. [x] second";
    let expected = "<ol>\n<li><input type=\"checkbox\" disabled=\"\" /> first</li>\n<li><input type=\"checkbox\" checked=\"\" disabled=\"\" /> second</li>\n</ol>\n";
    assert_eq!(to_html(input), expected);
}

#[test]
fn loose_task_list_keeps_paragraphs() {
    let input = "- [x] one\n\n- [ ] two\n";
    let expected = "<ul>\n<li><input type=\"checkbox\" checked=\"\" disabled=\"\" /> \n<p>one</p>\n</li>\n<li><input type=\"checkbox\" disabled=\"\" /> \n<p>two</p>\n</li>\n</ul>\n";
    assert_eq!(to_html(input), expected);
}

#[test]
fn marker_outside_list_is_text() {
    assert_eq!(to_html("[x] not in a list"), "<p>[x] not in a list</p>\n");
}

#[test]
fn task_list_requires_extension() {
    let result = markdown_to_html("- [ ] foo\n- [x] bar", &Options::default()).unwrap();
    assert_eq!(result, "<ul>\n<li>[ ] foo</li>\n<li>[x] bar</li>\n</ul>\n");
}

#[test]
fn task_items_in_tree() {
    let mut parser = ParserState::new(Options::default());
    parser.attach_extension("tasklist").unwrap();
    parser.feed("- [x] a\n- [ ] b\n- c\n").unwrap();
    let doc = parser.finish().unwrap();

    let list = doc.first_child(doc.root()).unwrap();
    let states: Vec<Option<bool>> = doc
        .children(list)
        .map(|item| match doc.value(item) {
            NodeValue::TaskItem { checked } => Some(*checked),
            _ => None,
        })
        .collect();
    assert_eq!(states, [Some(true), Some(false), None]);
}
