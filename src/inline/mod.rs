//! Inline resolution.
//!
//! Runs once per leaf block with inline content (paragraphs, headings,
//! table cells) after the block structure is final. The scanner walks the
//! raw text left to right, appending nodes to the leaf; brackets and
//! delimiter runs are tracked on the side and restructure the already
//! appended siblings when a link or an emphasis pair is recognised.

mod delimiter;
pub(crate) mod html;
pub(crate) mod links;

use std::sync::Arc;

use rustc_hash::FxHashSet;

use self::delimiter::{Delimiter, DelimiterStack, process_emphasis};
use self::html::scan_inline_html;
use self::links::{scan_autolink, scan_link_destination, scan_link_title};
use crate::escape::{decode_entities, decode_entity, unescape};
use crate::ext::{InlineMatch, SyntaxExtension};
use crate::limits::{MAX_BRACKET_DEPTH, MAX_CODE_SPAN_BACKTICKS, MAX_LINK_LABEL_LEN};
use crate::link_ref::{LinkRefDef, LinkRefStore, normalize_label};
use crate::node::{Link, NodeValue, Sourcepos};
use crate::options::Options;
use crate::tree::{Document, NodeId};

/// Read-only view handed to extension inline matchers.
pub struct InlineContext<'a> {
    text: &'a [u8],
    pos: usize,
    refs: &'a LinkRefStore,
    footnotes: &'a FxHashSet<String>,
    options: &'a Options,
    transparent: &'a [bool; 256],
    in_brackets: bool,
}

impl<'a> InlineContext<'a> {
    /// The whole raw text of the leaf being resolved.
    pub fn text(&self) -> &'a [u8] {
        self.text
    }

    /// Offset of the trigger character (or just past `]` for brackets).
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn rest(&self) -> &'a [u8] {
        &self.text[self.pos..]
    }

    /// The character before the current position; `None` at the start.
    pub fn char_before(&self) -> Option<char> {
        char_before(self.text, self.pos)
    }

    pub fn options(&self) -> &Options {
        self.options
    }

    /// Look up a link reference definition by raw label.
    pub fn link_ref(&self, label: &[u8]) -> Option<&'a LinkRefDef> {
        self.refs.lookup(label)
    }

    /// Length and left/right flanking of the run of `ch` at the current
    /// position.
    pub fn delimiter_run(&self, ch: u8) -> (usize, bool, bool) {
        let len = run_length(self.text, self.pos, ch);
        let (before, after) = neighbours(self.text, self.pos, len, self.transparent);
        let (left, right) = flanking(before, after);
        (len, left, right)
    }

    /// Whether an unclosed `[` or `![` precedes the current position.
    pub fn in_brackets(&self) -> bool {
        self.in_brackets
    }

    /// Whether a footnote definition exists for this raw label.
    pub fn has_footnote(&self, label: &[u8]) -> bool {
        self.footnotes.contains(&normalize_label(label))
    }
}

/// Per-document state shared by every leaf.
struct InlineEnv<'a> {
    refs: &'a LinkRefStore,
    footnotes: FxHashSet<String>,
    options: &'a Options,
    extensions: &'a [Arc<dyn SyntaxExtension>],
    /// Extension owning each trigger byte.
    triggers: [Option<usize>; 256],
    special: [bool; 256],
    /// Trigger bytes of emphasis-like extensions, skipped when looking for
    /// the characters around a delimiter run.
    transparent: [bool; 256],
}

impl<'a> InlineEnv<'a> {
    fn new(
        doc: &Document,
        refs: &'a LinkRefStore,
        options: &'a Options,
        extensions: &'a [Arc<dyn SyntaxExtension>],
    ) -> Self {
        let footnotes = doc
            .descendants(doc.root())
            .filter_map(|id| match doc.value(id) {
                NodeValue::FootnoteDefinition(def) => Some(normalize_label(def.label.as_bytes())),
                _ => None,
            })
            .collect();

        let mut special = [false; 256];
        for &b in b"\n\r`\\&<*_[]!" {
            special[b as usize] = true;
        }
        if options.smart {
            for &b in b"'\"-." {
                special[b as usize] = true;
            }
        }

        let mut triggers = [None; 256];
        let mut transparent = [false; 256];
        for (i, ext) in extensions.iter().enumerate() {
            for &b in ext.inline_triggers() {
                match triggers[b as usize] {
                    None => {
                        triggers[b as usize] = Some(i);
                        special[b as usize] = true;
                        transparent[b as usize] = ext.is_emphasis_like();
                    }
                    Some(owner) => {
                        let owner: &Arc<dyn SyntaxExtension> = &extensions[owner];
                        tracing::trace!(
                            trigger = %(b as char),
                            kept = owner.name(),
                            ignored = ext.name(),
                            "inline trigger collision"
                        );
                    }
                }
            }
        }

        Self { refs, footnotes, options, extensions, triggers, special, transparent }
    }
}

/// Resolve the inline content of every leaf block in `doc`.
pub(crate) fn resolve_inlines(
    doc: &mut Document,
    refs: &LinkRefStore,
    options: &Options,
    extensions: &[Arc<dyn SyntaxExtension>],
) {
    let env = InlineEnv::new(doc, refs, options, extensions);
    let leaves: Vec<NodeId> = doc
        .descendants(doc.root())
        .filter(|&id| doc.value(id).has_inline_content())
        .collect();

    for leaf in leaves {
        let content = std::mem::take(&mut doc.node_mut(leaf).content);
        let text = match doc.value(leaf) {
            NodeValue::Paragraph => content.trim_end(),
            _ => content.trim(),
        };
        let mut subject = Subject::new(doc, leaf, text.as_bytes(), &env);
        subject.parse();
        merge_adjacent_text(doc, leaf);
    }
}

#[derive(Debug, Clone, Copy)]
struct Bracket {
    /// The `[` or `![` text node.
    node: NodeId,
    /// Offset just after the bracket.
    pos: usize,
    image: bool,
    active: bool,
    /// Another bracket was opened after this one.
    bracket_after: bool,
    /// Delimiter stack top when the bracket was opened.
    delim_bottom: Option<usize>,
}

struct Subject<'d, 'a> {
    doc: &'d mut Document,
    parent: NodeId,
    text: &'a [u8],
    pos: usize,
    env: &'a InlineEnv<'a>,
    delimiters: DelimiterStack,
    brackets: Vec<Bracket>,
    /// Backtick run lengths known to have no closer past the current point.
    no_backtick_closer: [bool; MAX_CODE_SPAN_BACKTICKS + 1],
}

impl<'d, 'a> Subject<'d, 'a> {
    fn new(doc: &'d mut Document, parent: NodeId, text: &'a [u8], env: &'a InlineEnv<'a>) -> Self {
        Self {
            doc,
            parent,
            text,
            pos: 0,
            env,
            delimiters: DelimiterStack::new(),
            brackets: Vec::new(),
            no_backtick_closer: [false; MAX_CODE_SPAN_BACKTICKS + 1],
        }
    }

    fn parse(&mut self) {
        while self.pos < self.text.len() {
            self.parse_inline();
        }
        process_emphasis(self.doc, &mut self.delimiters, None, self.env.extensions);
    }

    fn parse_inline(&mut self) {
        let c = self.text[self.pos];
        let smart = self.env.options.smart;
        match c {
            b'\n' | b'\r' => self.handle_newline(),
            b'`' => self.handle_backticks(),
            b'\\' => self.handle_backslash(),
            b'&' => self.handle_entity(),
            b'<' => self.handle_pointy_brace(),
            b'*' | b'_' => self.handle_delim(c),
            b'\'' | b'"' if smart => self.handle_delim(c),
            b'-' if smart => self.handle_hyphen(),
            b'.' if smart => self.handle_period(),
            b'[' => {
                self.pos += 1;
                let node = self.append_text("[");
                self.push_bracket(node, false);
            }
            b'!' if self.text.get(self.pos + 1) == Some(&b'[') => {
                self.pos += 2;
                let node = self.append_text("![");
                self.push_bracket(node, true);
            }
            b']' => self.handle_close_bracket(),
            _ => {
                if !(self.env.triggers[c as usize].is_some() && self.handle_extension(c)) {
                    self.handle_text();
                }
            }
        }
    }

    fn append(&mut self, value: NodeValue) -> NodeId {
        self.doc.append_value(self.parent, value, Sourcepos::default())
    }

    fn append_text(&mut self, text: &str) -> NodeId {
        self.append(NodeValue::Text(text.to_string()))
    }

    fn context(&self, pos: usize) -> InlineContext<'a> {
        InlineContext {
            text: self.text,
            pos,
            refs: self.env.refs,
            footnotes: &self.env.footnotes,
            options: self.env.options,
            transparent: &self.env.transparent,
            in_brackets: !self.brackets.is_empty(),
        }
    }

    /// Plain text up to the next special byte.
    fn handle_text(&mut self) {
        let start = self.pos;
        let mut end = start + 1;
        while end < self.text.len() && !self.env.special[self.text[end] as usize] {
            end += 1;
        }
        self.pos = end;

        let mut run = &self.text[start..end];
        // trailing spaces before a line ending belong to the break
        if matches!(self.text.get(end), Some(b'\n' | b'\r')) {
            while let [rest @ .., b' ' | b'\t'] = run {
                run = rest;
            }
        }
        if !run.is_empty() {
            let text = String::from_utf8_lossy(run).into_owned();
            self.append(NodeValue::Text(text));
        }
    }

    fn handle_newline(&mut self) {
        let nlpos = self.pos;
        if self.text.get(self.pos) == Some(&b'\r') {
            self.pos += 1;
        }
        if self.text.get(self.pos) == Some(&b'\n') {
            self.pos += 1;
        }
        let hard = nlpos > 1 && self.text[nlpos - 1] == b' ' && self.text[nlpos - 2] == b' ';
        self.append(if hard { NodeValue::LineBreak } else { NodeValue::SoftBreak });
        self.skip_spaces();
    }

    fn skip_spaces(&mut self) {
        while matches!(self.text.get(self.pos), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    fn handle_backslash(&mut self) {
        self.pos += 1;
        match self.text.get(self.pos) {
            Some(&b) if b.is_ascii_punctuation() => {
                self.pos += 1;
                self.append(NodeValue::Text((b as char).to_string()));
            }
            Some(b'\n' | b'\r') => {
                if self.text[self.pos] == b'\r' {
                    self.pos += 1;
                }
                if self.text.get(self.pos) == Some(&b'\n') {
                    self.pos += 1;
                }
                self.append(NodeValue::LineBreak);
                self.skip_spaces();
            }
            _ => {
                self.append_text("\\");
            }
        }
    }

    fn handle_entity(&mut self) {
        match decode_entity(self.text, self.pos) {
            Some((decoded, end)) => {
                self.pos = end;
                self.append(NodeValue::Text(decoded));
            }
            None => {
                self.pos += 1;
                self.append_text("&");
            }
        }
    }

    fn handle_backticks(&mut self) {
        let start = self.pos;
        while self.text.get(self.pos) == Some(&b'`') {
            self.pos += 1;
        }
        let run = self.pos - start;

        let closer = if run <= MAX_CODE_SPAN_BACKTICKS { self.find_backtick_closer(run) } else { None };
        match closer {
            Some((content_end, after)) => {
                let code = normalize_code_span(&self.text[self.pos..content_end]);
                self.pos = after;
                self.append(NodeValue::Code(code));
            }
            None => {
                let literal = String::from_utf8_lossy(&self.text[start..self.pos]).into_owned();
                self.append(NodeValue::Text(literal));
            }
        }
    }

    /// Find a backtick run of exactly `len` after the current position.
    fn find_backtick_closer(&mut self, len: usize) -> Option<(usize, usize)> {
        if self.no_backtick_closer[len] {
            return None;
        }
        let mut pos = self.pos;
        while let Some(found) = memchr::memchr(b'`', &self.text[pos..]) {
            let run_start = pos + found;
            let mut run_end = run_start;
            while self.text.get(run_end) == Some(&b'`') {
                run_end += 1;
            }
            if run_end - run_start == len {
                return Some((run_start, run_end));
            }
            pos = run_end;
        }
        self.no_backtick_closer[len] = true;
        None
    }

    fn handle_pointy_brace(&mut self) {
        if let Some((end, content, is_email)) = scan_autolink(self.text, self.pos) {
            let target = decode_entities(content);
            let url = if is_email { format!("mailto:{target}") } else { target.clone() };
            let link = self.append(NodeValue::Link(Link { url, title: String::new() }));
            self.doc.append_value(link, NodeValue::Text(target), Sourcepos::default());
            self.pos = end;
        } else if let Some(end) = scan_inline_html(self.text, self.pos) {
            let html = String::from_utf8_lossy(&self.text[self.pos..end]).into_owned();
            self.pos = end;
            self.append(NodeValue::RawHtml(html));
        } else {
            self.pos += 1;
            self.append_text("<");
        }
    }

    /// Classify the delimiter run at the current position by its flanking.
    fn scan_delims(&self, c: u8) -> (usize, bool, bool) {
        let len = if c == b'\'' || c == b'"' { 1 } else { run_length(self.text, self.pos, c) };
        let (before, after) = neighbours(self.text, self.pos, len, &self.env.transparent);
        let (left_flanking, right_flanking) = flanking(before, after);

        let (can_open, can_close) = match c {
            b'_' => (
                left_flanking && (!right_flanking || is_punctuation(before)),
                right_flanking && (!left_flanking || is_punctuation(after)),
            ),
            b'\'' | b'"' => (
                left_flanking && !right_flanking && before != ']' && before != ')',
                right_flanking,
            ),
            _ => (left_flanking, right_flanking),
        };
        (len, can_open, can_close)
    }

    fn handle_delim(&mut self, c: u8) {
        let (len, can_open, can_close) = self.scan_delims(c);
        let start = self.pos;
        self.pos += len;

        let smart = self.env.options.smart;
        let contents = match c {
            b'\'' if smart => "\u{2019}".to_string(),
            b'"' if smart && can_close => "\u{201D}".to_string(),
            b'"' if smart => "\u{201C}".to_string(),
            _ => String::from_utf8_lossy(&self.text[start..self.pos]).into_owned(),
        };
        let node = self.append(NodeValue::Text(contents));

        let is_quote = c == b'\'' || c == b'"';
        if (can_open || can_close) && (!is_quote || smart) {
            self.delimiters.push(Delimiter::new(node, c, len, can_open, can_close));
        }
    }

    fn handle_hyphen(&mut self) {
        let start = self.pos;
        while self.text.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        let count = self.pos - start;
        if count == 1 {
            self.append_text("-");
            return;
        }
        let (ems, ens) = if count % 3 == 0 {
            (count / 3, 0)
        } else if count % 2 == 0 {
            (0, count / 2)
        } else if count % 3 == 2 {
            ((count - 2) / 3, 1)
        } else {
            ((count - 4) / 3, 2)
        };
        let mut dashes = "\u{2014}".repeat(ems);
        dashes.push_str(&"\u{2013}".repeat(ens));
        self.append(NodeValue::Text(dashes));
    }

    fn handle_period(&mut self) {
        if self.text[self.pos..].starts_with(b"...") {
            self.pos += 3;
            self.append_text("\u{2026}");
        } else {
            self.pos += 1;
            self.append_text(".");
        }
    }

    fn handle_extension(&mut self, c: u8) -> bool {
        let env = self.env;
        let Some(idx) = env.triggers[c as usize] else {
            return false;
        };
        let ctx = self.context(self.pos);
        match env.extensions[idx].match_inline(&ctx, c) {
            Some(InlineMatch::Node { value, len }) => {
                self.pos += len.max(1);
                self.append(value);
                true
            }
            Some(InlineMatch::Link { url, len }) => {
                let len = len.clamp(1, self.text.len() - self.pos);
                let literal = String::from_utf8_lossy(&self.text[self.pos..self.pos + len]).into_owned();
                self.pos += len;
                let link = self.append(NodeValue::Link(Link { url, title: String::new() }));
                self.doc.append_value(link, NodeValue::Text(literal), Sourcepos::default());
                true
            }
            Some(InlineMatch::Delimiter { len, can_open, can_close }) => {
                let len = len.clamp(1, self.text.len() - self.pos);
                let literal = String::from_utf8_lossy(&self.text[self.pos..self.pos + len]).into_owned();
                self.pos += len;
                let node = self.append(NodeValue::Text(literal));
                if can_open || can_close {
                    let mut delim = Delimiter::new(node, c, len, can_open, can_close);
                    delim.ext = Some(idx);
                    self.delimiters.push(delim);
                }
                true
            }
            None => false,
        }
    }

    fn push_bracket(&mut self, node: NodeId, image: bool) {
        if self.brackets.len() >= MAX_BRACKET_DEPTH {
            return;
        }
        if let Some(last) = self.brackets.last_mut() {
            last.bracket_after = true;
        }
        self.brackets.push(Bracket {
            node,
            pos: self.pos,
            image,
            active: true,
            bracket_after: false,
            delim_bottom: self.delimiters.top(),
        });
    }

    fn handle_close_bracket(&mut self) {
        self.pos += 1;
        let after_text = self.pos;

        let Some(opener) = self.brackets.last().copied() else {
            self.append_text("]");
            return;
        };
        if !opener.active {
            self.brackets.pop();
            self.append_text("]");
            return;
        }

        let link_text = &self.text[opener.pos..after_text - 1];

        // Inline link: `[text](dest "title")`.
        let mut target = None;
        if self.text.get(after_text) == Some(&b'(') {
            if let Some((url, title, end)) = self.scan_inline_link(after_text + 1) {
                target = Some((url, title));
                self.pos = end;
            }
        }

        // Full, collapsed or shortcut reference.
        if target.is_none() {
            let (mut label, mut found_label) = match scan_reference_label(self.text, after_text) {
                Some((end, raw)) => {
                    self.pos = end;
                    (raw, true)
                }
                None => (&[][..], false),
            };
            if (!found_label || label.is_empty()) && !opener.bracket_after {
                label = link_text;
                found_label = true;
            }
            if found_label && label.len() <= MAX_LINK_LABEL_LEN {
                if let Some(def) = self.env.refs.lookup(label) {
                    target = Some((def.url.clone(), def.title.clone()));
                }
            }
            if target.is_none() {
                self.pos = after_text;
            }
        }

        let Some((url, title)) = target else {
            if !opener.image && self.try_bracket_extension(opener, link_text, after_text) {
                return;
            }
            self.brackets.pop();
            self.append_text("]");
            return;
        };

        let link = Link { url, title };
        let value = if opener.image { NodeValue::Image(link) } else { NodeValue::Link(link) };
        let node = self.doc.create(value, Sourcepos::default());
        self.doc.insert_before(opener.node, node);
        let mut cur = self.doc.next_sibling(opener.node);
        while let Some(n) = cur {
            cur = self.doc.next_sibling(n);
            self.doc.append(node, n);
        }
        self.doc.detach(opener.node);

        process_emphasis(self.doc, &mut self.delimiters, opener.delim_bottom, self.env.extensions);
        self.brackets.pop();

        // Links may not contain links: deactivate earlier link openers.
        if !opener.image {
            for b in self.brackets.iter_mut().filter(|b| !b.image) {
                b.active = false;
            }
        }
    }

    /// Offer an unmatched `[...]` to the attached extensions.
    fn try_bracket_extension(&mut self, opener: Bracket, label: &[u8], after_text: usize) -> bool {
        let env = self.env;
        let ctx = self.context(after_text);
        let Some(value) = env.extensions.iter().find_map(|ext| ext.resolve_bracket(&ctx, label)) else {
            return false;
        };

        let node = self.doc.create(value, Sourcepos::default());
        self.doc.insert_before(opener.node, node);
        process_emphasis(self.doc, &mut self.delimiters, opener.delim_bottom, env.extensions);

        // The replaced text is gone for good.
        let mut cur = Some(opener.node);
        while let Some(n) = cur {
            cur = self.doc.next_sibling(n);
            self.doc.detach(n);
        }
        self.brackets.pop();
        self.pos = after_text;
        true
    }

    /// Scan `(dest "title")` after the `(`. Returns the unescaped
    /// destination and title and the offset after `)`.
    fn scan_inline_link(&self, start: usize) -> Option<(String, String, usize)> {
        let text = self.text;
        let dest_start = skip_spacechars(text, start);
        let (dest_end, raw_dest) = if text.get(dest_start) == Some(&b')') {
            (dest_start, &[][..])
        } else {
            scan_link_destination(text, dest_start)?
        };

        let title_start = skip_spacechars(text, dest_end);
        let (title_end, raw_title) = if title_start != dest_end {
            scan_link_title(text, title_start).unwrap_or((title_start, &[][..]))
        } else {
            (title_start, &[][..])
        };

        let end = skip_spacechars(text, title_end);
        if text.get(end) != Some(&b')') {
            return None;
        }
        Some((unescape(raw_dest), unescape(raw_title), end + 1))
    }
}

/// `[label]` after a link text, allowing an empty (collapsed) label.
/// Returns the offset after `]` and the trimmed raw label.
fn scan_reference_label(text: &[u8], start: usize) -> Option<(usize, &[u8])> {
    if text.get(start) != Some(&b'[') {
        return None;
    }
    let mut pos = start + 1;
    while pos < text.len() {
        match text[pos] {
            b'[' => return None,
            b']' => {
                let raw = text[start + 1..pos].trim_ascii();
                return Some((pos + 1, raw));
            }
            b'\\' if text.get(pos + 1).is_some_and(|b| b.is_ascii_punctuation()) => pos += 2,
            _ => pos += 1,
        }
        if pos - start > MAX_LINK_LABEL_LEN + 1 {
            return None;
        }
    }
    None
}

fn skip_spacechars(text: &[u8], mut pos: usize) -> usize {
    while matches!(text.get(pos), Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)) {
        pos += 1;
    }
    pos
}

/// Line endings become spaces; one surrounding space is stripped when both
/// ends have one and the content is not all spaces.
fn normalize_code_span(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'\r' if raw.get(i + 1) == Some(&b'\n') => {
                out.push(b' ');
                i += 2;
            }
            b'\r' | b'\n' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    if out.len() >= 2 && out[0] == b' ' && out[out.len() - 1] == b' ' && out.iter().any(|&b| b != b' ') {
        out.pop();
        out.remove(0);
    }
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn run_length(text: &[u8], pos: usize, ch: u8) -> usize {
    text[pos..].iter().take_while(|&&b| b == ch).count()
}

/// The characters around the `len` byte run at `pos`, looking past any
/// `transparent` bytes. The start and end of the text count as a newline.
fn neighbours(text: &[u8], pos: usize, len: usize, transparent: &[bool; 256]) -> (char, char) {
    let mut start = pos;
    // the first byte of the text is never skipped
    while start > 1 && transparent[text[start - 1] as usize] {
        start -= 1;
    }
    let mut end = pos + len;
    while end < text.len() && transparent[text[end] as usize] {
        end += 1;
    }
    (char_before(text, start).unwrap_or('\n'), char_at(text, end).unwrap_or('\n'))
}

/// Left- and right-flanking of a delimiter run between `before` and `after`.
fn flanking(before: char, after: char) -> (bool, bool) {
    let left = !after.is_whitespace() && (!is_punctuation(after) || before.is_whitespace() || is_punctuation(before));
    let right = !before.is_whitespace() && (!is_punctuation(before) || after.is_whitespace() || is_punctuation(after));
    (left, right)
}

/// Unicode punctuation, approximated as ASCII punctuation plus any
/// non-ASCII character that is neither alphanumeric, whitespace nor control.
pub(crate) fn is_punctuation(ch: char) -> bool {
    if ch.is_ascii() {
        ch.is_ascii_punctuation()
    } else {
        !ch.is_alphanumeric() && !ch.is_whitespace() && !ch.is_control()
    }
}

/// The character ending just before byte `pos`.
pub(crate) fn char_before(text: &[u8], pos: usize) -> Option<char> {
    if pos == 0 || pos > text.len() {
        return None;
    }
    let mut start = pos - 1;
    while start > 0 && pos - start < 4 && (text[start] & 0xC0) == 0x80 {
        start -= 1;
    }
    std::str::from_utf8(&text[start..pos]).ok()?.chars().next_back()
}

/// The character starting at byte `pos`.
pub(crate) fn char_at(text: &[u8], pos: usize) -> Option<char> {
    let lead = *text.get(pos)?;
    let width = match lead {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    };
    let end = (pos + width).min(text.len());
    std::str::from_utf8(&text[pos..end]).ok()?.chars().next()
}

/// Join runs of adjacent text nodes below `root`.
fn merge_adjacent_text(doc: &mut Document, root: NodeId) {
    let nodes: Vec<NodeId> = doc.descendants(root).collect();
    for id in nodes {
        if doc.parent(id).is_none() || !matches!(doc.value(id), NodeValue::Text(_)) {
            continue;
        }
        while let Some(next) = doc.next_sibling(id) {
            let NodeValue::Text(tail) = doc.value_mut(next) else {
                break;
            };
            let tail = std::mem::take(tail);
            if let NodeValue::Text(head) = doc.value_mut(id) {
                head.push_str(&tail);
            }
            doc.detach(next);
        }
    }
}
