//! Line-oriented block parser.
//!
//! Each line is matched against the chain of open blocks, new block starts
//! are opened below the deepest match, and the remaining text is added to
//! the innermost block. Blocks that stop matching are closed (finalized)
//! as soon as the parser knows they cannot continue.
//!
//! Input may arrive in arbitrary chunks through [`ParserState::feed`];
//! partial lines are buffered until their line ending shows up.

use std::borrow::Cow;
use std::sync::Arc;

use memchr::{memchr, memchr2};

use super::{reconcile_list_tightness, scan};
use crate::error::{Error, ResourceLimitError, Result};
use crate::escape::{decode_entities, unescape_backslashes};
use crate::ext::{self, BlockPrecedence, ExtensionRegistry, SyntaxExtension, core_registry};
use crate::inline;
use crate::link_ref::{LinkRefStore, extract_definitions};
use crate::node::{CodeBlock, NodeValue, Sourcepos};
use crate::options::Options;
use crate::tree::{Document, NodeId};

const TAB_STOP: usize = 4;
const CODE_INDENT: usize = 4;

/// How an open code block reacted to the current line.
enum CodePrefix {
    Matched,
    Unmatched,
    /// A closing fence: the line is fully consumed.
    Closed,
}

/// An incremental Markdown parser.
///
/// ```
/// use gfmark::{Options, ParserState};
///
/// let mut parser = ParserState::new(Options::default());
/// parser.feed("# Hel").unwrap();
/// parser.feed("lo\n").unwrap();
/// let doc = parser.finish().unwrap();
/// assert_eq!(gfmark::render_html(&doc, &Options::default(), &[]), "<h1>Hello</h1>\n");
/// ```
pub struct ParserState {
    doc: Document,
    options: Options,
    registry: Arc<ExtensionRegistry>,
    extensions: Vec<Arc<dyn SyntaxExtension>>,
    refmap: LinkRefStore,
    /// Deepest open block.
    current: NodeId,

    line_number: usize,
    offset: usize,
    column: usize,
    first_nonspace: usize,
    first_nonspace_column: usize,
    indent: usize,
    blank: bool,
    partially_consumed_tab: bool,
    line_len: usize,
    last_line_length: usize,
    finishing: bool,

    /// Bytes after the last complete line.
    pending: Vec<u8>,
    consumed: usize,
    error: Option<ResourceLimitError>,
}

impl std::fmt::Debug for ParserState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserState")
            .field("options", &self.options)
            .field("extensions", &self.extensions.iter().map(|e| e.name()).collect::<Vec<_>>())
            .field("line_number", &self.line_number)
            .finish_non_exhaustive()
    }
}

impl ParserState {
    /// A parser using the core extension registry. No extensions are
    /// attached except `footnotes` when [`Options::footnotes`] is set.
    pub fn new(options: Options) -> Self {
        Self::with_registry(options, Arc::clone(core_registry()))
    }

    /// A parser resolving extension names against `registry`.
    pub fn with_registry(options: Options, registry: Arc<ExtensionRegistry>) -> Self {
        let doc = Document::new();
        let root = doc.root();
        let mut state = Self {
            doc,
            options,
            registry,
            extensions: Vec::new(),
            refmap: LinkRefStore::new(),
            current: root,
            line_number: 0,
            offset: 0,
            column: 0,
            first_nonspace: 0,
            first_nonspace_column: 0,
            indent: 0,
            blank: false,
            partially_consumed_tab: false,
            line_len: 0,
            last_line_length: 0,
            finishing: false,
            pending: Vec::new(),
            consumed: 0,
            error: None,
        };
        if options.footnotes {
            if let Some(footnotes) = state.registry.find("footnotes").cloned() {
                state.extensions.push(footnotes);
            }
        }
        state
    }

    /// A parser with the named core extensions attached.
    pub fn with_extensions(options: Options, names: &[&str]) -> Result<Self> {
        let mut state = Self::new(options);
        state.attach_extensions(names)?;
        Ok(state)
    }

    /// Attach a registered extension by name. Attaching twice is a no-op.
    pub fn attach_extension(&mut self, name: &str) -> Result<()> {
        let Some(rank) = self.registry.position(name) else {
            return Err(Error::UnknownExtension(name.to_string()));
        };
        if self.extensions.iter().any(|e| e.name() == name) {
            return Ok(());
        }
        let at = self
            .extensions
            .iter()
            .position(|e| self.registry.position(e.name()) > Some(rank))
            .unwrap_or(self.extensions.len());
        let ext = self
            .registry
            .iter()
            .nth(rank)
            .cloned()
            .ok_or_else(|| Error::UnknownExtension(name.to_string()))?;
        tracing::debug!(extension = name, "attached syntax extension");
        self.extensions.insert(at, ext);
        Ok(())
    }

    /// Attach several extensions by name, stopping at the first unknown one.
    pub fn attach_extensions(&mut self, names: &[&str]) -> Result<()> {
        names.iter().try_for_each(|name| self.attach_extension(name))
    }

    /// Attached extensions, in registration order.
    pub fn extensions(&self) -> &[Arc<dyn SyntaxExtension>] {
        &self.extensions
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Consume a chunk of input. Chunks may split lines anywhere.
    pub fn feed(&mut self, text: &str) -> Result<()> {
        if let Some(err) = &self.error {
            return Err(err.clone().into());
        }
        self.consumed += text.len();
        let limit = self.options.limits.max_input_len;
        if self.consumed > limit {
            return Err(self.fail(ResourceLimitError::InputTooLarge { len: self.consumed, limit }));
        }
        self.pending.extend_from_slice(text.as_bytes());
        self.process_pending(false)
    }

    /// Close every open block, resolve inline content and run extension
    /// post-processing.
    pub fn finish(mut self) -> Result<Document> {
        if let Some(err) = self.error.take() {
            return Err(err.into());
        }
        self.process_pending(true)?;

        self.finishing = true;
        let root = self.doc.root();
        while self.current != root {
            self.current = self.finalize(self.current);
        }
        self.finalize(root);

        reconcile_list_tightness(&mut self.doc);
        inline::resolve_inlines(&mut self.doc, &self.refmap, &self.options, &self.extensions);
        for ext in &self.extensions {
            ext.postprocess(&mut self.doc, &self.options);
        }

        tracing::debug!(
            lines = self.line_number,
            nodes = self.doc.len(),
            link_refs = self.refmap.len(),
            "document parsed"
        );
        Ok(self.doc)
    }

    /// Feed `text`, finish, and render with this parser's options and
    /// attached extensions.
    pub fn markdown_to_html(mut self, text: &str) -> Result<String> {
        self.feed(text)?;
        let options = self.options;
        let extensions = self.extensions.clone();
        let doc = self.finish()?;
        Ok(crate::render::render_html(&doc, &options, &extensions))
    }

    fn fail(&mut self, err: ResourceLimitError) -> Error {
        tracing::warn!(error = %err, "parse abandoned");
        self.error = Some(err.clone());
        err.into()
    }

    fn process_pending(&mut self, at_end: bool) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        let mut start = 0;
        let result = loop {
            let rest = &pending[start..];
            let Some(eol) = memchr2(b'\n', b'\r', rest) else {
                if at_end && !rest.is_empty() {
                    if let Err(e) = self.process_line(rest) {
                        break Err(e);
                    }
                    start = pending.len();
                }
                break Ok(());
            };
            let eol_len = match (rest[eol], rest.get(eol + 1)) {
                (b'\r', Some(b'\n')) => 2,
                // a lone `\r` at the chunk end may be half of `\r\n`
                (b'\r', None) if !at_end => break Ok(()),
                _ => 1,
            };
            if let Err(e) = self.process_line(&rest[..eol]) {
                break Err(e);
            }
            start += eol + eol_len;
        };
        self.pending = pending;
        self.pending.drain(..start);
        result
    }

    fn process_line(&mut self, raw: &[u8]) -> Result<()> {
        let line: Cow<'_, [u8]> = if memchr(0, raw).is_some() {
            let mut owned = Vec::with_capacity(raw.len() + 2);
            for &b in raw {
                if b == 0 {
                    owned.extend_from_slice("\u{FFFD}".as_bytes());
                } else {
                    owned.push(b);
                }
            }
            Cow::Owned(owned)
        } else {
            Cow::Borrowed(raw)
        };
        let line = &*line;

        self.line_number += 1;
        self.offset = 0;
        self.column = 0;
        self.first_nonspace = 0;
        self.first_nonspace_column = 0;
        self.indent = 0;
        self.blank = false;
        self.partially_consumed_tab = false;
        self.line_len = line.len();

        if let Some((container, all_matched)) = self.check_open_blocks(line) {
            let last_matched = container;
            let container = self.open_new_blocks(line, container, all_matched)?;
            self.add_text_to_container(line, container, last_matched)?;
        }

        self.last_line_length = line.len();
        Ok(())
    }

    /// Walk the open blocks, consuming each one's continuation prefix.
    /// Returns the deepest matched block and whether every open block
    /// matched, or `None` when the line was consumed by a closing fence.
    fn check_open_blocks(&mut self, line: &[u8]) -> Option<(NodeId, bool)> {
        let mut container = self.doc.root();
        loop {
            let last = match self.doc.last_child(container) {
                Some(last) if self.doc.node(last).open => last,
                _ => return Some((container, true)),
            };
            container = last;
            self.find_first_nonspace(line);

            let matched = match self.doc.value(container) {
                NodeValue::BlockQuote => self.parse_block_quote_prefix(line),
                NodeValue::Item(_) => self.parse_item_prefix(line, container),
                NodeValue::CodeBlock(_) => match self.parse_code_block_prefix(line, container) {
                    CodePrefix::Matched => true,
                    CodePrefix::Unmatched => false,
                    CodePrefix::Closed => return None,
                },
                NodeValue::HtmlBlock { block_type, .. } => *block_type <= 5 || !self.blank,
                NodeValue::Paragraph => !self.blank,
                NodeValue::Heading { .. } | NodeValue::ThematicBreak => false,
                value if value.is_extension_kind() => self.extension_continues(line, container),
                _ => true,
            };
            if !matched {
                let parent = self.doc.parent(container).unwrap_or(self.doc.root());
                return Some((parent, false));
            }
        }
    }

    fn parse_block_quote_prefix(&mut self, line: &[u8]) -> bool {
        if self.indent <= 3 && line.get(self.first_nonspace) == Some(&b'>') {
            self.advance_offset(line, self.indent + 1, true);
            if is_space_or_tab(line.get(self.offset)) {
                self.advance_offset(line, 1, true);
            }
            return true;
        }
        false
    }

    fn parse_item_prefix(&mut self, line: &[u8], item: NodeId) -> bool {
        let NodeValue::Item(data) = self.doc.value(item) else {
            return false;
        };
        let needed = data.marker_offset + data.padding;
        if self.indent >= needed {
            self.advance_offset(line, needed, true);
            true
        } else if self.blank && self.doc.first_child(item).is_some() {
            self.advance_offset(line, self.first_nonspace - self.offset, false);
            true
        } else {
            false
        }
    }

    fn parse_code_block_prefix(&mut self, line: &[u8], block: NodeId) -> CodePrefix {
        let NodeValue::CodeBlock(cb) = self.doc.value(block) else {
            return CodePrefix::Unmatched;
        };
        if !cb.fenced {
            if self.indent >= CODE_INDENT {
                self.advance_offset(line, CODE_INDENT, true);
                return CodePrefix::Matched;
            }
            if self.blank {
                self.advance_offset(line, self.first_nonspace - self.offset, false);
                return CodePrefix::Matched;
            }
            return CodePrefix::Unmatched;
        }

        let (fence_char, fence_len, fence_offset) = (cb.fence_char, cb.fence_len, cb.fence_offset);
        if self.indent <= 3 && scan::close_code_fence(line, self.first_nonspace, fence_char, fence_len) {
            self.current = self.finalize(block);
            return CodePrefix::Closed;
        }
        let mut strip = fence_offset;
        while strip > 0 && is_space_or_tab(line.get(self.offset)) {
            self.advance_offset(line, 1, true);
            strip -= 1;
        }
        CodePrefix::Matched
    }

    fn extension_continues(&mut self, line: &[u8], node: NodeId) -> bool {
        let Some(ext) = ext::owner(&self.extensions, self.doc.value(node)).cloned() else {
            return false;
        };
        let mut ctx = BlockContext { parser: self, line, container: node };
        ext.continue_block(&mut ctx, node)
    }

    fn try_extensions(
        &mut self,
        line: &[u8],
        container: NodeId,
        slot: BlockPrecedence,
    ) -> Result<Option<NodeId>> {
        for i in 0..self.extensions.len() {
            let ext = Arc::clone(&self.extensions[i]);
            if ext.block_precedence() != slot {
                continue;
            }
            let mut ctx = BlockContext { parser: self, line, container };
            if let Some(opened) = ext.open_block(&mut ctx)? {
                return Ok(Some(opened));
            }
        }
        Ok(None)
    }

    /// Open every block that starts on this line, innermost last.
    fn open_new_blocks(&mut self, line: &[u8], mut container: NodeId, all_matched: bool) -> Result<NodeId> {
        let mut maybe_lazy = matches!(self.doc.value(self.current), NodeValue::Paragraph);

        loop {
            if matches!(self.doc.value(container), NodeValue::CodeBlock(_) | NodeValue::HtmlBlock { .. }) {
                break;
            }
            self.find_first_nonspace(line);
            let indented = self.indent >= CODE_INDENT;
            let fns = self.first_nonspace;
            let in_paragraph = matches!(self.doc.value(container), NodeValue::Paragraph);

            if let Some(opened) = self.try_extensions(line, container, BlockPrecedence::First)? {
                container = opened;
            } else if !indented && line.get(fns) == Some(&b'>') {
                self.advance_offset(line, fns + 1 - self.offset, false);
                if is_space_or_tab(line.get(self.offset)) {
                    self.advance_offset(line, 1, true);
                }
                container = self.add_child(container, NodeValue::BlockQuote, fns + 1)?;
            } else if let Some((level, content_start)) = (!indented).then(|| scan::atx_heading(line, fns)).flatten() {
                self.advance_offset(line, content_start - self.offset, false);
                container = self.add_child(container, NodeValue::Heading { level, setext: false }, fns + 1)?;
            } else if let Some((fence_char, fence_len)) = (!indented).then(|| scan::open_code_fence(line, fns)).flatten() {
                let code = CodeBlock {
                    fenced: true,
                    fence_char,
                    fence_len,
                    fence_offset: fns - self.offset,
                    ..CodeBlock::default()
                };
                container = self.add_child(container, NodeValue::CodeBlock(code), fns + 1)?;
                self.advance_offset(line, fns + fence_len - self.offset, false);
            } else if let Some(block_type) = (!indented).then(|| scan::html_block_start(line, fns, in_paragraph)).flatten() {
                let html = NodeValue::HtmlBlock { block_type, literal: String::new() };
                container = self.add_child(container, html, fns + 1)?;
            } else if let Some(level) = (!indented && in_paragraph).then(|| scan::setext_underline(line, fns)).flatten() {
                if self.resolve_definitions(container) {
                    *self.doc.value_mut(container) = NodeValue::Heading { level, setext: true };
                    self.advance_offset(line, line.len() - self.offset, false);
                }
            } else if !indented && !(in_paragraph && !all_matched) && scan::thematic_break(line, fns) {
                container = self.add_child(container, NodeValue::ThematicBreak, fns + 1)?;
                self.advance_offset(line, line.len() - self.offset, false);
            } else if let Some(opened) = self.try_extensions(line, container, BlockPrecedence::BeforeListItem)? {
                container = opened;
            } else if let Some(marker) = ((!indented || matches!(self.doc.value(container), NodeValue::List(_))) && self.indent < CODE_INDENT)
                .then(|| scan::list_marker(line, fns, in_paragraph))
                .flatten()
            {
                container = self.open_list_item(line, container, marker)?;
            } else if indented && !maybe_lazy && !self.blank {
                self.advance_offset(line, CODE_INDENT, true);
                let code = NodeValue::CodeBlock(CodeBlock::default());
                container = self.add_child(container, code, self.offset + 1)?;
            } else if let Some(opened) = self.try_extensions(line, container, BlockPrecedence::Last)? {
                container = opened;
            } else {
                break;
            }

            if self.accepts_lines(container) {
                break;
            }
            maybe_lazy = false;
        }
        Ok(container)
    }

    fn open_list_item(&mut self, line: &[u8], mut container: NodeId, marker: scan::ListMarker) -> Result<NodeId> {
        let fns = self.first_nonspace;
        let mut data = marker.data;
        self.advance_offset(line, fns + marker.marker_len - self.offset, false);

        let (save_partial, save_offset, save_column) = (self.partially_consumed_tab, self.offset, self.column);
        while self.column - save_column <= 5 && is_space_or_tab(line.get(self.offset)) {
            self.advance_offset(line, 1, true);
        }
        let spaces = self.column - save_column;
        if !(1..5).contains(&spaces) || self.offset >= line.len() {
            data.padding = marker.marker_len + 1;
            self.partially_consumed_tab = save_partial;
            self.offset = save_offset;
            self.column = save_column;
            if spaces > 0 {
                self.advance_offset(line, 1, true);
            }
        } else {
            data.padding = marker.marker_len + spaces;
        }
        data.marker_offset = self.indent;

        let continues_list = matches!(self.doc.value(container), NodeValue::List(existing) if existing.same_list(&data));
        if !continues_list {
            container = self.add_child(container, NodeValue::List(data), fns + 1)?;
        }
        self.add_child(container, NodeValue::Item(data), fns + 1)
    }

    fn add_text_to_container(&mut self, line: &[u8], mut container: NodeId, last_matched: NodeId) -> Result<()> {
        self.find_first_nonspace(line);

        if self.blank {
            if let Some(last) = self.doc.last_child(container) {
                self.doc.node_mut(last).last_line_blank = true;
            }
        }
        let last_line_blank = self.blank
            && match self.doc.value(container) {
                NodeValue::BlockQuote | NodeValue::Heading { .. } | NodeValue::ThematicBreak => false,
                NodeValue::CodeBlock(cb) => !cb.fenced,
                NodeValue::Item(_) => {
                    self.doc.first_child(container).is_some()
                        || self.doc.node(container).sourcepos.start.line != self.line_number
                }
                _ => true,
            };
        self.doc.node_mut(container).last_line_blank = last_line_blank;
        let mut up = self.doc.parent(container);
        while let Some(p) = up {
            self.doc.node_mut(p).last_line_blank = false;
            up = self.doc.parent(p);
        }

        let lazy = self.current != last_matched
            && container == last_matched
            && !self.blank
            && matches!(self.doc.value(self.current), NodeValue::Paragraph);
        if lazy {
            self.add_line(line, self.current);
            return Ok(());
        }

        while self.current != last_matched {
            self.current = self.finalize(self.current);
        }

        match self.doc.value(container) {
            NodeValue::CodeBlock(_) => self.add_line(line, container),
            NodeValue::HtmlBlock { block_type, .. } => {
                let block_type = *block_type;
                self.add_line(line, container);
                if block_type <= 5 && scan::html_block_end(&line[self.first_nonspace.min(line.len())..], block_type) {
                    container = self.finalize(container);
                }
            }
            _ if self.blank => {}
            NodeValue::Heading { setext: false, .. } => {
                self.advance_offset(line, self.first_nonspace - self.offset, false);
                let text = scan::atx_heading_content(line, self.offset);
                let node = self.doc.node_mut(container);
                node.content.push_str(&String::from_utf8_lossy(text));
                node.content.push('\n');
            }
            _ if self.accepts_lines(container) => {
                self.advance_offset(line, self.first_nonspace - self.offset, false);
                self.add_line(line, container);
            }
            _ => {
                let fns = self.first_nonspace;
                container = self.add_child(container, NodeValue::Paragraph, fns + 1)?;
                self.advance_offset(line, fns - self.offset, false);
                self.add_line(line, container);
            }
        }
        self.current = container;
        Ok(())
    }

    fn accepts_lines(&self, node: NodeId) -> bool {
        match self.doc.value(node) {
            NodeValue::Paragraph | NodeValue::Heading { .. } | NodeValue::CodeBlock(_) | NodeValue::HtmlBlock { .. } => true,
            value if value.is_extension_kind() => {
                ext::owner(&self.extensions, value).is_some_and(|e| e.accepts_lines(value))
            }
            _ => false,
        }
    }

    /// Append `value` below `parent`, closing blocks that cannot hold it.
    fn add_child(&mut self, mut parent: NodeId, value: NodeValue, start_column: usize) -> Result<NodeId> {
        while !self.can_contain(parent, &value) {
            parent = self.finalize(parent);
        }
        let depth = self.doc.depth(parent) + 1;
        let limit = self.options.limits.max_nesting;
        if depth > limit {
            return Err(self.fail(ResourceLimitError::NestingTooDeep { depth, limit }));
        }
        tracing::trace!(kind = value.kind_name(), line = self.line_number, depth, "block opened");
        let pos = Sourcepos::new(self.line_number, start_column, 0, 0);
        Ok(self.doc.append_value(parent, value, pos))
    }

    fn can_contain(&self, parent: NodeId, child: &NodeValue) -> bool {
        let value = self.doc.value(parent);
        if value.is_extension_kind() && !value.is_container() {
            return false;
        }
        if matches!(child, NodeValue::Custom { .. }) {
            return value.is_container() && !matches!(value, NodeValue::List(_));
        }
        value.can_contain(child)
    }

    fn add_line(&mut self, line: &[u8], node: NodeId) {
        let mut text = String::new();
        if self.partially_consumed_tab {
            self.offset += 1;
            let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
            text.extend(std::iter::repeat_n(' ', chars_to_tab));
        }
        text.push_str(&String::from_utf8_lossy(&line[self.offset.min(line.len())..]));
        text.push('\n');
        self.doc.node_mut(node).content.push_str(&text);
    }

    /// Strip leading link reference definitions from a paragraph.
    /// Returns whether any text is left.
    fn resolve_definitions(&mut self, paragraph: NodeId) -> bool {
        let content = std::mem::take(&mut self.doc.node_mut(paragraph).content);
        let used = extract_definitions(&content, &mut self.refmap);
        let rest = &content[used..];
        let has_content = !rest.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\n'));
        self.doc.node_mut(paragraph).content = rest.to_string();
        has_content
    }

    /// Close `node`, record its end position and settle its content.
    /// Returns the parent.
    fn finalize(&mut self, node: NodeId) -> NodeId {
        let parent = self.doc.parent(node).unwrap_or(self.doc.root());
        self.doc.node_mut(node).open = false;
        tracing::trace!(kind = self.doc.value(node).kind_name(), line = self.line_number, "block closed");

        let (end_line, end_column) = if self.finishing {
            (self.line_number, self.last_line_length)
        } else {
            match self.doc.value(node) {
                NodeValue::Document
                | NodeValue::CodeBlock(CodeBlock { fenced: true, .. })
                | NodeValue::Heading { setext: true, .. } => (self.line_number, self.line_len),
                _ => (self.line_number.saturating_sub(1), self.last_line_length),
            }
        };
        let end = &mut self.doc.node_mut(node).sourcepos.end;
        end.line = end_line;
        end.column = end_column;

        match self.doc.value(node) {
            NodeValue::Paragraph => {
                if !self.resolve_definitions(node) {
                    self.doc.detach(node);
                }
            }
            NodeValue::CodeBlock(cb) if cb.fenced => {
                let content = std::mem::take(&mut self.doc.node_mut(node).content);
                let (first, rest) = content.split_once('\n').unwrap_or((content.as_str(), ""));
                let info = unescape_backslashes(decode_entities(first.trim().as_bytes()).as_bytes());
                let literal = rest.to_string();
                if let NodeValue::CodeBlock(cb) = self.doc.value_mut(node) {
                    cb.info = info;
                    cb.literal = literal;
                }
            }
            NodeValue::CodeBlock(_) => {
                let content = std::mem::take(&mut self.doc.node_mut(node).content);
                let literal = strip_trailing_blank_lines(&content);
                if let NodeValue::CodeBlock(cb) = self.doc.value_mut(node) {
                    cb.literal = literal;
                }
            }
            NodeValue::HtmlBlock { .. } => {
                let content = std::mem::take(&mut self.doc.node_mut(node).content);
                if let NodeValue::HtmlBlock { literal, .. } = self.doc.value_mut(node) {
                    *literal = content;
                }
            }
            value if value.is_extension_kind() => {
                if let Some(ext) = ext::owner(&self.extensions, value).cloned() {
                    ext.close_block(&mut self.doc, node);
                }
            }
            _ => {}
        }
        parent
    }

    fn find_first_nonspace(&mut self, line: &[u8]) {
        let mut chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
        self.first_nonspace = self.offset;
        self.first_nonspace_column = self.column;
        loop {
            match line.get(self.first_nonspace) {
                Some(b' ') => {
                    self.first_nonspace += 1;
                    self.first_nonspace_column += 1;
                    chars_to_tab -= 1;
                    if chars_to_tab == 0 {
                        chars_to_tab = TAB_STOP;
                    }
                }
                Some(b'\t') => {
                    self.first_nonspace += 1;
                    self.first_nonspace_column += chars_to_tab;
                    chars_to_tab = TAB_STOP;
                }
                _ => break,
            }
        }
        self.indent = self.first_nonspace_column - self.column;
        self.blank = self.first_nonspace >= line.len();
    }

    /// Move forward `count` bytes, or `count` columns when `columns` is set,
    /// in which case a tab may be consumed only partially.
    fn advance_offset(&mut self, line: &[u8], mut count: usize, columns: bool) {
        while count > 0 {
            match line.get(self.offset) {
                Some(b'\t') => {
                    let chars_to_tab = TAB_STOP - (self.column % TAB_STOP);
                    if columns {
                        self.partially_consumed_tab = chars_to_tab > count;
                        let step = chars_to_tab.min(count);
                        self.column += step;
                        if !self.partially_consumed_tab {
                            self.offset += 1;
                        }
                        count -= step;
                    } else {
                        self.partially_consumed_tab = false;
                        self.column += chars_to_tab;
                        self.offset += 1;
                        count -= 1;
                    }
                }
                Some(_) => {
                    self.partially_consumed_tab = false;
                    self.offset += 1;
                    self.column += 1;
                    count -= 1;
                }
                None => break,
            }
        }
    }
}

#[inline]
fn is_space_or_tab(b: Option<&u8>) -> bool {
    matches!(b, Some(b' ' | b'\t'))
}

/// Drop trailing whitespace-only lines, keeping one final newline.
fn strip_trailing_blank_lines(content: &str) -> String {
    let bytes = content.as_bytes();
    let Some(last) = bytes.iter().rposition(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r')) else {
        return String::new();
    };
    let end = memchr(b'\n', &bytes[last..]).map_or(bytes.len(), |i| last + i);
    let mut out = content[..end].to_string();
    out.push('\n');
    out
}

/// Parser state exposed to extension block matchers.
///
/// Offsets are byte positions in [`BlockContext::line`]; the context tracks
/// the container that new blocks are appended to.
pub struct BlockContext<'p> {
    parser: &'p mut ParserState,
    line: &'p [u8],
    container: NodeId,
}

impl BlockContext<'_> {
    /// The current line without its line ending.
    pub fn line(&self) -> &[u8] {
        self.line
    }

    /// 1-based number of the current line.
    pub fn line_number(&self) -> usize {
        self.parser.line_number
    }

    pub fn offset(&self) -> usize {
        self.parser.offset
    }

    /// Offset of the first non-space byte at or after [`offset`](Self::offset).
    pub fn first_nonspace(&self) -> usize {
        self.parser.first_nonspace
    }

    /// Columns of whitespace between the offset and the first non-space byte.
    pub fn indent(&self) -> usize {
        self.parser.indent
    }

    pub fn is_indented(&self) -> bool {
        self.parser.indent >= CODE_INDENT
    }

    pub fn is_blank(&self) -> bool {
        self.parser.blank
    }

    /// The block new children are appended to.
    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn options(&self) -> &Options {
        &self.parser.options
    }

    pub fn document(&self) -> &Document {
        &self.parser.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.parser.doc
    }

    /// Raw text collected so far by a leaf block.
    pub fn content(&self, node: NodeId) -> &str {
        &self.parser.doc.node(node).content
    }

    pub fn content_mut(&mut self, node: NodeId) -> &mut String {
        &mut self.parser.doc.node_mut(node).content
    }

    /// Consume `count` bytes (or columns) of the line.
    pub fn advance_offset(&mut self, count: usize, columns: bool) {
        self.parser.advance_offset(self.line, count, columns);
        self.parser.find_first_nonspace(self.line);
    }

    /// Append a block below the container, closing blocks that cannot hold
    /// it, and make it the new container.
    pub fn add_child(&mut self, value: NodeValue, start_column: usize) -> Result<NodeId> {
        let id = self.parser.add_child(self.container, value, start_column)?;
        self.container = id;
        Ok(id)
    }
}
