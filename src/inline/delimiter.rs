//! Delimiter runs and emphasis resolution.
//!
//! Runs of `*`, `_`, smart quotes and extension delimiter characters are
//! kept in a doubly linked list threaded through a `Vec`, in document
//! order. Pairing walks closers left to right and searches backwards for a
//! compatible opener, as in the CommonMark reference algorithm.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::ext::SyntaxExtension;
use crate::limits::MAX_DELIMITER_STACK;
use crate::node::NodeValue;
use crate::tree::{Document, NodeId};

/// One delimiter run.
#[derive(Debug, Clone)]
pub(crate) struct Delimiter {
    /// Text node holding the run's characters.
    pub node: NodeId,
    pub ch: u8,
    /// Characters not yet used by a match.
    pub len: usize,
    /// Length of the run as scanned.
    pub orig_len: usize,
    pub can_open: bool,
    pub can_close: bool,
    /// Index of the extension owning this delimiter character.
    pub ext: Option<usize>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl Delimiter {
    pub fn new(node: NodeId, ch: u8, len: usize, can_open: bool, can_close: bool) -> Self {
        Self {
            node,
            ch,
            len,
            orig_len: len,
            can_open,
            can_close,
            ext: None,
            prev: None,
            next: None,
        }
    }
}

/// The delimiter list. Removed entries stay in the arena but are unlinked.
#[derive(Debug, Default)]
pub(crate) struct DelimiterStack {
    items: Vec<Delimiter>,
    top: Option<usize>,
    live: usize,
}

impl DelimiterStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Topmost (rightmost) live delimiter.
    #[inline]
    pub fn top(&self) -> Option<usize> {
        self.top
    }

    /// Push a run. Returns `false` when the stack is full and the run must
    /// stay literal text.
    pub fn push(&mut self, mut delim: Delimiter) -> bool {
        if self.live >= MAX_DELIMITER_STACK {
            return false;
        }
        let idx = self.items.len();
        delim.prev = self.top;
        delim.next = None;
        if let Some(top) = self.top {
            self.items[top].next = Some(idx);
        }
        self.items.push(delim);
        self.top = Some(idx);
        self.live += 1;
        true
    }

    pub fn remove(&mut self, idx: usize) {
        let (prev, next) = (self.items[idx].prev, self.items[idx].next);
        match next {
            Some(n) => self.items[n].prev = prev,
            None => self.top = prev,
        }
        if let Some(p) = prev {
            self.items[p].next = next;
        }
        self.items[idx].prev = None;
        self.items[idx].next = None;
        self.live -= 1;
    }

    #[inline]
    pub fn prev(&self, idx: usize) -> Option<usize> {
        self.items[idx].prev
    }

    #[inline]
    pub fn next(&self, idx: usize) -> Option<usize> {
        self.items[idx].next
    }

    #[inline]
    pub fn get(&self, idx: usize) -> &Delimiter {
        &self.items[idx]
    }

    #[inline]
    pub fn get_mut(&mut self, idx: usize) -> &mut Delimiter {
        &mut self.items[idx]
    }

    /// First live delimiter above `bottom` (exclusive), or the very first.
    fn first_above(&self, bottom: Option<usize>) -> Option<usize> {
        let mut cur = self.top;
        let mut first = None;
        while let Some(c) = cur {
            if Some(c) == bottom {
                break;
            }
            first = Some(c);
            cur = self.items[c].prev;
        }
        first
    }
}

const LEFT_SINGLE_QUOTE: &str = "\u{2018}";
const RIGHT_SINGLE_QUOTE: &str = "\u{2019}";
const LEFT_DOUBLE_QUOTE: &str = "\u{201C}";
const RIGHT_DOUBLE_QUOTE: &str = "\u{201D}";

/// Pair openers and closers above `bottom`, wrapping matched text in
/// emphasis (or extension) nodes. All delimiters above `bottom` are removed
/// afterwards.
pub(crate) fn process_emphasis(
    doc: &mut Document,
    stack: &mut DelimiterStack,
    bottom: Option<usize>,
    extensions: &[Arc<dyn SyntaxExtension>],
) {
    // Lowest opener worth searching for each (char, can_open, len % 3).
    let mut openers_bottom: FxHashMap<(u8, bool, usize), Option<usize>> = FxHashMap::default();

    let mut closer = stack.first_above(bottom);
    while let Some(c) = closer {
        let cd = stack.get(c);
        if !cd.can_close {
            closer = stack.next(c);
            continue;
        }
        let key = (cd.ch, cd.can_open, cd.orig_len % 3);
        let search_floor = openers_bottom.get(&key).copied().unwrap_or(bottom);

        // Look back for the nearest compatible opener.
        let mut opener = stack.prev(c);
        let mut found = None;
        while let Some(o) = opener {
            if Some(o) == bottom || Some(o) == search_floor {
                break;
            }
            if is_match(stack.get(o), stack.get(c), extensions) {
                found = Some(o);
                break;
            }
            opener = stack.prev(o);
        }

        let old_closer = c;
        let ch = stack.get(c).ch;
        closer = match (ch, found) {
            (b'\'' | b'"', _) => {
                let (left, right) = if ch == b'\'' {
                    (LEFT_SINGLE_QUOTE, RIGHT_SINGLE_QUOTE)
                } else {
                    (LEFT_DOUBLE_QUOTE, RIGHT_DOUBLE_QUOTE)
                };
                set_text(doc, stack.get(c).node, right);
                let next = stack.next(c);
                if let Some(o) = found {
                    set_text(doc, stack.get(o).node, left);
                    stack.remove(old_closer);
                    stack.remove(o);
                }
                next
            }
            (_, Some(o)) => pair(doc, stack, o, c, extensions),
            (_, None) => stack.next(c),
        };

        if found.is_none() {
            // Nothing below this closer can ever match a closer of this kind.
            openers_bottom.insert(key, stack.prev(old_closer));
            if !stack.get(old_closer).can_open {
                stack.remove(old_closer);
            }
        }
    }

    while let Some(top) = stack.top() {
        if Some(top) == bottom {
            break;
        }
        stack.remove(top);
    }
}

fn is_match(opener: &Delimiter, closer: &Delimiter, extensions: &[Arc<dyn SyntaxExtension>]) -> bool {
    if !opener.can_open || opener.ch != closer.ch || opener.ext != closer.ext {
        return false;
    }
    if let Some(ext) = closer.ext {
        return extensions[ext].delimiter_node(opener.len, closer.len).is_some();
    }
    if matches!(closer.ch, b'*' | b'_') {
        // Rule of three: a run that can both open and close only pairs when
        // the combined length is not a multiple of three, unless both are.
        let odd_match = (closer.can_open || opener.can_close)
            && closer.orig_len % 3 != 0
            && (opener.orig_len + closer.orig_len) % 3 == 0;
        return !odd_match;
    }
    true
}

/// Wrap everything between a matched opener and closer. Returns the next
/// closer to look at.
fn pair(
    doc: &mut Document,
    stack: &mut DelimiterStack,
    opener: usize,
    closer: usize,
    extensions: &[Arc<dyn SyntaxExtension>],
) -> Option<usize> {
    let (opener_len, closer_len) = (stack.get(opener).len, stack.get(closer).len);
    let (used, value) = match stack.get(closer).ext {
        Some(ext) => match extensions[ext].delimiter_node(opener_len, closer_len) {
            Some(pairing) => pairing,
            None => return stack.next(closer),
        },
        None if opener_len >= 2 && closer_len >= 2 => (2, NodeValue::Strong),
        None => (1, NodeValue::Emphasis),
    };
    let used = used.clamp(1, opener_len.min(closer_len));

    let opener_node = stack.get(opener).node;
    let closer_node = stack.get(closer).node;
    stack.get_mut(opener).len -= used;
    stack.get_mut(closer).len -= used;
    shrink_text(doc, opener_node, used);
    shrink_text(doc, closer_node, used);

    // Delimiters strictly inside the pair can no longer match anything.
    let mut inner = stack.next(opener);
    while let Some(i) = inner {
        if i == closer {
            break;
        }
        inner = stack.next(i);
        stack.remove(i);
    }

    let wrapper = doc.create(value, Default::default());
    let mut cur = doc.next_sibling(opener_node);
    while let Some(n) = cur {
        if n == closer_node {
            break;
        }
        cur = doc.next_sibling(n);
        doc.append(wrapper, n);
    }
    doc.insert_after(opener_node, wrapper);

    if stack.get(opener).len == 0 {
        doc.detach(opener_node);
        stack.remove(opener);
    }
    if stack.get(closer).len == 0 {
        let next = stack.next(closer);
        doc.detach(closer_node);
        stack.remove(closer);
        next
    } else {
        Some(closer)
    }
}

fn shrink_text(doc: &mut Document, node: NodeId, by: usize) {
    if let NodeValue::Text(text) = doc.value_mut(node) {
        let keep = text.len().saturating_sub(by);
        text.truncate(keep);
    }
}

fn set_text(doc: &mut Document, node: NodeId, to: &str) {
    if let NodeValue::Text(text) = doc.value_mut(node) {
        text.clear();
        text.push_str(to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Sourcepos;

    fn text_node(doc: &mut Document, s: &str) -> NodeId {
        let root = doc.root();
        doc.append_value(root, NodeValue::Text(s.to_string()), Sourcepos::default())
    }

    #[test]
    fn stack_links_and_unlinks() {
        let mut doc = Document::new();
        let a = text_node(&mut doc, "*");
        let b = text_node(&mut doc, "_");
        let mut stack = DelimiterStack::new();
        assert!(stack.push(Delimiter::new(a, b'*', 1, true, false)));
        assert!(stack.push(Delimiter::new(b, b'_', 1, false, true)));
        assert_eq!(stack.top(), Some(1));
        assert_eq!(stack.prev(1), Some(0));
        stack.remove(1);
        assert_eq!(stack.top(), Some(0));
        assert_eq!(stack.next(0), None);
    }

    #[test]
    fn emphasis_wraps_between_runs() {
        let mut doc = Document::new();
        let open = text_node(&mut doc, "**");
        let inner = text_node(&mut doc, "x");
        let close = text_node(&mut doc, "**");
        let mut stack = DelimiterStack::new();
        stack.push(Delimiter::new(open, b'*', 2, true, false));
        stack.push(Delimiter::new(close, b'*', 2, false, true));
        process_emphasis(&mut doc, &mut stack, None, &[]);

        let root = doc.root();
        let strong = doc.first_child(root).unwrap();
        assert_eq!(doc.value(strong), &NodeValue::Strong);
        assert_eq!(doc.first_child(strong), Some(inner));
        assert_eq!(doc.next_sibling(strong), None);
        assert_eq!(stack.top(), None);
    }

    #[test]
    fn rule_of_three_blocks_pairing() {
        // `*foo**bar*`: the inner `**` can open and close, 1 + 2 is a
        // multiple of three, so it does not close the first `*`.
        let mut doc = Document::new();
        let a = text_node(&mut doc, "*");
        text_node(&mut doc, "foo");
        let b = text_node(&mut doc, "**");
        text_node(&mut doc, "bar");
        let c = text_node(&mut doc, "*");
        let mut stack = DelimiterStack::new();
        stack.push(Delimiter::new(a, b'*', 1, true, false));
        stack.push(Delimiter::new(b, b'*', 2, true, true));
        stack.push(Delimiter::new(c, b'*', 1, false, true));
        process_emphasis(&mut doc, &mut stack, None, &[]);

        let root = doc.root();
        let em = doc.first_child(root).unwrap();
        assert_eq!(doc.value(em), &NodeValue::Emphasis);
        assert_eq!(doc.text_content(em), "foo**bar");
    }
}
