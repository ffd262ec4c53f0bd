//! The document tree.
//!
//! Nodes live in a single arena owned by [`Document`] and refer to each other
//! by [`NodeId`]. Parent, sibling and child links are plain indices, so the
//! tree has no ownership cycles and is dropped wholesale with the document.

use std::num::NonZeroU32;

use crate::node::{NodeValue, Sourcepos};

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    fn new(index: usize) -> Self {
        let raw = u32::try_from(index + 1).unwrap_or(u32::MAX);
        Self(NonZeroU32::MIN.saturating_add(raw - 1))
    }

    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

/// A node and its links.
#[derive(Debug, Clone)]
pub struct Node {
    pub value: NodeValue,
    pub sourcepos: Sourcepos,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
    /// Parse-time: may still accept lines.
    pub(crate) open: bool,
    /// Parse-time: the last line added to this block was blank.
    pub(crate) last_line_blank: bool,
    /// Parse-time: raw text of leaf blocks awaiting inline resolution.
    pub(crate) content: String,
}

impl Node {
    fn new(value: NodeValue, sourcepos: Sourcepos) -> Self {
        Self {
            value,
            sourcepos,
            parent: None,
            first_child: None,
            last_child: None,
            prev: None,
            next: None,
            open: true,
            last_line_blank: false,
            content: String::new(),
        }
    }
}

/// Traversal event, see [`Document::traverse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Enter(NodeId),
    Exit(NodeId),
}

/// A parsed Markdown document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only the root node.
    pub fn new() -> Self {
        let root = Node::new(NodeValue::Document, Sourcepos::new(1, 1, 1, 0));
        Self { nodes: vec![root] }
    }

    /// The root `Document` node.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    /// Number of nodes in the arena, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && self.nodes[0].first_child.is_none()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[inline]
    pub fn value(&self, id: NodeId) -> &NodeValue {
        &self.nodes[id.index()].value
    }

    #[inline]
    pub fn value_mut(&mut self, id: NodeId) -> &mut NodeValue {
        &mut self.nodes[id.index()].value
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[inline]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    #[inline]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    #[inline]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next
    }

    #[inline]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev
    }

    /// Children of `id` in document order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// `id` and all of its descendants, pre-order.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.traverse_from(id).filter_map(|ev| match ev {
            Event::Enter(n) => Some(n),
            Event::Exit(_) => None,
        })
    }

    /// Enter/exit events over the whole tree.
    pub fn traverse(&self) -> Traverse<'_> {
        self.traverse_from(self.root())
    }

    /// Enter/exit events over the subtree rooted at `id`.
    pub fn traverse_from(&self, id: NodeId) -> Traverse<'_> {
        Traverse {
            doc: self,
            root: id,
            next: Some(Event::Enter(id)),
        }
    }

    /// Create a detached node.
    pub fn create(&mut self, value: NodeValue, sourcepos: Sourcepos) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::new(value, sourcepos));
        id
    }

    /// Create a node and append it as the last child of `parent`.
    pub fn append_value(&mut self, parent: NodeId, value: NodeValue, sourcepos: Sourcepos) -> NodeId {
        let id = self.create(value, sourcepos);
        self.append(parent, id);
        id
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let last = self.node(parent).last_child;
        {
            let c = self.node_mut(child);
            c.parent = Some(parent);
            c.prev = last;
        }
        match last {
            Some(last) => self.node_mut(last).next = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.node_mut(parent).last_child = Some(child);
    }

    /// Insert `node` directly before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, node: NodeId) {
        self.detach(node);
        let parent = self.node(sibling).parent;
        let prev = self.node(sibling).prev;
        {
            let n = self.node_mut(node);
            n.parent = parent;
            n.prev = prev;
            n.next = Some(sibling);
        }
        self.node_mut(sibling).prev = Some(node);
        match prev {
            Some(prev) => self.node_mut(prev).next = Some(node),
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).first_child = Some(node);
                }
            }
        }
    }

    /// Insert `node` directly after `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, node: NodeId) {
        self.detach(node);
        let parent = self.node(sibling).parent;
        let next = self.node(sibling).next;
        {
            let n = self.node_mut(node);
            n.parent = parent;
            n.prev = Some(sibling);
            n.next = next;
        }
        self.node_mut(sibling).next = Some(node);
        match next {
            Some(next) => self.node_mut(next).prev = Some(node),
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).last_child = Some(node);
                }
            }
        }
    }

    /// Unlink `id` from its parent and siblings. Its own children stay attached.
    pub fn detach(&mut self, id: NodeId) {
        let (parent, prev, next) = {
            let n = self.node(id);
            (n.parent, n.prev, n.next)
        };
        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).first_child = next;
                }
            }
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => {
                if let Some(parent) = parent {
                    self.node_mut(parent).last_child = prev;
                }
            }
        }
        let n = self.node_mut(id);
        n.parent = None;
        n.prev = None;
        n.next = None;
    }

    /// Concatenated literal text of all descendants, used for image alt text.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for n in self.descendants(id) {
            match self.value(n) {
                NodeValue::Text(s) | NodeValue::Code(s) | NodeValue::RawHtml(s) => out.push_str(s),
                NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
                NodeValue::Custom { literal, .. } => out.push_str(literal),
                _ => {}
            }
        }
        out
    }

    /// Depth of `id` below the root.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            depth += 1;
            cur = self.parent(p);
        }
        depth
    }
}

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = self.doc.next_sibling(cur);
        Some(cur)
    }
}

/// Pre-order enter/exit walk of a subtree.
pub struct Traverse<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<Event>,
}

impl Iterator for Traverse<'_> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        let cur = self.next?;
        self.next = match cur {
            Event::Enter(id) => match self.doc.first_child(id) {
                Some(child) => Some(Event::Enter(child)),
                None => Some(Event::Exit(id)),
            },
            Event::Exit(id) if id == self.root => None,
            Event::Exit(id) => match self.doc.next_sibling(id) {
                Some(sib) => Some(Event::Enter(sib)),
                None => self.doc.parent(id).map(Event::Exit),
            },
        };
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> NodeValue {
        NodeValue::Text(s.to_string())
    }

    #[test]
    fn append_keeps_order_and_parent() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.append_value(root, NodeValue::Paragraph, Sourcepos::default());
        let a = doc.append_value(p, text("a"), Sourcepos::default());
        let b = doc.append_value(p, text("b"), Sourcepos::default());
        assert_eq!(doc.children(p).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(doc.parent(a), Some(p));
        assert_eq!(doc.parent(p), Some(root));
        assert_eq!(doc.depth(b), 2);
    }

    #[test]
    fn insert_and_detach() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = doc.append_value(root, text("a"), Sourcepos::default());
        let c = doc.append_value(root, text("c"), Sourcepos::default());
        let b = doc.create(text("b"), Sourcepos::default());
        doc.insert_after(a, b);
        let z = doc.create(text("z"), Sourcepos::default());
        doc.insert_before(a, z);
        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![z, a, b, c]);

        doc.detach(z);
        doc.detach(c);
        assert_eq!(doc.children(root).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(doc.first_child(root), Some(a));
        assert_eq!(doc.last_child(root), Some(b));
        assert_eq!(doc.parent(c), None);
    }

    #[test]
    fn traverse_emits_balanced_events() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.append_value(root, NodeValue::Paragraph, Sourcepos::default());
        let em = doc.append_value(p, NodeValue::Emphasis, Sourcepos::default());
        let t = doc.append_value(em, text("x"), Sourcepos::default());
        let events: Vec<_> = doc.traverse().collect();
        assert_eq!(
            events,
            vec![
                Event::Enter(root),
                Event::Enter(p),
                Event::Enter(em),
                Event::Enter(t),
                Event::Exit(t),
                Event::Exit(em),
                Event::Exit(p),
                Event::Exit(root),
            ]
        );
    }

    #[test]
    fn traverse_from_stays_in_subtree() {
        let mut doc = Document::new();
        let root = doc.root();
        let p1 = doc.append_value(root, NodeValue::Paragraph, Sourcepos::default());
        doc.append_value(root, NodeValue::Paragraph, Sourcepos::default());
        let events: Vec<_> = doc.traverse_from(p1).collect();
        assert_eq!(events, vec![Event::Enter(p1), Event::Exit(p1)]);
    }

    #[test]
    fn text_content_flattens() {
        let mut doc = Document::new();
        let root = doc.root();
        let img = doc.append_value(root, NodeValue::Image(Default::default()), Sourcepos::default());
        doc.append_value(img, text("foo "), Sourcepos::default());
        let em = doc.append_value(img, NodeValue::Emphasis, Sourcepos::default());
        doc.append_value(em, text("bar"), Sourcepos::default());
        assert_eq!(doc.text_content(img), "foo bar");
    }
}
