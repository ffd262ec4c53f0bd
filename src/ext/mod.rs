//! Syntax extensions.
//!
//! An extension is a [`SyntaxExtension`] implementor with up to three
//! surfaces: a block matcher consulted at a fixed precedence slot while
//! lines are consumed, inline trigger characters with a matcher consulted by
//! the inline scanner, and a renderer for the node kinds it owns.
//!
//! Extensions are registered once in an [`ExtensionRegistry`] and attached
//! by name to individual parses. A registry is immutable once shared, so
//! many parses may read it concurrently.
//!
//! When two attached extensions claim the same inline trigger character,
//! the one registered first wins. The other never sees that character.

mod autolink;
mod footnotes;
mod strikethrough;
mod table;
mod tagfilter;
mod tasklist;

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use crate::Options;
use crate::block::BlockContext;
use crate::error::{RegistryError, Result};
use crate::inline::InlineContext;
use crate::node::{CORE_KINDS, NodeValue};
use crate::render::RenderContext;
use crate::tree::{Document, NodeId};

pub use autolink::Autolink;
pub use footnotes::Footnotes;
pub use strikethrough::Strikethrough;
pub use table::Table;
pub use tagfilter::TagFilter;
pub use tasklist::TaskList;

/// Where an extension's block matcher runs among the core block starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPrecedence {
    /// Before block quotes, ahead of every core block start.
    First,
    /// After thematic breaks, before list items.
    BeforeListItem,
    /// After indented code, when no core block start matched.
    Last,
}

/// Result of an inline trigger match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineMatch {
    /// `len` bytes become `value`.
    Node { value: NodeValue, len: usize },
    /// `len` bytes become a link to `url`, with those bytes as its text.
    Link { url: String, len: usize },
    /// A delimiter run of `len` bytes, paired later through
    /// [`SyntaxExtension::delimiter_node`].
    Delimiter {
        len: usize,
        can_open: bool,
        can_close: bool,
    },
}

/// A pluggable syntax handler. Every method has a no-op default, so an
/// extension implements only the surfaces it needs.
pub trait SyntaxExtension: Send + Sync {
    /// Registry name, e.g. `"table"`.
    fn name(&self) -> &'static str;

    /// Node kinds (see [`NodeValue::kind_name`]) this extension renders.
    fn node_kinds(&self) -> &'static [&'static str] {
        &[]
    }

    fn block_precedence(&self) -> BlockPrecedence {
        BlockPrecedence::Last
    }

    /// Try to open a block on the current line. Returns the new innermost
    /// container when something was opened.
    fn open_block(&self, _ctx: &mut BlockContext<'_>) -> Result<Option<NodeId>> {
        Ok(None)
    }

    /// Whether the current line continues `node`, an open block of a kind
    /// this extension owns. May consume a line prefix.
    fn continue_block(&self, _ctx: &mut BlockContext<'_>, _node: NodeId) -> bool {
        false
    }

    /// Whether an owned block collects raw lines like a paragraph does.
    fn accepts_lines(&self, _value: &NodeValue) -> bool {
        false
    }

    /// Called when an owned block is closed.
    fn close_block(&self, _doc: &mut Document, _node: NodeId) {}

    /// Bytes that hand control to [`SyntaxExtension::match_inline`].
    fn inline_triggers(&self) -> &'static [u8] {
        &[]
    }

    fn match_inline(&self, _ctx: &InlineContext<'_>, _trigger: u8) -> Option<InlineMatch> {
        None
    }

    /// Whether the trigger bytes form emphasis-like delimiter runs. Such
    /// bytes are looked past when deciding whether any other delimiter run
    /// is left- or right-flanking.
    fn is_emphasis_like(&self) -> bool {
        false
    }

    /// Pair an opener and closer run of this extension's delimiter.
    /// Returns how many characters each side gives up and the node that
    /// wraps the text between them.
    fn delimiter_node(&self, _opener_len: usize, _closer_len: usize) -> Option<(usize, NodeValue)> {
        None
    }

    /// Interpret `[label]` that matched no link. `label` is the raw text
    /// between the brackets.
    fn resolve_bracket(&self, _ctx: &InlineContext<'_>, _label: &[u8]) -> Option<NodeValue> {
        None
    }

    /// Rewrite the finished tree.
    fn postprocess(&self, _doc: &mut Document, _options: &Options) {}

    /// Render an owned node. Called on enter and on exit.
    fn render(&self, _ctx: &mut RenderContext<'_>, _node: NodeId, _entering: bool) {}

    /// Write trailing inline content into the last paragraph of an owned
    /// container, before `</p>`.
    fn render_paragraph_tail(&self, _ctx: &mut RenderContext<'_>, _container: NodeId) {}

    /// Filter raw HTML before it is written unescaped.
    fn filter_html<'h>(&self, html: &'h str) -> Cow<'h, str> {
        Cow::Borrowed(html)
    }
}

/// An ordered set of named extensions.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Arc<dyn SyntaxExtension>>,
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ExtensionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the six GFM extensions, in the order
    /// table, strikethrough, autolink, tagfilter, tasklist, footnotes.
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        let core: [Arc<dyn SyntaxExtension>; 6] = [
            Arc::new(Table),
            Arc::new(Strikethrough),
            Arc::new(Autolink),
            Arc::new(TagFilter),
            Arc::new(TaskList),
            Arc::new(Footnotes),
        ];
        for ext in core {
            registry.extensions.push(ext);
        }
        registry
    }

    /// Add an extension. Names must be unique, and every node kind the
    /// extension renders must be new and not a core kind.
    pub fn register(&mut self, extension: Arc<dyn SyntaxExtension>) -> Result<(), RegistryError> {
        let name = extension.name();
        if self.find(name).is_some() {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        for kind in extension.node_kinds() {
            if CORE_KINDS.contains(kind) {
                return Err(RegistryError::CoreKind {
                    extension: name.to_string(),
                    kind: kind.to_string(),
                });
            }
            if let Some(owner) = self.owner_of_kind(kind) {
                return Err(RegistryError::KindClaimed {
                    extension: name.to_string(),
                    kind: kind.to_string(),
                    owner: owner.name().to_string(),
                });
            }
        }
        tracing::debug!(extension = name, "registered syntax extension");
        self.extensions.push(extension);
        Ok(())
    }

    /// Look up an extension by name.
    pub fn find(&self, name: &str) -> Option<&Arc<dyn SyntaxExtension>> {
        self.extensions.iter().find(|e| e.name() == name)
    }

    /// Registration index of `name`.
    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.extensions.iter().position(|e| e.name() == name)
    }

    /// Resolve a list of names to extensions, in registration order.
    pub fn resolve(&self, names: &[&str]) -> Result<Vec<Arc<dyn SyntaxExtension>>> {
        let mut found = Vec::with_capacity(names.len());
        for name in names {
            let idx = self
                .position(name)
                .ok_or_else(|| crate::Error::UnknownExtension(name.to_string()))?;
            if !found.contains(&idx) {
                found.push(idx);
            }
        }
        found.sort_unstable();
        Ok(found.into_iter().map(|i| Arc::clone(&self.extensions[i])).collect())
    }

    fn owner_of_kind(&self, kind: &str) -> Option<&Arc<dyn SyntaxExtension>> {
        self.extensions.iter().find(|e| e.node_kinds().contains(&kind))
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.extensions.iter().map(|e| e.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SyntaxExtension>> {
        self.extensions.iter()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

/// The process-wide registry of core extensions, built on first use.
pub fn core_registry() -> &'static Arc<ExtensionRegistry> {
    static CORE: OnceLock<Arc<ExtensionRegistry>> = OnceLock::new();
    CORE.get_or_init(|| Arc::new(ExtensionRegistry::with_core()))
}

/// The attached extension that renders `value`, if any.
pub(crate) fn owner<'e>(
    extensions: &'e [Arc<dyn SyntaxExtension>],
    value: &NodeValue,
) -> Option<&'e Arc<dyn SyntaxExtension>> {
    let kind = value.kind_name();
    extensions.iter().find(|e| e.node_kinds().contains(&kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, &'static [&'static str]);

    impl SyntaxExtension for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn node_kinds(&self) -> &'static [&'static str] {
            self.1
        }
    }

    #[test]
    fn core_registry_order() {
        let names: Vec<_> = core_registry().names().collect();
        assert_eq!(
            names,
            ["table", "strikethrough", "autolink", "tagfilter", "tasklist", "footnotes"]
        );
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut registry = ExtensionRegistry::with_core();
        let err = registry.register(Arc::new(Named("table", &[]))).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateName("table".into()));
    }

    #[test]
    fn claimed_and_core_kinds_rejected() {
        let mut registry = ExtensionRegistry::with_core();
        let err = registry
            .register(Arc::new(Named("mytable", &["table_cell"])))
            .unwrap_err();
        assert!(matches!(err, RegistryError::KindClaimed { ref owner, .. } if owner == "table"));

        let err = registry.register(Arc::new(Named("para", &["paragraph"]))).unwrap_err();
        assert!(matches!(err, RegistryError::CoreKind { .. }));

        assert!(registry.register(Arc::new(Named("mark", &["mark"]))).is_ok());
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn resolve_uses_registration_order() {
        let registry = ExtensionRegistry::with_core();
        let exts = registry.resolve(&["footnotes", "table", "table"]).unwrap();
        let names: Vec<_> = exts.iter().map(|e| e.name()).collect();
        assert_eq!(names, ["table", "footnotes"]);
    }

    #[test]
    fn resolve_unknown_name() {
        let registry = ExtensionRegistry::with_core();
        let Err(err) = registry.resolve(&["emoji"]) else {
            panic!("resolving an unregistered name should fail");
        };
        assert!(matches!(err, crate::Error::UnknownExtension(ref n) if n == "emoji"));
    }
}
