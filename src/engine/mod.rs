//! Arena-based XML tree engine.
//!
//! The engine owns every node of a document tree in a contiguous
//! `Vec<NodeData>` and hands out `NodeId` handles — newtypes over
//! `NonZeroU32`. Navigation links (parent, first\_child, last\_child,
//! next\_sibling, prev\_sibling) are arena indices, so there are no
//! reference cycles and dropping the `Tree` frees the whole subtree at
//! once.
//!
//! # The binding slot
//!
//! Every node carries one engine-managed slot for an opaque back-reference
//! to a host-side wrapper (`Option<Rc<dyn Any>>`, the moral equivalent of
//! libxml2's `_private` pointer). The engine never inspects the slot; it is
//! written only by the construction hook and by destruction cleanup. This
//! makes node → wrapper lookup O(1) with no side table.
//!
//! # The construction hook
//!
//! A process-wide callback can be registered once via
//! [`register_construct_hook`]. The engine invokes it synchronously for
//! every node it allocates — explicit [`Tree::create_node`] calls and nodes
//! built internally by the parser alike — immediately after the node
//! exists and before control returns to the caller. There is therefore no
//! window in which a node is observable without its wrapper.

mod node;

pub use node::{Attribute, NodeKind};

use std::any::Any;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::sync::OnceLock;

/// A typed index into the tree's node arena.
///
/// `NodeId` is a newtype over `NonZeroU32`, so `Option<NodeId>` is the same
/// size as `NodeId` (niche optimization). A `NodeId` is stable for the
/// lifetime of its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw arena index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    /// Returns the raw index as a `usize` for indexing into the arena.
    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// The opaque per-node wrapper back-reference.
///
/// The engine reserves this slot for the bridge layer and guarantees it is
/// never reused while the node lives.
pub type BindingSlot = Option<Rc<dyn Any>>;

/// Storage for a single node in the arena.
#[derive(Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Parent node, if any. The document container node has no parent.
    pub parent: Option<NodeId>,
    /// First child node.
    pub first_child: Option<NodeId>,
    /// Last child node (for O(1) append).
    pub last_child: Option<NodeId>,
    /// Next sibling.
    pub next_sibling: Option<NodeId>,
    /// Previous sibling.
    pub prev_sibling: Option<NodeId>,
    binding: BindingSlot,
}

impl std::fmt::Debug for NodeData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The binding slot is opaque; report only its occupancy.
        f.debug_struct("NodeData")
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("first_child", &self.first_child)
            .field("last_child", &self.last_child)
            .field("next_sibling", &self.next_sibling)
            .field("prev_sibling", &self.prev_sibling)
            .field("bound", &self.binding.is_some())
            .finish()
    }
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            next_sibling: None,
            prev_sibling: None,
            binding: None,
        }
    }
}

/// The process-wide node construction callback.
///
/// Invoked with the tree and the freshly allocated node. The callback must
/// not unwind back into the engine for recoverable conditions; a panic here
/// is treated as programming-fatal.
pub type ConstructHook = fn(&mut Tree, NodeId);

static CONSTRUCT_HOOK: OnceLock<ConstructHook> = OnceLock::new();

/// Registers the process-wide construction hook.
///
/// Only the first registration takes effect; the hook stays installed for
/// the life of the process. Returns `false` if a hook was already
/// installed.
pub fn register_construct_hook(hook: ConstructHook) -> bool {
    CONSTRUCT_HOOK.set(hook).is_ok()
}

fn fire_construct_hook(tree: &mut Tree, id: NodeId) {
    if let Some(hook) = CONSTRUCT_HOOK.get() {
        hook(tree, id);
    }
}

/// An XML document tree.
///
/// The `Tree` owns all nodes in an arena and provides navigation and
/// mutation primitives. Document-level bookkeeping (version, encoding)
/// lives here so the serializer can emit the XML declaration.
#[derive(Debug)]
pub struct Tree {
    /// The node arena. Index 0 is unused (placeholder for `NonZeroU32`).
    nodes: Vec<NodeData>,
    /// The document container node id.
    root: NodeId,
    /// XML version (e.g., "1.0"), fixed when the tree is created or parsed.
    pub version: Option<String>,
    /// Declared encoding (e.g., "UTF-8"). Mutable at any time; consumed at
    /// serialization time as the declaration value and output encoding.
    pub encoding: Option<String>,
}

impl Tree {
    /// Creates a new empty tree containing only the document container
    /// node. The construction hook fires for that node before this returns.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(16);
        // Index 0: placeholder (NodeId uses NonZeroU32)
        nodes.push(NodeData::new(NodeKind::Document));
        // Index 1: the document container node
        nodes.push(NodeData::new(NodeKind::Document));
        let root = NodeId::from_index(1);
        let mut tree = Self {
            nodes,
            root,
            version: None,
            encoding: None,
        };
        fire_construct_hook(&mut tree, root);
        tree
    }

    /// Creates a new empty tree with the given XML version.
    #[must_use]
    pub fn with_version(version: &str) -> Self {
        let mut tree = Self::new();
        tree.version = Some(version.to_string());
        tree
    }

    /// Returns the document container node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the root element of the tree (the single top-level element),
    /// or `None` if the tree has no element children yet.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .find(|&id| self.node(id).kind.is_element())
    }

    /// Returns a reference to the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a valid node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the binding slot of a node.
    pub(crate) fn binding_slot(&self, id: NodeId) -> &BindingSlot {
        &self.nodes[id.as_index()].binding
    }

    /// Returns the binding slot of a node for mutation. Written only by the
    /// registry (hook insert, destruction cleanup).
    pub(crate) fn binding_slot_mut(&mut self, id: NodeId) -> &mut BindingSlot {
        &mut self.nodes[id.as_index()].binding
    }

    /// Returns the name of a node, if applicable.
    ///
    /// Elements and PIs have names; other node kinds return `None`.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { name, .. }
            | NodeKind::ProcessingInstruction { target: name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the concatenated text content of a node and its descendants.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut result = String::new();
        self.collect_text(id, &mut result);
        result
    }

    fn collect_text(&self, id: NodeId, buf: &mut String) {
        match &self.node(id).kind {
            NodeKind::Text { content } | NodeKind::CData { content } => {
                buf.push_str(content);
            }
            _ => {
                for child in self.children(id) {
                    self.collect_text(child, buf);
                }
            }
        }
    }

    /// Returns the value of an attribute by name on an element node.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.value.as_str()),
            _ => None,
        }
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns an iterator over a node and its ancestors up to the
    /// document container node.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    // --- Mutation ---

    /// Allocates a new node in the arena and returns its `NodeId`.
    ///
    /// The construction hook fires for the node before this returns, so a
    /// wrapper exists (where the bridge defines one for this node kind) by
    /// the time the caller sees the id.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind));
        let id = NodeId::from_index(index);
        fire_construct_hook(self, id);
        id
    }

    /// Appends a child node to the end of a parent's child list.
    ///
    /// # Panics
    ///
    /// Panics (debug builds) if `child` already has a parent. Detach it
    /// first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(
            self.node(child).parent.is_none(),
            "child already has a parent; detach it first"
        );

        self.node_mut(child).parent = Some(parent);

        if let Some(last) = self.node(parent).last_child {
            self.node_mut(last).next_sibling = Some(child);
            self.node_mut(child).prev_sibling = Some(last);
            self.node_mut(parent).last_child = Some(child);
        } else {
            self.node_mut(parent).first_child = Some(child);
            self.node_mut(parent).last_child = Some(child);
        }
    }

    /// Detaches a node from its parent. The node stays allocated in the
    /// arena but becomes unreachable from the container node.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };

        let prev = self.node(id).prev_sibling;
        let next = self.node(id).next_sibling;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }

        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        self.node_mut(id).parent = None;
        self.node_mut(id).prev_sibling = None;
        self.node_mut(id).next_sibling = None;
    }

    /// Returns the total number of nodes in the arena (excluding the
    /// placeholder at index 0).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Returns an iterator over every valid `NodeId` in the arena, in
    /// allocation order. Used by destruction cleanup.
    pub(crate) fn all_node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (1..self.nodes.len()).map(NodeId::from_index)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.node(current).next_sibling;
        Some(current)
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.node(current).parent;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elem(tree: &mut Tree, name: &str) -> NodeId {
        tree.create_node(NodeKind::Element {
            name: name.to_string(),
            attributes: vec![],
        })
    }

    fn text(tree: &mut Tree, content: &str) -> NodeId {
        tree.create_node(NodeKind::Text {
            content: content.to_string(),
        })
    }

    #[test]
    fn test_new_tree_has_container_node() {
        let tree = Tree::new();
        assert!(tree.node(tree.root()).kind.is_document());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.root_element(), None);
    }

    #[test]
    fn test_with_version() {
        let tree = Tree::with_version("1.0");
        assert_eq!(tree.version.as_deref(), Some("1.0"));
        assert_eq!(tree.encoding, None);
    }

    #[test]
    fn test_create_and_append_element() {
        let mut tree = Tree::new();
        let root = tree.root();
        let item = elem(&mut tree, "item");
        tree.append_child(root, item);

        assert_eq!(tree.first_child(root), Some(item));
        assert_eq!(tree.last_child(root), Some(item));
        assert_eq!(tree.parent(item), Some(root));
        assert_eq!(tree.node_name(item), Some("item"));
        assert_eq!(tree.root_element(), Some(item));
    }

    #[test]
    fn test_sibling_chain() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = text(&mut tree, "A");
        let b = text(&mut tree, "B");
        let c = text(&mut tree, "C");
        tree.append_child(root, a);
        tree.append_child(root, b);
        tree.append_child(root, c);

        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.next_sibling(b), Some(c));
        assert_eq!(tree.next_sibling(c), None);
        assert_eq!(tree.prev_sibling(c), Some(b));
        assert_eq!(tree.prev_sibling(a), None);
        let children: Vec<NodeId> = tree.children(root).collect();
        assert_eq!(children, vec![a, b, c]);
    }

    #[test]
    fn test_detach_middle_child() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = text(&mut tree, "A");
        let b = text(&mut tree, "B");
        let c = text(&mut tree, "C");
        tree.append_child(root, a);
        tree.append_child(root, b);
        tree.append_child(root, c);

        tree.detach(b);

        let children: Vec<NodeId> = tree.children(root).collect();
        assert_eq!(children, vec![a, c]);
        assert_eq!(tree.parent(b), None);
        assert_eq!(tree.next_sibling(a), Some(c));
        assert_eq!(tree.prev_sibling(c), Some(a));
    }

    #[test]
    fn test_detach_only_child_clears_links() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = text(&mut tree, "A");
        tree.append_child(root, a);
        tree.detach(a);

        assert_eq!(tree.first_child(root), None);
        assert_eq!(tree.last_child(root), None);
    }

    #[test]
    fn test_detach_without_parent_is_noop() {
        let mut tree = Tree::new();
        let orphan = text(&mut tree, "orphan");
        tree.detach(orphan);
        assert_eq!(tree.parent(orphan), None);
    }

    #[test]
    fn test_ancestors_walk_to_container() {
        let mut tree = Tree::new();
        let root = tree.root();
        let outer = elem(&mut tree, "outer");
        let inner = elem(&mut tree, "inner");
        tree.append_child(root, outer);
        tree.append_child(outer, inner);

        let ancestors: Vec<NodeId> = tree.ancestors(inner).collect();
        assert_eq!(ancestors, vec![inner, outer, root]);
    }

    #[test]
    fn test_text_content_concatenates_descendants() {
        let mut tree = Tree::new();
        let root = tree.root();
        let p = elem(&mut tree, "p");
        let t1 = text(&mut tree, "hello ");
        let b = elem(&mut tree, "b");
        let t2 = text(&mut tree, "world");
        tree.append_child(root, p);
        tree.append_child(p, t1);
        tree.append_child(p, b);
        tree.append_child(b, t2);

        assert_eq!(tree.text_content(p), "hello world");
    }

    #[test]
    fn test_attribute_lookup() {
        let mut tree = Tree::new();
        let item = tree.create_node(NodeKind::Element {
            name: "item".to_string(),
            attributes: vec![
                Attribute {
                    name: "id".to_string(),
                    value: "4".to_string(),
                },
                Attribute {
                    name: "lang".to_string(),
                    value: "en".to_string(),
                },
            ],
        });

        assert_eq!(tree.attribute(item, "id"), Some("4"));
        assert_eq!(tree.attribute(item, "lang"), Some("en"));
        assert_eq!(tree.attribute(item, "missing"), None);
    }

    #[test]
    fn test_binding_slot_starts_empty() {
        // Engine-level trees built outside a bridge binding scope carry no
        // wrapper in the slot.
        let mut tree = Tree::new();
        let item = elem(&mut tree, "item");
        assert!(tree.binding_slot(item).is_none());
    }

    #[test]
    fn test_root_element_skips_non_elements() {
        let mut tree = Tree::new();
        let root = tree.root();
        let comment = tree.create_node(NodeKind::Comment {
            content: "prolog".to_string(),
        });
        let item = elem(&mut tree, "item");
        tree.append_child(root, comment);
        tree.append_child(root, item);

        assert_eq!(tree.root_element(), Some(item));
    }

    #[test]
    fn test_node_count_tracks_allocations() {
        let mut tree = Tree::new();
        assert_eq!(tree.node_count(), 1);
        let a = elem(&mut tree, "a");
        assert_eq!(tree.node_count(), 2);
        let root = tree.root();
        tree.append_child(root, a);
        // Appending does not allocate
        assert_eq!(tree.node_count(), 2);
    }
}
