//! The element wrapper.
//!
//! An [`Element`] is a cheap handle to the binding the construction hook
//! registered for one element node: the node id plus a non-owning
//! reference to the owning document. Structural relationships are queried
//! live against the engine, never cached, since the tree can change
//! underneath the wrapper.
//!
//! Once the owning document has been destroyed, every accessor returns
//! `None`. The wrapper never reads freed memory; its validity is scoped to
//! the document's lifetime by the weak reference.

use std::fmt;
use std::rc::Rc;

use crate::bridge::hook::ElementBinding;
use crate::bridge::registry;
use crate::object::document::{Document, DocumentCore};

/// An element node wrapper.
///
/// Two `Element` values are equal when they are handles to the same
/// wrapper instance — the bijection guarantees at most one wrapper per
/// node, so this is node identity.
#[derive(Clone)]
pub struct Element {
    binding: Rc<ElementBinding>,
}

impl Element {
    pub(crate) fn from_binding(binding: Rc<ElementBinding>) -> Self {
        Self { binding }
    }

    pub(crate) fn binding(&self) -> &ElementBinding {
        &self.binding
    }

    #[cfg(test)]
    pub(crate) fn binding_rc(&self) -> &Rc<ElementBinding> {
        &self.binding
    }

    fn core(&self) -> Option<Rc<DocumentCore>> {
        self.binding.doc.upgrade()
    }

    /// Returns `true` while the owning document is alive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.core().is_some()
    }

    /// Returns the element's name, or `None` once the owning document has
    /// been destroyed.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        let core = self.core()?;
        let tree = core.tree.borrow();
        tree.node_name(self.binding.id).map(str::to_string)
    }

    /// Returns the parent element, if the element is attached and its
    /// parent is an element (the root element's parent is the document
    /// container node, which is not an element).
    #[must_use]
    pub fn parent(&self) -> Option<Element> {
        let core = self.core()?;
        let tree = core.tree.borrow();
        let parent = tree.parent(self.binding.id)?;
        registry::element_binding(&tree, parent).map(Element::from_binding)
    }

    /// Resolves the owning document by walking to the tree's container
    /// node and looking up the binding stamped there.
    #[must_use]
    pub fn document(&self) -> Option<Document> {
        let core = self.core()?;
        let tree = core.tree.borrow();
        // A detached element's ancestor walk ends at the element itself;
        // its owner is still the document whose arena holds it.
        let container = tree
            .ancestors(self.binding.id)
            .find(|&id| tree.node(id).kind.is_document())
            .unwrap_or_else(|| tree.root());
        let stamp = registry::document_binding(&tree, container)?;
        let owner = stamp.doc.upgrade()?;
        drop(tree);
        Some(Document::from_core(owner))
    }

    /// Returns the root element of the tree this element participates in,
    /// resolved through the registry.
    #[must_use]
    pub fn root(&self) -> Option<Element> {
        let core = self.core()?;
        let tree = core.tree.borrow();
        let id = tree.root_element()?;
        Some(Element::from_binding(registry::expect_element_binding(
            &tree, id,
        )))
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.binding, &other.binding)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name())
            .field("valid", &self.is_valid())
            .finish()
    }
}
