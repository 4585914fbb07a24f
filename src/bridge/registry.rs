//! The tree node registry.
//!
//! Associates engine nodes with their wrapper bindings by writing the
//! binding directly into the node's reserved slot. The slot is mutated in
//! exactly two places: [`register`] (called by the construction hook) and
//! [`unregister`] / [`unregister_all`] (called by destruction cleanup).
//! Nothing else writes it.
//!
//! A double registration, or an element node found without a binding where
//! one is expected, means the bijection invariant is already broken. Both
//! are bugs in the bridge, not caller mistakes, and abort via `panic!`.

use std::any::Any;
use std::rc::Rc;

use crate::bridge::hook::{DocBinding, ElementBinding};
use crate::engine::{NodeId, Tree};

/// Records the binding for a node.
///
/// # Panics
///
/// Panics if the node already has a registered binding (bijection
/// violation).
pub(crate) fn register(tree: &mut Tree, id: NodeId, binding: Rc<dyn Any>) {
    let slot = tree.binding_slot_mut(id);
    assert!(
        slot.is_none(),
        "bijection violated: node {id:?} already has a registered wrapper"
    );
    *slot = Some(binding);
}

/// Returns the raw binding registered for a node, if any.
pub(crate) fn lookup(tree: &Tree, id: NodeId) -> Option<Rc<dyn Any>> {
    tree.binding_slot(id).clone()
}

/// Returns the element binding registered for a node, if the node has one.
pub(crate) fn element_binding(tree: &Tree, id: NodeId) -> Option<Rc<ElementBinding>> {
    lookup(tree, id).and_then(|b| b.downcast::<ElementBinding>().ok())
}

/// Returns the element binding for a node the caller has already verified
/// to be an element allocated through the bridge.
///
/// # Panics
///
/// Panics if no element binding is registered — the construction hook
/// binds every element node at allocation time, so absence means the
/// bijection invariant is broken.
pub(crate) fn expect_element_binding(tree: &Tree, id: NodeId) -> Rc<ElementBinding> {
    match element_binding(tree, id) {
        Some(binding) => binding,
        None => panic!("bijection violated: element node {id:?} has no registered wrapper"),
    }
}

/// Returns the document binding stamped on a container node.
pub(crate) fn document_binding(tree: &Tree, id: NodeId) -> Option<Rc<DocBinding>> {
    lookup(tree, id).and_then(|b| b.downcast::<DocBinding>().ok())
}

/// Clears the binding of a single node. Called only as part of node
/// destruction, never from user-facing operations.
pub(crate) fn unregister(tree: &mut Tree, id: NodeId) {
    *tree.binding_slot_mut(id) = None;
}

/// Clears every binding in the tree. Called when the owning document is
/// destroyed and the whole subtree goes away at once.
pub(crate) fn unregister_all(tree: &mut Tree) {
    let ids: Vec<NodeId> = tree.all_node_ids().collect();
    for id in ids {
        unregister(tree, id);
    }
}
