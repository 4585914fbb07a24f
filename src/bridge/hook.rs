//! The construction hook.
//!
//! The engine invokes [`on_node_constructed`] synchronously, on the
//! allocating thread, for every node it allocates — explicit construction
//! calls and nodes built internally during parsing alike. The hook
//! dispatches on the node kind: document nodes get a [`DocBinding`] stamp,
//! element nodes get an [`ElementBinding`], other node kinds stay unbound
//! (their structural queries degrade to "no wrapper").
//!
//! The hook needs to know which document the node being allocated belongs
//! to. That context is carried in a thread-local [`BindingScope`]: every
//! wrapper-layer operation that can allocate nodes enters a scope naming
//! its document before touching the engine. Allocations made outside any
//! scope (engine used standalone) are left unbound.
//!
//! The hook never returns an error into the engine's allocation path. The
//! only failure it can hit — a node that already has a binding — is a
//! broken bijection and aborts via the registry's panic.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::bridge::registry;
use crate::engine::{NodeId, Tree};
use crate::object::document::DocumentCore;

/// The binding stamped on a document container node. Lets structural walks
/// resolve the owning `Document` wrapper through the registry.
pub(crate) struct DocBinding {
    pub(crate) doc: Weak<DocumentCore>,
}

/// The binding registered for an element node. Element wrappers are cheap
/// handles to one of these; wrapper identity is `Rc` pointer identity.
pub(crate) struct ElementBinding {
    /// Non-owning reference to the owning document. The binding must not
    /// keep the document alive: it is a lookup aid, not ownership.
    pub(crate) doc: Weak<DocumentCore>,
    /// The node this binding wraps. Stable for the life of the tree.
    pub(crate) id: NodeId,
}

thread_local! {
    static CURRENT_OWNER: RefCell<Option<Weak<DocumentCore>>> = const { RefCell::new(None) };
}

/// RAII guard naming the document that owns nodes allocated on this thread
/// while the guard lives.
pub(crate) struct BindingScope {
    prev: Option<Weak<DocumentCore>>,
}

impl BindingScope {
    pub(crate) fn enter(owner: Weak<DocumentCore>) -> Self {
        let prev = CURRENT_OWNER.with(|cell| cell.borrow_mut().replace(owner));
        Self { prev }
    }
}

impl Drop for BindingScope {
    fn drop(&mut self) {
        CURRENT_OWNER.with(|cell| {
            *cell.borrow_mut() = self.prev.take();
        });
    }
}

fn current_owner() -> Option<Weak<DocumentCore>> {
    CURRENT_OWNER.with(|cell| cell.borrow().clone())
}

/// The process-wide construction callback, installed once by
/// [`crate::bridge::lifecycle::init`].
pub(crate) fn on_node_constructed(tree: &mut Tree, id: NodeId) {
    let Some(owner) = current_owner() else {
        return;
    };
    let kind = &tree.node(id).kind;
    if kind.is_document() {
        registry::register(tree, id, Rc::new(DocBinding { doc: owner }));
    } else if kind.is_element() {
        registry::register(tree, id, Rc::new(ElementBinding { doc: owner, id }));
    }
}
