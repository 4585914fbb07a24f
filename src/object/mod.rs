//! The wrapper object surface.
//!
//! [`Document`] and [`Element`] are the host-facing objects exposing typed
//! operations over engine tree nodes. A `Document` owns its tree's arena;
//! an `Element` is a cheap handle holding the binding the construction
//! hook registered for its node plus a non-owning reference to the owning
//! document, so element validity is naturally scoped to document lifetime.

pub mod document;
pub mod element;

pub use document::{new_document, Document, DocumentArg};
pub use element::Element;
