//! # xmlbind
//!
//! A host object-model binding layered over an arena-based XML tree
//! engine. Application code manipulates XML structure through ordinary
//! [`Document`] and [`Element`] wrapper objects while the engine retains
//! sole authority over node storage, parsing, and serialization.
//!
//! The core guarantee is the node ↔ wrapper bijection: a process-wide
//! construction hook fires for every node the engine allocates — whether
//! by explicit API call or as a byproduct of parsing — and eagerly
//! registers exactly one wrapper binding per node. Every structural query
//! resolves through that registry, so the same logical node is never
//! represented by two wrapper instances.
//!
//! ## Quick Start
//!
//! ```
//! use xmlbind::Document;
//!
//! let doc = Document::new();
//! let root = doc.create_element("greeting").unwrap();
//! doc.set_root(&root).unwrap();
//! assert!(doc.to_xml().contains("<greeting/>"));
//! ```

pub mod bridge;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod object;
pub mod parser;
pub mod serial;

// Re-export primary types at the crate root for convenience.
pub use bridge::lifecycle::{init, shutdown};
pub use error::{BindError, ParseError};
pub use object::{new_document, Document, DocumentArg, Element};
