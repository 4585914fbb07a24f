//! The document wrapper.
//!
//! A [`Document`] is the wrapper object for a tree's container node. It is
//! the sole owner of the underlying arena: dropping the last `Document`
//! handle frees the whole subtree exactly once and clears every binding
//! slot, so wrapper objects for nodes in the subtree can never be used to
//! read freed memory — their accessors simply return `None` afterwards.
//!
//! Construction never builds wrappers by hand. Allocating the container
//! node (or any element) fires the process-wide construction hook, which
//! registers the binding; constructors then retrieve what the hook
//! registered. This keeps the node ↔ wrapper bijection intact regardless
//! of whether nodes come from explicit calls or from parsing.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::bridge::hook::BindingScope;
use crate::bridge::{lifecycle, registry};
use crate::encoding::decode_to_utf8;
use crate::engine::{NodeKind, Tree};
use crate::error::BindError;
use crate::object::element::Element;
use crate::{parser, serial};

/// Shared state behind a `Document` handle: the engine tree, exclusively
/// owned here.
pub(crate) struct DocumentCore {
    pub(crate) tree: RefCell<Tree>,
}

impl Drop for DocumentCore {
    fn drop(&mut self) {
        // Destruction cleanup: the subtree goes away as a whole, so every
        // binding slot is cleared with it.
        registry::unregister_all(self.tree.get_mut());
    }
}

/// An XML document.
///
/// Cloning a `Document` clones the handle, not the tree; all clones refer
/// to the same underlying document.
///
/// # Examples
///
/// ```
/// use xmlbind::Document;
///
/// let doc = Document::new();
/// assert_eq!(doc.version().as_deref(), Some("1.0"));
/// assert!(doc.root().is_none());
/// ```
#[derive(Clone)]
pub struct Document {
    core: Rc<DocumentCore>,
}

impl Document {
    /// Creates a new empty document with the default version `"1.0"` and
    /// no declared encoding.
    #[must_use]
    pub fn new() -> Self {
        Self::build(Some("1.0"), None)
    }

    /// Creates a new empty document with the given XML version.
    #[must_use]
    pub fn with_version(version: &str) -> Self {
        Self::build(Some(version), None)
    }

    /// Creates a new empty document with the given version and encoding.
    #[must_use]
    pub fn with_version_and_encoding(version: &str, encoding: &str) -> Self {
        Self::build(Some(version), Some(encoding))
    }

    fn build(version: Option<&str>, encoding: Option<&str>) -> Self {
        lifecycle::init();
        lifecycle::assert_not_shut_down();

        let core = Rc::new_cyclic(|weak: &Weak<DocumentCore>| {
            // The hook fires for the container node inside Tree::new and
            // stamps it with this document's binding.
            let _scope = BindingScope::enter(weak.clone());
            DocumentCore {
                tree: RefCell::new(Tree::new()),
            }
        });

        {
            let mut tree = core.tree.borrow_mut();
            if let Some(v) = version {
                tree.version = Some(v.to_string());
            }
            if let Some(e) = encoding {
                tree.encoding = Some(e.to_string());
            }
        }
        debug_assert!(
            registry::document_binding(&core.tree.borrow(), core.tree.borrow().root()).is_some(),
            "construction hook did not bind the container node"
        );

        Self { core }
    }

    pub(crate) fn from_core(core: Rc<DocumentCore>) -> Self {
        Self { core }
    }

    /// Parses an XML string into a document.
    ///
    /// Every node the parse allocates is bound by the construction hook
    /// before this returns; there is no window in which a node exists
    /// without its wrapper.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Parse` if the input is not well-formed XML.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmlbind::Document;
    ///
    /// let doc = Document::parse_str("<greeting>hello</greeting>").unwrap();
    /// assert_eq!(doc.root().unwrap().name().as_deref(), Some("greeting"));
    /// ```
    pub fn parse_str(input: &str) -> Result<Self, BindError> {
        let doc = Self::build(None, None);
        {
            let _scope = BindingScope::enter(Rc::downgrade(&doc.core));
            let mut tree = doc.core.tree.borrow_mut();
            parser::parse_into(&mut tree, input)?;
        }
        Ok(doc)
    }

    /// Parses raw XML bytes, detecting the encoding from the BOM or the
    /// XML declaration before parsing.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Encoding` if the bytes cannot be decoded, or
    /// `BindError::Parse` if the decoded text is not well-formed XML.
    pub fn parse_bytes(input: &[u8]) -> Result<Self, BindError> {
        let text = decode_to_utf8(input)?;
        Self::parse_str(&text)
    }

    /// Returns the document's XML version, fixed at construction.
    #[must_use]
    pub fn version(&self) -> Option<String> {
        self.core.tree.borrow().version.clone()
    }

    /// Returns the document's declared encoding, if any.
    #[must_use]
    pub fn encoding(&self) -> Option<String> {
        self.core.tree.borrow().encoding.clone()
    }

    /// Sets the document's encoding.
    ///
    /// The value is opaque — no validation against a charset list — and is
    /// consumed at serialization time as the declaration value and output
    /// encoding.
    pub fn set_encoding(&self, encoding: &str) {
        self.core.tree.borrow_mut().encoding = Some(encoding.to_string());
    }

    /// Returns the document's root element, resolved through the registry.
    ///
    /// Repeated calls return the identical wrapper instance, never a
    /// freshly built one.
    #[must_use]
    pub fn root(&self) -> Option<Element> {
        let tree = self.core.tree.borrow();
        let id = tree.root_element()?;
        Some(Element::from_binding(registry::expect_element_binding(
            &tree, id,
        )))
    }

    /// Makes `element` the document's root element.
    ///
    /// Ownership of the element's subtree transfers to this document as a
    /// side effect of the attach.
    ///
    /// # Errors
    ///
    /// - [`BindError::RootAlreadySet`] if the document already has a root
    ///   element; the document is unchanged.
    /// - [`BindError::ForeignElement`] if `element` is owned by a
    ///   different document.
    /// - [`BindError::RootCandidateAttached`] if `element` is still
    ///   attached to a parent.
    pub fn set_root(&self, element: &Element) -> Result<(), BindError> {
        let mut tree = self.core.tree.borrow_mut();
        if tree.root_element().is_some() {
            return Err(BindError::RootAlreadySet);
        }

        let same_doc = element
            .binding()
            .doc
            .upgrade()
            .is_some_and(|core| Rc::ptr_eq(&core, &self.core));
        if !same_doc {
            return Err(BindError::ForeignElement);
        }

        let id = element.binding().id;
        if tree.parent(id).is_some() {
            return Err(BindError::RootCandidateAttached);
        }

        let container = tree.root();
        tree.append_child(container, id);
        Ok(())
    }

    /// Creates a new, detached element owned by this document.
    ///
    /// The returned wrapper is the one the construction hook registered
    /// for the freshly allocated node — never a second, independent
    /// wrapper.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Usage` if `name` is not a valid XML name.
    pub fn create_element(&self, name: &str) -> Result<Element, BindError> {
        lifecycle::assert_not_shut_down();
        if !parser::is_valid_name(name) {
            return Err(BindError::Usage {
                expected: format!("createElement(name): '{name}' is not a valid element name"),
            });
        }

        let id = {
            let _scope = BindingScope::enter(Rc::downgrade(&self.core));
            self.core.tree.borrow_mut().create_node(NodeKind::Element {
                name: name.to_string(),
                attributes: Vec::new(),
            })
        };

        let tree = self.core.tree.borrow();
        Ok(Element::from_binding(registry::expect_element_binding(
            &tree, id,
        )))
    }

    /// Serializes the document to an XML string (UTF-8 text).
    ///
    /// A rootless document serializes to the XML declaration alone.
    #[must_use]
    pub fn to_xml(&self) -> String {
        serial::serialize(&self.core.tree.borrow())
    }

    /// Serializes the document to a byte buffer in its configured
    /// encoding, defaulting to UTF-8.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        serial::serialize_to_bytes(&self.core.tree.borrow())
    }

    /// Self-reference accessor: returns a handle to this document.
    #[must_use]
    pub fn document(&self) -> Document {
        self.clone()
    }

    /// Returns the number of nodes in the document's arena.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.core.tree.borrow().node_count()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("version", &self.version())
            .field("encoding", &self.encoding())
            .field("nodes", &self.node_count())
            .finish()
    }
}

/// One argument to [`new_document`], mirroring the loosely-typed call
/// shapes of the host-facing construction API.
pub enum DocumentArg {
    /// A string argument (version or encoding, by position).
    Str(String),
    /// A numeric argument. Matches no documented call shape and always
    /// produces a usage error.
    Int(i64),
    /// A completion callback, invoked synchronously with the constructed
    /// document once it is ready.
    Callback(Box<dyn FnOnce(&Document)>),
}

impl fmt::Debug for DocumentArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Constructs a document from a loosely-typed argument list.
///
/// Supported shapes: `()`, `(version)`, `(callback)`,
/// `(version, encoding)`, `(version, callback)`, and
/// `(version, encoding, callback)`. The version defaults to `"1.0"` when
/// unspecified. The callback, when present, is invoked synchronously with
/// the document before this function returns.
///
/// # Errors
///
/// Returns `BindError::Usage` naming the valid call shapes when the
/// arguments match none of them.
///
/// # Examples
///
/// ```
/// use xmlbind::{new_document, DocumentArg};
///
/// let doc = new_document(vec![
///     DocumentArg::Str("1.0".to_string()),
///     DocumentArg::Str("UTF-8".to_string()),
/// ])
/// .unwrap();
/// assert_eq!(doc.encoding().as_deref(), Some("UTF-8"));
/// ```
pub fn new_document(args: Vec<DocumentArg>) -> Result<Document, BindError> {
    use DocumentArg as A;

    let usage = |expected: &str| BindError::Usage {
        expected: expected.to_string(),
    };

    let mut it = args.into_iter();
    let (version, encoding, callback) = match (it.next(), it.next(), it.next(), it.next()) {
        (None, ..) => (None, None, None),

        (Some(A::Str(v)), None, ..) => (Some(v), None, None),
        (Some(A::Callback(cb)), None, ..) => (None, None, Some(cb)),
        (Some(_), None, ..) => {
            return Err(usage("newDocument([version]) or newDocument([callback])"));
        }

        (Some(A::Str(v)), Some(A::Str(e)), None, _) => (Some(v), Some(e), None),
        (Some(A::Str(v)), Some(A::Callback(cb)), None, _) => (Some(v), None, Some(cb)),
        (Some(_), Some(_), None, _) => {
            return Err(usage(
                "newDocument([version], [encoding]) or newDocument([version], [callback])",
            ));
        }

        (Some(A::Str(v)), Some(A::Str(e)), Some(A::Callback(cb)), None) => {
            (Some(v), Some(e), Some(cb))
        }
        _ => {
            return Err(usage("newDocument([version], [encoding], [callback])"));
        }
    };

    let doc = Document::build(
        Some(version.as_deref().unwrap_or("1.0")),
        encoding.as_deref(),
    );
    if let Some(cb) = callback {
        cb(&doc);
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::registry;

    #[test]
    fn test_container_node_is_stamped_at_construction() {
        let doc = Document::new();
        let tree = doc.core.tree.borrow();
        let stamp = registry::document_binding(&tree, tree.root()).unwrap();
        let owner = stamp.doc.upgrade().unwrap();
        assert!(Rc::ptr_eq(&owner, &doc.core));
    }

    #[test]
    fn test_parse_binds_every_element_node() {
        let doc = Document::parse_str("<a><b/><b><c/></b></a>").unwrap();
        let tree = doc.core.tree.borrow();
        for id in tree.all_node_ids() {
            if tree.node(id).kind.is_element() {
                let binding = registry::element_binding(&tree, id)
                    .expect("element node left unbound by the construction hook");
                assert_eq!(binding.id, id);
            }
        }
    }

    #[test]
    fn test_create_element_returns_hook_registered_wrapper() {
        let doc = Document::new();
        let elem = doc.create_element("item").unwrap();
        let tree = doc.core.tree.borrow();
        let registered = registry::expect_element_binding(&tree, elem.binding().id);
        assert!(Rc::ptr_eq(&registered, elem.binding_rc()));
    }

    #[test]
    fn test_non_element_nodes_stay_unbound() {
        let doc = Document::parse_str("<a>text<!-- c --></a>").unwrap();
        let tree = doc.core.tree.borrow();
        for id in tree.all_node_ids() {
            let kind = &tree.node(id).kind;
            if !kind.is_element() && !kind.is_document() {
                assert!(registry::lookup(&tree, id).is_none());
            }
        }
    }
}
