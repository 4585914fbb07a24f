//! Node type definitions.
//!
//! The `NodeKind` enum represents the node types the tree engine can
//! allocate. Each variant carries the node-type-specific payload; navigation
//! links (parent, children, siblings) live in `NodeData`, not here.

/// An attribute on an element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name.
    pub name: String,
    /// The attribute value (entity references already expanded).
    pub value: String,
}

/// The kind of a tree node and its associated data.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document container node — there is exactly one per `Tree`.
    Document,

    /// An element node, e.g., `<item id="4">`.
    Element {
        /// The element name.
        name: String,
        /// Attributes on this element.
        attributes: Vec<Attribute>,
    },

    /// A text node containing character data.
    Text {
        /// The text content (character references already resolved).
        content: String,
    },

    /// A CDATA section, e.g., `<![CDATA[...]]>`.
    CData {
        /// The CDATA content (no escaping applied).
        content: String,
    },

    /// A comment node, e.g., `<!-- ... -->`.
    Comment {
        /// The comment text without the `<!--` and `-->` delimiters.
        content: String,
    },

    /// A processing instruction, e.g., `<?target data?>`.
    ProcessingInstruction {
        /// The PI target.
        target: String,
        /// The PI data, if any.
        data: Option<String>,
    },
}

impl NodeKind {
    /// Returns `true` for element nodes.
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }

    /// Returns `true` for the document container node.
    #[must_use]
    pub fn is_document(&self) -> bool {
        matches!(self, Self::Document)
    }
}
