//! XML serializer.
//!
//! Serializes a [`Tree`] into a textual XML document: the XML declaration
//! (version, plus the encoding name verbatim when one is set) followed by
//! the tree in document order, root to leaves. A rootless tree serializes
//! to the declaration alone.
//!
//! Formatting is deliberately plain — no pretty-printing — since the
//! binding layer only promises "the full current tree, in document order".

use crate::encoding::encode_from_utf8;
use crate::engine::{NodeId, NodeKind, Tree};

/// Serializes a tree to an XML string (UTF-8 text).
#[must_use]
pub fn serialize(tree: &Tree) -> String {
    let mut output = String::new();

    // XML declaration — always emitted, defaulting to version 1.0
    let version = tree.version.as_deref().unwrap_or("1.0");
    output.push_str("<?xml version=\"");
    output.push_str(version);
    output.push('"');
    if let Some(ref encoding) = tree.encoding {
        output.push_str(" encoding=\"");
        output.push_str(encoding);
        output.push('"');
    }
    output.push_str("?>\n");

    // When no encoding is declared, non-ASCII characters are re-encoded as
    // hex character references so the plain-UTF-8 output stays portable.
    let reencode_non_ascii = tree.encoding.is_none();

    for child in tree.children(tree.root()) {
        serialize_node(tree, child, &mut output, reencode_non_ascii);
        output.push('\n');
    }

    output
}

/// Serializes a tree to a byte buffer in the tree's configured encoding.
///
/// Defaults to UTF-8 when no encoding is set. The encoding name in the
/// declaration is the configured value verbatim; see
/// [`crate::encoding::encode_from_utf8`] for the fallback rules.
#[must_use]
pub fn serialize_to_bytes(tree: &Tree) -> Vec<u8> {
    let text = serialize(tree);
    match tree.encoding.as_deref() {
        Some(name) => encode_from_utf8(&text, name),
        None => text.into_bytes(),
    }
}

fn serialize_node(tree: &Tree, id: NodeId, out: &mut String, reencode_non_ascii: bool) {
    match &tree.node(id).kind {
        NodeKind::Element { name, attributes } => {
            out.push('<');
            out.push_str(name);
            for attr in attributes {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                write_escaped(out, &attr.value, true, reencode_non_ascii);
                out.push('"');
            }
            if tree.first_child(id).is_none() {
                out.push_str("/>");
            } else {
                out.push('>');
                for child in tree.children(id) {
                    serialize_node(tree, child, out, reencode_non_ascii);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
        NodeKind::Text { content } => {
            write_escaped(out, content, false, reencode_non_ascii);
        }
        NodeKind::CData { content } => {
            out.push_str("<![CDATA[");
            out.push_str(content);
            out.push_str("]]>");
        }
        NodeKind::Comment { content } => {
            out.push_str("<!--");
            out.push_str(content);
            out.push_str("-->");
        }
        NodeKind::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            if let Some(d) = data {
                out.push(' ');
                out.push_str(d);
            }
            out.push_str("?>");
        }
        NodeKind::Document => {}
    }
}

/// Escapes markup-significant characters. In attribute context, quotes and
/// newlines are escaped too.
fn write_escaped(out: &mut String, text: &str, in_attribute: bool, reencode_non_ascii: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            '\n' if in_attribute => out.push_str("&#10;"),
            '\t' if in_attribute => out.push_str("&#9;"),
            '\r' => out.push_str("&#13;"),
            c if reencode_non_ascii && !c.is_ascii() => {
                out.push_str(&format!("&#x{:X};", c as u32));
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Attribute;

    fn tree_with_root(name: &str) -> (Tree, NodeId) {
        let mut tree = Tree::with_version("1.0");
        let root = tree.root();
        let elem = tree.create_node(NodeKind::Element {
            name: name.to_string(),
            attributes: vec![],
        });
        tree.append_child(root, elem);
        (tree, elem)
    }

    #[test]
    fn test_rootless_tree_serializes_declaration_only() {
        let tree = Tree::with_version("1.0");
        assert_eq!(serialize(&tree), "<?xml version=\"1.0\"?>\n");
    }

    #[test]
    fn test_declaration_carries_encoding_verbatim() {
        let mut tree = Tree::with_version("1.0");
        tree.encoding = Some("UTF-16".to_string());
        assert!(serialize(&tree).starts_with("<?xml version=\"1.0\" encoding=\"UTF-16\"?>\n"));
    }

    #[test]
    fn test_empty_element_self_closes() {
        let (tree, _) = tree_with_root("greeting");
        assert_eq!(serialize(&tree), "<?xml version=\"1.0\"?>\n<greeting/>\n");
    }

    #[test]
    fn test_element_with_text_child() {
        let (mut tree, elem) = tree_with_root("msg");
        let text = tree.create_node(NodeKind::Text {
            content: "hello".to_string(),
        });
        tree.append_child(elem, text);
        assert_eq!(serialize(&tree), "<?xml version=\"1.0\"?>\n<msg>hello</msg>\n");
    }

    #[test]
    fn test_attribute_escaping() {
        let mut tree = Tree::with_version("1.0");
        let root = tree.root();
        let elem = tree.create_node(NodeKind::Element {
            name: "a".to_string(),
            attributes: vec![Attribute {
                name: "title".to_string(),
                value: "x < \"y\" & z".to_string(),
            }],
        });
        tree.append_child(root, elem);
        assert!(serialize(&tree).contains("title=\"x &lt; &quot;y&quot; &amp; z\""));
    }

    #[test]
    fn test_text_escaping() {
        let (mut tree, elem) = tree_with_root("m");
        let text = tree.create_node(NodeKind::Text {
            content: "a & b < c".to_string(),
        });
        tree.append_child(elem, text);
        assert!(serialize(&tree).contains("<m>a &amp; b &lt; c</m>"));
    }

    #[test]
    fn test_non_ascii_reencoded_without_declared_encoding() {
        let (mut tree, elem) = tree_with_root("m");
        let text = tree.create_node(NodeKind::Text {
            content: "é".to_string(),
        });
        tree.append_child(elem, text);
        assert!(serialize(&tree).contains("&#xE9;"));
    }

    #[test]
    fn test_non_ascii_verbatim_with_declared_encoding() {
        let (mut tree, elem) = tree_with_root("m");
        tree.encoding = Some("UTF-8".to_string());
        let text = tree.create_node(NodeKind::Text {
            content: "é".to_string(),
        });
        tree.append_child(elem, text);
        assert!(serialize(&tree).contains("<m>é</m>"));
    }

    #[test]
    fn test_serialize_to_bytes_latin1() {
        let (mut tree, elem) = tree_with_root("m");
        tree.encoding = Some("ISO-8859-1".to_string());
        let text = tree.create_node(NodeKind::Text {
            content: "é".to_string(),
        });
        tree.append_child(elem, text);
        let bytes = serialize_to_bytes(&tree);
        assert!(bytes.contains(&0xE9));
    }

    #[test]
    fn test_comment_and_cdata_and_pi() {
        let (mut tree, elem) = tree_with_root("r");
        let comment = tree.create_node(NodeKind::Comment {
            content: " note ".to_string(),
        });
        let cdata = tree.create_node(NodeKind::CData {
            content: "a < b".to_string(),
        });
        let pi = tree.create_node(NodeKind::ProcessingInstruction {
            target: "style".to_string(),
            data: Some("href=\"x\"".to_string()),
        });
        tree.append_child(elem, comment);
        tree.append_child(elem, cdata);
        tree.append_child(elem, pi);
        let xml = serialize(&tree);
        assert!(xml.contains("<!-- note -->"));
        assert!(xml.contains("<![CDATA[a < b]]>"));
        assert!(xml.contains("<?style href=\"x\"?>"));
    }
}
