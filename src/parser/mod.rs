//! XML parser.
//!
//! A compact hand-rolled recursive descent parser that builds nodes into an
//! existing [`Tree`] through [`Tree::create_node`], so the process-wide
//! construction hook fires for every node the parse allocates — the binding
//! layer depends on this to wrap nodes it never saw an explicit
//! construction call for.
//!
//! The grammar surface is the well-formed core: the XML declaration,
//! elements, attributes, character data with predefined and numeric
//! character references, comments, CDATA sections, and processing
//! instructions. DTDs and external entities are out of scope for the
//! binding layer.

use crate::engine::{Attribute, NodeId, NodeKind, Tree};
use crate::error::{ParseError, SourceLocation};

/// Parses an XML string into the given tree.
///
/// The tree must be freshly created (container node only). The XML
/// declaration's version and encoding, when present, are stored on the
/// tree.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed.
pub fn parse_into(tree: &mut Tree, input: &str) -> Result<(), ParseError> {
    log::trace!("parsing {} bytes of XML input", input.len());
    let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    let mut parser = XmlParser {
        input,
        pos: 0,
        line: 1,
        column: 1,
        tree,
    };
    parser.parse()?;
    // A document without a declaration is still version 1.0.
    if parser.tree.version.is_none() {
        parser.tree.version = Some("1.0".to_string());
    }
    Ok(())
}

struct XmlParser<'a, 't> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    tree: &'t mut Tree,
}

impl XmlParser<'_, '_> {
    fn parse(&mut self) -> Result<(), ParseError> {
        self.parse_declaration()?;
        self.parse_misc()?;

        if !self.rest().starts_with('<') {
            return Err(self.error("expected document element"));
        }
        let root = self.tree.root();
        let elem = self.parse_element()?;
        self.tree.append_child(root, elem);

        self.parse_misc()?;
        if !self.rest().is_empty() {
            return Err(self.error("content after document element"));
        }
        Ok(())
    }

    // --- Input primitives ---

    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.location())
    }

    /// Consumes `n` bytes, updating line/column bookkeeping.
    fn advance(&mut self, n: usize) {
        for ch in self.input[self.pos..self.pos + n].chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos += n;
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.advance(token.len());
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), ParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{token}'")))
        }
    }

    fn skip_whitespace(&mut self) -> usize {
        let n = self
            .rest()
            .find(|c: char| !c.is_ascii_whitespace())
            .unwrap_or(self.rest().len());
        self.advance(n);
        n
    }

    // --- Grammar productions ---

    fn parse_declaration(&mut self) -> Result<(), ParseError> {
        if !self.rest().starts_with("<?xml")
            || !self.input[self.pos + 5..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_whitespace())
        {
            return Ok(());
        }
        self.advance(5);

        if self.skip_whitespace() == 0 {
            return Err(self.error("expected whitespace after '<?xml'"));
        }
        self.expect("version")?;
        let version = self.parse_eq_quoted()?;
        self.tree.version = Some(version);

        self.skip_whitespace();
        if self.eat("encoding") {
            let encoding = self.parse_eq_quoted()?;
            self.tree.encoding = Some(encoding);
            self.skip_whitespace();
        }
        if self.eat("standalone") {
            // Accepted for well-formedness; the binding layer does not
            // track the standalone flag.
            self.parse_eq_quoted()?;
            self.skip_whitespace();
        }
        self.expect("?>")
    }

    /// Parses `= "value"` (or single-quoted) after an attribute keyword.
    fn parse_eq_quoted(&mut self) -> Result<String, ParseError> {
        self.skip_whitespace();
        self.expect("=")?;
        self.skip_whitespace();
        let quote = match self.rest().chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected quoted value")),
        };
        self.advance(1);
        let Some(end) = self.rest().find(quote) else {
            return Err(self.error("unterminated quoted value"));
        };
        let value = self.rest()[..end].to_string();
        self.advance(end + 1);
        Ok(value)
    }

    /// Parses whitespace, comments, and PIs outside the document element,
    /// appending comment/PI nodes to the container node in document order.
    fn parse_misc(&mut self) -> Result<(), ParseError> {
        loop {
            self.skip_whitespace();
            if self.rest().starts_with("<!--") {
                let node = self.parse_comment()?;
                let root = self.tree.root();
                self.tree.append_child(root, node);
            } else if self.rest().starts_with("<?") {
                let node = self.parse_pi()?;
                let root = self.tree.root();
                self.tree.append_child(root, node);
            } else {
                return Ok(());
            }
        }
    }

    fn parse_name(&mut self) -> Result<String, ParseError> {
        let mut chars = self.rest().char_indices();
        match chars.next() {
            Some((_, c)) if is_name_start(c) => {}
            _ => return Err(self.error("expected a name")),
        }
        let end = chars
            .find(|&(_, c)| !is_name_char(c))
            .map_or(self.rest().len(), |(i, _)| i);
        let name = self.rest()[..end].to_string();
        self.advance(end);
        Ok(name)
    }

    fn parse_element(&mut self) -> Result<NodeId, ParseError> {
        self.expect("<")?;
        let name = self.parse_name()?;

        let mut attributes: Vec<Attribute> = Vec::new();
        loop {
            let had_space = self.skip_whitespace() > 0;
            if self.rest().starts_with("/>") || self.rest().starts_with('>') {
                break;
            }
            if !had_space {
                return Err(self.error("expected whitespace before attribute"));
            }
            let attr_name = self.parse_name()?;
            if attributes.iter().any(|a| a.name == attr_name) {
                return Err(self.error(format!("duplicate attribute '{attr_name}'")));
            }
            let raw = self.parse_eq_quoted()?;
            let value = self.expand_references(&raw)?;
            attributes.push(Attribute {
                name: attr_name,
                value,
            });
        }

        let elem = self.tree.create_node(NodeKind::Element {
            name: name.clone(),
            attributes,
        });

        if self.eat("/>") {
            return Ok(elem);
        }
        self.expect(">")?;
        self.parse_content(elem)?;

        self.expect("</")?;
        let close_name = self.parse_name()?;
        if close_name != name {
            return Err(self.error(format!(
                "mismatched closing tag: expected '</{name}>', found '</{close_name}>'"
            )));
        }
        self.skip_whitespace();
        self.expect(">")?;
        Ok(elem)
    }

    fn parse_content(&mut self, parent: NodeId) -> Result<(), ParseError> {
        loop {
            if self.rest().starts_with("</") {
                return Ok(());
            }
            if self.rest().is_empty() {
                return Err(self.error("unexpected end of input inside element"));
            }
            let node = if self.rest().starts_with("<!--") {
                self.parse_comment()?
            } else if self.rest().starts_with("<![CDATA[") {
                self.parse_cdata()?
            } else if self.rest().starts_with("<?") {
                self.parse_pi()?
            } else if self.rest().starts_with('<') {
                self.parse_element()?
            } else {
                self.parse_text()?
            };
            self.tree.append_child(parent, node);
        }
    }

    fn parse_text(&mut self) -> Result<NodeId, ParseError> {
        let end = self.rest().find('<').unwrap_or(self.rest().len());
        let raw = self.rest()[..end].to_string();
        if raw.contains("]]>") {
            return Err(self.error("']]>' is not allowed in character data"));
        }
        let content = self.expand_references(&raw)?;
        self.advance(end);
        Ok(self.tree.create_node(NodeKind::Text { content }))
    }

    fn parse_comment(&mut self) -> Result<NodeId, ParseError> {
        self.expect("<!--")?;
        let Some(end) = self.rest().find("-->") else {
            return Err(self.error("unterminated comment"));
        };
        let content = self.rest()[..end].to_string();
        if content.contains("--") {
            return Err(self.error("'--' is not allowed inside a comment"));
        }
        self.advance(end + 3);
        Ok(self.tree.create_node(NodeKind::Comment { content }))
    }

    fn parse_cdata(&mut self) -> Result<NodeId, ParseError> {
        self.expect("<![CDATA[")?;
        let Some(end) = self.rest().find("]]>") else {
            return Err(self.error("unterminated CDATA section"));
        };
        let content = self.rest()[..end].to_string();
        self.advance(end + 3);
        Ok(self.tree.create_node(NodeKind::CData { content }))
    }

    fn parse_pi(&mut self) -> Result<NodeId, ParseError> {
        self.expect("<?")?;
        let target = self.parse_name()?;
        if target.eq_ignore_ascii_case("xml") {
            return Err(self.error("processing instruction target 'xml' is reserved"));
        }
        let Some(end) = self.rest().find("?>") else {
            return Err(self.error("unterminated processing instruction"));
        };
        let data = self.rest()[..end].trim_start().to_string();
        self.advance(end + 2);
        Ok(self.tree.create_node(NodeKind::ProcessingInstruction {
            target,
            data: if data.is_empty() { None } else { Some(data) },
        }))
    }

    /// Expands predefined entity references and numeric character
    /// references in character data or an attribute value.
    fn expand_references(&self, raw: &str) -> Result<String, ParseError> {
        if !raw.contains('&') {
            return Ok(raw.to_string());
        }
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(amp) = rest.find('&') {
            out.push_str(&rest[..amp]);
            rest = &rest[amp..];
            let Some(semi) = rest.find(';') else {
                return Err(self.error("unterminated entity reference"));
            };
            let entity = &rest[1..semi];
            match entity {
                "amp" => out.push('&'),
                "lt" => out.push('<'),
                "gt" => out.push('>'),
                "apos" => out.push('\''),
                "quot" => out.push('"'),
                _ => {
                    let code = entity
                        .strip_prefix("#x")
                        .or_else(|| entity.strip_prefix("#X"))
                        .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                        .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()));
                    match code.and_then(char::from_u32) {
                        Some(ch) => out.push(ch),
                        None => {
                            return Err(
                                self.error(format!("unknown entity reference '&{entity};'"))
                            );
                        }
                    }
                }
            }
            rest = &rest[semi + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// Returns `true` if `name` is a valid element or attribute name.
pub(crate) fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_name_start) && chars.all(is_name_char)
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-' || c == '.'
}
