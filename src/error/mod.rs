//! Error types for the object-model binding.
//!
//! Two recoverable error families cross the API boundary: usage errors
//! (unsupported argument shapes) and invariant violations (setting a second
//! root). Both are surfaced as [`BindError`] and leave document state
//! unchanged. Parser failures carry a [`SourceLocation`].
//!
//! Bijection violations (a node with two wrappers, or an element node with
//! none where one is expected) are not represented here: they indicate a
//! bug in the bridge itself and abort via `panic!` at the registry.

use std::fmt;

use thiserror::Error;

/// Source location within an XML input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error type returned when XML parsing fails.
#[derive(Debug, Clone, Error)]
#[error("parse error at {location}: {message}")]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the error occurred.
    pub location: SourceLocation,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

/// An error that occurs during encoding detection or transcoding.
#[derive(Debug, Clone, Error)]
#[error("encoding error: {message}")]
pub struct EncodingError {
    /// A human-readable description of the encoding error.
    pub message: String,
}

impl EncodingError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the document/element wrapper API.
#[derive(Debug, Error)]
pub enum BindError {
    /// The caller supplied an argument shape that matches none of the
    /// documented constructor overloads.
    #[error("Bad argument: {expected}")]
    Usage {
        /// The valid call shapes, e.g. `newDocument([version])`.
        expected: String,
    },

    /// `set_root` was called on a document that already has a root element.
    /// The document is unchanged.
    #[error("This document already has a root node")]
    RootAlreadySet,

    /// The element passed to `set_root` is owned by a different document.
    #[error("element belongs to a different document")]
    ForeignElement,

    /// The element passed to `set_root` is still attached to a parent.
    /// Detach it from its previous location first.
    #[error("element is still attached to a parent; detach it first")]
    RootCandidateAttached,

    /// The input could not be parsed as XML.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The input bytes could not be decoded to text.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation {
            line: 10,
            column: 5,
            byte_offset: 42,
        };
        assert_eq!(loc.to_string(), "10:5");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::new(
            "unexpected end of input",
            SourceLocation {
                line: 1,
                column: 15,
                byte_offset: 14,
            },
        );
        assert_eq!(
            err.to_string(),
            "parse error at 1:15: unexpected end of input"
        );
    }

    #[test]
    fn test_root_already_set_message_is_exact() {
        assert_eq!(
            BindError::RootAlreadySet.to_string(),
            "This document already has a root node"
        );
    }

    #[test]
    fn test_usage_error_names_call_shapes() {
        let err = BindError::Usage {
            expected: "newDocument([version]) or newDocument([callback])".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Bad argument: newDocument([version]) or newDocument([callback])"
        );
    }

    #[test]
    fn test_bind_error_is_error_trait() {
        let err = BindError::RootAlreadySet;
        let _: &dyn std::error::Error = &err;
    }
}
