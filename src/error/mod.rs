//! Error types for parsing and tree mutation.
//!
//! Parse errors carry a [`SourceLocation`] (line, column, byte offset) so a
//! failure can be pointed at precisely. There is no recovery mode: the first
//! problem found stops the parse and no partial tree is returned.
//!
//! Tree mutation errors ([`TreeError`]) cover identity lookups that miss
//! (`index`, `remove`, `replace`) and sibling insertion on a parentless element.

use std::fmt;

use crate::encoding::EncodingError;

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// What went wrong while parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseErrorKind {
    /// A closing tag does not match the element it closes.
    #[error("unexpected closing tag: {found} instead of {expected}")]
    MismatchedTag {
        /// The name of the element that is open.
        expected: String,
        /// The name found in the closing tag.
        found: String,
    },

    /// The input ended inside a construct.
    #[error("unexpected end of input in {0}")]
    UnexpectedEof(&'static str),

    /// Markup that cannot be read as an element, attribute, or declaration.
    #[error("{0}")]
    Malformed(String),

    /// Elements are nested deeper than [`ParseOptions::max_depth`](crate::parser::ParseOptions).
    #[error("maximum nesting depth exceeded ({0})")]
    DepthLimit(u32),

    /// An element carries more attributes than allowed.
    #[error("too many attributes on one element (limit {0})")]
    AttributeLimit(u32),

    /// The source bytes could not be decoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// The source could not be read.
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

/// The error type returned when parsing fails.
#[derive(Debug, thiserror::Error)]
#[error("parse error at {location}: {kind}")]
pub struct ParseError {
    /// What went wrong.
    #[source]
    pub kind: ParseErrorKind,
    /// Where in the source the error was detected.
    pub location: SourceLocation,
}

impl ParseError {
    /// Creates an error at the given location.
    #[must_use]
    pub fn new(kind: ParseErrorKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    /// Returns `true` if this is the closing-tag mismatch error.
    #[must_use]
    pub fn is_mismatched_tag(&self) -> bool {
        matches!(self.kind, ParseErrorKind::MismatchedTag { .. })
    }
}

impl From<EncodingError> for ParseError {
    fn from(err: EncodingError) -> Self {
        Self::new(ParseErrorKind::Encoding(err), SourceLocation::default())
    }
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ParseErrorKind::Io(err), SourceLocation::default())
    }
}

/// Errors raised by tree mutation and lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The element is not a direct child of the parent it was looked up in.
    #[error("element is not a child of this parent")]
    NotAChild,

    /// The operation needs a parent and the element has none.
    #[error("no parent specified, thus no sibling position")]
    NoParent,

    /// A positional child access was out of range.
    #[error("child index {index} out of range for {len} children")]
    IndexOutOfRange {
        /// The requested index (may be negative).
        index: isize,
        /// The number of children.
        len: usize,
    },

    /// The element would become its own ancestor.
    #[error("cannot move an element into its own subtree")]
    WouldCycle,
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
    fn test_mismatched_tag_display() {
        let err = ParseError::new(
            ParseErrorKind::MismatchedTag {
                expected: "a".to_string(),
                found: "b".to_string(),
            },
            SourceLocation {
                line: 1,
                column: 4,
                byte_offset: 3,
            },
        );
        assert!(err.is_mismatched_tag());
        assert_eq!(
            err.to_string(),
            "parse error at 1:4: unexpected closing tag: b instead of a"
        );
    }

    #[test]
    fn test_eof_display() {
        let err = ParseError::new(
            ParseErrorKind::UnexpectedEof("start tag"),
            SourceLocation::default(),
        );
        assert!(!err.is_mismatched_tag());
        assert_eq!(
            err.to_string(),
            "parse error at 0:0: unexpected end of input in start tag"
        );
    }

    #[test]
    fn test_tree_error_display() {
        assert_eq!(
            TreeError::IndexOutOfRange { index: -4, len: 3 }.to_string(),
            "child index -4 out of range for 3 children"
        );
        assert_eq!(
            TreeError::NotAChild.to_string(),
            "element is not a child of this parent"
        );
    }

    #[test]
    fn test_parse_error_is_error_trait() {
        let err = ParseError::new(
            ParseErrorKind::Malformed("test".to_string()),
            SourceLocation::default(),
        );
        let _: &dyn std::error::Error = &err;
    }
}
