//! Element tree parser.
//!
//! A hand-rolled, non-recursive parser that reads a complete document into
//! a [`Document`] arena. It recognises elements, attributes, character data,
//! the XML declaration, `<!DOCTYPE>`, comments, processing instructions, and
//! CDATA sections. Only the five predefined entities and numeric character
//! references are expanded; any other `&name;` stays in the text as written.
//!
//! There is no recovery mode: the first error stops the parse.

pub(crate) mod input;
mod xml;

use std::io::Read;

use crate::encoding::decode_to_utf8;
use crate::error::ParseError;
use crate::tree::{Document, ElementTree};

use input::{DEFAULT_MAX_ATTRIBUTES, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NAME_LENGTH};

/// Parse options controlling resource limits.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use simpletree::parser::ParseOptions;
///
/// let opts = ParseOptions::default()
///     .max_depth(128)
///     .max_attributes(32);
/// assert_eq!(opts.max_depth, 128);
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Maximum element nesting depth (default: 256).
    pub max_depth: u32,
    /// Maximum number of attributes on a single element (default: 256).
    pub max_attributes: u32,
    /// Maximum length in bytes of an element or attribute name (default: 50,000).
    pub max_name_length: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_attributes: DEFAULT_MAX_ATTRIBUTES,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

impl ParseOptions {
    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    /// Sets the maximum number of attributes per element.
    #[must_use]
    pub fn max_attributes(mut self, max: u32) -> Self {
        self.max_attributes = max;
        self
    }

    /// Sets the maximum element/attribute name length in bytes.
    #[must_use]
    pub fn max_name_length(mut self, max: usize) -> Self {
        self.max_name_length = max;
        self
    }
}

/// Parses a string into `doc` with default options.
///
/// Returns the new tree, or `None` if the input contains no element.
///
/// # Errors
///
/// Returns `ParseError` if the markup is malformed.
///
/// # Examples
///
/// ```
/// use simpletree::{parser, Document};
///
/// let mut doc = Document::new();
/// let tree = parser::parse_str(&mut doc, "<root><a/></root>").unwrap().unwrap();
/// assert_eq!(doc.len(tree.root()), 1);
/// ```
pub fn parse_str(doc: &mut Document, input: &str) -> Result<Option<ElementTree>, ParseError> {
    parse_str_with_options(doc, input, &ParseOptions::default())
}

/// Parses a string into `doc` with the given options.
///
/// # Errors
///
/// Returns `ParseError` if the markup is malformed or a limit is exceeded.
pub fn parse_str_with_options(
    doc: &mut Document,
    input: &str,
    options: &ParseOptions,
) -> Result<Option<ElementTree>, ParseError> {
    xml::XmlParser::new(input, doc, options).parse()
}

/// Reads all of `source` and parses it with default options.
///
/// # Errors
///
/// Returns `ParseError` if reading fails, the bytes cannot be decoded, or
/// the markup is malformed.
pub fn parse_reader(
    doc: &mut Document,
    source: impl Read,
) -> Result<Option<ElementTree>, ParseError> {
    parse_reader_with_options(doc, source, &ParseOptions::default())
}

/// Reads all of `source` and parses it with the given options.
///
/// The encoding is taken from a Byte Order Mark or the XML declaration;
/// see [`decode_to_utf8`].
///
/// # Errors
///
/// Returns `ParseError` if reading fails, the bytes cannot be decoded, or
/// the markup is malformed.
pub fn parse_reader_with_options(
    doc: &mut Document,
    mut source: impl Read,
    options: &ParseOptions,
) -> Result<Option<ElementTree>, ParseError> {
    let mut bytes = Vec::new();
    source.read_to_end(&mut bytes)?;
    let text = decode_to_utf8(&bytes)?;
    parse_str_with_options(doc, &text, options)
}
