//! Low-level input handling for the parser.
//!
//! [`ParserInput`] owns the cursor over the source text: position tracking
//! (line, column, byte offset), lookahead, and the small scanning
//! primitives the parser is built from. It also enforces the nesting depth
//! and name length limits.
//!
//! The cursor only ever stops on ASCII delimiters or after whole
//! characters, so the remaining input is always a valid `&str`.

use memchr::memmem;

use crate::error::{ParseError, ParseErrorKind, SourceLocation};

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 256;

/// Default maximum number of attributes on a single element.
pub(crate) const DEFAULT_MAX_ATTRIBUTES: u32 = 256;

/// Default maximum length (in bytes) of an element or attribute name.
pub(crate) const DEFAULT_MAX_NAME_LENGTH: usize = 50_000;

/// Returns `true` for characters allowed in tag and attribute names.
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | ':' | '_' | '.' | '?')
}

pub(crate) struct ParserInput<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    depth: u32,
    max_depth: u32,
    max_name_length: usize,
}

impl<'a> ParserInput<'a> {
    /// Creates a cursor at the start of `input` with default limits.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }

    pub fn set_max_depth(&mut self, max: u32) {
        self.max_depth = max;
    }

    pub fn set_max_name_length(&mut self, max: usize) {
        self.max_name_length = max;
    }

    // -- Depth tracking --

    /// Increments the nesting depth. Returns an error if the limit is exceeded.
    pub fn increment_depth(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.fatal(ParseErrorKind::DepthLimit(self.max_depth)));
        }
        Ok(())
    }

    /// Decrements the nesting depth (saturating at 0).
    pub fn decrement_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // -- Position queries --

    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// The unconsumed input.
    pub fn remaining(&self) -> &'a str {
        self.input.get(self.pos..).unwrap_or("")
    }

    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.remaining().as_bytes().starts_with(s)
    }

    // -- Advancing --

    /// Advances by `count` bytes, updating line and column.
    pub fn advance(&mut self, count: usize) {
        let end = (self.pos + count).min(self.input.len());
        let chunk = &self.input.as_bytes()[self.pos..end];
        match memchr::memrchr(b'\n', chunk) {
            Some(last) => {
                let newlines = memchr::memchr_iter(b'\n', chunk).count();
                self.line = self
                    .line
                    .saturating_add(u32::try_from(newlines).unwrap_or(u32::MAX));
                self.column = u32::try_from(chunk.len() - last).unwrap_or(u32::MAX);
            }
            None => {
                self.column = self
                    .column
                    .saturating_add(u32::try_from(chunk.len()).unwrap_or(u32::MAX));
            }
        }
        self.pos = end;
    }

    /// Skips ASCII whitespace. Returns `true` if any was consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let count = self
            .remaining()
            .bytes()
            .take_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
            .count();
        self.advance(count);
        count > 0
    }

    /// Consumes and returns everything up to (not including) the next
    /// `byte`, or up to the end of input.
    pub fn take_until(&mut self, byte: u8) -> &'a str {
        let rest = self.remaining();
        let len = memchr::memchr(byte, rest.as_bytes()).unwrap_or(rest.len());
        self.advance(len);
        &rest[..len]
    }

    /// Consumes everything up to and including `delimiter`, returning the
    /// text before it.
    pub fn take_through(
        &mut self,
        delimiter: &str,
        context: &'static str,
    ) -> Result<&'a str, ParseError> {
        let rest = self.remaining();
        let Some(len) = memmem::find(rest.as_bytes(), delimiter.as_bytes()) else {
            return Err(self.fatal(ParseErrorKind::UnexpectedEof(context)));
        };
        self.advance(len + delimiter.len());
        Ok(&rest[..len])
    }

    /// Consumes `expected` or fails.
    pub fn expect_byte(&mut self, expected: u8, context: &'static str) -> Result<(), ParseError> {
        match self.peek() {
            Some(b) if b == expected => {
                self.advance(1);
                Ok(())
            }
            Some(b) => Err(self.fatal(ParseErrorKind::Malformed(format!(
                "expected '{}' in {context}, found '{}'",
                expected as char, b as char
            )))),
            None => Err(self.fatal(ParseErrorKind::UnexpectedEof(context))),
        }
    }

    // -- Names and values --

    /// Parses a tag or attribute name.
    pub fn parse_name(&mut self) -> Result<&'a str, ParseError> {
        let rest = self.remaining();
        let len = rest
            .char_indices()
            .find(|&(_, c)| !is_name_char(c))
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return Err(match rest.chars().next() {
                Some(c) => self.fatal(ParseErrorKind::Malformed(format!(
                    "expected a name, found '{c}'"
                ))),
                None => self.fatal(ParseErrorKind::UnexpectedEof("name")),
            });
        }
        if len > self.max_name_length {
            return Err(self.fatal(ParseErrorKind::Malformed(format!(
                "name length ({len}) exceeds maximum ({})",
                self.max_name_length
            ))));
        }
        self.advance(len);
        Ok(&rest[..len])
    }

    /// Parses a `"..."` or `'...'` literal and returns its raw content.
    pub fn parse_quoted(&mut self) -> Result<&'a str, ParseError> {
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            Some(_) => {
                return Err(self.fatal(ParseErrorKind::Malformed(
                    "attribute value must be quoted".to_string(),
                )))
            }
            None => return Err(self.fatal(ParseErrorKind::UnexpectedEof("attribute value"))),
        };
        self.advance(1);
        let rest = self.remaining();
        let Some(len) = memchr::memchr(quote, rest.as_bytes()) else {
            return Err(self.fatal(ParseErrorKind::UnexpectedEof("quoted value")));
        };
        self.advance(len + 1);
        Ok(&rest[..len])
    }

    // -- Errors --

    /// Builds an error at the current position.
    pub fn fatal(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.location())
    }
}
