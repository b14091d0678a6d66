//! Element tree parser.
//!
//! Reads a complete document from a string. The prolog may hold an XML
//! declaration, a `<!DOCTYPE>`, comments, processing instructions, and
//! stray text; the first start tag begins the root element.
//!
//! Elements are read with an explicit stack of open elements, so nesting
//! depth costs heap, not call stack. Character data is collected into a
//! pending buffer bound to one slot: the text of the element just opened,
//! or the tail of the element just closed. Comments and processing
//! instructions do not change the slot, so text on either side of them is
//! joined. When the slot changes the buffer is trimmed, entity-decoded, and
//! stored (or dropped if empty).

use memchr::memmem;

use crate::error::{ParseError, ParseErrorKind};
use crate::tracing_macros::{debug, debug_span, trace};
use crate::tree::{Attributes, DocInfo, Document, ElementId, ElementTree};
use crate::util::escape::{decode_entities, escape_text};

use super::input::ParserInput;
use super::ParseOptions;

/// How a start tag (or declaration) was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagEnd {
    /// `>`
    Open,
    /// `/>`
    Empty,
    /// `?>`
    Question,
}

/// Where pending character data belongs.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Text(ElementId),
    Tail(ElementId),
}

pub(crate) struct XmlParser<'a, 'd> {
    input: ParserInput<'a>,
    doc: &'d mut Document,
    max_attributes: u32,
    docinfo: DocInfo,
}

impl<'a, 'd> XmlParser<'a, 'd> {
    pub fn new(input: &'a str, doc: &'d mut Document, options: &ParseOptions) -> Self {
        let mut pi = ParserInput::new(input);
        pi.set_max_depth(options.max_depth);
        pi.set_max_name_length(options.max_name_length);

        Self {
            input: pi,
            doc,
            max_attributes: options.max_attributes,
            docinfo: DocInfo::default(),
        }
    }

    /// Parses the prolog and the root element.
    ///
    /// Returns `None` when the input holds no element.
    pub fn parse(mut self) -> Result<Option<ElementTree>, ParseError> {
        debug_span!("parse");

        loop {
            self.input.take_until(b'<');
            if self.input.at_end() {
                debug!("no root element found");
                return Ok(None);
            }
            if self.at_xml_declaration() {
                self.parse_xml_declaration()?;
            } else if self.input.looking_at(b"<!--") {
                self.skip_comment()?;
            } else if self.input.looking_at(b"<?") {
                self.skip_pi()?;
            } else if self.input.looking_at(b"<!") {
                self.parse_doctype()?;
            } else if self.input.looking_at(b"</") {
                return Err(self.input.fatal(ParseErrorKind::Malformed(
                    "closing tag before the root element".to_string(),
                )));
            } else {
                break;
            }
        }

        let root = self.parse_root()?;
        debug!(elements = self.doc.iter(root).count(), "parsed document");
        Ok(Some(self.doc.attach_tree(root, self.docinfo)))
    }

    // --- Prolog ---

    fn at_xml_declaration(&self) -> bool {
        let rest = self.input.remaining().as_bytes();
        rest.starts_with(b"<?xml")
            && rest
                .get(5)
                .is_some_and(|&b| matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'?'))
    }

    fn parse_xml_declaration(&mut self) -> Result<(), ParseError> {
        self.input.advance(5);
        let mut pseudo = Attributes::new();
        if self.parse_attributes(&mut pseudo, "XML declaration")? != TagEnd::Question {
            return Err(self.input.fatal(ParseErrorKind::Malformed(
                "XML declaration must end with '?>'".to_string(),
            )));
        }
        self.docinfo.xml_version = pseudo.remove("version");
        self.docinfo.encoding =
            Some(pseudo.remove("encoding").unwrap_or_else(|| "utf-8".to_string()));
        debug!(
            version = self.docinfo.xml_version.as_deref(),
            encoding = self.docinfo.encoding.as_deref(),
            "xml declaration"
        );
        Ok(())
    }

    /// Captures `<!DOCTYPE ...>` without its internal subset.
    fn parse_doctype(&mut self) -> Result<(), ParseError> {
        let rest = self.input.remaining();
        let Some(scan) = scan_declaration(rest.as_bytes()) else {
            return Err(self.input.fatal(ParseErrorKind::UnexpectedEof("DOCTYPE")));
        };
        let raw = &rest[..=scan.end];
        let doctype = match scan.subset {
            Some((open, close)) => {
                format!("{}{}", raw[..open].trim(), raw[close + 1..].trim())
            }
            None => raw.to_string(),
        };
        debug!(doctype = doctype.as_str(), "doctype");
        self.docinfo.doctype = Some(doctype);
        self.input.advance(scan.end + 1);
        Ok(())
    }

    fn skip_comment(&mut self) -> Result<(), ParseError> {
        self.input.advance(4);
        self.input.take_through("-->", "comment")?;
        Ok(())
    }

    fn skip_pi(&mut self) -> Result<(), ParseError> {
        self.input.advance(2);
        let _content = self.input.take_through("?>", "processing instruction")?;
        trace!(pi = _content, "skipped processing instruction");
        Ok(())
    }

    // --- Elements ---

    /// Reads the root element and its tail. The cursor is on the root's `<`.
    fn parse_root(&mut self) -> Result<ElementId, ParseError> {
        let mut open: Vec<ElementId> = Vec::new();
        let mut pending = String::new();
        let mut slot: Option<Slot> = None;

        loop {
            if self.input.looking_at(b"</") {
                let location = self.input.location();
                self.input.advance(2);
                let name = self.input.parse_name()?;
                self.input.skip_whitespace();
                self.input.expect_byte(b'>', "closing tag")?;

                let Some(current) = open.pop() else {
                    return Err(ParseError::new(
                        ParseErrorKind::Malformed(format!("unexpected closing tag: {name}")),
                        location,
                    ));
                };
                if name != self.doc.tag(current) {
                    return Err(ParseError::new(
                        ParseErrorKind::MismatchedTag {
                            expected: self.doc.tag(current).to_string(),
                            found: name.to_string(),
                        },
                        location,
                    ));
                }
                self.input.decrement_depth();
                self.flush(slot, &mut pending);
                if open.is_empty() {
                    return Ok(self.finish_root(current, pending));
                }
                slot = Some(Slot::Tail(current));
            } else if self.input.looking_at(b"<!--") {
                self.skip_comment()?;
            } else if self.input.looking_at(b"<![CDATA[") {
                self.input.advance(9);
                let content = self.input.take_through("]]>", "CDATA section")?;
                // Escaped so that the flush-time decode restores it verbatim.
                pending.push_str(&escape_text(content));
            } else if self.input.looking_at(b"<?") {
                self.skip_pi()?;
            } else if self.input.looking_at(b"<!") {
                return Err(self.input.fatal(ParseErrorKind::Malformed(
                    "markup declaration inside element content".to_string(),
                )));
            } else {
                let (element, end) = self.parse_start_tag()?;
                if let Some(&parent) = open.last() {
                    self.doc.push_child(parent, element);
                }
                self.flush(slot, &mut pending);
                match end {
                    TagEnd::Open => {
                        open.push(element);
                        slot = Some(Slot::Text(element));
                    }
                    _ => {
                        self.input.decrement_depth();
                        if open.is_empty() {
                            return Ok(self.finish_root(element, pending));
                        }
                        slot = Some(Slot::Tail(element));
                    }
                }
            }

            pending.push_str(self.input.take_until(b'<'));
            if self.input.at_end() {
                return Err(self
                    .input
                    .fatal(ParseErrorKind::UnexpectedEof("element content")));
            }
        }
    }

    /// Reads `<name attr="value" ...>` or `.../>`, creating the element.
    fn parse_start_tag(&mut self) -> Result<(ElementId, TagEnd), ParseError> {
        self.input.advance(1);
        let name = self.input.parse_name()?;
        self.input.increment_depth()?;
        let mut attrib = Attributes::new();
        let end = self.parse_attributes(&mut attrib, "start tag")?;
        if end == TagEnd::Question {
            return Err(self.input.fatal(ParseErrorKind::Malformed(format!(
                "unexpected '?>' in start tag of {name}"
            ))));
        }
        trace!(tag = name, attributes = attrib.len(), "start tag");
        let element = self.doc.create_element(name);
        *self.doc.attrib_mut(element) = attrib;
        Ok((element, end))
    }

    /// Reads attributes up to the end of a tag. A repeated name keeps the
    /// last value.
    fn parse_attributes(
        &mut self,
        attrib: &mut Attributes,
        context: &'static str,
    ) -> Result<TagEnd, ParseError> {
        let mut count: u32 = 0;
        loop {
            self.input.skip_whitespace();
            match self.input.peek() {
                None => return Err(self.input.fatal(ParseErrorKind::UnexpectedEof(context))),
                Some(b'>') => {
                    self.input.advance(1);
                    return Ok(TagEnd::Open);
                }
                Some(b'/') if self.input.looking_at(b"/>") => {
                    self.input.advance(2);
                    return Ok(TagEnd::Empty);
                }
                Some(b'?') if self.input.looking_at(b"?>") => {
                    self.input.advance(2);
                    return Ok(TagEnd::Question);
                }
                Some(_) => {
                    let name = self.input.parse_name()?;
                    self.input.skip_whitespace();
                    self.input.expect_byte(b'=', context)?;
                    self.input.skip_whitespace();
                    let value = self.input.parse_quoted()?;
                    count += 1;
                    if count > self.max_attributes {
                        return Err(self
                            .input
                            .fatal(ParseErrorKind::AttributeLimit(self.max_attributes)));
                    }
                    attrib.set(name, decode_entities(value));
                }
            }
        }
    }

    /// Stores the root's tail and stops; anything after it is ignored.
    fn finish_root(&mut self, root: ElementId, mut pending: String) -> ElementId {
        pending.push_str(self.input.take_until(b'<'));
        self.flush(Some(Slot::Tail(root)), &mut pending);
        root
    }

    /// Moves the pending character data into its slot.
    fn flush(&mut self, slot: Option<Slot>, pending: &mut String) {
        let trimmed = pending.trim();
        if let Some(slot) = slot {
            if !trimmed.is_empty() {
                let value = Some(decode_entities(trimmed).into_owned());
                match slot {
                    Slot::Text(id) => self.doc.element_mut(id).text = value,
                    Slot::Tail(id) => self.doc.element_mut(id).tail = value,
                }
            }
        }
        pending.clear();
    }
}

/// Result of scanning a `<!...>` declaration.
#[derive(Debug, PartialEq, Eq)]
struct DeclarationScan {
    /// Offset of the closing `>`.
    end: usize,
    /// Offsets of the internal subset's `[` and `]`.
    subset: Option<(usize, usize)>,
}

/// Finds the end of a `<!...>` declaration, stepping over quoted literals
/// and a bracketed internal subset.
///
/// Comments and processing instructions inside the subset are skipped
/// whole, so quote characters in their prose do not open a literal.
fn scan_declaration(bytes: &[u8]) -> Option<DeclarationScan> {
    let mut quote: Option<u8> = None;
    let mut subset_open: Option<usize> = None;
    let mut subset: Option<(usize, usize)> = None;
    let mut i = 2;

    while let Some(&b) = bytes.get(i) {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        if subset_open.is_some() {
            let rest = &bytes[i..];
            if rest.starts_with(b"<!--") {
                i += 4 + memmem::find(&rest[4..], b"-->")? + 3;
                continue;
            }
            if rest.starts_with(b"<?") {
                i += 2 + memmem::find(&rest[2..], b"?>")? + 2;
                continue;
            }
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'[' if subset_open.is_none() && subset.is_none() => subset_open = Some(i),
            b']' if subset_open.is_some() => {
                subset = subset_open.take().map(|open| (open, i));
            }
            b'>' if subset_open.is_none() => return Some(DeclarationScan { end: i, subset }),
            _ => {}
        }
        i += 1;
    }
    None
}
