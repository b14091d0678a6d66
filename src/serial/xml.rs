//! Element tree serializer.
//!
//! Renders an element (with its subtree) or a whole [`ElementTree`] back to
//! markup. The walk uses an explicit stack of enter/exit steps, so deep
//! trees do not grow the call stack.
//!
//! Output conventions:
//!
//! - Childless elements without text self-close (`<br/>`).
//! - Text and tail escape `&`, `<`, `>`; attribute values also escape quotes.
//! - Pretty-printing puts every tag, text, and tail on its own line,
//!   indented by [`SerializeOptions::indent_str`] per level.
//! - `with_tail` only affects the element being serialized; tails of its
//!   descendants are always written.

use crate::encoding::{encode_from_utf8, EncodingError};
use crate::tracing_macros::debug_span;
use crate::tree::{Document, ElementId, ElementTree};
use crate::util::escape::{escape_attr, escape_text};

/// Options controlling serialization output.
///
/// # Examples
///
/// ```
/// use simpletree::Document;
/// use simpletree::serial::{serialize_with_options, SerializeOptions};
///
/// let mut doc = Document::new();
/// let root = doc.fromstring("<root><child>Hello</child></root>").unwrap().unwrap();
/// let xml = serialize_with_options(&doc, root, &SerializeOptions::default().pretty_print(true));
/// assert_eq!(xml, "<root>\n  <child>\n    Hello\n  </child>\n</root>\n");
/// ```
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Put every tag, text, and tail on its own indented line.
    /// Defaults to `false`.
    pub pretty_print: bool,
    /// Write the serialized element's own tail. Defaults to `true`.
    pub with_tail: bool,
    /// Prefix a serialized element with an XML declaration. Trees ignore
    /// this and write a declaration only when their `DocInfo` has a version.
    /// Defaults to `false`.
    pub xml_declaration: bool,
    /// Encode the output into bytes with this encoding label. Defaults to
    /// `None` (text output).
    pub encoding: Option<String>,
    /// The indentation string used for each level when pretty-printing.
    /// Defaults to two spaces.
    pub indent_str: String,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            pretty_print: false,
            with_tail: true,
            xml_declaration: false,
            encoding: None,
            indent_str: "  ".to_string(),
        }
    }
}

impl SerializeOptions {
    /// Enables or disables pretty-printing.
    #[must_use]
    pub fn pretty_print(mut self, yes: bool) -> Self {
        self.pretty_print = yes;
        self
    }

    /// Enables or disables writing the serialized element's tail.
    #[must_use]
    pub fn with_tail(mut self, yes: bool) -> Self {
        self.with_tail = yes;
        self
    }

    /// Enables or disables the XML declaration for element output.
    #[must_use]
    pub fn xml_declaration(mut self, yes: bool) -> Self {
        self.xml_declaration = yes;
        self
    }

    /// Requests encoded output. The label also appears in the declaration.
    #[must_use]
    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    /// Sets the indentation string used for each nesting level.
    #[must_use]
    pub fn indent_str(mut self, s: &str) -> Self {
        self.indent_str = s.to_string();
        self
    }
}

/// What to serialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// An element and its subtree.
    Element(ElementId),
    /// A tree: declaration and doctype from its [`DocInfo`](crate::DocInfo),
    /// then the root element.
    Tree(ElementTree),
}

impl From<ElementId> for Target {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}

impl From<ElementTree> for Target {
    fn from(tree: ElementTree) -> Self {
        Self::Tree(tree)
    }
}

impl From<&ElementTree> for Target {
    fn from(tree: &ElementTree) -> Self {
        Self::Tree(*tree)
    }
}

/// Serializer output: text, or bytes when an encoding was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Serialized {
    /// Unencoded output.
    Text(String),
    /// Output encoded with [`SerializeOptions::encoding`].
    Bytes(Vec<u8>),
}

impl Serialized {
    /// Returns the text, if no encoding was requested.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) => None,
        }
    }

    /// Returns the output as bytes (UTF-8 for text output).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    /// Converts into the text, if no encoding was requested.
    #[must_use]
    pub fn into_string(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) => None,
        }
    }

    /// Converts into bytes (UTF-8 for text output).
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }
}

/// Serializes an element or tree with default options.
///
/// # Examples
///
/// ```
/// use simpletree::Document;
/// use simpletree::serial::serialize;
///
/// let mut doc = Document::new();
/// let root = doc.create_element_with("root", [("interesting", "totally")]);
/// assert_eq!(serialize(&doc, root), r#"<root interesting="totally"/>"#);
/// ```
#[must_use]
pub fn serialize(doc: &Document, target: impl Into<Target>) -> String {
    serialize_with_options(doc, target, &SerializeOptions::default())
}

/// Serializes an element or tree to text with the given options.
///
/// [`SerializeOptions::encoding`] only names the encoding in the
/// declaration here; use [`tostring`] for encoded bytes.
#[must_use]
pub fn serialize_with_options(
    doc: &Document,
    target: impl Into<Target>,
    options: &SerializeOptions,
) -> String {
    debug_span!("serialize", pretty_print = options.pretty_print);
    let mut out = String::new();
    match target.into() {
        Target::Tree(tree) => {
            let info = doc.docinfo(&tree);
            // A tree's declaration comes from its DocInfo alone.
            if let Some(version) = info.xml_version.as_deref() {
                let encoding = options
                    .encoding
                    .as_deref()
                    .or(info.encoding.as_deref())
                    .unwrap_or("utf-8");
                write_declaration(&mut out, version, encoding);
            }
            if let Some(doctype) = &info.doctype {
                out.push_str(doctype);
                out.push('\n');
            }
            write_element(doc, tree.root(), options, &mut out);
        }
        Target::Element(id) => {
            if options.xml_declaration {
                write_declaration(
                    &mut out,
                    "1.0",
                    options.encoding.as_deref().unwrap_or("utf-8"),
                );
            }
            write_element(doc, id, options, &mut out);
        }
    }
    out
}

/// Serializes an element or tree, encoding the result when
/// [`SerializeOptions::encoding`] is set.
///
/// # Errors
///
/// Returns `EncodingError` if the encoding label is unknown.
///
/// # Examples
///
/// ```
/// use simpletree::Document;
/// use simpletree::serial::{tostring, SerializeOptions, Serialized};
///
/// let mut doc = Document::new();
/// let root = doc.create_element("caf\u{e9}");
/// let options = SerializeOptions::default().encoding("iso-8859-1");
/// let out = tostring(&doc, root.into(), &options).unwrap();
/// assert_eq!(out, Serialized::Bytes(b"<caf\xE9/>".to_vec()));
/// ```
pub fn tostring(
    doc: &Document,
    target: Target,
    options: &SerializeOptions,
) -> Result<Serialized, EncodingError> {
    let text = serialize_with_options(doc, target, options);
    match &options.encoding {
        None => Ok(Serialized::Text(text)),
        Some(label) => Ok(Serialized::Bytes(encode_from_utf8(&text, label)?)),
    }
}

fn write_declaration(out: &mut String, version: &str, encoding: &str) {
    out.push_str("<?xml version=\"");
    out.push_str(&escape_attr(version));
    out.push_str("\" encoding=\"");
    out.push_str(&escape_attr(encoding));
    out.push_str("\"?>\n");
}

enum Step {
    Enter(ElementId, usize),
    Exit(ElementId, usize),
}

fn write_element(doc: &Document, top: ElementId, options: &SerializeOptions, out: &mut String) {
    let mut stack = vec![Step::Enter(top, 0)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id, depth) => {
                let el = doc.element(id);
                write_indent(out, options, depth);
                out.push('<');
                out.push_str(&el.tag);
                for attr in &el.attrib {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(&attr.value));
                    out.push('"');
                }

                let children = doc.children(id);
                if children.is_empty() && el.text.is_none() {
                    out.push_str("/>");
                    write_newline(out, options);
                    write_tail(doc, id, top, depth, options, out);
                    continue;
                }

                out.push('>');
                write_newline(out, options);
                if let Some(text) = &el.text {
                    write_indent(out, options, depth + 1);
                    out.push_str(&escape_text(text));
                    write_newline(out, options);
                }
                stack.push(Step::Exit(id, depth));
                stack.extend(children.iter().rev().map(|&c| Step::Enter(c, depth + 1)));
            }
            Step::Exit(id, depth) => {
                write_indent(out, options, depth);
                out.push_str("</");
                out.push_str(doc.tag(id));
                out.push('>');
                write_newline(out, options);
                write_tail(doc, id, top, depth, options, out);
            }
        }
    }
}

fn write_tail(
    doc: &Document,
    id: ElementId,
    top: ElementId,
    depth: usize,
    options: &SerializeOptions,
    out: &mut String,
) {
    if id == top && !options.with_tail {
        return;
    }
    if let Some(tail) = doc.tail(id) {
        write_indent(out, options, depth);
        out.push_str(&escape_text(tail));
        write_newline(out, options);
    }
}

fn write_indent(out: &mut String, options: &SerializeOptions, depth: usize) {
    if options.pretty_print {
        for _ in 0..depth {
            out.push_str(&options.indent_str);
        }
    }
}

fn write_newline(out: &mut String, options: &SerializeOptions) {
    if options.pretty_print {
        out.push('\n');
    }
}
