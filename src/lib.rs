//! # simpletree
//!
//! A small element tree in the style of `lxml.etree`: elements with a tag,
//! attributes, text, tail, and ordered children; a parser that builds such
//! trees from markup; a serializer that writes them back; and a family of
//! lazy traversal iterators with tag filtering.
//!
//! Elements live in a [`Document`] arena and are addressed by copyable
//! [`ElementId`]s. Parent links are indices, so a child never owns its
//! parent, and all structural edits go through `Document` methods that keep
//! both directions consistent.
//!
//! ## Quick Start
//!
//! ```
//! use simpletree::{Document, SerializeOptions};
//!
//! let mut doc = Document::new();
//! let root = doc.fromstring("<root><a>one</a><b/></root>").unwrap().unwrap();
//!
//! let b = doc.find(root, "b").unwrap();
//! let c = doc.create_element_with("c", [("k", "v")]);
//! doc.add_next(b, c).unwrap();
//!
//! let tags: Vec<_> = doc.iter(root).map(|e| doc.tag(e)).collect();
//! assert_eq!(tags, ["root", "a", "b", "c"]);
//!
//! let out = doc.tostring(root, &SerializeOptions::default()).unwrap();
//! assert_eq!(out.as_str(), Some(r#"<root><a>one</a><b/><c k="v"/></root>"#));
//! ```
//!
//! ## Features
//!
//! - `tracing`: emit parser and serializer events through the `tracing`
//!   crate. Off by default.

pub mod encoding;
pub mod error;
pub mod parser;
pub mod serial;
pub mod tree;
pub mod util;

mod tracing_macros;

// Re-export primary types at the crate root for convenience.
pub use error::{ParseError, ParseErrorKind, TreeError};
pub use parser::ParseOptions;
pub use serial::{SerializeOptions, Serialized, Target};
pub use tree::{Attribute, Attributes, DocInfo, Document, ElementData, ElementId, ElementTree};
