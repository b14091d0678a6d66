//! Document-level metadata and the `ElementTree` wrapper.

use super::ElementId;

/// Typed index of a [`DocInfo`] stored in a [`Document`](super::Document).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocInfoId(pub(super) usize);

/// Metadata read from the XML declaration and `<!DOCTYPE>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocInfo {
    /// `version` from the XML declaration (e.g. `"1.0"`).
    pub xml_version: Option<String>,
    /// `encoding` from the XML declaration, if one was given.
    pub encoding: Option<String>,
    /// The `<!DOCTYPE ...>` text with any internal subset removed.
    pub doctype: Option<String>,
}

pub(super) static EMPTY_DOCINFO: DocInfo = DocInfo {
    xml_version: None,
    encoding: None,
    doctype: None,
};

/// A root element paired with its document metadata.
///
/// `ElementTree` is a lightweight handle: it does not own its root, and
/// several trees may view the same element. Trees produced by the parser
/// share their `DocInfo` with the root element, so
/// [`Document::root_tree`](super::Document::root_tree) on any element of a
/// parsed document finds it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementTree {
    pub(super) root: ElementId,
    pub(super) docinfo: Option<DocInfoId>,
}

impl ElementTree {
    /// Returns the root element.
    #[must_use]
    pub fn root(&self) -> ElementId {
        self.root
    }
}
