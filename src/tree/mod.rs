//! Arena-based element tree.
//!
//! All elements live in a contiguous `Vec<ElementData>` owned by the
//! [`Document`] and are referenced by [`ElementId`], a newtype over
//! `NonZeroU32`. Each element keeps its ordered child list and a non-owning
//! parent index; every mutation method updates both sides, so
//! `children(parent(e))` contains `e` exactly when `parent(e)` is set.
//!
//! Identity is index identity: two elements with the same tag, attributes
//! and content are still different elements.
//!
//! Detached elements stay allocated until the `Document` is dropped; they
//! can be re-attached at any time.

mod docinfo;
mod iter;
mod node;

pub use docinfo::{DocInfo, DocInfoId, ElementTree};
pub use iter::{Ancestors, Children, DepthFirst, ElementIter, Siblings, Traversal};
pub use node::{Attribute, Attributes, ElementData};

use std::io::Read;
use std::num::NonZeroU32;

use crate::encoding::EncodingError;
use crate::error::{ParseError, TreeError};
use crate::serial::{SerializeOptions, Serialized, Target};
use docinfo::EMPTY_DOCINFO;

/// A typed index into the document's element arena.
///
/// `Option<ElementId>` has the same size as `ElementId` (niche optimization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ElementId(NonZeroU32);

impl ElementId {
    /// Creates an `ElementId` from a raw arena index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0 or does not fit in `u32`.
    #[allow(clippy::expect_used)]
    fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index).expect("element arena exceeds u32::MAX entries");
        Self(NonZeroU32::new(raw).expect("ElementId index must be non-zero"))
    }

    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// An arena of elements and the document metadata attached to them.
///
/// A `Document` can hold any number of independent trees; an element
/// created with [`create_element`](Document::create_element) is its own
/// root until it is appended somewhere.
///
/// # Examples
///
/// ```
/// use simpletree::Document;
///
/// let mut doc = Document::new();
/// let root = doc.create_element("root");
/// let child = doc.sub_element(root, "child");
/// doc.set(child, "name", "value");
/// doc.set_text(child, "hello");
///
/// assert_eq!(doc.parent(child), Some(root));
/// assert_eq!(
///     simpletree::serial::serialize(&doc, root),
///     r#"<root><child name="value">hello</child></root>"#
/// );
/// ```
#[derive(Debug)]
pub struct Document {
    /// The element arena. Index 0 is unused (placeholder for `NonZeroU32`).
    nodes: Vec<ElementData>,
    docinfos: Vec<DocInfo>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(ElementData::new(String::new(), Attributes::new()));
        Self {
            nodes,
            docinfos: Vec::new(),
        }
    }

    // --- Parsing and serialization ---

    /// Parses `text` and returns its root element, or `None` when the input
    /// holds no element at all.
    ///
    /// The root carries the parsed [`DocInfo`]; see [`root_tree`](Self::root_tree).
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for a mismatched closing tag and for any other
    /// malformed markup.
    ///
    /// # Examples
    ///
    /// ```
    /// use simpletree::Document;
    ///
    /// let mut doc = Document::new();
    /// let root = doc.fromstring("<root><a>x</a></root>").unwrap().unwrap();
    /// assert_eq!(doc.text(doc.child(root, 0).unwrap()), Some("x"));
    /// assert_eq!(doc.fromstring("no markup here").unwrap(), None);
    /// ```
    pub fn fromstring(&mut self, text: &str) -> Result<Option<ElementId>, ParseError> {
        Ok(crate::parser::parse_str(self, text)?.map(|tree| tree.root))
    }

    /// Alias of [`fromstring`](Self::fromstring).
    ///
    /// # Errors
    ///
    /// See [`fromstring`](Self::fromstring).
    pub fn xml(&mut self, text: &str) -> Result<Option<ElementId>, ParseError> {
        self.fromstring(text)
    }

    /// Reads a whole source and parses it into an [`ElementTree`].
    ///
    /// The bytes are decoded according to their BOM or declared encoding.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if reading fails, the bytes cannot be decoded,
    /// or the markup is malformed.
    pub fn parse(&mut self, source: impl Read) -> Result<Option<ElementTree>, ParseError> {
        crate::parser::parse_reader(self, source)
    }

    /// Serializes an element or a tree.
    ///
    /// Returns text, or encoded bytes when [`SerializeOptions::encoding`]
    /// is set.
    ///
    /// # Errors
    ///
    /// Returns `EncodingError` if the requested encoding is unknown.
    pub fn tostring(
        &self,
        target: impl Into<Target>,
        options: &SerializeOptions,
    ) -> Result<Serialized, EncodingError> {
        crate::serial::tostring(self, target.into(), options)
    }

    // --- Construction ---

    /// Allocates a new parentless element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> ElementId {
        self.create_element_with(tag, std::iter::empty::<(String, String)>())
    }

    /// Allocates a new parentless element with attributes.
    ///
    /// ```
    /// use simpletree::Document;
    ///
    /// let mut doc = Document::new();
    /// let root = doc.create_element_with("root", [("interesting", "totally")]);
    /// assert_eq!(doc.get(root, "interesting"), Some("totally"));
    /// ```
    pub fn create_element_with<K, V>(
        &mut self,
        tag: impl Into<String>,
        attrib: impl IntoIterator<Item = (K, V)>,
    ) -> ElementId
    where
        K: Into<String>,
        V: Into<String>,
    {
        let id = ElementId::from_index(self.nodes.len());
        self.nodes
            .push(ElementData::new(tag.into(), attrib.into_iter().collect()));
        id
    }

    /// Creates an element and appends it to `parent`.
    pub fn sub_element(&mut self, parent: ElementId, tag: impl Into<String>) -> ElementId {
        self.sub_element_with(parent, tag, std::iter::empty::<(String, String)>())
    }

    /// Creates an element with attributes and appends it to `parent`.
    pub fn sub_element_with<K, V>(
        &mut self,
        parent: ElementId,
        tag: impl Into<String>,
        attrib: impl IntoIterator<Item = (K, V)>,
    ) -> ElementId
    where
        K: Into<String>,
        V: Into<String>,
    {
        let child = self.create_element_with(tag, attrib);
        self.push_child(parent, child);
        child
    }

    /// Returns `true` if `id` names an element of this document.
    #[must_use]
    pub fn is_element(&self, id: ElementId) -> bool {
        (1..self.nodes.len()).contains(&id.as_index())
    }

    /// Number of elements ever allocated in this document.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.nodes.len() - 1
    }

    // --- Element payload ---

    /// Returns the storage for an element.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this document.
    #[must_use]
    pub fn element(&self, id: ElementId) -> &ElementData {
        &self.nodes[id.as_index()]
    }

    /// Returns mutable storage for an element (tag, attributes, text, tail).
    pub fn element_mut(&mut self, id: ElementId) -> &mut ElementData {
        &mut self.nodes[id.as_index()]
    }

    /// The element's tag name.
    #[must_use]
    pub fn tag(&self, id: ElementId) -> &str {
        &self.element(id).tag
    }

    /// The element's text, if any.
    #[must_use]
    pub fn text(&self, id: ElementId) -> Option<&str> {
        self.element(id).text.as_deref()
    }

    /// The element's tail, if any.
    #[must_use]
    pub fn tail(&self, id: ElementId) -> Option<&str> {
        self.element(id).tail.as_deref()
    }

    /// Sets the element's text.
    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        self.element_mut(id).text = Some(text.into());
    }

    /// Sets the element's tail.
    pub fn set_tail(&mut self, id: ElementId, tail: impl Into<String>) {
        self.element_mut(id).tail = Some(tail.into());
    }

    // --- Attributes ---

    /// Returns an attribute value, or `None` if it is not set.
    #[must_use]
    pub fn get(&self, id: ElementId, name: &str) -> Option<&str> {
        self.element(id).attrib.get(name)
    }

    /// Returns an attribute value, or `default` if it is not set.
    #[must_use]
    pub fn get_or<'a>(&'a self, id: ElementId, name: &str, default: &'a str) -> &'a str {
        self.get(id, name).unwrap_or(default)
    }

    /// Sets an attribute.
    pub fn set(&mut self, id: ElementId, name: impl Into<String>, value: impl Into<String>) {
        self.element_mut(id).attrib.set(name, value);
    }

    /// Attribute names in order.
    pub fn keys(&self, id: ElementId) -> impl Iterator<Item = &str> + '_ {
        self.element(id).attrib.keys()
    }

    /// Attribute values in order.
    pub fn values(&self, id: ElementId) -> impl Iterator<Item = &str> + '_ {
        self.element(id).attrib.values()
    }

    /// `(name, value)` pairs in order.
    pub fn items(&self, id: ElementId) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.element(id).attrib.items()
    }

    /// The element's attribute map.
    #[must_use]
    pub fn attrib(&self, id: ElementId) -> &Attributes {
        &self.element(id).attrib
    }

    /// The element's own attribute map; changes are visible on the element.
    pub fn attrib_mut(&mut self, id: ElementId) -> &mut Attributes {
        &mut self.element_mut(id).attrib
    }

    // --- Navigation ---

    /// The element's parent.
    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.element(id).parent
    }

    /// The element's children in order.
    #[must_use]
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self.element(id).children
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self, id: ElementId) -> usize {
        self.element(id).children.len()
    }

    /// Child at `index`; negative indices count from the end.
    #[must_use]
    pub fn child(&self, parent: ElementId, index: isize) -> Option<ElementId> {
        let children = self.children(parent);
        resolve_index(index, children.len()).map(|i| children[i])
    }

    /// Position of `child` among the children of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotAChild`] if `child` is not a direct child.
    pub fn index(&self, parent: ElementId, child: ElementId) -> Result<usize, TreeError> {
        self.children(parent)
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NotAChild)
    }

    /// The sibling right after `id`.
    #[must_use]
    pub fn next_sibling(&self, id: ElementId) -> Option<ElementId> {
        let parent = self.parent(id)?;
        let pos = self.index(parent, id).ok()?;
        self.children(parent).get(pos + 1).copied()
    }

    /// The sibling right before `id`.
    #[must_use]
    pub fn prev_sibling(&self, id: ElementId) -> Option<ElementId> {
        let parent = self.parent(id)?;
        let pos = self.index(parent, id).ok()?;
        pos.checked_sub(1).map(|p| self.children(parent)[p])
    }

    /// First direct child with the given tag.
    #[must_use]
    pub fn find(&self, id: ElementId, tag: &str) -> Option<ElementId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.tag(c) == tag)
    }

    /// All direct children with the given tag, in order.
    #[must_use]
    pub fn find_all(&self, id: ElementId, tag: &str) -> Vec<ElementId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.tag(c) == tag)
            .collect()
    }

    // --- Mutation ---

    /// Appends `child` to `parent`, detaching it from its old parent first.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::WouldCycle`] if `child` is `parent` or one of its
    /// ancestors.
    pub fn append(&mut self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        self.check_cycle(parent, child)?;
        self.detach(child);
        self.push_child(parent, child);
        Ok(())
    }

    /// Inserts `child` at `index` with list-insert semantics: negative
    /// indices count from the end and out-of-range indices clamp.
    ///
    /// The index is applied after `child` has been detached from its old
    /// position.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::WouldCycle`] if `child` is `parent` or one of its
    /// ancestors.
    pub fn insert(
        &mut self,
        parent: ElementId,
        index: isize,
        child: ElementId,
    ) -> Result<(), TreeError> {
        self.check_cycle(parent, child)?;
        self.detach(child);
        let pos = clamp_index(index, self.len(parent));
        self.insert_at(parent, pos, child);
        Ok(())
    }

    /// Removes `child` from `parent` and clears its parent link.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotAChild`] if `child` is not a direct child.
    pub fn remove(&mut self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        let pos = self.index(parent, child)?;
        self.element_mut(parent).children.remove(pos);
        self.element_mut(child).parent = None;
        Ok(())
    }

    /// Removes and returns the child at `index` (negative counts from the end).
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::IndexOutOfRange`] if there is no such child.
    pub fn remove_at(&mut self, parent: ElementId, index: isize) -> Result<ElementId, TreeError> {
        let len = self.len(parent);
        let pos = resolve_index(index, len).ok_or(TreeError::IndexOutOfRange { index, len })?;
        let child = self.element_mut(parent).children.remove(pos);
        self.element_mut(child).parent = None;
        Ok(child)
    }

    /// Puts `new` in the position of `old`; `old` becomes parentless.
    ///
    /// Text and tail stay with their elements.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NotAChild`] if `old` is not a child of `parent`,
    /// or [`TreeError::WouldCycle`] if `new` is an ancestor of `parent`.
    pub fn replace(
        &mut self,
        parent: ElementId,
        old: ElementId,
        new: ElementId,
    ) -> Result<(), TreeError> {
        self.index(parent, old)?;
        if old == new {
            return Ok(());
        }
        self.check_cycle(parent, new)?;
        self.detach(new);
        let pos = self.index(parent, old)?;
        self.element_mut(parent).children[pos] = new;
        self.element_mut(new).parent = Some(parent);
        self.element_mut(old).parent = None;
        Ok(())
    }

    /// Inserts `el` directly after `id` under the same parent.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NoParent`] if `id` has no parent, or
    /// [`TreeError::WouldCycle`] if `el` is an ancestor of `id`.
    pub fn add_next(&mut self, id: ElementId, el: ElementId) -> Result<(), TreeError> {
        self.add_sibling(id, el, 1)
    }

    /// Inserts `el` directly before `id` under the same parent.
    ///
    /// # Errors
    ///
    /// Same as [`add_next`](Self::add_next).
    pub fn add_previous(&mut self, id: ElementId, el: ElementId) -> Result<(), TreeError> {
        self.add_sibling(id, el, 0)
    }

    fn add_sibling(&mut self, id: ElementId, el: ElementId, offset: usize) -> Result<(), TreeError> {
        let parent = self.parent(id).ok_or(TreeError::NoParent)?;
        if el == id {
            return Ok(());
        }
        self.check_cycle(parent, el)?;
        self.detach(el);
        let pos = self.index(parent, id)?;
        self.insert_at(parent, pos + offset, el);
        Ok(())
    }

    /// Detaches an element from its parent, if it has one.
    pub fn detach(&mut self, id: ElementId) {
        let Some(parent) = self.element(id).parent else {
            return;
        };
        self.element_mut(parent).children.retain(|&c| c != id);
        self.element_mut(id).parent = None;
    }

    /// Appends a freshly created, parentless element without checks.
    pub(crate) fn push_child(&mut self, parent: ElementId, child: ElementId) {
        debug_assert!(self.element(child).parent.is_none(), "child already has a parent");
        self.element_mut(parent).children.push(child);
        self.element_mut(child).parent = Some(parent);
    }

    fn insert_at(&mut self, parent: ElementId, pos: usize, child: ElementId) {
        self.element_mut(parent).children.insert(pos, child);
        self.element_mut(child).parent = Some(parent);
    }

    fn check_cycle(&self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        let mut current = Some(parent);
        while let Some(id) = current {
            if id == child {
                return Err(TreeError::WouldCycle);
            }
            current = self.parent(id);
        }
        Ok(())
    }

    // --- Trees and document metadata ---

    /// Wraps `root` in an [`ElementTree`].
    ///
    /// If `root` carries a tree reference (it was produced by the parser) the
    /// wrapper shares that tree's [`DocInfo`]; otherwise the tree starts with
    /// empty metadata of its own.
    #[must_use]
    pub fn element_tree(&self, root: ElementId) -> ElementTree {
        ElementTree {
            root,
            docinfo: self.element(root).tree,
        }
    }

    /// Returns the tree an element belongs to.
    ///
    /// Walks up the parent chain to the nearest element with a tree
    /// reference; if none carries one, the topmost element is wrapped in a
    /// new tree.
    ///
    /// ```
    /// use simpletree::Document;
    ///
    /// let mut doc = Document::new();
    /// let root = doc.fromstring("<?xml version='1.0'?><root><a/></root>").unwrap().unwrap();
    /// let a = doc.child(root, 0).unwrap();
    /// let tree = doc.root_tree(a);
    /// assert_eq!(tree.root(), root);
    /// assert_eq!(doc.docinfo(&tree).xml_version.as_deref(), Some("1.0"));
    /// ```
    #[must_use]
    pub fn root_tree(&self, id: ElementId) -> ElementTree {
        let mut current = id;
        loop {
            let data = self.element(current);
            if data.tree.is_some() {
                return self.element_tree(current);
            }
            match data.parent {
                Some(parent) => current = parent,
                None => return self.element_tree(current),
            }
        }
    }

    /// The tree's document metadata.
    #[must_use]
    pub fn docinfo(&self, tree: &ElementTree) -> &DocInfo {
        tree.docinfo.map_or(&EMPTY_DOCINFO, |id| &self.docinfos[id.0])
    }

    /// Mutable document metadata, allocated on first use.
    pub fn docinfo_mut(&mut self, tree: &mut ElementTree) -> &mut DocInfo {
        let id = match tree.docinfo {
            Some(id) => id,
            None => {
                let id = DocInfoId(self.docinfos.len());
                self.docinfos.push(DocInfo::default());
                tree.docinfo = Some(id);
                id
            }
        };
        &mut self.docinfos[id.0]
    }

    /// Makes `root` the root of a new tree that owns `docinfo`.
    pub(crate) fn attach_tree(&mut self, root: ElementId, docinfo: DocInfo) -> ElementTree {
        let id = DocInfoId(self.docinfos.len());
        self.docinfos.push(docinfo);
        self.element_mut(root).tree = Some(id);
        ElementTree {
            root,
            docinfo: Some(id),
        }
    }

    // --- Iteration ---

    /// Pre-order traversal of the subtree, starting with `id` itself.
    #[must_use]
    pub fn iter(&self, id: ElementId) -> ElementIter<'_, DepthFirst> {
        ElementIter::new(self, DepthFirst::new(self, id, true))
    }

    /// Pre-order traversal of the subtree, excluding `id`.
    #[must_use]
    pub fn iter_descendants(&self, id: ElementId) -> ElementIter<'_, DepthFirst> {
        ElementIter::new(self, DepthFirst::new(self, id, false))
    }

    /// Direct children, optionally last to first.
    #[must_use]
    pub fn iter_children(&self, id: ElementId, reversed: bool) -> ElementIter<'_, Children> {
        ElementIter::new(self, Children::new(self, id, reversed))
    }

    /// Following siblings, or preceding siblings nearest first.
    #[must_use]
    pub fn iter_siblings(&self, id: ElementId, preceding: bool) -> ElementIter<'_, Siblings> {
        ElementIter::new(self, Siblings::new(id, preceding))
    }

    /// Parent, grandparent, and so on up to the top.
    #[must_use]
    pub fn iter_ancestors(&self, id: ElementId) -> ElementIter<'_, Ancestors> {
        ElementIter::new(self, Ancestors::new(id))
    }

    // --- Comparison ---

    /// Compares two subtrees by tag, attributes, text, tail, and children.
    ///
    /// `other` may be this document or a different one. Attribute order is
    /// ignored.
    #[must_use]
    pub fn subtree_eq(&self, a: ElementId, other: &Document, b: ElementId) -> bool {
        let mut pending = vec![(a, b)];
        while let Some((x, y)) = pending.pop() {
            let left = self.element(x);
            let right = other.element(y);
            if left.tag != right.tag
                || left.attrib != right.attrib
                || left.text != right.text
                || left.tail != right.tail
                || left.children.len() != right.children.len()
            {
                return false;
            }
            pending.extend(left.children.iter().copied().zip(right.children.iter().copied()));
        }
        true
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves a possibly negative index against `len` for element access.
fn resolve_index(index: isize, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        len.checked_sub(index.unsigned_abs())?
    } else {
        index.unsigned_abs()
    };
    (resolved < len).then_some(resolved)
}

/// Resolves an insertion index the way list insertion does: negative
/// indices count from the end and the result is clamped to `0..=len`.
fn clamp_index(index: isize, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs())
    } else {
        index.unsigned_abs().min(len)
    }
}
