//! Per-element storage and the attribute map.
//!
//! `ElementData` carries the payload of one element (tag, attributes, text,
//! tail). Structural links (parent, children, owning tree) are private and
//! only change through [`Document`](super::Document) mutation methods, which
//! keep them consistent.

use super::{DocInfoId, ElementId};

/// Storage for a single element in the document arena.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// The element name.
    pub tag: String,
    /// Attributes in insertion order.
    pub attrib: Attributes,
    /// Character data before the first child, if any.
    pub text: Option<String>,
    /// Character data after the closing tag, up to the next sibling.
    pub tail: Option<String>,
    pub(super) parent: Option<ElementId>,
    pub(super) children: Vec<ElementId>,
    pub(super) tree: Option<DocInfoId>,
}

impl ElementData {
    pub(super) fn new(tag: String, attrib: Attributes) -> Self {
        Self {
            tag,
            attrib,
            text: None,
            tail: None,
            parent: None,
            children: Vec::new(),
            tree: None,
        }
    }
}

/// A single `name="value"` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name.
    pub name: String,
    /// The attribute value (entity references already decoded).
    pub value: String,
}

/// An ordered attribute mapping with unique names.
///
/// Lookups are linear; elements rarely carry more than a handful of
/// attributes. Setting an existing name replaces its value in place, so the
/// original position is kept. Equality ignores order.
///
/// # Examples
///
/// ```
/// use simpletree::Attributes;
///
/// let mut attrs = Attributes::new();
/// attrs.set("b", "2");
/// attrs.set("a", "1");
/// attrs.set("b", "3");
/// assert_eq!(attrs.keys().collect::<Vec<_>>(), ["b", "a"]);
/// assert_eq!(attrs.get("b"), Some("3"));
/// ```
#[derive(Debug, Clone, Default, Eq)]
pub struct Attributes {
    entries: Vec<Attribute>,
}

impl Attributes {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Sets `name` to `value`, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.entries.push(Attribute { name, value }),
        }
    }

    /// Removes `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.entries.iter().position(|a| a.name == name)?;
        Some(self.entries.remove(pos).value)
    }

    /// Returns `true` if `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|a| a.name == name)
    }

    /// Attribute names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|a| a.name.as_str())
    }

    /// Attribute values in order.
    pub fn values(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|a| a.value.as_str())
    }

    /// `(name, value)` pairs in order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_str()))
    }

    /// Iterates over the stored attributes.
    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.entries.iter()
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every attribute.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|a| other.get(&a.name) == Some(a.value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Self::new();
        attrs.extend(iter);
        attrs
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Attributes {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.set(name, value);
        }
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
