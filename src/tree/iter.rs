//! Element traversal iterators.
//!
//! Every traversal order implements [`Traversal`], a cursor that advances
//! over the document one element at a time. [`ElementIter`] couples a
//! traversal with a borrowed [`Document`] and an optional tag filter. The
//! filter only decides what is yielded; the traversal still walks through
//! non-matching elements, so results always come out in traversal order.
//!
//! Iterators borrow the document shared, so the tree cannot change under
//! them.

use super::{Document, ElementId};

/// A traversal order over elements of a [`Document`].
pub trait Traversal {
    /// Moves to the next element, or returns `None` when exhausted.
    fn advance(&mut self, doc: &Document) -> Option<ElementId>;
}

/// A lazy, single-pass sequence of elements with an optional tag filter.
///
/// # Examples
///
/// ```
/// use simpletree::Document;
///
/// let mut doc = Document::new();
/// let root = doc.fromstring("<root><a/><b/><c><a/></c></root>").unwrap().unwrap();
/// let tags: Vec<_> = doc.iter(root).tags(["a", "c"]).map(|e| doc.tag(e)).collect();
/// assert_eq!(tags, ["a", "c", "a"]);
/// ```
#[derive(Debug, Clone)]
pub struct ElementIter<'a, T> {
    doc: &'a Document,
    traversal: T,
    tags: Vec<String>,
}

impl<'a, T: Traversal> ElementIter<'a, T> {
    pub(super) fn new(doc: &'a Document, traversal: T) -> Self {
        Self {
            doc,
            traversal,
            tags: Vec::new(),
        }
    }

    /// Restricts the yielded elements to those whose tag is in `tags`.
    ///
    /// An empty set yields every element.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags.into_iter().map(|t| t.as_ref().to_owned()).collect();
        self
    }

    fn matches(&self, id: ElementId) -> bool {
        self.tags.is_empty() || self.tags.iter().any(|t| *t == self.doc.tag(id))
    }
}

impl<T: Traversal> Iterator for ElementIter<'_, T> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        loop {
            let id = self.traversal.advance(self.doc)?;
            if self.matches(id) {
                return Some(id);
            }
        }
    }
}

/// Pre-order depth-first traversal of a subtree.
///
/// Uses an explicit stack of `(parent, next child index)` frames, so the
/// call stack does not grow with nesting depth. Siblings of the start
/// element are never visited.
#[derive(Debug, Clone)]
pub struct DepthFirst {
    next: Option<ElementId>,
    stack: Vec<(ElementId, usize)>,
}

impl DepthFirst {
    /// Starts at `start`; when `inclusive` is false the start element itself
    /// is skipped.
    #[must_use]
    pub fn new(doc: &Document, start: ElementId, inclusive: bool) -> Self {
        let mut traversal = Self {
            next: Some(start),
            stack: Vec::new(),
        };
        if !inclusive {
            traversal.next = traversal.successor(doc, start);
        }
        traversal
    }

    fn successor(&mut self, doc: &Document, current: ElementId) -> Option<ElementId> {
        if let Some(&first) = doc.children(current).first() {
            self.stack.push((current, 1));
            return Some(first);
        }
        while let Some((parent, index)) = self.stack.last_mut() {
            if let Some(&sibling) = doc.children(*parent).get(*index) {
                *index += 1;
                return Some(sibling);
            }
            self.stack.pop();
        }
        None
    }
}

impl Traversal for DepthFirst {
    fn advance(&mut self, doc: &Document) -> Option<ElementId> {
        let current = self.next?;
        self.next = self.successor(doc, current);
        Some(current)
    }
}

/// Direct children, forwards or in reverse.
#[derive(Debug, Clone)]
pub struct Children {
    parent: ElementId,
    front: usize,
    back: usize,
    reversed: bool,
}

impl Children {
    /// Iterates over the children of `parent`.
    #[must_use]
    pub fn new(doc: &Document, parent: ElementId, reversed: bool) -> Self {
        Self {
            parent,
            front: 0,
            back: doc.len(parent),
            reversed,
        }
    }
}

impl Traversal for Children {
    fn advance(&mut self, doc: &Document) -> Option<ElementId> {
        if self.front >= self.back {
            return None;
        }
        let index = if self.reversed {
            self.back -= 1;
            self.back
        } else {
            self.front += 1;
            self.front - 1
        };
        doc.children(self.parent).get(index).copied()
    }
}

/// Following (or preceding) siblings, nearest first.
#[derive(Debug, Clone)]
pub struct Siblings {
    current: ElementId,
    preceding: bool,
    done: bool,
}

impl Siblings {
    /// Starts beside `start`, which itself is not yielded.
    #[must_use]
    pub fn new(start: ElementId, preceding: bool) -> Self {
        Self {
            current: start,
            preceding,
            done: false,
        }
    }
}

impl Traversal for Siblings {
    fn advance(&mut self, doc: &Document) -> Option<ElementId> {
        if self.done {
            return None;
        }
        let next = if self.preceding {
            doc.prev_sibling(self.current)
        } else {
            doc.next_sibling(self.current)
        };
        match next {
            Some(id) => self.current = id,
            None => self.done = true,
        }
        next
    }
}

/// Parent chain up to the topmost element.
#[derive(Debug, Clone)]
pub struct Ancestors {
    current: Option<ElementId>,
}

impl Ancestors {
    /// Starts at the parent of `start`.
    #[must_use]
    pub fn new(start: ElementId) -> Self {
        Self {
            current: Some(start),
        }
    }
}

impl Traversal for Ancestors {
    fn advance(&mut self, doc: &Document) -> Option<ElementId> {
        let parent = doc.parent(self.current?);
        self.current = parent;
        parent
    }
}
