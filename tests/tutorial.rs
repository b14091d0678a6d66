//! Walkthrough of the lxml tutorial API surface.
//!
//! Each section mirrors one part of the tutorial: building elements,
//! attributes, text and tail, iteration, trees, serialization, and parsing.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use simpletree::serial::{serialize, serialize_with_options};
use simpletree::{Document, ElementId, SerializeOptions, Serialized, TreeError};

fn tags(doc: &Document, ids: impl IntoIterator<Item = ElementId>) -> Vec<&str> {
    ids.into_iter().map(|id| doc.tag(id)).collect()
}

/// `root > [a, b, c, d]`, `d > [e]`.
fn abcde() -> (Document, ElementId) {
    let mut doc = Document::new();
    let root = doc.create_element("root");
    for tag in ["a", "b", "c", "d"] {
        doc.sub_element(root, tag);
    }
    let d = doc.find(root, "d").unwrap();
    doc.sub_element(d, "e");
    (doc, root)
}

// ---------------------------------------------------------------------------
// Elements are lists
// ---------------------------------------------------------------------------

#[test]
fn test_elements_are_lists() {
    let mut doc = Document::new();
    let root = doc.create_element("root");
    assert_eq!(doc.tag(root), "root");

    let child1 = doc.create_element("child1");
    doc.append(root, child1).unwrap();
    doc.sub_element(root, "child2");
    doc.sub_element(root, "child3");

    let pretty = SerializeOptions::default().pretty_print(true);
    assert_eq!(
        serialize_with_options(&doc, root, &pretty),
        "<root>\n  <child1/>\n  <child2/>\n  <child3/>\n</root>\n"
    );

    assert_eq!(doc.tag(doc.child(root, 0).unwrap()), "child1");
    assert_eq!(doc.len(root), 3);
    assert_eq!(doc.index(root, doc.child(root, 1).unwrap()), Ok(1));
    assert_eq!(tags(&doc, doc.children(root).iter().copied()), ["child1", "child2", "child3"]);

    let child0 = doc.create_element("child0");
    doc.insert(root, 0, child0).unwrap();
    let start = &doc.children(root)[..1];
    let end = &doc.children(root)[doc.len(root) - 1..];
    assert_eq!(doc.tag(start[0]), "child0");
    assert_eq!(doc.tag(end[0]), "child3");

    assert!(doc.is_element(root));
    let first = doc.child(root, 0).unwrap();
    let second = doc.child(root, 1).unwrap();
    assert_eq!(doc.parent(first), Some(root));
    assert_eq!(doc.prev_sibling(second), Some(first));
    assert_eq!(doc.next_sibling(first), Some(second));
}

// ---------------------------------------------------------------------------
// Elements carry attributes as a dict
// ---------------------------------------------------------------------------

#[test]
fn test_elements_carry_attributes() {
    let mut doc = Document::new();
    let root = doc.create_element_with("root", [("interesting", "totally")]);
    assert_eq!(serialize(&doc, root), r#"<root interesting="totally"/>"#);
    assert_eq!(doc.get(root, "interesting"), Some("totally"));
    assert_eq!(doc.get(root, "hello"), None);

    doc.set(root, "hello", "Huhu");
    assert_eq!(doc.get(root, "hello"), Some("Huhu"));

    let mut keys: Vec<_> = doc.keys(root).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["hello", "interesting"]);

    let mut items: Vec<_> = doc.items(root).collect();
    items.sort_unstable();
    assert_eq!(items, [("hello", "Huhu"), ("interesting", "totally")]);

    let attributes = doc.attrib_mut(root);
    assert_eq!(attributes.get("no-such-attribute"), None);
    attributes.set("hello", "Guten Tag");
    assert_eq!(attributes.get("hello"), Some("Guten Tag"));
    assert_eq!(doc.get(root, "hello"), Some("Guten Tag"));
}

// ---------------------------------------------------------------------------
// Elements contain text
// ---------------------------------------------------------------------------

#[test]
fn test_elements_contain_text() {
    let mut doc = Document::new();
    let root = doc.create_element("root");
    doc.set_text(root, "TEXT");
    assert_eq!(doc.text(root), Some("TEXT"));
    assert_eq!(serialize(&doc, root), "<root>TEXT</root>");

    let html = doc.create_element("html");
    let body = doc.sub_element(html, "body");
    doc.set_text(body, "TEXT");
    assert_eq!(serialize(&doc, html), "<html><body>TEXT</body></html>");

    let br = doc.sub_element(body, "br");
    assert_eq!(serialize(&doc, html), "<html><body>TEXT<br/></body></html>");

    doc.set_tail(br, "TAIL");
    assert_eq!(serialize(&doc, html), "<html><body>TEXT<br/>TAIL</body></html>");
    assert_eq!(serialize(&doc, br), "<br/>TAIL");

    let no_tail = SerializeOptions::default().with_tail(false);
    assert_eq!(serialize_with_options(&doc, br, &no_tail), "<br/>");
}

// ---------------------------------------------------------------------------
// Tree iteration
// ---------------------------------------------------------------------------

#[test]
fn test_tree_iteration() {
    let mut doc = Document::new();
    let root = doc.create_element("root");
    for (tag, text) in [("child", "Child 1"), ("child", "Child 2"), ("another", "Child 3")] {
        let el = doc.sub_element(root, tag);
        doc.set_text(el, text);
    }

    let all: Vec<_> = doc
        .iter(root)
        .map(|e| (doc.tag(e), doc.text(e)))
        .collect();
    assert_eq!(
        all,
        [
            ("root", None),
            ("child", Some("Child 1")),
            ("child", Some("Child 2")),
            ("another", Some("Child 3")),
        ]
    );

    let filtered: Vec<_> = doc
        .iter(root)
        .tags(["another", "child"])
        .map(|e| doc.text(e).unwrap())
        .collect();
    assert_eq!(filtered, ["Child 1", "Child 2", "Child 3"]);
}

// ---------------------------------------------------------------------------
// Trees and documents
// ---------------------------------------------------------------------------

#[test]
fn test_trees_and_documents() {
    let (doc, root) = abcde();
    let pretty = SerializeOptions::default().pretty_print(true);
    assert_eq!(
        serialize_with_options(&doc, root, &pretty),
        "<root>\n  <a/>\n  <b/>\n  <c/>\n  <d>\n    <e/>\n  </d>\n</root>\n"
    );

    let d = doc.find(root, "d").unwrap();
    assert_eq!(doc.root_tree(d).root(), root);

    let tree = doc.element_tree(d);
    assert_eq!(tree.root(), d);
    assert_eq!(serialize(&doc, tree), "<d><e/></d>");
    assert_eq!(doc.parent(tree.root()), Some(root));
    assert_eq!(doc.root_tree(tree.root()).root(), root);
}

#[test]
fn test_navigation_and_iterators() {
    let (doc, root) = abcde();
    let [a, b, c, d] = [0, 1, 2, 3].map(|i| doc.child(root, i).unwrap());
    let e = doc.child(d, 0).unwrap();

    assert_eq!(doc.parent(b), Some(root));
    assert_eq!(doc.next_sibling(b), Some(c));
    assert_eq!(doc.prev_sibling(c), Some(b));
    assert_eq!(doc.prev_sibling(a), None);
    assert_eq!(doc.next_sibling(d), None);

    assert_eq!(tags(&doc, doc.children(root).iter().copied()), ["a", "b", "c", "d"]);
    assert_eq!(tags(&doc, doc.iter(root)), ["root", "a", "b", "c", "d", "e"]);
    assert_eq!(tags(&doc, doc.iter_children(root, false)), ["a", "b", "c", "d"]);
    assert_eq!(tags(&doc, doc.iter_children(root, true)), ["d", "c", "b", "a"]);
    assert_eq!(tags(&doc, doc.iter_siblings(b, false)), ["c", "d"]);
    assert_eq!(tags(&doc, doc.iter_siblings(c, true)), ["b", "a"]);
    assert_eq!(tags(&doc, doc.iter_ancestors(e)), ["d", "root"]);
    assert_eq!(tags(&doc, doc.iter_descendants(root)), ["a", "b", "c", "d", "e"]);
    assert_eq!(tags(&doc, doc.iter_children(root, false).tags(["a"])), ["a"]);
    assert_eq!(tags(&doc, doc.iter_children(d, false).tags(["a"])), Vec::<&str>::new());
    assert_eq!(tags(&doc, doc.iter_descendants(root).tags(["d"])), ["d"]);
    assert_eq!(tags(&doc, doc.iter(root).tags(["d"])), ["d"]);
    assert_eq!(tags(&doc, doc.iter(root).tags(["d", "a"])), ["a", "d"]);
}

#[test]
fn test_add_next_without_parent_fails() {
    let mut doc = Document::new();
    let lonely = doc.create_element("lonely");
    let other = doc.create_element("other");
    assert_eq!(doc.add_next(lonely, other), Err(TreeError::NoParent));
}

// ---------------------------------------------------------------------------
// Serialisation
// ---------------------------------------------------------------------------

#[test]
fn test_serialisation() {
    let mut doc = Document::new();
    let root = doc.xml("<root><a><b/></a></root>").unwrap().unwrap();
    assert_eq!(serialize(&doc, root), "<root><a><b/></a></root>");

    let declared = SerializeOptions::default().xml_declaration(true);
    assert_eq!(
        serialize_with_options(&doc, root, &declared),
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<root><a><b/></a></root>"
    );

    let latin1 = SerializeOptions::default().encoding("iso-8859-1");
    assert_eq!(
        doc.tostring(root, &latin1).unwrap(),
        Serialized::Bytes(b"<root><a><b/></a></root>".to_vec())
    );

    let pretty = SerializeOptions::default().pretty_print(true);
    assert_eq!(
        serialize_with_options(&doc, root, &pretty),
        "<root>\n  <a>\n    <b/>\n  </a>\n</root>\n"
    );
}

#[test]
fn test_declaration_and_encoding_together() {
    let mut doc = Document::new();
    let root = doc.create_element("r");
    doc.set_text(root, "\u{e9}");
    let options = SerializeOptions::default()
        .xml_declaration(true)
        .encoding("iso-8859-1");
    let out = doc.tostring(root, &options).unwrap().into_bytes();
    assert_eq!(
        out,
        b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?>\n<r>\xE9</r>".to_vec()
    );
}

// ---------------------------------------------------------------------------
// The ElementTree class
// ---------------------------------------------------------------------------

#[test]
fn test_element_tree_class() {
    let mut doc = Document::new();
    let root = doc
        .xml(
            "  <?xml version=\"1.0\"?>\n  \
             <!DOCTYPE root SYSTEM \"test\" [ <!ENTITY tasty \"parsnips\"> ]>\n  \
             <root>\n  <a>&tasty;</a>\n  </root>\n  ",
        )
        .unwrap()
        .unwrap();
    let tree = doc.element_tree(root);
    let info = doc.docinfo(&tree);
    assert_eq!(info.xml_version.as_deref(), Some("1.0"));
    assert_eq!(info.doctype.as_deref(), Some("<!DOCTYPE root SYSTEM \"test\">"));

    let a = doc.find(root, "a").unwrap();
    assert_eq!(doc.text(a), Some("&tasty;"));

    assert_eq!(
        serialize(&doc, tree),
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <!DOCTYPE root SYSTEM \"test\">\n\
         <root><a>&amp;tasty;</a></root>"
    );
}

// ---------------------------------------------------------------------------
// Parsing from strings and files
// ---------------------------------------------------------------------------

#[test]
fn test_parsing_from_strings_and_files() {
    let mut doc = Document::new();
    let root = doc.xml("<root>data</root>").unwrap().unwrap();
    assert_eq!(doc.tag(root), "root");
    assert_eq!(serialize(&doc, root), "<root>data</root>");

    let tree = doc.parse(&b"<root>data</root>"[..]).unwrap().unwrap();
    assert_eq!(serialize(&doc, tree), "<root>data</root>");
}

#[test]
fn test_parse_without_root_returns_none() {
    let mut doc = Document::new();
    assert_eq!(doc.parse(&b"   "[..]).unwrap(), None);
    assert_eq!(doc.fromstring("<!-- nothing -->").unwrap(), None);
}

#[test]
fn test_mismatched_tag_is_reported() {
    let mut doc = Document::new();
    let err = doc.fromstring("<root><a></b></root>").unwrap_err();
    assert!(err.is_mismatched_tag());
    assert!(err.to_string().contains("unexpected closing tag: b instead of a"));
}
