//! Security-focused tests for simpletree.
//!
//! These tests verify that the parser rejects pathological inputs that
//! could cause denial of service via excessive resource consumption, and
//! that deep trees do not exhaust the stack anywhere in the crate.

#![allow(clippy::unwrap_used)]

use std::fmt::Write;

use pretty_assertions::assert_eq;
use simpletree::parser::{parse_str, parse_str_with_options, ParseOptions};
use simpletree::serial::serialize;
use simpletree::{Document, ParseErrorKind};

fn nested(depth: usize) -> String {
    let open: String = (0..depth).map(|_| "<a>").collect();
    let close: String = (0..depth).map(|_| "</a>").collect();
    format!("{open}{close}")
}

// ---------------------------------------------------------------------------
// Depth limit tests
// ---------------------------------------------------------------------------

#[test]
fn test_deeply_nested_elements_rejected() {
    let mut doc = Document::new();
    let err = parse_str(&mut doc, &nested(300)).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::DepthLimit(256)));
    assert!(err.to_string().contains("depth"), "error should mention depth: {err}");
}

#[test]
fn test_depth_limit_configurable() {
    let mut doc = Document::new();
    let opts = ParseOptions::default().max_depth(10);
    let tree = parse_str_with_options(&mut doc, "<a><b><c><d><e/></d></c></b></a>", &opts)
        .unwrap()
        .unwrap();
    assert_eq!(doc.iter(tree.root()).count(), 5);
}

#[test]
fn test_depth_limit_exact_boundary() {
    let mut doc = Document::new();
    let opts = ParseOptions::default().max_depth(3);
    assert!(parse_str_with_options(&mut doc, &nested(3), &opts).is_ok());
}

#[test]
fn test_depth_limit_one_over() {
    let mut doc = Document::new();
    let opts = ParseOptions::default().max_depth(3);
    let err = parse_str_with_options(&mut doc, &nested(4), &opts).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::DepthLimit(3)));
}

#[test]
fn test_empty_elements_do_not_accumulate_depth() {
    let mut doc = Document::new();
    let opts = ParseOptions::default().max_depth(2);
    let xml = format!("<r>{}</r>", "<x/>".repeat(1000));
    let tree = parse_str_with_options(&mut doc, &xml, &opts).unwrap().unwrap();
    assert_eq!(doc.len(tree.root()), 1000);
}

#[test]
fn test_raised_depth_limit_handles_deep_documents() {
    let mut doc = Document::new();
    let opts = ParseOptions::default().max_depth(20_000);
    let xml = nested(20_000);
    let tree = parse_str_with_options(&mut doc, &xml, &opts).unwrap().unwrap();

    assert_eq!(doc.iter(tree.root()).count(), 20_000);
    let leaf = doc.iter(tree.root()).last().unwrap();
    assert_eq!(doc.iter_ancestors(leaf).count(), 19_999);
    assert_eq!(serialize(&doc, tree), xml.replace("<a></a>", "<a/>"));
}

// ---------------------------------------------------------------------------
// Name length tests
// ---------------------------------------------------------------------------

#[test]
fn test_huge_element_name_rejected() {
    let mut doc = Document::new();
    let name = "a".repeat(60_000);
    let err = parse_str(&mut doc, &format!("<{name}/>")).unwrap_err();
    assert!(err.to_string().contains("name length"), "unexpected error: {err}");
}

#[test]
fn test_name_length_limit_configurable() {
    let mut doc = Document::new();
    let opts = ParseOptions::default().max_name_length(8);
    assert!(parse_str_with_options(&mut doc, "<abcdefgh/>", &opts).is_ok());
    assert!(parse_str_with_options(&mut doc, "<abcdefghi/>", &opts).is_err());
    assert!(parse_str_with_options(&mut doc, r#"<a abcdefghi="v"/>"#, &opts).is_err());
}

// ---------------------------------------------------------------------------
// Attribute count tests
// ---------------------------------------------------------------------------

#[test]
fn test_too_many_attributes_rejected() {
    let mut doc = Document::new();
    let mut xml = String::from("<a");
    for i in 0..300 {
        write!(xml, " a{i}=\"v\"").unwrap();
    }
    xml.push_str("/>");
    let err = parse_str(&mut doc, &xml).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::AttributeLimit(256)));
}

#[test]
fn test_duplicate_attributes_count_toward_limit() {
    let mut doc = Document::new();
    let opts = ParseOptions::default().max_attributes(2);
    let err = parse_str_with_options(&mut doc, r#"<a x="1" x="2" x="3"/>"#, &opts).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::AttributeLimit(2)));
}

// ---------------------------------------------------------------------------
// Default limits must not reject ordinary documents
// ---------------------------------------------------------------------------

#[test]
fn test_default_limits_allow_normal_documents() {
    let mut doc = Document::new();
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<catalog>\n");
    for i in 0..500 {
        writeln!(
            xml,
            "  <book id=\"bk{i}\" lang=\"en\"><title>Book {i}</title><price>{i}.95</price></book>"
        )
        .unwrap();
    }
    xml.push_str("</catalog>\n");
    let tree = parse_str(&mut doc, &xml).unwrap().unwrap();
    assert_eq!(doc.len(tree.root()), 500);
    assert_eq!(doc.iter(tree.root()).tags(["title"]).count(), 500);
}

#[test]
fn test_default_limits_allow_moderate_nesting() {
    let mut doc = Document::new();
    assert!(parse_str(&mut doc, &nested(200)).is_ok());
}

#[test]
fn test_default_limits_allow_many_attributes() {
    let mut doc = Document::new();
    let mut xml = String::from("<a");
    for i in 0..100 {
        write!(xml, " attr{i}=\"value{i}\"").unwrap();
    }
    xml.push_str("/>");
    let tree = parse_str(&mut doc, &xml).unwrap().unwrap();
    assert_eq!(doc.attrib(tree.root()).len(), 100);
}

// ---------------------------------------------------------------------------
// Entity decoding
// ---------------------------------------------------------------------------

#[test]
fn test_many_bare_ampersands_decode_linearly() {
    let mut doc = Document::new();
    let count = 400_000;
    let xml = format!("<r a=\"{amps}\">{amps}</r>", amps = "&".repeat(count));
    let tree = parse_str(&mut doc, &xml).unwrap().unwrap();
    assert_eq!(doc.text(tree.root()).map(str::len), Some(count));
    assert_eq!(doc.get(tree.root(), "a").map(str::len), Some(count));
}

#[test]
fn test_unknown_entities_are_not_expanded() {
    let mut doc = Document::new();
    let xml = format!("<!DOCTYPE r [<!ENTITY e \"{}\">]><r>{}</r>", "x".repeat(100), "&e;".repeat(1000));
    let tree = parse_str(&mut doc, &xml).unwrap().unwrap();
    assert_eq!(doc.text(tree.root()).map(str::len), Some(3000));
}
