//! Pathological and hostile inputs.
//!
//! Nesting depth is bounded, and entities declared in a DTD are never
//! expanded, so entity bombs and external entities stay inert text.

#![allow(clippy::unwrap_used)]

use std::fmt::Write;

use domtrip::{Config, Document, DomTripError};

fn nested(depth: usize) -> String {
    let open: String = (0..depth).map(|_| "<a>").collect();
    let close: String = (0..depth).map(|_| "</a>").collect();
    format!("{open}{close}")
}

// ---------------------------------------------------------------------------
// Depth limits
// ---------------------------------------------------------------------------

#[test]
fn test_deeply_nested_elements_rejected() {
    let result = Document::parse_str(&nested(300));
    let Err(DomTripError::Parse(err)) = result else {
        panic!("deeply nested document should be rejected");
    };
    assert!(
        err.message.contains("depth"),
        "error should mention depth: {}",
        err.message
    );
}

#[test]
fn test_depth_limit_configurable() {
    let xml = "<a><b><c><d><e/></d></c></b></a>";
    let config = Config::default().with_max_depth(10);
    let doc = Document::parse_str_with_config(xml, &config).unwrap();
    assert!(doc.root_element().is_some());
}

#[test]
fn test_depth_limit_exact_boundary() {
    let config = Config::default().with_max_depth(3);
    assert!(
        Document::parse_str_with_config(&nested(3), &config).is_ok(),
        "depth exactly at limit should succeed"
    );
    assert!(
        Document::parse_str_with_config(&nested(4), &config).is_err(),
        "depth one over the limit should fail"
    );
}

#[test]
fn test_default_limits_allow_moderate_nesting() {
    let doc = Document::parse_str(&nested(200)).unwrap();
    assert_eq!(doc.to_xml(), nested(200));
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[test]
fn test_entity_bomb_is_not_expanded() {
    let mut xml = String::from("<?xml version=\"1.0\"?>\n<!DOCTYPE lolz [\n  <!ENTITY lol \"lol\">\n");
    for i in 1..10 {
        let prev = if i == 1 { "lol".to_string() } else { format!("lol{}", i - 1) };
        let refs: String = (0..10).map(|_| format!("&{prev};")).collect();
        let _ = writeln!(xml, "  <!ENTITY lol{i} \"{refs}\">");
    }
    xml.push_str("]>\n<lolz>&lol9;</lolz>");

    let doc = Document::parse_str(&xml).unwrap();
    let root = doc.root_element().unwrap();
    assert_eq!(doc.text_content(root), "&lol9;");
    assert_eq!(doc.to_xml(), xml);
}

#[test]
fn test_external_entity_is_not_resolved() {
    let xml = "<!DOCTYPE r [<!ENTITY xxe SYSTEM \"file:///etc/passwd\">]>\n<r>&xxe;</r>";
    let doc = Document::parse_str(xml).unwrap();
    assert_eq!(doc.text_content(doc.root_element().unwrap()), "&xxe;");
    assert_eq!(doc.doctype().unwrap().name(), "r");
}

// ---------------------------------------------------------------------------
// Malformed input
// ---------------------------------------------------------------------------

#[test]
fn test_errors_carry_location() {
    let Err(DomTripError::Parse(err)) = Document::parse_str("<a>\n  <b>\n</a>") else {
        panic!("mismatched end tag should be rejected");
    };
    assert!(err.message.contains("mismatched end tag"));
    assert_eq!(err.location.line, 3);
    assert_eq!(err.location.column, 1);
}

#[test]
fn test_malformed_inputs_are_rejected() {
    let cases = [
        "",
        "   ",
        "<a>",
        "<a></b>",
        "<a/><b/>",
        "text<a/>",
        "<a x='1' x='2'/>",
        "<a x=1/>",
        "<a><!-- unterminated </a>",
        "<a>&amp</a>",
    ];
    for input in cases {
        assert!(
            Document::parse_str(input).is_err(),
            "{input:?} should be rejected"
        );
    }
}

#[test]
fn test_lenient_accepts_bare_ampersand() {
    let input = "<a>fish & chips</a>";
    assert!(Document::parse_str(input).is_err());
    let doc = Document::parse_str_with_config(input, &Config::lenient()).unwrap();
    assert_eq!(doc.text_content(doc.root_element().unwrap()), "fish & chips");
    assert!(!doc.diagnostics.is_empty());
    assert_eq!(doc.to_xml(), input);
}

#[test]
fn test_many_attributes() {
    let mut xml = String::from("<root");
    for i in 0..1000 {
        let _ = write!(xml, " attr{i}=\"value{i}\"");
    }
    xml.push_str("/>");
    let doc = Document::parse_str(&xml).unwrap();
    assert_eq!(doc.attributes(doc.root_element().unwrap()).len(), 1000);
}
