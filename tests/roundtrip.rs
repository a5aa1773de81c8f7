//! Lossless round trips over generated documents with varied formatting.

#![allow(clippy::unwrap_used)]

use std::fmt::Write;

use domtrip::serial::serialize;
use domtrip::{Config, Document};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Attr {
    whitespace: &'static str,
    separator: &'static str,
    single_quoted: bool,
    value: &'static str,
}

#[derive(Debug, Clone)]
enum Node {
    Element {
        name: &'static str,
        attributes: Vec<Attr>,
        open_tag_whitespace: &'static str,
        close_tag_whitespace: &'static str,
        closing_whitespace: &'static str,
        self_closing: bool,
        children: Vec<(&'static str, Node)>,
    },
    Text(&'static str),
    Comment(&'static str),
    CData(&'static str),
    Pi(&'static str),
}

impl Node {
    fn render(&self, out: &mut String) {
        match self {
            Node::Element {
                name,
                attributes,
                open_tag_whitespace,
                close_tag_whitespace,
                closing_whitespace,
                self_closing,
                children,
            } => {
                let _ = write!(out, "<{name}");
                for (i, attr) in attributes.iter().enumerate() {
                    let quote = if attr.single_quoted { '\'' } else { '"' };
                    let _ = write!(
                        out,
                        "{}a{i}{}{quote}{}{quote}",
                        attr.whitespace, attr.separator, attr.value
                    );
                }
                out.push_str(open_tag_whitespace);
                if children.is_empty() && *self_closing {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for (whitespace, child) in children {
                    out.push_str(whitespace);
                    child.render(out);
                }
                let _ = write!(out, "{closing_whitespace}</{name}{close_tag_whitespace}>");
            }
            Node::Text(text) => out.push_str(text),
            Node::Comment(text) => {
                let _ = write!(out, "<!--{text}-->");
            }
            Node::CData(text) => {
                let _ = write!(out, "<![CDATA[{text}]]>");
            }
            Node::Pi(data) => {
                let _ = write!(out, "<?target {data}?>");
            }
        }
    }

    fn element_count(&self) -> usize {
        match self {
            Node::Element { children, .. } => {
                1 + children.iter().map(|(_, c)| c.element_count()).sum::<usize>()
            }
            _ => 0,
        }
    }
}

fn whitespace() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["", " ", "\n", "\n  ", "\r\n\t", "\n\n    "])
}

fn attribute() -> impl Strategy<Value = Attr> {
    (
        prop::sample::select(vec![" ", "  ", "\n    ", "\t"]),
        prop::sample::select(vec!["=", " = ", "=\n"]),
        any::<bool>(),
        prop::sample::select(vec![
            "",
            "1",
            "hello world",
            "a &amp; b",
            "&lt;x&gt;",
            "&quot;q&quot; &apos;a&apos;",
            "&#x41;&#66;",
            "caf\u{e9}",
        ]),
    )
        .prop_map(|(whitespace, separator, single_quoted, value)| Attr {
            whitespace,
            separator,
            single_quoted,
            value,
        })
}

fn leaf() -> impl Strategy<Value = Node> {
    prop_oneof![
        prop::sample::select(vec![
            "hello",
            "a &amp; b",
            "x &lt; y &gt; z",
            "  padded  ",
            "caf\u{e9} \u{1F30D}",
            "&#169; 2024",
            "it's \"quoted\"",
        ])
        .prop_map(Node::Text),
        prop::sample::select(vec!["", " note ", "a - b"]).prop_map(Node::Comment),
        prop::sample::select(vec!["raw <stuff> & more", "", "]]"]).prop_map(Node::CData),
        prop::sample::select(vec!["", "data", "x=\"1\""]).prop_map(Node::Pi),
    ]
}

fn element(inner: BoxedStrategy<Node>) -> impl Strategy<Value = Node> {
    (
        prop::sample::select(vec!["a", "item", "ns:x", "long-name_1.2"]),
        prop::collection::vec(attribute(), 0..4),
        prop::sample::select(vec!["", " ", "\n"]),
        prop::sample::select(vec!["", " "]),
        whitespace(),
        any::<bool>(),
        prop::collection::vec((whitespace(), inner), 0..4),
    )
        .prop_map(
            |(
                name,
                attributes,
                open_tag_whitespace,
                close_tag_whitespace,
                closing_whitespace,
                self_closing,
                children,
            )| Node::Element {
                name,
                attributes,
                open_tag_whitespace,
                close_tag_whitespace,
                closing_whitespace,
                self_closing,
                children,
            },
        )
}

fn tree() -> impl Strategy<Value = Node> {
    leaf().prop_recursive(3, 32, 4, |inner| element(inner.boxed()))
}

/// A document, its element count, and the offset of the root start tag.
fn document() -> impl Strategy<Value = (String, usize, usize)> {
    (
        prop::sample::select(vec![
            "",
            "<?xml version=\"1.0\"?>",
            "<?xml version='1.0' encoding='utf-8' ?>",
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>",
        ]),
        whitespace(),
        element(tree().boxed()),
        whitespace(),
    )
        .prop_map(|(declaration, leading, root, trailing)| {
            let mut xml = declaration.to_string();
            if !declaration.is_empty() {
                xml.push_str(leading);
            }
            let root_start = xml.len();
            root.render(&mut xml);
            xml.push_str(trailing);
            (xml, root.element_count(), root_start)
        })
}

/// The end of the start tag beginning at `start`. Generated attribute
/// values never contain a literal `>`.
fn start_tag_end(xml: &str, start: usize) -> usize {
    start + xml[start..].find('>').unwrap() + 1
}

proptest! {
    #[test]
    fn test_unchanged_document_is_identical((xml, _, _) in document()) {
        let doc = Document::parse_str(&xml);
        prop_assert!(doc.is_ok(), "failed to parse: {:?}", xml);
        let doc = doc.unwrap();
        prop_assert_eq!(serialize(&doc, &Config::defaults()), xml.clone());
        prop_assert_eq!(doc.to_bytes().unwrap(), xml.into_bytes());
    }

    #[test]
    fn test_pretty_output_keeps_content((xml, elements, _) in document()) {
        let doc = Document::parse_str(&xml).unwrap();
        let pretty = serialize(&doc, &Config::pretty_print());
        let reparsed = Document::parse_str(&pretty);
        prop_assert!(reparsed.is_ok(), "pretty output does not parse: {:?}", pretty);
        let reparsed = reparsed.unwrap();

        let count = |d: &Document| {
            d.descendants(d.root()).filter(|&id| d.element(id).is_some()).count()
        };
        prop_assert_eq!(count(&doc), elements);
        prop_assert_eq!(count(&reparsed), elements);
        prop_assert_eq!(
            doc.text_content(doc.root()),
            reparsed.text_content(reparsed.root())
        );
    }

    #[test]
    fn test_attribute_edit_is_local((xml, _, root_start) in document()) {
        let mut doc = Document::parse_str(&xml).unwrap();
        let root = doc.root_element().unwrap();
        doc.set_attribute(root, "edited", "yes").unwrap();
        let after = doc.to_xml();

        // Only the root start tag changes.
        let old_end = start_tag_end(&xml, root_start);
        let new_end = start_tag_end(&after, root_start);
        prop_assert_eq!(&xml[..root_start], &after[..root_start]);
        prop_assert_eq!(&xml[old_end..], &after[new_end..]);
        let tag = &after[root_start..new_end];
        prop_assert!(tag.contains("edited=\"yes\"") || tag.contains("edited='yes'"));
    }
}

#[test]
fn test_handpicked_documents() {
    let cases = [
        "<a/>",
        "<a></a>",
        "<a >\n</a >",
        "<?xml version=\"1.0\"?>\n<!DOCTYPE a SYSTEM \"a.dtd\">\n<a/>\n",
        "<!DOCTYPE note [\n  <!ELEMENT note (#PCDATA)>\n  <!ATTLIST note id CDATA \"x>y\">\n]>\n<note>&custom;</note>",
        "<r>\n\t<a x='1'\n\t   y=\"2\"/>\n\t<b>&#x1F600;</b>\n</r>",
        "<r><![CDATA[]]><!----><?p?></r>",
        "<r>\r\n  <a>x\r\ny</a>\r\n</r>\r\n",
        "<p>Some <em>mixed</em>   content &amp; more</p>",
    ];
    for input in cases {
        let doc = Document::parse_str(input).unwrap_or_else(|e| panic!("{input:?}: {e}"));
        assert_eq!(doc.to_xml(), input);
    }
}

#[test]
fn test_attribute_line_breaks_and_tabs_survive_reparse() {
    let mut doc = Document::parse_str("<a/>").unwrap();
    let a = doc.root_element().unwrap();
    doc.set_attribute(a, "v", "x\r\ny\tz").unwrap();
    let xml = doc.to_xml();
    assert!(xml.contains("x&#13;&#10;y&#9;z"), "{xml}");

    let reparsed = Document::parse_str(&xml).unwrap();
    let root = reparsed.root_element().unwrap();
    assert_eq!(reparsed.attribute(root, "v"), Some("x\r\ny\tz"));
    assert_eq!(reparsed.to_xml(), xml);
}
