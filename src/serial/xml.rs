//! XML serializer.
//!
//! In the default mode every node is written as its stored connective
//! whitespace followed by either its raw source span (unchanged nodes) or a
//! rendering of its current content (changed and new nodes). Containers are
//! walked recursively, so an element whose start tag had to be rendered
//! still writes its untouched children byte for byte.
//!
//! Pretty mode ignores the stored whitespace and raw start tags and writes
//! one node per line with uniform indentation. Elements with text children
//! are written inline, exactly as in the default mode, because whitespace
//! around their children is part of the text.

use std::io::Write;

use log::debug;

use crate::config::{Config, EmptyElementStyle};
use crate::encoding::EncodingError;
use crate::tree::{Document, Element, NodeId, NodeKind, ProcessingInstruction, Text};

/// Serializes a document to a string.
///
/// The string starts with U+FEFF when the document was read with a byte
/// order mark.
///
/// ```
/// use domtrip::{serial, Config, Document};
///
/// let doc = Document::parse_str("<a>\n  <b   x='1'/>\n</a>").unwrap();
/// assert_eq!(serial::serialize(&doc, &Config::defaults()), "<a>\n  <b   x='1'/>\n</a>");
/// assert_eq!(serial::serialize(&doc, &Config::raw()), "<a><b x='1'/></a>");
/// ```
#[must_use]
pub fn serialize(doc: &Document, config: &Config) -> String {
    let mut serializer = Serializer::new(doc, config);
    if doc.has_bom() {
        serializer.out.push('\u{FEFF}');
    }
    serializer.document();
    serializer.out
}

/// Serializes one node and its subtree, without the node's own connective
/// whitespace.
#[must_use]
pub fn serialize_node(doc: &Document, id: NodeId, config: &Config) -> String {
    let mut serializer = Serializer::new(doc, config);
    if id == doc.root() {
        serializer.document();
    } else if config.pretty_print {
        serializer.pretty_node(id, 0);
    } else {
        serializer.node_content(id);
    }
    serializer.out
}

/// Serializes a document and encodes it in its output encoding, with a
/// byte order mark if the input had one.
///
/// # Errors
///
/// Returns `EncodingError` if the output encoding is not supported.
pub fn to_bytes(doc: &Document, config: &Config) -> Result<Vec<u8>, EncodingError> {
    let mut serializer = Serializer::new(doc, config);
    serializer.document();
    let encoding = doc.output_encoding();
    debug!(
        "encoding {} characters as {encoding}",
        serializer.out.len()
    );
    crate::encoding::encode(&serializer.out, encoding, doc.has_bom())
}

/// Writes the encoded document to `writer`.
///
/// # Errors
///
/// Returns an encoding error, or an I/O error from the writer.
pub fn write_document<W: Write>(doc: &Document, config: &Config, mut writer: W) -> crate::Result<()> {
    let bytes = to_bytes(doc, config)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Escapes text content. `>` is escaped too, so `]]>` never appears.
#[must_use]
pub fn escape_text(text: &str) -> std::borrow::Cow<'_, str> {
    if !text.contains(['&', '<', '>', '\r']) {
        return std::borrow::Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            _ => out.push(ch),
        }
    }
    std::borrow::Cow::Owned(out)
}

struct Serializer<'a> {
    doc: &'a Document,
    config: &'a Config,
    out: String,
}

impl<'a> Serializer<'a> {
    fn new(doc: &'a Document, config: &'a Config) -> Self {
        Self {
            doc,
            config,
            out: String::new(),
        }
    }

    fn skipped(&self, id: NodeId) -> bool {
        match self.doc.kind(id) {
            NodeKind::Comment(_) => !self.config.preserve_comments,
            NodeKind::ProcessingInstruction(_) => !self.config.preserve_processing_instructions,
            _ => false,
        }
    }

    /// The top-level node the DOCTYPE is written before.
    fn doctype_anchor(&self) -> Option<NodeId> {
        let doctype = self.doc.doctype()?;
        let top = self.doc.children(self.doc.root());
        doctype
            .before
            .filter(|id| top.contains(id))
            .or_else(|| self.doc.root_element())
    }

    fn document(&mut self) {
        if self.config.pretty_print {
            self.pretty_document();
            return;
        }
        let doc = self.doc;
        let start = self.out.len();
        let mut omitted = false;
        if let Some(declaration) = doc.xml_declaration() {
            if self.config.omit_xml_declaration {
                omitted = true;
            } else {
                match declaration.raw() {
                    Some(raw) => self.out.push_str(raw),
                    None => self.out.push_str(&declaration.render()),
                }
            }
        }

        let anchor = self.doctype_anchor();
        for &child in doc.children(doc.root()) {
            if Some(child) == anchor {
                if let Some(doctype) = doc.doctype() {
                    self.out.push_str(doctype.preceding_whitespace());
                    self.out.push_str(doctype.raw());
                }
            }
            self.node(child);
        }
        self.out.push_str(doc.trailing_whitespace());

        if omitted {
            // The first node no longer follows the declaration.
            let leading = self.out[start..].len() - self.out[start..].trim_start().len();
            self.out.replace_range(start..start + leading, "");
        }
    }

    /// Writes a node with its connective whitespace.
    fn node(&mut self, id: NodeId) {
        if self.skipped(id) {
            return;
        }
        let doc = self.doc;
        let data = doc.node(id);
        self.out.push_str(&data.preceding_whitespace);
        self.node_content(id);
        self.out.push_str(&data.following_whitespace);
    }

    fn node_content(&mut self, id: NodeId) {
        let doc = self.doc;
        let data = doc.node(id);
        match &data.kind {
            NodeKind::Document(_) => self.document(),
            NodeKind::Element(element) => {
                match element.raw_start_tag() {
                    Some(raw) if !data.modified => self.out.push_str(raw),
                    _ => self.start_tag(element, false),
                }
                if self.writes_empty_tag(element) {
                    return;
                }
                for &child in doc.children(id) {
                    self.node(child);
                }
                self.out.push_str(element.closing_whitespace());
                self.end_tag(element);
            }
            NodeKind::Text(text) => {
                let raw = text.raw().filter(|_| !data.modified);
                self.text(text, raw);
            }
            NodeKind::Comment(comment) => {
                self.out.push_str("<!--");
                self.out.push_str(comment.content());
                self.out.push_str("-->");
            }
            NodeKind::ProcessingInstruction(pi) => match pi.raw() {
                Some(raw) if !data.modified => self.out.push_str(raw),
                _ => self.processing_instruction(pi),
            },
        }
    }

    /// Whether an element is written as `<a/>` and has nothing after it.
    fn writes_empty_tag(&self, element: &Element) -> bool {
        if !element.children.is_empty() {
            return false;
        }
        match element.self_closing() {
            Some(self_closing) => self_closing,
            None => self.config.empty_element_style != EmptyElementStyle::Expanded,
        }
    }

    /// Renders a start tag from the element's fields. With `normalized`,
    /// attributes are separated by single spaces and tag whitespace is
    /// dropped.
    fn start_tag(&mut self, element: &Element, normalized: bool) {
        self.out.push('<');
        self.out.push_str(element.name());
        for attribute in element.attributes() {
            if normalized {
                self.out.push(' ');
                attribute.write_normalized(&mut self.out);
            } else {
                attribute.write_to(&mut self.out);
            }
        }
        if !normalized {
            self.out.push_str(element.open_tag_whitespace());
        }
        if self.writes_empty_tag(element) {
            let spaced = element.self_closing().is_none()
                && self.config.empty_element_style == EmptyElementStyle::SelfClosingSpaced
                && (normalized || element.open_tag_whitespace().is_empty());
            self.out.push_str(if spaced { " />" } else { "/>" });
        } else {
            self.out.push('>');
        }
    }

    fn end_tag(&mut self, element: &Element) {
        self.out.push_str("</");
        self.out.push_str(element.name());
        self.out.push_str(element.close_tag_whitespace());
        self.out.push('>');
    }

    fn text(&mut self, text: &Text, raw: Option<&str>) {
        if text.is_cdata() {
            self.out.push_str("<![CDATA[");
            match raw {
                Some(raw) => self.out.push_str(raw),
                // A CDATA section cannot contain its own terminator.
                None => self
                    .out
                    .push_str(&text.content().replace("]]>", "]]]]><![CDATA[>")),
            }
            self.out.push_str("]]>");
        } else {
            match raw {
                Some(raw) => self.out.push_str(raw),
                None => self.out.push_str(&escape_text(text.content())),
            }
        }
    }

    fn processing_instruction(&mut self, pi: &ProcessingInstruction) {
        self.out.push_str("<?");
        self.out.push_str(pi.target());
        if !pi.data().is_empty() {
            self.out.push(' ');
            self.out.push_str(pi.data());
        }
        self.out.push_str("?>");
    }

    // --- Pretty mode ---

    fn newline(&mut self, depth: usize) {
        self.out.push_str(&self.config.line_ending);
        for _ in 0..depth {
            self.out.push_str(&self.config.indent_string);
        }
    }

    fn pretty_document(&mut self) {
        let doc = self.doc;
        let mut first = true;
        if let Some(declaration) = doc.xml_declaration() {
            if !self.config.omit_xml_declaration {
                match declaration.raw() {
                    Some(raw) => self.out.push_str(raw),
                    None => self.out.push_str(&declaration.render()),
                }
                first = false;
            }
        }
        let anchor = self.doctype_anchor();
        for &child in doc.children(doc.root()) {
            if self.skipped(child) {
                continue;
            }
            if Some(child) == anchor {
                if let Some(doctype) = doc.doctype() {
                    if !first {
                        self.newline(0);
                    }
                    self.out.push_str(doctype.raw());
                    first = false;
                }
            }
            if !first {
                self.newline(0);
            }
            self.pretty_node(child, 0);
            first = false;
        }
    }

    fn pretty_node(&mut self, id: NodeId, depth: usize) {
        let doc = self.doc;
        match doc.kind(id) {
            NodeKind::Element(element) => {
                self.start_tag(element, true);
                if self.writes_empty_tag(element) {
                    return;
                }
                if doc.has_mixed_content(id) {
                    // Whitespace here is text, so it stays; only tags are normalized.
                    for &child in doc.children(id) {
                        if self.skipped(child) {
                            continue;
                        }
                        let data = doc.node(child);
                        self.out.push_str(&data.preceding_whitespace);
                        self.pretty_node(child, depth);
                        self.out.push_str(&data.following_whitespace);
                    }
                    self.out.push_str(element.closing_whitespace());
                    self.end_tag_normalized(element);
                    return;
                }
                let mut any = false;
                for &child in doc.children(id) {
                    if self.skipped(child) {
                        continue;
                    }
                    self.newline(depth + 1);
                    self.pretty_node(child, depth + 1);
                    any = true;
                }
                if any {
                    self.newline(depth);
                }
                self.end_tag_normalized(element);
            }
            NodeKind::Document(_) => self.pretty_document(),
            _ => self.node_content(id),
        }
    }

    fn end_tag_normalized(&mut self, element: &Element) {
        self.out.push_str("</");
        self.out.push_str(element.name());
        self.out.push('>');
    }
}
