//! Node type definitions.
//!
//! [`NodeKind`] is a closed set of five variants. Only [`DocumentNode`] and
//! [`Element`] own a child list; the leaf payloads have no field that could
//! hold children, so "a text node with children" cannot be represented.
//! Connective whitespace, the parent link and the modified flag live in
//! [`NodeData`](super::NodeData), not here.

use super::{Attribute, NodeId};
use crate::util::qname::split_qname;

/// The kind of an XML node and its associated data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node. There is exactly one per `Document`.
    Document(DocumentNode),
    /// An element, e.g. `<item id="1">`.
    Element(Element),
    /// Character data or a CDATA section.
    Text(Text),
    /// A comment, e.g. `<!-- note -->`.
    Comment(Comment),
    /// A processing instruction, e.g. `<?xml-stylesheet href="a.xsl"?>`.
    ProcessingInstruction(ProcessingInstruction),
}

/// A discriminant-only view of [`NodeKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Document,
    Element,
    Text,
    Comment,
    ProcessingInstruction,
}

impl NodeKind {
    /// Returns which variant this is.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Document(_) => NodeType::Document,
            Self::Element(_) => NodeType::Element,
            Self::Text(_) => NodeType::Text,
            Self::Comment(_) => NodeType::Comment,
            Self::ProcessingInstruction(_) => NodeType::ProcessingInstruction,
        }
    }

    /// Returns the payload as a container, if this variant owns children.
    #[must_use]
    pub fn as_container(&self) -> Option<&dyn ContainerNode> {
        match self {
            Self::Document(doc) => Some(doc),
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Self::Document(doc) => Some(&mut doc.children),
            Self::Element(element) => Some(&mut element.children),
            _ => None,
        }
    }

    /// Returns the element payload, if this is an element.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Returns the text payload, if this is a text node.
    #[must_use]
    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::DocumentNode {}
    impl Sealed for super::Element {}
}

/// The capability shared by the two node kinds that own children.
///
/// The trait is sealed: no other type can claim to hold children.
pub trait ContainerNode: sealed::Sealed {
    /// The owned children in document order.
    fn children(&self) -> &[NodeId];

    /// Returns `true` if there is at least one child.
    fn has_children(&self) -> bool {
        !self.children().is_empty()
    }
}

/// Payload of the document node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentNode {
    pub(crate) children: Vec<NodeId>,
}

impl ContainerNode for DocumentNode {
    fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Payload of an element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub(crate) name: String,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) children: Vec<NodeId>,
    /// Whitespace after the last attribute, before `>` or `/>`.
    pub(crate) open_tag_whitespace: String,
    /// Whitespace inside the end tag, between the name and `>`.
    pub(crate) close_tag_whitespace: String,
    /// Whitespace between the last child and the end tag.
    pub(crate) closing_whitespace: String,
    /// `Some(true)` for `<a/>`, `Some(false)` for `<a></a>`, `None` when the
    /// choice is left to the serializer configuration.
    pub(crate) self_closing: Option<bool>,
    /// The start tag exactly as read, until the tag is changed.
    pub(crate) raw_start_tag: Option<String>,
}

impl Element {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            open_tag_whitespace: String::new(),
            close_tag_whitespace: String::new(),
            closing_whitespace: String::new(),
            self_closing: None,
            raw_start_tag: None,
        }
    }

    /// The qualified name as written, e.g. `ns1:item`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The prefix part of the name, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        split_qname(&self.name).0
    }

    /// The local part of the name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        split_qname(&self.name).1
    }

    /// Attributes in document order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Looks up an attribute by qualified name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    /// Looks up an attribute value by qualified name.
    #[must_use]
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute(name).map(Attribute::value)
    }

    pub(crate) fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name() == name)
    }

    #[must_use]
    pub fn open_tag_whitespace(&self) -> &str {
        &self.open_tag_whitespace
    }

    #[must_use]
    pub fn close_tag_whitespace(&self) -> &str {
        &self.close_tag_whitespace
    }

    /// Whitespace written between the last child and the end tag.
    #[must_use]
    pub fn closing_whitespace(&self) -> &str {
        &self.closing_whitespace
    }

    /// Whether the element was written as an empty-element tag.
    ///
    /// `None` for elements built through the API, whose form is decided by
    /// [`Config::empty_element_style`](crate::Config) when they have no children.
    #[must_use]
    pub fn self_closing(&self) -> Option<bool> {
        self.self_closing
    }

    /// The start tag exactly as it was read, if the tag is unchanged.
    #[must_use]
    pub fn raw_start_tag(&self) -> Option<&str> {
        self.raw_start_tag.as_deref()
    }
}

impl ContainerNode for Element {
    fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Payload of a text node.
///
/// `raw` is `None` when the text must be rendered from `content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub(crate) content: String,
    pub(crate) raw: Option<String>,
    pub(crate) cdata: bool,
}

impl Text {
    pub(crate) fn new(content: impl Into<String>, cdata: bool) -> Self {
        Self {
            content: content.into(),
            raw: None,
            cdata,
        }
    }

    /// The decoded text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// The source spelling with entity references intact.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Whether this text is a CDATA section.
    #[must_use]
    pub fn is_cdata(&self) -> bool {
        self.cdata
    }

    /// Returns `true` if the content is empty or only whitespace.
    #[must_use]
    pub fn is_whitespace_only(&self) -> bool {
        self.content.chars().all(char::is_whitespace)
    }
}

/// Payload of a comment node. The content is kept exactly as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub(crate) content: String,
}

impl Comment {
    /// The text between `<!--` and `-->`.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Payload of a processing instruction node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingInstruction {
    pub(crate) target: String,
    pub(crate) data: String,
    pub(crate) raw: Option<String>,
}

impl ProcessingInstruction {
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// The instruction exactly as written, if unchanged.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

/// The `<?xml ...?>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    pub(crate) version: String,
    pub(crate) encoding: Option<String>,
    pub(crate) standalone: Option<bool>,
    pub(crate) raw: Option<String>,
}

impl XmlDeclaration {
    /// Creates a declaration that will be rendered from its fields.
    #[must_use]
    pub fn new(version: &str, encoding: Option<&str>, standalone: Option<bool>) -> Self {
        Self {
            version: version.to_string(),
            encoding: encoding.map(str::to_string),
            standalone,
            raw: None,
        }
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    #[must_use]
    pub fn standalone(&self) -> Option<bool> {
        self.standalone
    }

    /// The declaration exactly as written, if it came from the input.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Renders the declaration from its fields.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("<?xml version=\"{}\"", self.version);
        if let Some(encoding) = &self.encoding {
            out.push_str(&format!(" encoding=\"{encoding}\""));
        }
        if let Some(standalone) = self.standalone {
            out.push_str(if standalone {
                " standalone=\"yes\""
            } else {
                " standalone=\"no\""
            });
        }
        out.push_str("?>");
        out
    }
}

impl Default for XmlDeclaration {
    fn default() -> Self {
        Self::new("1.0", Some("UTF-8"), None)
    }
}

/// A `<!DOCTYPE ...>` declaration, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctype {
    pub(crate) raw: String,
    pub(crate) preceding_whitespace: String,
    /// The top-level node the declaration is written before.
    pub(crate) before: Option<NodeId>,
}

impl Doctype {
    /// The complete declaration including `<!DOCTYPE` and `>`.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The declared root element name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.raw
            .trim_start_matches("<!DOCTYPE")
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '[' || c == '>')
            .next()
            .unwrap_or("")
    }

    #[must_use]
    pub fn preceding_whitespace(&self) -> &str {
        &self.preceding_whitespace
    }
}
