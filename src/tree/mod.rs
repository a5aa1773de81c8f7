//! Arena-based XML document tree.
//!
//! All nodes live in a contiguous `Vec<NodeData>` owned by the [`Document`]
//! and are referenced by [`NodeId`], a newtype over `NonZeroU32`. The parent
//! link is a plain index, so walking up the tree (for namespace resolution
//! or depth queries) is O(1) per step and no ownership cycle exists. Only the
//! container payloads ([`DocumentNode`] and [`Element`]) own a child list.
//!
//! Every node also records the whitespace written before and after it and
//! whether the mutation API has touched it. Nodes removed from the tree stay
//! allocated in the arena until the document is dropped.
//!
//! A `NodeId` is only meaningful for the document that created it. Use
//! [`Document::import_node`] to copy a subtree between documents.

mod attribute;
mod mutation;
mod node;
mod query;
mod whitespace;

pub use attribute::{escape_attribute_value, Attribute, QuoteStyle};
pub use node::{
    Comment, ContainerNode, Doctype, DocumentNode, Element, NodeKind, NodeType,
    ProcessingInstruction, Text, XmlDeclaration,
};
pub use query::ElementQuery;

use std::num::NonZeroU32;
use std::path::Path;

use log::debug;

use crate::config::Config;
use crate::error::{ParseDiagnostic, Result};

/// A typed index into the document's node arena.
///
/// `NodeId` is a newtype over `NonZeroU32`, meaning it can never be zero
/// and `Option<NodeId>` has the same size as `NodeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw arena index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    /// Returns the raw index as a `usize` for indexing into the arena.
    fn as_index(self) -> usize {
        self.0.get() as usize
    }

    /// Converts this `NodeId` to its raw `u32` value.
    #[must_use]
    pub fn into_raw(self) -> u32 {
        self.0.get()
    }

    /// Creates a `NodeId` from a raw `u32`, if non-zero.
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }
}

/// Storage for a single node in the document arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Parent node, if attached. Never owns the node.
    pub parent: Option<NodeId>,
    /// Whitespace written immediately before the node.
    pub preceding_whitespace: String,
    /// Whitespace written immediately after the node.
    pub following_whitespace: String,
    /// Set once the mutation API has changed this node.
    pub modified: bool,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            preceding_whitespace: String::new(),
            following_whitespace: String::new(),
            modified: false,
        }
    }
}

/// An XML document.
///
/// The `Document` owns all nodes in an arena and provides methods for
/// navigation (`&Document`) and mutation (`&mut Document`).
///
/// # Examples
///
/// ```
/// use domtrip::Document;
///
/// let input = "<root>\n  <child a='1'/>\n</root>";
/// let doc = Document::parse_str(input).unwrap();
/// let root = doc.root_element().unwrap();
/// assert_eq!(doc.node_name(root), Some("root"));
/// assert_eq!(doc.to_xml(), input);
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    /// The node arena. Index 0 is unused (placeholder for `NonZeroU32`).
    nodes: Vec<NodeData>,
    /// The document node id (not the root element).
    root: NodeId,
    pub(crate) xml_declaration: Option<XmlDeclaration>,
    pub(crate) doctype: Option<Doctype>,
    /// Whitespace after the last top-level node.
    pub(crate) trailing_whitespace: String,
    /// Whether the input started with a Byte Order Mark.
    pub(crate) bom: bool,
    /// The encoding the input bytes were decoded from.
    pub(crate) source_encoding: Option<&'static str>,
    pub(crate) config: Config,
    /// Warnings recorded while parsing with lenient recovery.
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl Document {
    /// Creates a new empty document with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a new empty document that edits and serializes with `config`.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        let mut nodes = Vec::with_capacity(64);
        // Index 0: placeholder (NodeId uses NonZeroU32)
        nodes.push(NodeData::new(NodeKind::Document(DocumentNode::default())));
        // Index 1: the document node
        nodes.push(NodeData::new(NodeKind::Document(DocumentNode::default())));
        Self {
            nodes,
            root: NodeId::from_index(1),
            xml_declaration: None,
            doctype: None,
            trailing_whitespace: String::new(),
            bom: false,
            source_encoding: None,
            config,
            diagnostics: Vec::new(),
        }
    }

    /// Creates a document with an XML declaration and an empty root element.
    ///
    /// # Errors
    ///
    /// Returns [`DomTripError::InvalidName`](crate::DomTripError::InvalidName)
    /// if `name` is not a valid element name.
    ///
    /// ```
    /// use domtrip::Document;
    ///
    /// let doc = Document::with_root_element("project").unwrap();
    /// assert_eq!(doc.to_xml(), "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<project/>");
    /// ```
    pub fn with_root_element(name: &str) -> Result<Self> {
        let mut doc = Self::new();
        doc.xml_declaration = Some(XmlDeclaration::default());
        let root = doc.create_element(name)?;
        let line_ending = doc.config.line_ending.clone();
        doc.node_mut(root).preceding_whitespace = line_ending;
        doc.append_child(doc.root, root)?;
        Ok(doc)
    }

    /// Parses an XML string with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DomTripError::Parse`](crate::DomTripError::Parse) if the
    /// input is not well-formed.
    ///
    /// ```
    /// use domtrip::Document;
    ///
    /// let doc = Document::parse_str("<root><child/></root>").unwrap();
    /// assert!(doc.root_element().is_some());
    /// ```
    pub fn parse_str(input: &str) -> Result<Self> {
        Self::parse_str_with_config(input, &Config::default())
    }

    /// Parses an XML string with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DomTripError::Parse`](crate::DomTripError::Parse) if the
    /// input is not well-formed.
    pub fn parse_str_with_config(input: &str, config: &Config) -> Result<Self> {
        Ok(crate::parser::parse_str_with_config(input, config)?)
    }

    /// Parses XML from raw bytes, detecting the encoding.
    ///
    /// See [`crate::encoding::decode`] for the detection rules.
    ///
    /// # Errors
    ///
    /// Returns [`DomTripError::Encoding`](crate::DomTripError::Encoding) if
    /// the bytes cannot be decoded, or a parse error for malformed markup.
    ///
    /// ```
    /// use domtrip::Document;
    ///
    /// let doc = Document::parse_bytes(b"\xEF\xBB\xBF<root/>").unwrap();
    /// assert!(doc.has_bom());
    /// assert_eq!(doc.to_bytes().unwrap(), b"\xEF\xBB\xBF<root/>");
    /// ```
    pub fn parse_bytes(input: &[u8]) -> Result<Self> {
        Self::parse_bytes_with_config(input, None, &Config::default())
    }

    /// Parses XML from raw bytes. `encoding` overrides detection.
    ///
    /// # Errors
    ///
    /// Returns an encoding or parse error.
    pub fn parse_bytes_with_config(
        input: &[u8],
        encoding: Option<&str>,
        config: &Config,
    ) -> Result<Self> {
        let decoded = crate::encoding::decode(input, encoding)?;
        let mut doc = crate::parser::parse_str_with_config(&decoded.text, config)?;
        doc.bom = decoded.bom;
        doc.source_encoding = Some(decoded.encoding);
        Ok(doc)
    }

    /// Reads and parses a file with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an I/O, encoding or parse error.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse_file_with_config(path, &Config::default())
    }

    /// Reads and parses a file.
    ///
    /// # Errors
    ///
    /// Returns an I/O, encoding or parse error.
    pub fn parse_file_with_config(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        debug!("read {} bytes from {}", bytes.len(), path.display());
        Self::parse_bytes_with_config(&bytes, None, config)
    }

    // --- Configuration and document-level records ---

    /// The configuration used by mutation inference and [`Document::to_xml`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replaces the configuration.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// The XML declaration, if the document has one.
    #[must_use]
    pub fn xml_declaration(&self) -> Option<&XmlDeclaration> {
        self.xml_declaration.as_ref()
    }

    /// Sets or removes the XML declaration.
    pub fn set_xml_declaration(&mut self, declaration: Option<XmlDeclaration>) {
        self.xml_declaration = declaration;
    }

    /// The DOCTYPE declaration, if present.
    #[must_use]
    pub fn doctype(&self) -> Option<&Doctype> {
        self.doctype.as_ref()
    }

    /// Whitespace after the last top-level node.
    #[must_use]
    pub fn trailing_whitespace(&self) -> &str {
        &self.trailing_whitespace
    }

    pub fn set_trailing_whitespace(&mut self, whitespace: impl Into<String>) {
        self.trailing_whitespace = whitespace.into();
    }

    /// Whether the input started with a Byte Order Mark.
    #[must_use]
    pub fn has_bom(&self) -> bool {
        self.bom
    }

    /// The encoding the document was decoded from, for byte input.
    #[must_use]
    pub fn source_encoding(&self) -> Option<&'static str> {
        self.source_encoding
    }

    /// The encoding used by [`Document::to_bytes`]: the source encoding,
    /// else the declared one, else UTF-8.
    #[must_use]
    pub fn output_encoding(&self) -> &str {
        self.source_encoding
            .or_else(|| self.xml_declaration.as_ref().and_then(XmlDeclaration::encoding))
            .unwrap_or("UTF-8")
    }

    // --- Node access ---

    /// Returns the document node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the root element, if the document has one.
    #[must_use]
    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .iter()
            .copied()
            .find(|&id| self.element(id).is_some())
    }

    /// Returns the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the node's payload.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    #[must_use]
    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.kind(id).node_type()
    }

    /// Returns the element payload if `id` is an element.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.kind(id).as_element()
    }

    /// Returns the text payload if `id` is a text or CDATA node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&Text> {
        self.kind(id).as_text()
    }

    #[must_use]
    pub fn comment(&self, id: NodeId) -> Option<&Comment> {
        match self.kind(id) {
            NodeKind::Comment(comment) => Some(comment),
            _ => None,
        }
    }

    #[must_use]
    pub fn processing_instruction(&self, id: NodeId) -> Option<&ProcessingInstruction> {
        match self.kind(id) {
            NodeKind::ProcessingInstruction(pi) => Some(pi),
            _ => None,
        }
    }

    /// Returns the qualified name of an element or the target of a
    /// processing instruction.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element(element) => Some(element.name()),
            NodeKind::ProcessingInstruction(pi) => Some(pi.target()),
            _ => None,
        }
    }

    /// Returns the concatenated decoded text of a node and its descendants.
    ///
    /// Inside elements with mixed content the connective whitespace around
    /// the children is text too, so `<p><b>big</b> <i>world</i></p>` yields
    /// `"big world"`. Elsewhere it is layout and left out.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        enum Step<'d> {
            Visit(NodeId),
            Emit(&'d str),
        }

        let mut result = String::new();
        let mut stack = vec![Step::Visit(id)];
        while let Some(step) = stack.pop() {
            let current = match step {
                Step::Emit(whitespace) => {
                    result.push_str(whitespace);
                    continue;
                }
                Step::Visit(current) => current,
            };
            match self.kind(current) {
                NodeKind::Text(text) => result.push_str(text.content()),
                NodeKind::Element(element) if self.has_mixed_content(current) => {
                    stack.push(Step::Emit(element.closing_whitespace()));
                    for &child in element.children.iter().rev() {
                        let data = self.node(child);
                        stack.push(Step::Emit(&data.following_whitespace));
                        stack.push(Step::Visit(child));
                        stack.push(Step::Emit(&data.preceding_whitespace));
                    }
                }
                NodeKind::Element(_) | NodeKind::Document(_) => {
                    stack.extend(self.children(current).iter().rev().map(|&c| Step::Visit(c)));
                }
                _ => {}
            }
        }
        result
    }

    /// Whether the whitespace around an element's children belongs to its
    /// text rather than to the layout.
    ///
    /// That is the case when the element has a text child, or when two of
    /// its children are separated by whitespace without a line break, as in
    /// `<b>big</b> <i>world</i>`.
    #[must_use]
    pub fn has_mixed_content(&self, id: NodeId) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        element.children.iter().any(|&c| self.text(c).is_some())
            || element.children.iter().skip(1).any(|&c| {
                let whitespace = &self.node(c).preceding_whitespace;
                !whitespace.is_empty() && !whitespace.contains('\n')
            })
    }

    /// Returns the attributes of an element, or an empty slice.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        self.element(id).map_or(&[], Element::attributes)
    }

    /// Returns the decoded value of an attribute.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attribute_value(name))
    }

    #[must_use]
    pub fn preceding_whitespace(&self, id: NodeId) -> &str {
        &self.node(id).preceding_whitespace
    }

    #[must_use]
    pub fn following_whitespace(&self, id: NodeId) -> &str {
        &self.node(id).following_whitespace
    }

    /// Whether the mutation API has changed this node.
    #[must_use]
    pub fn is_modified(&self, id: NodeId) -> bool {
        self.node(id).modified
    }

    /// Whether any node reachable from the document node has been modified.
    #[must_use]
    pub fn has_modifications(&self) -> bool {
        self.descendants(self.root).any(|id| self.node(id).modified)
    }

    /// Clears the modified flag on every node.
    ///
    /// Changed nodes have no raw text left, so they keep being rendered;
    /// only the flag is reset.
    pub fn clear_modified(&mut self) {
        for node in &mut self.nodes {
            node.modified = false;
        }
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the parent if it is an element.
    #[must_use]
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.element(p).is_some())
    }

    /// Returns the children of a node. Leaf nodes have none.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.kind(id)
            .as_container()
            .map_or(&[], ContainerNode::children)
    }

    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Returns the position of a node among its parent's children.
    #[must_use]
    pub fn sibling_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.sibling_index(id)?;
        self.children(parent).get(index + 1).copied()
    }

    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.sibling_index(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Returns the next sibling that is an element.
    #[must_use]
    pub fn next_sibling_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.sibling_index(id)?;
        self.children(parent)[index + 1..]
            .iter()
            .copied()
            .find(|&c| self.element(c).is_some())
    }

    /// Returns the previous sibling that is an element.
    #[must_use]
    pub fn prev_sibling_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.sibling_index(id)?;
        self.children(parent)[..index]
            .iter()
            .rev()
            .copied()
            .find(|&c| self.element(c).is_some())
    }

    /// Returns an iterator over a node and its ancestors, walking up to the
    /// document node.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id),
        }
    }

    /// Returns an iterator over all descendants of a node in document order,
    /// not including the node itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: self.children(id).iter().rev().copied().collect(),
        }
    }

    /// Number of element ancestors. The root element has depth 0.
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id)
            .skip(1)
            .filter(|&a| self.element(a).is_some())
            .count()
    }

    /// Returns `true` if `ancestor` is a proper ancestor of `id`.
    #[must_use]
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(id).skip(1).any(|a| a == ancestor)
    }

    /// Returns the total number of nodes in the arena, including detached
    /// ones.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    // --- Arena primitives ---

    /// Allocates a detached node.
    pub(crate) fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind));
        NodeId::from_index(index)
    }

    /// Links `child` into `parent` at `index` without any checks.
    pub(crate) fn link(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if let Some(children) = self.node_mut(parent).kind.children_mut() {
            children.insert(index, child);
            self.node_mut(child).parent = Some(parent);
        }
    }

    /// Appends `child` to `parent` without any checks.
    pub(crate) fn link_last(&mut self, parent: NodeId, child: NodeId) {
        let index = self.children(parent).len();
        self.link(parent, index, child);
    }

    /// Unlinks `id` from its parent, if any.
    pub(crate) fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        if let Some(children) = self.node_mut(parent).kind.children_mut() {
            children.retain(|&c| c != id);
        }
        self.node_mut(id).parent = None;
    }

    // --- Serialization shortcuts ---

    /// Serializes the document with its own configuration.
    #[must_use]
    pub fn to_xml(&self) -> String {
        crate::serial::serialize(self, &self.config)
    }

    /// Serializes the document with the given configuration.
    #[must_use]
    pub fn to_xml_with(&self, config: &Config) -> String {
        crate::serial::serialize(self, config)
    }

    /// Serializes and encodes the document in its output encoding.
    ///
    /// # Errors
    ///
    /// Returns an encoding error if the output encoding is unsupported.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(crate::serial::to_bytes(self, &self.config)?)
    }

    /// Writes the encoded document to a file.
    ///
    /// # Errors
    ///
    /// Returns an encoding or I/O error.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// --- Iterators ---

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}

/// Depth-first iterator over the descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(current).iter().rev().copied());
        Some(current)
    }
}
