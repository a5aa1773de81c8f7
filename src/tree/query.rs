//! Read-only element navigation.
//!
//! Plain-name lookups compare the qualified name exactly as written. The
//! `_ns` variants compare resolved names, so `<a:item>` and `<b:item>` match
//! the same [`QName`] when both prefixes are bound to the same URI.

use crate::namespace;
use crate::util::qname::QName;

use super::{Document, NodeId};

impl Document {
    /// Returns the element children of a node.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
    }

    /// Returns the first child element with the given qualified name.
    #[must_use]
    pub fn child_element(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.child_elements_named(id, name).next()
    }

    /// Returns all child elements with the given qualified name.
    pub fn child_elements_named<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.child_elements(id)
            .filter(move |&c| self.node_name(c) == Some(name))
    }

    /// Returns the first descendant element with the given qualified name,
    /// depth-first in document order.
    #[must_use]
    pub fn descendant_element(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.descendant_elements(id, name).next()
    }

    /// Returns all descendant elements with the given qualified name in
    /// document order.
    pub fn descendant_elements<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(id)
            .filter(move |&d| self.element(d).is_some_and(|e| e.name() == name))
    }

    /// Whether an element's resolved name equals `name`.
    ///
    /// An element whose prefix is undeclared has no namespace URI.
    #[must_use]
    pub fn has_qname(&self, id: NodeId, name: &QName) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        element.local_name() == name.local_name()
            && namespace::resolve(self, id, element.prefix().unwrap_or("")) == name.namespace_uri()
    }

    #[must_use]
    pub fn child_element_ns(&self, id: NodeId, name: &QName) -> Option<NodeId> {
        self.child_elements_ns(id, name).next()
    }

    pub fn child_elements_ns<'a>(
        &'a self,
        id: NodeId,
        name: &'a QName,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.child_elements(id)
            .filter(move |&c| self.has_qname(c, name))
    }

    #[must_use]
    pub fn descendant_element_ns(&self, id: NodeId, name: &QName) -> Option<NodeId> {
        self.descendant_elements_ns(id, name).next()
    }

    pub fn descendant_elements_ns<'a>(
        &'a self,
        id: NodeId,
        name: &'a QName,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(id)
            .filter(move |&d| self.has_qname(d, name))
    }

    /// Follows a chain of child element names.
    ///
    /// ```
    /// use domtrip::Document;
    ///
    /// let doc = Document::parse_str("<project><build><plugins/></build></project>").unwrap();
    /// let root = doc.root_element().unwrap();
    /// let plugins = doc.path(root, &["build", "plugins"]).unwrap();
    /// assert_eq!(doc.node_name(plugins), Some("plugins"));
    /// ```
    #[must_use]
    pub fn path(&self, id: NodeId, names: &[&str]) -> Option<NodeId> {
        names
            .iter()
            .try_fold(id, |current, name| self.child_element(current, name))
    }

    /// The text content of the first child element named `name`.
    #[must_use]
    pub fn child_text(&self, id: NodeId, name: &str) -> Option<String> {
        self.child_element(id, name).map(|c| self.text_content(c))
    }

    /// Starts a filtered search over the descendant elements of `id`.
    #[must_use]
    pub fn query(&self, id: NodeId) -> ElementQuery<'_> {
        ElementQuery {
            doc: self,
            scope: id,
            filters: Vec::new(),
        }
    }
}

type Filter<'a> = Box<dyn Fn(&Document, NodeId) -> bool + 'a>;

/// A lazy, filtered search over descendant elements.
///
/// Filters are combined with logical AND and evaluated in document order
/// when a terminal method is called.
///
/// ```
/// use domtrip::Document;
///
/// let doc = Document::parse_str(
///     "<deps><dep scope='test'><id>junit</id></dep><dep><id>log</id></dep></deps>",
/// ).unwrap();
/// let root = doc.root_element().unwrap();
/// let test_deps = doc.query(root).named("dep").with_attribute_value("scope", "test").all();
/// assert_eq!(test_deps.len(), 1);
/// assert_eq!(doc.child_text(test_deps[0], "id").as_deref(), Some("junit"));
/// ```
pub struct ElementQuery<'a> {
    doc: &'a Document,
    scope: NodeId,
    filters: Vec<Filter<'a>>,
}

impl<'a> ElementQuery<'a> {
    fn filter(mut self, f: impl Fn(&Document, NodeId) -> bool + 'a) -> Self {
        self.filters.push(Box::new(f));
        self
    }

    /// Elements with this local name.
    #[must_use]
    pub fn named(self, local_name: &'a str) -> Self {
        self.filter(move |doc, id| doc.element(id).is_some_and(|e| e.local_name() == local_name))
    }

    /// Elements with this resolved name.
    #[must_use]
    pub fn with_qname(self, name: QName) -> Self {
        self.filter(move |doc, id| doc.has_qname(id, &name))
    }

    /// Elements in this namespace.
    #[must_use]
    pub fn in_namespace(self, uri: &'a str) -> Self {
        self.filter(move |doc, id| doc.namespace_uri(id) == Some(uri))
    }

    /// Elements carrying the attribute, whatever its value.
    #[must_use]
    pub fn with_attribute(self, name: &'a str) -> Self {
        self.filter(move |doc, id| doc.attribute(id, name).is_some())
    }

    #[must_use]
    pub fn with_attribute_value(self, name: &'a str, value: &'a str) -> Self {
        self.filter(move |doc, id| doc.attribute(id, name) == Some(value))
    }

    /// Elements whose trimmed text content equals `text`.
    #[must_use]
    pub fn with_text(self, text: &'a str) -> Self {
        self.filter(move |doc, id| doc.text_content(id).trim() == text)
    }

    #[must_use]
    pub fn containing_text(self, text: &'a str) -> Self {
        self.filter(move |doc, id| doc.text_content(id).contains(text))
    }

    /// Elements at this depth; the root element is at depth 0.
    #[must_use]
    pub fn at_depth(self, depth: usize) -> Self {
        self.filter(move |doc, id| doc.depth(id) == depth)
    }

    /// Elements with at least one child element.
    #[must_use]
    pub fn with_children(self) -> Self {
        self.filter(|doc, id| doc.child_elements(id).next().is_some())
    }

    /// Elements with no child elements.
    #[must_use]
    pub fn without_children(self) -> Self {
        self.filter(|doc, id| doc.child_elements(id).next().is_none())
    }

    #[must_use]
    pub fn matching(self, predicate: impl Fn(&Document, NodeId) -> bool + 'a) -> Self {
        self.filter(predicate)
    }

    /// Iterates over the matches.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.doc.descendants(self.scope).filter(move |&id| {
            self.doc.element(id).is_some() && self.filters.iter().all(|f| f(self.doc, id))
        })
    }

    #[must_use]
    pub fn first(&self) -> Option<NodeId> {
        self.iter().next()
    }

    #[must_use]
    pub fn all(&self) -> Vec<NodeId> {
        self.iter().collect()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.first().is_some()
    }
}
