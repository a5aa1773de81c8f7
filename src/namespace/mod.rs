//! Namespace resolution.
//!
//! Nothing namespace-related is stored on elements. Every lookup walks from
//! the element up through its ancestors and reads the `xmlns` and
//! `xmlns:prefix` attributes that are in the tree at that moment, so
//! adding or removing a declaration takes effect on the next lookup.
//!
//! See <https://www.w3.org/TR/xml-names/>.

use std::collections::BTreeMap;

use crate::error::{DomTripError, Result};
use crate::tree::{Document, NodeId};
use crate::util::qname::{split_qname, QName};

/// The namespace bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
/// The namespace of `xmlns` declarations.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

fn builtin(prefix: &str) -> Option<&'static str> {
    match prefix {
        "xml" => Some(XML_NAMESPACE),
        "xmlns" => Some(XMLNS_NAMESPACE),
        _ => None,
    }
}

/// The nearest element at or above `id`.
fn scope_element(doc: &Document, id: NodeId) -> Option<NodeId> {
    doc.ancestors(id).find(|&a| doc.element(a).is_some())
}

/// Resolves `prefix` (`""` for the default namespace) at `id`.
///
/// Returns `None` when no element in scope declares the prefix, or when the
/// default namespace has been undeclared with `xmlns=""`. For a non-element
/// node the lookup starts at its nearest element ancestor.
///
/// ```
/// use domtrip::{namespace, Document};
///
/// let doc = Document::parse_str("<r xmlns:a='urn:a'><a:c/></r>").unwrap();
/// let c = doc.descendant_element(doc.root(), "a:c").unwrap();
/// assert_eq!(namespace::resolve(&doc, c, "a"), Some("urn:a"));
/// assert_eq!(namespace::resolve(&doc, c, ""), None);
/// ```
#[must_use]
pub fn resolve<'a>(doc: &'a Document, id: NodeId, prefix: &str) -> Option<&'a str> {
    if let Some(uri) = builtin(prefix) {
        return Some(uri);
    }
    let start = scope_element(doc, id)?;
    doc.ancestors(start)
        .filter_map(|a| doc.element(a))
        .find_map(|element| {
            element
                .attributes()
                .iter()
                .find(|attr| attr.declared_prefix() == Some(prefix))
        })
        .map(|attr| attr.value())
        .filter(|uri| !uri.is_empty())
}

/// Splits a qualified name and resolves its prefix at `id`.
///
/// An unprefixed name takes the default namespace in scope, as element
/// names do.
///
/// # Errors
///
/// [`DomTripError::NotFound`] if the prefix is not declared in scope,
/// [`DomTripError::InvalidName`] if the name is malformed.
pub fn resolve_qname(doc: &Document, id: NodeId, qualified_name: &str) -> Result<QName> {
    let parsed = QName::parse(qualified_name)?;
    let uri = match parsed.prefix() {
        Some(prefix) => Some(resolve(doc, id, prefix).ok_or_else(|| {
            DomTripError::NotFound(format!("undeclared namespace prefix '{prefix}'"))
        })?),
        None => resolve(doc, id, ""),
    };
    Ok(QName::from_parts(uri, parsed.local_name(), parsed.prefix()))
}

/// Finds a prefix bound to `uri` at `id`, innermost declaration first.
///
/// Returns `Some("")` when `uri` is the default namespace. A declaration
/// shadowed by a closer one for the same prefix is skipped.
#[must_use]
pub fn prefix_for<'a>(doc: &'a Document, id: NodeId, uri: &str) -> Option<&'a str> {
    if uri == XML_NAMESPACE {
        return Some("xml");
    }
    let start = scope_element(doc, id)?;
    doc.ancestors(start)
        .filter_map(|a| doc.element(a))
        .flat_map(|element| element.attributes())
        .filter(|attr| attr.value() == uri)
        .filter_map(|attr| attr.declared_prefix())
        .find(|prefix| resolve(doc, start, prefix) == Some(uri))
}

/// Collects every binding in scope at `id`.
#[must_use]
pub fn namespace_context(doc: &Document, id: NodeId) -> NamespaceContext {
    let mut bindings = BTreeMap::new();
    if let Some(start) = scope_element(doc, id) {
        for element in doc.ancestors(start).filter_map(|a| doc.element(a)) {
            for attr in element.attributes() {
                if let Some(prefix) = attr.declared_prefix() {
                    bindings
                        .entry(prefix.to_string())
                        .or_insert_with(|| attr.value().to_string());
                }
            }
        }
    }
    bindings.retain(|_, uri| !uri.is_empty());
    NamespaceContext { bindings }
}

/// A snapshot of the prefix to URI bindings visible at one node.
///
/// The snapshot does not follow later edits; take a new one after changing
/// declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceContext {
    /// Prefix to URI; the default namespace is stored under `""`.
    bindings: BTreeMap<String, String>,
}

impl NamespaceContext {
    /// The URI bound to `prefix`, including the built-in `xml` and `xmlns`.
    #[must_use]
    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        builtin(prefix).or_else(|| self.bindings.get(prefix).map(String::as_str))
    }

    #[must_use]
    pub fn default_namespace(&self) -> Option<&str> {
        self.namespace_uri("")
    }

    /// Some prefix bound to `uri`, preferring the default namespace.
    #[must_use]
    pub fn prefix(&self, uri: &str) -> Option<&str> {
        if uri == XML_NAMESPACE {
            return Some("xml");
        }
        self.bindings
            .iter()
            .find(|(_, bound)| bound.as_str() == uri)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// All prefixes bound to `uri`, in sorted order.
    pub fn prefixes<'s: 'u, 'u>(&'s self, uri: &'u str) -> impl Iterator<Item = &'s str> + 'u {
        self.bindings
            .iter()
            .filter(move |(_, bound)| bound.as_str() == uri)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// The declared prefixes, without the built-in ones.
    pub fn declared_prefixes(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_declared(&self, prefix: &str) -> bool {
        self.namespace_uri(prefix).is_some()
    }

    /// Resolves a qualified name against this snapshot.
    ///
    /// # Errors
    ///
    /// [`DomTripError::NotFound`] for an undeclared prefix,
    /// [`DomTripError::InvalidName`] for a malformed name.
    pub fn resolve_qname(&self, qualified_name: &str) -> Result<QName> {
        let parsed = QName::parse(qualified_name)?;
        let uri = match parsed.prefix() {
            Some(prefix) => Some(self.namespace_uri(prefix).ok_or_else(|| {
                DomTripError::NotFound(format!("undeclared namespace prefix '{prefix}'"))
            })?),
            None => self.default_namespace(),
        };
        Ok(QName::from_parts(uri, parsed.local_name(), parsed.prefix()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Document {
    /// The namespace URI of an element, resolved from its prefix.
    #[must_use]
    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        let element = self.element(id)?;
        resolve(self, id, element.prefix().unwrap_or(""))
    }

    /// The local part of an element name.
    #[must_use]
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.local_name())
    }

    /// The prefix of an element name.
    #[must_use]
    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(|e| e.prefix())
    }

    /// The resolved name of an element.
    ///
    /// # Errors
    ///
    /// [`DomTripError::NotFound`] if the element's prefix is undeclared,
    /// [`DomTripError::InvalidOperation`] if `id` is not an element.
    pub fn qname(&self, id: NodeId) -> Result<QName> {
        let element = self
            .element(id)
            .ok_or_else(|| DomTripError::InvalidOperation("node is not an element".to_string()))?;
        resolve_qname(self, id, element.name())
    }

    /// Resolves an attribute name on an element. Unprefixed attributes are
    /// in no namespace.
    ///
    /// # Errors
    ///
    /// [`DomTripError::NotFound`] if the prefix is undeclared.
    pub fn attribute_qname(&self, id: NodeId, name: &str) -> Result<QName> {
        let (prefix, local) = split_qname(name);
        match prefix {
            None => QName::parse(name).map(|_| QName::local(local)),
            Some(_) => resolve_qname(self, id, name),
        }
    }

    /// Bindings in scope at a node.
    #[must_use]
    pub fn namespace_context(&self, id: NodeId) -> NamespaceContext {
        namespace_context(self, id)
    }
}
