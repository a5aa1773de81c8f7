//! Tree mutation.
//!
//! Every operation validates first and changes the tree only when it cannot
//! fail any more, so an `Err` always leaves the document as it was. A change
//! marks the directly affected node modified and nothing else: ancestors keep
//! their raw start tags and untouched siblings keep their spans.

use log::debug;

use crate::error::{DomTripError, Result};
use crate::parser::input::{is_valid_name, is_xml_whitespace};
use crate::util::qname::QName;

use super::{
    Attribute, Comment, Document, Element, NodeId, NodeKind, ProcessingInstruction, Text,
};

fn invalid(message: impl Into<String>) -> DomTripError {
    DomTripError::InvalidOperation(message.into())
}

fn is_whitespace(s: &str) -> bool {
    s.bytes().all(is_xml_whitespace)
}

impl Document {
    /// Rejects names that would not survive serialization.
    ///
    /// Empty names and names containing markup delimiters or whitespace are
    /// always rejected; strict configurations also require the XML `Name`
    /// production.
    pub(crate) fn check_name(&self, name: &str) -> Result<()> {
        let breaks_markup = name.is_empty()
            || name.chars().any(|c| {
                c.is_whitespace() || matches!(c, '<' | '>' | '/' | '=' | '"' | '\'' | '&' | '?' | '!')
            });
        if breaks_markup || (self.config.strict_names && !is_valid_name(name)) {
            return Err(DomTripError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element> {
        self.node_mut(id)
            .kind
            .as_element_mut()
            .ok_or_else(|| invalid("node is not an element"))
    }

    // --- Factories ---

    /// Creates a detached element with no attributes or children.
    ///
    /// # Errors
    ///
    /// Returns [`DomTripError::InvalidName`] for an unusable name.
    pub fn create_element(&mut self, name: &str) -> Result<NodeId> {
        self.check_name(name)?;
        let id = self.alloc(NodeKind::Element(Element::new(name)));
        self.node_mut(id).modified = true;
        Ok(id)
    }

    /// Creates a detached element for a namespaced name, declaring the
    /// namespace on the element itself.
    ///
    /// ```
    /// use domtrip::{Document, QName};
    ///
    /// let mut doc = Document::parse_str("<root/>").unwrap();
    /// let name = QName::with_prefix("urn:x", "item", "x");
    /// let item = doc.create_element_ns(&name).unwrap();
    /// doc.append_child(doc.root_element().unwrap(), item).unwrap();
    /// assert_eq!(doc.to_xml(), "<root>\n    <x:item xmlns:x=\"urn:x\"/>\n</root>");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`DomTripError::InvalidName`] for an unusable name.
    pub fn create_element_ns(&mut self, name: &QName) -> Result<NodeId> {
        let id = self.create_element(&name.qualified_name())?;
        if let Some(uri) = name.namespace_uri() {
            let attribute = match name.prefix() {
                Some(prefix) => format!("xmlns:{prefix}"),
                None => "xmlns".to_string(),
            };
            let quote = self.config.default_quote_style;
            self.element_mut(id)?
                .attributes
                .push(Attribute::new(attribute, uri).with_quote_style(quote));
        }
        Ok(id)
    }

    /// Creates a detached element holding a single text child.
    ///
    /// # Errors
    ///
    /// Returns [`DomTripError::InvalidName`] for an unusable name.
    pub fn create_element_with_text(&mut self, name: &str, text: &str) -> Result<NodeId> {
        let id = self.create_element(name)?;
        let child = self.create_text(text);
        self.link_last(id, child);
        Ok(id)
    }

    /// Creates a detached text node. The content is escaped on output.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        let id = self.alloc(NodeKind::Text(Text::new(content, false)));
        self.node_mut(id).modified = true;
        id
    }

    /// Creates a detached CDATA section.
    pub fn create_cdata(&mut self, content: &str) -> NodeId {
        let id = self.alloc(NodeKind::Text(Text::new(content, true)));
        self.node_mut(id).modified = true;
        id
    }

    /// Creates a detached comment.
    ///
    /// # Errors
    ///
    /// Returns [`DomTripError::InvalidOperation`] if the content contains
    /// `--` or ends with `-`.
    pub fn create_comment(&mut self, content: &str) -> Result<NodeId> {
        check_comment(content)?;
        let id = self.alloc(NodeKind::Comment(Comment {
            content: content.to_string(),
        }));
        self.node_mut(id).modified = true;
        Ok(id)
    }

    /// Creates a detached processing instruction.
    ///
    /// # Errors
    ///
    /// Returns [`DomTripError::InvalidName`] for an unusable or reserved
    /// target, [`DomTripError::InvalidOperation`] if `data` contains `?>`.
    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> Result<NodeId> {
        self.check_name(target)?;
        if target.eq_ignore_ascii_case("xml") {
            return Err(DomTripError::InvalidName(target.to_string()));
        }
        if data.contains("?>") {
            return Err(invalid("processing instruction data cannot contain \"?>\""));
        }
        let id = self.alloc(NodeKind::ProcessingInstruction(ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
            raw: None,
        }));
        self.node_mut(id).modified = true;
        Ok(id)
    }

    /// Copies a node (and with `deep`, its subtree) into a detached node.
    ///
    /// The copy keeps the source formatting, including raw spans, except
    /// for its own connective whitespace, which is inferred again when it is
    /// inserted.
    ///
    /// # Errors
    ///
    /// [`DomTripError::InvalidOperation`] for the document node.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> Result<NodeId> {
        if id == self.root {
            return Err(invalid("the document node cannot be copied"));
        }
        let copy = self.clone_subtree(id, deep);
        Ok(self.detach_whitespace(copy))
    }

    /// Copies a node from another document into this one, detached.
    ///
    /// # Errors
    ///
    /// [`DomTripError::InvalidOperation`] for the document node.
    pub fn import_node(&mut self, source: &Document, id: NodeId, deep: bool) -> Result<NodeId> {
        if id == source.root {
            return Err(invalid("the document node cannot be copied"));
        }
        let copy = self.import_subtree(source, id, deep);
        Ok(self.detach_whitespace(copy))
    }

    fn detach_whitespace(&mut self, id: NodeId) -> NodeId {
        let node = self.node_mut(id);
        node.preceding_whitespace.clear();
        node.following_whitespace.clear();
        id
    }

    fn clone_subtree(&mut self, id: NodeId, deep: bool) -> NodeId {
        let data = self.node(id).clone();
        let copy = self.alloc_copy(&data, deep);
        if deep {
            let mut pending = vec![(id, copy)];
            while let Some((original, target)) = pending.pop() {
                for child in self.children(original).to_vec() {
                    let data = self.node(child).clone();
                    let child_copy = self.alloc_copy(&data, true);
                    self.link_last(target, child_copy);
                    pending.push((child, child_copy));
                }
            }
        }
        copy
    }

    fn import_subtree(&mut self, source: &Document, id: NodeId, deep: bool) -> NodeId {
        let copy = self.alloc_copy(source.node(id), deep);
        if deep {
            let mut pending = vec![(id, copy)];
            while let Some((original, target)) = pending.pop() {
                for &child in source.children(original) {
                    let child_copy = self.alloc_copy(source.node(child), true);
                    self.link_last(target, child_copy);
                    pending.push((child, child_copy));
                }
            }
        }
        copy
    }

    /// Allocates a childless copy of `data`. A shallow copy of an element
    /// loses its end tag layout.
    fn alloc_copy(&mut self, data: &super::NodeData, deep: bool) -> NodeId {
        let mut kind = data.kind.clone();
        if let Some(children) = kind.children_mut() {
            children.clear();
        }
        if !deep {
            if let Some(element) = kind.as_element_mut() {
                element.closing_whitespace.clear();
            }
        }
        let copy = self.alloc(kind);
        let node = self.node_mut(copy);
        node.preceding_whitespace = data.preceding_whitespace.clone();
        node.following_whitespace = data.following_whitespace.clone();
        node.modified = data.modified;
        copy
    }

    // --- Structure ---

    fn check_insert(&self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        if child == self.root {
            return Err(invalid("the document node cannot be inserted"));
        }
        if self.node(child).parent.is_some() {
            return Err(invalid("node already has a parent; remove it first"));
        }
        if self.kind(parent).as_container().is_none() {
            return Err(invalid(format!(
                "{:?} nodes cannot have children",
                self.node_type(parent)
            )));
        }
        if child == parent || self.is_descendant_of(parent, child) {
            return Err(invalid("cannot insert a node into its own subtree"));
        }
        let len = self.children(parent).len();
        if index > len {
            return Err(invalid(format!(
                "index {index} out of bounds for {len} children"
            )));
        }
        self.check_nesting(parent, child)?;
        if parent == self.root {
            match &self.node(child).kind {
                NodeKind::Element(_) if self.root_element().is_some() => {
                    return Err(invalid("document already has a root element"));
                }
                NodeKind::Text(_) => {
                    return Err(invalid("text cannot be a child of the document node"));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Rejects an insertion that would nest elements deeper than the
    /// parser accepts.
    fn check_nesting(&self, parent: NodeId, child: NodeId) -> Result<()> {
        let base = if self.element(parent).is_some() {
            self.depth(parent) + 1
        } else {
            0
        };
        let height = std::iter::once(child)
            .chain(self.descendants(child))
            .filter(|&id| self.element(id).is_some())
            .map(|id| self.depth(id) + 1)
            .max()
            .unwrap_or(0);
        let max = self.config.max_depth as usize;
        if base + height > max {
            return Err(invalid(format!(
                "insertion would nest elements {} deep, limit is {max}",
                base + height
            )));
        }
        Ok(())
    }

    /// Inserts a detached node as child number `index` of `parent`.
    ///
    /// A child without preceding whitespace of its own gets the layout of
    /// its nearest non-text sibling, or the parent's indentation plus one
    /// indent unit. An empty parent also gets a line break before its end tag.
    ///
    /// # Errors
    ///
    /// Returns [`DomTripError::InvalidOperation`] if `child` already has a
    /// parent, is the document node or an ancestor of `parent`, if `parent`
    /// is a leaf, if `index` is past the end, if the document would get a
    /// second root element or top-level text, or if elements would nest
    /// deeper than [`Config::max_depth`](crate::Config::max_depth).
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<NodeId> {
        self.check_insert(parent, index, child)?;

        let infer = self.node(child).preceding_whitespace.is_empty()
            && !matches!(self.node(child).kind, NodeKind::Text(_));
        if infer {
            let whitespace = self.infer_preceding_whitespace(parent, index);
            if let Some(closing) = self.infer_closing_whitespace(parent, &whitespace) {
                if let Some(element) = self.node_mut(parent).kind.as_element_mut() {
                    element.closing_whitespace = closing;
                }
            }
            self.node_mut(child).preceding_whitespace = whitespace;
        }

        if let Some(element) = self.node_mut(parent).kind.as_element_mut() {
            if element.self_closing == Some(true) {
                element.self_closing = Some(false);
                element.raw_start_tag = None;
                element.open_tag_whitespace.clear();
                self.node_mut(parent).modified = true;
            }
        }

        if parent == self.root {
            // Keep top-level nodes on separate lines.
            if let Some(&next) = self.children(parent).get(index) {
                if self.node(next).preceding_whitespace.is_empty() {
                    let newline = self.newline();
                    self.node_mut(next).preceding_whitespace = newline;
                }
            }
        }

        self.link(parent, index, child);
        self.node_mut(child).modified = true;
        debug!("inserted node {} at {index}", child.into_raw());
        Ok(child)
    }

    /// Appends a detached node as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// See [`Document::insert_child`].
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        let index = self.children(parent).len();
        self.insert_child(parent, index, child)
    }

    /// Inserts a detached node right before `reference`.
    ///
    /// # Errors
    ///
    /// [`DomTripError::NotFound`] if `reference` is detached, otherwise see
    /// [`Document::insert_child`].
    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) -> Result<NodeId> {
        let (parent, index) = self.position(reference)?;
        self.insert_child(parent, index, child)
    }

    /// Inserts a detached node right after `reference`.
    ///
    /// # Errors
    ///
    /// [`DomTripError::NotFound`] if `reference` is detached, otherwise see
    /// [`Document::insert_child`].
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> Result<NodeId> {
        let (parent, index) = self.position(reference)?;
        self.insert_child(parent, index + 1, child)
    }

    fn position(&self, id: NodeId) -> Result<(NodeId, usize)> {
        let parent = self
            .parent(id)
            .ok_or_else(|| DomTripError::NotFound("node is not attached to a parent".to_string()))?;
        let index = self
            .sibling_index(id)
            .ok_or_else(|| DomTripError::NotFound("node is missing from its parent".to_string()))?;
        Ok((parent, index))
    }

    /// Detaches `child` from `parent`, taking its preceding whitespace with
    /// it. The removed node is marked modified and can be inserted again;
    /// its connective whitespace is cleared so that the next insertion fits
    /// it to its new neighbours.
    ///
    /// # Errors
    ///
    /// Returns [`DomTripError::NotFound`] if `child` is not a child of
    /// `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        if !self.children(parent).contains(&child) {
            return Err(DomTripError::NotFound(format!(
                "node {} is not a child of node {}",
                child.into_raw(),
                parent.into_raw()
            )));
        }
        if parent == self.root {
            self.move_doctype_anchor(child);
        }
        self.unlink(child);
        self.detach_whitespace(child);
        self.node_mut(child).modified = true;
        debug!("removed node {}", child.into_raw());
        Ok(child)
    }

    /// Points the document type declaration past a top-level node that is
    /// about to be removed.
    fn move_doctype_anchor(&mut self, removed: NodeId) {
        let next = self.next_sibling(removed);
        if let Some(doctype) = &mut self.doctype {
            if doctype.before == Some(removed) {
                doctype.before = next;
            }
        }
    }

    /// Detaches a node from whatever parent it has.
    ///
    /// # Errors
    ///
    /// Returns [`DomTripError::NotFound`] if the node is already detached.
    pub fn remove_node(&mut self, id: NodeId) -> Result<NodeId> {
        let (parent, _) = self.position(id)?;
        self.remove_child(parent, id)
    }

    /// Puts the detached node `new` in the place of `old`.
    ///
    /// `new` takes over `old`'s connective whitespace unless it has its own.
    ///
    /// # Errors
    ///
    /// [`DomTripError::NotFound`] if `old` is not a child of `parent`;
    /// [`DomTripError::InvalidOperation`] for the ownership violations of
    /// [`Document::insert_child`].
    pub fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> Result<NodeId> {
        let Some(index) = self.children(parent).iter().position(|&c| c == old) else {
            return Err(DomTripError::NotFound(format!(
                "node {} is not a child of node {}",
                old.into_raw(),
                parent.into_raw()
            )));
        };
        if new == old {
            return Ok(old);
        }
        // A second root element is fine when it replaces the first.
        let replaces_root = parent == self.root && self.element(old).is_some();
        if !(replaces_root && self.element(new).is_some() && self.node(new).parent.is_none()) {
            self.check_insert(parent, index, new)?;
        } else if new == self.root || self.is_descendant_of(parent, new) {
            return Err(invalid("cannot insert a node into its own subtree"));
        } else {
            self.check_nesting(parent, new)?;
        }

        self.unlink(old);
        self.link(parent, index, new);
        if let Some(doctype) = &mut self.doctype {
            if doctype.before == Some(old) {
                doctype.before = Some(new);
            }
        }
        let (preceding, following) = {
            let old_data = self.node(old);
            (
                old_data.preceding_whitespace.clone(),
                old_data.following_whitespace.clone(),
            )
        };
        let node = self.node_mut(new);
        if node.preceding_whitespace.is_empty() {
            node.preceding_whitespace = preceding;
        }
        if node.following_whitespace.is_empty() {
            node.following_whitespace = following;
        }
        node.modified = true;
        self.node_mut(old).modified = true;
        debug!("replaced node {} with {}", old.into_raw(), new.into_raw());
        Ok(new)
    }

    /// Replaces `old` (wherever it is attached) with `new`.
    ///
    /// # Errors
    ///
    /// See [`Document::replace_child`].
    pub fn replace_node(&mut self, old: NodeId, new: NodeId) -> Result<NodeId> {
        let (parent, _) = self.position(old)?;
        self.replace_child(parent, old, new)
    }

    // --- Attributes ---

    /// Sets an attribute value, returning the attribute now stored.
    ///
    /// An existing attribute keeps its position, quote style and spacing.
    /// A new one copies the spacing and quote style of the element's last
    /// attribute, or uses a single space and the configured default quote
    /// style when there is none.
    ///
    /// ```
    /// use domtrip::Document;
    ///
    /// let mut doc = Document::parse_str("<e a='1'/>").unwrap();
    /// let e = doc.root_element().unwrap();
    /// doc.set_attribute(e, "b", "2").unwrap();
    /// assert_eq!(doc.to_xml(), "<e a='1' b='2'/>");
    /// ```
    ///
    /// # Errors
    ///
    /// [`DomTripError::InvalidName`] for an unusable name,
    /// [`DomTripError::InvalidOperation`] if `id` is not an element.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<Attribute> {
        self.check_name(name)?;
        let default_quote = self.config.default_quote_style;
        let element = self.element_mut(id)?;
        let attribute = match element.attribute_index(name) {
            Some(index) if element.attributes[index].value() == value => {
                return Ok(element.attributes[index].clone());
            }
            Some(index) => {
                let updated = element.attributes[index].with_value(value);
                element.attributes[index] = updated.clone();
                updated
            }
            None => {
                let created = match element.attributes.last() {
                    Some(last) => Attribute::new(name, value)
                        .with_quote_style(last.quote_style())
                        .with_preceding_whitespace(last.preceding_whitespace()),
                    None => Attribute::new(name, value).with_quote_style(default_quote),
                };
                element.attributes.push(created.clone());
                created
            }
        };
        element.raw_start_tag = None;
        self.node_mut(id).modified = true;
        debug!("set attribute {name} on node {}", id.into_raw());
        Ok(attribute)
    }

    /// Stores `attribute` as given, replacing the one with the same name in
    /// place or appending it. Returns the replaced attribute, if any.
    ///
    /// This is how a formatting-only change such as a quote style switch is
    /// applied:
    ///
    /// ```
    /// use domtrip::{Document, QuoteStyle};
    ///
    /// let mut doc = Document::parse_str("<e a='1'/>").unwrap();
    /// let e = doc.root_element().unwrap();
    /// let double = doc.element(e).unwrap().attribute("a").unwrap()
    ///     .with_quote_style(QuoteStyle::Double);
    /// doc.replace_attribute(e, double).unwrap();
    /// assert_eq!(doc.to_xml(), "<e a=\"1\"/>");
    /// ```
    ///
    /// # Errors
    ///
    /// [`DomTripError::InvalidName`] for an unusable name,
    /// [`DomTripError::InvalidOperation`] if `id` is not an element.
    pub fn replace_attribute(&mut self, id: NodeId, attribute: Attribute) -> Result<Option<Attribute>> {
        self.check_name(attribute.name())?;
        if !is_whitespace(attribute.preceding_whitespace()) || attribute.preceding_whitespace().is_empty() {
            return Err(invalid("attributes must be preceded by whitespace"));
        }
        let element = self.element_mut(id)?;
        let previous = match element.attribute_index(attribute.name()) {
            Some(index) => Some(std::mem::replace(&mut element.attributes[index], attribute)),
            None => {
                element.attributes.push(attribute);
                None
            }
        };
        element.raw_start_tag = None;
        self.node_mut(id).modified = true;
        Ok(previous)
    }

    /// Removes an attribute, returning it.
    ///
    /// # Errors
    ///
    /// [`DomTripError::NotFound`] if the element has no such attribute,
    /// [`DomTripError::InvalidOperation`] if `id` is not an element.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Attribute> {
        let element = self.element_mut(id)?;
        let index = element
            .attribute_index(name)
            .ok_or_else(|| DomTripError::NotFound(format!("attribute '{name}'")))?;
        let removed = element.attributes.remove(index);
        element.raw_start_tag = None;
        self.node_mut(id).modified = true;
        debug!("removed attribute {name} from node {}", id.into_raw());
        Ok(removed)
    }

    /// Declares `prefix` (or the default namespace for `""`) on an element.
    ///
    /// # Errors
    ///
    /// See [`Document::set_attribute`].
    pub fn set_namespace_declaration(&mut self, id: NodeId, prefix: &str, uri: &str) -> Result<Attribute> {
        self.set_attribute(id, &declaration_name(prefix), uri)
    }

    /// Removes the declaration of `prefix` (or of the default namespace for
    /// `""`) from an element.
    ///
    /// # Errors
    ///
    /// [`DomTripError::NotFound`] if the element does not declare it.
    pub fn remove_namespace_declaration(&mut self, id: NodeId, prefix: &str) -> Result<Attribute> {
        self.remove_attribute(id, &declaration_name(prefix))
    }

    // --- Content ---

    /// Replaces the text of a text node, or the text content of an element.
    ///
    /// For an element, the first text child is rewritten and any other text
    /// children are removed; an element without text gets a new text child.
    /// Returns the text node that now holds `text`.
    ///
    /// # Errors
    ///
    /// [`DomTripError::InvalidOperation`] for comments, processing
    /// instructions and the document node.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<NodeId> {
        match &self.node(id).kind {
            NodeKind::Text(_) => {
                self.rewrite_text(id, text);
                Ok(id)
            }
            NodeKind::Element(element) => {
                let text_children: Vec<NodeId> = element
                    .children
                    .iter()
                    .copied()
                    .filter(|&c| self.text(c).is_some())
                    .collect();
                match text_children.split_first() {
                    Some((&first, rest)) => {
                        for &extra in rest {
                            self.unlink(extra);
                            self.node_mut(extra).modified = true;
                        }
                        self.rewrite_text(first, text);
                        Ok(first)
                    }
                    None => {
                        let child = self.create_text(text);
                        if let Some(element) = self.node_mut(id).kind.as_element_mut() {
                            if element.children.is_empty() && is_whitespace(&element.closing_whitespace) {
                                element.closing_whitespace.clear();
                            }
                        }
                        let index = self.children(id).len();
                        self.insert_child(id, index, child)
                    }
                }
            }
            other => Err(invalid(format!(
                "cannot set text on {:?} nodes",
                other.node_type()
            ))),
        }
    }

    /// Like [`Document::set_text`], but keeps the leading and trailing
    /// whitespace of the current text around the new value. For an element,
    /// the current text is its first text child; nested elements are not
    /// consulted.
    ///
    /// # Errors
    ///
    /// See [`Document::set_text`].
    pub fn set_text_preserving_whitespace(&mut self, id: NodeId, text: &str) -> Result<NodeId> {
        let first_text = match self.kind(id) {
            NodeKind::Text(_) => Some(id),
            _ => self.children(id).iter().copied().find(|&c| self.text(c).is_some()),
        };
        let current = first_text
            .and_then(|t| self.text(t))
            .map(|t| t.content().to_string())
            .unwrap_or_default();
        let trimmed = current.trim_matches(|c: char| c.is_ascii_whitespace());
        let value = if trimmed.is_empty() {
            text.to_string()
        } else {
            let start = current.len() - current.trim_start_matches(|c: char| c.is_ascii_whitespace()).len();
            let end = current.trim_end_matches(|c: char| c.is_ascii_whitespace()).len();
            format!("{}{text}{}", &current[..start], &current[end..])
        };
        self.set_text(id, &value)
    }

    fn rewrite_text(&mut self, id: NodeId, content: &str) {
        if let NodeKind::Text(text) = &mut self.node_mut(id).kind {
            text.content = content.to_string();
            text.raw = None;
        }
        self.node_mut(id).modified = true;
        debug!("set text of node {}", id.into_raw());
    }

    /// Replaces the content of a comment.
    ///
    /// # Errors
    ///
    /// [`DomTripError::InvalidOperation`] if `id` is not a comment or the
    /// content contains `--`.
    pub fn set_comment(&mut self, id: NodeId, content: &str) -> Result<NodeId> {
        check_comment(content)?;
        let NodeKind::Comment(comment) = &mut self.node_mut(id).kind else {
            return Err(invalid("node is not a comment"));
        };
        comment.content = content.to_string();
        self.node_mut(id).modified = true;
        Ok(id)
    }

    /// Replaces the data of a processing instruction.
    ///
    /// # Errors
    ///
    /// [`DomTripError::InvalidOperation`] if `id` is not a processing
    /// instruction or `data` contains `?>`.
    pub fn set_processing_instruction_data(&mut self, id: NodeId, data: &str) -> Result<NodeId> {
        if data.contains("?>") {
            return Err(invalid("processing instruction data cannot contain \"?>\""));
        }
        let NodeKind::ProcessingInstruction(pi) = &mut self.node_mut(id).kind else {
            return Err(invalid("node is not a processing instruction"));
        };
        pi.data = data.to_string();
        pi.raw = None;
        self.node_mut(id).modified = true;
        Ok(id)
    }

    /// Renames an element. Attributes and children are kept.
    ///
    /// # Errors
    ///
    /// [`DomTripError::InvalidName`] for an unusable name,
    /// [`DomTripError::InvalidOperation`] if `id` is not an element.
    pub fn rename_element(&mut self, id: NodeId, name: &str) -> Result<NodeId> {
        self.check_name(name)?;
        let element = self.element_mut(id)?;
        element.name = name.to_string();
        element.raw_start_tag = None;
        self.node_mut(id).modified = true;
        Ok(id)
    }

    /// Chooses how a childless element is written: `Some(true)` for `<a/>`,
    /// `Some(false)` for `<a></a>`, `None` to follow the configuration.
    ///
    /// # Errors
    ///
    /// [`DomTripError::InvalidOperation`] if `id` is not an element.
    pub fn set_self_closing(&mut self, id: NodeId, self_closing: Option<bool>) -> Result<NodeId> {
        let element = self.element_mut(id)?;
        element.self_closing = self_closing;
        element.raw_start_tag = None;
        self.node_mut(id).modified = true;
        Ok(id)
    }

    // --- Whitespace ---

    /// Replaces the whitespace written before a node.
    ///
    /// # Errors
    ///
    /// [`DomTripError::InvalidOperation`] if `whitespace` is not whitespace.
    pub fn set_preceding_whitespace(&mut self, id: NodeId, whitespace: &str) -> Result<NodeId> {
        if !is_whitespace(whitespace) {
            return Err(invalid("connective whitespace must be whitespace"));
        }
        let node = self.node_mut(id);
        node.preceding_whitespace = whitespace.to_string();
        node.modified = true;
        Ok(id)
    }

    /// Replaces the whitespace written after a node.
    ///
    /// # Errors
    ///
    /// [`DomTripError::InvalidOperation`] if `whitespace` is not whitespace.
    pub fn set_following_whitespace(&mut self, id: NodeId, whitespace: &str) -> Result<NodeId> {
        if !is_whitespace(whitespace) {
            return Err(invalid("connective whitespace must be whitespace"));
        }
        let node = self.node_mut(id);
        node.following_whitespace = whitespace.to_string();
        node.modified = true;
        Ok(id)
    }

    /// Replaces the whitespace between an element's last child and its end
    /// tag.
    ///
    /// # Errors
    ///
    /// [`DomTripError::InvalidOperation`] if `id` is not an element or
    /// `whitespace` is not whitespace.
    pub fn set_closing_whitespace(&mut self, id: NodeId, whitespace: &str) -> Result<NodeId> {
        if !is_whitespace(whitespace) {
            return Err(invalid("connective whitespace must be whitespace"));
        }
        self.element_mut(id)?.closing_whitespace = whitespace.to_string();
        self.node_mut(id).modified = true;
        Ok(id)
    }
}

fn declaration_name(prefix: &str) -> String {
    if prefix.is_empty() {
        "xmlns".to_string()
    } else {
        format!("xmlns:{prefix}")
    }
}

fn check_comment(content: &str) -> Result<()> {
    if content.contains("--") || content.ends_with('-') {
        return Err(invalid("comment content cannot contain \"--\" or end with '-'"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::tree::QuoteStyle;

    #[test]
    fn test_append_infers_sibling_indentation() {
        let mut doc = Document::parse_str("<items>\n  <item/>\n</items>").unwrap();
        let items = doc.root_element().unwrap();
        let item = doc.create_element("item").unwrap();
        doc.append_child(items, item).unwrap();
        assert_eq!(doc.to_xml(), "<items>\n  <item/>\n  <item/>\n</items>");
        assert!(doc.is_modified(item));
        assert!(!doc.is_modified(items));
    }

    #[test]
    fn test_insert_into_empty_element() {
        let mut doc = Document::parse_str("<a>\n  <b></b>\n</a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.first_child(a).unwrap();
        let c = doc.create_element("c").unwrap();
        doc.append_child(b, c).unwrap();
        assert_eq!(doc.to_xml(), "<a>\n  <b>\n    <c/>\n  </b>\n</a>");
    }

    #[test]
    fn test_insert_into_self_closing_element() {
        let mut doc = Document::parse_str("<a>\n\t<b x='1' />\n</a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.first_child(a).unwrap();
        let c = doc.create_element("c").unwrap();
        doc.append_child(b, c).unwrap();
        assert_eq!(doc.to_xml(), "<a>\n\t<b x='1'>\n\t\t<c/>\n\t</b>\n</a>");
        assert!(doc.is_modified(b));
    }

    #[test]
    fn test_insert_first_uses_following_sibling() {
        let mut doc = Document::parse_str("<a>\n    <b/>\n</a>").unwrap();
        let a = doc.root_element().unwrap();
        let first = doc.create_element("first").unwrap();
        doc.insert_child(a, 0, first).unwrap();
        assert_eq!(doc.to_xml(), "<a>\n    <first/>\n    <b/>\n</a>");
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut doc = Document::parse_str("<a> <b/> </a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.first_child(a).unwrap();
        let x = doc.create_element("x").unwrap();
        let y = doc.create_element("y").unwrap();
        doc.insert_before(b, x).unwrap();
        doc.insert_after(b, y).unwrap();
        assert_eq!(doc.to_xml(), "<a> <x/> <b/> <y/> </a>");
    }

    #[test]
    fn test_insert_attached_node_fails_unchanged() {
        let mut doc = Document::parse_str("<a><b/><c/></a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.first_child(a).unwrap();
        let before = doc.to_xml();
        let err = doc.append_child(a, b).unwrap_err();
        assert!(matches!(err, DomTripError::InvalidOperation(_)));
        assert_eq!(doc.to_xml(), before);
        assert!(!doc.has_modifications());
    }

    #[test]
    fn test_insert_cycle_and_leaf_rejected() {
        let mut doc = Document::parse_str("<a><b>t</b></a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.first_child(a).unwrap();
        let t = doc.first_child(b).unwrap();
        doc.remove_child(a, b).unwrap();
        assert!(matches!(doc.append_child(b, b), Err(DomTripError::InvalidOperation(_))));
        let x = doc.create_element("x").unwrap();
        assert!(matches!(doc.append_child(t, x), Err(DomTripError::InvalidOperation(_))));
        assert!(matches!(doc.insert_child(a, 5, x), Err(DomTripError::InvalidOperation(_))));
        let root = doc.root();
        assert!(matches!(doc.append_child(x, root), Err(DomTripError::InvalidOperation(_))));
    }

    #[test]
    fn test_document_allows_one_root() {
        let mut doc = Document::parse_str("<a/>").unwrap();
        let second = doc.create_element("b").unwrap();
        let root = doc.root();
        assert!(doc.append_child(root, second).is_err());
        let comment = doc.create_comment(" c ").unwrap();
        doc.append_child(root, comment).unwrap();
        assert_eq!(doc.to_xml(), "<a/>\n<!-- c -->");
        let text = doc.create_text("x");
        assert!(doc.append_child(root, text).is_err());
    }

    #[test]
    fn test_remove_child() {
        let mut doc = Document::parse_str("<a>\n  <b/>\n  <c/>\n</a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.first_child(a).unwrap();
        doc.remove_child(a, b).unwrap();
        assert_eq!(doc.to_xml(), "<a>\n  <c/>\n</a>");
        assert_eq!(doc.parent(b), None);
        assert!(doc.is_modified(b));
        assert!(matches!(doc.remove_child(a, b), Err(DomTripError::NotFound(_))));
        assert!(matches!(doc.remove_node(b), Err(DomTripError::NotFound(_))));
    }

    #[test]
    fn test_remove_node_before_doctype_anchor() {
        let mut doc = Document::parse_str("<!--x-->\n<!DOCTYPE r>\n<!--a-->\n<!--b-->\n<r/>").unwrap();
        let a = doc.children(doc.root())[1];
        doc.remove_node(a).unwrap();
        assert_eq!(doc.to_xml(), "<!--x-->\n<!DOCTYPE r>\n<!--b-->\n<r/>");
        assert_eq!(
            doc.to_xml_with(&Config::pretty_print()),
            "<!--x-->\n<!DOCTYPE r>\n<!--b-->\n<r/>"
        );
    }

    #[test]
    fn test_insert_respects_max_depth() {
        let config = Config::default().with_max_depth(2);
        let mut doc = Document::parse_str_with_config("<a><b/></a>", &config).unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.first_child(a).unwrap();

        let c = doc.create_element("c").unwrap();
        assert!(matches!(doc.append_child(b, c), Err(DomTripError::InvalidOperation(_))));
        doc.append_child(a, c).unwrap();

        let d = doc.create_element("d").unwrap();
        let e = doc.create_element("e").unwrap();
        doc.append_child(d, e).unwrap();
        assert!(matches!(doc.append_child(a, d), Err(DomTripError::InvalidOperation(_))));
        assert!(matches!(doc.replace_child(a, c, d), Err(DomTripError::InvalidOperation(_))));
        assert_eq!(doc.to_xml(), "<a><b/><c/></a>");
    }

    #[test]
    fn test_reinsert_at_other_depth_reindents() {
        let mut doc = Document::parse_str("<r>\n  <a/>\n  <b>\n    <c/>\n  </b>\n</r>").unwrap();
        let r = doc.root_element().unwrap();
        let a = doc.child_element(r, "a").unwrap();
        let b = doc.child_element(r, "b").unwrap();
        doc.remove_node(a).unwrap();
        assert_eq!(doc.node(a).preceding_whitespace, "");
        doc.append_child(b, a).unwrap();
        assert_eq!(doc.to_xml(), "<r>\n  <b>\n    <c/>\n    <a/>\n  </b>\n</r>");
    }

    #[test]
    fn test_reinsert_removed_node() {
        let mut doc = Document::parse_str("<a>\n  <b/>\n  <c/>\n</a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.first_child(a).unwrap();
        doc.remove_node(b).unwrap();
        doc.append_child(a, b).unwrap();
        assert_eq!(doc.to_xml(), "<a>\n  <c/>\n  <b/>\n</a>");
    }

    #[test]
    fn test_replace_child() {
        let mut doc = Document::parse_str("<a>\n  <old x='1'/>\n</a>").unwrap();
        let a = doc.root_element().unwrap();
        let old = doc.first_child(a).unwrap();
        let new = doc.create_element("new").unwrap();
        doc.replace_child(a, old, new).unwrap();
        assert_eq!(doc.to_xml(), "<a>\n  <new/>\n</a>");
        assert_eq!(doc.parent(old), None);

        let stray = doc.create_element("s").unwrap();
        assert!(matches!(doc.replace_child(a, old, stray), Err(DomTripError::NotFound(_))));
    }

    #[test]
    fn test_replace_root_element() {
        let mut doc = Document::parse_str("<?xml version=\"1.0\"?>\n<a/>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.create_element("b").unwrap();
        doc.replace_node(a, b).unwrap();
        assert_eq!(doc.to_xml(), "<?xml version=\"1.0\"?>\n<b/>");
    }

    #[test]
    fn test_set_attribute_existing_keeps_format() {
        let mut doc = Document::parse_str("<e  a = 'x'   b=\"y\"/>").unwrap();
        let e = doc.root_element().unwrap();
        doc.set_attribute(e, "a", "z").unwrap();
        assert_eq!(doc.to_xml(), "<e  a = 'z'   b=\"y\"/>");
    }

    #[test]
    fn test_set_attribute_unchanged_value_is_kept() {
        let mut doc = Document::parse_str("<e a='x'/>").unwrap();
        let e = doc.root_element().unwrap();
        let attr = doc.set_attribute(e, "a", "x").unwrap();
        assert_eq!(attr.value(), "x");
        assert!(!doc.is_modified(e));
    }

    #[test]
    fn test_set_attribute_new_imitates_last() {
        let mut doc = Document::parse_str("<e\n    a='1'\n    b='2'/>").unwrap();
        let e = doc.root_element().unwrap();
        let attr = doc.set_attribute(e, "c", "3").unwrap();
        assert_eq!(attr.quote_style(), QuoteStyle::Single);
        assert_eq!(doc.to_xml(), "<e\n    a='1'\n    b='2'\n    c='3'/>");
    }

    #[test]
    fn test_set_attribute_default_quote() {
        let mut doc = Document::parse_str_with_config(
            "<e/>",
            &Config::default().with_default_quote_style(QuoteStyle::Single),
        )
        .unwrap();
        let e = doc.root_element().unwrap();
        doc.set_attribute(e, "id", "it's").unwrap();
        assert_eq!(doc.to_xml(), "<e id='it&apos;s'/>");
    }

    #[test]
    fn test_set_attribute_names() {
        let mut doc = Document::parse_str("<e/>").unwrap();
        let e = doc.root_element().unwrap();
        assert!(matches!(doc.set_attribute(e, "", "v"), Err(DomTripError::InvalidName(_))));
        assert!(matches!(doc.set_attribute(e, "a b", "v"), Err(DomTripError::InvalidName(_))));
        doc.set_attribute(e, "1st", "v").unwrap();

        doc.set_config(Config::strict());
        assert!(matches!(doc.set_attribute(e, "2nd", "v"), Err(DomTripError::InvalidName(_))));
    }

    #[test]
    fn test_set_attribute_on_text_fails() {
        let mut doc = Document::parse_str("<e>t</e>").unwrap();
        let t = doc.first_child(doc.root_element().unwrap()).unwrap();
        assert!(matches!(doc.set_attribute(t, "a", "v"), Err(DomTripError::InvalidOperation(_))));
    }

    #[test]
    fn test_remove_attribute() {
        let mut doc = Document::parse_str("<e a='1' b='2'/>").unwrap();
        let e = doc.root_element().unwrap();
        let removed = doc.remove_attribute(e, "a").unwrap();
        assert_eq!(removed.value(), "1");
        assert_eq!(doc.to_xml(), "<e b='2'/>");
        assert!(matches!(doc.remove_attribute(e, "a"), Err(DomTripError::NotFound(_))));
    }

    #[test]
    fn test_set_text_minimal_diff() {
        let input = "<a>\n  <b>&lt;old&gt;</b>\n  <c>keep &amp; this</c>\n</a>";
        let mut doc = Document::parse_str(input).unwrap();
        let b = doc.descendant_element(doc.root(), "b").unwrap();
        let text = doc.set_text(b, "1 < 2").unwrap();
        assert!(doc.is_modified(text));
        assert!(!doc.is_modified(b));
        assert_eq!(
            doc.to_xml(),
            "<a>\n  <b>1 &lt; 2</b>\n  <c>keep &amp; this</c>\n</a>"
        );
    }

    #[test]
    fn test_set_text_on_empty_element() {
        let mut doc = Document::parse_str("<a><b/><c>  </c></a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.first_child(a).unwrap();
        let c = doc.last_child(a).unwrap();
        doc.set_text(b, "x").unwrap();
        doc.set_text(c, "y").unwrap();
        assert_eq!(doc.to_xml(), "<a><b>x</b><c>y</c></a>");
    }

    #[test]
    fn test_set_text_merges_text_children() {
        let mut doc = Document::parse_str("<p>one<br/>two</p>").unwrap();
        let p = doc.root_element().unwrap();
        doc.set_text(p, "three").unwrap();
        assert_eq!(doc.to_xml(), "<p>three<br/></p>");
    }

    #[test]
    fn test_set_text_on_comment_fails() {
        let mut doc = Document::parse_str("<a><!--c--></a>").unwrap();
        let c = doc.first_child(doc.root_element().unwrap()).unwrap();
        assert!(matches!(doc.set_text(c, "x"), Err(DomTripError::InvalidOperation(_))));
    }

    #[test]
    fn test_set_text_preserving_whitespace() {
        let mut doc = Document::parse_str("<a>\n   old  \n</a>").unwrap();
        let a = doc.root_element().unwrap();
        doc.set_text_preserving_whitespace(a, "new").unwrap();
        assert_eq!(doc.to_xml(), "<a>\n   new  \n</a>");
    }

    #[test]
    fn test_set_text_preserving_whitespace_ignores_nested_text() {
        let mut doc = Document::parse_str("<a>hi<b> x </b></a>").unwrap();
        let a = doc.root_element().unwrap();
        doc.set_text_preserving_whitespace(a, "new").unwrap();
        assert_eq!(doc.to_xml(), "<a>new<b> x </b></a>");
    }

    #[test]
    fn test_rename_element() {
        let mut doc = Document::parse_str("<a x='1'>t</a  >").unwrap();
        let a = doc.root_element().unwrap();
        doc.rename_element(a, "b").unwrap();
        assert_eq!(doc.to_xml(), "<b x='1'>t</b  >");
        assert!(doc.rename_element(a, "").is_err());
    }

    #[test]
    fn test_set_comment() {
        let mut doc = Document::parse_str("<a><!-- old --></a>").unwrap();
        let c = doc.first_child(doc.root_element().unwrap()).unwrap();
        doc.set_comment(c, " new ").unwrap();
        assert_eq!(doc.to_xml(), "<a><!-- new --></a>");
        assert!(doc.set_comment(c, "a--b").is_err());
    }

    #[test]
    fn test_processing_instruction_factory() {
        let mut doc = Document::parse_str("<a/>").unwrap();
        assert!(doc.create_processing_instruction("xml", "").is_err());
        assert!(doc.create_processing_instruction("t", "?>").is_err());
        let pi = doc.create_processing_instruction("target", "data").unwrap();
        let root = doc.root();
        doc.insert_child(root, 0, pi).unwrap();
        assert_eq!(doc.to_xml(), "<?target data?>\n<a/>");
        doc.set_processing_instruction_data(pi, "other").unwrap();
        assert_eq!(doc.to_xml(), "<?target other?>\n<a/>");
    }

    #[test]
    fn test_namespace_declarations() {
        let mut doc = Document::parse_str("<r/>").unwrap();
        let r = doc.root_element().unwrap();
        doc.set_namespace_declaration(r, "a", "urn:a").unwrap();
        doc.set_namespace_declaration(r, "", "urn:d").unwrap();
        assert_eq!(doc.to_xml(), "<r xmlns:a=\"urn:a\" xmlns=\"urn:d\"/>");
        doc.remove_namespace_declaration(r, "a").unwrap();
        assert_eq!(doc.to_xml(), "<r xmlns=\"urn:d\"/>");
    }

    #[test]
    fn test_clone_and_import() {
        let mut doc = Document::parse_str("<a>\n  <b k='v'><c/></b>\n</a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.first_child(a).unwrap();
        let copy = doc.clone_node(b, true).unwrap();
        assert_eq!(doc.parent(copy), None);
        doc.append_child(a, copy).unwrap();
        assert_eq!(doc.to_xml(), "<a>\n  <b k='v'><c/></b>\n  <b k='v'><c/></b>\n</a>");

        let mut other = Document::parse_str("<z/>").unwrap();
        let z = other.root_element().unwrap();
        let imported = other.import_node(&doc, b, false).unwrap();
        other.append_child(z, imported).unwrap();
        assert_eq!(other.to_xml(), "<z>\n    <b k='v'></b>\n</z>");
        let root = doc.root();
        assert!(doc.clone_node(root, true).is_err());
    }

    #[test]
    fn test_whitespace_setters() {
        let mut doc = Document::parse_str("<a><b/></a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.first_child(a).unwrap();
        doc.set_preceding_whitespace(b, "\n  ").unwrap();
        doc.set_closing_whitespace(a, "\n").unwrap();
        doc.set_following_whitespace(b, " ").unwrap();
        assert_eq!(doc.to_xml(), "<a>\n  <b/> \n</a>");
        assert!(doc.set_preceding_whitespace(b, "x").is_err());
    }

    #[test]
    fn test_with_root_element_builder() {
        let mut doc = Document::with_root_element("project").unwrap();
        let project = doc.root_element().unwrap();
        let version = doc.create_element_with_text("version", "1.0").unwrap();
        doc.append_child(project, version).unwrap();
        assert_eq!(
            doc.to_xml(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<project>\n    <version>1.0</version>\n</project>"
        );
    }
}
