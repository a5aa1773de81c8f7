//! Tree construction.
//!
//! [`TreeBuilder`] drains the [`Lexer`] and assembles the arena tree. It
//! owns the stack of open elements and decides where each token's leading
//! whitespace lands: on the next node, on the enclosing element before its
//! end tag, or on the document after the last top-level node.

use log::debug;

use crate::config::Config;
use crate::error::{ParseError, SourceLocation};
use crate::tree::{
    Comment, Doctype, Document, Element, NodeId, NodeKind, ProcessingInstruction, Text,
};

use super::lexer::{Lexer, Token, TokenKind};

pub(crate) struct TreeBuilder<'a> {
    lexer: Lexer<'a>,
    doc: Document,
    /// Open elements, innermost last.
    open: Vec<NodeId>,
    /// Set once the root element has been started.
    seen_root: bool,
    /// A DOCTYPE was read and still needs the node it precedes.
    doctype_pending: bool,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(input: &'a str, config: &Config) -> Self {
        let lexer = Lexer::new(input)
            .lenient(config.lenient)
            .max_depth(config.max_depth);
        Self {
            lexer,
            doc: Document::with_config(config.clone()),
            open: Vec::new(),
            seen_root: false,
            doctype_pending: false,
        }
    }

    pub fn build(mut self) -> Result<Document, ParseError> {
        loop {
            let token = self.lexer.next_token()?;
            if token.kind == TokenKind::Eof {
                self.finish(&token)?;
                break;
            }
            self.token(token)?;
        }
        self.doc.diagnostics = self.lexer.into_diagnostics();
        debug!(
            "built tree with {} nodes, {} warnings",
            self.doc.node_count(),
            self.doc.diagnostics.len()
        );
        Ok(self.doc)
    }

    fn token(&mut self, token: Token<'a>) -> Result<(), ParseError> {
        let Token {
            leading,
            raw,
            location,
            kind,
        } = token;
        match kind {
            TokenKind::XmlDeclaration(declaration) => {
                self.doc.xml_declaration = Some(declaration);
            }
            TokenKind::Doctype => {
                if self.seen_root || self.doc.doctype.is_some() {
                    return Err(error("DOCTYPE declaration not allowed here", location));
                }
                self.doc.doctype = Some(Doctype {
                    raw: raw.to_string(),
                    preceding_whitespace: leading.to_string(),
                    before: None,
                });
                self.doctype_pending = true;
            }
            TokenKind::StartTag {
                name,
                attributes,
                trailing_whitespace,
                self_closing,
            } => {
                if self.open.is_empty() {
                    if self.seen_root {
                        return Err(error(
                            format!("multiple root elements: <{name}> after the root element"),
                            location,
                        ));
                    }
                    self.seen_root = true;
                }
                let mut element = Element::new(name);
                element.attributes = attributes;
                element.open_tag_whitespace = trailing_whitespace.to_string();
                element.self_closing = Some(self_closing);
                element.raw_start_tag = Some(raw.to_string());
                let id = self.attach(NodeKind::Element(element), leading);
                if !self_closing {
                    self.open.push(id);
                }
            }
            TokenKind::EndTag {
                name,
                trailing_whitespace,
            } => {
                let Some(id) = self.open.pop() else {
                    return Err(error(format!("unexpected end tag </{name}>"), location));
                };
                let Some(element) = self.doc.node_mut(id).kind.as_element_mut() else {
                    return Err(error("open node is not an element", location));
                };
                if element.name != name {
                    return Err(error(
                        format!(
                            "mismatched end tag: expected </{}>, found </{name}>",
                            element.name
                        ),
                        location,
                    ));
                }
                element.closing_whitespace = leading.to_string();
                element.close_tag_whitespace = trailing_whitespace.to_string();
            }
            TokenKind::Text(content) => {
                if self.open.is_empty() {
                    return Err(error("text content outside the root element", location));
                }
                let mut text = Text::new(content, false);
                text.raw = Some(raw.to_string());
                self.attach(NodeKind::Text(text), leading);
            }
            TokenKind::CData(content) => {
                if self.open.is_empty() {
                    return Err(error("CDATA section outside the root element", location));
                }
                let mut text = Text::new(content, true);
                text.raw = Some(content.to_string());
                self.attach(NodeKind::Text(text), leading);
            }
            TokenKind::Comment(content) => {
                let comment = Comment {
                    content: content.to_string(),
                };
                self.attach(NodeKind::Comment(comment), leading);
            }
            TokenKind::ProcessingInstruction { target, data } => {
                let pi = ProcessingInstruction {
                    target: target.to_string(),
                    data: data.to_string(),
                    raw: Some(raw.to_string()),
                };
                self.attach(NodeKind::ProcessingInstruction(pi), leading);
            }
            TokenKind::Eof => {}
        }
        Ok(())
    }

    /// Allocates a node, links it under the innermost open element (or the
    /// document node) and gives it `leading` as its preceding whitespace.
    fn attach(&mut self, kind: NodeKind, leading: &str) -> NodeId {
        let parent = self.open.last().copied().unwrap_or(self.doc.root());
        let id = self.doc.alloc(kind);
        self.doc.node_mut(id).preceding_whitespace = leading.to_string();
        if parent == self.doc.root() && self.doctype_pending {
            if let Some(doctype) = &mut self.doc.doctype {
                doctype.before = Some(id);
            }
            self.doctype_pending = false;
        }
        self.doc.link_last(parent, id);
        id
    }

    fn finish(&mut self, eof: &Token<'a>) -> Result<(), ParseError> {
        if let Some(&id) = self.open.last() {
            let name = self.doc.node_name(id).unwrap_or_default();
            return Err(error(format!("unclosed element <{name}>"), eof.location));
        }
        if !self.seen_root {
            return Err(error("no root element", eof.location));
        }
        self.doc.trailing_whitespace = eof.leading.to_string();
        Ok(())
    }
}

fn error(message: impl Into<String>, location: SourceLocation) -> ParseError {
    ParseError {
        message: message.into(),
        location,
    }
}
