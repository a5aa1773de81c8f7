//! # domtrip
//!
//! A lossless XML editing engine. Documents are parsed into an arena tree
//! that remembers every byte of formatting: attribute quotes and spacing,
//! whitespace between nodes, entity spellings, CDATA sections, the XML
//! declaration and the DOCTYPE. Serializing an unchanged document returns
//! the input exactly; after edits, only the edited nodes are re-rendered and
//! new nodes copy the indentation of their neighbours.
//!
//! ## Quick Start
//!
//! ```
//! use domtrip::Document;
//!
//! let input = "<project>\n  <version>1.0</version>\n</project>\n";
//! let mut doc = Document::parse_str(input).unwrap();
//! let root = doc.root_element().unwrap();
//! assert_eq!(doc.to_xml(), input);
//!
//! let version = doc.child_element(root, "version").unwrap();
//! doc.set_text(version, "1.1").unwrap();
//! let name = doc.create_element_with_text("name", "demo").unwrap();
//! doc.append_child(root, name).unwrap();
//! assert_eq!(
//!     doc.to_xml(),
//!     "<project>\n  <version>1.1</version>\n  <name>demo</name>\n</project>\n"
//! );
//! ```

pub mod config;
pub mod encoding;
pub mod error;
pub mod namespace;
pub mod parser;
pub mod serial;
pub mod tree;
pub mod util;

// Re-export primary types at the crate root for convenience.
pub use config::{Config, EmptyElementStyle};
pub use encoding::EncodingError;
pub use error::{DomTripError, ParseDiagnostic, ParseError, Result};
pub use namespace::NamespaceContext;
pub use tree::{
    Attribute, Comment, Doctype, Document, ElementQuery, Element, NodeData, NodeId, NodeKind,
    NodeType, ProcessingInstruction, QuoteStyle, Text, XmlDeclaration,
};
pub use util::qname::QName;
