//! Serialization.
//!
//! This module writes a `Document` tree back to XML text. The default
//! configuration reproduces unchanged input byte for byte; other
//! configurations drop comments, re-indent, or strip formatting.

pub mod xml;

pub use xml::{escape_text, serialize, serialize_node, to_bytes, write_document};
