//! Lossless XML parser.
//!
//! Parsing runs in two stages. The [`lexer`] turns decoded text into tokens
//! that carry their exact source spans and the whitespace in front of them.
//! The tree builder then links those tokens into a [`Document`], storing the
//! spans on the nodes so the serializer can write unchanged parts back
//! byte for byte.
//!
//! The parser is hand-rolled recursive descent over bytes. It reports the
//! first well-formedness error with its line and column and does not build a
//! partial tree. Lenient mode only relaxes reference handling.
//!
//! DTDs are read as opaque text: the internal subset is not interpreted, so
//! entities it declares stay unexpanded in the tree.

pub(crate) mod input;
pub mod lexer;
mod xml;

use log::debug;

use crate::config::Config;
use crate::error::ParseError;
use crate::tree::Document;

/// Parses an XML string with default configuration.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed XML.
///
/// ```
/// let doc = domtrip::parser::parse_str("<a>\n  <b/>\n</a>").unwrap();
/// assert_eq!(doc.to_xml(), "<a>\n  <b/>\n</a>");
/// ```
pub fn parse_str(input: &str) -> Result<Document, ParseError> {
    parse_str_with_config(input, &Config::default())
}

/// Parses an XML string with the given configuration.
///
/// A leading U+FEFF is taken as a byte order mark: it is not part of the
/// tree, and the document remembers it for output.
///
/// # Errors
///
/// Returns `ParseError` if the input is not well-formed XML.
pub fn parse_str_with_config(input: &str, config: &Config) -> Result<Document, ParseError> {
    let (text, bom) = match input.strip_prefix('\u{FEFF}') {
        Some(rest) => (rest, true),
        None => (input, false),
    };
    debug!(
        "parsing {} bytes (lenient: {}, max depth: {})",
        text.len(),
        config.lenient,
        config.max_depth
    );
    let mut doc = xml::TreeBuilder::new(text, config).build()?;
    doc.bom = bom;
    Ok(doc)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_str_roundtrip() {
        let input = "<?xml version=\"1.0\"?>\n<root a = \"1\">\n\t<x/>\n</root>\n";
        assert_eq!(parse_str(input).unwrap().to_xml(), input);
    }

    #[test]
    fn test_bom_character_is_stripped() {
        let doc = parse_str("\u{FEFF}<a/>").unwrap();
        assert!(doc.has_bom());
        assert_eq!(doc.to_xml(), "\u{FEFF}<a/>");
    }

    #[test]
    fn test_max_depth_from_config() {
        let config = Config::default().with_max_depth(2);
        assert!(parse_str_with_config("<a><b/></a>", &config).is_ok());
        assert!(parse_str_with_config("<a><b><c></c></b></a>", &config).is_err());
    }

    #[test]
    fn test_error_reports_location() {
        let err = parse_str("<a>\n  <b>\n</a>").unwrap_err();
        assert_eq!(err.location.line, 3);
        assert_eq!(err.to_string(), "parse error at 3:1: mismatched end tag: expected </b>, found </a>");
    }
}
