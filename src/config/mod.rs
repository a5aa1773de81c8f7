//! Serialization and editing configuration.
//!
//! A [`Config`] is a plain value. Presets are constructors, and every
//! `with_*` method consumes the value and returns the changed copy, so a
//! configuration can be shared freely between documents and threads.
//!
//! ```
//! use domtrip::{Config, QuoteStyle};
//!
//! let config = Config::pretty_print()
//!     .with_indent_string("\t")
//!     .with_default_quote_style(QuoteStyle::Single);
//! assert!(config.pretty_print);
//! ```

use crate::parser::input::DEFAULT_MAX_DEPTH;
use crate::tree::{Document, NodeKind, QuoteStyle};

/// How an element without children is written when the tree does not
/// record a form for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmptyElementStyle {
    /// `<a></a>`
    Expanded,
    /// `<a/>`
    #[default]
    SelfClosing,
    /// `<a />`
    SelfClosingSpaced,
}

impl EmptyElementStyle {
    /// Detects the style most used by the empty elements of a document.
    ///
    /// Returns the default style when the document has no empty elements.
    #[must_use]
    pub fn detect(doc: &Document) -> Self {
        let mut counts = [0usize; 3];
        for id in doc.descendants(doc.root()) {
            let NodeKind::Element(element) = &doc.node(id).kind else {
                continue;
            };
            if !element.children.is_empty() {
                continue;
            }
            let style = match element.self_closing {
                Some(true) if element.open_tag_whitespace.is_empty() => Self::SelfClosing,
                Some(true) => Self::SelfClosingSpaced,
                Some(false) => Self::Expanded,
                None => continue,
            };
            counts[style as usize] += 1;
        }
        if counts.iter().all(|&c| c == 0) {
            return Self::default();
        }
        // Ties prefer the self-closing form.
        [Self::Expanded, Self::SelfClosing, Self::SelfClosingSpaced]
            .into_iter()
            .max_by_key(|&style| (counts[style as usize], style == Self::SelfClosing))
            .unwrap_or_default()
    }
}

/// Configuration for parsing, editing, and serializing documents.
///
/// The defaults preserve formatting exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Write comments (otherwise they are dropped on output).
    pub preserve_comments: bool,
    /// Write processing instructions (otherwise they are dropped on output).
    pub preserve_processing_instructions: bool,
    /// Quote style for attributes with no existing attribute to imitate.
    pub default_quote_style: QuoteStyle,
    /// Form of new empty elements.
    pub empty_element_style: EmptyElementStyle,
    /// Re-indent the whole document instead of preserving its whitespace.
    pub pretty_print: bool,
    /// One level of indentation.
    pub indent_string: String,
    /// Line ending for generated whitespace.
    pub line_ending: String,
    /// Leave out the XML declaration.
    pub omit_xml_declaration: bool,
    /// Reject names that do not match the XML `Name` production.
    pub strict_names: bool,
    /// Accept well-known sloppiness such as a bare `&` in text.
    pub lenient: bool,
    /// Maximum element nesting depth accepted by the parser (default: 256).
    pub max_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preserve_comments: true,
            preserve_processing_instructions: true,
            default_quote_style: QuoteStyle::Double,
            empty_element_style: EmptyElementStyle::SelfClosing,
            pretty_print: false,
            indent_string: "    ".to_string(),
            line_ending: "\n".to_string(),
            omit_xml_declaration: false,
            strict_names: false,
            lenient: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Config {
    /// Preserve everything; the same as [`Config::default`].
    #[must_use]
    pub fn defaults() -> Self {
        Self::default()
    }

    /// Defaults plus XML name validation on every mutation.
    #[must_use]
    pub fn strict() -> Self {
        Self::default().with_strict_names(true)
    }

    /// Defaults plus recovery from a bare `&` in text and attribute values.
    #[must_use]
    pub fn lenient() -> Self {
        Self::default().with_lenient(true)
    }

    /// Re-indent with two spaces per level.
    #[must_use]
    pub fn pretty_print() -> Self {
        Self::default()
            .with_pretty_print(true)
            .with_indent_string("  ")
    }

    /// No declaration, comments or processing instructions.
    #[must_use]
    pub fn minimal() -> Self {
        Self::default()
            .with_omit_xml_declaration(true)
            .with_preserve_comments(false)
            .with_preserve_processing_instructions(false)
    }

    /// Everything on a single line.
    #[must_use]
    pub fn raw() -> Self {
        Self::default()
            .with_pretty_print(true)
            .with_indent_string("")
            .with_line_ending("")
    }

    #[must_use]
    pub fn with_preserve_comments(mut self, yes: bool) -> Self {
        self.preserve_comments = yes;
        self
    }

    #[must_use]
    pub fn with_preserve_processing_instructions(mut self, yes: bool) -> Self {
        self.preserve_processing_instructions = yes;
        self
    }

    #[must_use]
    pub fn with_default_quote_style(mut self, style: QuoteStyle) -> Self {
        self.default_quote_style = style;
        self
    }

    #[must_use]
    pub fn with_empty_element_style(mut self, style: EmptyElementStyle) -> Self {
        self.empty_element_style = style;
        self
    }

    /// Uses the empty element style that `doc` already uses most.
    #[must_use]
    pub fn with_detected_empty_element_style(self, doc: &Document) -> Self {
        self.with_empty_element_style(EmptyElementStyle::detect(doc))
    }

    #[must_use]
    pub fn with_pretty_print(mut self, yes: bool) -> Self {
        self.pretty_print = yes;
        self
    }

    #[must_use]
    pub fn with_indent_string(mut self, indent: impl Into<String>) -> Self {
        self.indent_string = indent.into();
        self
    }

    #[must_use]
    pub fn with_line_ending(mut self, line_ending: impl Into<String>) -> Self {
        self.line_ending = line_ending.into();
        self
    }

    #[must_use]
    pub fn with_omit_xml_declaration(mut self, yes: bool) -> Self {
        self.omit_xml_declaration = yes;
        self
    }

    #[must_use]
    pub fn with_strict_names(mut self, yes: bool) -> Self {
        self.strict_names = yes;
        self
    }

    #[must_use]
    pub fn with_lenient(mut self, yes: bool) -> Self {
        self.lenient = yes;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }
}
