//! Immutable attribute records.
//!
//! An [`Attribute`] keeps everything needed to write it back exactly as it
//! was read: the whitespace before it, the spelling of the `=` separator, the
//! quote character, and the raw value with its original entity references.
//! Attributes are never edited in place. The `with_*` methods build a new
//! record that the owning element substitutes for the old one.

use std::borrow::Cow;

use crate::util::qname::split_qname;

/// The quote character delimiting an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuoteStyle {
    /// `name="value"`
    #[default]
    Double,
    /// `name='value'`
    Single,
}

impl QuoteStyle {
    /// Returns the quote character.
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::Double => '"',
            Self::Single => '\'',
        }
    }

    /// Returns the style for a quote character, if it is one.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '"' => Some(Self::Double),
            '\'' => Some(Self::Single),
            _ => None,
        }
    }
}

/// An attribute of an element.
///
/// # Examples
///
/// ```
/// use domtrip::{Attribute, QuoteStyle};
///
/// let attr = Attribute::new("id", "a&b").with_quote_style(QuoteStyle::Single);
/// assert_eq!(attr.to_xml(), " id='a&amp;b'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    value: String,
    raw_value: Option<String>,
    quote_style: QuoteStyle,
    preceding_whitespace: String,
    separator: String,
}

impl Attribute {
    /// Creates an attribute with a single preceding space and double quotes.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            raw_value: None,
            quote_style: QuoteStyle::Double,
            preceding_whitespace: " ".to_string(),
            separator: "=".to_string(),
        }
    }

    /// Creates an attribute read from source text.
    pub(crate) fn parsed(
        name: &str,
        value: String,
        raw_value: &str,
        quote_style: QuoteStyle,
        preceding_whitespace: &str,
        separator: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            value,
            raw_value: Some(raw_value.to_string()),
            quote_style,
            preceding_whitespace: preceding_whitespace.to_string(),
            separator: separator.to_string(),
        }
    }

    /// The qualified name as written, e.g. `xml:lang`.
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

    /// The decoded value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The value as it appeared between the quotes, or `None` for an
    /// attribute that was created or changed after parsing.
    #[must_use]
    pub fn raw_value(&self) -> Option<&str> {
        self.raw_value.as_deref()
    }

    /// The quote character used around the value.
    #[must_use]
    pub fn quote_style(&self) -> QuoteStyle {
        self.quote_style
    }

    /// Whitespace between the previous token of the tag and this attribute.
    #[must_use]
    pub fn preceding_whitespace(&self) -> &str {
        &self.preceding_whitespace
    }

    /// The `=` separator including any whitespace around it.
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Returns the prefix this attribute declares if it is a namespace
    /// declaration: `Some("")` for `xmlns`, `Some("p")` for `xmlns:p`.
    #[must_use]
    pub fn declared_prefix(&self) -> Option<&str> {
        if self.name == "xmlns" {
            Some("")
        } else {
            self.name.strip_prefix("xmlns:")
        }
    }

    /// Returns a copy with a new decoded value. Quote style and whitespace
    /// are kept; the value will be escaped when written.
    #[must_use]
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            raw_value: None,
            ..self.clone()
        }
    }

    /// Returns a copy using a different quote character.
    ///
    /// The raw value is kept unless it contains the new quote character.
    #[must_use]
    pub fn with_quote_style(&self, quote_style: QuoteStyle) -> Self {
        let raw_value = self
            .raw_value
            .clone()
            .filter(|raw| !raw.contains(quote_style.as_char()));
        Self {
            quote_style,
            raw_value,
            ..self.clone()
        }
    }

    /// Returns a copy with different preceding whitespace.
    #[must_use]
    pub fn with_preceding_whitespace(&self, whitespace: impl Into<String>) -> Self {
        Self {
            preceding_whitespace: whitespace.into(),
            ..self.clone()
        }
    }

    /// Returns the value as it will be written between the quotes.
    #[must_use]
    pub fn serialized_value(&self) -> Cow<'_, str> {
        match &self.raw_value {
            Some(raw) => Cow::Borrowed(raw),
            None => escape_attribute_value(&self.value, self.quote_style),
        }
    }

    /// Writes ` name="value"` with the stored whitespace and quoting.
    pub(crate) fn write_to(&self, out: &mut String) {
        out.push_str(&self.preceding_whitespace);
        out.push_str(&self.name);
        out.push_str(&self.separator);
        self.write_quoted_value(out);
    }

    /// Writes `name="value"` without the stored whitespace.
    pub(crate) fn write_normalized(&self, out: &mut String) {
        out.push_str(&self.name);
        out.push('=');
        self.write_quoted_value(out);
    }

    fn write_quoted_value(&self, out: &mut String) {
        let quote = self.quote_style.as_char();
        out.push(quote);
        out.push_str(&self.serialized_value());
        out.push(quote);
    }

    /// Returns the attribute as it will appear inside a start tag.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }
}

/// Escapes an attribute value for the given quote style.
///
/// `&`, `<` and `>` are always escaped; of the two quote characters only the
/// one delimiting the value is. Tabs and line breaks are written as character
/// references, since a parser normalizes literal ones to spaces.
#[must_use]
pub fn escape_attribute_value(value: &str, quote_style: QuoteStyle) -> Cow<'_, str> {
    let quote = quote_style.as_char();
    if !value.contains(['&', '<', '>', '\t', '\n', '\r', quote]) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '"' if quote == '"' => out.push_str("&quot;"),
            '\'' if quote == '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}
