//! Qualified name handling.
//!
//! A name of the form `prefix:localname` or just `localname` is split by
//! [`split_qname`]. A [`QName`] is the resolved form: a namespace URI plus a
//! local name, with the prefix kept only for display.
//!
//! See <https://www.w3.org/TR/xml-names/#NT-QName>

use std::fmt;

use crate::error::{DomTripError, Result};

/// Splits a qualified name into its prefix and local name parts.
///
/// Returns `(Some(prefix), localname)` if the name contains a colon,
/// or `(None, localname)` if it does not.
///
/// # Examples
///
/// ```
/// use domtrip::util::qname::split_qname;
///
/// assert_eq!(split_qname("svg:rect"), (Some("svg"), "rect"));
/// assert_eq!(split_qname("div"), (None, "div"));
/// ```
#[must_use]
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.find(':') {
        Some(pos) => (Some(&qname[..pos]), &qname[pos + 1..]),
        None => (None, qname),
    }
}

/// A namespace-qualified name.
///
/// Two names match when their namespace URI and local name are equal; the
/// prefix is presentation only. A `QName` is a plain value: it does not track
/// the declarations it was resolved from, so a later edit to the tree does
/// not change it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    namespace_uri: Option<String>,
    local_name: String,
    prefix: Option<String>,
}

impl QName {
    /// A name in no namespace.
    #[must_use]
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace_uri: None,
            local_name: local_name.into(),
            prefix: None,
        }
    }

    /// A name in the given namespace, without a preferred prefix.
    #[must_use]
    pub fn new(namespace_uri: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace_uri: Some(namespace_uri.into()).filter(|uri| !uri.is_empty()),
            local_name: local_name.into(),
            prefix: None,
        }
    }

    /// A name in the given namespace with a preferred prefix.
    #[must_use]
    pub fn with_prefix(
        namespace_uri: impl Into<String>,
        local_name: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            prefix: Some(prefix.into()).filter(|p| !p.is_empty()),
            ..Self::new(namespace_uri, local_name)
        }
    }

    pub(crate) fn from_parts(
        namespace_uri: Option<&str>,
        local_name: &str,
        prefix: Option<&str>,
    ) -> Self {
        Self {
            namespace_uri: namespace_uri.map(str::to_string),
            local_name: local_name.to_string(),
            prefix: prefix.map(str::to_string),
        }
    }

    /// Parses `prefix:local` or `local` into a name without a namespace URI.
    ///
    /// # Errors
    ///
    /// Returns [`DomTripError::InvalidName`] for an empty name or an empty
    /// prefix or local part.
    pub fn parse(qualified_name: &str) -> Result<Self> {
        match split_qname(qualified_name) {
            (_, "") => Err(DomTripError::InvalidName(qualified_name.to_string())),
            (Some(""), _) => Err(DomTripError::InvalidName(qualified_name.to_string())),
            (prefix, local) => Ok(Self::from_parts(None, local, prefix)),
        }
    }

    #[must_use]
    pub fn namespace_uri(&self) -> Option<&str> {
        self.namespace_uri.as_deref()
    }

    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// `prefix:local`, or just `local` without a prefix.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// Returns `true` if the namespace URI and local name are equal.
    #[must_use]
    pub fn matches(&self, namespace_uri: Option<&str>, local_name: &str) -> bool {
        self.namespace_uri.as_deref() == namespace_uri && self.local_name == local_name
    }

    /// Compares two names ignoring their prefixes.
    #[must_use]
    pub fn same_name(&self, other: &QName) -> bool {
        self.matches(other.namespace_uri(), other.local_name())
    }
}

impl fmt::Display for QName {
    /// Formats as `{uri}local`, the Clark notation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace_uri {
            Some(uri) => write!(f, "{{{uri}}}{}", self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_qname_with_prefix() {
        assert_eq!(split_qname("xml:lang"), (Some("xml"), "lang"));
    }

    #[test]
    fn test_split_qname_without_prefix() {
        assert_eq!(split_qname("div"), (None, "div"));
    }

    #[test]
    fn test_split_qname_multiple_colons() {
        assert_eq!(split_qname("a:b:c"), (Some("a"), "b:c"));
    }

    #[test]
    fn test_qname_parse() {
        let name = QName::parse("soap:Envelope").unwrap();
        assert_eq!(name.prefix(), Some("soap"));
        assert_eq!(name.local_name(), "Envelope");
        assert_eq!(name.namespace_uri(), None);
        assert!(QName::parse(":x").is_err());
        assert!(QName::parse("x:").is_err());
        assert!(QName::parse("").is_err());
    }

    #[test]
    fn test_qname_matches_ignores_prefix() {
        let a = QName::with_prefix("urn:a", "item", "a");
        let b = QName::with_prefix("urn:a", "item", "other");
        assert!(a.same_name(&b));
        assert_ne!(a, b);
        assert!(a.matches(Some("urn:a"), "item"));
        assert!(!a.matches(None, "item"));
    }

    #[test]
    fn test_qname_empty_uri_is_no_namespace() {
        assert_eq!(QName::new("", "x"), QName::local("x"));
    }

    #[test]
    fn test_qname_display() {
        assert_eq!(QName::new("urn:a", "item").to_string(), "{urn:a}item");
        assert_eq!(QName::local("item").to_string(), "item");
        assert_eq!(
            QName::with_prefix("urn:a", "item", "a").qualified_name(),
            "a:item"
        );
    }
}
