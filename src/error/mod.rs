//! Error types and diagnostics.
//!
//! Parsing is all-or-nothing: a [`ParseError`] aborts tree construction and no
//! partial document is returned. Recoveries performed by a lenient
//! configuration are not errors; they are recorded as [`ParseDiagnostic`]
//! warnings on the resulting document.
//!
//! Mutation failures are reported through [`DomTripError`], whose variants form
//! the taxonomy callers branch on. A failed mutation leaves the tree unchanged.

use std::fmt;

use crate::encoding::EncodingError;

/// Severity level for a parse diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// Input was accepted after a best-effort recovery.
    Warning,
    /// Input is malformed.
    Error,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the decoded input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A non-fatal diagnostic emitted during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// The severity of this diagnostic.
    pub severity: ErrorSeverity,
    /// Human-readable message.
    pub message: String,
    /// Where in the source the issue was found.
    pub location: SourceLocation,
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.severity, self.message, self.location)
    }
}

/// The error type returned when XML parsing fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parse error at {location}: {message}")]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the error occurred.
    pub location: SourceLocation,
}

/// Every error the engine can report.
#[derive(Debug, thiserror::Error)]
pub enum DomTripError {
    /// Undecodable bytes, or an unsupported declared encoding.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    /// Malformed markup.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A mutation would violate tree ownership invariants.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    /// A referenced node, attribute or namespace binding is absent.
    #[error("not found: {0}")]
    NotFound(String),
    /// A name failed XML name validation.
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T, E = DomTripError> = std::result::Result<T, E>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation {
            line: 10,
            column: 5,
            byte_offset: 42,
        };
        assert_eq!(loc.to_string(), "10:5");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError {
            message: "unexpected end of input".to_string(),
            location: SourceLocation {
                line: 1,
                column: 15,
                byte_offset: 14,
            },
        };
        assert_eq!(
            err.to_string(),
            "parse error at 1:15: unexpected end of input"
        );
    }

    #[test]
    fn test_parse_diagnostic_display() {
        let diag = ParseDiagnostic {
            severity: ErrorSeverity::Warning,
            message: "bare '&' treated as text".to_string(),
            location: SourceLocation {
                line: 3,
                column: 10,
                byte_offset: 50,
            },
        };
        assert_eq!(diag.to_string(), "warning: bare '&' treated as text at 3:10");
    }

    #[test]
    fn test_domtrip_error_from_parse_error() {
        let err: DomTripError = ParseError {
            message: "mismatched end tag".to_string(),
            location: SourceLocation::default(),
        }
        .into();
        assert!(matches!(err, DomTripError::Parse(_)));
        assert_eq!(err.to_string(), "parse error at 0:0: mismatched end tag");
    }

    #[test]
    fn test_domtrip_error_messages() {
        assert_eq!(
            DomTripError::InvalidName(String::new()).to_string(),
            "invalid name: \"\""
        );
        assert_eq!(
            DomTripError::NotFound("child".to_string()).to_string(),
            "not found: child"
        );
    }
}
