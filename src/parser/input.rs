//! Low-level input handling for the lexer.
//!
//! [`ParserInput`] encapsulates the decoded text, position tracking
//! (line, column, byte offset), and the parsing primitives the lexer builds
//! on: peeking, advancing, name scanning, and reference decoding.
//!
//! Every scanning method hands back slices of the original input, so the
//! lexer can keep the exact source spelling of each construct alongside its
//! decoded value.
//!
//! # Limits
//!
//! - **Depth limit**: bounds element nesting, which keeps the recursive
//!   serializer off the end of the stack.
//! - **Name length limit**: prevents memory exhaustion from huge names.
//!
//! No external entity loading is performed.

use log::warn;

use crate::error::{ErrorSeverity, ParseDiagnostic, ParseError, SourceLocation};

// -------------------------------------------------------------------------
// Limits
// -------------------------------------------------------------------------

/// Default maximum element nesting depth.
pub(crate) const DEFAULT_MAX_DEPTH: u32 = 256;

/// Maximum length (in bytes) of an element or attribute name.
const MAX_NAME_LENGTH: usize = 50_000;

// -------------------------------------------------------------------------
// XML Name character classes (XML 1.0 §2.3)
// -------------------------------------------------------------------------

/// Returns `true` if `c` is a valid `Char` per XML 1.0 §2.2 `[2]`.
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x0001_0000..=0x0010_FFFF
    )
}

/// Returns `true` if `c` is a valid `NameStartChar` per XML 1.0 §2.3 `[4]`.
pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z' |
        '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}' |
        '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' |
        '\u{200C}'..='\u{200D}' | '\u{2070}'..='\u{218F}' |
        '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}' |
        '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' |
        '\u{10000}'..='\u{EFFFF}'
    )
}

/// Returns `true` if `c` is a valid `NameChar` per XML 1.0 §2.3 [4a].
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' |
            '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// Returns `true` if `name` matches the XML `Name` production.
pub(crate) fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

/// Returns `true` for the four XML whitespace bytes.
pub(crate) fn is_xml_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

// -------------------------------------------------------------------------
// ParserInput
// -------------------------------------------------------------------------

/// Cursor over the decoded input text.
pub(crate) struct ParserInput<'a> {
    /// The complete input.
    input: &'a str,

    /// Current byte offset in `input`.
    pos: usize,

    /// Current line number (1-based).
    line: u32,

    /// Current column number (1-based).
    column: u32,

    /// Current element nesting depth.
    depth: u32,

    /// Maximum allowed nesting depth.
    max_depth: u32,

    /// Whether well-known sloppiness is recovered instead of rejected.
    lenient: bool,

    /// Warnings for recovered input.
    pub(crate) diagnostics: Vec<ParseDiagnostic>,
}

impl<'a> ParserInput<'a> {
    /// Creates a new `ParserInput` with default limits.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            lenient: false,
            diagnostics: Vec::new(),
        }
    }

    /// Sets the maximum nesting depth.
    pub fn set_max_depth(&mut self, max: u32) {
        self.max_depth = max;
    }

    /// Enables or disables lenient recovery.
    pub fn set_lenient(&mut self, lenient: bool) {
        self.lenient = lenient;
    }

    // -- Depth tracking --

    /// Increments the nesting depth. Returns an error if the limit is exceeded.
    pub fn increment_depth(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.fatal(format!(
                "maximum nesting depth exceeded ({})",
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Decrements the nesting depth (saturating at 0).
    pub fn decrement_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // -- Position queries --

    /// Returns the current source location.
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    /// Returns `true` if all input has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the input text between two byte offsets.
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    /// Returns the input text from `start` up to the current position.
    pub fn since(&self, start: usize) -> &'a str {
        &self.input[start..self.pos]
    }

    // -- Peek operations --

    /// Returns the byte at the current position without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Returns the byte at `current_position + offset` without consuming.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    /// Returns the character at the current position without consuming it.
    pub fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    // -- Advance operations --

    /// Advances by one character, updating line/column.
    pub fn advance_char(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.pos += ch.len_utf8();
    }

    /// Advances the position over `count` ASCII bytes.
    pub fn advance(&mut self, count: usize) {
        for _ in 0..count {
            match self.peek_char() {
                Some(ch) => self.advance_char(ch),
                None => break,
            }
        }
    }

    /// Consumes and returns the next character, validating it against the
    /// XML `Char` production.
    pub fn next_char(&mut self) -> Result<char, ParseError> {
        let ch = self
            .peek_char()
            .ok_or_else(|| self.fatal("unexpected end of input"))?;
        if !is_xml_char(ch) {
            return Err(self.fatal(format!("invalid XML character: U+{:04X}", ch as u32)));
        }
        self.advance_char(ch);
        Ok(ch)
    }

    // -- Expect operations --

    /// Consumes the next byte and asserts it matches `expected`.
    pub fn expect_byte(&mut self, expected: u8) -> Result<(), ParseError> {
        match self.peek() {
            Some(b) if b == expected => {
                self.advance(1);
                Ok(())
            }
            Some(_) => {
                let found = self.peek_char().unwrap_or('\u{FFFD}');
                Err(self.fatal(format!(
                    "expected '{}', found '{found}'",
                    expected as char
                )))
            }
            None => Err(self.fatal(format!(
                "expected '{}', found end of input",
                expected as char
            ))),
        }
    }

    /// Consumes bytes and asserts they match the `expected` sequence.
    pub fn expect_str(&mut self, expected: &[u8]) -> Result<(), ParseError> {
        for &b in expected {
            self.expect_byte(b)?;
        }
        Ok(())
    }

    // -- Lookahead --

    /// Returns `true` if the remaining input starts with `s`.
    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.input.as_bytes()[self.pos..].starts_with(s)
    }

    /// Consumes input up to and including `terminator`, returning the text
    /// before it. `what` names the construct for the error message.
    pub fn take_until(&mut self, terminator: &[u8], what: &str) -> Result<&'a str, ParseError> {
        let start = self.pos;
        let start_location = self.location();
        loop {
            if self.at_end() {
                return Err(ParseError {
                    message: format!("unterminated {what}"),
                    location: start_location,
                });
            }
            if self.looking_at(terminator) {
                let content = self.since(start);
                self.advance(terminator.len());
                return Ok(content);
            }
            self.next_char()?;
        }
    }

    // -- Whitespace --

    /// Consumes whitespace and returns it.
    pub fn take_whitespace(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_xml_whitespace(b) {
                self.advance(1);
            } else {
                break;
            }
        }
        self.since(start)
    }

    /// Skips whitespace characters. Returns `true` if any were consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        !self.take_whitespace().is_empty()
    }

    // -- Name parsing (XML 1.0 §2.3) --

    /// Parses an XML `Name` per XML 1.0 §2.3 production `[5]`.
    pub fn parse_name(&mut self) -> Result<&'a str, ParseError> {
        let start = self.pos;
        let first = self
            .peek_char()
            .ok_or_else(|| self.fatal("expected name, found end of input"))?;
        if !is_name_start_char(first) {
            return Err(self.fatal(format!("invalid name start character: '{first}'")));
        }
        self.advance_char(first);

        while let Some(ch) = self.peek_char() {
            if is_name_char(ch) {
                self.advance_char(ch);
            } else {
                break;
            }
        }

        let len = self.pos - start;
        if len > MAX_NAME_LENGTH {
            return Err(self.fatal(format!(
                "name length ({len}) exceeds maximum ({MAX_NAME_LENGTH})"
            )));
        }
        Ok(self.since(start))
    }

    // -- Reference decoding (XML 1.0 §4.1) --

    /// Decodes the reference starting at the current `&` and appends its
    /// replacement text to `out`.
    ///
    /// The five built-in entities and numeric character references are
    /// resolved. References to other named entities cannot be resolved
    /// without a DTD, so they are appended verbatim and reported as a
    /// warning. A bare `&` is an error unless lenient recovery is enabled,
    /// in which case it is kept as literal text.
    pub fn decode_reference(&mut self, out: &mut String) -> Result<(), ParseError> {
        let start = self.pos;
        let location = self.location();
        self.expect_byte(b'&')?;

        if self.peek() == Some(b'#') {
            self.advance(1);
            let (digits, radix) = if self.peek() == Some(b'x') {
                self.advance(1);
                (self.take_ascii(|b| b.is_ascii_hexdigit()), 16)
            } else {
                (self.take_ascii(|b| b.is_ascii_digit()), 10)
            };
            if digits.is_empty() {
                return Err(self.fatal("empty character reference"));
            }
            self.expect_byte(b';')?;
            let ch = u32::from_str_radix(digits, radix)
                .ok()
                .and_then(char::from_u32)
                .filter(|&c| is_xml_char(c))
                .ok_or_else(|| ParseError {
                    message: format!(
                        "character reference {} does not refer to a valid XML character",
                        self.since(start)
                    ),
                    location,
                })?;
            out.push(ch);
            return Ok(());
        }

        let named = self.peek_char().is_some_and(is_name_start_char);
        if named {
            let name = self.parse_name()?;
            if self.peek() == Some(b';') {
                self.advance(1);
                match name {
                    "amp" => out.push('&'),
                    "lt" => out.push('<'),
                    "gt" => out.push('>'),
                    "apos" => out.push('\''),
                    "quot" => out.push('"'),
                    _ => {
                        self.warn_at(
                            location,
                            format!("entity reference &{name}; is not resolved and kept verbatim"),
                        );
                        out.push_str(self.since(start));
                    }
                }
                return Ok(());
            }
        }

        if self.lenient {
            self.warn_at(location, "unescaped '&' kept as text".to_string());
            out.push_str(self.since(start));
            Ok(())
        } else {
            Err(ParseError {
                message: "unescaped '&' (expected an entity or character reference)".to_string(),
                location,
            })
        }
    }

    /// Consumes ASCII bytes while `pred` holds.
    fn take_ascii(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if pred(b) {
                self.advance(1);
            } else {
                break;
            }
        }
        self.since(start)
    }

    // -- Diagnostics --

    /// Creates a `ParseError` at the current position.
    pub fn fatal(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.location(),
        }
    }

    /// Records a warning for input that was accepted anyway.
    fn warn_at(&mut self, location: SourceLocation, message: String) {
        warn!("{message} at {location}");
        self.diagnostics.push(ParseDiagnostic {
            severity: ErrorSeverity::Warning,
            message,
            location,
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn decode(s: &str) -> Result<String, ParseError> {
        let mut input = ParserInput::new(s);
        let mut out = String::new();
        input.decode_reference(&mut out)?;
        Ok(out)
    }

    #[test]
    fn test_peek_and_advance() {
        let mut input = ParserInput::new("abc");
        assert_eq!(input.peek(), Some(b'a'));
        assert_eq!(input.peek_at(1), Some(b'b'));
        input.advance(1);
        assert_eq!(input.peek(), Some(b'b'));
        input.advance(2);
        assert!(input.at_end());
    }

    #[test]
    fn test_line_column_tracking() {
        let mut input = ParserInput::new("ab\ncd");
        input.advance(2);
        assert_eq!(input.location().column, 3);
        input.advance(1);
        assert_eq!(input.location().line, 2);
        assert_eq!(input.location().column, 1);
    }

    #[test]
    fn test_column_counts_characters() {
        let mut input = ParserInput::new("\u{e9}\u{e9}x");
        input.advance(2);
        assert_eq!(input.location().column, 3);
        assert_eq!(input.location().byte_offset, 4);
        assert_eq!(input.peek(), Some(b'x'));
    }

    #[test]
    fn test_parse_name() {
        let mut input = ParserInput::new("foo:bar ");
        assert_eq!(input.parse_name().unwrap(), "foo:bar");
        assert_eq!(input.peek(), Some(b' '));
    }

    #[test]
    fn test_parse_name_invalid_start() {
        let mut input = ParserInput::new("1abc");
        assert!(input.parse_name().is_err());
    }

    #[test]
    fn test_decode_reference_builtin() {
        assert_eq!(decode("&amp;").unwrap(), "&");
        assert_eq!(decode("&lt;").unwrap(), "<");
        assert_eq!(decode("&gt;").unwrap(), ">");
        assert_eq!(decode("&apos;").unwrap(), "'");
        assert_eq!(decode("&quot;").unwrap(), "\"");
    }

    #[test]
    fn test_decode_reference_char() {
        assert_eq!(decode("&#65;").unwrap(), "A");
        assert_eq!(decode("&#x41;").unwrap(), "A");
    }

    #[test]
    fn test_decode_reference_invalid_char() {
        assert!(decode("&#0;").is_err());
        assert!(decode("&#x;").is_err());
        assert!(decode("&#xD800;").is_err());
    }

    #[test]
    fn test_decode_reference_unknown_entity_kept() {
        let mut input = ParserInput::new("&nbsp;");
        let mut out = String::new();
        input.decode_reference(&mut out).unwrap();
        assert_eq!(out, "&nbsp;");
        assert_eq!(input.diagnostics.len(), 1);
    }

    #[test]
    fn test_decode_bare_ampersand() {
        assert!(decode("& b").is_err());

        let mut input = ParserInput::new("& b");
        input.set_lenient(true);
        let mut out = String::new();
        input.decode_reference(&mut out).unwrap();
        assert_eq!(out, "&");
        assert_eq!(input.diagnostics[0].severity, ErrorSeverity::Warning);
    }

    #[test]
    fn test_depth_limit() {
        let mut input = ParserInput::new("");
        input.set_max_depth(2);
        assert!(input.increment_depth().is_ok());
        assert!(input.increment_depth().is_ok());
        assert!(input.increment_depth().is_err());
    }

    #[test]
    fn test_take_until() {
        let mut input = ParserInput::new(" hello -->rest");
        assert_eq!(input.take_until(b"-->", "comment").unwrap(), " hello ");
        assert!(input.looking_at(b"rest"));

        let mut input = ParserInput::new("never closed");
        let err = input.take_until(b"-->", "comment").unwrap_err();
        assert_eq!(err.message, "unterminated comment");
        assert_eq!(err.location.column, 1);
    }

    #[test]
    fn test_take_whitespace() {
        let mut input = ParserInput::new(" \r\n\tx");
        assert_eq!(input.take_whitespace(), " \r\n\t");
        assert!(!input.skip_whitespace());
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("a"));
        assert!(is_valid_name("ns:item-1"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("1a"));
        assert!(!is_valid_name("a b"));
    }
}
