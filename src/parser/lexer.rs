//! The tokenizer.
//!
//! [`Lexer`] scans decoded text into a flat stream of [`Token`]s. Every token
//! carries the whitespace collected since the previous token and the exact
//! source text it consumed, so nothing about the input's formatting is lost
//! before the tree builder sees it.
//!
//! Whitespace-only runs between markup never become tokens of their own;
//! they are handed out as the `leading` whitespace of the next token. A run
//! of character data that contains anything besides whitespace becomes a
//! single [`TokenKind::Text`] token that includes its surrounding whitespace.
//!
//! The lexer does not recover from malformed markup. The only recoveries are
//! those enabled by lenient mode for references (see
//! [`ParserInput::decode_reference`]).

use log::trace;

use super::input::{is_xml_whitespace, ParserInput};
use crate::error::{ParseDiagnostic, ParseError, SourceLocation};
use crate::tree::{Attribute, QuoteStyle, XmlDeclaration};

/// A markup event with its source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// Whitespace between the previous token and this one.
    pub leading: &'a str,
    /// The exact source text of this token, without `leading`.
    pub raw: &'a str,
    /// Where `raw` starts.
    pub location: SourceLocation,
    /// What the token is.
    pub kind: TokenKind<'a>,
}

/// The payload of a [`Token`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind<'a> {
    /// `<?xml version="1.0"?>`, only as the very first token.
    XmlDeclaration(XmlDeclaration),
    /// `<!DOCTYPE ...>`
    Doctype,
    /// `<name attr="v" ...>` or `<name .../>`
    StartTag {
        name: &'a str,
        attributes: Vec<Attribute>,
        /// Whitespace before `>` or `/>`.
        trailing_whitespace: &'a str,
        self_closing: bool,
    },
    /// `</name >`
    EndTag {
        name: &'a str,
        /// Whitespace between the name and `>`.
        trailing_whitespace: &'a str,
    },
    /// Character data with references decoded and line endings normalized.
    Text(String),
    /// The content of `<![CDATA[...]]>`.
    CData(&'a str),
    /// The content of `<!--...-->`.
    Comment(&'a str),
    /// `<?target data?>`
    ProcessingInstruction { target: &'a str, data: &'a str },
    /// End of input. `leading` holds any trailing whitespace.
    Eof,
}

/// Scans XML text into [`Token`]s.
///
/// # Examples
///
/// ```
/// use domtrip::parser::lexer::{Lexer, TokenKind};
///
/// let mut lexer = Lexer::new("<a>\n  <b x='1'/></a>");
/// let start = lexer.next_token().unwrap();
/// assert!(matches!(start.kind, TokenKind::StartTag { name: "a", .. }));
/// let child = lexer.next_token().unwrap();
/// assert_eq!(child.leading, "\n  ");
/// assert_eq!(child.raw, "<b x='1'/>");
/// ```
pub struct Lexer<'a> {
    input: ParserInput<'a>,
    at_start: bool,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a strict lexer over `text`.
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            input: ParserInput::new(text),
            at_start: true,
            finished: false,
        }
    }

    /// Enables lenient reference recovery.
    #[must_use]
    pub fn lenient(mut self, yes: bool) -> Self {
        self.input.set_lenient(yes);
        self
    }

    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.input.set_max_depth(max);
        self
    }

    /// Warnings recorded for recovered input so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.input.diagnostics
    }

    /// Consumes the lexer, returning its warnings.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<ParseDiagnostic> {
        self.input.diagnostics
    }

    /// Scans the next token. After [`TokenKind::Eof`] every call returns
    /// another `Eof`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for malformed markup.
    pub fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        let at_start = std::mem::take(&mut self.at_start);
        let ws_start = self.input.pos();
        let leading = self.input.take_whitespace();
        let location = self.input.location();
        let start = self.input.pos();

        if self.input.at_end() {
            self.finished = true;
            return Ok(Token {
                leading,
                raw: "",
                location,
                kind: TokenKind::Eof,
            });
        }

        if self.input.peek() != Some(b'<') {
            return self.text(ws_start, leading);
        }

        let kind = if self.input.looking_at(b"<?xml")
            && self
                .input
                .peek_at(5)
                .map_or(true, |b| is_xml_whitespace(b) || b == b'?')
        {
            if !at_start || !leading.is_empty() {
                return Err(self
                    .input
                    .fatal("XML declaration is only allowed at the start of the document"));
            }
            TokenKind::XmlDeclaration(self.xml_declaration(start)?)
        } else if self.input.looking_at(b"<?") {
            self.processing_instruction()?
        } else if self.input.looking_at(b"<!--") {
            self.input.advance(4);
            TokenKind::Comment(self.input.take_until(b"-->", "comment")?)
        } else if self.input.looking_at(b"<![CDATA[") {
            self.input.advance(9);
            TokenKind::CData(self.input.take_until(b"]]>", "CDATA section")?)
        } else if self.input.looking_at(b"<!DOCTYPE") {
            self.doctype(location)?;
            TokenKind::Doctype
        } else if self.input.looking_at(b"</") {
            self.end_tag()?
        } else if self.input.looking_at(b"<!") {
            return Err(self.input.fatal("unsupported markup declaration"));
        } else {
            self.start_tag()?
        };

        let token = Token {
            leading,
            raw: self.input.since(start),
            location,
            kind,
        };
        trace!("token at {}: {:?}", token.location, token.raw);
        Ok(token)
    }

    /// Scans character data up to the next `<` or the end of input.
    fn text(&mut self, start: usize, leading: &'a str) -> Result<Token<'a>, ParseError> {
        let location = self.input.location();
        let mut decoded = normalize_line_endings(leading);

        while let Some(b) = self.input.peek() {
            match b {
                b'<' => break,
                b'&' => self.input.decode_reference(&mut decoded)?,
                b'\r' => {
                    self.input.advance(1);
                    if self.input.peek() == Some(b'\n') {
                        self.input.advance(1);
                    }
                    decoded.push('\n');
                }
                _ => {
                    let ch = self.input.next_char()?;
                    decoded.push(ch);
                }
            }
        }

        Ok(Token {
            leading: "",
            raw: self.input.since(start),
            location,
            kind: TokenKind::Text(decoded),
        })
    }

    fn start_tag(&mut self) -> Result<TokenKind<'a>, ParseError> {
        self.input.expect_byte(b'<')?;
        let name = self.input.parse_name()?;
        let mut attributes: Vec<Attribute> = Vec::new();

        loop {
            let whitespace = self.input.take_whitespace();
            match self.input.peek() {
                Some(b'>') => {
                    self.input.advance(1);
                    self.input.increment_depth()?;
                    return Ok(TokenKind::StartTag {
                        name,
                        attributes,
                        trailing_whitespace: whitespace,
                        self_closing: false,
                    });
                }
                Some(b'/') => {
                    self.input.advance(1);
                    self.input.expect_byte(b'>')?;
                    return Ok(TokenKind::StartTag {
                        name,
                        attributes,
                        trailing_whitespace: whitespace,
                        self_closing: true,
                    });
                }
                None => {
                    return Err(self.input.fatal(format!("unterminated start tag <{name}>")));
                }
                Some(_) if whitespace.is_empty() => {
                    return Err(self
                        .input
                        .fatal(format!("expected whitespace, '>' or '/>' in start tag <{name}>")));
                }
                Some(_) => {
                    let location = self.input.location();
                    let attribute = self.attribute(whitespace)?;
                    if attributes.iter().any(|a| a.name() == attribute.name()) {
                        return Err(ParseError {
                            message: format!("duplicate attribute '{}'", attribute.name()),
                            location,
                        });
                    }
                    attributes.push(attribute);
                }
            }
        }
    }

    fn attribute(&mut self, preceding_whitespace: &'a str) -> Result<Attribute, ParseError> {
        let name = self.input.parse_name()?;
        let separator_start = self.input.pos();
        self.input.skip_whitespace();
        self.input.expect_byte(b'=')?;
        self.input.skip_whitespace();
        let separator = self.input.since(separator_start);

        let (value, raw, quote) = self.quoted_value()?;
        Ok(Attribute::parsed(
            name,
            value,
            raw,
            quote,
            preceding_whitespace,
            separator,
        ))
    }

    /// Scans a quoted attribute value, returning the decoded value, the raw
    /// text between the quotes and the quote style.
    fn quoted_value(&mut self) -> Result<(String, &'a str, QuoteStyle), ParseError> {
        let location = self.input.location();
        let quote = self
            .input
            .peek()
            .and_then(|b| QuoteStyle::from_char(char::from(b)))
            .ok_or_else(|| self.input.fatal("attribute value must be quoted"))?;
        let delimiter = quote.as_char() as u8;
        self.input.advance(1);

        let start = self.input.pos();
        let mut value = String::new();
        loop {
            match self.input.peek() {
                None => {
                    return Err(ParseError {
                        message: "unterminated attribute value".to_string(),
                        location,
                    })
                }
                Some(b) if b == delimiter => break,
                Some(b'<') => return Err(self.input.fatal("'<' not allowed in attribute value")),
                Some(b'&') => self.input.decode_reference(&mut value)?,
                Some(b'\r') => {
                    self.input.advance(1);
                    if self.input.peek() == Some(b'\n') {
                        self.input.advance(1);
                    }
                    value.push('\n');
                }
                Some(_) => {
                    let ch = self.input.next_char()?;
                    value.push(ch);
                }
            }
        }
        let raw = self.input.since(start);
        self.input.advance(1);
        Ok((value, raw, quote))
    }

    fn end_tag(&mut self) -> Result<TokenKind<'a>, ParseError> {
        self.input.expect_str(b"</")?;
        let name = self.input.parse_name()?;
        let trailing_whitespace = self.input.take_whitespace();
        self.input.expect_byte(b'>')?;
        self.input.decrement_depth();
        Ok(TokenKind::EndTag {
            name,
            trailing_whitespace,
        })
    }

    fn processing_instruction(&mut self) -> Result<TokenKind<'a>, ParseError> {
        self.input.expect_str(b"<?")?;
        let target = self.input.parse_name()?;
        if target.eq_ignore_ascii_case("xml") {
            return Err(self.input.fatal("processing instruction target 'xml' is reserved"));
        }
        let data = if self.input.skip_whitespace() {
            self.input.take_until(b"?>", "processing instruction")?
        } else {
            self.input.expect_str(b"?>")?;
            ""
        };
        Ok(TokenKind::ProcessingInstruction { target, data })
    }

    fn xml_declaration(&mut self, start: usize) -> Result<XmlDeclaration, ParseError> {
        self.input.expect_str(b"<?xml")?;
        let mut declaration = XmlDeclaration::new("", None, None);

        loop {
            let had_whitespace = self.input.skip_whitespace();
            if self.input.looking_at(b"?>") {
                self.input.advance(2);
                break;
            }
            if self.input.at_end() {
                return Err(self.input.fatal("unterminated XML declaration"));
            }
            if !had_whitespace {
                return Err(self.input.fatal("whitespace required in XML declaration"));
            }
            let name = self.input.parse_name()?;
            self.input.skip_whitespace();
            self.input.expect_byte(b'=')?;
            self.input.skip_whitespace();
            let (value, _, _) = self.quoted_value()?;
            match name {
                "version" => declaration.version = value,
                "encoding" => declaration.encoding = Some(value),
                "standalone" => {
                    declaration.standalone = match value.as_str() {
                        "yes" => Some(true),
                        "no" => Some(false),
                        _ => return Err(self.input.fatal("standalone must be 'yes' or 'no'")),
                    }
                }
                other => {
                    return Err(self
                        .input
                        .fatal(format!("unexpected '{other}' in XML declaration")))
                }
            }
        }

        if declaration.version.is_empty() {
            return Err(self.input.fatal("XML declaration is missing the version"));
        }
        declaration.raw = Some(self.input.since(start).to_string());
        Ok(declaration)
    }

    /// Skips over a DOCTYPE declaration, honoring quoted strings, comments
    /// and the bracketed internal subset.
    fn doctype(&mut self, location: SourceLocation) -> Result<(), ParseError> {
        self.input.advance(9);
        let mut bracket_depth = 0u32;
        let mut quote: Option<u8> = None;
        loop {
            let Some(b) = self.input.peek() else {
                return Err(ParseError {
                    message: "unterminated DOCTYPE declaration".to_string(),
                    location,
                });
            };
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => bracket_depth += 1,
                (None, b']') => bracket_depth = bracket_depth.saturating_sub(1),
                (None, b'<') if self.input.looking_at(b"<!--") => {
                    self.input.advance(4);
                    self.input.take_until(b"-->", "comment")?;
                    continue;
                }
                (None, b'>') if bracket_depth == 0 => {
                    self.input.advance(1);
                    return Ok(());
                }
                _ => {}
            }
            self.input.next_char()?;
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_token();
        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

/// Replaces `\r\n` and lone `\r` with `\n`.
fn normalize_line_endings(s: &str) -> String {
    if s.contains('\r') {
        s.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        s.to_string()
    }
}
