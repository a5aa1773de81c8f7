//! Encoding detection and transcoding.
//!
//! Inputs are sniffed for a Byte Order Mark first, then for the `encoding`
//! pseudo-attribute of the XML declaration, and finally default to UTF-8.
//! Conversion goes through `encoding_rs`. The detected encoding and the
//! presence of a BOM are remembered so that [`encode`] can write the document
//! back in the form it was read.
//!
//! # Encoding Detection Strategy
//!
//! 1. An explicit override always wins.
//! 2. A BOM selects UTF-8, UTF-16BE or UTF-16LE. UTF-32 BOMs are recognized
//!    and rejected, since they cannot be decoded.
//! 3. Without a BOM, the declaration is scanned as ASCII bytes.
//! 4. Otherwise the input must be valid UTF-8.

use log::trace;

/// An error that occurs during encoding detection or transcoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("encoding error: {message}")]
pub struct EncodingError {
    /// A human-readable description of the encoding error.
    pub message: String,
}

impl EncodingError {
    /// Creates a new `EncodingError` with the given message.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Text decoded from a byte stream, with what was learned while decoding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInput {
    /// The document text, without any BOM.
    pub text: String,
    /// Canonical name of the encoding the bytes were decoded with.
    pub encoding: &'static str,
    /// Whether the input started with a Byte Order Mark.
    pub bom: bool,
}

/// Detects the encoding of an XML byte stream by inspecting the Byte Order Mark.
///
/// Returns a tuple of (encoding name, number of BOM bytes to skip).
///
/// - `00 00 FE FF` -> UTF-32BE
/// - `FF FE 00 00` -> UTF-32LE
/// - `EF BB BF`    -> UTF-8
/// - `FE FF`       -> UTF-16BE
/// - `FF FE`       -> UTF-16LE
/// - No BOM        -> UTF-8
///
/// # Examples
///
/// ```
/// use domtrip::encoding::detect_encoding;
///
/// let (enc, skip) = detect_encoding(b"\xEF\xBB\xBFhello");
/// assert_eq!(enc, "UTF-8");
/// assert_eq!(skip, 3);
///
/// let (enc, skip) = detect_encoding(b"<root/>");
/// assert_eq!(enc, "UTF-8");
/// assert_eq!(skip, 0);
/// ```
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> (&'static str, usize) {
    if bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
        ("UTF-32BE", 4)
    } else if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
        ("UTF-32LE", 4)
    } else if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        ("UTF-8", 3)
    } else if bytes.starts_with(&[0xFE, 0xFF]) {
        ("UTF-16BE", 2)
    } else if bytes.starts_with(&[0xFF, 0xFE]) {
        ("UTF-16LE", 2)
    } else {
        ("UTF-8", 0)
    }
}

/// Looks up an encoding by label.
fn lookup(label: &str) -> Result<&'static encoding_rs::Encoding, EncodingError> {
    encoding_rs::Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| EncodingError::new(format!("unsupported encoding: {label}")))
}

/// Transcodes a byte slice from the named encoding into a UTF-8 `String`.
///
/// # Errors
///
/// Returns `EncodingError` if the encoding name is not recognized or if
/// the input contains malformed byte sequences.
///
/// # Examples
///
/// ```
/// use domtrip::encoding::transcode;
///
/// let result = transcode(b"caf\xE9", "ISO-8859-1").unwrap();
/// assert_eq!(result, "caf\u{e9}");
/// ```
pub fn transcode(bytes: &[u8], encoding_name: &str) -> Result<String, EncodingError> {
    let encoding = lookup(encoding_name)?;
    let (result, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(EncodingError::new(format!(
            "malformed byte sequence for encoding {encoding_name}"
        )));
    }
    Ok(result.into_owned())
}

/// Decodes raw XML bytes into a UTF-8 string.
///
/// `override_encoding` bypasses detection entirely; a BOM matching the
/// override is still stripped.
///
/// # Errors
///
/// Returns `EncodingError` if the bytes are invalid for the selected encoding,
/// if the encoding is unsupported, or if the input carries a UTF-32 BOM.
///
/// # Examples
///
/// ```
/// use domtrip::encoding::decode;
///
/// let decoded = decode(b"\xEF\xBB\xBF<root/>", None).unwrap();
/// assert_eq!(decoded.text, "<root/>");
/// assert!(decoded.bom);
/// ```
pub fn decode(bytes: &[u8], override_encoding: Option<&str>) -> Result<DecodedInput, EncodingError> {
    let (bom_encoding, bom_skip) = detect_encoding(bytes);

    if let Some(label) = override_encoding {
        let encoding = lookup(label)?;
        let skip = if bom_skip > 0 && encoding.name() == bom_encoding {
            bom_skip
        } else {
            0
        };
        trace!("decoding with explicit encoding {}", encoding.name());
        return Ok(DecodedInput {
            text: transcode(&bytes[skip..], encoding.name())?,
            encoding: encoding.name(),
            bom: skip > 0,
        });
    }

    if bom_encoding.starts_with("UTF-32") {
        return Err(EncodingError::new(format!(
            "unsupported encoding: {bom_encoding}"
        )));
    }

    let content = &bytes[bom_skip..];
    if bom_skip > 0 {
        // The BOM determines the byte order; a declaration cannot contradict it.
        trace!("byte order mark selects {bom_encoding}");
        let encoding = lookup(bom_encoding)?;
        return Ok(DecodedInput {
            text: transcode(content, bom_encoding)?,
            encoding: encoding.name(),
            bom: true,
        });
    }

    if let Some(declared) = extract_encoding_from_ascii_bytes(content) {
        let encoding = lookup(&declared)?;
        trace!("XML declaration selects {}", encoding.name());
        if encoding != encoding_rs::UTF_8 {
            return Ok(DecodedInput {
                text: transcode(content, encoding.name())?,
                encoding: encoding.name(),
                bom: false,
            });
        }
    }

    match std::str::from_utf8(content) {
        Ok(text) => Ok(DecodedInput {
            text: text.to_string(),
            encoding: encoding_rs::UTF_8.name(),
            bom: false,
        }),
        Err(e) => Err(EncodingError::new(format!(
            "input is not valid UTF-8 (invalid byte at offset {})",
            e.valid_up_to()
        ))),
    }
}

/// Encodes document text into bytes of the named encoding, optionally
/// preceded by a Byte Order Mark.
///
/// Characters the target encoding cannot represent are written as numeric
/// character references.
///
/// # Errors
///
/// Returns `EncodingError` if the encoding name is not recognized.
pub fn encode(text: &str, encoding_name: &str, bom: bool) -> Result<Vec<u8>, EncodingError> {
    let encoding = lookup(encoding_name)?;
    let mut out = Vec::with_capacity(text.len() + 4);

    if encoding == encoding_rs::UTF_16LE || encoding == encoding_rs::UTF_16BE {
        // encoding_rs only decodes UTF-16, so encode it directly.
        let big_endian = encoding == encoding_rs::UTF_16BE;
        if bom {
            out.extend_from_slice(if big_endian { &[0xFE, 0xFF] } else { &[0xFF, 0xFE] });
        }
        for unit in text.encode_utf16() {
            if big_endian {
                out.extend_from_slice(&unit.to_be_bytes());
            } else {
                out.extend_from_slice(&unit.to_le_bytes());
            }
        }
        return Ok(out);
    }

    if encoding == encoding_rs::UTF_8 {
        if bom {
            out.extend_from_slice(&[0xEF, 0xBB, 0xBF]);
        }
        out.extend_from_slice(text.as_bytes());
        return Ok(out);
    }

    let (bytes, _, had_unmappable) = encoding.encode(text);
    if had_unmappable {
        trace!(
            "characters not representable in {} written as character references",
            encoding.name()
        );
    }
    out.extend_from_slice(&bytes);
    Ok(out)
}

/// Extracts the `encoding` attribute from raw bytes by treating them as ASCII.
///
/// The XML declaration must be in ASCII-compatible characters, so the bytes
/// can be scanned directly before any decoding happens.
fn extract_encoding_from_ascii_bytes(bytes: &[u8]) -> Option<String> {
    let limit = bytes.len().min(200);
    let scan = &bytes[..limit];

    if !scan.starts_with(b"<?xml") {
        return None;
    }

    let decl_end = scan.windows(2).position(|w| w == b"?>")?;
    let decl = &scan[..decl_end];

    let enc_needle = b"encoding";
    let enc_pos = decl
        .windows(enc_needle.len())
        .position(|w| w == enc_needle)?;
    let after_enc = &decl[enc_pos + enc_needle.len()..];

    let after_enc = skip_ascii_whitespace(after_enc);
    if after_enc.first() != Some(&b'=') {
        return None;
    }
    let after_eq = skip_ascii_whitespace(&after_enc[1..]);

    let quote = *after_eq.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let after_quote = &after_eq[1..];
    let end = after_quote.iter().position(|&b| b == quote)?;
    let encoding_bytes = &after_quote[..end];

    if encoding_bytes.iter().all(u8::is_ascii) {
        Some(String::from_utf8_lossy(encoding_bytes).into_owned())
    } else {
        None
    }
}

/// Skips leading ASCII whitespace bytes (space, tab, CR, LF).
fn skip_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t' || b == b'\r' || b == b'\n')
        .count();
    &bytes[skip..]
}
