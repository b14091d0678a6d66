//! Character encoding for parser input and serializer output.
//!
//! Input side: [`decode_to_utf8`] sniffs a Byte Order Mark, then honours the
//! `encoding` pseudo-attribute of the XML declaration, and transcodes to UTF-8
//! through `encoding_rs`.
//!
//! Output side: [`encode_from_utf8`] turns the serializer's text into bytes in
//! a caller-named encoding. Characters the target encoding cannot represent
//! are written as numeric character references (`&#NNNN;`), which keeps the
//! output well-formed.

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use memchr::memmem;

use crate::tracing_macros::trace;

/// An error that occurs during encoding detection or transcoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("encoding error: {message}")]
pub struct EncodingError {
    /// A human-readable description of the encoding error.
    pub message: String,
}

impl EncodingError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Looks up an encoding by label (case-insensitive, WHATWG label set).
///
/// # Errors
///
/// Returns `EncodingError` if the label is not a known encoding.
pub fn lookup(label: &str) -> Result<&'static Encoding, EncodingError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| EncodingError::new(format!("unsupported encoding: {label}")))
}

/// Detects the encoding of a byte stream from its Byte Order Mark.
///
/// Returns the encoding and the number of BOM bytes to skip. Without a BOM
/// the input is assumed to be UTF-8.
///
/// # Examples
///
/// ```
/// use simpletree::encoding::detect_encoding;
///
/// let (enc, skip) = detect_encoding(b"\xEF\xBB\xBF<root/>");
/// assert_eq!(enc.name(), "UTF-8");
/// assert_eq!(skip, 3);
///
/// let (enc, skip) = detect_encoding(b"\xFF\xFE<\x00");
/// assert_eq!(enc.name(), "UTF-16LE");
/// assert_eq!(skip, 2);
/// ```
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> (&'static Encoding, usize) {
    match Encoding::for_bom(bytes) {
        Some((encoding, skip)) => (encoding, skip),
        None => (encoding_rs::UTF_8, 0),
    }
}

/// Transcodes bytes in the named encoding into a UTF-8 `String`.
///
/// # Errors
///
/// Returns `EncodingError` if the label is unknown or the bytes are
/// malformed for that encoding.
///
/// # Examples
///
/// ```
/// use simpletree::encoding::transcode;
///
/// assert_eq!(transcode(b"caf\xE9", "iso-8859-1").unwrap(), "caf\u{e9}");
/// ```
pub fn transcode(bytes: &[u8], label: &str) -> Result<String, EncodingError> {
    let encoding = lookup(label)?;
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(EncodingError::new(format!(
            "malformed byte sequence for encoding {label}"
        )));
    }
    Ok(text.into_owned())
}

/// Decodes a whole XML source into UTF-8 text.
///
/// 1. A BOM selects the initial encoding (and is stripped).
/// 2. Without a BOM, the bytes are read as UTF-8 if they validate.
/// 3. If the XML declaration names a different encoding, the bytes are
///    re-decoded with it.
///
/// # Errors
///
/// Returns `EncodingError` if the bytes are invalid for the detected
/// encoding or the declared encoding is unknown.
///
/// # Examples
///
/// ```
/// use simpletree::encoding::decode_to_utf8;
///
/// let text = decode_to_utf8(b"<?xml version=\"1.0\"?><root/>").unwrap();
/// assert!(text.ends_with("<root/>"));
/// ```
pub fn decode_to_utf8(bytes: &[u8]) -> Result<String, EncodingError> {
    let (bom_encoding, skip) = detect_encoding(bytes);
    let content = &bytes[skip..];

    if bom_encoding == encoding_rs::UTF_8 {
        // The declaration is ASCII-compatible in every encoding we accept
        // without a BOM, so it can be read before transcoding.
        if let Some(declared) = declared_encoding(content) {
            let encoding = lookup(&declared)?;
            // A UTF-16 declaration on ASCII-readable bytes without a BOM
            // cannot be accurate; the bytes are read as UTF-8.
            let is_utf16 = encoding == UTF_16LE || encoding == UTF_16BE;
            if encoding != encoding_rs::UTF_8 && !is_utf16 && skip == 0 {
                trace!(encoding = encoding.name(), "transcoding declared encoding");
                return transcode(content, &declared);
            }
        }
        return std::str::from_utf8(content)
            .map(str::to_string)
            .map_err(|_| EncodingError::new("input is not valid UTF-8"));
    }

    trace!(encoding = bom_encoding.name(), "transcoding from BOM");
    let (text, had_errors) = bom_encoding.decode_without_bom_handling(content);
    if had_errors {
        return Err(EncodingError::new(format!(
            "malformed byte sequence for encoding {}",
            bom_encoding.name()
        )));
    }
    Ok(text.into_owned())
}

/// Encodes UTF-8 text into the encoding named by `label`.
///
/// UTF-16 labels produce UTF-16 code units in the labelled byte order
/// (`encoding_rs` only decodes UTF-16, so those are written directly).
/// Unmappable characters become numeric character references.
///
/// # Errors
///
/// Returns `EncodingError` if the label is unknown.
///
/// # Examples
///
/// ```
/// use simpletree::encoding::encode_from_utf8;
///
/// assert_eq!(encode_from_utf8("caf\u{e9}", "iso-8859-1").unwrap(), b"caf\xE9");
/// assert_eq!(encode_from_utf8("\u{263a}", "us-ascii").unwrap(), b"&#9786;");
/// ```
pub fn encode_from_utf8(text: &str, label: &str) -> Result<Vec<u8>, EncodingError> {
    let encoding = lookup(label)?;
    trace!(encoding = encoding.name(), len = text.len(), "encoding output");
    if encoding == UTF_16LE {
        return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
    }
    if encoding == UTF_16BE {
        return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
    }
    let (bytes, _, _) = encoding.encode(text);
    Ok(bytes.into_owned())
}

/// Reads the `encoding` pseudo-attribute from a leading XML declaration,
/// treating the bytes as ASCII.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let scan = &bytes[..bytes.len().min(256)];
    let start = memchr::memchr(b'<', scan)?;
    let scan = &scan[start..];
    if !scan.starts_with(b"<?xml") {
        return None;
    }
    let decl = &scan[..memmem::find(scan, b"?>")?];
    let after = &decl[memmem::find(decl, b"encoding")? + b"encoding".len()..];
    let after = skip_ascii_whitespace(after).strip_prefix(b"=")?;
    let after = skip_ascii_whitespace(after);
    let (&quote, rest) = after.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let value = &rest[..memchr::memchr(quote, rest)?];
    value
        .is_ascii()
        .then(|| String::from_utf8_lossy(value).into_owned())
}

fn skip_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|b| b.is_ascii_whitespace())
        .count();
    &bytes[skip..]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_utf8_bom() {
        let (encoding, skip) = detect_encoding(b"\xEF\xBB\xBF<root/>");
        assert_eq!(encoding, encoding_rs::UTF_8);
        assert_eq!(skip, 3);
    }

    #[test]
    fn test_detect_utf16be_bom() {
        let (encoding, skip) = detect_encoding(b"\xFE\xFF\x00<");
        assert_eq!(encoding, UTF_16BE);
        assert_eq!(skip, 2);
    }

    #[test]
    fn test_detect_no_bom() {
        let (encoding, skip) = detect_encoding(b"<root/>");
        assert_eq!(encoding, encoding_rs::UTF_8);
        assert_eq!(skip, 0);
    }

    #[test]
    fn test_decode_utf8_with_bom() {
        let result = decode_to_utf8(b"\xEF\xBB\xBF<root/>").unwrap();
        assert_eq!(result, "<root/>");
    }

    #[test]
    fn test_decode_declared_latin1() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>");
        bytes.extend_from_slice(b"<root>caf\xE9</root>");
        let result = decode_to_utf8(&bytes).unwrap();
        assert!(result.contains("caf\u{e9}"));
    }

    #[test]
    fn test_decode_utf16le_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "<a/>".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_to_utf8(&bytes).unwrap(), "<a/>");
    }

    #[test]
    fn test_decode_invalid_utf8() {
        assert!(decode_to_utf8(&[0x80, 0x81, 0x82]).is_err());
    }

    #[test]
    fn test_decode_unknown_declared_encoding() {
        let err = decode_to_utf8(b"<?xml version='1.0' encoding='nope-42'?><a/>").unwrap_err();
        assert!(err.message.contains("unsupported encoding"));
    }

    #[test]
    fn test_transcode_unknown_encoding() {
        assert!(transcode(b"hello", "UNKNOWN-ENCODING-42").is_err());
    }

    #[test]
    fn test_encode_utf8_passthrough() {
        assert_eq!(encode_from_utf8("<a>\u{e9}</a>", "utf-8").unwrap(), "<a>\u{e9}</a>".as_bytes());
    }

    #[test]
    fn test_encode_utf16() {
        assert_eq!(encode_from_utf8("<a", "utf-16le").unwrap(), vec![b'<', 0, b'a', 0]);
        assert_eq!(encode_from_utf8("<a", "utf-16be").unwrap(), vec![0, b'<', 0, b'a']);
    }

    #[test]
    fn test_encode_unknown_label() {
        assert!(encode_from_utf8("x", "klingon").is_err());
    }

    #[test]
    fn test_declared_encoding() {
        assert_eq!(
            declared_encoding(b"<?xml version='1.0' encoding='UTF-8'?><root/>"),
            Some("UTF-8".to_string())
        );
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?><root/>"), None);
        assert_eq!(declared_encoding(b"<root/>"), None);
    }

    #[test]
    fn test_encoding_error_display() {
        assert_eq!(
            EncodingError::new("test error").to_string(),
            "encoding error: test error"
        );
    }
}
