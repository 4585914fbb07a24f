//! Encoding detection and transcoding.
//!
//! Implements BOM sniffing and XML declaration encoding detection per
//! XML 1.0 Section 4.3.3, bridging to `encoding_rs` for character encoding
//! conversion. Used on the way in by [`crate::Document::parse_bytes`] and
//! on the way out by the serializer when a document has a declared
//! encoding.

use crate::error::EncodingError;

/// Detects the encoding of an XML byte stream by inspecting the Byte Order
/// Mark.
///
/// Returns a tuple of (encoding name, number of BOM bytes to skip). Per XML
/// 1.0 Appendix F the detection order is UTF-8 BOM, UTF-16 BE, UTF-16 LE;
/// with no BOM the default is UTF-8.
#[must_use]
pub fn detect_encoding(bytes: &[u8]) -> (&'static str, usize) {
    if bytes.len() >= 3 && bytes[0] == 0xEF && bytes[1] == 0xBB && bytes[2] == 0xBF {
        ("UTF-8", 3)
    } else if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        ("UTF-16BE", 2)
    } else if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xFE {
        ("UTF-16LE", 2)
    } else {
        ("UTF-8", 0)
    }
}

/// Transcodes a byte slice from the named encoding into a UTF-8 `String`.
///
/// Uses `encoding_rs::Encoding::for_label` to look up the encoding by its
/// IANA name (case-insensitive).
///
/// # Errors
///
/// Returns `EncodingError` if the encoding name is not recognized or if
/// the input contains malformed byte sequences.
pub fn transcode(bytes: &[u8], encoding_name: &str) -> Result<String, EncodingError> {
    let encoding = encoding_rs::Encoding::for_label(encoding_name.as_bytes())
        .ok_or_else(|| EncodingError::new(format!("unsupported encoding: {encoding_name}")))?;

    let (result, _used_encoding, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(EncodingError::new(format!(
            "malformed byte sequence for encoding {encoding_name}"
        )));
    }
    Ok(result.into_owned())
}

/// Decodes raw XML bytes into a UTF-8 string, detecting the encoding from
/// the BOM and, failing that, from the XML declaration's `encoding=`
/// attribute.
///
/// # Errors
///
/// Returns `EncodingError` if the bytes contain invalid sequences for the
/// detected encoding or if a declared encoding is unsupported.
pub fn decode_to_utf8(bytes: &[u8]) -> Result<String, EncodingError> {
    let (bom_encoding, skip) = detect_encoding(bytes);
    let body = &bytes[skip..];

    if skip > 0 {
        return transcode(body, bom_encoding);
    }

    // No BOM: the declaration may still name a non-UTF-8 encoding. The
    // declaration itself is ASCII, so a lossy prefix scan is safe before
    // committing to a decoder.
    let prefix_len = body.len().min(256);
    let prefix = String::from_utf8_lossy(&body[..prefix_len]);
    if let Some(declared) = extract_decl_encoding(&prefix) {
        if !declared.eq_ignore_ascii_case("utf-8")
            && !declared.eq_ignore_ascii_case("us-ascii")
            && !declared.eq_ignore_ascii_case("ascii")
        {
            return transcode(body, &declared);
        }
    }

    transcode(body, "UTF-8")
}

/// Encodes a UTF-8 string into the named encoding for serialized output.
///
/// Unknown encoding names fall back to UTF-8 bytes; the declaration still
/// carries the configured name verbatim, so the encoding acts as an opaque
/// header hint rather than a hard constraint.
#[must_use]
pub fn encode_from_utf8(text: &str, encoding_name: &str) -> Vec<u8> {
    match encoding_rs::Encoding::for_label(encoding_name.as_bytes()) {
        Some(encoding) => {
            let (bytes, _used_encoding, _had_errors) = encoding.encode(text);
            bytes.into_owned()
        }
        None => text.as_bytes().to_vec(),
    }
}

/// Extracts the `encoding` attribute value from an XML declaration.
///
/// A lightweight scan of the declaration only, without running the full
/// parser. Returns `None` if there is no declaration or no encoding
/// attribute.
fn extract_decl_encoding(text: &str) -> Option<String> {
    let decl_end = text.find("?>")?;
    let decl = &text[..decl_end];
    if !decl.starts_with("<?xml") {
        return None;
    }

    let enc_pos = decl.find("encoding")?;
    let after_enc = decl[enc_pos + "encoding".len()..].trim_start();
    let after_eq = after_enc.strip_prefix('=')?.trim_start();

    let quote = after_eq.as_bytes().first().copied()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let after_quote = &after_eq[1..];
    let end = after_quote.find(quote as char)?;
    Some(after_quote[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_utf8_bom() {
        let (enc, skip) = detect_encoding(b"\xEF\xBB\xBF<root/>");
        assert_eq!(enc, "UTF-8");
        assert_eq!(skip, 3);
    }

    #[test]
    fn test_detect_utf16_le_bom() {
        let (enc, skip) = detect_encoding(b"\xFF\xFE<\x00r\x00");
        assert_eq!(enc, "UTF-16LE");
        assert_eq!(skip, 2);
    }

    #[test]
    fn test_detect_no_bom_defaults_to_utf8() {
        let (enc, skip) = detect_encoding(b"<root/>");
        assert_eq!(enc, "UTF-8");
        assert_eq!(skip, 0);
    }

    #[test]
    fn test_transcode_latin1() {
        let result = transcode(b"caf\xE9", "ISO-8859-1").unwrap();
        assert_eq!(result, "café");
    }

    #[test]
    fn test_transcode_unknown_encoding_fails() {
        assert!(transcode(b"x", "no-such-charset").is_err());
    }

    #[test]
    fn test_decode_respects_declared_encoding() {
        let input = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r>\xE9</r>";
        let text = decode_to_utf8(input).unwrap();
        assert!(text.contains('é'));
    }

    #[test]
    fn test_decode_plain_utf8() {
        let text = decode_to_utf8("<r>é</r>".as_bytes()).unwrap();
        assert_eq!(text, "<r>é</r>");
    }

    #[test]
    fn test_encode_latin1_output() {
        let bytes = encode_from_utf8("é", "ISO-8859-1");
        assert_eq!(bytes, vec![0xE9]);
    }

    #[test]
    fn test_encode_unknown_label_falls_back_to_utf8() {
        let bytes = encode_from_utf8("é", "no-such-charset");
        assert_eq!(bytes, "é".as_bytes());
    }

    #[test]
    fn test_extract_decl_encoding() {
        assert_eq!(
            extract_decl_encoding("<?xml version=\"1.0\" encoding='UTF-16'?><r/>"),
            Some("UTF-16".to_string())
        );
        assert_eq!(extract_decl_encoding("<r/>"), None);
    }
}
