//! Character set handling for downloaded MARCXML documents.
//!
//! Resolution order: the `encoding="..."` declaration in the XML prolog,
//! then plain UTF-8, then statistical detection with chardet.

use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::error::{FetchError, FetchResult};

static PROLOG_ENCODING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*<\?xml[^>]*?\sencoding\s*=\s*["']([A-Za-z0-9._\-]+)["']"#).unwrap()
});

/// Encoding named in the XML declaration, if any.
pub fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(256)];
    PROLOG_ENCODING
        .captures(head)
        .and_then(|c| c.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).to_lowercase())
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset.to_lowercase(),
    }
}

/// Decode bytes to a string using the encoding label
pub fn decode_content(bytes: &[u8], encoding: &str) -> FetchResult<String> {
    let encoding = Encoding::for_label(encoding.as_bytes())
        .ok_or_else(|| FetchError::Encoding(format!("unknown encoding '{}'", encoding)))?;

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(FetchError::Encoding(format!(
            "document is not valid {}",
            encoding.name()
        )));
    }
    Ok(text.into_owned())
}

/// Decode a MARCXML document to text.
pub fn decode_document(bytes: &[u8]) -> FetchResult<String> {
    if let Some(declared) = declared_encoding(bytes) {
        return decode_content(bytes, &declared);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.trim_start_matches('\u{feff}').to_string()),
        Err(_) => {
            let detected = detect_encoding(bytes);
            decode_content(bytes, &detected)
        }
    }
}
