//! Conversions between raw image bytes and their textual forms.
//!
//! Images cross text-only boundaries (rendering surfaces, JSON requests) as
//! data URLs: `data:<mime>;base64,<body>`.

use crate::error::{Result, StyleShiftError};
use base64::Engine;

/// Encodes bytes as standard, padded base64.
pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Packages raw bytes as a data URL.
pub fn encode(bytes: &[u8], mime_type: &str) -> String {
    decode(&encode_base64(bytes), mime_type)
}

/// Returns the base64 body of a data URL: everything after the first comma.
///
/// This is a plain string split, not a parser. Input without a comma yields
/// an empty fragment.
pub fn strip_encoding_prefix(data_url: &str) -> &str {
    data_url
        .split_once(',')
        .map(|(_, body)| body)
        .unwrap_or_default()
}

/// Wraps a raw base64 body into a data URL.
pub fn decode(base64_body: &str, mime_type: &str) -> String {
    format!("data:{mime_type};base64,{base64_body}")
}

/// Decodes a base64 body into bytes.
///
/// Tolerates embedded whitespace and missing `=` padding, both of which show
/// up in service payloads.
pub fn decode_base64(body: &str) -> Result<Vec<u8>> {
    let cleaned: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }

    base64::engine::general_purpose::STANDARD_NO_PAD
        .decode(cleaned.trim_end_matches('='))
        .map_err(|e| StyleShiftError::Decode(e.to_string()))
}
