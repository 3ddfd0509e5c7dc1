use std::sync::OnceLock;

use base64::{prelude::BASE64_STANDARD, Engine};
use regex::Regex;

use super::models::PhotoError;

/// MIME type assumed when the data-URL prefix is missing or malformed.
pub const FALLBACK_MIME: &str = "image/jpeg";

/// An image payload decoded out of a data-URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub mime: String,
    pub bytes: Vec<u8>,
}

fn mime_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r":(.*?);").unwrap())
}

/// Embed `bytes` in a `data:<mime>;base64,<payload>` string.
pub fn buffer_to_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, BASE64_STANDARD.encode(bytes))
}

/// Parse a data-URL back into its MIME type and raw bytes.
///
/// The MIME type falls back to `image/jpeg` when the prefix does not carry
/// one. A string without a comma separator, or with an undecodable base64
/// payload, is a [`PhotoError::MalformedInput`].
pub fn data_url_to_buffer(data_url: &str) -> Result<DecodedImage, PhotoError> {
    let (prefix, payload) = data_url
        .split_once(',')
        .ok_or_else(|| PhotoError::MalformedInput("missing comma separator".to_string()))?;

    let mime = mime_pattern()
        .captures(prefix)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_MIME.to_string());

    let bytes = BASE64_STANDARD
        .decode(payload)
        .map_err(|e| PhotoError::MalformedInput(format!("invalid base64 payload: {e}")))?;

    Ok(DecodedImage { mime, bytes })
}

/// Approximate decoded size of a data-URL in kilobytes.
///
/// Base64 carries ~3 bytes per 4 characters, so `len * 0.75` is close
/// enough for display purposes. Not suitable for limit enforcement.
pub fn estimate_size_kb(data_url: &str) -> u64 {
    let payload = data_url
        .split_once(',')
        .map(|(_, p)| p)
        .unwrap_or(data_url);
    let bytes = payload.len() as f64 * 0.75;
    (bytes / 1024.0).round() as u64
}
