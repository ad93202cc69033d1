//! Base64 helpers for image payloads moving through the provider APIs

use crate::error::{AppError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};

/// Encode binary data to a base64 string
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode a base64 string, tolerating a data URL prefix
/// (e.g. "data:image/png;base64,...")
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    let data = if encoded.contains(',') {
        encoded.split(',').last().unwrap_or(encoded)
    } else {
        encoded
    };

    STANDARD
        .decode(data.trim())
        .map_err(|e| AppError::upstream("Invalid image payload", format!("bad base64 data: {}", e)))
}

/// Check whether a string is a data URL
pub fn is_data_url(value: &str) -> bool {
    value.starts_with("data:")
}

/// Create a data URL from binary image data
pub fn create_data_url(data: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, encode(data))
}
