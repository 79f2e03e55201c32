// src/utils/serialization.rs
//! Serialization utilities for the credential pipeline.
//!
//! Provides:
//! - JSON encoding of structured data
//! - Unpadded base64url, the encoding of every JWS segment

use serde::{Deserialize, Serialize};

/// Serializes a value to compact JSON bytes.
///
/// # Returns
/// - `Ok(Vec<u8>)` with the JSON representation on success
/// - `Err(serde_json::Error)` if serialization fails
pub fn serialize<T: Serialize>(data: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(data)
}

/// Deserializes a value from JSON bytes.
pub fn deserialize<'a, T: Deserialize<'a>>(data: &'a [u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(data)
}

/// Encodes bytes as base64url without padding.
pub fn base64url_encode(bytes: impl AsRef<[u8]>) -> String {
    base64::encode_config(bytes, base64::URL_SAFE_NO_PAD)
}

/// Decodes unpadded base64url.
pub fn base64url_decode(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::decode_config(encoded, base64::URL_SAFE_NO_PAD)
}
