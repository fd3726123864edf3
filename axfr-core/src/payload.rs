//! Canonical JSON payloads.
//!
//! The cache stores exactly the bytes written to the response body, so every
//! payload goes through here to keep the encoding stable between a miss and
//! the hits that follow it.

use serde::Serialize;

use crate::error::AxfrResult;

/// Serialize a query result to the compact JSON bytes stored in the cache.
pub fn to_payload<T: Serialize + ?Sized>(value: &T) -> AxfrResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// The `{"error": "<reason>"}` body clients use to tell failures apart from
/// result arrays.
pub fn error_payload(reason: &str) -> Vec<u8> {
    serde_json::json!({ "error": reason }).to_string().into_bytes()
}
