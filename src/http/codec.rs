//! Request body encoding.
//!
//! Structured request bodies are re-encoded as compact JSON before being
//! forwarded. Field order follows the payload's own ordering (serde_json is
//! built with `preserve_order`). Response bodies are never decoded here; the
//! backend's bytes go back to the caller untouched.

use axum::body::Bytes;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("request body could not be serialized: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("request body is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// Encode an optional structured body. `None` stays `None`.
pub fn encode<T>(body: Option<&T>) -> Result<Option<Bytes>, CodecError>
where
    T: Serialize + ?Sized,
{
    match body {
        None => Ok(None),
        Some(value) => serde_json::to_vec(value)
            .map(|bytes| Some(Bytes::from(bytes)))
            .map_err(CodecError::Serialize),
    }
}

/// Decode the raw inbound body into a structured payload.
///
/// An empty body and a JSON `null` both mean "no body".
pub fn decode(raw: &[u8]) -> Result<Option<Value>, CodecError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    match serde_json::from_slice::<Value>(raw).map_err(CodecError::Malformed)? {
        Value::Null => Ok(None),
        value => Ok(Some(value)),
    }
}
