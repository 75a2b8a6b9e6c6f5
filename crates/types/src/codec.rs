//! Compact JSON wire codec for topic payloads
//!
//! All envelopes cross the broker as compact UTF-8 JSON objects.
//! serde_json emits no insignificant whitespace and leaves non-ASCII
//! text unescaped, matching the wire format downstream consumers read.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Codec error types
#[derive(Error, Debug)]
pub enum CodecError {
    /// Payload is not valid JSON or not a JSON object
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Value could not be serialized
    #[error("encode failed: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Serialize a value to compact JSON bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Deserialize a topic payload.
///
/// Fails with [`CodecError::MalformedPayload`] when the bytes are not
/// valid JSON, not a JSON object, or do not match the target shape.
pub fn decode<T: DeserializeOwned>(raw: &[u8]) -> Result<T> {
    let value: serde_json::Value =
        serde_json::from_slice(raw).map_err(|e| CodecError::MalformedPayload(e.to_string()))?;
    if !value.is_object() {
        return Err(CodecError::MalformedPayload(
            "payload is not a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| CodecError::MalformedPayload(e.to_string()))
}
