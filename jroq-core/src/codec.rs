//! Codec for envelope serialization and deserialization
//!
//! The wire encoding is JSON: compact, broker-agnostic, and symmetric with
//! what the dispatching side expects. The functions here are deliberately
//! bytes-in/bytes-out so the encoding stays a module-local decision; the
//! codecs above never touch `serde_json` directly for wire traffic.
//!
//! Decode failures come back as [`Error::Serialization`], which keeps
//! malformed bytes distinguishable from a well-formed reply that happens to
//! carry an application error.
//!
//! # Examples
//!
//! ```rust
//! use jroq_core::{codec, CallEnvelope};
//!
//! let call = CallEnvelope::new(1, "Test.Mul", Some(serde_json::json!({"A": 6, "B": 7})));
//! let bytes = codec::encode_call(&call).unwrap();
//! let decoded = codec::decode_call(&bytes).unwrap();
//! assert_eq!(decoded.method, "Test.Mul");
//! ```

use crate::error::{Error, Result};
use crate::types::{CallEnvelope, ReplyEnvelope};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode any serializable message to bytes.
///
/// Prefer the envelope-specific wrappers in application code; this generic
/// form exists for tests and for callers that define their own framing.
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode bytes into any deserializable message.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    serde_json::from_slice(data).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode a call envelope to bytes.
pub fn encode_call(call: &CallEnvelope) -> Result<Vec<u8>> {
    encode(call)
}

/// Decode bytes into a call envelope.
///
/// # Errors
///
/// Returns [`Error::Serialization`] when the bytes are not a well-formed
/// call envelope.
pub fn decode_call(data: &[u8]) -> Result<CallEnvelope> {
    decode(data)
}

/// Encode a reply envelope to bytes.
pub fn encode_reply(reply: &ReplyEnvelope) -> Result<Vec<u8>> {
    encode(reply)
}

/// Decode bytes into a reply envelope.
///
/// # Errors
///
/// Returns [`Error::Serialization`] when the bytes are not a well-formed
/// reply envelope.
pub fn decode_reply(data: &[u8]) -> Result<ReplyEnvelope> {
    decode(data)
}
