//! Call and reply envelopes exchanged over the broker
//!
//! An envelope is the structured unit a codec publishes as the body of a
//! broker message. It is distinct from the raw message: transport-level
//! properties (routing key, reply-to address, correlation id) travel in the
//! message metadata, while the envelope carries the call itself.
//!
//! # Envelope Types
//!
//! - **CallEnvelope**: one outbound method invocation, created by a client
//!   codec and consumed by a server codec
//! - **ReplyEnvelope**: the outcome of one invocation, created by a server
//!   codec and consumed by the client's reply dispatcher
//!
//! # Sequence IDs
//!
//! Every call carries a `u64` sequence id scoped to the issuing client codec.
//! The matching reply echoes it back, which is the only thing that binds a
//! reply to its caller: the broker delivers replies in arbitrary order
//! relative to call issuance.

use serde::{Deserialize, Serialize};

/// A single RPC call as it travels through the broker.
///
/// Immutable once constructed. The `method` field uses the dotted
/// `Service.Method` form (e.g. `"Test.Mul"`); the server codec treats it as
/// an opaque lookup key.
///
/// # Examples
///
/// ```rust
/// use jroq_core::CallEnvelope;
///
/// let call = CallEnvelope::new(1, "Test.Mul", Some(serde_json::json!({"A": 6, "B": 7})));
/// assert_eq!(call.method, "Test.Mul");
/// assert_eq!(call.id, 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEnvelope {
    /// Sequence id, monotonically increasing per client codec instance
    pub id: u64,
    /// Dotted method name (`Service.Method`) to dispatch on the server
    pub method: String,
    /// Serialized call arguments, omitted on the wire when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl CallEnvelope {
    /// Create a new call envelope.
    pub fn new(id: u64, method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }
}

/// The outcome of one dispatched call.
///
/// Carries either a result or an error message, never both; the factory
/// methods enforce the exclusion. The `id` must equal the originating call's
/// sequence id or the client will discard the reply as unmatched.
///
/// An error here is an *application* error (the handler failed, or the
/// method does not exist). Transport faults never travel inside an envelope;
/// they surface locally on whichever side observed them.
///
/// # Examples
///
/// ```rust
/// use jroq_core::ReplyEnvelope;
///
/// let ok = ReplyEnvelope::success(1, serde_json::json!(42));
/// assert!(ok.is_success());
///
/// let failed = ReplyEnvelope::error(2, "unknown method Test.Divide");
/// assert!(failed.is_error());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    /// Sequence id of the originating call
    pub id: u64,
    /// Serialized result, present only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error message, present only on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplyEnvelope {
    /// Create a successful reply carrying a result value.
    pub fn success(id: u64, result: serde_json::Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create a failed reply carrying an application error message.
    pub fn error(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(message.into()),
        }
    }

    /// True when the reply carries a result.
    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }

    /// True when the reply carries an application error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_envelope_construction() {
        let call = CallEnvelope::new(7, "Test.Mul", Some(serde_json::json!({"A": 2, "B": 3})));
        assert_eq!(call.id, 7);
        assert_eq!(call.method, "Test.Mul");
        assert!(call.params.is_some());
    }

    #[test]
    fn test_call_envelope_serialization_skips_absent_params() {
        let call = CallEnvelope::new(1, "Service.Ping", None);
        let json = serde_json::to_string(&call).unwrap();
        assert!(json.contains("\"method\":\"Service.Ping\""));
        assert!(json.contains("\"id\":1"));
        assert!(!json.contains("\"params\""));
    }

    #[test]
    fn test_reply_success() {
        let reply = ReplyEnvelope::success(3, serde_json::json!(42));
        assert!(reply.is_success());
        assert!(!reply.is_error());
        let json = serde_json::to_string(&reply).unwrap();
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_reply_error() {
        let reply = ReplyEnvelope::error(4, "handler exploded");
        assert!(reply.is_error());
        assert!(!reply.is_success());
        let json = serde_json::to_string(&reply).unwrap();
        assert!(!json.contains("\"result\""));
        assert!(json.contains("handler exploded"));
    }

    #[test]
    fn test_reply_id_matches_call() {
        let call = CallEnvelope::new(99, "Test.Mul", None);
        let reply = ReplyEnvelope::success(call.id, serde_json::json!(0));
        assert_eq!(reply.id, call.id);
    }
}
