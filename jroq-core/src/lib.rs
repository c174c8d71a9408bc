//! Core types and transport for jroq
//!
//! This crate provides the foundation shared by the client and server
//! codecs:
//!
//! - **Types**: call and reply envelopes with sequence-id correlation
//! - **Codec**: envelope serialization to and from broker message payloads
//! - **Broker**: the minimal channel contract the codecs depend on, with an
//!   AMQP (lapin) implementation and an in-process one for tests and
//!   embedders
//! - **Error handling**: one error type spanning transport, protocol and
//!   application failures
//! - **Observability**: OpenTelemetry integration for traces, metrics and
//!   logs
//!
//! # Overview
//!
//! jroq bridges a synchronous request/response calling model onto a
//! queue-based broker: calls are encoded as envelopes, published to a
//! request queue, and matched against asynchronously arriving replies by
//! sequence id. This crate holds everything both halves of that bridge
//! agree on; `jroq-client` and `jroq-server` build the two codecs on top.
//!
//! # Example
//!
//! ```rust
//! use jroq_core::{codec, CallEnvelope};
//!
//! let call = CallEnvelope::new(1, "Test.Mul", Some(serde_json::json!({"A": 6, "B": 7})));
//! let bytes = codec::encode_call(&call).unwrap();
//! let decoded = codec::decode_call(&bytes).unwrap();
//! assert_eq!(decoded.method, "Test.Mul");
//! ```

pub mod broker;
pub mod codec;
pub mod error;
pub mod observability;
pub mod types;

// Re-export the most commonly used types for convenience
pub use error::{Error, Result};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{CallEnvelope, ReplyEnvelope};
