//! Error types for jroq
//!
//! One `Error` enum covers the three classes of failure a caller can see:
//!
//! - **Transport errors** (`Broker`, `TransportClosed`, `Timeout`): the
//!   broker connection, channel or publish failed, or the codec was torn
//!   down while calls were outstanding. Surfaced to whichever call triggered
//!   them; never carried inside an envelope.
//! - **Protocol errors** (`Serialization`, `Protocol`): malformed envelope
//!   bytes or a structurally invalid message. The codecs absorb these where
//!   they can (a bad reply is logged and skipped) and only surface them when
//!   the caller's own call is affected.
//! - **Application errors** (`Application`, `MethodNotFound`): the remote
//!   handler failed or the method name is not registered. These travel as
//!   data inside a `ReplyEnvelope` and are delivered to the caller as the
//!   call's result-side error.
//!
//! A caller sees exactly one of: a decoded result, an application error, or
//! a transport error per call.

use thiserror::Error;

/// Result type for jroq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type shared by the client and server codecs.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Broker-level failure: connection, channel, declare or publish.
    #[error("broker error: {0}")]
    Broker(String),

    /// Envelope bytes could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A structurally invalid message, e.g. a reply carrying neither result
    /// nor error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The remote handler returned an error; the message is carried verbatim
    /// from the reply envelope.
    #[error("{0}")]
    Application(String),

    /// No handler is registered under the requested method name.
    #[error("unknown method {0}")]
    MethodNotFound(String),

    /// Invalid codec configuration (missing broker URL, missing queue name).
    #[error("configuration error: {0}")]
    Config(String),

    /// The call's deadline elapsed before a reply arrived. A late reply is
    /// discarded by the dispatcher.
    #[error("call timed out")]
    Timeout,

    /// The codec was closed while the call was outstanding.
    #[error("transport closed")]
    TransportClosed,
}

impl Error {
    /// True for failures of the broker transport itself, as opposed to
    /// failures reported by the remote handler.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Broker(_) | Error::TransportClosed | Error::Timeout
        )
    }

    /// True for errors raised by the remote side and carried back inside a
    /// reply envelope.
    pub fn is_application(&self) -> bool {
        matches!(self, Error::Application(_) | Error::MethodNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formatting() {
        assert_eq!(
            Error::MethodNotFound("Test.Divide".to_string()).to_string(),
            "unknown method Test.Divide"
        );
        assert_eq!(Error::Application("boom".to_string()).to_string(), "boom");
        assert_eq!(Error::TransportClosed.to_string(), "transport closed");
        assert!(Error::Broker("connection refused".to_string())
            .to_string()
            .contains("connection refused"));
    }

    #[test]
    fn test_transport_classification() {
        assert!(Error::Broker("x".into()).is_transport());
        assert!(Error::TransportClosed.is_transport());
        assert!(Error::Timeout.is_transport());
        assert!(!Error::Application("x".into()).is_transport());
        assert!(!Error::Serialization("x".into()).is_transport());
    }

    #[test]
    fn test_application_classification() {
        assert!(Error::Application("x".into()).is_application());
        assert!(Error::MethodNotFound("Test.Divide".into()).is_application());
        assert!(!Error::Timeout.is_application());
        assert!(!Error::Protocol("x".into()).is_application());
    }

    #[test]
    fn test_error_is_cloneable() {
        let err = Error::Application("boom".into());
        let copy = err.clone();
        assert_eq!(err.to_string(), copy.to_string());
    }
}
