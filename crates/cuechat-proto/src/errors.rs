//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Text frame is not a valid `{ event, data }` envelope.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Envelope named a known event but its payload did not validate.
    #[error("invalid {event} payload: {reason}")]
    InvalidPayload {
        /// Event name from the envelope.
        event: String,
        /// Why the payload was rejected.
        reason: String,
    },

    /// An identifier field was present but empty.
    #[error("empty {0} identifier")]
    EmptyIdentifier(&'static str),

    /// Serialization of an outbound value failed.
    #[error("encode failed: {0}")]
    Encode(String),
}
