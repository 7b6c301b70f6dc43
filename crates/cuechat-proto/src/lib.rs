//! Wire protocol for cuechat.
//!
//! Typed representations of everything that crosses the client boundary: the
//! REST bodies used for message history and conversation creation, and the
//! JSON envelopes exchanged over the persistent socket.
//!
//! Untrusted input enters through [`ServerEvent::decode`] and the serde
//! implementations of the payload types. Malformed payloads are rejected here
//! with a [`ProtocolError`] instead of propagating half-filled values into the
//! session layer.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod ids;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use ids::{ClientMessageId, ConversationId, MessageId, UserId};
pub use payloads::{
    ClientCommand, ServerEvent,
    conversation::{Conversation, ConversationKind, CreateConversationRequest},
    message::WireMessage,
};
