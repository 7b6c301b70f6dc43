//! JSON payloads and socket envelopes.
//!
//! Every socket frame is a JSON text frame shaped `{ "event": <name>, "data":
//! <payload> }`. The event name selects the payload type. Outbound commands
//! are modelled by [`ClientCommand`], inbound events by [`ServerEvent`].
//!
//! # Invariants
//!
//! - Decoding never panics, whatever the input. Garbage yields a
//!   [`ProtocolError`], an unrecognised event name yields
//!   [`ServerEvent::Unknown`].
//! - A decoded [`ServerEvent::ReceiveMessage`] always carries non-empty
//!   message, conversation and sender identifiers.

pub mod conversation;
pub mod message;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    ClientMessageId, ConversationId, UserId,
    errors::{ProtocolError, Result},
    payloads::message::WireMessage,
};

/// Commands the client sends over the socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Announce the local user's identity on this connection. The payload
    /// is the bare id string.
    InitUser(UserId),

    /// Subscribe to a conversation's event room. The payload is the bare id
    /// string.
    JoinConversation(ConversationId),

    /// Deliver a message to a conversation.
    SendMessage {
        /// Target conversation.
        #[serde(rename = "ConversationId")]
        conversation_id: ConversationId,
        /// Local user.
        #[serde(rename = "Sender")]
        sender: UserId,
        /// Message body.
        #[serde(rename = "Content")]
        content: String,
        /// Correlation id of the optimistic local copy.
        #[serde(rename = "ClientId")]
        client_id: ClientMessageId,
    },
}

impl ClientCommand {
    /// Event name used on the wire.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::InitUser(_) => "init_user",
            Self::JoinConversation(_) => "join_conversation",
            Self::SendMessage { .. } => "send_message",
        }
    }

    /// Encode as a socket text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    /// Decode a socket text frame produced by [`ClientCommand::encode`].
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ProtocolError::MalformedEnvelope(e.to_string()))
    }
}

/// Events the server pushes over the socket.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A message was posted to a joined conversation.
    ReceiveMessage(WireMessage),

    /// Notification for badge counters. The payload is opaque to the chat
    /// core.
    NewNotification(Value),

    /// Event this client does not understand.
    Unknown {
        /// Event name from the envelope.
        event: String,
    },
}

/// Envelope as it appears on the wire, before payload validation.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    event: String,
    #[serde(default)]
    data: Value,
}

impl ServerEvent {
    /// Wire name of [`ServerEvent::ReceiveMessage`].
    pub const RECEIVE_MESSAGE: &'static str = "receive_message";

    /// Wire name of [`ServerEvent::NewNotification`].
    pub const NEW_NOTIFICATION: &'static str = "new_notification";

    /// Decode a socket text frame.
    pub fn decode(text: &str) -> Result<Self> {
        let RawEnvelope { event, data } = serde_json::from_str(text)
            .map_err(|e| ProtocolError::MalformedEnvelope(e.to_string()))?;

        match event.as_str() {
            Self::RECEIVE_MESSAGE => serde_json::from_value(data)
                .map(Self::ReceiveMessage)
                .map_err(|e| ProtocolError::InvalidPayload { event, reason: e.to_string() }),
            Self::NEW_NOTIFICATION => Ok(Self::NewNotification(data)),
            _ => Ok(Self::Unknown { event }),
        }
    }

    /// Encode as a socket text frame.
    pub fn encode(&self) -> Result<String> {
        let (event, data) = match self {
            Self::ReceiveMessage(message) => (
                Self::RECEIVE_MESSAGE,
                serde_json::to_value(message).map_err(|e| ProtocolError::Encode(e.to_string()))?,
            ),
            Self::NewNotification(data) => (Self::NEW_NOTIFICATION, data.clone()),
            Self::Unknown { event } => (event.as_str(), Value::Null),
        };

        serde_json::to_string(&serde_json::json!({ "event": event, "data": data }))
            .map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}

/// A user reference as the backend sends it: either a bare id or a populated
/// user document carrying `_id`.
#[derive(Deserialize)]
#[serde(untagged)]
enum UserRef {
    Id(UserId),
    Populated {
        #[serde(rename = "_id")]
        id: UserId,
    },
}

impl UserRef {
    fn into_id(self) -> UserId {
        match self {
            Self::Id(id) | Self::Populated { id } => id,
        }
    }
}

pub(crate) fn user_ref<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<UserId, D::Error> {
    UserRef::deserialize(deserializer).map(UserRef::into_id)
}

pub(crate) fn user_refs<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<UserId>, D::Error> {
    Vec::<UserRef>::deserialize(deserializer)
        .map(|refs| refs.into_iter().map(UserRef::into_id).collect())
}
