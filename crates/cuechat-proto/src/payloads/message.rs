//! Message documents as delivered by the history endpoint and the
//! `receive_message` socket event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{ClientMessageId, ConversationId, MessageId, UserId, payloads::user_ref};

/// A server-confirmed message.
///
/// Field names follow the backend's document schema. `Sender` may arrive as a
/// bare id or as a populated user document; both decode to a [`UserId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Server-assigned id.
    #[serde(rename = "_id")]
    pub id: MessageId,

    /// Owning conversation.
    #[serde(rename = "ConversationId")]
    pub conversation_id: ConversationId,

    /// Author of the message.
    #[serde(rename = "Sender", deserialize_with = "user_ref")]
    pub sender: UserId,

    /// Message body. Missing or `null` decodes as empty.
    #[serde(rename = "Content", default, deserialize_with = "null_as_empty")]
    pub content: String,

    /// Creation time assigned by the server. `None` if absent.
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Correlation id of the optimistic copy this message confirms, when the
    /// server echoes one.
    #[serde(rename = "ClientId", default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ClientMessageId>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}
