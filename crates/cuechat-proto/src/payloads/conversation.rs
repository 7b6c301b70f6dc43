//! Conversation documents and the conversation creation request.

use serde::{Deserialize, Serialize};

use crate::{ConversationId, UserId, payloads::user_refs};

/// Conversation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    /// One-to-one chat.
    #[default]
    Single,
    /// Group chat.
    Group,
}

/// A conversation as returned by the backend.
///
/// The client only ever references conversations by id; the remaining fields
/// are informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Server-side conversation id.
    #[serde(rename = "_id")]
    pub id: ConversationId,

    /// Conversation kind. Defaults to single when absent.
    #[serde(rename = "Type", default)]
    pub kind: ConversationKind,

    /// Member identities in server order.
    #[serde(rename = "Members", default, deserialize_with = "user_refs")]
    pub members: Vec<UserId>,
}

/// Body of `POST /message/create-conversation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    /// Members to include besides the authenticated user.
    #[serde(rename = "MemberIds")]
    pub member_ids: Vec<UserId>,

    /// Conversation kind.
    #[serde(rename = "Type")]
    pub kind: ConversationKind,
}
