//! REST requests issued on behalf of the session.
//!
//! The [`crate::Driver`] executes an [`ApiRequest`] without blocking the event
//! loop and reports the outcome later as an [`ApiResponse`]. Failures are
//! carried as strings since the session only logs and surfaces them.

use cuechat_client::SessionEvent;
use cuechat_proto::{Conversation, ConversationId, ConversationKind, UserId, WireMessage};

/// A REST request the driver must execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    /// Load a conversation's message history.
    FetchHistory {
        /// Conversation to load.
        conversation_id: ConversationId,
    },

    /// Create a conversation with a user.
    CreateConversation {
        /// Member to create it with.
        peer: UserId,
        /// Conversation kind.
        kind: ConversationKind,
    },
}

/// Outcome of an [`ApiRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Result of [`ApiRequest::FetchHistory`].
    History {
        /// Conversation the request was for.
        conversation_id: ConversationId,
        /// Messages in server order, or the failure.
        result: Result<Vec<WireMessage>, String>,
    },

    /// Result of [`ApiRequest::CreateConversation`].
    Conversation {
        /// Peer the request was for.
        peer: UserId,
        /// Created conversation, or the failure.
        result: Result<Conversation, String>,
    },
}

impl From<ApiResponse> for SessionEvent {
    fn from(response: ApiResponse) -> Self {
        match response {
            ApiResponse::History { conversation_id, result: Ok(messages) } => {
                SessionEvent::HistoryLoaded { conversation_id, messages }
            },
            ApiResponse::History { conversation_id, result: Err(reason) } => {
                SessionEvent::HistoryFailed { conversation_id, reason }
            },
            ApiResponse::Conversation { peer, result: Ok(conversation) } => {
                SessionEvent::ConversationCreated { peer, conversation }
            },
            ApiResponse::Conversation { peer, result: Err(reason) } => {
                SessionEvent::ConversationFailed { peer, reason }
            },
        }
    }
}
