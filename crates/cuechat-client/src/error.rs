//! Session error types.

use cuechat_core::ConnectionError;
use cuechat_proto::ConversationId;
use thiserror::Error;

/// Errors from [`crate::Session::handle`].
///
/// None of these leave the session in a partially updated state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Operation requires a logged-in user.
    #[error("cannot {operation} while logged out")]
    NotLoggedIn {
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// Conversation has no loaded message log.
    #[error("conversation {0} is not loaded")]
    UnknownConversation(ConversationId),

    /// Refusing to send a blank message.
    #[error("message is empty")]
    EmptyMessage,

    /// Transport adapter rejected the operation.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
