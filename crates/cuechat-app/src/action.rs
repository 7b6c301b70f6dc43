//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

use cuechat_proto::{ConversationId, ConversationKind, UserId};

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Log in as a user.
    Login {
        /// Local user.
        user_id: UserId,
    },

    /// Log out and tear the session down.
    Logout,

    /// Open a window for an existing conversation.
    OpenChat {
        /// Friend the window is bound to.
        peer: UserId,
        /// Conversation to open.
        conversation_id: ConversationId,
    },

    /// Create a conversation with a user and open it.
    StartChat {
        /// User to chat with.
        peer: UserId,
        /// Conversation kind.
        kind: ConversationKind,
    },

    /// Close the window bound to a friend.
    CloseChat {
        /// Friend whose window to close.
        peer: UserId,
    },

    /// Send a message.
    SendMessage {
        /// Target conversation.
        conversation_id: ConversationId,
        /// Message body.
        content: String,
    },
}
