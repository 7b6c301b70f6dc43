//! Application input events.
//!
//! This module defines [`AppEvent`], the set of inputs that drive the
//! [`crate::App`] state machine.
//!
//! Events originate from two distinct sources:
//! - User input lines and transport lifecycle changes.
//! - Session notifications translated by the [`crate::Bridge`].

use cuechat_proto::{ConversationId, UserId};

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// A line of user input.
    Line(String),

    /// Connection in progress.
    Connecting,

    /// Socket is up.
    Connected,

    /// Socket went down.
    Disconnected,

    /// Session accepted the local identity.
    LoggedIn {
        /// Local user.
        user_id: UserId,
    },

    /// Session was torn down.
    LoggedOut,

    /// A window became visible.
    WindowOpened {
        /// Friend the window is bound to.
        peer: UserId,
        /// Conversation shown.
        conversation_id: ConversationId,
    },

    /// A window was closed by the user.
    WindowClosed {
        /// Friend the window was bound to.
        peer: UserId,
        /// Conversation it showed.
        conversation_id: ConversationId,
    },

    /// A window was pushed out by a newer one.
    WindowEvicted {
        /// Friend the window was bound to.
        peer: UserId,
        /// Conversation it showed.
        conversation_id: ConversationId,
    },

    /// A message was appended to a conversation.
    MessageAppended {
        /// Conversation the message belongs to.
        conversation_id: ConversationId,
        /// Whether the local user wrote it.
        from_self: bool,
    },

    /// An optimistic message was confirmed by the server.
    MessageConfirmed {
        /// Conversation the message belongs to.
        conversation_id: ConversationId,
    },

    /// Server pushed a notification.
    Notification,

    /// A chat could not be opened.
    OpenFailed {
        /// Friend the open was for.
        peer: UserId,
        /// Failure description.
        reason: String,
    },

    /// Error occurred.
    Error {
        /// Error description.
        message: String,
    },
}
