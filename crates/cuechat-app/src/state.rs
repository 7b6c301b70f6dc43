//! Observable application state types.
//!
//! These structures are the view model of the application: the subset of
//! session state the UI needs to decide focus, badges and status, without
//! owning any message data. Messages stay in the [`cuechat_client::Session`].

use cuechat_proto::{ConversationId, UserId};

/// Connection state as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected to server.
    Disconnected,
    /// Connection in progress (or retrying after a drop).
    Connecting,
    /// Socket is up.
    Connected,
}

/// A visible chat window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowView {
    /// Friend the window is bound to.
    pub peer: UserId,
    /// Conversation shown.
    pub conversation_id: ConversationId,
    /// Messages from others arrived while the window was not focused.
    pub unread: bool,
}

impl WindowView {
    /// Fresh window with nothing unread.
    pub fn new(peer: UserId, conversation_id: ConversationId) -> Self {
        Self { peer, conversation_id, unread: false }
    }
}
