//! Session events and actions.

use cuechat_core::ConnectionAction;
use cuechat_proto::{
    Conversation, ConversationId, ConversationKind, ServerEvent, UserId, WireMessage,
};

/// Events the caller feeds into the session.
///
/// The caller is responsible for:
/// - Forwarding user intents (open, close, send)
/// - Executing REST requests and feeding their results back
/// - Forwarding socket events and socket lifecycle changes
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Local user identity became available.
    Login {
        /// Local user.
        user_id: UserId,
    },

    /// Local user logged out. Tears the whole session down.
    Logout,

    /// Open a chat window for an existing conversation.
    OpenChat {
        /// Friend the window is bound to.
        peer: UserId,
        /// Conversation to show.
        conversation_id: ConversationId,
    },

    /// Open a chat with a user who has no conversation yet.
    StartChat {
        /// User to chat with.
        peer: UserId,
        /// Conversation kind to create.
        kind: ConversationKind,
    },

    /// `CreateConversation` request succeeded.
    ConversationCreated {
        /// Peer the request was made for.
        peer: UserId,
        /// Created conversation.
        conversation: Conversation,
    },

    /// `CreateConversation` request failed.
    ConversationFailed {
        /// Peer the request was made for.
        peer: UserId,
        /// Failure description.
        reason: String,
    },

    /// `FetchHistory` request succeeded.
    HistoryLoaded {
        /// Conversation the history belongs to.
        conversation_id: ConversationId,
        /// Messages in server order.
        messages: Vec<WireMessage>,
    },

    /// `FetchHistory` request failed.
    HistoryFailed {
        /// Conversation the request was for.
        conversation_id: ConversationId,
        /// Failure description.
        reason: String,
    },

    /// Close the window bound to `peer`.
    CloseChat {
        /// Friend whose window to close.
        peer: UserId,
    },

    /// Send a message to a loaded conversation.
    SendMessage {
        /// Target conversation.
        conversation_id: ConversationId,
        /// Message body.
        content: String,
    },

    /// Event pushed by the server over the socket.
    Server(ServerEvent),

    /// Socket came up (first connect or reconnect).
    TransportConnected,

    /// Socket went down.
    TransportDisconnected,
}

/// Actions the session produces for the caller to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Socket work: send a command, connect, or close.
    Transport(ConnectionAction),

    /// Fetch message history (`GET /message/messages/{id}`) and feed the
    /// result back as `HistoryLoaded` or `HistoryFailed`.
    FetchHistory {
        /// Conversation to fetch.
        conversation_id: ConversationId,
    },

    /// Create a conversation (`POST /message/create-conversation`) and feed
    /// the result back as `ConversationCreated` or `ConversationFailed`.
    CreateConversation {
        /// Member to create the conversation with.
        peer: UserId,
        /// Conversation kind.
        kind: ConversationKind,
    },

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

    /// A message was appended to a conversation's log.
    MessageAppended {
        /// Conversation.
        conversation_id: ConversationId,
        /// Position in the log.
        index: usize,
        /// Whether the local user wrote it.
        from_self: bool,
    },

    /// An optimistic message was confirmed by the server in place.
    MessageConfirmed {
        /// Conversation.
        conversation_id: ConversationId,
        /// Position in the log.
        index: usize,
    },

    /// A notification arrived for badge counters.
    Notification(serde_json::Value),

    /// Opening a chat failed. No window was created.
    OpenFailed {
        /// Friend the window would have been bound to.
        peer: UserId,
        /// Conversation, if one was known.
        conversation_id: Option<ConversationId>,
        /// Failure description.
        reason: String,
    },
}
