//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the system at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use std::collections::{BTreeMap, BTreeSet};

use cuechat_app::App;
use cuechat_client::{ChatWindow, Environment, Session};
use cuechat_proto::{ClientMessageId, ConversationId, MessageId};

/// Snapshot of the entire system state.
///
/// Contains observable state from one or more clients for invariant checking.
#[derive(Debug, Clone, Default)]
pub struct SystemSnapshot {
    /// Per-client state snapshots.
    pub clients: Vec<ClientSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no clients).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot with a single client.
    pub fn single(client: ClientSnapshot) -> Self {
        Self { clients: vec![client] }
    }

    /// Create a snapshot from multiple clients.
    pub fn from_clients(clients: Vec<ClientSnapshot>) -> Self {
        Self { clients }
    }
}

/// Snapshot of a single client's observable state.
#[derive(Debug, Clone, Default)]
pub struct ClientSnapshot {
    /// Client identifier.
    pub id: u64,
    /// Configured window capacity.
    pub max_windows: usize,
    /// Visible windows, oldest first.
    pub windows: Vec<ChatWindow>,
    /// Loaded conversations.
    pub conversations: BTreeMap<ConversationId, ConversationSnapshot>,
    /// Rooms the transport adapter has joined.
    pub joined: BTreeSet<ConversationId>,
    /// Focused window. Only known when captured together with an App.
    pub active_window: Option<ConversationId>,
}

impl ClientSnapshot {
    /// Capture a session.
    pub fn from_session<E: Environment>(id: u64, session: &Session<E>) -> Self {
        let conversations = session
            .loaded()
            .map(|(conversation_id, log)| {
                let snapshot = ConversationSnapshot {
                    message_ids: log.messages().iter().filter_map(|m| m.id.clone()).collect(),
                    client_ids: log
                        .messages()
                        .iter()
                        .filter_map(|m| m.client_id.clone())
                        .collect(),
                    pending: log.pending(),
                };
                (conversation_id.clone(), snapshot)
            })
            .collect();

        Self {
            id,
            max_windows: session.max_windows(),
            windows: session.windows().to_vec(),
            conversations,
            joined: session.connection().joined().cloned().collect(),
            active_window: None,
        }
    }

    /// Add the App's focus state.
    #[must_use]
    pub fn with_app(mut self, app: &App) -> Self {
        self.active_window = app.active_window().cloned();
        self
    }
}

/// Snapshot of one conversation's message log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationSnapshot {
    /// Server ids, in log order.
    pub message_ids: Vec<MessageId>,
    /// Correlation ids, in log order.
    pub client_ids: Vec<ClientMessageId>,
    /// Unconfirmed local messages.
    pub pending: usize,
}
