//! Session state machine.
//!
//! The `Session` is the single owner of client-side chat state: which
//! conversations have visible windows, which opens are still waiting on
//! their history fetch, and the message log of every loaded conversation.
//! All mutation goes through [`Session::handle`].
//!
//! # Ordering
//!
//! Opening a chat always runs fetch history, then join the room, then show
//! the window. A history result that arrives after its open was cancelled
//! (window closed, user logged out) is discarded.

use std::collections::{HashMap, HashSet};

use chrono::DateTime;
use cuechat_core::{Connection, ConnectionAction, Environment};
use cuechat_proto::{
    ClientCommand, ClientMessageId, Conversation, ConversationId, ConversationKind, ServerEvent,
    UserId, WireMessage,
};

use crate::{
    config::SessionConfig,
    error::SessionError,
    event::{SessionAction, SessionEvent},
    message::{Ingest, Message, MessageLog},
    windows::{ChatWindow, OpenOutcome, WindowController, WindowState},
};

/// Client-side chat session.
pub struct Session<E: Environment> {
    /// Environment for correlation ids and timestamps.
    env: E,

    /// Local user. `None` while logged out.
    user_id: Option<UserId>,

    /// Transport adapter (identity, joined rooms).
    connection: Connection,

    /// Visible windows.
    windows: WindowController,

    /// Loaded message logs, including closed-but-warm conversations.
    conversations: HashMap<ConversationId, MessageLog>,

    /// Opens waiting for their history fetch.
    /// Maps conversation to the peer the window will be bound to.
    pending_opens: HashMap<ConversationId, UserId>,

    /// Peers with a conversation creation in flight.
    pending_creates: HashSet<UserId>,
}

impl<E: Environment> Session<E> {
    /// Create a logged-out session.
    pub fn new(env: E, config: SessionConfig) -> Self {
        Self {
            env,
            user_id: None,
            connection: Connection::new(),
            windows: WindowController::new(config.max_windows),
            conversations: HashMap::new(),
            pending_opens: HashMap::new(),
            pending_creates: HashSet::new(),
        }
    }

    /// Local user. `None` while logged out.
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Transport adapter state.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Visible windows, oldest first.
    pub fn windows(&self) -> &[ChatWindow] {
        self.windows.windows()
    }

    /// Maximum visible windows.
    pub fn max_windows(&self) -> usize {
        self.windows.capacity()
    }

    /// Window bound to `peer`, if visible.
    pub fn window_for(&self, peer: &UserId) -> Option<&ChatWindow> {
        self.windows.find_peer(peer)
    }

    /// Lifecycle state of the window for a conversation.
    pub fn window_state(&self, conversation_id: &ConversationId) -> WindowState {
        if self.windows.contains(conversation_id) {
            WindowState::Ready
        } else if self.pending_opens.contains_key(conversation_id) {
            WindowState::Fetching
        } else {
            WindowState::Closed
        }
    }

    /// Message log for a loaded conversation.
    pub fn log(&self, conversation_id: &ConversationId) -> Option<&MessageLog> {
        self.conversations.get(conversation_id)
    }

    /// Messages of a loaded conversation.
    pub fn messages(&self, conversation_id: &ConversationId) -> Option<&[Message]> {
        self.log(conversation_id).map(MessageLog::messages)
    }

    /// All loaded conversations.
    pub fn loaded(&self) -> impl Iterator<Item = (&ConversationId, &MessageLog)> {
        self.conversations.iter()
    }

    /// Process an event and return resulting actions.
    pub fn handle(&mut self, event: SessionEvent) -> Result<Vec<SessionAction>, SessionError> {
        match event {
            SessionEvent::Login { user_id } => self.handle_login(user_id),
            SessionEvent::Logout => Ok(self.handle_logout()),
            SessionEvent::OpenChat { peer, conversation_id } => {
                self.handle_open_chat(peer, conversation_id)
            },
            SessionEvent::StartChat { peer, kind } => self.handle_start_chat(peer, kind),
            SessionEvent::ConversationCreated { peer, conversation } => {
                self.handle_conversation_created(peer, conversation)
            },
            SessionEvent::ConversationFailed { peer, reason } => {
                Ok(self.handle_conversation_failed(peer, reason))
            },
            SessionEvent::HistoryLoaded { conversation_id, messages } => {
                self.handle_history_loaded(conversation_id, messages)
            },
            SessionEvent::HistoryFailed { conversation_id, reason } => {
                Ok(self.handle_history_failed(conversation_id, reason))
            },
            SessionEvent::CloseChat { peer } => Ok(self.handle_close_chat(&peer)),
            SessionEvent::SendMessage { conversation_id, content } => {
                self.handle_send_message(conversation_id, content)
            },
            SessionEvent::Server(event) => Ok(self.handle_server_event(event)),
            SessionEvent::TransportConnected => Ok(transport(self.connection.on_connected())),
            SessionEvent::TransportDisconnected => {
                tracing::info!("socket lost, rooms will be replayed on reconnect");
                self.connection.on_disconnected();
                Ok(vec![])
            },
        }
    }

    fn local_user(&self, operation: &'static str) -> Result<&UserId, SessionError> {
        self.user_id.as_ref().ok_or(SessionError::NotLoggedIn { operation })
    }

    fn handle_login(&mut self, user_id: UserId) -> Result<Vec<SessionAction>, SessionError> {
        let actions = self.connection.init(user_id.clone())?;
        tracing::info!(%user_id, "session started");
        self.user_id = Some(user_id);
        Ok(transport(actions))
    }

    fn handle_logout(&mut self) -> Vec<SessionAction> {
        if let Some(user_id) = self.user_id.take() {
            tracing::info!(%user_id, "session ended");
        }

        self.pending_opens.clear();
        self.pending_creates.clear();
        self.conversations.clear();

        let mut actions: Vec<_> = self
            .windows
            .clear()
            .into_iter()
            .map(|w| SessionAction::WindowClosed {
                peer: w.peer,
                conversation_id: w.conversation_id,
            })
            .collect();
        actions.extend(transport(self.connection.reset()));
        actions
    }

    fn handle_open_chat(
        &mut self,
        peer: UserId,
        conversation_id: ConversationId,
    ) -> Result<Vec<SessionAction>, SessionError> {
        self.local_user("open a chat")?;

        if self.window_state(&conversation_id) != WindowState::Closed {
            tracing::debug!(%conversation_id, "chat already open or opening");
            return Ok(vec![]);
        }

        self.pending_opens.insert(conversation_id.clone(), peer);
        Ok(vec![SessionAction::FetchHistory { conversation_id }])
    }

    fn handle_start_chat(
        &mut self,
        peer: UserId,
        kind: ConversationKind,
    ) -> Result<Vec<SessionAction>, SessionError> {
        self.local_user("start a chat")?;

        if self.windows.find_peer(&peer).is_some() || !self.pending_creates.insert(peer.clone()) {
            tracing::debug!(%peer, "chat with peer already open or being created");
            return Ok(vec![]);
        }

        Ok(vec![SessionAction::CreateConversation { peer, kind }])
    }

    fn handle_conversation_created(
        &mut self,
        peer: UserId,
        conversation: Conversation,
    ) -> Result<Vec<SessionAction>, SessionError> {
        if !self.pending_creates.remove(&peer) {
            tracing::debug!(
                %peer,
                conversation_id = %conversation.id,
                "discarding stale conversation"
            );
            return Ok(vec![]);
        }

        self.handle_open_chat(peer, conversation.id)
    }

    fn handle_conversation_failed(&mut self, peer: UserId, reason: String) -> Vec<SessionAction> {
        if !self.pending_creates.remove(&peer) {
            return vec![];
        }

        tracing::warn!(%peer, %reason, "failed to create conversation");
        vec![SessionAction::OpenFailed { peer, conversation_id: None, reason }]
    }

    fn handle_history_loaded(
        &mut self,
        conversation_id: ConversationId,
        messages: Vec<WireMessage>,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let Some(peer) = self.pending_opens.remove(&conversation_id) else {
            tracing::debug!(%conversation_id, "discarding history for cancelled open");
            return Ok(vec![]);
        };
        let me = self.local_user("load history")?.clone();

        let (history, foreign): (Vec<_>, Vec<_>) =
            messages.into_iter().partition(|m| m.conversation_id == conversation_id);
        if !foreign.is_empty() {
            tracing::warn!(
                %conversation_id,
                count = foreign.len(),
                "history contained foreign messages"
            );
        }

        match self.conversations.get_mut(&conversation_id) {
            Some(log) => log.merge_history(history, &me),
            None => {
                let log = MessageLog::from_history(history, &me);
                self.conversations.insert(conversation_id.clone(), log);
            },
        }

        let mut actions = transport(self.connection.join(conversation_id.clone())?);

        let window = ChatWindow { peer: peer.clone(), conversation_id: conversation_id.clone() };
        if let OpenOutcome::Opened { evicted } = self.windows.open(window) {
            if let Some(evicted) = evicted {
                tracing::debug!(
                    peer = %evicted.peer,
                    conversation_id = %evicted.conversation_id,
                    "window evicted"
                );
                actions.push(SessionAction::WindowEvicted {
                    peer: evicted.peer,
                    conversation_id: evicted.conversation_id,
                });
            }
            tracing::info!(%peer, %conversation_id, "chat opened");
            actions.push(SessionAction::WindowOpened { peer, conversation_id });
        }

        Ok(actions)
    }

    fn handle_history_failed(
        &mut self,
        conversation_id: ConversationId,
        reason: String,
    ) -> Vec<SessionAction> {
        let Some(peer) = self.pending_opens.remove(&conversation_id) else {
            return vec![];
        };

        tracing::warn!(%peer, %conversation_id, %reason, "failed to load history");
        vec![SessionAction::OpenFailed { peer, conversation_id: Some(conversation_id), reason }]
    }

    fn handle_close_chat(&mut self, peer: &UserId) -> Vec<SessionAction> {
        self.pending_opens.retain(|_, pending| pending != peer);
        self.pending_creates.remove(peer);

        // Room stays joined so the log keeps filling for a quick reopen.
        self.windows
            .close_peer(peer)
            .map(|w| {
                tracing::debug!(%peer, conversation_id = %w.conversation_id, "chat closed");
                SessionAction::WindowClosed { peer: w.peer, conversation_id: w.conversation_id }
            })
            .into_iter()
            .collect()
    }

    fn handle_send_message(
        &mut self,
        conversation_id: ConversationId,
        content: String,
    ) -> Result<Vec<SessionAction>, SessionError> {
        let me = self.local_user("send a message")?.clone();

        if content.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let client_id = ClientMessageId::new(format!("tmp-{:016x}", self.env.random_u64()));
        let created_at = DateTime::from_timestamp_millis(self.env.wall_clock_millis());

        let log = self
            .conversations
            .get_mut(&conversation_id)
            .ok_or_else(|| SessionError::UnknownConversation(conversation_id.clone()))?;

        let message = Message::local(
            conversation_id.clone(),
            me.clone(),
            content.clone(),
            client_id.clone(),
            created_at,
        );
        let index = log.push_local(message);

        let command = ClientCommand::SendMessage {
            conversation_id: conversation_id.clone(),
            sender: me,
            content,
            client_id,
        };

        let mut actions =
            vec![SessionAction::MessageAppended { conversation_id, index, from_self: true }];
        actions.extend(transport(self.connection.send(command)));
        Ok(actions)
    }

    fn handle_server_event(&mut self, event: ServerEvent) -> Vec<SessionAction> {
        match event {
            ServerEvent::ReceiveMessage(message) => self.handle_receive_message(message),
            ServerEvent::NewNotification(payload) => vec![SessionAction::Notification(payload)],
            ServerEvent::Unknown { event } => {
                tracing::debug!(%event, "ignoring unknown server event");
                vec![]
            },
        }
    }

    fn handle_receive_message(&mut self, message: WireMessage) -> Vec<SessionAction> {
        let Some(me) = self.user_id.as_ref() else {
            tracing::debug!("message received while logged out");
            return vec![];
        };

        let conversation_id = message.conversation_id.clone();
        let Some(log) = self.conversations.get_mut(&conversation_id) else {
            tracing::debug!(%conversation_id, "message for conversation that is not loaded");
            return vec![];
        };

        let from_self = message.sender == *me;
        match log.ingest(message, me) {
            Ingest::Duplicate => {
                tracing::debug!(%conversation_id, "duplicate message dropped");
                vec![]
            },
            Ingest::Confirmed(index) => {
                vec![SessionAction::MessageConfirmed { conversation_id, index }]
            },
            Ingest::Appended(index) => {
                vec![SessionAction::MessageAppended { conversation_id, index, from_self }]
            },
        }
    }
}

fn transport(actions: Vec<ConnectionAction>) -> Vec<SessionAction> {
    actions.into_iter().map(SessionAction::Transport).collect()
}
