//! In-memory backend for simulation.
//!
//! `SimServer` stands in for both collaborators the client talks to: the REST
//! API (history and conversation creation) and the socket server (identity,
//! room membership, message fan-out). Each connected client is addressed by a
//! [`ClientKey`]. Server-side socket state is per connection, so a reconnect
//! starts with no identity and no rooms, exactly like the real server.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex},
};

use chrono::DateTime;
use cuechat_app::{ApiRequest, ApiResponse};
use cuechat_proto::{
    ClientCommand, ClientMessageId, Conversation, ConversationId, ConversationKind, MessageId,
    ServerEvent, UserId, WireMessage,
};

/// Identifies one simulated client connection.
pub type ClientKey = u64;

/// Server shared between several drivers.
pub type SharedSimServer = Arc<Mutex<SimServer>>;

/// Create a server that several [`crate::SimDriver`]s can share.
pub fn create_shared_server() -> SharedSimServer {
    Arc::new(Mutex::new(SimServer::new()))
}

/// Server creation time of the first message (2024-01-01T00:00:00Z).
const FIRST_MESSAGE_MILLIS: i64 = 1_704_067_200_000;

struct Room {
    conversation: Conversation,
    messages: Vec<WireMessage>,
}

#[derive(Default)]
struct Socket {
    user: Option<UserId>,
    rooms: BTreeSet<ConversationId>,
    inbox: VecDeque<ServerEvent>,
}

/// Simulated REST and socket backend.
#[derive(Default)]
pub struct SimServer {
    rooms: BTreeMap<ConversationId, Room>,
    sockets: HashMap<ClientKey, Socket>,
    failing_history: HashSet<ConversationId>,
    next_id: u64,
}

impl SimServer {
    /// Empty server.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Create a conversation with a generated id.
    pub fn create_conversation(
        &mut self,
        members: Vec<UserId>,
        kind: ConversationKind,
    ) -> Conversation {
        let id = ConversationId::new(format!("conv-{}", self.next_id()));
        self.insert_conversation(Conversation { id, kind, members })
    }

    /// Register a conversation with a known id.
    pub fn add_conversation(&mut self, id: impl Into<ConversationId>, members: Vec<UserId>) {
        let conversation = Conversation { id: id.into(), kind: ConversationKind::Single, members };
        self.insert_conversation(conversation);
    }

    fn insert_conversation(&mut self, conversation: Conversation) -> Conversation {
        let room = Room { conversation: conversation.clone(), messages: Vec::new() };
        self.rooms.insert(conversation.id.clone(), room);
        conversation
    }

    /// Make history requests for a conversation fail.
    pub fn fail_history(&mut self, conversation_id: impl Into<ConversationId>) {
        self.failing_history.insert(conversation_id.into());
    }

    /// Store a message and fan it out to every socket joined to the room.
    ///
    /// Returns `None` if the conversation does not exist.
    pub fn post(
        &mut self,
        conversation_id: &ConversationId,
        sender: UserId,
        content: impl Into<String>,
        client_id: Option<ClientMessageId>,
    ) -> Option<WireMessage> {
        if !self.rooms.contains_key(conversation_id) {
            tracing::debug!(%conversation_id, "post to unknown conversation");
            return None;
        }

        let n = self.next_id();
        let offset = i64::try_from(n).unwrap_or(i64::MAX).saturating_mul(1_000);
        let message = WireMessage {
            id: MessageId::new(format!("msg-{n}")),
            conversation_id: conversation_id.clone(),
            sender,
            content: content.into(),
            created_at: DateTime::from_timestamp_millis(
                FIRST_MESSAGE_MILLIS.saturating_add(offset),
            ),
            client_id,
        };

        if let Some(room) = self.rooms.get_mut(conversation_id) {
            room.messages.push(message.clone());
        }
        for socket in self.sockets.values_mut() {
            if socket.rooms.contains(conversation_id) {
                socket.inbox.push_back(ServerEvent::ReceiveMessage(message.clone()));
            }
        }
        Some(message)
    }

    /// Deliver a notification to one client.
    pub fn notify(&mut self, key: ClientKey, payload: serde_json::Value) {
        if let Some(socket) = self.sockets.get_mut(&key) {
            socket.inbox.push_back(ServerEvent::NewNotification(payload));
        }
    }

    /// Deliver a raw event to one client.
    pub fn push_event(&mut self, key: ClientKey, event: ServerEvent) {
        if let Some(socket) = self.sockets.get_mut(&key) {
            socket.inbox.push_back(event);
        }
    }

    /// Stored messages of a conversation, in server order.
    pub fn messages(&self, conversation_id: &ConversationId) -> &[WireMessage] {
        self.rooms.get(conversation_id).map_or(&[], |room| room.messages.as_slice())
    }

    /// Conversation record.
    pub fn conversation(&self, conversation_id: &ConversationId) -> Option<&Conversation> {
        self.rooms.get(conversation_id).map(|room| &room.conversation)
    }

    /// Open a fresh socket for `key`, replacing any previous one.
    pub fn connect(&mut self, key: ClientKey) {
        self.sockets.insert(key, Socket::default());
    }

    /// Close the socket for `key`. Undelivered events are lost.
    pub fn disconnect(&mut self, key: ClientKey) {
        self.sockets.remove(&key);
    }

    /// Whether `key` has an open socket.
    pub fn is_connected(&self, key: ClientKey) -> bool {
        self.sockets.contains_key(&key)
    }

    /// Identity announced on the socket.
    pub fn identity(&self, key: ClientKey) -> Option<&UserId> {
        self.sockets.get(&key).and_then(|socket| socket.user.as_ref())
    }

    /// Rooms the socket has joined.
    pub fn joined(&self, key: ClientKey) -> BTreeSet<ConversationId> {
        self.sockets.get(&key).map(|socket| socket.rooms.clone()).unwrap_or_default()
    }

    /// Apply a socket command from `key`.
    pub fn handle_command(&mut self, key: ClientKey, command: ClientCommand) {
        let Some(socket) = self.sockets.get_mut(&key) else {
            tracing::debug!(key, event = command.event_name(), "command on closed socket");
            return;
        };

        match command {
            ClientCommand::InitUser(user_id) => socket.user = Some(user_id),
            ClientCommand::JoinConversation(conversation_id) => {
                if socket.user.is_none() {
                    tracing::debug!(key, %conversation_id, "join before init ignored");
                    return;
                }
                socket.rooms.insert(conversation_id);
            },
            ClientCommand::SendMessage { conversation_id, sender, content, client_id } => {
                self.post(&conversation_id, sender, content, Some(client_id));
            },
        }
    }

    /// Drain events queued for `key`.
    pub fn take_events(&mut self, key: ClientKey) -> Vec<ServerEvent> {
        self.sockets
            .get_mut(&key)
            .map(|socket| socket.inbox.drain(..).collect())
            .unwrap_or_default()
    }

    /// Answer a REST request.
    pub fn handle_request(&mut self, request: &ApiRequest) -> ApiResponse {
        match request {
            ApiRequest::FetchHistory { conversation_id } => {
                let result = if self.failing_history.contains(conversation_id) {
                    Err("history unavailable".to_owned())
                } else if let Some(room) = self.rooms.get(conversation_id) {
                    Ok(room.messages.clone())
                } else {
                    Err(format!("conversation {conversation_id} not found"))
                };
                ApiResponse::History { conversation_id: conversation_id.clone(), result }
            },
            ApiRequest::CreateConversation { peer, kind } => {
                let conversation = self.create_conversation(vec![peer.clone()], *kind);
                ApiResponse::Conversation { peer: peer.clone(), result: Ok(conversation) }
            },
        }
    }
}
