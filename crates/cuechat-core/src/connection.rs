//! Transport adapter state machine.
//!
//! A single socket is shared process-wide. This module owns what must survive
//! a reconnect: the identity announced with `init_user` and the set of
//! conversation rooms joined with `join_conversation`. The socket itself
//! (and its backoff) lives in the driver, which reports connects and
//! disconnects back here.
//!
//! # State Machine
//!
//! ```text
//!                 init               socket up
//! ┌──────────────┐ ──> ┌────────────┐ ──────> ┌───────────┐
//! │ Disconnected │     │ Connecting │         │ Connected │
//! └──────────────┘ <── └────────────┘ <────── └───────────┘
//!        ↑           reset            socket lost     │
//!        └────────────────────────────────────────────┘
//!                           reset
//! ```
//!
//! # Invariants
//!
//! - Every transition into `Connected` replays `init_user` (when an identity
//!   is bound) followed by one `join_conversation` per joined room, in
//!   conversation id order.
//! - A room appears at most once in the joined set. Joining it again emits
//!   nothing.
//! - Commands are only emitted while `Connected`. Anything requested while
//!   the socket is down is recorded and sent by the next replay: identity
//!   first, then rooms, then queued outbound messages in submission order.

use std::collections::BTreeSet;

use cuechat_proto::{ClientCommand, ConversationId, UserId};

use crate::error::ConnectionError;

/// Actions returned by the connection state machine.
///
/// The driver executes these:
/// - `Send`: encode and write the command to the socket
/// - `Connect`: open the socket (the driver owns retries)
/// - `Close`: tear the socket down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Write this command to the socket.
    Send(ClientCommand),

    /// Open the socket.
    Connect,

    /// Close the socket.
    Close,
}

/// Socket lifecycle as observed by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket.
    Disconnected,
    /// Socket requested, not up yet.
    Connecting,
    /// Socket up; commands flow.
    Connected,
}

/// Transport adapter.
///
/// Pure state machine: no I/O, no clock. The caller reports socket events
/// and executes the returned actions.
#[derive(Debug, Clone)]
pub struct Connection {
    state: ConnectionState,
    user_id: Option<UserId>,
    joined: BTreeSet<ConversationId>,
    outbox: Vec<ClientCommand>,
    connects: u64,
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection {
    /// Create a disconnected adapter with no identity.
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            user_id: None,
            joined: BTreeSet::new(),
            outbox: Vec::new(),
            connects: 0,
        }
    }

    /// Current socket state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Identity bound with [`Connection::init`]. `None` before login.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Whether `conversation_id`'s room is joined.
    #[must_use]
    pub fn is_joined(&self, conversation_id: &ConversationId) -> bool {
        self.joined.contains(conversation_id)
    }

    /// Joined rooms in replay order.
    pub fn joined(&self) -> impl Iterator<Item = &ConversationId> {
        self.joined.iter()
    }

    /// Number of times the socket has come up.
    #[must_use]
    pub fn connect_count(&self) -> u64 {
        self.connects
    }

    /// Bind the local identity and announce it.
    ///
    /// Requests a socket if none exists. Re-initialising with the same
    /// identity re-sends `init_user` when connected.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::IdentityConflict` if a different identity is bound
    pub fn init(&mut self, user_id: UserId) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if let Some(current) = &self.user_id
            && *current != user_id
        {
            return Err(ConnectionError::IdentityConflict {
                current: current.clone(),
                requested: user_id,
            });
        }

        self.user_id = Some(user_id.clone());

        Ok(match self.state {
            ConnectionState::Disconnected => {
                self.state = ConnectionState::Connecting;
                vec![ConnectionAction::Connect]
            },
            ConnectionState::Connecting => vec![],
            ConnectionState::Connected => {
                vec![ConnectionAction::Send(ClientCommand::InitUser(user_id))]
            },
        })
    }

    /// Subscribe to a conversation's room.
    ///
    /// Idempotent: a room that is already joined produces no command.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::NotInitialized` if no identity is bound
    pub fn join(
        &mut self,
        conversation_id: ConversationId,
    ) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.user_id.is_none() {
            return Err(ConnectionError::NotInitialized { operation: "join" });
        }

        if !self.joined.insert(conversation_id.clone()) {
            return Ok(vec![]);
        }

        if self.state == ConnectionState::Connected {
            Ok(vec![ConnectionAction::Send(ClientCommand::JoinConversation(conversation_id))])
        } else {
            tracing::debug!(%conversation_id, "socket down, join deferred to replay");
            Ok(vec![])
        }
    }

    /// Number of commands waiting for the socket.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.outbox.len()
    }

    /// Send a command, or queue it until the socket comes back.
    pub fn send(&mut self, command: ClientCommand) -> Vec<ConnectionAction> {
        if self.state == ConnectionState::Connected {
            vec![ConnectionAction::Send(command)]
        } else {
            tracing::debug!(event = command.event_name(), "socket down, command queued");
            self.outbox.push(command);
            vec![]
        }
    }

    /// The socket came up. Replays identity and every joined room.
    pub fn on_connected(&mut self) -> Vec<ConnectionAction> {
        self.state = ConnectionState::Connected;
        self.connects += 1;

        let Some(user_id) = self.user_id.clone() else {
            return vec![];
        };

        tracing::debug!(
            %user_id,
            rooms = self.joined.len(),
            queued = self.outbox.len(),
            "replaying session on connect"
        );

        std::iter::once(ClientCommand::InitUser(user_id))
            .chain(self.joined.iter().cloned().map(ClientCommand::JoinConversation))
            .chain(self.outbox.drain(..))
            .map(ConnectionAction::Send)
            .collect()
    }

    /// The socket went away. Identity and rooms are kept for the next replay.
    pub fn on_disconnected(&mut self) {
        if self.user_id.is_some() {
            self.state = ConnectionState::Connecting;
        } else {
            self.state = ConnectionState::Disconnected;
        }
    }

    /// Forget identity and rooms (logout).
    pub fn reset(&mut self) -> Vec<ConnectionAction> {
        self.user_id = None;
        self.joined.clear();
        self.outbox.clear();

        let previous = std::mem::replace(&mut self.state, ConnectionState::Disconnected);
        if previous == ConnectionState::Disconnected {
            vec![]
        } else {
            vec![ConnectionAction::Close]
        }
    }
}
