//! Per-conversation message logs.
//!
//! A [`MessageLog`] is append-only from the client's point of view. Server
//! order is trusted and never re-sorted. Optimistic local messages are
//! confirmed in place when their server copy arrives, so they keep their
//! position relative to messages from other participants.

use chrono::{DateTime, Utc};
use cuechat_proto::{ClientMessageId, ConversationId, MessageId, UserId, WireMessage};

/// A message as the client sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Server id. `None` until the server confirms an optimistic send.
    pub id: Option<MessageId>,
    /// Correlation id of an optimistic send. `None` for messages that
    /// originated elsewhere.
    pub client_id: Option<ClientMessageId>,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Author.
    pub sender: UserId,
    /// Body.
    pub content: String,
    /// Creation time (server time once confirmed).
    pub created_at: Option<DateTime<Utc>>,
    /// Whether the local user wrote it.
    pub from_self: bool,
}

impl Message {
    /// Tag a server message relative to the local user.
    pub fn from_wire(wire: WireMessage, local_user: &UserId) -> Self {
        let from_self = wire.sender == *local_user;
        Self {
            id: Some(wire.id),
            client_id: wire.client_id,
            conversation_id: wire.conversation_id,
            sender: wire.sender,
            content: wire.content,
            created_at: wire.created_at,
            from_self,
        }
    }

    /// Optimistic message written by the local user.
    pub fn local(
        conversation_id: ConversationId,
        sender: UserId,
        content: String,
        client_id: ClientMessageId,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: None,
            client_id: Some(client_id),
            conversation_id,
            sender,
            content,
            created_at,
            from_self: true,
        }
    }

    /// Sent locally and not yet confirmed by the server.
    pub fn is_pending(&self) -> bool {
        self.id.is_none()
    }

    fn confirm(&mut self, wire: WireMessage) {
        self.id = Some(wire.id);
        self.content = wire.content;
        if wire.created_at.is_some() {
            self.created_at = wire.created_at;
        }
    }
}

/// Outcome of feeding a server message into a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    /// Already present; nothing changed.
    Duplicate,
    /// Confirmed the optimistic message at this index.
    Confirmed(usize),
    /// Appended at this index.
    Appended(usize),
}

/// Ordered message sequence for one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    /// Build a log from fetched history.
    pub fn from_history(history: Vec<WireMessage>, local_user: &UserId) -> Self {
        let mut log = Self::default();
        for wire in history {
            log.ingest(wire, local_user);
        }
        log
    }

    /// Messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of optimistic messages awaiting confirmation.
    pub fn pending(&self) -> usize {
        self.messages.iter().filter(|m| m.is_pending()).count()
    }

    /// Whether a message with this server id is present.
    pub fn contains_id(&self, id: &MessageId) -> bool {
        self.messages.iter().any(|m| m.id.as_ref() == Some(id))
    }

    /// Whether a confirmed message already carries this correlation id.
    fn contains_confirmed(&self, client_id: &ClientMessageId) -> bool {
        self.messages.iter().any(|m| !m.is_pending() && m.client_id.as_ref() == Some(client_id))
    }

    /// Append an optimistic local message. Returns its index.
    pub fn push_local(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    /// Feed a server message.
    ///
    /// Matching order: server id (duplicate delivery), then the echoed
    /// correlation id, then, only when the server echoed no correlation id,
    /// the oldest pending local message with identical content. A correlation
    /// id that was already confirmed marks a redelivered echo.
    pub fn ingest(&mut self, wire: WireMessage, local_user: &UserId) -> Ingest {
        if self.contains_id(&wire.id)
            || wire.client_id.as_ref().is_some_and(|c| self.contains_confirmed(c))
        {
            return Ingest::Duplicate;
        }

        let pending = match &wire.client_id {
            Some(client_id) => self
                .messages
                .iter()
                .position(|m| m.is_pending() && m.client_id.as_ref() == Some(client_id)),
            None if wire.sender == *local_user => self
                .messages
                .iter()
                .position(|m| m.is_pending() && m.from_self && m.content == wire.content),
            None => None,
        };

        if let Some(index) = pending {
            self.messages[index].confirm(wire);
            return Ingest::Confirmed(index);
        }

        self.messages.push(Message::from_wire(wire, local_user));
        Ingest::Appended(self.messages.len() - 1)
    }

    /// Reconcile freshly fetched history with what the log already holds.
    ///
    /// The result is the history in server order followed by every known
    /// message the history did not include (live messages that raced the
    /// fetch, unconfirmed local sends). Local sends the history confirms are
    /// folded into their server copy. History carries no correlation ids, so
    /// a send is matched by content only against entries past the last
    /// message the log already knew.
    pub fn merge_history(&mut self, history: Vec<WireMessage>, local_user: &UserId) {
        let previous = std::mem::take(&mut self.messages);
        let (mut pending, known): (Vec<_>, Vec<_>) =
            previous.into_iter().partition(Message::is_pending);

        let fresh_from = history
            .iter()
            .rposition(|wire| known.iter().any(|m| m.id.as_ref() == Some(&wire.id)))
            .map_or(0, |i| i + 1);

        for (i, wire) in history.into_iter().enumerate() {
            if self.contains_id(&wire.id) {
                continue;
            }
            if let Some(message) = known.iter().find(|m| m.id.as_ref() == Some(&wire.id)) {
                self.messages.push(message.clone());
                continue;
            }

            let matched = match &wire.client_id {
                Some(client_id) => {
                    pending.iter().position(|m| m.client_id.as_ref() == Some(client_id))
                },
                None if i >= fresh_from && wire.sender == *local_user => {
                    pending.iter().position(|m| m.from_self && m.content == wire.content)
                },
                None => None,
            };

            match matched {
                Some(index) => {
                    let mut message = pending.remove(index);
                    message.confirm(wire);
                    self.messages.push(message);
                },
                None => {
                    self.ingest(wire, local_user);
                },
            }
        }

        let live: Vec<_> = known
            .into_iter()
            .filter(|m| m.id.as_ref().is_some_and(|id| !self.contains_id(id)))
            .filter(|m| m.client_id.as_ref().is_none_or(|c| !self.contains_confirmed(c)))
            .collect();

        self.messages.extend(live);
        self.messages.extend(pending);
    }
}
