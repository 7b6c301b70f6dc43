//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::HashSet;

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// Never more windows than the configured maximum.
pub struct WindowCapacity;

impl Invariant for WindowCapacity {
    fn name(&self) -> &'static str {
        "WindowCapacity"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if client.windows.len() > client.max_windows {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "client {}: {} windows open, max {}",
                        client.id,
                        client.windows.len(),
                        client.max_windows
                    ),
                });
            }
        }
        Ok(())
    }
}

/// A conversation appears in at most one window.
pub struct UniqueConversationWindows;

impl Invariant for UniqueConversationWindows {
    fn name(&self) -> &'static str {
        "UniqueConversationWindows"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            let mut seen = HashSet::new();
            for window in &client.windows {
                if !seen.insert(&window.conversation_id) {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "client {}: conversation {} open twice",
                            client.id, window.conversation_id
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Every open window's conversation has a loaded message log.
///
/// Windows are only pushed after history is registered, so an open window
/// without a log means an update bypassed the fetch.
pub struct OpenWindowsHaveHistory;

impl Invariant for OpenWindowsHaveHistory {
    fn name(&self) -> &'static str {
        "OpenWindowsHaveHistory"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            for window in &client.windows {
                if !client.conversations.contains_key(&window.conversation_id) {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "client {}: window for {} has no message log",
                            client.id, window.conversation_id
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// No two messages in a conversation share a server id or correlation id.
pub struct NoDuplicateMessages;

impl Invariant for NoDuplicateMessages {
    fn name(&self) -> &'static str {
        "NoDuplicateMessages"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            for (conversation_id, log) in &client.conversations {
                let mut ids = HashSet::new();
                if let Some(dup) = log.message_ids.iter().find(|id| !ids.insert(*id)) {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "client {}: message {dup} twice in {conversation_id}",
                            client.id
                        ),
                    });
                }

                let mut client_ids = HashSet::new();
                if let Some(dup) = log.client_ids.iter().find(|id| !client_ids.insert(*id)) {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "client {}: correlation id {dup} twice in {conversation_id}",
                            client.id
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Every open window's room is joined on the transport.
pub struct JoinedBeforeOpen;

impl Invariant for JoinedBeforeOpen {
    fn name(&self) -> &'static str {
        "JoinedBeforeOpen"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            for window in &client.windows {
                if !client.joined.contains(&window.conversation_id) {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "client {}: window for {} but room not joined",
                            client.id, window.conversation_id
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// The focused window is one of the open windows.
pub struct ActiveWindowOpen;

impl Invariant for ActiveWindowOpen {
    fn name(&self) -> &'static str {
        "ActiveWindowOpen"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for client in &state.clients {
            if let Some(active) = &client.active_window
                && !client.windows.iter().any(|w| &w.conversation_id == active)
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("client {}: active window {active} is not open", client.id),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cuechat_client::{ChatWindow, ConversationId, MessageId, UserId};

    use super::*;
    use crate::{ClientSnapshot, ConversationSnapshot};

    fn window(conversation: &str) -> ChatWindow {
        ChatWindow { peer: UserId::new("u2"), conversation_id: ConversationId::new(conversation) }
    }

    fn client() -> ClientSnapshot {
        ClientSnapshot { max_windows: 3, ..ClientSnapshot::default() }
    }

    #[test]
    fn capacity_violation_detected() {
        let mut snapshot = client();
        snapshot.windows = vec![window("a"), window("b"), window("c"), window("d")];

        assert!(WindowCapacity.check(&SystemSnapshot::single(snapshot)).is_err());
    }

    #[test]
    fn duplicate_window_detected() {
        let mut snapshot = client();
        snapshot.windows = vec![window("a"), window("a")];

        assert!(UniqueConversationWindows.check(&SystemSnapshot::single(snapshot)).is_err());
    }

    #[test]
    fn window_without_log_or_join_detected() {
        let mut snapshot = client();
        snapshot.windows = vec![window("a")];
        let state = SystemSnapshot::single(snapshot);

        assert!(OpenWindowsHaveHistory.check(&state).is_err());
        assert!(JoinedBeforeOpen.check(&state).is_err());
    }

    #[test]
    fn duplicate_message_detected() {
        let mut snapshot = client();
        snapshot.conversations.insert(ConversationId::new("a"), ConversationSnapshot {
            message_ids: vec![MessageId::new("m1"), MessageId::new("m1")],
            ..ConversationSnapshot::default()
        });

        assert!(NoDuplicateMessages.check(&SystemSnapshot::single(snapshot)).is_err());
    }

    #[test]
    fn dangling_focus_detected() {
        let mut snapshot = client();
        snapshot.active_window = Some(ConversationId::new("a"));

        assert!(ActiveWindowOpen.check(&SystemSnapshot::single(snapshot)).is_err());
    }
}
