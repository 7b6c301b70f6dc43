//! Window controller.
//!
//! Bounds the number of simultaneously visible chat windows. Eviction is
//! FIFO by open order: when a window is opened past capacity, the window at
//! index 0 (the least recently opened) is removed, regardless of how
//! recently it saw activity.

use cuechat_proto::{ConversationId, UserId};

/// A visible chat window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChatWindow {
    /// Friend the window is bound to.
    pub peer: UserId,
    /// Conversation shown in the window.
    pub conversation_id: ConversationId,
}

/// Lifecycle of a window for a given conversation.
///
/// ```text
/// Closed ──open──> Fetching ──history──> Ready ──close/evict──> Closed
///                     │
///                     └──fetch failed / closed──> Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    /// Not visible, nothing in flight.
    Closed,
    /// History fetch in flight.
    Fetching,
    /// Visible.
    Ready,
}

/// Result of [`WindowController::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Conversation already had a window. Nothing changed.
    AlreadyOpen,
    /// Window added, possibly evicting the oldest one.
    Opened {
        /// Window pushed out to stay within capacity.
        evicted: Option<ChatWindow>,
    },
}

/// Bounded, insertion-ordered list of visible windows.
#[derive(Debug, Clone)]
pub struct WindowController {
    capacity: usize,
    windows: Vec<ChatWindow>,
}

impl WindowController {
    /// Create a controller. A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, windows: Vec::with_capacity(capacity) }
    }

    /// Maximum visible windows.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Visible windows, oldest first.
    pub fn windows(&self) -> &[ChatWindow] {
        &self.windows
    }

    /// Whether a window shows this conversation.
    pub fn contains(&self, conversation_id: &ConversationId) -> bool {
        self.windows.iter().any(|w| w.conversation_id == *conversation_id)
    }

    /// Window bound to this peer, if any.
    pub fn find_peer(&self, peer: &UserId) -> Option<&ChatWindow> {
        self.windows.iter().find(|w| w.peer == *peer)
    }

    /// Add a window at the newest position.
    pub fn open(&mut self, window: ChatWindow) -> OpenOutcome {
        if self.contains(&window.conversation_id) {
            return OpenOutcome::AlreadyOpen;
        }

        self.windows.push(window);
        let evicted = (self.windows.len() > self.capacity).then(|| self.windows.remove(0));
        OpenOutcome::Opened { evicted }
    }

    /// Remove the first window bound to `peer`.
    pub fn close_peer(&mut self, peer: &UserId) -> Option<ChatWindow> {
        let index = self.windows.iter().position(|w| w.peer == *peer)?;
        Some(self.windows.remove(index))
    }

    /// Remove every window, oldest first.
    pub fn clear(&mut self) -> Vec<ChatWindow> {
        std::mem::take(&mut self.windows)
    }
}
