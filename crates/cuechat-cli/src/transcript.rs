//! Scrolling transcript rendering.
//!
//! Each render prints only what changed since the previous one: new messages
//! in open windows, the window bar, connection changes, and status lines.
//! Confirmation of an optimistic message does not reprint it.

use std::collections::HashMap;

use cuechat_app::{App, ConnectionState};
use cuechat_client::{ConversationId, Environment, Message, Session, UserId};

/// Incremental renderer for a line-mode terminal.
#[derive(Debug, Default)]
pub struct Transcript {
    shown: HashMap<ConversationId, usize>,
    connection: Option<ConnectionState>,
    bar: String,
    status: Option<String>,
    notifications: usize,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines to print for the current state.
    pub fn update<E: Environment>(&mut self, app: &App, session: &Session<E>) -> Vec<String> {
        let mut lines = Vec::new();

        let state = app.connection_state();
        if self.connection != Some(state) {
            self.connection = Some(state);
            lines.push(format!("* {}", describe(state)));
        }

        self.shown.retain(|id, _| app.windows().iter().any(|w| &w.conversation_id == id));
        for window in app.windows() {
            let Some(messages) = session.messages(&window.conversation_id) else {
                continue;
            };
            let shown = self.shown.entry(window.conversation_id.clone()).or_default();
            lines.extend(messages.iter().skip(*shown).map(|m| format_message(&window.peer, m)));
            *shown = messages.len();
        }

        let bar = window_bar(app);
        if bar != self.bar {
            lines.push(bar.clone());
            self.bar = bar;
        }

        if app.notifications() > self.notifications {
            let fresh = app.notifications() - self.notifications;
            lines.push(format!("* {fresh} new notification(s)"));
        }
        self.notifications = app.notifications();

        let status = app.status_message().map(str::to_owned);
        if status != self.status {
            if let Some(status) = &status {
                lines.push(format!("* {status}"));
            }
            self.status = status;
        }

        lines
    }
}

fn describe(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Disconnected => "offline",
        ConnectionState::Connecting => "connecting...",
        ConnectionState::Connected => "online",
    }
}

fn format_message(peer: &UserId, message: &Message) -> String {
    let time = message
        .created_at
        .map_or_else(|| "--:--".to_owned(), |at| at.format("%H:%M").to_string());
    let author = if message.from_self { "you" } else { message.sender.as_str() };
    let marker = if message.is_pending() { " (sending)" } else { "" };
    format!("[{time}] {peer} | {author}: {}{marker}", message.content)
}

/// `chats: [bob] carol*` with the active window bracketed and unread ones
/// starred.
fn window_bar(app: &App) -> String {
    if app.windows().is_empty() {
        return "chats: none".to_owned();
    }

    let names: Vec<String> = app
        .windows()
        .iter()
        .map(|w| {
            let unread = if w.unread { "*" } else { "" };
            if app.active_window() == Some(&w.conversation_id) {
                format!("[{}]{unread}", w.peer)
            } else {
                format!("{}{unread}", w.peer)
            }
        })
        .collect();
    format!("chats: {}", names.join(" "))
}
