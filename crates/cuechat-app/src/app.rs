//! Application state machine.
//!
//! This module defines the [`App`] state machine, which manages the interactive
//! state of the application completely decoupled from I/O and session
//! mechanics.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Parses input lines into commands.
//! - Mirrors the session's visible windows and tracks which one is focused.
//! - Tracks unread flags, the notification badge and a transient status line.
//!
//! # Invariants
//!
//! - The focused window is always one of the mirrored windows.

use cuechat_proto::{ConversationId, ConversationKind, UserId};

use crate::{AppAction, AppEvent, Command, ConnectionState, InputError, WindowView};

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Connection state.
    state: ConnectionState,
    /// Local user. `None` while logged out.
    user_id: Option<UserId>,
    /// Visible windows, oldest first, mirrored from the session.
    windows: Vec<WindowView>,
    /// Focused window. `None` if no window is open.
    active: Option<ConversationId>,
    /// Notifications received since login.
    notifications: usize,
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create a logged-out App.
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            user_id: None,
            windows: Vec::new(),
            active: None,
            notifications: 0,
            status_message: None,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Line(line) => self.handle_line(&line),
            AppEvent::Connecting => {
                self.state = ConnectionState::Connecting;
                vec![AppAction::Render]
            },
            AppEvent::Connected => {
                self.state = ConnectionState::Connected;
                vec![AppAction::Render]
            },
            AppEvent::Disconnected => {
                self.state = if self.user_id.is_some() {
                    ConnectionState::Connecting
                } else {
                    ConnectionState::Disconnected
                };
                vec![AppAction::Render]
            },
            AppEvent::LoggedIn { user_id } => {
                self.status_message = Some(format!("Logged in as {user_id}"));
                self.user_id = Some(user_id);
                vec![AppAction::Render]
            },
            AppEvent::LoggedOut => {
                self.state = ConnectionState::Disconnected;
                self.user_id = None;
                self.windows.clear();
                self.active = None;
                self.notifications = 0;
                self.status_message = Some("Logged out".into());
                vec![AppAction::Render]
            },
            AppEvent::WindowOpened { peer, conversation_id } => {
                if self.active.is_none() {
                    self.active = Some(conversation_id.clone());
                }
                self.windows.push(WindowView::new(peer, conversation_id));
                vec![AppAction::Render]
            },
            AppEvent::WindowClosed { conversation_id, .. } => {
                self.remove_window(&conversation_id);
                vec![AppAction::Render]
            },
            AppEvent::WindowEvicted { peer, conversation_id } => {
                self.remove_window(&conversation_id);
                self.status_message = Some(format!("Closed chat with {peer} to make room"));
                vec![AppAction::Render]
            },
            AppEvent::MessageAppended { conversation_id, from_self } => {
                if !from_self && self.active.as_ref() != Some(&conversation_id) {
                    for window in &mut self.windows {
                        if window.conversation_id == conversation_id {
                            window.unread = true;
                        }
                    }
                }
                vec![AppAction::Render]
            },
            AppEvent::MessageConfirmed { .. } => vec![AppAction::Render],
            AppEvent::Notification => {
                self.notifications += 1;
                vec![AppAction::Render]
            },
            AppEvent::OpenFailed { peer, reason } => {
                self.status_message = Some(format!("Could not open chat with {peer}: {reason}"));
                vec![AppAction::Render]
            },
            AppEvent::Error { message } => {
                self.status_message = Some(format!("Error: {message}"));
                vec![AppAction::Render]
            },
        }
    }

    fn handle_line(&mut self, line: &str) -> Vec<AppAction> {
        match line.parse::<Command>() {
            Ok(Command::Login { user_id }) => self.login(user_id),
            Ok(Command::Logout) => self.logout(),
            Ok(Command::Open { peer, conversation_id }) => self.open_chat(peer, conversation_id),
            Ok(Command::Start { peer, kind }) => self.start_chat(peer, kind),
            Ok(Command::Close { peer }) => self.close_chat(peer),
            Ok(Command::Focus { peer }) => {
                if !self.focus_peer(&peer) {
                    self.status_message = Some(format!("No open chat with {peer}"));
                }
                vec![AppAction::Render]
            },
            Ok(Command::Quit) => self.quit(),
            Ok(Command::Say(content)) => match self.active.clone() {
                Some(conversation_id) => self.send_message(conversation_id, content),
                None => {
                    self.status_message = Some("No chat open".into());
                    vec![AppAction::Render]
                },
            },
            Err(InputError::Empty) => vec![],
            Err(e) => {
                self.status_message = Some(e.to_string());
                vec![AppAction::Render]
            },
        }
    }

    fn remove_window(&mut self, conversation_id: &ConversationId) {
        self.windows.retain(|w| &w.conversation_id != conversation_id);
        if self.active.as_ref() == Some(conversation_id) {
            self.active = self.windows.first().map(|w| w.conversation_id.clone());
            self.clear_active_unread();
        }
    }

    fn clear_active_unread(&mut self) {
        let Some(active) = &self.active else {
            return;
        };
        for window in &mut self.windows {
            if &window.conversation_id == active {
                window.unread = false;
            }
        }
    }

    /// Log in as a user.
    pub fn login(&self, user_id: UserId) -> Vec<AppAction> {
        vec![AppAction::Login { user_id }, AppAction::Render]
    }

    /// Log out.
    pub fn logout(&self) -> Vec<AppAction> {
        vec![AppAction::Logout, AppAction::Render]
    }

    /// Open a window for an existing conversation.
    pub fn open_chat(&mut self, peer: UserId, conversation_id: ConversationId) -> Vec<AppAction> {
        self.status_message = Some(format!("Opening chat with {peer}..."));
        vec![AppAction::OpenChat { peer, conversation_id }, AppAction::Render]
    }

    /// Create a conversation with a user and open it.
    pub fn start_chat(&mut self, peer: UserId, kind: ConversationKind) -> Vec<AppAction> {
        self.status_message = Some(format!("Starting chat with {peer}..."));
        vec![AppAction::StartChat { peer, kind }, AppAction::Render]
    }

    /// Close the window bound to a friend.
    pub fn close_chat(&self, peer: UserId) -> Vec<AppAction> {
        vec![AppAction::CloseChat { peer }, AppAction::Render]
    }

    /// Send a message to a conversation.
    pub fn send_message(&self, conversation_id: ConversationId, content: String) -> Vec<AppAction> {
        vec![AppAction::SendMessage { conversation_id, content }, AppAction::Render]
    }

    /// Quit the application.
    pub fn quit(&self) -> Vec<AppAction> {
        vec![AppAction::Quit]
    }

    /// Focus the window bound to `peer`. Returns `false` if there is none.
    pub fn focus_peer(&mut self, peer: &UserId) -> bool {
        let Some(window) = self.windows.iter().find(|w| &w.peer == peer) else {
            return false;
        };
        self.active = Some(window.conversation_id.clone());
        self.clear_active_unread();
        true
    }

    /// Set a status message to display to the user.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    /// Local user. `None` while logged out.
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Visible windows, oldest first.
    pub fn windows(&self) -> &[WindowView] {
        &self.windows
    }

    /// Focused conversation. `None` if no window is open.
    pub fn active_window(&self) -> Option<&ConversationId> {
        self.active.as_ref()
    }

    /// Focused window. `None` if no window is open.
    pub fn active_window_view(&self) -> Option<&WindowView> {
        let active = self.active.as_ref()?;
        self.windows.iter().find(|w| &w.conversation_id == active)
    }

    /// Notifications received since login.
    pub fn notifications(&self) -> usize {
        self.notifications
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}
