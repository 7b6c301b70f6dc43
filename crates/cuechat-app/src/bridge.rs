//! Session-to-Application translation layer.
//!
//! The [`Bridge`] wraps the Sans-IO [`cuechat_client::Session`] and adapts it
//! to the high-level application lifecycle.
//!
//! # Responsibilities
//!
//! - Converts high-level [`crate::AppAction`] into [`SessionEvent`]s.
//! - Accumulates socket work ([`ConnectionAction`]) and REST work
//!   ([`ApiRequest`]) for the driver to execute in the next I/O cycle.
//! - Interprets session actions and converts them back into
//!   [`crate::AppEvent`]s to update the UI.
//! - Converts session errors into [`AppEvent::Error`] so the UI stays
//!   interactive.

use cuechat_client::{
    ConnectionAction, Environment, ServerEvent, Session, SessionAction, SessionConfig,
    SessionError, SessionEvent,
};

use crate::{ApiRequest, ApiResponse, AppAction, AppEvent};

/// Bridge between App and Session logic.
///
/// Generic over Environment to support both production and simulation.
pub struct Bridge<E: Environment> {
    session: Session<E>,
    transport: Vec<ConnectionAction>,
    requests: Vec<ApiRequest>,
}

impl<E: Environment> Bridge<E> {
    /// Create a new Bridge with a logged-out session.
    pub fn new(env: E, config: SessionConfig) -> Self {
        Self { session: Session::new(env, config), transport: Vec::new(), requests: Vec::new() }
    }

    /// Underlying session, for rendering and inspection.
    pub fn session(&self) -> &Session<E> {
        &self.session
    }

    /// Process an App action and return resulting App events.
    pub fn process_app_action(&mut self, action: AppAction) -> Vec<AppEvent> {
        match action {
            AppAction::Login { user_id } => {
                let result = self.session.handle(SessionEvent::Login { user_id: user_id.clone() });
                let succeeded = result.is_ok();
                let mut events = self.handle_session_result(result);
                if succeeded {
                    events.insert(0, AppEvent::LoggedIn { user_id });
                }
                events
            },
            AppAction::Logout => {
                let result = self.session.handle(SessionEvent::Logout);
                let mut events = self.handle_session_result(result);
                events.push(AppEvent::LoggedOut);
                events
            },
            AppAction::OpenChat { peer, conversation_id } => {
                let result = self.session.handle(SessionEvent::OpenChat { peer, conversation_id });
                self.handle_session_result(result)
            },
            AppAction::StartChat { peer, kind } => {
                let result = self.session.handle(SessionEvent::StartChat { peer, kind });
                self.handle_session_result(result)
            },
            AppAction::CloseChat { peer } => {
                let result = self.session.handle(SessionEvent::CloseChat { peer });
                self.handle_session_result(result)
            },
            AppAction::SendMessage { conversation_id, content } => {
                let result =
                    self.session.handle(SessionEvent::SendMessage { conversation_id, content });
                self.handle_session_result(result)
            },
            AppAction::Render | AppAction::Quit => vec![],
        }
    }

    /// Handle an event pushed by the server.
    pub fn handle_server_event(&mut self, event: ServerEvent) -> Vec<AppEvent> {
        let result = self.session.handle(SessionEvent::Server(event));
        self.handle_session_result(result)
    }

    /// Handle the outcome of an [`ApiRequest`].
    pub fn handle_api_response(&mut self, response: ApiResponse) -> Vec<AppEvent> {
        let result = self.session.handle(response.into());
        self.handle_session_result(result)
    }

    /// Socket came up.
    pub fn handle_connected(&mut self) -> Vec<AppEvent> {
        let result = self.session.handle(SessionEvent::TransportConnected);
        let mut events = vec![AppEvent::Connected];
        events.extend(self.handle_session_result(result));
        events
    }

    /// Socket went down.
    pub fn handle_disconnected(&mut self) -> Vec<AppEvent> {
        let result = self.session.handle(SessionEvent::TransportDisconnected);
        let mut events = vec![AppEvent::Disconnected];
        events.extend(self.handle_session_result(result));
        events
    }

    /// Take pending socket work, in the order it was produced.
    pub fn take_transport(&mut self) -> Vec<ConnectionAction> {
        std::mem::take(&mut self.transport)
    }

    /// Take pending REST requests.
    pub fn take_requests(&mut self) -> Vec<ApiRequest> {
        std::mem::take(&mut self.requests)
    }

    fn handle_session_result(
        &mut self,
        result: Result<Vec<SessionAction>, SessionError>,
    ) -> Vec<AppEvent> {
        match result {
            Ok(actions) => self.process_session_actions(actions),
            Err(e) => {
                tracing::warn!(error = %e, "session rejected operation");
                vec![AppEvent::Error { message: e.to_string() }]
            },
        }
    }

    fn process_session_actions(&mut self, actions: Vec<SessionAction>) -> Vec<AppEvent> {
        let mut events = Vec::new();

        for action in actions {
            match action {
                SessionAction::Transport(action) => {
                    if action == ConnectionAction::Connect {
                        events.push(AppEvent::Connecting);
                    }
                    self.transport.push(action);
                },
                SessionAction::FetchHistory { conversation_id } => {
                    self.requests.push(ApiRequest::FetchHistory { conversation_id });
                },
                SessionAction::CreateConversation { peer, kind } => {
                    self.requests.push(ApiRequest::CreateConversation { peer, kind });
                },
                SessionAction::WindowOpened { peer, conversation_id } => {
                    events.push(AppEvent::WindowOpened { peer, conversation_id });
                },
                SessionAction::WindowClosed { peer, conversation_id } => {
                    events.push(AppEvent::WindowClosed { peer, conversation_id });
                },
                SessionAction::WindowEvicted { peer, conversation_id } => {
                    events.push(AppEvent::WindowEvicted { peer, conversation_id });
                },
                SessionAction::MessageAppended { conversation_id, from_self, .. } => {
                    events.push(AppEvent::MessageAppended { conversation_id, from_self });
                },
                SessionAction::MessageConfirmed { conversation_id, .. } => {
                    events.push(AppEvent::MessageConfirmed { conversation_id });
                },
                SessionAction::Notification(payload) => {
                    tracing::debug!(%payload, "notification received");
                    events.push(AppEvent::Notification);
                },
                SessionAction::OpenFailed { peer, reason, .. } => {
                    events.push(AppEvent::OpenFailed { peer, reason });
                },
            }
        }

        events
    }
}
