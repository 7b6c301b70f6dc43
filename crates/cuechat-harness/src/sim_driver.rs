//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the CLI's terminal driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`cuechat_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! REST responses can be held back and released later, which is how tests
//! reorder a history fetch against a window close.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use cuechat_app::{ApiRequest, ApiResponse, App, Driver, DriverEvent};
use cuechat_client::{ClientCommand, Environment, Session};

use crate::{
    ClientKey, SharedSimServer,
    invariants::{ClientSnapshot, InvariantRegistry, SystemSnapshot},
};

/// Error type for simulation driver.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

/// Shared state for event injection.
///
/// This allows injection from outside async contexts.
#[derive(Default)]
struct SharedState {
    pending: VecDeque<DriverEvent>,
    held: Vec<ApiResponse>,
    hold_responses: bool,
    sent: Vec<ClientCommand>,
    submitted: Vec<ApiRequest>,
    connected: bool,
    connects: usize,
    renders: usize,
}

/// Simulation driver for deterministic testing.
///
/// Implements [`Driver`] trait so the same [`cuechat_app::Runtime`]
/// orchestration code runs in both the production CLI and simulation tests.
pub struct SimDriver {
    state: Arc<Mutex<SharedState>>,
    server: Option<(SharedSimServer, ClientKey)>,
    invariants: Option<InvariantRegistry>,
}

impl Default for SimDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl SimDriver {
    /// Create a driver with no backend. Commands and requests are only
    /// captured.
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(SharedState::default())), server: None, invariants: None }
    }

    /// Attach a simulated backend.
    #[must_use]
    pub fn with_server(mut self, server: SharedSimServer, key: ClientKey) -> Self {
        self.server = Some((server, key));
        self
    }

    /// Enable invariant checking on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_backend<T>(&self, f: impl FnOnce(&mut crate::SimServer, ClientKey) -> T) -> Option<T> {
        let (server, key) = self.server.as_ref()?;
        let mut server = server.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut server, *key))
    }

    /// Inject a line of user input.
    pub fn inject_line(&self, line: impl Into<String>) {
        self.inject_event(DriverEvent::Line(line.into()));
    }

    /// Inject a driver event.
    pub fn inject_event(&self, event: DriverEvent) {
        self.lock().pending.push_back(event);
    }

    /// Hold REST responses until [`SimDriver::release_responses`].
    pub fn hold_responses(&self) {
        self.lock().hold_responses = true;
    }

    /// Deliver held REST responses in order and stop holding.
    pub fn release_responses(&self) {
        let mut state = self.lock();
        state.hold_responses = false;
        let held = std::mem::take(&mut state.held);
        state.pending.extend(held.into_iter().map(DriverEvent::Api));
    }

    /// Drop the socket. The backend forgets this client's identity and rooms.
    pub fn drop_connection(&self) {
        self.with_backend(|server, key| server.disconnect(key));
        let mut state = self.lock();
        state.connected = false;
        state.pending.push_back(DriverEvent::Disconnected);
    }

    /// Bring the socket back after [`SimDriver::drop_connection`].
    pub fn restore_connection(&self) {
        self.with_backend(|server, key| server.connect(key));
        let mut state = self.lock();
        state.connected = true;
        state.connects += 1;
        state.pending.push_back(DriverEvent::Connected);
    }

    /// Take all captured outgoing commands.
    pub fn take_sent(&self) -> Vec<ClientCommand> {
        std::mem::take(&mut self.lock().sent)
    }

    /// Take all captured REST requests.
    pub fn take_submitted(&self) -> Vec<ApiRequest> {
        std::mem::take(&mut self.lock().submitted)
    }

    /// Number of socket connections opened.
    pub fn connects(&self) -> usize {
        self.lock().connects
    }

    /// Number of renders.
    pub fn renders(&self) -> usize {
        self.lock().renders
    }

    /// Check if there are pending events to process.
    pub fn has_pending(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    /// Check invariants against App and Session state.
    pub fn check_invariants<E: Environment>(&self, app: &App, session: &Session<E>, context: &str) {
        if let Some(registry) = &self.invariants {
            let snapshot =
                SystemSnapshot::single(ClientSnapshot::from_session(0, session).with_app(app));
            registry.assert_all(&snapshot, context);
        }
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(&mut self) -> Result<Option<DriverEvent>, Self::Error> {
        if let Some(event) = self.lock().pending.pop_front() {
            return Ok(Some(event));
        }

        if !self.is_connected() {
            return Ok(None);
        }

        let inbound = self.with_backend(|server, key| server.take_events(key)).unwrap_or_default();
        let mut state = self.lock();
        state.pending.extend(inbound.into_iter().map(DriverEvent::Server));
        Ok(state.pending.pop_front())
    }

    async fn send_command(&mut self, command: ClientCommand) -> Result<(), Self::Error> {
        let connected = {
            let mut state = self.lock();
            state.sent.push(command.clone());
            state.connected
        };

        if connected {
            self.with_backend(|server, key| server.handle_command(key, command));
        } else {
            tracing::debug!(event = command.event_name(), "command while disconnected");
        }
        Ok(())
    }

    fn submit(&mut self, request: ApiRequest) {
        let response = self.with_backend(|server, _| server.handle_request(&request));

        let mut state = self.lock();
        state.submitted.push(request);
        if let Some(response) = response {
            if state.hold_responses {
                state.held.push(response);
            } else {
                state.pending.push_back(DriverEvent::Api(response));
            }
        }
    }

    async fn connect(&mut self) -> Result<(), Self::Error> {
        self.restore_connection();
        Ok(())
    }

    fn disconnect(&mut self) {
        self.with_backend(|server, key| server.disconnect(key));
        self.lock().connected = false;
    }

    fn is_connected(&self) -> bool {
        self.lock().connected
    }

    fn render<E: Environment>(
        &mut self,
        app: &App,
        session: &Session<E>,
    ) -> Result<(), Self::Error> {
        self.lock().renders += 1;
        self.check_invariants(app, session, "after render");
        Ok(())
    }

    fn stop(&mut self) {
        self.disconnect();
    }
}
