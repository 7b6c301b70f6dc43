//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the application runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use cuechat_client::{ClientCommand, Environment, ServerEvent, Session};

use crate::{ApiRequest, ApiResponse, App};

/// Inputs a driver hands to the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    /// A line of user input.
    Line(String),
    /// Event pushed by the server.
    Server(ServerEvent),
    /// Outcome of a submitted [`ApiRequest`].
    Api(ApiResponse),
    /// Socket came up (first connect or reconnect).
    Connected,
    /// Socket went down.
    Disconnected,
    /// Input closed; the runtime should stop.
    Shutdown,
}

/// Abstracts I/O operations for the application runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the production CLI and simulation.
///
/// # Implementations
///
/// - **CLI**: stdin lines, WebSocket transport, reqwest REST client
/// - **Simulation**: in-memory queues backed by a simulated server
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Poll for the next event.
    ///
    /// Production drivers wait until an event is available. Returns `None`
    /// if nothing is ready.
    fn poll_event(
        &mut self,
    ) -> impl Future<Output = Result<Option<DriverEvent>, Self::Error>> + Send;

    /// Send a command to the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport has shut down.
    fn send_command(
        &mut self,
        command: ClientCommand,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Start a REST request without waiting for it.
    ///
    /// The outcome comes back later through [`Driver::poll_event`] as
    /// [`DriverEvent::Api`].
    fn submit(&mut self, request: ApiRequest);

    /// Open the socket. Readiness is reported as [`DriverEvent::Connected`].
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be started.
    fn connect(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Close the socket.
    fn disconnect(&mut self);

    /// Check if a socket is open or being opened.
    fn is_connected(&self) -> bool;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render<E: Environment>(&mut self, app: &App, session: &Session<E>)
    -> Result<(), Self::Error>;

    /// Stop the connection and clean up resources.
    fn stop(&mut self);
}
