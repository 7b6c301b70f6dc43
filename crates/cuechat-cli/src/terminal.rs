//! Terminal driver for the line-mode client.
//!
//! Implements the [`Driver`] trait with tokio stdin for input, the
//! tokio-tungstenite socket task for server events, and reqwest for REST
//! calls. REST calls run as spawned tasks and report back over a channel so
//! a slow fetch never blocks typing.

use std::io::{self, Write};

use cuechat_app::{ApiRequest, ApiResponse, App, Driver, DriverEvent};
use cuechat_client::{
    ClientCommand, Environment, Session,
    rest::{RestClient, RestConfig, RestError},
    transport::{self, ReconnectConfig, SocketEvent, SocketHandle, TransportError},
};
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::mpsc,
};

use crate::Transcript;

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// REST client could not be built.
    #[error("REST client error: {0}")]
    Rest(#[from] RestError),
}

/// Endpoints and timings for [`TerminalDriver`].
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    /// WebSocket endpoint.
    pub socket_url: String,
    /// Socket reconnect backoff.
    pub reconnect: ReconnectConfig,
    /// REST endpoint and credentials.
    pub rest: RestConfig,
}

/// Terminal driver implementing the [`Driver`] trait.
pub struct TerminalDriver {
    socket_url: String,
    reconnect: ReconnectConfig,
    rest: RestClient,
    input: Lines<BufReader<Stdin>>,
    socket: Option<SocketHandle>,
    api_tx: mpsc::UnboundedSender<ApiResponse>,
    api_rx: mpsc::UnboundedReceiver<ApiResponse>,
    transcript: Transcript,
}

impl TerminalDriver {
    /// Create a new terminal driver. The socket is opened on login.
    pub fn new(config: TerminalConfig) -> Result<Self, TerminalError> {
        let (api_tx, api_rx) = mpsc::unbounded_channel();

        Ok(Self {
            socket_url: config.socket_url,
            reconnect: config.reconnect,
            rest: RestClient::new(config.rest)?,
            input: BufReader::new(tokio::io::stdin()).lines(),
            socket: None,
            api_tx,
            api_rx,
            transcript: Transcript::new(),
        })
    }
}

async fn next_socket_event(socket: &mut Option<SocketHandle>) -> Option<SocketEvent> {
    match socket {
        Some(socket) => socket.recv().await,
        None => std::future::pending().await,
    }
}

async fn perform(rest: RestClient, request: ApiRequest) -> ApiResponse {
    match request {
        ApiRequest::FetchHistory { conversation_id } => {
            let result = rest.fetch_history(&conversation_id).await.map_err(|e| e.to_string());
            ApiResponse::History { conversation_id, result }
        },
        ApiRequest::CreateConversation { peer, kind } => {
            let result = rest
                .create_conversation(vec![peer.clone()], kind)
                .await
                .map_err(|e| e.to_string());
            ApiResponse::Conversation { peer, result }
        },
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn poll_event(&mut self) -> Result<Option<DriverEvent>, Self::Error> {
        tokio::select! {
            line = self.input.next_line() => {
                Ok(Some(line?.map_or(DriverEvent::Shutdown, DriverEvent::Line)))
            }

            Some(response) = self.api_rx.recv() => Ok(Some(DriverEvent::Api(response))),

            event = next_socket_event(&mut self.socket) => match event {
                Some(SocketEvent::Connected) => Ok(Some(DriverEvent::Connected)),
                Some(SocketEvent::Disconnected) => Ok(Some(DriverEvent::Disconnected)),
                Some(SocketEvent::Event(event)) => Ok(Some(DriverEvent::Server(event))),
                None => {
                    tracing::warn!("socket task ended");
                    self.socket = None;
                    Ok(Some(DriverEvent::Disconnected))
                },
            },
        }
    }

    async fn send_command(&mut self, command: ClientCommand) -> Result<(), Self::Error> {
        match &self.socket {
            Some(socket) => socket.send(command).await?,
            None => tracing::debug!(event = command.event_name(), "no socket, command dropped"),
        }
        Ok(())
    }

    fn submit(&mut self, request: ApiRequest) {
        let rest = self.rest.clone();
        let tx = self.api_tx.clone();
        tokio::spawn(async move {
            let response = perform(rest, request).await;
            if tx.send(response).is_err() {
                tracing::debug!("driver gone, REST response dropped");
            }
        });
    }

    async fn connect(&mut self) -> Result<(), Self::Error> {
        tracing::info!(url = %self.socket_url, "opening socket");
        self.socket = Some(transport::connect(self.socket_url.clone(), self.reconnect));
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.stop();
        }
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    fn render<E: Environment>(
        &mut self,
        app: &App,
        session: &Session<E>,
    ) -> Result<(), Self::Error> {
        let lines = self.transcript.update(app, session);
        if lines.is_empty() {
            return Ok(());
        }

        let mut out = io::stdout().lock();
        for line in lines {
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        Ok(())
    }

    fn stop(&mut self) {
        self.disconnect();
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
