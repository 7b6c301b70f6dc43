//! WebSocket transport for the client.
//!
//! Provides [`SocketHandle`] which owns a background task bridging the socket
//! to channels. This is a thin layer: it encodes [`ClientCommand`]s, decodes
//! [`ServerEvent`]s, and reconnects with exponential backoff. Everything the
//! server must be told again after a reconnect (identity, joined rooms,
//! queued sends) is replayed by the Sans-IO [`cuechat_core::Connection`] on
//! [`SocketEvent::Connected`]. Commands still buffered for a lost socket are
//! discarded so they cannot reach the new socket ahead of that replay.

use std::time::Duration;

use cuechat_proto::{ClientCommand, ProtocolError, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{
    sync::mpsc::{self, error::TryRecvError},
    task::AbortHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Channel depth between the socket task and its handle.
const CHANNEL_CAPACITY: usize = 64;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket task has stopped.
    #[error("socket task closed")]
    Closed,

    /// Command could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Reconnect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for the doubling delay.
    pub max_backoff: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self { initial_backoff: Duration::from_secs(1), max_backoff: Duration::from_secs(30) }
    }
}

impl ReconnectConfig {
    /// Delay to use after `current` failed.
    pub fn next_backoff(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_backoff)
    }
}

/// Socket lifecycle and inbound traffic.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    /// Socket is up (first connect or reconnect).
    Connected,
    /// Socket went down. The task is already retrying.
    Disconnected,
    /// Decoded server event.
    Event(ServerEvent),
}

/// Handle to the socket task.
///
/// Dropping the handle stops the task and closes the socket.
pub struct SocketHandle {
    to_server: mpsc::Sender<ClientCommand>,
    from_server: mpsc::Receiver<SocketEvent>,
    abort_handle: AbortHandle,
}

impl SocketHandle {
    /// Queue a command for the server.
    ///
    /// Commands still buffered when the socket drops are discarded. The
    /// caller replays what the server needs after [`SocketEvent::Connected`].
    pub async fn send(&self, command: ClientCommand) -> Result<(), TransportError> {
        self.to_server.send(command).await.map_err(|_| TransportError::Closed)
    }

    /// Next socket event. `None` once the task has stopped.
    pub async fn recv(&mut self) -> Option<SocketEvent> {
        self.from_server.recv().await
    }

    /// Stop the socket task.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for SocketHandle {
    fn drop(&mut self) {
        self.abort_handle.abort();
    }
}

/// Spawn a socket task for `url`.
///
/// Must be called from within a Tokio runtime. The first
/// [`SocketEvent::Connected`] arrives once the handshake completes.
pub fn connect(url: impl Into<String>, config: ReconnectConfig) -> SocketHandle {
    let url = url.into();
    let (to_server_tx, to_server_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (from_server_tx, from_server_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let handle = tokio::spawn(run_socket(url, config, to_server_rx, from_server_tx));

    SocketHandle {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    }
}

/// Why a connected session of the socket loop ended.
enum Exit {
    /// Socket failed; reconnect.
    Lost,
    /// Handle dropped; stop.
    Shutdown,
}

async fn run_socket(
    url: String,
    config: ReconnectConfig,
    mut to_server: mpsc::Receiver<ClientCommand>,
    from_server: mpsc::Sender<SocketEvent>,
) {
    let mut backoff = config.initial_backoff;

    loop {
        let ws = match connect_async(url.as_str()).await {
            Ok((ws, _response)) => ws,
            Err(e) => {
                tracing::warn!(%url, error = %e, ?backoff, "socket connect failed");
                tokio::time::sleep(backoff).await;
                backoff = config.next_backoff(backoff);
                continue;
            },
        };
        backoff = config.initial_backoff;
        tracing::info!(%url, "socket connected");

        if discard_buffered(&mut to_server).is_none() {
            return;
        }

        if from_server.send(SocketEvent::Connected).await.is_err() {
            return;
        }

        let (mut sink, mut stream) = ws.split();
        let exit = loop {
            tokio::select! {
                command = to_server.recv() => {
                    let Some(command) = command else {
                        break Exit::Shutdown;
                    };
                    let text = match command.encode() {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!(
                                event = command.event_name(),
                                error = %e,
                                "dropping command"
                            );
                            continue;
                        },
                    };
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        tracing::warn!(error = %e, "socket send failed");
                        break Exit::Lost;
                    }
                },
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => match ServerEvent::decode(&text) {
                        Ok(event) => {
                            if from_server.send(SocketEvent::Event(event)).await.is_err() {
                                break Exit::Shutdown;
                            }
                        },
                        Err(e) => tracing::warn!(error = %e, "dropping malformed server frame"),
                    },
                    Some(Ok(Message::Close(_))) | None => break Exit::Lost,
                    Some(Ok(_)) => {},
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "socket read failed");
                        break Exit::Lost;
                    },
                },
            }
        };

        if let Err(e) = sink.close().await {
            tracing::debug!(error = %e, "socket close failed");
        }

        match exit {
            Exit::Shutdown => return,
            Exit::Lost => {
                tracing::info!(%url, "socket lost");
                if discard_buffered(&mut to_server).is_none() {
                    return;
                }
                if from_server.send(SocketEvent::Disconnected).await.is_err() {
                    return;
                }
                tokio::time::sleep(backoff).await;
            },
        }
    }
}

/// Drop commands written for a socket that is gone.
///
/// Returns how many were dropped, or `None` once every handle has hung up.
fn discard_buffered(to_server: &mut mpsc::Receiver<ClientCommand>) -> Option<usize> {
    let mut dropped = 0;
    loop {
        match to_server.try_recv() {
            Ok(command) => {
                tracing::debug!(event = command.event_name(), "discarding command for lost socket");
                dropped += 1;
            },
            Err(TryRecvError::Empty) => return Some(dropped),
            Err(TryRecvError::Disconnected) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use cuechat_proto::UserId;

    use super::*;

    #[test]
    fn backoff_doubles_up_to_cap() {
        let config = ReconnectConfig::default();
        let mut backoff = config.initial_backoff;
        let mut seen = vec![backoff];
        for _ in 0..7 {
            backoff = config.next_backoff(backoff);
            seen.push(backoff);
        }

        let secs: Vec<_> = seen.iter().map(Duration::as_secs).collect();
        assert_eq!(secs, vec![1, 2, 4, 8, 16, 30, 30, 30]);
    }

    #[test]
    fn backoff_saturates() {
        let config = ReconnectConfig { initial_backoff: Duration::MAX, max_backoff: Duration::MAX };
        assert_eq!(config.next_backoff(Duration::MAX), Duration::MAX);
    }

    #[test]
    fn discard_buffered_empties_queue() {
        let (tx, mut rx) = mpsc::channel(4);
        tx.try_send(ClientCommand::InitUser(UserId::new("u1"))).unwrap();
        tx.try_send(ClientCommand::InitUser(UserId::new("u2"))).unwrap();

        assert_eq!(discard_buffered(&mut rx), Some(2));
        assert_eq!(discard_buffered(&mut rx), Some(0));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn discard_buffered_reports_hangup() {
        let (tx, mut rx) = mpsc::channel(4);
        tx.try_send(ClientCommand::InitUser(UserId::new("u1"))).unwrap();
        drop(tx);

        assert_eq!(discard_buffered(&mut rx), None);
    }
}
