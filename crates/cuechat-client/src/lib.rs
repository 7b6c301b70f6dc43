//! Client
//!
//! Action-based chat session state machine. Owns the open chat windows, the
//! per-conversation message logs and the transport adapter.
//!
//! # Architecture
//!
//! The session follows the Sans-IO and Action-Based patterns of
//! [`cuechat_core`]. It receives events ([`SessionEvent`]), processes them
//! through pure state machine logic, and returns actions ([`SessionAction`])
//! for the caller to execute: REST requests, socket commands, and UI
//! notifications.
//!
//! # Components
//!
//! - [`Session`]: Top-level state machine (the session store)
//! - [`WindowController`]: Bounded FIFO list of visible chat windows
//! - [`MessageLog`]: Ordered, de-duplicated message sequence per conversation
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::connect`]: WebSocket task with reconnect backoff
//! - [`rest::RestClient`]: History and conversation endpoints

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod event;
mod message;
mod session;
mod windows;

#[cfg(feature = "transport")]
pub mod rest;
#[cfg(feature = "transport")]
pub mod transport;

pub use config::{DEFAULT_MAX_WINDOWS, SessionConfig};
pub use cuechat_core::{Connection, ConnectionAction, ConnectionState, Environment};
pub use cuechat_proto::{
    ClientCommand, ClientMessageId, Conversation, ConversationId, ConversationKind, MessageId,
    ServerEvent, UserId, WireMessage,
};
pub use error::SessionError;
pub use event::{SessionAction, SessionEvent};
pub use message::{Ingest, Message, MessageLog};
pub use session::Session;
pub use windows::{ChatWindow, OpenOutcome, WindowController, WindowState};
