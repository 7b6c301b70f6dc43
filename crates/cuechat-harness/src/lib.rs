//! Deterministic simulation harness for cuechat testing.
//!
//! In-memory implementations of the Environment, the backend, and the
//! [`cuechat_app::Driver`] trait for deterministic, reproducible testing of
//! the session under reordered responses and dropped connections.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the session
//! and window invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_server;

pub use invariants::{
    ActiveWindowOpen, ClientSnapshot, ConversationSnapshot, Invariant, InvariantRegistry,
    InvariantResult, JoinedBeforeOpen, NoDuplicateMessages, OpenWindowsHaveHistory,
    SystemSnapshot, UniqueConversationWindows, Violation, WindowCapacity,
};
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::SimEnv;
pub use sim_server::{ClientKey, SharedSimServer, SimServer, create_shared_server};
