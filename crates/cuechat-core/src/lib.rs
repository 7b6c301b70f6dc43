//! Core building blocks shared by the cuechat client layers.
//!
//! - [`env::Environment`]: wall clock and randomness, swappable for simulation.
//! - [`connection::Connection`]: the transport adapter. Tracks the socket's
//!   lifecycle, the announced identity and the set of joined conversation
//!   rooms, and replays them whenever the socket comes back.
//!
//! Both are free of I/O. Callers feed in what happened and execute the
//! returned [`connection::ConnectionAction`]s.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod connection;
pub mod env;
pub mod error;

pub use connection::{Connection, ConnectionAction, ConnectionState};
pub use env::Environment;
pub use error::ConnectionError;
