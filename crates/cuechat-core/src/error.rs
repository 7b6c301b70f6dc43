//! Error types for the transport adapter.

use cuechat_proto::UserId;
use thiserror::Error;

/// Errors from [`crate::Connection`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Operation requires an announced identity.
    #[error("cannot {operation} before the local user is initialised")]
    NotInitialized {
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// A different identity is already bound to this connection.
    #[error("connection already bound to {current}, refusing to re-initialise as {requested}")]
    IdentityConflict {
        /// Identity currently bound.
        current: UserId,
        /// Identity that was requested.
        requested: UserId,
    },
}
