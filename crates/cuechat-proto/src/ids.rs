//! Identifier newtypes.
//!
//! The backend hands out opaque string identifiers (document ids). Each kind
//! of identifier gets its own type so a conversation id can never be passed
//! where a user id is expected.
//!
//! Deserialization rejects empty strings. [`UserId::new`] and friends do not
//! validate and are meant for trusted, locally constructed values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Wrap a trusted identifier without validation.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Validate an untrusted identifier.
            pub fn parse(id: impl Into<String>) -> Result<Self, ProtocolError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ProtocolError::EmptyIdentifier($label));
                }
                Ok(Self(id))
            }

            /// Identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ProtocolError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identity of a user (the local user, a friend, a message sender).
    UserId,
    "user"
);

string_id!(
    /// Server-side conversation identifier. Also names the socket room.
    ConversationId,
    "conversation"
);

string_id!(
    /// Server-assigned message identifier.
    MessageId,
    "message"
);

string_id!(
    /// Client-generated correlation id attached to an optimistic send.
    ///
    /// The server echoes it back on the confirmed message so the two copies
    /// can be reconciled.
    ClientMessageId,
    "client message"
);
