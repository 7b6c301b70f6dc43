//! Line-oriented user input.
//!
//! Lines starting with `/` are commands. Any other non-empty line is a chat
//! message for the focused window; `//` escapes a message that itself starts
//! with a slash.

use std::str::FromStr;

use cuechat_proto::{ConversationId, ConversationKind, UserId};
use thiserror::Error;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/login <user>`
    Login {
        /// Local user.
        user_id: UserId,
    },
    /// `/logout`
    Logout,
    /// `/open <user> <conversation>`
    Open {
        /// Friend the window is bound to.
        peer: UserId,
        /// Conversation to open.
        conversation_id: ConversationId,
    },
    /// `/start <user> [group]`
    Start {
        /// User to chat with.
        peer: UserId,
        /// Conversation kind.
        kind: ConversationKind,
    },
    /// `/close <user>`
    Close {
        /// Friend whose window to close.
        peer: UserId,
    },
    /// `/focus <user>`
    Focus {
        /// Friend whose window to focus.
        peer: UserId,
    },
    /// `/quit`
    Quit,
    /// Plain text for the focused window.
    Say(String),
}

/// Input parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Blank line.
    #[error("empty input")]
    Empty,

    /// Unrecognized `/command`.
    #[error("unknown command /{0}")]
    UnknownCommand(String),

    /// Required argument absent.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// Too many arguments.
    #[error("unexpected argument {0:?}")]
    UnexpectedArgument(String),
}

impl FromStr for Command {
    type Err = InputError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(InputError::Empty);
        }

        if let Some(escaped) = line.strip_prefix("//") {
            return Ok(Self::Say(format!("/{escaped}")));
        }
        let Some(command) = line.strip_prefix('/') else {
            return Ok(Self::Say(line.to_owned()));
        };

        let mut args = command.split_whitespace();
        let name = args.next().unwrap_or_default();

        let parsed = match name {
            "login" => Self::Login { user_id: required(&mut args, "/login <user>")?.into() },
            "logout" => Self::Logout,
            "open" => {
                let usage = "/open <user> <conversation>";
                let peer = required(&mut args, usage)?.into();
                let conversation_id = required(&mut args, usage)?.into();
                Self::Open { peer, conversation_id }
            },
            "start" => {
                let peer = required(&mut args, "/start <user> [group]")?.into();
                let kind = match args.next() {
                    None | Some("single") => ConversationKind::Single,
                    Some("group") => ConversationKind::Group,
                    Some(other) => return Err(InputError::UnexpectedArgument(other.to_owned())),
                };
                Self::Start { peer, kind }
            },
            "close" => Self::Close { peer: required(&mut args, "/close <user>")?.into() },
            "focus" => Self::Focus { peer: required(&mut args, "/focus <user>")?.into() },
            "quit" | "exit" => Self::Quit,
            other => return Err(InputError::UnknownCommand(other.to_owned())),
        };

        match args.next() {
            Some(extra) => Err(InputError::UnexpectedArgument(extra.to_owned())),
            None => Ok(parsed),
        }
    }
}

fn required<'a>(
    args: &mut impl Iterator<Item = &'a str>,
    usage: &'static str,
) -> Result<&'a str, InputError> {
    args.next().ok_or(InputError::Usage(usage))
}
