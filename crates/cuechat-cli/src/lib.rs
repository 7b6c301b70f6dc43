//! Line-mode terminal client for cuechat.
//!
//! A thin shell over [`cuechat_app::Driver`] that provides terminal-specific
//! I/O: stdin lines in, a scrolling transcript out. All orchestration logic
//! lives in the generic [`cuechat_app::Runtime`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod system_env;
pub mod terminal;
pub mod transcript;

pub use system_env::SystemEnv;
pub use terminal::{TerminalConfig, TerminalDriver, TerminalError};
pub use transcript::Transcript;
