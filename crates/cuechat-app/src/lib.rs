//! Application layer for cuechat
//!
//! Pure state machines and generic runtime for UI and session orchestration,
//! enabling deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`App`]: UI state machine (command parsing, window focus, unread badges)
//! - [`Bridge`]: Session bridge (translates App actions to Session events)
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod api;
mod app;
mod bridge;
mod driver;
mod event;
mod input;
mod runtime;
mod state;

pub use action::AppAction;
pub use api::{ApiRequest, ApiResponse};
pub use app::App;
pub use bridge::Bridge;
pub use driver::{Driver, DriverEvent};
pub use event::AppEvent;
pub use input::{Command, InputError};
pub use runtime::{Runtime, Step};
pub use state::{ConnectionState, WindowView};
