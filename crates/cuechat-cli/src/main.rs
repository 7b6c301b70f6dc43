//! cuechat terminal client entry point.
//!
//! # Usage
//!
//! ```bash
//! cuechat --server ws://localhost:8080 --api http://localhost:8080 --user alice
//! ```
//!
//! Type `/open <user> <conversation>` to open a chat, plain text to talk in
//! the active window, `/quit` to leave.

use std::time::Duration;

use clap::Parser;
use cuechat_app::Runtime;
use cuechat_cli::{SystemEnv, TerminalConfig, TerminalDriver};
use cuechat_client::{
    DEFAULT_MAX_WINDOWS, SessionConfig, UserId,
    rest::{DEFAULT_REQUEST_TIMEOUT, RestConfig},
    transport::ReconnectConfig,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// cuechat terminal client
#[derive(Parser, Debug)]
#[command(name = "cuechat")]
#[command(about = "Line-mode chat client for cuechat")]
#[command(version)]
struct Args {
    /// WebSocket endpoint of the chat server
    #[arg(short, long, env = "CUECHAT_SOCKET_URL", default_value = "ws://localhost:8080")]
    server: String,

    /// Base URL of the REST API
    #[arg(short, long, env = "CUECHAT_API_URL", default_value = "http://localhost:8080")]
    api: String,

    /// Log in as this user on startup
    #[arg(short, long, env = "CUECHAT_USER")]
    user: Option<String>,

    /// Bearer token for REST requests
    #[arg(long, env = "CUECHAT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Maximum number of chat windows open at once
    #[arg(long, default_value_t = DEFAULT_MAX_WINDOWS)]
    max_windows: usize,

    /// REST request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    request_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // stdout carries the transcript
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let driver = TerminalDriver::new(TerminalConfig {
        socket_url: args.server,
        reconnect: ReconnectConfig::default(),
        rest: RestConfig {
            base_url: args.api,
            token: args.token,
            timeout: Duration::from_secs(args.request_timeout_secs),
        },
    })?;

    let mut runtime =
        Runtime::new(driver, SystemEnv::new(), SessionConfig::with_max_windows(args.max_windows));

    if let Some(user) = args.user {
        runtime.login(UserId::new(user)).await?;
    }

    Ok(runtime.run().await?)
}
