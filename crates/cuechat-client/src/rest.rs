//! REST client for history and conversation endpoints.

use std::time::Duration;

use cuechat_proto::{
    Conversation, ConversationId, ConversationKind, CreateConversationRequest, UserId, WireMessage,
};
use reqwest::RequestBuilder;
use thiserror::Error;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// REST errors.
#[derive(Debug, Error)]
pub enum RestError {
    /// Transport failure, timeout, non-success status, or undecodable body.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// REST client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    /// API root, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Bearer token. `None` sends unauthenticated requests.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".into(),
            token: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Thin async wrapper over the two endpoints the session needs.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    config: RestConfig,
}

impl RestClient {
    /// Build a client.
    pub fn new(config: RestConfig) -> Result<Self, RestError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Configuration in use.
    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    /// `GET /message/messages/{conversation_id}`, in server order.
    pub async fn fetch_history(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<WireMessage>, RestError> {
        let url = self.url(&format!("message/messages/{conversation_id}"));
        let messages = self
            .authorize(self.http.get(url))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<WireMessage>>()
            .await?;

        tracing::debug!(%conversation_id, count = messages.len(), "history fetched");
        Ok(messages)
    }

    /// `POST /message/create-conversation`.
    pub async fn create_conversation(
        &self,
        member_ids: Vec<UserId>,
        kind: ConversationKind,
    ) -> Result<Conversation, RestError> {
        let body = CreateConversationRequest { member_ids, kind };
        let conversation = self
            .authorize(self.http.post(self.url("message/create-conversation")))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<Conversation>()
            .await?;

        tracing::debug!(conversation_id = %conversation.id, "conversation created");
        Ok(conversation)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}
