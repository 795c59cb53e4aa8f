//! HTTP client for the chat backend

use std::pin::Pin;

use bytes::Bytes;
use futures::StreamExt;
use serde::Deserialize;
use tokio_stream::Stream;

use crate::{
    auth::AuthContext,
    error::{Error, Result},
    types::{
        ConversationListResponse, MessageListResponse, SendMessageRequest, SendMessageResponse,
    },
};

/// A raw byte stream from the streaming reply endpoint
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Default page size for the conversation list endpoint
pub const DEFAULT_LIST_LIMIT: usize = 50;
/// Default page size for the message history endpoint
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Client for the chat backend's REST and streaming endpoints
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: AuthContext,
}

impl ApiClient {
    /// Create a client for the given backend base URL
    pub fn new(base_url: impl Into<String>, auth: AuthContext) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    /// The auth capability this client sends bearer tokens from
    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Open the streaming reply for a message.
    ///
    /// On a non-success status the body is read eagerly and decoded into
    /// `Error::Api` so callers get a single terminal error before any frame.
    pub async fn stream_reply(&self, request: &SendMessageRequest) -> Result<ByteStream> {
        let token = self.auth.bearer()?;
        let response = self
            .http
            .post(self.url("/chat/message/stream"))
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(status.as_u16(), decode_error_detail(status.as_u16(), &body)));
        }

        tracing::debug!(conversation = ?request.conversation_id, "reply stream opened");
        Ok(Box::pin(
            response.bytes_stream().map(|item| item.map_err(Error::from)),
        ))
    }

    /// Send a message and wait for the full reply (non-streaming endpoint)
    pub async fn send_message(&self, request: &SendMessageRequest) -> Result<SendMessageResponse> {
        let token = self.auth.bearer()?;
        let response = self
            .http
            .post(self.url("/chat/message"))
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        Self::decode_json(response).await
    }

    /// List the user's conversations, newest first
    pub async fn list_conversations(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<ConversationListResponse> {
        let token = self.auth.bearer()?;
        let response = self
            .http
            .get(self.url("/chat/conversations"))
            .bearer_auth(token)
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;
        Self::decode_json(response).await
    }

    /// Fetch a conversation's messages in chronological order
    pub async fn conversation_messages(
        &self,
        conversation_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<MessageListResponse> {
        let token = self.auth.bearer()?;
        let response = self
            .http
            .get(self.url(&format!("/chat/conversations/{conversation_id}/messages")))
            .bearer_auth(token)
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;
        Self::decode_json(response).await
    }

    async fn decode_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::api(status.as_u16(), decode_error_detail(status.as_u16(), &body)));
        }
        Ok(response.json().await?)
    }
}

/// Error body shape used by the backend (`{"detail": "..."}`)
#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Best-effort extraction of a human-readable failure detail
fn decode_error_detail(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        match parsed.detail {
            Some(serde_json::Value::String(s)) if !s.is_empty() => return s,
            Some(other) if !other.is_null() => return other.to_string(),
            _ => {}
        }
    }
    format!("Request failed with status {status}")
}
