//! Conversation directory: list and history fetches

use async_trait::async_trait;
use pulse_api::{ApiClient, ConversationSummary, MessageRecord};

use crate::error::Result;

/// Read access to the user's conversations and their message history.
///
/// Both calls are opaque asynchronous fetches; the streaming path only
/// touches the directory through the explicit refresh after a completed
/// stream and through history loads on conversation selection.
#[async_trait]
pub trait ConversationDirectory: Send + Sync {
    /// List conversations, newest first
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<ConversationSummary>>;

    /// Fetch a conversation's messages in chronological order
    async fn messages(
        &self,
        conversation_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MessageRecord>>;
}

/// Production directory backed by the chat backend's HTTP API
pub struct HttpDirectory {
    api: ApiClient,
}

impl HttpDirectory {
    /// Create a directory over an API client
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ConversationDirectory for HttpDirectory {
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<ConversationSummary>> {
        Ok(self
            .api
            .list_conversations(limit, offset)
            .await?
            .conversations)
    }

    async fn messages(
        &self,
        conversation_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MessageRecord>> {
        Ok(self
            .api
            .conversation_messages(conversation_id, limit, offset)
            .await?
            .messages)
    }
}
