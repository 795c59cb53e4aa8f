//! Wire types shared with the chat backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Extra message metadata the backend may attach to a stored message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Tool names invoked while producing this message, in invocation order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_used: Option<Vec<String>>,
}

/// A server-confirmed message record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl MessageRecord {
    /// Tool names from metadata, if the backend recorded any
    pub fn tools_used(&self) -> Option<&[String]> {
        self.metadata
            .as_ref()
            .and_then(|m| m.tools_used.as_deref())
    }
}

/// Conversation summary as returned by the list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for both the streaming and non-streaming send endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// User message text, non-empty after trimming
    pub message: String,
    /// Conversation to reply in; `None` starts a new conversation
    pub conversation_id: Option<String>,
}

impl SendMessageRequest {
    /// Build a request, trimming the message text
    pub fn new(message: impl Into<String>, conversation_id: Option<String>) -> Self {
        Self {
            message: message.into().trim().to_string(),
            conversation_id,
        }
    }
}

/// Response of the non-streaming send endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub conversation_id: String,
    /// The assistant's reply
    pub message: MessageRecord,
}

/// Response of the conversation list endpoint (newest first)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationSummary>,
    /// Total count when the backend provides one
    #[serde(default)]
    pub total: Option<u64>,
}

/// Response of the message history endpoint (chronological)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageListResponse {
    pub messages: Vec<MessageRecord>,
    pub conversation_id: String,
}
