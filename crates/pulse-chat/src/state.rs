//! Chat state: committed history, streaming buffer, transient status, errors.

use chrono::{DateTime, Utc};
use pulse_api::{ConversationSummary, MessageRecord, Role};

/// A message as held by the client.
///
/// The id may be client-assigned (optimistic user messages shown before the
/// server confirms them); the conversation id may be absent until the server
/// assigns one for a brand-new conversation. Reconciliation rewrites fields
/// in place, it never duplicates the message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub conversation_id: Option<String>,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Tool names invoked while producing this message, in invocation order
    pub tools: Vec<String>,
}

impl ChatMessage {
    /// Create an optimistic user message with a client-assigned id
    pub fn optimistic_user(content: impl Into<String>, conversation_id: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id,
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            tools: Vec::new(),
        }
    }

    /// Convert a server record; tools come from the record's own metadata
    pub fn from_record(record: MessageRecord) -> Self {
        Self::from_record_with_tools(record, Vec::new())
    }

    /// Convert a server record, falling back to client-observed tool names
    /// when the record carries none. The server's value wins when present.
    pub fn from_record_with_tools(record: MessageRecord, observed_tools: Vec<String>) -> Self {
        let tools = record
            .tools_used()
            .map(<[String]>::to_vec)
            .unwrap_or(observed_tools);
        Self {
            id: record.id,
            conversation_id: Some(record.conversation_id),
            role: record.role,
            content: record.content,
            timestamp: record.timestamp,
            tools,
        }
    }
}

/// Snapshot of the conversation state machine.
///
/// The streaming buffer is kept apart from committed history; transient
/// status is advisory UI state and never persisted.
#[derive(Debug, Clone, Default)]
pub struct ChatState {
    /// Currently active conversation, `None` for a brand-new chat
    pub active_conversation: Option<String>,
    /// Committed message history, chronological
    pub messages: Vec<ChatMessage>,
    /// Assistant text streamed so far for the in-flight reply
    pub streaming_text: String,
    /// Transient tool-activity status
    pub status: Option<String>,
    /// Last stream error
    pub error: Option<String>,
    /// Last conversation-list / history fetch error
    pub directory_error: Option<String>,
    /// Cached conversation list, newest first
    pub conversations: Vec<ConversationSummary>,
    /// Whether a stream session is in flight
    pub is_streaming: bool,
}
