//! Client event types

use serde::{Deserialize, Serialize};

/// Events broadcast by the chat client as its state changes.
///
/// Subscribers receive these in the order the state machine applied them;
/// the full state is available separately via `ChatClient::snapshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// A send started streaming
    StreamStart { conversation_id: Option<String> },

    /// Assistant text appended to the streaming buffer
    Chunk { delta: String },

    /// Transient tool-activity status changed (`None` clears it)
    Status { status: Option<String> },

    /// The in-flight reply completed and was committed to history
    StreamEnd {
        conversation_id: String,
        message_id: String,
    },

    /// The in-flight reply failed
    StreamError { detail: String },

    /// The in-flight reply was cancelled by the user
    Cancelled,

    /// A conversation's history finished loading
    HistoryLoaded { conversation_id: String },

    /// The conversation list cache was refreshed
    ConversationsRefreshed,

    /// State was reset for a brand-new chat
    NewChat,
}

impl ChatEvent {
    /// Check if this event ends a stream session (end, error, or cancel)
    pub fn ends_stream(&self) -> bool {
        matches!(
            self,
            ChatEvent::StreamEnd { .. } | ChatEvent::StreamError { .. } | ChatEvent::Cancelled
        )
    }
}
