//! Typed stream events decoded from frame payloads

use serde::{Deserialize, Serialize};

use crate::types::MessageRecord;

/// Events carried by the streaming reply, discriminated by the `type` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A fragment of assistant text
    Chunk { content: String },
    /// The agent started running a tool
    ToolStart { tool: String },
    /// Reply complete; carries the authoritative assistant message
    Done {
        conversation_id: String,
        message_id: Option<String>,
        message: MessageRecord,
    },
    /// Server-declared failure; terminal
    Error { detail: String },
}

impl StreamEvent {
    /// Decode one frame payload.
    ///
    /// A payload that fails to decode, or carries an unrecognized `type`,
    /// yields `None`; one bad frame never aborts an otherwise-healthy stream.
    pub fn parse(payload: &str) -> Option<StreamEvent> {
        match serde_json::from_str(payload) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::debug!("dropping undecodable frame payload: {e}");
                None
            }
        }
    }

    /// Check if this is a terminal event (Done or Error)
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chunk() {
        let event = StreamEvent::parse(r#"{"type":"chunk","content":"Hi"}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::Chunk {
                content: "Hi".into()
            }
        );
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_parse_tool_start() {
        let event = StreamEvent::parse(r#"{"type":"tool_start","tool":"tavily_search"}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::ToolStart {
                tool: "tavily_search".into()
            }
        );
    }

    #[test]
    fn test_parse_done_with_null_message_id() {
        let payload = r#"{
            "type": "done",
            "conversation_id": "c1",
            "message_id": null,
            "message": {
                "id": "m1",
                "conversation_id": "c1",
                "role": "assistant",
                "content": "Hi!",
                "timestamp": "2026-02-12T12:00:00Z"
            }
        }"#;
        let event = StreamEvent::parse(payload).unwrap();
        let StreamEvent::Done {
            conversation_id,
            message_id,
            message,
        } = event
        else {
            panic!("expected done");
        };
        assert_eq!(conversation_id, "c1");
        assert!(message_id.is_none());
        assert_eq!(message.content, "Hi!");
        assert!(
            StreamEvent::Error {
                detail: "x".into()
            }
            .is_terminal()
        );
    }

    #[test]
    fn test_malformed_payload_dropped() {
        assert!(StreamEvent::parse("{not json").is_none());
        assert!(StreamEvent::parse("").is_none());
    }

    #[test]
    fn test_unknown_discriminant_dropped() {
        assert!(StreamEvent::parse(r#"{"type":"heartbeat"}"#).is_none());
        assert!(StreamEvent::parse(r#"{"type":"chunk_v2","content":"x"}"#).is_none());
    }

    #[test]
    fn test_missing_required_field_dropped() {
        assert!(StreamEvent::parse(r#"{"type":"chunk"}"#).is_none());
        assert!(StreamEvent::parse(r#"{"type":"tool_start"}"#).is_none());
    }
}
