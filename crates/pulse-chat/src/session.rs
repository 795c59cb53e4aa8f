//! Stream session: one in-flight assistant reply.
//!
//! A session owns one outgoing request and pumps the transport's byte
//! deliveries through the frame reader and event classifier, yielding typed
//! events in wire order. It stops at the first terminal event even when more
//! bytes remain buffered, and resolves promptly on cancellation without
//! yielding anything further.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures::StreamExt;
use pulse_api::{FrameReader, SendMessageRequest, StreamEvent};
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

use crate::transport::Transport;

/// Detail used when the transport closes before a terminal event arrives
const ABRUPT_CLOSE_DETAIL: &str = "Connection closed before the reply finished";

/// Events of one stream session, in wire order
pub type SessionEventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// One request/reply exchange against the streaming endpoint.
///
/// Terminal behavior: exactly one of `Done` or `Error` is the last event,
/// except on cancellation, where the stream simply ends.
pub struct StreamSession {
    events: SessionEventStream,
}

impl StreamSession {
    /// Open the transport and start pumping frames.
    ///
    /// A transport failure before any byte (non-success status, connection
    /// refused) surfaces as a single `Error` event and the pump never starts.
    pub fn open(
        transport: Arc<dyn Transport>,
        request: SendMessageRequest,
        cancel: CancellationToken,
    ) -> Self {
        let events = stream! {
            let opened = tokio::select! {
                _ = cancel.cancelled() => return,
                opened = transport.open(request) => opened,
            };
            let mut bytes = match opened {
                Ok(stream) => stream,
                Err(e) => {
                    yield StreamEvent::Error { detail: e.detail() };
                    return;
                }
            };

            let mut reader = FrameReader::new();
            loop {
                let delivery = tokio::select! {
                    _ = cancel.cancelled() => return,
                    delivery = bytes.next() => delivery,
                };
                let Some(delivery) = delivery else { break };
                let chunk = match delivery {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield StreamEvent::Error { detail: e.detail() };
                        return;
                    }
                };
                for payload in reader.push(&chunk) {
                    let Some(event) = StreamEvent::parse(&payload) else {
                        continue;
                    };
                    let terminal = event.is_terminal();
                    yield event;
                    if terminal {
                        // Stop even if more bytes remain buffered
                        return;
                    }
                }
            }

            if reader.has_partial() {
                tracing::debug!("discarding trailing partial frame at stream end");
            }
            yield StreamEvent::Error { detail: ABRUPT_CLOSE_DETAIL.into() };
        };
        Self {
            events: Box::pin(events),
        }
    }

    /// Next event, or `None` once the session is over
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.next().await
    }
}

/// Bookkeeping for the client's single active session.
///
/// The status-linger timer lives here so that cancelling the session always
/// cancels the timer with it.
pub(crate) struct ActiveSession {
    pub(crate) generation: u64,
    pub(crate) cancel: CancellationToken,
    pub(crate) status_timer: Option<tokio::task::AbortHandle>,
}

impl ActiveSession {
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            generation,
            cancel: CancellationToken::new(),
            status_timer: None,
        }
    }

    /// Cancel the transport pump and the linger timer together
    pub(crate) fn shutdown(&self) {
        if let Some(timer) = &self.status_timer {
            timer.abort();
        }
        self.cancel.cancel();
    }
}

/// Transient status shown once text starts flowing after tool activity
pub(crate) const SUMMARIZING_STATUS: &str = "Summarizing";

/// Advisory status label for a running tool
pub(crate) fn tool_status_label(tool: &str) -> String {
    let lower = tool.to_lowercase();
    if lower.contains("search") {
        "Searching the web".to_string()
    } else if lower.contains("trend") {
        "Checking trends".to_string()
    } else {
        format!("Using {tool}")
    }
}
