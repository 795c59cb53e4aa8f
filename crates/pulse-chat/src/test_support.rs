//! Scripted collaborators for exercising the client without a network

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;
use pulse_api::{ByteStream, ConversationSummary, MessageRecord, Role, SendMessageRequest};

use crate::directory::ConversationDirectory;
use crate::error::{Error, Result};
use crate::transport::Transport;

/// One scripted response of the streaming endpoint
pub(crate) enum Script {
    /// Fail before any byte, like a non-success status
    Fail { status: u16, detail: String },
    /// Deliver byte chunks; optionally keep the connection open afterwards
    Stream {
        deliveries: Vec<Vec<u8>>,
        hold_open: bool,
    },
}

/// Transport that replays scripted responses, one per `open` call
pub(crate) struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    pub(crate) requests: Mutex<Vec<SendMessageRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new(scripts: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn failing(status: u16, detail: &str) -> Arc<Self> {
        Self::new(vec![Script::Fail {
            status,
            detail: detail.into(),
        }])
    }

    pub(crate) fn streaming(deliveries: Vec<Vec<u8>>) -> Arc<Self> {
        Self::new(vec![Script::Stream {
            deliveries,
            hold_open: false,
        }])
    }

    pub(crate) fn streaming_held_open(deliveries: Vec<Vec<u8>>) -> Arc<Self> {
        Self::new(vec![Script::Stream {
            deliveries,
            hold_open: true,
        }])
    }

    pub(crate) fn open_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn open(&self, request: SendMessageRequest) -> Result<ByteStream> {
        self.requests.lock().push(request);
        match self.scripts.lock().pop_front() {
            None => Err(Error::Other("no scripted response left".into())),
            Some(Script::Fail { status, detail }) => {
                Err(pulse_api::Error::api(status, detail).into())
            }
            Some(Script::Stream {
                deliveries,
                hold_open,
            }) => Ok(Box::pin(stream! {
                for delivery in deliveries {
                    yield Ok::<Bytes, pulse_api::Error>(Bytes::from(delivery));
                }
                if hold_open {
                    futures::future::pending::<()>().await;
                }
            })),
        }
    }
}

/// In-memory conversation directory with optional latency and failures
#[derive(Default)]
pub(crate) struct StaticDirectory {
    conversations: Mutex<Vec<ConversationSummary>>,
    histories: Mutex<HashMap<String, Vec<MessageRecord>>>,
    delay: Mutex<Option<Duration>>,
    fail_list: AtomicBool,
    pub(crate) list_calls: AtomicUsize,
    pub(crate) message_calls: AtomicUsize,
}

impl StaticDirectory {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn add_conversation(&self, id: &str) {
        self.conversations.lock().push(summary(id));
    }

    pub(crate) fn set_history(&self, id: &str, records: Vec<MessageRecord>) {
        self.histories.lock().insert(id.to_string(), records);
    }

    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub(crate) fn fail_lists(&self) {
        self.fail_list.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConversationDirectory for StaticDirectory {
    async fn list(&self, limit: usize, _offset: usize) -> Result<Vec<ConversationSummary>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(pulse_api::Error::api(500, "conversation list unavailable").into());
        }
        let mut conversations = self.conversations.lock().clone();
        conversations.truncate(limit);
        Ok(conversations)
    }

    async fn messages(
        &self,
        conversation_id: &str,
        _limit: usize,
        _offset: usize,
    ) -> Result<Vec<MessageRecord>> {
        self.message_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.histories
            .lock()
            .get(conversation_id)
            .cloned()
            .ok_or_else(|| {
                pulse_api::Error::api(404, "Conversation not found or access denied").into()
            })
    }
}

pub(crate) fn summary(id: &str) -> ConversationSummary {
    ConversationSummary {
        id: id.into(),
        title: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub(crate) fn record(id: &str, conversation_id: &str, role: Role, content: &str) -> MessageRecord {
    MessageRecord {
        id: id.into(),
        conversation_id: conversation_id.into(),
        role,
        content: content.into(),
        timestamp: Utc::now(),
        metadata: None,
    }
}
