//! Conversation state machine
//!
//! `ChatClient` owns the visible chat state and the single active stream
//! session. Every state mutation happens while holding the state lock and
//! never across an await, so observers always see whole transitions. A
//! per-send generation counter discriminates events from superseded
//! sessions; a separate sequence counter does the same for history loads.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use pulse_api::{MessageRecord, SendMessageRequest, StreamEvent};
use tokio::sync::broadcast;

use crate::{
    directory::ConversationDirectory,
    events::ChatEvent,
    handle::ChatHandle,
    session::{ActiveSession, SUMMARIZING_STATUS, StreamSession, tool_status_label},
    state::{ChatMessage, ChatState},
    transport::Transport,
};

/// Chat client configuration
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    /// How long the "Summarizing" status lingers before auto-clearing
    pub summarize_linger: Duration,
    /// Page size for history loads
    pub history_limit: usize,
    /// Page size for conversation list refreshes
    pub list_limit: usize,
}

impl Default for ChatClientConfig {
    fn default() -> Self {
        Self {
            summarize_linger: Duration::from_secs(2),
            history_limit: pulse_api::client::DEFAULT_HISTORY_LIMIT,
            list_limit: pulse_api::client::DEFAULT_LIST_LIMIT,
        }
    }
}

/// The streaming conversation client.
///
/// At most one stream session is active at a time: starting a new send,
/// switching conversations, or starting a new chat always cancels the
/// previous session first. Methods take `&self`, so the client can be shared
/// behind an `Arc` between the UI task and the task driving a send.
pub struct ChatClient {
    transport: Arc<dyn Transport>,
    directory: Arc<dyn ConversationDirectory>,
    config: ChatClientConfig,
    state: Arc<Mutex<ChatState>>,
    session: Arc<Mutex<Option<ActiveSession>>>,
    generation: AtomicU64,
    load_seq: AtomicU64,
    event_tx: broadcast::Sender<ChatEvent>,
}

impl ChatClient {
    /// Create a client with default configuration
    pub fn new(transport: Arc<dyn Transport>, directory: Arc<dyn ConversationDirectory>) -> Self {
        Self::with_config(transport, directory, ChatClientConfig::default())
    }

    /// Create a client with explicit configuration
    pub fn with_config(
        transport: Arc<dyn Transport>,
        directory: Arc<dyn ConversationDirectory>,
        config: ChatClientConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            transport,
            directory,
            config,
            state: Arc::new(Mutex::new(ChatState::default())),
            session: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
            load_seq: AtomicU64::new(0),
            event_tx,
        }
    }

    /// Subscribe to state-change events
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.event_tx.subscribe()
    }

    /// Current state snapshot
    pub fn snapshot(&self) -> ChatState {
        self.state.lock().clone()
    }

    /// Get a cloneable handle for stopping the stream from external code
    pub fn handle(&self) -> ChatHandle {
        ChatHandle {
            session: Arc::clone(&self.session),
        }
    }

    /// Send a user message and drive the streamed reply to completion.
    ///
    /// No-op when the trimmed text is empty or a session is already active
    /// (rapid sends are rejected, not queued). The optimistic user message is
    /// appended before the network request starts.
    pub async fn send_message(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("ignoring empty message");
            return;
        }

        let (generation, cancel) = {
            let mut slot = self.session.lock();
            if slot.is_some() {
                tracing::debug!("send rejected: a stream is already in flight");
                return;
            }
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let active = ActiveSession::new(generation);
            let cancel = active.cancel.clone();
            *slot = Some(active);
            (generation, cancel)
        };

        // A history load still in flight would clobber this exchange when it
        // resolves; invalidate it now.
        self.load_seq.fetch_add(1, Ordering::SeqCst);

        // Shown immediately; reconciled against the server on done
        let (optimistic_id, conversation_id) = {
            let mut state = self.state.lock();
            let conversation_id = state.active_conversation.clone();
            let message = ChatMessage::optimistic_user(text, conversation_id.clone());
            let optimistic_id = message.id.clone();
            state.messages.push(message);
            state.is_streaming = true;
            state.error = None;
            (optimistic_id, conversation_id)
        };
        let _ = self.event_tx.send(ChatEvent::StreamStart {
            conversation_id: conversation_id.clone(),
        });

        let request = SendMessageRequest::new(text, conversation_id);
        let mut session = StreamSession::open(Arc::clone(&self.transport), request, cancel);

        let mut saw_tool = false;
        let mut summarize_armed = false;
        let mut tools_seen: Vec<String> = Vec::new();

        while let Some(event) = session.next_event().await {
            if !self.is_current(generation) {
                // Superseded mid-flight; the superseder already cleaned up
                return;
            }
            match event {
                StreamEvent::Chunk { content } => {
                    self.apply_chunk(generation, &content, saw_tool, &mut summarize_armed);
                }
                StreamEvent::ToolStart { tool } => {
                    saw_tool = true;
                    tools_seen.push(tool.clone());
                    self.set_status_if_current(generation, Some(tool_status_label(&tool)));
                }
                StreamEvent::Done {
                    conversation_id,
                    message,
                    ..
                } => {
                    self.apply_done(generation, &optimistic_id, conversation_id, message, tools_seen)
                        .await;
                    return;
                }
                StreamEvent::Error { detail } => {
                    self.apply_error(generation, detail);
                    return;
                }
            }
        }

        // The session ended without a terminal event: cancellation
        self.finish_cancelled(generation);
    }

    /// Cancel the active stream session, discarding streamed text.
    ///
    /// Committed history is left as it was, including the optimistic user
    /// message (it was genuinely sent); no partial assistant message is
    /// committed and no error is surfaced.
    pub fn stop_streaming(&self) {
        if !self.cancel_active_session() {
            return;
        }
        {
            let mut state = self.state.lock();
            state.streaming_text.clear();
            state.status = None;
            state.is_streaming = false;
        }
        let _ = self.event_tx.send(ChatEvent::Cancelled);
    }

    /// Reset to a brand-new conversation, cancelling any active session.
    /// The conversation list cache is kept.
    pub fn start_new_chat(&self) {
        self.cancel_active_session();
        self.load_seq.fetch_add(1, Ordering::SeqCst);
        {
            let mut state = self.state.lock();
            let conversations = std::mem::take(&mut state.conversations);
            *state = ChatState {
                conversations,
                ..ChatState::default()
            };
        }
        let _ = self.event_tx.send(ChatEvent::NewChat);
    }

    /// Switch to another conversation and load its history.
    ///
    /// No-op when already active. An in-flight stream is abandoned, and a
    /// history load superseded by a later selection is discarded when it
    /// resolves.
    pub async fn select_conversation(&self, conversation_id: &str) {
        {
            let state = self.state.lock();
            if state.active_conversation.as_deref() == Some(conversation_id) {
                return;
            }
        }
        self.cancel_active_session();
        {
            let mut state = self.state.lock();
            state.active_conversation = Some(conversation_id.to_string());
            state.messages.clear();
            state.streaming_text.clear();
            state.status = None;
            state.error = None;
            state.directory_error = None;
            state.is_streaming = false;
        }

        let seq = self.load_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let loaded = self
            .directory
            .messages(conversation_id, self.config.history_limit, 0)
            .await;
        if self.load_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!("discarding stale history load for {conversation_id}");
            return;
        }
        match loaded {
            Ok(records) => {
                {
                    let mut state = self.state.lock();
                    state.messages = records.into_iter().map(ChatMessage::from_record).collect();
                }
                let _ = self.event_tx.send(ChatEvent::HistoryLoaded {
                    conversation_id: conversation_id.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!("history load failed: {e}");
                self.state.lock().directory_error = Some(e.detail());
            }
        }
    }

    /// Refresh the conversation list cache from the directory
    pub async fn refresh_conversations(&self) {
        match self.directory.list(self.config.list_limit, 0).await {
            Ok(conversations) => {
                self.state.lock().conversations = conversations;
                let _ = self.event_tx.send(ChatEvent::ConversationsRefreshed);
            }
            Err(e) => {
                tracing::warn!("conversation list refresh failed: {e}");
                self.state.lock().directory_error = Some(e.detail());
            }
        }
    }

    // ---- Event application ----

    fn apply_chunk(
        &self,
        generation: u64,
        content: &str,
        saw_tool: bool,
        summarize_armed: &mut bool,
    ) {
        let applied = self.mutate_if_current(generation, |state| {
            state.streaming_text.push_str(content);
        });
        if !applied {
            return;
        }
        let _ = self.event_tx.send(ChatEvent::Chunk {
            delta: content.to_string(),
        });

        // Text starting to flow after tool activity: show "Summarizing"
        // briefly, then let it clear itself unless something supersedes it.
        if saw_tool && !*summarize_armed {
            *summarize_armed = true;
            self.set_status_if_current(generation, Some(SUMMARIZING_STATUS.to_string()));
            self.arm_summarize_timer(generation);
        }
    }

    async fn apply_done(
        &self,
        generation: u64,
        optimistic_id: &str,
        conversation_id: String,
        message: MessageRecord,
        tools_seen: Vec<String>,
    ) {
        let Some(session) = self.take_session(generation) else {
            return;
        };
        session.shutdown();

        let message_id;
        {
            let mut state = self.state.lock();
            state.status = None;
            if state.active_conversation.is_none() {
                state.active_conversation = Some(conversation_id.clone());
            }
            // The id stays client-assigned; only the conversation binding is
            // rewritten, in place, never duplicated.
            if let Some(user_message) =
                state.messages.iter_mut().find(|m| m.id == optimistic_id)
            {
                user_message.conversation_id = Some(conversation_id.clone());
            }
            let assistant = ChatMessage::from_record_with_tools(message, tools_seen);
            message_id = assistant.id.clone();
            state.messages.push(assistant);
            state.streaming_text.clear();
            state.is_streaming = false;
        }
        let _ = self.event_tx.send(ChatEvent::StreamEnd {
            conversation_id,
            message_id,
        });

        // A brand-new conversation should appear in the list; an existing
        // one's recency and title may have changed.
        self.refresh_conversations().await;
    }

    fn apply_error(&self, generation: u64, detail: String) {
        let Some(session) = self.take_session(generation) else {
            return;
        };
        session.shutdown();
        {
            let mut state = self.state.lock();
            state.status = None;
            state.streaming_text.clear();
            state.is_streaming = false;
            state.error = Some(detail.clone());
        }
        let _ = self.event_tx.send(ChatEvent::StreamError { detail });
    }

    fn finish_cancelled(&self, generation: u64) {
        let Some(session) = self.take_session(generation) else {
            // Already cleaned up by stop_streaming / select / new chat
            return;
        };
        session.shutdown();
        {
            let mut state = self.state.lock();
            state.streaming_text.clear();
            state.status = None;
            state.is_streaming = false;
        }
        let _ = self.event_tx.send(ChatEvent::Cancelled);
    }

    // ---- Session bookkeeping ----

    fn is_current(&self, generation: u64) -> bool {
        self.session
            .lock()
            .as_ref()
            .is_some_and(|s| s.generation == generation)
    }

    fn take_session(&self, generation: u64) -> Option<ActiveSession> {
        let mut slot = self.session.lock();
        match slot.as_ref() {
            Some(s) if s.generation == generation => slot.take(),
            _ => None,
        }
    }

    fn cancel_active_session(&self) -> bool {
        match self.session.lock().take() {
            Some(session) => {
                session.shutdown();
                true
            }
            None => false,
        }
    }

    /// Run a state mutation only while the session with this generation still
    /// occupies the slot. The slot lock is held across the mutation so a
    /// concurrent stop or selection cannot slip between the check and the
    /// write.
    fn mutate_if_current(&self, generation: u64, f: impl FnOnce(&mut ChatState)) -> bool {
        let slot = self.session.lock();
        let current = slot.as_ref().is_some_and(|s| s.generation == generation);
        if current {
            f(&mut self.state.lock());
        }
        current
    }

    fn set_status_if_current(&self, generation: u64, status: Option<String>) {
        let applied = self.mutate_if_current(generation, |state| {
            state.status = status.clone();
        });
        if applied {
            let _ = self.event_tx.send(ChatEvent::Status { status });
        }
    }

    fn arm_summarize_timer(&self, generation: u64) {
        let session_slot = Arc::clone(&self.session);
        let state = Arc::clone(&self.state);
        let event_tx = self.event_tx.clone();
        let linger = self.config.summarize_linger;

        let timer = tokio::spawn(async move {
            tokio::time::sleep(linger).await;
            let cleared = {
                let slot = session_slot.lock();
                let current = slot.as_ref().is_some_and(|s| s.generation == generation);
                let mut state = state.lock();
                if current && state.status.as_deref() == Some(SUMMARIZING_STATUS) {
                    state.status = None;
                    true
                } else {
                    false
                }
            };
            if cleared {
                let _ = event_tx.send(ChatEvent::Status { status: None });
            }
        });

        let mut slot = self.session.lock();
        match slot.as_mut() {
            Some(session) if session.generation == generation => {
                session.status_timer = Some(timer.abort_handle());
            }
            _ => timer.abort(),
        }
    }
}
