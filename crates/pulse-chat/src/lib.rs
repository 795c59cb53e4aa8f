//! pulse-chat: streaming conversation client
//!
//! Sits on top of `pulse-api` and owns the conversation state machine:
//! optimistic message handling, the single in-flight stream session with
//! cooperative cancellation, transient tool status, and reconciliation of
//! the streamed reply against the server's committed record.

pub mod client;
pub mod directory;
pub mod error;
pub mod events;
pub mod handle;
pub mod session;
pub mod state;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use client::{ChatClient, ChatClientConfig};
pub use directory::{ConversationDirectory, HttpDirectory};
pub use error::{Error, Result};
pub use events::ChatEvent;
pub use handle::ChatHandle;
pub use session::StreamSession;
pub use state::{ChatMessage, ChatState};
pub use transport::{HttpTransport, Transport};
