//! pulse-api: Wire protocol and HTTP client for the pulse chat backend
//!
//! This crate owns the streaming wire format (SSE frame assembly and typed
//! event decoding) and the REST surface of the backend: streaming and
//! non-streaming message send, conversation listing, and message history.

pub mod auth;
pub mod client;
pub mod error;
pub mod event;
pub mod frame;
pub mod types;

pub use auth::AuthContext;
pub use client::{ApiClient, ByteStream};
pub use error::{Error, Result};
pub use event::StreamEvent;
pub use frame::FrameReader;
pub use types::*;
