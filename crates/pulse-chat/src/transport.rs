//! Transport abstraction over the streaming send endpoint

use async_trait::async_trait;
use pulse_api::{ApiClient, ByteStream, SendMessageRequest};

use crate::error::Result;

/// Performs the network request for one streamed reply and exposes the raw,
/// cancellable byte stream. Dropping the returned stream releases the
/// underlying connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the streaming reply for a request
    async fn open(&self, request: SendMessageRequest) -> Result<ByteStream>;
}

/// Production transport backed by the chat backend's HTTP API
pub struct HttpTransport {
    api: ApiClient,
}

impl HttpTransport {
    /// Create a transport over an API client
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, request: SendMessageRequest) -> Result<ByteStream> {
        Ok(self.api.stream_reply(&request).await?)
    }
}
