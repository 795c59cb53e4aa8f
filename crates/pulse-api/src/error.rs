//! Error types for pulse-api

use thiserror::Error;

/// Result type alias using pulse-api Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the chat backend
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend returned a non-success status
    #[error("API error ({status}): {detail}")]
    Api { status: u16, detail: String },

    /// No bearer credential available
    #[error("Not authenticated: {0}")]
    Auth(String),

    /// The streaming body failed mid-transfer
    #[error("Stream error: {0}")]
    Stream(String),

    /// Request aborted by the caller
    #[error("Request aborted")]
    Aborted,
}

impl Error {
    /// Create an API error from a status code and detail message
    pub fn api(status: u16, detail: impl Into<String>) -> Self {
        Self::Api {
            status,
            detail: detail.into(),
        }
    }

    /// Human-readable detail suitable for surfacing in client state.
    ///
    /// For `Api` errors this is the backend's own `detail` text; everything
    /// else falls back to the error's display form.
    pub fn detail(&self) -> String {
        match self {
            Error::Api { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }

    /// Whether this error was caused by caller-side cancellation
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Aborted)
    }
}
