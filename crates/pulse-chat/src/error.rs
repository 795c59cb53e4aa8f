//! Error types for pulse-chat

use thiserror::Error;

/// Result type alias using pulse-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the chat client
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the wire/HTTP layer
    #[error(transparent)]
    Api(#[from] pulse_api::Error),

    /// A generic client error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Human-readable detail suitable for surfacing in client state
    pub fn detail(&self) -> String {
        match self {
            Error::Api(e) => e.detail(),
            Error::Other(s) => s.clone(),
        }
    }
}
