//! Error types for streamlog

use thiserror::Error;

/// Result type alias for streamlog operations
pub type StreamlogResult<T> = Result<T, StreamlogError>;

/// Main error type for streamlog
#[derive(Error, Debug, Clone)]
pub enum StreamlogError {
    /// The stream page did not reference a live stream
    #[error("Live stream was not found")]
    SessionNotFound,

    /// A credential required for polling was missing from the page body
    #[error("{field} was not found in the stream page")]
    MissingCredential { field: &'static str },

    /// No continuation token could be derived from the page body
    #[error("Continuation was not found in the stream page")]
    MissingContinuation,

    /// Network-level failure or non-2xx response
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Functionality the recorder deliberately does not support
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

impl StreamlogError {
    /// Create a new credential error for a named page field
    pub const fn missing_credential(field: &'static str) -> Self {
        Self::MissingCredential { field }
    }

    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new unsupported-functionality error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }
}

impl From<anyhow::Error> for StreamlogError {
    fn from(error: anyhow::Error) -> Self {
        Self::Other(error.to_string())
    }
}

impl From<std::io::Error> for StreamlogError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for StreamlogError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

impl From<reqwest::Error> for StreamlogError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}
