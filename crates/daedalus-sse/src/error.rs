//! Error types for Server-Sent Events operations.

use thiserror::Error;

/// Result type for SSE operations.
pub type SseResult<T> = Result<T, SseError>;

/// Errors that can occur while streaming events.
#[derive(Debug, Error)]
pub enum SseError {
    /// The sender was closed explicitly.
    #[error("stream closed: {0}")]
    StreamClosed(String),

    /// The receiving side is gone, usually because the client disconnected.
    #[error("client disconnected")]
    Disconnected,

    /// Event data could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

impl SseError {
    /// Create a stream closed error.
    pub fn stream_closed(reason: impl Into<String>) -> Self {
        Self::StreamClosed(reason.into())
    }

    /// Returns true when the peer went away.
    #[must_use]
    pub const fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}
