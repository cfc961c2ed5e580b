//! Test error types.

use thiserror::Error;

/// Errors raised while building a request or reading a response.
#[derive(Debug, Error)]
pub enum TestError {
    /// The request URI does not parse.
    #[error("Invalid URI '{uri}': {reason}")]
    InvalidUri {
        /// The URI as given.
        uri: String,
        /// Parser message.
        reason: String,
    },

    /// A header name or value is not valid HTTP.
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader {
        /// Header name as given.
        name: String,
        /// Parser message.
        reason: String,
    },

    /// The body could not be encoded.
    #[error("Body encoding error: {0}")]
    Encode(String),

    /// The response body could not be read or is not UTF-8.
    #[error("Body read error: {0}")]
    BodyRead(String),

    /// JSON decoding of the response failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
