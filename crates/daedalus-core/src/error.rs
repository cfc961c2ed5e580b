//! Error types for Daedalus.
//!
//! Handlers and middleware fail with [`Error`]. Only the
//! [`Error::Status`] variant carries a response status of its own; every
//! other variant is an opaque cause that [`retrieve_error_code`] maps to
//! `500 Internal Server Error`.

use http::StatusCode;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An intentional failure carrying the HTTP status to report.
///
/// # Example
///
/// ```
/// use daedalus_core::{retrieve_error_code, Error, StatusError};
/// use http::StatusCode;
///
/// let err: Error = StatusError::forbidden().into();
/// assert_eq!(retrieve_error_code(&err), StatusCode::FORBIDDEN);
/// assert_eq!(err.to_string(), "Error 403");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize)]
#[error("Error {}", .code.as_u16())]
pub struct StatusError {
    #[serde(serialize_with = "serialize_status")]
    code: StatusCode,
}

fn serialize_status<S: Serializer>(code: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(code.as_u16())
}

impl StatusError {
    /// Creates an error reporting `code`.
    #[must_use]
    pub const fn new(code: StatusCode) -> Self {
        Self { code }
    }

    /// Creates an error from a raw status number.
    ///
    /// Returns `None` when `code` is not a valid HTTP status.
    #[must_use]
    pub fn from_u16(code: u16) -> Option<Self> {
        StatusCode::from_u16(code).ok().map(Self::new)
    }

    /// Returns the status to report.
    #[must_use]
    pub const fn code(&self) -> StatusCode {
        self.code
    }

    /// `400 Bad Request`.
    #[must_use]
    pub const fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST)
    }

    /// `401 Unauthorized`.
    #[must_use]
    pub const fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED)
    }

    /// `403 Forbidden`.
    #[must_use]
    pub const fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN)
    }

    /// `404 Not Found`.
    #[must_use]
    pub const fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }
}

/// Standard error type for Daedalus handlers and middleware.
#[derive(Error, Debug)]
pub enum Error {
    /// Intentional failure with a status code.
    #[error(transparent)]
    Status(#[from] StatusError),

    /// No route carries the requested name.
    #[error("route not found: {name}")]
    RouteNotFound {
        /// Requested route name.
        name: String,
    },

    /// A `:param` placeholder had no value while building a URL.
    #[error("missing parameter :{param} for route {name}")]
    MissingParam {
        /// Route name.
        name: String,
        /// Placeholder without a value.
        param: String,
    },

    /// The response status line and headers were already written.
    #[error("response already written")]
    ResponseAlreadyWritten,

    /// The transport cannot flush partial bodies.
    #[error("streaming unsupported by the underlying transport")]
    StreamingUnsupported,

    /// The client went away while a response was being streamed.
    #[error("client disconnected")]
    ClientDisconnected,

    /// A header name or value was rejected.
    #[error("invalid header {name}: {reason}")]
    InvalidHeader {
        /// Header name as given.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The request body could not be decoded.
    #[error("failed to decode request body: {0}")]
    Decode(String),

    /// A response value could not be serialized.
    #[error("failed to serialize response: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A component failed to render.
    #[error("render failed: {0}")]
    Render(String),

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Creates a status error.
    #[must_use]
    pub const fn status(code: StatusCode) -> Self {
        Self::Status(StatusError::new(code))
    }

    /// Wraps an arbitrary failure.
    pub fn other(err: impl Into<anyhow::Error>) -> Self {
        Self::Other(err.into())
    }

    /// Returns the status this error reports.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        retrieve_error_code(self)
    }

    /// Returns true for transport-level failures (streaming, disconnects,
    /// double writes).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::StreamingUnsupported | Self::ClientDisconnected | Self::ResponseAlreadyWritten
        )
    }
}

impl From<daedalus_sse::SseError> for Error {
    fn from(err: daedalus_sse::SseError) -> Self {
        match err {
            daedalus_sse::SseError::Disconnected | daedalus_sse::SseError::StreamClosed(_) => {
                Self::ClientDisconnected
            }
            daedalus_sse::SseError::SerializationFailed(e) => Self::Serialize(e),
        }
    }
}

/// Returns the status to report for `err`.
///
/// A [`StatusError`] reports its own code; anything else is a 500.
#[must_use]
pub fn retrieve_error_code(err: &Error) -> StatusCode {
    match err {
        Error::Status(status) => status.code(),
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_code() {
        let err = Error::status(StatusCode::FORBIDDEN);
        assert_eq!(retrieve_error_code(&err), StatusCode::FORBIDDEN);
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_unclassified_errors_are_500() {
        let errors = [
            Error::other(anyhow::anyhow!("boom")),
            Error::RouteNotFound {
                name: "x".to_string(),
            },
            Error::Decode("bad json".to_string()),
            Error::StreamingUnsupported,
        ];
        for err in &errors {
            assert_eq!(retrieve_error_code(err), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_status_error_display() {
        assert_eq!(StatusError::not_found().to_string(), "Error 404");
        assert_eq!(Error::from(StatusError::bad_request()).to_string(), "Error 400");
    }

    #[test]
    fn test_status_error_from_u16() {
        assert_eq!(StatusError::from_u16(418).map(|e| e.code().as_u16()), Some(418));
        assert!(StatusError::from_u16(1000).is_none());
    }

    #[test]
    fn test_status_error_serializes_code() {
        let json = serde_json::to_value(StatusError::unauthorized()).unwrap();
        assert_eq!(json, serde_json::json!({"code": 401}));
    }

    #[test]
    fn test_sse_error_conversion() {
        let err: Error = daedalus_sse::SseError::Disconnected.into();
        assert!(matches!(err, Error::ClientDisconnected));
        assert!(err.is_transport());
    }
}
