//! Server error types.

use daedalus_router::InsertError;
use thiserror::Error;

/// Errors raised while compiling registered routes.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Two routes claim the same method and normalized pattern.
    #[error("duplicate route: {method} {pattern}")]
    DuplicateRoute {
        /// Method label, `ANY` for method-agnostic routes.
        method: String,
        /// Normalized pattern.
        pattern: String,
    },

    /// A pattern cannot be placed in the dispatch table.
    #[error("invalid route pattern {pattern}: {reason}")]
    InvalidPattern {
        /// The pattern as registered.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl From<InsertError> for RouterError {
    fn from(err: InsertError) -> Self {
        let reason = err.to_string();
        match err {
            InsertError::Duplicate { method, pattern } => Self::DuplicateRoute { method, pattern },
            InsertError::WildcardNotLast { pattern } | InsertError::ParamConflict { pattern, .. } => {
                Self::InvalidPattern { pattern, reason }
            }
        }
    }
}

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the configured address.
    #[error("Failed to bind: {0}")]
    BindError(String),

    /// The route table failed to compile.
    #[error(transparent)]
    Router(#[from] RouterError),

    /// Configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] daedalus_config::ConfigError),

    /// Logging could not be installed.
    #[error(transparent)]
    Telemetry(#[from] daedalus_telemetry::TelemetryError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_from_insert_error() {
        let err: RouterError = InsertError::Duplicate {
            method: "GET".to_string(),
            pattern: "/posts".to_string(),
        }
        .into();
        assert!(matches!(err, RouterError::DuplicateRoute { .. }));
        assert_eq!(err.to_string(), "duplicate route: GET /posts");
    }

    #[test]
    fn test_wildcard_from_insert_error() {
        let err: RouterError = InsertError::WildcardNotLast {
            pattern: "/a/*rest/b".to_string(),
        }
        .into();
        assert!(matches!(err, RouterError::InvalidPattern { ref pattern, .. } if pattern == "/a/*rest/b"));
    }

    #[test]
    fn test_server_error_display() {
        let err = ServerError::BindError("address in use".to_string());
        assert_eq!(err.to_string(), "Failed to bind: address in use");
    }
}
