//! Insertion errors.

use thiserror::Error;

/// Errors raised while inserting a pattern into the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    /// The (method, pattern) slot is already taken.
    #[error("route already registered: {method} {pattern}")]
    Duplicate {
        /// Method label (`ANY` for the any-method slot).
        method: String,
        /// Normalized pattern.
        pattern: String,
    },

    /// A wildcard segment was followed by further segments.
    #[error("wildcard must be the last segment in {pattern}")]
    WildcardNotLast {
        /// Offending pattern.
        pattern: String,
    },

    /// Two patterns name the parameter at the same position differently.
    #[error("parameter :{new} in {pattern} conflicts with existing :{existing}")]
    ParamConflict {
        /// Name already registered at this position.
        existing: String,
        /// Name requested by the new pattern.
        new: String,
        /// Offending pattern.
        pattern: String,
    },
}
