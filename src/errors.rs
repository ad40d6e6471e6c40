//! Core error taxonomy
//!
//! Every failure in the core falls into one of five buckets. Commands
//! propagate these with `anyhow::Context`, so the taxonomy stays
//! available for downcasting at the command boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// User input violates a stated invariant (bad hash shape,
    /// empty message, reserved branch name).
    #[error("{0}")]
    Validation(String),

    /// An expected file or object is missing.
    #[error("{0} not found")]
    NotFound(String),

    /// Stored data failed an integrity check: malformed header,
    /// length mismatch, hash mismatch, or zlib failure.
    /// Never auto-repaired.
    #[error("corrupt object: {0}")]
    Corruption(String),

    /// Operation is invalid against the current repository state
    /// (empty index on commit, deleting the current branch, ...).
    #[error("{0}")]
    State(String),

    /// Underlying filesystem error, surfaced verbatim.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }

    pub fn corruption(message: impl Into<String>) -> Self {
        CoreError::Corruption(message.into())
    }

    pub fn state(message: impl Into<String>) -> Self {
        CoreError::State(message.into())
    }
}
