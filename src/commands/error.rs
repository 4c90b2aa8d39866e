//! Error types for the command pipeline.

use thiserror::Error;

use crate::error::StoreError;

/// Error type for command pipeline operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// A referenced aggregate does not exist or is not visible.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
    /// Lost an optimistic-concurrency race; the client should retry.
    #[error("conflict: {0}")]
    Conflict(StoreError),
    /// Storage or serialization fault.
    #[error("store error: {0}")]
    Store(StoreError),
    /// Business logic rejected the command.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        if err.is_conflict() {
            CommandError::Conflict(err)
        } else {
            CommandError::Store(err)
        }
    }
}

impl CommandError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        CommandError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            CommandError::NotFound { .. } => 404,
            CommandError::Conflict(_) => 409,
            CommandError::Store(_) => 500,
            CommandError::Rejected(_) => 422,
        }
    }
}
