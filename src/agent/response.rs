//! Model client error types

use crate::core::run::FailureKind;
use thiserror::Error;

/// Error types for model invocations
#[derive(Debug, Error)]
pub enum ModelError {
    /// Network-level failure or non-success HTTP status
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider rejected the request
    #[error("API error: {0}")]
    Api(String),

    /// Call exceeded its deadline
    #[error("timeout after {0} seconds")]
    Timeout(u64),

    /// Provider answered, but the body was not the expected JSON payload
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Anything else
    #[error("internal error: {0}")]
    Internal(String),
}

impl ModelError {
    /// Map the client-side error onto the station failure classification
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ModelError::Transport(_) | ModelError::Api(_) => FailureKind::InvocationTransport,
            ModelError::Timeout(_) => FailureKind::InvocationTimeout,
            ModelError::Malformed(_) => FailureKind::OutputSchemaMismatch,
            ModelError::Internal(_) => FailureKind::Unclassified,
        }
    }
}
