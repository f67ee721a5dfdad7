//! Pipeline-level error types

use crate::core::station::StationId;
use thiserror::Error;

/// Errors that abort a run before any station executes, plus fail-fast
/// construction errors for the registry and station graph.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed RunConfig, detected during validation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Station graph is inconsistent (duplicate ids, cycles, bad ordinals)
    #[error("station graph error: {0}")]
    Graph(String),

    /// Two registry entries share a station identifier
    #[error("duplicate agent config for station {0}")]
    DuplicateAgent(StationId),

    /// A station spec has no matching agent config
    #[error("no agent config for station {0}")]
    MissingAgent(StationId),

    /// Agent config rejected at registry construction
    #[error("invalid agent config for station {station}: {reason}")]
    InvalidAgent { station: StationId, reason: String },
}
