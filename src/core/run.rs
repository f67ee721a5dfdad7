//! Run result models - station results and the aggregated pipeline run

use crate::core::payload::StationPayload;
use crate::core::station::StationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of a station failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Upstream station failed, this one was never invoked
    DependencyUnsatisfied,
    /// Model call exceeded its deadline
    InvocationTimeout,
    /// Transport or provider error on the model call
    InvocationTransport,
    /// Model returned a payload that failed schema validation
    OutputSchemaMismatch,
    /// Catch-all
    Unclassified,
}

/// Outcome of one station execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StationStatus {
    Completed,
    Failed { kind: FailureKind, message: String },
}

impl StationStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, StationStatus::Completed)
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            StationStatus::Completed => None,
            StationStatus::Failed { kind, .. } => Some(*kind),
        }
    }
}

/// Immutable record of one station execution within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationResult {
    pub station: StationId,
    pub name: String,
    pub status: StationStatus,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
    pub payload: StationPayload,
}

impl StationResult {
    pub fn completed(
        station: StationId,
        name: &str,
        duration_ms: u64,
        payload: StationPayload,
    ) -> Self {
        Self {
            station,
            name: name.to_string(),
            status: StationStatus::Completed,
            duration_ms,
            completed_at: Utc::now(),
            payload,
        }
    }

    pub fn failed(
        station: StationId,
        name: &str,
        duration_ms: u64,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            station,
            name: name.to_string(),
            status: StationStatus::Failed {
                kind,
                message: message.into(),
            },
            duration_ms,
            completed_at: Utc::now(),
            payload: StationPayload::Missing,
        }
    }
}

/// Aggregated result of one pipeline invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Unique run identifier
    pub run_id: Uuid,

    /// Project name from the RunConfig
    pub project: String,

    /// Station results ordered by ordinal
    pub results: Vec<StationResult>,

    /// How many stations reached `Completed`
    pub stations_completed: usize,

    /// Wall-clock elapsed time for the whole run (not the per-station sum)
    pub total_execution_ms: u64,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PipelineRun {
    pub fn result_for(&self, station: StationId) -> Option<&StationResult> {
        self.results.iter().find(|r| r.station == station)
    }

    pub fn failed_results(&self) -> Vec<&StationResult> {
        self.results
            .iter()
            .filter(|r| !r.status.is_completed())
            .collect()
    }
}
