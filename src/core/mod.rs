//! Core domain models
//!
//! Defines the station graph, typed payloads, run configuration, and the
//! result structures the orchestrator aggregates.

pub mod config;
pub mod context;
pub mod payload;
pub mod run;
pub mod station;

pub use config::{AgentOverride, RunConfig, RunFlags, ScriptContext};
pub use context::RenderContext;
pub use payload::{OutputSchema, StationPayload};
pub use run::{FailureKind, PipelineRun, StationResult, StationStatus};
pub use station::{StationId, StationSet, StationSpec};
