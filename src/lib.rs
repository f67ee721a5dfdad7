//! dramaturg - screenplay analysis pipeline driving staged LLM agents

pub mod agent;
pub mod cli;
pub mod core;
pub mod error;
pub mod execution;

// Re-export commonly used types
pub use agent::{
    AgentConfig, AgentRegistry, GenerateRequest, HttpModelClient, ModelClient, ModelClientConfig,
    ModelError,
};
pub use self::core::{
    FailureKind, OutputSchema, PipelineRun, RenderContext, RunConfig, RunFlags, ScriptContext,
    StationId, StationPayload, StationResult, StationSet, StationSpec, StationStatus,
};
pub use error::PipelineError;
pub use execution::{ExecutionEngine, ExecutionEvent, Fingerprint, ResultCache, StationExecutor};
