//! Model invocation client - trait and request types

pub mod http_client;
pub mod registry;
pub mod response;

use crate::core::payload::OutputSchema;
use async_trait::async_trait;
use serde_json::Value as JsonValue;

pub use http_client::{HttpModelClient, ModelClientConfig};
pub use registry::{AgentConfig, AgentRegistry};
pub use response::ModelError;

/// One structured-generation request to the model provider
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Fully rendered prompt text
    pub prompt: String,

    /// Shape the caller expects back (forwarded as a prompt hint)
    pub schema: OutputSchema,

    /// Target model name
    pub model: String,

    /// Sampling temperature, 0..=2
    pub temperature: f32,

    /// Optional completion token bound
    pub max_tokens: Option<u32>,
}

/// Trait for model invocation - allows for different providers and test doubles
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a structured JSON payload for a rendered prompt
    async fn generate(&self, request: GenerateRequest) -> Result<JsonValue, ModelError>;

    /// One-shot unstructured review of free text (not part of the pipeline)
    async fn review(&self, text: &str) -> Result<String, ModelError>;
}
