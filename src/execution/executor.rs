//! Station executor - runs one station against the model client
//!
//! Never fails outward: every rendering, transport, and validation error is
//! folded into a `failed` StationResult so the orchestrator's loop stays
//! uniform.

use crate::agent::{AgentConfig, ModelClient};
use crate::core::context::RenderContext;
use crate::core::payload::StationPayload;
use crate::core::run::{FailureKind, StationResult};
use crate::core::station::StationSpec;
use crate::execution::cache::{Fingerprint, ResultCache};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Executes a single station
pub struct StationExecutor<C> {
    client: Arc<C>,
    cache: Arc<ResultCache>,
    call_timeout: Duration,
}

impl<C: ModelClient> StationExecutor<C> {
    /// Default deadline for one model call
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    pub fn new(client: C) -> Self {
        Self {
            client: Arc::new(client),
            cache: Arc::new(ResultCache::new()),
            call_timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Execute one station: render, fingerprint, invoke through the cache,
    /// validate, classify. Elapsed time covers cache lookup through
    /// completion.
    pub async fn execute(
        &self,
        spec: &StationSpec,
        agent: &AgentConfig,
        inputs: &RenderContext,
        skip_validation: bool,
    ) -> StationResult {
        let started = Instant::now();

        let prompt = agent.render_prompt(&inputs.rendering_variables());
        let fingerprint = Fingerprint::compute(
            spec.id,
            &prompt,
            &agent.model,
            agent.temperature,
            agent.max_tokens,
        );
        debug!(station = %spec.id, fingerprint = fingerprint.as_str(), "executing station");

        let request = agent.request(prompt, spec.schema);
        let client = Arc::clone(&self.client);
        let call_timeout = self.call_timeout;
        let timeout_secs = call_timeout.as_secs();

        let outcome = self
            .cache
            .get_or_compute(&fingerprint, move || async move {
                match timeout(call_timeout, client.generate(request)).await {
                    Ok(result) => result,
                    Err(_) => Err(crate::agent::ModelError::Timeout(timeout_secs)),
                }
            })
            .await;

        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(raw) => match spec.schema.parse(&raw) {
                Ok(payload) => {
                    StationResult::completed(spec.id, &spec.name, duration_ms, payload)
                }
                Err(_) if skip_validation => StationResult::completed(
                    spec.id,
                    &spec.name,
                    duration_ms,
                    StationPayload::Unchecked(raw),
                ),
                Err(e) => {
                    warn!(station = %spec.id, error = %e, "payload failed schema validation");
                    StationResult::failed(
                        spec.id,
                        &spec.name,
                        duration_ms,
                        FailureKind::OutputSchemaMismatch,
                        e.to_string(),
                    )
                }
            },
            Err(e) => {
                warn!(station = %spec.id, error = %e, "model invocation failed");
                StationResult::failed(
                    spec.id,
                    &spec.name,
                    duration_ms,
                    e.failure_kind(),
                    e.to_string(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{GenerateRequest, ModelError};
    use crate::core::payload::OutputSchema;
    use crate::core::run::StationStatus;
    use async_trait::async_trait;
    use serde_json::{json, Value as JsonValue};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClient {
        response: Result<JsonValue, &'static str>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl FixedClient {
        fn ok(value: JsonValue) -> Self {
            Self {
                response: Ok(value),
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn err(message: &'static str) -> Self {
            Self {
                response: Err(message),
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ModelClient for FixedClient {
        async fn generate(&self, _request: GenerateRequest) -> Result<JsonValue, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.response {
                Ok(value) => Ok(value.clone()),
                Err(message) => Err(ModelError::Transport(message.to_string())),
            }
        }

        async fn review(&self, _text: &str) -> Result<String, ModelError> {
            Ok("fine".to_string())
        }
    }

    fn themes_spec() -> StationSpec {
        StationSpec::new(4, "Themes & Motifs", 4, &[2], OutputSchema::Themes)
    }

    fn agent() -> AgentConfig {
        AgentConfig::new(4, "Find themes in {{ script }}", "test-model", 0.4, None)
    }

    #[tokio::test]
    async fn test_completed_station_carries_typed_payload() {
        let client = FixedClient::ok(json!({"themes": [
            {"name": "guilt", "statement": "guilt corrodes"}
        ]}));
        let executor = StationExecutor::new(client);

        let result = executor
            .execute(&themes_spec(), &agent(), &RenderContext::new(), false)
            .await;

        assert!(result.status.is_completed());
        assert!(matches!(result.payload, StationPayload::Themes(_)));
    }

    #[tokio::test]
    async fn test_transport_error_is_classified() {
        let client = FixedClient::err("connection reset");
        let executor = StationExecutor::new(client);

        let result = executor
            .execute(&themes_spec(), &agent(), &RenderContext::new(), false)
            .await;

        assert_eq!(
            result.status.failure_kind(),
            Some(FailureKind::InvocationTransport)
        );
        assert!(result.payload.is_missing());
    }

    #[tokio::test]
    async fn test_schema_mismatch_fails_validation() {
        let client = FixedClient::ok(json!({"unexpected": true}));
        let executor = StationExecutor::new(client);

        let result = executor
            .execute(&themes_spec(), &agent(), &RenderContext::new(), false)
            .await;

        assert_eq!(
            result.status.failure_kind(),
            Some(FailureKind::OutputSchemaMismatch)
        );
    }

    #[tokio::test]
    async fn test_skip_validation_keeps_raw_payload() {
        let client = FixedClient::ok(json!({"unexpected": true}));
        let executor = StationExecutor::new(client);

        let result = executor
            .execute(&themes_spec(), &agent(), &RenderContext::new(), true)
            .await;

        assert!(result.status.is_completed());
        assert_eq!(
            result.payload,
            StationPayload::Unchecked(json!({"unexpected": true}))
        );
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let mut client = FixedClient::ok(json!({"themes": []}));
        client.delay = Some(Duration::from_millis(200));
        let executor =
            StationExecutor::new(client).with_call_timeout(Duration::from_millis(20));

        let result = executor
            .execute(&themes_spec(), &agent(), &RenderContext::new(), false)
            .await;

        assert_eq!(
            result.status.failure_kind(),
            Some(FailureKind::InvocationTimeout)
        );
    }

    #[tokio::test]
    async fn test_identical_inputs_hit_cache() {
        let client = FixedClient::ok(json!({"themes": []}));
        let executor = StationExecutor::new(client);
        let ctx = RenderContext::new();

        let first = executor.execute(&themes_spec(), &agent(), &ctx, false).await;
        let second = executor.execute(&themes_spec(), &agent(), &ctx, false).await;

        assert_eq!(first.payload, second.payload);
        assert!(matches!(second.status, StationStatus::Completed));
        // StationExecutor owns the client, so count through the cache size
        assert_eq!(executor.cache().len(), 1);
    }
}
