//! Shared helpers: deterministic mock model client and canned payloads

// Each integration test crate compiles this module separately and uses a
// different subset of it.
#![allow(dead_code)]

use async_trait::async_trait;
use dramaturg::core::payload::{
    CharacterAnalysis, ConflictAnalysis, DialogueAnalysis, FinalReport, NarrativeStyle,
    PacingAnalysis, SceneBreakdown, ThemeAnalysis,
};
use dramaturg::{
    AgentRegistry, ExecutionEngine, GenerateRequest, ModelClient, ModelError, OutputSchema,
    RunConfig, StationSet,
};
use serde_json::{json, Value as JsonValue};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Mock model client returning canned, schema-valid payloads.
///
/// Useful for:
/// - fast, deterministic runs without a provider
/// - failure injection per schema
/// - call-count assertions (cache and dependency-skip behavior)
pub struct MockModelClient {
    calls: Arc<AtomicUsize>,
    fail_schemas: HashSet<OutputSchema>,
    garbage_schemas: HashSet<OutputSchema>,
    delay: Option<Duration>,
}

impl MockModelClient {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail_schemas: HashSet::new(),
            garbage_schemas: HashSet::new(),
            delay: None,
        }
    }

    /// Fail every call for this schema with a transport error
    pub fn failing(mut self, schema: OutputSchema) -> Self {
        self.fail_schemas.insert(schema);
        self
    }

    /// Answer calls for this schema with JSON that fails validation
    pub fn garbage(mut self, schema: OutputSchema) -> Self {
        self.garbage_schemas.insert(schema);
        self
    }

    /// Add artificial latency to every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared call counter, survives moving the client into an engine
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl Default for MockModelClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn generate(&self, request: GenerateRequest) -> Result<JsonValue, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_schemas.contains(&request.schema) {
            return Err(ModelError::Transport("injected failure".to_string()));
        }
        if self.garbage_schemas.contains(&request.schema) {
            return Ok(json!({"not": "the expected shape"}));
        }
        Ok(sample_payload(request.schema))
    }

    async fn review(&self, _text: &str) -> Result<String, ModelError> {
        Ok("tight second act, weak ending".to_string())
    }
}

/// Schema-valid canned payload for each station
pub fn sample_payload(schema: OutputSchema) -> JsonValue {
    let typed = match schema {
        OutputSchema::Characters => serde_json::to_value(CharacterAnalysis {
            characters: vec![],
            relationships: vec![],
            narrative_style: NarrativeStyle {
                tone: "spare".to_string(),
                point_of_view: "objective".to_string(),
                dialogue_ratio: 0.58,
            },
        }),
        OutputSchema::Scenes => serde_json::to_value(SceneBreakdown { scenes: vec![] }),
        OutputSchema::Dialogue => serde_json::to_value(DialogueAnalysis { voices: vec![] }),
        OutputSchema::Themes => serde_json::to_value(ThemeAnalysis { themes: vec![] }),
        OutputSchema::Conflict => serde_json::to_value(ConflictAnalysis {
            conflicts: vec![],
            tension_curve: vec![],
        }),
        OutputSchema::Pacing => serde_json::to_value(PacingAnalysis {
            overall_tempo: "even".to_string(),
            scene_tempos: vec![],
            slow_sections: vec![],
        }),
        OutputSchema::Report => serde_json::to_value(FinalReport {
            logline: "a family unravels over one dinner".to_string(),
            strengths: vec![],
            weaknesses: vec![],
            verdict: "promising".to_string(),
        }),
    };
    typed.expect("canned payloads serialize")
}

pub const SAMPLE_SCRIPT: &str = "\
INT. KITCHEN - NIGHT

NORA scrapes burnt toast into the sink. HELMER watches from the doorway.

HELMER
You were out again.

NORA
The bakery was closed.";

/// Engine over the standard stations and registry with the given client
pub fn engine_with(client: MockModelClient) -> ExecutionEngine<MockModelClient> {
    ExecutionEngine::new(
        StationSet::standard().expect("standard stations are valid"),
        AgentRegistry::standard().expect("standard registry is valid"),
        client,
    )
    .expect("registry covers standard stations")
}

pub fn sample_config() -> RunConfig {
    RunConfig::new("dollhouse", SAMPLE_SCRIPT)
}
