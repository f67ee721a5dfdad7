//! Agent registry - static station-id → agent-config mapping
//!
//! Built once at process start and read-only afterwards. Construction fails
//! fast on duplicate station ids or out-of-range temperatures; `verify_covers`
//! checks a station set against the registry before the first run.

use crate::agent::GenerateRequest;
use crate::core::config::AgentOverride;
use crate::core::payload::OutputSchema;
use crate::core::station::{StationId, StationSet};
use crate::error::PipelineError;
use std::collections::HashMap;

/// Prompt template and model parameters bound to one station
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub station: StationId,
    pub prompt_template: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl AgentConfig {
    pub fn new(
        station: u8,
        prompt_template: &str,
        model: &str,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Self {
        Self {
            station: StationId::new(station),
            prompt_template: prompt_template.to_string(),
            model: model.to_string(),
            temperature,
            max_tokens,
        }
    }

    /// Render the prompt by substituting `{{ name }}` placeholders
    pub fn render_prompt(&self, variables: &HashMap<String, String>) -> String {
        let mut prompt = self.prompt_template.clone();
        for (key, value) in variables {
            let placeholder = format!("{{{{ {} }}}}", key);
            prompt = prompt.replace(&placeholder, value);
        }
        prompt
    }

    /// Clone this config with a run-level override applied
    pub fn with_override(&self, o: Option<&AgentOverride>) -> Self {
        let mut effective = self.clone();
        if let Some(o) = o {
            if let Some(model) = &o.model {
                effective.model = model.clone();
            }
            if let Some(temperature) = o.temperature {
                effective.temperature = temperature;
            }
            if let Some(max_tokens) = o.max_tokens {
                effective.max_tokens = Some(max_tokens);
            }
        }
        effective
    }

    /// Build the model request for a rendered prompt
    pub fn request(&self, prompt: String, schema: OutputSchema) -> GenerateRequest {
        GenerateRequest {
            prompt,
            schema,
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Immutable station-id → AgentConfig lookup
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: HashMap<StationId, AgentConfig>,
}

impl AgentRegistry {
    /// Build the registry, failing fast on duplicates and bad temperatures
    pub fn new(entries: Vec<AgentConfig>) -> Result<Self, PipelineError> {
        let mut agents: HashMap<StationId, AgentConfig> = HashMap::new();
        for entry in entries {
            if !(0.0..=2.0).contains(&entry.temperature) {
                return Err(PipelineError::InvalidAgent {
                    station: entry.station,
                    reason: format!("temperature {} is outside 0..=2", entry.temperature),
                });
            }
            let station = entry.station;
            if agents.insert(station, entry).is_some() {
                return Err(PipelineError::DuplicateAgent(station));
            }
        }
        Ok(Self { agents })
    }

    /// Look up the agent config for a station
    pub fn config_for(&self, station: StationId) -> Result<&AgentConfig, PipelineError> {
        self.agents
            .get(&station)
            .ok_or(PipelineError::MissingAgent(station))
    }

    /// Check that every station in the set has an agent config
    pub fn verify_covers(&self, stations: &StationSet) -> Result<(), PipelineError> {
        for id in stations.ids() {
            if !self.agents.contains_key(&id) {
                return Err(PipelineError::MissingAgent(id));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// The built-in agents for the seven standard stations
    pub fn standard() -> Result<Self, PipelineError> {
        Self::new(vec![
            AgentConfig::new(1, CHARACTERS_PROMPT, "gpt-4o", 0.3, Some(4096)),
            AgentConfig::new(2, SCENES_PROMPT, "gpt-4o", 0.2, Some(8192)),
            AgentConfig::new(3, DIALOGUE_PROMPT, "gpt-4o", 0.4, Some(4096)),
            AgentConfig::new(4, THEMES_PROMPT, "gpt-4o", 0.6, Some(2048)),
            AgentConfig::new(5, CONFLICT_PROMPT, "gpt-4o", 0.4, Some(4096)),
            AgentConfig::new(6, PACING_PROMPT, "gpt-4o-mini", 0.3, Some(2048)),
            AgentConfig::new(7, REPORT_PROMPT, "gpt-4o", 0.7, Some(4096)),
        ])
    }
}

const CHARACTERS_PROMPT: &str = "\
You are a dramaturg analyzing the screenplay \"{{ title }}\" ({{ language }}).
List every character with their dramatic role, map the relationships between
them, and describe the narrative style (tone, point of view, dialogue ratio).

SCRIPT:
{{ script }}";

const SCENES_PROMPT: &str = "\
Break the screenplay into scenes: number, heading, time of day, a one-sentence
summary, and the characters present. Use the established character list.

CHARACTERS:
{{ stations.1.output }}

SCRIPT:
{{ script }}";

const DIALOGUE_PROMPT: &str = "\
Profile the dialogue voice of each named character: register, how
distinguishable the voice is from the rest of the cast, and sample lines.

CHARACTERS:
{{ stations.1.output }}

SCRIPT:
{{ script }}";

const THEMES_PROMPT: &str = "\
Identify the themes and recurring motifs, each with a one-line thematic
statement and scene-level evidence.

SCENES:
{{ stations.2.output }}

SCRIPT:
{{ script }}";

const CONFLICT_PROMPT: &str = "\
Describe the central and secondary conflicts (parties, kind) and chart the
dramatic tension scene by scene.

SCENES:
{{ stations.2.output }}

DIALOGUE:
{{ stations.3.output }}

SCRIPT:
{{ script }}";

const PACING_PROMPT: &str = "\
Assess the pacing: overall tempo, per-scene tempo, and any sections that drag.

THEMES:
{{ stations.4.output }}

CONFLICT:
{{ stations.5.output }}

SCRIPT:
{{ script }}";

const REPORT_PROMPT: &str = "\
Synthesize the station analyses into a final report for \"{{ title }}\":
logline, strengths, weaknesses, and a verdict.

CHARACTERS: {{ stations.1.output }}
SCENES: {{ stations.2.output }}
DIALOGUE: {{ stations.3.output }}
THEMES: {{ stations.4.output }}
CONFLICT: {{ stations.5.output }}
PACING: {{ stations.6.output }}

SCRIPT:
{{ script }}";
