//! Render context - resolved inputs for a station's prompt template

use crate::core::config::RunConfig;
use crate::core::payload::StationPayload;
use crate::core::station::StationId;
use std::collections::HashMap;

/// Variables available to a station's prompt template.
///
/// Carries the run-level fields (script text, project, language, context
/// hints) plus the serialized payloads of the station's dependencies,
/// exposed as `stations.N.output`.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    variables: HashMap<String, String>,
    station_outputs: HashMap<StationId, String>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the run-level variables from a RunConfig
    pub fn for_run(config: &RunConfig) -> Self {
        let mut ctx = Self::new();
        ctx.set_variable("script", &config.script);
        ctx.set_variable("project", &config.project);
        ctx.set_variable("language", &config.language);
        if let Some(title) = &config.context.title {
            ctx.set_variable("title", title);
        }
        if let Some(author) = &config.context.author {
            ctx.set_variable("author", author);
        }
        if let Some(genre) = &config.context.genre {
            ctx.set_variable("genre", genre);
        }
        if let Some(hints) = &config.context.scene_hints {
            ctx.set_variable("scene_hints", hints);
        }
        ctx
    }

    pub fn set_variable(&mut self, key: &str, value: &str) {
        self.variables.insert(key.to_string(), value.to_string());
    }

    pub fn variable(&self, key: &str) -> Option<&String> {
        self.variables.get(key)
    }

    /// Record a dependency's payload, serialized for prompt substitution
    pub fn set_station_output(&mut self, station: StationId, payload: &StationPayload) {
        let rendered = serde_json::to_string(payload).unwrap_or_default();
        self.station_outputs.insert(station, rendered);
    }

    pub fn station_output(&self, station: StationId) -> Option<&String> {
        self.station_outputs.get(&station)
    }

    /// All variables available for prompt rendering
    pub fn rendering_variables(&self) -> HashMap<String, String> {
        let mut vars = self.variables.clone();
        for (station, output) in &self.station_outputs {
            vars.insert(format!("stations.{}.output", station), output.clone());
        }
        vars
    }
}
