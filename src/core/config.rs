//! Run configuration - one per pipeline invocation, immutable for its lifetime

use crate::core::station::StationId;
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// Language tags the analysis prompts are written for
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "de", "fr", "es", "it", "pt", "tr"];

/// Configuration for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Project name, echoed into the run result
    pub project: String,

    /// Full screenplay source text
    pub script: String,

    /// Language tag of the script (see `SUPPORTED_LANGUAGES`)
    #[serde(default = "default_language")]
    pub language: String,

    /// Free-form context hints for the prompts
    #[serde(default)]
    pub context: ScriptContext,

    /// Run-level flags
    #[serde(default)]
    pub flags: RunFlags,

    /// Per-station agent overrides
    #[serde(default)]
    pub overrides: Vec<AgentOverride>,
}

fn default_language() -> String {
    "en".to_string()
}

/// Optional script metadata forwarded into prompt templates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptContext {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub scene_hints: Option<String>,
}

/// Flags controlling one run
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunFlags {
    /// When false, the run returns immediately with zero station results
    #[serde(default = "default_true")]
    pub run_stations: bool,

    /// Execute mutually independent stations concurrently
    #[serde(default)]
    pub fast_mode: bool,

    /// Skip payload validation and proceed past failed dependencies
    #[serde(default)]
    pub skip_validation: bool,

    /// Forward execution events to registered observers
    #[serde(default)]
    pub verbose_logging: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RunFlags {
    fn default() -> Self {
        Self {
            run_stations: true,
            fast_mode: false,
            skip_validation: false,
            verbose_logging: false,
        }
    }
}

/// Override of an agent's model parameters for a single run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOverride {
    pub station: StationId,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl RunConfig {
    pub fn new(project: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            script: script.into(),
            language: default_language(),
            context: ScriptContext::default(),
            flags: RunFlags::default(),
            overrides: Vec::new(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_context(mut self, context: ScriptContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_flags(mut self, flags: RunFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_override(mut self, station_override: AgentOverride) -> Self {
        self.overrides.push(station_override);
        self
    }

    /// Look up the override for a station, if any
    pub fn override_for(&self, station: StationId) -> Option<&AgentOverride> {
        self.overrides.iter().find(|o| o.station == station)
    }

    /// Validate the configuration before any station executes
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.script.trim().is_empty() {
            return Err(PipelineError::InvalidInput(
                "script text is empty".to_string(),
            ));
        }

        if !SUPPORTED_LANGUAGES.contains(&self.language.as_str()) {
            return Err(PipelineError::InvalidInput(format!(
                "unknown language tag '{}'",
                self.language
            )));
        }

        for o in &self.overrides {
            if let Some(t) = o.temperature {
                if !(0.0..=2.0).contains(&t) {
                    return Err(PipelineError::InvalidInput(format!(
                        "temperature override {} for station {} is outside 0..=2",
                        t, o.station
                    )));
                }
            }
        }

        Ok(())
    }
}
