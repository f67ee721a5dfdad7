//! Typed station payloads
//!
//! Each station produces one concrete payload shape. The model returns raw
//! JSON; `OutputSchema::parse` turns it into the matching `StationPayload`
//! variant or reports a schema mismatch.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Expected output shape of a station, used for validation and prompt hints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSchema {
    Characters,
    Scenes,
    Dialogue,
    Themes,
    Conflict,
    Pacing,
    Report,
}

impl OutputSchema {
    pub fn name(&self) -> &'static str {
        match self {
            OutputSchema::Characters => "characters",
            OutputSchema::Scenes => "scenes",
            OutputSchema::Dialogue => "dialogue",
            OutputSchema::Themes => "themes",
            OutputSchema::Conflict => "conflict",
            OutputSchema::Pacing => "pacing",
            OutputSchema::Report => "report",
        }
    }

    /// Parse a raw model payload into the typed variant for this schema
    pub fn parse(&self, raw: &JsonValue) -> Result<StationPayload, serde_json::Error> {
        let value = raw.clone();
        match self {
            OutputSchema::Characters => {
                serde_json::from_value::<CharacterAnalysis>(value).map(StationPayload::Characters)
            }
            OutputSchema::Scenes => {
                serde_json::from_value::<SceneBreakdown>(value).map(StationPayload::Scenes)
            }
            OutputSchema::Dialogue => {
                serde_json::from_value::<DialogueAnalysis>(value).map(StationPayload::Dialogue)
            }
            OutputSchema::Themes => {
                serde_json::from_value::<ThemeAnalysis>(value).map(StationPayload::Themes)
            }
            OutputSchema::Conflict => {
                serde_json::from_value::<ConflictAnalysis>(value).map(StationPayload::Conflict)
            }
            OutputSchema::Pacing => {
                serde_json::from_value::<PacingAnalysis>(value).map(StationPayload::Pacing)
            }
            OutputSchema::Report => {
                serde_json::from_value::<FinalReport>(value).map(StationPayload::Report)
            }
        }
    }
}

/// Result payload of one station, keyed by station kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum StationPayload {
    Characters(CharacterAnalysis),
    Scenes(SceneBreakdown),
    Dialogue(DialogueAnalysis),
    Themes(ThemeAnalysis),
    Conflict(ConflictAnalysis),
    Pacing(PacingAnalysis),
    Report(FinalReport),
    /// Raw payload kept without validation (skip_validation runs)
    Unchecked(JsonValue),
    /// No payload: failed station, or substituted failed dependency
    Missing,
}

impl StationPayload {
    pub fn is_missing(&self) -> bool {
        matches!(self, StationPayload::Missing)
    }
}

/// Station 1: characters, relationships, narrative style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterAnalysis {
    pub characters: Vec<Character>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    pub narrative_style: NarrativeStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub from: String,
    pub to: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeStyle {
    pub tone: String,
    pub point_of_view: String,
    /// Share of the script that is spoken dialogue, 0.0..=1.0
    pub dialogue_ratio: f32,
}

/// Station 2: scene-by-scene breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneBreakdown {
    pub scenes: Vec<Scene>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub number: u32,
    pub heading: String,
    #[serde(default)]
    pub time_of_day: Option<String>,
    pub summary: String,
    #[serde(default)]
    pub characters: Vec<String>,
}

/// Station 3: per-character dialogue voice profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueAnalysis {
    pub voices: Vec<VoiceProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub character: String,
    pub register: String,
    /// How distinguishable this voice is from the rest of the cast, 0.0..=1.0
    pub distinctiveness: f32,
    #[serde(default)]
    pub sample_lines: Vec<String>,
}

/// Station 4: themes and motifs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeAnalysis {
    pub themes: Vec<Theme>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub statement: String,
    #[serde(default)]
    pub evidence: Vec<String>,
}

/// Station 5: conflicts and the dramatic tension curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictAnalysis {
    pub conflicts: Vec<Conflict>,
    #[serde(default)]
    pub tension_curve: Vec<TensionPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub description: String,
    pub parties: Vec<String>,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensionPoint {
    pub scene: u32,
    pub tension: f32,
}

/// Station 6: pacing and rhythm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingAnalysis {
    pub overall_tempo: String,
    #[serde(default)]
    pub scene_tempos: Vec<SceneTempo>,
    #[serde(default)]
    pub slow_sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneTempo {
    pub scene: u32,
    pub tempo: String,
}

/// Station 7: synthesized final report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub logline: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    pub verdict: String,
}
