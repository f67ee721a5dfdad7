//! Station domain model - specs, dependency graph, topological order

use crate::core::payload::OutputSchema;
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Stable identifier for an analysis station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StationId(u8);

impl StationId {
    pub const fn new(id: u8) -> Self {
        StationId(id)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One discrete analysis stage in the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationSpec {
    /// Stable station identifier
    pub id: StationId,

    /// Human-readable station name
    pub name: String,

    /// Ordinal position in the pipeline (strictly increases along dependency edges)
    pub ordinal: usize,

    /// Stations whose results this station consumes
    pub depends_on: Vec<StationId>,

    /// Expected shape of this station's output payload
    pub schema: OutputSchema,
}

impl StationSpec {
    pub fn new(
        id: u8,
        name: &str,
        ordinal: usize,
        depends_on: &[u8],
        schema: OutputSchema,
    ) -> Self {
        Self {
            id: StationId::new(id),
            name: name.to_string(),
            ordinal,
            depends_on: depends_on.iter().copied().map(StationId::new).collect(),
            schema,
        }
    }
}

/// Validated set of station specs with a precomputed execution order
#[derive(Debug, Clone)]
pub struct StationSet {
    specs: HashMap<StationId, StationSpec>,
    order: Vec<StationId>,
}

impl StationSet {
    /// Build a station set, failing fast on duplicate ids, unresolved
    /// dependencies, non-increasing ordinals, or cycles.
    pub fn new(specs: Vec<StationSpec>) -> Result<Self, PipelineError> {
        let mut by_id: HashMap<StationId, StationSpec> = HashMap::new();
        for spec in specs {
            let id = spec.id;
            if by_id.insert(id, spec).is_some() {
                return Err(PipelineError::Graph(format!("duplicate station id {id}")));
            }
        }

        for spec in by_id.values() {
            for dep in &spec.depends_on {
                let dep_spec = by_id.get(dep).ok_or_else(|| {
                    PipelineError::Graph(format!(
                        "station {} depends on unknown station {}",
                        spec.id, dep
                    ))
                })?;
                if dep_spec.ordinal >= spec.ordinal {
                    return Err(PipelineError::Graph(format!(
                        "station {} (ordinal {}) depends on station {} (ordinal {})",
                        spec.id, spec.ordinal, dep, dep_spec.ordinal
                    )));
                }
            }
        }

        let order = Self::topological_order(&by_id)?;

        Ok(Self { specs: by_id, order })
    }

    /// The seven standard screenplay analysis stations
    pub fn standard() -> Result<Self, PipelineError> {
        Self::new(vec![
            StationSpec::new(1, "Characters & Narrative Style", 1, &[], OutputSchema::Characters),
            StationSpec::new(2, "Scene Breakdown", 2, &[1], OutputSchema::Scenes),
            StationSpec::new(3, "Dialogue Voices", 3, &[1], OutputSchema::Dialogue),
            StationSpec::new(4, "Themes & Motifs", 4, &[2], OutputSchema::Themes),
            StationSpec::new(5, "Conflict & Tension", 5, &[2, 3], OutputSchema::Conflict),
            StationSpec::new(6, "Pacing & Rhythm", 6, &[4, 5], OutputSchema::Pacing),
            StationSpec::new(7, "Final Report", 7, &[1, 2, 3, 4, 5, 6], OutputSchema::Report),
        ])
    }

    /// Get a station spec by id
    pub fn spec(&self, id: StationId) -> Option<&StationSpec> {
        self.specs.get(&id)
    }

    /// Execution order (topological, ascending ordinal among ready stations)
    pub fn order(&self) -> &[StationId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = StationId> + '_ {
        self.order.iter().copied()
    }

    /// Kahn's algorithm with a stable tie-break: among stations with no
    /// remaining dependency edge, lowest ordinal first.
    fn topological_order(
        specs: &HashMap<StationId, StationSpec>,
    ) -> Result<Vec<StationId>, PipelineError> {
        let mut in_degree: HashMap<StationId, usize> = specs
            .values()
            .map(|s| (s.id, s.depends_on.len()))
            .collect();
        let mut dependents: HashMap<StationId, Vec<StationId>> = HashMap::new();
        for spec in specs.values() {
            for dep in &spec.depends_on {
                dependents.entry(*dep).or_default().push(spec.id);
            }
        }

        let mut ready: Vec<StationId> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(id, _)| *id)
            .collect();
        ready.sort_by_key(|id| specs[id].ordinal);

        let mut order = Vec::with_capacity(specs.len());
        let mut seen: HashSet<StationId> = HashSet::new();

        while !ready.is_empty() {
            let next = ready.remove(0);
            order.push(next);
            seen.insert(next);

            if let Some(children) = dependents.get(&next) {
                for child in children {
                    if let Some(deg) = in_degree.get_mut(child) {
                        *deg -= 1;
                        if *deg == 0 {
                            ready.push(*child);
                        }
                    }
                }
            }
            ready.sort_by_key(|id| specs[id].ordinal);
        }

        if order.len() != specs.len() {
            let stuck: Vec<String> = specs
                .keys()
                .filter(|id| !seen.contains(id))
                .map(|id| id.to_string())
                .collect();
            return Err(PipelineError::Graph(format!(
                "dependency cycle involving stations {}",
                stuck.join(", ")
            )));
        }

        Ok(order)
    }
}
