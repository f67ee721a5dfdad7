//! Result cache - deduplicates identical model invocations
//!
//! Keyed by a deterministic fingerprint of the effective invocation
//! parameters. At most one computation per fingerprint runs at a time;
//! concurrent requests for the same fingerprint wait for and share the
//! in-flight result. Failures are not cached, so a later request retries.

use crate::agent::response::ModelError;
use crate::core::station::StationId;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::debug;

/// Deterministic key for one model invocation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash the effective invocation parameters into a stable hex digest
    pub fn compute(
        station: StationId,
        prompt: &str,
        model: &str,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([station.get()]);
        hasher.update([0u8]);
        hasher.update(prompt.as_bytes());
        hasher.update([0u8]);
        hasher.update(model.as_bytes());
        hasher.update([0u8]);
        hasher.update(temperature.to_bits().to_le_bytes());
        hasher.update(max_tokens.unwrap_or(0).to_le_bytes());

        let digest = hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<String>();
        Fingerprint(digest)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Per-fingerprint cell; stays empty until a computation succeeds
type Cell = Arc<OnceCell<JsonValue>>;

struct CacheState {
    cells: HashMap<Fingerprint, Cell>,
    access_order: Vec<Fingerprint>,
}

impl CacheState {
    fn touch(&mut self, fingerprint: &Fingerprint) {
        if let Some(pos) = self.access_order.iter().position(|f| f == fingerprint) {
            self.access_order.remove(pos);
        }
        self.access_order.push(fingerprint.clone());
    }

    fn evict_to(&mut self, capacity: usize) {
        while self.cells.len() > capacity && !self.access_order.is_empty() {
            let oldest = self.access_order.remove(0);
            self.cells.remove(&oldest);
        }
    }
}

/// In-process cache of successful model payloads with LRU eviction.
///
/// The map is guarded by a plain mutex held only for lookups and inserts;
/// the computation itself runs unlocked inside the per-fingerprint cell.
pub struct ResultCache {
    state: Mutex<CacheState>,
    capacity: usize,
}

impl ResultCache {
    /// Capacity large enough to act unbounded within a single run
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                cells: HashMap::new(),
                access_order: Vec::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Return the cached payload for `fingerprint`, or run `compute` to
    /// produce it. Concurrent callers with the same fingerprint share one
    /// computation; a failed computation leaves the cell empty for retries.
    pub async fn get_or_compute<F, Fut>(
        &self,
        fingerprint: &Fingerprint,
        compute: F,
    ) -> Result<JsonValue, ModelError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<JsonValue, ModelError>>,
    {
        let cell = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| ModelError::Internal("result cache mutex poisoned".to_string()))?;
            state.touch(fingerprint);
            let cell = state
                .cells
                .entry(fingerprint.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone();
            state.evict_to(self.capacity);
            cell
        };

        if cell.initialized() {
            debug!(fingerprint = fingerprint.as_str(), "cache hit");
        }

        cell.get_or_try_init(compute).await.cloned()
    }

    /// Number of fingerprints currently tracked (including in-flight ones)
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.cells.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}
