//! Execution engine - orchestrates one pipeline run
//!
//! Walks the station graph in topological waves, delegates each station to
//! the executor, and aggregates everything into a PipelineRun. Per-station
//! failures never abort the run; only RunConfig validation errors surface to
//! the caller.

use crate::agent::{AgentRegistry, ModelClient};
use crate::core::config::RunConfig;
use crate::core::context::RenderContext;
use crate::core::payload::StationPayload;
use crate::core::run::{FailureKind, PipelineRun, StationResult};
use crate::core::station::{StationId, StationSet, StationSpec};
use crate::error::PipelineError;
use crate::execution::executor::StationExecutor;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events emitted to observability collaborators during a run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        project: String,
    },
    StationStarted {
        station: StationId,
        name: String,
    },
    StationCompleted {
        station: StationId,
        duration_ms: u64,
    },
    StationFailed {
        station: StationId,
        kind: FailureKind,
        message: String,
    },
    RunFinished {
        run_id: Uuid,
        stations_completed: usize,
        total_execution_ms: u64,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Pipeline orchestrator
pub struct ExecutionEngine<C> {
    stations: Arc<StationSet>,
    registry: Arc<AgentRegistry>,
    executor: Arc<StationExecutor<C>>,
    handlers: Mutex<Vec<EventHandler>>,
}

impl<C: ModelClient + Send + Sync + 'static> ExecutionEngine<C> {
    /// Build an engine, verifying that the registry covers every station
    pub fn new(
        stations: StationSet,
        registry: AgentRegistry,
        client: C,
    ) -> Result<Self, PipelineError> {
        registry.verify_covers(&stations)?;
        Ok(Self {
            stations: Arc::new(stations),
            registry: Arc::new(registry),
            executor: Arc::new(StationExecutor::new(client)),
            handlers: Mutex::new(Vec::new()),
        })
    }

    /// Replace the executor (custom cache or call timeout)
    pub fn with_executor(mut self, executor: StationExecutor<C>) -> Self {
        self.executor = Arc::new(executor);
        self
    }

    /// Register an observability handler; only invoked on verbose runs
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.push(Arc::new(handler));
        }
    }

    fn emit(&self, verbose: bool, event: ExecutionEvent) {
        debug!(?event, "execution event");
        if !verbose {
            return;
        }
        if let Ok(handlers) = self.handlers.lock() {
            for handler in handlers.iter() {
                handler(event.clone());
            }
        }
    }

    /// Run the pipeline to completion
    pub async fn run(&self, config: &RunConfig) -> Result<PipelineRun, PipelineError> {
        self.run_with_cancel(config, Arc::new(AtomicBool::new(false)))
            .await
    }

    /// Run the pipeline with an external cancellation signal. Once raised, no
    /// new station is issued; results produced so far are returned in a
    /// partial PipelineRun.
    pub async fn run_with_cancel(
        &self,
        config: &RunConfig,
        cancel: Arc<AtomicBool>,
    ) -> Result<PipelineRun, PipelineError> {
        config.validate()?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        let verbose = config.flags.verbose_logging;

        if !config.flags.run_stations {
            debug!(%run_id, "run_stations disabled, returning empty run");
            return Ok(PipelineRun {
                run_id,
                project: config.project.clone(),
                results: Vec::new(),
                stations_completed: 0,
                total_execution_ms: clock.elapsed().as_millis() as u64,
                started_at,
                finished_at: Utc::now(),
            });
        }

        info!(%run_id, project = %config.project, fast_mode = config.flags.fast_mode, "starting pipeline run");
        self.emit(
            verbose,
            ExecutionEvent::RunStarted {
                run_id,
                project: config.project.clone(),
            },
        );

        let mut done: HashMap<StationId, StationResult> = HashMap::new();
        let mut pending: Vec<StationId> = self.stations.order().to_vec();

        while !pending.is_empty() && !cancel.load(Ordering::SeqCst) {
            let ready: Vec<StationId> = pending
                .iter()
                .copied()
                .filter(|id| {
                    self.stations
                        .spec(*id)
                        .map(|s| s.depends_on.iter().all(|d| done.contains_key(d)))
                        .unwrap_or(false)
                })
                .collect();

            if ready.is_empty() {
                // Unreachable for a validated graph
                warn!("no runnable stations remain, aborting wave loop");
                break;
            }
            pending.retain(|id| !ready.contains(id));

            if config.flags.fast_mode {
                self.run_wave_parallel(&ready, config, &mut done, verbose)
                    .await;
            } else {
                for id in &ready {
                    if cancel.load(Ordering::SeqCst) {
                        pending.push(*id);
                        continue;
                    }
                    let result = self.run_station(*id, config, &done, verbose).await;
                    done.insert(*id, result);
                }
            }
        }

        let mut results: Vec<StationResult> = done.into_values().collect();
        results.sort_by_key(|r| {
            self.stations
                .spec(r.station)
                .map(|s| s.ordinal)
                .unwrap_or(usize::MAX)
        });

        let stations_completed = results.iter().filter(|r| r.status.is_completed()).count();
        let total_execution_ms = clock.elapsed().as_millis() as u64;

        info!(
            %run_id,
            stations_completed,
            total_execution_ms,
            "pipeline run finished"
        );
        self.emit(
            verbose,
            ExecutionEvent::RunFinished {
                run_id,
                stations_completed,
                total_execution_ms,
            },
        );

        Ok(PipelineRun {
            run_id,
            project: config.project.clone(),
            results,
            stations_completed,
            total_execution_ms,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Execute one wave of mutually independent stations concurrently
    async fn run_wave_parallel(
        &self,
        ready: &[StationId],
        config: &RunConfig,
        done: &mut HashMap<StationId, StationResult>,
        verbose: bool,
    ) {
        let mut join_set: JoinSet<StationResult> = JoinSet::new();

        for id in ready {
            // Dependency-failure and input resolution happen before spawning,
            // against the results of previous waves
            match self.prepare_station(*id, config, done, verbose) {
                Prepared::Skip(result) => {
                    done.insert(*id, result);
                }
                Prepared::Execute { spec, agent, ctx } => {
                    let executor = Arc::clone(&self.executor);
                    let skip_validation = config.flags.skip_validation;
                    join_set.spawn(async move {
                        executor.execute(&spec, &agent, &ctx, skip_validation).await
                    });
                }
            }
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(result) => {
                    self.emit_station_outcome(verbose, &result);
                    done.insert(result.station, result);
                }
                Err(e) => warn!(error = %e, "station task panicked or was cancelled"),
            }
        }
    }

    /// Execute one station sequentially
    async fn run_station(
        &self,
        id: StationId,
        config: &RunConfig,
        done: &HashMap<StationId, StationResult>,
        verbose: bool,
    ) -> StationResult {
        match self.prepare_station(id, config, done, verbose) {
            Prepared::Skip(result) => result,
            Prepared::Execute { spec, agent, ctx } => {
                let result = self
                    .executor
                    .execute(&spec, &agent, &ctx, config.flags.skip_validation)
                    .await;
                self.emit_station_outcome(verbose, &result);
                result
            }
        }
    }

    /// Resolve a station's dependencies and agent config, or synthesize a
    /// failed result without invoking the executor.
    fn prepare_station(
        &self,
        id: StationId,
        config: &RunConfig,
        done: &HashMap<StationId, StationResult>,
        verbose: bool,
    ) -> Prepared {
        let spec = match self.stations.spec(id) {
            Some(spec) => spec.clone(),
            None => {
                // Graph validation makes this unreachable
                return Prepared::Skip(StationResult::failed(
                    id,
                    "unknown",
                    0,
                    FailureKind::Unclassified,
                    format!("station {id} has no spec"),
                ));
            }
        };

        let failed_dep = spec
            .depends_on
            .iter()
            .find(|dep| done.get(dep).is_some_and(|r| !r.status.is_completed()));

        if let Some(dep) = failed_dep {
            if !config.flags.skip_validation {
                let result = StationResult::failed(
                    spec.id,
                    &spec.name,
                    0,
                    FailureKind::DependencyUnsatisfied,
                    format!("station {dep} did not complete"),
                );
                self.emit_station_outcome(verbose, &result);
                return Prepared::Skip(result);
            }
        }

        let mut ctx = RenderContext::for_run(config);
        for dep in &spec.depends_on {
            match done.get(dep) {
                Some(result) if result.status.is_completed() => {
                    ctx.set_station_output(*dep, &result.payload);
                }
                // skip_validation substitutes an empty payload for failed deps
                _ => ctx.set_station_output(*dep, &StationPayload::Missing),
            }
        }

        let agent = match self.registry.config_for(spec.id) {
            Ok(agent) => agent.with_override(config.override_for(spec.id)),
            Err(e) => {
                return Prepared::Skip(StationResult::failed(
                    spec.id,
                    &spec.name,
                    0,
                    FailureKind::Unclassified,
                    e.to_string(),
                ));
            }
        };

        self.emit(
            verbose,
            ExecutionEvent::StationStarted {
                station: spec.id,
                name: spec.name.clone(),
            },
        );

        Prepared::Execute { spec, agent, ctx }
    }

    fn emit_station_outcome(&self, verbose: bool, result: &StationResult) {
        match &result.status {
            crate::core::run::StationStatus::Completed => self.emit(
                verbose,
                ExecutionEvent::StationCompleted {
                    station: result.station,
                    duration_ms: result.duration_ms,
                },
            ),
            crate::core::run::StationStatus::Failed { kind, message } => self.emit(
                verbose,
                ExecutionEvent::StationFailed {
                    station: result.station,
                    kind: *kind,
                    message: message.clone(),
                },
            ),
        }
    }
}

enum Prepared {
    Skip(StationResult),
    Execute {
        spec: StationSpec,
        agent: crate::agent::AgentConfig,
        ctx: RenderContext,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{GenerateRequest, ModelError};
    use crate::core::config::RunFlags;
    use async_trait::async_trait;
    use serde_json::{json, Value as JsonValue};
    use std::sync::atomic::AtomicUsize;

    struct EchoClient {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ModelClient for EchoClient {
        async fn generate(&self, request: GenerateRequest) -> Result<JsonValue, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Minimal valid payloads per schema
            use crate::core::payload::OutputSchema::*;
            Ok(match request.schema {
                Characters => json!({
                    "characters": [],
                    "narrative_style": {
                        "tone": "flat", "point_of_view": "objective", "dialogue_ratio": 0.5
                    }
                }),
                Scenes => json!({"scenes": []}),
                Dialogue => json!({"voices": []}),
                Themes => json!({"themes": []}),
                Conflict => json!({"conflicts": []}),
                Pacing => json!({"overall_tempo": "even"}),
                Report => json!({"logline": "l", "verdict": "v"}),
            })
        }

        async fn review(&self, _text: &str) -> Result<String, ModelError> {
            Ok("fine".to_string())
        }
    }

    #[tokio::test]
    async fn test_run_stations_false_returns_empty_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = ExecutionEngine::new(
            StationSet::standard().unwrap(),
            AgentRegistry::standard().unwrap(),
            EchoClient { calls: calls.clone() },
        )
        .unwrap();

        let config = RunConfig::new("p", "INT. STAGE - DAY").with_flags(RunFlags {
            run_stations: false,
            ..RunFlags::default()
        });

        let run = engine.run(&config).await.unwrap();
        assert!(run.results.is_empty());
        assert_eq!(run.stations_completed, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_stations_complete() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = ExecutionEngine::new(
            StationSet::standard().unwrap(),
            AgentRegistry::standard().unwrap(),
            EchoClient { calls: calls.clone() },
        )
        .unwrap();

        let run = engine
            .run(&RunConfig::new("p", "INT. STAGE - DAY"))
            .await
            .unwrap();

        assert_eq!(run.results.len(), 7);
        assert_eq!(run.stations_completed, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 7);
        // Results come back in ordinal order
        let ids: Vec<u8> = run.results.iter().map(|r| r.station.get()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[tokio::test]
    async fn test_cancel_before_start_returns_partial_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = ExecutionEngine::new(
            StationSet::standard().unwrap(),
            AgentRegistry::standard().unwrap(),
            EchoClient { calls: calls.clone() },
        )
        .unwrap();

        let cancel = Arc::new(AtomicBool::new(true));
        let run = engine
            .run_with_cancel(&RunConfig::new("p", "INT. STAGE - DAY"), cancel)
            .await
            .unwrap();

        assert!(run.results.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
