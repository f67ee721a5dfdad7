//! Run-level behavior: validation, completeness, cancellation

mod common;

use common::{engine_with, sample_config, MockModelClient};
use dramaturg::{OutputSchema, PipelineError, RunConfig, StationId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_run_stations_disabled_yields_empty_run() {
    let client = MockModelClient::new();
    let calls = client.call_counter();
    let engine = engine_with(client);

    let mut config = sample_config();
    config.flags.run_stations = false;

    let run = engine.run(&config).await.unwrap();
    assert_eq!(run.results.len(), 0);
    assert_eq!(run.stations_completed, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_script_fails_before_any_model_call() {
    let client = MockModelClient::new();
    let calls = client.call_counter();
    let engine = engine_with(client);

    let config = RunConfig::new("dollhouse", "");
    let err = engine.run(&config).await.unwrap_err();

    assert!(matches!(err, PipelineError::InvalidInput(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_language_fails_before_any_model_call() {
    let client = MockModelClient::new();
    let calls = client.call_counter();
    let engine = engine_with(client);

    let config = sample_config().with_language("tlh");
    let err = engine.run(&config).await.unwrap_err();

    assert!(matches!(err, PipelineError::InvalidInput(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_all_stations_succeed() {
    let client = MockModelClient::new().with_delay(Duration::from_millis(5));
    let calls = client.call_counter();
    let engine = engine_with(client);

    let run = engine.run(&sample_config()).await.unwrap();

    assert_eq!(run.results.len(), 7);
    assert_eq!(run.stations_completed, 7);
    assert!(run.total_execution_ms > 0);
    assert!(run.finished_at >= run.started_at);
    assert_eq!(calls.load(Ordering::SeqCst), 7);

    for result in &run.results {
        assert!(result.status.is_completed(), "station {} failed", result.station);
    }
}

#[tokio::test]
async fn test_every_station_gets_a_result_despite_failures() {
    // Completeness invariant: one failing station never shrinks the result set
    let client = MockModelClient::new().failing(OutputSchema::Conflict);
    let engine = engine_with(client);

    let run = engine.run(&sample_config()).await.unwrap();
    assert_eq!(run.results.len(), 7);
    assert!(run.stations_completed < 7);
}

#[tokio::test]
async fn test_results_ordered_by_ordinal() {
    let engine = engine_with(MockModelClient::new());
    let run = engine.run(&sample_config()).await.unwrap();

    let ids: Vec<u8> = run.results.iter().map(|r| r.station.get()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
    assert!(run.result_for(StationId::new(4)).is_some());
}

#[tokio::test]
async fn test_cancellation_preserves_produced_results() {
    let client = MockModelClient::new().with_delay(Duration::from_millis(10));
    let calls = client.call_counter();
    let engine = Arc::new(engine_with(client));

    let cancel = Arc::new(AtomicBool::new(false));
    let config = sample_config();

    let handle = {
        let engine = Arc::clone(&engine);
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move { engine.run_with_cancel(&config, cancel).await })
    };

    // Let a couple of stations finish, then raise the signal
    tokio::time::sleep(Duration::from_millis(25)).await;
    cancel.store(true, Ordering::SeqCst);

    let run = handle.await.unwrap().unwrap();
    assert!(run.results.len() < 7);
    assert_eq!(calls.load(Ordering::SeqCst), run.results.len());
    for result in &run.results {
        assert!(result.status.is_completed());
    }
}
