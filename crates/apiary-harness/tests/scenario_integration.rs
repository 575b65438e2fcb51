//! Integration tests for scenarios over the in-memory engine.
//!
//! This binary never registers a process-wide reporter, so the
//! misuse-detection test can rely on the slot being empty.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use apiary_engine::fakes::MemoryEngineBuilder;
use apiary_engine::{
    agent, dna, instance, ContainerConfig, ContainerEngine, EngineBuilder, EngineResult,
    InstanceConfig,
};
use apiary_harness::{CaseOutcome, HarnessError, RecordingReporter, Scenario};
use serde_json::{json, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn alice_and_bob() -> Vec<InstanceConfig> {
    vec![
        instance(agent("alice"), dna("chat.dna")),
        instance(agent("bob"), dna("chat.dna")),
    ]
}

fn ping_builder() -> Arc<dyn EngineBuilder> {
    Arc::new(
        MemoryEngineBuilder::new().with_zome_fn("chat", "ping", |id, params| {
            Ok(format!(
                "{{\"from\":\"{id}\",\"echo\":{params}}}"
            ))
        }),
    )
}

/// Test: a settled call across two named instances passes and is reported.
#[tokio::test]
async fn test_scenario_ping_passes() {
    init_tracing();
    let reporter = Arc::new(RecordingReporter::new());
    let scenario =
        Scenario::new(ping_builder(), alice_and_bob()).with_reporter(reporter.clone());

    scenario
        .run_case("ping", |_t, callers| async move {
            let alice = callers.get("alice").expect("alice caller");
            let bob = callers.get("bob").expect("bob caller");
            assert_ne!(alice.agent_id(), bob.agent_id());
            assert_eq!(alice.dna_address(), bob.dna_address());

            let result = alice.call_settled("chat", "ping", &json!({"to": "bob"})).await?;
            assert_eq!(result["echo"], json!({"to": "bob"}));
            assert_eq!(result["from"], json!("alice::chat.dna"));
            Ok(())
        })
        .await
        .expect("run_case failed");

    let cases = reporter.cases();
    assert_eq!(cases.len(), 1, "exactly one reported case per scenario run");
    assert_eq!(cases[0].description, "ping");
    assert_eq!(cases[0].outcome, Some(CaseOutcome::Passed));
    assert!(cases[0].finished_at.is_some());
}

/// Test: a failing zome call marks the case failed with the captured reason.
#[tokio::test]
async fn test_scenario_failure_captured() {
    init_tracing();
    let reporter = Arc::new(RecordingReporter::new());
    let builder: Arc<dyn EngineBuilder> = Arc::new(
        MemoryEngineBuilder::new().with_failing_zome_fn("chat", "ping", "dht unreachable"),
    );
    let scenario = Scenario::new(builder, alice_and_bob()).with_reporter(reporter.clone());

    scenario
        .run_case("ping against a broken zome", |_t, callers| async move {
            let alice = callers.get("alice").expect("alice caller");
            alice.call("chat", "ping", &json!({}))?;
            Ok(())
        })
        .await
        .expect("run_case itself must not fail");

    let cases = reporter.cases();
    assert_eq!(cases[0].outcome, Some(CaseOutcome::Failed));
    let reason = cases[0].failure_reason.as_deref().expect("captured reason");
    assert!(reason.contains("dht unreachable"), "got reason: {reason}");
    assert!(cases[0].finished_at.is_some(), "failed cases are finalized too");
}

/// Test: duplicate instance names are rejected before any engine exists.
#[tokio::test]
async fn test_duplicate_names_rejected_before_engine_start() {
    init_tracing();

    struct CountingBuilder(AtomicUsize);
    impl EngineBuilder for CountingBuilder {
        fn build(&self, config: ContainerConfig) -> EngineResult<Arc<dyn ContainerEngine>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            MemoryEngineBuilder::new().build(config)
        }
    }

    let builder = Arc::new(CountingBuilder(AtomicUsize::new(0)));
    let reporter = Arc::new(RecordingReporter::new());
    let duplicated = vec![
        instance(agent("alice"), dna("chat.dna")),
        instance(agent("alice"), dna("mail.dna")),
    ];
    let scenario =
        Scenario::new(builder.clone(), duplicated).with_reporter(reporter.clone());

    scenario
        .run_case("duplicate names", |_t, _callers| async move { Ok(()) })
        .await
        .expect("run_case failed");

    let cases = reporter.cases();
    assert_eq!(cases[0].outcome, Some(CaseOutcome::Failed));
    assert!(cases[0]
        .failure_reason
        .as_deref()
        .expect("captured reason")
        .contains("alice"));
    assert_eq!(builder.0.load(Ordering::SeqCst), 0, "engine must never be built");
}

/// Test: running a reported case with no reporter registered is misuse,
/// detected before any engine start.
#[tokio::test]
async fn test_run_case_without_reporter_is_misuse() {
    init_tracing();
    let scenario = Scenario::new(ping_builder(), alice_and_bob());

    let err = scenario
        .run_case("no reporter", |_t, _callers| async move { Ok(()) })
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HarnessError>(),
        Some(HarnessError::ReporterNotRegistered)
    ));
}

/// Test: a non-JSON engine result comes back as the exact raw string.
#[tokio::test]
async fn test_non_json_result_passed_through_raw() {
    init_tracing();
    let builder: Arc<dyn EngineBuilder> = Arc::new(
        MemoryEngineBuilder::new()
            .with_zome_fn("chat", "ping", |_, _| Ok("pong without quotes".to_string())),
    );
    let scenario = Scenario::new(builder, alice_and_bob());

    scenario
        .run(|stop, callers| async move {
            let alice = callers.get("alice").expect("alice caller");
            let result = alice.call("chat", "ping", &json!({}))?;
            assert_eq!(result, Value::String("pong without quotes".to_string()));
            stop.stop()?;
            Ok(())
        })
        .await
        .expect("scenario run failed");
}
