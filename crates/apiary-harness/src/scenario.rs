//! Scenario fixtures: a fixed instance set driven through test bodies.
//!
//! A scenario binds declared instances to a body of test code with
//! harness-managed lifecycle and reporting. Callers are keyed by the
//! user-facing instance name but bound to the identity computed from the
//! agent/dna name pair, so tests address instances the way they declared
//! them.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use apiary_engine::{
    ensure_unique_names, make_instance_id, ContainerOptions, EngineBuilder, InstanceConfig,
    InstanceId,
};
use tracing::{debug, warn};

use crate::caller::InstanceCaller;
use crate::error::HarnessError;
use crate::reporter::TestReporter;
use crate::runner::{Runner, StopHandle};

/// Process-wide reporter shared by scenarios without an explicit override.
static GLOBAL_REPORTER: RwLock<Option<Arc<dyn TestReporter>>> = RwLock::new(None);

/// A declarative test fixture over one container configuration.
pub struct Scenario {
    builder: Arc<dyn EngineBuilder>,
    instances: Vec<InstanceConfig>,
    options: ContainerOptions,
    reporter: Option<Arc<dyn TestReporter>>,
}

impl Scenario {
    /// Create a scenario over the given instances with default options.
    pub fn new(builder: Arc<dyn EngineBuilder>, instances: Vec<InstanceConfig>) -> Self {
        Self {
            builder,
            instances,
            options: ContainerOptions::default(),
            reporter: None,
        }
    }

    /// Replace the container options.
    pub fn with_options(mut self, options: ContainerOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a reporter for this scenario only, ignoring the process-wide
    /// registration. Scenarios running in parallel test threads use this to
    /// keep their case records separate.
    pub fn with_reporter(mut self, reporter: Arc<dyn TestReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Register the process-wide reporter used by every scenario created
    /// without an override.
    pub fn set_reporter(reporter: Arc<dyn TestReporter>) {
        *GLOBAL_REPORTER.write().unwrap() = Some(reporter);
    }

    fn reporter(&self) -> Option<Arc<dyn TestReporter>> {
        self.reporter
            .clone()
            .or_else(|| GLOBAL_REPORTER.read().unwrap().clone())
    }

    /// Run a body against a started container, with one caller per
    /// declared instance.
    ///
    /// Fails fast on duplicate instance names, before any engine is built;
    /// the error names the duplicate and how to disambiguate it.
    pub async fn run<B, Fut, T>(&self, body: B) -> anyhow::Result<T>
    where
        B: FnOnce(StopHandle, HashMap<String, InstanceCaller>) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        ensure_unique_names(&self.instances)?;

        let identities: Vec<(String, InstanceId)> = self
            .instances
            .iter()
            .map(|inst| {
                (
                    inst.name.clone(),
                    make_instance_id(&inst.agent.name, &inst.dna.name),
                )
            })
            .collect();

        Runner::run(
            self.builder.clone(),
            self.instances.clone(),
            self.options.clone(),
            move |stop, _named_callers, handle| async move {
                let mut callers = HashMap::new();
                for (name, id) in identities {
                    debug!(instance = %name, identity = %id, "Scenario caller bound");
                    callers.insert(name, InstanceCaller::bind(handle.clone(), id)?);
                }
                body(stop, callers).await
            },
        )
        .await
    }

    /// Run one reported test case.
    ///
    /// Requires a registered reporter; fails before any engine start
    /// otherwise. The container is stopped once the body settles, the
    /// body's failure (if any) is reported with its captured reason, and
    /// the case is finalized exactly once, pass or fail.
    pub async fn run_case<B, Fut>(&self, description: &str, body: B) -> anyhow::Result<()>
    where
        B: FnOnce(Arc<dyn TestReporter>, HashMap<String, InstanceCaller>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let reporter = self
            .reporter()
            .ok_or(HarnessError::ReporterNotRegistered)?;
        reporter.case_started(description);

        let body_reporter = reporter.clone();
        let outcome = self
            .run(move |stop, callers| async move {
                let result = body(body_reporter, callers).await;
                if let Err(e) = stop.stop() {
                    warn!("Failed to stop container after test case: {e}");
                }
                result
            })
            .await;

        match &outcome {
            Ok(()) => reporter.case_passed(description),
            Err(e) => reporter.case_failed(description, &format!("{e:#}")),
        }
        reporter.case_finished(description);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::{CaseOutcome, RecordingReporter};
    use apiary_engine::fakes::MemoryEngineBuilder;
    use apiary_engine::{
        agent, dna, instance, ConfigError, ContainerConfig, ContainerEngine, EngineResult,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts how many engines were actually built.
    struct CountingBuilder {
        inner: MemoryEngineBuilder,
        built: AtomicUsize,
    }

    impl EngineBuilder for CountingBuilder {
        fn build(&self, config: ContainerConfig) -> EngineResult<Arc<dyn ContainerEngine>> {
            self.built.fetch_add(1, Ordering::SeqCst);
            self.inner.build(config)
        }
    }

    fn instances() -> Vec<InstanceConfig> {
        vec![
            instance(agent("alice"), dna("chat.dna")),
            instance(agent("bob"), dna("chat.dna")),
        ]
    }

    fn echo_builder() -> Arc<dyn EngineBuilder> {
        Arc::new(MemoryEngineBuilder::new().with_echo_zome_fn("chat", "ping"))
    }

    #[tokio::test]
    async fn test_run_keys_callers_by_declared_name_with_computed_identity() {
        let scenario = Scenario::new(echo_builder(), instances());
        scenario
            .run(|stop, callers| async move {
                assert_eq!(callers.len(), 2, "one caller per instance");
                let alice = callers.get("alice").expect("alice caller");
                assert!(callers.contains_key("bob"));
                assert_eq!(
                    *alice.instance_id(),
                    make_instance_id("alice", "chat.dna")
                );

                let result = alice.call_settled("chat", "ping", &json!({"seq": 1})).await?;
                assert_eq!(result, json!({"seq": 1}));

                stop.stop()?;
                Ok(())
            })
            .await
            .expect("scenario run failed");
    }

    #[tokio::test]
    async fn test_duplicate_names_fail_before_engine_is_built() {
        let builder = Arc::new(CountingBuilder {
            inner: MemoryEngineBuilder::new(),
            built: AtomicUsize::new(0),
        });
        let dup = vec![
            instance(agent("alice"), dna("chat.dna")),
            instance(agent("alice"), dna("mail.dna")),
        ];
        let scenario = Scenario::new(builder.clone(), dup);

        let err = scenario
            .run(|_stop, _callers| async move { Ok(()) })
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::DuplicateInstanceName("alice".to_string()))
        );
        assert!(err.to_string().contains("alice"));
        assert_eq!(builder.built.load(Ordering::SeqCst), 0, "no engine may be built");
    }

    #[tokio::test]
    async fn test_run_case_reports_pass_and_finalizes() {
        let reporter = Arc::new(RecordingReporter::new());
        let scenario =
            Scenario::new(echo_builder(), instances()).with_reporter(reporter.clone());

        scenario
            .run_case("ping settles", |_t, callers| async move {
                let alice = callers.get("alice").expect("alice caller");
                alice.call_settled("chat", "ping", &json!({})).await?;
                Ok(())
            })
            .await
            .expect("run_case failed");

        let cases = reporter.cases();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].outcome, Some(CaseOutcome::Passed));
        assert!(cases[0].finished_at.is_some());
    }

    #[tokio::test]
    async fn test_run_case_reports_failure_reason_and_finalizes() {
        let reporter = Arc::new(RecordingReporter::new());
        let builder: Arc<dyn EngineBuilder> = Arc::new(
            MemoryEngineBuilder::new().with_failing_zome_fn("chat", "ping", "boom"),
        );
        let scenario = Scenario::new(builder, instances()).with_reporter(reporter.clone());

        scenario
            .run_case("ping fails", |_t, callers| async move {
                let alice = callers.get("alice").expect("alice caller");
                alice.call("chat", "ping", &json!({}))?;
                Ok(())
            })
            .await
            .expect("a failing case must not fail run_case itself");

        let cases = reporter.cases();
        assert_eq!(cases[0].outcome, Some(CaseOutcome::Failed));
        assert!(cases[0]
            .failure_reason
            .as_deref()
            .unwrap_or_default()
            .contains("boom"));
        assert!(
            cases[0].finished_at.is_some(),
            "case is finalized even on failure"
        );
    }

    #[tokio::test]
    async fn test_global_reporter_is_shared() {
        let reporter = Arc::new(RecordingReporter::new());
        Scenario::set_reporter(reporter.clone());

        let scenario = Scenario::new(echo_builder(), instances());
        scenario
            .run_case("global reporter", |_t, _callers| async move { Ok(()) })
            .await
            .expect("run_case failed");

        assert_eq!(reporter.cases().len(), 1);
    }

    #[tokio::test]
    async fn test_with_options_overrides_defaults() {
        let scenario = Scenario::new(echo_builder(), instances())
            .with_options(ContainerOptions { debug_log: false });
        assert!(!scenario.options.debug_log);
    }
}
