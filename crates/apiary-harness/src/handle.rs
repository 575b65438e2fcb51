//! Lifecycle wrapper around an opaque container engine.
//!
//! `ContainerHandle` owns exactly one engine and adapts its callback
//! conventions into awaitable futures by composition; the engine's own
//! interface is never mutated. The engine signals start-lifecycle
//! completion when the container has fully shut down, so the future created
//! at `start` is the shutdown outcome. It is cached as a shared future: the
//! caller that triggered `stop` and any unrelated observer can both await
//! it.

use std::sync::{Arc, Mutex};

use apiary_engine::{CompletionHook, ContainerEngine, EngineError, InstanceId, StartCallback};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use crate::error::{HarnessError, HarnessResult};

/// Handle lifecycle. One `start` and one matching `stop` are valid per
/// handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Starting,
    Running,
    Stopping,
    Stopped,
}

type ShutdownFuture = Shared<BoxFuture<'static, Result<(), EngineError>>>;

struct Inner {
    lifecycle: Lifecycle,
    shutdown: Option<ShutdownFuture>,
}

/// Owns one container engine and its start/stop lifecycle.
pub struct ContainerHandle {
    engine: Arc<dyn ContainerEngine>,
    inner: Mutex<Inner>,
}

impl ContainerHandle {
    pub fn new(engine: Arc<dyn ContainerEngine>) -> Self {
        Self {
            engine,
            inner: Mutex::new(Inner {
                lifecycle: Lifecycle::Created,
                shutdown: None,
            }),
        }
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.inner.lock().unwrap().lifecycle
    }

    /// Start the engine, exactly once per handle.
    ///
    /// The engine's completion callback is translated into the cached
    /// shutdown future. A synchronous start failure is caught and becomes
    /// an already-failed shutdown future rather than an error here; `Err`
    /// is returned only for a second `start`.
    pub fn start(&self) -> HarnessResult<()> {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.lifecycle != Lifecycle::Created {
                return Err(HarnessError::AlreadyStarted);
            }
            inner.lifecycle = Lifecycle::Starting;
        }

        let (tx, rx) = oneshot::channel();
        let done: StartCallback = Box::new(move |outcome| {
            let _ = tx.send(outcome);
        });

        let started = self.engine.start(done);
        let mut inner = self.inner.lock().unwrap();
        match started {
            Ok(()) => {
                inner.shutdown = Some(
                    async move {
                        match rx.await {
                            Ok(outcome) => outcome,
                            Err(_) => Err(EngineError::Stop(
                                "engine dropped its shutdown callback without firing it"
                                    .to_string(),
                            )),
                        }
                    }
                    .boxed()
                    .shared(),
                );
                inner.lifecycle = Lifecycle::Running;
                info!("Container started");
            }
            Err(e) => {
                error!("Container failed to start: {e}");
                inner.shutdown = Some(async move { Err(e) }.boxed().shared());
                inner.lifecycle = Lifecycle::Stopped;
            }
        }
        Ok(())
    }

    /// Synchronously trigger shutdown; completion is observed through
    /// [`wait_stopped`](Self::wait_stopped).
    ///
    /// Triggering before `start` is a detectable error rather than a
    /// future that never resolves. Repeated triggers are no-ops.
    pub fn trigger_stop(&self) -> HarnessResult<()> {
        {
            let mut inner = self.inner.lock().unwrap();
            match inner.lifecycle {
                Lifecycle::Created => return Err(HarnessError::NotStarted),
                Lifecycle::Stopping | Lifecycle::Stopped => return Ok(()),
                Lifecycle::Starting | Lifecycle::Running => {
                    inner.lifecycle = Lifecycle::Stopping
                }
            }
        }
        debug!("Stopping container");
        self.engine.stop().map_err(|e| {
            error!("Container failed to stop: {e}");
            HarnessError::from(e)
        })
    }

    /// Await the engine's terminal outcome. Resolves once the engine fires
    /// the callback handed to `start`; any number of callers may wait.
    pub async fn wait_stopped(&self) -> HarnessResult<()> {
        let shutdown = self
            .inner
            .lock()
            .unwrap()
            .shutdown
            .clone()
            .ok_or(HarnessError::NotStarted)?;
        let outcome = shutdown.await;
        self.inner.lock().unwrap().lifecycle = Lifecycle::Stopped;
        Ok(outcome?)
    }

    /// Trigger shutdown, then await the terminal outcome.
    pub async fn stop(&self) -> HarnessResult<()> {
        self.trigger_stop()?;
        self.wait_stopped().await
    }

    /// Raw zome call with JSON text parameters. Errors are logged once
    /// here and propagated unchanged.
    pub fn call(
        &self,
        id: &InstanceId,
        zome: &str,
        func: &str,
        params: &str,
    ) -> HarnessResult<String> {
        self.engine.call(id, zome, func, params).map_err(|e| {
            error!(instance = %id, zome, func, "Zome call failed: {e}");
            HarnessError::from(e)
        })
    }

    /// Register a hook for the engine's next completion event.
    pub fn register_completion(&self, hook: CompletionHook) {
        self.engine.register_completion(hook);
    }

    /// The agent address behind an instance.
    pub fn agent_id(&self, id: &InstanceId) -> HarnessResult<String> {
        Ok(self.engine.agent_id(id)?)
    }

    /// The content address of the dna an instance executes.
    pub fn dna_address(&self, id: &InstanceId) -> HarnessResult<String> {
        Ok(self.engine.dna_address(id)?)
    }
}
