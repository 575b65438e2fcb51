//! In-memory container engine (testing only)
//!
//! Provides `MemoryEngine` and `MemoryEngineBuilder`, which satisfy the
//! `ContainerEngine`/`EngineBuilder` contracts without any external runtime.
//! Zome functions are plain closures registered on the builder; completion
//! events fire one queued hook per successful call (or only on explicit
//! `fire_next`/`fire_all` in manual mode, for ordering tests).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::ContainerConfig;
use crate::engine::{call_error, CompletionHook, ContainerEngine, EngineBuilder, StartCallback};
use crate::error::{EngineError, EngineResult};
use crate::id::{make_instance_id, InstanceId};
use crate::queue::CompletionQueue;

/// A zome function: raw JSON text in, raw result text out.
pub type ZomeFn = Arc<dyn Fn(&InstanceId, &str) -> EngineResult<String> + Send + Sync>;

/// How a built engine should misbehave at start, if at all.
#[derive(Debug, Clone)]
enum StartFailure {
    /// `start` returns `Err` without invoking the callback.
    Immediate(String),
    /// `start` returns `Ok` but delivers `Err` through the callback.
    Signaled(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Created,
    Running,
    Stopped,
}

/// One hosted agent/dna pairing.
#[derive(Debug, Clone)]
struct Cell {
    agent_id: String,
    dna_address: String,
}

// ---------------------------------------------------------------------------
// MemoryEngine
// ---------------------------------------------------------------------------

/// In-memory engine hosting the instances of one `ContainerConfig`.
///
/// Each instance is addressable under both its configured name and the
/// canonical id derived from its agent/dna names; both keys are aliases of
/// the same cell.
pub struct MemoryEngine {
    cells: HashMap<String, Arc<Cell>>,
    handlers: HashMap<(String, String), ZomeFn>,
    completions: Mutex<CompletionQueue>,
    state: Mutex<EngineState>,
    on_stopped: Mutex<Option<StartCallback>>,
    auto_complete: bool,
    start_failure: Option<StartFailure>,
}

impl MemoryEngine {
    fn from_config(
        config: ContainerConfig,
        handlers: HashMap<(String, String), ZomeFn>,
        auto_complete: bool,
        start_failure: Option<StartFailure>,
    ) -> Self {
        let mut cells = HashMap::new();
        for inst in &config.instances {
            let cell = Arc::new(Cell {
                agent_id: derive_address("agent", &inst.agent.name, ""),
                dna_address: derive_address("dna", &inst.dna.path, &inst.dna.name),
            });
            let canonical = make_instance_id(&inst.agent.name, &inst.dna.name);
            cells.insert(inst.name.clone(), cell.clone());
            cells.insert(canonical.as_str().to_string(), cell);
        }
        debug!(
            instances = config.instances.len(),
            debug_log = config.options.debug_log,
            "Built in-memory engine"
        );
        Self {
            cells,
            handlers,
            completions: Mutex::new(CompletionQueue::new()),
            state: Mutex::new(EngineState::Created),
            on_stopped: Mutex::new(None),
            auto_complete,
            start_failure,
        }
    }

    fn cell(&self, id: &InstanceId) -> EngineResult<&Arc<Cell>> {
        self.cells
            .get(id.as_str())
            .ok_or_else(|| EngineError::UnknownInstance(id.to_string()))
    }

    /// Whether the engine is currently in its Running state.
    pub fn is_running(&self) -> bool {
        *self.state.lock().unwrap() == EngineState::Running
    }

    /// Number of registered-but-unfired completion hooks.
    pub fn pending_completions(&self) -> usize {
        self.completions.lock().unwrap().len()
    }

    /// Fire the oldest pending completion hook (manual mode).
    pub fn fire_next(&self) -> bool {
        let hook = self.completions.lock().unwrap().take_next();
        match hook {
            Some(hook) => {
                hook();
                true
            }
            None => false,
        }
    }

    /// Fire every pending completion hook in registration order.
    pub fn fire_all(&self) -> usize {
        let mut fired = 0;
        while self.fire_next() {
            fired += 1;
        }
        fired
    }
}

impl ContainerEngine for MemoryEngine {
    fn start(&self, done: StartCallback) -> EngineResult<()> {
        match &self.start_failure {
            Some(StartFailure::Immediate(message)) => {
                return Err(EngineError::Start(message.clone()));
            }
            Some(StartFailure::Signaled(message)) => {
                done(Err(EngineError::Start(message.clone())));
                return Ok(());
            }
            None => {}
        }

        let mut state = self.state.lock().unwrap();
        if *state != EngineState::Created {
            return Err(EngineError::Start("engine already started".to_string()));
        }
        *state = EngineState::Running;
        *self.on_stopped.lock().unwrap() = Some(done);
        info!("In-memory engine started");
        Ok(())
    }

    fn stop(&self) -> EngineResult<()> {
        {
            let mut state = self.state.lock().unwrap();
            match *state {
                EngineState::Created => {
                    return Err(EngineError::Stop("engine was never started".to_string()))
                }
                EngineState::Stopped => {
                    return Err(EngineError::Stop("engine already stopped".to_string()))
                }
                EngineState::Running => *state = EngineState::Stopped,
            }
        }

        // Hooks never fired by the engine are dropped, not fired: their
        // awaiters observe a closed channel rather than a spurious success.
        let dropped = self.completions.lock().unwrap().clear();
        if dropped > 0 {
            debug!(dropped, "Dropped unfired completion hooks at shutdown");
        }

        if let Some(done) = self.on_stopped.lock().unwrap().take() {
            done(Ok(()));
        }
        info!("In-memory engine stopped");
        Ok(())
    }

    fn call(&self, id: &InstanceId, zome: &str, func: &str, params: &str) -> EngineResult<String> {
        if !self.is_running() {
            return Err(EngineError::NotRunning);
        }
        self.cell(id)?;
        let handler = self
            .handlers
            .get(&(zome.to_string(), func.to_string()))
            .ok_or_else(|| EngineError::UnknownZomeFunction {
                zome: zome.to_string(),
                func: func.to_string(),
            })?;

        let result = handler(id, params)?;
        if self.auto_complete {
            self.fire_next();
        }
        Ok(result)
    }

    fn register_completion(&self, hook: CompletionHook) {
        self.completions.lock().unwrap().register(hook);
    }

    fn agent_id(&self, id: &InstanceId) -> EngineResult<String> {
        Ok(self.cell(id)?.agent_id.clone())
    }

    fn dna_address(&self, id: &InstanceId) -> EngineResult<String> {
        Ok(self.cell(id)?.dna_address.clone())
    }
}

/// Derive a stable hex address from identity components.
fn derive_address(kind: &str, a: &str, b: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(b":");
    hasher.update(a.as_bytes());
    hasher.update(b":");
    hasher.update(b.as_bytes());
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// MemoryEngineBuilder
// ---------------------------------------------------------------------------

/// Reusable builder: zome-function table plus misbehavior knobs.
#[derive(Default)]
pub struct MemoryEngineBuilder {
    handlers: HashMap<(String, String), ZomeFn>,
    manual_completion: bool,
    start_failure: Option<StartFailure>,
}

impl MemoryEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zome function available on every hosted instance.
    pub fn with_zome_fn(
        mut self,
        zome: impl Into<String>,
        func: impl Into<String>,
        handler: impl Fn(&InstanceId, &str) -> EngineResult<String> + Send + Sync + 'static,
    ) -> Self {
        self.handlers
            .insert((zome.into(), func.into()), Arc::new(handler));
        self
    }

    /// Register a zome function that returns its raw parameter text.
    pub fn with_echo_zome_fn(self, zome: impl Into<String>, func: impl Into<String>) -> Self {
        self.with_zome_fn(zome, func, |_, params| Ok(params.to_string()))
    }

    /// Register a zome function that always fails with the given message.
    pub fn with_failing_zome_fn(
        self,
        zome: impl Into<String>,
        func: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let zome = zome.into();
        let func = func.into();
        let (zome_key, func_key) = (zome.clone(), func.clone());
        self.with_zome_fn(zome_key, func_key, move |id, _| {
            Err(call_error(id, &zome, &func, message.clone()))
        })
    }

    /// Completion hooks fire only on explicit `fire_next`/`fire_all`.
    pub fn manual_completion(mut self) -> Self {
        self.manual_completion = true;
        self
    }

    /// Built engines reject `start` with a synchronous error.
    pub fn failing_start(mut self, message: impl Into<String>) -> Self {
        self.start_failure = Some(StartFailure::Immediate(message.into()));
        self
    }

    /// Built engines accept `start` but deliver failure via the callback.
    pub fn failing_start_signaled(mut self, message: impl Into<String>) -> Self {
        self.start_failure = Some(StartFailure::Signaled(message.into()));
        self
    }

    /// Build a concretely typed engine, for tests that drive completions.
    pub fn build_engine(&self, config: ContainerConfig) -> Arc<MemoryEngine> {
        Arc::new(MemoryEngine::from_config(
            config,
            self.handlers.clone(),
            !self.manual_completion,
            self.start_failure.clone(),
        ))
    }
}

impl EngineBuilder for MemoryEngineBuilder {
    fn build(&self, config: ContainerConfig) -> EngineResult<Arc<dyn ContainerEngine>> {
        Ok(self.build_engine(config))
    }
}
