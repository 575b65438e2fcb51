//! Engine contract.
//!
//! The container engine is an opaque external runtime; this layer consumes
//! it only through the traits below and never patches methods onto it.
//! Lifecycle completion follows the engine's callback convention: `start`
//! accepts a callback that fires exactly once, with the terminal outcome,
//! when the container has fully shut down. `stop` is the synchronous
//! trigger for that shutdown.

use std::sync::Arc;

use crate::config::ContainerConfig;
use crate::error::{EngineError, EngineResult};
use crate::id::InstanceId;

/// Callback invoked once with the container's terminal outcome.
pub type StartCallback = Box<dyn FnOnce(EngineResult<()>) + Send>;

/// One-shot hook fired on the next engine-internal completion event.
pub type CompletionHook = Box<dyn FnOnce() + Send>;

/// The fixed contract of a container engine.
///
/// Guarantees expected from implementations:
/// - `start` invokes `done` exactly once, unless it returns `Err` itself.
/// - `register_completion` hooks fire in FIFO registration order, one per
///   completion event, each exactly once.
/// - `agent_id` and `dna_address` are read-only and idempotent.
pub trait ContainerEngine: Send + Sync {
    /// Begin hosting. `done` fires with the terminal outcome once the
    /// container has fully shut down (or failed to come up).
    fn start(&self, done: StartCallback) -> EngineResult<()>;

    /// Synchronously trigger shutdown. Completion is signaled through the
    /// callback handed to `start`.
    fn stop(&self) -> EngineResult<()>;

    /// Invoke a zome function on a hosted instance with raw JSON text
    /// parameters, returning the raw result text.
    fn call(
        &self,
        id: &InstanceId,
        zome: &str,
        func: &str,
        params: &str,
    ) -> EngineResult<String>;

    /// Register a hook for the next completion event. FIFO across
    /// registrations; must be registered before the call whose settlement
    /// it observes is issued.
    fn register_completion(&self, hook: CompletionHook);

    /// The agent address behind an instance.
    fn agent_id(&self, id: &InstanceId) -> EngineResult<String>;

    /// The content address of the dna an instance executes.
    fn dna_address(&self, id: &InstanceId) -> EngineResult<String>;
}

/// Constructs engines from declarative configuration.
pub trait EngineBuilder: Send + Sync {
    /// Build an engine hosting the configured instances. The engine is
    /// returned in its created (not yet started) state.
    fn build(&self, config: ContainerConfig) -> EngineResult<Arc<dyn ContainerEngine>>;
}

/// Convenience for propagating a call failure with its context attached.
pub(crate) fn call_error(
    id: &InstanceId,
    zome: &str,
    func: &str,
    message: impl Into<String>,
) -> EngineError {
    EngineError::Call {
        instance: id.to_string(),
        zome: zome.to_string(),
        func: func.to_string(),
        message: message.into(),
    }
}
