//! Error types for apiary-engine

use thiserror::Error;

/// Errors surfaced by a container engine.
///
/// `Clone` is required so a single engine failure can be observed by every
/// holder of a shared shutdown future.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Container failed to start
    #[error("Container failed to start: {0}")]
    Start(String),

    /// Container failed to stop
    #[error("Container failed to stop: {0}")]
    Stop(String),

    /// A zome function call failed inside the engine
    #[error("Zome call {zome}/{func} on instance '{instance}' failed: {message}")]
    Call {
        instance: String,
        zome: String,
        func: String,
        message: String,
    },

    /// No instance is hosted under the given id
    #[error("Unknown instance id: {0}")]
    UnknownInstance(String),

    /// No function is registered under the given zome/function pair
    #[error("No zome function registered for {zome}/{func}")]
    UnknownZomeFunction { zome: String, func: String },

    /// The container is not in the Running state
    #[error("Container is not running")]
    NotRunning,
}

/// Configuration errors, detected before any engine interaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Two instances share the same user-facing name
    #[error(
        "Duplicate instance name '{0}'; give one of these instances a distinct name, \
         e.g. instance_named(agent, dna, \"{0}-2\")"
    )]
    DuplicateInstanceName(String),
}

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;
