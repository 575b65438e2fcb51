//! Error types for apiary-harness

use apiary_engine::{ConfigError, EngineError};
use thiserror::Error;

/// Errors surfaced by the harness layer.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Engine failure, propagated unchanged after being logged once
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Configuration rejected before any engine interaction
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Zome call parameters could not be encoded
    #[error("Failed to encode zome call parameters: {0}")]
    Encode(#[from] serde_json::Error),

    /// A second `start` on a handle that already started
    #[error("Container already started")]
    AlreadyStarted,

    /// `stop` or a shutdown wait on a handle that was never started
    #[error("Container has not been started")]
    NotStarted,

    /// The engine dropped a completion hook without firing it
    #[error("Completion notification dropped before it fired")]
    NotificationLost,

    /// A reporter-backed scenario was run with no reporter registered
    #[error("No test reporter registered; call Scenario::set_reporter before run_case")]
    ReporterNotRegistered,
}

/// Result type for harness operations
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;
