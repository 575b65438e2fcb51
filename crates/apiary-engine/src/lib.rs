//! Apiary Engine: contract and configuration for container runtimes
//!
//! This crate defines everything the harness layer needs from a container
//! engine, without depending on any concrete runtime:
//!
//! ## Key Components
//!
//! - `ContainerEngine` / `EngineBuilder`: the fixed trait contract of the
//!   opaque engine (lifecycle callbacks, raw zome calls, FIFO completion
//!   hooks, identity queries)
//! - `config`: pure data-shaping functions assembling the declarative
//!   container configuration (agents, dnas, instances, options)
//! - `CompletionQueue`: the explicit ordered queue behind completion-hook
//!   registration
//! - `fakes::MemoryEngine`: an in-memory engine for tests

pub mod config;
pub mod engine;
mod error;
pub mod fakes;
mod id;
pub mod queue;

pub use config::{
    agent, container, default_dna_name, default_instance_name, dna, dna_named,
    ensure_unique_names, instance, instance_named, AgentConfig, ContainerConfig,
    ContainerOptions, DnaConfig, InstanceConfig,
};
pub use engine::{CompletionHook, ContainerEngine, EngineBuilder, StartCallback};
pub use error::{ConfigError, EngineError, EngineResult};
pub use id::{make_instance_id, InstanceId};
pub use queue::CompletionQueue;
