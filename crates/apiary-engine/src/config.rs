//! Declarative container configuration.
//!
//! Pure data-shaping functions that assemble the configuration consumed by
//! an engine builder: agents, dnas, instances and top-level options. No
//! state, no I/O. Defaulting rules live in explicit functions
//! (`default_dna_name`, `default_instance_name`) so they can be tested on
//! their own instead of being buried in constructors.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One agent identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent name, also the default instance name.
    pub name: String,
}

/// One loadable dna (application definition).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnaConfig {
    /// Path to the dna artifact.
    pub path: String,

    /// Dna name; defaults to `path`.
    pub name: String,
}

/// One instance to be hosted by the engine: an agent/dna pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// The agent identity running this instance.
    pub agent: AgentConfig,

    /// The dna this instance executes.
    pub dna: DnaConfig,

    /// User-facing instance name; defaults to `agent.name`. Must be unique
    /// within one container configuration.
    pub name: String,
}

/// Top-level container options, forwarded to the engine uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerOptions {
    /// Whether the engine should emit its debug log.
    pub debug_log: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self { debug_log: true }
    }
}

/// Complete declarative configuration for one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Instances to host.
    pub instances: Vec<InstanceConfig>,

    /// Top-level options.
    pub options: ContainerOptions,
}

/// Build an agent identity.
pub fn agent(name: impl Into<String>) -> AgentConfig {
    AgentConfig { name: name.into() }
}

/// Build a dna whose name defaults to its path.
pub fn dna(path: impl Into<String>) -> DnaConfig {
    let path = path.into();
    let name = default_dna_name(&path);
    DnaConfig { path, name }
}

/// Build a dna with an explicit name.
pub fn dna_named(path: impl Into<String>, name: impl Into<String>) -> DnaConfig {
    DnaConfig {
        path: path.into(),
        name: name.into(),
    }
}

/// Build an instance whose name defaults to the agent's name.
pub fn instance(agent: AgentConfig, dna: DnaConfig) -> InstanceConfig {
    let name = default_instance_name(&agent);
    InstanceConfig { agent, dna, name }
}

/// Build an instance with an explicit user-facing name.
pub fn instance_named(
    agent: AgentConfig,
    dna: DnaConfig,
    name: impl Into<String>,
) -> InstanceConfig {
    InstanceConfig {
        agent,
        dna,
        name: name.into(),
    }
}

/// Assemble the container configuration. Performs no validation of its own;
/// name-uniqueness is enforced by [`ensure_unique_names`] at the harness
/// boundary, before any engine is constructed.
pub fn container(instances: Vec<InstanceConfig>, options: ContainerOptions) -> ContainerConfig {
    ContainerConfig { instances, options }
}

/// Default dna name: the dna path.
pub fn default_dna_name(path: &str) -> String {
    path.to_string()
}

/// Default instance name: the agent's name.
pub fn default_instance_name(agent: &AgentConfig) -> String {
    agent.name.clone()
}

/// Reject instance lists in which two instances share a user-facing name.
pub fn ensure_unique_names(instances: &[InstanceConfig]) -> Result<(), ConfigError> {
    let mut seen = std::collections::HashSet::new();
    for inst in instances {
        if !seen.insert(inst.name.as_str()) {
            return Err(ConfigError::DuplicateInstanceName(inst.name.clone()));
        }
    }
    Ok(())
}
