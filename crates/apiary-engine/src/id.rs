//! Instance identity derivation.

use serde::{Deserialize, Serialize};

/// Address of one hosted instance inside a container engine.
///
/// The inner field is private so an id is always either a configured
/// instance name or the canonical form produced by [`make_instance_id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(String);

impl InstanceId {
    /// Wrap an engine-assigned instance name as an id.
    pub fn new(id: impl Into<String>) -> Self {
        InstanceId(id.into())
    }

    /// Return the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        InstanceId(s.to_string())
    }
}

/// Derive the canonical instance id for an agent/dna pairing.
///
/// Pure and deterministic: the same `(agent_name, dna_name)` pair always
/// yields the same id, so scenarios can compute the identity behind a
/// user-facing instance name without asking the engine.
pub fn make_instance_id(agent_name: &str, dna_name: &str) -> InstanceId {
    InstanceId(format!("{agent_name}::{dna_name}"))
}
