//! Per-instance call facade.

use std::sync::Arc;

use apiary_engine::InstanceId;
use serde::Serialize;
use serde_json::Value;

use crate::client::{CallClient, PendingNotification};
use crate::error::HarnessResult;
use crate::handle::ContainerHandle;

/// Calls bound to one instance identity, with its identity metadata.
///
/// Construction performs two read-only engine queries (`agent_id`,
/// `dna_address`); the caller is valid while the handle is running.
pub struct InstanceCaller {
    client: CallClient,
    instance: InstanceId,
    agent_id: String,
    dna_address: String,
}

impl InstanceCaller {
    /// Bind an instance identity to the handle's call surface.
    pub fn bind(handle: Arc<ContainerHandle>, instance: InstanceId) -> HarnessResult<Self> {
        let agent_id = handle.agent_id(&instance)?;
        let dna_address = handle.dna_address(&instance)?;
        Ok(Self {
            client: CallClient::new(handle),
            instance,
            agent_id,
            dna_address,
        })
    }

    /// Invoke a zome function on this instance.
    pub fn call(&self, zome: &str, func: &str, params: &impl Serialize) -> HarnessResult<Value> {
        self.client.call(&self.instance, zome, func, params)
    }

    /// Invoke a zome function, also obtaining a completion notification.
    pub fn call_with_completion(
        &self,
        zome: &str,
        func: &str,
        params: &impl Serialize,
    ) -> HarnessResult<(Value, PendingNotification)> {
        self.client
            .call_with_completion(&self.instance, zome, func, params)
    }

    /// Invoke a zome function and resolve once its work has fully settled.
    pub async fn call_settled(
        &self,
        zome: &str,
        func: &str,
        params: &impl Serialize,
    ) -> HarnessResult<Value> {
        self.client
            .call_settled(&self.instance, zome, func, params)
            .await
    }

    /// The bound instance identity.
    pub fn instance_id(&self) -> &InstanceId {
        &self.instance
    }

    /// The agent address behind this instance.
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// The content address of the dna this instance executes.
    pub fn dna_address(&self) -> &str {
        &self.dna_address
    }
}
