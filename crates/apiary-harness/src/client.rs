//! Structured zome calls over a container handle.
//!
//! `CallClient` layers JSON marshaling and completion notifications on top
//! of the raw call surface. The engine may keep working after a call
//! returns its immediate value (cross-instance signaling, for example);
//! `call_settled` exists so callers can block on full settlement without
//! knowing the mechanism.

use std::sync::Arc;

use apiary_engine::InstanceId;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::warn;

use crate::error::{HarnessError, HarnessResult};
use crate::handle::ContainerHandle;

/// One-shot completion signal for a single issued call.
///
/// Registered with the engine strictly before the call it observes is
/// issued, so a completion can never fire before its registration exists.
pub struct PendingNotification {
    rx: oneshot::Receiver<()>,
}

impl PendingNotification {
    /// Resolve once the engine signals that the call's work has fully
    /// settled. Fails if the engine dropped the hook unfired.
    pub async fn settled(self) -> HarnessResult<()> {
        self.rx
            .await
            .map_err(|_| HarnessError::NotificationLost)
    }
}

/// Marshaled call surface over one container handle.
#[derive(Clone)]
pub struct CallClient {
    handle: Arc<ContainerHandle>,
}

impl CallClient {
    pub fn new(handle: Arc<ContainerHandle>) -> Self {
        Self { handle }
    }

    /// Invoke a zome function: `params` is JSON-encoded, the raw result is
    /// JSON-decoded. A result that is not valid JSON is returned as raw
    /// text, unchanged and without error; encoding and call failures
    /// propagate.
    pub fn call(
        &self,
        id: &InstanceId,
        zome: &str,
        func: &str,
        params: &impl Serialize,
    ) -> HarnessResult<Value> {
        let params_text = serde_json::to_string(params)?;
        let raw = self.handle.call(id, zome, func, &params_text)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!(instance = %id, zome, func, raw = %raw, "Zome call result was not valid JSON; returning raw text");
                Ok(Value::String(raw))
            }
        }
    }

    /// Invoke a zome function and additionally obtain a completion
    /// notification. The notification is registered before the call is
    /// issued, and resolves once the engine signals settlement of the work
    /// the call triggered.
    pub fn call_with_completion(
        &self,
        id: &InstanceId,
        zome: &str,
        func: &str,
        params: &impl Serialize,
    ) -> HarnessResult<(Value, PendingNotification)> {
        let (tx, rx) = oneshot::channel();
        self.handle.register_completion(Box::new(move || {
            let _ = tx.send(());
        }));
        let result = self.call(id, zome, func, params)?;
        Ok((result, PendingNotification { rx }))
    }

    /// Invoke a zome function and yield its immediate result only after
    /// the paired completion notification has fired: one resolution point
    /// for "value available" and "work fully settled".
    pub async fn call_settled(
        &self,
        id: &InstanceId,
        zome: &str,
        func: &str,
        params: &impl Serialize,
    ) -> HarnessResult<Value> {
        let (result, notification) = self.call_with_completion(id, zome, func, params)?;
        notification.settled().await?;
        Ok(result)
    }
}
