//! Container runner: build, start, hand out callers, tear down.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use apiary_engine::{container, ContainerOptions, EngineBuilder, InstanceConfig, InstanceId};
use tracing::{debug, info};

use crate::caller::InstanceCaller;
use crate::error::HarnessResult;
use crate::handle::ContainerHandle;

/// Shutdown trigger handed to a runner body. Triggering is synchronous;
/// the runner itself awaits the resulting shutdown outcome.
#[derive(Clone)]
pub struct StopHandle {
    handle: Arc<ContainerHandle>,
}

impl StopHandle {
    /// Trigger container shutdown.
    pub fn stop(&self) -> HarnessResult<()> {
        self.handle.trigger_stop()
    }
}

/// Top-level convenience for driving a configured container through one
/// body of user code.
pub struct Runner;

impl Runner {
    /// Build an unstarted handle hosting the given instances.
    pub fn with_instances(
        builder: Arc<dyn EngineBuilder>,
        instances: Vec<InstanceConfig>,
        options: ContainerOptions,
    ) -> HarnessResult<Arc<ContainerHandle>> {
        let config = container(instances, options);
        let engine = builder.build(config)?;
        Ok(Arc::new(ContainerHandle::new(engine)))
    }

    /// Run `body` against a freshly started container.
    ///
    /// One `InstanceCaller` is built per instance, keyed by its resolved
    /// name. The body receives a stop trigger and is expected to call it;
    /// after the body succeeds, the runner awaits the engine's shutdown
    /// outcome before returning the body's value. Failures anywhere fail
    /// the returned future.
    pub async fn run<B, Fut, T>(
        builder: Arc<dyn EngineBuilder>,
        instances: Vec<InstanceConfig>,
        options: ContainerOptions,
        body: B,
    ) -> anyhow::Result<T>
    where
        B: FnOnce(StopHandle, HashMap<String, InstanceCaller>, Arc<ContainerHandle>) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let names: Vec<String> = instances.iter().map(|i| i.name.clone()).collect();
        let handle = Self::with_instances(builder, instances, options)?;
        handle.start()?;
        info!(instances = names.len(), "Container running");

        let mut callers = HashMap::new();
        for name in names {
            let caller = InstanceCaller::bind(handle.clone(), InstanceId::new(name.clone()))?;
            debug!(instance = %name, "Caller bound");
            callers.insert(name, caller);
        }

        let stop = StopHandle {
            handle: handle.clone(),
        };
        let value = body(stop, callers, handle.clone()).await?;

        handle.wait_stopped().await?;
        info!("Container shut down");
        Ok(value)
    }
}
