//! Apiary Harness: scenario testing over container engines
//!
//! The orchestration layer in front of an opaque multi-instance container
//! engine: lifecycle control with asynchronous completion signaling,
//! marshaled zome calls with completion notifications, and scenario
//! fixtures for integration tests.
//!
//! ## Key Components
//!
//! - `ContainerHandle`: owns one engine's start/stop lifecycle and adapts
//!   its callback conventions into awaitable futures
//! - `CallClient` / `InstanceCaller`: marshaled call surface, per-instance
//! - `Runner`: build → start → callers → body → teardown
//! - `Scenario`: named-instance test fixtures with one reported case per run

pub mod caller;
pub mod client;
mod error;
pub mod handle;
pub mod reporter;
pub mod runner;
pub mod scenario;

pub use caller::InstanceCaller;
pub use client::{CallClient, PendingNotification};
pub use error::{HarnessError, HarnessResult};
pub use handle::{ContainerHandle, Lifecycle};
pub use reporter::{CaseOutcome, CaseRecord, RecordingReporter, TestReporter, TracingReporter};
pub use runner::{Runner, StopHandle};
pub use scenario::Scenario;
