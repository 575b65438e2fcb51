//! Test case reporting seam.
//!
//! Scenarios report one case per run through a `TestReporter`. The trait is
//! the integration point for an external assertion/reporting framework;
//! `RecordingReporter` is the in-memory fake for tests and
//! `TracingReporter` routes case lifecycle through the log stream.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

/// Receives the lifecycle of reported test cases.
///
/// Contract: `case_started` first, then at most one of
/// `case_passed`/`case_failed`, then `case_finished` exactly once.
pub trait TestReporter: Send + Sync {
    fn case_started(&self, description: &str);
    fn case_passed(&self, description: &str);
    fn case_failed(&self, description: &str, reason: &str);
    fn case_finished(&self, description: &str);
}

/// Terminal outcome of a reported case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseOutcome {
    Passed,
    Failed,
}

/// One reported case, as captured by `RecordingReporter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Unique id of this case run.
    pub case_id: Uuid,

    /// Case description as given to the scenario.
    pub description: String,

    /// Terminal outcome; `None` until pass/fail is reported.
    pub outcome: Option<CaseOutcome>,

    /// Captured failure reason, if the case failed.
    pub failure_reason: Option<String>,

    /// When the case was started.
    pub started_at: DateTime<Utc>,

    /// When the case was finalized; `None` while still open.
    pub finished_at: Option<DateTime<Utc>>,
}

/// In-memory reporter backed by a `Mutex<Vec<CaseRecord>>` (testing only).
#[derive(Debug, Default)]
pub struct RecordingReporter {
    cases: Mutex<Vec<CaseRecord>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded cases in start order.
    pub fn cases(&self) -> Vec<CaseRecord> {
        self.cases.lock().unwrap().clone()
    }

    fn with_open_case(&self, description: &str, update: impl FnOnce(&mut CaseRecord)) {
        let mut cases = self.cases.lock().unwrap();
        if let Some(case) = cases
            .iter_mut()
            .rev()
            .find(|c| c.description == description && c.finished_at.is_none())
        {
            update(case);
        }
    }
}

impl TestReporter for RecordingReporter {
    fn case_started(&self, description: &str) {
        self.cases.lock().unwrap().push(CaseRecord {
            case_id: Uuid::new_v4(),
            description: description.to_string(),
            outcome: None,
            failure_reason: None,
            started_at: Utc::now(),
            finished_at: None,
        });
    }

    fn case_passed(&self, description: &str) {
        self.with_open_case(description, |case| {
            case.outcome = Some(CaseOutcome::Passed);
        });
    }

    fn case_failed(&self, description: &str, reason: &str) {
        self.with_open_case(description, |case| {
            case.outcome = Some(CaseOutcome::Failed);
            case.failure_reason = Some(reason.to_string());
        });
    }

    fn case_finished(&self, description: &str) {
        self.with_open_case(description, |case| {
            case.finished_at = Some(Utc::now());
        });
    }
}

/// Reporter that emits case lifecycle through `tracing`.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl TracingReporter {
    pub fn new() -> Self {
        Self
    }
}

impl TestReporter for TracingReporter {
    fn case_started(&self, description: &str) {
        info!(case = description, "Test case started");
    }

    fn case_passed(&self, description: &str) {
        info!(case = description, "Test case passed");
    }

    fn case_failed(&self, description: &str, reason: &str) {
        error!(case = description, reason, "Test case failed");
    }

    fn case_finished(&self, description: &str) {
        info!(case = description, "Test case finished");
    }
}
