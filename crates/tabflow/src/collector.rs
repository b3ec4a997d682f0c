//! Per-row outcomes and run summaries.

use crate::result::{ErrorKind, TabflowError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// Terminal state of one row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    /// Every step succeeded and every assertion matched
    Passed,
    /// A step failed or an assertion mismatched
    Failed,
    /// A declared precondition failed before any step ran
    Skipped,
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every selected row reached a terminal state
    #[default]
    Completed,
    /// Cancelled between rows
    Aborted,
}

/// Expected vs. observed UI value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    /// Field or selector-table key being verified
    pub field: String,
    /// Expected value
    pub expected: String,
    /// Observed value
    pub actual: String,
}

impl Mismatch {
    /// Create a mismatch record
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Failure detail of a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// Error variant
    pub kind: ErrorKind,
    /// Index of the step that failed, if a step was running
    pub step: Option<usize>,
    /// Human readable message
    pub message: String,
}

impl RowError {
    /// Capture an error raised by `step`
    #[must_use]
    pub fn from_error(err: &TabflowError, step: Option<usize>) -> Self {
        Self {
            kind: err.kind(),
            step,
            message: err.to_string(),
        }
    }
}

/// Outcome of one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Zero-based row index in the source sheet
    pub row_index: usize,
    /// Terminal status
    pub status: RowStatus,
    /// Assertion mismatches, in step order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mismatches: Vec<Mismatch>,
    /// Failure or skip cause
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RowError>,
    /// Number of executions, retries included
    pub attempts: u32,
    /// Wall time of the final attempt
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Row passed
    #[must_use]
    pub fn passed(row_index: usize, duration: Duration) -> Self {
        Self {
            row_index,
            status: RowStatus::Passed,
            mismatches: Vec::new(),
            error: None,
            attempts: 1,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Row failed with a typed error
    #[must_use]
    pub fn failed(row_index: usize, error: RowError, duration: Duration) -> Self {
        Self {
            row_index,
            status: RowStatus::Failed,
            mismatches: Vec::new(),
            error: Some(error),
            attempts: 1,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Row skipped before any step ran
    #[must_use]
    pub fn skipped(row_index: usize, error: RowError) -> Self {
        Self {
            row_index,
            status: RowStatus::Skipped,
            mismatches: Vec::new(),
            error: Some(error),
            attempts: 0,
            duration_ms: 0,
        }
    }

    /// Attach mismatches
    #[must_use]
    pub fn with_mismatches(mut self, mismatches: Vec<Mismatch>) -> Self {
        self.mismatches = mismatches;
        self
    }

    /// Set the attempt count
    #[must_use]
    pub const fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Check if passed
    #[must_use]
    pub fn is_passed(&self) -> bool {
        self.status == RowStatus::Passed
    }

    /// Check if failed
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == RowStatus::Failed
    }
}

/// Aggregate over all recorded rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run id
    pub run_id: Uuid,
    /// Workflow name
    pub workflow: String,
    /// When the collector was created
    pub started_at: DateTime<Utc>,
    /// How the run ended
    pub status: RunStatus,
    /// Passed rows
    pub passed: usize,
    /// Failed rows
    pub failed: usize,
    /// Skipped rows
    pub skipped: usize,
    /// Per-row results ordered by row index
    pub results: Vec<ExecutionResult>,
}

impl RunSummary {
    /// Number of recorded rows
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Completed with no failed rows
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Completed && self.failed == 0
    }

    /// Failed rows
    #[must_use]
    pub fn failures(&self) -> Vec<&ExecutionResult> {
        self.results.iter().filter(|r| r.is_failed()).collect()
    }

    /// Result for one row
    #[must_use]
    pub fn result(&self, row_index: usize) -> Option<&ExecutionResult> {
        self.results.iter().find(|r| r.row_index == row_index)
    }

    /// Pretty JSON report
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Collects row outcomes during a run
#[derive(Debug, Clone)]
pub struct ResultCollector {
    run_id: Uuid,
    workflow: String,
    started_at: DateTime<Utc>,
    status: RunStatus,
    results: BTreeMap<usize, ExecutionResult>,
}

impl ResultCollector {
    /// Create a collector for one run
    #[must_use]
    pub fn new(workflow: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            workflow: workflow.into(),
            started_at: Utc::now(),
            status: RunStatus::Completed,
            results: BTreeMap::new(),
        }
    }

    /// Record a row outcome, replacing any earlier one for the same row
    pub fn record(&mut self, result: ExecutionResult) {
        self.results.insert(result.row_index, result);
    }

    /// Mark the run as aborted
    pub fn abort(&mut self) {
        self.status = RunStatus::Aborted;
    }

    /// Number of recorded rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Nothing recorded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Snapshot of the run so far
    #[must_use]
    pub fn summarize(&self) -> RunSummary {
        let count = |status| self.results.values().filter(|r| r.status == status).count();
        RunSummary {
            run_id: self.run_id,
            workflow: self.workflow.clone(),
            started_at: self.started_at,
            status: self.status,
            passed: count(RowStatus::Passed),
            failed: count(RowStatus::Failed),
            skipped: count(RowStatus::Skipped),
            results: self.results.values().cloned().collect(),
        }
    }
}
