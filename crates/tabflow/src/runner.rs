//! Tabular workflow runner.
//!
//! Drives one [`WorkflowDefinition`] once per row of tabular data:
//!
//! ```text
//! Idle ──► Loading ──► Running{row} ──► Completed
//!             │             │
//!             └──► Aborted ◄┘ (source error, no usable rows, cancel)
//! ```
//!
//! A failing row never aborts the run. Its typed error is recorded and the
//! runner moves to the next row. Cancellation is observed between rows
//! only, so a step is never interrupted half way.

use crate::adapter::{ElementAdapter, DEFAULT_ELEMENT_TIMEOUT};
use crate::collector::{
    ExecutionResult, Mismatch, ResultCollector, RowError, RunStatus, RunSummary,
};
use crate::result::{TabflowError, TabflowResult};
use crate::row::Row;
use crate::source::{DataSource, SheetId};
use crate::workflow::{ReadKind, WorkflowDefinition, WorkflowStep};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Runner lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerState {
    /// Not started
    #[default]
    Idle,
    /// Loading rows from the data source
    Loading,
    /// Executing a row
    Running {
        /// Row index
        row: usize,
    },
    /// Every selected row reached a terminal state
    Completed,
    /// Stopped early
    Aborted,
}

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Element timeout for steps without their own `timeout_ms`
    pub default_timeout: Duration,
    /// Extra attempts for a failed row
    pub retries: u32,
    /// Restrict the run to these row indices
    pub rows: Option<Vec<usize>>,
    /// Save a page screenshot here when a row fails
    pub screenshot_dir: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_ELEMENT_TIMEOUT,
            retries: 0,
            rows: None,
            screenshot_dir: None,
        }
    }
}

impl RunnerConfig {
    /// Create default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default element timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set the number of retries for failed rows
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Run only the given rows
    #[must_use]
    pub fn with_rows(mut self, rows: Vec<usize>) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Capture failure screenshots into `dir`
    #[must_use]
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = Some(dir.into());
        self
    }
}

enum StepOutcome {
    Done,
    Skipped,
    Mismatch(Mismatch),
}

type RowCallback = Box<dyn FnMut(&ExecutionResult) + Send>;

/// Executes a workflow against every row of a data source
pub struct TabularWorkflowRunner {
    workflow: WorkflowDefinition,
    config: RunnerConfig,
    state: RunnerState,
    on_row: Option<RowCallback>,
}

impl std::fmt::Debug for TabularWorkflowRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabularWorkflowRunner")
            .field("workflow", &self.workflow.name)
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl TabularWorkflowRunner {
    /// Create a runner for a validated workflow
    #[must_use]
    pub fn new(workflow: WorkflowDefinition, config: RunnerConfig) -> Self {
        Self {
            workflow,
            config,
            state: RunnerState::Idle,
            on_row: None,
        }
    }

    /// Called with each row's final result, in row order
    #[must_use]
    pub fn on_row(mut self, callback: impl FnMut(&ExecutionResult) + Send + 'static) -> Self {
        self.on_row = Some(Box::new(callback));
        self
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> RunnerState {
        self.state
    }

    /// Workflow being run
    #[must_use]
    pub const fn workflow(&self) -> &WorkflowDefinition {
        &self.workflow
    }

    fn transition(&mut self, state: RunnerState) {
        tracing::trace!(from = ?self.state, to = ?state, "runner state");
        self.state = state;
    }

    /// Load rows from `source` and run the workflow on each.
    ///
    /// # Errors
    /// Data source errors and `EmptyData` abort the run and are returned.
    /// Row-level failures are recorded in the summary instead.
    pub async fn run<A, S>(
        &mut self,
        adapter: &mut A,
        source: &S,
        source_ref: &Path,
        sheet: &SheetId,
        cancel: &CancellationToken,
    ) -> TabflowResult<RunSummary>
    where
        A: ElementAdapter + ?Sized,
        S: DataSource + ?Sized,
    {
        self.transition(RunnerState::Loading);
        let rows = match source.load_rows(source_ref, sheet) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(source = %source_ref.display(), %sheet, error = %e, "data source failed");
                self.transition(RunnerState::Aborted);
                return Err(e);
            }
        };
        self.run_rows(adapter, rows, cancel).await
    }

    /// Run the workflow on rows the caller already loaded.
    ///
    /// # Errors
    /// Returns `EmptyData` when no selected row carries every required field.
    pub async fn run_rows<A>(
        &mut self,
        adapter: &mut A,
        rows: Vec<Row>,
        cancel: &CancellationToken,
    ) -> TabflowResult<RunSummary>
    where
        A: ElementAdapter + ?Sized,
    {
        let span = tracing::info_span!("run", workflow = %self.workflow.name);
        self.run_loop(adapter, rows, cancel).instrument(span).await
    }

    async fn run_loop<A>(
        &mut self,
        adapter: &mut A,
        rows: Vec<Row>,
        cancel: &CancellationToken,
    ) -> TabflowResult<RunSummary>
    where
        A: ElementAdapter + ?Sized,
    {
        self.transition(RunnerState::Loading);
        let rows = self.select_rows(rows);
        let required = self.workflow.required_fields();
        if !rows.iter().any(|r| r.missing_required(&required).is_empty()) {
            self.transition(RunnerState::Aborted);
            return Err(TabflowError::EmptyData {
                sheet: format!("{} selected row(s); none has every required field", rows.len()),
            });
        }

        let mut collector = ResultCollector::new(self.workflow.name.clone());
        tracing::info!(rows = rows.len(), steps = self.workflow.steps.len(), "run started");

        for row in &rows {
            if cancel.is_cancelled() {
                tracing::warn!(next_row = row.index, "run cancelled");
                collector.abort();
                break;
            }
            self.transition(RunnerState::Running { row: row.index });
            let span = tracing::info_span!("row", workflow = %self.workflow.name, row = row.index);
            let result = self
                .execute_with_retries(adapter, row, &required, &mut collector)
                .instrument(span)
                .await;
            if let Some(callback) = self.on_row.as_mut() {
                callback(&result);
            }
        }

        let summary = collector.summarize();
        self.transition(match summary.status {
            RunStatus::Completed => RunnerState::Completed,
            RunStatus::Aborted => RunnerState::Aborted,
        });
        tracing::info!(
            run_id = %summary.run_id,
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            status = ?summary.status,
            "run finished"
        );
        Ok(summary)
    }

    fn select_rows(&self, rows: Vec<Row>) -> Vec<Row> {
        let Some(selected) = &self.config.rows else {
            return rows;
        };
        for index in selected {
            if !rows.iter().any(|r| r.index == *index) {
                tracing::warn!(row = index, "selected row does not exist");
            }
        }
        rows.into_iter()
            .filter(|r| selected.contains(&r.index))
            .collect()
    }

    async fn execute_with_retries<A>(
        &self,
        adapter: &mut A,
        row: &Row,
        required: &[String],
        collector: &mut ResultCollector,
    ) -> ExecutionResult
    where
        A: ElementAdapter + ?Sized,
    {
        let missing = row.missing_required(required);
        if !missing.is_empty() {
            let err = TabflowError::RequiredFieldMissing { fields: missing };
            tracing::warn!(reason = %err, "row skipped");
            let result = ExecutionResult::skipped(row.index, RowError::from_error(&err, None));
            collector.record(result.clone());
            return result;
        }

        let mut attempt = 1;
        loop {
            let result = self.execute_row(adapter, row).await.with_attempts(attempt);
            collector.record(result.clone());
            if !result.is_failed() || attempt > self.config.retries {
                if result.is_failed() {
                    self.capture_failure(adapter, row.index).await;
                }
                return result;
            }
            tracing::warn!(attempt, "row failed, retrying");
            attempt += 1;
        }
    }

    async fn execute_row<A>(&self, adapter: &mut A, row: &Row) -> ExecutionResult
    where
        A: ElementAdapter + ?Sized,
    {
        let start = Instant::now();
        let mut mismatches = Vec::new();
        let mut first_mismatch = None;

        for (index, step) in self.workflow.steps.iter().enumerate() {
            tracing::debug!(step = index, action = step.action(), "{step}");
            match self.execute_step(adapter, step, row).await {
                Ok(StepOutcome::Done) => {}
                Ok(StepOutcome::Skipped) => {
                    tracing::debug!(step = index, "optional field empty, step skipped");
                }
                Ok(StepOutcome::Mismatch(mismatch)) => {
                    tracing::warn!(
                        step = index,
                        field = %mismatch.field,
                        expected = %mismatch.expected,
                        actual = %mismatch.actual,
                        "assertion mismatch"
                    );
                    first_mismatch.get_or_insert(index);
                    mismatches.push(mismatch);
                }
                Err(err) => {
                    tracing::warn!(step = index, error = %err, "row failed");
                    return ExecutionResult::failed(
                        row.index,
                        RowError::from_error(&err, Some(index)),
                        start.elapsed(),
                    )
                    .with_mismatches(mismatches);
                }
            }
        }

        match mismatches.first() {
            None => ExecutionResult::passed(row.index, start.elapsed()),
            Some(first) => {
                let err = TabflowError::AssertionMismatch {
                    field: first.field.clone(),
                    expected: first.expected.clone(),
                    actual: first.actual.clone(),
                };
                let mut error = RowError::from_error(&err, first_mismatch);
                if mismatches.len() > 1 {
                    error.message = format!("{} (+{} more)", error.message, mismatches.len() - 1);
                }
                ExecutionResult::failed(row.index, error, start.elapsed())
                    .with_mismatches(mismatches)
            }
        }
    }

    async fn execute_step<A>(
        &self,
        adapter: &mut A,
        step: &WorkflowStep,
        row: &Row,
    ) -> TabflowResult<StepOutcome>
    where
        A: ElementAdapter + ?Sized,
    {
        let timeout = step.timeout().unwrap_or(self.config.default_timeout);
        match step {
            WorkflowStep::Navigate { url } => {
                let Some(url) = url.render(row)? else {
                    return Ok(StepOutcome::Skipped);
                };
                adapter.navigate(&url).await?;
            }
            WorkflowStep::Fill { target, value, .. } => {
                let Some(value) = value.render(row)? else {
                    return Ok(StepOutcome::Skipped);
                };
                let Some(selector) = self.workflow.selector(target, row)? else {
                    return Ok(StepOutcome::Skipped);
                };
                adapter.fill(&selector, &value, timeout).await?;
            }
            WorkflowStep::Select {
                target,
                option,
                match_mode,
                ..
            } => {
                let Some(option) = option.render(row)? else {
                    return Ok(StepOutcome::Skipped);
                };
                let Some(selector) = self.workflow.selector(target, row)? else {
                    return Ok(StepOutcome::Skipped);
                };
                let chosen = adapter
                    .select_option(&selector, &option, *match_mode, timeout)
                    .await?;
                tracing::debug!(requested = %option, %chosen, "option selected");
            }
            WorkflowStep::Check { target, .. } => {
                let Some(selector) = self.workflow.selector(target, row)? else {
                    return Ok(StepOutcome::Skipped);
                };
                adapter.check(&selector, timeout).await?;
            }
            WorkflowStep::Click {
                target, dialog, ..
            } => {
                let Some(selector) = self.workflow.selector(target, row)? else {
                    return Ok(StepOutcome::Skipped);
                };
                match dialog {
                    Some(response) => {
                        let handled = adapter
                            .click_with_dialog(&selector, response.clone(), timeout)
                            .await?;
                        for d in &handled {
                            tracing::info!(kind = %d.dialog_type, message = %d.message, "dialog handled");
                        }
                    }
                    None => adapter.click(&selector, timeout).await?,
                }
            }
            WorkflowStep::WaitFor { target, .. } => {
                let Some(selector) = self.workflow.selector(target, row)? else {
                    return Ok(StepOutcome::Skipped);
                };
                adapter.wait_for(&selector, timeout).await?;
            }
            WorkflowStep::AssertText {
                target,
                expected,
                match_mode,
                read,
                ..
            } => {
                let Some(want) = expected.render(row)? else {
                    return Ok(StepOutcome::Skipped);
                };
                let Some(selector) = self.workflow.selector(target, row)? else {
                    return Ok(StepOutcome::Skipped);
                };
                let actual = match read {
                    ReadKind::Text => adapter.read_text(&selector, timeout).await?,
                    ReadKind::Value => adapter.read_value(&selector, timeout).await?,
                };
                if !match_mode.matches(&want, &actual) {
                    // Report the row field when the expectation is a single placeholder
                    let field = match expected.placeholders()?.as_slice() {
                        [only] => only.clone(),
                        _ => target.clone(),
                    };
                    return Ok(StepOutcome::Mismatch(Mismatch::new(field, want, actual)));
                }
            }
        }
        Ok(StepOutcome::Done)
    }

    async fn capture_failure<A>(&self, adapter: &mut A, row_index: usize)
    where
        A: ElementAdapter + ?Sized,
    {
        let Some(dir) = &self.config.screenshot_dir else {
            return;
        };
        let png = match adapter.screenshot().await {
            Ok(png) if !png.is_empty() => png,
            Ok(_) => return,
            Err(e) => {
                tracing::warn!(error = %e, "screenshot failed");
                return;
            }
        };
        let path = dir.join(format!("{}-row{row_index}.png", self.workflow.name));
        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, png).await
        }
        .await;
        match written {
            Ok(()) => tracing::info!(path = %path.display(), "failure screenshot saved"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not save screenshot"),
        }
    }
}
