//! Tabflow: data-driven UI workflow runner
//!
//! Loads rows from a spreadsheet and drives a declarative browser workflow
//! once per row, collecting a typed pass/fail/skip outcome for each.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐    ┌──────────────────────┐    ┌────────────────┐
//! │ DataSource │───►│ TabularWorkflowRunner│───►│ ElementAdapter │
//! │ (rows)     │    │ (WorkflowDefinition) │    │ (browser/mock) │
//! └────────────┘    └──────────┬───────────┘    └────────────────┘
//!                              ▼
//!                     ┌─────────────────┐
//!                     │ ResultCollector │──► RunSummary
//!                     └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use tabflow::prelude::*;
//! use std::path::Path;
//!
//! # async fn demo() -> TabflowResult<()> {
//! let workflow = WorkflowDefinition::from_file(Path::new("workflows/login.yaml"))?;
//! let mut adapter = MockAdapter::new();
//! let mut runner = TabularWorkflowRunner::new(workflow, RunnerConfig::default());
//! let summary = runner
//!     .run(
//!         &mut adapter,
//!         &XlsxSource::new(),
//!         Path::new("testData.xlsx"),
//!         &SheetId::Index(0),
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//! println!("{} passed, {} failed", summary.passed, summary.failed);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod adapter;
mod browser;
mod collector;
mod dialog;
mod locator;
mod result;
mod row;
#[allow(clippy::missing_errors_doc)]
mod runner;
#[allow(clippy::missing_errors_doc)]
mod source;
#[allow(clippy::missing_errors_doc)]
mod workflow;

pub use adapter::{
    resolve_option, ElementAdapter, MatchMode, MockAdapter, MockElement, MockFault, MockKind,
    DEFAULT_ELEMENT_TIMEOUT,
};
pub use browser::{resolve_url, BrowserConfig};
#[cfg(feature = "browser")]
pub use browser::{Browser, ChromiumAdapter};
pub use collector::{
    ExecutionResult, Mismatch, ResultCollector, RowError, RowStatus, RunStatus, RunSummary,
};
pub use dialog::{Dialog, DialogGuard, DialogResponse, DialogType};
pub use locator::Selector;
pub use result::{ErrorKind, TabflowError, TabflowResult};
pub use row::{CellValue, Row};
pub use runner::{RunnerConfig, RunnerState, TabularWorkflowRunner};
pub use source::{DataSource, MemorySource, Sheet, SheetId, XlsxSource};
pub use tokio_util::sync::CancellationToken;
pub use workflow::{FieldDecl, ReadKind, Template, WorkflowDefinition, WorkflowStep, WORKFLOW_VERSION};

/// Everything needed to define and run a workflow
pub mod prelude {
    pub use super::{
        CancellationToken, CellValue, DataSource, ElementAdapter, ExecutionResult, MatchMode,
        MemorySource, MockAdapter, MockElement, ResultCollector, Row, RowStatus, RunStatus,
        RunSummary, RunnerConfig, RunnerState, SheetId, TabflowError, TabflowResult,
        TabularWorkflowRunner, WorkflowDefinition, WorkflowStep, XlsxSource,
    };
    #[cfg(feature = "browser")]
    pub use super::{Browser, BrowserConfig, ChromiumAdapter};
}
