//! Result and error types for Tabflow.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for Tabflow operations
pub type TabflowResult<T> = Result<T, TabflowError>;

/// Errors that can occur in Tabflow
#[derive(Debug, Error)]
pub enum TabflowError {
    /// Tabular source file does not exist
    #[error("Data source not found: {}", path.display())]
    SourceNotFound {
        /// Path that was requested
        path: PathBuf,
    },

    /// Sheet index or name does not resolve
    #[error("Sheet '{sheet}' not found (available: {})", available.join(", "))]
    SheetNotFound {
        /// Requested sheet identifier
        sheet: String,
        /// Sheets present in the source
        available: Vec<String>,
    },

    /// Source produced zero usable rows
    #[error("No usable data rows in {sheet}")]
    EmptyData {
        /// Sheet that was read, or a description of the row set
        sheet: String,
    },

    /// Row lacks a field the workflow declares as required
    #[error("Required field missing: {}", fields.join(", "))]
    RequiredFieldMissing {
        /// Missing or empty fields
        fields: Vec<String>,
    },

    /// No element matched the selector within the bounded wait
    #[error("Element not found: {selector} (waited {timeout_ms}ms)")]
    ElementNotFound {
        /// Selector that was queried
        selector: String,
        /// How long we waited
        timeout_ms: u64,
    },

    /// Element exists but cannot receive the action
    #[error("Element not interactable: {selector} ({reason})")]
    ElementNotInteractable {
        /// Selector that was queried
        selector: String,
        /// Why the action was refused
        reason: String,
    },

    /// No option of a select element matches the requested label
    #[error("Option '{requested}' not found in {selector} (available: {})", available.join(", "))]
    OptionNotFound {
        /// Select element selector
        selector: String,
        /// Requested label
        requested: String,
        /// Labels present on the element
        available: Vec<String>,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Timed out after {ms}ms waiting for {what}")]
    Timeout {
        /// What we were waiting for
        what: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// UI value differs from the expected value
    #[error("Assertion mismatch on {field}: expected '{expected}', got '{actual}'")]
    AssertionMismatch {
        /// Field or selector being verified
        field: String,
        /// Expected value
        expected: String,
        /// Observed value
        actual: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// In-page script evaluation failed
    #[error("Script evaluation failed: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Workflow definition failed static validation
    #[error("Invalid workflow: {message}")]
    InvalidWorkflow {
        /// Error message
        message: String,
    },

    /// Spreadsheet could not be decoded
    #[error("Workbook error: {message}")]
    Workbook {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Stable, serializable tag for a [`TabflowError`] variant
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SourceNotFound,
    SheetNotFound,
    EmptyData,
    RequiredFieldMissing,
    ElementNotFound,
    ElementNotInteractable,
    OptionNotFound,
    NavigationError,
    Timeout,
    AssertionMismatch,
    Browser,
    Script,
    InvalidWorkflow,
    Workbook,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SourceNotFound => "SourceNotFound",
            Self::SheetNotFound => "SheetNotFound",
            Self::EmptyData => "EmptyData",
            Self::RequiredFieldMissing => "RequiredFieldMissing",
            Self::ElementNotFound => "ElementNotFound",
            Self::ElementNotInteractable => "ElementNotInteractable",
            Self::OptionNotFound => "OptionNotFound",
            Self::NavigationError => "NavigationError",
            Self::Timeout => "Timeout",
            Self::AssertionMismatch => "AssertionMismatch",
            Self::Browser => "Browser",
            Self::Script => "Script",
            Self::InvalidWorkflow => "InvalidWorkflow",
            Self::Workbook => "Workbook",
            Self::Io => "Io",
        };
        f.write_str(name)
    }
}

impl TabflowError {
    /// Variant tag, for recording in results
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceNotFound { .. } => ErrorKind::SourceNotFound,
            Self::SheetNotFound { .. } => ErrorKind::SheetNotFound,
            Self::EmptyData { .. } => ErrorKind::EmptyData,
            Self::RequiredFieldMissing { .. } => ErrorKind::RequiredFieldMissing,
            Self::ElementNotFound { .. } => ErrorKind::ElementNotFound,
            Self::ElementNotInteractable { .. } => ErrorKind::ElementNotInteractable,
            Self::OptionNotFound { .. } => ErrorKind::OptionNotFound,
            Self::NavigationError { .. } => ErrorKind::NavigationError,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::AssertionMismatch { .. } => ErrorKind::AssertionMismatch,
            Self::BrowserLaunch { .. } | Self::Page { .. } => ErrorKind::Browser,
            Self::Script { .. } | Self::Json(_) => ErrorKind::Script,
            Self::InvalidWorkflow { .. } | Self::Yaml(_) => ErrorKind::InvalidWorkflow,
            Self::Workbook { .. } => ErrorKind::Workbook,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Errors raised while loading input; these abort a whole run
    #[must_use]
    pub const fn is_source_error(&self) -> bool {
        matches!(
            self,
            Self::SourceNotFound { .. }
                | Self::SheetNotFound { .. }
                | Self::EmptyData { .. }
                | Self::Workbook { .. }
        )
    }

    #[cfg_attr(not(feature = "browser"), allow(dead_code))]
    pub(crate) fn script(message: impl Into<String>) -> Self {
        Self::Script {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_workflow(message: impl Into<String>) -> Self {
        Self::InvalidWorkflow {
            message: message.into(),
        }
    }
}
