//! Output formatting and progress reporting

use console::{Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tabflow::{ExecutionResult, RowStatus, RunStatus, RunSummary};

/// Output format for run summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Pass,
    Fail,
    Warn,
    Info,
}

impl Level {
    fn symbol(self) -> (&'static str, Style) {
        match self {
            Self::Pass => ("✓", Style::new().green().bold()),
            Self::Fail => ("✗", Style::new().red().bold()),
            Self::Warn => ("⚠", Style::new().yellow().bold()),
            Self::Info => ("ℹ", Style::new().blue().bold()),
        }
    }

    const fn tag(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Warn => "WARN",
            Self::Info => "INFO",
        }
    }
}

/// Progress reporter for workflow runs
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` rows
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Handle to the active progress bar, for use from a row callback
    #[must_use]
    pub fn progress_handle(&self) -> Option<ProgressBar> {
        self.progress_bar.clone()
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn status_line(&self, level: Level, message: &str) {
        // Failures print even in quiet mode
        if self.quiet && level != Level::Fail {
            return;
        }
        let prefix = if self.use_color {
            let (symbol, style) = level.symbol();
            style.apply_to(symbol).to_string()
        } else {
            level.tag().to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a success line
    pub fn success(&self, message: &str) {
        self.status_line(Level::Pass, message);
    }

    /// Print a failure line
    pub fn failure(&self, message: &str) {
        self.status_line(Level::Fail, message);
    }

    /// Print a warning line
    pub fn warning(&self, message: &str) {
        self.status_line(Level::Warn, message);
    }

    /// Print an info line
    pub fn info(&self, message: &str) {
        self.status_line(Level::Info, message);
    }

    /// Print one line per row result
    pub fn row_result(&self, result: &ExecutionResult) {
        let line = row_line(result);
        match result.status {
            RowStatus::Passed => self.success(&line),
            RowStatus::Failed => {
                self.failure(&line);
                for m in &result.mismatches {
                    let _ = self.term.write_line(&format!(
                        "    {}: expected '{}', got '{}'",
                        m.field, m.expected, m.actual
                    ));
                }
            }
            RowStatus::Skipped => self.warning(&line),
        }
    }

    /// Print the run summary
    pub fn summary(&self, summary: &RunSummary, duration: Duration) {
        if self.quiet && summary.is_success() {
            return;
        }

        for result in &summary.results {
            if !self.quiet || result.is_failed() {
                self.row_result(result);
            }
        }

        let _ = self.term.write_line("");

        let label = match (summary.status, summary.failed) {
            (RunStatus::Aborted, _) => "ABORTED",
            (_, 0) => "PASSED",
            _ => "FAILED",
        };
        let duration_secs = duration.as_secs_f64();
        let total = summary.total();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let skipped_style = Style::new().yellow();

            let status = if summary.is_success() {
                passed_style.apply_to(label)
            } else {
                failed_style.apply_to(label)
            };

            let _ = self.term.write_line(&format!(
                "{} {} {} rows in {:.2}s ({} passed, {} failed, {} skipped)",
                status,
                summary.workflow,
                total,
                duration_secs,
                passed_style.apply_to(summary.passed),
                if summary.failed > 0 {
                    failed_style.apply_to(summary.failed).to_string()
                } else {
                    summary.failed.to_string()
                },
                skipped_style.apply_to(summary.skipped)
            ));
        } else {
            let _ = self.term.write_line(&format!(
                "{label} {} {total} rows in {duration_secs:.2}s ({} passed, {} failed, {} skipped)",
                summary.workflow, summary.passed, summary.failed, summary.skipped
            ));
        }
    }
}

/// One-line description of a row result
#[must_use]
pub fn row_line(result: &ExecutionResult) -> String {
    let mut line = format!("row {} {}", result.row_index, result.status);
    if result.attempts > 1 {
        line.push_str(&format!(" after {} attempts", result.attempts));
    }
    if let Some(ref error) = result.error {
        match error.step {
            Some(step) => line.push_str(&format!(" at step {step}: {}", error.message)),
            None => line.push_str(&format!(": {}", error.message)),
        }
    }
    line
}
