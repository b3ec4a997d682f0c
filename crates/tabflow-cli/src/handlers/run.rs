//! Run command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{row_line, OutputFormat, ProgressReporter};
use crate::RunArgs;
use std::time::{Duration, Instant};
use tabflow::{
    BrowserConfig, CancellationToken, DataSource, Row, RunSummary, RunnerConfig,
    TabularWorkflowRunner, WorkflowDefinition, XlsxSource,
};

/// Execute the run command. Returns whether every row passed.
pub fn execute_run(config: &CliConfig, args: &RunArgs) -> CliResult<bool> {
    let mut reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());

    if args.timeout_ms == 0 {
        return Err(CliError::invalid_argument("--timeout-ms must be greater than 0"));
    }
    let workflow = WorkflowDefinition::from_file(&args.workflow)?;
    let data = args.source.data.as_ref().ok_or_else(|| {
        CliError::config("no test data; pass --data or set TEST_DATA_PATH")
    })?;

    // Load and check the data before a browser is launched
    let sheet = XlsxSource::new().load_sheet(data, &args.source.sheet)?;
    workflow.validate_headers(&sheet.headers)?;
    let rows = sheet.rows;

    let runner_config = runner_config(args);
    let total = planned_rows(&rows, runner_config.rows.as_deref());
    if args.rows.is_empty() {
        reporter.info(&format!(
            "{}: {total} rows from {}",
            workflow.name,
            data.display()
        ));
    } else {
        reporter.info(&format!(
            "{}: {total} of {} rows from {}",
            workflow.name,
            rows.len(),
            data.display()
        ));
    }

    reporter.start_progress(total as u64, &workflow.name);
    let progress = reporter.progress_handle();
    let mut runner = TabularWorkflowRunner::new(workflow, runner_config).on_row(move |result| {
        if let Some(ref pb) = progress {
            pb.set_message(row_line(result));
            pb.inc(1);
        }
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let start = Instant::now();
    let outcome = runtime.block_on(async {
        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted; stopping after the current row");
                interrupt.cancel();
            }
        });
        drive(&mut runner, browser_config(args), rows, &cancel).await
    });
    reporter.finish();
    let summary = outcome?;

    if let Some(ref path) = args.report {
        std::fs::write(path, summary.to_json()?)?;
        reporter.info(&format!("report written to {}", path.display()));
    }

    match OutputFormat::from(args.format) {
        OutputFormat::Text => reporter.summary(&summary, start.elapsed()),
        OutputFormat::Json => println!("{}", summary.to_json()?),
    }

    Ok(summary.is_success())
}

/// Runner settings from the command line
#[must_use]
pub fn runner_config(args: &RunArgs) -> RunnerConfig {
    let mut config = RunnerConfig::new()
        .with_timeout(Duration::from_millis(args.timeout_ms))
        .with_retries(args.retries);
    if !args.rows.is_empty() {
        config = config.with_rows(args.rows.clone());
    }
    if let Some(ref dir) = args.screenshot_dir {
        config = config.with_screenshot_dir(dir.clone());
    }
    config
}

/// Browser settings from the command line
#[must_use]
pub fn browser_config(args: &RunArgs) -> BrowserConfig {
    let mut config = BrowserConfig::default().with_headless(args.headless);
    if let Some(ref path) = args.chromium_path {
        config = config.with_chromium_path(path);
    }
    if let Some(ref url) = args.base_url {
        config = config.with_base_url(url);
    }
    if let Some(ref ua) = args.user_agent {
        config = config.with_user_agent(ua);
    }
    if args.no_sandbox {
        config = config.with_no_sandbox();
    }
    config
}

/// Number of rows a run will visit
#[must_use]
pub fn planned_rows(rows: &[Row], selected: Option<&[usize]>) -> usize {
    match selected {
        Some(selected) => rows.iter().filter(|r| selected.contains(&r.index)).count(),
        None => rows.len(),
    }
}

#[cfg(feature = "browser")]
async fn drive(
    runner: &mut TabularWorkflowRunner,
    browser_config: BrowserConfig,
    rows: Vec<Row>,
    cancel: &CancellationToken,
) -> CliResult<RunSummary> {
    let browser = tabflow::Browser::launch(browser_config).await?;
    let mut adapter = browser.new_adapter().await?;
    let outcome = runner.run_rows(&mut adapter, rows, cancel).await;
    drop(adapter);
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "browser did not shut down cleanly");
    }
    Ok(outcome?)
}

#[cfg(not(feature = "browser"))]
async fn drive(
    _runner: &mut TabularWorkflowRunner,
    _browser_config: BrowserConfig,
    _rows: Vec<Row>,
    _cancel: &CancellationToken,
) -> CliResult<RunSummary> {
    Err(CliError::config(
        "built without browser support; rebuild with --features browser",
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::{Cli, Commands};
    use clap::Parser;

    fn run_args(extra: &[&str]) -> RunArgs {
        let args = ["tabflow", "run", "w.yaml"].iter().chain(extra.iter());
        match Cli::try_parse_from(args).unwrap().command {
            Commands::Run(args) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_runner_config_from_flags() {
        let args = run_args(&["--rows", "1,3", "--retries", "2", "--timeout-ms", "750"]);
        let config = runner_config(&args);
        assert_eq!(config.rows, Some(vec![1, 3]));
        assert_eq!(config.retries, 2);
        assert_eq!(config.default_timeout, Duration::from_millis(750));
        assert!(config.screenshot_dir.is_none());
    }

    #[test]
    fn test_runner_config_all_rows_by_default() {
        let config = runner_config(&run_args(&[]));
        assert!(config.rows.is_none());
    }

    #[test]
    fn test_browser_config_from_flags() {
        let args = run_args(&[
            "--headless",
            "false",
            "--no-sandbox",
            "--base-url",
            "https://shop.test",
            "--user-agent",
            "tabflow-ci",
        ]);
        let config = browser_config(&args);
        assert!(!config.headless);
        assert!(!config.sandbox);
        assert_eq!(config.base_url.as_deref(), Some("https://shop.test"));
        assert_eq!(config.user_agent.as_deref(), Some("tabflow-ci"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let args = run_args(&["--timeout-ms", "0"]);
        let err = execute_run(&CliConfig::new(), &args).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument { .. }));
    }

    #[test]
    fn test_planned_rows() {
        let rows: Vec<Row> = (0..4).map(Row::new).collect();
        assert_eq!(planned_rows(&rows, None), 4);
        assert_eq!(planned_rows(&rows, Some(&[1, 3, 9])), 2);
    }
}
