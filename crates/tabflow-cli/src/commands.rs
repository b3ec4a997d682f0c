//! CLI command definitions using clap

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tabflow::SheetId;

/// Tabflow: run a browser workflow once per spreadsheet row
#[derive(Parser, Debug)]
#[command(name = "tabflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, value_enum, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a workflow against every row of a sheet
    Run(RunArgs),

    /// Check a workflow file, optionally against a sheet's columns
    Validate(ValidateArgs),

    /// List the sheets of a workbook, or print the rows of one sheet
    Inspect(InspectArgs),
}

/// Test data location
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Spreadsheet with one row per workflow execution
    #[arg(long, env = "TEST_DATA_PATH")]
    pub data: Option<PathBuf>,

    /// Worksheet by zero-based index or by name
    #[arg(long, env = "WORKSHEET", default_value = "0")]
    pub sheet: SheetId,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Workflow definition (YAML)
    pub workflow: PathBuf,

    #[command(flatten)]
    pub source: DataArgs,

    /// Only run these zero-based rows (comma separated)
    #[arg(long, env = "ROW_INDEX", value_delimiter = ',')]
    pub rows: Vec<usize>,

    /// Base URL that relative workflow URLs resolve against
    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// Re-run a failed row up to this many times
    #[arg(long, env = "RETRIES", default_value = "0")]
    pub retries: u32,

    /// Default element timeout in milliseconds
    #[arg(long, env = "TIMEOUT_MS", default_value = "5000")]
    pub timeout_ms: u64,

    /// Run the browser headless
    #[arg(long, env = "HEADLESS", default_value_t = true, action = ArgAction::Set)]
    pub headless: bool,

    /// Chromium executable (auto-detected when unset)
    #[arg(long, env = "CHROMIUM_PATH")]
    pub chromium_path: Option<String>,

    /// Override the browser user agent
    #[arg(long, env = "USER_AGENT")]
    pub user_agent: Option<String>,

    /// Disable the Chromium sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Save a screenshot here when a row fails
    #[arg(long, env = "SCREENSHOT_DIR")]
    pub screenshot_dir: Option<PathBuf>,

    /// Write the JSON run summary to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Summary format on stdout
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormatArg,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Workflow definition (YAML)
    pub workflow: PathBuf,

    #[command(flatten)]
    pub source: DataArgs,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Spreadsheet to inspect
    #[arg(long, env = "TEST_DATA_PATH")]
    pub data: PathBuf,

    /// Print the rows of this sheet instead of listing sheets
    #[arg(long)]
    pub sheet: Option<SheetId>,

    /// Summary format on stdout
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormatArg,
}

/// Output format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

impl From<OutputFormatArg> for crate::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Text => Self::Text,
            OutputFormatArg::Json => Self::Json,
        }
    }
}

/// Log format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl From<LogFormatArg> for crate::config::LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
