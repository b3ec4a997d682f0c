//! Tabflow CLI library
//!
//! Argument parsing, output and command handlers behind the `tabflow`
//! binary. Kept in a library so handlers can be tested without a process.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, DataArgs, InspectArgs, LogFormatArg, OutputFormatArg, RunArgs,
    ValidateArgs,
};
pub use config::{CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{row_line, OutputFormat, ProgressReporter};
