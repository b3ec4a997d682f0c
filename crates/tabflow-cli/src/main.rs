//! Tabflow CLI: run a browser workflow once per spreadsheet row
//!
//! ## Usage
//!
//! ```bash
//! tabflow run workflows/login.yaml --data testData.xlsx --sheet Users
//! tabflow run workflows/cart.yaml --rows 0,2 --retries 1 --report out.json
//! tabflow validate workflows/address_add.yaml --data testData.xlsx --sheet 1
//! tabflow inspect --data testData.xlsx
//! ```
//!
//! Exit codes: 0 when every row passed, 1 when a row failed or the run was
//! interrupted, 2 on configuration, data or workflow errors.

use clap::Parser;
use std::process::ExitCode;
use tabflow_cli::{
    handlers, logging, Cli, CliConfig, CliResult, Commands, ProgressReporter, Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run() -> CliResult<bool> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(config.verbosity, config.log_format);

    match cli.command {
        Commands::Run(ref args) => handlers::execute_run(&config, args),
        Commands::Validate(ref args) => {
            let reporter = ProgressReporter::new(
                config.color.should_color(),
                config.verbosity.is_quiet(),
            );
            handlers::execute_validate(&reporter, args)?;
            Ok(true)
        }
        Commands::Inspect(ref args) => {
            handlers::execute_inspect(args)?;
            Ok(true)
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_log_format(cli.log_format.into())
}
