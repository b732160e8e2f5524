//! Shopwright CLI: end-to-end scenarios for the shop mobile app
//!
//! ## Usage
//!
//! ```bash
//! shopwright run                          # Run the default tag set
//! shopwright run -t "@cart and not @slow" # Filter by tag expression
//! shopwright config check                 # Resolve every locator key
//! shopwright locator homeBtn.automator    # Show one resolved locator
//! shopwright report zip                   # Archive the report directory
//! ```

mod runner;
mod steps;
mod world;

use clap::Parser;
use shopwright_cli::handlers::{execute_adb, execute_config, execute_locator, execute_report};
use shopwright_cli::{logging, Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(&config);

    let settings_path = cli.config.as_deref();
    match cli.command {
        Commands::Run(args) => block_on(runner::run(&config, settings_path, &args)),
        Commands::Config(command) => execute_config(&config, settings_path, command),
        Commands::Locator(args) => execute_locator(settings_path, &args.key),
        Commands::Report(command) => block_on(execute_report(&config, settings_path, &command)),
        Commands::Adb(command) => block_on(execute_adb(&config, settings_path, &command)),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_json(cli.log_json)
}

fn block_on<F: std::future::Future<Output = CliResult<()>>>(future: F) -> CliResult<()> {
    tokio::runtime::Runtime::new()?.block_on(future)
}
