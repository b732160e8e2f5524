//! Shopwright CLI library
//!
//! Command definitions, output, logging setup, tag expressions and the
//! handlers behind every subcommand except `run`, whose cucumber glue lives
//! in the binary so the step registry is always linked.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;
pub mod tags;

pub use commands::{AdbCommand, Cli, ColorArg, Commands, ConfigCommand, LocatorArgs, ReportCommand, RunArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{summary_line, Reporter};
pub use tags::TagExpr;
