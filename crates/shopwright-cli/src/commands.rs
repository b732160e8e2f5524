//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shopwright: end-to-end scenarios for the shop mobile app over Appium
#[derive(Parser, Debug)]
#[command(name = "shopwright")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Settings file (defaults to config/shopwright.yaml, then shopwright.yaml)
    #[arg(short, long, global = true, env = "SHOPWRIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run feature files against the configured device
    Run(RunArgs),

    /// Inspect the loaded settings
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Print the resolved strategy and value of a locator key
    Locator(LocatorArgs),

    /// Archive or mail the report directory
    #[command(subcommand)]
    Report(ReportCommand),

    /// Device file helpers
    #[command(subcommand)]
    Adb(AdbCommand),
}

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Feature file or directory (defaults to `run.features`)
    #[arg(short, long)]
    pub features: Option<PathBuf>,

    /// Tag expression, e.g. "@cart and not @logout"
    #[arg(short, long)]
    pub tags: Option<String>,

    /// Only scenarios whose name matches this regex
    #[arg(short, long)]
    pub name: Option<String>,

    /// Stop after the first failed scenario
    #[arg(long)]
    pub fail_fast: bool,
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigCommand {
    /// Print the settings summary and the sorted property dump
    Show,
    /// Check that every locator key resolves for the configured platform
    Check,
}

/// Arguments for the locator command
#[derive(Args, Debug, Clone)]
pub struct LocatorArgs {
    /// Locator key, e.g. `loginButton.text`
    pub key: String,
}

/// Report subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ReportCommand {
    /// Zip the report directory
    Zip {
        /// Archive path (defaults to `reporting.archive_path`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Zip the report directory and mail it
    Email,
}

/// Adb subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AdbCommand {
    /// Push a file, trigger a media scan and verify it landed
    Push {
        /// Local file
        local: PathBuf,
        /// Device path, e.g. /sdcard/Download/proof.jpg
        remote: String,
    },
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
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
