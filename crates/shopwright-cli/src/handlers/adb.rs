//! Adb command handler

use super::config::load_settings;
use crate::commands::AdbCommand;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use shopwright::adb::Adb;
use std::path::Path;

/// Execute the adb command against the configured device
pub async fn execute_adb(config: &CliConfig, path: Option<&Path>, command: &AdbCommand) -> CliResult<()> {
    let settings = load_settings(path)?;
    let reporter = Reporter::from_config(config);
    match command {
        AdbCommand::Push { local, remote } => {
            if !local.is_file() {
                return Err(CliError::invalid_argument(format!(
                    "{} is not a file",
                    local.display()
                )));
            }
            let adb = Adb::new(settings.appium.udid.clone());
            let spinner = reporter.spinner(&format!("Pushing {} to {}", local.display(), adb.udid()));
            let result = adb.push_and_scan(local, remote).await;
            spinner.finish_and_clear();
            result?;
            reporter.success(&format!("{remote} is on {}", adb.udid()));
            Ok(())
        }
    }
}
