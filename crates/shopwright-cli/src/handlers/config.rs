//! Config command handler

use crate::commands::ConfigCommand;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use shopwright::{LocatorBook, Platform, Settings};
use std::path::Path;

/// Load settings from `path` or the fallback locations
pub fn load_settings(path: Option<&Path>) -> CliResult<Settings> {
    Ok(Settings::load(path)?)
}

/// Platform named in `settings.appium.platform`
pub fn platform_of(settings: &Settings) -> CliResult<Platform> {
    Ok(settings.appium.platform.parse()?)
}

/// Every locator key that does not resolve, as `key: error` lines
pub fn check_locators(settings: &Settings) -> CliResult<Vec<String>> {
    let book = LocatorBook::from_settings(settings, platform_of(settings)?);
    Ok(book
        .check_all()
        .into_iter()
        .map(|(key, e)| format!("{key}: {e}"))
        .collect())
}

/// Execute the config command
pub fn execute_config(config: &CliConfig, path: Option<&Path>, command: ConfigCommand) -> CliResult<()> {
    let settings = load_settings(path)?;
    let reporter = Reporter::from_config(config);
    match command {
        ConfigCommand::Show => {
            reporter.header("Settings");
            println!("{}", settings.summary());
            if settings.email.enabled {
                println!("Report mail: {} -> {}", settings.email.from, settings.email.to.join(", "));
            }
            println!("Features: {}", settings.run.features.display());
            if !settings.run.default_tags.is_empty() {
                println!("Default tags: {}", settings.run.default_tags.join(" or "));
            }
            reporter.header("Properties");
            println!("{}", settings.dump());
            Ok(())
        }
        ConfigCommand::Check => {
            let problems = check_locators(&settings)?;
            if problems.is_empty() {
                reporter.success(&format!(
                    "{} locators resolve for {}",
                    settings.locators.len(),
                    settings.appium.platform
                ));
                return Ok(());
            }
            for problem in &problems {
                reporter.failure(problem);
            }
            Err(CliError::config(format!("{} locator(s) do not resolve", problems.len())))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;

    const YAML: &str = r#"
appium:
  platform: android
locators:
  loginButton.text: "Log in"
  homeBtn.automator: 'new UiSelector().description("Home")'
  broken.colour: "red"
"#;

    #[test]
    fn test_check_reports_unresolvable_keys() {
        let settings = Settings::from_yaml(YAML).unwrap();
        let problems = check_locators(&settings).unwrap();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].starts_with("broken.colour:"));
    }

    #[test]
    fn test_check_fails_on_unknown_platform() {
        let mut settings = Settings::from_yaml(YAML).unwrap();
        settings.appium.platform = "symbian".to_string();
        assert!(check_locators(&settings).is_err());
    }

    #[test]
    fn test_execute_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shopwright.yaml");
        fs::write(&path, YAML).unwrap();
        let config = CliConfig::new();
        execute_config(&config, Some(&path), ConfigCommand::Show).unwrap();
        let err = execute_config(&config, Some(&path), ConfigCommand::Check).unwrap_err();
        assert!(err.to_string().contains("1 locator(s)"));
    }
}
