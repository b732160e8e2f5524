//! Report command handler

use super::config::load_settings;
use crate::commands::ReportCommand;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use shopwright::report::{self, is_config_problem};
use shopwright::trace::SuiteSummary;
use shopwright::Settings;
use std::path::{Path, PathBuf};

/// Archive path for `report zip`
#[must_use]
pub fn archive_target(settings: &Settings, output: Option<&Path>) -> PathBuf {
    output.map_or_else(|| settings.reporting.archive_path.clone(), Path::to_path_buf)
}

/// Execute the report command
pub async fn execute_report(config: &CliConfig, path: Option<&Path>, command: &ReportCommand) -> CliResult<()> {
    let settings = load_settings(path)?;
    let reporter = Reporter::from_config(config);
    match command {
        ReportCommand::Zip { output } => {
            let dest = archive_target(&settings, output.as_deref());
            let files = report::zip_dir(&settings.reporting.report_dir, &dest)?;
            reporter.success(&format!("{files} files archived to {}", dest.display()));
            let summary = SuiteSummary::from_dir(&settings.reporting.traces_dir)?;
            if summary.total() > 0 {
                reporter.info(&format!(
                    "{} scenarios traced: {} passed, {} failed",
                    summary.total(),
                    summary.passed,
                    summary.failed
                ));
            }
            Ok(())
        }
        ReportCommand::Email => {
            let spinner = reporter.spinner("Archiving and mailing report");
            let result = report::archive_and_mail(&settings.reporting, &settings.email).await;
            spinner.finish_and_clear();
            match result {
                Ok(true) => {
                    reporter.success(&format!("Report mailed to {}", settings.email.to.join(", ")));
                    Ok(())
                }
                Ok(false) => {
                    reporter.warning("email.enabled is false, nothing was sent");
                    Ok(())
                }
                Err(e) if is_config_problem(&e) => Err(CliError::config(e.to_string())),
                Err(e) => Err(CliError::report(e.to_string())),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;

    fn write_settings(dir: &Path, email_enabled: bool) -> PathBuf {
        let report_dir = dir.join("report");
        fs::create_dir_all(report_dir.join("traces")).unwrap();
        fs::write(report_dir.join("screenshot.png"), b"png").unwrap();
        let yaml = format!(
            "reporting:\n  report_dir: {}\n  traces_dir: {}\n  archive_path: {}\nemail:\n  enabled: {email_enabled}\n",
            report_dir.display(),
            report_dir.join("traces").display(),
            dir.join("report.zip").display(),
        );
        let path = dir.join("shopwright.yaml");
        fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn test_archive_target_prefers_output() {
        let settings = Settings::default();
        assert_eq!(archive_target(&settings, None), settings.reporting.archive_path);
        assert_eq!(
            archive_target(&settings, Some(Path::new("out.zip"))),
            PathBuf::from("out.zip")
        );
    }

    #[tokio::test]
    async fn test_zip_writes_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(dir.path(), false);
        let config = CliConfig::new();
        execute_report(&config, Some(&path), &ReportCommand::Zip { output: None })
            .await
            .unwrap();
        assert!(dir.path().join("report.zip").is_file());
    }

    #[tokio::test]
    async fn test_email_disabled_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(dir.path(), false);
        execute_report(&CliConfig::new(), Some(&path), &ReportCommand::Email)
            .await
            .unwrap();
        assert!(!dir.path().join("report.zip").exists());
    }

    #[tokio::test]
    async fn test_email_without_recipients_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(dir.path(), true);
        let err = execute_report(&CliConfig::new(), Some(&path), &ReportCommand::Email)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }
}
