//! End-of-run report delivery: zip the report directory and mail it.

pub mod archive;
#[cfg(feature = "email")]
pub mod email;

pub use archive::zip_dir;
#[cfg(feature = "email")]
pub use email::ReportMailer;

use crate::config::{EmailSettings, ReportingSettings};
use crate::result::{ShopError, ShopResult};
use tracing::info;

/// Zip the report directory and mail it. Returns whether a mail was sent;
/// nothing is archived when email is disabled.
pub async fn archive_and_mail(reporting: &ReportingSettings, email: &EmailSettings) -> ShopResult<bool> {
    if !email.enabled {
        info!("email sending is disabled");
        return Ok(false);
    }
    zip_dir(&reporting.report_dir, &reporting.archive_path)?;
    send(email, &reporting.archive_path).await
}

#[cfg(feature = "email")]
async fn send(email: &EmailSettings, archive: &std::path::Path) -> ShopResult<bool> {
    ReportMailer::new(email.clone()).send(archive).await
}

#[cfg(not(feature = "email"))]
async fn send(_email: &EmailSettings, _archive: &std::path::Path) -> ShopResult<bool> {
    Err(ShopError::config("built without the `email` feature"))
}

/// Mailer errors that mean "fix the configuration" rather than "retry"
#[must_use]
pub const fn is_config_problem(error: &ShopError) -> bool {
    matches!(error, ShopError::Config { .. } | ShopError::InvalidValue { .. })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_skips_archive() {
        let dir = tempfile::tempdir().unwrap();
        let reporting = ReportingSettings {
            report_dir: dir.path().join("missing"),
            archive_path: dir.path().join("r.zip"),
            ..ReportingSettings::default()
        };
        assert!(!archive_and_mail(&reporting, &EmailSettings::default()).await.unwrap());
        assert!(!reporting.archive_path.exists());
    }

    #[tokio::test]
    async fn test_enabled_without_recipients_fails_after_zip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("report")).unwrap();
        std::fs::write(dir.path().join("report/index.html"), "x").unwrap();
        let reporting = ReportingSettings {
            report_dir: dir.path().join("report"),
            archive_path: dir.path().join("r.zip"),
            ..ReportingSettings::default()
        };
        let email = EmailSettings {
            enabled: true,
            ..EmailSettings::default()
        };
        let err = archive_and_mail(&reporting, &email).await.unwrap_err();
        assert!(is_config_problem(&err));
        assert!(reporting.archive_path.exists());
    }
}
