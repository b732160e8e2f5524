//! `adb` helpers for staging files on an Android device.

use crate::result::{ShopError, ShopResult};
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tracing::{error, info};

/// Broadcast that makes a pushed file visible to the gallery
pub const MEDIA_SCAN_ACTION: &str = "android.intent.action.MEDIA_SCANNER_SCAN_FILE";

/// `adb -s <udid>` runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adb {
    udid: String,
    program: String,
    settle: Duration,
}

impl Adb {
    /// Runner for the device with serial `udid`
    #[must_use]
    pub fn new(udid: impl Into<String>) -> Self {
        Self {
            udid: udid.into(),
            program: "adb".to_string(),
            settle: Duration::from_secs(5),
        }
    }

    /// Use another executable instead of `adb`
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Pause after [`Adb::push_and_scan`]
    #[must_use]
    pub const fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Device serial
    #[must_use]
    pub fn udid(&self) -> &str {
        &self.udid
    }

    /// Full argv for `args`, program first
    #[must_use]
    pub fn command_line(&self, args: &[&str]) -> Vec<String> {
        let mut argv = vec![self.program.clone(), "-s".to_string(), self.udid.clone()];
        argv.extend(args.iter().map(|a| (*a).to_string()));
        argv
    }

    async fn run(&self, args: &[&str]) -> ShopResult<std::process::Output> {
        let argv = self.command_line(args);
        Command::new(&self.program)
            .args(&argv[1..])
            .output()
            .await
            .map_err(|e| ShopError::Adb {
                command: argv.join(" "),
                message: e.to_string(),
            })
    }

    async fn run_checked(&self, args: &[&str]) -> ShopResult<()> {
        let output = self.run(args).await?;
        if output.status.success() {
            return Ok(());
        }
        Err(ShopError::Adb {
            command: self.command_line(args).join(" "),
            message: format!(
                "exit {}: {}",
                output.status.code().map_or_else(|| "signal".to_string(), |c| c.to_string()),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        })
    }

    /// Copy a local file to the device
    pub async fn push(&self, local: &Path, remote: &str) -> ShopResult<()> {
        let local = local.to_string_lossy();
        self.run_checked(&["push", &local, remote]).await?;
        info!(remote, "file pushed to device");
        Ok(())
    }

    /// Ask the media scanner to index `remote`
    pub async fn media_scan(&self, remote: &str) -> ShopResult<()> {
        let uri = format!("file://{remote}");
        self.run_checked(&["shell", "am", "broadcast", "-a", MEDIA_SCAN_ACTION, "-d", &uri])
            .await?;
        info!(remote, "media scan broadcast sent");
        Ok(())
    }

    /// Whether `remote` exists on the device
    pub async fn exists(&self, remote: &str) -> ShopResult<bool> {
        Ok(self.run(&["shell", "ls", remote]).await?.status.success())
    }

    /// Push, scan, verify, then give the gallery time to pick the file up
    pub async fn push_and_scan(&self, local: &Path, remote: &str) -> ShopResult<()> {
        self.push(local, remote).await?;
        self.media_scan(remote).await?;
        if self.exists(remote).await? {
            info!(remote, "file confirmed on device");
        } else {
            error!(remote, "file not found on device after push");
            return Err(ShopError::Adb {
                command: format!("shell ls {remote}"),
                message: "file not found after push".to_string(),
            });
        }
        tokio::time::sleep(self.settle).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let adb = Adb::new("emulator-5554");
        assert_eq!(
            adb.command_line(&["push", "proof.png", "/sdcard/Download/proof.png"]),
            vec!["adb", "-s", "emulator-5554", "push", "proof.png", "/sdcard/Download/proof.png"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_maps_to_errors() {
        // `true`/`false` ignore their arguments, standing in for adb.
        let ok = Adb::new("dev").with_program("true").with_settle(Duration::ZERO);
        ok.push_and_scan(Path::new("a.png"), "/sdcard/a.png").await.unwrap();
        assert!(ok.exists("/sdcard/a.png").await.unwrap());

        let failing = Adb::new("dev").with_program("false");
        let err = failing.push(Path::new("a.png"), "/sdcard/a.png").await.unwrap_err();
        assert!(matches!(err, ShopError::Adb { .. }));
        assert!(!failing.exists("/sdcard/a.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let adb = Adb::new("dev").with_program("definitely-not-an-adb-binary");
        assert!(matches!(
            adb.media_scan("/sdcard/x.png").await,
            Err(ShopError::Adb { .. })
        ));
    }
}
