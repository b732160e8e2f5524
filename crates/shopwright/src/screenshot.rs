//! Screenshots sorted by date and outcome.
//!
//! Layout: `<root>/<yyyy-mm-dd>/<passed|failed>/<label>_<HHMMSS_mmm>.png`

use crate::driver::AppDriver;
use crate::result::{ShopError, ShopResult};
use crate::trace::{StepLevel, TraceHandle};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::PoisonError;
use tracing::{info, warn};

/// Replace everything but ASCII letters and digits with `_`
#[must_use]
pub fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Screenshot directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotStore {
    root: PathBuf,
}

impl ScreenshotStore {
    /// Store rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a capture taken now would be written to
    #[must_use]
    pub fn path_for(&self, label: &str, failed: bool) -> PathBuf {
        let now = Local::now();
        let outcome = if failed { "failed" } else { "passed" };
        self.root
            .join(now.format("%Y-%m-%d").to_string())
            .join(outcome)
            .join(format!(
                "{}_{}.png",
                sanitize(label),
                now.format("%H%M%S_%3f")
            ))
    }

    /// Capture the screen into the store
    pub async fn capture(
        &self,
        driver: Option<&dyn AppDriver>,
        label: &str,
        failed: bool,
    ) -> ShopResult<PathBuf> {
        let driver = driver.ok_or_else(|| ShopError::state("no driver to take a screenshot"))?;
        if !driver.is_alive().await {
            return Err(ShopError::state("driver session is not alive"));
        }
        let png = driver.screenshot().await?;
        let path = self.path_for(label, failed);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, png)?;
        info!(path = %path.display(), "screenshot saved");
        Ok(path)
    }

    /// Capture and attach to `trace`. Failures are logged and attached as
    /// text instead of raised.
    pub async fn capture_and_attach(
        &self,
        driver: Option<&dyn AppDriver>,
        trace: Option<&TraceHandle>,
        label: &str,
        failed: bool,
    ) -> Option<PathBuf> {
        let result = self.capture(driver, label, failed).await;
        let Some(trace) = trace else {
            return result.ok();
        };
        let mut trace = trace.lock().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(path) => {
                trace.attach_image(label, path.clone());
                Some(path)
            }
            Err(e) => {
                warn!(label, error = %e, "screenshot failed");
                trace.record(StepLevel::Warn, format!("Screenshot '{label}' failed: {e}"));
                trace.attach_text(format!("{label} (screenshot failed)"), e.to_string());
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::mock::MOCK_PNG;
    use crate::driver::MockDriver;
    use crate::trace::{AttachmentKind, ScenarioTrace};

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Order #12 / paid"), "Order__12___paid");
        assert_eq!(sanitize("plain"), "plain");
    }

    #[test]
    fn test_path_layout() {
        let store = ScreenshotStore::new("shots");
        let path = store.path_for("View cart", true);
        let parts: Vec<_> = path.iter().map(|p| p.to_string_lossy().to_string()).collect();
        assert_eq!(parts[0], "shots");
        assert_eq!(parts[1].len(), 10);
        assert_eq!(parts[2], "failed");
        assert!(parts[3].starts_with("View_cart_"));
        assert!(parts[3].ends_with(".png"));
    }

    #[tokio::test]
    async fn test_capture_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScreenshotStore::new(dir.path());
        let mock = MockDriver::android();
        let path = store.capture(Some(&mock), "success", false).await.unwrap();
        assert_eq!(fs::read(&path).unwrap(), MOCK_PNG);
        assert!(path.to_string_lossy().contains("passed"));
    }

    #[tokio::test]
    async fn test_dead_driver_is_attached_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScreenshotStore::new(dir.path());
        let mock = MockDriver::android();
        mock.set_alive(false);
        let trace = ScenarioTrace::start("s", "f", vec![]).shared();
        let saved = store
            .capture_and_attach(Some(&mock), Some(&trace), "failure", true)
            .await;
        assert!(saved.is_none());
        let trace = trace.lock().unwrap();
        assert_eq!(trace.attachments[0].kind, AttachmentKind::Text);
    }

    #[tokio::test]
    async fn test_no_driver() {
        let store = ScreenshotStore::new("unused");
        assert!(store.capture(None, "x", false).await.is_err());
    }
}
