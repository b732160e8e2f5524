//! Transient toast messages.

use crate::element::Ui;
use std::time::Duration;

/// Checks toasts by partial text
#[derive(Debug, Clone)]
pub struct ToastHelper {
    ui: Ui,
}

impl ToastHelper {
    /// Create a helper
    #[must_use]
    pub const fn new(ui: Ui) -> Self {
        Self { ui }
    }

    /// Whether a toast containing `partial` shows up within `timeout`
    pub async fn verify_visible(&self, partial: &str, timeout: Duration) -> bool {
        let locator = self.ui.text_contains(partial);
        if self.ui.is_displayed_within(&locator, timeout).await {
            self.ui.step(format!("Toast displayed: {partial}"));
            true
        } else {
            self.ui.warn_step(format!("Toast not displayed: {partial}"));
            false
        }
    }

    /// Wait for the toast to go away; a timeout is logged, not raised
    pub async fn wait_to_disappear(&self, partial: &str, timeout: Duration) -> bool {
        let locator = self.ui.text_contains(partial);
        match self.ui.wait_invisible(&locator, timeout).await {
            Ok(()) => true,
            Err(e) => {
                self.ui
                    .warn_step(format!("Toast '{partial}' still visible: {e}"));
                false
            }
        }
    }

    /// Toast appears within `visible` and then goes away within `gone`.
    /// Only the appearance decides the result.
    pub async fn verify_and_wait(&self, partial: &str, visible: Duration, gone: Duration) -> bool {
        if !self.verify_visible(partial, visible).await {
            return false;
        }
        self.wait_to_disappear(partial, gone).await;
        true
    }
}
