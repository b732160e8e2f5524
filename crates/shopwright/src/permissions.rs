//! System permission dialogs and the app's start-up popups.

use crate::element::Ui;
use crate::locator::Locator;
use crate::result::ShopResult;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Android permission controller package
const PERMISSION_CONTROLLER: &str = "com.android.permissioncontroller:id";

/// Native automation context name
pub const NATIVE_CONTEXT: &str = "NATIVE_APP";

/// Maximum passes over the allow buttons
const MAX_PASSES: usize = 5;

/// App notification "allow" button
pub const KEY_ALLOW_NOTIFICATIONS: &str = "allowNotificationsBtn.id";
/// Location permission button
pub const KEY_LOCATION_ACCESS: &str = "giveLocationAccessBtn.id";
/// Login page guest button
pub const KEY_GUEST_BUTTON: &str = "continueAsGuest.accessibility";
/// In-app alert dialog title
pub const KEY_ALERT_TITLE: &str = "alertTitle.id";
/// Close button of the promotional popup
pub const KEY_DISCOUNT_CLOSE: &str = "discountPopupCloseBtn.id";

fn controller_button(name: &str) -> Locator {
    Locator::id(format!("{PERMISSION_CONTROLLER}/{name}"))
}

/// Permission controller buttons and their text fallbacks
#[must_use]
pub fn system_allow_buttons(ui: &Ui) -> Vec<Locator> {
    vec![
        controller_button("permission_allow_button"),
        controller_button("permission_allow_foreground_only_button"),
        controller_button("permission_allow_one_time_button"),
        ui.text("Allow"),
        ui.text("While using the app"),
        ui.text("Allow once"),
    ]
}

/// Clicks through Android permission dialogs
#[derive(Debug, Clone)]
pub struct PermissionHelper {
    ui: Ui,
}

impl PermissionHelper {
    /// Create a helper
    #[must_use]
    pub const fn new(ui: Ui) -> Self {
        Self { ui }
    }

    async fn click_or_tap(&self, locator: &Locator) -> ShopResult<bool> {
        let Some(el) = self.ui.find(locator).await? else {
            return Ok(false);
        };
        let driver = self.ui.driver();
        if let Err(e) = driver.click(&el).await {
            debug!(%locator, error = %e, "click failed, tapping bounds");
            match driver.attribute(&el, "bounds").await? {
                Some(bounds) => self.ui.tap_bounds(&bounds).await?,
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Accept every permission dialog on screen. Returns whether any was
    /// accepted. Errors are logged, never raised.
    pub async fn allow_all_if_present(&self) -> bool {
        let buttons = system_allow_buttons(&self.ui);
        let mut handled = false;
        for pass in 1..=MAX_PASSES {
            let mut clicked = None;
            for locator in &buttons {
                match self.click_or_tap(locator).await {
                    Ok(true) => {
                        clicked = Some(locator);
                        break;
                    }
                    Ok(false) => {}
                    Err(e) => warn!(%locator, error = %e, "permission button failed"),
                }
            }
            match clicked {
                Some(locator) => {
                    self.ui.step(format!("Accepted permission dialog via {locator}"));
                    handled = true;
                    self.ui.delay(self.ui.timeouts().poll_ms).await;
                }
                None => {
                    info!(pass, "no more permission dialogs");
                    break;
                }
            }
        }
        handled
    }

    /// Wait until neither the permission dialog nor an in-app alert is shown
    pub async fn wait_until_no_dialogs(&self, max_wait: Duration) -> ShopResult<()> {
        let dialog = controller_button("permission_allow_button");
        let alert = self.ui.locator(KEY_ALERT_TITLE).ok();
        self.ui
            .waiter(max_wait)
            .until_true("permission dialogs to close", || {
                let alert = alert.as_ref();
                let dialog = &dialog;
                async move {
                    let dialog_open = self.ui.find(dialog).await?.is_some();
                    let alert_open = match alert {
                        Some(l) => self.ui.find(l).await?.is_some(),
                        None => false,
                    };
                    Ok(!dialog_open && !alert_open)
                }
            })
            .await
    }
}

/// The app's own "allow notifications" popup
#[derive(Debug, Clone)]
pub struct NotificationPopup {
    ui: Ui,
}

impl NotificationPopup {
    /// Create the popup object
    #[must_use]
    pub const fn new(ui: Ui) -> Self {
        Self { ui }
    }

    /// Accept the popup if one shows up. Time-boxed to the short wait.
    pub async fn handle_if_present(&self) -> bool {
        if let Err(e) = self.ui.driver().set_context(NATIVE_CONTEXT).await {
            debug!(error = %e, "context switch failed");
        }
        let budget = self.ui.timeouts().short_wait();
        let start = tokio::time::Instant::now();

        let mut candidates: Vec<Locator> = self.ui.locator(KEY_ALLOW_NOTIFICATIONS).into_iter().collect();
        candidates.extend([
            controller_button("permission_allow_button"),
            controller_button("permission_allow_foreground_only_button"),
            self.ui.text("Allow"),
            self.ui.text("Allow once"),
            self.ui.text("While using the app"),
        ]);

        for locator in &candidates {
            if start.elapsed() > budget {
                self.ui.warn_step("Notification popup time budget exceeded");
                break;
            }
            match self.ui.click_if_present(locator, Duration::from_millis(500)).await {
                Ok(true) => {
                    self.ui.step(format!("Notification allowed via {locator}"));
                    self.wait_for_login_page().await;
                    return true;
                }
                Ok(false) => {}
                Err(e) => warn!(%locator, error = %e, "notification button failed"),
            }
        }
        self.ui.step("No notification popup appeared");
        false
    }

    async fn wait_for_login_page(&self) {
        let Ok(guest) = self.ui.locator(KEY_GUEST_BUTTON) else {
            return;
        };
        if !self.ui.is_present(&guest, self.ui.timeouts().short_wait()).await {
            warn!("login page did not load after the notification popup");
        }
    }

    /// Close the promotional popup when one is configured and shown
    pub async fn dismiss_discount_if_present(&self) -> bool {
        let Ok(close) = self.ui.locator(KEY_DISCOUNT_CLOSE) else {
            debug!("no discount popup configured");
            return false;
        };
        match self.ui.click_if_present(&close, self.ui.timeouts().short_wait()).await {
            Ok(true) => {
                self.ui.step("Dismissed discount popup");
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!(error = %e, "discount popup dismissal failed");
                false
            }
        }
    }
}

/// Permissions requested on a fresh app launch
#[derive(Debug, Clone)]
pub struct StartupPermissions {
    ui: Ui,
}

impl StartupPermissions {
    /// Create the handler
    #[must_use]
    pub const fn new(ui: Ui) -> Self {
        Self { ui }
    }

    /// Allow location and any other permission, then wait for the login page.
    /// A login page that never shows is logged, not raised.
    pub async fn handle(&self) -> ShopResult<()> {
        if let Err(e) = self.ui.driver().set_context(NATIVE_CONTEXT).await {
            debug!(error = %e, "context switch failed");
        }
        let guest = self.ui.locator(KEY_GUEST_BUTTON)?;
        let quick = Duration::from_secs(2);
        if self.ui.is_present(&guest, quick).await {
            self.ui.step("Login page already visible, skipping permission handling");
            return Ok(());
        }

        let mut handled = false;
        if let Ok(location) = self.ui.locator(KEY_LOCATION_ACCESS) {
            if self.ui.click_if_present(&location, quick).await? {
                self.ui.step("Location permission allowed");
                handled = true;
            }
        }
        handled |= PermissionHelper::new(self.ui.clone()).allow_all_if_present().await;

        if !handled {
            self.ui.step("No permission popups appeared");
            return Ok(());
        }
        match self.ui.wait_visible(&guest, Duration::from_secs(10)).await {
            Ok(_) => self.ui.step("Login page detected after permissions"),
            Err(e) => self
                .ui
                .warn_step(format!("Login page not detected after permission handling: {e}")),
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::mock::{MockElement, Transition};
    use crate::driver::MockDriver;
    use crate::element::tests::ui_with;

    const GUEST: (&str, &str) = (KEY_GUEST_BUTTON, "Continue as Guest");

    #[tokio::test]
    async fn test_allow_all_clicks_until_clear() {
        let first = controller_button("permission_allow_button");
        let second = Locator::text(crate::driver::Platform::Android, "While using the app");
        let mock = MockDriver::android()
            .with(first.clone(), MockElement::visible())
            .on_click(&first, Transition::Remove(first.clone()))
            .on_click(&first, Transition::Show(second.clone()))
            .on_click(&second, Transition::Remove(second.clone()));
        let helper = PermissionHelper::new(ui_with(&mock, &[]));
        assert!(helper.allow_all_if_present().await);
        assert_eq!(mock.clicks(&first), 1);
        assert_eq!(mock.clicks(&second), 1);
        helper
            .wait_until_no_dialogs(Duration::from_millis(20))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_nothing_to_allow() {
        let mock = MockDriver::android();
        assert!(!PermissionHelper::new(ui_with(&mock, &[])).allow_all_if_present().await);
    }

    #[tokio::test]
    async fn test_notification_popup_uses_configured_button() {
        let allow = Locator::id("com.shop:id/allow");
        let mock = MockDriver::android()
            .with(allow.clone(), MockElement::visible())
            .on_click(&allow, Transition::Remove(allow.clone()));
        let ui = ui_with(&mock, &[(KEY_ALLOW_NOTIFICATIONS, "com.shop:id/allow"), GUEST]);
        assert!(NotificationPopup::new(ui).handle_if_present().await);
        assert_eq!(mock.clicks(&allow), 1);
        assert!(mock.commands().contains(&"context NATIVE_APP".to_string()));
    }

    #[tokio::test]
    async fn test_startup_skips_when_login_visible() {
        let guest = Locator::accessibility_id("Continue as Guest");
        let location = Locator::id("loc");
        let mock = MockDriver::android()
            .with(guest, MockElement::visible())
            .with(location.clone(), MockElement::visible());
        let ui = ui_with(&mock, &[GUEST, (KEY_LOCATION_ACCESS, "loc")]);
        StartupPermissions::new(ui).handle().await.unwrap();
        assert_eq!(mock.clicks(&location), 0);
    }

    #[tokio::test]
    async fn test_startup_allows_location() {
        let guest = Locator::accessibility_id("Continue as Guest");
        let location = Locator::id("loc");
        let mock = MockDriver::android()
            .with(location.clone(), MockElement::visible())
            .on_click(&location, Transition::Remove(location.clone()))
            .on_click(&location, Transition::Show(guest));
        let ui = ui_with(&mock, &[GUEST, (KEY_LOCATION_ACCESS, "loc")]);
        StartupPermissions::new(ui).handle().await.unwrap();
        assert_eq!(mock.clicks(&location), 1);
    }
}
