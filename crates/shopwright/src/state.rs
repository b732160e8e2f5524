//! Which screen the app is on at the start of a scenario.

use crate::element::Ui;
use crate::permissions::{KEY_ALLOW_NOTIFICATIONS, KEY_GUEST_BUTTON};
use crate::result::ShopResult;
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// OTP page title
pub const KEY_OTP_TITLE: &str = "verifyOtpTitle.text";
/// Self Collect tab, shown on the home page
pub const KEY_SELF_COLLECT_TAB: &str = "selfCollectBtn.text";
/// Order tracking title, only shown to signed-in users
pub const KEY_ORDER_TRACKING: &str = "orderTrackingTitle.text";
/// Active order shortcut, only shown to signed-in users
pub const KEY_ACTIVE_ORDER: &str = "activeOrderBtn.text";

/// Screen the app is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    /// The app's notification permission popup
    NotificationPopup,
    /// Login page with the guest button
    LoginScreen,
    /// OTP entry page
    OtpScreen,
    /// Home page of a guest session
    HomeScreenGuest,
    /// Home page of a signed-in session
    HomeScreenOtp,
    /// None of the above
    Unknown,
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotificationPopup => "notification popup",
            Self::LoginScreen => "login screen",
            Self::OtpScreen => "OTP screen",
            Self::HomeScreenGuest => "home screen (guest)",
            Self::HomeScreenOtp => "home screen (signed in)",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Looks at the screen and names it
#[derive(Debug, Clone)]
pub struct AppStateDetector {
    ui: Ui,
    visibility_wait: Duration,
}

impl AppStateDetector {
    /// Detector with the standard 2 s visibility checks
    #[must_use]
    pub const fn new(ui: Ui) -> Self {
        Self {
            ui,
            visibility_wait: Duration::from_secs(2),
        }
    }

    /// Override the visibility check wait
    #[must_use]
    pub const fn with_visibility_wait(mut self, wait: Duration) -> Self {
        self.visibility_wait = wait;
        self
    }

    /// Detect the current state. Driver errors read as [`AppState::Unknown`].
    pub async fn detect(&self) -> AppState {
        match self.try_detect().await {
            Ok(state) => {
                self.ui.step(format!("Detected app state: {state}"));
                state
            }
            Err(e) => {
                warn!(error = %e, "app state detection failed");
                AppState::Unknown
            }
        }
    }

    async fn present(&self, key: &str) -> ShopResult<bool> {
        if !self.ui.book().has(key) {
            return Ok(false);
        }
        let locator = self.ui.locator(key)?;
        Ok(self.ui.find(&locator).await?.is_some())
    }

    async fn try_detect(&self) -> ShopResult<AppState> {
        if !self.ui.driver().is_alive().await {
            return Ok(AppState::Unknown);
        }
        if self.present(KEY_ALLOW_NOTIFICATIONS).await? {
            return Ok(AppState::NotificationPopup);
        }
        if self.ui.is_displayed_key_within(KEY_GUEST_BUTTON, self.visibility_wait).await {
            return Ok(AppState::LoginScreen);
        }
        if self.present(KEY_OTP_TITLE).await? {
            return Ok(AppState::OtpScreen);
        }
        if self.ui.is_displayed_key_within(KEY_SELF_COLLECT_TAB, self.visibility_wait).await {
            let signed_in =
                self.present(KEY_ORDER_TRACKING).await? || self.present(KEY_ACTIVE_ORDER).await?;
            return Ok(if signed_in {
                AppState::HomeScreenOtp
            } else {
                AppState::HomeScreenGuest
            });
        }
        Ok(AppState::Unknown)
    }
}
