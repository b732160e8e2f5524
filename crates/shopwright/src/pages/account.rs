//! Account page: profile, notification preferences, orders and logout.

use super::home::ACCOUNT_TITLE;
use super::login::TITLE as LOGIN_TITLE;
use super::orders::ORDERS_TITLE;
use super::profile::ProfilePage;
use super::PageObject;
use crate::config::AccountSettings;
use crate::element::Ui;
use crate::result::{ShopError, ShopResult};
use crate::toast::ToastHelper;
use async_trait::async_trait;
use std::time::Duration;

const NOTIFICATIONS_BUTTON: &str = "notificationsPreference.text";
const NOTIFICATIONS_TITLE: &str = "notificationsPreferencePageTitle.text";
const UPDATE_PREFERENCES: &str = "updatePreferences.text";
const PREFERENCES_TOAST: &str = "notificationSuccessMessage.text";
const LOGOUT_BUTTON: &str = "logoutBtn.text";
const LOGIN_BUTTON: &str = "loginButton.text";
const ORDERS_BUTTON: &str = "ordersButton.accessibility";

/// Notification switches on the preferences screen
pub const NOTIFICATION_TOGGLES: [&str; 4] = [
    "accountVerifiedBtn.xpath",
    "orderStatusBtn.xpath",
    "paymentNotificationBtn.xpath",
    "jengwaUpdatesBtn.xpath",
];

/// Account screen
#[derive(Debug, Clone)]
pub struct AccountPage {
    ui: Ui,
    account: AccountSettings,
}

impl AccountPage {
    /// Page over `ui` for the configured test account
    #[must_use]
    pub const fn new(ui: Ui, account: AccountSettings) -> Self {
        Self { ui, account }
    }

    /// Title within 15 s
    pub async fn is_account_page_displayed(&self) -> bool {
        self.wait_for_page_load(Duration::from_secs(15)).await
    }

    /// Wait for the title
    pub async fn wait_for_page_load(&self, timeout: Duration) -> bool {
        self.ui.is_displayed_key_within(ACCOUNT_TITLE, timeout).await
    }

    /// Open the profile screen
    pub async fn open_profile(&self) -> ShopResult<()> {
        let profile = ProfilePage::new(self.ui.clone());
        profile.click_profile().await?;
        if profile.wait_for_profile_page(Duration::from_secs(10)).await {
            Ok(())
        } else {
            Err(ShopError::assertion("Profile page not displayed"))
        }
    }

    /// Open notification preferences
    pub async fn open_notification_preferences(&self) -> ShopResult<()> {
        self.ui.click_key(NOTIFICATIONS_BUTTON).await?;
        self.ui.step("Opened notification preferences");
        Ok(())
    }

    /// Preferences title within 10 s
    pub async fn is_notification_preferences_displayed(&self) -> bool {
        self.ui
            .is_displayed_key_within(NOTIFICATIONS_TITLE, Duration::from_secs(10))
            .await
    }

    /// Flip every notification switch. A switch that is not configured or
    /// not on screen is logged and skipped. Returns how many were flipped.
    pub async fn toggle_all_notifications(&self) -> ShopResult<usize> {
        let mut flipped = 0;
        for key in NOTIFICATION_TOGGLES {
            let Ok(toggle) = self.ui.locator(key) else {
                self.ui.warn_step(format!("Toggle '{key}' is not configured"));
                continue;
            };
            if self.ui.click_if_present(&toggle, Duration::from_secs(5)).await? {
                self.ui.step(format!("Toggled '{key}'"));
                flipped += 1;
            } else {
                self.ui.warn_step(format!("Toggle '{key}' not found"));
            }
        }
        Ok(flipped)
    }

    /// Save preferences and expect the success toast within 5 s
    pub async fn update_preferences_and_verify_toast(&self) -> ShopResult<()> {
        self.ui.click_key(UPDATE_PREFERENCES).await?;
        let message = self
            .ui
            .book()
            .raw(PREFERENCES_TOAST)
            .ok_or_else(|| ShopError::MissingKey {
                key: PREFERENCES_TOAST.to_string(),
            })?
            .to_string();
        if ToastHelper::new(self.ui.clone())
            .verify_visible(&message, Duration::from_secs(5))
            .await
        {
            Ok(())
        } else {
            Err(ShopError::assertion(format!("Toast '{message}' not shown after update")))
        }
    }

    /// Log out and expect the login button or login title
    pub async fn logout(&self) -> ShopResult<()> {
        self.ui.click_key(LOGOUT_BUTTON).await?;
        self.ui.step("Clicked logout");
        let targets = [self.ui.locator(LOGIN_BUTTON)?, self.ui.locator(LOGIN_TITLE)?];
        match self.ui.wait_any_visible(&targets, Duration::from_secs(10)).await {
            Some(_) => {
                self.ui.step("Logged out");
                Ok(())
            }
            None => Err(ShopError::assertion("Login page not shown after logout")),
        }
    }

    /// Country code and phone number shown on the account page
    pub async fn is_logged_in_phone_number_correct(&self) -> bool {
        let expected = format!("{}{}", self.account.country_code, self.account.phone_number);
        let shown = self
            .ui
            .is_displayed_within(&self.ui.text_contains(&expected), Duration::from_secs(10))
            .await;
        if !shown {
            self.ui.warn_step(format!("Phone number '{expected}' not shown"));
        }
        shown
    }

    /// Tap "Log in" as a guest
    pub async fn click_login(&self) -> ShopResult<()> {
        self.ui.click_key(LOGIN_BUTTON).await?;
        self.ui.step("Clicked 'Log in'");
        Ok(())
    }

    /// Open the order listing
    pub async fn open_orders(&self) -> ShopResult<()> {
        let button = self.ui.locator(ORDERS_BUTTON)?;
        self.ui.click_within(&button, Duration::from_secs(10)).await?;
        if !self
            .ui
            .is_displayed_key_within(ORDERS_TITLE, Duration::from_secs(30))
            .await
        {
            return Err(ShopError::assertion("Orders page not displayed"));
        }
        self.ui.step("Opened orders");
        Ok(())
    }
}

#[async_trait]
impl PageObject for AccountPage {
    fn ui(&self) -> &Ui {
        &self.ui
    }

    fn page_name(&self) -> &'static str {
        "Account page"
    }

    fn load_timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn is_displayed(&self) -> bool {
        self.ui.is_displayed_key(ACCOUNT_TITLE).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement, Platform, Transition};
    use crate::element::tests::ui_with;
    use crate::locator::Locator;

    const KEYS: &[(&str, &str)] = &[
        (ACCOUNT_TITLE, "new UiSelector().text(\"Account\")"),
        (LOGOUT_BUTTON, "Logout"),
        (LOGIN_BUTTON, "Log in"),
        (LOGIN_TITLE, "Welcome"),
        (UPDATE_PREFERENCES, "Update Preferences"),
        (PREFERENCES_TOAST, "Preferences updated"),
        ("accountVerifiedBtn.xpath", "//*[@resource-id='verified']"),
        ("orderStatusBtn.xpath", "//*[@resource-id='status']"),
        ("paymentNotificationBtn.xpath", "//*[@resource-id='payment']"),
    ];

    fn text(t: &str) -> Locator {
        Locator::text(Platform::Android, t)
    }

    fn account() -> AccountSettings {
        AccountSettings {
            phone_number: "712345678".to_string(),
            country_code: "+254".to_string(),
            otp: "1234".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_skips_missing() {
        let verified = Locator::xpath("//*[@resource-id='verified']");
        let status = Locator::xpath("//*[@resource-id='status']");
        let mock = MockDriver::android()
            .with(verified.clone(), MockElement::visible())
            .with(status.clone(), MockElement::visible());
        let page = AccountPage::new(ui_with(&mock, KEYS), account());
        assert_eq!(page.toggle_all_notifications().await.unwrap(), 2);
        assert_eq!(mock.clicks(&verified), 1);
        assert_eq!(mock.clicks(&status), 1);
    }

    #[tokio::test]
    async fn test_logout_lands_on_login() {
        let mock = MockDriver::android()
            .with(text("Logout"), MockElement::visible())
            .on_click(&text("Logout"), Transition::Show(text("Welcome")));
        AccountPage::new(ui_with(&mock, KEYS), account()).logout().await.unwrap();
    }

    #[tokio::test]
    async fn test_update_preferences_toast() {
        let mock = MockDriver::android()
            .with(text("Update Preferences"), MockElement::visible())
            .on_click(
                &text("Update Preferences"),
                Transition::Show(Locator::text_contains(Platform::Android, "Preferences updated")),
            );
        AccountPage::new(ui_with(&mock, KEYS), account())
            .update_preferences_and_verify_toast()
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_phone_number_with_country_code() {
        let mock = MockDriver::android().with(
            Locator::text_contains(Platform::Android, "+254712345678"),
            MockElement::visible(),
        );
        let page = AccountPage::new(ui_with(&mock, KEYS), account());
        assert!(page.is_logged_in_phone_number_correct().await);
        let other = AccountSettings {
            phone_number: "700000000".to_string(),
            ..account()
        };
        assert!(!AccountPage::new(ui_with(&mock, KEYS), other).is_logged_in_phone_number_correct().await);
    }
}
