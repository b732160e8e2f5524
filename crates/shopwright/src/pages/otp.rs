//! OTP verification page.

use super::PageObject;
use crate::element::Ui;
use crate::keyboard::{keycode_for, press_with_retry};
use crate::locator::Locator;
use crate::result::{ShopError, ShopResult};
use crate::state::KEY_SELF_COLLECT_TAB;
use async_trait::async_trait;
use std::time::Duration;

const VERIFY_BUTTON: &str = "verifyButton.accessibility";
const VERIFYING_TEXT: &str = "verifyingOTP.text";
const LOADER: &str = "otpLoader.uiautomator";
const ERROR_MESSAGE: &str = "errorMessage.resourceId";
const OTP_INPUT: &str = "otpInput.uiautomator";

/// First OTP box when `otpInput.uiautomator` is not configured
const DEFAULT_OTP_INPUT: &str = "new UiSelector().resourceId(\"otp-input\").instance(0)";

/// Shown when the error element never appears
pub const MISSING_ERROR_TEXT: &str = "Error message not found or not visible.";

/// OTP entry screen
#[derive(Debug, Clone)]
pub struct OtpPage {
    ui: Ui,
}

impl OtpPage {
    /// Page over `ui`
    #[must_use]
    pub const fn new(ui: Ui) -> Self {
        Self { ui }
    }

    /// Verify button present within 10 s
    pub async fn is_otp_page_displayed(&self) -> bool {
        let shown = self
            .ui
            .is_present_key(VERIFY_BUTTON, Duration::from_secs(10))
            .await;
        if shown {
            self.ui.step("OTP page is displayed");
        } else {
            self.ui.warn_step("OTP page not displayed");
        }
        shown
    }

    fn otp_input(&self) -> ShopResult<Locator> {
        if self.ui.book().has(OTP_INPUT) {
            self.ui.locator(OTP_INPUT)
        } else {
            Ok(Locator::ui_automator(DEFAULT_OTP_INPUT))
        }
    }

    /// Type the OTP digit by digit as key presses
    pub async fn enter_otp(&self, otp: &str) -> ShopResult<()> {
        if !self.is_otp_page_displayed().await {
            return Err(ShopError::state("OTP page not visible, cannot enter OTP"));
        }
        if otp.is_empty() || !otp.chars().all(|c| c.is_ascii_digit()) {
            return Err(ShopError::invalid("OTP", format!("'{otp}' is not all digits")));
        }
        self.ui.step(format!("Entering OTP: {otp}"));
        let input = self.otp_input()?;
        self.ui.click_within(&input, Duration::from_secs(5)).await?;
        for digit in otp.chars() {
            press_with_retry(self.ui.driver(), keycode_for(digit)?, 2, Duration::from_millis(200)).await?;
        }
        self.ui.step("OTP entered");
        Ok(())
    }

    /// Ride out the "Verifying..." text and loader, then require the home page
    pub async fn wait_for_verification_and_home_redirect(&self) -> ShopResult<()> {
        let short = Duration::from_secs(3);
        let long = Duration::from_secs(15);

        if self.ui.is_displayed_key_within(VERIFYING_TEXT, short).await {
            self.ui.step("'Verifying...' appeared");
        }
        if let Ok(loader) = self.ui.locator(LOADER) {
            if self.ui.is_present(&loader, short).await {
                self.ui.step("Loader appeared");
                match self.ui.wait_invisible(&loader, long).await {
                    Ok(()) => self.ui.step("Loader dismissed"),
                    Err(e) => self.ui.warn_step(format!("Loader still showing: {e}")),
                }
            }
        }
        let home = self.ui.locator(KEY_SELF_COLLECT_TAB)?;
        self.ui
            .wait_present(&home, long)
            .await
            .map_err(|e| ShopError::assertion(format!("Verification or redirect to Home failed: {e}")))?;
        self.ui.step("Home page detected after OTP");
        Ok(())
    }

    /// OTP error text, or [`MISSING_ERROR_TEXT`]
    pub async fn error_message(&self) -> String {
        let Ok(locator) = self.ui.locator(ERROR_MESSAGE) else {
            return MISSING_ERROR_TEXT.to_string();
        };
        match self.ui.wait_visible(&locator, Duration::from_secs(5)).await {
            Ok(el) => self
                .ui
                .driver()
                .text(&el)
                .await
                .unwrap_or_else(|_| MISSING_ERROR_TEXT.to_string()),
            Err(_) => MISSING_ERROR_TEXT.to_string(),
        }
    }
}

#[async_trait]
impl PageObject for OtpPage {
    fn ui(&self) -> &Ui {
        &self.ui
    }

    fn page_name(&self) -> &'static str {
        "OTP page"
    }

    fn load_timeout(&self) -> Duration {
        Duration::from_secs(10)
    }

    async fn is_displayed(&self) -> bool {
        self.ui.is_present_key(VERIFY_BUTTON, Duration::ZERO).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement, Platform, Transition};
    use crate::element::tests::ui_with;

    const KEYS: &[(&str, &str)] = &[
        (VERIFY_BUTTON, "Verify"),
        (LOADER, "new UiSelector().description(\"loader\")"),
        (VERIFYING_TEXT, "Verifying..."),
        (KEY_SELF_COLLECT_TAB, "Self Collect"),
        (ERROR_MESSAGE, "com.shop:id/otp_error"),
    ];

    fn otp_screen() -> MockDriver {
        MockDriver::android()
            .with(Locator::accessibility_id("Verify"), MockElement::visible())
            .with(Locator::ui_automator(DEFAULT_OTP_INPUT), MockElement::visible())
    }

    #[tokio::test]
    async fn test_enter_otp_types_digits() {
        let mock = otp_screen();
        OtpPage::new(ui_with(&mock, KEYS)).enter_otp("4821").await.unwrap();
        assert_eq!(mock.keycodes(), vec![11, 15, 9, 8]);
        assert_eq!(
            mock.text_of(&Locator::ui_automator(DEFAULT_OTP_INPUT)).as_deref(),
            Some("4821")
        );
    }

    #[tokio::test]
    async fn test_enter_otp_rejects_letters() {
        let mock = otp_screen();
        let err = OtpPage::new(ui_with(&mock, KEYS)).enter_otp("12a4").await.unwrap_err();
        assert!(matches!(err, ShopError::InvalidValue { .. }));
        assert!(mock.keycodes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_otp_needs_page() {
        let mock = MockDriver::android();
        let err = OtpPage::new(ui_with(&mock, KEYS)).enter_otp("1234").await.unwrap_err();
        assert!(matches!(err, ShopError::InvalidState { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_redirect_after_loader() {
        let loader = Locator::ui_automator("new UiSelector().description(\"loader\")");
        let home = Locator::text(Platform::Android, "Self Collect");
        let mock = otp_screen()
            .with(loader.clone(), MockElement::visible())
            .with(home.clone(), MockElement::absent());
        let page = OtpPage::new(ui_with(&mock, KEYS));
        let finish = {
            let mock = mock.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                mock.apply(&Transition::Remove(loader));
                mock.apply(&Transition::Show(home));
            }
        };
        let (result, ()) = tokio::join!(page.wait_for_verification_and_home_redirect(), finish);
        result.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_home_is_an_error() {
        let mock = otp_screen();
        let err = OtpPage::new(ui_with(&mock, KEYS))
            .wait_for_verification_and_home_redirect()
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::AssertionFailed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_message_fallback() {
        let mock = otp_screen();
        let page = OtpPage::new(ui_with(&mock, KEYS));
        assert_eq!(page.error_message().await, MISSING_ERROR_TEXT);
        mock.add(
            Locator::id("com.shop:id/otp_error"),
            MockElement::visible().with_text("Invalid OTP"),
        );
        assert_eq!(page.error_message().await, "Invalid OTP");
    }
}
