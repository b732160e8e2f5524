//! Login page: phone number entry and the guest shortcut.

use super::PageObject;
use crate::element::Ui;
use crate::permissions::KEY_GUEST_BUTTON;
use crate::result::{ShopError, ShopResult};
use crate::state::{KEY_OTP_TITLE, KEY_SELF_COLLECT_TAB};
use async_trait::async_trait;
use std::time::Duration;

const PHONE_INPUT: &str = "phoneInputField.text";
const SMS_OTP_BUTTON: &str = "SmsOtp.text";
/// Login title, shared with the account page
pub(crate) const TITLE: &str = "loginPageTitle.text";
const INTERNAL_ERROR: &str = "internalError.text";
const ERROR_MESSAGE: &str = "errorMessage.resourceId";

/// Login screen
#[derive(Debug, Clone)]
pub struct LoginPage {
    ui: Ui,
}

impl LoginPage {
    /// Page over `ui`
    #[must_use]
    pub const fn new(ui: Ui) -> Self {
        Self { ui }
    }

    /// Type the phone number
    pub async fn enter_phone_number(&self, phone: &str) -> ShopResult<()> {
        self.ui.step(format!("Entering phone number: {phone}"));
        let input = self.ui.locator(PHONE_INPUT)?;
        self.ui.type_into(&input, phone).await
    }

    /// Request the SMS OTP and wait for the OTP page. A page that does not
    /// show is reported along with any app error text, not raised.
    pub async fn click_continue(&self) -> ShopResult<()> {
        self.ui.step("Clicking Continue button");
        self.ui.click_key(SMS_OTP_BUTTON).await?;
        let otp_title = self.ui.locator(KEY_OTP_TITLE)?;
        if self.ui.wait_visible(&otp_title, Duration::from_secs(8)).await.is_ok() {
            self.ui.step("OTP screen appeared");
            return Ok(());
        }
        self.ui.warn_step("OTP screen not visible within expected time, checking for errors");
        let error_text = match self.ui.locator(INTERNAL_ERROR) {
            Ok(locator) => match self.ui.find(&locator).await? {
                Some(el) => Some(self.ui.driver().text(&el).await?),
                None => None,
            },
            Err(_) => None,
        };
        match error_text {
            Some(text) => self.ui.error_step(format!("Network or app error: {}", text.trim())),
            None => self.ui.warn_step("No network error found, but the OTP screen is still missing"),
        }
        Ok(())
    }

    /// Continue without an account. Does nothing when the home page is
    /// already showing.
    pub async fn continue_as_guest(&self) -> ShopResult<()> {
        if self.ui.is_present_key(KEY_SELF_COLLECT_TAB, Duration::from_secs(3)).await {
            self.ui.step("Already on Home screen, guest login assumed");
            return Ok(());
        }
        let guest = self.ui.locator(KEY_GUEST_BUTTON)?;
        if self.ui.is_displayed_within(&guest, Duration::from_secs(5)).await {
            self.ui.step("Guest button visible, clicking");
            self.ui.click(&guest).await
        } else {
            Err(ShopError::assertion(
                "Guest button not found. The app may have skipped the login page",
            ))
        }
    }

    /// Title visible within 5 s
    pub async fn is_login_page_displayed(&self) -> bool {
        let shown = self.ui.is_displayed_key_within(TITLE, Duration::from_secs(5)).await;
        self.ui.step(if shown {
            "Login page is visible"
        } else {
            "Login page not visible"
        });
        shown
    }

    /// Wait for the title
    pub async fn wait_for_page_load(&self, timeout: Duration) -> bool {
        self.ui.is_displayed_key_within(TITLE, timeout).await
    }

    /// Validation error under the phone input
    pub async fn error_message(&self) -> ShopResult<String> {
        let locator = self.ui.locator(ERROR_MESSAGE)?;
        let el = self.ui.wait_visible(&locator, Duration::from_secs(5)).await?;
        Ok(self.ui.driver().text(&el).await?)
    }
}

#[async_trait]
impl PageObject for LoginPage {
    fn ui(&self) -> &Ui {
        &self.ui
    }

    fn page_name(&self) -> &'static str {
        "Login page"
    }

    async fn is_displayed(&self) -> bool {
        self.ui.is_displayed_key(TITLE).await
    }
}
