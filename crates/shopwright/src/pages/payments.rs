//! Payments page: payment summary, order completion and pay-later.

use super::bank_transfer::{BankTransferComponent, CONFIRM_PAYMENT, REFERENCE_INPUT};
use super::home::HomePage;
use super::{numeric_part, PageObject};
use crate::config::PaymentSettings;
use crate::element::Ui;
use crate::result::{ShopError, ShopResult};
use crate::session::PaymentContext;
use crate::toast::ToastHelper;
use async_trait::async_trait;
use std::time::Duration;

/// Payments title, shared with the order pages
pub(crate) const PAYMENTS_TITLE: &str = "paymentsTitle.text";
const COMPLETE_ORDER: &str = "completeOrderBtn.text";
const PAY_BALANCE_LATER: &str = "payBalanceLaterBtn.text";
const TOTAL_AMOUNT: &str = "payment.totalAmount.text";
const PAYMENT_STATUS: &str = "payment.status.text";
const BACK_TO_HOME: &str = "backToHomeBtn.text";
const KRA_LABEL: &str = "kraInputLabel.text";
const KRA_SKIP: &str = "kraPinSkipBtn.text";
const ORDER_SUBMITTED: &str = "orderSubmittedTitle.text";
const VIEW_ORDER: &str = "viewOrderBtn.text";
/// Order details title, shared with the order details page
pub(crate) const ORDER_DETAILS_TITLE: &str = "orderDetailsTitle.text";

/// Toast shown after the proof of payment is accepted
pub const PROOF_SUBMITTED_TOAST: &str = "Proof of payment submitted successfully";

const WAIT: Duration = Duration::from_secs(15);
const COMPLETE_ATTEMPTS: u32 = 3;
const COMPLETE_RETRY_DELAY: Duration = Duration::from_millis(1500);

/// Payments screen
#[derive(Debug, Clone)]
pub struct PaymentsPage {
    ui: Ui,
    bank_transfer: BankTransferComponent,
}

impl PaymentsPage {
    /// Page over `ui`; `payment` configures the bank transfer form
    #[must_use]
    pub fn new(ui: Ui, payment: PaymentSettings) -> Self {
        let bank_transfer = BankTransferComponent::new(ui.clone(), payment);
        Self { ui, bank_transfer }
    }

    /// Bank transfer section
    #[must_use]
    pub const fn bank_transfer(&self) -> &BankTransferComponent {
        &self.bank_transfer
    }

    /// Title plus Complete Order or Pay Balance Later
    pub async fn is_payments_displayed(&self) -> bool {
        if !self.ui.is_displayed_key_within(PAYMENTS_TITLE, WAIT).await {
            self.ui.error_step("Payments title not visible");
            return false;
        }
        let (Ok(complete), Ok(later)) = (self.ui.locator(COMPLETE_ORDER), self.ui.locator(PAY_BALANCE_LATER)) else {
            return false;
        };
        self.ui.wait_any_visible(&[complete, later], WAIT).await.is_some()
    }

    /// Amount equals `expected_amount` and the status reads Pending
    pub async fn verify_payment_section(&self, expected_amount: &str) -> bool {
        let read = async {
            let amount = self.ui.locator(TOTAL_AMOUNT)?;
            let el = self.ui.wait_visible(&amount, WAIT).await?;
            let amount_text = self.ui.driver().text(&el).await?;
            let status = self.ui.locator(PAYMENT_STATUS)?;
            let status_text = self.ui.text_of(&status).await?;
            Ok::<_, ShopError>((numeric_part(&amount_text), status_text))
        };
        match read.await {
            Ok((amount, status)) => {
                let matched = amount == expected_amount && status.trim().eq_ignore_ascii_case("pending");
                self.ui.step(format!(
                    "Payment section: amount {amount} (expected {expected_amount}), status {status}"
                ));
                matched
            }
            Err(e) => {
                self.ui.error_step(format!("Payment section verification failed: {e}"));
                false
            }
        }
    }

    /// Record method, amount, typed reference and time for the order
    /// details check
    pub async fn capture_payment(&self, payment: &mut PaymentContext) -> ShopResult<()> {
        let amount = self.ui.locator(TOTAL_AMOUNT)?;
        let reference = self.ui.locator(REFERENCE_INPUT)?;
        payment.set_method(self.bank_transfer.payment().method_label.clone());
        payment.capture(&self.ui, &amount, &reference).await
    }

    /// Confirm the bank transfer and require the success toast
    pub async fn click_confirm_payment(&self) -> ShopResult<()> {
        if !self.bank_transfer.confirm_payment_if_enabled().await {
            return Err(ShopError::assertion(
                "Confirm Payment button is not enabled or not clickable",
            ));
        }
        let toast = ToastHelper::new(self.ui.clone());
        if !toast
            .verify_and_wait(PROOF_SUBMITTED_TOAST, Duration::from_secs(5), Duration::from_secs(3))
            .await
        {
            return Err(ShopError::assertion("Toast message not found or did not disappear"));
        }
        Ok(())
    }

    async fn skip_kra_if_shown(&self) -> ShopResult<()> {
        if self.ui.is_present_key(KRA_LABEL, Duration::from_secs(3)).await {
            let skip = self.ui.locator(KRA_SKIP)?;
            self.ui.click_within(&skip, WAIT).await?;
            self.ui.step("Skipped KRA PIN prompt");
        }
        Ok(())
    }

    /// Tap Complete Order, up to three attempts
    pub async fn click_complete_order(&self) -> ShopResult<()> {
        let button = self.ui.locator(COMPLETE_ORDER)?;
        for attempt in 1..=COMPLETE_ATTEMPTS {
            match self.ui.click(&button).await {
                Ok(()) => {
                    self.ui.step("Clicked Complete Order");
                    return self.skip_kra_if_shown().await;
                }
                Err(e) => {
                    self.ui
                        .warn_step(format!("Attempt {attempt} to click Complete Order failed: {e}"));
                    tokio::time::sleep(COMPLETE_RETRY_DELAY).await;
                }
            }
        }
        Err(ShopError::assertion(format!(
            "Failed to click Complete Order button after {COMPLETE_ATTEMPTS} attempts"
        )))
    }

    /// Wait for Complete Order to be enabled, click it and expect the
    /// Order Submitted page
    pub async fn confirm_order_if_enabled(&self) -> bool {
        let Ok(button) = self.ui.locator(COMPLETE_ORDER) else {
            return false;
        };
        let Ok(el) = self.ui.wait_visible(&button, WAIT).await else {
            self.ui.error_step("Complete Order button not visible");
            return false;
        };
        let ui = &self.ui;
        let el = &el;
        let enabled = ui
            .waiter(WAIT)
            .until_true("Complete Order to be enabled", || async move {
                let value = ui.driver().attribute(el, "enabled").await?;
                Ok(value.is_some_and(|v| v.eq_ignore_ascii_case("true")))
            })
            .await;
        if enabled.is_err() {
            self.ui.warn_step("Complete Order button is still disabled after wait");
            return false;
        }
        if let Err(e) = self.ui.driver().click(el).await {
            self.ui.error_step(format!("Error confirming order: {e}"));
            return false;
        }
        self.is_order_submitted_page_visible().await
    }

    /// Tap Pay Balance Later and skip the optional KRA prompt
    pub async fn click_pay_balance_later(&self) -> ShopResult<()> {
        let flow = async {
            let button = self.ui.locator(PAY_BALANCE_LATER)?;
            self.ui.click_within(&button, WAIT).await?;
            self.skip_kra_if_shown().await
        };
        flow.await
            .map_err(|e| ShopError::assertion(format!("Pay Later flow failed: {e}")))
    }

    /// Order Submitted title shown
    pub async fn is_order_submitted_page_visible(&self) -> bool {
        let shown = self.ui.is_displayed_key_within(ORDER_SUBMITTED, WAIT).await;
        if !shown {
            self.ui.warn_step("Order Submitted page not displayed");
        }
        shown
    }

    /// Tap View Order when the Order Submitted page shows
    pub async fn click_view_order(&self) -> ShopResult<()> {
        if !self.is_order_submitted_page_visible().await {
            self.ui
                .warn_step("Order Submitted page is not visible. Skipping View Order click.");
            return Ok(());
        }
        let button = self.ui.locator(VIEW_ORDER)?;
        self.ui.click_within(&button, WAIT).await
    }

    /// Order details title shown
    pub async fn is_order_details_page_visible(&self) -> bool {
        self.ui.is_displayed_key_within(ORDER_DETAILS_TITLE, WAIT).await
    }

    /// Confirm payment button still on screen
    pub async fn is_still_on_payment_page(&self) -> bool {
        let still = self.ui.is_displayed_key_within(CONFIRM_PAYMENT, WAIT).await;
        if still {
            self.ui.warn_step("Still on Payment page");
        }
        still
    }

    /// Tap Back to Home and wait for the home page
    pub async fn click_back_to_home(&self) -> ShopResult<()> {
        let button = self.ui.locator(BACK_TO_HOME)?;
        self.ui
            .click_within(&button, WAIT)
            .await
            .map_err(|e| ShopError::assertion(format!("Back to Home failed: {e}")))?;
        HomePage::new(self.ui.clone()).wait_for_home_page().await;
        Ok(())
    }

    /// Wait for the payments title
    pub async fn wait_for_page_load(&self, timeout: Duration) -> bool {
        self.ui.is_displayed_key_within(PAYMENTS_TITLE, timeout).await
    }
}

#[async_trait]
impl PageObject for PaymentsPage {
    fn ui(&self) -> &Ui {
        &self.ui
    }

    fn page_name(&self) -> &'static str {
        "Payments page"
    }

    fn load_timeout(&self) -> Duration {
        WAIT
    }

    async fn is_displayed(&self) -> bool {
        self.ui.is_displayed_key(PAYMENTS_TITLE).await
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
        (PAYMENTS_TITLE, "Payments"),
        (COMPLETE_ORDER, "Complete Order"),
        (PAY_BALANCE_LATER, "Pay Balance Later"),
        (TOTAL_AMOUNT, "KES 12,500.00"),
        (PAYMENT_STATUS, "Pending"),
        (KRA_LABEL, "KRA PIN"),
        (KRA_SKIP, "Skip"),
        (ORDER_SUBMITTED, "Order Submitted"),
        (VIEW_ORDER, "View Order"),
        (CONFIRM_PAYMENT, "Confirm Payment"),
        (REFERENCE_INPUT, "//android.widget.EditText[@resource-id='reference']"),
    ];

    fn text(t: &str) -> Locator {
        Locator::text(Platform::Android, t)
    }

    fn page(mock: &MockDriver) -> PaymentsPage {
        PaymentsPage::new(ui_with(mock, KEYS), PaymentSettings::default())
    }

    #[tokio::test]
    async fn test_payments_displayed_with_pay_later() {
        let mock = MockDriver::android()
            .with(text("Payments"), MockElement::visible())
            .with(text("Pay Balance Later"), MockElement::visible());
        assert!(page(&mock).is_payments_displayed().await);
    }

    #[tokio::test]
    async fn test_capture_payment() {
        let mock = MockDriver::android()
            .with(text("KES 12,500.00"), MockElement::visible().with_text("KES 12,500.00"))
            .with(
                Locator::xpath("//android.widget.EditText[@resource-id='reference']"),
                MockElement::visible().with_text("REF8K2M"),
            );
        let mut payment = PaymentContext::default();
        page(&mock).capture_payment(&mut payment).await.unwrap();
        assert_eq!(payment.method.as_deref(), Some("Bank Transfer"));
        assert_eq!(payment.amount.as_deref(), Some("KES 12,500.00"));
        assert_eq!(payment.reference.as_deref(), Some("REF8K2M"));
        assert!(payment.timestamp.is_some());
    }

    #[tokio::test]
    async fn test_payment_section() {
        let mock = MockDriver::android()
            .with(text("KES 12,500.00"), MockElement::visible().with_text("KES 12,500.00"))
            .with(text("Pending"), MockElement::visible().with_text("PENDING"));
        let page = page(&mock);
        assert!(page.verify_payment_section("12500.00").await);
        assert!(!page.verify_payment_section("12500").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_payment_needs_toast() {
        let confirm = Locator::accessibility_id("Confirm Payment");
        let toast = Locator::text_contains(Platform::Android, PROOF_SUBMITTED_TOAST);
        let mock = MockDriver::android()
            .with(confirm.clone(), MockElement::visible())
            .on_click(&confirm, Transition::Show(toast.clone()));
        page(&mock).click_confirm_payment().await.unwrap();

        let silent = MockDriver::android().with(confirm, MockElement::visible());
        assert!(matches!(
            page(&silent).click_confirm_payment().await,
            Err(ShopError::AssertionFailed { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_order_skips_kra() {
        let mock = MockDriver::android()
            .with(text("Complete Order"), MockElement::visible())
            .on_click(&text("Complete Order"), Transition::Show(text("KRA PIN")))
            .on_click(&text("Complete Order"), Transition::Show(text("Skip")));
        page(&mock).click_complete_order().await.unwrap();
        assert_eq!(mock.clicks(&text("Skip")), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_order_gives_up() {
        let mock = MockDriver::android().with(text("Complete Order"), MockElement::visible().disabled());
        let err = page(&mock).click_complete_order().await.unwrap_err();
        assert!(err.to_string().contains("after 3 attempts"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_order_waits_for_enabled() {
        let complete = text("Complete Order");
        let mock = MockDriver::android()
            .with(complete.clone(), MockElement::visible().disabled())
            .on_click(&complete, Transition::Show(text("Order Submitted")));
        let enable = {
            let mock = mock.clone();
            let complete = complete.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                mock.apply(&Transition::SetAttribute(complete, "enabled".to_string(), "true".to_string()));
            }
        };
        let page = page(&mock);
        let (confirmed, ()) = tokio::join!(page.confirm_order_if_enabled(), enable);
        assert!(confirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_order_skipped_without_submitted_page() {
        let mock = MockDriver::android().with(text("View Order"), MockElement::visible());
        page(&mock).click_view_order().await.unwrap();
        assert_eq!(mock.clicks(&text("View Order")), 0);
    }
}
