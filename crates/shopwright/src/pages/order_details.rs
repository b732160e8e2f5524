//! Order details: payment summary, pay now, reorder and tracking.

use super::payments::PAYMENTS_TITLE;
use super::PageObject;
use crate::element::Ui;
use crate::result::{ShopError, ShopResult};
use crate::session::PaymentContext;
use async_trait::async_trait;
use std::time::Duration;

const TITLE: &str = "orderDetailsPageTitle.text";
const PAY_NOW: &str = "payNowLink.text";
const REORDER: &str = "reorderBtn.text";
const TRACK_ORDER: &str = "trackOrderBtn.text";

/// Order details screen
#[derive(Debug, Clone)]
pub struct OrderDetailsPage {
    ui: Ui,
}

impl OrderDetailsPage {
    /// Page over `ui`
    #[must_use]
    pub const fn new(ui: Ui) -> Self {
        Self { ui }
    }

    /// Title within 15 s
    pub async fn is_order_details_displayed(&self) -> bool {
        self.ui
            .is_displayed_key_within(TITLE, Duration::from_secs(15))
            .await
    }

    async fn shows(&self, value: &str) -> bool {
        self.ui
            .is_displayed_within(&self.ui.text_contains(value), Duration::from_secs(5))
            .await
    }

    /// Compare the payment summary with what was captured at checkout.
    /// The reference must match exactly; method, amount and the date part
    /// of the timestamp only need to appear.
    pub async fn verify_transaction_details(&self, payment: &PaymentContext) -> ShopResult<()> {
        self.ui.step(format!("Verifying transaction details: {}", payment.summary()));
        let mut problems = Vec::new();
        if let Some(method) = payment.method.as_deref() {
            if !self.shows(method).await {
                problems.push(format!("payment method '{method}' not shown"));
            }
        }
        if let Some(amount) = payment.amount.as_deref() {
            if !self.shows(amount).await {
                problems.push(format!("amount '{amount}' not shown"));
            }
        }
        match payment.reference.as_deref() {
            Some(reference) => {
                let shown = match self.ui.find(&self.ui.text_contains(reference)).await? {
                    Some(el) => Some(self.ui.driver().text(&el).await?),
                    None => None,
                };
                if shown.as_deref().map(str::trim) != Some(reference) {
                    problems.push(format!(
                        "reference expected '{reference}', found '{}'",
                        shown.as_deref().unwrap_or("-")
                    ));
                }
            }
            None => return Err(ShopError::state("no payment reference was captured")),
        }
        if let Some(date) = payment.timestamp.as_deref().and_then(|t| t.split(',').next()) {
            if !self.shows(date).await {
                problems.push(format!("payment date '{date}' not shown"));
            }
        }
        if problems.is_empty() {
            self.ui.step("Transaction details match");
            Ok(())
        } else {
            let message = problems.join("; ");
            self.ui.attach_text("Transaction mismatch", &message);
            Err(ShopError::assertion(format!("Transaction details mismatch: {message}")))
        }
    }

    /// Tap the "Pay now" link
    pub async fn click_pay_now(&self) -> ShopResult<()> {
        let link = self.ui.locator(PAY_NOW)?;
        self.ui.click_within(&link, Duration::from_secs(10)).await?;
        self.ui.step("Clicked 'Pay now'");
        Ok(())
    }

    /// Scroll to the reorder button and tap it
    pub async fn click_reorder(&self) -> ShopResult<()> {
        let button = self.ui.locator(REORDER)?;
        if let Some(label) = self.ui.book().raw(REORDER) {
            self.ui.scroll_to_text(label).await;
        }
        if !self.ui.is_displayed(&button).await {
            return Err(ShopError::assertion("Reorder button not visible on order details"));
        }
        self.ui.click(&button).await?;
        self.ui.step("Clicked 'Reorder'");
        Ok(())
    }

    /// Track order button shown
    pub async fn is_track_order_visible(&self) -> bool {
        self.ui
            .is_displayed_key_within(TRACK_ORDER, Duration::from_secs(10))
            .await
    }

    /// Wait for the payment title that tops the details screen
    pub async fn wait_for_page_load(&self, timeout: Duration) -> bool {
        self.ui.is_displayed_key_within(PAYMENTS_TITLE, timeout).await
    }
}

#[async_trait]
impl PageObject for OrderDetailsPage {
    fn ui(&self) -> &Ui {
        &self.ui
    }

    fn page_name(&self) -> &'static str {
        "Order details"
    }

    fn load_timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn is_displayed(&self) -> bool {
        self.ui.is_displayed_key(TITLE).await
    }
}
