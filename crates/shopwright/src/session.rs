//! Per-scenario user session and payment context.

use crate::element::Ui;
use crate::locator::Locator;
use crate::result::ShopResult;
use crate::state::KEY_SELF_COLLECT_TAB;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Timestamp format of captured payments, e.g. `3/7/2025,02:05:09 PM`
pub const PAYMENT_TIME_FORMAT: &str = "%-m/%-d/%Y,%I:%M:%S %p";

/// What the suite knows about the signed-in user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Set after a successful OTP login
    pub logged_in: bool,
    /// API access token, when one was captured
    pub access_token: Option<String>,
    /// User id
    pub user_id: Option<String>,
    /// User role
    pub user_role: Option<String>,
    /// Cart id
    pub cart_id: Option<String>,
    /// Last order reference
    pub order_ref: Option<String>,
    /// Outstanding balance
    pub balance_amount: Option<String>,
}

/// First 4 characters followed by `***`
#[must_use]
pub fn mask_token(token: &str) -> String {
    let head: String = token.chars().take(4).collect();
    format!("{head}***")
}

impl SessionState {
    /// Clear everything
    pub fn reset(&mut self) {
        *self = Self::default();
        info!("session reset");
    }

    /// Logged-in flag, or the home page is on screen
    pub async fn is_logged_in(&self, ui: &Ui) -> bool {
        self.logged_in || ui.is_displayed_key(KEY_SELF_COLLECT_TAB).await
    }

    /// One-line rendering with the token masked
    #[must_use]
    pub fn summary(&self) -> String {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        format!(
            "loggedIn={} accessToken={} userId={} userRole={} cartId={} orderRef={} balance={}",
            self.logged_in,
            self.access_token.as_deref().map_or_else(|| "-".to_string(), mask_token),
            show(&self.user_id),
            show(&self.user_role),
            show(&self.cart_id),
            show(&self.order_ref),
            show(&self.balance_amount),
        )
    }
}

/// Payment captured at checkout, checked later on the order details page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentContext {
    /// Payment method label
    pub method: Option<String>,
    /// Amount text as shown
    pub amount: Option<String>,
    /// Payment reference
    pub reference: Option<String>,
    /// Capture time, [`PAYMENT_TIME_FORMAT`]
    pub timestamp: Option<String>,
}

/// Format a time the way the payment context records it
#[must_use]
pub fn format_payment_time(at: NaiveDateTime) -> String {
    at.format(PAYMENT_TIME_FORMAT).to_string()
}

impl PaymentContext {
    /// Record the payment method
    pub fn set_method(&mut self, method: impl Into<String>) {
        let method = method.into();
        info!(%method, "payment method set");
        self.method = Some(method);
    }

    /// Record the reference typed into the payment form
    pub fn set_reference(&mut self, reference: impl Into<String>) {
        self.reference = Some(reference.into());
    }

    /// Read the amount and reference from the screen and stamp the time
    pub async fn capture(&mut self, ui: &Ui, amount: &Locator, reference: &Locator) -> ShopResult<()> {
        let timestamp = format_payment_time(Local::now().naive_local());
        let amount = ui.text_of(amount).await?;
        let reference = ui.text_of(reference).await?;
        ui.step(format!("Captured payment: amount={amount} ref={reference} at {timestamp}"));
        self.timestamp = Some(timestamp);
        self.amount = Some(amount);
        self.reference = Some(reference);
        Ok(())
    }

    /// One-line rendering
    #[must_use]
    pub fn summary(&self) -> String {
        let show = |v: &Option<String>| v.as_deref().unwrap_or("-").to_string();
        format!(
            "method={} amount={} ref={} time={}",
            show(&self.method),
            show(&self.amount),
            show(&self.reference),
            show(&self.timestamp)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::mock::MockElement;
    use crate::driver::{MockDriver, Platform};
    use crate::element::tests::ui_with;
    use chrono::NaiveDate;

    mod session_tests {
        use super::*;

        #[test]
        fn test_summary_masks_token() {
            let state = SessionState {
                logged_in: true,
                access_token: Some("eyJhbGciOi".to_string()),
                cart_id: Some("c-1".to_string()),
                ..SessionState::default()
            };
            let line = state.summary();
            assert!(line.contains("accessToken=eyJh***"));
            assert!(!line.contains("eyJhbGciOi"));
            assert!(line.contains("cartId=c-1"));
            assert_eq!(mask_token("ab"), "ab***");
        }

        #[test]
        fn test_reset_clears() {
            let mut state = SessionState {
                logged_in: true,
                order_ref: Some("ORD-1".to_string()),
                ..SessionState::default()
            };
            state.reset();
            assert_eq!(state, SessionState::default());
        }

        #[tokio::test]
        async fn test_logged_in_via_home_indicator() {
            let mock = MockDriver::android();
            let ui = ui_with(&mock, &[(KEY_SELF_COLLECT_TAB, "Self Collect")]);
            let state = SessionState::default();
            assert!(!state.is_logged_in(&ui).await);
            mock.add(Locator::text(Platform::Android, "Self Collect"), MockElement::visible());
            assert!(state.is_logged_in(&ui).await);
        }
    }

    mod payment_tests {
        use super::*;

        #[test]
        fn test_time_format() {
            let at = NaiveDate::from_ymd_opt(2025, 3, 7)
                .unwrap()
                .and_hms_opt(14, 5, 9)
                .unwrap();
            assert_eq!(format_payment_time(at), "3/7/2025,02:05:09 PM");
        }

        #[tokio::test]
        async fn test_capture_reads_screen() {
            let amount = Locator::id("amount");
            let reference = Locator::id("ref");
            let mock = MockDriver::android()
                .with(amount.clone(), MockElement::visible().with_text("KES 1,250.00"))
                .with(reference.clone(), MockElement::visible().with_text("AB12CD34"));
            let ui = ui_with(&mock, &[]);
            let mut ctx = PaymentContext::default();
            ctx.set_method("Bank Transfer");
            ctx.capture(&ui, &amount, &reference).await.unwrap();
            assert_eq!(ctx.amount.as_deref(), Some("KES 1,250.00"));
            assert_eq!(ctx.reference.as_deref(), Some("AB12CD34"));
            assert!(ctx.timestamp.is_some());
            assert!(ctx.summary().starts_with("method=Bank Transfer"));
        }
    }
}
