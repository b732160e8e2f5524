//! Page objects, one per app screen.
//!
//! Every page wraps a [`Ui`] and resolves its elements by locator key, so
//! the screens can be re-pointed at a new build by editing configuration.
//!
//! ```ignore
//! let login = LoginPage::new(ui.clone());
//! login.enter_phone_number("712345678").await?;
//! login.click_continue().await?;
//! OtpPage::new(ui).enter_otp("1234").await?;
//! ```

pub mod account;
pub mod active_orders;
pub mod bank_transfer;
pub mod cart;
pub mod fulfilment;
pub mod home;
pub mod login;
pub mod order_details;
pub mod orders;
pub mod otp;
pub mod payments;
pub mod pickup;
pub mod products;
pub mod profile;
pub mod reorder;

pub use account::AccountPage;
pub use active_orders::ActiveOrdersPage;
pub use bank_transfer::BankTransferComponent;
pub use cart::CartPage;
pub use fulfilment::FulfilmentPage;
pub use home::HomePage;
pub use login::LoginPage;
pub use order_details::OrderDetailsPage;
pub use orders::{OrderCardFinder, OrdersPage};
pub use otp::OtpPage;
pub use payments::PaymentsPage;
pub use pickup::PickupLocationPage;
pub use products::ProductsPage;
pub use profile::ProfilePage;
pub use reorder::ReorderPage;

use crate::element::Ui;
use crate::result::ShopResult;
use async_trait::async_trait;
use std::time::Duration;

/// A screen of the app
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Helpers the page works through
    fn ui(&self) -> &Ui;

    /// Name used in logs
    fn page_name(&self) -> &'static str;

    /// How long [`PageObject::wait_for_load`] waits by default
    fn load_timeout(&self) -> Duration {
        self.ui().timeouts().default_wait()
    }

    /// Whether the page is on screen right now
    async fn is_displayed(&self) -> bool;

    /// Wait until the page is on screen
    async fn wait_for_load(&self, timeout: Duration) -> ShopResult<()> {
        let name = self.page_name();
        self.ui()
            .waiter(timeout)
            .until_true(&format!("{name} to load"), || async move { Ok(self.is_displayed().await) })
            .await?;
        self.ui().step(format!("{name} loaded"));
        Ok(())
    }
}

/// Keep digits and `.` only, for comparing amounts like `KES 1,250.00`
#[must_use]
pub fn numeric_part(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::mock::{MockElement, Transition};
    use crate::driver::MockDriver;
    use crate::element::tests::ui_with;
    use crate::locator::Locator;

    #[derive(Debug)]
    struct Splash {
        ui: Ui,
    }

    #[async_trait]
    impl PageObject for Splash {
        fn ui(&self) -> &Ui {
            &self.ui
        }

        fn page_name(&self) -> &'static str {
            "Splash"
        }

        async fn is_displayed(&self) -> bool {
            self.ui.is_displayed(&Locator::id("splash")).await
        }
    }

    #[tokio::test]
    async fn test_wait_for_load() {
        let splash = Locator::id("splash");
        let mock = MockDriver::android().with(splash.clone(), MockElement::absent());
        let page = Splash { ui: ui_with(&mock, &[]) };
        assert!(page.wait_for_load(Duration::from_millis(20)).await.unwrap_err().is_timeout());
        mock.apply(&Transition::Show(splash));
        page.wait_for_load(page.load_timeout()).await.unwrap();
    }

    #[test]
    fn test_numeric_part() {
        assert_eq!(numeric_part("KES 1,250.00"), "1250.00");
        assert_eq!(numeric_part("Pending"), "");
    }
}
