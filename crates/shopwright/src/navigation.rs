//! Multi-page flows shared by the step definitions.
//!
//! A [`Navigator`] carries the test data the flows need and builds the page
//! objects on demand. Every flow checks that it landed where it meant to and
//! fails with [`ShopError::AssertionFailed`] otherwise.
//!
//! ```ignore
//! let nav = Navigator::new(ui).with_product(settings.product.clone());
//! nav.to_fulfilment("cement", "100").await?;
//! ```

use crate::config::{AccountSettings, PaymentSettings, ProductSettings, Settings};
use crate::element::Ui;
use crate::pages::{
    AccountPage, CartPage, FulfilmentPage, HomePage, OrderDetailsPage, OrdersPage, PaymentsPage,
    PickupLocationPage, ProductsPage,
};
use crate::result::{ShopError, ShopResult};
use crate::session::SessionState;
use std::time::Duration;

/// Status of orders that still accept a payment
pub const PAYABLE_STATUS: &str = "Submitted";

fn require(ok: bool, what: &str) -> ShopResult<()> {
    if ok {
        Ok(())
    } else {
        Err(ShopError::assertion(format!("{what} not displayed")))
    }
}

/// Builds and runs page flows
#[derive(Debug, Clone)]
pub struct Navigator {
    ui: Ui,
    account: AccountSettings,
    product: ProductSettings,
    payment: PaymentSettings,
}

impl Navigator {
    /// Navigator with default test data
    #[must_use]
    pub fn new(ui: Ui) -> Self {
        Self {
            ui,
            account: AccountSettings::default(),
            product: ProductSettings::default(),
            payment: PaymentSettings::default(),
        }
    }

    /// Navigator with the test data from `settings`
    #[must_use]
    pub fn from_settings(ui: Ui, settings: &Settings) -> Self {
        Self::new(ui)
            .with_account(settings.account.clone())
            .with_product(settings.product.clone())
            .with_payment(settings.payment.clone())
    }

    /// Use this account
    #[must_use]
    pub fn with_account(mut self, account: AccountSettings) -> Self {
        self.account = account;
        self
    }

    /// Use this product data
    #[must_use]
    pub fn with_product(mut self, product: ProductSettings) -> Self {
        self.product = product;
        self
    }

    /// Use this payment data
    #[must_use]
    pub fn with_payment(mut self, payment: PaymentSettings) -> Self {
        self.payment = payment;
        self
    }

    fn home(&self) -> HomePage {
        HomePage::new(self.ui.clone())
    }

    fn products(&self) -> ProductsPage {
        ProductsPage::new(self.ui.clone(), self.product.page_title.clone())
    }

    fn account_page(&self) -> AccountPage {
        AccountPage::new(self.ui.clone(), self.account.clone())
    }

    fn payments(&self) -> PaymentsPage {
        PaymentsPage::new(self.ui.clone(), self.payment.clone())
    }

    fn fulfilment(&self) -> FulfilmentPage {
        FulfilmentPage::new(self.ui.clone(), self.payment.plate_number.clone())
    }

    // ===== Home and account =====

    /// Tap the home button unless the home page is already showing
    pub async fn go_home(&self) -> ShopResult<()> {
        let home = self.home();
        if home.is_home_page_displayed().await {
            return Ok(());
        }
        self.products().click_home().await?;
        require(home.wait_for_home_page().await, "Home page")
    }

    /// Home, then the account page
    pub async fn to_account(&self) -> ShopResult<()> {
        self.go_home().await?;
        self.home().open_account_page().await?;
        require(self.account_page().is_account_page_displayed().await, "Account page")
    }

    /// Account page, then the order listing
    pub async fn to_orders(&self) -> ShopResult<()> {
        self.to_account().await?;
        self.account_page().open_orders().await
    }

    /// Account page, then the profile
    pub async fn to_profile(&self) -> ShopResult<()> {
        self.to_account().await?;
        self.account_page().open_profile().await
    }

    /// Log out through the account page and mark the session signed out
    pub async fn logout(&self, session: &mut SessionState) -> ShopResult<()> {
        self.to_account().await?;
        self.account_page().logout().await?;
        session.logged_in = false;
        self.ui.step("Logged out via account page");
        Ok(())
    }

    // ===== Shopping =====

    /// Search from home and open the first result
    pub async fn view_product_details(&self, term: &str) -> ShopResult<()> {
        let home = self.home();
        home.tap_search_field().await?;
        home.enter_search_query(term).await?;
        let products = self.products();
        products.select_first_search_result().await?;
        require(products.is_products_page_displayed().await, "Product details page")
    }

    /// Self Collect tab, then search for `term`
    pub async fn to_products_via_search(&self, term: &str) -> ShopResult<()> {
        self.go_home().await?;
        self.home().switch_to_self_collect_tab().await?;
        self.view_product_details(term).await
    }

    /// Add `quantity` of the first result for `term` and open the cart
    pub async fn to_cart(&self, term: &str, quantity: &str) -> ShopResult<()> {
        self.to_products_via_search(term).await?;
        let products = self.products();
        products.enter_quantity(quantity).await?;
        PickupLocationPage::new(self.ui.clone())
            .with_option(self.product.pickup_location.clone())
            .select_valid_pickup_location()
            .await?;
        products.click_view_cart().await?;
        require(CartPage::new(self.ui.clone()).is_cart_page_displayed().await, "Cart page")
    }

    /// Cart, then fulfilment details
    pub async fn to_fulfilment(&self, term: &str, quantity: &str) -> ShopResult<()> {
        self.to_cart(term, quantity).await?;
        CartPage::new(self.ui.clone()).click_proceed_to_fulfilment().await?;
        require(self.fulfilment().is_fulfilment_details_displayed().await, "Fulfilment details")
    }

    /// Open a submitted `order_type` order and follow its pay-now link
    pub async fn to_payments_via_orders(&self, order_type: &str) -> ShopResult<()> {
        self.to_orders().await?;
        OrdersPage::new(self.ui.clone())
            .open_first_matching(order_type, &[PAYABLE_STATUS.to_string()])
            .await?;
        let details = OrderDetailsPage::new(self.ui.clone());
        require(details.is_order_details_displayed().await, "Order details")?;
        details.click_pay_now().await?;
        require(self.payments().is_payments_displayed().await, "Payments page")
    }

    // ===== Reorder =====

    /// From a reordered cart: plate number, pay later and open the order
    pub async fn complete_self_collect_reorder(&self) -> ShopResult<()> {
        CartPage::new(self.ui.clone()).click_proceed_to_fulfilment().await?;
        let fulfilment = self.fulfilment();
        require(fulfilment.is_fulfilment_details_displayed().await, "Fulfilment details")?;
        fulfilment.fill_plate_number_and_proceed().await?;
        let payments = self.payments();
        require(payments.is_payments_displayed().await, "Payments page")?;
        payments.click_pay_balance_later().await?;
        payments.click_view_order().await?;
        require(
            OrderDetailsPage::new(self.ui.clone())
                .wait_for_page_load(Duration::from_secs(15))
                .await,
            "Order details",
        )
    }

    /// From a reordered cart: proceed, pay later and return home
    pub async fn complete_delivery_reorder(&self) -> ShopResult<()> {
        CartPage::new(self.ui.clone()).click_proceed_to_fulfilment().await?;
        let fulfilment = self.fulfilment();
        require(fulfilment.is_fulfilment_details_displayed().await, "Fulfilment details")?;
        fulfilment.click_proceed_to_payment().await?;
        let payments = self.payments();
        payments.click_pay_balance_later().await?;
        payments.click_back_to_home().await
    }
}
