//! Home page with the Self Collect / Delivery tabs and search.

use super::PageObject;
use crate::element::Ui;
use crate::result::{ShopError, ShopResult};
use crate::state::{KEY_ACTIVE_ORDER, KEY_SELF_COLLECT_TAB};
use async_trait::async_trait;
use std::time::Duration;

const DELIVERY_TAB: &str = "deliveryBtn.text";
const DELIVERY_TITLE: &str = "deliveryPageTitle.text";
const SELF_COLLECT_TITLE: &str = "selfCollectPageTitle.text";
const SEARCH_FIELD: &str = "searchField.text";
/// Search input shared with the products page
pub(crate) const PRODUCT_SEARCH_INPUT: &str = "productSearchField.xpath";
const PRODUCTS_TITLE: &str = "ProductsPageTitle.text";
const BUY_NOW: &str = "buyNowBtn.text";
const ADD_TO_CART_TEXT: &str = "addToCartBtn.text";
const ACCOUNT_BUTTON: &str = "accountPageButtonFromHome.uiautomator";
/// Account page title
pub(crate) const ACCOUNT_TITLE: &str = "accountPageTitle.uiautomator";
const REORDER_BUTTON: &str = "reorderButton.text";
/// Track order entry, shared with the active orders page
pub(crate) const TRACK_ORDER: &str = "trackOrderBtn.xpath";

/// Home screen
#[derive(Debug, Clone)]
pub struct HomePage {
    ui: Ui,
}

impl HomePage {
    /// Page over `ui`
    #[must_use]
    pub const fn new(ui: Ui) -> Self {
        Self { ui }
    }

    /// Wait up to 15 s for the Self Collect tab
    pub async fn wait_for_home_page(&self) -> bool {
        let loaded = self
            .ui
            .is_displayed_key_within(KEY_SELF_COLLECT_TAB, Duration::from_secs(15))
            .await;
        if loaded {
            self.ui.step("Home page loaded");
        } else {
            self.ui.error_step("Home page did not load");
        }
        loaded
    }

    /// Self Collect tab visible now
    pub async fn is_home_page_displayed(&self) -> bool {
        self.ui.is_displayed_key(KEY_SELF_COLLECT_TAB).await
    }

    /// Tap the Delivery tab
    pub async fn switch_to_delivery_tab(&self) -> ShopResult<()> {
        self.ui.click_key(DELIVERY_TAB).await?;
        self.ui.step("Switched to Delivery tab");
        Ok(())
    }

    /// Delivery title visible
    pub async fn is_delivery_page_displayed(&self) -> bool {
        self.ui.is_displayed_key(DELIVERY_TITLE).await
    }

    /// Tap Self Collect and require its page title
    pub async fn switch_to_self_collect_tab(&self) -> ShopResult<()> {
        let tab = self.ui.locator(KEY_SELF_COLLECT_TAB)?;
        let title = self.ui.locator(SELF_COLLECT_TITLE)?;
        let el = self
            .ui
            .wait_visible(&tab, Duration::from_secs(10))
            .await
            .map_err(|_| ShopError::assertion("'Self Collect' tab is not clickable or missing"))?;
        self.ui.driver().click(&el).await?;
        self.ui.step("Clicked on 'Self Collect' tab");
        if self.ui.is_displayed_within(&title, Duration::from_secs(5)).await {
            self.ui.step("Self Collect page title is visible");
            Ok(())
        } else {
            Err(ShopError::assertion("Failed to load Self Collect page"))
        }
    }

    /// Self Collect title visible
    pub async fn is_self_collect_page_displayed(&self) -> bool {
        self.ui.is_displayed_key(SELF_COLLECT_TITLE).await
    }

    /// Tap the search field
    pub async fn tap_search_field(&self) -> ShopResult<()> {
        self.ui.click_key(SEARCH_FIELD).await?;
        self.ui.step("Tapped on search field");
        Ok(())
    }

    /// Type into the product search input
    pub async fn enter_search_query(&self, query: &str) -> ShopResult<()> {
        let input = self.ui.locator(PRODUCT_SEARCH_INPUT)?;
        self.ui.type_into(&input, query).await?;
        self.ui.step(format!("Entered search query: {query}"));
        Ok(())
    }

    /// Product details: title plus Buy Now or Add to Cart
    pub async fn is_products_page_displayed(&self) -> bool {
        let wait = Duration::from_secs(15);
        if !self.ui.is_displayed_key_within(PRODUCTS_TITLE, wait).await {
            self.ui.warn_step("Product details title not displayed");
            return false;
        }
        let (Ok(buy), Ok(add)) = (self.ui.locator(BUY_NOW), self.ui.locator(ADD_TO_CART_TEXT)) else {
            return false;
        };
        let has_actions = self.ui.wait_any_visible(&[buy, add], wait).await.is_some();
        self.ui.step(format!("Products page displayed: {has_actions}"));
        has_actions
    }

    /// Open the account page from the bottom bar
    pub async fn open_account_page(&self) -> ShopResult<()> {
        let button = self.ui.locator(ACCOUNT_BUTTON)?;
        self.ui.click_within(&button, Duration::from_secs(10)).await?;
        self.ui.step("Tapped on Account page button");
        if self.ui.is_displayed_key_within(ACCOUNT_TITLE, Duration::from_secs(5)).await {
            self.ui.step("Account page displayed");
        } else {
            self.ui.warn_step("Account page not visible after click");
        }
        Ok(())
    }

    /// Tap "View Order Again"
    pub async fn view_order_again(&self) -> ShopResult<()> {
        self.ui.click_key(REORDER_BUTTON).await?;
        self.ui.step("Clicked View Order Again button");
        Ok(())
    }

    /// Open the active orders list
    pub async fn open_active_orders(&self) -> ShopResult<()> {
        self.ui.click_key(KEY_ACTIVE_ORDER).await?;
        self.ui.step("Opened active orders");
        Ok(())
    }

    /// Open the order tracking list
    pub async fn open_track_order(&self) -> ShopResult<()> {
        self.ui.click_key(TRACK_ORDER).await?;
        self.ui.step("Opened track order list");
        Ok(())
    }
}

#[async_trait]
impl PageObject for HomePage {
    fn ui(&self) -> &Ui {
        &self.ui
    }

    fn page_name(&self) -> &'static str {
        "Home page"
    }

    fn load_timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn is_displayed(&self) -> bool {
        self.is_home_page_displayed().await
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
        (KEY_SELF_COLLECT_TAB, "Self Collect"),
        (SELF_COLLECT_TITLE, "Collect from a branch"),
        (DELIVERY_TAB, "Delivery"),
        (DELIVERY_TITLE, "Deliver to"),
        (PRODUCTS_TITLE, "Description"),
        (BUY_NOW, "Buy Now"),
        (ADD_TO_CART_TEXT, "Add to Cart"),
        (PRODUCT_SEARCH_INPUT, "//android.widget.EditText"),
    ];

    fn text(t: &str) -> Locator {
        Locator::text(Platform::Android, t)
    }

    #[tokio::test]
    async fn test_tabs() {
        let mock = MockDriver::android()
            .with(text("Self Collect"), MockElement::visible())
            .with(text("Delivery"), MockElement::visible())
            .on_click(&text("Delivery"), Transition::Show(text("Deliver to")))
            .on_click(&text("Self Collect"), Transition::Show(text("Collect from a branch")));
        let home = HomePage::new(ui_with(&mock, KEYS));
        assert!(home.is_displayed().await);
        home.switch_to_delivery_tab().await.unwrap();
        assert!(home.is_delivery_page_displayed().await);
        home.switch_to_self_collect_tab().await.unwrap();
        assert!(home.is_self_collect_page_displayed().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_self_collect_without_title_fails() {
        let mock = MockDriver::android().with(text("Self Collect"), MockElement::visible());
        let err = HomePage::new(ui_with(&mock, KEYS))
            .switch_to_self_collect_tab()
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::AssertionFailed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_products_page_needs_an_action() {
        let mock = MockDriver::android().with(text("Description"), MockElement::visible());
        let home = HomePage::new(ui_with(&mock, KEYS));
        assert!(!home.is_products_page_displayed().await);
        mock.add(text("Add to Cart"), MockElement::visible());
        assert!(home.is_products_page_displayed().await);
    }

    #[tokio::test]
    async fn test_search_query() {
        let input = Locator::xpath("//android.widget.EditText");
        let mock = MockDriver::android().with(input.clone(), MockElement::visible());
        HomePage::new(ui_with(&mock, KEYS))
            .enter_search_query("Cement")
            .await
            .unwrap();
        assert_eq!(mock.text_of(&input).as_deref(), Some("Cement"));
    }
}
