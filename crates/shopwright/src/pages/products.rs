//! Product details, search results and the add-to-cart flow.

use super::home::PRODUCT_SEARCH_INPUT;
use super::PageObject;
use crate::element::Ui;
use crate::result::{ShopError, ShopResult};
use crate::state::KEY_SELF_COLLECT_TAB;
use async_trait::async_trait;
use std::time::Duration;

const QUANTITY_INPUT: &str = "productQtyInput.uiautomator";
const ADD_TO_CART: &str = "addToCartBtn.accessibilityId";
const VIEW_CART: &str = "viewCartBtn.text";
/// Cart page title, shared with the cart page
pub(crate) const CART_TITLE: &str = "cartPageTitle.text";
const HOME_ELEMENT: &str = "homePageElement.text";
const CART_TOAST: &str = "cartToastMessage.text";
const BROWSE_ALL: &str = "browseAllProductsBtn.text";
/// Delivery tab on the listing, shared with the fulfilment page
pub(crate) const DELIVERY_TAB: &str = "productsDeliveryBtn.text";
/// "Change anyway" confirmation after switching method
pub(crate) const CHANGE_ANYWAY: &str = "productsChangeAnywayBtn.text";
const DELIVERY_COST: &str = "estDeliveryCost.xpath";
const SEARCH_TITLE: &str = "searchProductsPageTitle.text";
const SEARCH_FIELD: &str = "searchField.className";
const FIRST_RESULT: &str = "firstSearchResult.uiautomator";
/// Bottom bar home button
pub(crate) const HOME_BUTTON: &str = "homeBtn.automator";
/// Delivery address banner
pub(crate) const DELIVERY_ADDRESS: &str = "deliveryAddress.text";

/// Product listing and details screen
#[derive(Debug, Clone)]
pub struct ProductsPage {
    ui: Ui,
    title: String,
}

impl ProductsPage {
    /// Page over `ui`; `title` is the text the page scrolls to
    #[must_use]
    pub fn new(ui: Ui, title: impl Into<String>) -> Self {
        Self {
            ui,
            title: title.into(),
        }
    }

    fn wait(&self) -> Duration {
        self.ui.timeouts().long_wait()
    }

    /// Scroll to the title text and check it is visible
    pub async fn is_products_page_displayed(&self) -> bool {
        self.ui.step(format!("Checking products page with title: {}", self.title));
        self.ui.scroll_to_text(&self.title).await;
        let locator = self.ui.text_contains(&self.title);
        let shown = self.ui.is_displayed_within(&locator, self.wait()).await;
        if !shown {
            self.ui.error_step(format!("Products page title not found: {}", self.title));
        }
        shown
    }

    /// Type the quantity and hide the keyboard
    pub async fn enter_quantity(&self, quantity: &str) -> ShopResult<()> {
        let input = self.ui.locator(QUANTITY_INPUT)?;
        let el = self.ui.wait_clickable(&input, self.wait()).await?;
        let driver = self.ui.driver();
        driver.click(&el).await?;
        driver.clear(&el).await?;
        driver.send_keys(&el, quantity).await?;
        self.ui.step(format!("Quantity entered: {quantity}"));
        self.ui.hide_keyboard().await;
        Ok(())
    }

    /// Tap Add to Cart
    pub async fn click_add_to_cart(&self) -> ShopResult<()> {
        let button = self.ui.locator(ADD_TO_CART)?;
        self.ui.click_within(&button, self.wait()).await?;
        self.ui.step("Clicked 'Add to Cart'");
        Ok(())
    }

    /// Tap View Cart. Landing anywhere but the cart is logged, not raised.
    pub async fn click_view_cart(&self) -> ShopResult<()> {
        let button = self.ui.locator(VIEW_CART)?;
        self.ui.click_within(&button, self.wait()).await?;
        self.ui.step("Clicked 'View Cart'");
        if self.ui.is_displayed_key_within(CART_TITLE, self.wait()).await {
            self.ui.step("Confirmed navigation to Cart Page");
        } else if self.ui.is_displayed_key(HOME_ELEMENT).await {
            self.ui.warn_step("'View Cart' clicked but redirected to Home Page instead");
        } else {
            self.ui.warn_step("'View Cart' clicked but the current page couldn't be identified");
        }
        Ok(())
    }

    /// "Added to cart" toast visible
    pub async fn is_cart_toast_visible(&self) -> bool {
        self.ui.is_displayed_key_within(CART_TOAST, self.wait()).await
    }

    /// Tap "Browse all products"
    pub async fn click_browse_all_products(&self) -> ShopResult<()> {
        self.ui.click_key(BROWSE_ALL).await
    }

    /// Switch listing to Delivery; delivery costs must then be shown
    pub async fn switch_to_delivery_and_verify(&self) -> ShopResult<()> {
        self.ui.click_key(DELIVERY_TAB).await?;
        self.ui.step("Clicked Delivery tab");
        self.handle_change_anyway_if_present().await?;
        if !self.is_estimated_delivery_cost_displayed().await {
            return Err(ShopError::assertion(
                "Estimated delivery cost not found on any product",
            ));
        }
        self.ui.step("Estimated delivery cost is displayed");
        Ok(())
    }

    /// Switch back to Self Collect; delivery costs must then be hidden
    pub async fn switch_back_to_self_collect_and_verify(&self) -> ShopResult<()> {
        self.ui.click_key(KEY_SELF_COLLECT_TAB).await?;
        self.ui.step("Clicked Self Collect tab");
        self.handle_change_anyway_if_present().await?;
        if self.is_estimated_delivery_cost_displayed().await {
            return Err(ShopError::assertion(
                "Estimated Delivery Cost should NOT be visible in Self Collect mode",
            ));
        }
        self.ui.step("Estimated Delivery Cost is not visible");
        Ok(())
    }

    /// Confirm the "Change anyway" prompt if it appears within 5 s
    pub async fn handle_change_anyway_if_present(&self) -> ShopResult<()> {
        let button = self.ui.locator(CHANGE_ANYWAY)?;
        if self.ui.click_if_present(&button, Duration::from_secs(5)).await? {
            self.ui.step("Clicked 'Change Anyway' button");
        } else {
            self.ui.step("'Change Anyway' prompt not shown");
        }
        Ok(())
    }

    /// Any delivery cost label displayed within 5 s
    pub async fn is_estimated_delivery_cost_displayed(&self) -> bool {
        let Ok(cost) = self.ui.locator(DELIVERY_COST) else {
            return false;
        };
        let ui = &self.ui;
        let cost = &cost;
        ui.waiter(Duration::from_secs(5))
            .until_true("estimated delivery cost", || async move {
                for el in ui.driver().find_elements(cost).await? {
                    if ui.driver().is_displayed(&el).await.unwrap_or(false) {
                        return Ok(true);
                    }
                }
                Ok(false)
            })
            .await
            .is_ok()
    }

    /// Search results page: title and search field
    pub async fn is_search_products_page_displayed(&self) -> bool {
        let title = self.ui.is_displayed_key_within(SEARCH_TITLE, self.wait()).await;
        let field = self.ui.is_displayed_key_within(SEARCH_FIELD, self.wait()).await;
        self.ui.step(format!("Search products page: title={title} field={field}"));
        title && field
    }

    /// Type into the search input
    pub async fn enter_search_query(&self, query: &str) -> ShopResult<()> {
        let input = self.ui.locator(PRODUCT_SEARCH_INPUT)?;
        self.ui.type_into(&input, query).await?;
        self.ui.step(format!("Entered search query: {query}"));
        Ok(())
    }

    /// Open the first search result
    pub async fn select_first_search_result(&self) -> ShopResult<()> {
        let first = self.ui.locator(FIRST_RESULT)?;
        self.ui.click_within(&first, self.wait()).await?;
        self.ui.step("Selected first search result");
        Ok(())
    }

    /// Delivery address banner shown
    pub async fn is_delivery_tab_visible(&self) -> bool {
        self.ui.is_displayed_key(DELIVERY_ADDRESS).await
    }

    /// Tap the bottom bar home button
    pub async fn click_home(&self) -> ShopResult<()> {
        self.ui.click_key(HOME_BUTTON).await?;
        self.ui.step("Clicked Home button");
        Ok(())
    }
}

#[async_trait]
impl PageObject for ProductsPage {
    fn ui(&self) -> &Ui {
        &self.ui
    }

    fn page_name(&self) -> &'static str {
        "Products page"
    }

    async fn is_displayed(&self) -> bool {
        self.ui.is_displayed(&self.ui.text_contains(&self.title)).await
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
        (QUANTITY_INPUT, "new UiSelector().className(\"android.widget.EditText\")"),
        (ADD_TO_CART, "Add to cart"),
        (VIEW_CART, "View Cart"),
        (CART_TITLE, "My Cart"),
        (HOME_ELEMENT, "Hello"),
        (DELIVERY_TAB, "Delivery"),
        (CHANGE_ANYWAY, "Change anyway"),
        (DELIVERY_COST, "//*[contains(@text,'Est. delivery')]"),
        (KEY_SELF_COLLECT_TAB, "Self Collect"),
    ];

    fn text(t: &str) -> Locator {
        Locator::text(Platform::Android, t)
    }

    #[tokio::test]
    async fn test_quantity_and_add() {
        let qty = Locator::ui_automator("new UiSelector().className(\"android.widget.EditText\")");
        let add = Locator::accessibility_id("Add to cart");
        let mock = MockDriver::android()
            .with(qty.clone(), MockElement::visible().with_text("1"))
            .with(add.clone(), MockElement::visible());
        let page = ProductsPage::new(ui_with(&mock, KEYS), "Products");
        page.enter_quantity("100").await.unwrap();
        page.click_add_to_cart().await.unwrap();
        assert_eq!(mock.text_of(&qty).as_deref(), Some("100"));
        assert!(mock.commands().contains(&"hide_keyboard".to_string()));
        assert_eq!(mock.clicks(&add), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_toggle() {
        let cost = Locator::xpath("//*[contains(@text,'Est. delivery')]");
        let mock = MockDriver::android()
            .with(text("Delivery"), MockElement::visible())
            .with(text("Self Collect"), MockElement::visible())
            .with(cost.clone(), MockElement::absent())
            .on_click(&text("Delivery"), Transition::Show(cost.clone()))
            .on_click(&text("Self Collect"), Transition::Remove(cost));
        let page = ProductsPage::new(ui_with(&mock, KEYS), "Products");
        page.switch_to_delivery_and_verify().await.unwrap();
        page.switch_back_to_self_collect_and_verify().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_without_cost_fails() {
        let mock = MockDriver::android().with(text("Delivery"), MockElement::visible());
        let page = ProductsPage::new(ui_with(&mock, KEYS), "Products");
        assert!(matches!(
            page.switch_to_delivery_and_verify().await,
            Err(ShopError::AssertionFailed { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_cart_redirect_is_not_an_error() {
        let mock = MockDriver::android()
            .with(text("View Cart"), MockElement::visible())
            .on_click(&text("View Cart"), Transition::Show(text("Hello")));
        let page = ProductsPage::new(ui_with(&mock, KEYS), "Products");
        page.click_view_cart().await.unwrap();
    }
}
