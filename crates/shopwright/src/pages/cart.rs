//! Cart page and cart clearing.

use super::products::CART_TITLE;
use super::PageObject;
use crate::element::Ui;
use crate::result::{ShopError, ShopResult};
use async_trait::async_trait;
use std::time::Duration;

/// Proceed button, shared with the fulfilment page
pub(crate) const PROCEED_TO_FULFILMENT: &str = "proceedToFulfilmentBtn.text";
/// Total label, shared with the fulfilment page
pub(crate) const TOTAL_LABEL: &str = "totalAmountLabel.text";
const QUANTITY_INPUT: &str = "cartQtyInput.uiautomator";
const ADD_MORE_ITEMS: &str = "addMoreItemsBtn.text";
const DELIVERY_METHOD: &str = "cart.deliveryMethod.id";
const EMPTY_CART: &str = "cartDescription.text";
const DELETE_ITEM: &str = "deleteItemBtn.automator";

const MAX_CLEAR_ROUNDS: u32 = 10;

/// Cart screen
#[derive(Debug, Clone)]
pub struct CartPage {
    ui: Ui,
}

impl CartPage {
    /// Page over `ui`
    #[must_use]
    pub const fn new(ui: Ui) -> Self {
        Self { ui }
    }

    /// Title plus either the proceed button or the total label
    pub async fn is_cart_page_displayed(&self) -> bool {
        let wait = Duration::from_secs(15);
        if !self.ui.is_displayed_key_within(CART_TITLE, wait).await {
            self.ui.error_step("Cart page title not visible");
            return false;
        }
        let (Ok(proceed), Ok(total)) = (self.ui.locator(PROCEED_TO_FULFILMENT), self.ui.locator(TOTAL_LABEL)) else {
            return false;
        };
        let shown = self.ui.wait_any_visible(&[proceed, total], wait).await.is_some();
        if shown {
            self.ui.step("Cart page verified");
        }
        shown
    }

    /// Tap "Proceed to Fulfilment"
    pub async fn click_proceed_to_fulfilment(&self) -> ShopResult<()> {
        let button = self.ui.locator(PROCEED_TO_FULFILMENT)?;
        self.ui.click_within(&button, Duration::from_secs(10)).await?;
        self.ui.step("Clicked 'Proceed to Fulfilment'");
        Ok(())
    }

    /// Replace the quantity in the cart line
    pub async fn update_quantity(&self, quantity: &str) -> ShopResult<()> {
        self.ui.step(format!("Updating quantity to: {quantity}"));
        let input = self.ui.locator(QUANTITY_INPUT)?;
        let el = self.ui.wait_clickable(&input, Duration::from_secs(10)).await?;
        let driver = self.ui.driver();
        driver.click(&el).await?;
        driver.clear(&el).await?;
        driver.send_keys(&el, quantity).await?;
        self.ui.hide_keyboard().await;
        self.ui.delay(300).await;
        self.ui.step(format!("Quantity updated to {quantity}"));
        Ok(())
    }

    /// Wait for the cart title
    pub async fn wait_for_page_load(&self, timeout: Duration) -> bool {
        let loaded = self.ui.is_displayed_key_within(CART_TITLE, timeout).await;
        if loaded {
            self.ui.step("Cart page loaded");
        } else {
            self.ui.warn_step(format!("Cart page did not load in {} seconds", timeout.as_secs()));
        }
        loaded
    }

    /// Tap "Add More Items"
    pub async fn click_add_more_items(&self) -> ShopResult<()> {
        let button = self.ui.locator(ADD_MORE_ITEMS)?;
        self.ui.click_within(&button, Duration::from_secs(10)).await?;
        self.ui.step("Clicked 'Add More Items'");
        Ok(())
    }

    /// The item name and a label with the quantity are both on screen
    pub async fn verify_cart_item_quantity(&self, item: &str, quantity: u32) -> bool {
        let item_shown = self.ui.find(&self.ui.text(item)).await.ok().flatten().is_some();
        let qty = self.ui.text(&quantity.to_string());
        let qty_shown = self
            .ui
            .driver()
            .find_elements(&qty)
            .await
            .is_ok_and(|found| !found.is_empty());
        if item_shown && qty_shown {
            self.ui.step(format!("Verified cart item quantity for {item}"));
            true
        } else {
            self.ui.warn_step(format!("Quantity {quantity} not found for item '{item}'"));
            false
        }
    }

    /// Delivery carts list a transport line, self-collect carts must not
    pub async fn verify_delivery_method(&self, method: &str) -> ShopResult<()> {
        let expects_transport = match method.trim().to_lowercase().as_str() {
            "delivery" => true,
            "self collect" => false,
            _ => return Err(ShopError::invalid("delivery method", format!("'{method}'"))),
        };
        let locator = self.ui.locator(DELIVERY_METHOD)?;
        let text = self.ui.text_of(&locator).await?.to_lowercase();
        let has_transport = text.contains("transport");
        if has_transport != expects_transport {
            return Err(ShopError::assertion(if expects_transport {
                "Expected 'transport' for delivery method"
            } else {
                "'Transport' should not be present for self collect"
            }));
        }
        self.ui.step(format!("Verified delivery method: {method}"));
        Ok(())
    }

    /// Tap "Start shopping" on an empty cart
    pub async fn click_start_shopping(&self) -> ShopResult<()> {
        let button = self.ui.locator(EMPTY_CART)?;
        self.ui.click_within(&button, Duration::from_secs(10)).await?;
        self.ui.step("Clicked 'Start shopping'");
        Ok(())
    }

    /// Delete items until the empty-cart text shows. Returns whether the
    /// cart ended empty.
    pub async fn clear_cart_items(&self) -> ShopResult<bool> {
        let delete = self.ui.locator(DELETE_ITEM)?;
        let empty = self.ui.locator(EMPTY_CART)?;
        self.ui.step("Clearing cart items");
        let mut rounds = 0;
        while rounds < MAX_CLEAR_ROUNDS {
            rounds += 1;
            if self.ui.is_displayed_within(&empty, Duration::from_secs(2)).await {
                self.ui.step("Cart is empty");
                break;
            }
            if !self.ui.is_present(&delete, Duration::from_secs(3)).await {
                self.ui.warn_step(format!("No delete button found on attempt #{rounds}"));
                break;
            }
            self.ui.step(format!("Deleting item #{rounds}"));
            self.ui.click(&delete).await?;
            self.ui.delay(500).await;
        }
        let cleared = self.ui.is_displayed_within(&empty, Duration::from_secs(3)).await;
        if cleared {
            self.ui.step("Cart cleared successfully");
        } else {
            self.ui.warn_step(format!("Cart may still have items after {rounds} attempts"));
        }
        Ok(cleared)
    }
}

#[async_trait]
impl PageObject for CartPage {
    fn ui(&self) -> &Ui {
        &self.ui
    }

    fn page_name(&self) -> &'static str {
        "Cart page"
    }

    fn load_timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn is_displayed(&self) -> bool {
        self.ui.is_displayed_key(CART_TITLE).await
    }
}
