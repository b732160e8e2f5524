//! Active orders list and order tracking.

use super::home::TRACK_ORDER;
use super::payments::PAYMENTS_TITLE;
use super::PageObject;
use crate::config::OrderSettings;
use crate::element::Ui;
use crate::locator::Locator;
use crate::result::ShopResult;
use crate::state::{KEY_ACTIVE_ORDER, KEY_ORDER_TRACKING};
use async_trait::async_trait;
use std::time::Duration;

const FIRST_ACTIVE_ORDER: &str = "firstActiveOrderStatus.xpath";

const WAIT: Duration = Duration::from_secs(15);

impl OrderSettings {
    /// Status XPath with `{status}` filled in
    #[must_use]
    pub fn status_xpath(&self, status: &str) -> String {
        self.status_xpath_template.replace("{status}", status)
    }
}

/// Active orders list reached from the home page
#[derive(Debug, Clone)]
pub struct ActiveOrdersPage {
    ui: Ui,
    orders: OrderSettings,
}

impl ActiveOrdersPage {
    /// Page over `ui`; `orders` holds the status priority
    #[must_use]
    pub const fn new(ui: Ui, orders: OrderSettings) -> Self {
        Self { ui, orders }
    }

    /// Open the active orders tab
    pub async fn view_active_orders(&self) -> ShopResult<()> {
        self.ui.click_key(KEY_ACTIVE_ORDER).await?;
        self.ui.step("Opened active orders");
        Ok(())
    }

    /// First active order card visible
    pub async fn is_active_orders_displayed(&self) -> bool {
        let shown = self.ui.is_displayed_key_within(FIRST_ACTIVE_ORDER, WAIT).await;
        if !shown {
            self.ui.error_step("No active order card visible");
        }
        shown
    }

    /// Open the first active order
    pub async fn view_order_details(&self) -> ShopResult<()> {
        self.ui.click_key(FIRST_ACTIVE_ORDER).await
    }

    /// Open the order tracking list
    pub async fn view_track_order_list(&self) -> ShopResult<()> {
        self.ui.click_key(TRACK_ORDER).await
    }

    /// Open the first order whose status ranks highest, falling back to the
    /// first active order. Returns the status that matched, if any.
    pub async fn select_order_by_priority(&self) -> ShopResult<Option<String>> {
        for status in &self.orders.status_priority {
            self.ui.scroll_to_text(status).await;
            let locator = Locator::xpath(self.orders.status_xpath(status));
            match self.ui.driver().find_elements(&locator).await {
                Ok(found) => {
                    if let Some(order) = found.first() {
                        self.ui.driver().click(order).await?;
                        self.ui.step(format!("Selected order with status: {status}"));
                        return Ok(Some(status.clone()));
                    }
                }
                Err(e) => self.ui.warn_step(format!("Find failed for status '{status}': {e}")),
            }
        }
        self.ui.warn_step("No prioritised status found, opening the first active order");
        self.ui.click_key(FIRST_ACTIVE_ORDER).await?;
        Ok(None)
    }

    /// Order tracking title visible
    pub async fn is_order_tracking_page_displayed(&self) -> bool {
        self.ui.is_displayed_key_within(KEY_ORDER_TRACKING, WAIT).await
    }

    /// Wait for the payments page reached from an order
    pub async fn wait_for_page_load(&self, timeout: Duration) -> bool {
        self.ui.is_displayed_key_within(PAYMENTS_TITLE, timeout).await
    }
}

#[async_trait]
impl PageObject for ActiveOrdersPage {
    fn ui(&self) -> &Ui {
        &self.ui
    }

    fn page_name(&self) -> &'static str {
        "Active orders"
    }

    fn load_timeout(&self) -> Duration {
        WAIT
    }

    async fn is_displayed(&self) -> bool {
        self.ui.is_displayed_key(FIRST_ACTIVE_ORDER).await
    }
}
