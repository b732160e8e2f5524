//! Fulfilment details: plate number, delivery method and pricing popup.

use super::cart::{PROCEED_TO_FULFILMENT, TOTAL_LABEL};
use super::products::{CART_TITLE, CHANGE_ANYWAY, DELIVERY_ADDRESS, DELIVERY_TAB};
use super::PageObject;
use crate::element::Ui;
use crate::locator::Locator;
use crate::result::{ShopError, ShopResult};
use crate::state::KEY_SELF_COLLECT_TAB;
use async_trait::async_trait;
use std::time::Duration;

const PLATE_INPUT: &str = "plateNumber.uiautomator";
const PROCEED_TO_PAYMENT: &str = "proceedToPaymentBtn.text";
const SELF_COLLECT_TITLE: &str = "selfCollect.text";
const PRICING_POPUP: &str = "products.pricingPopupText";

/// Fulfilment details screen
#[derive(Debug, Clone)]
pub struct FulfilmentPage {
    ui: Ui,
    plate_number: String,
}

impl FulfilmentPage {
    /// Page over `ui` that fills in `plate_number`
    #[must_use]
    pub fn new(ui: Ui, plate_number: impl Into<String>) -> Self {
        Self {
            ui,
            plate_number: plate_number.into(),
        }
    }

    /// textContains locator for the configured value of `key`
    fn contains(&self, key: &str) -> ShopResult<Locator> {
        let value = self
            .ui
            .book()
            .raw(key)
            .ok_or_else(|| ShopError::MissingKey { key: key.to_string() })?;
        Ok(self.ui.text_contains(value))
    }

    /// Title plus the proceed button or the total label
    pub async fn is_fulfilment_details_displayed(&self) -> bool {
        let wait = Duration::from_secs(15);
        if !self.ui.is_displayed_key_within(CART_TITLE, wait).await {
            self.ui.error_step("Fulfilment details title not visible");
            return false;
        }
        let (Ok(proceed), Ok(total)) = (self.ui.locator(PROCEED_TO_FULFILMENT), self.ui.locator(TOTAL_LABEL)) else {
            return false;
        };
        self.ui.wait_any_visible(&[proceed, total], wait).await.is_some()
    }

    /// Type the plate number and continue to payment
    pub async fn fill_plate_number_and_proceed(&self) -> ShopResult<()> {
        let input = self.ui.locator(PLATE_INPUT)?;
        let el = self.ui.wait_clickable(&input, Duration::from_secs(10)).await?;
        let driver = self.ui.driver();
        driver.click(&el).await?;
        driver.clear(&el).await?;
        driver.send_keys(&el, &self.plate_number).await?;
        self.ui.step(format!("Entered plate number: {}", self.plate_number));
        self.ui.hide_keyboard().await;
        let proceed = self.ui.locator(PROCEED_TO_PAYMENT)?;
        self.ui.click_within(&proceed, Duration::from_secs(10)).await?;
        self.ui.step("Clicked 'Proceed to Payment'");
        Ok(())
    }

    /// Wait for the title
    pub async fn wait_for_page_load(&self, timeout: Duration) -> bool {
        self.ui.is_displayed_key_within(CART_TITLE, timeout).await
    }

    /// Delivery address text shown within 30 s
    pub async fn is_delivery_page_displayed(&self) -> bool {
        match self.contains(DELIVERY_ADDRESS) {
            Ok(locator) => self.ui.is_displayed_within(&locator, Duration::from_secs(30)).await,
            Err(e) => {
                self.ui.error_step(format!("Error checking delivery page: {e}"));
                false
            }
        }
    }

    /// Self collect text shown within 30 s
    pub async fn is_self_collect_page_displayed(&self) -> bool {
        match self.contains(SELF_COLLECT_TITLE) {
            Ok(locator) => self.ui.is_displayed_within(&locator, Duration::from_secs(30)).await,
            Err(e) => {
                self.ui.error_step(format!("Error checking self collect page: {e}"));
                false
            }
        }
    }

    /// "Updating product pricing" popup shown within 5 s
    pub async fn is_pricing_popup_visible(&self) -> bool {
        match self.contains(PRICING_POPUP) {
            Ok(locator) => self.ui.is_displayed_within(&locator, Duration::from_secs(5)).await,
            Err(_) => false,
        }
    }

    /// Wait up to 30 s for the pricing popup to go away
    pub async fn wait_for_pricing_popup_to_dismiss(&self) -> ShopResult<()> {
        let locator = self.contains(PRICING_POPUP)?;
        self.ui.wait_invisible(&locator, Duration::from_secs(30)).await
    }

    async fn ride_out_pricing_popup(&self) -> ShopResult<()> {
        if self.is_pricing_popup_visible().await {
            self.ui.step("Waiting for pricing popup...");
            self.wait_for_pricing_popup_to_dismiss().await?;
        }
        Ok(())
    }

    /// Tap "Proceed to Payment" when it is enabled. A missing or disabled
    /// button is logged only.
    pub async fn click_proceed_to_payment(&self) -> ShopResult<()> {
        let button = self.ui.locator(PROCEED_TO_PAYMENT)?;
        let el = match self.ui.wait_present(&button, Duration::from_secs(10)).await {
            Ok(el) => el,
            Err(e) if e.is_timeout() => {
                self.ui.error_step("'Proceed to Payment' button was not found within 10 seconds");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let driver = self.ui.driver();
        if driver.is_displayed(&el).await? && driver.is_enabled(&el).await? {
            driver.click(&el).await?;
            self.ui.step("Clicked 'Proceed to Payment'");
        } else {
            self.ui.warn_step("'Proceed to Payment' is present but not clickable");
        }
        Ok(())
    }

    async fn confirm_change_anyway(&self) -> ShopResult<()> {
        let button = self.ui.locator(CHANGE_ANYWAY)?;
        if self.ui.click_if_present(&button, Duration::from_secs(5)).await? {
            self.ui.step("Clicked 'Change Anyway' button");
        }
        Ok(())
    }

    async fn try_switch_to_delivery(&self) -> ShopResult<()> {
        self.ride_out_pricing_popup().await?;
        self.ui.click_key(DELIVERY_TAB).await?;
        self.confirm_change_anyway().await?;
        self.ride_out_pricing_popup().await?;
        if self.is_delivery_page_displayed().await {
            Ok(())
        } else {
            Err(ShopError::assertion("Delivery method page not visible"))
        }
    }

    /// Switch the order to Delivery
    pub async fn switch_to_delivery_method(&self) -> ShopResult<()> {
        self.try_switch_to_delivery()
            .await
            .map_err(|e| ShopError::assertion(format!("Could not switch to Delivery tab: {e}")))
    }

    async fn try_switch_to_self_collect(&self) -> ShopResult<()> {
        self.ride_out_pricing_popup().await?;
        let tab = self.ui.locator(KEY_SELF_COLLECT_TAB)?;
        if let Err(e) = self.ui.click_within(&tab, Duration::from_secs(10)).await {
            self.ui.warn_step(format!("Attempt 1 to click Self Collect tab failed: {e}"));
            self.ui.click_within(&tab, Duration::from_secs(10)).await?;
        }
        self.confirm_change_anyway().await?;
        self.ride_out_pricing_popup().await?;
        if self.ui.is_displayed_within(&tab, Duration::from_secs(10)).await {
            Ok(())
        } else {
            Err(ShopError::assertion("Self Collect page not visible after clicking tab"))
        }
    }

    /// Switch the order to Self Collect, clicking the tab up to twice
    pub async fn switch_to_self_collect_method(&self) -> ShopResult<()> {
        self.try_switch_to_self_collect()
            .await
            .map_err(|e| ShopError::assertion(format!("Could not switch to Self Collect tab: {e}")))
    }
}

#[async_trait]
impl PageObject for FulfilmentPage {
    fn ui(&self) -> &Ui {
        &self.ui
    }

    fn page_name(&self) -> &'static str {
        "Fulfilment details"
    }

    fn load_timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    async fn is_displayed(&self) -> bool {
        self.ui.is_displayed_key(CART_TITLE).await
    }
}
