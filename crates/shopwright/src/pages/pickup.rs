//! Pickup location dropdown on the product page.

use crate::element::Ui;
use crate::result::{ShopError, ShopResult};
use std::time::Duration;

const DROPDOWN: &str = "pickup.dropdown.accessibilityId";
const ADD_TO_CART: &str = "addToCart.button.accessibilityId";
const PICKUP_ERROR: &str = "Please select your pickup location";
const MAX_ATTEMPTS: u32 = 3;
/// Offset from the dropdown to its first option
const FIRST_OPTION_OFFSET: i32 = 100;

/// Pickup location picker
#[derive(Debug, Clone)]
pub struct PickupLocationPage {
    ui: Ui,
    option: Option<String>,
}

impl PickupLocationPage {
    /// Picker that chooses the first option by position
    #[must_use]
    pub const fn new(ui: Ui) -> Self {
        Self { ui, option: None }
    }

    /// Choose the option with this label instead
    #[must_use]
    pub fn with_option(mut self, label: Option<String>) -> Self {
        self.option = label.filter(|l| !l.trim().is_empty());
        self
    }

    async fn open_dropdown_and_choose(&self) -> ShopResult<()> {
        let dropdown = self.ui.locator(DROPDOWN)?;
        self.ui.click(&dropdown).await?;
        self.ui.delay(500).await;
        match &self.option {
            Some(label) => self.ui.click(&self.ui.text(label)).await,
            None => self.ui.tap_below(&dropdown, FIRST_OPTION_OFFSET).await,
        }
    }

    async fn error_visible(&self) -> bool {
        self.ui.is_displayed(&self.ui.text_contains(PICKUP_ERROR)).await
    }

    async fn still_unselected(&self) -> bool {
        self.ui.is_displayed_key(DROPDOWN).await
    }

    /// Choose a location and add to cart, retrying while the app still
    /// complains that no location is selected
    pub async fn select_valid_pickup_location(&self) -> ShopResult<()> {
        let add = self.ui.locator(ADD_TO_CART)?;
        for attempt in 1..=MAX_ATTEMPTS {
            self.ui.step(format!("Selecting pickup location (attempt {attempt})"));
            self.open_dropdown_and_choose().await?;
            self.ui.click(&add).await?;
            tokio::time::sleep(Duration::from_secs(1)).await;
            if !self.error_visible().await && !self.still_unselected().await {
                self.ui.step("Pickup location selection complete");
                return Ok(());
            }
            self.ui.warn_step("Pickup location not accepted, retrying");
        }
        let message = "Pickup location was not selected. 'Select a location' still visible";
        self.ui.attach_text("Pickup Location Error", message);
        Err(ShopError::assertion(message))
    }
}
