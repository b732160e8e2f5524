//! Bank transfer section of the payments page.
//!
//! The reference input only reacts to hardware key events, and the proof of
//! payment goes through the Android document picker, whose layout differs
//! between OS versions. Image selection therefore tries several strategies
//! in turn.

use crate::config::PaymentSettings;
use crate::element::Ui;
use crate::locator::{xpath_literal, Locator};
use crate::permissions::PermissionHelper;
use crate::result::{ShopError, ShopResult};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::time::Duration;

const BANK_DROPDOWN: &str = "payment.bank.dropdown.accessibilityId";
const REFERENCE_LABEL: &str = "payment.referenceField.text";
/// Reference input, read back by the payments page
pub(crate) const REFERENCE_INPUT: &str = "payment.referenceField.xpath";
const UPLOAD_BUTTON: &str = "bankTransferUploadBtn.text";
const UPLOAD_IMAGE: &str = "uploadImageOption.text";
/// Confirm button, shared with the payments page
pub(crate) const CONFIRM_PAYMENT: &str = "payment.confirmPaymentBtn.accessibilityId";
const HEADS_UP_OK: &str = "headsUpNotificationOkBtn.id";

/// DEL presses used to empty the reference input
const REFERENCE_CLEAR_PRESSES: usize = 12;

const PICKER_TABS: [&str; 2] = ["Albums", "Collections"];
const SHOW_ROOTS: &str = "Show roots";
const DOCUMENT_THUMBNAILS: [&str; 2] = [
    "com.google.android.documentsui:id/icon_thumb",
    "com.android.documentsui:id/icon_thumb",
];
const GRID_IMAGE: &str = "new UiSelector().className(\"android.view.View\").instance(9)";
const CLICKABLE_IMAGES: &str =
    "//android.widget.ImageView[@clickable='true'] | //android.view.ViewGroup[@clickable='true']";

/// Ways of choosing an image in the document picker, in the order tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageStrategy {
    /// Document thumbnails, preferring ones described as an image
    Thumbnail,
    /// Fixed grid position of the photo picker
    Grid,
    /// First clickable image or group
    Clickable,
    /// Bounds of the first displayed element
    Bounds,
}

impl ImageStrategy {
    const ALL: [Self; 4] = [Self::Thumbnail, Self::Grid, Self::Clickable, Self::Bounds];
}

/// Pick one of `options` at random
pub fn pick_bank<R: Rng + ?Sized>(options: &[String], rng: &mut R) -> ShopResult<String> {
    let candidates: Vec<&str> = options
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .collect();
    candidates
        .choose(rng)
        .map(|bank| (*bank).to_string())
        .ok_or_else(|| ShopError::config("payment.bank_options is empty"))
}

/// XPath matching `text` case-insensitively
fn folder_xpath(folder: &str) -> Locator {
    Locator::xpath(format!(
        "//*[contains(translate(@text, 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), {})]",
        xpath_literal(&folder.to_lowercase())
    ))
}

/// Bank transfer form
#[derive(Debug, Clone)]
pub struct BankTransferComponent {
    ui: Ui,
    payment: PaymentSettings,
}

impl BankTransferComponent {
    /// Component over `ui` using the bank list and labels in `payment`
    #[must_use]
    pub const fn new(ui: Ui, payment: PaymentSettings) -> Self {
        Self { ui, payment }
    }

    /// Payment settings in use
    #[must_use]
    pub const fn payment(&self) -> &PaymentSettings {
        &self.payment
    }

    /// Choose a random bank from the configured options
    pub async fn select_random_bank(&self) -> ShopResult<String> {
        let bank = pick_bank(&self.payment.bank_options, &mut rand::rng())?;
        self.select_bank(&bank).await?;
        Ok(bank)
    }

    /// Open the dropdown and choose `bank`
    pub async fn select_bank(&self, bank: &str) -> ShopResult<()> {
        let dropdown = self.ui.locator(BANK_DROPDOWN)?;
        self.ui.click_within(&dropdown, Duration::from_secs(10)).await?;
        self.ui.step(format!("Selecting bank: {bank}"));
        self.ui.scroll_to_text(bank).await;
        let option = Locator::xpath(format!("//*[@text={}]", xpath_literal(bank)));
        let el = self.ui.wait_visible(&option, Duration::from_secs(10)).await?;
        self.ui.driver().click(&el).await?;
        self.ui.step(format!("Selected bank: {bank}"));
        Ok(())
    }

    fn confirm_label(&self) -> Option<&str> {
        self.ui.book().raw(CONFIRM_PAYMENT)
    }

    async fn try_expand(&self) -> ShopResult<()> {
        let label = self.payment.method_label.as_str();
        self.ui.scroll_to_text(label).await;
        if self.ui.is_displayed_key(REFERENCE_LABEL).await {
            self.ui.step("Bank Transfer section already visible");
            return Ok(());
        }
        self.ui.step("Expanding Bank Transfer section");
        self.ui.click(&self.ui.text(label)).await?;
        self.ui.delay(1000).await;
        PermissionHelper::new(self.ui.clone()).allow_all_if_present().await;
        let heads_up = self.ui.locator(HEADS_UP_OK)?;
        if self.ui.click_if_present(&heads_up, Duration::from_secs(5)).await? {
            self.ui.step("Dismissed heads-up toast");
        }
        if let Some(confirm) = self.confirm_label() {
            self.ui.scroll_to_text(confirm).await;
        }
        self.ui.step("Expanded Bank Transfer section");
        Ok(())
    }

    /// Open the bank transfer section unless the reference input already shows
    pub async fn expand_section_if_needed(&self) -> ShopResult<()> {
        self.try_expand()
            .await
            .map_err(|e| ShopError::assertion(format!("Failed to expand Bank Transfer section: {e}")))
    }

    async fn type_reference(&self, reference: &str) -> ShopResult<()> {
        if let Some(label) = self.ui.book().raw(REFERENCE_LABEL) {
            self.ui.scroll_to_text(label).await;
        }
        let inputs = self.ui.locator(REFERENCE_INPUT)?;
        let input = self
            .ui
            .first_displayed_enabled(&inputs)
            .await?
            .ok_or_else(|| ShopError::ElementNotFound {
                locator: format!("visible and enabled {inputs}"),
            })?;
        let driver = self.ui.driver();
        driver.click(&input).await?;
        self.ui.delay(500).await;
        self.ui.clear_keycodes(REFERENCE_CLEAR_PRESSES).await?;
        self.ui.type_keycodes(reference).await?;
        self.ui.delay(500).await;
        self.ui.hide_keyboard().await;

        let actual = driver.attribute(&input, "text").await?.unwrap_or_default();
        if !actual.eq_ignore_ascii_case(reference) {
            self.ui.screenshot("RefNumber_Mismatch", true).await;
            return Err(ShopError::assertion(format!(
                "Input verification failed: expected '{reference}', but found '{actual}'"
            )));
        }
        self.ui.screenshot("RefNumber_Entry_Success", false).await;
        self.ui.step(format!("Entered reference number: {reference}"));
        Ok(())
    }

    /// Type `reference` key by key and read it back. An empty reference is
    /// skipped with a warning.
    pub async fn enter_reference_number(&self, reference: &str) -> ShopResult<()> {
        if reference.trim().is_empty() {
            self.ui.warn_step("Reference number is empty. Skipping input.");
            return Ok(());
        }
        match self.type_reference(reference).await {
            Ok(()) => Ok(()),
            Err(e @ ShopError::AssertionFailed { .. }) => Err(e),
            Err(e) => {
                self.ui.screenshot("RefNumber_Entry_Error", true).await;
                Err(ShopError::assertion(format!("Failed to enter reference number: {e}")))
            }
        }
    }

    async fn open_folder(&self, folder: &str) -> ShopResult<()> {
        for tab in PICKER_TABS {
            let locator = Locator::xpath(format!("//android.widget.TextView[@text={}]", xpath_literal(tab)));
            if let Some(el) = self.ui.find(&locator).await? {
                self.ui.driver().click(&el).await?;
                self.ui.step(format!("Switched to folder tab: {tab}"));
                break;
            }
        }
        if let Some(el) = self.ui.find(&Locator::accessibility_id(SHOW_ROOTS)).await? {
            self.ui.driver().click(&el).await?;
            self.ui.step("Clicked 'Show roots'");
        }
        for locator in [folder_xpath(folder), Locator::accessibility_id(folder)] {
            if let Some(el) = self.ui.find(&locator).await? {
                self.ui.driver().click(&el).await?;
                self.ui.step(format!("Opened folder: {folder}"));
                return Ok(());
            }
        }
        Err(ShopError::ElementNotFound {
            locator: format!("folder {folder}"),
        })
    }

    async fn pick_thumbnail(&self) -> ShopResult<bool> {
        let driver = self.ui.driver();
        for id in DOCUMENT_THUMBNAILS {
            let mut fallback = None;
            for thumb in driver.find_elements(&Locator::id(id)).await? {
                if !driver.is_displayed(&thumb).await? {
                    continue;
                }
                let desc = driver.attribute(&thumb, "content-desc").await?.unwrap_or_default();
                if desc.to_lowercase().contains("image") {
                    driver.click(&thumb).await?;
                    self.ui.step(format!("Clicked thumbnail: {desc}"));
                    return Ok(true);
                }
                fallback.get_or_insert(thumb);
            }
            if let Some(thumb) = fallback {
                driver.click(&thumb).await?;
                self.ui.step("Clicked visible thumbnail");
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn pick_grid_image(&self) -> ShopResult<bool> {
        match self.ui.find(&Locator::ui_automator(GRID_IMAGE)).await? {
            Some(el) => {
                self.ui.driver().click(&el).await?;
                self.ui.step("Image clicked via grid position");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pick_clickable_image(&self) -> ShopResult<bool> {
        match self.ui.find(&Locator::xpath(CLICKABLE_IMAGES)).await? {
            Some(el) => {
                self.ui.driver().click(&el).await?;
                self.ui.step("Image clicked via clickable element");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn tap_first_displayed(&self) -> ShopResult<bool> {
        let driver = self.ui.driver();
        for el in driver.find_elements(&Locator::xpath("//*")).await? {
            if !driver.is_displayed(&el).await? {
                continue;
            }
            if let Some(bounds) = driver.attribute(&el, "bounds").await? {
                self.ui.tap_bounds(&bounds).await?;
                self.ui.step(format!("Tapped element via bounds: {bounds}"));
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Try each image selection strategy until one works
    async fn select_image(&self) -> bool {
        for strategy in ImageStrategy::ALL {
            let result = match strategy {
                ImageStrategy::Thumbnail => self.pick_thumbnail().await,
                ImageStrategy::Grid => self.pick_grid_image().await,
                ImageStrategy::Clickable => self.pick_clickable_image().await,
                ImageStrategy::Bounds => self.tap_first_displayed().await,
            };
            match result {
                Ok(true) => return true,
                Ok(false) => self.ui.warn_step(format!("No image via {strategy:?} strategy")),
                Err(e) => self.ui.warn_step(format!("Image {strategy:?} strategy failed: {e}")),
            }
        }
        false
    }

    async fn try_upload(&self, folder: &str, wait: Duration) -> ShopResult<()> {
        let upload = self.ui.locator(UPLOAD_BUTTON)?;
        self.ui.click_within(&upload, Duration::from_secs(15)).await?;
        self.ui.step("Clicked Upload button");
        let image = self.ui.locator(UPLOAD_IMAGE)?;
        self.ui.click_within(&image, Duration::from_secs(15)).await?;
        self.ui.step("Selected 'Upload Image'");
        PermissionHelper::new(self.ui.clone()).allow_all_if_present().await;
        self.open_folder(folder).await?;
        tokio::time::sleep(wait).await;
        if self.select_image().await {
            Ok(())
        } else {
            Err(ShopError::assertion(
                "No selectable image found in the folder, all strategies failed",
            ))
        }
    }

    /// Attach an image from `folder` through the document picker
    pub async fn upload_proof_of_payment(&self, folder: &str, wait: Duration) -> ShopResult<()> {
        match self.try_upload(folder, wait).await {
            Ok(()) => {
                self.ui.step(format!("Uploaded proof of payment from {folder}"));
                Ok(())
            }
            Err(e) => {
                self.ui.screenshot("UploadProofError", true).await;
                Err(ShopError::assertion(format!("Failed to upload image: {e}")))
            }
        }
    }

    /// Click Confirm Payment when it is enabled
    pub async fn confirm_payment_if_enabled(&self) -> bool {
        let Ok(confirm) = self.ui.locator(CONFIRM_PAYMENT) else {
            return false;
        };
        let el = match self.ui.wait_visible(&confirm, Duration::from_secs(15)).await {
            Ok(el) => el,
            Err(e) => {
                self.ui.error_step(format!("Confirm Payment failed: {e}"));
                return false;
            }
        };
        if let Some(label) = self.confirm_label() {
            self.ui.scroll_to_text(label).await;
        }
        let driver = self.ui.driver();
        let enabled = driver
            .attribute(&el, "enabled")
            .await
            .ok()
            .flatten()
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        if !enabled {
            self.ui.warn_step("Confirm Payment button is disabled");
            return false;
        }
        match driver.click(&el).await {
            Ok(()) => {
                self.ui.step("Clicked Confirm Payment");
                true
            }
            Err(e) => {
                self.ui.error_step(format!("Confirm Payment failed: {e}"));
                false
            }
        }
    }
}
