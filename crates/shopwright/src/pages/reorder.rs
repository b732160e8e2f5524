//! "Order again" list of completed orders.

use super::PageObject;
use crate::element::Ui;
use crate::result::ShopResult;
use async_trait::async_trait;
use std::time::Duration;

const TITLE: &str = "orderAgainTitle.text";
const COMPLETED_STATUS: &str = "completedStatus.text";
const REORDER_BUTTON: &str = "reorderBtn.automator";

/// Completed orders that can be ordered again
#[derive(Debug, Clone)]
pub struct ReorderPage {
    ui: Ui,
}

impl ReorderPage {
    /// Page over `ui`
    #[must_use]
    pub const fn new(ui: Ui) -> Self {
        Self { ui }
    }

    /// Title plus a completed order or its reorder button
    pub async fn is_order_again_page_displayed(&self) -> bool {
        if !self
            .ui
            .is_displayed_key_within(TITLE, Duration::from_secs(15))
            .await
        {
            self.ui.error_step("Order again title not visible");
            return false;
        }
        let (Ok(completed), Ok(reorder)) = (self.ui.locator(COMPLETED_STATUS), self.ui.locator(REORDER_BUTTON)) else {
            return false;
        };
        self.ui
            .wait_any_visible(&[completed, reorder], Duration::from_secs(10))
            .await
            .is_some()
    }

    /// Reorder the most recent completed order
    pub async fn click_reorder(&self) -> ShopResult<()> {
        let button = self.ui.locator(REORDER_BUTTON)?;
        self.ui.click_within(&button, Duration::from_secs(10)).await?;
        self.ui.step("Clicked 'Reorder'");
        Ok(())
    }
}

#[async_trait]
impl PageObject for ReorderPage {
    fn ui(&self) -> &Ui {
        &self.ui
    }

    fn page_name(&self) -> &'static str {
        "Order again"
    }

    async fn is_displayed(&self) -> bool {
        self.ui.is_displayed_key(TITLE).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement, Platform};
    use crate::element::tests::ui_with;
    use crate::locator::Locator;

    const BUTTON: &str = "new UiSelector().text(\"Reorder\").instance(0)";

    const KEYS: &[(&str, &str)] = &[
        (TITLE, "Order Again"),
        (COMPLETED_STATUS, "Completed"),
        (REORDER_BUTTON, BUTTON),
    ];

    #[tokio::test]
    async fn test_page_with_reorder_button() {
        let button = Locator::ui_automator(BUTTON);
        let mock = MockDriver::android()
            .with(Locator::text(Platform::Android, "Order Again"), MockElement::visible())
            .with(button.clone(), MockElement::visible());
        let page = ReorderPage::new(ui_with(&mock, KEYS));
        assert!(page.is_order_again_page_displayed().await);
        page.click_reorder().await.unwrap();
        assert_eq!(mock.clicks(&button), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_list_is_not_the_page() {
        let mock = MockDriver::android()
            .with(Locator::text(Platform::Android, "Order Again"), MockElement::visible());
        assert!(!ReorderPage::new(ui_with(&mock, KEYS)).is_order_again_page_displayed().await);
    }
}
