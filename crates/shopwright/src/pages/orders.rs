//! Account order listing and the card scanner that opens an order from it.
//!
//! Cards are scanned screen by screen. A card matches when it holds a text
//! containing the order type and a text containing one of the wanted
//! statuses; statuses earlier in the list win over later ones on the same
//! screen. When a screen has nothing, the list is swiped (at most
//! [`MAX_SCROLLS`] times or until no new cards appear) and then the next
//! page is tried.

use super::PageObject;
use crate::driver::ElementRef;
use crate::element::Ui;
use crate::locator::{xpath_literal, Locator};
use crate::result::{ShopError, ShopResult};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;

/// Orders page title, shared with the account page
pub(crate) const ORDERS_TITLE: &str = "ordersPageTitle.text";
const CARD: &str = "orders.card.uiautomator";
const VIEW_DETAILS: &str = "orders.viewDetails.text";
const RECORDS_PER_PAGE: &str = "orders.recordsPerPage.text";
const NEXT_PAGE: &str = "orders.pagination.next.text";

const DEFAULT_CARD: &str = "android.view.ViewGroup";
const DEFAULT_VIEW_DETAILS: &str = "View Details";
/// Swipes per page before moving on
pub const MAX_SCROLLS: u32 = 20;
const CARD_SETTLE_MS: u64 = 3000;

/// Order listing reached from the account page
#[derive(Debug, Clone)]
pub struct OrdersPage {
    ui: Ui,
}

impl OrdersPage {
    /// Page over `ui`
    #[must_use]
    pub const fn new(ui: Ui) -> Self {
        Self { ui }
    }

    /// Title within 30 s
    pub async fn is_orders_page_displayed(&self) -> bool {
        let shown = self
            .ui
            .is_displayed_key_within(ORDERS_TITLE, Duration::from_secs(30))
            .await;
        if shown {
            self.ui.step("Orders page displayed");
        } else {
            self.ui.error_step("Orders page title not visible");
        }
        shown
    }

    /// Open the first order of `order_type` in one of `statuses`
    pub async fn open_first_matching(&self, order_type: &str, statuses: &[String]) -> ShopResult<()> {
        OrderCardFinder::new(self.ui.clone())
            .open_first_matching(order_type, statuses)
            .await
    }
}

#[async_trait]
impl PageObject for OrdersPage {
    fn ui(&self) -> &Ui {
        &self.ui
    }

    fn page_name(&self) -> &'static str {
        "Orders page"
    }

    fn load_timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    async fn is_displayed(&self) -> bool {
        self.ui.is_displayed_key(ORDERS_TITLE).await
    }
}

/// Xpath for a descendant text containing `value`
pub(crate) fn contains_text(value: &str) -> Locator {
    Locator::xpath(format!(".//*[contains(@text,{})]", xpath_literal(value)))
}

/// Scans order cards and opens the first match
#[derive(Debug, Clone)]
pub struct OrderCardFinder {
    ui: Ui,
}

impl OrderCardFinder {
    /// Finder over `ui`
    #[must_use]
    pub const fn new(ui: Ui) -> Self {
        Self { ui }
    }

    fn card_locator(&self) -> ShopResult<Locator> {
        if self.ui.book().has(CARD) {
            self.ui.locator(CARD)
        } else {
            Ok(Locator::class_name(DEFAULT_CARD))
        }
    }

    fn view_details_locator(&self) -> ShopResult<Locator> {
        if self.ui.book().has(VIEW_DETAILS) {
            self.ui.locator(VIEW_DETAILS)
        } else {
            Ok(self.ui.text_contains(DEFAULT_VIEW_DETAILS))
        }
    }

    /// Show the largest page size when the app offers it
    async fn expand_page_size(&self) -> ShopResult<()> {
        if !self.ui.book().has(RECORDS_PER_PAGE) {
            return Ok(());
        }
        let records = self.ui.locator(RECORDS_PER_PAGE)?;
        if self.ui.click_if_present(&records, Duration::from_secs(5)).await? {
            self.ui.step("Expanded records per page");
            self.ui.delay(2000).await;
        }
        Ok(())
    }

    async fn card_has(&self, card: &ElementRef, value: &str) -> ShopResult<bool> {
        Ok(self
            .ui
            .driver()
            .find_child(card, &contains_text(value))
            .await?
            .is_some())
    }

    /// Best card on screen, recording every card seen. Returns the card
    /// and the status it matched.
    async fn best_on_screen(
        &self,
        cards: &Locator,
        order_type: &str,
        statuses: &[String],
        seen: &mut HashSet<String>,
    ) -> ShopResult<(Option<(ElementRef, String)>, usize)> {
        let mut typed = Vec::new();
        let mut fresh = 0;
        for card in self.ui.driver().find_elements(cards).await? {
            if seen.insert(card.id.clone()) {
                fresh += 1;
            }
            if self.card_has(&card, order_type).await? {
                typed.push(card);
            }
        }
        if statuses.is_empty() {
            return Ok((typed.into_iter().next().map(|c| (c, String::new())), fresh));
        }
        for status in statuses {
            for card in &typed {
                if self.card_has(card, status).await? {
                    return Ok((Some((card.clone(), status.clone())), fresh));
                }
            }
        }
        Ok((None, fresh))
    }

    async fn open_card(&self, card: &ElementRef) -> ShopResult<()> {
        let view = self.view_details_locator()?;
        let driver = self.ui.driver();
        if let Some(button) = driver.find_child(card, &view).await? {
            driver.click(&button).await?;
            return Ok(());
        }
        driver.click(card).await?;
        self.ui.delay(CARD_SETTLE_MS).await;
        if !self.ui.is_displayed(&view).await && !self.ui.scroll_until_visible(&view, 3).await? {
            return Err(ShopError::assertion("'View Details' not found for the order card"));
        }
        self.ui.click_within(&view, Duration::from_secs(5)).await
    }

    /// Next page of results when the control is shown and enabled
    async fn next_page(&self) -> ShopResult<bool> {
        if !self.ui.book().has(NEXT_PAGE) {
            return Ok(false);
        }
        let next = self.ui.locator(NEXT_PAGE)?;
        let Some(el) = self.ui.displayed_element(&next).await? else {
            return Ok(false);
        };
        let driver = self.ui.driver();
        if !driver.is_enabled(&el).await? {
            return Ok(false);
        }
        driver.click(&el).await?;
        self.ui.delay(2000).await;
        Ok(true)
    }

    /// Open the first order of `order_type` whose status is one of
    /// `statuses`, in priority order. An empty `statuses` accepts any.
    pub async fn open_first_matching(&self, order_type: &str, statuses: &[String]) -> ShopResult<()> {
        let cards = self.card_locator()?;
        self.expand_page_size().await?;
        let mut page = 1;
        loop {
            let mut seen = HashSet::new();
            for scroll in 0..=MAX_SCROLLS {
                let (found, fresh) = self.best_on_screen(&cards, order_type, statuses, &mut seen).await?;
                if let Some((card, status)) = found {
                    self.ui
                        .step(format!("Opening {order_type} order '{status}' (page {page}, scroll {scroll})"));
                    return self.open_card(&card).await;
                }
                if scroll == MAX_SCROLLS || (scroll > 0 && fresh == 0) {
                    break;
                }
                self.ui.swipe_up().await?;
                self.ui.delay(500).await;
            }
            if !self.next_page().await? {
                break;
            }
            page += 1;
        }
        let message = format!("No {order_type} order found with status {}", statuses.join(" / "));
        self.ui.attach_text("Order search", &message);
        Err(ShopError::assertion(message))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement, Platform, Transition};
    use crate::element::tests::ui_with;

    const CARD_SELECTOR: &str = "new UiSelector().resourceId(\"order-card\")";

    const KEYS: &[(&str, &str)] = &[
        (ORDERS_TITLE, "My Orders"),
        (CARD, CARD_SELECTOR),
        (NEXT_PAGE, "Next"),
    ];

    fn card() -> Locator {
        Locator::ui_automator(CARD_SELECTOR)
    }

    fn view() -> Locator {
        Locator::text_contains(Platform::Android, DEFAULT_VIEW_DETAILS)
    }

    fn add_card(mock: &MockDriver, texts: &[&str]) {
        mock.add(card(), MockElement::visible());
        for t in texts {
            mock.add_child(&card(), contains_text(t), MockElement::visible());
        }
        mock.add_child(&card(), view(), MockElement::visible());
    }

    fn statuses(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_priority_beats_list_order() {
        let mock = MockDriver::android();
        add_card(&mock, &["Self-Collect", "Processing"]);
        add_card(&mock, &["Delivery", "Submitted"]);
        add_card(&mock, &["Self-Collect", "Submitted"]);
        OrdersPage::new(ui_with(&mock, KEYS))
            .open_first_matching("Self-Collect", &statuses(&["Submitted", "Processing"]))
            .await
            .unwrap();
        // only the third card's button was pressed; the mock counts per locator
        assert_eq!(mock.clicks(&view()), 1);
        assert_eq!(mock.clicks(&card()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_match_fails_after_scrolling() {
        let mock = MockDriver::android();
        add_card(&mock, &["Delivery", "Completed"]);
        let err = OrdersPage::new(ui_with(&mock, KEYS))
            .open_first_matching("Delivery", &statuses(&["Submitted"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::AssertionFailed { .. }));
        let swipes = mock.commands().iter().filter(|c| c.starts_with("swipe")).count();
        // one swipe, then no new cards so the page is done
        assert_eq!(swipes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_moves_to_next_page() {
        let next = Locator::text(Platform::Android, "Next");
        let mock = MockDriver::android().with(next.clone(), MockElement::visible());
        add_card(&mock, &["Delivery", "Completed"]);
        mock.add(card(), MockElement::absent());
        mock.add_child(&card(), contains_text("Delivery"), MockElement::visible());
        mock.add_child(&card(), contains_text("Submitted"), MockElement::visible());
        mock.add_child(&card(), view(), MockElement::visible());
        mock.add_transition(&next, Transition::Show(card()));
        mock.add_transition(&next, Transition::Remove(next.clone()));
        OrdersPage::new(ui_with(&mock, KEYS))
            .open_first_matching("Delivery", &statuses(&["Submitted"]))
            .await
            .unwrap();
        assert_eq!(mock.clicks(&next), 1);
        assert_eq!(mock.clicks(&view()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_with_apostrophe_still_matches() {
        let mock = MockDriver::android();
        add_card(&mock, &["Delivery", "Completed"]);
        add_card(&mock, &["Delivery", "Driver's pickup"]);
        assert_eq!(
            contains_text("Driver's pickup").value,
            ".//*[contains(@text,\"Driver's pickup\")]"
        );
        OrdersPage::new(ui_with(&mock, KEYS))
            .open_first_matching("Delivery", &statuses(&["Driver's pickup"]))
            .await
            .unwrap();
        assert_eq!(mock.clicks(&view()), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_card_without_button_opens_details() {
        let mock = MockDriver::android()
            .with(card(), MockElement::visible())
            .on_click(&card(), Transition::Show(view()));
        mock.add_child(&card(), contains_text("Delivery"), MockElement::visible());
        OrderCardFinder::new(ui_with(&mock, KEYS))
            .open_first_matching("Delivery", &[])
            .await
            .unwrap();
        assert_eq!(mock.clicks(&card()), 1);
        assert_eq!(mock.clicks(&view()), 1);
    }
}
