//! Element helpers shared by every page object.
//!
//! [`Ui`] bundles the driver, the locator book, the configured timeouts
//! and the scenario trace. Every interaction waits explicitly: clicks wait
//! for the element to be displayed and enabled, and reads wait for it to be
//! displayed.

use crate::config::TimeoutSettings;
use crate::driver::{AppDriver, DriverError, ElementRef, Platform, Point};
use crate::keyboard;
use crate::locator::{Locator, LocatorBook};
use crate::result::{ShopError, ShopResult};
use crate::screenshot::ScreenshotStore;
use crate::trace::{StepLevel, TraceHandle};
use crate::wait::{WaitOptions, Waiter};
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Swipe duration used for scrolling
const SWIPE_DURATION: Duration = Duration::from_millis(600);

/// Parse Android bounds `"[x1,y1][x2,y2]"` into its centre point.
pub fn bounds_center(bounds: &str) -> ShopResult<Point> {
    let invalid = || ShopError::invalid("bounds", format!("malformed bounds '{bounds}'"));
    let numbers: Vec<i32> = bounds
        .split(|c: char| !(c.is_ascii_digit() || c == '-'))
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| invalid())?;
    match numbers.as_slice() {
        [x1, y1, x2, y2] if bounds.trim_start().starts_with('[') => {
            Ok(Point::new((x1 + x2) / 2, (y1 + y2) / 2))
        }
        _ => Err(invalid()),
    }
}

/// Stale or vanished elements read as "not there" rather than as errors.
fn absent_on_stale<T>(result: Result<T, DriverError>, absent: T) -> ShopResult<T> {
    match result {
        Ok(v) => Ok(v),
        Err(e) if e.is_stale() || e.is_no_such_element() => Ok(absent),
        Err(e) => Err(e.into()),
    }
}

/// Driver + locators + timeouts + step log
#[derive(Debug, Clone)]
pub struct Ui {
    driver: Arc<dyn AppDriver>,
    book: Arc<LocatorBook>,
    timeouts: TimeoutSettings,
    trace: Option<TraceHandle>,
    screenshots: ScreenshotStore,
}

impl Ui {
    /// Create helpers over a driver session
    #[must_use]
    pub fn new(driver: Arc<dyn AppDriver>, book: Arc<LocatorBook>, timeouts: TimeoutSettings) -> Self {
        Self {
            driver,
            book,
            timeouts,
            trace: None,
            screenshots: ScreenshotStore::new("target/shopwright/screenshots"),
        }
    }

    /// Record steps into `trace`
    #[must_use]
    pub fn with_trace(mut self, trace: TraceHandle) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Save screenshots into `store`
    #[must_use]
    pub fn with_screenshots(mut self, store: ScreenshotStore) -> Self {
        self.screenshots = store;
        self
    }

    /// The driver
    #[must_use]
    pub fn driver(&self) -> &dyn AppDriver {
        self.driver.as_ref()
    }

    /// Shared driver handle
    #[must_use]
    pub fn driver_handle(&self) -> Arc<dyn AppDriver> {
        Arc::clone(&self.driver)
    }

    /// Locator book
    #[must_use]
    pub fn book(&self) -> &LocatorBook {
        &self.book
    }

    /// Session platform
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.driver.platform()
    }

    /// Configured timeouts
    #[must_use]
    pub const fn timeouts(&self) -> &TimeoutSettings {
        &self.timeouts
    }

    /// Scenario trace, if any
    #[must_use]
    pub const fn trace(&self) -> Option<&TraceHandle> {
        self.trace.as_ref()
    }

    /// Screenshot store
    #[must_use]
    pub const fn screenshots(&self) -> &ScreenshotStore {
        &self.screenshots
    }

    /// Resolve a locator key
    pub fn locator(&self, key: &str) -> ShopResult<Locator> {
        self.book.get(key)
    }

    /// Exact-text locator
    #[must_use]
    pub fn text(&self, label: &str) -> Locator {
        self.book.text(label)
    }

    /// Contains-text locator
    #[must_use]
    pub fn text_contains(&self, partial: &str) -> Locator {
        self.book.text_contains(partial)
    }

    /// Waiter with the configured poll interval
    #[must_use]
    pub fn waiter(&self, timeout: Duration) -> Waiter {
        Waiter::new(
            WaitOptions::new()
                .with_timeout_duration(timeout)
                .with_poll_interval(self.timeouts.poll_ms),
        )
    }

    // ===== Step log =====

    fn record(&self, level: StepLevel, message: &str) {
        if let Some(trace) = &self.trace {
            trace
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record(level, message);
        }
    }

    /// Log a user-visible step
    pub fn step(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!(target: "shopwright::step", "{message}");
        self.record(StepLevel::Info, message);
    }

    /// Log a recoverable problem
    pub fn warn_step(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        warn!(target: "shopwright::step", "{message}");
        self.record(StepLevel::Warn, message);
    }

    /// Log a failure
    pub fn error_step(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::error!(target: "shopwright::step", "{message}");
        self.record(StepLevel::Error, message);
    }

    /// Attach a text body to the trace
    pub fn attach_text(&self, name: &str, text: &str) {
        if let Some(trace) = &self.trace {
            trace
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .attach_text(name, text);
        }
    }

    /// Screenshot attached to the trace; failures are logged only
    pub async fn screenshot(&self, label: &str, failed: bool) -> Option<PathBuf> {
        self.screenshots
            .capture_and_attach(Some(self.driver()), self.trace.as_ref(), label, failed)
            .await
    }

    // ===== Lookups =====

    /// First element matching `locator`, if present
    pub async fn find(&self, locator: &Locator) -> ShopResult<Option<ElementRef>> {
        Ok(self.driver.find_element(locator).await?)
    }

    /// First element matching `locator` if it is displayed
    pub async fn displayed_element(&self, locator: &Locator) -> ShopResult<Option<ElementRef>> {
        let Some(el) = self.find(locator).await? else {
            return Ok(None);
        };
        let shown = absent_on_stale(self.driver.is_displayed(&el).await, false)?;
        Ok(shown.then_some(el))
    }

    async fn clickable_element(&self, locator: &Locator) -> ShopResult<Option<ElementRef>> {
        let Some(el) = self.displayed_element(locator).await? else {
            return Ok(None);
        };
        let enabled = absent_on_stale(self.driver.is_enabled(&el).await, false)?;
        Ok(enabled.then_some(el))
    }

    /// Wait until `locator` is displayed
    pub async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> ShopResult<ElementRef> {
        self.waiter(timeout)
            .until(&format!("{locator} to be visible"), || async move {
                self.displayed_element(locator).await
            })
            .await
    }

    /// [`Ui::wait_visible`] for a locator key
    pub async fn wait_visible_key(&self, key: &str, timeout: Duration) -> ShopResult<ElementRef> {
        let locator = self.locator(key)?;
        self.wait_visible(&locator, timeout).await
    }

    /// Wait until `locator` is in the hierarchy (displayed or not)
    pub async fn wait_present(&self, locator: &Locator, timeout: Duration) -> ShopResult<ElementRef> {
        self.waiter(timeout)
            .until(&format!("{locator} to be present"), || async move {
                self.find(locator).await
            })
            .await
    }

    /// Wait until `locator` is displayed and enabled
    pub async fn wait_clickable(&self, locator: &Locator, timeout: Duration) -> ShopResult<ElementRef> {
        self.waiter(timeout)
            .until(&format!("{locator} to be clickable"), || async move {
                self.clickable_element(locator).await
            })
            .await
    }

    /// Wait until `locator` is gone or hidden
    pub async fn wait_invisible(&self, locator: &Locator, timeout: Duration) -> ShopResult<()> {
        self.waiter(timeout)
            .until_true(&format!("{locator} to disappear"), || async move {
                Ok(self.displayed_element(locator).await?.is_none())
            })
            .await
    }

    /// Index of the first of `locators` to become visible
    pub async fn wait_any_visible(&self, locators: &[Locator], timeout: Duration) -> Option<usize> {
        let found = self
            .waiter(timeout)
            .until("any of several elements to be visible", || async move {
                for (i, locator) in locators.iter().enumerate() {
                    if self.displayed_element(locator).await?.is_some() {
                        return Ok(Some(i));
                    }
                }
                Ok(None)
            })
            .await;
        found.ok()
    }

    /// Immediate visibility check; errors read as `false`
    pub async fn is_displayed(&self, locator: &Locator) -> bool {
        match self.displayed_element(locator).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                debug!(%locator, error = %e, "visibility check failed");
                false
            }
        }
    }

    /// [`Ui::is_displayed`] for a key; unresolvable keys read as `false`
    pub async fn is_displayed_key(&self, key: &str) -> bool {
        match self.locator(key) {
            Ok(locator) => self.is_displayed(&locator).await,
            Err(e) => {
                warn!(key, error = %e, "cannot resolve locator");
                false
            }
        }
    }

    /// Whether `locator` becomes visible within `timeout`
    pub async fn is_displayed_within(&self, locator: &Locator, timeout: Duration) -> bool {
        self.wait_visible(locator, timeout).await.is_ok()
    }

    /// [`Ui::is_displayed_within`] for a key
    pub async fn is_displayed_key_within(&self, key: &str, timeout: Duration) -> bool {
        match self.locator(key) {
            Ok(locator) => self.is_displayed_within(&locator, timeout).await,
            Err(e) => {
                warn!(key, error = %e, "cannot resolve locator");
                false
            }
        }
    }

    /// Whether `locator` appears in the hierarchy within `timeout`
    pub async fn is_present(&self, locator: &Locator, timeout: Duration) -> bool {
        self.wait_present(locator, timeout).await.is_ok()
    }

    /// [`Ui::is_present`] for a key
    pub async fn is_present_key(&self, key: &str, timeout: Duration) -> bool {
        match self.locator(key) {
            Ok(locator) => self.is_present(&locator, timeout).await,
            Err(e) => {
                warn!(key, error = %e, "cannot resolve locator");
                false
            }
        }
    }

    /// First matching element that is displayed and enabled
    pub async fn first_displayed_enabled(&self, locator: &Locator) -> ShopResult<Option<ElementRef>> {
        for el in self.driver.find_elements(locator).await? {
            let shown = absent_on_stale(self.driver.is_displayed(&el).await, false)?;
            if shown && absent_on_stale(self.driver.is_enabled(&el).await, false)? {
                return Ok(Some(el));
            }
        }
        Ok(None)
    }

    /// Wait for a displayed descendant of `parent`
    pub async fn wait_visible_in(
        &self,
        parent: &ElementRef,
        locator: &Locator,
        timeout: Duration,
    ) -> ShopResult<ElementRef> {
        self.waiter(timeout)
            .until(&format!("{locator} inside {}", parent.locator), || async move {
                let Some(child) = self.driver.find_child(parent, locator).await? else {
                    return Ok(None);
                };
                let shown = absent_on_stale(self.driver.is_displayed(&child).await, false)?;
                Ok(shown.then_some(child))
            })
            .await
    }

    // ===== Actions =====

    /// Wait (default timeout) until clickable, then click
    pub async fn click(&self, locator: &Locator) -> ShopResult<()> {
        self.click_within(locator, self.timeouts.default_wait()).await
    }

    /// Wait up to `timeout` until clickable, then click
    pub async fn click_within(&self, locator: &Locator, timeout: Duration) -> ShopResult<()> {
        let el = self.wait_clickable(locator, timeout).await?;
        self.driver.click(&el).await?;
        debug!(%locator, "clicked");
        Ok(())
    }

    /// [`Ui::click`] for a key
    pub async fn click_key(&self, key: &str) -> ShopResult<()> {
        let locator = self.locator(key)?;
        self.click(&locator).await
    }

    /// Click an element if it shows up within `timeout`; returns whether it did
    pub async fn click_if_present(&self, locator: &Locator, timeout: Duration) -> ShopResult<bool> {
        match self.wait_clickable(locator, timeout).await {
            Ok(el) => {
                self.driver.click(&el).await?;
                Ok(true)
            }
            Err(e) if e.is_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Click, clear and type
    pub async fn type_into(&self, locator: &Locator, text: &str) -> ShopResult<()> {
        let el = self.wait_clickable(locator, self.timeouts.default_wait()).await?;
        self.driver.click(&el).await?;
        self.driver.clear(&el).await?;
        self.driver.send_keys(&el, text).await?;
        Ok(())
    }

    /// Visible text of `locator`
    pub async fn text_of(&self, locator: &Locator) -> ShopResult<String> {
        let el = self.wait_visible(locator, self.timeouts.default_wait()).await?;
        Ok(self.driver.text(&el).await?)
    }

    /// Attribute of a displayed element
    pub async fn attribute_of(&self, locator: &Locator, name: &str) -> ShopResult<Option<String>> {
        let el = self.wait_visible(locator, self.timeouts.default_wait()).await?;
        Ok(self.driver.attribute(&el, name).await?)
    }

    /// Pause
    pub async fn delay(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    // ===== Gestures =====

    /// Scroll until text containing `text` is on screen
    pub async fn scroll_to_text(&self, text: &str) -> bool {
        let result = match self.platform() {
            Platform::Android => {
                let locator = Locator::scrollable_text(Platform::Android, text);
                self.find(&locator).await.map(|found| found.is_some())
            }
            Platform::Ios => {
                let predicate = format!("label CONTAINS '{text}'");
                match self
                    .driver
                    .execute(
                        "mobile: scroll",
                        json!({ "direction": "down", "predicateString": predicate }),
                    )
                    .await
                {
                    Ok(_) => Ok(self.is_displayed(&self.text_contains(text)).await),
                    Err(e) => Err(e.into()),
                }
            }
        };
        match result {
            Ok(found) => found,
            Err(e) => {
                debug!(text, error = %e, "scroll to text failed");
                false
            }
        }
    }

    /// One swipe from 75% to 25% of the screen height
    pub async fn swipe_up(&self) -> ShopResult<()> {
        let window = self.driver.window_rect().await?;
        let x = window.x + window.width / 2;
        let from = Point::new(x, window.y + window.height * 3 / 4);
        let to = Point::new(x, window.y + window.height / 4);
        self.driver.swipe(from, to, SWIPE_DURATION).await?;
        Ok(())
    }

    /// Swipe up until `locator` is displayed, at most `max_swipes` times
    pub async fn scroll_until_visible(&self, locator: &Locator, max_swipes: u32) -> ShopResult<bool> {
        for _ in 0..=max_swipes {
            if self.is_displayed(locator).await {
                return Ok(true);
            }
            self.swipe_up().await?;
            self.delay(300).await;
        }
        Ok(self.is_displayed(locator).await)
    }

    /// Tap the centre of Android bounds `"[x1,y1][x2,y2]"`
    pub async fn tap_bounds(&self, bounds: &str) -> ShopResult<()> {
        let point = bounds_center(bounds)?;
        self.driver.tap(point).await?;
        debug!(bounds, x = point.x, y = point.y, "tapped bounds");
        Ok(())
    }

    /// Tap `offset_y` pixels below the bottom edge of `locator`, centred
    pub async fn tap_below(&self, locator: &Locator, offset_y: i32) -> ShopResult<()> {
        let el = self.wait_visible(locator, self.timeouts.default_wait()).await?;
        let rect = self.driver.rect(&el).await?;
        let point = Point::new(rect.center().x, rect.bottom() + offset_y);
        self.driver.tap(point).await?;
        Ok(())
    }

    // ===== Keyboard =====

    /// Type as Android key codes into the focused input
    pub async fn type_keycodes(&self, text: &str) -> ShopResult<()> {
        keyboard::type_keycodes(self.driver(), text).await
    }

    /// Clear the focused input with MOVE_END + DEL presses
    pub async fn clear_keycodes(&self, count: usize) -> ShopResult<()> {
        keyboard::clear_keycodes(self.driver(), count).await
    }

    /// Hide the soft keyboard; failures are ignored
    pub async fn hide_keyboard(&self) {
        keyboard::hide_keyboard(self.driver()).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
pub(crate) mod tests {
    use super::*;
    use crate::driver::mock::{MockElement, Transition};
    use crate::driver::{MockDriver, Rect};
    use crate::trace::ScenarioTrace;
    use std::collections::BTreeMap;

    /// Fast timeouts for tests
    pub(crate) fn fast_timeouts() -> TimeoutSettings {
        TimeoutSettings {
            default_ms: 200,
            short_ms: 50,
            long_ms: 300,
            poll_ms: 5,
        }
    }

    /// Ui over `mock` with the given locator entries
    pub(crate) fn ui_with(mock: &MockDriver, entries: &[(&str, &str)]) -> Ui {
        let map: BTreeMap<String, String> = entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let book = LocatorBook::new(map, mock.platform());
        Ui::new(Arc::new(mock.clone()), Arc::new(book), fast_timeouts())
    }

    mod bounds_tests {
        use super::*;

        #[test]
        fn test_bounds_center() {
            assert_eq!(bounds_center("[0,100][200,300]").unwrap(), Point::new(100, 200));
            assert!(bounds_center("0,100,200,300").is_err());
            assert!(bounds_center("[0,100][200]").is_err());
            assert!(bounds_center("").is_err());
        }
    }

    mod wait_tests {
        use super::*;

        #[tokio::test]
        async fn test_hidden_element_is_not_visible() {
            let loc = Locator::id("banner");
            let mock = MockDriver::android().with(loc.clone(), MockElement::hidden());
            let ui = ui_with(&mock, &[]);
            assert!(!ui.is_displayed(&loc).await);
            assert!(ui.is_present(&loc, Duration::from_millis(20)).await);
            assert!(ui.wait_visible(&loc, Duration::from_millis(20)).await.unwrap_err().is_timeout());
        }

        #[tokio::test]
        async fn test_disabled_element_is_not_clickable() {
            let loc = Locator::id("confirm");
            let mock = MockDriver::android().with(loc.clone(), MockElement::visible().disabled());
            let ui = ui_with(&mock, &[]);
            assert!(ui.click(&loc).await.unwrap_err().is_timeout());
            assert_eq!(mock.clicks(&loc), 0);
        }

        #[tokio::test]
        async fn test_wait_invisible_after_removal() {
            let loc = Locator::id("loader");
            let mock = MockDriver::android().with(loc.clone(), MockElement::visible());
            let ui = ui_with(&mock, &[]);
            mock.apply(&Transition::Remove(loc.clone()));
            ui.wait_invisible(&loc, Duration::from_millis(50)).await.unwrap();
        }

        #[tokio::test]
        async fn test_wait_any_visible_picks_index() {
            let a = Locator::id("a");
            let b = Locator::id("b");
            let mock = MockDriver::android().with(b.clone(), MockElement::visible());
            let ui = ui_with(&mock, &[]);
            assert_eq!(ui.wait_any_visible(&[a.clone(), b], Duration::from_millis(20)).await, Some(1));
            assert_eq!(ui.wait_any_visible(&[a], Duration::from_millis(20)).await, None);
        }

        #[tokio::test]
        async fn test_key_lookups() {
            let mock = MockDriver::android().with(Locator::id("com.shop:id/ok"), MockElement::visible());
            let ui = ui_with(&mock, &[("dialog.ok.id", "com.shop:id/ok")]);
            assert!(ui.is_displayed_key("dialog.ok.id").await);
            assert!(!ui.is_displayed_key("dialog.missing.id").await);
            ui.click_key("dialog.ok.id").await.unwrap();
            assert!(matches!(
                ui.click_key("dialog.missing.id").await,
                Err(ShopError::MissingKey { .. })
            ));
        }
    }

    mod action_tests {
        use super::*;

        #[tokio::test]
        async fn test_type_into_replaces_text() {
            let loc = Locator::id("phone");
            let mock = MockDriver::android().with(loc.clone(), MockElement::visible().with_text("old"));
            let ui = ui_with(&mock, &[]);
            ui.type_into(&loc, "712345678").await.unwrap();
            assert_eq!(mock.text_of(&loc).as_deref(), Some("712345678"));
        }

        #[tokio::test]
        async fn test_first_displayed_enabled_skips_hidden() {
            let loc = Locator::xpath("//input");
            let mock = MockDriver::android()
                .with(loc.clone(), MockElement::hidden())
                .with(loc.clone(), MockElement::visible().disabled())
                .with(loc.clone(), MockElement::visible().with_text("third"));
            let ui = ui_with(&mock, &[]);
            let el = ui.first_displayed_enabled(&loc).await.unwrap().unwrap();
            assert_eq!(ui.driver().text(&el).await.unwrap(), "third");
        }

        #[tokio::test]
        async fn test_tap_below_and_bounds() {
            let loc = Locator::id("label");
            let mock = MockDriver::android()
                .with(loc.clone(), MockElement::visible().with_rect(Rect::new(0, 100, 200, 50)));
            let ui = ui_with(&mock, &[]);
            ui.tap_below(&loc, 40).await.unwrap();
            ui.tap_bounds("[10,10][30,50]").await.unwrap();
            assert_eq!(mock.commands(), vec!["tap 100,190", "tap 20,30"]);
        }

        #[tokio::test]
        async fn test_scroll_until_visible_swipes() {
            let loc = Locator::id("footer");
            let mock = MockDriver::android();
            let ui = ui_with(&mock, &[]);
            assert!(!ui.scroll_until_visible(&loc, 2).await.unwrap());
            let swipes = mock.commands().iter().filter(|c| c.starts_with("swipe")).count();
            assert_eq!(swipes, 3);
        }

        #[tokio::test]
        async fn test_steps_go_to_trace() {
            let mock = MockDriver::android();
            let trace = ScenarioTrace::start("s", "f", vec![]).shared();
            let ui = ui_with(&mock, &[]).with_trace(Arc::clone(&trace));
            ui.step("Opened cart");
            ui.warn_step("Toast lingered");
            ui.attach_text("note", "body");
            let trace = trace.lock().unwrap();
            assert_eq!(trace.steps.len(), 2);
            assert_eq!(trace.attachments.len(), 1);
        }
    }
}
