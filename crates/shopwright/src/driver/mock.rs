//! In-memory [`AppDriver`] for testing page objects without a device.
//!
//! Elements are registered against the exact [`Locator`] the page objects
//! will ask for. Clicks can trigger [`Transition`]s so a test can script
//! screen changes (a button that reveals the next page, a loader that goes
//! away).
//!
//! ```ignore
//! let mock = MockDriver::android()
//!     .with(Locator::id("continue"), MockElement::visible())
//!     .on_click(&Locator::id("continue"), Transition::Show(Locator::id("otp")));
//! ```

use super::{AppDriver, DriverError, DriverResult, ElementRef, Platform, Point, Rect};
use crate::keyboard::{char_for_keycode, KEYCODE_DEL};
use crate::locator::Locator;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// PNG signature returned as the screenshot body
pub const MOCK_PNG: &[u8] = &[137, 80, 78, 71, 13, 10, 26, 10];

/// Screen change applied when an element is clicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Make elements visible, creating one if none is registered
    Show(Locator),
    /// Mark elements as not displayed
    Hide(Locator),
    /// Remove elements from the hierarchy
    Remove(Locator),
    /// Replace element text
    SetText(Locator, String),
    /// Set an attribute
    SetAttribute(Locator, String, String),
}

/// One element of the fake hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Part of the hierarchy (findable)
    pub present: bool,
    /// Displayed on screen
    pub displayed: bool,
    /// Enabled for input
    pub enabled: bool,
    /// Visible text
    pub text: String,
    /// Attributes (`text`, `enabled`, `bounds`, ...)
    pub attributes: HashMap<String, String>,
    /// Bounds
    pub rect: Rect,
}

impl Default for MockElement {
    fn default() -> Self {
        Self::visible()
    }
}

impl MockElement {
    /// Present, displayed and enabled
    #[must_use]
    pub fn visible() -> Self {
        Self {
            present: true,
            displayed: true,
            enabled: true,
            text: String::new(),
            attributes: HashMap::new(),
            rect: Rect::new(0, 0, 100, 40),
        }
    }

    /// Present but not displayed
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            displayed: false,
            ..Self::visible()
        }
    }

    /// Registered but absent until a [`Transition::Show`]
    #[must_use]
    pub fn absent() -> Self {
        Self {
            present: false,
            displayed: false,
            ..Self::visible()
        }
    }

    /// Set the text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Disable the element
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set the bounds
    #[must_use]
    pub const fn with_rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }
}

#[derive(Debug, Default)]
struct Entry {
    locator: Option<Locator>,
    element: Option<MockElement>,
    parent: Option<usize>,
}

#[derive(Debug)]
struct MockState {
    entries: Vec<Entry>,
    transitions: HashMap<Locator, Vec<Transition>>,
    clicks: HashMap<Locator, usize>,
    focused: Option<usize>,
    commands: Vec<String>,
    keycodes: Vec<u32>,
    alive: bool,
    window: Rect,
}

impl MockState {
    fn indices(&self, locator: &Locator) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.locator.as_ref() == Some(locator))
            .map(|(i, _)| i)
            .collect()
    }

    fn present(&self, locator: &Locator, parent: Option<usize>) -> Vec<usize> {
        self.indices(locator)
            .into_iter()
            .filter(|&i| {
                let entry = &self.entries[i];
                entry.element.as_ref().is_some_and(|el| el.present)
                    && (parent.is_none() || entry.parent == parent)
            })
            .collect()
    }

    fn element_mut(&mut self, id: &str) -> DriverResult<&mut MockElement> {
        let index = parse_id(id)?;
        self.entries
            .get_mut(index)
            .and_then(|e| e.element.as_mut())
            .filter(|el| el.present)
            .ok_or_else(|| stale(id))
    }

    fn element(&self, id: &str) -> DriverResult<&MockElement> {
        let index = parse_id(id)?;
        self.entries
            .get(index)
            .and_then(|e| e.element.as_ref())
            .filter(|el| el.present)
            .ok_or_else(|| stale(id))
    }

    fn push(&mut self, locator: Locator, element: MockElement, parent: Option<usize>) -> usize {
        self.entries.push(Entry {
            locator: Some(locator),
            element: Some(element),
            parent,
        });
        self.entries.len() - 1
    }

    fn apply(&mut self, transition: &Transition) {
        let for_each = |state: &mut Self, locator: &Locator, f: &dyn Fn(&mut MockElement)| {
            for i in state.indices(locator) {
                if let Some(el) = state.entries[i].element.as_mut() {
                    f(el);
                }
            }
        };
        match transition {
            Transition::Show(locator) => {
                if self.indices(locator).is_empty() {
                    self.push(locator.clone(), MockElement::visible(), None);
                }
                for_each(self, locator, &|el| {
                    el.present = true;
                    el.displayed = true;
                });
            }
            Transition::Hide(locator) => for_each(self, locator, &|el| el.displayed = false),
            Transition::Remove(locator) => for_each(self, locator, &|el| el.present = false),
            Transition::SetText(locator, text) => {
                for_each(self, locator, &|el| el.text.clone_from(text));
            }
            Transition::SetAttribute(locator, name, value) => {
                for_each(self, locator, &|el| {
                    el.attributes.insert(name.clone(), value.clone());
                });
            }
        }
    }

    fn focused_mut(&mut self) -> Option<&mut MockElement> {
        let index = self.focused?;
        self.entries.get_mut(index)?.element.as_mut()
    }
}

fn parse_id(id: &str) -> DriverResult<usize> {
    id.strip_prefix("mock-")
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| DriverError::protocol(format!("not a mock element id: {id}")))
}

fn element_ref(index: usize, locator: &Locator) -> ElementRef {
    ElementRef::new(format!("mock-{index}"), locator.clone())
}

fn stale(id: &str) -> DriverError {
    DriverError::WebDriver {
        status: 404,
        error: "stale element reference".to_string(),
        message: format!("{id} is no longer attached"),
    }
}

/// Scriptable in-memory driver. Clones share state.
#[derive(Debug, Clone)]
pub struct MockDriver {
    platform: Platform,
    session_id: String,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new(Platform::Android)
    }
}

impl MockDriver {
    /// Empty screen on `platform`
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            session_id: format!("mock-{}", uuid::Uuid::new_v4()),
            state: Arc::new(Mutex::new(MockState {
                entries: Vec::new(),
                transitions: HashMap::new(),
                clicks: HashMap::new(),
                focused: None,
                commands: Vec::new(),
                keycodes: Vec::new(),
                alive: true,
                window: Rect::new(0, 0, 1080, 2340),
            })),
        }
    }

    /// Empty Android screen
    #[must_use]
    pub fn android() -> Self {
        Self::new(Platform::Android)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an element (builder form)
    #[must_use]
    pub fn with(self, locator: Locator, element: MockElement) -> Self {
        self.add(locator, element);
        self
    }

    /// Register an element
    pub fn add(&self, locator: Locator, element: MockElement) {
        self.lock().push(locator, element, None);
    }

    /// Register an element under the most recently registered element
    /// matching `parent`
    pub fn add_child(&self, parent: &Locator, locator: Locator, element: MockElement) {
        let mut state = self.lock();
        let parent_index = state.indices(parent).last().copied();
        state.push(locator, element, parent_index);
    }

    /// Script a transition for clicks on `locator` (builder form)
    #[must_use]
    pub fn on_click(self, locator: &Locator, transition: Transition) -> Self {
        self.add_transition(locator, transition);
        self
    }

    /// Script a transition for clicks on `locator`
    pub fn add_transition(&self, locator: &Locator, transition: Transition) {
        self.lock()
            .transitions
            .entry(locator.clone())
            .or_default()
            .push(transition);
    }

    /// Apply a transition immediately
    pub fn apply(&self, transition: &Transition) {
        self.lock().apply(transition);
    }

    /// Mark the session dead or alive
    pub fn set_alive(&self, alive: bool) {
        self.lock().alive = alive;
    }

    /// Clicks received by elements matching `locator`
    #[must_use]
    pub fn clicks(&self, locator: &Locator) -> usize {
        self.lock().clicks.get(locator).copied().unwrap_or(0)
    }

    /// Text of the first element matching `locator`
    #[must_use]
    pub fn text_of(&self, locator: &Locator) -> Option<String> {
        let state = self.lock();
        state
            .indices(locator)
            .first()
            .and_then(|&i| state.entries[i].element.as_ref())
            .map(|el| el.text.clone())
    }

    /// Command log
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.lock().commands.clone()
    }

    /// Key codes pressed, in order
    #[must_use]
    pub fn keycodes(&self) -> Vec<u32> {
        self.lock().keycodes.clone()
    }

    fn log(&self, command: impl Into<String>) {
        self.lock().commands.push(command.into());
    }

    fn check_alive(&self) -> DriverResult<()> {
        if self.lock().alive {
            Ok(())
        } else {
            Err(DriverError::SessionClosed {
                session_id: self.session_id.clone(),
            })
        }
    }
}

#[async_trait]
impl AppDriver for MockDriver {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn find_element(&self, locator: &Locator) -> DriverResult<Option<ElementRef>> {
        self.check_alive()?;
        let state = self.lock();
        Ok(state
            .present(locator, None)
            .first()
            .map(|&i| element_ref(i, locator)))
    }

    async fn find_elements(&self, locator: &Locator) -> DriverResult<Vec<ElementRef>> {
        self.check_alive()?;
        let state = self.lock();
        Ok(state
            .present(locator, None)
            .into_iter()
            .map(|i| element_ref(i, locator))
            .collect())
    }

    async fn find_child(
        &self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> DriverResult<Option<ElementRef>> {
        self.check_alive()?;
        let parent_index = parse_id(&parent.id)?;
        let state = self.lock();
        Ok(state
            .present(locator, Some(parent_index))
            .first()
            .map(|&i| element_ref(i, locator)))
    }

    async fn click(&self, element: &ElementRef) -> DriverResult<()> {
        self.check_alive()?;
        let mut state = self.lock();
        state.element(&element.id)?;
        state.focused = Some(parse_id(&element.id)?);
        *state.clicks.entry(element.locator.clone()).or_default() += 1;
        state.commands.push(format!("click {}", element.locator));
        let transitions = state
            .transitions
            .get(&element.locator)
            .cloned()
            .unwrap_or_default();
        for transition in &transitions {
            state.apply(transition);
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementRef) -> DriverResult<()> {
        self.check_alive()?;
        let mut state = self.lock();
        let el = state.element_mut(&element.id)?;
        el.text.clear();
        el.attributes.remove("text");
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> DriverResult<()> {
        self.check_alive()?;
        let mut state = self.lock();
        let el = state.element_mut(&element.id)?;
        el.text.push_str(text);
        let current = el.text.clone();
        el.attributes.insert("text".to_string(), current);
        state.commands.push(format!("send_keys {} {text}", element.locator));
        Ok(())
    }

    async fn text(&self, element: &ElementRef) -> DriverResult<String> {
        self.check_alive()?;
        Ok(self.lock().element(&element.id)?.text.clone())
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> DriverResult<Option<String>> {
        self.check_alive()?;
        let state = self.lock();
        let el = state.element(&element.id)?;
        Ok(match name {
            "enabled" => Some(
                el.attributes
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| el.enabled.to_string()),
            ),
            "text" => Some(
                el.attributes
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| el.text.clone()),
            ),
            _ => el.attributes.get(name).cloned(),
        })
    }

    async fn is_displayed(&self, element: &ElementRef) -> DriverResult<bool> {
        self.check_alive()?;
        Ok(self.lock().element(&element.id)?.displayed)
    }

    async fn is_enabled(&self, element: &ElementRef) -> DriverResult<bool> {
        self.check_alive()?;
        Ok(self.lock().element(&element.id)?.enabled)
    }

    async fn rect(&self, element: &ElementRef) -> DriverResult<Rect> {
        self.check_alive()?;
        Ok(self.lock().element(&element.id)?.rect)
    }

    async fn window_rect(&self) -> DriverResult<Rect> {
        self.check_alive()?;
        Ok(self.lock().window)
    }

    async fn tap(&self, point: Point) -> DriverResult<()> {
        self.check_alive()?;
        self.log(format!("tap {},{}", point.x, point.y));
        Ok(())
    }

    async fn swipe(&self, from: Point, to: Point, _duration: Duration) -> DriverResult<()> {
        self.check_alive()?;
        self.log(format!("swipe {},{} -> {},{}", from.x, from.y, to.x, to.y));
        Ok(())
    }

    async fn press_keycode(&self, code: u32) -> DriverResult<()> {
        self.check_alive()?;
        let mut state = self.lock();
        state.keycodes.push(code);
        if let Some(el) = state.focused_mut() {
            if code == KEYCODE_DEL {
                el.text.pop();
            } else if let Some(c) = char_for_keycode(code) {
                el.text.push(c);
            }
            let current = el.text.clone();
            el.attributes.insert("text".to_string(), current);
        }
        Ok(())
    }

    async fn hide_keyboard(&self) -> DriverResult<()> {
        self.check_alive()?;
        self.log("hide_keyboard");
        Ok(())
    }

    async fn screenshot(&self) -> DriverResult<Vec<u8>> {
        self.check_alive()?;
        Ok(MOCK_PNG.to_vec())
    }

    async fn page_source(&self) -> DriverResult<String> {
        self.check_alive()?;
        let state = self.lock();
        let nodes: Vec<String> = state
            .entries
            .iter()
            .filter_map(|e| match (&e.locator, &e.element) {
                (Some(l), Some(el)) if el.present => Some(format!("<node locator=\"{l}\" text=\"{}\"/>", el.text)),
                _ => None,
            })
            .collect();
        Ok(format!("<hierarchy>{}</hierarchy>", nodes.join("")))
    }

    async fn execute(&self, script: &str, args: Value) -> DriverResult<Value> {
        self.check_alive()?;
        self.log(format!("execute {script} {args}"));
        Ok(Value::Bool(false))
    }

    async fn set_context(&self, name: &str) -> DriverResult<()> {
        self.check_alive()?;
        self.log(format!("context {name}"));
        Ok(())
    }

    async fn is_alive(&self) -> bool {
        self.lock().alive
    }

    async fn quit(&self) -> DriverResult<()> {
        let mut state = self.lock();
        if state.alive {
            state.alive = false;
            state.commands.push("quit".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_and_click_transition() {
        let button = Locator::id("continue");
        let next = Locator::id("otp-title");
        let mock = MockDriver::android()
            .with(button.clone(), MockElement::visible())
            .on_click(&button, Transition::Show(next.clone()));

        assert!(mock.find_element(&next).await.unwrap().is_none());
        let el = mock.find_element(&button).await.unwrap().unwrap();
        mock.click(&el).await.unwrap();
        assert!(mock.find_element(&next).await.unwrap().is_some());
        assert_eq!(mock.clicks(&button), 1);
    }

    #[tokio::test]
    async fn test_removed_element_is_stale() {
        let loader = Locator::id("loader");
        let mock = MockDriver::android().with(loader.clone(), MockElement::visible());
        let el = mock.find_element(&loader).await.unwrap().unwrap();
        mock.apply(&Transition::Remove(loader.clone()));
        assert!(mock.is_displayed(&el).await.unwrap_err().is_stale());
        assert!(mock.find_element(&loader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_keycodes_type_into_focused() {
        let input = Locator::id("ref");
        let mock = MockDriver::android().with(input.clone(), MockElement::visible());
        let el = mock.find_element(&input).await.unwrap().unwrap();
        mock.click(&el).await.unwrap();
        for code in [29, 8, KEYCODE_DEL, 9] {
            mock.press_keycode(code).await.unwrap();
        }
        assert_eq!(mock.text_of(&input).as_deref(), Some("A2"));
        assert_eq!(
            mock.attribute(&el, "text").await.unwrap().as_deref(),
            Some("A2")
        );
    }

    #[tokio::test]
    async fn test_children_are_scoped() {
        let card = Locator::class_name("card");
        let view = Locator::text(Platform::Android, "View Details");
        let mock = MockDriver::android().with(card.clone(), MockElement::visible());
        mock.add_child(&card, view.clone(), MockElement::visible());
        let parent = mock.find_element(&card).await.unwrap().unwrap();
        assert!(mock.find_child(&parent, &view).await.unwrap().is_some());
        assert!(mock.find_child(&parent, &card).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quit_is_idempotent() {
        let mock = MockDriver::android();
        assert!(mock.is_alive().await);
        mock.quit().await.unwrap();
        mock.quit().await.unwrap();
        assert!(!mock.is_alive().await);
        assert_eq!(mock.commands(), vec!["quit".to_string()]);
        assert!(mock.find_element(&Locator::id("x")).await.is_err());
    }
}
