//! Locator resolution from configuration keys.
//!
//! Locator properties carry their strategy in the key suffix
//! (`login.phoneInputField.text`, `cart.deleteItemBtn.automator`) or in a
//! value prefix (`xpath=//...`, `id=...`). Resolution is platform aware:
//! text-based keys become UiSelector expressions on Android and
//! accessibility ids on iOS.

use crate::config::Settings;
use crate::driver::Platform;
use crate::result::{ShopError, ShopResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Element lookup strategy understood by Appium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Resource id
    Id,
    /// XPath expression
    XPath,
    /// Accessibility id (content-desc / accessibilityIdentifier)
    AccessibilityId,
    /// Widget class name
    ClassName,
    /// `UiSelector` / `UiScrollable` expression (Android only)
    AndroidUiAutomator,
    /// NSPredicate string (iOS only)
    IosPredicate,
}

impl Strategy {
    /// The `using` value sent on the wire
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::XPath => "xpath",
            Self::AccessibilityId => "accessibility id",
            Self::ClassName => "class name",
            Self::AndroidUiAutomator => "-android uiautomator",
            Self::IosPredicate => "-ios predicate string",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A strategy/value pair identifying a UI element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// Lookup strategy
    pub strategy: Strategy,
    /// Strategy-specific expression
    pub value: String,
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.value)
    }
}

fn quoted(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `value` as an XPath 1.0 string literal. XPath has no escapes, so a value
/// holding both quote kinds becomes a `concat()` of single-quoted parts.
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

impl Locator {
    /// Create a locator
    #[must_use]
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    /// Resource id locator
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::new(Strategy::Id, value)
    }

    /// XPath locator
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, value)
    }

    /// Accessibility id locator
    #[must_use]
    pub fn accessibility_id(value: impl Into<String>) -> Self {
        Self::new(Strategy::AccessibilityId, value)
    }

    /// Class name locator
    #[must_use]
    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(Strategy::ClassName, value)
    }

    /// Raw UiAutomator expression
    #[must_use]
    pub fn ui_automator(value: impl Into<String>) -> Self {
        Self::new(Strategy::AndroidUiAutomator, value)
    }

    /// Exact visible text
    #[must_use]
    pub fn text(platform: Platform, text: &str) -> Self {
        match platform {
            Platform::Android => {
                Self::ui_automator(format!("new UiSelector().text(\"{}\")", quoted(text)))
            }
            Platform::Ios => Self::accessibility_id(text),
        }
    }

    /// Visible text containing `partial`
    #[must_use]
    pub fn text_contains(platform: Platform, partial: &str) -> Self {
        match platform {
            Platform::Android => Self::ui_automator(format!(
                "new UiSelector().textContains(\"{}\")",
                quoted(partial)
            )),
            Platform::Ios => Self::new(
                Strategy::IosPredicate,
                format!(
                    "label CONTAINS \"{0}\" OR name CONTAINS \"{0}\"",
                    quoted(partial)
                ),
            ),
        }
    }

    /// Android: scroll the first scrollable container until text containing
    /// `partial` is in view. iOS has no equivalent selector and falls back
    /// to [`Locator::text_contains`].
    #[must_use]
    pub fn scrollable_text(platform: Platform, partial: &str) -> Self {
        match platform {
            Platform::Android => Self::ui_automator(format!(
                "new UiScrollable(new UiSelector().scrollable(true)).scrollIntoView(new UiSelector().textContains(\"{}\"))",
                quoted(partial)
            )),
            Platform::Ios => Self::text_contains(platform, partial),
        }
    }

    /// Element whose `@text` attribute contains `partial`
    #[must_use]
    pub fn xpath_text_contains(partial: &str) -> Self {
        Self::xpath(format!("//*[contains(@text,{})]", xpath_literal(partial)))
    }
}

// ===== Resolution =====

fn text_rule(platform: Platform, value: &str) -> Locator {
    Locator::text(platform, value)
}

/// Resolve a configuration key/value pair into a [`Locator`].
///
/// Key suffixes are checked first, value prefixes second. Android-only
/// rules are skipped on iOS.
pub fn resolve(key: &str, value: Option<&str>, platform: Platform) -> ShopResult<Locator> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ShopError::MissingKey {
            key: key.to_string(),
        })?;
    let lower = key.to_ascii_lowercase();
    let android = platform == Platform::Android;

    if lower.ends_with(".id") || lower.ends_with(".resourceid") {
        return Ok(Locator::id(value));
    }
    if lower.ends_with(".xpath") {
        return Ok(Locator::xpath(value));
    }
    if lower.ends_with(".accessibility") || lower.ends_with(".accessibilityid") {
        return Ok(Locator::accessibility_id(value));
    }
    if lower.ends_with(".classname") {
        return Ok(Locator::class_name(value));
    }
    if lower.ends_with(".text") {
        return Ok(text_rule(platform, value));
    }
    if android {
        if lower.ends_with(".containstext") {
            return Ok(Locator::text_contains(platform, value));
        }
        if lower.ends_with(".indextext") {
            return Ok(Locator::ui_automator(format!(
                "new UiSelector().text(\"{}\").instance(0)",
                quoted(value)
            )));
        }
        if lower.ends_with(".uiautomator") || lower.ends_with(".automator") {
            return Ok(Locator::ui_automator(value));
        }
    }

    if let Some(rest) = value.strip_prefix("xpath=") {
        return Ok(Locator::xpath(rest.trim()));
    }
    if let Some(rest) = value.strip_prefix("id=") {
        return Ok(Locator::id(rest.trim()));
    }
    if let Some(rest) = value.strip_prefix("accessibilityId=") {
        return Ok(Locator::accessibility_id(rest.trim()));
    }
    if let Some(rest) = value.strip_prefix("text=") {
        return Ok(text_rule(platform, rest.trim()));
    }
    if android && (value.starts_with("new UiSelector") || value.starts_with("new UiScrollable")) {
        return Ok(Locator::ui_automator(value));
    }

    let kind = key
        .rsplit_once('.')
        .map_or("unknown", |(_, last)| last)
        .to_string();
    Err(ShopError::UnsupportedLocator {
        key: key.to_string(),
        kind,
    })
}

/// Configuration-backed locator lookup for one platform
#[derive(Debug, Clone)]
pub struct LocatorBook {
    entries: BTreeMap<String, String>,
    platform: Platform,
}

impl LocatorBook {
    /// Create a book over raw entries
    #[must_use]
    pub fn new(entries: BTreeMap<String, String>, platform: Platform) -> Self {
        Self { entries, platform }
    }

    /// Create a book from the `locators` section of the settings
    #[must_use]
    pub fn from_settings(settings: &Settings, platform: Platform) -> Self {
        Self::new(settings.locators.clone(), platform)
    }

    /// Target platform
    #[must_use]
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Trimmed raw value for `key`
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Whether a non-empty value exists for `key`
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.raw(key).is_some()
    }

    /// Resolve `key`
    pub fn get(&self, key: &str) -> ShopResult<Locator> {
        resolve(key, self.raw(key), self.platform)
    }

    /// Exact-text locator for this platform
    #[must_use]
    pub fn text(&self, label: &str) -> Locator {
        Locator::text(self.platform, label)
    }

    /// Contains-text locator for this platform
    #[must_use]
    pub fn text_contains(&self, partial: &str) -> Locator {
        Locator::text_contains(self.platform, partial)
    }

    /// Every key that fails to resolve, with its error
    #[must_use]
    pub fn check_all(&self) -> Vec<(String, ShopError)> {
        self.entries
            .keys()
            .filter_map(|key| self.get(key).err().map(|e| (key.clone(), e)))
            .collect()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the book is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add or replace an entry
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    const A: Platform = Platform::Android;
    const I: Platform = Platform::Ios;

    mod suffix_tests {
        use super::*;

        #[test]
        fn test_id_and_resource_id() {
            assert_eq!(
                resolve("perm.allow.id", Some("com.app:id/allow"), A).unwrap(),
                Locator::id("com.app:id/allow")
            );
            assert_eq!(
                resolve("otp.error.resourceId", Some("err"), I).unwrap(),
                Locator::id("err")
            );
        }

        #[test]
        fn test_xpath_accessibility_classname() {
            assert_eq!(
                resolve("a.b.xpath", Some(" //x "), A).unwrap(),
                Locator::xpath("//x")
            );
            assert_eq!(
                resolve("login.continueAsGuest.accessibility", Some("Guest"), A).unwrap(),
                Locator::accessibility_id("Guest")
            );
            assert_eq!(
                resolve("a.accessibilityId", Some("Guest"), A).unwrap(),
                Locator::accessibility_id("Guest")
            );
            assert_eq!(
                resolve("a.qty.className", Some("android.widget.EditText"), A).unwrap(),
                Locator::class_name("android.widget.EditText")
            );
        }

        #[test]
        fn test_text_is_platform_specific() {
            let android = resolve("home.selfCollectBtn.text", Some("Self Collect"), A).unwrap();
            assert_eq!(android.strategy, Strategy::AndroidUiAutomator);
            assert_eq!(android.value, "new UiSelector().text(\"Self Collect\")");

            let ios = resolve("home.selfCollectBtn.text", Some("Self Collect"), I).unwrap();
            assert_eq!(ios, Locator::accessibility_id("Self Collect"));
        }

        #[test]
        fn test_android_only_rules() {
            let contains = resolve("toast.containsText", Some("added"), A).unwrap();
            assert_eq!(contains.value, "new UiSelector().textContains(\"added\")");
            let index = resolve("orders.view.indexText", Some("View"), A).unwrap();
            assert_eq!(index.value, "new UiSelector().text(\"View\").instance(0)");
            let raw = resolve(
                "cart.deleteItemBtn.automator",
                Some("new UiSelector().description(\"delete\")"),
                A,
            )
            .unwrap();
            assert_eq!(raw.strategy, Strategy::AndroidUiAutomator);
        }

        #[test]
        fn test_android_only_rules_fall_through_on_ios() {
            let err = resolve("toast.containsText", Some("added"), I).unwrap_err();
            match err {
                ShopError::UnsupportedLocator { kind, .. } => assert_eq!(kind, "containsText"),
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn test_suffix_beats_prefix() {
            let loc = resolve("a.b.id", Some("xpath=//x"), A).unwrap();
            assert_eq!(loc, Locator::id("xpath=//x"));
        }
    }

    mod prefix_tests {
        use super::*;

        #[test]
        fn test_value_prefixes() {
            assert_eq!(
                resolve("a.b", Some("xpath=//android.widget.Button"), A).unwrap(),
                Locator::xpath("//android.widget.Button")
            );
            assert_eq!(resolve("a.b", Some("id=foo"), A).unwrap(), Locator::id("foo"));
            assert_eq!(
                resolve("a.b", Some("accessibilityId=Menu"), A).unwrap(),
                Locator::accessibility_id("Menu")
            );
            assert_eq!(
                resolve("a.b", Some("text=Allow"), I).unwrap(),
                Locator::accessibility_id("Allow")
            );
            assert_eq!(
                resolve("a.b", Some("new UiSelector().index(2)"), A)
                    .unwrap()
                    .strategy,
                Strategy::AndroidUiAutomator
            );
        }

        #[test]
        fn test_unknown_kind() {
            match resolve("plainkey", Some("value"), A).unwrap_err() {
                ShopError::UnsupportedLocator { kind, key } => {
                    assert_eq!(kind, "unknown");
                    assert_eq!(key, "plainkey");
                }
                other => panic!("unexpected {other:?}"),
            }
        }

        #[test]
        fn test_missing_value() {
            assert!(matches!(
                resolve("a.b.id", None, A),
                Err(ShopError::MissingKey { .. })
            ));
            assert!(matches!(
                resolve("a.b.id", Some("  "), A),
                Err(ShopError::MissingKey { .. })
            ));
        }
    }

    mod builder_tests {
        use super::*;

        #[test]
        fn test_quotes_are_escaped() {
            let loc = Locator::text(A, "Say \"hi\"");
            assert_eq!(loc.value, "new UiSelector().text(\"Say \\\"hi\\\"\")");
        }

        #[test]
        fn test_scrollable_text() {
            let loc = Locator::scrollable_text(A, "Cement");
            assert!(loc.value.starts_with("new UiScrollable"));
            assert!(loc.value.ends_with("textContains(\"Cement\"))"));
            assert_eq!(Locator::scrollable_text(I, "x").strategy, Strategy::IosPredicate);
        }

        #[test]
        fn test_xpath_literal_quoting() {
            assert_eq!(xpath_literal("Submitted"), "'Submitted'");
            assert_eq!(xpath_literal("Driver's copy"), "\"Driver's copy\"");
            assert_eq!(
                xpath_literal("It's \"due\""),
                "concat('It', \"'\", 's \"due\"')"
            );
            assert_eq!(
                Locator::xpath_text_contains("Mama's").value,
                "//*[contains(@text,\"Mama's\")]"
            );
        }

        #[test]
        fn test_display() {
            assert_eq!(Locator::id("x").to_string(), "id=x");
            assert_eq!(Strategy::AndroidUiAutomator.wire_name(), "-android uiautomator");
        }
    }

    mod book_tests {
        use super::*;

        #[test]
        fn test_check_all_reports_bad_keys() {
            let mut book = LocatorBook::new(BTreeMap::new(), I);
            book.insert("login.title.text", "Login");
            book.insert("toast.msg.containsText", "saved");
            book.insert("blank.id", " ");
            let bad: Vec<String> = book.check_all().into_iter().map(|(k, _)| k).collect();
            assert_eq!(bad, vec!["blank.id", "toast.msg.containsText"]);
            assert!(!book.has("blank.id"));
            assert_eq!(book.len(), 3);
        }
    }

    mod property_tests {
        use super::*;
        use crate::locator::Strategy;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_xpath_suffix_keeps_trimmed_value(
                stem in "[a-z]{1,8}\\.[a-zA-Z]{1,12}",
                value in "[ ]{0,2}//[a-z]{1,10}[ ]{0,2}"
            ) {
                let key = format!("{stem}.xpath");
                let loc = resolve(&key, Some(&value), Platform::Android).unwrap();
                prop_assert_eq!(loc.strategy, Strategy::XPath);
                prop_assert_eq!(loc.value, value.trim());
            }

            #[test]
            fn prop_ios_never_yields_uiautomator(
                key in "[a-z]{1,6}\\.[a-zA-Z]{1,14}",
                value in "[a-zA-Z =/()\"]{1,20}"
            ) {
                if let Ok(loc) = resolve(&key, Some(&value), Platform::Ios) {
                    prop_assert_ne!(loc.strategy, Strategy::AndroidUiAutomator);
                }
            }
        }
    }
}
