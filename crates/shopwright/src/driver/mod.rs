//! AppDriver - the device automation seam.
//!
//! Page objects talk to an [`AppDriver`]. [`AppiumDriver`] speaks the W3C
//! WebDriver protocol (plus Appium's mobile extensions) to a running Appium
//! server. [`MockDriver`] keeps an in-memory screen model for unit tests.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────────┐
//! │ Page objects │───►│  AppDriver   │───►│ AppiumDriver     │──► Appium ──► device
//! │ (Ui helpers) │    │   (trait)    │    │ MockDriver       │
//! └──────────────┘    └──────────────┘    └──────────────────┘
//! ```

mod appium;
mod capabilities;
mod manager;
pub mod mock;

pub use appium::{AppiumDriver, ELEMENT_KEY};
pub use capabilities::build_capabilities;
pub use manager::{AppiumFactory, DriverFactory, DriverManager};
pub use mock::{MockDriver, MockElement, Transition};

use crate::locator::Locator;
use crate::result::ShopError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Result type for driver commands
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors raised by an [`AppDriver`]
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a WebDriver error
    #[error("WebDriver error {status} ({error}): {message}")]
    WebDriver {
        /// HTTP status code
        status: u16,
        /// WebDriver error code, e.g. `no such element`
        error: String,
        /// Server message
        message: String,
    },

    /// Response did not have the expected shape
    #[error("Protocol error: {message}")]
    Protocol {
        /// Error message
        message: String,
    },

    /// The session has been quit
    #[error("Session {session_id} is closed")]
    SessionClosed {
        /// Session id
        session_id: String,
    },
}

impl DriverError {
    /// WebDriver error code, if any
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::WebDriver { error, .. } => Some(error),
            _ => None,
        }
    }

    /// `no such element`
    #[must_use]
    pub fn is_no_such_element(&self) -> bool {
        self.code() == Some("no such element")
    }

    /// `stale element reference`
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.code() == Some("stale element reference")
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

/// Target mobile platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Android (UiAutomator2)
    Android,
    /// iOS (XCUITest)
    Ios,
}

impl Platform {
    /// `platformName` capability value
    #[must_use]
    pub const fn capability_name(self) -> &'static str {
        match self {
            Self::Android => "Android",
            Self::Ios => "iOS",
        }
    }

    /// Default `automationName`
    #[must_use]
    pub const fn default_automation(self) -> &'static str {
        match self {
            Self::Android => "UiAutomator2",
            Self::Ios => "XCUITest",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.capability_name())
    }
}

impl FromStr for Platform {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "android" => Ok(Self::Android),
            "ios" => Ok(Self::Ios),
            _ => Err(ShopError::UnsupportedPlatform {
                name: s.to_string(),
            }),
        }
    }
}

/// A screen coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Element or window bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub width: i32,
    /// Height
    pub height: i32,
}

impl Rect {
    /// Create a rect
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Centre point
    #[must_use]
    pub const fn center(&self) -> Point {
        Point::new(self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Bottom edge
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

/// Handle to a located element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    /// Opaque element id issued by the driver
    pub id: String,
    /// Locator that produced this element
    pub locator: Locator,
}

impl ElementRef {
    /// Create a handle
    #[must_use]
    pub fn new(id: impl Into<String>, locator: Locator) -> Self {
        Self {
            id: id.into(),
            locator,
        }
    }
}

/// Device automation operations used by the page objects
#[async_trait]
pub trait AppDriver: Send + Sync + fmt::Debug {
    /// Platform of the running session
    fn platform(&self) -> Platform;

    /// Session identifier
    fn session_id(&self) -> &str;

    /// First element matching `locator`, `None` when absent
    async fn find_element(&self, locator: &Locator) -> DriverResult<Option<ElementRef>>;

    /// All elements matching `locator`
    async fn find_elements(&self, locator: &Locator) -> DriverResult<Vec<ElementRef>>;

    /// First descendant of `parent` matching `locator`
    async fn find_child(
        &self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> DriverResult<Option<ElementRef>>;

    /// Click an element
    async fn click(&self, element: &ElementRef) -> DriverResult<()>;

    /// Clear an input
    async fn clear(&self, element: &ElementRef) -> DriverResult<()>;

    /// Type into an input
    async fn send_keys(&self, element: &ElementRef, text: &str) -> DriverResult<()>;

    /// Visible text
    async fn text(&self, element: &ElementRef) -> DriverResult<String>;

    /// Attribute value
    async fn attribute(&self, element: &ElementRef, name: &str) -> DriverResult<Option<String>>;

    /// Whether the element is displayed
    async fn is_displayed(&self, element: &ElementRef) -> DriverResult<bool>;

    /// Whether the element is enabled
    async fn is_enabled(&self, element: &ElementRef) -> DriverResult<bool>;

    /// Element bounds
    async fn rect(&self, element: &ElementRef) -> DriverResult<Rect>;

    /// Window bounds
    async fn window_rect(&self) -> DriverResult<Rect>;

    /// Single-finger tap at a screen point
    async fn tap(&self, point: Point) -> DriverResult<()>;

    /// Single-finger swipe
    async fn swipe(&self, from: Point, to: Point, duration: Duration) -> DriverResult<()>;

    /// Press an Android key code
    async fn press_keycode(&self, code: u32) -> DriverResult<()>;

    /// Hide the soft keyboard
    async fn hide_keyboard(&self) -> DriverResult<()>;

    /// PNG screenshot bytes
    async fn screenshot(&self) -> DriverResult<Vec<u8>>;

    /// Current UI hierarchy
    async fn page_source(&self) -> DriverResult<String>;

    /// Run a script (e.g. `mobile: scroll`)
    async fn execute(
        &self,
        script: &str,
        args: serde_json::Value,
    ) -> DriverResult<serde_json::Value>;

    /// Switch automation context (`NATIVE_APP`, webviews)
    async fn set_context(&self, name: &str) -> DriverResult<()>;

    /// Whether the session still answers commands
    async fn is_alive(&self) -> bool;

    /// End the session. Calling it twice is a no-op.
    async fn quit(&self) -> DriverResult<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse() {
        assert_eq!("Android".parse::<Platform>().unwrap(), Platform::Android);
        assert_eq!(" ios ".parse::<Platform>().unwrap(), Platform::Ios);
        let err = "windows".parse::<Platform>().unwrap_err();
        assert!(err.to_string().contains("windows"));
    }

    #[test]
    fn test_rect_center() {
        let rect = Rect::new(10, 20, 100, 50);
        assert_eq!(rect.center(), Point::new(60, 45));
        assert_eq!(rect.bottom(), 70);
    }

    #[test]
    fn test_error_codes() {
        let err = DriverError::WebDriver {
            status: 404,
            error: "no such element".into(),
            message: "gone".into(),
        };
        assert!(err.is_no_such_element());
        assert!(!err.is_stale());
        assert_eq!(DriverError::protocol("x").code(), None);
    }
}
