//! Result and error types for Shopwright.

use crate::driver::DriverError;
use thiserror::Error;

/// Result type for Shopwright operations
pub type ShopResult<T> = Result<T, ShopError>;

/// Errors that can occur while driving the shop app
#[derive(Debug, Error)]
pub enum ShopError {
    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A required property is absent or empty
    #[error("Missing configuration key: {key}")]
    MissingKey {
        /// Property key
        key: String,
    },

    /// A value could not be interpreted
    #[error("Invalid value for {what}: {message}")]
    InvalidValue {
        /// What was being parsed
        what: String,
        /// Error message
        message: String,
    },

    /// No locator strategy matches the key/value pair
    #[error("Unsupported locator type for key {key} (type: {kind})")]
    UnsupportedLocator {
        /// Property key
        key: String,
        /// Last segment of the key, or "unknown"
        kind: String,
    },

    /// Platform name not recognised
    #[error("Unsupported platform: {name}")]
    UnsupportedPlatform {
        /// Platform name as configured
        name: String,
    },

    /// Appium transport or protocol failure
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Something did not show up (or go away) in time
    #[error("Timed out after {ms}ms waiting for {what}")]
    Timeout {
        /// What was awaited
        what: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Element could not be located
    #[error("Element not found: {locator}")]
    ElementNotFound {
        /// Locator description
        locator: String,
    },

    /// A UI expectation did not hold
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Operation requires a state the suite is not in
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// adb invocation failed
    #[error("adb {command} failed: {message}")]
    Adb {
        /// Subcommand that failed
        command: String,
        /// Error message
        message: String,
    },

    /// Report archive error
    #[error("Report error: {message}")]
    Report {
        /// Error message
        message: String,
    },

    /// Email delivery error
    #[error("Email error: {message}")]
    Email {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ShopError {
    /// Shorthand for [`ShopError::AssertionFailed`]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Shorthand for [`ShopError::InvalidValue`]
    pub fn invalid(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Shorthand for [`ShopError::InvalidState`]
    pub fn state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Shorthand for [`ShopError::Config`]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error is a wait timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
