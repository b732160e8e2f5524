//! Suite configuration.
//!
//! One YAML document holds the Appium capabilities, test data (account,
//! product, payment), timeouts, report/email settings and the flat
//! `locators` map consumed by [`crate::locator::LocatorBook`].
//!
//! ```yaml
//! appium:
//!   url: http://127.0.0.1:4723
//!   platform: android
//!   udid: emulator-5554
//! locators:
//!   login.phoneInputField.text: "Phone Number"
//! ```

use crate::result::{ShopError, ShopResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Locations tried, in order, when no explicit config path exists
pub const FALLBACK_PATHS: &[&str] = &["config/shopwright.yaml", "shopwright.yaml"];

/// Environment variable overriding `appium.url`
pub const ENV_APPIUM_URL: &str = "SHOPWRIGHT_APPIUM_URL";
/// Environment variable overriding `appium.udid`
pub const ENV_UDID: &str = "SHOPWRIGHT_UDID";
/// Environment variable overriding `appium.platform`
pub const ENV_PLATFORM: &str = "SHOPWRIGHT_PLATFORM";
/// Environment variable overriding `email.password`
pub const ENV_SMTP_PASSWORD: &str = "SHOPWRIGHT_SMTP_PASSWORD";

/// Default product quantity
pub const DEFAULT_QUANTITY: &str = "100";
/// Default payment reference number
pub const DEFAULT_REFERENCE_NUMBER: &str = "0000";
/// Default vehicle plate number used on the fulfilment page
pub const DEFAULT_PLATE_NUMBER: &str = "KAA123A";
/// Default payment method label
pub const DEFAULT_METHOD_LABEL: &str = "Bank Transfer";
/// Default generated reference length
pub const DEFAULT_REFERENCE_LENGTH: usize = 8;

/// Appium server and device capabilities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppiumSettings {
    /// Appium server base URL
    pub url: String,
    /// `android` or `ios`
    pub platform: String,
    /// Automation backend (UiAutomator2 / XCUITest)
    pub automation_name: Option<String>,
    /// Device name
    pub device_name: String,
    /// Device serial / UDID
    pub udid: String,
    /// OS version
    pub platform_version: Option<String>,
    /// Android package
    pub app_package: Option<String>,
    /// Android launch activity
    pub app_activity: Option<String>,
    /// iOS bundle identifier
    pub bundle_id: Option<String>,
    /// Reinstall the app on session start
    pub full_reset: bool,
    /// Keep app data between sessions
    pub no_reset: bool,
    /// Do not stop the app when the session resets (Android)
    pub dont_stop_app_on_reset: bool,
    /// Seconds Appium waits for a command before ending the session
    pub new_command_timeout: u64,
}

impl Default for AppiumSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:4723".to_string(),
            platform: "android".to_string(),
            automation_name: None,
            device_name: "emulator-5554".to_string(),
            udid: "emulator-5554".to_string(),
            platform_version: None,
            app_package: None,
            app_activity: None,
            bundle_id: None,
            full_reset: false,
            no_reset: true,
            dont_stop_app_on_reset: true,
            new_command_timeout: 300,
        }
    }
}

/// Test account data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSettings {
    /// Phone number without country code
    pub phone_number: String,
    /// Country calling code shown on the account page
    pub country_code: String,
    /// OTP accepted by the test backend
    pub otp: String,
}

/// Product search data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductSettings {
    /// Search term used by the search steps
    pub search_term: String,
    /// Quantity typed into the product/cart quantity inputs
    pub quantity: String,
    /// Title text the products page scrolls to
    pub page_title: String,
    /// Pickup location option label
    pub pickup_location: Option<String>,
    /// Term for the "search for another product" steps
    pub second_search_term: Option<String>,
    /// Items the cart must hold after the add-to-cart flow
    pub cart_items: Vec<CartItem>,
}

/// Expected cart line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product name as shown in the cart
    pub name: String,
    /// Quantity shown next to it
    pub quantity: u32,
}

impl Default for ProductSettings {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            quantity: DEFAULT_QUANTITY.to_string(),
            page_title: "Products".to_string(),
            pickup_location: None,
            second_search_term: None,
            cart_items: Vec::new(),
        }
    }
}

/// Payment and checkout data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentSettings {
    /// Bank names offered in the bank-transfer dropdown
    pub bank_options: Vec<String>,
    /// Prefix of generated payment references
    pub reference_prefix: String,
    /// Random part length of generated payment references
    pub reference_length: usize,
    /// Fixed reference number used when generation is not wanted
    pub reference_number: String,
    /// Payment method label shown in the order details
    pub method_label: String,
    /// Vehicle plate number for fulfilment
    pub plate_number: String,
    /// Local proof-of-payment image pushed to the device before upload
    pub proof_file: Option<PathBuf>,
    /// Device directory the image is pushed to
    pub proof_remote_dir: String,
    /// Picker folder holding the proof-of-payment image
    pub proof_folder: String,
    /// Seconds to wait after selecting the proof image
    pub upload_wait_secs: u64,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            bank_options: Vec::new(),
            reference_prefix: String::new(),
            reference_length: DEFAULT_REFERENCE_LENGTH,
            reference_number: DEFAULT_REFERENCE_NUMBER.to_string(),
            method_label: DEFAULT_METHOD_LABEL.to_string(),
            plate_number: DEFAULT_PLATE_NUMBER.to_string(),
            proof_file: None,
            proof_remote_dir: "/sdcard/Download".to_string(),
            proof_folder: "Download".to_string(),
            upload_wait_secs: 3,
        }
    }
}

/// Order listing data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderSettings {
    /// Statuses in descending priority
    pub status_priority: Vec<String>,
    /// XPath with a `{status}` placeholder
    pub status_xpath_template: String,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            status_priority: vec![
                "Pending Payment".to_string(),
                "Processing".to_string(),
                "Ready for Collection".to_string(),
            ],
            status_xpath_template: "//*[contains(@text,'{status}')]".to_string(),
        }
    }
}

/// Wait timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Default explicit wait
    pub default_ms: u64,
    /// Short wait for optional elements
    pub short_ms: u64,
    /// Long wait for page transitions
    pub long_ms: u64,
    /// Poll interval
    pub poll_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            default_ms: 10_000,
            short_ms: 3_000,
            long_ms: 15_000,
            poll_ms: 500,
        }
    }
}

impl TimeoutSettings {
    /// Default wait as a duration
    #[must_use]
    pub const fn default_wait(&self) -> Duration {
        Duration::from_millis(self.default_ms)
    }

    /// Short wait as a duration
    #[must_use]
    pub const fn short_wait(&self) -> Duration {
        Duration::from_millis(self.short_ms)
    }

    /// Long wait as a duration
    #[must_use]
    pub const fn long_wait(&self) -> Duration {
        Duration::from_millis(self.long_ms)
    }

    /// Poll interval as a duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

/// Output locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingSettings {
    /// Screenshot root
    pub screenshots_dir: PathBuf,
    /// Scenario trace JSON directory
    pub traces_dir: PathBuf,
    /// Directory archived and mailed after the run
    pub report_dir: PathBuf,
    /// Archive written from `report_dir`
    pub archive_path: PathBuf,
}

impl Default for ReportingSettings {
    fn default() -> Self {
        Self {
            screenshots_dir: PathBuf::from("target/shopwright/screenshots"),
            traces_dir: PathBuf::from("target/shopwright/traces"),
            report_dir: PathBuf::from("target/shopwright"),
            archive_path: PathBuf::from("target/shopwright-report.zip"),
        }
    }
}

/// SMTP delivery of the report archive
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    /// Send the report after the run
    pub enabled: bool,
    /// SMTP relay host
    pub smtp_host: String,
    /// SMTP port (STARTTLS)
    pub smtp_port: u16,
    /// SMTP user
    pub username: String,
    /// SMTP password
    pub password: String,
    /// Sender address
    pub from: String,
    /// Recipient addresses
    pub to: Vec<String>,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

impl std::fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSettings")
            .field("enabled", &self.enabled)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("subject", &self.subject)
            .finish()
    }
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: String::new(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from: String::new(),
            to: Vec::new(),
            subject: "Shop app automation report".to_string(),
            body: "The automation report for the latest run is attached.".to_string(),
        }
    }
}

/// Runner defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Feature file directory
    pub features: PathBuf,
    /// Tags OR-ed together when no tag expression is given
    pub default_tags: Vec<String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            features: PathBuf::from("features"),
            default_tags: Vec::new(),
        }
    }
}

/// The whole configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Appium capabilities
    pub appium: AppiumSettings,
    /// Test account
    pub account: AccountSettings,
    /// Product data
    pub product: ProductSettings,
    /// Payment data
    pub payment: PaymentSettings,
    /// Order listing data
    pub orders: OrderSettings,
    /// Timeouts
    pub timeouts: TimeoutSettings,
    /// Output locations
    pub reporting: ReportingSettings,
    /// Report email
    pub email: EmailSettings,
    /// Runner defaults
    pub run: RunSettings,
    /// Locator keys to locator values
    pub locators: BTreeMap<String, String>,
}

impl Settings {
    /// Parse settings from a YAML string
    pub fn from_yaml(yaml: &str) -> ShopResult<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| ShopError::Config {
            message: format!("Failed to parse configuration: {e}"),
        })
    }

    /// Load settings from `path`, falling back to [`FALLBACK_PATHS`]
    /// relative to the working directory, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> ShopResult<Self> {
        let resolved = Self::locate(path).ok_or_else(|| ShopError::Config {
            message: match path {
                Some(p) => format!("configuration file not found: {}", p.display()),
                None => format!("no configuration file found (tried {FALLBACK_PATHS:?})"),
            },
        })?;
        info!(path = %resolved.display(), "loading configuration");
        let yaml = fs::read_to_string(&resolved)?;
        let mut settings = Self::from_yaml(&yaml)?;
        settings.apply_env(|name| std::env::var(name).ok());
        debug!(keys = settings.locators.len(), "configuration loaded");
        Ok(settings)
    }

    fn locate(path: Option<&Path>) -> Option<PathBuf> {
        if let Some(p) = path {
            if p.is_file() {
                return Some(p.to_path_buf());
            }
            warn!(path = %p.display(), "configuration file missing, trying fallbacks");
        }
        FALLBACK_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.is_file())
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// [`Settings::load`]).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_APPIUM_URL) {
            self.appium.url = url;
        }
        if let Some(udid) = non_empty(ENV_UDID) {
            self.appium.udid = udid;
        }
        if let Some(platform) = non_empty(ENV_PLATFORM) {
            self.appium.platform = platform;
        }
        if let Some(password) = non_empty(ENV_SMTP_PASSWORD) {
            self.email.password = password;
        }
    }

    // ===== Property access =====

    /// Trimmed property value; empty values count as missing.
    pub fn property(&self, key: &str) -> Option<&str> {
        match self.locators.get(key).map(|v| v.trim()) {
            Some("") => {
                warn!(key, "property is empty");
                None
            }
            Some(value) => Some(value),
            None => {
                warn!(key, "property not found");
                None
            }
        }
    }

    /// Property value or `default`
    pub fn property_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.property(key).unwrap_or(default)
    }

    /// Property value, or [`ShopError::MissingKey`]
    pub fn require(&self, key: &str) -> ShopResult<&str> {
        self.property(key).ok_or_else(|| ShopError::MissingKey {
            key: key.to_string(),
        })
    }

    /// True only for a case-insensitive `"true"`
    pub fn bool_property(&self, key: &str) -> bool {
        self.property(key)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// Integer property
    pub fn int_property(&self, key: &str) -> ShopResult<i64> {
        let raw = self.require(key)?;
        raw.parse().map_err(|e| ShopError::InvalidValue {
            what: key.to_string(),
            message: format!("'{raw}' is not an integer: {e}"),
        })
    }

    /// Sorted `key = value` listing of every locator property
    pub fn dump(&self) -> String {
        self.locators
            .iter()
            .map(|(k, v)| format!("{k} = {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One-line description of the target device
    pub fn summary(&self) -> String {
        format!(
            "{} device {} ({}) via {}, {} locators",
            self.appium.platform,
            self.appium.device_name,
            self.appium.udid,
            self.appium.url,
            self.locators.len()
        )
    }
}
