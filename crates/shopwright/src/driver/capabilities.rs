//! Appium capability sets for Android and iOS sessions.

use super::Platform;
use crate::config::AppiumSettings;
use crate::result::ShopResult;
use serde_json::{Map, Value};

/// Prefix Appium requires on non-W3C capabilities
const VENDOR_PREFIX: &str = "appium:";

#[derive(Debug, Default)]
struct CapabilitySet(Map<String, Value>);

impl CapabilitySet {
    fn standard(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    fn vendor(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(format!("{VENDOR_PREFIX}{name}"), value.into());
        self
    }

    fn vendor_opt(self, name: &str, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => self.vendor(name, v),
            None => self,
        }
    }
}

/// Build the `alwaysMatch` capabilities for the configured platform.
///
/// Unsupported platform names are rejected before anything is sent.
pub fn build_capabilities(settings: &AppiumSettings) -> ShopResult<(Platform, Value)> {
    let platform: Platform = settings.platform.parse()?;
    let automation = settings
        .automation_name
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(platform.default_automation());

    let caps = CapabilitySet::default()
        .standard("platformName", platform.capability_name())
        .vendor("automationName", automation)
        .vendor("deviceName", settings.device_name.as_str())
        .vendor_opt("udid", Some(settings.udid.as_str()))
        .vendor_opt("platformVersion", settings.platform_version.as_deref())
        .vendor("fullReset", settings.full_reset)
        .vendor("noReset", settings.no_reset)
        .vendor("newCommandTimeout", settings.new_command_timeout);

    let caps = match platform {
        Platform::Android => caps
            .vendor_opt("appPackage", settings.app_package.as_deref())
            .vendor_opt("appActivity", settings.app_activity.as_deref())
            .vendor("dontStopAppOnReset", settings.dont_stop_app_on_reset),
        Platform::Ios => caps
            .vendor_opt("bundleId", settings.bundle_id.as_deref())
            .vendor("useNewWDA", true),
    };

    Ok((platform, Value::Object(caps.0)))
}
