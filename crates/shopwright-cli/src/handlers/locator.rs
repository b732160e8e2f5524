//! Locator command handler

use super::config::{load_settings, platform_of};
use crate::error::CliResult;
use shopwright::{LocatorBook, Settings};
use std::path::Path;

/// `key -> strategy: value` for one locator key
pub fn describe_locator(settings: &Settings, key: &str) -> CliResult<String> {
    let book = LocatorBook::from_settings(settings, platform_of(settings)?);
    let locator = book.get(key)?;
    Ok(format!("{key} -> {locator}"))
}

/// Execute the locator command
pub fn execute_locator(path: Option<&Path>, key: &str) -> CliResult<()> {
    let settings = load_settings(path)?;
    println!("{}", describe_locator(&settings, key)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::from_yaml(
            r#"
appium:
  platform: android
locators:
  loginButton.text: "Log in"
  payment.referenceField.xpath: "//android.widget.EditText"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_describe_xpath() {
        let line = describe_locator(&settings(), "payment.referenceField.xpath").unwrap();
        assert!(line.starts_with("payment.referenceField.xpath -> "));
        assert!(line.contains("//android.widget.EditText"));
    }

    #[test]
    fn test_missing_key() {
        let err = describe_locator(&settings(), "nope.text").unwrap_err();
        assert!(err.to_string().contains("nope.text"));
    }
}
