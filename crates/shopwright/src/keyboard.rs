//! Android key-code typing.
//!
//! Some inputs in the app (OTP boxes, the payment reference field) ignore
//! `send_keys` and only react to hardware key events, so text is typed one
//! key code at a time.

use crate::driver::AppDriver;
use crate::result::{ShopError, ShopResult};
use std::time::Duration;
use tracing::{debug, warn};

/// `KEYCODE_0`; digits are contiguous up to `KEYCODE_9` (16)
pub const KEYCODE_0: u32 = 7;
/// `KEYCODE_A`; letters are contiguous up to `KEYCODE_Z` (54)
pub const KEYCODE_A: u32 = 29;
/// `KEYCODE_DEL` (backspace)
pub const KEYCODE_DEL: u32 = 67;
/// `KEYCODE_MOVE_END`
pub const KEYCODE_MOVE_END: u32 = 123;

/// Key code for `0-9` / `A-Z` (lower case maps like upper case)
pub fn keycode_for(c: char) -> ShopResult<u32> {
    let upper = c.to_ascii_uppercase();
    match upper {
        '0'..='9' => Ok(KEYCODE_0 + (upper as u32 - '0' as u32)),
        'A'..='Z' => Ok(KEYCODE_A + (upper as u32 - 'A' as u32)),
        _ => Err(ShopError::invalid(
            "key",
            format!("no Android key code for '{c}'"),
        )),
    }
}

/// Character produced by a digit or letter key code
#[must_use]
pub fn char_for_keycode(code: u32) -> Option<char> {
    match code {
        7..=16 => char::from_digit(code - KEYCODE_0, 10),
        29..=54 => char::from_u32('A' as u32 + (code - KEYCODE_A)),
        _ => None,
    }
}

/// Press `code`, retrying up to `retries` more times on failure.
pub async fn press_with_retry(
    driver: &dyn AppDriver,
    code: u32,
    retries: u32,
    interval: Duration,
) -> ShopResult<()> {
    let mut attempt = 0;
    loop {
        match driver.press_keycode(code).await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < retries => {
                attempt += 1;
                debug!(code, attempt, error = %e, "key press failed, retrying");
                tokio::time::sleep(interval).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Type `text` as key codes. Fails before pressing anything if a character
/// has no key code.
pub async fn type_keycodes(driver: &dyn AppDriver, text: &str) -> ShopResult<()> {
    let codes = text.chars().map(keycode_for).collect::<ShopResult<Vec<_>>>()?;
    for code in codes {
        press_with_retry(driver, code, 2, Duration::from_millis(200)).await?;
    }
    Ok(())
}

/// Move to the end of the focused input and press DEL `count` times.
pub async fn clear_keycodes(driver: &dyn AppDriver, count: usize) -> ShopResult<()> {
    driver.press_keycode(KEYCODE_MOVE_END).await?;
    for _ in 0..count {
        driver.press_keycode(KEYCODE_DEL).await?;
    }
    Ok(())
}

/// Hide the soft keyboard; failures are logged and ignored.
pub async fn hide_keyboard(driver: &dyn AppDriver) {
    if let Err(e) = driver.hide_keyboard().await {
        warn!(error = %e, "could not hide keyboard");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement};
    use crate::locator::Locator;

    #[test]
    fn test_keycode_mapping() {
        assert_eq!(keycode_for('0').unwrap(), 7);
        assert_eq!(keycode_for('9').unwrap(), 16);
        assert_eq!(keycode_for('A').unwrap(), 29);
        assert_eq!(keycode_for('z').unwrap(), 54);
        assert!(keycode_for('-').is_err());
        assert_eq!(char_for_keycode(16), Some('9'));
        assert_eq!(char_for_keycode(54), Some('Z'));
        assert_eq!(char_for_keycode(KEYCODE_DEL), None);
    }

    #[tokio::test]
    async fn test_type_and_clear() {
        let input = Locator::id("ref");
        let mock = MockDriver::android().with(input.clone(), MockElement::visible());
        let el = mock.find_element(&input).await.unwrap().unwrap();
        mock.click(&el).await.unwrap();

        type_keycodes(&mock, "ab12").await.unwrap();
        assert_eq!(mock.text_of(&input).as_deref(), Some("AB12"));

        clear_keycodes(&mock, 12).await.unwrap();
        assert_eq!(mock.text_of(&input).as_deref(), Some(""));
        assert_eq!(mock.keycodes()[4], KEYCODE_MOVE_END);
    }

    #[tokio::test]
    async fn test_invalid_text_presses_nothing() {
        let mock = MockDriver::android();
        assert!(type_keycodes(&mock, "12#").await.is_err());
        assert!(mock.keycodes().is_empty());
    }
}
