//! Step definitions, one module per app area.
//!
//! Steps register themselves with the cucumber collector; a step that
//! returns `Err` fails the scenario with that message.

mod account;
mod cart;
mod checkout;
mod home;
mod login;
mod orders;
mod payments;
mod products;

use shopwright::{ShopError, ShopResult};

/// `Ok` when `shown`, else an assertion failure naming `what`
pub(crate) fn expect_shown(shown: bool, what: &str) -> ShopResult<()> {
    if shown {
        Ok(())
    } else {
        Err(ShopError::assertion(format!("{what} is not displayed")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_shown() {
        assert!(expect_shown(true, "Cart page").is_ok());
        let err = expect_shown(false, "Cart page").unwrap_err();
        assert!(err.to_string().contains("Cart page is not displayed"));
    }
}
