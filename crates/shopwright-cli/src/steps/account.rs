//! Account, profile, notification preference and logout steps

use super::expect_shown;
use crate::world::ShopWorld;
use cucumber::{given, then, when};
use shopwright::pages::{HomePage, ProfilePage};
use shopwright::{ShopError, ShopResult};
use std::time::Duration;

#[given("user is on Profile page")]
async fn on_profile_page(world: &mut ShopWorld) -> ShopResult<()> {
    world.nav()?.to_profile().await
}

#[given("the user is on profile page")]
async fn on_profile_page_lower(world: &mut ShopWorld) -> ShopResult<()> {
    world.nav()?.to_profile().await
}

#[when("user clicks account button")]
async fn click_account(world: &mut ShopWorld) -> ShopResult<()> {
    world.page(HomePage::new)?.open_account_page().await
}

#[when("user clicks account button as guest")]
async fn click_account_as_guest(world: &mut ShopWorld) -> ShopResult<()> {
    world.session.logged_in = false;
    world.account()?.click_login().await
}

#[then("account profile should be displayed")]
async fn account_profile_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let account = world.account()?;
    expect_shown(account.wait_for_page_load(Duration::from_secs(10)).await, "Account page")?;
    if account.is_logged_in_phone_number_correct().await {
        Ok(())
    } else {
        Err(ShopError::assertion("Logged in phone number does not match the configured account"))
    }
}

#[then("account page should be displayed")]
async fn account_page_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let account = world.account()?;
    let loaded = account.wait_for_page_load(Duration::from_secs(10)).await;
    expect_shown(loaded && account.is_account_page_displayed().await, "Account page")
}

#[when("user clicks profile button")]
async fn click_profile(world: &mut ShopWorld) -> ShopResult<()> {
    world.page(ProfilePage::new)?.click_profile().await
}

#[then("profile page should be displayed")]
async fn profile_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world
        .page(ProfilePage::new)?
        .wait_for_profile_page(Duration::from_secs(10))
        .await;
    expect_shown(shown, "Profile page")
}

#[when("user clicks notification preferences button")]
async fn click_notification_preferences(world: &mut ShopWorld) -> ShopResult<()> {
    world.account()?.open_notification_preferences().await
}

#[then("notification preferences page should be displayed")]
async fn notification_preferences_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world.account()?.is_notification_preferences_displayed().await;
    expect_shown(shown, "Notification preferences page")
}

#[when("user toggles all notification preferences")]
async fn toggle_notifications(world: &mut ShopWorld) -> ShopResult<()> {
    let toggled = world.account()?.toggle_all_notifications().await?;
    if toggled == 0 {
        world.ui()?.warn_step("No notification toggles found");
    }
    Ok(())
}

#[then("user clicks update preferences button")]
async fn update_preferences(world: &mut ShopWorld) -> ShopResult<()> {
    world.account()?.update_preferences_and_verify_toast().await
}

#[then("the user logs out and returns to login page")]
async fn logout(world: &mut ShopWorld) -> ShopResult<()> {
    world.nav()?.logout(&mut world.session).await
}
