//! Login, OTP and guest steps

use super::expect_shown;
use crate::world::ShopWorld;
use cucumber::{given, then, when};
use shopwright::pages::{HomePage, LoginPage, OtpPage};
use shopwright::permissions::{NotificationPopup, KEY_GUEST_BUTTON};
use shopwright::{ShopError, ShopResult};
use std::time::Duration;
use tracing::info;

const LOGIN_TITLE: &str = "loginPageTitle.text";
const GUEST_OPTION: &str = "Continue as Guest";

#[when("the user allows notifications")]
async fn allow_notifications(world: &mut ShopWorld) -> ShopResult<()> {
    let handled = world.page(NotificationPopup::new)?.handle_if_present().await;
    info!(handled, "notification popup");
    Ok(())
}

#[then("the login page should be displayed")]
async fn login_page_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world
        .page(LoginPage::new)?
        .wait_for_page_load(Duration::from_secs(5))
        .await;
    expect_shown(shown, "Login page")
}

#[given("the user is on the login page")]
async fn on_login_page(world: &mut ShopWorld) -> ShopResult<()> {
    if world.session.logged_in {
        world.ui()?.step("Already logged in, skipping login page check");
        return Ok(());
    }
    let shown = world.page(LoginPage::new)?.is_login_page_displayed().await;
    expect_shown(shown, "Login page")
}

#[when(regex = r#"^the user selects "(.*)"$"#)]
async fn select_login_option(world: &mut ShopWorld, option: String) -> ShopResult<()> {
    if !option.eq_ignore_ascii_case(GUEST_OPTION) {
        return Err(ShopError::invalid("login option", format!("unsupported option '{option}'")));
    }
    world.page(LoginPage::new)?.continue_as_guest().await?;
    world.session.logged_in = false;
    Ok(())
}

#[when(regex = r#"^the user enters valid phone number "(.*)"$"#)]
async fn enter_phone_number(world: &mut ShopWorld, phone: String) -> ShopResult<()> {
    if world.page(HomePage::new)?.is_home_page_displayed().await {
        world.ui()?.step("Already on Home page, skipping phone number entry");
        world.session.logged_in = true;
        return Ok(());
    }
    let login = world.page(LoginPage::new)?;
    login.enter_phone_number(&phone).await?;
    login.click_continue().await
}

#[then(regex = r#"^the user enters valid OTP "(.*)" and is redirected to the home page$"#)]
async fn enter_otp(world: &mut ShopWorld, otp: String) -> ShopResult<()> {
    let home = world.page(HomePage::new)?;
    if home.is_home_page_displayed().await {
        world.ui()?.step("Already on Home page, skipping OTP entry");
        world.session.logged_in = true;
        return Ok(());
    }
    let ui = world.ui()?.clone();
    ui.screenshot("before_otp_entry", false).await;
    let entered = async {
        OtpPage::new(ui.clone()).enter_otp(&otp).await?;
        expect_shown(home.wait_for_home_page().await, "Home page after OTP")
    }
    .await;
    if let Err(e) = entered {
        ui.screenshot("otp_input_failure", true).await;
        return Err(ShopError::assertion(format!("Failed to enter OTP: {e}")));
    }
    ui.screenshot("after_otp_entry", false).await;
    world.session.logged_in = true;
    Ok(())
}

#[then(regex = r#"^verify error message contains "(.*)"$"#)]
async fn error_message_contains(world: &mut ShopWorld, expected: String) -> ShopResult<()> {
    let actual = world.page(OtpPage::new)?.error_message().await;
    if actual.contains(&expected) {
        Ok(())
    } else {
        Err(ShopError::assertion(format!("expected '{expected}' in error, got '{actual}'")))
    }
}

#[given("the user is logged in")]
async fn logged_in(world: &mut ShopWorld) -> ShopResult<()> {
    if world.session.logged_in {
        world.ui()?.step("Already logged in");
        return Ok(());
    }
    let account = world.settings()?.account.clone();
    let ui = world.ui()?.clone();
    let login = async {
        NotificationPopup::new(ui.clone()).handle_if_present().await;
        let page = LoginPage::new(ui.clone());
        page.enter_phone_number(&account.phone_number).await?;
        page.click_continue().await?;
        let otp = OtpPage::new(ui.clone());
        if !otp.is_otp_page_displayed().await {
            ui.screenshot("otp_page_not_displayed", true).await;
            return Err(ShopError::state("OTP page was not displayed"));
        }
        otp.enter_otp(&account.otp).await?;
        otp.wait_for_verification_and_home_redirect().await?;
        expect_shown(HomePage::new(ui.clone()).wait_for_home_page().await, "Home page after login")
    }
    .await;
    if let Err(e) = login {
        ui.screenshot("login_failure", true).await;
        return Err(ShopError::assertion(format!("Login failed: {e}")));
    }
    world.session.logged_in = true;
    Ok(())
}

#[given("the user continues as guest")]
async fn continue_as_guest(world: &mut ShopWorld) -> ShopResult<()> {
    if world.session.logged_in {
        world.ui()?.step("Already logged in, skipping guest login");
        return Ok(());
    }
    let ui = world.ui()?.clone();
    let guest = async {
        let markers = [ui.locator(KEY_GUEST_BUTTON)?, ui.locator(LOGIN_TITLE)?];
        if ui.wait_any_visible(&markers, Duration::from_secs(20)).await.is_none() {
            return Err(ShopError::state("Login screen did not load in time"));
        }
        NotificationPopup::new(ui.clone()).handle_if_present().await;
        LoginPage::new(ui.clone()).continue_as_guest().await?;
        expect_shown(HomePage::new(ui.clone()).wait_for_home_page().await, "Home page")
    }
    .await;
    if let Err(e) = guest {
        ui.screenshot("guest_login_failed", true).await;
        return Err(ShopError::assertion(format!("Guest login failed: {e}")));
    }
    world.session.logged_in = false;
    Ok(())
}

#[then("the home page should be displayed")]
async fn home_page_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world.page(HomePage::new)?.wait_for_home_page().await;
    expect_shown(shown, "Home page")
}
