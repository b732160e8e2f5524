//! Bank transfer, payment confirmation and order submission steps

use super::expect_shown;
use crate::world::ShopWorld;
use cucumber::{given, then, when};
use shopwright::adb::Adb;
use shopwright::pages::{HomePage, OrderDetailsPage};
use shopwright::{ShopError, ShopResult};
use std::time::Duration;
use tracing::info;

// ===== Bank transfer =====

#[when("user selects a bank from the dropdown")]
async fn select_bank(world: &mut ShopWorld) -> ShopResult<()> {
    let payments = world.payments()?;
    let bank_transfer = payments.bank_transfer();
    bank_transfer.expand_section_if_needed().await?;
    let bank = bank_transfer.select_random_bank().await?;
    info!(%bank, "bank selected");
    Ok(())
}

#[when("user enters a unique reference number for bank transfer")]
async fn enter_reference(world: &mut ShopWorld) -> ShopResult<()> {
    let reference = world.settings()?.payment.reference();
    world
        .payments()?
        .bank_transfer()
        .enter_reference_number(&reference)
        .await?;
    world
        .ui()?
        .screenshot(&format!("Entered_Ref_{reference}"), false)
        .await;
    world.payment.set_reference(reference);
    Ok(())
}

#[when("user uploads proof of payment image")]
async fn upload_proof(world: &mut ShopWorld) -> ShopResult<()> {
    let settings = world.settings()?;
    let payment = settings.payment.clone();
    let udid = settings.appium.udid.clone();
    if let Some(local) = &payment.proof_file {
        let file_name = local
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ShopError::config(format!("payment.proof_file {} has no file name", local.display())))?;
        let remote = format!("{}/{file_name}", payment.proof_remote_dir.trim_end_matches('/'));
        Adb::new(udid).push_and_scan(local, &remote).await?;
    }
    let ui = world.ui()?.clone();
    let uploaded = world
        .payments()?
        .bank_transfer()
        .upload_proof_of_payment(&payment.proof_folder, Duration::from_secs(payment.upload_wait_secs))
        .await;
    ui.screenshot("BankTransfer", uploaded.is_err()).await;
    uploaded
}

#[then("confirm payment button should be enabled")]
async fn confirm_enabled(world: &mut ShopWorld) -> ShopResult<()> {
    let payments = world.payments()?;
    payments.capture_payment(&mut world.payment).await?;
    if payments.bank_transfer().confirm_payment_if_enabled().await {
        Ok(())
    } else {
        Err(ShopError::assertion("Confirm Payment button is not enabled"))
    }
}

#[when("user clicks confirm payment button")]
async fn click_confirm(world: &mut ShopWorld) -> ShopResult<()> {
    let payments = world.payments()?;
    payments.capture_payment(&mut world.payment).await?;
    payments.click_confirm_payment().await
}

// ===== Order submission =====

#[when("user clicks complete order button")]
async fn click_complete_order(world: &mut ShopWorld) -> ShopResult<()> {
    world.payments()?.click_complete_order().await
}

#[when("user clicks view order")]
async fn click_view_order(world: &mut ShopWorld) -> ShopResult<()> {
    world.payments()?.click_view_order().await
}

#[then("the order details page should be displayed with correct payment info")]
async fn order_details_with_payment(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world.payments()?.is_order_details_page_visible().await;
    expect_shown(shown, "Order details page")?;
    world
        .page(OrderDetailsPage::new)?
        .verify_transaction_details(&world.payment)
        .await
}

#[when("user clicks pay balance later button")]
async fn click_pay_later(world: &mut ShopWorld) -> ShopResult<()> {
    world.payments()?.click_pay_balance_later().await
}

#[then("user clicks back to home button and home page should be displayed")]
async fn back_to_home(world: &mut ShopWorld) -> ShopResult<()> {
    world.payments()?.click_back_to_home().await?;
    let shown = world.page(HomePage::new)?.wait_for_home_page().await;
    expect_shown(shown, "Home page")
}

// ===== Payment page =====

#[when("user clicks pay now link")]
async fn click_pay_now(world: &mut ShopWorld) -> ShopResult<()> {
    world.page(OrderDetailsPage::new)?.click_pay_now().await
}

#[then("payment page should be displayed")]
async fn payment_page_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let payments = world.payments()?;
    let loaded = payments.wait_for_page_load(Duration::from_secs(10)).await;
    expect_shown(loaded && payments.is_payments_displayed().await, "Payment page")
}

#[given("user has navigated to the Payment Page via Orders")]
async fn payment_page_via_active_orders(world: &mut ShopWorld) -> ShopResult<()> {
    let active = world.active_orders()?;
    active.view_active_orders().await?;
    expect_shown(active.is_active_orders_displayed().await, "Active orders")?;
    active.view_order_details().await?;
    world.page(OrderDetailsPage::new)?.click_pay_now().await?;
    let loaded = world
        .payments()?
        .wait_for_page_load(Duration::from_secs(10))
        .await;
    expect_shown(loaded, "Payment page")
}

#[given(regex = r"^the user is on the payment page of a (Self-Collect|Delivery) order$")]
async fn payment_page_via_order_list(world: &mut ShopWorld, order_type: String) -> ShopResult<()> {
    world.nav()?.to_payments_via_orders(&order_type).await
}
