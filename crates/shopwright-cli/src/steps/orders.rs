//! Order listing, order details and reorder steps

use super::expect_shown;
use crate::world::ShopWorld;
use cucumber::{given, then, when};
use shopwright::navigation::PAYABLE_STATUS;
use shopwright::pages::{CartPage, HomePage, OrderDetailsPage, OrdersPage, ReorderPage};
use shopwright::ShopResult;

// ===== Order listing =====

#[given("the user is on order listing page")]
async fn on_order_listing(world: &mut ShopWorld) -> ShopResult<()> {
    world.nav()?.to_orders().await?;
    let shown = world.page(OrdersPage::new)?.is_orders_page_displayed().await;
    expect_shown(shown, "Orders page")
}

#[when(regex = r"^user opens the first (Self-Collect|Delivery) order with highest priority status$")]
async fn open_first_order(world: &mut ShopWorld, order_type: String) -> ShopResult<()> {
    world
        .page(OrdersPage::new)?
        .open_first_matching(&order_type, &[PAYABLE_STATUS.to_string()])
        .await
}

#[then("the order details page should be displayed")]
async fn order_details_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world.page(OrderDetailsPage::new)?.is_order_details_displayed().await;
    expect_shown(shown, "Order details page")
}

// ===== Reorder =====

#[when("the user click Order Again button")]
async fn click_order_again(world: &mut ShopWorld) -> ShopResult<()> {
    let home = world.page(HomePage::new)?;
    home.switch_to_delivery_tab().await?;
    home.view_order_again().await
}

#[then("completed recent orders page should be displayed")]
async fn order_again_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world.page(ReorderPage::new)?.is_order_again_page_displayed().await;
    expect_shown(shown, "Order again page")
}

#[when("user clicks reorder button of the most recent order")]
async fn click_most_recent_reorder(world: &mut ShopWorld) -> ShopResult<()> {
    world.page(ReorderPage::new)?.click_reorder().await
}

#[then("cart page should be displayed with the same items as the original order")]
async fn reordered_cart_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world.page(CartPage::new)?.is_cart_page_displayed().await;
    expect_shown(shown, "Cart page")
}

#[then("user should be able to complete the selfcollect order")]
async fn complete_self_collect(world: &mut ShopWorld) -> ShopResult<()> {
    world.nav()?.complete_self_collect_reorder().await
}

#[then("user should be able to complete the delivery order")]
async fn complete_delivery(world: &mut ShopWorld) -> ShopResult<()> {
    world.nav()?.complete_delivery_reorder().await
}

#[when("user clicks re-order button")]
async fn click_reorder_on_details(world: &mut ShopWorld) -> ShopResult<()> {
    world.page(OrderDetailsPage::new)?.click_reorder().await
}

#[then("track order button should be visible")]
async fn track_order_visible(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world.page(OrderDetailsPage::new)?.is_track_order_visible().await;
    expect_shown(shown, "Track order button")
}
