//! Home page tabs, search field and order tracking

use super::expect_shown;
use crate::world::ShopWorld;
use cucumber::{given, then, when};
use shopwright::pages::HomePage;
use shopwright::{ShopError, ShopResult};
use tracing::info;

#[given("the user is on the Home page")]
async fn on_home_page(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world.page(HomePage::new)?.wait_for_home_page().await;
    expect_shown(shown, "Home page")
}

#[when("the user switches to the Delivery tab")]
async fn switch_to_delivery(world: &mut ShopWorld) -> ShopResult<()> {
    world.page(HomePage::new)?.switch_to_delivery_tab().await
}

#[then("the Delivery page should be displayed")]
async fn delivery_page_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world.page(HomePage::new)?.is_delivery_page_displayed().await;
    expect_shown(shown, "Delivery page")
}

#[when("user clicks Track Order button")]
async fn click_track_order(world: &mut ShopWorld) -> ShopResult<()> {
    world.active_orders()?.view_track_order_list().await
}

#[when("Selects any order from the list")]
async fn select_any_order(world: &mut ShopWorld) -> ShopResult<()> {
    match world.active_orders()?.select_order_by_priority().await? {
        Some(status) => {
            info!(%status, "opened order");
            Ok(())
        }
        None => Err(ShopError::assertion("no order with a tracked status in the list")),
    }
}

#[when("the user switches to the Self Collect tab")]
async fn switch_to_self_collect(world: &mut ShopWorld) -> ShopResult<()> {
    world.page(HomePage::new)?.switch_to_self_collect_tab().await
}

#[then("the order tracking page should be displayed")]
async fn order_tracking_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world.active_orders()?.is_order_tracking_page_displayed().await;
    expect_shown(shown, "Order tracking page")
}

#[then("the Self Collect page should be displayed")]
async fn self_collect_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world.page(HomePage::new)?.is_self_collect_page_displayed().await;
    world.ui()?.screenshot("self_collect_tab", !shown).await;
    expect_shown(shown, "Self Collect page")
}

#[when("the user taps on the Search field")]
async fn tap_search_field(world: &mut ShopWorld) -> ShopResult<()> {
    world.page(HomePage::new)?.tap_search_field().await
}
