//! Product listing, search results and pickup location steps

use super::expect_shown;
use crate::world::ShopWorld;
use cucumber::{then, when};
use shopwright::pages::HomePage;
use shopwright::{ShopError, ShopResult};

#[when("user clicks products button")]
async fn click_products(world: &mut ShopWorld) -> ShopResult<()> {
    world.products()?.click_browse_all_products().await
}

#[when("the user switches to the products Delivery tab")]
async fn switch_products_to_delivery(world: &mut ShopWorld) -> ShopResult<()> {
    world.products()?.switch_to_delivery_and_verify().await
}

#[then("the user switches back to Self Collect tab")]
async fn switch_products_to_self_collect(world: &mut ShopWorld) -> ShopResult<()> {
    world.products()?.switch_back_to_self_collect_and_verify().await
}

#[when("the user enters a valid product name")]
async fn enter_product_name(world: &mut ShopWorld) -> ShopResult<()> {
    let term = world.search_term()?;
    if term.trim().is_empty() {
        return Err(ShopError::config("product.search_term must be set"));
    }
    world.page(HomePage::new)?.enter_search_query(&term).await
}

#[when("the user taps on the first product in the search results")]
async fn tap_first_result(world: &mut ShopWorld) -> ShopResult<()> {
    let products = world.products()?;
    products.select_first_search_result().await?;
    world.ui()?.delay(1000).await;
    // The first tap can land on the keyboard dismissal
    products.select_first_search_result().await
}

#[when("user selects a pickup location")]
async fn select_pickup(world: &mut ShopWorld) -> ShopResult<()> {
    world.pickup()?.select_valid_pickup_location().await
}

#[then("the Product Details page should be displayed")]
async fn product_details_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world.products()?.is_products_page_displayed().await;
    expect_shown(shown, "Product Details page")
}

#[then("the search product page should be displayed")]
async fn search_page_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world.products()?.is_search_products_page_displayed().await;
    expect_shown(shown, "Search product page")
}

#[when("the user clicks home button")]
async fn click_home(world: &mut ShopWorld) -> ShopResult<()> {
    world.products()?.click_home().await
}
