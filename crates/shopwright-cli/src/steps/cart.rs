//! Cart steps and the product-to-fulfilment preconditions

use super::expect_shown;
use crate::world::ShopWorld;
use cucumber::{given, then, when};
use shopwright::pages::{CartPage, HomePage};
use shopwright::{ShopError, ShopResult};
use std::time::Duration;

// ===== Preconditions =====

#[given("the user is on the product details page via search")]
async fn on_product_details(world: &mut ShopWorld) -> ShopResult<()> {
    let term = world.search_term()?;
    world.nav()?.view_product_details(&term).await
}

#[given("the user is on the cart page")]
async fn on_cart_page(world: &mut ShopWorld) -> ShopResult<()> {
    let (term, quantity) = (world.search_term()?, world.quantity()?);
    world.nav()?.to_cart(&term, &quantity).await
}

#[given("the user is on fulfilment details page")]
async fn on_fulfilment_page(world: &mut ShopWorld) -> ShopResult<()> {
    let (term, quantity) = (world.search_term()?, world.quantity()?);
    world.nav()?.to_fulfilment(&term, &quantity).await
}

// ===== Product page =====

#[when("user clicks add to cart button")]
async fn click_add_to_cart(world: &mut ShopWorld) -> ShopResult<()> {
    world.products()?.click_add_to_cart().await
}

#[when("user updates the quantity from config")]
async fn quantity_from_config(world: &mut ShopWorld) -> ShopResult<()> {
    let quantity = world.quantity()?;
    world.products()?.enter_quantity(&quantity).await
}

#[when("user updates the quantity of the product")]
async fn update_product_quantity(world: &mut ShopWorld) -> ShopResult<()> {
    let quantity = world.quantity()?;
    world.products()?.enter_quantity(&quantity).await
}

#[when("the user selects valid pickup location and clicks add to cart")]
async fn pickup_and_add(world: &mut ShopWorld) -> ShopResult<()> {
    world.pickup()?.select_valid_pickup_location().await
}

#[when("user clicks View Cart button")]
async fn click_view_cart(world: &mut ShopWorld) -> ShopResult<()> {
    world.products()?.click_view_cart().await
}

#[when("user clicks Add to cart button and updates the quantity")]
async fn add_and_update_quantity(world: &mut ShopWorld) -> ShopResult<()> {
    let quantity = world.quantity()?;
    let products = world.products()?;
    products.click_add_to_cart().await?;
    products.enter_quantity(&quantity).await
}

// ===== Cart page =====

#[when("user verify cart page has loaded")]
async fn cart_has_loaded(world: &mut ShopWorld) -> ShopResult<()> {
    let cart = world.page(CartPage::new)?;
    let loaded = cart.wait_for_page_load(Duration::from_secs(10)).await;
    expect_shown(loaded && cart.is_cart_page_displayed().await, "Cart page")
}

#[then("the cart page should be displayed")]
async fn cart_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let shown = world.page(CartPage::new)?.is_cart_page_displayed().await;
    expect_shown(shown, "Cart page")
}

#[then("the cart page should be displayed with the added item")]
async fn cart_has_added_items(world: &mut ShopWorld) -> ShopResult<()> {
    let items = world.settings()?.product.cart_items.clone();
    let cart = world.page(CartPage::new)?;
    let ui = world.ui()?.clone();
    let checked = async {
        expect_shown(cart.is_cart_page_displayed().await, "Cart page")?;
        for item in &items {
            if !cart.verify_cart_item_quantity(&item.name, item.quantity).await {
                return Err(ShopError::assertion(format!(
                    "'{}' with quantity {} not found in cart",
                    item.name, item.quantity
                )));
            }
        }
        Ok(())
    }
    .await;
    match checked {
        Ok(()) => {
            ui.screenshot("cart_page_verification_success", false).await;
            Ok(())
        }
        Err(e) => {
            ui.screenshot("cart_page_verification_failed", true).await;
            Err(e)
        }
    }
}

#[then(regex = r#"^the cart delivery method should be "(.*)"$"#)]
async fn cart_delivery_method(world: &mut ShopWorld, method: String) -> ShopResult<()> {
    world.page(CartPage::new)?.verify_delivery_method(&method).await
}

#[when("user attempts to update the quantity")]
async fn update_cart_quantity(world: &mut ShopWorld) -> ShopResult<()> {
    let quantity = world.quantity()?;
    world.page(CartPage::new)?.update_quantity(&quantity).await
}

#[when("user clicks Add More Items button")]
async fn click_add_more_items(world: &mut ShopWorld) -> ShopResult<()> {
    world.page(CartPage::new)?.click_add_more_items().await
}

#[when("the user searches for a product")]
async fn search_second_product(world: &mut ShopWorld) -> ShopResult<()> {
    let product = &world.settings()?.product;
    let term = product
        .second_search_term
        .clone()
        .unwrap_or_else(|| product.search_term.clone());
    world.page(HomePage::new)?.enter_search_query(&term).await
}

#[when("the user clears the cart items")]
async fn clear_cart(world: &mut ShopWorld) -> ShopResult<()> {
    let cleared = world.page(CartPage::new)?.clear_cart_items().await?;
    expect_shown(cleared, "Empty cart")
}

#[when("the user clicks start shopping button")]
async fn click_start_shopping(world: &mut ShopWorld) -> ShopResult<()> {
    world.page(CartPage::new)?.click_start_shopping().await
}

// ===== Fulfilment =====

#[when("user clicks Proceed to fulfilment button")]
async fn proceed_to_fulfilment(world: &mut ShopWorld) -> ShopResult<()> {
    world.page(CartPage::new)?.click_proceed_to_fulfilment().await
}

#[then("user should see the Fulfilment Details page")]
async fn fulfilment_displayed(world: &mut ShopWorld) -> ShopResult<()> {
    let fulfilment = world.fulfilment()?;
    let loaded = fulfilment.wait_for_page_load(Duration::from_secs(10)).await;
    expect_shown(
        loaded && fulfilment.is_fulfilment_details_displayed().await,
        "Fulfilment Details page",
    )
}
