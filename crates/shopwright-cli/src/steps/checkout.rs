//! Fulfilment details steps

use crate::world::ShopWorld;
use cucumber::when;
use shopwright::ShopResult;

#[when("user inputs plate number")]
async fn input_plate_number(world: &mut ShopWorld) -> ShopResult<()> {
    world.fulfilment()?.fill_plate_number_and_proceed().await
}

#[when("user clicks Proceed to payment button")]
async fn proceed_to_payment(world: &mut ShopWorld) -> ShopResult<()> {
    world.fulfilment()?.click_proceed_to_payment().await
}

#[when("the user switches to the Delivery method page")]
async fn switch_to_delivery_method(world: &mut ShopWorld) -> ShopResult<()> {
    world.fulfilment()?.switch_to_delivery_method().await
}
