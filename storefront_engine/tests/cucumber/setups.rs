use cucumber::given;
use storefront_engine::{
    db_types::{Amount, NewProduct},
    traits::{CartManagement, InventoryManagement},
};

use crate::cucumber::{storefront_world::FulfillmentSystem, StorefrontWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut StorefrontWorld) {
    let system = FulfillmentSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a product {string} priced at {int} with {int} in stock")]
async fn add_product(world: &mut StorefrontWorld, name: String, price: i64, stock: i64) {
    let product = world
        .system()
        .db
        .insert_product(NewProduct::new(name.clone(), Amount::from(price), stock))
        .await
        .expect("Error creating product");
    world.products.insert(name, product.id);
}

#[given(expr = "user {int} has {int} {string} in their cart")]
async fn add_to_cart(world: &mut StorefrontWorld, user_id: i64, quantity: i64, name: String) {
    let product_id = world.product_id(&name);
    world.system().db.set_cart_item(user_id, product_id, quantity).await.expect("Error updating cart");
}
