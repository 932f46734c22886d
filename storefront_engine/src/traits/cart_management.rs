use chrono::Duration;

use crate::{
    db_types::{CartLine, CartPurgeResult, ProductId, UserId},
    traits::FulfillmentError,
};

#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// The user's cart contents, ordered by product id. A user without a cart has an empty one.
    async fn fetch_cart_items(&self, user_id: UserId) -> Result<Vec<CartLine>, FulfillmentError>;

    /// Sets the quantity of `product_id` in the user's cart, creating the cart and the entry as needed.
    ///
    /// Stock is deliberately not checked here; it is only enforced at checkout.
    async fn set_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartLine, FulfillmentError>;

    /// Removes the product from the user's cart. Returns `false` if it was not in the cart.
    async fn remove_cart_item(&self, user_id: UserId, product_id: ProductId) -> Result<bool, FulfillmentError>;

    /// Empties every cart that has not been touched for longer than `older_than`. When `delete_empty` is set, the
    /// emptied carts are deleted as well.
    async fn purge_stale_carts(
        &self,
        older_than: Duration,
        delete_empty: bool,
    ) -> Result<CartPurgeResult, FulfillmentError>;
}
