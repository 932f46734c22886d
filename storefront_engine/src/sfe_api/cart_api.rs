use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::{CartLine, CartPurgeResult, ProductId, UserId},
    sfe_api::{errors::CartError, order_objects::CartView},
    traits::{CartManagement, InventoryManagement},
};

pub struct CartApi<B> {
    db: B,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi")
    }
}

impl<B> CartApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CartApi<B>
where B: CartManagement + InventoryManagement
{
    pub async fn cart(&self, user_id: UserId) -> Result<CartView, CartError> {
        let lines = self.db.fetch_cart_items(user_id).await?;
        CartView::try_from(lines)
    }

    /// Sets the quantity of a product in the user's cart. Adding more than is in stock is allowed.
    pub async fn set_item(&self, user_id: UserId, product_id: ProductId, quantity: i64) -> Result<CartLine, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity);
        }
        let product = self.db.fetch_product(product_id).await?.ok_or(CartError::ProductNotFound(product_id))?;
        if product.price.checked_mul(quantity).is_none() {
            return Err(CartError::QuantityTooLarge);
        }
        let line = self.db.set_cart_item(user_id, product_id, quantity).await?;
        debug!("🛒️ User {user_id} now has {quantity} of product #{product_id} in their cart");
        Ok(line)
    }

    pub async fn remove_item(&self, user_id: UserId, product_id: ProductId) -> Result<(), CartError> {
        if self.db.remove_cart_item(user_id, product_id).await? {
            debug!("🛒️ Product #{product_id} removed from user {user_id}'s cart");
            Ok(())
        } else {
            Err(CartError::NotInCart(product_id))
        }
    }

    pub async fn purge_stale_carts(
        &self,
        older_than: Duration,
        delete_empty: bool,
    ) -> Result<CartPurgeResult, CartError> {
        let result = self.db.purge_stale_carts(older_than, delete_empty).await?;
        if result.items_removed > 0 || result.carts_deleted > 0 {
            info!(
                "🛒️ Removed {} items from stale carts and deleted {} empty carts",
                result.items_removed, result.carts_deleted
            );
        }
        Ok(result)
    }
}
