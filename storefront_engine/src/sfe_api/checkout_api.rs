use std::fmt::Debug;

use log::*;

use crate::{
    db_types::UserId,
    sfe_api::{errors::CheckoutError, retry::retry_transient},
    traits::{CheckoutRejection, CheckoutResult, OrderManagement, OrderSnapshot},
};

pub const DEFAULT_CHECKOUT_ATTEMPTS: u32 = 3;

/// `CheckoutApi` converts a user's cart into an order without ever overselling stock.
pub struct CheckoutApi<B> {
    db: B,
    max_attempts: u32,
}

impl<B> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi (max_attempts: {})", self.max_attempts)
    }
}

impl<B> CheckoutApi<B> {
    pub fn new(db: B, max_attempts: u32) -> Self {
        Self { db, max_attempts }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CheckoutApi<B>
where B: OrderManagement
{
    /// Checks out the user's cart.
    ///
    /// The checkout is all-or-nothing. On success the cart is empty, every product's stock has dropped by exactly
    /// the quantity ordered, and the order total is the sum of the line items at today's prices. On failure nothing
    /// has changed.
    ///
    /// Lock contention is retried up to `max_attempts` times before being reported as
    /// [`CheckoutError::TryAgainLater`], which is distinct from the business rejections (`CartEmpty`,
    /// `InsufficientStock`).
    pub async fn checkout(&self, user_id: UserId) -> Result<OrderSnapshot, CheckoutError> {
        trace!("🛒️ Checkout requested by user {user_id}");
        let result = retry_transient("checkout", self.max_attempts, || self.db.checkout_cart(user_id)).await?;
        match result {
            CheckoutResult::Placed(snapshot) => {
                info!(
                    "🛒️ User {user_id} placed order {} for {} ({} lines)",
                    snapshot.order.id,
                    snapshot.order.total,
                    snapshot.items.len()
                );
                Ok(snapshot)
            },
            CheckoutResult::Rejected(CheckoutRejection::CartEmpty) => {
                debug!("🛒️ User {user_id} tried to check out an empty cart");
                Err(CheckoutError::CartEmpty)
            },
            CheckoutResult::Rejected(CheckoutRejection::InsufficientStock {
                product_id,
                product_name,
                requested,
                available,
            }) => {
                info!(
                    "🛒️ Checkout for user {user_id} rejected. {product_name} (#{product_id}) has {available} in stock, \
                     but {requested} were requested"
                );
                Err(CheckoutError::InsufficientStock { product_id, product_name, requested, available })
            },
            CheckoutResult::Rejected(CheckoutRejection::TotalTooLarge) => {
                warn!("🛒️ Checkout for user {user_id} rejected. The cart total does not fit in an order");
                Err(CheckoutError::TotalTooLarge)
            },
        }
    }
}
