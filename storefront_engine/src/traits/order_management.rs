use crate::{
    db_types::{Order, OrderId, OrderItem, OrderStatusType, UserId},
    traits::{CheckoutResult, FulfillmentError, OrderTransition},
};

#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Turns the user's cart into an order, in a single atomic unit:
    /// * the cart is claimed, so that concurrent checkouts by the same user are serialized,
    /// * the cart items are read in ascending product id order, which is also the order in which products are touched,
    /// * every item is checked against the available stock,
    /// * stock is decremented, the order and one line item per cart entry are created, and
    /// * the cart is cleared.
    ///
    /// If the cart is empty, or any item is short of stock, nothing is written and a [`CheckoutResult::Rejected`] is
    /// returned. Lock contention is reported as [`FulfillmentError::Transient`]; the whole call can be retried.
    async fn checkout_cart(&self, user_id: UserId) -> Result<CheckoutResult, FulfillmentError>;

    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, FulfillmentError>;

    async fn fetch_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, FulfillmentError>;

    /// All the user's orders, newest first.
    async fn fetch_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, FulfillmentError>;

    /// Moves the order to `requested`, provided that is exactly one step forward from its current status.
    ///
    /// The read and the update happen in one transaction. This method does no authorization.
    ///
    /// ## Failure modes:
    /// - If the order does not exist.
    async fn advance_order_status(
        &self,
        order_id: OrderId,
        requested: OrderStatusType,
    ) -> Result<OrderTransition, FulfillmentError>;
}
