use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    db_types::{OrderId, OrderStatusType, UserId},
    sfe_api::{errors::OrderFlowError, retry::retry_transient},
    traits::{Action, Actor, CapabilityCheck, OrderManagement, OrderSnapshot, OrderTransition},
};

/// `OrderFlowApi` reads orders on behalf of their owners, and lets privileged operators move orders along their
/// fulfillment flow.
///
/// | Status    | Reached by                                           |
/// |-----------|------------------------------------------------------|
/// | Pending   | Checkout                                             |
/// | Paid      | A verified `paid` webhook, or a privileged operator   |
/// | Shipped   | A privileged operator                                |
/// | Completed | A privileged operator                                |
///
/// The order's owner can never move their own order, unless they also happen to hold the capability.
pub struct OrderFlowApi<B> {
    db: B,
    capabilities: Arc<dyn CapabilityCheck + Send + Sync>,
    max_attempts: u32,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, capabilities: Arc<dyn CapabilityCheck + Send + Sync>, max_attempts: u32) -> Self {
        Self { db, capabilities, max_attempts }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Moves the order to `requested`.
    ///
    /// The capability check happens before anything is read, so an unauthorized actor learns nothing about the
    /// order.
    ///
    /// ## Failure modes:
    /// - The actor lacks [`Action::UpdateOrderStatus`].
    /// - The order does not exist.
    /// - The order is already `completed`.
    /// - `requested` is not the next status in `pending → paid → shipped → completed`.
    pub async fn update_status(
        &self,
        actor: &Actor,
        order_id: OrderId,
        requested: OrderStatusType,
    ) -> Result<OrderSnapshot, OrderFlowError> {
        if !self.capabilities.has_capability(actor, Action::UpdateOrderStatus) {
            warn!("🔄️📦️ User {} tried to move order {order_id} to {requested} without permission", actor.user_id);
            return Err(OrderFlowError::Forbidden(Action::UpdateOrderStatus));
        }
        let transition =
            retry_transient("order status", self.max_attempts, || self.db.advance_order_status(order_id, requested))
                .await?;
        match transition {
            OrderTransition::Advanced(order) => {
                info!("🔄️📦️ Order {order_id} moved to {} by user {}", order.status, actor.user_id);
                let items = self.db.fetch_order_items(order_id).await?;
                Ok(OrderSnapshot::new(order, items))
            },
            OrderTransition::AlreadyCompleted(_) => {
                debug!("🔄️📦️ Order {order_id} is already completed. Cannot move it to {requested}");
                Err(OrderFlowError::AlreadyCompleted)
            },
            OrderTransition::Rejected { current, requested } => {
                debug!("🔄️📦️ Order {order_id} cannot move from {current} to {requested}");
                Err(OrderFlowError::InvalidTransition { current, requested })
            },
        }
    }

    /// Parses a status string before calling [`Self::update_status`].
    pub async fn update_status_str(
        &self,
        actor: &Actor,
        order_id: OrderId,
        requested: &str,
    ) -> Result<OrderSnapshot, OrderFlowError> {
        if !self.capabilities.has_capability(actor, Action::UpdateOrderStatus) {
            return Err(OrderFlowError::Forbidden(Action::UpdateOrderStatus));
        }
        let requested = requested
            .trim()
            .to_ascii_lowercase()
            .parse::<OrderStatusType>()
            .map_err(|_| OrderFlowError::InvalidStatus(requested.to_string()))?;
        self.update_status(actor, order_id, requested).await
    }

    /// Fetches an order with its line items.
    ///
    /// Owners can always see their orders. Anyone else needs [`Action::ViewOrder`]. To avoid confirming that another
    /// user's order exists, a refusal looks exactly like a missing order.
    pub async fn order_for_actor(&self, actor: &Actor, order_id: OrderId) -> Result<OrderSnapshot, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if order.user_id != actor.user_id && !self.capabilities.has_capability(actor, Action::ViewOrder) {
            debug!("🔄️📦️ User {} asked for order {order_id}, which belongs to someone else", actor.user_id);
            return Err(OrderFlowError::OrderNotFound(order_id));
        }
        let items = self.db.fetch_order_items(order_id).await?;
        Ok(OrderSnapshot::new(order, items))
    }

    /// All the user's orders with their line items, newest first.
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderSnapshot>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.db.fetch_order_items(order.id).await?;
            result.push(OrderSnapshot::new(order, items));
        }
        Ok(result)
    }
}
