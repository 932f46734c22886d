use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Amount, CartLine, OrderId, OrderItem, OrderStatusType, ProductId},
    sfe_api::errors::CartError,
    traits::OrderSnapshot,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_name: String,
    pub price: Amount,
    pub quantity: i64,
}

impl From<OrderItem> for OrderLine {
    fn from(item: OrderItem) -> Self {
        Self { product_name: item.product_name, price: item.price, quantity: item.quantity }
    }
}

/// The response to a successful checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub id: OrderId,
    pub total: Amount,
    pub items: Vec<OrderLine>,
}

impl From<OrderSnapshot> for CheckoutReceipt {
    fn from(snapshot: OrderSnapshot) -> Self {
        let items = snapshot.items.into_iter().map(OrderLine::from).collect();
        Self { id: snapshot.order.id, total: snapshot.order.total, items }
    }
}

/// The order snapshot that is exposed to order owners and privileged readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: OrderId,
    pub total: Amount,
    pub status: OrderStatusType,
    pub items: Vec<OrderLine>,
}

impl From<OrderSnapshot> for OrderView {
    fn from(snapshot: OrderSnapshot) -> Self {
        let items = snapshot.items.into_iter().map(OrderLine::from).collect();
        Self { id: snapshot.order.id, total: snapshot.order.total, status: snapshot.order.status, items }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusView {
    pub id: OrderId,
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Amount,
    pub quantity: i64,
}

impl From<CartLine> for CartLineView {
    fn from(line: CartLine) -> Self {
        Self { product_id: line.product_id, product_name: line.product_name, price: line.price, quantity: line.quantity }
    }
}

/// A user's cart as the storefront shows it. `total` is indicative only; checkout recomputes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total: Amount,
}

impl TryFrom<Vec<CartLine>> for CartView {
    type Error = CartError;

    fn try_from(lines: Vec<CartLine>) -> Result<Self, Self::Error> {
        let total = CartLine::total_of(&lines).ok_or(CartError::TotalTooLarge)?;
        let items = lines.into_iter().map(CartLineView::from).collect();
        Ok(Self { items, total })
    }
}
