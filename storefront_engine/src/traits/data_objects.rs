use serde::{Deserialize, Serialize};

use crate::db_types::{Amount, Order, OrderItem, OrderStatusType, Payment, PaymentStatus, ProductId};

/// An order together with its line items. This is what checkout hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderSnapshot {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self { order, items }
    }

    /// The sum of `price × quantity` over the line items. Always equal to `order.total`.
    pub fn items_total(&self) -> Option<Amount> {
        Amount::checked_sum(self.items.iter().map(OrderItem::line_total))
    }
}

/// Why a checkout was turned down. None of these leave any trace in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutRejection {
    CartEmpty,
    InsufficientStock { product_id: ProductId, product_name: String, requested: i64, available: i64 },
    /// The cart is worth more than an order total can hold.
    TotalTooLarge,
}

#[derive(Debug, Clone)]
pub enum CheckoutResult {
    Placed(OrderSnapshot),
    Rejected(CheckoutRejection),
}

/// The result of asking the backend to move an order one step along its status flow.
#[derive(Debug, Clone)]
pub enum OrderTransition {
    Advanced(Order),
    AlreadyCompleted(Order),
    Rejected { current: OrderStatusType, requested: OrderStatusType },
}

/// Reasons a verified payment event could not be applied. The database is untouched in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileRejection {
    /// Neither the transaction nor the order it names is known.
    OrderNotFound,
    /// The transaction id is already bound to a different order.
    TransactionOrderMismatch,
    /// A new payment record would have to be created, but the event did not say which provider it came from.
    ProviderRequired,
    /// The payment already reached a different terminal status.
    Conflict { current: PaymentStatus, requested: PaymentStatus },
    /// Another payment has already settled this order.
    OrderAlreadySettled,
}

#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    Applied(Payment),
    AlreadyProcessed(Payment),
    Rejected(ReconcileRejection),
}
