use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType, PaymentStatus, ProductId},
    traits::{Action, FulfillmentError},
};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    CartEmpty,
    #[error("Not enough stock for {product_name}")]
    InsufficientStock { product_id: ProductId, product_name: String, requested: i64, available: i64 },
    #[error("Order total is too large")]
    TotalTooLarge,
    #[error("Checkout could not be completed right now. Please try again.")]
    TryAgainLater(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<FulfillmentError> for CheckoutError {
    fn from(e: FulfillmentError) -> Self {
        match e {
            FulfillmentError::Transient(s) => CheckoutError::TryAgainLater(s),
            other => CheckoutError::DatabaseError(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),
    #[error("Order already completed")]
    AlreadyCompleted,
    #[error("Invalid status transition from {current} to {requested}")]
    InvalidTransition { current: OrderStatusType, requested: OrderStatusType },
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Permission denied. {0} is required.")]
    Forbidden(Action),
    #[error("The order could not be updated right now. Please try again.")]
    TryAgainLater(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<FulfillmentError> for OrderFlowError {
    fn from(e: FulfillmentError) -> Self {
        match e {
            FulfillmentError::OrderNotFound(id) => OrderFlowError::OrderNotFound(id),
            FulfillmentError::Transient(s) => OrderFlowError::TryAgainLater(s),
            other => OrderFlowError::DatabaseError(other.to_string()),
        }
    }
}

/// Reasons a webhook body does not describe a usable payment event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentEventError {
    #[error("Webhook body must be a JSON object")]
    NotAnObject,
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid transaction")]
    InvalidTransactionId(String),
    #[error("Invalid order id: {0}")]
    InvalidOrderId(String),
    #[error("Invalid status: {0}")]
    UnknownStatus(String),
    #[error("Invalid provider: {0}")]
    UnknownProvider(String),
}

#[derive(Debug, Clone, Error)]
pub enum PaymentFlowError {
    #[error("{0}")]
    InvalidEvent(#[from] PaymentEventError),
    #[error("Invalid provider: {0}")]
    InvalidProvider(String),
    #[error("Order not found")]
    OrderNotFound,
    #[error("Payment not found")]
    PaymentNotFound,
    #[error("Order already paid")]
    OrderAlreadyPaid,
    #[error("Transaction is already bound to another order")]
    TransactionOrderMismatch,
    #[error("A provider is required to record this transaction")]
    ProviderRequired,
    #[error("Payment is already {current} and cannot become {requested}")]
    Conflict { current: PaymentStatus, requested: PaymentStatus },
    #[error("Order has already been settled by another payment")]
    OrderAlreadySettled,
    #[error("The payment could not be processed right now. Please try again.")]
    TryAgainLater(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<FulfillmentError> for PaymentFlowError {
    fn from(e: FulfillmentError) -> Self {
        match e {
            FulfillmentError::OrderNotFound(_) => PaymentFlowError::OrderNotFound,
            FulfillmentError::PaymentNotFound(_) => PaymentFlowError::PaymentNotFound,
            FulfillmentError::Transient(s) => PaymentFlowError::TryAgainLater(s),
            other => PaymentFlowError::DatabaseError(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("Quantity must be a positive integer")]
    InvalidQuantity,
    #[error("Quantity is too large")]
    QuantityTooLarge,
    #[error("Cart total is too large")]
    TotalTooLarge,
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),
    #[error("The cart could not be updated right now. Please try again.")]
    TryAgainLater(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<FulfillmentError> for CartError {
    fn from(e: FulfillmentError) -> Self {
        match e {
            FulfillmentError::ProductNotFound(id) => CartError::ProductNotFound(id),
            FulfillmentError::Transient(s) => CartError::TryAgainLater(s),
            other => CartError::DatabaseError(other.to_string()),
        }
    }
}
