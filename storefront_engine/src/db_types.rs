//! Data types that are stored in, or read back from, the fulfillment database.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
pub use sfg_common::Amount;
use sqlx::{FromRow, Type};
use thiserror::Error;

pub type UserId = i64;
pub type ProductId = i64;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------        Product        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Amount,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Amount,
    pub stock: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Amount, stock: i64) -> Self {
        Self { name: name.into(), price, stock }
    }
}

/// The outcome of an atomic compare-and-decrement on a product's stock.
///
/// `ok == false` is a normal outcome and means the stock level was insufficient. The stock is unchanged in that case,
/// and `new_stock` carries the level that was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDecrement {
    pub ok: bool,
    pub new_stock: i64,
}

//--------------------------------------       CartLine        ---------------------------------------------------------
/// A single cart entry joined with the product details it refers to.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub cart_id: i64,
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Amount,
    pub stock: i64,
    pub quantity: i64,
}

impl CartLine {
    /// `None` when `price × quantity` cannot be represented.
    pub fn line_total(&self) -> Option<Amount> {
        self.price.checked_mul(self.quantity)
    }

    /// The combined value of a set of cart lines, or `None` if it overflows.
    pub fn total_of(lines: &[CartLine]) -> Option<Amount> {
        Amount::checked_sum(lines.iter().map(CartLine::line_total))
    }

    pub fn in_stock(&self) -> bool {
        self.quantity <= self.stock
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartPurgeResult {
    pub items_removed: u64,
    pub carts_deleted: u64,
}

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self).map_err(|_| ConversionError(format!("Invalid order id: {s}")))
    }
}

impl From<i64> for OrderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// The fulfillment status of an order.
///
/// | From \ To | Pending | Paid | Shipped | Completed |
/// |-----------|---------|------|---------|-----------|
/// | Pending   |         | Yes  |         |           |
/// | Paid      |         |      | Yes     |           |
/// | Shipped   |         |      |         | Yes       |
/// | Completed |         |      |         |           |
///
/// Transitions only ever move one step forward. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// The order has been placed and stock has been reserved, but no payment has settled.
    Pending,
    /// A payment for the order has been confirmed by the provider.
    Paid,
    /// The order has been handed over for delivery.
    Shipped,
    /// The order has been delivered. No further transitions are possible.
    Completed,
}

impl OrderStatusType {
    /// The only status this one may advance to, or `None` if the status is terminal.
    pub fn next(&self) -> Option<OrderStatusType> {
        match self {
            OrderStatusType::Pending => Some(OrderStatusType::Paid),
            OrderStatusType::Paid => Some(OrderStatusType::Shipped),
            OrderStatusType::Shipped => Some(OrderStatusType::Completed),
            OrderStatusType::Completed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    pub fn can_transition_to(&self, target: OrderStatusType) -> bool {
        self.next() == Some(target)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Paid => write!(f, "paid"),
            OrderStatusType::Shipped => write!(f, "shipped"),
            OrderStatusType::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Amount,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An immutable snapshot of a purchased product, taken at checkout time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_name: String,
    pub price: Amount,
    pub quantity: i64,
}

impl OrderItem {
    pub fn line_total(&self) -> Option<Amount> {
        self.price.checked_mul(self.quantity)
    }
}

//--------------------------------------    PaymentStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// The payment intent exists, but the provider has not reported an outcome yet.
    Pending,
    /// The provider has confirmed the payment. Terminal.
    Paid,
    /// The provider has reported the payment as failed, or it went stale. Terminal.
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------   PaymentProvider     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Vnpay,
    Momo,
}

impl Display for PaymentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentProvider::Vnpay => write!(f, "vnpay"),
            PaymentProvider::Momo => write!(f, "momo"),
        }
    }
}

impl FromStr for PaymentProvider {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vnpay" => Ok(Self::Vnpay),
            "momo" => Ok(Self::Momo),
            s => Err(ConversionError(format!("Invalid payment provider: {s}"))),
        }
    }
}

//--------------------------------------        Payment        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: OrderId,
    pub provider: PaymentProvider,
    pub amount: Amount,
    pub status: PaymentStatus,
    pub transaction_id: String,
    /// True once the provider's own transaction reference has been bound to this payment.
    pub provider_assigned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub provider: PaymentProvider,
    pub amount: Amount,
    pub transaction_id: String,
}

impl NewPayment {
    pub fn new(order_id: OrderId, provider: PaymentProvider, amount: Amount, transaction_id: String) -> Self {
        Self { order_id, provider, amount, transaction_id }
    }
}
