//! `SqliteDatabase` is a concrete implementation of a storefront fulfillment backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{carts, db_url, new_pool, orders, payments, products};
use crate::{
    db_types::{
        CartLine,
        CartPurgeResult,
        NewPayment,
        NewProduct,
        Order,
        OrderId,
        OrderItem,
        OrderStatusType,
        Payment,
        PaymentStatus,
        Product,
        ProductId,
        StockDecrement,
        UserId,
    },
    payment_objects::PaymentEvent,
    traits::{
        CartManagement,
        CheckoutRejection,
        CheckoutResult,
        FulfillmentError,
        InventoryManagement,
        OrderManagement,
        OrderSnapshot,
        OrderTransition,
        PaymentManagement,
        ReconcileOutcome,
        ReconcileRejection,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        products::insert_product(product, &mut conn).await
    }

    async fn fetch_product(&self, product_id: ProductId) -> Result<Option<Product>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn try_decrement_stock(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<StockDecrement, FulfillmentError> {
        if quantity <= 0 {
            return Err(FulfillmentError::InvalidData(format!("Cannot decrement stock by {quantity}")));
        }
        let mut conn = self.pool.acquire().await?;
        if let Some(new_stock) = products::try_decrement_stock(product_id, quantity, &mut conn).await? {
            trace!("🗃️ Stock for product #{product_id} decremented by {quantity} to {new_stock}");
            return Ok(StockDecrement { ok: true, new_stock });
        }
        let product =
            products::fetch_product(product_id, &mut conn).await?.ok_or(FulfillmentError::ProductNotFound(product_id))?;
        trace!("🗃️ Product #{product_id} has {} in stock. Cannot take {quantity}", product.stock);
        Ok(StockDecrement { ok: false, new_stock: product.stock })
    }
}

impl CartManagement for SqliteDatabase {
    async fn fetch_cart_items(&self, user_id: UserId) -> Result<Vec<CartLine>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let lines = carts::fetch_cart_lines_for_user(user_id, &mut conn).await?;
        Ok(lines)
    }

    async fn set_cart_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartLine, FulfillmentError> {
        if quantity <= 0 {
            return Err(FulfillmentError::InvalidData("Quantity must be positive".to_string()));
        }
        let mut tx = self.pool.begin().await?;
        let cart_id = carts::fetch_or_create_cart(user_id, &mut tx).await?;
        if products::fetch_product(product_id, &mut tx).await?.is_none() {
            tx.rollback().await?;
            return Err(FulfillmentError::ProductNotFound(product_id));
        }
        carts::upsert_cart_item(cart_id, product_id, quantity, &mut tx).await?;
        let line = carts::fetch_cart_line(cart_id, product_id, &mut tx)
            .await?
            .ok_or(FulfillmentError::ProductNotFound(product_id))?;
        tx.commit().await?;
        Ok(line)
    }

    async fn remove_cart_item(&self, user_id: UserId, product_id: ProductId) -> Result<bool, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let removed = carts::remove_cart_item(user_id, product_id, &mut conn).await?;
        Ok(removed > 0)
    }

    async fn purge_stale_carts(
        &self,
        older_than: Duration,
        delete_empty: bool,
    ) -> Result<CartPurgeResult, FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        let result = carts::purge_stale_carts(older_than, delete_empty, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Stale cart purge: {result:?}");
        Ok(result)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn checkout_cart(&self, user_id: UserId) -> Result<CheckoutResult, FulfillmentError> {
        // Cheap rejection of empty carts before any lock is taken
        {
            let mut conn = self.pool.acquire().await?;
            if carts::count_items_for_user(user_id, &mut conn).await? == 0 {
                return Ok(CheckoutResult::Rejected(CheckoutRejection::CartEmpty));
            }
        }
        let mut tx = self.pool.begin().await?;
        let Some(cart_id) = carts::claim_cart(user_id, &mut tx).await? else {
            tx.rollback().await?;
            return Ok(CheckoutResult::Rejected(CheckoutRejection::CartEmpty));
        };
        let lines = carts::fetch_cart_lines(cart_id, &mut tx).await?;
        if lines.is_empty() {
            // Another checkout emptied the cart between the check above and the claim
            tx.rollback().await?;
            return Ok(CheckoutResult::Rejected(CheckoutRejection::CartEmpty));
        }
        if let Some(short) = lines.iter().find(|line| !line.in_stock()) {
            tx.rollback().await?;
            return Ok(CheckoutResult::Rejected(insufficient_stock(short, short.stock)));
        }
        let Some(total) = CartLine::total_of(&lines) else {
            tx.rollback().await?;
            return Ok(CheckoutResult::Rejected(CheckoutRejection::TotalTooLarge));
        };
        let order = orders::insert_order(user_id, total, &mut tx).await?;
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            match products::try_decrement_stock(line.product_id, line.quantity, &mut tx).await? {
                Some(new_stock) => {
                    trace!("🗃️ Product #{} stock is now {new_stock} after order {}", line.product_id, order.id);
                },
                None => {
                    // Cannot happen while the write lock is held. The decrement has the final word on stock
                    let available =
                        products::fetch_product(line.product_id, &mut tx).await?.map(|p| p.stock).unwrap_or_default();
                    tx.rollback().await?;
                    return Ok(CheckoutResult::Rejected(insufficient_stock(line, available)));
                },
            }
            items.push(orders::insert_order_item(order.id, line, &mut tx).await?);
        }
        let cleared = carts::clear_cart(cart_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} saved for user {user_id}. {cleared} cart items cleared", order.id);
        Ok(CheckoutResult::Placed(OrderSnapshot::new(order, items)))
    }

    async fn fetch_order(&self, order_id: OrderId) -> Result<Option<Order>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn advance_order_status(
        &self,
        order_id: OrderId,
        requested: OrderStatusType,
    ) -> Result<OrderTransition, FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        if !orders::lock_order(order_id, &mut tx).await? {
            tx.rollback().await?;
            return Err(FulfillmentError::OrderNotFound(order_id));
        }
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(FulfillmentError::OrderNotFound(order_id))?;
        let current = order.status;
        if current.is_terminal() {
            tx.rollback().await?;
            return Ok(OrderTransition::AlreadyCompleted(order));
        }
        if !current.can_transition_to(requested) {
            tx.rollback().await?;
            return Ok(OrderTransition::Rejected { current, requested });
        }
        let updated = orders::update_order_status(order_id, current, requested, &mut tx)
            .await?
            .ok_or_else(|| FulfillmentError::Transient(format!("Order {order_id} changed status concurrently")))?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} status changed from {current} to {requested}");
        Ok(OrderTransition::Advanced(updated))
    }
}

impl PaymentManagement for SqliteDatabase {
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::insert_payment(payment, false, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payment(&self, payment_id: i64) -> Result<Option<Payment>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment(payment_id, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payment_by_transaction_id(&self, transaction_id: &str) -> Result<Option<Payment>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let payment = payments::fetch_payment_by_transaction_id(transaction_id, &mut conn).await?;
        Ok(payment)
    }

    async fn fetch_payments_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>, FulfillmentError> {
        let mut conn = self.pool.acquire().await?;
        let payments = payments::fetch_payments_for_order(order_id, &mut conn).await?;
        Ok(payments)
    }

    async fn reconcile_payment_event(&self, event: &PaymentEvent) -> Result<ReconcileOutcome, FulfillmentError> {
        let txid = event.transaction_id.as_str();
        let mut tx = self.pool.begin().await?;
        let order_exists = orders::lock_order(event.order_id, &mut tx).await?;
        let payment = match payments::fetch_payment_by_transaction_id(txid, &mut tx).await? {
            Some(p) if p.order_id != event.order_id => {
                tx.rollback().await?;
                return Ok(ReconcileOutcome::Rejected(ReconcileRejection::TransactionOrderMismatch));
            },
            Some(p) => p,
            None if !order_exists => {
                tx.rollback().await?;
                return Ok(ReconcileOutcome::Rejected(ReconcileRejection::OrderNotFound));
            },
            None => match payments::fetch_adoptable_payment(event.order_id, event.provider, &mut tx).await? {
                Some(pending) => {
                    let p = payments::attach_transaction_id(pending.id, txid, event.provider, &mut tx).await?;
                    debug!("🗃️ Payment #{} adopted provider reference [{txid}]", p.id);
                    p
                },
                None => {
                    let Some(provider) = event.provider else {
                        tx.rollback().await?;
                        return Ok(ReconcileOutcome::Rejected(ReconcileRejection::ProviderRequired));
                    };
                    let order = orders::fetch_order(event.order_id, &mut tx)
                        .await?
                        .ok_or(FulfillmentError::OrderNotFound(event.order_id))?;
                    let new_payment = NewPayment::new(order.id, provider, order.total, txid.to_string());
                    let p = payments::insert_payment(new_payment, true, &mut tx).await?;
                    debug!("🗃️ Payment #{} created for provider reference [{txid}]", p.id);
                    p
                },
            },
        };
        if payment.status == event.outcome {
            tx.rollback().await?;
            return Ok(ReconcileOutcome::AlreadyProcessed(payment));
        }
        if payment.status.is_terminal() {
            tx.rollback().await?;
            let rejection = ReconcileRejection::Conflict { current: payment.status, requested: event.outcome };
            return Ok(ReconcileOutcome::Rejected(rejection));
        }
        if event.outcome == PaymentStatus::Paid && payments::paid_payment_exists(payment.order_id, &mut tx).await? {
            tx.rollback().await?;
            return Ok(ReconcileOutcome::Rejected(ReconcileRejection::OrderAlreadySettled));
        }
        let updated = payments::update_payment_status(payment.id, PaymentStatus::Pending, event.outcome, &mut tx)
            .await?
            .ok_or_else(|| FulfillmentError::Transient(format!("Payment #{} changed status concurrently", payment.id)))?;
        if updated.status == PaymentStatus::Paid {
            let order_id = updated.order_id;
            match orders::update_order_status(order_id, OrderStatusType::Pending, OrderStatusType::Paid, &mut tx).await? {
                Some(_) => debug!("🗃️ Order {order_id} marked as paid by [{txid}]"),
                None => warn!("🗃️ Payment [{txid}] settled, but order {order_id} was no longer pending"),
            }
        }
        tx.commit().await?;
        Ok(ReconcileOutcome::Applied(updated))
    }

    async fn expire_pending_payments(&self, older_than: Duration) -> Result<Vec<Payment>, FulfillmentError> {
        let mut tx = self.pool.begin().await?;
        let expired = payments::expire_pending_payments(older_than, &mut tx).await?;
        tx.commit().await?;
        Ok(expired)
    }
}

fn insufficient_stock(line: &CartLine, available: i64) -> CheckoutRejection {
    CheckoutRejection::InsufficientStock {
        product_id: line.product_id,
        product_name: line.product_name.clone(),
        requested: line.quantity,
        available,
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) {
        self.pool.close().await;
    }
}
