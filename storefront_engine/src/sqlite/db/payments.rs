use chrono::Duration;
use log::trace;
use sqlx::SqliteConnection;

use super::age_modifier;
use crate::db_types::{NewPayment, OrderId, Payment, PaymentProvider, PaymentStatus};

/// Inserts a new pending payment. `provider_assigned` records whether the transaction id came from the provider.
pub async fn insert_payment(
    payment: NewPayment,
    provider_assigned: bool,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let payment: Payment = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, provider, amount, transaction_id, provider_assigned)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.provider)
    .bind(payment.amount)
    .bind(payment.transaction_id)
    .bind(provider_assigned)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Payment #{} [{}] inserted for order {}", payment.id, payment.transaction_id, payment.order_id);
    Ok(payment)
}

pub async fn fetch_payment(payment_id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(payment_id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payment_by_transaction_id(
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE transaction_id = $1")
        .bind(transaction_id)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

pub async fn fetch_payments_for_order(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

/// The pending payment that a provider reference should be attached to, if any.
///
/// Only payments that still carry a locally minted transaction id qualify. When there are several, one from the same
/// provider is preferred, then the oldest.
pub async fn fetch_adoptable_payment(
    order_id: OrderId,
    provider: Option<PaymentProvider>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
            SELECT * FROM payments
            WHERE order_id = $1 AND status = 'pending' AND provider_assigned = FALSE
            ORDER BY CASE WHEN provider = $2 THEN 0 ELSE 1 END, created_at, id
            LIMIT 1;
        "#,
    )
    .bind(order_id)
    .bind(provider)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

/// Binds the provider's transaction id to an existing payment.
pub async fn attach_transaction_id(
    payment_id: i64,
    transaction_id: &str,
    provider: Option<PaymentProvider>,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
            UPDATE payments SET
                transaction_id = $1,
                provider = COALESCE($2, provider),
                provider_assigned = TRUE,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3
            RETURNING *;
        "#,
    )
    .bind(transaction_id)
    .bind(provider)
    .bind(payment_id)
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

/// Compare-and-swap on the payment status. Returns `None` if the payment was not in the `expected` status.
pub async fn update_payment_status(
    payment_id: i64,
    expected: PaymentStatus,
    new_status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
            UPDATE payments SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = $3
            RETURNING *;
        "#,
    )
    .bind(new_status)
    .bind(payment_id)
    .bind(expected)
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}

pub async fn paid_payment_exists(order_id: OrderId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE order_id = $1 AND status = 'paid'")
        .bind(order_id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

pub async fn expire_pending_payments(
    older_than: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_as(
        r#"
            UPDATE payments SET status = 'failed', updated_at = CURRENT_TIMESTAMP
            WHERE status = 'pending' AND created_at < datetime('now', $1)
            RETURNING *;
        "#,
    )
    .bind(age_modifier(older_than))
    .fetch_all(conn)
    .await?;
    Ok(payments)
}
