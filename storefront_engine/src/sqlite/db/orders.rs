use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Amount, CartLine, Order, OrderId, OrderItem, OrderStatusType, UserId};

/// Touches the order row, taking the database write lock for the remainder of the transaction.
///
/// Returns `false` if there is no such order. The write lock is taken either way.
pub async fn lock_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE orders SET updated_at = updated_at WHERE id = $1").bind(order_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

/// Inserts a new, pending order. This is not atomic. Embed the call in a transaction along with its line items.
pub async fn insert_order(user_id: UserId, total: Amount, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as("INSERT INTO orders (user_id, total) VALUES ($1, $2) RETURNING *")
        .bind(user_id)
        .bind(total)
        .fetch_one(conn)
        .await?;
    trace!("🗃️ Order {} inserted for user {user_id}", order.id);
    Ok(order)
}

/// Snapshots the cart line's current product name and price into a new line item for the order.
pub async fn insert_order_item(
    order_id: OrderId,
    line: &CartLine,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_name, price, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(&line.product_name)
    .bind(line.price)
    .bind(line.quantity)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn fetch_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items =
        sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await?;
    Ok(items)
}

pub async fn fetch_orders_for_user(user_id: UserId, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Compare-and-swap on the order status. Returns `None` if the order was not in the `expected` status.
pub async fn update_order_status(
    order_id: OrderId,
    expected: OrderStatusType,
    new_status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = $3
            RETURNING *;
        "#,
    )
    .bind(new_status)
    .bind(order_id)
    .bind(expected)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
