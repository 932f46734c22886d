use chrono::Duration;
use sqlx::SqliteConnection;

use super::age_modifier;
use crate::db_types::{CartLine, CartPurgeResult, ProductId, UserId};

const CART_LINE_SELECT: &str = r#"
    SELECT
        cart_items.cart_id AS cart_id,
        cart_items.product_id AS product_id,
        products.name AS product_name,
        products.price AS price,
        products.stock AS stock,
        cart_items.quantity AS quantity
    FROM cart_items JOIN products ON products.id = cart_items.product_id
"#;

/// Touches the user's cart and returns its id, or `None` if the user has no cart.
///
/// Being a write, this takes the database write lock for the rest of the transaction. Concurrent checkouts (of the
/// same cart or any other) queue up behind it.
pub async fn claim_cart(user_id: UserId, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let id = sqlx::query_scalar("UPDATE carts SET updated_at = CURRENT_TIMESTAMP WHERE user_id = $1 RETURNING id")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(id)
}

pub async fn fetch_or_create_cart(user_id: UserId, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let id = sqlx::query_scalar(
        r#"
            INSERT INTO carts (user_id) VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = CURRENT_TIMESTAMP
            RETURNING id;
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn count_items_for_user(user_id: UserId, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM cart_items JOIN carts ON carts.id = cart_items.cart_id WHERE carts.user_id = $1",
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(count)
}

/// The cart's lines in ascending product id order. Checkout touches products in exactly this order.
pub async fn fetch_cart_lines(cart_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    let query = format!("{CART_LINE_SELECT} WHERE cart_items.cart_id = $1 ORDER BY cart_items.product_id");
    let lines = sqlx::query_as(&query).bind(cart_id).fetch_all(conn).await?;
    Ok(lines)
}

pub async fn fetch_cart_lines_for_user(
    user_id: UserId,
    conn: &mut SqliteConnection,
) -> Result<Vec<CartLine>, sqlx::Error> {
    let query = format!(
        "{CART_LINE_SELECT} JOIN carts ON carts.id = cart_items.cart_id WHERE carts.user_id = $1 ORDER BY \
         cart_items.product_id"
    );
    let lines = sqlx::query_as(&query).bind(user_id).fetch_all(conn).await?;
    Ok(lines)
}

pub async fn fetch_cart_line(
    cart_id: i64,
    product_id: ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<CartLine>, sqlx::Error> {
    let query = format!("{CART_LINE_SELECT} WHERE cart_items.cart_id = $1 AND cart_items.product_id = $2");
    let line = sqlx::query_as(&query).bind(cart_id).bind(product_id).fetch_optional(conn).await?;
    Ok(line)
}

/// Sets (rather than adds to) the quantity of the product in the cart.
pub async fn upsert_cart_item(
    cart_id: i64,
    product_id: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = excluded.quantity;
        "#,
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn remove_cart_item(
    user_id: UserId,
    product_id: ProductId,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            DELETE FROM cart_items
            WHERE product_id = $1 AND cart_id = (SELECT id FROM carts WHERE user_id = $2);
        "#,
    )
    .bind(product_id)
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn clear_cart(cart_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1").bind(cart_id).execute(conn).await?;
    Ok(result.rows_affected())
}

/// Not atomic. Run it inside a transaction.
pub async fn purge_stale_carts(
    older_than: Duration,
    delete_empty: bool,
    conn: &mut SqliteConnection,
) -> Result<CartPurgeResult, sqlx::Error> {
    let modifier = age_modifier(older_than);
    let items = sqlx::query(
        r#"
            DELETE FROM cart_items
            WHERE cart_id IN (SELECT id FROM carts WHERE updated_at < datetime('now', $1));
        "#,
    )
    .bind(&modifier)
    .execute(&mut *conn)
    .await?;
    let mut result = CartPurgeResult { items_removed: items.rows_affected(), carts_deleted: 0 };
    if delete_empty {
        let carts = sqlx::query(
            r#"
                DELETE FROM carts
                WHERE updated_at < datetime('now', $1)
                AND NOT EXISTS (SELECT 1 FROM cart_items WHERE cart_items.cart_id = carts.id);
            "#,
        )
        .bind(&modifier)
        .execute(conn)
        .await?;
        result.carts_deleted = carts.rows_affected();
    }
    Ok(result)
}
