use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProduct, Product, ProductId},
    traits::FulfillmentError,
};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, FulfillmentError> {
    if product.price.is_negative() || product.stock < 0 {
        return Err(FulfillmentError::InvalidData("Price and stock must be non-negative".to_string()));
    }
    let product: Product = sqlx::query_as("INSERT INTO products (name, price, stock) VALUES ($1, $2, $3) RETURNING *")
        .bind(product.name)
        .bind(product.price)
        .bind(product.stock)
        .fetch_one(conn)
        .await?;
    trace!("🗃️ Product #{} [{}] inserted", product.id, product.name);
    Ok(product)
}

pub async fn fetch_product(product_id: ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

/// The compare-and-decrement. The stock check and the update are one statement, so no other writer can slip in
/// between them.
///
/// Returns the new stock level, or `None` if there was not enough stock (or no such product). Nothing is changed in
/// that case.
pub async fn try_decrement_stock(
    product_id: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    let new_stock: Option<i64> = sqlx::query_scalar(
        r#"
            UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND stock >= $1
            RETURNING stock;
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(new_stock)
}
