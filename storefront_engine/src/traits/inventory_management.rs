use crate::{
    db_types::{NewProduct, Product, ProductId, StockDecrement},
    traits::FulfillmentError,
};

/// The inventory ledger. Stock levels are owned here, and are only ever reduced through an atomic
/// compare-and-decrement.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement {
    /// Adds a product to the catalog. Used by the catalog collaborator and for seeding.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, FulfillmentError>;

    async fn fetch_product(&self, product_id: ProductId) -> Result<Option<Product>, FulfillmentError>;

    /// Atomically decrements the product's stock by `quantity` if, and only if, at least `quantity` units are
    /// available.
    ///
    /// Concurrent callers can never jointly take more than the available stock. Insufficient stock is not an error:
    /// the result has `ok == false` and the stock is left unchanged.
    ///
    /// ## Failure modes:
    /// - `quantity` is not positive.
    /// - The product does not exist.
    async fn try_decrement_stock(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<StockDecrement, FulfillmentError>;
}
