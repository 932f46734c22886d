use thiserror::Error;

use crate::db_types::{OrderId, ProductId};

/// SQLite result codes (primary and extended) that indicate lock contention rather than a real failure.
const TRANSIENT_SQLITE_CODES: [&str; 5] = ["5", "6", "261", "262", "517"];

#[derive(Debug, Clone, Error)]
pub enum FulfillmentError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("The database is temporarily unavailable: {0}")]
    Transient(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Payment {0} does not exist")]
    PaymentNotFound(i64),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl FulfillmentError {
    /// Whether the failure came from lock contention and the whole unit of work can safely be run again.
    pub fn is_transient(&self) -> bool {
        matches!(self, FulfillmentError::Transient(_))
    }
}

impl From<sqlx::Error> for FulfillmentError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut => FulfillmentError::Transient(e.to_string()),
            sqlx::Error::Database(db_err) => {
                let transient =
                    db_err.code().map(|c| TRANSIENT_SQLITE_CODES.contains(&c.as_ref())).unwrap_or(false);
                if transient {
                    FulfillmentError::Transient(e.to_string())
                } else {
                    FulfillmentError::DatabaseError(e.to_string())
                }
            },
            _ => FulfillmentError::DatabaseError(e.to_string()),
        }
    }
}
