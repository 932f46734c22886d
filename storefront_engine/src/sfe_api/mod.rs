//! # Storefront fulfillment engine public API
//!
//! The `sfe_api` module exposes the programmatic API of the fulfillment engine. Each API is a thin, stateless wrapper
//! around a backend that implements the traits it needs, so callers only pay for the functionality they use.
//!
//! * [`checkout_api`] turns a user's cart into an order, retrying transient lock contention.
//! * [`order_flow_api`] reads orders and drives privileged order status transitions.
//! * [`payment_flow_api`] creates payment intents and reconciles verified provider webhooks.
//! * [`cart_api`] is the small cart-editing surface used by the storefront, plus stale cart cleanup.
//!
//! # API usage
//!
//! ```rust,ignore
//! use storefront_engine::{CheckoutApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements OrderManagement
//! let api = CheckoutApi::new(db, 3);
//! let snapshot = api.checkout(user_id).await?;
//! ```

pub mod cart_api;
pub mod checkout_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_flow_api;
pub mod payment_objects;
pub mod retry;
