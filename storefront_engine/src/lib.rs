//! Storefront Fulfillment Engine
//!
//! The fulfillment engine is the consistency-critical core of the storefront backend. It turns carts into orders
//! without ever overselling stock, and reconciles asynchronous (and possibly replayed) payment provider callbacks
//! into an authoritative payment and order state.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@traits`] and the SQLite backend). You should never need to access the
//!    database directly. Instead, use the public API provided by the engine. The exception is the data types used in
//!    the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@sfe_api`]). This provides checkout, order status flow, payment creation and
//!    webhook reconciliation. Backends need to implement the traits in [`mod@traits`] in order to drive these APIs.
//! 3. Helpers ([`mod@helpers`]), most notably the webhook signature verifier that gates every provider callback.
pub mod db_types;
pub mod helpers;
mod sfe_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use sfe_api::{
    cart_api::CartApi,
    checkout_api::{CheckoutApi, DEFAULT_CHECKOUT_ATTEMPTS},
    errors::{CartError, CheckoutError, OrderFlowError, PaymentEventError, PaymentFlowError},
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_flow_api::PaymentFlowApi,
    payment_objects,
    retry::retry_transient,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
