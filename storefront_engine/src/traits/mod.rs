//! # Backend contracts
//!
//! This module defines the behaviour that a database backend must expose in order to drive the fulfillment engine.
//!
//! * [`InventoryManagement`] owns product stock and its atomic compare-and-decrement.
//! * [`CartManagement`] reads and edits a user's cart, and purges abandoned carts.
//! * [`OrderManagement`] turns a cart into an order in one atomic unit, and drives order status transitions.
//! * [`PaymentManagement`] stores payment records and reconciles provider events against them.
//! * [`CapabilityCheck`] is the seam to the external authorization collaborator.
//!
//! Business outcomes (insufficient stock, a conflicting webhook, etc.) are returned as values in the `Ok` branch.
//! [`FulfillmentError`] is reserved for infrastructure failures and missing records.
mod capabilities;
mod cart_management;
mod data_objects;
mod errors;
mod inventory_management;
mod order_management;
mod payment_management;

pub use capabilities::{Action, Actor, CapabilityCheck, PermissionCapabilities};
pub use cart_management::CartManagement;
pub use data_objects::{
    CheckoutRejection,
    CheckoutResult,
    OrderSnapshot,
    OrderTransition,
    ReconcileOutcome,
    ReconcileRejection,
};
pub use errors::FulfillmentError;
pub use inventory_management::InventoryManagement;
pub use order_management::OrderManagement;
pub use payment_management::PaymentManagement;
