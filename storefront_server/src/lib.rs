//! # Storefront fulfillment server
//! This crate hosts the HTTP surface of the storefront fulfillment gateway. It is responsible for:
//! * Turning authenticated shoppers' carts into orders, without ever overselling stock.
//! * Moving orders through their fulfillment status flow on behalf of staff.
//! * Creating payment intents, and reconciling signed payment provider callbacks against them.
//!
//! All the consistency-critical work happens in `storefront_engine`. This crate only authenticates, parses and maps
//! engine outcomes onto HTTP responses.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /orders`: Check out the caller's cart.
//! * `GET /orders`, `GET /orders/{id}`: Read orders.
//! * `PATCH /orders/{id}/status`: Advance an order's status. Staff only.
//! * `POST /payments`, `GET /payments/{id}/status`: Create and poll payments.
//! * `POST /payments/webhook`: The payment provider callback. Authenticated by HMAC signature, not by access token.
//! * `GET /cart`, `POST /cart`, `DELETE /cart/{product_id}`: Edit the caller's cart.

pub mod auth;
pub mod cleanup_worker;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
