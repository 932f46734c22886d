//! SQLite backend for the storefront fulfillment engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
