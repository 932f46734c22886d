//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! SQLite only ever has a single writer. Transactions that read before they write must start with a write (see
//! [`orders::lock_order`] and [`carts::claim_cart`]) so that they take the write lock up front, rather than failing
//! with `SQLITE_BUSY` when they try to upgrade a read lock later.
use std::{env, str::FromStr, time::Duration};

use chrono::Duration as ChronoDuration;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod carts;
pub mod orders;
pub mod payments;
pub mod products;

const SQLITE_DB_URL: &str = "sqlite://data/storefront.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn db_url() -> String {
    let result = env::var("SFG_DATABASE_URL").unwrap_or_else(|_| {
        info!("SFG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// An SQLite `datetime()` modifier that shifts "now" back by `age`, e.g. `-86400 seconds`.
pub(crate) fn age_modifier(age: ChronoDuration) -> String {
    format!("-{} seconds", age.num_seconds().max(0))
}
