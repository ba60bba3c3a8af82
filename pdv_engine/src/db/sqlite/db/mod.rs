//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or open an atomic transaction and
//! pass `&mut *tx` through without any other changes.
//!
//! Every function that reads or writes tenant data filters on the merchant id.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod bots;
pub mod customers;
pub mod merchants;
pub mod orders;
pub mod products;
pub mod sales;

const SQLITE_DB_URL: &str = "sqlite://data/pdv_store.db";
/// How long a connection waits for another writer to release the database lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

pub fn db_url() -> String {
    let result = env::var("PDV_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ PDV_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32, acquire_timeout: Duration) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// `true` if the error is a violation of a UNIQUE constraint.
pub(crate) fn is_unique_violation(e: &SqlxError) -> bool {
    e.as_database_error().map(|e| e.is_unique_violation()).unwrap_or(false)
}
