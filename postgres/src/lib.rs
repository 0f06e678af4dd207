//! `PostgreSQL` persistence for the MeetLocal admissions platform.
//!
//! Implements the core storage traits with sqlx. The concurrency-critical
//! part is the unit-of-work implementation: opening one starts a database
//! transaction and takes a row-level lock on the event (`SELECT ... FOR
//! UPDATE`), so the capacity/ratio snapshot and the inserts that depend on
//! it are serialized per event. Two requests racing for the last seat are
//! decided one after the other; the loser sees the winner's writes.

#![forbid(unsafe_code)]

mod rows;
mod store;

pub use store::PostgresStore;

use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Embedded database migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Connects a pool with the given sizing and timeouts.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database is unreachable.
pub async fn connect(
    url: &str,
    max_connections: u32,
    connect_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(connect_timeout)
        .connect(url)
        .await
}

/// Runs all pending migrations.
///
/// # Errors
///
/// Returns a migration error if the schema could not be brought up to
/// date.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
