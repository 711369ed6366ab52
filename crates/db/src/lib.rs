//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - Database migrations
//! - The Ledger Engine (`WalletRepository`) and Access Resolver (`AccessRepository`)

pub mod entities;
pub mod migration;
pub mod repositories;
pub mod retry;

pub use repositories::{
    AccessRepository, AccountError, AccountRepository, GiftDirection, HistoryRepository,
    PurchaseStatus, VideoError, VideoRepository, WalletRepository,
};

use std::time::Duration;

use reelpay_core::LedgerError;
use reelpay_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Fragments of driver messages that indicate a transient condition.
const TRANSIENT_MARKERS: &[&str] = &[
    "could not serialize access",
    "deadlock detected",
    "database is locked",
    "database table is locked",
    "connection reset",
    "connection refused",
    "broken pipe",
    "timed out",
    "pool timed out",
];

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection using the configured limits.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .sqlx_logging(false);

    Database::connect(options).await
}

/// Classifies a store failure.
///
/// Connection loss, pool exhaustion, serialization conflicts and lock
/// contention become `StoreUnavailable` (retryable). Everything else is
/// `Internal`.
#[must_use]
pub fn store_error(err: DbErr) -> LedgerError {
    let message = err.to_string();
    if is_transient(&err) {
        LedgerError::StoreUnavailable(message)
    } else {
        LedgerError::Internal(message)
    }
}

fn is_transient(err: &DbErr) -> bool {
    if matches!(err, DbErr::ConnectionAcquire(_) | DbErr::Conn(_)) {
        return true;
    }
    let message = err.to_string().to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| message.contains(marker))
}

/// Returns true if the error is a unique-constraint violation.
#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_)))
}
