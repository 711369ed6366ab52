//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for accounts, videos, wallets and gifts
//! - Authentication middleware
//! - Request extractors
//! - JSON error responses

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use axum::Router;
use reelpay_core::{RetryPolicy, WalletPolicy};
use reelpay_db::{
    AccessRepository, AccountRepository, HistoryRepository, VideoRepository, WalletRepository,
};
use reelpay_shared::JwtService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Wallet limits.
    pub policy: WalletPolicy,
    /// Backoff for transient store failures.
    pub retry: RetryPolicy,
}

impl AppState {
    /// Creates the state from its parts.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        jwt_service: JwtService,
        policy: WalletPolicy,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            db: Arc::new(db),
            jwt_service: Arc::new(jwt_service),
            policy,
            retry,
        }
    }

    /// Ledger Engine over the shared pool.
    #[must_use]
    pub fn wallet(&self) -> WalletRepository {
        WalletRepository::new((*self.db).clone(), self.policy, self.retry)
    }

    /// Account registration and lookup.
    #[must_use]
    pub fn accounts(&self) -> AccountRepository {
        AccountRepository::new((*self.db).clone(), self.policy)
    }

    /// Video registration and lookup.
    #[must_use]
    pub fn videos(&self) -> VideoRepository {
        VideoRepository::new((*self.db).clone())
    }

    /// Access Resolver.
    #[must_use]
    pub fn access(&self) -> AccessRepository {
        AccessRepository::new((*self.db).clone())
    }

    /// Wallet history queries.
    #[must_use]
    pub fn history(&self) -> HistoryRepository {
        HistoryRepository::new((*self.db).clone())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
