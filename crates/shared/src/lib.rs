//! Shared types, errors, and configuration for ReelPay.
//!
//! This crate provides common types used across all other crates:
//! - Coin amounts in the smallest currency unit
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - Access token claims and signing

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::{AppConfig, RetryConfig, WalletConfig};
pub use error::AppError;
pub use jwt::{JwtConfig, JwtError, JwtService};
