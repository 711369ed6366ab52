//! Core wallet logic for ReelPay.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All wallet rules, the error taxonomy, and entitlement decisions live here.
//!
//! # Modules
//!
//! - `ledger` - Balance-affecting operations: validation and transfer planning
//! - `access` - Video entitlement decisions
//! - `profile` - Username, display name, title and price rules
//! - `retry` - Backoff policy for transient store failures

pub mod access;
pub mod ledger;
pub mod profile;
pub mod retry;

pub use access::Entitlement;
pub use ledger::{LedgerError, LedgerService, WalletPolicy};
pub use profile::ProfileError;
pub use retry::RetryPolicy;
