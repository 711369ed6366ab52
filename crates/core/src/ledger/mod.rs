//! Wallet ledger logic.
//!
//! This module implements the rules behind every balance-affecting operation:
//! - Error taxonomy surfaced to callers
//! - Policy values (top-up ceiling, gift message length, opening balance)
//! - Validation of top-ups, gifts, and purchases
//! - Transfer plans describing the debit and credit legs of an operation
//! - Receipts returned once an operation commits

pub mod error;
pub mod policy;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::LedgerError;
pub use policy::WalletPolicy;
pub use service::LedgerService;
pub use types::{
    AccountSnapshot, EntryKind, GiftReceipt, GiftRequest, Leg, LegAction, PurchaseReceipt,
    TopUpReceipt, Transfer, VideoInfo,
};
