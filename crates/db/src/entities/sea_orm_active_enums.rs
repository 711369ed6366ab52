//! Database enums.

use reelpay_core::ledger::EntryKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored kind of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum LedgerEntryKind {
    /// A buyer paid for a video.
    #[sea_orm(string_value = "PURCHASE")]
    Purchase,
    /// Coins sent from one account to another.
    #[sea_orm(string_value = "GIFT")]
    Gift,
    /// Coins credited from outside the system.
    #[sea_orm(string_value = "TOPUP")]
    TopUp,
}

impl From<EntryKind> for LedgerEntryKind {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Purchase => Self::Purchase,
            EntryKind::Gift => Self::Gift,
            EntryKind::TopUp => Self::TopUp,
        }
    }
}

impl From<LedgerEntryKind> for EntryKind {
    fn from(kind: LedgerEntryKind) -> Self {
        match kind {
            LedgerEntryKind::Purchase => Self::Purchase,
            LedgerEntryKind::Gift => Self::Gift,
            LedgerEntryKind::TopUp => Self::TopUp,
        }
    }
}
