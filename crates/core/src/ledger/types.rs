//! Wallet domain types.
//!
//! A committed operation is described by a [`Transfer`]: an optional debit leg
//! and one credit leg of the same amount. Top-ups have no debit leg, which is
//! the only way value enters the system.

use chrono::{DateTime, Utc};
use reelpay_shared::types::{AccountId, Coins, LedgerEntryId, PurchaseId, VideoId};
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Kind of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    /// Buyer paid a creator for a video.
    Purchase,
    /// Sender paid a recipient directly.
    Gift,
    /// Value entered the wallet from outside.
    #[serde(rename = "TOPUP")]
    TopUp,
}

impl EntryKind {
    /// Stable string form, as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "PURCHASE",
            Self::Gift => "GIFT",
            Self::TopUp => "TOPUP",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PURCHASE" => Ok(Self::Purchase),
            "GIFT" => Ok(Self::Gift),
            "TOPUP" => Ok(Self::TopUp),
            _ => Err(format!("Unknown entry kind: {s}")),
        }
    }
}

/// Balance state of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// The account.
    pub id: AccountId,
    /// Spendable balance.
    pub balance: Coins,
    /// Cumulative value received from gifts and sales.
    pub total_earnings: Coins,
}

impl AccountSnapshot {
    /// Creates an empty account.
    #[must_use]
    pub const fn empty(id: AccountId) -> Self {
        Self {
            id,
            balance: Coins::ZERO,
            total_earnings: Coins::ZERO,
        }
    }

    /// Applies one leg to this account.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBalance` if a debit would make the balance negative,
    /// leaving the snapshot untouched.
    pub fn apply(&mut self, leg: &Leg) -> Result<(), LedgerError> {
        match leg.action {
            LegAction::Debit(amount) => {
                self.balance = self.balance.checked_debit(amount).ok_or(
                    LedgerError::InsufficientBalance {
                        required: amount,
                        available: self.balance,
                    },
                )?;
            }
            LegAction::Credit { amount, earnings } => {
                self.balance = self
                    .balance
                    .checked_add(amount)
                    .ok_or_else(|| LedgerError::Internal("balance overflow".to_string()))?;
                if earnings {
                    self.total_earnings = self
                        .total_earnings
                        .checked_add(amount)
                        .ok_or_else(|| LedgerError::Internal("earnings overflow".to_string()))?;
                }
            }
        }
        Ok(())
    }
}

/// Content-store facts the engine needs about a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// The video.
    pub id: VideoId,
    /// The creator who receives purchase revenue.
    pub owner_id: AccountId,
    /// Price in coins; zero means free.
    pub price: Coins,
}

impl VideoInfo {
    /// Returns true if the video costs nothing.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.price.value() == 0
    }
}

/// Input for a gift.
#[derive(Debug, Clone)]
pub struct GiftRequest {
    /// Paying account.
    pub sender: AccountId,
    /// Receiving account.
    pub recipient: AccountId,
    /// Raw amount as supplied by the caller.
    pub amount: i64,
    /// Optional video the gift is attached to.
    pub video_id: Option<VideoId>,
    /// Optional note to the recipient.
    pub message: Option<String>,
}

/// What happens to one account in a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegAction {
    /// Conditional decrement; fails if the balance cannot cover it.
    Debit(Coins),
    /// Increment, optionally counted as earnings.
    Credit {
        /// Amount credited.
        amount: Coins,
        /// Whether `total_earnings` grows too.
        earnings: bool,
    },
}

/// One account-side of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg {
    /// The account touched.
    pub account_id: AccountId,
    /// The change applied.
    pub action: LegAction,
}

impl Leg {
    /// Signed effect on the balance.
    #[must_use]
    pub const fn balance_delta(&self) -> i64 {
        match self.action {
            LegAction::Debit(amount) => -amount.value(),
            LegAction::Credit { amount, .. } => amount.value(),
        }
    }
}

/// A validated, not yet applied, balance movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Entry kind recorded for this movement.
    pub kind: EntryKind,
    /// Paying account; `None` for top-ups.
    pub from: Option<AccountId>,
    /// Receiving account.
    pub to: AccountId,
    /// Amount moved.
    pub amount: Coins,
}

impl Transfer {
    /// Returns the legs ordered by account id.
    ///
    /// Applying legs in this order means two transfers touching the same pair
    /// of accounts always lock rows in the same sequence.
    #[must_use]
    pub fn legs(&self) -> Vec<Leg> {
        let credit = Leg {
            account_id: self.to,
            action: LegAction::Credit {
                amount: self.amount,
                earnings: self.kind != EntryKind::TopUp,
            },
        };

        let mut legs = match self.from {
            Some(from) => vec![
                Leg {
                    account_id: from,
                    action: LegAction::Debit(self.amount),
                },
                credit,
            ],
            None => vec![credit],
        };
        legs.sort_by_key(|leg| leg.account_id);
        legs
    }

    /// Net change to the sum of all balances: zero for transfers, the amount for top-ups.
    #[must_use]
    pub fn net_supply_change(&self) -> i64 {
        self.legs().iter().map(Leg::balance_delta).sum()
    }
}

/// Result of a committed top-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopUpReceipt {
    /// The TOPUP ledger entry.
    pub entry_id: LedgerEntryId,
    /// Credited account.
    pub account_id: AccountId,
    /// Amount credited.
    pub amount: Coins,
    /// Balance after the top-up.
    pub new_balance: Coins,
    /// True when this call replayed an already committed operation.
    pub replayed: bool,
    /// Commit time of the ledger entry.
    pub created_at: DateTime<Utc>,
}

/// Result of a committed gift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GiftReceipt {
    /// The GIFT ledger entry.
    pub entry_id: LedgerEntryId,
    /// Paying account.
    pub sender: AccountId,
    /// Receiving account.
    pub recipient: AccountId,
    /// Amount moved.
    pub amount: Coins,
    /// Video the gift is attached to.
    pub video_id: Option<VideoId>,
    /// Note to the recipient.
    pub message: Option<String>,
    /// Sender balance after the gift.
    pub new_balance: Coins,
    /// True when this call replayed an already committed operation.
    pub replayed: bool,
    /// Commit time of the ledger entry.
    pub created_at: DateTime<Utc>,
}

/// Result of a committed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseReceipt {
    /// The PURCHASE ledger entry.
    pub entry_id: LedgerEntryId,
    /// The purchase record.
    pub purchase_id: PurchaseId,
    /// Buyer.
    pub buyer: AccountId,
    /// Creator credited.
    pub owner: AccountId,
    /// Purchased video.
    pub video_id: VideoId,
    /// Price paid.
    pub amount: Coins,
    /// Buyer balance after the purchase.
    pub new_balance: Coins,
    /// True when this call replayed an already committed operation.
    pub replayed: bool,
    /// Commit time of the ledger entry.
    pub created_at: DateTime<Utc>,
}
