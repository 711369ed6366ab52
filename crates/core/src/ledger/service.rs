//! Ledger service for wallet operation validation and planning.
//!
//! This module turns caller input into a validated [`Transfer`] before anything
//! touches the store. The persistence layer applies the transfer's legs; the
//! in-memory [`LedgerService::apply`] gives the same semantics for reasoning
//! and tests.

use reelpay_shared::types::{AccountId, Coins};

use super::error::LedgerError;
use super::policy::WalletPolicy;
use super::types::{AccountSnapshot, EntryKind, GiftRequest, Transfer, VideoInfo};

/// Ledger service for wallet operations.
///
/// This service contains pure business logic with no database dependencies.
pub struct LedgerService;

impl LedgerService {
    /// Validates a top-up and returns its transfer plan.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if `amount <= 0` or `amount > policy.max_top_up`.
    pub fn plan_top_up(
        policy: &WalletPolicy,
        account: AccountId,
        amount: i64,
    ) -> Result<Transfer, LedgerError> {
        let amount = Self::validate_amount(amount, Some(policy.max_top_up))?;

        Ok(Transfer {
            kind: EntryKind::TopUp,
            from: None,
            to: account,
            amount,
        })
    }

    /// Validates a gift and returns its transfer plan.
    ///
    /// Checks run in this order:
    /// 1. Sender and recipient differ
    /// 2. Amount is positive
    /// 3. Message fits the policy length
    ///
    /// Balance sufficiency is checked when the debit leg is applied.
    ///
    /// # Errors
    ///
    /// Returns `SelfGiftNotAllowed`, `InvalidAmount`, or `MessageTooLong`.
    pub fn plan_gift(policy: &WalletPolicy, request: &GiftRequest) -> Result<Transfer, LedgerError> {
        if request.sender == request.recipient {
            return Err(LedgerError::SelfGiftNotAllowed);
        }

        let amount = Self::validate_amount(request.amount, None)?;
        Self::validate_message(policy, request.message.as_deref())?;

        Ok(Transfer {
            kind: EntryKind::Gift,
            from: Some(request.sender),
            to: request.recipient,
            amount,
        })
    }

    /// Validates a purchase and returns its transfer plan.
    ///
    /// Duplicate-purchase and balance checks need the store and happen there.
    ///
    /// # Errors
    ///
    /// Returns `SelfPurchaseNotAllowed` if the buyer owns the video, then
    /// `FreeContent` if the video has no price.
    pub fn plan_purchase(buyer: AccountId, video: &VideoInfo) -> Result<Transfer, LedgerError> {
        if buyer == video.owner_id {
            return Err(LedgerError::SelfPurchaseNotAllowed);
        }
        if video.is_free() {
            return Err(LedgerError::FreeContent(video.id));
        }

        Ok(Transfer {
            kind: EntryKind::Purchase,
            from: Some(buyer),
            to: video.owner_id,
            amount: video.price,
        })
    }

    /// Validates a raw amount against `1..=max`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` when out of range.
    pub fn validate_amount(amount: i64, max: Option<Coins>) -> Result<Coins, LedgerError> {
        let too_large = max.is_some_and(|max| amount > max.value());
        if amount <= 0 || too_large {
            return Err(LedgerError::InvalidAmount {
                amount,
                max: max.map(Coins::value),
            });
        }
        Ok(Coins(amount))
    }

    /// Normalizes a gift message: trims it and drops it when empty.
    ///
    /// # Errors
    ///
    /// Returns `MessageTooLong` if the trimmed message exceeds the policy length.
    pub fn validate_message(
        policy: &WalletPolicy,
        message: Option<&str>,
    ) -> Result<Option<String>, LedgerError> {
        let Some(message) = message.map(str::trim).filter(|m| !m.is_empty()) else {
            return Ok(None);
        };

        let length = message.chars().count();
        if length > policy.max_gift_message_len {
            return Err(LedgerError::MessageTooLong {
                length,
                max: policy.max_gift_message_len,
            });
        }
        Ok(Some(message.to_string()))
    }

    /// Checks that `available` covers `required`.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBalance` carrying both figures.
    pub fn ensure_funds(available: Coins, required: Coins) -> Result<(), LedgerError> {
        if available < required {
            return Err(LedgerError::InsufficientBalance {
                required,
                available,
            });
        }
        Ok(())
    }

    /// Applies a transfer to in-memory snapshots, all legs or none.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for a leg whose account is missing, or
    /// `InsufficientBalance` if the debit leg cannot be covered. On error no
    /// snapshot is modified.
    pub fn apply(transfer: &Transfer, accounts: &mut [AccountSnapshot]) -> Result<(), LedgerError> {
        let legs = transfer.legs();
        let mut staged = Vec::with_capacity(legs.len());

        for leg in &legs {
            let index = accounts
                .iter()
                .position(|a| a.id == leg.account_id)
                .ok_or(LedgerError::AccountNotFound(leg.account_id))?;
            let mut next = accounts[index];
            next.apply(leg)?;
            staged.push((index, next));
        }

        for (index, next) in staged {
            accounts[index] = next;
        }
        Ok(())
    }
}
