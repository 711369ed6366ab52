//! Ledger error taxonomy.
//!
//! Every failure of a wallet operation is one of these kinds. All of them are
//! recoverable and scoped to the single requested operation; only
//! `StoreUnavailable` is eligible for an automatic retry.

use reelpay_shared::types::{AccountId, Coins, LedgerEntryId, VideoId};
use thiserror::Error;

/// Errors that can occur during wallet operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount is not positive or exceeds the configured ceiling.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount.
        amount: i64,
        /// The largest accepted amount, when the operation has one.
        max: Option<i64>,
    },

    /// Gift message is longer than allowed.
    #[error("Gift message is {length} characters, maximum is {max}")]
    MessageTooLong {
        /// Length of the rejected message in characters.
        length: usize,
        /// Maximum allowed length.
        max: usize,
    },

    // ========== Business Rule Errors ==========
    /// The buyer owns the video.
    #[error("Cannot purchase your own video")]
    SelfPurchaseNotAllowed,

    /// Sender and recipient are the same account.
    #[error("Cannot send a gift to yourself")]
    SelfGiftNotAllowed,

    /// The video is free, there is nothing to buy.
    #[error("Video {0} is free")]
    FreeContent(VideoId),

    /// A purchase record already exists for this account and video.
    #[error("Video {video} already purchased by account {account}")]
    AlreadyPurchased {
        /// The buyer.
        account: AccountId,
        /// The video.
        video: VideoId,
    },

    /// The paying account cannot cover the amount.
    #[error("Insufficient balance. Required: {required}, Available: {available}")]
    InsufficientBalance {
        /// Amount the operation needs.
        required: Coins,
        /// Balance at the time of the attempt.
        available: Coins,
    },

    /// An idempotency key was replayed with different operation parameters.
    #[error("Idempotency key {0} was already used for a different operation")]
    IdempotencyKeyReused(LedgerEntryId),

    // ========== Lookup Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Video not found.
    #[error("Video not found: {0}")]
    VideoNotFound(VideoId),

    // ========== Infrastructure Errors ==========
    /// Transient store failure (connection loss, timeout, serialization conflict).
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Non-transient store failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::MessageTooLong { .. } => "MESSAGE_TOO_LONG",
            Self::SelfPurchaseNotAllowed => "SELF_PURCHASE_NOT_ALLOWED",
            Self::SelfGiftNotAllowed => "SELF_GIFT_NOT_ALLOWED",
            Self::FreeContent(_) => "FREE_CONTENT",
            Self::AlreadyPurchased { .. } => "ALREADY_PURCHASED",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::IdempotencyKeyReused(_) => "IDEMPOTENCY_KEY_REUSED",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::VideoNotFound(_) => "VIDEO_NOT_FOUND",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::InvalidAmount { .. } | Self::MessageTooLong { .. } | Self::FreeContent(_) => 400,

            // 402 Payment Required
            Self::InsufficientBalance { .. } => 402,

            // 403 Forbidden - self-dealing
            Self::SelfPurchaseNotAllowed | Self::SelfGiftNotAllowed => 403,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::VideoNotFound(_) => 404,

            // 409 Conflict
            Self::AlreadyPurchased { .. } | Self::IdempotencyKeyReused(_) => 409,

            // 503 Service Unavailable
            Self::StoreUnavailable(_) => 503,

            // 500 Internal Server Error
            Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}
