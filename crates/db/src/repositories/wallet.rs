//! Ledger Engine: top-ups, gifts and purchases.
//!
//! Every operation runs in one database transaction. Balances change only
//! through conditional `UPDATE`s applied in ascending account-id order, and
//! each operation is keyed by the id of the ledger entry it writes, so a retry
//! or client re-submission never moves money twice.

use chrono::{DateTime, SubsecRound, Utc};
use reelpay_core::ledger::{
    EntryKind, GiftReceipt, GiftRequest, Leg, LegAction, LedgerError, LedgerService,
    PurchaseReceipt, TopUpReceipt, Transfer, VideoInfo, WalletPolicy,
};
use reelpay_core::RetryPolicy;
use reelpay_shared::types::{AccountId, Coins, LedgerEntryId, PurchaseId, VideoId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::{info, warn};

use crate::entities::{accounts, ledger_entries, purchases, videos};
use crate::retry::with_retry;
use crate::{is_unique_violation, store_error};

/// Why a transactional attempt stopped.
#[derive(Debug)]
pub(crate) enum TxnFailure {
    /// The operation was rejected or the store failed.
    Ledger(LedgerError),
    /// A ledger entry with this id is already committed.
    EntryExists,
}

impl From<LedgerError> for TxnFailure {
    fn from(err: LedgerError) -> Self {
        Self::Ledger(err)
    }
}

impl From<DbErr> for TxnFailure {
    fn from(err: DbErr) -> Self {
        Self::Ledger(store_error(err))
    }
}

impl TxnFailure {
    pub(crate) fn into_ledger_error(self, entry_id: LedgerEntryId) -> LedgerError {
        match self {
            Self::Ledger(err) => err,
            Self::EntryExists => LedgerError::IdempotencyKeyReused(entry_id),
        }
    }
}

/// Ledger Engine backed by the accounts, ledger and purchase tables.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
    policy: WalletPolicy,
    retry: RetryPolicy,
}

impl WalletRepository {
    /// Creates a new wallet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, policy: WalletPolicy, retry: RetryPolicy) -> Self {
        Self { db, policy, retry }
    }

    /// Returns the wallet policy in force.
    #[must_use]
    pub const fn policy(&self) -> &WalletPolicy {
        &self.policy
    }

    /// Credits `amount` to `account` from outside the system.
    ///
    /// `key` identifies the operation; when omitted a fresh one is generated.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is not in `1..=max_top_up`
    /// - `AccountNotFound` if the account does not exist
    /// - `IdempotencyKeyReused` if `key` belongs to a different operation
    /// - `StoreUnavailable` after retries are exhausted
    pub async fn top_up(
        &self,
        account: AccountId,
        amount: i64,
        key: Option<LedgerEntryId>,
    ) -> Result<TopUpReceipt, LedgerError> {
        let transfer = LedgerService::plan_top_up(&self.policy, account, amount)?;
        let entry_id = key.unwrap_or_default();

        with_retry(&self.retry, "top_up", || self.top_up_once(entry_id, transfer)).await
    }

    /// Moves `request.amount` from sender to recipient.
    ///
    /// # Errors
    ///
    /// Checked in order: `SelfGiftNotAllowed`, `InvalidAmount`, `MessageTooLong`,
    /// `AccountNotFound` (sender, then recipient), `VideoNotFound` for an unknown
    /// subject video, `InsufficientBalance`. Also `IdempotencyKeyReused` and
    /// `StoreUnavailable`.
    pub async fn gift(
        &self,
        request: GiftRequest,
        key: Option<LedgerEntryId>,
    ) -> Result<GiftReceipt, LedgerError> {
        let transfer = LedgerService::plan_gift(&self.policy, &request)?;
        let message = LedgerService::validate_message(&self.policy, request.message.as_deref())?;
        let entry_id = key.unwrap_or_default();
        let subject = request.video_id;
        let message = message.as_deref();

        with_retry(&self.retry, "gift", || {
            self.gift_once(entry_id, transfer, subject, message)
        })
        .await
    }

    /// Buys `video` for `buyer` and credits the owner.
    ///
    /// # Errors
    ///
    /// Checked in order: `VideoNotFound`, `AccountNotFound`,
    /// `SelfPurchaseNotAllowed`, `FreeContent`, `AlreadyPurchased`,
    /// `InsufficientBalance`. Also `IdempotencyKeyReused` and `StoreUnavailable`.
    pub async fn purchase(
        &self,
        buyer: AccountId,
        video: VideoId,
        key: Option<LedgerEntryId>,
    ) -> Result<PurchaseReceipt, LedgerError> {
        let entry_id = key.unwrap_or_default();

        with_retry(&self.retry, "purchase", || {
            self.purchase_once(entry_id, buyer, video)
        })
        .await
    }

    // ========== Single attempts ==========

    async fn top_up_once(
        &self,
        entry_id: LedgerEntryId,
        transfer: Transfer,
    ) -> Result<TopUpReceipt, LedgerError> {
        if let Some(entry) = self.find_entry(entry_id).await? {
            return self.replay_top_up(&entry, transfer).await;
        }

        let txn = self.db.begin().await.map_err(store_error)?;
        let outcome = Self::top_up_in(&txn, entry_id, transfer).await;

        match settle(txn, outcome).await {
            Ok(receipt) => {
                info!(
                    entry_id = %entry_id,
                    account_id = %transfer.to,
                    amount = transfer.amount.value(),
                    new_balance = receipt.new_balance.value(),
                    "Top-up committed"
                );
                Ok(receipt)
            }
            Err(TxnFailure::EntryExists) => {
                let entry = self.committed_entry(entry_id).await?;
                self.replay_top_up(&entry, transfer).await
            }
            Err(TxnFailure::Ledger(err)) => Err(err),
        }
    }

    async fn gift_once(
        &self,
        entry_id: LedgerEntryId,
        transfer: Transfer,
        subject: Option<VideoId>,
        message: Option<&str>,
    ) -> Result<GiftReceipt, LedgerError> {
        if let Some(entry) = self.find_entry(entry_id).await? {
            return self.replay_gift(&entry, transfer, subject, message).await;
        }

        let txn = self.db.begin().await.map_err(store_error)?;
        let outcome = Self::gift_in(&txn, entry_id, transfer, subject, message).await;

        match settle(txn, outcome).await {
            Ok(receipt) => {
                info!(
                    entry_id = %entry_id,
                    sender = %receipt.sender,
                    recipient = %receipt.recipient,
                    amount = transfer.amount.value(),
                    "Gift committed"
                );
                Ok(receipt)
            }
            Err(TxnFailure::EntryExists) => {
                let entry = self.committed_entry(entry_id).await?;
                self.replay_gift(&entry, transfer, subject, message).await
            }
            Err(TxnFailure::Ledger(err)) => Err(err),
        }
    }

    async fn purchase_once(
        &self,
        entry_id: LedgerEntryId,
        buyer: AccountId,
        video: VideoId,
    ) -> Result<PurchaseReceipt, LedgerError> {
        if let Some(entry) = self.find_entry(entry_id).await? {
            return self.replay_purchase(&entry, buyer, video).await;
        }

        let txn = self.db.begin().await.map_err(store_error)?;
        let outcome = Self::purchase_in(&txn, entry_id, buyer, video).await;

        match settle(txn, outcome).await {
            Ok(receipt) => {
                info!(
                    entry_id = %entry_id,
                    buyer = %buyer,
                    owner = %receipt.owner,
                    video_id = %video,
                    amount = receipt.amount.value(),
                    "Purchase committed"
                );
                Ok(receipt)
            }
            Err(TxnFailure::EntryExists) => {
                let entry = self.committed_entry(entry_id).await?;
                self.replay_purchase(&entry, buyer, video).await
            }
            Err(TxnFailure::Ledger(err)) => Err(err),
        }
    }

    // ========== Transaction bodies ==========

    async fn top_up_in(
        txn: &DatabaseTransaction,
        entry_id: LedgerEntryId,
        transfer: Transfer,
    ) -> Result<TopUpReceipt, TxnFailure> {
        let now = now();
        claim_accounts(txn, &[transfer.to], now).await?;
        find_account(txn, transfer.to).await?;

        insert_entry(txn, entry_id, &transfer, None, None, now).await?;
        apply_legs(txn, &transfer, now).await?;
        let new_balance = balance_of(txn, transfer.to).await?;

        Ok(TopUpReceipt {
            entry_id,
            account_id: transfer.to,
            amount: transfer.amount,
            new_balance,
            replayed: false,
            created_at: now,
        })
    }

    async fn gift_in(
        txn: &DatabaseTransaction,
        entry_id: LedgerEntryId,
        transfer: Transfer,
        subject: Option<VideoId>,
        message: Option<&str>,
    ) -> Result<GiftReceipt, TxnFailure> {
        let sender = transfer
            .from
            .ok_or_else(|| LedgerError::Internal("gift without sender".to_string()))?;
        let now = now();
        claim_accounts(txn, &[sender, transfer.to], now).await?;
        let sender_row = find_account(txn, sender).await?;
        find_account(txn, transfer.to).await?;
        if let Some(video_id) = subject {
            videos::Entity::find_by_id(video_id.into_inner())
                .one(txn)
                .await?
                .ok_or(LedgerError::VideoNotFound(video_id))?;
        }
        LedgerService::ensure_funds(Coins(sender_row.balance), transfer.amount)?;

        insert_entry(
            txn,
            entry_id,
            &transfer,
            subject,
            message.map(str::to_string),
            now,
        )
        .await?;
        apply_legs(txn, &transfer, now).await?;
        let new_balance = balance_of(txn, sender).await?;

        Ok(GiftReceipt {
            entry_id,
            sender,
            recipient: transfer.to,
            amount: transfer.amount,
            video_id: subject,
            message: message.map(str::to_string),
            new_balance,
            replayed: false,
            created_at: now,
        })
    }

    async fn purchase_in(
        txn: &DatabaseTransaction,
        entry_id: LedgerEntryId,
        buyer: AccountId,
        video_id: VideoId,
    ) -> Result<PurchaseReceipt, TxnFailure> {
        let now = now();

        // The sale is counted up front and rolled back with everything else if
        // the purchase is refused.
        let counted = videos::Entity::update_many()
            .col_expr(
                videos::Column::Earnings,
                Expr::col(videos::Column::Earnings).add(Expr::col(videos::Column::Price)),
            )
            .col_expr(
                videos::Column::PurchaseCount,
                Expr::col(videos::Column::PurchaseCount).add(1),
            )
            .filter(videos::Column::Id.eq(video_id.into_inner()))
            .exec(txn)
            .await?;
        if counted.rows_affected == 0 {
            return Err(LedgerError::VideoNotFound(video_id).into());
        }

        let video = videos::Entity::find_by_id(video_id.into_inner())
            .one(txn)
            .await?
            .ok_or(LedgerError::VideoNotFound(video_id))?;
        claim_accounts(txn, &[buyer, AccountId::from_uuid(video.owner_id)], now).await?;
        let buyer_row = find_account(txn, buyer).await?;

        let info = VideoInfo {
            id: video_id,
            owner_id: AccountId::from_uuid(video.owner_id),
            price: Coins(video.price),
        };
        let transfer = LedgerService::plan_purchase(buyer, &info)?;

        insert_entry(txn, entry_id, &transfer, Some(video_id), None, now).await?;

        let purchase_id = PurchaseId::new();
        let record = purchases::ActiveModel {
            id: Set(purchase_id.into_inner()),
            account_id: Set(buyer.into_inner()),
            video_id: Set(video_id.into_inner()),
            amount: Set(transfer.amount.value()),
            ledger_entry_id: Set(entry_id.into_inner()),
            created_at: Set(now),
        };
        purchases::Entity::insert(record)
            .exec_without_returning(txn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    TxnFailure::Ledger(LedgerError::AlreadyPurchased {
                        account: buyer,
                        video: video_id,
                    })
                } else {
                    TxnFailure::from(err)
                }
            })?;
        LedgerService::ensure_funds(Coins(buyer_row.balance), transfer.amount)?;

        apply_legs(txn, &transfer, now).await?;

        let new_balance = balance_of(txn, buyer).await?;

        Ok(PurchaseReceipt {
            entry_id,
            purchase_id,
            buyer,
            owner: info.owner_id,
            video_id,
            amount: transfer.amount,
            new_balance,
            replayed: false,
            created_at: now,
        })
    }

    // ========== Replay ==========

    async fn find_entry(
        &self,
        entry_id: LedgerEntryId,
    ) -> Result<Option<ledger_entries::Model>, LedgerError> {
        ledger_entries::Entity::find_by_id(entry_id.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)
    }

    /// Loads an entry that a unique violation says is committed.
    async fn committed_entry(
        &self,
        entry_id: LedgerEntryId,
    ) -> Result<ledger_entries::Model, LedgerError> {
        self.find_entry(entry_id).await?.ok_or_else(|| {
            LedgerError::StoreUnavailable(format!(
                "ledger entry {entry_id} conflicted but is not visible yet"
            ))
        })
    }

    async fn replay_top_up(
        &self,
        entry: &ledger_entries::Model,
        transfer: Transfer,
    ) -> Result<TopUpReceipt, LedgerError> {
        ensure_same_transfer(entry, &transfer, None, None)?;
        let new_balance = balance_of(&self.db, transfer.to).await?;

        Ok(TopUpReceipt {
            entry_id: LedgerEntryId::from_uuid(entry.id),
            account_id: transfer.to,
            amount: transfer.amount,
            new_balance,
            replayed: true,
            created_at: entry.created_at,
        })
    }

    async fn replay_gift(
        &self,
        entry: &ledger_entries::Model,
        transfer: Transfer,
        subject: Option<VideoId>,
        message: Option<&str>,
    ) -> Result<GiftReceipt, LedgerError> {
        ensure_same_transfer(entry, &transfer, subject, message)?;
        let sender = transfer
            .from
            .ok_or_else(|| LedgerError::Internal("gift without sender".to_string()))?;
        let new_balance = balance_of(&self.db, sender).await?;

        Ok(GiftReceipt {
            entry_id: LedgerEntryId::from_uuid(entry.id),
            sender,
            recipient: transfer.to,
            amount: transfer.amount,
            video_id: subject,
            message: entry.message.clone(),
            new_balance,
            replayed: true,
            created_at: entry.created_at,
        })
    }

    async fn replay_purchase(
        &self,
        entry: &ledger_entries::Model,
        buyer: AccountId,
        video: VideoId,
    ) -> Result<PurchaseReceipt, LedgerError> {
        let entry_id = LedgerEntryId::from_uuid(entry.id);
        let same = EntryKind::from(entry.kind) == EntryKind::Purchase
            && entry.from_account == Some(buyer.into_inner())
            && entry.subject_id == Some(video.into_inner());
        if !same {
            return Err(LedgerError::IdempotencyKeyReused(entry_id));
        }

        let record = purchases::Entity::find()
            .filter(purchases::Column::LedgerEntryId.eq(entry.id))
            .one(&self.db)
            .await
            .map_err(store_error)?
            .ok_or_else(|| {
                LedgerError::Internal(format!("purchase entry {entry_id} has no purchase record"))
            })?;
        let new_balance = balance_of(&self.db, buyer).await?;

        info!(entry_id = %entry_id, buyer = %buyer, video_id = %video, "Purchase replayed");

        Ok(PurchaseReceipt {
            entry_id,
            purchase_id: PurchaseId::from_uuid(record.id),
            buyer,
            owner: AccountId::from_uuid(entry.to_account),
            video_id: video,
            amount: Coins(entry.amount),
            new_balance,
            replayed: true,
            created_at: entry.created_at,
        })
    }
}

// ========== Shared steps ==========

/// Commits on success, rolls back on failure.
async fn settle<T>(
    txn: DatabaseTransaction,
    outcome: Result<T, TxnFailure>,
) -> Result<T, TxnFailure> {
    match outcome {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(failure) => {
            if let Err(err) = txn.rollback().await {
                warn!(error = %err, "Rollback failed");
            }
            Err(failure)
        }
    }
}

/// Current time at the precision every supported store keeps.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Checks that a committed entry records exactly the requested operation.
///
/// `message` is compared after trimming, as stored.
fn ensure_same_transfer(
    entry: &ledger_entries::Model,
    transfer: &Transfer,
    subject: Option<VideoId>,
    message: Option<&str>,
) -> Result<(), LedgerError> {
    let same = EntryKind::from(entry.kind) == transfer.kind
        && entry.from_account == transfer.from.map(AccountId::into_inner)
        && entry.to_account == transfer.to.into_inner()
        && entry.amount == transfer.amount.value()
        && entry.subject_id == subject.map(VideoId::into_inner)
        && entry.message.as_deref() == message;

    if same {
        Ok(())
    } else {
        Err(LedgerError::IdempotencyKeyReused(LedgerEntryId::from_uuid(
            entry.id,
        )))
    }
}

/// Write-locks the rows of `ids` in ascending id order.
///
/// Must precede every account read in the transaction. On SQLite this takes
/// the database write lock, so concurrent writers wait here instead of failing
/// a read-to-write lock upgrade. Unknown ids are left to the lookups that follow.
async fn claim_accounts<C: ConnectionTrait>(
    conn: &C,
    ids: &[AccountId],
    at: DateTime<Utc>,
) -> Result<(), DbErr> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    for id in ids {
        accounts::Entity::update_many()
            .col_expr(accounts::Column::UpdatedAt, Expr::value(at))
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .exec(conn)
            .await?;
    }
    Ok(())
}

async fn find_account<C: ConnectionTrait>(
    conn: &C,
    id: AccountId,
) -> Result<accounts::Model, TxnFailure> {
    let account = accounts::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
        .ok_or(LedgerError::AccountNotFound(id))?;
    Ok(account)
}

async fn balance_of<C: ConnectionTrait>(conn: &C, id: AccountId) -> Result<Coins, LedgerError> {
    accounts::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await
        .map_err(store_error)?
        .map(|account| Coins(account.balance))
        .ok_or(LedgerError::AccountNotFound(id))
}

/// Appends the ledger entry for `transfer`.
///
/// A duplicate id reports `EntryExists`.
pub(crate) async fn insert_entry<C: ConnectionTrait>(
    conn: &C,
    entry_id: LedgerEntryId,
    transfer: &Transfer,
    subject: Option<VideoId>,
    message: Option<String>,
    at: DateTime<Utc>,
) -> Result<(), TxnFailure> {
    let entry = ledger_entries::ActiveModel {
        id: Set(entry_id.into_inner()),
        kind: Set(transfer.kind.into()),
        amount: Set(transfer.amount.value()),
        from_account: Set(transfer.from.map(AccountId::into_inner)),
        to_account: Set(transfer.to.into_inner()),
        subject_id: Set(subject.map(VideoId::into_inner)),
        message: Set(message),
        created_at: Set(at),
    };

    ledger_entries::Entity::insert(entry)
        .exec_without_returning(conn)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                TxnFailure::EntryExists
            } else {
                TxnFailure::from(err)
            }
        })?;
    Ok(())
}

/// Applies every leg of `transfer` in account-id order.
pub(crate) async fn apply_legs<C: ConnectionTrait>(
    conn: &C,
    transfer: &Transfer,
    at: DateTime<Utc>,
) -> Result<(), LedgerError> {
    for leg in transfer.legs() {
        apply_leg(conn, &leg, at).await?;
    }
    Ok(())
}

async fn apply_leg<C: ConnectionTrait>(
    conn: &C,
    leg: &Leg,
    at: DateTime<Utc>,
) -> Result<(), LedgerError> {
    let id = leg.account_id;

    let update = match leg.action {
        LegAction::Debit(amount) => accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).sub(amount.value()),
            )
            .filter(accounts::Column::Balance.gte(amount.value())),
        LegAction::Credit { amount, earnings } => {
            let update = accounts::Entity::update_many().col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(amount.value()),
            );
            if earnings {
                update.col_expr(
                    accounts::Column::TotalEarnings,
                    Expr::col(accounts::Column::TotalEarnings).add(amount.value()),
                )
            } else {
                update
            }
        }
    };

    let result = update
        .col_expr(accounts::Column::UpdatedAt, Expr::value(at))
        .filter(accounts::Column::Id.eq(id.into_inner()))
        .exec(conn)
        .await
        .map_err(store_error)?;

    if result.rows_affected > 0 {
        return Ok(());
    }

    // Nothing matched: the account is gone or the guard refused the debit.
    match leg.action {
        LegAction::Debit(required) => {
            let available = balance_of(conn, id).await?;
            Err(LedgerError::InsufficientBalance {
                required,
                available,
            })
        }
        LegAction::Credit { .. } => Err(LedgerError::AccountNotFound(id)),
    }
}

/// Records the opening balance of a freshly inserted account as a top-up.
pub(crate) async fn credit_opening_balance<C: ConnectionTrait>(
    conn: &C,
    account: AccountId,
    amount: Coins,
    at: DateTime<Utc>,
) -> Result<Option<LedgerEntryId>, LedgerError> {
    if !amount.is_positive() {
        return Ok(None);
    }

    let entry_id = LedgerEntryId::new();
    let transfer = Transfer {
        kind: EntryKind::TopUp,
        from: None,
        to: account,
        amount,
    };
    insert_entry(conn, entry_id, &transfer, None, None, at)
        .await
        .map_err(|failure| failure.into_ledger_error(entry_id))?;
    apply_legs(conn, &transfer, at).await?;

    Ok(Some(entry_id))
}
