//! Wallet history: summaries, gift lists, ledger statements and audit totals.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reelpay_core::ledger::{EntryKind, LedgerError};
use reelpay_shared::types::{
    AccountId, Coins, LedgerEntryId, PageRequest, PageResponse, PurchaseId, VideoId,
};
use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::sea_orm_active_enums::LedgerEntryKind;
use crate::entities::{accounts, ledger_entries, purchases, videos};
use crate::store_error;

const RECENT_PURCHASES: u64 = 10;
const RECENT_GIFTS: u64 = 5;

/// Which side of a gift the account is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GiftDirection {
    /// Gifts the account received.
    #[default]
    Received,
    /// Gifts the account sent.
    Sent,
}

/// A purchase as shown in the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseView {
    /// The purchase record.
    pub purchase_id: PurchaseId,
    /// The purchased video.
    pub video_id: VideoId,
    /// Title, if the video still exists.
    pub video_title: Option<String>,
    /// Price paid.
    pub amount: Coins,
    /// Commit time.
    pub purchased_at: DateTime<Utc>,
}

/// A gift with both parties resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GiftView {
    /// The GIFT ledger entry.
    pub entry_id: LedgerEntryId,
    /// Paying account.
    pub sender: AccountId,
    /// Sender's username.
    pub sender_username: Option<String>,
    /// Receiving account.
    pub recipient: AccountId,
    /// Recipient's username.
    pub recipient_username: Option<String>,
    /// Amount moved.
    pub amount: Coins,
    /// Video the gift is attached to.
    pub video_id: Option<VideoId>,
    /// Note to the recipient.
    pub message: Option<String>,
    /// Commit time.
    pub created_at: DateTime<Utc>,
}

/// A ledger entry seen from one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    /// The ledger entry.
    pub entry_id: LedgerEntryId,
    /// Entry kind.
    pub kind: EntryKind,
    /// Unsigned amount.
    pub amount: Coins,
    /// Signed effect on the viewing account's balance.
    pub delta: i64,
    /// Paying account, absent for top-ups.
    pub from_account: Option<AccountId>,
    /// Receiving account.
    pub to_account: AccountId,
    /// Related video, if any.
    pub subject_id: Option<Uuid>,
    /// Gift note, if any.
    pub message: Option<String>,
    /// Commit time.
    pub created_at: DateTime<Utc>,
}

/// Balance, earnings and recent activity of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletSummary {
    /// The account.
    pub account_id: AccountId,
    /// Spendable balance.
    pub balance: Coins,
    /// Cumulative earnings.
    pub total_earnings: Coins,
    /// Latest purchases.
    pub recent_purchases: Vec<PurchaseView>,
    /// Latest gifts sent.
    pub gifts_sent: Vec<GiftView>,
    /// Latest gifts received.
    pub gifts_received: Vec<GiftView>,
}

/// Store-wide totals for the conservation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuditTotals {
    /// Sum of all account balances.
    pub total_balance: i64,
    /// Sum of all TOPUP entries.
    pub total_top_ups: i64,
}

impl AuditTotals {
    /// True when every coin in circulation entered through a top-up.
    #[must_use]
    pub const fn is_conserved(&self) -> bool {
        self.total_balance == self.total_top_ups
    }
}

/// Read-side queries over the ledger.
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    db: DatabaseConnection,
}

impl HistoryRepository {
    /// Creates a new history repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns balance, earnings, the 10 latest purchases and the 5 latest
    /// gifts in each direction.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` or a store error.
    pub async fn wallet_summary(&self, account: AccountId) -> Result<WalletSummary, LedgerError> {
        let row = accounts::Entity::find_by_id(account.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)?
            .ok_or(LedgerError::AccountNotFound(account))?;

        let rows = purchases::Entity::find()
            .filter(purchases::Column::AccountId.eq(account.into_inner()))
            .find_also_related(videos::Entity)
            .order_by_desc(purchases::Column::CreatedAt)
            .order_by_desc(purchases::Column::Id)
            .limit(RECENT_PURCHASES)
            .all(&self.db)
            .await
            .map_err(store_error)?;

        let recent_purchases = rows
            .into_iter()
            .map(|(record, video)| PurchaseView {
                purchase_id: PurchaseId::from_uuid(record.id),
                video_id: VideoId::from_uuid(record.video_id),
                video_title: video.map(|v| v.title),
                amount: Coins(record.amount),
                purchased_at: record.created_at,
            })
            .collect();

        let sent = newest_first(gifts_query(account, GiftDirection::Sent))
            .limit(RECENT_GIFTS)
            .all(&self.db)
            .await
            .map_err(store_error)?;
        let received = newest_first(gifts_query(account, GiftDirection::Received))
            .limit(RECENT_GIFTS)
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok(WalletSummary {
            account_id: account,
            balance: Coins(row.balance),
            total_earnings: Coins(row.total_earnings),
            recent_purchases,
            gifts_sent: self.gift_views(sent).await?,
            gifts_received: self.gift_views(received).await?,
        })
    }

    /// Lists gifts sent or received by `account`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn list_gifts(
        &self,
        account: AccountId,
        direction: GiftDirection,
        page: PageRequest,
    ) -> Result<PageResponse<GiftView>, LedgerError> {
        let page = page.normalized();
        let query = gifts_query(account, direction);

        let total = query.clone().count(&self.db).await.map_err(store_error)?;
        let entries = newest_first(query)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(store_error)?;

        Ok(PageResponse::new(self.gift_views(entries).await?, page, total))
    }

    /// Lists every ledger entry touching `account`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn list_entries(
        &self,
        account: AccountId,
        page: PageRequest,
    ) -> Result<PageResponse<EntryView>, LedgerError> {
        let page = page.normalized();
        let id = account.into_inner();
        let query = ledger_entries::Entity::find().filter(
            Condition::any()
                .add(ledger_entries::Column::FromAccount.eq(id))
                .add(ledger_entries::Column::ToAccount.eq(id)),
        );

        let total = query.clone().count(&self.db).await.map_err(store_error)?;
        let entries = newest_first(query)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(store_error)?;

        let views = entries
            .into_iter()
            .map(|entry| {
                let delta = if entry.to_account == id {
                    entry.amount
                } else {
                    -entry.amount
                };
                EntryView {
                    entry_id: LedgerEntryId::from_uuid(entry.id),
                    kind: entry.kind.into(),
                    amount: Coins(entry.amount),
                    delta,
                    from_account: entry.from_account.map(AccountId::from_uuid),
                    to_account: AccountId::from_uuid(entry.to_account),
                    subject_id: entry.subject_id,
                    message: entry.message,
                    created_at: entry.created_at,
                }
            })
            .collect();

        Ok(PageResponse::new(views, page, total))
    }

    /// Sums all balances and all top-ups.
    ///
    /// # Errors
    ///
    /// Returns a store error if the query fails.
    pub async fn audit_totals(&self) -> Result<AuditTotals, LedgerError> {
        let total_balance = accounts::Entity::find()
            .select_only()
            .column_as(sum_as_bigint(accounts::Column::Balance), "total")
            .into_tuple::<Option<i64>>()
            .one(&self.db)
            .await
            .map_err(store_error)?
            .flatten()
            .unwrap_or(0);

        let total_top_ups = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::Kind.eq(LedgerEntryKind::TopUp))
            .select_only()
            .column_as(sum_as_bigint(ledger_entries::Column::Amount), "total")
            .into_tuple::<Option<i64>>()
            .one(&self.db)
            .await
            .map_err(store_error)?
            .flatten()
            .unwrap_or(0);

        Ok(AuditTotals {
            total_balance,
            total_top_ups,
        })
    }

    async fn gift_views(
        &self,
        entries: Vec<ledger_entries::Model>,
    ) -> Result<Vec<GiftView>, LedgerError> {
        let mut ids: Vec<Uuid> = entries
            .iter()
            .flat_map(|e| e.from_account.into_iter().chain(std::iter::once(e.to_account)))
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let usernames: HashMap<Uuid, String> = if ids.is_empty() {
            HashMap::new()
        } else {
            accounts::Entity::find()
                .filter(accounts::Column::Id.is_in(ids))
                .all(&self.db)
                .await
                .map_err(store_error)?
                .into_iter()
                .map(|a| (a.id, a.username))
                .collect()
        };

        Ok(entries
            .into_iter()
            .map(|entry| {
                let sender = entry.from_account.unwrap_or_default();
                GiftView {
                    entry_id: LedgerEntryId::from_uuid(entry.id),
                    sender: AccountId::from_uuid(sender),
                    sender_username: usernames.get(&sender).cloned(),
                    recipient: AccountId::from_uuid(entry.to_account),
                    recipient_username: usernames.get(&entry.to_account).cloned(),
                    amount: Coins(entry.amount),
                    video_id: entry.subject_id.map(VideoId::from_uuid),
                    message: entry.message,
                    created_at: entry.created_at,
                }
            })
            .collect())
    }
}

fn gifts_query(account: AccountId, direction: GiftDirection) -> Select<ledger_entries::Entity> {
    let side = match direction {
        GiftDirection::Sent => ledger_entries::Column::FromAccount,
        GiftDirection::Received => ledger_entries::Column::ToAccount,
    };
    ledger_entries::Entity::find()
        .filter(ledger_entries::Column::Kind.eq(LedgerEntryKind::Gift))
        .filter(side.eq(account.into_inner()))
}

fn newest_first(query: Select<ledger_entries::Entity>) -> Select<ledger_entries::Entity> {
    query
        .order_by_desc(ledger_entries::Column::CreatedAt)
        .order_by_desc(ledger_entries::Column::Id)
}

/// `CAST(SUM(col) AS BIGINT)`; Postgres widens `SUM(bigint)` to numeric.
fn sum_as_bigint<C: ColumnTrait>(column: C) -> SimpleExpr {
    Func::cast_as(Func::sum(Expr::col(column)), Alias::new("BIGINT")).into()
}
