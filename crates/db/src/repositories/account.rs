//! Account repository: registration and lookup.

use reelpay_core::ledger::{LedgerError, WalletPolicy};
use reelpay_core::profile::{self, ProfileError};
use reelpay_shared::types::AccountId;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use tracing::info;

use super::wallet::{credit_opening_balance, now};
use crate::entities::accounts;
use crate::is_unique_violation;

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Username or display name rejected.
    #[error(transparent)]
    Invalid(#[from] ProfileError),

    /// Username already registered.
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    /// Account not found.
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    /// Opening balance could not be recorded.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Account repository for registration and lookups.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
    policy: WalletPolicy,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, policy: WalletPolicy) -> Self {
        Self { db, policy }
    }

    /// Registers an account and grants the starting balance.
    ///
    /// The starting balance is written as a TOPUP ledger entry in the same
    /// transaction as the account row.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` for a malformed username or display name, and
    /// `UsernameTaken` if the username exists.
    pub async fn create(
        &self,
        username: &str,
        display_name: &str,
    ) -> Result<accounts::Model, AccountError> {
        let username = profile::normalize_username(username)?;
        let display_name = profile::normalize_display_name(display_name)?;
        let id = AccountId::new();
        let created_at = now();

        let txn = self.db.begin().await?;

        let account = accounts::ActiveModel {
            id: Set(id.into_inner()),
            username: Set(username.clone()),
            display_name: Set(display_name),
            balance: Set(0),
            total_earnings: Set(0),
            created_at: Set(created_at),
            updated_at: Set(created_at),
        };
        accounts::Entity::insert(account)
            .exec_without_returning(&txn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    AccountError::UsernameTaken(username.clone())
                } else {
                    AccountError::Database(err)
                }
            })?;

        credit_opening_balance(&txn, id, self.policy.starting_balance, created_at).await?;
        txn.commit().await?;

        info!(
            account_id = %id,
            username = %username,
            starting_balance = self.policy.starting_balance.value(),
            "Account opened"
        );

        self.find_by_id(id).await?.ok_or(AccountError::NotFound(id))
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<accounts::Model>, DbErr> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
    }

    /// Finds an account by username (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<accounts::Model>, DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::Username.eq(username.trim().to_lowercase()))
            .one(&self.db)
            .await
    }
}
