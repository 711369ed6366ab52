//! Shared setup for database integration tests.
//!
//! Each test gets its own SQLite database with migrations applied: in memory
//! behind a single connection, or in a temporary file behind a pool of several
//! connections when operations must really run side by side.

#![allow(dead_code)]

use reelpay_core::{RetryPolicy, WalletPolicy};
use reelpay_db::entities::{accounts, videos};
use reelpay_db::migration::{Migrator, MigratorTrait};
use reelpay_db::{
    AccessRepository, AccountRepository, HistoryRepository, VideoRepository, WalletRepository,
};
use reelpay_shared::types::{AccountId, VideoId};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tempfile::TempDir;

/// Connections in the pool used by concurrency tests.
pub const POOL_SIZE: u32 = 10;

/// Repositories wired to one fresh database.
pub struct TestContext {
    pub db: DatabaseConnection,
    pub accounts: AccountRepository,
    pub videos: VideoRepository,
    pub wallet: WalletRepository,
    pub access: AccessRepository,
    pub history: HistoryRepository,
    /// Holds the database file of a pooled context until the test ends.
    _dir: Option<TempDir>,
}

pub async fn connect() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // A single connection keeps every query on the same in-memory database.
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    open(options).await
}

/// Opens a file database in `dir` behind a pool of `POOL_SIZE` connections.
pub async fn connect_pooled(dir: &TempDir) -> DatabaseConnection {
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("ledger.db").display());
    let mut options = ConnectOptions::new(url);
    options
        .max_connections(POOL_SIZE)
        .min_connections(POOL_SIZE)
        .sqlx_logging(false);

    open(options).await
}

async fn open(options: ConnectOptions) -> DatabaseConnection {
    let db = Database::connect(options)
        .await
        .expect("Failed to open test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_policy(WalletPolicy::default()).await
    }

    pub async fn with_policy(policy: WalletPolicy) -> Self {
        Self::wire(connect().await, policy, RetryPolicy::default(), None)
    }

    /// A context whose operations run on separate connections.
    pub async fn pooled() -> Self {
        Self::pooled_with_retry(RetryPolicy::default()).await
    }

    pub async fn pooled_with_retry(retry: RetryPolicy) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = connect_pooled(&dir).await;
        Self::wire(db, WalletPolicy::default(), retry, Some(dir))
    }

    fn wire(
        db: DatabaseConnection,
        policy: WalletPolicy,
        retry: RetryPolicy,
        dir: Option<TempDir>,
    ) -> Self {
        Self {
            accounts: AccountRepository::new(db.clone(), policy),
            videos: VideoRepository::new(db.clone()),
            wallet: WalletRepository::new(db.clone(), policy, retry),
            access: AccessRepository::new(db.clone()),
            history: HistoryRepository::new(db.clone()),
            db,
            _dir: dir,
        }
    }

    /// Registers an account and returns its id.
    pub async fn account(&self, username: &str) -> AccountId {
        let model = self
            .accounts
            .create(username, username)
            .await
            .expect("Failed to create account");
        AccountId::from_uuid(model.id)
    }

    /// Registers an account and tops it up (or drains it) to `balance`.
    ///
    /// Balances below the starting balance are reached by gifting the excess
    /// to a sink account.
    pub async fn account_with_balance(&self, username: &str, balance: i64) -> AccountId {
        let id = self.account(username).await;
        let current = self.balance(id).await;
        if balance > current {
            let mut missing = balance - current;
            while missing > 0 {
                let step = missing.min(self.wallet.policy().max_top_up.value());
                self.wallet.top_up(id, step, None).await.expect("top-up");
                missing -= step;
            }
        } else if balance < current {
            let sink = self.account(&format!("{username}_sink")).await;
            self.wallet
                .gift(
                    reelpay_core::ledger::GiftRequest {
                        sender: id,
                        recipient: sink,
                        amount: current - balance,
                        video_id: None,
                        message: None,
                    },
                    None,
                )
                .await
                .expect("drain");
        }
        id
    }

    pub async fn video(&self, owner: AccountId, price: i64) -> VideoId {
        let model = self
            .videos
            .create(owner, "Test video", price)
            .await
            .expect("Failed to create video");
        VideoId::from_uuid(model.id)
    }

    pub async fn account_row(&self, id: AccountId) -> accounts::Model {
        self.accounts
            .find_by_id(id)
            .await
            .expect("query")
            .expect("account exists")
    }

    pub async fn balance(&self, id: AccountId) -> i64 {
        self.account_row(id).await.balance
    }

    pub async fn earnings(&self, id: AccountId) -> i64 {
        self.account_row(id).await.total_earnings
    }

    pub async fn video_row(&self, id: VideoId) -> videos::Model {
        self.videos
            .find_by_id(id)
            .await
            .expect("query")
            .expect("video exists")
    }

    /// Asserts the conservation invariant.
    pub async fn assert_conserved(&self) {
        let totals = self.history.audit_totals().await.expect("audit");
        assert!(
            totals.is_conserved(),
            "balances {} != top-ups {}",
            totals.total_balance,
            totals.total_top_ups
        );
    }
}
