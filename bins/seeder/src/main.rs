//! Demo data seeder for ReelPay development.
//!
//! Seeds a creator with a free and two paid videos, two viewers, one purchase
//! and one gift. Money movements use fixed idempotency keys, so running the
//! seeder again replays them instead of moving coins twice.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use reelpay_core::ledger::GiftRequest;
use reelpay_core::{LedgerError, RetryPolicy, WalletPolicy};
use reelpay_db::entities::{accounts, videos};
use reelpay_db::migration::{Migrator, MigratorTrait};
use reelpay_db::{AccountRepository, HistoryRepository, VideoRepository, WalletRepository};
use reelpay_shared::types::{AccountId, LedgerEntryId, PageRequest, VideoId};
use uuid::Uuid;

/// Idempotency key of the demo purchase.
const DEMO_PURCHASE_KEY: &str = "00000000-0000-7000-8000-000000000001";
/// Idempotency key of the demo gift.
const DEMO_GIFT_KEY: &str = "00000000-0000-7000-8000-000000000002";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = reelpay_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;
    Migrator::up(&db, None).await?;

    let policy = WalletPolicy::default();
    let accounts = AccountRepository::new(db.clone(), policy);
    let videos = VideoRepository::new(db.clone());
    let wallet = WalletRepository::new(db.clone(), policy, RetryPolicy::default());
    let history = HistoryRepository::new(db);

    println!("Seeding accounts...");
    let creator = seed_account(&accounts, "demo_creator", "Demo Creator").await?;
    let viewer = seed_account(&accounts, "demo_viewer", "Demo Viewer").await?;
    let fan = seed_account(&accounts, "demo_fan", "Demo Fan").await?;

    println!("Seeding videos...");
    let catalog = seed_videos(&videos, AccountId::from_uuid(creator.id)).await?;

    println!("Seeding money movements...");
    if let Some(paid) = catalog.iter().find(|v| v.price > 0) {
        let receipt = wallet
            .purchase(
                AccountId::from_uuid(viewer.id),
                VideoId::from_uuid(paid.id),
                Some(demo_key(DEMO_PURCHASE_KEY)?),
            )
            .await;
        report("purchase", receipt.map(|r| r.replayed));
    }

    let receipt = wallet
        .gift(
            GiftRequest {
                sender: AccountId::from_uuid(fan.id),
                recipient: AccountId::from_uuid(creator.id),
                amount: 50,
                video_id: catalog.first().map(|v| VideoId::from_uuid(v.id)),
                message: Some("Welcome to ReelPay!".to_string()),
            },
            Some(demo_key(DEMO_GIFT_KEY)?),
        )
        .await;
    report("gift", receipt.map(|r| r.replayed));

    let totals = history.audit_totals().await?;
    println!(
        "Seeding complete! Balances {} / top-ups {} ({})",
        totals.total_balance,
        totals.total_top_ups,
        if totals.is_conserved() {
            "conserved"
        } else {
            "NOT conserved"
        }
    );

    Ok(())
}

fn demo_key(raw: &str) -> anyhow::Result<LedgerEntryId> {
    Ok(LedgerEntryId::from_uuid(Uuid::parse_str(raw)?))
}

fn report(operation: &str, outcome: Result<bool, LedgerError>) {
    match outcome {
        Ok(true) => println!("  Demo {operation} already applied, skipping..."),
        Ok(false) => println!("  Applied demo {operation}"),
        Err(e) => eprintln!("  Failed to apply demo {operation}: {e}"),
    }
}

/// Returns the account with `username`, registering it if missing.
async fn seed_account(
    repo: &AccountRepository,
    username: &str,
    display_name: &str,
) -> anyhow::Result<accounts::Model> {
    if let Some(existing) = repo.find_by_username(username).await? {
        println!("  Account {username} already exists, skipping...");
        return Ok(existing);
    }

    let account = repo.create(username, display_name).await?;
    println!("  Created account {username} with balance {}", account.balance);
    Ok(account)
}

/// Returns the creator's videos, registering the demo catalog if empty.
async fn seed_videos(
    repo: &VideoRepository,
    creator: AccountId,
) -> anyhow::Result<Vec<videos::Model>> {
    let existing = repo.list_by_owner(creator, PageRequest::default()).await?;
    if !existing.data.is_empty() {
        println!("  Creator already has videos, skipping...");
        return Ok(existing.data);
    }

    let mut catalog = Vec::new();
    for (title, price) in [
        ("Behind the scenes", 0),
        ("Full tutorial: color grading", 120),
        ("Director's cut", 300),
    ] {
        let video = repo.create(creator, title, price).await?;
        println!("  Created video \"{title}\" priced {price}");
        catalog.push(video);
    }
    Ok(catalog)
}
