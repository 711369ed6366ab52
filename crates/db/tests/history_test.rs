//! Wallet history integration tests.

mod common;

use common::TestContext;
use reelpay_core::ledger::{EntryKind, GiftRequest};
use reelpay_db::repositories::GiftDirection;
use reelpay_shared::types::{AccountId, Coins, PageRequest};

async fn send(ctx: &TestContext, sender: AccountId, recipient: AccountId, amount: i64) {
    ctx.wallet
        .gift(
            GiftRequest {
                sender,
                recipient,
                amount,
                video_id: None,
                message: Some(format!("gift of {amount}")),
            },
            None,
        )
        .await
        .expect("gift");
}

#[tokio::test]
async fn test_wallet_summary_limits() {
    let ctx = TestContext::new().await;
    let alice = ctx.account("alice").await;
    let bob = ctx.account("bob").await;
    ctx.wallet.top_up(alice, 5_000, None).await.unwrap();

    for i in 0..12 {
        let video = ctx.video(bob, 10).await;
        ctx.wallet.purchase(alice, video, None).await.unwrap();
        if i < 7 {
            send(&ctx, alice, bob, 1).await;
            send(&ctx, bob, alice, 2).await;
        }
    }

    let summary = ctx.history.wallet_summary(alice).await.unwrap();
    assert_eq!(summary.account_id, alice);
    assert_eq!(summary.balance.value(), ctx.balance(alice).await);
    assert_eq!(summary.recent_purchases.len(), 10);
    assert_eq!(summary.gifts_sent.len(), 5);
    assert_eq!(summary.gifts_received.len(), 5);
    assert!(
        summary
            .recent_purchases
            .iter()
            .all(|p| p.video_title.as_deref() == Some("Test video") && p.amount == Coins(10))
    );
    assert!(summary.gifts_sent.iter().all(|g| g.sender == alice));
    assert!(
        summary
            .gifts_received
            .iter()
            .all(|g| g.recipient == alice && g.sender_username.as_deref() == Some("bob"))
    );
}

#[tokio::test]
async fn test_list_gifts_by_direction_and_page() {
    let ctx = TestContext::new().await;
    let alice = ctx.account("alice").await;
    let bob = ctx.account("bob").await;
    let carol = ctx.account("carol").await;

    for amount in 1..=7 {
        send(&ctx, alice, bob, amount).await;
    }
    send(&ctx, carol, bob, 50).await;

    let received = ctx
        .history
        .list_gifts(bob, GiftDirection::Received, PageRequest::new(1, 5))
        .await
        .unwrap();
    assert_eq!(received.meta.total, 8);
    assert_eq!(received.meta.total_pages, 2);
    assert_eq!(received.data.len(), 5);

    let second_page = ctx
        .history
        .list_gifts(bob, GiftDirection::Received, PageRequest::new(2, 5))
        .await
        .unwrap();
    assert_eq!(second_page.data.len(), 3);

    let sent = ctx
        .history
        .list_gifts(alice, GiftDirection::Sent, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(sent.meta.total, 7);
    let total_sent: i64 = sent.data.iter().map(|g| g.amount.value()).sum();
    assert_eq!(total_sent, 28);

    let none = ctx
        .history
        .list_gifts(alice, GiftDirection::Received, PageRequest::default())
        .await
        .unwrap();
    assert!(none.data.is_empty());
    assert_eq!(none.meta.total, 0);
}

#[tokio::test]
async fn test_list_entries_signed_deltas() {
    let ctx = TestContext::new().await;
    let alice = ctx.account("alice").await;
    let bob = ctx.account("bob").await;
    let video = ctx.video(bob, 40).await;

    send(&ctx, alice, bob, 30).await;
    ctx.wallet.purchase(alice, video, None).await.unwrap();
    ctx.wallet.top_up(alice, 100, None).await.unwrap();

    let page = ctx
        .history
        .list_entries(alice, PageRequest::new(1, 50))
        .await
        .unwrap();

    // Opening balance, gift, purchase, top-up.
    assert_eq!(page.meta.total, 4);
    let net: i64 = page.data.iter().map(|e| e.delta).sum();
    assert_eq!(net, ctx.balance(alice).await);
    assert_eq!(net, 500 - 30 - 40 + 100);

    let purchase = page
        .data
        .iter()
        .find(|e| e.kind == EntryKind::Purchase)
        .expect("purchase entry");
    assert_eq!(purchase.delta, -40);
    assert_eq!(purchase.subject_id, Some(video.into_inner()));

    let bob_page = ctx
        .history
        .list_entries(bob, PageRequest::new(1, 50))
        .await
        .unwrap();
    let bob_net: i64 = bob_page.data.iter().map(|e| e.delta).sum();
    assert_eq!(bob_net, ctx.balance(bob).await);
}

#[tokio::test]
async fn test_audit_totals_on_empty_store() {
    let ctx = TestContext::new().await;
    let totals = ctx.history.audit_totals().await.unwrap();
    assert_eq!(totals.total_balance, 0);
    assert_eq!(totals.total_top_ups, 0);
    assert!(totals.is_conserved());
}
