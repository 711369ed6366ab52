//! Money movements and access checks through the HTTP API.

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

mod common;

use common::{TestApp, build};

#[tokio::test]
async fn test_purchase_unlocks_video() {
    let app = TestApp::new().await;
    let creator = app.register("creator").await;
    let viewer = app.register("viewer").await;
    let video = app.video(&creator, 100).await;

    let access_uri = format!("/api/v1/videos/{video}/access");
    let (status, body) = app.get(&access_uri, &viewer.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "can_access": false, "entitlement": "locked" }));

    let purchase_uri = format!("/api/v1/videos/{video}/purchase");
    let (status, receipt) = app.post(&purchase_uri, &viewer.token, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["amount"], 100);
    assert_eq!(receipt["new_balance"], 400);
    assert_eq!(receipt["replayed"], false);

    let (_, body) = app.get(&access_uri, &viewer.token).await;
    assert_eq!(body, json!({ "can_access": true, "entitlement": "purchased" }));

    let (status, body) = app.get(&purchase_uri, &viewer.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_purchased"], true);
    assert!(body["purchase_date"].is_string());

    let (_, me) = app.get("/api/v1/accounts/me", &creator.token).await;
    assert_eq!(me["balance"], 600);
    assert_eq!(me["total_earnings"], 100);
}

#[tokio::test]
async fn test_second_purchase_conflicts() {
    let app = TestApp::new().await;
    let creator = app.register("creator").await;
    let viewer = app.register("viewer").await;
    let video = app.video(&creator, 100).await;
    let uri = format!("/api/v1/videos/{video}/purchase");

    app.post(&uri, &viewer.token, json!({})).await;
    let (status, body) = app.post(&uri, &viewer.token, json!({})).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ALREADY_PURCHASED");
    assert_eq!(app.balance(&viewer).await, 400);
}

#[tokio::test]
async fn test_owner_cannot_buy_own_video() {
    let app = TestApp::new().await;
    let creator = app.register("creator").await;
    let video = app.video(&creator, 100).await;

    let (status, body) = app
        .post(&format!("/api/v1/videos/{video}/purchase"), &creator.token, json!({}))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "SELF_PURCHASE_NOT_ALLOWED");
    assert_eq!(app.balance(&creator).await, 500);
}

#[tokio::test]
async fn test_video_detail_reports_entitlement() {
    let app = TestApp::new().await;
    let creator = app.register("creator").await;
    let viewer = app.register("viewer").await;
    let free = app.video(&creator, 0).await;

    let (status, body) = app
        .get(&format!("/api/v1/videos/{free}"), &viewer.token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], free.as_str());
    assert_eq!(body["title"], "Launch trailer");
    assert_eq!(body["entitlement"], "free");
    assert_eq!(body["can_access"], true);

    let (_, body) = app
        .get(&format!("/api/v1/videos/{free}"), &creator.token)
        .await;
    assert_eq!(body["entitlement"], "owner");
}

#[tokio::test]
async fn test_unknown_video_is_not_found() {
    let app = TestApp::new().await;
    let viewer = app.register("viewer").await;

    let (status, body) = app
        .get(&format!("/api/v1/videos/{}/access", Uuid::now_v7()), &viewer.token)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "VIDEO_NOT_FOUND");
}

#[tokio::test]
async fn test_gift_beyond_balance_reports_amounts() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;

    let (status, body) = app
        .post(
            "/api/v1/gifts",
            &alice.token,
            json!({ "recipient_id": bob.id, "amount": 600 }),
        )
        .await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"], "INSUFFICIENT_BALANCE");
    assert_eq!(body["details"], json!({ "required": 600, "available": 500 }));
    assert_eq!(app.balance(&alice).await, 500);
}

#[tokio::test]
async fn test_gift_replay_with_idempotency_key() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let key = Uuid::now_v7().to_string();
    let body = json!({ "recipient_id": bob.id, "amount": 100, "message": "  great stream  " });

    let (status, first) = app
        .send(build(
            Method::POST,
            "/api/v1/gifts",
            Some(alice.token.as_str()),
            Some(body.clone()),
            Some(key.as_str()),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["entry_id"], key.as_str());
    assert_eq!(first["message"], "great stream");

    let (status, second) = app
        .send(build(
            Method::POST,
            "/api/v1/gifts",
            Some(alice.token.as_str()),
            Some(body),
            Some(key.as_str()),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["replayed"], true);
    assert_eq!(second["created_at"], first["created_at"]);

    assert_eq!(app.balance(&alice).await, 400);
    assert_eq!(app.balance(&bob).await, 600);

    let (_, received) = app.get("/api/v1/gifts", &bob.token).await;
    assert_eq!(received["meta"]["total"], 1);
    assert_eq!(received["data"][0]["sender_username"], "alice");

    let (_, sent) = app.get("/api/v1/gifts?direction=sent", &alice.token).await;
    assert_eq!(sent["meta"]["total"], 1);
    let (_, none_sent) = app.get("/api/v1/gifts?direction=sent", &bob.token).await;
    assert_eq!(none_sent["meta"]["total"], 0);
}

#[tokio::test]
async fn test_reused_key_for_other_operation_conflicts() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let key = Uuid::now_v7().to_string();

    let (status, _) = app
        .send(build(
            Method::POST,
            "/api/v1/gifts",
            Some(alice.token.as_str()),
            Some(json!({ "recipient_id": bob.id, "amount": 100 })),
            Some(key.as_str()),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send(build(
            Method::POST,
            "/api/v1/gifts",
            Some(alice.token.as_str()),
            Some(json!({ "recipient_id": bob.id, "amount": 200 })),
            Some(key.as_str()),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "IDEMPOTENCY_KEY_REUSED");
    assert_eq!(app.balance(&alice).await, 400);
}

#[tokio::test]
async fn test_malformed_idempotency_key_is_rejected() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;

    let (status, body) = app
        .send(build(
            Method::POST,
            "/api/v1/wallet/top-up",
            Some(alice.token.as_str()),
            Some(json!({ "amount": 100 })),
            Some("abc"),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_IDEMPOTENCY_KEY");
    assert_eq!(app.balance(&alice).await, 500);
}

#[tokio::test]
async fn test_self_gift_is_forbidden() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;

    let (status, body) = app
        .post(
            "/api/v1/gifts",
            &alice.token,
            json!({ "recipient_id": alice.id, "amount": 10 }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "SELF_GIFT_NOT_ALLOWED");
}

#[tokio::test]
async fn test_top_up_and_statement() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;

    let (status, receipt) = app
        .post("/api/v1/wallet/top-up", &alice.token, json!({ "amount": 250 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(receipt["new_balance"], 750);

    let (status, body) = app
        .post("/api/v1/wallet/top-up", &alice.token, json!({ "amount": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_AMOUNT");
    assert_eq!(body["details"]["amount"], 0);

    let (status, entries) = app.get("/api/v1/wallet/entries", &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries["meta"]["total"], 2);
    for entry in entries["data"].as_array().unwrap() {
        assert_eq!(entry["kind"], "TOPUP");
        assert!(entry["delta"].as_i64().unwrap() > 0);
    }
}

#[tokio::test]
async fn test_wallet_summary_shows_recent_activity() {
    let app = TestApp::new().await;
    let creator = app.register("creator").await;
    let viewer = app.register("viewer").await;
    let video = app.video(&creator, 120).await;

    app.post(&format!("/api/v1/videos/{video}/purchase"), &viewer.token, json!({}))
        .await;
    app.post(
        "/api/v1/gifts",
        &viewer.token,
        json!({ "recipient_id": creator.id, "amount": 30, "video_id": video }),
    )
    .await;

    let (status, summary) = app.get("/api/v1/wallet", &viewer.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["balance"], 350);
    assert_eq!(summary["recent_purchases"][0]["video_title"], "Launch trailer");
    assert_eq!(summary["gifts_sent"][0]["amount"], 30);
    assert_eq!(summary["gifts_sent"][0]["video_id"], video.as_str());

    let (_, summary) = app.get("/api/v1/wallet", &creator.token).await;
    assert_eq!(summary["total_earnings"], 150);
    assert_eq!(summary["gifts_received"][0]["recipient_username"], "creator");
}
