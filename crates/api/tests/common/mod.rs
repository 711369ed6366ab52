//! Shared setup for API tests: a router over a fresh in-memory database.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use reelpay_api::{AppState, create_router};
use reelpay_core::{RetryPolicy, WalletPolicy};
use reelpay_db::migration::{Migrator, MigratorTrait};
use reelpay_shared::{JwtConfig, JwtService};
use sea_orm::{ConnectOptions, Database};
use serde_json::Value;
use tower::ServiceExt;

/// A registered account as seen by a client.
pub struct Client {
    pub id: String,
    pub token: String,
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options
            .max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(options)
            .await
            .expect("Failed to open in-memory database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let jwt = JwtService::new(JwtConfig {
            secret: "api-test-secret".to_string(),
            access_token_expires_secs: 3600,
        });
        let state = AppState::new(db, jwt, WalletPolicy::default(), RetryPolicy::none());

        Self {
            router: create_router(state.clone()),
            state,
        }
    }

    /// Sends a raw request and returns status plus JSON body (`Null` if not JSON).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body collects")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send(build(method, uri, token, body, None)).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Registers an account with the default starting balance.
    pub async fn register(&self, username: &str) -> Client {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/v1/accounts",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "display_name": username,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");

        Client {
            id: body["account"]["id"].as_str().expect("account id").to_string(),
            token: body["access_token"].as_str().expect("token").to_string(),
        }
    }

    /// Registers a video for `owner` and returns its id.
    pub async fn video(&self, owner: &Client, price: i64) -> String {
        let (status, body) = self
            .post(
                "/api/v1/videos",
                &owner.token,
                serde_json::json!({ "title": "Launch trailer", "price": price }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "video failed: {body}");
        body["id"].as_str().expect("video id").to_string()
    }

    pub async fn balance(&self, client: &Client) -> i64 {
        let (_, body) = self.get("/api/v1/accounts/me", &client.token).await;
        body["balance"].as_i64().expect("balance")
    }
}

pub fn build(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
    idempotency_key: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(key) = idempotency_key {
        builder = builder.header("Idempotency-Key", key);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}
