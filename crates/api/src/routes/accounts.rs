//! Account registration and profile routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use reelpay_core::LedgerError;
use reelpay_db::entities::accounts;
use reelpay_shared::types::{AccountId, Coins, PageRequest, PageResponse};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::videos::VideoResponse;
use crate::{ApiError, AppState, middleware::AuthUser};

/// Routes reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/accounts", post(register))
}

/// Routes for the authenticated account (auth middleware applied externally).
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/me", get(me))
        .route("/accounts/me/videos", get(my_videos))
}

/// Request body for registering an account.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Unique handle, 3-30 chars of a-z, 0-9 or _.
    pub username: String,
    /// Name shown to other users.
    pub display_name: String,
}

/// Public view of an account.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub id: AccountId,
    /// Username.
    pub username: String,
    /// Display name.
    pub display_name: String,
    /// Spendable balance.
    pub balance: Coins,
    /// Cumulative earnings from purchases and gifts.
    pub total_earnings: Coins,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl From<accounts::Model> for AccountResponse {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: AccountId::from_uuid(model.id),
            username: model.username,
            display_name: model.display_name,
            balance: Coins(model.balance),
            total_earnings: Coins(model.total_earnings),
            created_at: model.created_at,
        }
    }
}

/// Response for a successful registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// The new account.
    pub account: AccountResponse,
    /// Signed access token.
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// POST /accounts - Register an account with the starting balance.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .accounts()
        .create(&payload.username, &payload.display_name)
        .await?;

    let access_token = state
        .jwt_service
        .generate_access_token(account.id, &account.username)?;

    info!(account_id = %account.id, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            account: account.into(),
            access_token,
            token_type: "Bearer",
            expires_in: state.jwt_service.access_token_expires_in(),
        }),
    ))
}

/// GET /accounts/me - The authenticated account.
async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<AccountResponse>, ApiError> {
    let account_id = auth.account_id();
    let account = state
        .accounts()
        .find_by_id(account_id)
        .await?
        .ok_or(LedgerError::AccountNotFound(account_id))?;

    Ok(Json(account.into()))
}

/// GET /accounts/me/videos - Videos owned by the authenticated account.
async fn my_videos(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResponse<VideoResponse>>, ApiError> {
    let videos = state
        .videos()
        .list_by_owner(auth.account_id(), page)
        .await?;

    Ok(Json(videos.map(VideoResponse::from)))
}
