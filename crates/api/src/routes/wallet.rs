//! Wallet routes: summary, top-ups and the ledger statement.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use reelpay_db::repositories::{EntryView, WalletSummary};
use reelpay_shared::types::{PageRequest, PageResponse};
use serde::Deserialize;

use crate::{ApiError, AppState, extractors::IdempotencyKey, middleware::AuthUser};

/// Creates the wallet routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallet", get(get_wallet))
        .route("/wallet/top-up", post(top_up))
        .route("/wallet/entries", get(list_entries))
}

/// Request body for a top-up.
#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    /// Coins to credit.
    pub amount: i64,
}

/// GET /wallet - Balance, earnings and recent activity.
async fn get_wallet(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<WalletSummary>, ApiError> {
    let summary = state.history().wallet_summary(auth.account_id()).await?;
    Ok(Json(summary))
}

/// POST /wallet/top-up - Credit the caller's wallet.
async fn top_up(
    State(state): State<AppState>,
    auth: AuthUser,
    key: IdempotencyKey,
    Json(payload): Json<TopUpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state
        .wallet()
        .top_up(auth.account_id(), payload.amount, key.into_inner())
        .await?;

    let status = if receipt.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(receipt)))
}

/// GET /wallet/entries - Ledger entries touching the caller, newest first.
async fn list_entries(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResponse<EntryView>>, ApiError> {
    let entries = state
        .history()
        .list_entries(auth.account_id(), page)
        .await?;
    Ok(Json(entries))
}
