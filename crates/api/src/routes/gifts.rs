//! Gift routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use reelpay_core::ledger::GiftRequest;
use reelpay_db::GiftDirection;
use reelpay_db::repositories::GiftView;
use reelpay_shared::types::{AccountId, PageRequest, PageResponse, VideoId};
use serde::Deserialize;

use crate::{ApiError, AppState, extractors::IdempotencyKey, middleware::AuthUser};

/// Creates the gift routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/gifts", post(send_gift).get(list_gifts))
}

/// Request body for sending a gift.
#[derive(Debug, Deserialize)]
pub struct SendGiftRequest {
    /// Receiving account.
    pub recipient_id: AccountId,
    /// Coins to move.
    pub amount: i64,
    /// Video the gift is attached to.
    pub video_id: Option<VideoId>,
    /// Note to the recipient.
    pub message: Option<String>,
}

/// Query parameters for listing gifts.
#[derive(Debug, Deserialize)]
pub struct ListGiftsQuery {
    /// `received` (default) or `sent`.
    #[serde(default)]
    pub direction: GiftDirection,
    /// Page number.
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

impl ListGiftsQuery {
    fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        )
    }
}

/// POST /gifts - Send coins from the caller to another account.
async fn send_gift(
    State(state): State<AppState>,
    auth: AuthUser,
    key: IdempotencyKey,
    Json(payload): Json<SendGiftRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = GiftRequest {
        sender: auth.account_id(),
        recipient: payload.recipient_id,
        amount: payload.amount,
        video_id: payload.video_id,
        message: payload.message,
    };
    let receipt = state.wallet().gift(request, key.into_inner()).await?;

    let status = if receipt.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(receipt)))
}

/// GET /gifts - Gifts sent or received by the caller, newest first.
async fn list_gifts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListGiftsQuery>,
) -> Result<Json<PageResponse<GiftView>>, ApiError> {
    let gifts = state
        .history()
        .list_gifts(auth.account_id(), query.direction, query.page_request())
        .await?;
    Ok(Json(gifts))
}
