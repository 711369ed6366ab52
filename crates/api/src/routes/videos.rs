//! Video registration, access and purchase routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use reelpay_core::{Entitlement, LedgerError};
use reelpay_db::PurchaseStatus;
use reelpay_db::entities::videos;
use reelpay_shared::types::{AccountId, Coins, VideoId};
use serde::{Deserialize, Serialize};

use crate::{ApiError, AppState, extractors::IdempotencyKey, middleware::AuthUser};

/// Creates the video routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/videos", post(create_video))
        .route("/videos/{video_id}", get(get_video))
        .route("/videos/{video_id}/access", get(get_access))
        .route(
            "/videos/{video_id}/purchase",
            post(purchase_video).get(get_purchase_status),
        )
}

/// Request body for registering a video.
#[derive(Debug, Deserialize)]
pub struct CreateVideoRequest {
    /// Title, 1-200 characters.
    pub title: String,
    /// Price in coins; 0 makes the video free.
    #[serde(default)]
    pub price: i64,
}

/// Video metadata.
#[derive(Debug, Serialize)]
pub struct VideoResponse {
    /// Video ID.
    pub id: VideoId,
    /// Creator.
    pub owner_id: AccountId,
    /// Title.
    pub title: String,
    /// Price in coins.
    pub price: Coins,
    /// Coins earned from purchases.
    pub earnings: Coins,
    /// Number of purchases.
    pub purchase_count: i64,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

impl From<videos::Model> for VideoResponse {
    fn from(model: videos::Model) -> Self {
        Self {
            id: VideoId::from_uuid(model.id),
            owner_id: AccountId::from_uuid(model.owner_id),
            title: model.title,
            price: Coins(model.price),
            earnings: Coins(model.earnings),
            purchase_count: model.purchase_count,
            created_at: model.created_at,
        }
    }
}

/// Video metadata as seen by the caller.
#[derive(Debug, Serialize)]
pub struct VideoDetailResponse {
    /// The video.
    #[serde(flatten)]
    pub video: VideoResponse,
    /// Whether the caller may play it.
    pub can_access: bool,
    /// Why.
    pub entitlement: Entitlement,
}

/// Access decision for the caller.
#[derive(Debug, Serialize)]
pub struct AccessResponse {
    /// Whether the caller may play the video.
    pub can_access: bool,
    /// Why.
    pub entitlement: Entitlement,
}

/// POST /videos - Register a video owned by the caller.
async fn create_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateVideoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let video = state
        .videos()
        .create(auth.account_id(), &payload.title, payload.price)
        .await?;

    Ok((StatusCode::CREATED, Json(VideoResponse::from(video))))
}

/// GET /videos/{video_id} - Metadata plus the caller's entitlement.
async fn get_video(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(video_id): Path<VideoId>,
) -> Result<Json<VideoDetailResponse>, ApiError> {
    let video = state
        .videos()
        .find_by_id(video_id)
        .await?
        .ok_or(LedgerError::VideoNotFound(video_id))?;
    let entitlement = state.access().entitlement(auth.account_id(), video_id).await?;

    Ok(Json(VideoDetailResponse {
        video: video.into(),
        can_access: entitlement.is_granted(),
        entitlement,
    }))
}

/// GET /videos/{video_id}/access - Whether the caller may play the video.
async fn get_access(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(video_id): Path<VideoId>,
) -> Result<Json<AccessResponse>, ApiError> {
    let entitlement = state.access().entitlement(auth.account_id(), video_id).await?;

    Ok(Json(AccessResponse {
        can_access: entitlement.is_granted(),
        entitlement,
    }))
}

/// POST /videos/{video_id}/purchase - Buy the video.
///
/// Answers 201 for a new purchase and 200 when an `Idempotency-Key` replays
/// a committed one.
async fn purchase_video(
    State(state): State<AppState>,
    auth: AuthUser,
    key: IdempotencyKey,
    Path(video_id): Path<VideoId>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state
        .wallet()
        .purchase(auth.account_id(), video_id, key.into_inner())
        .await?;

    let status = if receipt.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(receipt)))
}

/// GET /videos/{video_id}/purchase - Whether the caller bought the video.
async fn get_purchase_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(video_id): Path<VideoId>,
) -> Result<Json<PurchaseStatus>, ApiError> {
    let status = state
        .access()
        .purchase_status(auth.account_id(), video_id)
        .await?;

    Ok(Json(status))
}
