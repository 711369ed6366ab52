//! Video repository: the minimal content-store projection the ledger needs.

use reelpay_core::ledger::VideoInfo;
use reelpay_core::profile::{self, ProfileError};
use reelpay_shared::types::{AccountId, Coins, PageRequest, PageResponse, VideoId};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::info;

use super::wallet::now;
use crate::entities::{accounts, videos};

/// Error types for video operations.
#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    /// Title or price rejected.
    #[error(transparent)]
    Invalid(#[from] ProfileError),

    /// The owning account does not exist.
    #[error("Owner account not found: {0}")]
    OwnerNotFound(AccountId),

    /// Video not found.
    #[error("Video not found: {0}")]
    NotFound(VideoId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Converts a stored video into the facts the ledger uses.
#[must_use]
pub fn video_info(model: &videos::Model) -> VideoInfo {
    VideoInfo {
        id: VideoId::from_uuid(model.id),
        owner_id: AccountId::from_uuid(model.owner_id),
        price: Coins(model.price),
    }
}

/// Video repository.
#[derive(Debug, Clone)]
pub struct VideoRepository {
    db: DatabaseConnection,
}

impl VideoRepository {
    /// Creates a new video repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a video owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` for a bad title or negative price, `OwnerNotFound` if
    /// the owner does not exist.
    pub async fn create(
        &self,
        owner: AccountId,
        title: &str,
        price: i64,
    ) -> Result<videos::Model, VideoError> {
        let title = profile::normalize_title(title)?;
        let price = profile::validate_price(price)?;

        accounts::Entity::find_by_id(owner.into_inner())
            .one(&self.db)
            .await?
            .ok_or(VideoError::OwnerNotFound(owner))?;

        let id = VideoId::new();
        videos::Entity::insert(videos::ActiveModel {
            id: Set(id.into_inner()),
            owner_id: Set(owner.into_inner()),
            title: Set(title),
            price: Set(price),
            earnings: Set(0),
            purchase_count: Set(0),
            created_at: Set(now()),
        })
        .exec_without_returning(&self.db)
        .await?;

        info!(video_id = %id, owner_id = %owner, price, "Video registered");

        self.find_by_id(id).await?.ok_or(VideoError::NotFound(id))
    }

    /// Finds a video by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: VideoId) -> Result<Option<videos::Model>, DbErr> {
        videos::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
    }

    /// Lists videos owned by `owner`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_owner(
        &self,
        owner: AccountId,
        page: PageRequest,
    ) -> Result<PageResponse<videos::Model>, DbErr> {
        let page = page.normalized();
        let query = videos::Entity::find().filter(videos::Column::OwnerId.eq(owner.into_inner()));

        let total = query.clone().count(&self.db).await?;
        let items = query
            .order_by_desc(videos::Column::CreatedAt)
            .order_by_desc(videos::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(items, page, total))
    }
}
