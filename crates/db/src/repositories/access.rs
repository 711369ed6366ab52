//! Access Resolver: answers "can this viewer play this video".
//!
//! Reads go to the primary connection, so a purchase is visible to the next
//! check as soon as it commits.

use chrono::{DateTime, Utc};
use reelpay_core::access::Entitlement;
use reelpay_core::ledger::LedgerError;
use reelpay_shared::types::{AccountId, VideoId};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;

use super::video::video_info;
use crate::entities::{purchases, videos};
use crate::store_error;

/// Whether a viewer holds a purchase record for a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PurchaseStatus {
    /// True if a purchase record exists.
    pub is_purchased: bool,
    /// When the purchase committed.
    pub purchase_date: Option<DateTime<Utc>>,
}

/// Access resolver over videos and purchase records.
#[derive(Debug, Clone)]
pub struct AccessRepository {
    db: DatabaseConnection,
}

impl AccessRepository {
    /// Creates a new access repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns true if `viewer` may play `video`.
    ///
    /// # Errors
    ///
    /// Returns `VideoNotFound` for an unknown video, or a store error.
    pub async fn can_access(&self, viewer: AccountId, video: VideoId) -> Result<bool, LedgerError> {
        Ok(self.entitlement(viewer, video).await?.is_granted())
    }

    /// Returns why `viewer` may or may not play `video`.
    ///
    /// The purchase table is only consulted when ownership and price do not
    /// decide.
    ///
    /// # Errors
    ///
    /// Returns `VideoNotFound` for an unknown video, or a store error.
    pub async fn entitlement(
        &self,
        viewer: AccountId,
        video: VideoId,
    ) -> Result<Entitlement, LedgerError> {
        let model = videos::Entity::find_by_id(video.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)?
            .ok_or(LedgerError::VideoNotFound(video))?;
        let info = video_info(&model);

        if let Some(decision) = Entitlement::decide_without_lookup(viewer, &info) {
            return Ok(decision);
        }

        let record = self.find_purchase(viewer, video).await?;
        Ok(Entitlement::resolve(viewer, &info, record.is_some()))
    }

    /// Returns whether `viewer` bought `video`, and when.
    ///
    /// # Errors
    ///
    /// Returns `VideoNotFound` for an unknown video, or a store error.
    pub async fn purchase_status(
        &self,
        viewer: AccountId,
        video: VideoId,
    ) -> Result<PurchaseStatus, LedgerError> {
        videos::Entity::find_by_id(video.into_inner())
            .one(&self.db)
            .await
            .map_err(store_error)?
            .ok_or(LedgerError::VideoNotFound(video))?;

        let record = self.find_purchase(viewer, video).await?;
        Ok(PurchaseStatus {
            is_purchased: record.is_some(),
            purchase_date: record.map(|r| r.created_at),
        })
    }

    async fn find_purchase(
        &self,
        viewer: AccountId,
        video: VideoId,
    ) -> Result<Option<purchases::Model>, LedgerError> {
        purchases::Entity::find()
            .filter(purchases::Column::AccountId.eq(viewer.into_inner()))
            .filter(purchases::Column::VideoId.eq(video.into_inner()))
            .one(&self.db)
            .await
            .map_err(store_error)
    }
}
