//! Video entitlement decisions.
//!
//! A viewer may play a video when they own it, when it is free, or when they
//! hold a purchase record for it. The first two rules need no lookup.

use reelpay_shared::types::AccountId;
use serde::{Deserialize, Serialize};

use crate::ledger::VideoInfo;

/// Why a viewer can or cannot play a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entitlement {
    /// The viewer created the video.
    Owner,
    /// The video has no price.
    Free,
    /// The viewer bought the video.
    Purchased,
    /// None of the above.
    Locked,
}

impl Entitlement {
    /// Decides from ownership and price alone.
    ///
    /// Returns `None` when only a purchase lookup can settle the answer.
    #[must_use]
    pub fn decide_without_lookup(viewer: AccountId, video: &VideoInfo) -> Option<Self> {
        if viewer == video.owner_id {
            Some(Self::Owner)
        } else if video.is_free() {
            Some(Self::Free)
        } else {
            None
        }
    }

    /// Full decision given the result of the purchase lookup.
    #[must_use]
    pub fn resolve(viewer: AccountId, video: &VideoInfo, has_purchase: bool) -> Self {
        Self::decide_without_lookup(viewer, video).unwrap_or(if has_purchase {
            Self::Purchased
        } else {
            Self::Locked
        })
    }

    /// Returns true if playback is allowed.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        !matches!(self, Self::Locked)
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Free => "free",
            Self::Purchased => "purchased",
            Self::Locked => "locked",
        }
    }
}

impl std::fmt::Display for Entitlement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
