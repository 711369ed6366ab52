//! Request extractors.

use axum::{extract::FromRequestParts, http::StatusCode, http::request::Parts};
use reelpay_shared::types::LedgerEntryId;

use crate::ApiError;

/// Header carrying the client-chosen key of a money movement.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Optional `Idempotency-Key` header, parsed as the ledger entry id to write.
///
/// Absent means the server picks a fresh key; a present but malformed value is
/// rejected rather than ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdempotencyKey(pub Option<LedgerEntryId>);

impl IdempotencyKey {
    /// Returns the parsed key, if any.
    #[must_use]
    pub const fn into_inner(self) -> Option<LedgerEntryId> {
        self.0
    }
}

impl<S> FromRequestParts<S> for IdempotencyKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(IDEMPOTENCY_KEY_HEADER) else {
            return Ok(Self(None));
        };

        value
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<LedgerEntryId>().ok())
            .map(|key| Self(Some(key)))
            .ok_or_else(|| {
                ApiError::new(
                    StatusCode::BAD_REQUEST,
                    "INVALID_IDEMPOTENCY_KEY",
                    "Idempotency-Key must be a UUID",
                )
            })
    }
}
