//! JSON error responses.
//!
//! Every failure leaves the API as `{ "error": code, "message": text, "details": {...} }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use reelpay_core::LedgerError;
use reelpay_db::{AccountError, VideoError, store_error};
use reelpay_shared::{AppError, JwtError};
use sea_orm::DbErr;
use serde_json::{Value, json};
use tracing::{error, warn};

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Value,
}

impl ApiError {
    /// Creates an error without details.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: json!({}),
        }
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

fn status_from(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": self.message,
                "details": self.details,
            })),
        )
            .into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = status_from(err.http_status_code());
        let code = err.error_code();

        let details = match &err {
            LedgerError::InvalidAmount { amount, max } => json!({ "amount": amount, "max": max }),
            LedgerError::MessageTooLong { length, max } => json!({ "length": length, "max": max }),
            LedgerError::InsufficientBalance {
                required,
                available,
            } => json!({ "required": required, "available": available }),
            LedgerError::AlreadyPurchased { account, video } => {
                json!({ "account_id": account, "video_id": video })
            }
            LedgerError::FreeContent(video) | LedgerError::VideoNotFound(video) => {
                json!({ "video_id": video })
            }
            LedgerError::AccountNotFound(account) => json!({ "account_id": account }),
            LedgerError::IdempotencyKeyReused(key) => json!({ "idempotency_key": key }),
            LedgerError::SelfPurchaseNotAllowed
            | LedgerError::SelfGiftNotAllowed
            | LedgerError::StoreUnavailable(_)
            | LedgerError::Internal(_) => json!({}),
        };

        let message = match &err {
            LedgerError::Internal(reason) => {
                error!(error = %reason, "Internal ledger failure");
                "An internal error occurred".to_string()
            }
            LedgerError::StoreUnavailable(reason) => {
                warn!(error = %reason, "Store unavailable after retries");
                "The service is temporarily unavailable, please retry".to_string()
            }
            other => other.to_string(),
        };

        Self {
            status,
            code,
            message,
            details,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        if matches!(err, AppError::Internal(_)) {
            error!(error = %err, "Internal application error");
        }
        Self::new(status_from(err.status_code()), err.error_code(), err.to_string())
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        store_error(err).into()
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Invalid(e) => AppError::Validation(e.to_string()).into(),
            AccountError::UsernameTaken(username) => Self::new(
                StatusCode::CONFLICT,
                "USERNAME_TAKEN",
                format!("Username {username} is already taken"),
            )
            .with_details(json!({ "username": username })),
            AccountError::NotFound(id) => LedgerError::AccountNotFound(id).into(),
            AccountError::Ledger(e) => e.into(),
            AccountError::Database(e) => e.into(),
        }
    }
}

impl From<VideoError> for ApiError {
    fn from(err: VideoError) -> Self {
        match err {
            VideoError::Invalid(e) => AppError::Validation(e.to_string()).into(),
            VideoError::OwnerNotFound(id) => LedgerError::AccountNotFound(id).into(),
            VideoError::NotFound(id) => LedgerError::VideoNotFound(id).into(),
            VideoError::Database(e) => e.into(),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => {
                Self::new(StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED", "Token has expired")
            }
            JwtError::DecodingError(_) => Self::new(
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Invalid or malformed token",
            ),
            JwtError::EncodingError(reason) => AppError::Internal(reason).into(),
        }
    }
}
