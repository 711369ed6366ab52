//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use reelpay_shared::{AppError, Claims};
use reelpay_shared::types::AccountId;

use crate::{ApiError, AppState};

/// Cookie consulted when no Authorization header is present.
pub const AUTH_COOKIE: &str = "auth-token";

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Finds the access token: Bearer header first, then the `auth-token` cookie.
fn find_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(AUTH_COOKIE)
            .map(|cookie| cookie.value().to_string())
    })
}

/// Authentication middleware that validates JWT tokens.
///
/// Valid claims are stored in request extensions for `AuthUser`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = find_token(request.headers()) else {
        return ApiError::new(
            StatusCode::UNAUTHORIZED,
            "MISSING_TOKEN",
            "Bearer token or auth-token cookie is required",
        )
        .into_response();
    };

    match state.jwt_service.validate_token(&token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Extractor for the authenticated account.
///
/// The account id is handed explicitly to every repository call:
///
/// ```ignore
/// async fn handler(auth: AuthUser, State(state): State<AppState>) -> impl IntoResponse {
///     state.history().wallet_summary(auth.account_id()).await
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the authenticated account.
    #[must_use]
    pub const fn account_id(&self) -> AccountId {
        AccountId::from_uuid(self.0.account_id())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                ApiError::from(AppError::Unauthorized("no verified claims on request".into()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request, header::COOKIE};

    #[test]
    fn test_bearer_prefix() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn test_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        headers.insert(COOKIE, HeaderValue::from_static("auth-token=from-cookie"));
        assert_eq!(find_token(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; auth-token=abc"));
        assert_eq!(find_token(&headers).as_deref(), Some("abc"));

        assert_eq!(find_token(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_auth_user_requires_verified_claims() {
        let (mut parts, ()) = Request::builder().uri("/wallet").body(()).unwrap().into_parts();

        let err = AuthUser::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "UNAUTHORIZED");
    }
}
