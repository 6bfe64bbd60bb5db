//! `AuthUser` extractor — pulls the gateway token from the Authorization
//! header and projects its claims into the request context.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use notihub_auth::UserInfo;
use notihub_core::error::AppError;

use crate::state::AppState;

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserInfo);

impl std::ops::Deref for AuthUser {
    type Target = UserInfo;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid Authorization header format"))?;

        let info = notihub_auth::parse_token(token)?;
        Ok(AuthUser(info))
    }
}
