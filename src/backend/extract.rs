use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::auth::{authenticate, token_from_headers, CurrentUser};
use crate::backend::AppState;
use crate::error::AppError;

/// Resolves the caller from `Authorization: Bearer` or the session cookie.
#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".into()))?;
        authenticate(&state.db, &token).await
    }
}
