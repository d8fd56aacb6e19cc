//! Verified admin session from the bearer token.

use crate::auth::{bearer_token, Claims, TokenSigner};
use crate::error::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

#[derive(Clone, Debug)]
pub struct Session(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Already verified by the auth layer.
        if let Some(claims) = parts.extensions.get::<Claims>() {
            return Ok(Session(claims.clone()));
        }
        let token = bearer_token(&parts.headers).ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;
        let claims = TokenSigner::new(&state.settings.token_secret).verify(token, chrono::Utc::now())?;
        Ok(Session(claims))
    }
}
