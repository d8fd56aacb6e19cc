//! Admin login and session check.

use crate::auth::{Claims, TokenSigner};
use crate::error::AppError;
use crate::extractors::Session;
use crate::response::success_one_ok;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub expires_at: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub username: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl From<Claims> for SessionResponse {
    fn from(c: Claims) -> Self {
        SessionResponse {
            username: c.sub,
            issued_at: c.iat,
            expires_at: c.exp,
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let settings = &state.settings;
    let signer = TokenSigner::new(&settings.token_secret);
    let ok = signer.credentials_match(
        (&settings.admin_username, &settings.admin_password),
        (&req.username, &req.password),
    );
    if !ok {
        tracing::warn!(username = %req.username, "login rejected");
        return Err(AppError::Unauthorized("invalid credentials".into()));
    }
    let now = chrono::Utc::now();
    let token = signer.issue(&req.username, now)?;
    let claims = signer.verify(&token, now)?;
    tracing::info!(username = %req.username, "login");
    Ok(success_one_ok(LoginResponse {
        token,
        username: claims.sub,
        expires_at: claims.exp,
    }))
}

pub async fn session(Session(claims): Session) -> impl IntoResponse {
    success_one_ok(SessionResponse::from(claims))
}
