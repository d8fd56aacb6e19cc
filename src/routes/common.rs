//! Common routes: health, readiness, version, info.

use crate::config::MediaBackendSettings;
use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready(State(state): State<AppState>) -> Result<Json<ReadyBody>, (axum::http::StatusCode, Json<ReadyBody>)> {
    if sqlx::query("SELECT 1").fetch_optional(&state.pool).await.is_err() {
        return Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                database: Some("unavailable"),
            }),
        ));
    }
    Ok(Json(ReadyBody {
        status: "ok",
        database: Some("ok"),
    }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Serialize)]
struct InfoBody {
    name: &'static str,
    version: &'static str,
    resources: Vec<String>,
    families: Vec<String>,
    media: &'static str,
    auth_required: bool,
}

/// What this server exposes: resource paths and tab families from the loaded catalog.
async fn info(State(state): State<AppState>) -> Json<InfoBody> {
    Json(InfoBody {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        resources: state.catalog.resources.iter().map(|r| r.path_segment.clone()).collect(),
        families: state.catalog.families().iter().map(|f| f.key.clone()).collect(),
        media: match state.settings.media {
            MediaBackendSettings::Local { .. } => "local",
            MediaBackendSettings::S3 { .. } => "s3",
        },
        auth_required: state.settings.require_auth,
    })
}

/// GET /health, GET /ready (database ping), GET /version, GET /info.
pub fn common_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .route("/info", get(info))
}
