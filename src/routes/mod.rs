//! Router assembly: common routes at the root, the CMS API under `/api`, and local media
//! under `/uploads` when the local backend is active.

mod auth;
mod common;
mod resource;
mod tree;

pub use auth::{login_routes, session_routes};
pub use common::common_routes;
pub use resource::resource_routes;
pub use tree::tree_routes;

use crate::config::MediaBackendSettings;
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, middleware, Router};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};

/// `/api` routes. With `require_auth` every route except login needs a bearer token.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let mut protected = Router::new()
        .merge(session_routes())
        .merge(tree_routes())
        .merge(resource_routes());
    if state.settings.require_auth {
        protected = protected.route_layer(middleware::from_fn_with_state(state.clone(), crate::auth::require_bearer));
    }
    Router::new().merge(login_routes()).merge(protected)
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    let limit = state.settings.max_upload_bytes;
    let mut router = Router::new()
        .merge(common_routes())
        .nest("/api", api_routes(&state));
    if let MediaBackendSettings::Local { dir, .. } = &state.settings.media {
        router = router.nest_service("/uploads", ServeDir::new(dir));
    }
    router
        .layer(DefaultBodyLimit::max(limit))
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
