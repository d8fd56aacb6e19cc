//! Login (always public) and session routes.

use crate::handlers::auth::{login, session};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn login_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

pub fn session_routes() -> Router<AppState> {
    Router::new().route("/session", get(session))
}
