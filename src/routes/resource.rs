//! Plain resource routes. Handlers resolve the resource from the path segment.

use crate::handlers::resource::{bulk_delete, create, delete, list, read, update};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn resource_routes() -> Router<AppState> {
    Router::new()
        .route("/:resource", get(list).post(create))
        .route("/:resource/bulk-delete", post(bulk_delete))
        .route("/:resource/:id", get(read).put(update).patch(update).delete(delete))
}
