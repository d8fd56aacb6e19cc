//! Tab family routes under the reserved `tabs` segment.

use crate::handlers::tree::{delete, list, read, replace, save};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn tree_routes() -> Router<AppState> {
    Router::new()
        .route("/tabs/:family", get(list).post(save))
        .route("/tabs/:family/:id", get(read).put(replace).delete(delete))
}
