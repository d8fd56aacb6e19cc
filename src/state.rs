//! Shared application state for all routes. Immutable after startup.

use crate::config::{ResolvedCatalog, Settings};
use crate::media::MediaStore;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub catalog: Arc<ResolvedCatalog>,
    pub media: Arc<dyn MediaStore>,
    pub settings: Arc<Settings>,
}
