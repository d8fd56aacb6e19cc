//! College CMS server: loads settings, prepares the database, mounts the API.

use college_cms::{
    app, apply_migrations, build_store, builtin_catalog, connect_pool, ensure_database_exists,
    load_catalog_from_path, resolve, AppState, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("college_cms=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;

    ensure_database_exists(&settings.database_url).await?;
    let pool = connect_pool(&settings.database_url, settings.max_connections).await?;

    let catalog_config = match &settings.catalog_path {
        Some(path) => load_catalog_from_path(path).await?,
        None => builtin_catalog(),
    };
    let catalog = resolve(&catalog_config, &settings.schema)?;
    apply_migrations(&pool, &catalog, &settings.schema).await?;

    let media = build_store(&settings.media).await?;
    let port = settings.port;
    let state = AppState {
        pool,
        catalog: Arc::new(catalog),
        media,
        settings: Arc::new(settings),
    };

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
