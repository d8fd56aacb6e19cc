//! College CMS: catalog-driven REST backend for a college website's admin panel.
//!
//! Plain content types are served by generic CRUD handlers built from the catalog.
//! Tab families (tab → sections → files) are saved whole, in one transaction per request.

pub mod auth;
pub mod case;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod media;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{builtin_catalog, load_catalog_from_path, resolve, ResolvedCatalog, Settings};
pub use error::{AppError, ConfigError, MediaError};
pub use media::{build_store, LocalMediaStore, MediaStore};
pub use migration::apply_migrations;
pub use routes::app;
pub use service::{CrudService, TreeService};
pub use state::AppState;
pub use store::{connect_pool, ensure_database_exists};
