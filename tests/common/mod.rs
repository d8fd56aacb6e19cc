#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use college_cms::config::MediaBackendSettings;
use college_cms::{apply_migrations, builtin_catalog, resolve, AppState, LocalMediaStore, Settings};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const ADMIN: &str = "admin";
pub const PASSWORD: &str = "correct horse";

pub fn settings(schema: &str, require_auth: bool, media_dir: &Path) -> Settings {
    Settings {
        database_url: "postgres://localhost/college_cms_test".into(),
        max_connections: 2,
        schema: schema.into(),
        port: 5000,
        admin_username: ADMIN.into(),
        admin_password: PASSWORD.into(),
        token_secret: "test-secret".into(),
        require_auth,
        max_upload_bytes: 1024 * 1024,
        catalog_path: None,
        media: MediaBackendSettings::Local {
            dir: media_dir.to_path_buf(),
            public_base_url: "http://localhost:5000/uploads".into(),
        },
    }
}

async fn state_with(pool: PgPool, schema: &str, require_auth: bool) -> (AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(schema, require_auth, dir.path());
    let catalog = resolve(&builtin_catalog(), schema).unwrap();
    let media = LocalMediaStore::new(dir.path().to_path_buf(), "http://localhost:5000/uploads".into())
        .await
        .unwrap();
    let state = AppState {
        pool,
        catalog: Arc::new(catalog),
        media: Arc::new(media),
        settings: Arc::new(settings),
    };
    (state, dir)
}

/// State whose pool never connects; for requests rejected before any query.
pub async fn offline_state(require_auth: bool) -> (AppState, TempDir) {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy("postgres://nobody@127.0.0.1:1/none")
        .unwrap();
    state_with(pool, "public", require_auth).await
}

pub struct DbFixture {
    pub state: AppState,
    pub schema: String,
    pub media_dir: TempDir,
}

impl DbFixture {
    pub async fn drop_schema(self) {
        sqlx::query(&format!("DROP SCHEMA IF EXISTS \"{}\" CASCADE", self.schema))
            .execute(&self.state.pool)
            .await
            .unwrap();
    }
}

/// Fresh schema with all tables, or None when `TEST_DATABASE_URL` is unset.
pub async fn db_fixture() -> Option<DbFixture> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping database test");
        return None;
    };
    let pool = PgPoolOptions::new().max_connections(4).connect(&url).await.unwrap();
    let schema = format!("cms_test_{}", uuid::Uuid::new_v4().simple());
    let (state, media_dir) = state_with(pool, &schema, false).await;
    apply_migrations(&state.pool, &state.catalog, &schema).await.unwrap();
    Some(DbFixture {
        state,
        schema,
        media_dir,
    })
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

pub fn multipart_request(method: &str, uri: &str, parts: &[Part]) -> Request<Body> {
    const BOUNDARY: &str = "----cms-test-boundary";
    let mut body: Vec<u8> = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}
