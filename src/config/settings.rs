//! Runtime settings from the environment (`.env` is loaded by the binary via dotenvy).

use crate::error::ConfigError;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaBackendSettings {
    /// Files under a local directory, served at `public_base_url`.
    Local { dir: PathBuf, public_base_url: String },
    S3 {
        bucket: String,
        region: String,
        endpoint: Option<String>,
        public_base_url: String,
    },
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    pub schema: String,
    pub port: u16,
    pub admin_username: String,
    pub admin_password: String,
    pub token_secret: String,
    /// Bearer token required on every content route when set.
    pub require_auth: bool,
    pub max_upload_bytes: usize,
    pub catalog_path: Option<PathBuf>,
    pub media: MediaBackendSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port: u16 = parse_or(&var, "PORT", 5000)?;
        let schema = var("CMS_SCHEMA").unwrap_or_else(|| "public".into());
        if !schema.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
            || schema.starts_with(|c: char| c.is_ascii_digit())
        {
            return Err(ConfigError::Validation(format!("CMS_SCHEMA '{}' is not a plain identifier", schema)));
        }

        let media = match var("MEDIA_BACKEND").as_deref().unwrap_or("local") {
            "local" => MediaBackendSettings::Local {
                dir: PathBuf::from(var("MEDIA_LOCAL_DIR").unwrap_or_else(|| "./uploads".into())),
                public_base_url: var("MEDIA_PUBLIC_BASE_URL")
                    .unwrap_or_else(|| format!("http://localhost:{}/uploads", port)),
            },
            "s3" => {
                let bucket = required(&var, "S3_BUCKET")?;
                let region = var("S3_REGION").unwrap_or_else(|| "us-east-1".into());
                let public_base_url = var("MEDIA_PUBLIC_BASE_URL")
                    .unwrap_or_else(|| format!("https://{}.s3.{}.amazonaws.com", bucket, region));
                MediaBackendSettings::S3 {
                    bucket,
                    region,
                    endpoint: var("S3_ENDPOINT"),
                    public_base_url,
                }
            }
            other => {
                return Err(ConfigError::Validation(format!(
                    "MEDIA_BACKEND '{}' (expected local or s3)",
                    other
                )))
            }
        };

        let settings = Settings {
            database_url: var("DATABASE_URL").unwrap_or_else(|| {
                info!("DATABASE_URL not set, using default");
                "postgres://localhost/college_cms".into()
            }),
            max_connections: parse_or(&var, "DATABASE_MAX_CONNECTIONS", 5)?,
            schema,
            port,
            admin_username: required(&var, "ADMIN_USERNAME")?,
            admin_password: required(&var, "ADMIN_PASSWORD")?,
            token_secret: required(&var, "TOKEN_SECRET")?,
            require_auth: parse_bool(&var, "REQUIRE_AUTH", false)?,
            max_upload_bytes: parse_or(&var, "MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            catalog_path: var("CATALOG_PATH").map(PathBuf::from),
            media,
        };
        if !settings.require_auth {
            warn!("REQUIRE_AUTH is off: content routes accept unauthenticated writes");
        }
        Ok(settings)
    }
}

fn required<V>(var: &V, key: &str) -> Result<String, ConfigError>
where
    V: Fn(&str) -> Option<String>,
{
    var(key).ok_or_else(|| ConfigError::Load(format!("{} must be set", key)))
}

fn parse_or<V, T>(var: &V, key: &str, default: T) -> Result<T, ConfigError>
where
    V: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
        Some(raw) => raw
            .parse()
            .map_err(|e| ConfigError::Validation(format!("invalid {} value '{}': {}", key, raw, e))),
    }
}

fn parse_bool<V>(var: &V, key: &str, default: bool) -> Result<bool, ConfigError>
where
    V: Fn(&str) -> Option<String>,
{
    match var(key).map(|v| v.to_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(ConfigError::Validation(format!("invalid {} value '{}'", key, v))),
    }
}
