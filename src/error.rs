//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("duplicate path segment: {0}")]
    DuplicatePathSegment(String),
    #[error("reserved path segment: {0}")]
    ReservedPathSegment(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("unsupported content type '{content_type}' for {kind} upload")]
    UnsupportedType { kind: &'static str, content_type: String },
    #[error("empty upload: {0}")]
    Empty(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage backend: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("media: {0}")]
    Media(#[from] MediaError),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("failed to save: {0}")]
    SaveFailed(String),
}

impl AppError {
    /// Collapse server-side failures into `SaveFailed`, keeping client-error classes as they are.
    pub fn into_save_failure(self, what: &str) -> AppError {
        match self {
            AppError::BadRequest(_)
            | AppError::Validation(_)
            | AppError::NotFound(_)
            | AppError::Unauthorized(_) => self,
            AppError::Media(MediaError::UnsupportedType { .. }) | AppError::Media(MediaError::Empty(_)) => self,
            AppError::Db(sqlx::Error::RowNotFound) => self,
            other => {
                tracing::error!(error = %other, "{} failed", what);
                AppError::SaveFailed(what.to_string())
            }
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::Media(MediaError::UnsupportedType { .. }) | AppError::Media(MediaError::Empty(_)) => {
                (StatusCode::BAD_REQUEST, "bad_upload")
            }
            AppError::Media(_) => (StatusCode::INTERNAL_SERVER_ERROR, "media_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::SaveFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "save_failed"),
        };
        // Storage and database details stay in the log.
        let message = match &self {
            AppError::Db(sqlx::Error::RowNotFound) => "not found".to_string(),
            AppError::Db(e) => {
                tracing::error!(error = %e, "database error");
                "database operation failed".to_string()
            }
            AppError::Media(e @ MediaError::Io(_)) | AppError::Media(e @ MediaError::Backend(_)) => {
                tracing::error!(error = %e, "media storage error");
                "media storage failed".to_string()
            }
            AppError::Config(e) => {
                tracing::error!(error = %e, "configuration error");
                "server misconfigured".to_string()
            }
            _ => self.to_string(),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_failure_keeps_client_errors() {
        let e = AppError::BadRequest("bad json".into()).into_save_failure("tab sync");
        assert!(matches!(e, AppError::BadRequest(_)));
        let e = AppError::NotFound("tab 4".into()).into_save_failure("tab sync");
        assert!(matches!(e, AppError::NotFound(_)));
    }

    #[test]
    fn save_failure_hides_database_errors() {
        let e = AppError::Db(sqlx::Error::PoolTimedOut).into_save_failure("tab sync");
        match e {
            AppError::SaveFailed(what) => assert_eq!(what, "tab sync"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            AppError::Unauthorized("x".into()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::SaveFailed("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Db(sqlx::Error::RowNotFound).into_response().status(),
            StatusCode::NOT_FOUND
        );
        let unsupported = MediaError::UnsupportedType { kind: "image", content_type: "text/plain".into() };
        assert_eq!(AppError::Media(unsupported).into_response().status(), StatusCode::BAD_REQUEST);
    }
}
