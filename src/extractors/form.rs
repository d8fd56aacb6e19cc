//! Extract a write request body that is either a JSON object or a multipart form.

use crate::error::AppError;
use crate::media::UploadedFile;
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use serde_json::{Map, Value};

/// Text fields (JSON members or multipart text parts) plus any buffered file parts.
#[derive(Debug, Default)]
pub struct FormPayload {
    pub fields: Map<String, Value>,
    pub files: Vec<UploadedFile>,
}

impl FormPayload {
    /// Take the file part with the given field name.
    pub fn take_file(&mut self, field_name: &str) -> Option<UploadedFile> {
        let idx = self.files.iter().position(|f| f.field_name == field_name)?;
        Some(self.files.remove(idx))
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

#[async_trait]
impl<S> FromRequest<S> for FormPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return match value {
                Value::Object(fields) => Ok(FormPayload {
                    fields,
                    files: Vec::new(),
                }),
                _ => Err(AppError::BadRequest("body must be a JSON object".into())),
            };
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let mut out = FormPayload::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await.map_err(|e| AppError::BadRequest(e.body_text()))?;
                    // Browsers send an empty part for an untouched file input.
                    if file_name.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    out.files.push(UploadedFile {
                        field_name: name,
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                None => {
                    let text = field.text().await.map_err(|e| AppError::BadRequest(e.body_text()))?;
                    out.fields.insert(name, Value::String(text));
                }
            }
        }
        tracing::debug!(fields = out.fields.len(), files = out.files.len(), "multipart form received");
        Ok(out)
    }
}
